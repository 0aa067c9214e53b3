//! # 统一错误处理模块
//!
//! 定义 defectdb 的所有错误类型，使用 `thiserror` 派生。
//!
//! 错误分类遵循导入流程的语义：不可恢复的条件（目录/文件缺失、非法元素符号、
//! 化学式解析失败、用户拒绝覆盖确认）作为错误返回并终止本次操作；
//! 可跳过的条件（非法缺陷目录名、电荷态后缀错误等）不进入此枚举，
//! 由各导入器打印诊断后继续。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// defectdb 统一错误类型
#[derive(Error, Debug)]
pub enum DefectDbError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Cannot find structure file (neither POSCAR nor CONTCAR) of '{name}' in '{path}'")]
    StructureFileMissing { name: String, path: String },

    #[error("Cannot find OUTCAR/OSZICAR file of '{name}' in '{path}'")]
    EnergyFileMissing { name: String, path: String },

    // ─────────────────────────────────────────────────────────────
    // 解析错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to parse {format} file: {path}\nReason: {reason}")]
    ParseError {
        format: String,
        path: String,
        reason: String,
    },

    // ─────────────────────────────────────────────────────────────
    // 数据库错误
    // ─────────────────────────────────────────────────────────────
    #[error("'{0}' is not recognized as a legitimate element")]
    UnknownElement(String),

    #[error("'{0}' is an element, not a compound")]
    CompoundIsElement(String),

    #[error("The element '{element}' of compound '{compound}' is not in the compounds database")]
    ElementNotImported { element: String, compound: String },

    #[error("The compound '{0}' has not been imported yet")]
    CompoundNotImported(String),

    #[error("A folder named 'Bulk' must exist in '{0}'")]
    BulkFolderMissing(String),

    #[error("Unexpected atom '{atom}' found in bulk structure file for '{compound}'")]
    UnexpectedBulkAtom { atom: String, compound: String },

    #[error("Aborting import of '{0}': existing data left untouched")]
    ImportDeclined(String),

    // ─────────────────────────────────────────────────────────────
    // 计算错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ─────────────────────────────────────────────────────────────
    // CSV / JSON 错误
    // ─────────────────────────────────────────────────────────────
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Failed to decode tracker file: {path}\nReason: {reason}")]
    TrackerDecodeError { path: String, reason: String },

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, DefectDbError>;
