//! # import 子命令 CLI 定义
//!
//! 数据导入统一入口，包含多个子命令：
//! - `element`: 纯元素参考相
//! - `compound`: 化合物
//! - `defects`: 一个化合物的缺陷目录树（含体相）
//! - `corrections`: 有限尺寸能量修正表 (CSV)
//! - `dos`: 态密度文件 (DOSCAR)
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/import.rs`

use clap::{Args, Subcommand};
use std::path::PathBuf;

/// import 主命令参数
#[derive(Args, Debug)]
pub struct ImportArgs {
    #[command(subcommand)]
    pub command: ImportCommands,

    /// Directory holding the tracker JSON databases
    #[arg(long, default_value = ".", global = true)]
    pub db_dir: PathBuf,

    /// Answer "yes" to every overwrite confirmation prompt
    #[arg(long, global = true)]
    pub yes: bool,
}

/// import 子命令
#[derive(Subcommand, Debug)]
pub enum ImportCommands {
    /// Import a pure-element reference phase
    Element(ElementArgs),

    /// Import a compound
    Compound(CompoundArgs),

    /// Import the defect calculation tree of a compound (including Bulk)
    Defects(DefectsArgs),

    /// Merge finite-size energy corrections from a CSV table
    Corrections(CorrectionsArgs),

    /// Import the density of states of a compound from a DOSCAR file
    Dos(DosArgs),
}

/// element 子命令参数
#[derive(Args, Debug)]
pub struct ElementArgs {
    /// Element symbol (e.g. Cu)
    pub symbol: String,

    /// Calculation directory with POSCAR/CONTCAR and OUTCAR/OSZICAR
    #[arg(long)]
    pub dir: PathBuf,
}

/// compound 子命令参数
#[derive(Args, Debug)]
pub struct CompoundArgs {
    /// Compound formula (e.g. Cu2HgGeTe4)
    pub formula: String,

    /// Calculation directory with POSCAR/CONTCAR and OUTCAR/OSZICAR
    #[arg(long)]
    pub dir: PathBuf,
}

/// defects 子命令参数
#[derive(Args, Debug)]
pub struct DefectsArgs {
    /// Compound formula
    pub compound: String,

    /// Directory containing the 'Bulk' folder and one folder per defect
    #[arg(long)]
    pub dir: PathBuf,
}

/// corrections 子命令参数
#[derive(Args, Debug)]
pub struct CorrectionsArgs {
    /// Compound formula
    pub compound: String,

    /// CSV file with rows 'compound,defect,charge,correction'
    #[arg(long)]
    pub csv_file: PathBuf,
}

/// dos 子命令参数
#[derive(Args, Debug)]
pub struct DosArgs {
    /// Compound formula
    pub compound: String,

    /// DOSCAR file of the compound
    #[arg(long)]
    pub doscar: PathBuf,
}
