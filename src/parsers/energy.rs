//! # 总能量提取器 (OUTCAR/OSZICAR)
//!
//! 两种能量日志格式，OUTCAR 优先：
//! - OUTCAR：含 "entropy" 的行中第 5 个 token 为 `energy(sigma->0)` 时
//!   取行尾数值，最后一次出现为准
//! - OSZICAR：含 "F=" 的行取第 3 个 token，最后一次出现为准
//!
//! 两个文件都不存在时整个导入中止。
//!
//! ## 依赖关系
//! - 被 `db/compounds.rs`, `db/defects.rs` 使用

use crate::error::{DefectDbError, Result};
use std::fs;
use std::path::Path;

/// 目录中是否有任一能量日志
pub fn has_energy_file(dir: &Path) -> bool {
    dir.join("OUTCAR").is_file() || dir.join("OSZICAR").is_file()
}

/// 提取目录中计算的总能量 (eV)
pub fn total_energy(dir: &Path, name: &str) -> Result<f64> {
    let outcar = dir.join("OUTCAR");
    if outcar.is_file() {
        let content = fs::read_to_string(&outcar).map_err(|e| DefectDbError::FileReadError {
            path: outcar.display().to_string(),
            source: e,
        })?;
        return parse_outcar_energy(&content, name);
    }

    let oszicar = dir.join("OSZICAR");
    if oszicar.is_file() {
        let content = fs::read_to_string(&oszicar).map_err(|e| DefectDbError::FileReadError {
            path: oszicar.display().to_string(),
            source: e,
        })?;
        return parse_oszicar_energy(&content, name);
    }

    Err(DefectDbError::EnergyFileMissing {
        name: name.to_string(),
        path: dir.display().to_string(),
    })
}

/// OUTCAR：`energy(sigma->0)` 标记行的末尾数值，取最后一次出现
pub fn parse_outcar_energy(content: &str, name: &str) -> Result<f64> {
    let mut energy = None;

    for line in content.lines() {
        if !line.contains("entropy") {
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.get(4) == Some(&"energy(sigma->0)") {
            if let Some(value) = tokens.last().and_then(|t| t.parse::<f64>().ok()) {
                energy = Some(value);
            }
        }
    }

    energy.ok_or_else(|| DefectDbError::ParseError {
        format: "OUTCAR".to_string(),
        path: name.to_string(),
        reason: "no energy(sigma->0) line found".to_string(),
    })
}

/// OSZICAR：`F=` 标记行的第 3 个 token，取最后一次出现
pub fn parse_oszicar_energy(content: &str, name: &str) -> Result<f64> {
    let mut energy = None;

    for line in content.lines() {
        if !line.contains("F=") {
            continue;
        }
        if let Some(value) = line
            .split_whitespace()
            .nth(2)
            .and_then(|t| t.parse::<f64>().ok())
        {
            energy = Some(value);
        }
    }

    energy.ok_or_else(|| DefectDbError::ParseError {
        format: "OSZICAR".to_string(),
        path: name.to_string(),
        reason: "no F= line found".to_string(),
    })
}
