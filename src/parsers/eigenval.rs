//! # EIGENVAL 本征值文件解析器
//!
//! 从自洽计算的本征值输出提取带隙与价带顶 (VBM)。
//!
//! ## EIGENVAL 格式
//! ```text
//! 行 0:  NIONS NIONS 1 ISPIN
//! 行 1-4: 晶胞信息、温度、CAR、体系名（不使用）
//! 行 5:  NELECT NKPTS NBANDS
//! 之后每个 k 点一个块：空行、k 点坐标+权重、NBANDS 行本征值
//!        非自旋极化: "band  energy  occupation"
//!        自旋极化:   "band  e_up  e_dn  occ_up  occ_dn"
//! ```
//!
//! 间接带隙与直接带隙都会计算，但只上报单一标量带隙（间接）与单一 VBM，
//! 直接/间接的区分不向下游传播。
//!
//! ## 依赖关系
//! - 被 `db/defects.rs` 使用

use crate::error::{DefectDbError, Result};
use std::fs;
use std::path::Path;

/// 判定能带占据的阈值
const OCCUPATION_TOLERANCE: f64 = 1e-3;

/// 带边信息
#[derive(Debug, Clone, Copy)]
pub struct BandEdges {
    /// 带隙 (eV)，金属体系为 0.0
    pub band_gap: f64,

    /// 价带顶 (eV, 绝对能量)
    pub vbm: f64,
}

/// 读取并解析目录中的 EIGENVAL 文件
pub fn load_band_edges(dir: &Path, name: &str) -> Result<BandEdges> {
    let path = dir.join("EIGENVAL");
    if !path.is_file() {
        return Err(DefectDbError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let content = fs::read_to_string(&path).map_err(|e| DefectDbError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_eigenval(&content, name)
}

/// 从文件内容解析带边
pub fn parse_eigenval(content: &str, name: &str) -> Result<BandEdges> {
    let parse_error = |reason: &str| DefectDbError::ParseError {
        format: "EIGENVAL".to_string(),
        path: name.to_string(),
        reason: reason.to_string(),
    };

    let lines: Vec<&str> = content.lines().collect();
    if lines.len() < 7 {
        return Err(parse_error("file shorter than the 6-line header"));
    }

    // 每 k 点的被占据最高能级与空置最低能级
    let mut vbm_per_kpoint: Vec<f64> = Vec::new();
    let mut cbm_per_kpoint: Vec<f64> = Vec::new();
    let mut current_vbm = f64::NEG_INFINITY;
    let mut current_cbm = f64::INFINITY;
    let mut in_block = false;

    let mut record = |energy: f64, occupation: f64, vbm: &mut f64, cbm: &mut f64| {
        if occupation > OCCUPATION_TOLERANCE {
            *vbm = vbm.max(energy);
        } else {
            *cbm = cbm.min(energy);
        }
    };

    for line in &lines[6..] {
        let tokens: Vec<&str> = line.split_whitespace().collect();

        // 空行分隔 k 点块
        if tokens.is_empty() {
            if in_block {
                vbm_per_kpoint.push(current_vbm);
                cbm_per_kpoint.push(current_cbm);
                current_vbm = f64::NEG_INFINITY;
                current_cbm = f64::INFINITY;
                in_block = false;
            }
            continue;
        }

        // k 点坐标行（4 个浮点数）与本征值行靠首 token 是否为整数区分
        let values: Vec<f64> = tokens.iter().filter_map(|t| t.parse().ok()).collect();
        if values.len() != tokens.len() {
            continue;
        }
        let is_band_line = tokens[0].parse::<i64>().is_ok() && values.len() >= 3;
        if !is_band_line {
            continue;
        }

        in_block = true;
        match values.len() {
            // band  energy  occupation
            3 => record(values[1], values[2], &mut current_vbm, &mut current_cbm),
            // band  e_up  e_dn  occ_up  occ_dn
            5 => {
                record(values[1], values[3], &mut current_vbm, &mut current_cbm);
                record(values[2], values[4], &mut current_vbm, &mut current_cbm);
            }
            _ => continue,
        }
    }
    if in_block {
        vbm_per_kpoint.push(current_vbm);
        cbm_per_kpoint.push(current_cbm);
    }

    if vbm_per_kpoint.is_empty() {
        return Err(parse_error("no eigenvalue blocks found"));
    }

    let vbm = vbm_per_kpoint.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let cbm = cbm_per_kpoint.iter().cloned().fold(f64::INFINITY, f64::min);
    if !vbm.is_finite() || !cbm.is_finite() {
        return Err(parse_error("could not classify occupied/unoccupied bands"));
    }

    Ok(BandEdges {
        band_gap: (cbm - vbm).max(0.0),
        vbm,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // 两个 k 点的最小示例：VBM = 0.6 (k2), CBM = 1.5 (k1) → 间接带隙 0.9
    const EIGENVAL: &str = "\
   8    8    1    1
  0.1E-23  0.1E-09 0.1E-09 0.1E-09 0.5E-15
  1.0E-04
  CAR
 GaAs
     18      2      4

  0.0  0.0  0.0  0.5
    1     -5.0  2.0
    2      0.5  2.0
    3      1.5  0.0
    4      3.0  0.0

  0.5  0.5  0.0  0.5
    1     -4.8  2.0
    2      0.6  2.0
    3      2.0  0.0
    4      3.1  0.0
";

    #[test]
    fn test_indirect_gap_and_vbm() {
        let edges = parse_eigenval(EIGENVAL, "GaAs").unwrap();
        assert!((edges.vbm - 0.6).abs() < 1e-12);
        assert!((edges.band_gap - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_metal_clamps_to_zero_gap() {
        let content = "\
 1 1 1 1
 x
 x
 CAR
 metal
 2 1 2

  0.0 0.0 0.0 1.0
    1   1.0  2.0
    2   0.5  0.0
";
        let edges = parse_eigenval(content, "m").unwrap();
        assert_eq!(edges.band_gap, 0.0);
    }

    #[test]
    fn test_header_only_rejected() {
        assert!(parse_eigenval("a\nb\nc\nd\ne\nf\ng\n", "x").is_err());
    }
}
