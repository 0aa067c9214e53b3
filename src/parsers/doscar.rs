//! # DOSCAR 态密度文件解析器
//!
//! 固定列格式：行 0 给出原子数（第 2 个 token），行 1 首 token 为每原子
//! 体积 (Å³)，行 5 倒数第 2 个 token 为费米能级。数据行为
//! `能量  态密度  积分态密度` 三列；能量存储时减去费米能级。
//!
//! 数据行处理规则：
//! - token 数不等于 3 → 跳过
//! - 能量或态密度 token 解析失败 → 跳过
//! - 第三列（积分态密度）解析失败 → 以态密度 0.0 记录该能量点
//!
//! 最后一条是刻意的静默回退：DFT 代码会把极小的数输出成丢失指数标记的
//! 形式（如 `0.5E-111` 写成 `0.5-111`），这类行按零态密度入库。
//!
//! ## 依赖关系
//! - 被 `db/dos.rs` 使用

use crate::error::{DefectDbError, Result};
use crate::models::DosRecord;
use std::fs;
use std::path::Path;

/// Å³ → cm³
const A3_TO_CM3: f64 = 1e-24;

/// DOSCAR 提取结果
#[derive(Debug, Clone)]
pub struct DoscarData {
    /// 原子数（头部行 0）
    pub number_atoms: usize,

    /// 晶胞体积 (cm³) = 每原子体积 × 原子数
    pub volume: f64,

    /// 费米能级 (eV, 绝对能量)
    pub fermi_energy: f64,

    /// 以费米能级为零点的 DOS 曲线
    pub record: DosRecord,
}

/// 读取并解析 DOSCAR 文件
pub fn load_doscar(path: &Path) -> Result<DoscarData> {
    if !path.is_file() {
        return Err(DefectDbError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let content = fs::read_to_string(path).map_err(|e| DefectDbError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_doscar(&content, &path.display().to_string())
}

/// 从文件内容解析 DOSCAR
pub fn parse_doscar(content: &str, name: &str) -> Result<DoscarData> {
    let parse_error = |reason: String| DefectDbError::ParseError {
        format: "DOSCAR".to_string(),
        path: name.to_string(),
        reason,
    };

    let lines: Vec<&str> = content.lines().collect();
    if lines.len() < 7 {
        return Err(parse_error("file shorter than the 6-line header".to_string()));
    }

    // 行 0：原子数
    let number_atoms: usize = lines[0]
        .split_whitespace()
        .nth(1)
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| parse_error("cannot read atom count from line 0".to_string()))?;

    // 行 1：每原子体积
    let volume_per_atom: f64 = lines[1]
        .split_whitespace()
        .next()
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| parse_error("cannot read volume from line 1".to_string()))?;
    let volume = volume_per_atom * A3_TO_CM3 * number_atoms as f64;

    // 行 5：费米能级（倒数第 2 个 token）
    let line5: Vec<&str> = lines[5].split_whitespace().collect();
    let fermi_energy: f64 = line5
        .len()
        .checked_sub(2)
        .and_then(|i| line5.get(i))
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| parse_error("cannot read Fermi energy from line 5".to_string()))?;

    // 数据行
    let mut samples: Vec<(f64, f64)> = Vec::new();
    for line in &lines {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != 3 {
            continue;
        }
        let energy: f64 = match tokens[0].parse() {
            Ok(v) => v,
            Err(_) => continue,
        };
        let density: f64 = match tokens[1].parse() {
            Ok(v) => v,
            Err(_) => continue,
        };
        // 第三列解析失败 → 零态密度回退（静默）
        if tokens[2].parse::<f64>().is_err() {
            samples.push((energy - fermi_energy, 0.0));
        } else {
            samples.push((energy - fermi_energy, density));
        }
    }

    Ok(DoscarData {
        number_atoms,
        volume,
        fermi_energy,
        record: DosRecord::from_samples(volume, samples),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_doscar() -> String {
        "\
    8    8    1    0
  0.1123E+02  0.4573E-09  0.4573E-09  0.4573E-09  0.5000E-15
  1.00000000000000
  CAR
 GaAs
   10.0  -10.0  301  3.25  1.0
   -2.00  1.50  0.30
    3.25  0.00  12.0
    5.00  2.75  15.0
"
        .to_string()
    }

    #[test]
    fn test_header_fields() {
        let data = parse_doscar(&sample_doscar(), "DOSCAR").unwrap();
        assert_eq!(data.number_atoms, 8);
        assert!((data.fermi_energy - 3.25).abs() < 1e-12);
        assert!((data.volume - 0.1123e2 * 1e-24 * 8.0).abs() < 1e-35);
    }

    #[test]
    fn test_energies_shifted_by_fermi() {
        let data = parse_doscar(&sample_doscar(), "DOSCAR").unwrap();
        let energies: Vec<f64> = data.record.dos.iter().map(|(e, _)| *e).collect();
        assert!((energies[0] - (-5.25)).abs() < 1e-12);
        assert!((energies[1] - 0.0).abs() < 1e-12);
        assert!((energies[2] - 1.75).abs() < 1e-12);
    }

    #[test]
    fn test_wrong_token_count_skipped() {
        let mut content = sample_doscar();
        content.push_str("  1.0  2.0\n");
        content.push_str("  1.0  2.0  3.0  4.0\n");
        let data = parse_doscar(&content, "DOSCAR").unwrap();
        assert_eq!(data.record.dos.len(), 3);
    }

    #[test]
    fn test_dropped_exponent_marker_fallback() {
        let mut content = sample_doscar();
        content.push_str("  7.00  1.25  0.5-111\n");
        let data = parse_doscar(&content, "DOSCAR").unwrap();
        let last = data.record.dos.last().unwrap();
        assert!((last.0 - 3.75).abs() < 1e-12);
        assert_eq!(last.1, 0.0);
    }

    #[test]
    fn test_unparseable_density_skipped() {
        let mut content = sample_doscar();
        content.push_str("  8.00  abc  1.0\n");
        let data = parse_doscar(&content, "DOSCAR").unwrap();
        assert_eq!(data.record.dos.len(), 3);
    }
}
