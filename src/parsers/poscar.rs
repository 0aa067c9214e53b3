//! # VASP POSCAR/CONTCAR 结构文件解析器
//!
//! 只读取缺陷热力学数据库需要的字段：物种行、原子数行、晶格向量。
//!
//! ## POSCAR 格式（固定 7 行头）
//! ```text
//! Comment line
//! 1.0                    # scaling factor
//! a1 a2 a3               # lattice vector a
//! b1 b2 b3               # lattice vector b
//! c1 c2 c3               # lattice vector c
//! Element1 Element2 ...  # element symbols (line index 5)
//! n1 n2 ...              # atoms per element (line index 6)
//! ```
//!
//! 注意：体积计算沿用原始数据流水线的约定，不乘缩放因子，
//! 直接取三个晶格向量的混合积并换算为 cm³。
//!
//! ## 依赖关系
//! - 被 `db/compounds.rs`, `db/defects.rs` 使用

use crate::error::{DefectDbError, Result};
use std::fs;
use std::path::Path;

/// Å³ → cm³
const A3_TO_CM3: f64 = 1e-24;

/// 结构文件读取偏好
///
/// 元素导入与体相位点简并度读 POSCAR 优先，化合物与体相结构读 CONTCAR
/// 优先。两处不对称是上游数据流水线的既有行为，保留不改。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructurePreference {
    PoscarFirst,
    ContcarFirst,
}

/// 从结构文件提取的字段
#[derive(Debug, Clone)]
pub struct Structure {
    /// 物种符号（行索引 5）
    pub species: Vec<String>,

    /// 每物种原子数（行索引 6），与 `species` 一一对应
    pub counts: Vec<f64>,

    /// 晶格向量（行索引 2–4），未乘缩放因子
    pub lattice: [[f64; 3]; 3],
}

impl Structure {
    /// 晶胞体积 (cm³)：三个晶格向量的混合积
    pub fn volume_cm3(&self) -> f64 {
        let [a, b, c] = self.lattice;
        let cross = [
            b[1] * c[2] - b[2] * c[1],
            b[2] * c[0] - b[0] * c[2],
            b[0] * c[1] - b[1] * c[0],
        ];
        (a[0] * cross[0] + a[1] * cross[1] + a[2] * cross[2]) * A3_TO_CM3
    }

    /// 单元素结构的原子数；物种多于一个时报错
    pub fn single_species_count(&self, name: &str) -> Result<f64> {
        if self.counts.len() != 1 {
            return Err(DefectDbError::ParseError {
                format: "structure".to_string(),
                path: name.to_string(),
                reason: format!(
                    "expected a single species for an element import, found {}",
                    self.counts.len()
                ),
            });
        }
        Ok(self.counts[0])
    }
}

/// 按偏好顺序在目录中定位结构文件
pub fn locate_structure_file(
    dir: &Path,
    preference: StructurePreference,
) -> Option<std::path::PathBuf> {
    let order = match preference {
        StructurePreference::PoscarFirst => ["POSCAR", "CONTCAR"],
        StructurePreference::ContcarFirst => ["CONTCAR", "POSCAR"],
    };
    order.iter().map(|f| dir.join(f)).find(|p| p.is_file())
}

/// 读取并解析目录中的结构文件
pub fn load_structure(
    dir: &Path,
    name: &str,
    preference: StructurePreference,
) -> Result<Structure> {
    let path = locate_structure_file(dir, preference).ok_or_else(|| {
        DefectDbError::StructureFileMissing {
            name: name.to_string(),
            path: dir.display().to_string(),
        }
    })?;
    let content = fs::read_to_string(&path).map_err(|e| DefectDbError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_structure(&content, name)
}

/// 从文件内容解析结构字段
pub fn parse_structure(content: &str, name: &str) -> Result<Structure> {
    let lines: Vec<&str> = content.lines().collect();

    if lines.len() < 7 {
        return Err(DefectDbError::ParseError {
            format: "structure".to_string(),
            path: name.to_string(),
            reason: "file shorter than the fixed 7-line header".to_string(),
        });
    }

    // 行 2–4：晶格向量
    let mut lattice = [[0.0; 3]; 3];
    for i in 0..3 {
        let parts: Vec<f64> = lines[2 + i]
            .split_whitespace()
            .filter_map(|s| s.parse().ok())
            .collect();
        if parts.len() < 3 {
            return Err(DefectDbError::ParseError {
                format: "structure".to_string(),
                path: name.to_string(),
                reason: format!("invalid lattice vector at line {}", 2 + i),
            });
        }
        lattice[i] = [parts[0], parts[1], parts[2]];
    }

    // 行 5：物种符号，行 6：每物种原子数
    let species: Vec<String> = lines[5].split_whitespace().map(|s| s.to_string()).collect();
    let counts: Vec<f64> = lines[6]
        .split_whitespace()
        .filter_map(|s| s.parse().ok())
        .collect();

    if species.is_empty() || species.len() != counts.len() {
        return Err(DefectDbError::ParseError {
            format: "structure".to_string(),
            path: name.to_string(),
            reason: format!(
                "species line has {} symbols but counts line has {} numbers",
                species.len(),
                counts.len()
            ),
        });
    }

    Ok(Structure {
        species,
        counts,
        lattice,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const GAAS: &str = "GaAs bulk
1.0
5.65 0.0 0.0
0.0 5.65 0.0
0.0 0.0 5.65
Ga As
4 4
Direct
0.0 0.0 0.0
";

    #[test]
    fn test_parse_structure() {
        let s = parse_structure(GAAS, "GaAs").unwrap();
        assert_eq!(s.species, vec!["Ga", "As"]);
        assert_eq!(s.counts, vec![4.0, 4.0]);
        assert!((s.lattice[0][0] - 5.65).abs() < 1e-12);
    }

    #[test]
    fn test_volume_cm3() {
        let s = parse_structure(GAAS, "GaAs").unwrap();
        let expected = 5.65_f64.powi(3) * 1e-24;
        assert!((s.volume_cm3() - expected).abs() < 1e-30);
    }

    #[test]
    fn test_short_file_rejected() {
        assert!(parse_structure("only\nthree\nlines", "x").is_err());
    }

    #[test]
    fn test_single_species_count() {
        let content = "Te\n1.0\n4.5 0 0\n0 5.9 0\n0 0 13.5\nTe\n3\nDirect\n";
        let s = parse_structure(content, "Te").unwrap();
        assert_eq!(s.single_species_count("Te").unwrap(), 3.0);

        let multi = parse_structure(GAAS, "GaAs").unwrap();
        assert!(multi.single_species_count("GaAs").is_err());
    }

    #[test]
    fn test_mismatched_counts_rejected() {
        let content = "x\n1.0\n1 0 0\n0 1 0\n0 0 1\nGa As\n4\nDirect\n";
        assert!(parse_structure(content, "x").is_err());
    }
}
