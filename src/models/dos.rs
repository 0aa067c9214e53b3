//! # 态密度数据库实体
//!
//! `DOS_Tracker.json` 的持久化形状：每化合物的晶胞体积与
//! （以费米能级为零点的）能量-态密度曲线。
//!
//! ## 依赖关系
//! - 被 `db/dos.rs`, `thermo/equilibrium.rs` 使用
//! - 使用 `serde` crate

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 单个化合物的 DOS 记录
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DosRecord {
    /// 晶胞体积 (cm³)
    #[serde(rename = "Volume")]
    pub volume: f64,

    /// 能量 (eV, 相对费米能级) → 态密度 (states/eV/cell)
    ///
    /// 按能量升序存储；重复能量后写覆盖先写。
    #[serde(rename = "DOS")]
    pub dos: Vec<(f64, f64)>,
}

impl DosRecord {
    /// 以覆盖语义插入一批 (能量, 态密度) 样本并按能量排序
    pub fn from_samples(volume: f64, samples: Vec<(f64, f64)>) -> Self {
        let mut by_energy: BTreeMap<u64, (f64, f64)> = BTreeMap::new();
        for (energy, density) in samples {
            // 按位模式判重，复现"字典键覆盖"语义
            by_energy.insert(energy.to_bits(), (energy, density));
        }
        let mut dos: Vec<(f64, f64)> = by_energy.into_values().collect();
        dos.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        DosRecord { volume, dos }
    }
}

/// `DOS_Tracker.json` 的整体形状
pub type DosDb = BTreeMap<String, DosRecord>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_energy_overwrites() {
        let record = DosRecord::from_samples(1.0, vec![(0.5, 1.0), (-0.5, 2.0), (0.5, 3.0)]);
        assert_eq!(record.dos, vec![(-0.5, 2.0), (0.5, 3.0)]);
    }
}
