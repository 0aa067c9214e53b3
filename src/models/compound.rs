//! # 化合物数据库实体
//!
//! `Compounds_Tracker.json` 的持久化形状：元素（含 mu0 参考化学势）
//! 与化合物（含名义/实际化学计量、DFT 总能量、formula_units）。
//!
//! ## 依赖关系
//! - 被 `db/compounds.rs`, `thermo/phase_stability.rs` 使用
//! - 使用 `serde` crate

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 纯元素参考相记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementRecord {
    /// 元素列表（恒为单元素）
    pub elements_list: Vec<String>,

    /// 结构文件中的原子数
    pub dft_count: f64,

    /// formula_units（对纯元素即原子数）
    pub formula_units: f64,

    /// 物种数（恒为 1）
    pub number_species: usize,

    /// DFT 总能量 (eV)
    pub dft_total_energy: f64,

    /// 参考化学势 = 总能量 / formula_units (eV/atom)
    pub mu0: f64,
}

/// 化合物记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompoundRecord {
    /// 有序元素列表（来自名称解析）
    pub elements_list: Vec<String>,

    /// 名义化学计量数（来自名称解析）
    pub nominal_counts: BTreeMap<String, f64>,

    /// 结构文件中每元素的实际原子数
    pub dft_counts: BTreeMap<String, f64>,

    /// formula_units = 实际原子数 / 名义计量数
    pub formula_units: f64,

    /// 物种数
    pub number_species: usize,

    /// DFT 总能量 (eV)
    pub dft_total_energy: f64,
}

impl CompoundRecord {
    /// 名义计量数（缺失元素记 0）
    pub fn nominal_count(&self, element: &str) -> f64 {
        self.nominal_counts.get(element).copied().unwrap_or(0.0)
    }
}

/// `Compounds_Tracker.json` 的整体形状
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompoundsDb {
    #[serde(rename = "Compounds")]
    pub compounds: BTreeMap<String, CompoundRecord>,

    #[serde(rename = "Elements")]
    pub elements: BTreeMap<String, ElementRecord>,
}

impl CompoundsDb {
    /// 形成焓：每 formula unit 总能量减去元素参考加权和 (eV)
    ///
    /// 导入时不存储，总是在使用处重新计算。
    pub fn formation_enthalpy(&self, name: &str) -> Option<f64> {
        let record = self.compounds.get(name)?;
        let mut enthalpy = record.dft_total_energy / record.formula_units;
        for element in &record.elements_list {
            let mu0 = self.elements.get(element)?.mu0;
            enthalpy -= record.nominal_count(element) * mu0;
        }
        Some(enthalpy)
    }
}
