//! # 缺陷数据库实体
//!
//! `Defects_Tracker.json` 的持久化形状：每化合物一个 `CompoundDefects`，
//! 含体相参考数据 (Bulk) 与按缺陷标签索引的缺陷记录。缺陷标签形如
//! `"<species>_<site>"`，species 为元素符号或空位标记 `V`，site 为元素符号
//! 或间隙位标记 `i`。
//!
//! 电荷态以带显式 `+` 前缀的字符串作键（`"+2"`, `"-1"`, `"0"`），
//! 与修正表 CSV 的裸整数约定相反，读入时转换。
//!
//! ## 依赖关系
//! - 被 `db/defects.rs`, `thermo/formation_energy.rs` 使用
//! - 使用 `serde` crate

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 空位标记（占据 species 位）
pub const VACANCY_MARKER: &str = "V";

/// 间隙位标记（占据 site 位）
pub const INTERSTITIAL_MARKER: &str = "i";

/// 缺陷是否为外掺杂（species 不属于化合物本身的组成元素）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Extrinsic {
    Yes,
    No,
}

impl std::fmt::Display for Extrinsic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Extrinsic::Yes => write!(f, "Yes"),
            Extrinsic::No => write!(f, "No"),
        }
    }
}

/// 单个电荷态的能量数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeEntry {
    /// 缺陷超胞 DFT 总能量 (eV)
    #[serde(rename = "Energy")]
    pub energy: f64,

    /// 有限尺寸能量修正 (eV)，导入时初始化为 0.0
    #[serde(rename = "ECorr")]
    pub e_corr: f64,
}

/// 单个缺陷（所有电荷态）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefectRecord {
    /// 外掺杂标志
    #[serde(rename = "Extrinsic")]
    pub extrinsic: Extrinsic,

    /// 每元素净原子数变化：+1 加入、-1 移除、0 不变
    pub n: BTreeMap<String, i64>,

    /// 位点简并度（体相超胞中的等价位点数）
    pub site_multiplicity: f64,

    /// 电荷态 → 能量数据，键为带符号整数字符串（正数带 `+`）
    pub charge: BTreeMap<String, ChargeEntry>,
}

/// 体相参考数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkRecord {
    /// 结构文件中每元素的原子数
    pub dft_counts: BTreeMap<String, f64>,

    /// 物种数
    pub number_species: usize,

    /// 体相超胞 DFT 总能量 (eV)
    pub dft_bulk_energy: f64,

    /// 带隙 (eV)
    #[serde(rename = "BandGap")]
    pub band_gap: f64,

    /// 价带顶 (eV)
    #[serde(rename = "VBM")]
    pub vbm: f64,

    /// 超胞体积 (cm³)
    #[serde(rename = "Volume")]
    pub volume: f64,
}

/// 单个化合物的全部缺陷数据
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompoundDefects {
    /// 体相参考（缺陷导入时必须先填充）
    #[serde(rename = "Bulk")]
    pub bulk: Option<BulkRecord>,

    /// 缺陷标签 → 缺陷记录
    #[serde(rename = "Defects")]
    pub defects: BTreeMap<String, DefectRecord>,
}

/// `Defects_Tracker.json` 的整体形状
pub type DefectsDb = BTreeMap<String, CompoundDefects>;

/// 整数电荷态序列化：正数带显式 `+` 前缀
pub fn format_charge(q: i64) -> String {
    if q > 0 {
        format!("+{}", q)
    } else {
        q.to_string()
    }
}

/// 解析电荷态字符串（接受带或不带 `+` 前缀）
pub fn parse_charge(s: &str) -> Option<i64> {
    s.trim().trim_start_matches('+').parse::<i64>().ok()
}
