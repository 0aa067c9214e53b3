//! # 数据模型模块
//!
//! 定义三个 tracker 数据库的持久化实体形状。
//!
//! ## 依赖关系
//! - 被 `db/`, `thermo/`, `commands/` 使用
//! - 子模块: compound, defect, dos

pub mod compound;
pub mod defect;
pub mod dos;

pub use compound::{CompoundRecord, CompoundsDb, ElementRecord};
pub use defect::{
    format_charge, parse_charge, BulkRecord, ChargeEntry, CompoundDefects, DefectRecord,
    DefectsDb, Extrinsic,
};
pub use dos::{DosDb, DosRecord};
