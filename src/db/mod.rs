//! # 数据库模块
//!
//! tracker 仓库抽象（加载/持久化 + 备份再写入契约）与三个导入器：
//! 化合物、缺陷、态密度。
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 使用 `parsers/`, `models/`, `utils/`
//! - 子模块: tracker, compounds, defects, dos

pub mod compounds;
pub mod defects;
pub mod dos;
pub mod tracker;

/// 三个 tracker 数据库的文件名
pub const COMPOUNDS_TRACKER: &str = "Compounds_Tracker.json";
pub const DEFECTS_TRACKER: &str = "Defects_Tracker.json";
pub const DOS_TRACKER: &str = "DOS_Tracker.json";

pub use compounds::CompoundsImporter;
pub use defects::DefectsImporter;
pub use dos::DosImporter;
pub use tracker::Tracker;

/// 同步确认回调：参数为提示语与默认答案，返回用户选择
pub type ConfirmFn<'a> = &'a mut dyn FnMut(&str, bool) -> bool;
