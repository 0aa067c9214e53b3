//! # 工具函数模块
//!
//! 提供美化输出、交互确认、元素周期表、化学式解析等工具。
//!
//! ## 依赖关系
//! - 被 `db/`, `commands/`, `thermo/` 模块使用
//! - 子模块: output, prompt, elements, formula, progress

pub mod elements;
pub mod formula;
pub mod output;
pub mod progress;
pub mod prompt;
