//! # 命令执行模块
//!
//! 把 CLI 参数分发到对应的命令实现。
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 使用 `cli/` 定义的参数
//! - 子模块: import, calc

pub mod calc;
pub mod import;

use crate::cli::Commands;
use crate::error::Result;

/// 执行命令
pub fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Import(args) => import::execute(args),
        Commands::Calc(args) => calc::execute(args),
    }
}
