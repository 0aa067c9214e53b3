//! # DefectDB - 半导体点缺陷热力学工具箱
//!
//! 把 DFT 计算输出聚合成三个 JSON tracker 数据库，并在其上做
//! 相稳定性 / 缺陷形成能 / 平衡费米能级计算。
//!
//! ## 子命令
//! - `import` - 数据导入
//!   - `element` / `compound` - 参考相与化合物
//!   - `defects` - 缺陷目录树（含体相）
//!   - `corrections` - 有限尺寸能量修正表
//!   - `dos` - 态密度
//! - `calc` - 热力学计算
//!   - `phase-diagram` - 化学势空间 2D 投影相图
//!   - `defects` - 缺陷形成能 vs 费米能级
//!   - `fermi` - 电荷中性平衡费米能级与载流子浓度
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── db/        (tracker 数据库与导入器)
//!   │     ├── parsers/   (VASP 输出解析器)
//!   │     ├── thermo/    (热力学计算器)
//!   │     └── models/    (数据模型)
//!   ├── utils/      (工具函数)
//!   └── error.rs    (错误处理)
//! ```

mod cli;
mod commands;
mod db;
mod error;
mod models;
mod parsers;
mod thermo;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
