//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `import`: 把 DFT 计算输出聚合进 tracker 数据库（嵌套子命令）
//!   - `element` / `compound` / `defects` / `corrections` / `dos`
//! - `calc`: 数据库之上的热力学计算（嵌套子命令）
//!   - `phase-diagram` / `defects` / `fermi`
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: import, calc

pub mod calc;
pub mod import;

use clap::{Parser, Subcommand};

/// DefectDB - 缺陷热力学数据库与计算工具
#[derive(Parser)]
#[command(name = "defectdb")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "A defect thermodynamics database and calculator for DFT outputs", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Import DFT calculation outputs into the tracker databases
    Import(import::ImportArgs),

    /// Run thermodynamic calculations on top of the databases
    Calc(calc::CalcArgs),
}
