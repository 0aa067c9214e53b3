//! # 热力学计算模块
//!
//! 数据库之上的三个纯函数计算器：相稳定性（化学势空间 2D 投影）、
//! 缺陷形成能（费米能级扫描 + 最小包络），以及电荷中性求解
//! （平衡费米能级与载流子浓度）。
//!
//! 计算器只接受普通数值输入、只返回普通数值输出，不持有任何
//! 渲染表面；图片导出在 `plot` 子模块单独完成。
//!
//! ## 依赖关系
//! - 被 `commands/calc.rs` 使用
//! - 使用 `models/`
//! - 子模块: phase_stability, formation_energy, equilibrium, plot, export

pub mod equilibrium;
pub mod export;
pub mod formation_energy;
pub mod phase_stability;
pub mod plot;

pub use equilibrium::{EquilibriumResult, EquilibriumSolver, FermiLevel};
pub use formation_energy::{DefectCurve, MuState, MuValue};
pub use phase_stability::{PhaseDiagram, StabilityRegion};
