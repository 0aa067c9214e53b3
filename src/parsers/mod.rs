//! # 解析器模块
//!
//! 提供 VASP 风格计算输出的解析器：结构文件 (POSCAR/CONTCAR)、
//! 能量日志 (OUTCAR/OSZICAR)、本征值文件 (EIGENVAL)、态密度文件 (DOSCAR)。
//!
//! ## 依赖关系
//! - 被 `db/` 模块使用
//! - 使用 `models/` 数据模型
//! - 子模块: poscar, energy, eigenval, doscar

pub mod doscar;
pub mod eigenval;
pub mod energy;
pub mod poscar;
