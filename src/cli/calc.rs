//! # calc 子命令 CLI 定义
//!
//! 热力学计算入口，包含三个子命令：
//! - `phase-diagram`: 化学势空间 2D 投影相图
//! - `defects`: 缺陷形成能 vs 费米能级
//! - `fermi`: 电荷中性平衡费米能级与载流子浓度
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/calc.rs`

use clap::{Args, Subcommand};
use std::path::PathBuf;

/// calc 主命令参数
#[derive(Args, Debug)]
pub struct CalcArgs {
    #[command(subcommand)]
    pub command: CalcCommands,

    /// Directory holding the tracker JSON databases
    #[arg(long, default_value = ".", global = true)]
    pub db_dir: PathBuf,
}

/// calc 子命令
#[derive(Subcommand, Debug)]
pub enum CalcCommands {
    /// Project the stability region of a compound onto two chemical potential axes
    PhaseDiagram(PhaseDiagramArgs),

    /// Scan defect formation energies across the band gap
    Defects(DefectsCalcArgs),

    /// Solve the equilibrium Fermi level and carrier concentrations
    Fermi(FermiArgs),
}

/// phase-diagram 子命令参数
#[derive(Args, Debug)]
pub struct PhaseDiagramArgs {
    /// Main compound formula
    pub compound: String,

    /// Element order, comma separated; the first two become the plot axes
    /// and the last is eliminated as the dependent element (e.g. Cu,Ga,Te)
    #[arg(long, value_delimiter = ',')]
    pub elements: Vec<String>,

    /// Fixed chemical potential shift for a middle element, as El=value
    /// (repeatable, quaternary and beyond)
    #[arg(long)]
    pub fixed: Vec<String>,

    /// Write the diagram as a PNG image to this path
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Write the stability region vertices as CSV to this path
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Image width in pixels
    #[arg(long, default_value_t = 1000)]
    pub width: u32,

    /// Image height in pixels
    #[arg(long, default_value_t = 800)]
    pub height: u32,
}

/// defects 子命令参数
#[derive(Args, Debug)]
pub struct DefectsCalcArgs {
    /// Main compound formula
    pub compound: String,

    /// Chemical potential shift for an element, as El=value (repeatable;
    /// elements not listed default to 0)
    #[arg(long)]
    pub deltamu: Vec<String>,

    /// Extrinsic dopant defect label to include (e.g. Sn_Ge)
    #[arg(long)]
    pub dopant: Option<String>,

    /// Reference chemical potential of the dopant element (eV)
    #[arg(long, default_value_t = 0.0)]
    pub dopant_mu0: f64,

    /// Chemical potential shift of the dopant element (eV)
    #[arg(long, default_value_t = 0.0)]
    pub dopant_deltamu: f64,

    /// Number of Fermi level sample points across the band gap
    #[arg(long, default_value_t = 100)]
    pub samples: usize,

    /// Lower bound of the formation energy axis (eV)
    #[arg(long, default_value_t = -2.0, allow_hyphen_values = true)]
    pub ymin: f64,

    /// Upper bound of the formation energy axis (eV)
    #[arg(long, default_value_t = 2.0, allow_hyphen_values = true)]
    pub ymax: f64,

    /// Write the diagram as a PNG image to this path
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Write the minimum envelope curves as CSV to this path
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Image width in pixels
    #[arg(long, default_value_t = 1000)]
    pub width: u32,

    /// Image height in pixels
    #[arg(long, default_value_t = 800)]
    pub height: u32,
}

/// fermi 子命令参数
#[derive(Args, Debug)]
pub struct FermiArgs {
    /// Main compound formula
    pub compound: String,

    /// Chemical potential shift for an element, as El=value (repeatable;
    /// elements not listed default to 0)
    #[arg(long)]
    pub deltamu: Vec<String>,

    /// Temperatures in Kelvin, comma separated
    #[arg(long, value_delimiter = ',', default_value = "300")]
    pub temperatures: Vec<f64>,

    /// Extrinsic dopant defect label to include (e.g. Sn_Ge)
    #[arg(long)]
    pub dopant: Option<String>,

    /// Reference chemical potential of the dopant element (eV)
    #[arg(long, default_value_t = 0.0)]
    pub dopant_mu0: f64,

    /// Chemical potential shift of the dopant element (eV)
    #[arg(long, default_value_t = 0.0)]
    pub dopant_deltamu: f64,

    /// Number of Fermi level sample points across the band gap
    #[arg(long, default_value_t = 100)]
    pub samples: usize,

    /// Write the per-temperature results as CSV to this path
    #[arg(long)]
    pub csv: Option<PathBuf>,
}
