//! # 平衡费米能级 / 载流子浓度求解器
//!
//! 在给定温度下解电荷中性条件：
//!
//! ```text
//! Σ_defects q·N_defect(Ef) + p(Ef) = n(Ef)
//! N_defect(Ef) = (multiplicity / V_bulk) · exp(−ΔH(Ef) / kT)
//! ```
//!
//! 自由载流子浓度由 DOS 加权费米-狄拉克占据数从带边向外做梯形积分
//! 得到。费米能级与 DOS 能量轴都以 VBM 为零点。
//!
//! 净电荷在带隙内的采样点间变号时线性内插求根；全程同号时返回
//! `"< EVBM"` / `"> ECBM"` 哨兵而不外推——哨兵字符串驱动用户可见的
//! 格式化，逐字保留。
//!
//! 化学势滑块每动一次都会重新触发求解而温度列表很少变化，
//! 结果按温度缓存。
//!
//! ## 依赖关系
//! - 被 `commands/calc.rs` 使用
//! - 使用 `thermo/formation_energy.rs`, `models/dos.rs`

use crate::models::DosRecord;
use crate::thermo::formation_energy::DefectCurve;
use std::collections::HashMap;
use std::fmt;

/// 玻尔兹曼常数 (eV/K)
pub const BOLTZMANN_EV: f64 = 8.617333262e-5;

/// 平衡费米能级：带隙内的数值，或越出带边的哨兵
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FermiLevel {
    /// 以 VBM 为零点的费米能级 (eV)
    Energy(f64),
    /// 净电荷在整个带隙内为负
    BelowVbm,
    /// 净电荷在整个带隙内为正
    AboveCbm,
}

impl fmt::Display for FermiLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FermiLevel::Energy(e) => write!(f, "{:.4}", e),
            FermiLevel::BelowVbm => write!(f, "< EVBM"),
            FermiLevel::AboveCbm => write!(f, "> ECBM"),
        }
    }
}

/// 单个温度下的求解结果
#[derive(Debug, Clone, Copy)]
pub struct EquilibriumResult {
    pub temperature: f64,
    pub fermi_level: FermiLevel,
    /// 空穴浓度 (cm⁻³)
    pub holes: f64,
    /// 电子浓度 (cm⁻³)
    pub electrons: f64,
}

/// 电荷中性求解器（按温度缓存结果）
pub struct EquilibriumSolver<'a> {
    curves: &'a [DefectCurve],
    /// 费米能级采样（VBM 为零点），与 `curves` 的采样一一对应
    fermi: &'a [f64],
    band_gap: f64,
    /// 体相超胞体积 (cm³)，缺陷浓度归一化
    bulk_volume: f64,
    /// DOS 曲线（能量轴零点对齐 VBM）
    dos: &'a DosRecord,
    cache: HashMap<u64, EquilibriumResult>,
}

impl<'a> EquilibriumSolver<'a> {
    pub fn new(
        curves: &'a [DefectCurve],
        fermi: &'a [f64],
        band_gap: f64,
        bulk_volume: f64,
        dos: &'a DosRecord,
    ) -> Self {
        EquilibriumSolver {
            curves,
            fermi,
            band_gap,
            bulk_volume,
            dos,
            cache: HashMap::new(),
        }
    }

    /// 求给定温度下的平衡费米能级与载流子浓度
    pub fn solve(&mut self, temperature: f64) -> EquilibriumResult {
        if let Some(cached) = self.cache.get(&temperature.to_bits()) {
            return *cached;
        }

        let net: Vec<f64> = (0..self.fermi.len())
            .map(|i| self.net_charge(i, temperature))
            .collect();

        let result = self.locate_neutrality(&net, temperature);
        self.cache.insert(temperature.to_bits(), result);
        result
    }

    /// 采样点 i 处的净电荷：缺陷电荷 + 空穴 − 电子
    fn net_charge(&self, i: usize, temperature: f64) -> f64 {
        let kt = BOLTZMANN_EV * temperature;
        let mut total = 0.0;
        for curve in self.curves {
            let concentration =
                curve.site_multiplicity / self.bulk_volume * (-curve.enthalpy[i] / kt).exp();
            total += curve.charge[i] as f64 * concentration;
        }
        total + self.hole_concentration(self.fermi[i], temperature)
            - self.electron_concentration(self.fermi[i], temperature)
    }

    /// 在变号区间内线性内插；无变号时返回哨兵
    fn locate_neutrality(&self, net: &[f64], temperature: f64) -> EquilibriumResult {
        for i in 0..net.len().saturating_sub(1) {
            if net[i] == 0.0 {
                return self.result_at(self.fermi[i], temperature);
            }
            if net[i].signum() != net[i + 1].signum() {
                let fraction = net[i] / (net[i] - net[i + 1]);
                let ef = self.fermi[i] + fraction * (self.fermi[i + 1] - self.fermi[i]);
                return self.result_at(ef, temperature);
            }
        }

        // 全程同号：平衡位于带隙之外
        let (fermi_level, edge) = if net.first().copied().unwrap_or(0.0) > 0.0 {
            (FermiLevel::AboveCbm, self.band_gap)
        } else {
            (FermiLevel::BelowVbm, 0.0)
        };
        EquilibriumResult {
            temperature,
            fermi_level,
            holes: self.hole_concentration(edge, temperature),
            electrons: self.electron_concentration(edge, temperature),
        }
    }

    fn result_at(&self, ef: f64, temperature: f64) -> EquilibriumResult {
        EquilibriumResult {
            temperature,
            fermi_level: FermiLevel::Energy(ef),
            holes: self.hole_concentration(ef, temperature),
            electrons: self.electron_concentration(ef, temperature),
        }
    }

    /// 价带空穴浓度 (cm⁻³)：E <= 0 范围内 g(E)·(1−f(E)) 的梯形积分
    fn hole_concentration(&self, ef: f64, temperature: f64) -> f64 {
        let mut total = 0.0;
        for pair in self.dos.dos.windows(2) {
            let (e0, g0) = pair[0];
            let (e1, g1) = pair[1];
            if e1 > 0.0 {
                continue;
            }
            let f0 = g0 * (1.0 - fermi_dirac(e0, ef, temperature));
            let f1 = g1 * (1.0 - fermi_dirac(e1, ef, temperature));
            total += 0.5 * (f0 + f1) * (e1 - e0);
        }
        total / self.dos.volume
    }

    /// 导带电子浓度 (cm⁻³)：E >= 带隙范围内 g(E)·f(E) 的梯形积分
    fn electron_concentration(&self, ef: f64, temperature: f64) -> f64 {
        let mut total = 0.0;
        for pair in self.dos.dos.windows(2) {
            let (e0, g0) = pair[0];
            let (e1, g1) = pair[1];
            if e0 < self.band_gap {
                continue;
            }
            let f0 = g0 * fermi_dirac(e0, ef, temperature);
            let f1 = g1 * fermi_dirac(e1, ef, temperature);
            total += 0.5 * (f0 + f1) * (e1 - e0);
        }
        total / self.dos.volume
    }
}

/// 费米-狄拉克占据数
fn fermi_dirac(energy: f64, ef: f64, temperature: f64) -> f64 {
    1.0 / (1.0 + ((energy - ef) / (BOLTZMANN_EV * temperature)).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::defect::Extrinsic;

    fn empty_dos() -> DosRecord {
        DosRecord {
            volume: 1.0,
            dos: Vec::new(),
        }
    }

    fn curve(label: &str, charge: i64, enthalpy: Vec<f64>) -> DefectCurve {
        let samples = enthalpy.len();
        DefectCurve {
            label: label.to_string(),
            extrinsic: Extrinsic::No,
            site_multiplicity: 32.0,
            enthalpy,
            charge: vec![charge; samples],
        }
    }

    fn fermi_grid(gap: f64, count: usize) -> Vec<f64> {
        crate::thermo::formation_energy::fermi_energy_samples(gap, count)
    }

    #[test]
    fn test_fermi_dirac_half_at_fermi_level() {
        assert!((fermi_dirac(0.5, 0.5, 300.0) - 0.5).abs() < 1e-12);
        assert!(fermi_dirac(1.0, 0.0, 300.0) < 1e-10);
        assert!(fermi_dirac(-1.0, 0.0, 300.0) > 1.0 - 1e-10);
    }

    #[test]
    fn test_symmetric_defects_pin_fermi_level_midgap() {
        let gap = 1.0;
        let fermi = fermi_grid(gap, 101);
        // 施主形成焓随 Ef 上升，受主下降，完全对称
        let donor = curve("V_As", 1, fermi.clone());
        let acceptor = curve("V_Ga", -1, fermi.iter().map(|ef| gap - ef).collect());
        let curves = vec![donor, acceptor];
        let dos = empty_dos();

        let mut solver = EquilibriumSolver::new(&curves, &fermi, gap, 1e-22, &dos);
        let result = solver.solve(300.0);
        match result.fermi_level {
            FermiLevel::Energy(ef) => assert!((ef - 0.5).abs() < 1e-6),
            other => panic!("expected mid-gap Fermi level, got {}", other),
        }
    }

    #[test]
    fn test_all_positive_net_charge_yields_sentinel() {
        let gap = 1.0;
        let fermi = fermi_grid(gap, 51);
        // 只有低形成焓施主，没有补偿：净电荷全程为正
        let curves = vec![curve("V_As", 1, vec![-0.5; fermi.len()])];
        let dos = empty_dos();

        let mut solver = EquilibriumSolver::new(&curves, &fermi, gap, 1e-22, &dos);
        let result = solver.solve(300.0);
        assert_eq!(result.fermi_level, FermiLevel::AboveCbm);
        assert_eq!(result.fermi_level.to_string(), "> ECBM");
    }

    #[test]
    fn test_all_negative_net_charge_yields_sentinel() {
        let gap = 1.0;
        let fermi = fermi_grid(gap, 51);
        let curves = vec![curve("V_Ga", -1, vec![-0.5; fermi.len()])];
        let dos = empty_dos();

        let mut solver = EquilibriumSolver::new(&curves, &fermi, gap, 1e-22, &dos);
        let result = solver.solve(300.0);
        assert_eq!(result.fermi_level, FermiLevel::BelowVbm);
        assert_eq!(result.fermi_level.to_string(), "< EVBM");
    }

    #[test]
    fn test_carrier_integration_uses_band_edges() {
        let gap = 1.0;
        let fermi = fermi_grid(gap, 2);
        let curves: Vec<DefectCurve> = Vec::new();
        // 价带与导带各一段平坦 DOS，带隙内为零
        let dos = DosRecord {
            volume: 1e-22,
            dos: vec![
                (-1.0, 2.0),
                (-0.5, 2.0),
                (0.0, 2.0),
                (0.5, 0.0),
                (1.0, 2.0),
                (1.5, 2.0),
                (2.0, 2.0),
            ],
        };

        let solver = EquilibriumSolver::new(&curves, &fermi, gap, 1e-22, &dos);
        // 费米能级钉在 VBM：价带几乎全满 → 空穴少；钉在 CBM → 电子多
        let p_at_vbm = solver.hole_concentration(0.0, 300.0);
        let p_at_cbm = solver.hole_concentration(gap, 300.0);
        assert!(p_at_vbm > p_at_cbm);

        let n_at_cbm = solver.electron_concentration(gap, 300.0);
        let n_at_vbm = solver.electron_concentration(0.0, 300.0);
        assert!(n_at_cbm > n_at_vbm);
    }

    #[test]
    fn test_results_cached_per_temperature() {
        let gap = 1.0;
        let fermi = fermi_grid(gap, 11);
        let curves = vec![curve("V_As", 1, vec![-0.5; fermi.len()])];
        let dos = empty_dos();

        let mut solver = EquilibriumSolver::new(&curves, &fermi, gap, 1e-22, &dos);
        let first = solver.solve(300.0);
        let again = solver.solve(300.0);
        assert_eq!(first.fermi_level, again.fermi_level);
        assert_eq!(solver.cache.len(), 1);

        solver.solve(600.0);
        assert_eq!(solver.cache.len(), 2);
    }
}
