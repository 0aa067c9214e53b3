//! # 缺陷形成能计算器
//!
//! 对一个化合物的每个缺陷/电荷态组合，在费米能级采样数组上求形成焓：
//!
//! ```text
//! ΔH(Ef) = E_defect(q) − E_bulk + Σ_e n_e·(mu0_e + Δμ_e) + q·(Ef + EVBM) + ECorr(q)
//! ```
//!
//! 费米能级以 VBM 为零点采样（0 到带隙宽度）。每个缺陷位点族
//! （只差电荷态的缺陷）归约为逐点最小包络——热力学上每个费米能级处
//! 最低能量的电荷态占主导。没有任何电荷态的缺陷不出现在结果里。
//!
//! 外掺杂缺陷用同一公式，掺杂元素代入它自己的 (mu0, Δμ)。
//!
//! ## 依赖关系
//! - 被 `thermo/equilibrium.rs`, `commands/calc.rs` 使用
//! - 使用 `models/defect.rs`

use crate::error::{DefectDbError, Result};
use crate::models::defect::{parse_charge, CompoundDefects, DefectRecord, Extrinsic};
use std::collections::BTreeMap;

/// 默认费米能级采样点数
pub const FERMI_SAMPLES: usize = 100;

/// 一个元素的化学势：固定参考 + 用户偏移
#[derive(Debug, Clone, Copy, Default)]
pub struct MuValue {
    pub mu0: f64,
    pub deltamu: f64,
}

impl MuValue {
    pub fn total(&self) -> f64 {
        self.mu0 + self.deltamu
    }
}

/// 每元素化学势状态（计算会话的临时输入，不持久化）
pub type MuState = BTreeMap<String, MuValue>;

/// 一个缺陷位点族的最小包络曲线
#[derive(Debug, Clone)]
pub struct DefectCurve {
    /// 缺陷标签 `<species>_<site>`
    pub label: String,

    /// 外掺杂标志
    pub extrinsic: Extrinsic,

    /// 位点简并度
    pub site_multiplicity: f64,

    /// 逐采样点的最小形成焓 (eV)
    pub enthalpy: Vec<f64>,

    /// 逐采样点占主导的电荷态
    pub charge: Vec<i64>,
}

/// 以 VBM 为零点线性采样费米能级
pub fn fermi_energy_samples(band_gap: f64, count: usize) -> Vec<f64> {
    if count < 2 {
        return vec![0.0];
    }
    let step = band_gap / (count - 1) as f64;
    (0..count).map(|i| i as f64 * step).collect()
}

/// 单个电荷态的形成焓曲线
fn charge_state_curve(
    record: &DefectRecord,
    charge: i64,
    energy: f64,
    e_corr: f64,
    bulk_energy: f64,
    evbm: f64,
    fermi: &[f64],
    mu: &MuState,
) -> Result<Vec<f64>> {
    let mut mu_term = 0.0;
    for (element, n) in &record.n {
        if *n == 0 {
            continue;
        }
        let value = mu.get(element).ok_or_else(|| {
            DefectDbError::InvalidArgument(format!(
                "no chemical potential supplied for element '{}'",
                element
            ))
        })?;
        mu_term += *n as f64 * value.total();
    }

    let base = energy - bulk_energy + mu_term + e_corr;
    Ok(fermi
        .iter()
        .map(|ef| base + charge as f64 * (ef + evbm))
        .collect())
}

/// 所有本征缺陷的逐电荷态形成焓曲线
pub fn intrinsic_formation_enthalpies(
    defects: &CompoundDefects,
    bulk_energy: f64,
    evbm: f64,
    fermi: &[f64],
    mu: &MuState,
) -> Result<BTreeMap<String, BTreeMap<i64, Vec<f64>>>> {
    let mut result = BTreeMap::new();
    for (label, record) in &defects.defects {
        if record.extrinsic == Extrinsic::Yes {
            continue;
        }
        let curves = defect_charge_curves(record, bulk_energy, evbm, fermi, mu)?;
        result.insert(label.clone(), curves);
    }
    Ok(result)
}

/// 选定外掺杂缺陷的逐电荷态形成焓曲线
///
/// 掺杂元素的 (mu0, Δμ) 由调用方单独给出，叠加到本征化学势状态上。
pub fn extrinsic_formation_enthalpies(
    defects: &CompoundDefects,
    bulk_energy: f64,
    evbm: f64,
    fermi: &[f64],
    mu: &MuState,
    dopant_label: &str,
    dopant_mu: MuValue,
) -> Result<BTreeMap<i64, Vec<f64>>> {
    let record = defects.defects.get(dopant_label).ok_or_else(|| {
        DefectDbError::InvalidArgument(format!(
            "defect '{}' is not present in the defects database",
            dopant_label
        ))
    })?;

    let dopant_element = dopant_label.split('_').next().unwrap_or_default();
    let mut mu = mu.clone();
    mu.insert(dopant_element.to_string(), dopant_mu);

    defect_charge_curves(record, bulk_energy, evbm, fermi, &mu)
}

fn defect_charge_curves(
    record: &DefectRecord,
    bulk_energy: f64,
    evbm: f64,
    fermi: &[f64],
    mu: &MuState,
) -> Result<BTreeMap<i64, Vec<f64>>> {
    let mut curves = BTreeMap::new();
    for (charge_key, entry) in &record.charge {
        let charge = parse_charge(charge_key).ok_or_else(|| {
            DefectDbError::InvalidArgument(format!("malformed charge state key '{}'", charge_key))
        })?;
        let curve = charge_state_curve(
            record,
            charge,
            entry.energy,
            entry.e_corr,
            bulk_energy,
            evbm,
            fermi,
            mu,
        )?;
        curves.insert(charge, curve);
    }
    Ok(curves)
}

/// 逐点最小包络：每个采样点取所有电荷态中的最低形成焓及其电荷
///
/// 电荷态为空时返回 `None`（该缺陷从结果中省略）。
pub fn minimum_envelope(per_charge: &BTreeMap<i64, Vec<f64>>) -> Option<(Vec<f64>, Vec<i64>)> {
    let samples = per_charge.values().next()?.len();
    let mut enthalpy = vec![f64::INFINITY; samples];
    let mut charge = vec![0i64; samples];
    for (q, curve) in per_charge {
        for (i, value) in curve.iter().enumerate() {
            if *value < enthalpy[i] {
                enthalpy[i] = *value;
                charge[i] = *q;
            }
        }
    }
    Some((enthalpy, charge))
}

/// 把逐电荷态曲线归约为每缺陷一条最小包络曲线
pub fn reduce_to_envelopes(
    defects: &CompoundDefects,
    per_defect: &BTreeMap<String, BTreeMap<i64, Vec<f64>>>,
) -> Vec<DefectCurve> {
    let mut curves = Vec::new();
    for (label, per_charge) in per_defect {
        let (enthalpy, charge) = match minimum_envelope(per_charge) {
            Some(reduced) => reduced,
            None => continue,
        };
        let record = match defects.defects.get(label) {
            Some(r) => r,
            None => continue,
        };
        curves.push(DefectCurve {
            label: label.clone(),
            extrinsic: record.extrinsic,
            site_multiplicity: record.site_multiplicity,
            enthalpy,
            charge,
        });
    }
    curves
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::defect::{ChargeEntry, DefectRecord};

    fn mu(pairs: &[(&str, f64, f64)]) -> MuState {
        pairs
            .iter()
            .map(|(el, mu0, dm)| {
                (
                    el.to_string(),
                    MuValue {
                        mu0: *mu0,
                        deltamu: *dm,
                    },
                )
            })
            .collect()
    }

    fn vacancy_record(charges: &[(i64, f64)]) -> DefectRecord {
        let mut charge = BTreeMap::new();
        for (q, e) in charges {
            charge.insert(
                crate::models::defect::format_charge(*q),
                ChargeEntry {
                    energy: *e,
                    e_corr: 0.0,
                },
            );
        }
        let mut n = BTreeMap::new();
        n.insert("Ga".to_string(), 0);
        n.insert("As".to_string(), -1);
        DefectRecord {
            extrinsic: Extrinsic::No,
            n,
            site_multiplicity: 32.0,
            charge,
        }
    }

    #[test]
    fn test_fermi_samples_span_gap() {
        let samples = fermi_energy_samples(1.5, 4);
        assert_eq!(samples.len(), 4);
        assert_eq!(samples[0], 0.0);
        assert!((samples[3] - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_charge_term_slope() {
        let record = vacancy_record(&[(1, -318.0)]);
        let fermi = fermi_energy_samples(1.0, 3);
        let mu = mu(&[("Ga", -3.0, 0.0), ("As", -4.0, -0.5)]);
        let curves =
            defect_charge_curves(&record, -320.0, 0.6, &fermi, &mu).unwrap();
        let curve = &curves[&1];
        // base = -318 + 320 + (-1)(-4.5) = 6.5; q=+1 加上 (Ef + EVBM)
        assert!((curve[0] - (6.5 + 0.6)).abs() < 1e-12);
        assert!((curve[2] - (6.5 + 1.6)).abs() < 1e-12);
        // q=+1 时斜率为 1
        assert!(((curve[2] - curve[0]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_missing_mu_is_an_error() {
        let record = vacancy_record(&[(0, -318.0)]);
        let fermi = fermi_energy_samples(1.0, 3);
        let mu = mu(&[("Ga", -3.0, 0.0)]);
        assert!(defect_charge_curves(&record, -320.0, 0.6, &fermi, &mu).is_err());
    }

    #[test]
    fn test_minimum_envelope_follows_crossing() {
        // 三条曲线：q=+1 下降、q=-1 上升、q=0 平坦，交点两侧各自占主导
        let fermi: Vec<f64> = (0..5).map(|i| i as f64 * 0.25).collect();
        let mut per_charge = BTreeMap::new();
        per_charge.insert(1i64, fermi.iter().map(|ef| 1.0 - 2.0 * ef).collect());
        per_charge.insert(-1i64, fermi.iter().map(|ef| 2.0 * ef).collect());
        per_charge.insert(0i64, vec![0.6; 5]);

        let (env, charge) = minimum_envelope(&per_charge).unwrap();
        assert_eq!(env.len(), 5);
        for (i, value) in env.iter().enumerate() {
            let expected = (1.0 - 2.0 * fermi[i]).min(2.0 * fermi[i]).min(0.6);
            assert!((value - expected).abs() < 1e-12);
        }
        assert_eq!(charge[0], -1);
        assert_eq!(charge[4], 1);
    }

    #[test]
    fn test_envelope_of_empty_charge_set_omitted() {
        let per_charge: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
        assert!(minimum_envelope(&per_charge).is_none());
    }

    #[test]
    fn test_intrinsic_skips_extrinsic_defects() {
        let mut defects = CompoundDefects::default();
        defects
            .defects
            .insert("V_As".to_string(), vacancy_record(&[(0, -318.0)]));
        let mut zn = vacancy_record(&[(0, -317.0)]);
        zn.extrinsic = Extrinsic::Yes;
        defects.defects.insert("Zn_Ga".to_string(), zn);

        let fermi = fermi_energy_samples(1.0, 3);
        let mu = mu(&[("Ga", -3.0, 0.0), ("As", -4.0, 0.0)]);
        let curves =
            intrinsic_formation_enthalpies(&defects, -320.0, 0.6, &fermi, &mu).unwrap();
        assert!(curves.contains_key("V_As"));
        assert!(!curves.contains_key("Zn_Ga"));
    }
}
