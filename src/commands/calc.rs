//! # calc 子命令实现
//!
//! 从 tracker 数据库装配计算输入、调用 `thermo/` 的计算器、
//! 打印结果表格并按需导出 PNG / CSV。
//!
//! 化学势偏移在命令行上以 `El=value` 形式给出；参考化学势 μ0 一律
//! 取自元素数据库，不在命令行上出现。
//!
//! ## 依赖关系
//! - 使用 `cli/calc.rs` 定义的参数
//! - 使用 `db/tracker.rs`（只读加载）, `thermo/`
//! - 使用 `utils/output.rs`, `utils/progress.rs`

use crate::cli::calc::{CalcArgs, CalcCommands, DefectsCalcArgs, FermiArgs, PhaseDiagramArgs};
use crate::db::{Tracker, COMPOUNDS_TRACKER, DEFECTS_TRACKER, DOS_TRACKER};
use crate::error::{DefectDbError, Result};
use crate::models::defect::{BulkRecord, CompoundDefects};
use crate::models::{CompoundsDb, DefectsDb, DosDb};
use crate::thermo::export::{curves_to_csv, equilibrium_to_csv, vertices_to_csv};
use crate::thermo::formation_energy::{
    extrinsic_formation_enthalpies, fermi_energy_samples, intrinsic_formation_enthalpies,
    reduce_to_envelopes,
};
use crate::thermo::phase_stability::calculate_phase_diagram;
use crate::thermo::plot::{generate_defects_diagram_plot, generate_phase_diagram_plot};
use crate::thermo::{DefectCurve, EquilibriumSolver, MuState, MuValue};
use crate::utils::{output, progress};

use std::collections::BTreeMap;
use std::path::Path;
use tabled::{Table, Tabled};

/// 相图顶点表格行
#[derive(Debug, Clone, Tabled)]
struct VertexRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Δμ x (eV)")]
    x: String,
    #[tabled(rename = "Δμ y (eV)")]
    y: String,
}

/// 缺陷形成能摘要表格行
#[derive(Debug, Clone, Tabled)]
struct DefectRow {
    #[tabled(rename = "Defect")]
    label: String,
    #[tabled(rename = "Extrinsic")]
    extrinsic: String,
    #[tabled(rename = "q @ VBM")]
    charge_vbm: i64,
    #[tabled(rename = "ΔH @ VBM (eV)")]
    enthalpy_vbm: String,
    #[tabled(rename = "q @ CBM")]
    charge_cbm: i64,
    #[tabled(rename = "ΔH @ CBM (eV)")]
    enthalpy_cbm: String,
}

/// 平衡结果表格行
#[derive(Debug, Clone, Tabled)]
struct EquilibriumRow {
    #[tabled(rename = "T (K)")]
    temperature: String,
    #[tabled(rename = "Ef − EVBM (eV)")]
    fermi_level: String,
    #[tabled(rename = "p (cm⁻³)")]
    holes: String,
    #[tabled(rename = "n (cm⁻³)")]
    electrons: String,
}

/// 执行热力学计算
pub fn execute(args: CalcArgs) -> Result<()> {
    match args.command {
        CalcCommands::PhaseDiagram(a) => run_phase_diagram(&args.db_dir, a),
        CalcCommands::Defects(a) => run_defects(&args.db_dir, a),
        CalcCommands::Fermi(a) => run_fermi(&args.db_dir, a),
    }
}

/// 只读加载一个 tracker；文件不存在时提示（通常是 --db-dir 给错了）
fn load_tracker<T>(db_dir: &Path, file_name: &str) -> Result<T>
where
    T: serde::Serialize + serde::de::DeserializeOwned + Default,
{
    let tracker = Tracker::<T>::load(db_dir.join(file_name))?;
    if !tracker.exists() {
        output::print_warning(&format!(
            "'{}' does not exist in '{}'; starting from an empty database",
            file_name,
            db_dir.display()
        ));
    }
    Ok(tracker.data)
}

fn run_phase_diagram(db_dir: &Path, a: PhaseDiagramArgs) -> Result<()> {
    output::print_header(&format!("Phase Stability: {}", a.compound));

    let compounds: CompoundsDb = load_tracker(db_dir, COMPOUNDS_TRACKER)?;
    let fixed = parse_assignments(&a.fixed)?;

    let diagram = calculate_phase_diagram(&a.compound, &a.elements, &compounds, &fixed)?;

    let first = &a.elements[0];
    let second = &a.elements[1];
    output::print_info(&format!(
        "Axes: x = Δμ_{}, y = Δμ_{} (window {:.4} to 0 eV)",
        first, second, diagram.bracket
    ));
    if let Some(enthalpy) = compounds.formation_enthalpy(&a.compound) {
        output::print_info(&format!(
            "Formation enthalpy of '{}': {:.6} eV per formula unit",
            a.compound, enthalpy
        ));
    }

    if diagram.region.is_empty() {
        output::print_warning(
            "The stability region is empty: every candidate chemical potential is claimed by a competing phase.",
        );
    } else {
        let rows: Vec<VertexRow> = diagram
            .vertices
            .iter()
            .enumerate()
            .map(|(i, (x, y))| VertexRow {
                index: i + 1,
                x: format!("{:.4}", x),
                y: format!("{:.4}", y),
            })
            .collect();
        println!("{}", Table::new(&rows));
    }

    if let Some(ref csv_path) = a.csv {
        vertices_to_csv(&diagram, first, second, csv_path)?;
        output::print_success(&format!("Vertices saved to '{}'", csv_path.display()));
    }
    if let Some(ref plot_path) = a.output {
        generate_phase_diagram_plot(
            &diagram, &a.compound, first, second, plot_path, a.width, a.height,
        )?;
        output::print_success(&format!("Phase diagram saved to '{}'", plot_path.display()));
    }
    Ok(())
}

fn run_defects(db_dir: &Path, a: DefectsCalcArgs) -> Result<()> {
    output::print_header(&format!("Defect Formation Energies: {}", a.compound));

    let compounds: CompoundsDb = load_tracker(db_dir, COMPOUNDS_TRACKER)?;
    let defects_db: DefectsDb = load_tracker(db_dir, DEFECTS_TRACKER)?;
    let (entry, bulk) = compound_defects(&defects_db, &a.compound)?;

    let fermi = fermi_energy_samples(bulk.band_gap, a.samples);
    let mu = build_mu_state(&compounds, &parse_assignments(&a.deltamu)?)?;
    let curves = build_curves(
        entry,
        bulk,
        &fermi,
        &mu,
        a.dopant.as_deref(),
        a.dopant_mu0,
        a.dopant_deltamu,
    )?;

    output::print_info(&format!(
        "Band gap {:.4} eV, EVBM {:.4} eV, {} sample point(s)",
        bulk.band_gap,
        bulk.vbm,
        fermi.len()
    ));
    print_defect_table(&curves);

    if let Some(ref csv_path) = a.csv {
        curves_to_csv(&curves, &fermi, csv_path)?;
        output::print_success(&format!("Curves saved to '{}'", csv_path.display()));
    }
    if let Some(ref plot_path) = a.output {
        generate_defects_diagram_plot(
            &curves,
            &fermi,
            bulk.band_gap,
            a.ymin,
            a.ymax,
            None,
            &a.compound,
            plot_path,
            a.width,
            a.height,
        )?;
        output::print_success(&format!(
            "Defects diagram saved to '{}'",
            plot_path.display()
        ));
    }
    Ok(())
}

fn run_fermi(db_dir: &Path, a: FermiArgs) -> Result<()> {
    output::print_header(&format!("Equilibrium Fermi Level: {}", a.compound));

    let compounds: CompoundsDb = load_tracker(db_dir, COMPOUNDS_TRACKER)?;
    let defects_db: DefectsDb = load_tracker(db_dir, DEFECTS_TRACKER)?;
    let dos_db: DosDb = load_tracker(db_dir, DOS_TRACKER)?;
    let (entry, bulk) = compound_defects(&defects_db, &a.compound)?;
    let dos = dos_db.get(&a.compound).ok_or_else(|| {
        DefectDbError::InvalidArgument(format!(
            "no DOS data has been imported for '{}'",
            a.compound
        ))
    })?;

    let fermi = fermi_energy_samples(bulk.band_gap, a.samples);
    let mu = build_mu_state(&compounds, &parse_assignments(&a.deltamu)?)?;
    let curves = build_curves(
        entry,
        bulk,
        &fermi,
        &mu,
        a.dopant.as_deref(),
        a.dopant_mu0,
        a.dopant_deltamu,
    )?;

    let mut solver = EquilibriumSolver::new(&curves, &fermi, bulk.band_gap, bulk.volume, dos);
    let pb = progress::create_progress_bar(a.temperatures.len() as u64, "Solving");
    let results: Vec<_> = a
        .temperatures
        .iter()
        .map(|t| {
            let result = solver.solve(*t);
            pb.inc(1);
            result
        })
        .collect();
    pb.finish_and_clear();

    let rows: Vec<EquilibriumRow> = results
        .iter()
        .map(|r| EquilibriumRow {
            temperature: format!("{:.1}", r.temperature),
            fermi_level: r.fermi_level.to_string(),
            holes: format!("{:.4e}", r.holes),
            electrons: format!("{:.4e}", r.electrons),
        })
        .collect();
    println!("{}", Table::new(&rows));

    if let Some(ref csv_path) = a.csv {
        equilibrium_to_csv(&results, csv_path)?;
        output::print_success(&format!("Results saved to '{}'", csv_path.display()));
    }
    Ok(())
}

/// 取一个化合物的缺陷数据及其体相参考
fn compound_defects<'a>(
    db: &'a DefectsDb,
    compound: &str,
) -> Result<(&'a CompoundDefects, &'a BulkRecord)> {
    let entry = db
        .get(compound)
        .ok_or_else(|| DefectDbError::CompoundNotImported(compound.to_string()))?;
    let bulk = entry.bulk.as_ref().ok_or_else(|| {
        DefectDbError::InvalidArgument(format!(
            "no bulk reference data has been imported for '{}'",
            compound
        ))
    })?;
    Ok((entry, bulk))
}

/// 本征 + 可选外掺杂缺陷的最小包络曲线
fn build_curves(
    entry: &CompoundDefects,
    bulk: &BulkRecord,
    fermi: &[f64],
    mu: &MuState,
    dopant: Option<&str>,
    dopant_mu0: f64,
    dopant_deltamu: f64,
) -> Result<Vec<DefectCurve>> {
    let mut per_defect =
        intrinsic_formation_enthalpies(entry, bulk.dft_bulk_energy, bulk.vbm, fermi, mu)?;
    if let Some(label) = dopant {
        let curves = extrinsic_formation_enthalpies(
            entry,
            bulk.dft_bulk_energy,
            bulk.vbm,
            fermi,
            mu,
            label,
            MuValue {
                mu0: dopant_mu0,
                deltamu: dopant_deltamu,
            },
        )?;
        per_defect.insert(label.to_string(), curves);
    }
    Ok(reduce_to_envelopes(entry, &per_defect))
}

fn print_defect_table(curves: &[DefectCurve]) {
    if curves.is_empty() {
        output::print_warning("No defect with at least one charge state was found.");
        return;
    }
    let rows: Vec<DefectRow> = curves
        .iter()
        .map(|c| {
            let last = c.enthalpy.len() - 1;
            DefectRow {
                label: c.label.clone(),
                extrinsic: c.extrinsic.to_string(),
                charge_vbm: c.charge[0],
                enthalpy_vbm: format!("{:.4}", c.enthalpy[0]),
                charge_cbm: c.charge[last],
                enthalpy_cbm: format!("{:.4}", c.enthalpy[last]),
            }
        })
        .collect();
    println!("{}", Table::new(&rows));
}

/// 解析命令行上的 `El=value` 赋值列表
fn parse_assignments(pairs: &[String]) -> Result<BTreeMap<String, f64>> {
    let mut map = BTreeMap::new();
    for pair in pairs {
        let (element, value) = pair.split_once('=').ok_or_else(|| {
            DefectDbError::InvalidArgument(format!(
                "'{}' is not in the form 'El=value' (e.g. Cu=-0.5)",
                pair
            ))
        })?;
        let value: f64 = value.trim().parse().map_err(|_| {
            DefectDbError::InvalidArgument(format!("'{}' is not a numeric shift", pair))
        })?;
        map.insert(element.trim().to_string(), value);
    }
    Ok(map)
}

/// 从元素数据库的 μ0 与命令行偏移装配化学势状态
fn build_mu_state(
    compounds: &CompoundsDb,
    deltamu: &BTreeMap<String, f64>,
) -> Result<MuState> {
    for element in deltamu.keys() {
        if !compounds.elements.contains_key(element) {
            return Err(DefectDbError::InvalidArgument(format!(
                "the element '{}' of the Δμ shift is not in the compounds database",
                element
            )));
        }
    }
    Ok(compounds
        .elements
        .iter()
        .map(|(symbol, record)| {
            (
                symbol.clone(),
                MuValue {
                    mu0: record.mu0,
                    deltamu: deltamu.get(symbol).copied().unwrap_or(0.0),
                },
            )
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignments() {
        let pairs = vec!["Cu=-0.5".to_string(), "Te = 0".to_string()];
        let map = parse_assignments(&pairs).unwrap();
        assert_eq!(map.get("Cu"), Some(&-0.5));
        assert_eq!(map.get("Te"), Some(&0.0));
    }

    #[test]
    fn test_parse_assignments_rejects_malformed() {
        assert!(parse_assignments(&["Cu".to_string()]).is_err());
        assert!(parse_assignments(&["Cu=abc".to_string()]).is_err());
    }

    #[test]
    fn test_build_mu_state_rejects_unknown_element() {
        let compounds = CompoundsDb::default();
        let mut deltamu = BTreeMap::new();
        deltamu.insert("Cu".to_string(), -0.5);
        assert!(build_mu_state(&compounds, &deltamu).is_err());
    }
}
