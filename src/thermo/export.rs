//! # 计算结果导出
//!
//! 导出计算结果到 CSV：相图区域顶点、缺陷形成能曲线、
//! 多温度平衡结果表。
//!
//! ## 依赖关系
//! - 被 `commands/calc.rs` 调用
//! - 使用 `csv` 库写入 CSV 文件

use crate::error::{DefectDbError, Result};
use crate::thermo::equilibrium::EquilibriumResult;
use crate::thermo::formation_energy::DefectCurve;
use crate::thermo::phase_stability::PhaseDiagram;

use std::path::Path;

/// 导出相图稳定区域顶点为 CSV 格式
pub fn vertices_to_csv(
    diagram: &PhaseDiagram,
    first_element: &str,
    second_element: &str,
    output_path: &Path,
) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path).map_err(DefectDbError::CsvError)?;

    wtr.write_record([
        format!("deltamu_{}", first_element),
        format!("deltamu_{}", second_element),
    ])
    .map_err(DefectDbError::CsvError)?;

    for (x, y) in &diagram.vertices {
        wtr.write_record([format!("{:.6}", x), format!("{:.6}", y)])
            .map_err(DefectDbError::CsvError)?;
    }

    wtr.flush().map_err(|e| DefectDbError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;
    Ok(())
}

/// 导出缺陷形成能最小包络曲线为 CSV 格式
///
/// 第一列为费米能级，其后每个缺陷两列：形成焓与占主导的电荷态。
pub fn curves_to_csv(
    curves: &[DefectCurve],
    fermi: &[f64],
    output_path: &Path,
) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path).map_err(DefectDbError::CsvError)?;

    let mut header = vec!["fermi_energy".to_string()];
    for curve in curves {
        header.push(curve.label.clone());
        header.push(format!("{}_charge", curve.label));
    }
    wtr.write_record(&header).map_err(DefectDbError::CsvError)?;

    for (i, ef) in fermi.iter().enumerate() {
        let mut row = vec![format!("{:.4}", ef)];
        for curve in curves {
            row.push(format!("{:.6}", curve.enthalpy[i]));
            row.push(curve.charge[i].to_string());
        }
        wtr.write_record(&row).map_err(DefectDbError::CsvError)?;
    }

    wtr.flush().map_err(|e| DefectDbError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;
    Ok(())
}

/// 导出多温度平衡结果表为 CSV 格式
pub fn equilibrium_to_csv(results: &[EquilibriumResult], output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path).map_err(DefectDbError::CsvError)?;

    wtr.write_record(["temperature_K", "fermi_level_eV", "holes_cm3", "electrons_cm3"])
        .map_err(DefectDbError::CsvError)?;

    for result in results {
        wtr.write_record([
            format!("{:.1}", result.temperature),
            result.fermi_level.to_string(),
            format!("{:.6e}", result.holes),
            format!("{:.6e}", result.electrons),
        ])
        .map_err(DefectDbError::CsvError)?;
    }

    wtr.flush().map_err(|e| DefectDbError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thermo::equilibrium::FermiLevel;

    #[test]
    fn test_equilibrium_csv_keeps_sentinel_strings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("equilibrium.csv");
        let results = vec![
            EquilibriumResult {
                temperature: 300.0,
                fermi_level: FermiLevel::Energy(0.42),
                holes: 1.0e17,
                electrons: 3.0e12,
            },
            EquilibriumResult {
                temperature: 900.0,
                fermi_level: FermiLevel::AboveCbm,
                holes: 1.0e10,
                electrons: 8.0e19,
            },
        ];

        equilibrium_to_csv(&results, &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("0.4200"));
        assert!(content.contains("> ECBM"));
    }
}
