//! # 相图 / 缺陷图表生成
//!
//! 使用 `plotters` 库把计算结果渲染为 PNG。计算器本身不持有任何
//! 渲染表面，这里只消费普通数值输出。
//!
//! ## 依赖关系
//! - 被 `commands/calc.rs` 调用
//! - 使用 `thermo/phase_stability.rs` 的 PhaseDiagram
//! - 使用 `thermo/formation_energy.rs` 的 DefectCurve
//! - 使用 `plotters` 渲染图表

use crate::error::{DefectDbError, Result};
use crate::thermo::formation_energy::DefectCurve;
use crate::thermo::phase_stability::PhaseDiagram;
use crate::utils::formula::formal_name;

use plotters::prelude::*;
use std::path::Path;

/// 生成化学势空间 2D 投影相图
pub fn generate_phase_diagram_plot(
    diagram: &PhaseDiagram,
    main_compound: &str,
    first_element: &str,
    second_element: &str,
    output_path: &Path,
    width: u32,
    height: u32,
) -> Result<()> {
    let root = BitMapBackend::new(output_path, (width, height)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| DefectDbError::Other(format!("{:?}", e)))?;

    let title = format!("{} phase stability", formal_name(main_compound));
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 28).into_font())
        .margin(30)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(diagram.bracket..0.0, diagram.bracket..0.0)
        .map_err(|e| DefectDbError::Other(format!("{:?}", e)))?;

    chart
        .configure_mesh()
        .x_desc(format!("Δμ_{} (eV)", first_element))
        .y_desc(format!("Δμ_{} (eV)", second_element))
        .x_label_style(("sans-serif", 16))
        .y_label_style(("sans-serif", 16))
        .axis_desc_style(("sans-serif", 18))
        .draw()
        .map_err(|e| DefectDbError::Other(format!("{:?}", e)))?;

    // 稳定区域：下/上边界围成的多边形
    if !diagram.region.is_empty() {
        let mut polygon: Vec<(f64, f64)> = diagram
            .region
            .x
            .iter()
            .zip(&diagram.region.lower)
            .map(|(x, y)| (*x, *y))
            .collect();
        polygon.extend(
            diagram
                .region
                .x
                .iter()
                .zip(&diagram.region.upper)
                .rev()
                .map(|(x, y)| (*x, *y)),
        );
        chart
            .draw_series(std::iter::once(Polygon::new(
                polygon,
                RGBColor(120, 120, 120).mix(0.4),
            )))
            .map_err(|e| DefectDbError::Other(format!("{:?}", e)))?;
    }

    // 主化合物稳定极限
    chart
        .draw_series(LineSeries::new(
            diagram.main_boundary.iter().cloned(),
            BLACK.stroke_width(2),
        ))
        .map_err(|e| DefectDbError::Other(format!("{:?}", e)))?;

    // 竞争化合物边界
    for (i, (name, boundary)) in diagram.competing_boundaries.iter().enumerate() {
        if boundary.is_empty() {
            continue;
        }
        let color = Palette99::pick(i).to_rgba();
        chart
            .draw_series(LineSeries::new(
                boundary.iter().cloned(),
                color.stroke_width(2),
            ))
            .map_err(|e| DefectDbError::Other(format!("{:?}", e)))?
            .label(formal_name(name))
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
            });
    }

    // 区域顶点
    chart
        .draw_series(
            diagram
                .vertices
                .iter()
                .map(|(x, y)| Circle::new((*x, *y), 3, BLACK.filled())),
        )
        .map_err(|e| DefectDbError::Other(format!("{:?}", e)))?;

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(|e| DefectDbError::Other(format!("{:?}", e)))?;

    root.present()
        .map_err(|e| DefectDbError::Other(e.to_string()))?;
    Ok(())
}

/// 生成缺陷形成能 vs 费米能级图
#[allow(clippy::too_many_arguments)]
pub fn generate_defects_diagram_plot(
    curves: &[DefectCurve],
    fermi: &[f64],
    band_gap: f64,
    ymin: f64,
    ymax: f64,
    equilibrium_fermi: Option<f64>,
    main_compound: &str,
    output_path: &Path,
    width: u32,
    height: u32,
) -> Result<()> {
    let root = BitMapBackend::new(output_path, (width, height)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| DefectDbError::Other(format!("{:?}", e)))?;

    let title = format!("{} defect formation energies", formal_name(main_compound));
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 28).into_font())
        .margin(30)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..band_gap, ymin..ymax)
        .map_err(|e| DefectDbError::Other(format!("{:?}", e)))?;

    chart
        .configure_mesh()
        .x_desc("Fermi Energy (eV)")
        .y_desc("ΔH (eV)")
        .x_label_style(("sans-serif", 16))
        .y_label_style(("sans-serif", 16))
        .axis_desc_style(("sans-serif", 18))
        .draw()
        .map_err(|e| DefectDbError::Other(format!("{:?}", e)))?;

    for (i, curve) in curves.iter().enumerate() {
        let color = Palette99::pick(i).to_rgba();
        let label = curve.label.replace('_', " @ ");
        chart
            .draw_series(LineSeries::new(
                fermi.iter().cloned().zip(curve.enthalpy.iter().cloned()),
                color.stroke_width(2),
            ))
            .map_err(|e| DefectDbError::Other(format!("{:?}", e)))?
            .label(label)
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
            });
    }

    // 平衡费米能级竖线
    if let Some(ef) = equilibrium_fermi {
        chart
            .draw_series(LineSeries::new(
                [(ef, ymin), (ef, ymax)],
                BLACK.stroke_width(1),
            ))
            .map_err(|e| DefectDbError::Other(format!("{:?}", e)))?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(|e| DefectDbError::Other(format!("{:?}", e)))?;

    root.present()
        .map_err(|e| DefectDbError::Other(e.to_string()))?;
    Ok(())
}
