//! # 相稳定性计算器
//!
//! 在化学势偏移空间的 2D 投影上计算主化合物的稳定区域。
//!
//! 元素顺序约定：`order[0]`/`order[1]` 是投影坐标轴，最后一个元素是
//! 因变元（由 Σ nᵢΔμᵢ = ΔH 消去），中间元素的 Δμ 由调用方固定。
//! 二元体系退化：第二个元素即因变元，稳定区域collapse成一条线段。
//!
//! 每个竞争化合物的稳定边界是它的形成焓恰好为零的直线（消去因变元
//! 后对 y 是线性的）；主化合物的稳定区域是所有半平面约束与自身
//! 焓窗口的交集。没有样本同时满足所有约束时区域为空——这是合法的
//! 可上报结果，不是错误。
//!
//! ## 依赖关系
//! - 被 `commands/calc.rs`, `thermo/plot.rs` 使用
//! - 使用 `models/compound.rs`
//! - 使用 `rayon` 并行处理竞争化合物

use crate::error::{DefectDbError, Result};
use crate::models::CompoundsDb;
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Δμ 轴采样点数
pub const DELTAMU_SAMPLES: usize = 1001;

/// 顶点判定：相邻线段斜率变化超过该容差即记录顶点
const SLOPE_TOLERANCE: f64 = 1e-6;

/// 近重复顶点的欧氏距离去重阈值（绘图单位）
const VERTEX_DEDUP_DISTANCE: f64 = 0.01;

/// 半平面系数比较容差
const COEFF_EPS: f64 = 1e-12;

/// 稳定区域：逐 x 采样的下/上边界（仅保留可行样本）
#[derive(Debug, Clone, Default)]
pub struct StabilityRegion {
    pub x: Vec<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl StabilityRegion {
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// 相图计算结果
#[derive(Debug, Clone)]
pub struct PhaseDiagram {
    /// 窗口端点 = min(ΔH/nₑ)，两条轴共用的对称方形窗口
    pub bracket: f64,

    /// 第一轴 Δμ 采样
    pub x: Vec<f64>,

    /// 主化合物稳定极限（因变元 Δμ = 0 的轨迹）
    pub main_boundary: Vec<(f64, f64)>,

    /// 竞争化合物稳定边界，裁剪到可见窗口
    pub competing_boundaries: BTreeMap<String, Vec<(f64, f64)>>,

    /// 稳定区域
    pub region: StabilityRegion,

    /// 区域多边形顶点
    pub vertices: Vec<(f64, f64)>,
}

/// 竞争化合物的半平面约束（y 系数恒定，截距随 x 变化）
enum Constraint {
    /// y <= c(x)
    Upper(Vec<f64>),
    /// y >= c(x)
    Lower(Vec<f64>),
    /// y 无关，逐 x 可行性
    Feasible(Vec<bool>),
}

/// 计算主化合物的 2D 投影相图
///
/// `order` 是主化合物全部元素的排列；`fixed_deltamu` 给出中间元素的
/// 固定偏移（缺省 0.0）。
pub fn calculate_phase_diagram(
    main_compound: &str,
    order: &[String],
    db: &CompoundsDb,
    fixed_deltamu: &BTreeMap<String, f64>,
) -> Result<PhaseDiagram> {
    let record = db
        .compounds
        .get(main_compound)
        .ok_or_else(|| DefectDbError::CompoundNotImported(main_compound.to_string()))?;

    if order.len() != record.elements_list.len() || order.len() < 2 {
        return Err(DefectDbError::InvalidArgument(format!(
            "element order must be a permutation of the {} constituents of '{}'",
            record.elements_list.len(),
            main_compound
        )));
    }
    for element in order {
        if record.nominal_count(element) <= 0.0 {
            return Err(DefectDbError::InvalidArgument(format!(
                "'{}' is not a constituent of '{}'",
                element, main_compound
            )));
        }
    }

    let enthalpy = db.formation_enthalpy(main_compound).ok_or_else(|| {
        DefectDbError::InvalidArgument(format!(
            "missing elemental reference data for '{}'",
            main_compound
        ))
    })?;

    // 窗口端点：min(ΔH/nₑ)
    let bracket = order
        .iter()
        .map(|e| enthalpy / record.nominal_count(e))
        .fold(f64::INFINITY, f64::min);

    let x = linspace(bracket, 0.0, DELTAMU_SAMPLES);

    let binary = order.len() == 2;
    let n1 = record.nominal_count(&order[0]);
    let n2 = record.nominal_count(&order[1]);
    let dependent = &order[order.len() - 1];
    let n_dep = record.nominal_count(dependent);
    // 中间元素（二元/三元时为空切片）
    let fixed: Vec<(String, f64, f64)> = order
        .get(2..order.len() - 1)
        .unwrap_or(&[])
        .iter()
        .map(|e| {
            (
                e.clone(),
                record.nominal_count(e),
                fixed_deltamu.get(e).copied().unwrap_or(0.0),
            )
        })
        .collect();
    let fixed_term: f64 = fixed.iter().map(|(_, n, dm)| n * dm).sum();

    // 主化合物稳定极限：因变元 Δμ = 0（二元时即等式本身）
    let y_main: Vec<f64> = x
        .iter()
        .map(|xi| (enthalpy - n1 * xi - fixed_term) / n2)
        .collect();
    let main_boundary: Vec<(f64, f64)> = x.iter().cloned().zip(y_main.iter().cloned()).collect();

    // 竞争化合物：与主化合物至少共享一个元素。体系之外的元素取
    // Δμ = 0，在投影直线上自然消去，但化合物仍然约束区域。
    let competing: Vec<&String> = db
        .compounds
        .keys()
        .filter(|name| name.as_str() != main_compound)
        .filter(|name| {
            let c = &db.compounds[*name];
            c.elements_list.iter().any(|e| order.contains(e))
        })
        .collect();

    let evaluated: Vec<(String, Vec<(f64, f64)>, Constraint)> = competing
        .par_iter()
        .filter_map(|name| {
            let c_enthalpy = db.formation_enthalpy(name)?;
            let c = &db.compounds[*name];
            let m1 = c.nominal_count(&order[0]);
            let m2 = c.nominal_count(&order[1]);
            let m_fixed: f64 = fixed
                .iter()
                .map(|(e, _, dm)| c.nominal_count(e) * dm)
                .sum();
            let m_dep = c.nominal_count(dependent);

            // 消去因变元后的线性形式 a(x) + b·y <= ΔH_c
            let (a, b): (Vec<f64>, f64) = if binary {
                (x.iter().map(|xi| m1 * xi).collect(), m2)
            } else {
                let ratio = m_dep / n_dep;
                (
                    x.iter()
                        .map(|xi| {
                            m1 * xi + m_fixed + ratio * (enthalpy - n1 * xi - fixed_term)
                        })
                        .collect(),
                    m2 - m_dep * n2 / n_dep,
                )
            };

            let constraint = if b > COEFF_EPS {
                Constraint::Upper(a.iter().map(|ai| (c_enthalpy - ai) / b).collect())
            } else if b < -COEFF_EPS {
                Constraint::Lower(a.iter().map(|ai| (c_enthalpy - ai) / b).collect())
            } else {
                Constraint::Feasible(a.iter().map(|ai| *ai <= c_enthalpy).collect())
            };

            // 可见窗口内的边界曲线
            let curve: Vec<(f64, f64)> = match &constraint {
                Constraint::Upper(ys) | Constraint::Lower(ys) => x
                    .iter()
                    .zip(ys)
                    .filter(|(_, y)| **y >= bracket && **y <= 0.0)
                    .map(|(xi, yi)| (*xi, *yi))
                    .collect(),
                Constraint::Feasible(_) => Vec::new(),
            };

            Some(((*name).clone(), curve, constraint))
        })
        .collect();

    let mut competing_boundaries = BTreeMap::new();
    let mut constraints = Vec::new();
    for (name, curve, constraint) in evaluated {
        competing_boundaries.insert(name, curve);
        constraints.push(constraint);
    }

    // 逐 x 求所有约束的交集
    let mut region = StabilityRegion::default();
    for (i, xi) in x.iter().enumerate() {
        let (mut lo, mut hi) = if binary {
            (y_main[i], y_main[i])
        } else {
            (y_main[i].max(bracket), 0.0)
        };
        if binary && (lo < bracket || hi > 0.0) {
            continue;
        }

        let mut feasible = true;
        for constraint in &constraints {
            match constraint {
                Constraint::Upper(ys) => hi = hi.min(ys[i]),
                Constraint::Lower(ys) => lo = lo.max(ys[i]),
                Constraint::Feasible(flags) => feasible &= flags[i],
            }
        }
        if feasible && lo <= hi + COEFF_EPS {
            region.x.push(*xi);
            region.lower.push(lo);
            region.upper.push(hi);
        }
    }

    let vertices = region_vertices(&region);

    Ok(PhaseDiagram {
        bracket,
        x,
        main_boundary,
        competing_boundaries,
        region,
        vertices,
    })
}

/// 沿区域边界逐段行走，在斜率突变处记录顶点，再去掉近重复点
fn region_vertices(region: &StabilityRegion) -> Vec<(f64, f64)> {
    if region.is_empty() {
        return Vec::new();
    }

    // 闭合边界路径：沿下边界正向，再沿上边界反向
    let mut path: Vec<(f64, f64)> = region
        .x
        .iter()
        .zip(&region.lower)
        .map(|(x, y)| (*x, *y))
        .collect();
    path.extend(
        region
            .x
            .iter()
            .zip(&region.upper)
            .rev()
            .map(|(x, y)| (*x, *y)),
    );
    if let Some(first) = path.first().copied() {
        path.push(first);
    }

    let mut vertices: Vec<(f64, f64)> = Vec::new();
    let mut previous_point: Option<(f64, f64)> = None;
    let mut previous_slope = 0.0;
    for point in path {
        let prev = match previous_point {
            Some(p) => p,
            None => {
                previous_point = Some(point);
                continue;
            }
        };
        let dx = point.0 - prev.0;
        // 垂直段：重置行走状态（沿用原始路径遍历的行为）
        if dx == 0.0 {
            previous_point = Some(point);
            previous_slope = 0.0;
            continue;
        }
        let slope = (point.1 - prev.1) / dx;
        if (slope - previous_slope).abs() > SLOPE_TOLERANCE {
            vertices.push(prev);
            vertices.push(point);
        }
        previous_slope = slope;
        previous_point = Some(point);
    }

    // 去掉与后继距离过近的顶点
    let mut omit = vec![false; vertices.len()];
    for i in 0..vertices.len().saturating_sub(1) {
        let (ax, ay) = vertices[i];
        let (bx, by) = vertices[i + 1];
        if ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt() < VERTEX_DEDUP_DISTANCE {
            omit[i] = true;
        }
    }
    vertices
        .into_iter()
        .zip(omit)
        .filter(|(_, skip)| !skip)
        .map(|(v, _)| v)
        .collect()
}

fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    if count < 2 {
        return vec![start];
    }
    let step = (end - start) / (count - 1) as f64;
    (0..count).map(|i| start + i as f64 * step).collect()
}
