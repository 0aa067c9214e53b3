//! # 化学式解析
//!
//! 从化合物名称（如 `Cu2HgGeTe4`）解析有序元素列表与名义化学计量数。
//!
//! 名义计量数只来自名称本身；每个元素的实际原子数与 formula_units
//! 由结构文件决定（见 `db/compounds.rs`）。
//!
//! ## 依赖关系
//! - 被 `db/` 与 `thermo/` 模块使用
//! - 使用 `regex` crate

use crate::error::{DefectDbError, Result};
use crate::utils::elements::is_element;
use regex::Regex;

/// 化学式中的一个元素段
#[derive(Debug, Clone, PartialEq)]
pub struct FormulaUnit {
    /// 元素符号
    pub element: String,
    /// 名义化学计量数（默认 1.0）
    pub count: f64,
}

/// 把化学式按大写字母起始的片段切开，返回元素符号列表
///
/// 不校验元素合法性，调用方按需校验。
pub fn element_segments(formula: &str) -> Vec<String> {
    let re = Regex::new(r"[A-Z][^A-Z]*").unwrap();
    re.find_iter(formula)
        .map(|m| m.as_str().chars().filter(|c| !c.is_ascii_digit()).collect())
        .collect()
}

/// 解析化学式为元素 + 名义计量数
///
/// 计量数取元素符号最后一次出现之后的子串，依次尝试 3、2、1 个字符的
/// 数值前缀，都失败则取 1.0。每个元素必须是合法的周期表符号。
pub fn parse_formula(formula: &str) -> Result<Vec<FormulaUnit>> {
    let mut units = Vec::new();

    for element in element_segments(formula) {
        if !is_element(&element) {
            return Err(DefectDbError::UnknownElement(element));
        }

        // 符号最后一次出现之后的子串
        let tail = formula
            .rsplit(element.as_str())
            .next()
            .unwrap_or("")
            .to_string();

        let mut count = 1.0;
        for width in [3usize, 2, 1] {
            let prefix: String = tail.chars().take(width).collect();
            if let Ok(v) = prefix.parse::<f64>() {
                count = v;
                break;
            }
        }

        units.push(FormulaUnit { element, count });
    }

    Ok(units)
}

/// 用 Unicode 下标重写化合物名称（`Cu2HgGeTe4` → `Cu₂HgGeTe₄`）
///
/// 计量数 1 不显示，与正式化学式书写一致。用于图例与表格显示。
pub fn formal_name(formula: &str) -> String {
    let re = Regex::new(r"\d+|[A-Z][a-z]*").unwrap();
    let mut out = String::new();

    for m in re.find_iter(formula) {
        let token = m.as_str();
        if token.chars().all(|c| c.is_ascii_digit()) {
            if token == "1" {
                continue;
            }
            for c in token.chars() {
                let d = c.to_digit(10).unwrap() as usize;
                out.push(['₀', '₁', '₂', '₃', '₄', '₅', '₆', '₇', '₈', '₉'][d]);
            }
        } else {
            out.push_str(token);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quaternary() {
        let units = parse_formula("Cu2HgGeTe4").unwrap();
        let symbols: Vec<&str> = units.iter().map(|u| u.element.as_str()).collect();
        let counts: Vec<f64> = units.iter().map(|u| u.count).collect();
        assert_eq!(symbols, vec!["Cu", "Hg", "Ge", "Te"]);
        assert_eq!(counts, vec![2.0, 1.0, 1.0, 4.0]);
    }

    #[test]
    fn test_parse_implicit_count() {
        let units = parse_formula("GaAs").unwrap();
        assert_eq!(units[0].element, "Ga");
        assert_eq!(units[0].count, 1.0);
        assert_eq!(units[1].element, "As");
        assert_eq!(units[1].count, 1.0);
    }

    #[test]
    fn test_parse_three_digit_count() {
        let units = parse_formula("Cu100Te4").unwrap();
        assert_eq!(units[0].count, 100.0);
        assert_eq!(units[1].count, 4.0);
    }

    #[test]
    fn test_parse_bad_element() {
        assert!(parse_formula("Cu2Xx4").is_err());
    }

    #[test]
    fn test_formal_name() {
        assert_eq!(formal_name("Cu2HgGeTe4"), "Cu₂HgGeTe₄");
        assert_eq!(formal_name("GaAs"), "GaAs");
        assert_eq!(formal_name("Cu1Te1"), "CuTe");
    }
}
