//! # 元素周期表
//!
//! 全部 118 个元素符号，用于校验导入的元素与缺陷名称。
//!
//! ## 依赖关系
//! - 被 `db/` 与 `utils/formula.rs` 使用
//! - 无外部模块依赖

/// 周期表元素符号（按原子序数排列）
pub const PERIODIC_TABLE: [&str; 118] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S", "Cl",
    "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As",
    "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In",
    "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd", "Tb",
    "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", "Tl",
    "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk",
    "Cf", "Es", "Fm", "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", "Rg", "Cn",
    "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
];

/// 判断符号是否为合法元素
pub fn is_element(symbol: &str) -> bool {
    PERIODIC_TABLE.contains(&symbol)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_elements() {
        assert!(is_element("Cu"));
        assert!(is_element("Te"));
        assert!(is_element("V"));
        assert!(is_element("Og"));
    }

    #[test]
    fn test_unknown_symbols() {
        assert!(!is_element("Xx"));
        assert!(!is_element("cu"));
        assert!(!is_element(""));
        assert!(!is_element("i"));
    }
}
