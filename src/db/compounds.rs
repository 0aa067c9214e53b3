//! # 化合物数据库导入器
//!
//! 把元素参考相与化合物的 DFT 计算目录聚合进 `Compounds_Tracker.json`。
//!
//! 前置检查（任一失败即中止本次操作）：目录存在、结构文件存在、
//! 能量日志存在。已存在的键打印非致命提示后直接覆盖。
//!
//! 名义化学计量数来自名称解析；每元素实际原子数与 formula_units
//! 来自结构文件。名称解析只负责枚举化合物包含哪些元素。
//!
//! ## 依赖关系
//! - 被 `commands/import.rs` 使用
//! - 使用 `db/tracker.rs`, `parsers/`, `models/compound.rs`, `utils/`

use crate::db::tracker::Tracker;
use crate::error::{DefectDbError, Result};
use crate::models::{CompoundRecord, CompoundsDb, ElementRecord};
use crate::parsers::energy::{has_energy_file, total_energy};
use crate::parsers::poscar::{load_structure, locate_structure_file, StructurePreference};
use crate::utils::elements::is_element;
use crate::utils::formula::parse_formula;
use crate::utils::output::print_warning;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// `Compounds_Tracker.json` 导入器
pub struct CompoundsImporter {
    tracker: Tracker<CompoundsDb>,
}

impl CompoundsImporter {
    /// 打开（或初始化）化合物数据库
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Ok(CompoundsImporter {
            tracker: Tracker::load(path)?,
        })
    }

    /// 只读访问内存中的数据库
    pub fn db(&self) -> &CompoundsDb {
        &self.tracker.data
    }

    /// 导入纯元素参考相
    ///
    /// 元素导入读原子数时 POSCAR 优先（与化合物相反），沿用原始流水线。
    pub fn add_element(&mut self, symbol: &str, dir: &Path) -> Result<()> {
        self.run_checks(symbol, dir)?;

        if !is_element(symbol) {
            return Err(DefectDbError::UnknownElement(symbol.to_string()));
        }

        let structure = load_structure(dir, symbol, StructurePreference::PoscarFirst)?;
        let dft_count = structure.single_species_count(symbol)?;
        let dft_total_energy = total_energy(dir, symbol)?;
        let formula_units = dft_count;

        self.tracker.data.elements.insert(
            symbol.to_string(),
            ElementRecord {
                elements_list: vec![symbol.to_string()],
                dft_count,
                formula_units,
                number_species: 1,
                dft_total_energy,
                mu0: dft_total_energy / formula_units,
            },
        );
        Ok(())
    }

    /// 导入化合物
    pub fn add_compound(&mut self, formula: &str, dir: &Path) -> Result<()> {
        self.run_checks(formula, dir)?;

        if is_element(formula) {
            return Err(DefectDbError::CompoundIsElement(formula.to_string()));
        }

        // 名称解析：有序元素列表与名义计量数，元素必须已导入
        let units = parse_formula(formula)?;
        let elements_list: Vec<String> = units.iter().map(|u| u.element.clone()).collect();
        let mut nominal_counts = BTreeMap::new();
        for unit in &units {
            if !self.tracker.data.elements.contains_key(&unit.element) {
                return Err(DefectDbError::ElementNotImported {
                    element: unit.element.clone(),
                    compound: formula.to_string(),
                });
            }
            nominal_counts.insert(unit.element.clone(), unit.count);
        }

        // 实际计量数与 formula_units 来自结构文件，CONTCAR 优先
        let structure = load_structure(dir, formula, StructurePreference::ContcarFirst)?;
        let mut dft_counts = BTreeMap::new();
        let mut formula_units = 1.0;
        for (species, count) in structure.species.iter().zip(&structure.counts) {
            let nominal = nominal_counts.get(species).copied().ok_or_else(|| {
                DefectDbError::Other(format!(
                    "The atom '{}' in the structure file is not part of the formula '{}'",
                    species, formula
                ))
            })?;
            dft_counts.insert(species.clone(), *count);
            formula_units = count / nominal;
        }
        let number_species = structure.species.len();

        let dft_total_energy = total_energy(dir, formula)?;

        self.tracker.data.compounds.insert(
            formula.to_string(),
            CompoundRecord {
                elements_list,
                nominal_counts,
                dft_counts,
                formula_units,
                number_species,
                dft_total_energy,
            },
        );
        Ok(())
    }

    /// 写出数据库（先尽力备份旧版本）
    pub fn persist(&self) -> Result<()> {
        self.tracker.persist()
    }

    /// 前置检查 + 覆盖提示
    fn run_checks(&self, name: &str, dir: &Path) -> Result<()> {
        if !dir.is_dir() {
            return Err(DefectDbError::DirectoryNotFound {
                path: dir.display().to_string(),
            });
        }
        if locate_structure_file(dir, StructurePreference::PoscarFirst).is_none() {
            return Err(DefectDbError::StructureFileMissing {
                name: name.to_string(),
                path: dir.display().to_string(),
            });
        }
        if !has_energy_file(dir) {
            return Err(DefectDbError::EnergyFileMissing {
                name: name.to_string(),
                path: dir.display().to_string(),
            });
        }
        if self.tracker.data.compounds.contains_key(name)
            || self.tracker.data.elements.contains_key(name)
        {
            print_warning(&format!(
                "'{}' is already in the database. The imported data will replace the old data.",
                name
            ));
        }
        Ok(())
    }
}
