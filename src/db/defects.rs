//! # 缺陷数据库导入器
//!
//! 扫描缺陷计算目录树，把体相参考数据与每缺陷/每电荷态能量聚合进
//! `Defects_Tracker.json`，并从外部 CSV 修正表合并有限尺寸能量修正。
//!
//! 目录树约定：
//! ```text
//! <compound_dir>/
//!   Bulk/            # POSCAR/CONTCAR + OUTCAR/OSZICAR + EIGENVAL
//!   V_Te/q0/ q-1/    # 缺陷目录：<species>_<site>，电荷子目录 q<整数>
//!   Zn_Cu/q0/ q+1/
//! ```
//!
//! 错误分级：目录/前置数据缺失、体相结构中出现意外原子、用户拒绝覆盖
//! 确认为致命；不合法的缺陷目录名、电荷后缀、单个电荷态缺能量日志、
//! 修正表中引用未导入数据的行为跳过并打印诊断。
//!
//! ## 依赖关系
//! - 被 `commands/import.rs` 使用
//! - 使用 `db/tracker.rs`, `parsers/`, `models/`, `utils/`
//! - 使用 `csv` crate

use crate::db::tracker::Tracker;
use crate::db::ConfirmFn;
use crate::error::{DefectDbError, Result};
use crate::models::defect::{
    format_charge, BulkRecord, ChargeEntry, CompoundDefects, DefectRecord, DefectsDb, Extrinsic,
    INTERSTITIAL_MARKER, VACANCY_MARKER,
};
use crate::models::CompoundsDb;
use crate::parsers::eigenval::load_band_edges;
use crate::parsers::energy::{has_energy_file, total_energy};
use crate::parsers::poscar::{load_structure, StructurePreference};
use crate::utils::elements::is_element;
use crate::utils::formula::element_segments;
use crate::utils::output::{print_skip, print_warning};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// 缺陷分类结果：外掺杂标志 + 每元素净原子数变化
pub fn basic_defect_info(
    species: &str,
    site: &str,
    compound_elements: &[String],
) -> (Extrinsic, BTreeMap<String, i64>) {
    let intrinsic = species == VACANCY_MARKER
        || compound_elements.iter().any(|e| e == species);
    let extrinsic = if intrinsic { Extrinsic::No } else { Extrinsic::Yes };

    let mut n: BTreeMap<String, i64> = compound_elements
        .iter()
        .map(|e| (e.clone(), 0i64))
        .collect();
    if species == VACANCY_MARKER {
        n.insert(site.to_string(), -1);
    } else {
        n.insert(species.to_string(), 1);
        if site != INTERSTITIAL_MARKER {
            n.insert(site.to_string(), -1);
        }
    }
    (extrinsic, n)
}

/// `Defects_Tracker.json` 导入器
pub struct DefectsImporter {
    tracker: Tracker<DefectsDb>,

    /// 化合物数据库快照，用于元素前置校验
    compounds: CompoundsDb,

    /// 位点简并度（每次 `add_defects` 从体相结构重建）
    site_multiplicities: BTreeMap<String, f64>,
}

impl DefectsImporter {
    /// 打开（或初始化）缺陷数据库
    pub fn open(path: impl Into<PathBuf>, compounds: CompoundsDb) -> Result<Self> {
        Ok(DefectsImporter {
            tracker: Tracker::load(path)?,
            compounds,
            site_multiplicities: BTreeMap::new(),
        })
    }

    /// 只读访问内存中的数据库
    pub fn db(&self) -> &DefectsDb {
        &self.tracker.data
    }

    /// 导入一个化合物的全部缺陷数据
    ///
    /// 化合物已存在时需要交互确认（默认 "n"），拒绝即中止且不改动数据。
    pub fn add_defects(&mut self, compound: &str, dir: &Path, confirm: ConfirmFn) -> Result<()> {
        self.run_checks(compound, dir, confirm)?;

        // 候选缺陷位点：间隙/空位标记 + 化合物自身的元素
        let compound_elements = element_segments(compound);
        let mut possible_sites = vec![
            INTERSTITIAL_MARKER.to_string(),
            VACANCY_MARKER.to_string(),
        ];
        possible_sites.extend(compound_elements.iter().cloned());

        // 重新导入即整键覆盖
        self.tracker
            .data
            .insert(compound.to_string(), CompoundDefects::default());

        // 体相数据先行，位点简并度由它填充
        self.add_bulk_info(compound, &dir.join("Bulk"))?;

        // 逐缺陷目录导入
        for entry in sorted_subdirs(dir)? {
            let name = entry
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string();
            if name == "Bulk" {
                continue;
            }

            let parts: Vec<&str> = name.split('_').collect();
            let legitimate = parts.len() >= 2
                && possible_sites.iter().any(|s| s == parts[parts.len() - 1])
                && is_element(parts[0]);
            if !legitimate {
                print_skip(&format!(
                    "Defect '{}' in directory '{}' is neither 1) a legitimate defect name for \
                     compound '{}' nor 2) the 'Bulk' folder. Skipping...",
                    name,
                    dir.display(),
                    compound
                ));
                continue;
            }

            self.add_single_defect(compound, &name, &entry, &compound_elements)?;
        }
        Ok(())
    }

    /// 导入单个缺陷的所有电荷态
    fn add_single_defect(
        &mut self,
        compound: &str,
        defect_name: &str,
        dir: &Path,
        compound_elements: &[String],
    ) -> Result<()> {
        let parts: Vec<&str> = defect_name.split('_').collect();
        let species = parts[0];
        let site = parts[parts.len() - 1];

        // species/site 必须已作为元素导入（标记除外）
        if species != VACANCY_MARKER && !self.compounds.elements.contains_key(species) {
            print_warning(&format!(
                "Cannot import '{}' because '{}' does not exist in the compounds database. Skipping...",
                defect_name, species
            ));
            return Ok(());
        }
        if site != INTERSTITIAL_MARKER && !self.compounds.elements.contains_key(site) {
            print_warning(&format!(
                "Cannot import '{}' because '{}' does not exist in the compounds database. Skipping...",
                defect_name, site
            ));
            return Ok(());
        }

        for entry in sorted_subdirs(dir)? {
            let name = entry
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string();

            // 电荷子目录名：最后一个 'q' 之后必须是整数
            let charge = name.rsplit('q').next().and_then(|t| t.parse::<i64>().ok());
            let charge = match charge {
                Some(q) => q,
                None => {
                    print_skip(&format!(
                        "The name '{}' in '{}' is not in the correct format for charge. The correct \
                         format for the charge state of a defect is 'q#', where '#' is an integer \
                         representing the charge state. Skipping...",
                        name,
                        dir.display()
                    ));
                    continue;
                }
            };

            if !has_energy_file(&entry) {
                print_warning(&format!(
                    "Cannot find OUTCAR/OSZICAR file for defect '{}' with charge state '{}' in '{}'. Skipping...",
                    defect_name,
                    charge,
                    entry.display()
                ));
                continue;
            }

            self.add_defect_charge(compound, defect_name, charge, &entry, compound_elements)?;
        }
        Ok(())
    }

    /// 记录一个电荷态的能量（ECorr 初始化为 0.0）
    fn add_defect_charge(
        &mut self,
        compound: &str,
        defect_name: &str,
        charge: i64,
        dir: &Path,
        compound_elements: &[String],
    ) -> Result<()> {
        let energy = total_energy(dir, defect_name)?;

        let parts: Vec<&str> = defect_name.split('_').collect();
        let site = parts[parts.len() - 1];
        let site_multiplicity = self
            .site_multiplicities
            .get(site)
            .copied()
            .unwrap_or(0.0);

        let record = self
            .tracker
            .data
            .entry(compound.to_string())
            .or_default()
            .defects
            .entry(defect_name.to_string())
            .or_insert_with(|| {
                let (extrinsic, n) = basic_defect_info(parts[0], site, compound_elements);
                DefectRecord {
                    extrinsic,
                    n,
                    site_multiplicity,
                    charge: BTreeMap::new(),
                }
            });
        record.charge.insert(
            format_charge(charge),
            ChargeEntry {
                energy,
                e_corr: 0.0,
            },
        );
        Ok(())
    }

    /// 填充体相参考字段并重建位点简并度
    ///
    /// 结构/体积读 CONTCAR 优先，位点简并度读 POSCAR 优先——两者在同一
    /// 目录下可能不一致，沿用原始流水线的既有行为。
    fn add_bulk_info(&mut self, compound: &str, bulk_dir: &Path) -> Result<()> {
        let structure = load_structure(bulk_dir, compound, StructurePreference::ContcarFirst)?;

        let mut dft_counts = BTreeMap::new();
        for (species, count) in structure.species.iter().zip(&structure.counts) {
            dft_counts.insert(species.clone(), *count);
        }
        let number_species = structure.species.len();
        let volume = structure.volume_cm3();

        let dft_bulk_energy = total_energy(bulk_dir, compound)?;
        let edges = load_band_edges(bulk_dir, compound)?;

        self.update_site_multiplicities(compound, bulk_dir)?;

        let entry = self.tracker.data.entry(compound.to_string()).or_default();
        entry.bulk = Some(BulkRecord {
            dft_counts,
            number_species,
            dft_bulk_energy,
            band_gap: edges.band_gap,
            vbm: edges.vbm,
            volume,
        });
        Ok(())
    }

    /// 从体相结构（POSCAR 优先）重建位点简并度
    fn update_site_multiplicities(&mut self, compound: &str, bulk_dir: &Path) -> Result<()> {
        let structure = load_structure(bulk_dir, compound, StructurePreference::PoscarFirst)?;

        let compound_elements = element_segments(compound);
        for species in &structure.species {
            if !compound_elements.iter().any(|e| e == species) {
                return Err(DefectDbError::UnexpectedBulkAtom {
                    atom: species.clone(),
                    compound: compound.to_string(),
                });
            }
        }

        self.site_multiplicities.clear();
        for (species, count) in structure.species.iter().zip(&structure.counts) {
            self.site_multiplicities.insert(species.clone(), *count);
        }
        self.site_multiplicities
            .insert(INTERSTITIAL_MARKER.to_string(), 0.0);
        Ok(())
    }

    /// 从 4 列 CSV 修正表合并有限尺寸能量修正
    ///
    /// 行格式 `compound,defect_label,charge,correction`，正电荷不带 `+`
    /// 前缀（与数据库的序列化约定相反，读入时转换）。引用未导入数据的
    /// 行逐条跳过并打印诊断。
    pub fn add_energy_corrections(&mut self, compound: &str, csv_path: &Path) -> Result<()> {
        if !csv_path.is_file() {
            return Err(DefectDbError::FileNotFound {
                path: csv_path.display().to_string(),
            });
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(csv_path)?;

        let entry = self
            .tracker
            .data
            .get_mut(compound)
            .ok_or_else(|| DefectDbError::CompoundNotImported(compound.to_string()))?;

        for row in reader.records() {
            let row = row?;
            let line = row.iter().collect::<Vec<_>>().join(",");

            if row.len() != 4 {
                print_skip(&format!(
                    "The line '{}' does not have 4 entries and therefore may not be in the correct \
                     format [Compound, Defect, Charge, ECorr]. Skipping...",
                    line
                ));
                continue;
            }
            if &row[0] != compound {
                print_skip(&format!(
                    "The compound in line '{}' is not '{}'. Skipping...",
                    line, compound
                ));
                continue;
            }

            let defect_name = row[1].to_string();
            let charge: Option<i64> = row[2].parse::<f64>().ok().map(|q| q as i64);
            let correction: Option<f64> = row[3].parse().ok();
            let (charge, correction) = match (charge, correction) {
                (Some(q), Some(c)) => (q, c),
                _ => {
                    print_skip(&format!(
                        "The charge or correction value in line '{}' is not numeric. Skipping...",
                        line
                    ));
                    continue;
                }
            };

            let defect = match entry.defects.get_mut(&defect_name) {
                Some(d) => d,
                None => {
                    print_skip(&format!(
                        "The defect in line '{}' cannot be found for compound '{}'. Skipping...",
                        line, compound
                    ));
                    continue;
                }
            };

            // CSV 的裸正数转换为带 + 前缀的数据库键
            let charge_key = format_charge(charge);
            match defect.charge.get_mut(&charge_key) {
                Some(state) => state.e_corr = correction,
                None => {
                    print_skip(&format!(
                        "The charge state in line '{}' cannot be found for defect '{}' in compound '{}'. Skipping...",
                        line, defect_name, compound
                    ));
                }
            }
        }
        Ok(())
    }

    /// 写出数据库（先尽力备份旧版本）
    pub fn persist(&self) -> Result<()> {
        self.tracker.persist()
    }

    /// 前置检查 + 覆盖确认（默认 "n"）
    fn run_checks(&self, compound: &str, dir: &Path, confirm: ConfirmFn) -> Result<()> {
        if !dir.is_dir() {
            return Err(DefectDbError::DirectoryNotFound {
                path: dir.display().to_string(),
            });
        }
        for element in element_segments(compound) {
            if !self.compounds.elements.contains_key(&element) {
                return Err(DefectDbError::ElementNotImported {
                    element,
                    compound: compound.to_string(),
                });
            }
        }
        if !dir.join("Bulk").is_dir() {
            return Err(DefectDbError::BulkFolderMissing(dir.display().to_string()));
        }
        if self.tracker.data.contains_key(compound) {
            let prompt = format!(
                "The compound '{}' is already in the defects database. Replace? (y/[n])",
                compound
            );
            if !confirm(&prompt, false) {
                return Err(DefectDbError::ImportDeclined(compound.to_string()));
            }
        }
        Ok(())
    }
}

/// 按名称排序列出子目录，保证导入顺序确定
fn sorted_subdirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| DefectDbError::FileReadError {
        path: dir.display().to_string(),
        source: e,
    })?;
    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::compound::ElementRecord;
    use std::fs;

    const BULK_POSCAR: &str = "GaAs supercell\n1.0\n11.3 0 0\n0 11.3 0\n0 0 11.3\nGa As\n32 32\nDirect\n";

    const BULK_EIGENVAL: &str = "\
   8    8    1    1
  0.1E-23  0.1E-09 0.1E-09 0.1E-09 0.5E-15
  1.0E-04
  CAR
 GaAs
     18      1      3

  0.0  0.0  0.0  1.0
    1     -5.0  2.0
    2      1.2  2.0
    3      2.4  0.0
";

    fn outcar(energy: f64) -> String {
        format!("  energy  without entropy=  {e}  energy(sigma->0) =  {e}\n", e = energy)
    }

    fn write_bulk(dir: &Path) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join("POSCAR"), BULK_POSCAR).unwrap();
        fs::write(dir.join("OUTCAR"), outcar(-320.0)).unwrap();
        fs::write(dir.join("EIGENVAL"), BULK_EIGENVAL).unwrap();
    }

    fn write_charge_dir(dir: &Path, energy: f64) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join("OUTCAR"), outcar(energy)).unwrap();
    }

    fn compounds_with(elements: &[&str]) -> CompoundsDb {
        let mut db = CompoundsDb::default();
        for el in elements {
            db.elements.insert(
                el.to_string(),
                ElementRecord {
                    elements_list: vec![el.to_string()],
                    dft_count: 2.0,
                    formula_units: 2.0,
                    number_species: 1,
                    dft_total_energy: -6.0,
                    mu0: -3.0,
                },
            );
        }
        db
    }

    fn no_confirm(_: &str, default: bool) -> bool {
        default
    }

    #[test]
    fn test_basic_defect_info_vacancy() {
        let elements = vec!["Cu".to_string(), "Te".to_string()];
        let (extrinsic, n) = basic_defect_info("V", "Te", &elements);
        assert_eq!(extrinsic, Extrinsic::No);
        assert_eq!(n.get("Te"), Some(&-1));
        assert_eq!(n.get("Cu"), Some(&0));
    }

    #[test]
    fn test_basic_defect_info_extrinsic_substitution() {
        let elements = vec!["Cu".to_string(), "Te".to_string()];
        let (extrinsic, n) = basic_defect_info("Zn", "Cu", &elements);
        assert_eq!(extrinsic, Extrinsic::Yes);
        assert_eq!(n.get("Zn"), Some(&1));
        assert_eq!(n.get("Cu"), Some(&-1));
        assert_eq!(n.get("Te"), Some(&0));
    }

    #[test]
    fn test_basic_defect_info_interstitial() {
        let elements = vec!["Ga".to_string(), "As".to_string()];
        let (extrinsic, n) = basic_defect_info("Ga", "i", &elements);
        assert_eq!(extrinsic, Extrinsic::No);
        assert_eq!(n.get("Ga"), Some(&1));
        assert_eq!(n.get("As"), Some(&0));
    }

    #[test]
    fn test_add_defects_full_tree() {
        let root = tempfile::tempdir().unwrap();
        let tree = root.path().join("GaAs");
        write_bulk(&tree.join("Bulk"));
        write_charge_dir(&tree.join("V_As").join("q0"), -310.0);
        write_charge_dir(&tree.join("V_As").join("q-1"), -308.5);
        write_charge_dir(&tree.join("V_As").join("q+2"), -312.0);
        // 不合法目录名与坏电荷后缀都应跳过
        fs::create_dir_all(tree.join("notes")).unwrap();
        fs::create_dir_all(tree.join("V_As").join("qxyz")).unwrap();

        let mut importer = DefectsImporter::open(
            root.path().join("Defects_Tracker.json"),
            compounds_with(&["Ga", "As"]),
        )
        .unwrap();
        let mut confirm = no_confirm;
        importer.add_defects("GaAs", &tree, &mut confirm).unwrap();

        let entry = importer.db().get("GaAs").unwrap();
        let bulk = entry.bulk.as_ref().unwrap();
        assert_eq!(bulk.number_species, 2);
        assert!((bulk.dft_bulk_energy - (-320.0)).abs() < 1e-12);
        assert!((bulk.band_gap - 1.2).abs() < 1e-12);
        assert!((bulk.vbm - 1.2).abs() < 1e-12);
        assert!((bulk.volume - 11.3_f64.powi(3) * 1e-24).abs() < 1e-30);

        let defect = entry.defects.get("V_As").unwrap();
        assert_eq!(defect.extrinsic, Extrinsic::No);
        assert_eq!(defect.site_multiplicity, 32.0);
        assert_eq!(defect.n.get("As"), Some(&-1));
        let charges: Vec<&str> = defect.charge.keys().map(|s| s.as_str()).collect();
        assert_eq!(charges, vec!["+2", "-1", "0"]);
        assert!((defect.charge["0"].energy - (-310.0)).abs() < 1e-12);
        assert_eq!(defect.charge["0"].e_corr, 0.0);
        assert_eq!(entry.defects.len(), 1);
    }

    #[test]
    fn test_reimport_declined_aborts() {
        let root = tempfile::tempdir().unwrap();
        let tree = root.path().join("GaAs");
        write_bulk(&tree.join("Bulk"));

        let mut importer = DefectsImporter::open(
            root.path().join("Defects_Tracker.json"),
            compounds_with(&["Ga", "As"]),
        )
        .unwrap();
        let mut yes = |_: &str, _: bool| true;
        importer.add_defects("GaAs", &tree, &mut yes).unwrap();

        // 默认回答 "n" → 中止
        let mut default_answer = no_confirm;
        assert!(matches!(
            importer.add_defects("GaAs", &tree, &mut default_answer),
            Err(DefectDbError::ImportDeclined(_))
        ));
    }

    #[test]
    fn test_unexpected_bulk_atom_is_fatal() {
        let root = tempfile::tempdir().unwrap();
        let tree = root.path().join("GaAs");
        let bulk = tree.join("Bulk");
        fs::create_dir_all(&bulk).unwrap();
        fs::write(
            bulk.join("POSCAR"),
            "x\n1.0\n11.3 0 0\n0 11.3 0\n0 0 11.3\nGa Sb\n32 32\nDirect\n",
        )
        .unwrap();
        fs::write(bulk.join("OUTCAR"), outcar(-320.0)).unwrap();
        fs::write(bulk.join("EIGENVAL"), BULK_EIGENVAL).unwrap();

        let mut importer = DefectsImporter::open(
            root.path().join("Defects_Tracker.json"),
            compounds_with(&["Ga", "As"]),
        )
        .unwrap();
        let mut confirm = no_confirm;
        assert!(matches!(
            importer.add_defects("GaAs", &tree, &mut confirm),
            Err(DefectDbError::UnexpectedBulkAtom { .. })
        ));
    }

    #[test]
    fn test_energy_corrections_merge_and_skip() {
        let root = tempfile::tempdir().unwrap();
        let tree = root.path().join("GaAs");
        write_bulk(&tree.join("Bulk"));
        write_charge_dir(&tree.join("V_As").join("q2"), -312.0);

        let mut importer = DefectsImporter::open(
            root.path().join("Defects_Tracker.json"),
            compounds_with(&["Ga", "As"]),
        )
        .unwrap();
        let mut confirm = no_confirm;
        importer.add_defects("GaAs", &tree, &mut confirm).unwrap();

        // 正电荷在 CSV 中不带 + 前缀；其余行应逐条跳过
        let csv_path = root.path().join("corrections.csv");
        fs::write(
            &csv_path,
            "GaAs,V_As,2,0.35\nGaAs,V_As,5,0.1\nGaAs,Zn_Ga,0,0.2\nCuTe,V_Te,0,0.3\nbad,row\n",
        )
        .unwrap();
        importer.add_energy_corrections("GaAs", &csv_path).unwrap();

        let defect = &importer.db()["GaAs"].defects["V_As"];
        assert!((defect.charge["+2"].e_corr - 0.35).abs() < 1e-12);
    }

    #[test]
    fn test_corrections_require_imported_compound() {
        let root = tempfile::tempdir().unwrap();
        let csv_path = root.path().join("corrections.csv");
        fs::write(&csv_path, "GaAs,V_As,0,0.1\n").unwrap();

        let mut importer = DefectsImporter::open(
            root.path().join("Defects_Tracker.json"),
            compounds_with(&["Ga", "As"]),
        )
        .unwrap();
        assert!(matches!(
            importer.add_energy_corrections("GaAs", &csv_path),
            Err(DefectDbError::CompoundNotImported(_))
        ));
    }
}
