//! # 态密度数据库导入器
//!
//! 把 DOSCAR 文件聚合进 `DOS_Tracker.json`。数值提取委托给
//! `parsers/doscar.rs`，本模块只负责前置检查与覆盖确认。
//!
//! 化合物必须已存在于缺陷数据库中；覆盖确认默认 "y"
//! （与缺陷导入的默认 "n" 相反，沿用原始流水线）。
//!
//! ## 依赖关系
//! - 被 `commands/import.rs` 使用
//! - 使用 `db/tracker.rs`, `parsers/doscar.rs`, `models/dos.rs`

use crate::db::tracker::Tracker;
use crate::db::ConfirmFn;
use crate::error::{DefectDbError, Result};
use crate::models::defect::DefectsDb;
use crate::models::DosDb;
use crate::parsers::doscar::load_doscar;
use std::path::{Path, PathBuf};

/// `DOS_Tracker.json` 导入器
pub struct DosImporter {
    tracker: Tracker<DosDb>,
}

impl DosImporter {
    /// 打开（或初始化）DOS 数据库
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Ok(DosImporter {
            tracker: Tracker::load(path)?,
        })
    }

    /// 只读访问内存中的数据库
    pub fn db(&self) -> &DosDb {
        &self.tracker.data
    }

    /// 导入一个化合物的 DOS 曲线
    pub fn add_dos(
        &mut self,
        compound: &str,
        doscar_path: &Path,
        defects: &DefectsDb,
        confirm: ConfirmFn,
    ) -> Result<()> {
        if !doscar_path.is_file() {
            return Err(DefectDbError::FileNotFound {
                path: doscar_path.display().to_string(),
            });
        }
        if !defects.contains_key(compound) {
            return Err(DefectDbError::CompoundNotImported(compound.to_string()));
        }
        if self.tracker.data.contains_key(compound) {
            let prompt = format!(
                "The compound '{}' is already in the DOS database. Replace? ([y]/n)",
                compound
            );
            if !confirm(&prompt, true) {
                return Err(DefectDbError::ImportDeclined(compound.to_string()));
            }
        }

        let data = load_doscar(doscar_path)?;
        self.tracker.data.insert(compound.to_string(), data.record);
        Ok(())
    }

    /// 写出数据库（先尽力备份旧版本）
    pub fn persist(&self) -> Result<()> {
        self.tracker.persist()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::defect::CompoundDefects;
    use std::fs;

    const DOSCAR: &str = "\
    8    8    1    0
  0.1123E+02  0.4573E-09  0.4573E-09  0.4573E-09  0.5000E-15
  1.00000000000000
  CAR
 GaAs
   10.0  -10.0  301  3.25  1.0
   -2.00  1.50  0.30
    3.25  0.00  12.0
    5.00  2.75  15.0
";

    fn defects_with(compound: &str) -> DefectsDb {
        let mut db = DefectsDb::new();
        db.insert(compound.to_string(), CompoundDefects::default());
        db
    }

    #[test]
    fn test_add_dos() {
        let root = tempfile::tempdir().unwrap();
        let doscar = root.path().join("DOSCAR");
        fs::write(&doscar, DOSCAR).unwrap();

        let mut importer = DosImporter::open(root.path().join("DOS_Tracker.json")).unwrap();
        let mut confirm = |_: &str, d: bool| d;
        importer
            .add_dos("GaAs", &doscar, &defects_with("GaAs"), &mut confirm)
            .unwrap();

        let record = importer.db().get("GaAs").unwrap();
        assert_eq!(record.dos.len(), 3);
        assert!((record.volume - 0.1123e2 * 1e-24 * 8.0).abs() < 1e-35);
    }

    #[test]
    fn test_add_dos_requires_defects_entry() {
        let root = tempfile::tempdir().unwrap();
        let doscar = root.path().join("DOSCAR");
        fs::write(&doscar, DOSCAR).unwrap();

        let mut importer = DosImporter::open(root.path().join("DOS_Tracker.json")).unwrap();
        let mut confirm = |_: &str, d: bool| d;
        assert!(matches!(
            importer.add_dos("GaAs", &doscar, &DefectsDb::new(), &mut confirm),
            Err(DefectDbError::CompoundNotImported(_))
        ));
    }

    #[test]
    fn test_overwrite_defaults_to_yes() {
        let root = tempfile::tempdir().unwrap();
        let doscar = root.path().join("DOSCAR");
        fs::write(&doscar, DOSCAR).unwrap();
        let defects = defects_with("GaAs");

        let mut importer = DosImporter::open(root.path().join("DOS_Tracker.json")).unwrap();
        // 总是返回默认答案的回调：第一次无提示，第二次默认 "y" → 覆盖成功
        let mut defaults = |_: &str, d: bool| d;
        importer.add_dos("GaAs", &doscar, &defects, &mut defaults).unwrap();
        importer.add_dos("GaAs", &doscar, &defects, &mut defaults).unwrap();

        // 显式拒绝 → 中止
        let mut decline = |_: &str, _: bool| false;
        assert!(matches!(
            importer.add_dos("GaAs", &doscar, &defects, &mut decline),
            Err(DefectDbError::ImportDeclined(_))
        ));
    }
}
