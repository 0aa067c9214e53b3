//! # import 子命令实现
//!
//! 打开对应的 tracker 数据库、执行导入、持久化。覆盖确认回调在这里
//! 装配：交互模式读 stdin，`--yes` 模式总是同意。
//!
//! ## 依赖关系
//! - 使用 `cli/import.rs` 定义的参数
//! - 使用 `db/` 的三个导入器
//! - 使用 `utils/output.rs`, `utils/prompt.rs`

use crate::cli::import::{ImportArgs, ImportCommands};
use crate::db::{
    CompoundsImporter, DefectsImporter, DosImporter, Tracker, COMPOUNDS_TRACKER, DEFECTS_TRACKER,
    DOS_TRACKER,
};
use crate::error::Result;
use crate::models::{CompoundsDb, DefectsDb};
use crate::utils::output;
use crate::utils::prompt::{always_yes, confirm_stdin};

use std::path::Path;

/// 执行数据导入
pub fn execute(args: ImportArgs) -> Result<()> {
    let mut confirm: Box<dyn FnMut(&str, bool) -> bool> = if args.yes {
        Box::new(always_yes)
    } else {
        Box::new(|prompt: &str, default_yes: bool| confirm_stdin(prompt, default_yes))
    };
    let db_dir = &args.db_dir;

    match args.command {
        ImportCommands::Element(a) => {
            output::print_header(&format!("Importing Element: {}", a.symbol));
            let path = db_dir.join(COMPOUNDS_TRACKER);
            let mut importer = CompoundsImporter::open(&path)?;
            importer.add_element(&a.symbol, &a.dir)?;
            importer.persist()?;
            output::print_success(&format!(
                "Element '{}' imported from '{}'",
                a.symbol,
                a.dir.display()
            ));
            print_written(&path);
        }
        ImportCommands::Compound(a) => {
            output::print_header(&format!("Importing Compound: {}", a.formula));
            let path = db_dir.join(COMPOUNDS_TRACKER);
            let mut importer = CompoundsImporter::open(&path)?;
            importer.add_compound(&a.formula, &a.dir)?;
            if let Some(enthalpy) = importer.db().formation_enthalpy(&a.formula) {
                output::print_info(&format!(
                    "Formation enthalpy of '{}': {:.6} eV per formula unit",
                    a.formula, enthalpy
                ));
            }
            importer.persist()?;
            output::print_success(&format!(
                "Compound '{}' imported from '{}'",
                a.formula,
                a.dir.display()
            ));
            print_written(&path);
        }
        ImportCommands::Defects(a) => {
            output::print_header(&format!("Importing Defects: {}", a.compound));
            let compounds = Tracker::<CompoundsDb>::load(db_dir.join(COMPOUNDS_TRACKER))?.data;
            let path = db_dir.join(DEFECTS_TRACKER);
            let mut importer = DefectsImporter::open(&path, compounds)?;
            importer.add_defects(&a.compound, &a.dir, &mut *confirm)?;

            let entry = &importer.db()[a.compound.as_str()];
            output::print_info(&format!(
                "Imported {} defect(s) for '{}'",
                entry.defects.len(),
                a.compound
            ));
            importer.persist()?;
            output::print_success(&format!(
                "Defect data for '{}' imported from '{}'",
                a.compound,
                a.dir.display()
            ));
            print_written(&path);
        }
        ImportCommands::Corrections(a) => {
            output::print_header(&format!("Importing Energy Corrections: {}", a.compound));
            let compounds = Tracker::<CompoundsDb>::load(db_dir.join(COMPOUNDS_TRACKER))?.data;
            let path = db_dir.join(DEFECTS_TRACKER);
            let mut importer = DefectsImporter::open(&path, compounds)?;
            importer.add_energy_corrections(&a.compound, &a.csv_file)?;
            importer.persist()?;
            output::print_success(&format!(
                "Energy corrections for '{}' merged from '{}'",
                a.compound,
                a.csv_file.display()
            ));
            print_written(&path);
        }
        ImportCommands::Dos(a) => {
            output::print_header(&format!("Importing DOS: {}", a.compound));
            let defects = Tracker::<DefectsDb>::load(db_dir.join(DEFECTS_TRACKER))?.data;
            let path = db_dir.join(DOS_TRACKER);
            let mut importer = DosImporter::open(&path)?;
            importer.add_dos(&a.compound, &a.doscar, &defects, &mut *confirm)?;
            importer.persist()?;
            output::print_success(&format!(
                "DOS for '{}' imported from '{}'",
                a.compound,
                a.doscar.display()
            ));
            print_written(&path);
        }
    }

    Ok(())
}

fn print_written(path: &Path) {
    output::print_done(&format!("Database written to '{}'", path.display()));
}
