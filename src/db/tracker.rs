//! # Tracker 仓库
//!
//! JSON 数据库文件的显式仓库抽象：构造时整体读入，`persist` 时整体写出。
//! 每次写出前尽力把旧版本复制到隐藏备份目录（备份失败不致命）。
//! 单写者假设，无锁，无部分更新。
//!
//! 文件不存在时从默认值开始；文件存在但无法解码时报致命错误，
//! 因为后续导入依赖其中的先决数据。
//!
//! ## 依赖关系
//! - 被 `db/compounds.rs`, `db/defects.rs`, `db/dos.rs` 使用
//! - 使用 `serde_json` crate

use crate::error::{DefectDbError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// 备份目录（工作目录下的隐藏目录）
const BACKUP_DIR: &str = ".defectdb";

/// JSON tracker 文件仓库
#[derive(Debug)]
pub struct Tracker<T> {
    path: PathBuf,
    pub data: T,
}

impl<T> Tracker<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    /// 读入 tracker 文件；不存在则以默认值初始化
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data = if path.is_file() {
            let content = fs::read_to_string(&path).map_err(|e| DefectDbError::FileReadError {
                path: path.display().to_string(),
                source: e,
            })?;
            serde_json::from_str(&content).map_err(|e| DefectDbError::TrackerDecodeError {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?
        } else {
            T::default()
        };
        Ok(Tracker { path, data })
    }

    /// tracker 文件是否已经存在于磁盘
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// 备份旧版本（尽力而为）后整体写出
    pub fn persist(&self) -> Result<()> {
        self.backup_previous();

        let json = serde_json::to_string_pretty(&self.data)
            .map_err(|e| DefectDbError::Other(format!("failed to encode tracker: {}", e)))?;
        fs::write(&self.path, json).map_err(|e| DefectDbError::FileWriteError {
            path: self.path.display().to_string(),
            source: e,
        })?;
        Ok(())
    }

    /// 复制旧文件到 `.defectdb/<stem>_Backup.json`；任何失败都吞掉
    fn backup_previous(&self) {
        if !self.path.is_file() {
            return;
        }
        let stem = self
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Tracker");
        let backup_dir = self
            .path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
            .join(BACKUP_DIR);
        if fs::create_dir_all(&backup_dir).is_err() {
            return;
        }
        let backup_path = backup_dir.join(format!("{}_Backup.json", stem));
        let _ = fs::copy(&self.path, backup_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    type Db = BTreeMap<String, f64>;

    #[test]
    fn test_load_missing_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let tracker: Tracker<Db> = Tracker::load(dir.path().join("T.json")).unwrap();
        assert!(tracker.data.is_empty());
        assert!(!tracker.exists());
    }

    #[test]
    fn test_persist_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("T.json");

        let mut tracker: Tracker<Db> = Tracker::load(&path).unwrap();
        tracker.data.insert("mu0".to_string(), -3.5);
        tracker.persist().unwrap();

        let reloaded: Tracker<Db> = Tracker::load(&path).unwrap();
        assert_eq!(reloaded.data.get("mu0"), Some(&-3.5));
    }

    #[test]
    fn test_backup_written_on_second_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("T.json");

        let mut tracker: Tracker<Db> = Tracker::load(&path).unwrap();
        tracker.data.insert("a".to_string(), 1.0);
        tracker.persist().unwrap();
        tracker.data.insert("b".to_string(), 2.0);
        tracker.persist().unwrap();

        let backup = dir.path().join(".defectdb").join("T_Backup.json");
        assert!(backup.is_file());
        // 备份是上一个版本：只含 "a"
        let content = fs::read_to_string(backup).unwrap();
        assert!(content.contains("\"a\""));
        assert!(!content.contains("\"b\""));
    }

    #[test]
    fn test_corrupt_tracker_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("T.json");
        fs::write(&path, "{ not json").unwrap();
        let result: Result<Tracker<Db>> = Tracker::load(&path);
        assert!(result.is_err());
    }
}
