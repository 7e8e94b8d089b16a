//! 语言选择持久化
//!
//! 保存最近一次选择的语言（键 `selectedLanguage`）。提供内存实现和基于
//! redb 的磁盘实现。

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use redb::{Database, TableDefinition, TableError};

use crate::translation::config::constants;
use crate::translation::error::TranslationResult;

const PREFERENCES: TableDefinition<&str, &str> = TableDefinition::new("preferences");

/// 语言选择存储
pub trait LanguageStore {
    /// 读取已保存的语言代码
    fn load(&self) -> TranslationResult<Option<String>>;

    /// 保存语言代码
    fn save(&self, code: &str) -> TranslationResult<()>;
}

/// 内存存储，克隆后共享同一份数据
#[derive(Debug, Clone, Default)]
pub struct MemoryLanguageStore {
    selected: Arc<Mutex<Option<String>>>,
}

impl MemoryLanguageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以给定语言初始化
    pub fn with_language(code: &str) -> Self {
        Self {
            selected: Arc::new(Mutex::new(Some(code.to_string()))),
        }
    }
}

impl LanguageStore for MemoryLanguageStore {
    fn load(&self) -> TranslationResult<Option<String>> {
        Ok(self
            .selected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, code: &str) -> TranslationResult<()> {
        *self.selected.lock().unwrap_or_else(PoisonError::into_inner) = Some(code.to_string());
        Ok(())
    }
}

/// 基于 redb 的磁盘存储
pub struct RedbLanguageStore {
    db: Database,
    path: PathBuf,
}

impl std::fmt::Debug for RedbLanguageStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbLanguageStore")
            .field("path", &self.path)
            .finish()
    }
}

impl RedbLanguageStore {
    /// 打开（不存在时创建）状态文件
    pub fn open<P: AsRef<Path>>(path: P) -> TranslationResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = Database::create(&path)?;
        tracing::debug!("打开语言状态文件: {}", path.display());
        Ok(Self { db, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LanguageStore for RedbLanguageStore {
    fn load(&self) -> TranslationResult<Option<String>> {
        let read_txn = self.db.begin_read()?;
        let table = match read_txn.open_table(PREFERENCES) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let value = table.get(constants::LANGUAGE_STORAGE_KEY)?;
        Ok(value.map(|guard| guard.value().to_string()))
    }

    fn save(&self, code: &str) -> TranslationResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(PREFERENCES)?;
            table.insert(constants::LANGUAGE_STORAGE_KEY, code)?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_is_shared_between_clones() {
        let store = MemoryLanguageStore::new();
        let view = store.clone();

        assert_eq!(store.load().unwrap(), None);
        store.save("fr").unwrap();
        assert_eq!(view.load().unwrap().as_deref(), Some("fr"));
    }

    #[test]
    fn test_redb_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("language.redb");

        {
            let store = RedbLanguageStore::open(&path).unwrap();
            assert_eq!(store.load().unwrap(), None, "Fresh store has no selection");
            store.save("de").unwrap();
            store.save("it").unwrap();
        }

        let reopened = RedbLanguageStore::open(&path).unwrap();
        assert_eq!(reopened.load().unwrap().as_deref(), Some("it"));
    }
}
