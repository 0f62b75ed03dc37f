// ==========================================
// 合同事项台账 - 记录集合存储
// ==========================================
// 职责: 整集合 JSON 持久化 / id 生成 / append-replace 合并 / CRUD
// 持久化纪律:
// - 整个集合是持久化单元：写临时文件 → fsync → rename 覆盖
// - 写操作（读-改-写）在按文件路径划分的单写者临界区内执行
// - 读操作不加锁，读到的总是最近一次完整 rename 的快照
// ==========================================

use crate::domain::types::MergeMode;
use crate::repository::error::{RepositoryError, RepositoryResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 生成记录 id（UUID v4，高熵，不复用）
pub fn generate_record_id() -> String {
    Uuid::new_v4().simple().to_string()
}

// ==========================================
// StoredRecord Trait
// ==========================================
// 用途: 可存入 RecordStore 的记录类型
pub trait StoredRecord: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// 实体名（用于错误信息）
    const ENTITY: &'static str;

    fn record_id(&self) -> &str;
}

// ==========================================
// 单写者锁注册表（按集合文件规范路径）
// ==========================================
// 同一文件的多个 RecordStore 句柄共享同一把写锁
static WRITER_LOCKS: OnceLock<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> = OnceLock::new();

fn writer_lock_for(key: &Path) -> Arc<Mutex<()>> {
    let registry = WRITER_LOCKS.get_or_init(|| Mutex::new(HashMap::new()));
    // 注册表只存放锁句柄，中毒后内容仍然有效
    let mut locks = registry.lock().unwrap_or_else(|e| e.into_inner());
    locks
        .entry(key.to_path_buf())
        .or_insert_with(|| Arc::new(Mutex::new(())))
        .clone()
}

fn lock_key(path: &Path) -> PathBuf {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let parent = parent.canonicalize().unwrap_or_else(|_| parent.to_path_buf());
    match path.file_name() {
        Some(name) => parent.join(name),
        None => parent,
    }
}

// ==========================================
// RecordStore
// ==========================================
pub struct RecordStore<T> {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for RecordStore<T> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            write_lock: Arc::clone(&self.write_lock),
            _marker: PhantomData,
        }
    }
}

impl<T: StoredRecord> RecordStore<T> {
    /// 打开集合（文件不存在时视为空集合，首次写入时创建）
    ///
    /// # 参数
    /// - path: 集合 JSON 文件路径
    pub fn open(path: impl Into<PathBuf>) -> RepositoryResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let write_lock = writer_lock_for(&lock_key(&path));
        Ok(Self {
            path,
            write_lock,
            _marker: PhantomData,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取完整集合（保持持久化顺序）
    pub fn load(&self) -> RepositoryResult<Vec<T>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        serde_json::from_slice(&bytes).map_err(|e| RepositoryError::CorruptCollection {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// 合并候选记录
    ///
    /// # 参数
    /// - candidates: 候选记录（id 已在创建时生成）
    /// - mode: append 追加 / replace 整体替换
    ///
    /// # 返回
    /// - Ok(usize): 合并后集合记录数
    /// - Err(EmptyId / DuplicateId): 候选 id 非法，不发生任何写入
    pub fn merge(&self, candidates: Vec<T>, mode: MergeMode) -> RepositoryResult<usize> {
        let candidate_count = candidates.len();
        let persisted = self.modify(move |records| {
            let mut seen: HashSet<String> = match mode {
                MergeMode::Append => records.iter().map(|r| r.record_id().to_string()).collect(),
                MergeMode::Replace => HashSet::new(),
            };
            for candidate in &candidates {
                check_new_id(candidate, &mut seen)?;
            }

            match mode {
                MergeMode::Append => records.extend(candidates),
                MergeMode::Replace => *records = candidates,
            }
            Ok(records.len())
        })?;

        info!(
            collection = %self.path.display(),
            %mode,
            candidates = candidate_count,
            persisted,
            "集合合并完成"
        );
        Ok(persisted)
    }

    /// 按 id 查询
    pub fn get(&self, id: &str) -> RepositoryResult<Option<T>> {
        Ok(self.load()?.into_iter().find(|r| r.record_id() == id))
    }

    /// 新增单条记录
    pub fn insert(&self, record: T) -> RepositoryResult<T> {
        self.modify(move |records| {
            let mut seen: HashSet<String> =
                records.iter().map(|r| r.record_id().to_string()).collect();
            check_new_id(&record, &mut seen)?;
            records.push(record.clone());
            Ok(record)
        })
    }

    /// 更新单条记录（id 不可修改）
    pub fn update<F>(&self, id: &str, apply: F) -> RepositoryResult<T>
    where
        F: FnOnce(&mut T),
    {
        self.modify(move |records| {
            let record = records
                .iter_mut()
                .find(|r| r.record_id() == id)
                .ok_or_else(|| not_found::<T>(id))?;
            apply(record);
            if record.record_id() != id {
                return Err(RepositoryError::ImmutableId {
                    from: id.to_string(),
                    to: record.record_id().to_string(),
                });
            }
            Ok(record.clone())
        })
    }

    /// 删除单条记录
    pub fn remove(&self, id: &str) -> RepositoryResult<T> {
        self.modify(move |records| {
            let pos = records
                .iter()
                .position(|r| r.record_id() == id)
                .ok_or_else(|| not_found::<T>(id))?;
            Ok(records.remove(pos))
        })
    }

    /// 在临界区内校验后删除单条记录
    ///
    /// # 参数
    /// - check: 删除前对目标记录的校验，返回 Err 时不发生写入
    pub fn remove_if<F>(&self, id: &str, check: F) -> RepositoryResult<T>
    where
        F: FnOnce(&T) -> RepositoryResult<()>,
    {
        self.modify(move |records| {
            let pos = records
                .iter()
                .position(|r| r.record_id() == id)
                .ok_or_else(|| not_found::<T>(id))?;
            check(&records[pos])?;
            Ok(records.remove(pos))
        })
    }

    // ==========================================
    // 临界区: 加锁 → 读 → 改 → 原子写
    // ==========================================
    pub(crate) fn modify<R, F>(&self, change: F) -> RepositoryResult<R>
    where
        F: FnOnce(&mut Vec<T>) -> RepositoryResult<R>,
    {
        let _guard = self.lock_writer();
        let mut records = self.load()?;
        let out = change(&mut records)?;
        self.write_atomic(&records)?;
        Ok(out)
    }

    fn lock_writer(&self) -> MutexGuard<'_, ()> {
        // 写入为整文件原子替换，锁中毒时磁盘上的集合仍然完整
        self.write_lock.lock().unwrap_or_else(|e| {
            warn!(collection = %self.path.display(), "写锁已中毒，继续使用");
            e.into_inner()
        })
    }

    fn write_atomic(&self, records: &[T]) -> RepositoryResult<()> {
        let json = serde_json::to_vec_pretty(records)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        replace_file_atomically(&self.path, &json)?;

        debug!(collection = %self.path.display(), records = records.len(), "集合已原子写入");
        Ok(())
    }
}

/// 整文件原子替换: 临时兄弟文件 → fsync → rename → fsync 目录
///
/// 失败时删除临时文件，目标文件保持原状
fn replace_file_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("collection");
    let temp_path = path.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4().simple()));

    let written = (|| -> std::io::Result<()> {
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&temp_path, path)
    })();

    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    sync_parent_dir(path)
}

// rename 本身的持久化依赖目录项落盘
#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::File::open(parent)?.sync_all(),
        _ => fs::File::open(".")?.sync_all(),
    }
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

fn check_new_id<T: StoredRecord>(record: &T, seen: &mut HashSet<String>) -> RepositoryResult<()> {
    let id = record.record_id();
    if id.trim().is_empty() {
        return Err(RepositoryError::EmptyId {
            entity: T::ENTITY.to_string(),
        });
    }
    if !seen.insert(id.to_string()) {
        return Err(RepositoryError::DuplicateId {
            entity: T::ENTITY.to_string(),
            id: id.to_string(),
        });
    }
    Ok(())
}

fn not_found<T: StoredRecord>(id: &str) -> RepositoryError {
    RepositoryError::NotFound {
        entity: T::ENTITY.to_string(),
        id: id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: String,
        body: String,
    }

    impl StoredRecord for Note {
        const ENTITY: &'static str = "Note";

        fn record_id(&self) -> &str {
            &self.id
        }
    }

    fn note(body: &str) -> Note {
        Note {
            id: generate_record_id(),
            body: body.to_string(),
        }
    }

    fn open_store(dir: &TempDir) -> RecordStore<Note> {
        RecordStore::open(dir.path().join("notes.json")).unwrap()
    }

    #[test]
    fn test_missing_file_is_empty_collection() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_append_keeps_existing_in_order() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let first = vec![note("a"), note("b")];
        assert_eq!(store.merge(first.clone(), MergeMode::Append).unwrap(), 2);
        let second = vec![note("c")];
        assert_eq!(store.merge(second.clone(), MergeMode::Append).unwrap(), 3);

        let loaded = store.load().unwrap();
        assert_eq!(loaded[0], first[0]);
        assert_eq!(loaded[1], first[1]);
        assert_eq!(loaded[2], second[0]);
    }

    #[test]
    fn test_replace_discards_existing() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        store.merge(vec![note("a"), note("b")], MergeMode::Append).unwrap();
        let fresh = vec![note("c")];
        assert_eq!(store.merge(fresh.clone(), MergeMode::Replace).unwrap(), 1);
        assert_eq!(store.load().unwrap(), fresh);
    }

    #[test]
    fn test_duplicate_id_rejected_without_write() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let existing = note("a");
        store.merge(vec![existing.clone()], MergeMode::Append).unwrap();

        let clash = Note {
            id: existing.id.clone(),
            body: "other".to_string(),
        };
        let err = store.merge(vec![note("b"), clash], MergeMode::Append).unwrap_err();
        assert!(matches!(err, RepositoryError::DuplicateId { .. }));
        assert_eq!(store.load().unwrap(), vec![existing]);
    }

    #[test]
    fn test_empty_id_rejected() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let blank = Note {
            id: " ".to_string(),
            body: "x".to_string(),
        };
        assert!(matches!(
            store.merge(vec![blank], MergeMode::Replace),
            Err(RepositoryError::EmptyId { .. })
        ));
    }

    #[test]
    fn test_crud_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let n = store.insert(note("draft")).unwrap();
        let updated = store.update(&n.id, |r| r.body = "final".to_string()).unwrap();
        assert_eq!(updated.body, "final");
        assert_eq!(store.get(&n.id).unwrap().unwrap().body, "final");

        let err = store
            .update(&n.id, |r| r.id = "changed".to_string())
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ImmutableId { .. }));
        assert_eq!(store.get(&n.id).unwrap().unwrap().body, "final");

        store.remove(&n.id).unwrap();
        assert!(store.get(&n.id).unwrap().is_none());
        assert!(matches!(
            store.remove(&n.id),
            Err(RepositoryError::NotFound { .. })
        ));
    }

    #[test]
    fn test_corrupt_file_reported() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        fs::write(store.path(), b"{ not json").unwrap();
        assert!(matches!(
            store.load(),
            Err(RepositoryError::CorruptCollection { .. })
        ));
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        store.merge(vec![note("a")], MergeMode::Append).unwrap();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["notes.json".to_string()]);
    }

    #[test]
    fn test_handles_on_same_file_share_lock() {
        let dir = TempDir::new().unwrap();
        let a = open_store(&dir);
        let b = open_store(&dir);
        assert!(Arc::ptr_eq(&a.write_lock, &b.write_lock));
    }

    #[test]
    fn test_concurrent_appends_lose_nothing() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for j in 0..5 {
                        store
                            .merge(vec![note(&format!("{}-{}", i, j))], MergeMode::Append)
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 40);
        let ids: HashSet<_> = loaded.iter().map(|n| n.id.clone()).collect();
        assert_eq!(ids.len(), 40);
    }

    // 序列化可控失败的记录
    #[derive(Debug, Clone, Deserialize)]
    struct Fragile {
        id: String,
        poisoned: bool,
    }

    impl Serialize for Fragile {
        fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            use serde::ser::SerializeStruct;
            if self.poisoned {
                return Err(serde::ser::Error::custom("record cannot be serialized"));
            }
            let mut st = serializer.serialize_struct("Fragile", 2)?;
            st.serialize_field("id", &self.id)?;
            st.serialize_field("poisoned", &self.poisoned)?;
            st.end()
        }
    }

    impl StoredRecord for Fragile {
        const ENTITY: &'static str = "Fragile";

        fn record_id(&self) -> &str {
            &self.id
        }
    }

    fn dir_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_failed_write_keeps_previous_file() {
        let dir = TempDir::new().unwrap();
        let store: RecordStore<Fragile> = RecordStore::open(dir.path().join("fragile.json")).unwrap();
        let healthy = Fragile {
            id: generate_record_id(),
            poisoned: false,
        };
        store.merge(vec![healthy], MergeMode::Append).unwrap();
        let before = fs::read(store.path()).unwrap();

        let bad = Fragile {
            id: generate_record_id(),
            poisoned: true,
        };
        for mode in [MergeMode::Append, MergeMode::Replace] {
            let err = store.merge(vec![bad.clone()], mode).unwrap_err();
            assert!(matches!(err, RepositoryError::Serialization(_)));
        }

        assert_eq!(fs::read(store.path()).unwrap(), before);
        assert_eq!(store.load().unwrap().len(), 1);
        assert_eq!(dir_entries(dir.path()), vec!["fragile.json".to_string()]);
    }

    #[test]
    fn test_failed_rename_removes_temp_and_keeps_target() {
        let dir = TempDir::new().unwrap();
        // 目标是非空目录，rename 必然失败
        let target = dir.path().join("notes.json");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep.txt"), b"keep").unwrap();

        assert!(replace_file_atomically(&target, b"[]").is_err());

        assert!(target.is_dir());
        assert_eq!(fs::read(target.join("keep.txt")).unwrap(), b"keep");
        assert_eq!(dir_entries(dir.path()), vec!["notes.json".to_string()]);
    }

    #[test]
    fn test_replace_file_atomically_overwrites() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("notes.json");
        replace_file_atomically(&target, b"[1]").unwrap();
        replace_file_atomically(&target, b"[2]").unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"[2]");
        assert_eq!(dir_entries(dir.path()), vec!["notes.json".to_string()]);
    }

    #[test]
    fn test_remove_if_check_blocks_removal() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let n = store.insert(note("pinned")).unwrap();

        let err = store
            .remove_if(&n.id, |r| {
                if r.body == "pinned" {
                    Err(RepositoryError::InUse {
                        entity: Note::ENTITY.to_string(),
                        name: r.body.clone(),
                    })
                } else {
                    Ok(())
                }
            })
            .unwrap_err();
        assert!(matches!(err, RepositoryError::InUse { .. }));
        assert!(store.get(&n.id).unwrap().is_some());

        store.remove_if(&n.id, |_| Ok(())).unwrap();
        assert!(store.load().unwrap().is_empty());
    }
}
