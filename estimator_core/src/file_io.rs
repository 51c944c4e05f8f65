//! # File Store
//!
//! Directory-backed [`EstimateStore`] with the same safety features on every
//! write:
//! - **Atomic saves**: write to `.tmp`, fsync, rename over the target
//! - **Directory locking**: one process owns a data directory at a time
//! - **Version validation**: every record carries `schema_version`
//!
//! ## Layout
//!
//! ```text
//! <root>/
//! ├── .estimator.lock        holder metadata + OS lock
//! ├── settings.json
//! └── projects/
//!     └── <uuid>.json
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use estimator_core::file_io::JsonFileStore;
//! use estimator_core::pricing::get_or_init_defaults;
//! use std::path::Path;
//!
//! let mut store = JsonFileStore::open(Path::new("estimator_data"), "site-office")?;
//! let settings = get_or_init_defaults(&mut store)?;
//! // Lock is released when the store is dropped
//! # Ok::<(), estimator_core::errors::EstimateError>(())
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use semver::Version;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::{EstimateError, EstimateResult};
use crate::pricing::AppSettings;
use crate::project::{Project, SCHEMA_VERSION};
use crate::store::{prepare_insert, saved_id, sort_newest_first, EstimateStore};

const LOCK_FILE: &str = ".estimator.lock";
const SETTINGS_FILE: &str = "settings.json";
const PROJECTS_DIR: &str = "projects";

/// Lock metadata stored in the `.estimator.lock` file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// User identifier (email or username)
    pub user_id: String,
    /// Machine name where lock was acquired
    pub machine: String,
    /// Process ID that holds the lock
    pub pid: u32,
    /// When the lock was acquired
    pub locked_at: DateTime<Utc>,
}

impl LockInfo {
    /// Create new lock info for the current process
    pub fn new(user_id: impl Into<String>) -> Self {
        LockInfo {
            user_id: user_id.into(),
            machine: hostname().unwrap_or_else(|| "unknown".to_string()),
            pid: std::process::id(),
            locked_at: Utc::now(),
        }
    }
}

fn hostname() -> Option<String> {
    #[cfg(windows)]
    {
        std::env::var("COMPUTERNAME").ok()
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOSTNAME")
            .ok()
            .or_else(|| std::env::var("HOST").ok())
    }
}

/// Exclusive lock on a data directory, released on drop.
///
/// Holds an OS-level lock (fs2) for process safety and writes a metadata
/// file so other users can see who holds it.
#[derive(Debug)]
pub struct FileLock {
    lock_path: PathBuf,
    _lock_file: File,
    pub info: LockInfo,
}

impl FileLock {
    /// Acquire the lock for `dir`.
    ///
    /// The OS lock decides ownership: it is released when the holding process
    /// exits, however it exits. Fails with [`EstimateError::FileLocked`] only
    /// while another process holds it; metadata left behind by a process that
    /// is gone is taken over.
    pub fn acquire(dir: &Path, user_id: impl Into<String>) -> EstimateResult<Self> {
        let lock_path = dir.join(LOCK_FILE);
        let info = LockInfo::new(user_id);

        // Not truncated until the OS lock is ours, so a live holder's
        // metadata survives a failed attempt
        let mut lock_file = OpenOptions::new()
            .write(true)
            .read(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(io_err("create lock", &lock_path))?;

        if lock_file.try_lock_exclusive().is_err() {
            let (holder, since) = match read_lock_info(&lock_path) {
                Ok(holder) => (
                    format!("{} ({})", holder.user_id, holder.machine),
                    holder.locked_at.to_rfc3339(),
                ),
                Err(_) => ("another process".to_string(), "unknown".to_string()),
            };
            return Err(EstimateError::file_locked(dir.display().to_string(), holder, since));
        }

        if let Ok(previous) = read_lock_info(&lock_path) {
            warn!(
                path = %lock_path.display(),
                holder = %previous.user_id,
                pid = previous.pid,
                "taking over lock left by an exited process"
            );
        }

        let lock_json = serde_json::to_string_pretty(&info)?;
        lock_file
            .set_len(0)
            .and_then(|_| lock_file.write_all(lock_json.as_bytes()))
            .and_then(|_| lock_file.sync_all())
            .map_err(io_err("write lock", &lock_path))?;

        Ok(FileLock {
            lock_path,
            _lock_file: lock_file,
            info,
        })
    }

    /// Holder of the lock on `dir`, if a live process holds it.
    pub fn check(dir: &Path) -> Option<LockInfo> {
        let lock_path = dir.join(LOCK_FILE);
        let handle = File::open(&lock_path).ok()?;
        if handle.try_lock_shared().is_ok() {
            let _ = handle.unlock();
            return None;
        }
        read_lock_info(&lock_path).ok()
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // OS lock is released when _lock_file is dropped
        if let Err(e) = fs::remove_file(&self.lock_path) {
            warn!(path = %self.lock_path.display(), error = %e, "failed to remove lock file");
        }
    }
}

fn read_lock_info(lock_path: &Path) -> EstimateResult<LockInfo> {
    let contents = read_to_string(lock_path, "read lock")?;
    Ok(serde_json::from_str(&contents)?)
}

/// On-disk wrapper adding the schema version to every record.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    schema_version: String,
    data: T,
}

/// Serialize `value` with a schema header and write it atomically.
///
/// 1. Serialize to JSON
/// 2. Write to `<path>.tmp`
/// 3. Sync to disk (fsync)
/// 4. Rename over `path` (atomic on most filesystems)
pub fn write_record<T: Serialize>(value: &T, path: &Path) -> EstimateResult<()> {
    let envelope = Envelope {
        schema_version: SCHEMA_VERSION.to_string(),
        data: value,
    };
    let json = serde_json::to_string_pretty(&envelope)?;
    write_atomic(path, json.as_bytes())
}

/// Read a record written by [`write_record`], checking its schema version.
pub fn read_record<T: DeserializeOwned>(path: &Path) -> EstimateResult<T> {
    let contents = read_to_string(path, "read")?;
    let envelope: Envelope<T> =
        serde_json::from_str(&contents).map_err(|e| EstimateError::SerializationError {
            reason: format!("Invalid JSON in {}: {}", path.display(), e),
        })?;
    validate_version(&envelope.schema_version)?;
    Ok(envelope.data)
}

pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> EstimateResult<()> {
    let tmp_path = tmp_path_for(path);

    let mut tmp_file = File::create(&tmp_path)
        .map_err(io_err("create temp file", &tmp_path))?;

    tmp_file
        .write_all(bytes)
        .map_err(io_err("write temp file", &tmp_path))?;

    tmp_file
        .sync_all()
        .map_err(io_err("sync temp file", &tmp_path))?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        EstimateError::file_error("rename to final", path.display().to_string(), e.to_string())
    })
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

/// Map an I/O failure on `path` to [`EstimateError::FileError`].
fn io_err<'a>(
    operation: &'static str,
    path: &'a Path,
) -> impl FnOnce(io::Error) -> EstimateError + 'a {
    move |e| EstimateError::file_error(operation, path.display().to_string(), e.to_string())
}

fn read_to_string(path: &Path, operation: &'static str) -> EstimateResult<String> {
    let mut file = File::open(path)
        .map_err(io_err(operation, &path))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(io_err(operation, &path))?;
    Ok(contents)
}

/// Validate that a file version is compatible with the current schema.
///
/// Major versions must match; while on 0.x, files from a newer minor version
/// are rejected too.
pub fn validate_version(file_version: &str) -> EstimateResult<()> {
    let mismatch = || EstimateError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };

    let file = Version::parse(file_version).map_err(|_| mismatch())?;
    let current = Version::parse(SCHEMA_VERSION).map_err(|e| EstimateError::Internal {
        message: format!("bad SCHEMA_VERSION: {}", e),
    })?;

    if file.major != current.major {
        return Err(mismatch());
    }
    if current.major == 0 && file.minor > current.minor {
        return Err(mismatch());
    }
    Ok(())
}

/// [`EstimateStore`] persisted under a directory.
#[derive(Debug)]
pub struct JsonFileStore {
    root: PathBuf,
    lock: FileLock,
}

impl JsonFileStore {
    /// Open (creating if needed) a data directory and lock it for this process.
    pub fn open(root: &Path, user_id: impl Into<String>) -> EstimateResult<Self> {
        let projects_dir = root.join(PROJECTS_DIR);
        fs::create_dir_all(&projects_dir).map_err(io_err("create directory", &projects_dir))?;

        let lock = FileLock::acquire(root, user_id)?;
        Ok(JsonFileStore {
            root: root.to_path_buf(),
            lock,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Metadata of the lock this store holds
    pub fn lock_info(&self) -> &LockInfo {
        &self.lock.info
    }

    fn settings_path(&self) -> PathBuf {
        self.root.join(SETTINGS_FILE)
    }

    fn project_path(&self, id: Uuid) -> PathBuf {
        self.root.join(PROJECTS_DIR).join(format!("{}.json", id))
    }
}

impl EstimateStore for JsonFileStore {
    fn load_settings(&self) -> EstimateResult<Option<AppSettings>> {
        let path = self.settings_path();
        if !path.exists() {
            return Ok(None);
        }
        read_record(&path).map(Some)
    }

    fn init_settings_if_absent(&mut self, seed: AppSettings) -> EstimateResult<AppSettings> {
        // The directory lock makes this check-then-create atomic across processes
        if let Some(existing) = self.load_settings()? {
            return Ok(existing);
        }
        write_record(&seed, &self.settings_path())?;
        info!(root = %self.root.display(), "initialised default settings");
        Ok(seed)
    }

    fn save_settings(&mut self, settings: &AppSettings) -> EstimateResult<()> {
        write_record(settings, &self.settings_path())?;
        info!("saved settings");
        Ok(())
    }

    fn insert_project(&mut self, project: Project) -> EstimateResult<Project> {
        let project = prepare_insert(project)?;
        let id = saved_id(&project)?;
        write_record(&project, &self.project_path(id))?;
        info!(%id, name = project.name(), "inserted project");
        Ok(project)
    }

    fn restore_project(&mut self, project: Project) -> EstimateResult<()> {
        let id = saved_id(&project)?;
        write_record(&project, &self.project_path(id))
    }

    fn update_project(&mut self, project: &Project) -> EstimateResult<()> {
        let id = saved_id(project)?;
        let path = self.project_path(id);
        if !path.exists() {
            return Err(EstimateError::project_not_found(id));
        }
        write_record(project, &path)?;
        info!(%id, "updated project");
        Ok(())
    }

    fn get_project(&self, id: Uuid) -> EstimateResult<Option<Project>> {
        let path = self.project_path(id);
        if !path.exists() {
            return Ok(None);
        }
        read_record(&path).map(Some)
    }

    fn list_projects(&self) -> EstimateResult<Vec<Project>> {
        let dir = self.root.join(PROJECTS_DIR);
        let entries = fs::read_dir(&dir)
            .map_err(io_err("list", &dir))?;

        let mut projects = Vec::new();
        for entry in entries {
            let path = entry.map_err(io_err("list", &dir))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            // One unreadable record must not hide the rest
            match read_record::<Project>(&path) {
                Ok(project) => projects.push(project),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable project file")
                }
            }
        }

        sort_newest_first(&mut projects);
        Ok(projects)
    }

    fn delete_project(&mut self, id: Uuid) -> EstimateResult<bool> {
        let path = self.project_path(id);
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(%id, "deleted project");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_err("delete", &path)(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::BuildingSpec;
    use crate::pricing::get_or_init_defaults;
    use crate::project::estimate;
    use std::env::temp_dir;

    fn temp_store_dir(name: &str) -> PathBuf {
        let dir = temp_dir().join(format!("estimator_test_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn sample_project(name: &str) -> Project {
        let spec = BuildingSpec {
            include_slab: true,
            ..BuildingSpec::new(15.0, 12.0, 1)
        };
        estimate(&spec, &AppSettings::default(), Some(name), Utc::now()).unwrap()
    }

    #[test]
    fn test_tmp_path_generation() {
        let tmp = tmp_path_for(Path::new("/data/projects/abc.json"));
        assert_eq!(tmp, Path::new("/data/projects/abc.json.tmp"));
    }

    #[test]
    fn test_lock_info_creation() {
        let info = LockInfo::new("test@example.com");
        assert_eq!(info.user_id, "test@example.com");
        assert!(info.pid > 0);
    }

    #[test]
    fn test_settings_initialised_once_and_persisted() {
        let dir = temp_store_dir("settings");
        {
            let mut store = JsonFileStore::open(&dir, "tester").unwrap();
            assert!(store.load_settings().unwrap().is_none());
            let seeded = get_or_init_defaults(&mut store).unwrap();
            assert_eq!(seeded.prices.gravel_m3, 4000.0);
        }
        {
            let mut store = JsonFileStore::open(&dir, "tester").unwrap();
            let first = store.load_settings().unwrap().unwrap();
            let again = get_or_init_defaults(&mut store).unwrap();
            assert_eq!(first, again);
        }
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_project_roundtrip_is_exact() {
        let dir = temp_store_dir("roundtrip");
        let mut store = JsonFileStore::open(&dir, "tester").unwrap();

        let saved = store.insert_project(sample_project("Villa")).unwrap();
        let loaded = store.require_project(saved.id().unwrap()).unwrap();
        assert_eq!(loaded, saved);
        assert_eq!(loaded.quantities().sand_m3, saved.quantities().sand_m3);

        drop(store);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_atomic_save_leaves_no_tmp_file() {
        let dir = temp_store_dir("atomic");
        let mut store = JsonFileStore::open(&dir, "tester").unwrap();
        let saved = store.insert_project(sample_project("A")).unwrap();

        let path = store.project_path(saved.id().unwrap());
        assert!(path.exists());
        assert!(!tmp_path_for(&path).exists());

        drop(store);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_update_list_delete() {
        let dir = temp_store_dir("crud");
        let mut store = JsonFileStore::open(&dir, "tester").unwrap();

        let mut a = store.insert_project(sample_project("A")).unwrap();
        store.insert_project(sample_project("B")).unwrap();
        assert_eq!(store.list_projects().unwrap().len(), 2);

        a.set_contingency(20.0, Utc::now());
        store.update_project(&a).unwrap();
        let reloaded = store.require_project(a.id().unwrap()).unwrap();
        assert_eq!(reloaded.cost().contingency_percent, 20.0);

        assert!(store.delete_project(a.id().unwrap()).unwrap());
        assert!(!store.delete_project(a.id().unwrap()).unwrap());
        assert_eq!(store.list_projects().unwrap().len(), 1);
        assert!(store.update_project(&a).is_err());

        drop(store);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_second_open_is_locked_out() {
        let dir = temp_store_dir("lock");
        let store = JsonFileStore::open(&dir, "first").unwrap();
        assert_eq!(store.lock_info().user_id, "first");
        assert!(dir.join(LOCK_FILE).exists());

        let second = JsonFileStore::open(&dir, "second");
        let err = second.unwrap_err();
        assert!(err.is_recoverable());

        drop(store);
        assert!(!dir.join(LOCK_FILE).exists());
        assert!(FileLock::check(&dir).is_none());
        assert!(JsonFileStore::open(&dir, "second").is_ok());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_version_validation() {
        assert!(validate_version(SCHEMA_VERSION).is_ok());
        assert!(validate_version("0.1.0").is_ok());
        assert!(validate_version("0.1.5").is_ok());
        assert!(validate_version("0.0.9").is_ok());

        assert!(validate_version("1.0.0").is_err());
        assert!(validate_version("0.2.0").is_err());
        assert!(validate_version("not-a-version").is_err());
    }

    #[test]
    fn test_newer_schema_rejected_on_read() {
        let dir = temp_store_dir("schema");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("record.json");
        fs::write(&path, r#"{"schema_version": "0.9.0", "data": 1}"#).unwrap();

        let err = read_record::<u32>(&path).unwrap_err();
        assert_eq!(err.error_code(), "VERSION_MISMATCH");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_lock_left_by_exited_process_is_taken_over() {
        let dir = temp_store_dir("crashed");
        fs::create_dir_all(&dir).unwrap();

        // Metadata from a holder that exited without cleanup; its OS lock is gone
        let leftover = LockInfo {
            user_id: "crashed".to_string(),
            machine: "unknown".to_string(),
            pid: 999_999,
            locked_at: Utc::now(),
        };
        fs::write(dir.join(LOCK_FILE), serde_json::to_string(&leftover).unwrap()).unwrap();
        assert!(FileLock::check(&dir).is_none());

        let store = JsonFileStore::open(&dir, "tester").unwrap();
        assert_eq!(store.lock_info().user_id, "tester");

        let on_disk = read_lock_info(&dir.join(LOCK_FILE)).unwrap();
        assert_eq!(on_disk.user_id, "tester");
        assert_eq!(on_disk.pid, std::process::id());

        drop(store);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_check_reports_live_holder() {
        let dir = temp_store_dir("check");
        let store = JsonFileStore::open(&dir, "holder").unwrap();

        let holder = FileLock::check(&dir).unwrap();
        assert_eq!(holder.user_id, "holder");

        match JsonFileStore::open(&dir, "second").unwrap_err() {
            EstimateError::FileLocked { locked_by, .. } => assert!(locked_by.starts_with("holder")),
            other => panic!("unexpected error: {:?}", other),
        }

        drop(store);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_list_skips_unreadable_project_files() {
        let dir = temp_store_dir("unreadable");
        let mut store = JsonFileStore::open(&dir, "tester").unwrap();
        let saved = store.insert_project(sample_project("Good")).unwrap();

        let projects_dir = dir.join(PROJECTS_DIR);
        fs::write(projects_dir.join("garbage.json"), "not json").unwrap();
        fs::write(
            projects_dir.join("future.json"),
            r#"{"schema_version": "0.9.0", "data": {}}"#,
        )
        .unwrap();

        let listed = store.list_projects().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id(), saved.id());

        drop(store);
        let _ = fs::remove_dir_all(&dir);
    }
}
