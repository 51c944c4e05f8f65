//! # Backup and Restore
//!
//! A backup is one JSON document holding the settings record and every
//! project. Restoring replaces the settings and adds projects that are not
//! already in the store (matched by id), so importing the same backup twice
//! is harmless.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::{EstimateError, EstimateResult};
use crate::file_io::{validate_version, write_atomic};
use crate::pricing::AppSettings;
use crate::project::{Project, SCHEMA_VERSION};
use crate::store::EstimateStore;

/// Full export of a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backup {
    pub schema_version: String,
    pub exported_at: DateTime<Utc>,
    pub settings: Option<AppSettings>,
    pub projects: Vec<Project>,
}

impl Backup {
    pub fn to_json(&self) -> EstimateResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a backup, rejecting incompatible schema versions.
    pub fn from_json(json: &str) -> EstimateResult<Backup> {
        let backup: Backup = serde_json::from_str(json)?;
        validate_version(&backup.schema_version)?;
        Ok(backup)
    }
}

/// Snapshot the store. Nothing is written; see [`mark_backed_up`].
pub fn export_backup<S: EstimateStore + ?Sized>(
    store: &S,
    now: DateTime<Utc>,
) -> EstimateResult<Backup> {
    let settings = store.load_settings()?;
    let projects = store.list_projects()?;
    info!(projects = projects.len(), "exported backup");

    Ok(Backup {
        schema_version: SCHEMA_VERSION.to_string(),
        exported_at: now,
        settings,
        projects,
    })
}

/// Stamp `last_backup_at` once a backup has actually been written.
pub fn mark_backed_up<S: EstimateStore + ?Sized>(
    store: &mut S,
    now: DateTime<Utc>,
) -> EstimateResult<()> {
    if let Some(mut settings) = store.load_settings()? {
        settings.last_backup_at = Some(now);
        store.save_settings(&settings)?;
    }
    Ok(())
}

/// Export `store` to `path`, stamping `last_backup_at` only after the file
/// is safely on disk. Returns the backup that was written.
pub fn write_backup_file<S: EstimateStore + ?Sized>(
    store: &mut S,
    path: &Path,
    now: DateTime<Utc>,
) -> EstimateResult<Backup> {
    let backup = export_backup(store, now)?;
    write_atomic(path, backup.to_json()?.as_bytes())?;
    mark_backed_up(store, now)?;
    Ok(backup)
}

/// Read and version-check a backup file.
pub fn read_backup_file(path: &Path) -> EstimateResult<Backup> {
    let json = fs::read_to_string(path).map_err(|e| {
        EstimateError::file_error("read backup", path.display().to_string(), e.to_string())
    })?;
    Backup::from_json(&json)
}

/// Restore a backup into `store`. Returns the number of projects added.
pub fn import_backup<S: EstimateStore + ?Sized>(
    store: &mut S,
    backup: Backup,
) -> EstimateResult<usize> {
    if let Some(settings) = &backup.settings {
        store.save_settings(settings)?;
    }

    let existing: HashSet<_> = store
        .list_projects()?
        .iter()
        .filter_map(|p| p.id())
        .collect();

    let mut imported = 0;
    for project in backup.projects {
        match project.id() {
            Some(id) if existing.contains(&id) => continue,
            Some(id) => {
                store.restore_project(project)?;
                info!(%id, "restored project");
            }
            None => {
                warn!(name = project.name(), "backup entry without id, saving as new project");
                store.insert_project(project)?;
            }
        }
        imported += 1;
    }

    info!(imported, "imported backup");
    Ok(imported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::BuildingSpec;
    use crate::pricing::get_or_init_defaults;
    use crate::project::estimate;
    use crate::store::MemoryStore;

    fn seeded_store() -> MemoryStore {
        let mut store = MemoryStore::new();
        let settings = get_or_init_defaults(&mut store).unwrap();
        for (name, len) in [("A", 10.0), ("B", 14.0)] {
            let spec = BuildingSpec::new(len, 8.0, 2);
            let project = estimate(&spec, &settings, Some(name), Utc::now()).unwrap();
            store.insert_project(project).unwrap();
        }
        store
    }

    fn temp_backup_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("estimator_backup_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_export_leaves_settings_untouched() {
        let store = seeded_store();
        let backup = export_backup(&store, Utc::now()).unwrap();

        assert_eq!(backup.projects.len(), 2);
        assert!(backup.settings.as_ref().unwrap().last_backup_at.is_none());
        assert!(store.load_settings().unwrap().unwrap().last_backup_at.is_none());
    }

    #[test]
    fn test_mark_backed_up_stamps_settings() {
        let mut store = seeded_store();
        let now = Utc::now();
        mark_backed_up(&mut store, now).unwrap();
        assert_eq!(store.load_settings().unwrap().unwrap().last_backup_at, Some(now));

        // No settings record yet: nothing to stamp
        let mut empty = MemoryStore::new();
        mark_backed_up(&mut empty, now).unwrap();
        assert!(empty.load_settings().unwrap().is_none());
    }

    #[test]
    fn test_write_backup_file_stamps_after_write() {
        let dir = temp_backup_dir("write");
        let path = dir.join("backup.json");
        let mut store = seeded_store();
        let now = Utc::now();

        let written = write_backup_file(&mut store, &path, now).unwrap();
        assert_eq!(store.load_settings().unwrap().unwrap().last_backup_at, Some(now));

        let read_back = read_backup_file(&path).unwrap();
        assert_eq!(read_back, written);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_failed_backup_write_keeps_last_backup() {
        let dir = temp_backup_dir("failed");
        let path = dir.join("missing").join("backup.json");
        let mut store = seeded_store();

        let err = write_backup_file(&mut store, &path, Utc::now()).unwrap_err();
        assert_eq!(err.error_code(), "FILE_ERROR");
        assert!(store.load_settings().unwrap().unwrap().last_backup_at.is_none());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_restore_into_empty_store_keeps_ids() {
        let source = seeded_store();
        let backup = export_backup(&source, Utc::now()).unwrap();
        let json = backup.to_json().unwrap();

        let mut target = MemoryStore::new();
        let imported = import_backup(&mut target, Backup::from_json(&json).unwrap()).unwrap();
        assert_eq!(imported, 2);

        for project in source.list_projects().unwrap() {
            let restored = target.require_project(project.id().unwrap()).unwrap();
            assert_eq!(restored, project);
        }
        assert!(target.load_settings().unwrap().is_some());
    }

    #[test]
    fn test_restore_twice_is_harmless() {
        let source = seeded_store();
        let backup = export_backup(&source, Utc::now()).unwrap();

        let mut target = MemoryStore::new();
        assert_eq!(import_backup(&mut target, backup.clone()).unwrap(), 2);
        assert_eq!(import_backup(&mut target, backup).unwrap(), 0);
        assert_eq!(target.project_count(), 2);
    }

    #[test]
    fn test_incompatible_backup_rejected() {
        let backup = Backup {
            schema_version: "3.0.0".to_string(),
            exported_at: Utc::now(),
            settings: None,
            projects: Vec::new(),
        };
        let json = backup.to_json().unwrap();
        assert_eq!(Backup::from_json(&json).unwrap_err().error_code(), "VERSION_MISMATCH");
    }
}
