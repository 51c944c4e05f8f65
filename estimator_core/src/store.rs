//! # Project Store
//!
//! The key-indexed store holding [`Project`] records and the single
//! [`AppSettings`] record. The estimation engine only depends on this trait;
//! [`MemoryStore`] keeps everything in process and
//! [`JsonFileStore`](crate::file_io::JsonFileStore) persists to a directory.

use std::collections::HashMap;

use tracing::info;
use uuid::Uuid;

use crate::errors::{EstimateError, EstimateResult};
use crate::pricing::AppSettings;
use crate::project::Project;

/// Storage interface for settings and projects.
pub trait EstimateStore {
    /// The settings record, if one has been created.
    fn load_settings(&self) -> EstimateResult<Option<AppSettings>>;

    /// Store `seed` unless a settings record already exists; return whichever
    /// record is stored afterwards. Check and create happen atomically.
    fn init_settings_if_absent(&mut self, seed: AppSettings) -> EstimateResult<AppSettings>;

    /// Overwrite the settings record.
    fn save_settings(&mut self, settings: &AppSettings) -> EstimateResult<()>;

    /// Save a new project, assigning its id. Returns the saved record.
    fn insert_project(&mut self, project: Project) -> EstimateResult<Project>;

    /// Save a project that already carries an id, as when restoring a
    /// backup. Overwrites any record with the same id.
    fn restore_project(&mut self, project: Project) -> EstimateResult<()>;

    /// Overwrite an existing project.
    fn update_project(&mut self, project: &Project) -> EstimateResult<()>;

    fn get_project(&self, id: Uuid) -> EstimateResult<Option<Project>>;

    /// All projects, newest first.
    fn list_projects(&self) -> EstimateResult<Vec<Project>>;

    /// Delete a project; returns whether it existed.
    fn delete_project(&mut self, id: Uuid) -> EstimateResult<bool>;

    /// Like [`get_project`](Self::get_project) but missing ids are an error.
    fn require_project(&self, id: Uuid) -> EstimateResult<Project> {
        self.get_project(id)?
            .ok_or_else(|| EstimateError::project_not_found(id))
    }
}

/// Reject a project that was already saved, then give it a fresh id.
pub(crate) fn prepare_insert(mut project: Project) -> EstimateResult<Project> {
    if let Some(id) = project.id() {
        return Err(EstimateError::invalid_input(
            "id",
            id.to_string(),
            "Project has already been saved; use update_project",
        ));
    }
    project.assign_id(Uuid::new_v4());
    Ok(project)
}

/// The id of a project being updated; unsaved projects have none.
pub(crate) fn saved_id(project: &Project) -> EstimateResult<Uuid> {
    project.id().ok_or_else(|| EstimateError::missing_field("id"))
}

/// Newest `created_at` first.
pub(crate) fn sort_newest_first(projects: &mut [Project]) {
    projects.sort_by(|a, b| {
        b.created_at()
            .cmp(&a.created_at())
            .then_with(|| a.id().cmp(&b.id()))
    });
}

/// In-process store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    settings: Option<AppSettings>,
    projects: HashMap<Uuid, Project>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn project_count(&self) -> usize {
        self.projects.len()
    }
}

impl EstimateStore for MemoryStore {
    fn load_settings(&self) -> EstimateResult<Option<AppSettings>> {
        Ok(self.settings.clone())
    }

    fn init_settings_if_absent(&mut self, seed: AppSettings) -> EstimateResult<AppSettings> {
        if self.settings.is_none() {
            info!("initialised default settings");
        }
        Ok(self.settings.get_or_insert(seed).clone())
    }

    fn save_settings(&mut self, settings: &AppSettings) -> EstimateResult<()> {
        self.settings = Some(settings.clone());
        Ok(())
    }

    fn insert_project(&mut self, project: Project) -> EstimateResult<Project> {
        let project = prepare_insert(project)?;
        let id = saved_id(&project)?;
        self.projects.insert(id, project.clone());
        info!(%id, name = project.name(), "inserted project");
        Ok(project)
    }

    fn restore_project(&mut self, project: Project) -> EstimateResult<()> {
        let id = saved_id(&project)?;
        self.projects.insert(id, project);
        Ok(())
    }

    fn update_project(&mut self, project: &Project) -> EstimateResult<()> {
        let id = saved_id(project)?;
        match self.projects.get_mut(&id) {
            Some(slot) => {
                *slot = project.clone();
                Ok(())
            }
            None => Err(EstimateError::project_not_found(id)),
        }
    }

    fn get_project(&self, id: Uuid) -> EstimateResult<Option<Project>> {
        Ok(self.projects.get(&id).cloned())
    }

    fn list_projects(&self) -> EstimateResult<Vec<Project>> {
        let mut projects: Vec<Project> = self.projects.values().cloned().collect();
        sort_newest_first(&mut projects);
        Ok(projects)
    }

    fn delete_project(&mut self, id: Uuid) -> EstimateResult<bool> {
        let removed = self.projects.remove(&id).is_some();
        if removed {
            info!(%id, "deleted project");
        }
        Ok(removed)
    }
}
