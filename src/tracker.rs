use crate::error::{PlatformError, Result};
use crate::models::{ProgressSnapshot, TrackerState};
use crate::store::{keys, LocalStore};

/// Per-course progress tracker. Tracks module and project completion,
/// time spent, and earned certifications; every mutation persists both the
/// tracker state and a compact snapshot for catalog listings.
pub struct CourseTracker<'a> {
    store: &'a LocalStore,
    course_id: String,
    total_modules: u32,
    total_projects: u32,
    state: TrackerState,
}

impl<'a> CourseTracker<'a> {
    pub fn load(
        store: &'a LocalStore,
        course_id: &str,
        total_modules: u32,
        total_projects: u32,
    ) -> Result<Self> {
        let state: TrackerState = store
            .get(&keys::tracker(course_id))?
            .unwrap_or_default();
        Ok(Self {
            store,
            course_id: course_id.to_string(),
            total_modules,
            total_projects,
            state,
        })
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    /// Marks a 1-based module as completed. Returns false when it already
    /// was; the completed list stays sorted.
    pub fn complete_module(&mut self, module: u32) -> Result<bool> {
        if module == 0 || module > self.total_modules {
            return Err(PlatformError::Validation(format!(
                "module must be between 1 and {}",
                self.total_modules
            )));
        }
        if self.state.completed_modules.contains(&module) {
            return Ok(false);
        }
        self.state.completed_modules.push(module);
        self.state.completed_modules.sort_unstable();
        self.persist()?;
        Ok(true)
    }

    /// Marks a 1-based project as completed, mirroring [`complete_module`].
    ///
    /// [`complete_module`]: CourseTracker::complete_module
    pub fn complete_project(&mut self, project: u32) -> Result<bool> {
        if project == 0 || project > self.total_projects {
            return Err(PlatformError::Validation(format!(
                "project must be between 1 and {}",
                self.total_projects
            )));
        }
        if self.state.completed_projects.contains(&project) {
            return Ok(false);
        }
        self.state.completed_projects.push(project);
        self.state.completed_projects.sort_unstable();
        self.persist()?;
        Ok(true)
    }

    pub fn add_time(&mut self, milliseconds: u64) -> Result<()> {
        self.state.time_spent_ms = self.state.time_spent_ms.saturating_add(milliseconds);
        self.persist()
    }

    /// Records a certification once; repeats are ignored.
    pub fn earn_certification(&mut self, name: &str) -> Result<bool> {
        if name.trim().is_empty() {
            return Err(PlatformError::Validation(
                "certification name is required".to_string(),
            ));
        }
        if self.state.certifications.iter().any(|c| c == name) {
            return Ok(false);
        }
        self.state.certifications.push(name.to_string());
        self.persist()?;
        Ok(true)
    }

    /// Wipes all tracker state for the course, including the snapshot.
    pub fn reset(&mut self) -> Result<()> {
        self.state = TrackerState::default();
        self.store.remove(&keys::tracker(&self.course_id))?;
        self.store.remove(&keys::progress_snapshot(&self.course_id))?;
        Ok(())
    }

    pub fn completed_units(&self) -> u32 {
        (self.state.completed_modules.len() + self.state.completed_projects.len()) as u32
    }

    pub fn total_units(&self) -> u32 {
        self.total_modules + self.total_projects
    }

    pub fn is_complete(&self) -> bool {
        self.total_units() > 0 && self.completed_units() == self.total_units()
    }

    /// Rounded completion percentage over modules and projects combined.
    pub fn completion_percent(&self) -> u32 {
        let total = self.total_units();
        if total == 0 {
            return 0;
        }
        let done = self.completed_units() as f64;
        ((done / total as f64) * 100.0).round() as u32
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            completed_units: self.completed_units(),
            total_units: self.total_units(),
        }
    }

    fn persist(&self) -> Result<()> {
        self.store.put(&keys::tracker(&self.course_id), &self.state)?;
        self.store
            .put(&keys::progress_snapshot(&self.course_id), &self.snapshot())
    }
}

/// The stored snapshot for a course, or an empty default when absent.
pub fn load_snapshot(store: &LocalStore, course_id: &str) -> Result<ProgressSnapshot> {
    Ok(store
        .get(&keys::progress_snapshot(course_id))?
        .unwrap_or_default())
}
