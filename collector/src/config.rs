use common::model::task::Task;
use std::path::PathBuf;

/// Folder layout the engine operates on.
///
/// Passed in explicitly at construction; the engine keeps no ambient global
/// configuration. All paths below `storage_root` are derived from it plus
/// the task's deterministic folder name.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Root under which every task gets its own collection folder.
    pub storage_root: PathBuf,
}

impl CollectorConfig {
    pub fn new(storage_root: impl Into<PathBuf>) -> Self {
        CollectorConfig {
            storage_root: storage_root.into(),
        }
    }

    /// Folder where a task's submissions land.
    pub fn collection_dir(&self, task: &Task) -> PathBuf {
        self.storage_root.join(task.collection_dir_name())
    }

    /// Folder for attachments accompanying a task's submissions.
    pub fn attachment_dir(&self, task: &Task) -> PathBuf {
        self.collection_dir(task).join("attachments")
    }

    /// Folder for merged artifacts, kept outside the collection folder so a
    /// merge output is never picked up as merge input.
    pub fn merged_dir(&self, task: &Task) -> PathBuf {
        self.storage_root
            .join("merged")
            .join(task.collection_dir_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::model::task::{TaskType, VersioningMode};

    #[test]
    fn merged_artifacts_live_outside_the_collection_folder() {
        let config = CollectorConfig::new("/data");
        let task = Task {
            id: "t".to_string(),
            slug: "q3".to_string(),
            title: "Numbers".to_string(),
            task_type: TaskType::FileCollection,
            versioning: VersioningMode::AutoVersion,
            submission_count: 0,
            max_submissions: None,
            is_active: true,
            allowed_extensions: vec![".csv".to_string()],
            allow_attachments: false,
        };
        let collection = config.collection_dir(&task);
        assert!(config.attachment_dir(&task).starts_with(&collection));
        assert!(!config.merged_dir(&task).starts_with(&collection));
    }
}
