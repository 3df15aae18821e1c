//! Whole-collection persistence of tasks and projects

use std::marker::PhantomData;

use crate::item::Entity;
use crate::project::Project;
use crate::serializer;
use crate::storage::StorageService;
use crate::task::Task;

/// Stores a collection of entities as a single JSON array, under the storage key of the entity type.
///
/// There is no query support here: callers read the full collection, and write it back in full.
#[derive(Debug, Clone)]
pub struct Repository<T: Entity> {
    storage: StorageService,
    phantom: PhantomData<T>,
}

pub type TaskRepository = Repository<Task>;
pub type ProjectRepository = Repository<Project>;

impl<T: Entity> Repository<T> {
    pub fn new(storage: StorageService) -> Self {
        Self { storage, phantom: PhantomData }
    }

    /// Returns the stored collection, or an empty one if there is none (or if it cannot be read)
    pub fn get_all(&self) -> Vec<T> {
        match self.storage.get(T::STORAGE_KEY) {
            None => Vec::new(),
            Some(json) => serializer::deserialize(&json),
        }
    }

    /// Overwrite the stored collection
    pub fn save(&self, entities: &[T]) {
        log::trace!("Saving {} entities under {:?}", entities.len(), T::STORAGE_KEY);
        self.storage.set(T::STORAGE_KEY, &serializer::serialize(entities));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::NewTask;
    use crate::project::NewProject;

    #[test]
    fn empty_when_absent() {
        let repo = TaskRepository::new(StorageService::in_memory());
        assert!(repo.get_all().is_empty());
    }

    #[test]
    fn collections_are_independent() {
        let storage = StorageService::in_memory();
        let tasks = TaskRepository::new(storage.clone());
        let projects = ProjectRepository::new(storage.clone());

        tasks.save(&[Task::new(NewTask::new("Buy milk"))]);
        projects.save(&[Project::new(NewProject::new("Launch")), Project::new(NewProject::new("Move"))]);

        assert_eq!(tasks.get_all().len(), 1);
        assert_eq!(projects.get_all().len(), 2);
        assert!(storage.get("tasks").is_some());
        assert!(storage.get("projects").is_some());
    }

    #[test]
    fn corrupted_collection_reads_as_empty() {
        let storage = StorageService::in_memory();
        storage.set("tasks", "this is not JSON");
        let repo = TaskRepository::new(storage);
        assert!(repo.get_all().is_empty());
    }
}
