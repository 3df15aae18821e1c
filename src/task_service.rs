//! Business rules on top of the task repository
//!
//! Every operation reads the whole collection, changes it in memory, and writes it back.
//! Two operations interleaving on the same storage can thus lose an update (the last write wins).

use crate::calendar::CalendarBridge;
use crate::error::{Error, Result};
use crate::item::{validate_title, EntityId};
use crate::repository::{ProjectRepository, TaskRepository};
use crate::storage::StorageService;
use crate::task::{NewTask, Task, TaskStatus, TaskUpdate};

#[derive(Debug, Clone)]
pub struct TaskService {
    tasks: TaskRepository,
    projects: ProjectRepository,
    calendar: CalendarBridge,
}

impl TaskService {
    pub fn new(storage: StorageService, calendar: CalendarBridge) -> Self {
        Self {
            tasks: TaskRepository::new(storage.clone()),
            projects: ProjectRepository::new(storage),
            calendar,
        }
    }

    pub fn calendar(&self) -> &CalendarBridge {
        &self.calendar
    }

    pub async fn get_all(&self) -> Vec<Task> {
        self.tasks.get_all()
    }

    pub async fn get_by_id(&self, id: &EntityId) -> Result<Task> {
        self.tasks.get_all()
            .into_iter()
            .find(|task| task.id() == id)
            .ok_or_else(|| Error::task_not_found(id))
    }

    /// The tasks that point at a given project
    pub async fn get_by_project(&self, project_id: &EntityId) -> Vec<Task> {
        self.tasks.get_all()
            .into_iter()
            .filter(|task| task.project_id() == Some(project_id))
            .collect()
    }

    /// The tasks that belong to no project
    pub async fn get_standalone(&self) -> Vec<Task> {
        self.tasks.get_all()
            .into_iter()
            .filter(|task| task.is_standalone())
            .collect()
    }

    /// Create a pending task
    pub async fn create(&self, input: NewTask) -> Result<Task> {
        validate_title(&input.title)?;
        if let Some(project_id) = &input.project_id {
            self.check_project_exists(project_id)?;
        }

        let task = Task::new(input);
        let mut tasks = self.tasks.get_all();
        tasks.push(task.clone());
        self.tasks.save(&tasks);
        log::debug!("Created task {} ({:?})", task.id(), task.title());

        Ok(self.forward_to_calendar(task).await)
    }

    /// Merge a partial update over an existing task
    pub async fn update(&self, id: &EntityId, update: TaskUpdate) -> Result<Task> {
        if let Some(title) = &update.title {
            validate_title(title)?;
        }
        if let Some(Some(project_id)) = &update.project_id {
            self.check_project_exists(project_id)?;
        }

        let task = self.modify(id, |task| task.apply(update))?;
        Ok(self.forward_to_calendar(task).await)
    }

    /// Remove a task. It is also removed from the project it belonged to, if any
    pub async fn delete(&self, id: &EntityId) -> Result<()> {
        let mut tasks = self.tasks.get_all();
        let index = tasks.iter()
            .position(|task| task.id() == id)
            .ok_or_else(|| Error::task_not_found(id))?;
        let removed = tasks.remove(index);
        self.tasks.save(&tasks);
        log::debug!("Deleted task {}", id);

        if let Some(project_id) = removed.project_id() {
            let mut projects = self.projects.get_all();
            let mut changed = false;
            for project in projects.iter_mut().filter(|p| p.id() == project_id) {
                changed |= project.remove_task_id(id);
            }
            if changed {
                self.projects.save(&projects);
            }
        }

        self.calendar.task_deleted(&removed).await;
        Ok(())
    }

    pub async fn mark_complete(&self, id: &EntityId) -> Result<Task> {
        self.update(id, TaskUpdate::new().status(TaskStatus::Completed)).await
    }

    pub async fn mark_in_progress(&self, id: &EntityId) -> Result<Task> {
        self.update(id, TaskUpdate::new().status(TaskStatus::InProgress)).await
    }

    /// Completed tasks become pending, any other task becomes completed
    pub async fn toggle_completion(&self, id: &EntityId) -> Result<Task> {
        let task = self.modify(id, |task| {
            let new_status = match task.status() {
                TaskStatus::Completed => TaskStatus::Pending,
                _ => TaskStatus::Completed,
            };
            task.set_status(new_status);
        })?;
        Ok(self.forward_to_calendar(task).await)
    }

    /// Push every task to the calendar. Returns whether this succeeded
    pub async fn sync_calendar(&self) -> bool {
        let tasks = self.tasks.get_all();
        self.calendar.sync_tasks(&tasks).await
    }

    /// Apply `f` to the task `id` and persist the collection. Returns the modified task
    fn modify<F>(&self, id: &EntityId, f: F) -> Result<Task>
    where
        F: FnOnce(&mut Task),
    {
        let mut tasks = self.tasks.get_all();
        let task = tasks.iter_mut()
            .find(|task| task.id() == id)
            .ok_or_else(|| Error::task_not_found(id))?;
        f(task);
        let modified = task.clone();
        self.tasks.save(&tasks);
        log::trace!("Updated task {}", id);
        Ok(modified)
    }

    fn check_project_exists(&self, project_id: &EntityId) -> Result<()> {
        let exists = self.projects.get_all()
            .iter()
            .any(|project| project.id() == project_id);
        if exists {
            Ok(())
        } else {
            Err(Error::project_not_found(project_id))
        }
    }

    /// Send a task to the calendar, and store the event id it got (if it changed)
    async fn forward_to_calendar(&self, task: Task) -> Task {
        let event_id = match self.calendar.task_changed(&task).await {
            None => return task,
            Some(event_id) => event_id,
        };
        if task.calendar_event_id() == Some(event_id.as_str()) {
            return task;
        }

        match self.modify(task.id(), |t| t.set_calendar_event_id(Some(event_id))) {
            Ok(updated) => updated,
            Err(err) => {
                log::warn!("Unable to store the calendar event id of task {}: {}", task.id(), err);
                task
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use crate::item::Priority;
    use crate::mock_behaviour::MockBehaviour;
    use crate::storage::MemoryBackend;

    fn service() -> TaskService {
        TaskService::new(StorageService::in_memory(), CalendarBridge::disabled())
    }

    #[tokio::test]
    async fn create_then_get_all() {
        let service = service();
        let task = service.create(NewTask::new("Buy milk").priority(Priority::Medium)).await.unwrap();
        assert_eq!(task.status(), TaskStatus::Pending);
        assert!(task.id().as_str().is_empty() == false);
        assert_eq!(task.created_at(), task.updated_at());

        let all = service.get_all().await;
        assert_eq!(all, vec![task]);
    }

    #[tokio::test]
    async fn empty_titles_are_rejected() {
        let service = service();
        let err = service.create(NewTask::new("  ")).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(service.get_all().await.is_empty());
    }

    #[tokio::test]
    async fn unknown_project_is_rejected() {
        let service = service();
        let mut input = NewTask::new("Write copy");
        input.project_id = Some(EntityId::from("nope"));
        let err = service.create(input).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn update_refreshes_updated_at() {
        let service = service();
        let task = service.create(NewTask::new("Buy milk")).await.unwrap();
        let updated = service.update(task.id(), TaskUpdate::new().priority(Priority::High)).await.unwrap();
        assert_eq!(updated.priority(), Priority::High);
        assert!(updated.updated_at() > task.updated_at());
        assert_eq!(service.get_by_id(task.id()).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn absent_ids_fail_and_change_nothing() {
        let service = service();
        service.create(NewTask::new("Buy milk")).await.unwrap();
        let before = service.get_all().await;
        let ghost = EntityId::from("ghost");

        assert!(service.update(&ghost, TaskUpdate::new().title("x")).await.unwrap_err().is_not_found());
        assert!(service.delete(&ghost).await.unwrap_err().is_not_found());
        assert!(service.toggle_completion(&ghost).await.unwrap_err().is_not_found());
        assert!(service.mark_complete(&ghost).await.unwrap_err().is_not_found());

        assert_eq!(service.get_all().await, before);
    }

    #[tokio::test]
    async fn completion_life_cycle() {
        let service = service();
        let task = service.create(NewTask::new("Buy milk")).await.unwrap();

        let done = service.mark_complete(task.id()).await.unwrap();
        assert_eq!(done.status(), TaskStatus::Completed);
        assert!(done.completed_at().unwrap() >= task.created_at());

        let reopened = service.toggle_completion(task.id()).await.unwrap();
        assert_eq!(reopened.status(), TaskStatus::Pending);
        assert!(reopened.completed_at().is_none());

        let done_again = service.toggle_completion(task.id()).await.unwrap();
        assert_eq!(done_again.status(), TaskStatus::Completed);
        assert!(done_again.completed_at().is_some());

        let started = service.mark_in_progress(task.id()).await.unwrap();
        assert_eq!(started.status(), TaskStatus::InProgress);
        assert!(started.completed_at().is_none());
    }

    #[tokio::test]
    async fn delete_removes_the_task() {
        let service = service();
        let a = service.create(NewTask::new("A")).await.unwrap();
        let b = service.create(NewTask::new("B")).await.unwrap();
        service.delete(a.id()).await.unwrap();
        assert_eq!(service.get_all().await, vec![b]);
    }

    #[tokio::test]
    async fn storage_write_failures_are_swallowed() {
        let behaviour = Arc::new(Mutex::new(MockBehaviour {
            set_behaviour: (0, 1),
            ..MockBehaviour::default()
        }));
        let storage = StorageService::new(Arc::new(MemoryBackend::with_behaviour(behaviour)));
        let service = TaskService::new(storage, CalendarBridge::disabled());

        let lost = service.create(NewTask::new("Buy milk")).await.unwrap();
        assert_eq!(lost.title(), "Buy milk");
        assert!(service.get_all().await.is_empty());
        assert!(service.get_by_id(lost.id()).await.unwrap_err().is_not_found());

        // the storage recovered
        let kept = service.create(NewTask::new("Buy bread")).await.unwrap();
        assert_eq!(service.get_all().await, vec![kept]);
    }
}
