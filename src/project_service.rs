//! Business rules on top of the project repository
//!
//! This service keeps both sides of the task/project link consistent:
//! a project lists its tasks in `task_ids`, and each of these tasks points back with its `project_id`.

use crate::calendar::CalendarBridge;
use crate::error::{Error, Result};
use crate::item::{validate_title, EntityId};
use crate::project::{NewProject, Project, ProjectUpdate};
use crate::repository::ProjectRepository;
use crate::storage::StorageService;
use crate::task::{Task, TaskUpdate};
use crate::task_service::TaskService;

#[derive(Debug, Clone)]
pub struct ProjectService {
    projects: ProjectRepository,
    task_service: TaskService,
    calendar: CalendarBridge,
}

impl ProjectService {
    /// Create a project service that shares the storage and the calendar of `task_service`
    pub fn new(storage: StorageService, task_service: TaskService) -> Self {
        let calendar = task_service.calendar().clone();
        Self {
            projects: ProjectRepository::new(storage),
            task_service,
            calendar,
        }
    }

    pub fn task_service(&self) -> &TaskService {
        &self.task_service
    }

    pub async fn get_all(&self) -> Vec<Project> {
        self.projects.get_all()
    }

    pub async fn get_by_id(&self, id: &EntityId) -> Result<Project> {
        self.projects.get_all()
            .into_iter()
            .find(|project| project.id() == id)
            .ok_or_else(|| Error::project_not_found(id))
    }

    /// The tasks of a project, in the project order. Dangling task ids are skipped
    pub async fn get_tasks(&self, id: &EntityId) -> Result<Vec<Task>> {
        let project = self.get_by_id(id).await?;
        let mut tasks = self.task_service.get_all().await;
        let mut ordered = Vec::with_capacity(project.task_ids().len());
        for task_id in project.task_ids() {
            if let Some(index) = tasks.iter().position(|t| t.id() == task_id) {
                ordered.push(tasks.swap_remove(index));
            }
        }
        Ok(ordered)
    }

    /// Create a project, with no task. It is active unless `input` says otherwise
    pub async fn create(&self, input: NewProject) -> Result<Project> {
        validate_title(&input.title)?;

        let project = Project::new(input);
        let mut projects = self.projects.get_all();
        projects.push(project.clone());
        self.projects.save(&projects);
        log::debug!("Created project {} ({:?})", project.id(), project.title());

        Ok(self.forward_to_calendar(project).await)
    }

    /// Merge a partial update over an existing project.
    /// Moving to `Completed` stamps `completed_at` if it is not set yet
    pub async fn update(&self, id: &EntityId, update: ProjectUpdate) -> Result<Project> {
        if let Some(title) = &update.title {
            validate_title(title)?;
        }
        let project = self.modify(id, |project| {
            project.apply(update);
            true
        })?;
        Ok(self.forward_to_calendar(project).await)
    }

    /// Delete a project. Its tasks are kept, as standalone tasks.
    ///
    /// Unlinking the tasks is best-effort: a task that cannot be updated is skipped.
    pub async fn delete(&self, id: &EntityId) -> Result<()> {
        let project = self.get_by_id(id).await?;

        let mut to_unlink: Vec<EntityId> = project.task_ids().to_vec();
        for task in self.task_service.get_by_project(id).await {
            if to_unlink.contains(task.id()) == false {
                to_unlink.push(task.id().clone());
            }
        }

        for task_id in &to_unlink {
            if let Err(err) = self.unlink_task(id, task_id).await {
                log::warn!("Unable to unlink task {} from deleted project {}: {}", task_id, id, err);
            }
        }

        let mut projects = self.projects.get_all();
        projects.retain(|p| p.id() != id);
        self.projects.save(&projects);
        log::debug!("Deleted project {} ({} tasks unlinked)", id, to_unlink.len());

        self.calendar.project_deleted(&project).await;
        Ok(())
    }

    /// Link a task into a project. A task that belonged to another project is moved.
    /// This does nothing if the task is already linked.
    pub async fn add_task(&self, project_id: &EntityId, task_id: &EntityId) -> Result<Project> {
        let project = self.get_by_id(project_id).await?;
        let task = self.task_service.get_by_id(task_id).await?;

        let already_linked = task.project_id() == Some(project_id);
        if already_linked && project.contains_task(task_id) {
            log::trace!("Task {} is already part of project {}", task_id, project_id);
            return Ok(project);
        }

        if already_linked == false {
            self.task_service.update(task_id, TaskUpdate::new().project_id(Some(project_id.clone()))).await?;
        }

        let mut projects = self.projects.get_all();
        for other in projects.iter_mut().filter(|p| p.id() != project_id) {
            if other.remove_task_id(task_id) {
                log::debug!("Task {} moved out of project {}", task_id, other.id());
            }
        }
        let project = projects.iter_mut()
            .find(|p| p.id() == project_id)
            .ok_or_else(|| Error::project_not_found(project_id))?;
        project.add_task_id(task_id.clone());
        let project = project.clone();
        self.projects.save(&projects);

        Ok(self.forward_to_calendar(project).await)
    }

    /// Unlink a task from a project, so that it becomes standalone.
    /// This does nothing if the task is not linked.
    pub async fn remove_task(&self, project_id: &EntityId, task_id: &EntityId) -> Result<Project> {
        let project = self.get_by_id(project_id).await?;
        let linked_task = match self.task_service.get_by_id(task_id).await {
            Ok(task) => task.project_id() == Some(project_id),
            Err(_) => false,
        };
        if project.contains_task(task_id) == false && linked_task == false {
            log::trace!("Task {} is not part of project {}", task_id, project_id);
            return Ok(project);
        }

        if linked_task {
            self.unlink_task(project_id, task_id).await?;
        }
        let project = self.modify(project_id, |project| project.remove_task_id(task_id))?;
        Ok(self.forward_to_calendar(project).await)
    }

    /// Turn a task into a new project, that contains this very task.
    ///
    /// The project takes the title, description, priority and due date of the task
    pub async fn promote_task_to_project(&self, task: &Task) -> Result<Project> {
        // no project is left behind for a task that is not stored
        self.task_service.get_by_id(task.id()).await?;

        let input = NewProject {
            title: task.title().to_string(),
            description: task.description().map(|d| d.to_string()),
            status: None,
            priority: Some(task.priority()),
            due_date: task.to_date().cloned(),
        };
        let project = self.create(input).await?;
        log::info!("Promoting task {} to project {}", task.id(), project.id());
        self.add_task(project.id(), task.id()).await
    }

    /// Push every project to the calendar. Returns whether this succeeded
    pub async fn sync_calendar(&self) -> bool {
        let projects = self.projects.get_all();
        self.calendar.sync_projects(&projects).await
    }

    /// Clear the `project_id` of a task, if it still points at `project_id`
    async fn unlink_task(&self, project_id: &EntityId, task_id: &EntityId) -> Result<()> {
        let task = self.task_service.get_by_id(task_id).await?;
        if task.project_id() == Some(project_id) {
            self.task_service.update(task_id, TaskUpdate::new().project_id(None)).await?;
        }
        Ok(())
    }

    /// Apply `f` to the project `id`, and persist the collection if `f` returns true. Returns the project
    fn modify<F>(&self, id: &EntityId, f: F) -> Result<Project>
    where
        F: FnOnce(&mut Project) -> bool,
    {
        let mut projects = self.projects.get_all();
        let project = projects.iter_mut()
            .find(|project| project.id() == id)
            .ok_or_else(|| Error::project_not_found(id))?;
        let changed = f(project);
        let modified = project.clone();
        if changed {
            self.projects.save(&projects);
            log::trace!("Updated project {}", id);
        }
        Ok(modified)
    }

    /// Send a project to the calendar, and store the event id it got (if it changed)
    async fn forward_to_calendar(&self, project: Project) -> Project {
        let event_id = match self.calendar.project_changed(&project).await {
            None => return project,
            Some(event_id) => event_id,
        };
        if project.calendar_event_id() == Some(event_id.as_str()) {
            return project;
        }

        let result = self.modify(project.id(), |p| {
            p.set_calendar_event_id(Some(event_id));
            true
        });
        match result {
            Ok(updated) => updated,
            Err(err) => {
                log::warn!("Unable to store the calendar event id of project {}: {}", project.id(), err);
                project
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Priority;
    use crate::project::ProjectStatus;
    use crate::task::NewTask;

    fn services() -> (TaskService, ProjectService) {
        let storage = StorageService::in_memory();
        let tasks = TaskService::new(storage.clone(), CalendarBridge::disabled());
        let projects = ProjectService::new(storage, tasks.clone());
        (tasks, projects)
    }

    #[tokio::test]
    async fn create_defaults() {
        let (_, projects) = services();
        let project = projects.create(NewProject::new("Launch")).await.unwrap();
        assert_eq!(project.status(), ProjectStatus::Active);
        assert_eq!(project.priority(), Priority::Medium);
        assert!(project.task_ids().is_empty());
        assert_eq!(projects.get_all().await, vec![project]);
    }

    #[tokio::test]
    async fn completing_stamps_completed_at() {
        let (_, projects) = services();
        let project = projects.create(NewProject::new("Launch")).await.unwrap();
        let done = projects.update(project.id(), ProjectUpdate::new().status(ProjectStatus::Completed)).await.unwrap();
        assert!(done.completed_at().is_some());
        assert!(done.updated_at() > project.updated_at());
    }

    #[tokio::test]
    async fn create_completed_project() {
        let (_, projects) = services();
        let project = projects.create(NewProject::new("Old launch").status(ProjectStatus::Completed)).await.unwrap();
        assert_eq!(project.status(), ProjectStatus::Completed);
        assert_eq!(project.completed_at(), Some(project.created_at()));
        assert_eq!(projects.get_by_id(project.id()).await.unwrap(), project);
    }

    #[tokio::test]
    async fn absent_project_fails() {
        let (tasks, projects) = services();
        let task = tasks.create(NewTask::new("Write copy")).await.unwrap();
        let ghost = EntityId::from("ghost");
        assert!(projects.update(&ghost, ProjectUpdate::new().title("x")).await.unwrap_err().is_not_found());
        assert!(projects.delete(&ghost).await.unwrap_err().is_not_found());
        assert!(projects.add_task(&ghost, task.id()).await.unwrap_err().is_not_found());
        assert!(projects.remove_task(&ghost, task.id()).await.unwrap_err().is_not_found());
        assert_eq!(tasks.get_by_id(task.id()).await.unwrap().project_id(), None);
    }

    #[tokio::test]
    async fn add_and_remove_are_idempotent() {
        let (tasks, projects) = services();
        let project = projects.create(NewProject::new("Launch")).await.unwrap();
        let task = tasks.create(NewTask::new("Write copy")).await.unwrap();

        let linked = projects.add_task(project.id(), task.id()).await.unwrap();
        assert_eq!(linked.task_ids(), &[task.id().clone()]);
        let linked_again = projects.add_task(project.id(), task.id()).await.unwrap();
        assert_eq!(linked_again.task_ids(), &[task.id().clone()]);
        assert_eq!(tasks.get_by_id(task.id()).await.unwrap().project_id(), Some(project.id()));

        let unlinked = projects.remove_task(project.id(), task.id()).await.unwrap();
        assert!(unlinked.task_ids().is_empty());
        let unlinked_again = projects.remove_task(project.id(), task.id()).await.unwrap();
        assert!(unlinked_again.task_ids().is_empty());
        assert_eq!(tasks.get_by_id(task.id()).await.unwrap().project_id(), None);
    }

    #[tokio::test]
    async fn adding_to_another_project_moves_the_task() {
        let (tasks, projects) = services();
        let first = projects.create(NewProject::new("First")).await.unwrap();
        let second = projects.create(NewProject::new("Second")).await.unwrap();
        let task = tasks.create(NewTask::new("Write copy")).await.unwrap();

        projects.add_task(first.id(), task.id()).await.unwrap();
        projects.add_task(second.id(), task.id()).await.unwrap();

        assert!(projects.get_by_id(first.id()).await.unwrap().task_ids().is_empty());
        assert_eq!(projects.get_by_id(second.id()).await.unwrap().task_ids(), &[task.id().clone()]);
        assert_eq!(tasks.get_by_id(task.id()).await.unwrap().project_id(), Some(second.id()));
    }

    #[tokio::test]
    async fn get_tasks_keeps_project_order() {
        let (tasks, projects) = services();
        let project = projects.create(NewProject::new("Launch")).await.unwrap();
        let a = tasks.create(NewTask::new("A")).await.unwrap();
        let b = tasks.create(NewTask::new("B")).await.unwrap();
        projects.add_task(project.id(), b.id()).await.unwrap();
        projects.add_task(project.id(), a.id()).await.unwrap();

        let titles: Vec<String> = projects.get_tasks(project.id()).await.unwrap()
            .iter()
            .map(|t| t.title().to_string())
            .collect();
        assert_eq!(titles, vec!["B", "A"]);
    }

    #[tokio::test]
    async fn deleting_a_task_removes_it_from_its_project() {
        let (tasks, projects) = services();
        let project = projects.create(NewProject::new("Launch")).await.unwrap();
        let task = tasks.create(NewTask::new("Write copy")).await.unwrap();
        projects.add_task(project.id(), task.id()).await.unwrap();

        tasks.delete(task.id()).await.unwrap();
        assert!(projects.get_by_id(project.id()).await.unwrap().task_ids().is_empty());
    }

    #[tokio::test]
    async fn promote_keeps_the_task() {
        let (tasks, projects) = services();
        let task = tasks.create(NewTask::new("Plan trip").description("Somewhere warm").priority(Priority::High)).await.unwrap();

        let project = projects.promote_task_to_project(&task).await.unwrap();
        assert_eq!(project.title(), "Plan trip");
        assert_eq!(project.description(), Some("Somewhere warm"));
        assert_eq!(project.priority(), Priority::High);
        assert_eq!(project.task_ids(), &[task.id().clone()]);

        let reloaded = tasks.get_by_id(task.id()).await.unwrap();
        assert_eq!(reloaded.project_id(), Some(project.id()));
        assert_eq!(reloaded.title(), task.title());
        assert_eq!(reloaded.description(), task.description());
        assert_eq!(reloaded.status(), task.status());
        assert_eq!(reloaded.priority(), task.priority());
        assert_eq!(reloaded.created_at(), task.created_at());
    }

    #[tokio::test]
    async fn promoting_an_unknown_task_creates_nothing() {
        let (_, projects) = services();
        let never_stored = Task::new(NewTask::new("Plan trip"));

        let err = projects.promote_task_to_project(&never_stored).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(projects.get_all().await.is_empty());
    }
}
