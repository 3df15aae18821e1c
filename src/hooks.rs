//! State holders for user interfaces
//!
//! Each hook wraps the calls to a service with a loading flag, an error message and the latest result.
//! Errors are recorded as a human-readable message, and returned again so that the caller can react too.
//! Calendar failures do not make an operation fail: they are exposed separately, see `calendar_error`.

use std::future::Future;

use chrono::{DateTime, Local};

use crate::calendar::sync_progress::FeedbackReceiver;
use crate::error::Result;
use crate::item::EntityId;
use crate::project::{NewProject, Project, ProjectUpdate};
use crate::project_service::ProjectService;
use crate::task::{NewTask, Task, TaskUpdate};
use crate::task_service::TaskService;
use crate::views::View;

/// The state of one kind of operation
#[derive(Clone, Debug, PartialEq)]
pub struct OperationState<T> {
    pub loading: bool,
    pub error: Option<String>,
    pub data: Option<T>,
}

impl<T> Default for OperationState<T> {
    fn default() -> Self {
        Self { loading: false, error: None, data: None }
    }
}

impl<T> OperationState<T> {
    pub fn clear_error(&mut self) {
        self.error = None;
    }
}

impl<T: Clone> OperationState<T> {
    /// Run an operation and record its outcome
    pub async fn run<F>(&mut self, operation: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.loading = true;
        self.error = None;
        let result = operation.await;
        self.loading = false;

        match result {
            Ok(value) => {
                self.data = Some(value.clone());
                Ok(value)
            },
            Err(err) => {
                log::debug!("Operation failed: {}", err);
                self.error = Some(err.to_string());
                Err(err)
            },
        }
    }
}


/// Everything a task list needs
#[derive(Debug)]
pub struct TasksHook {
    service: TaskService,
    list: OperationState<Vec<Task>>,
    mutation: OperationState<Task>,
    deletion: OperationState<()>,
    calendar: FeedbackReceiver,
}

impl TasksHook {
    pub fn new(service: TaskService) -> Self {
        let calendar = service.calendar().subscribe();
        Self {
            service,
            list: OperationState::default(),
            mutation: OperationState::default(),
            deletion: OperationState::default(),
            calendar,
        }
    }

    /// The tasks, as of the latest refresh
    pub fn tasks(&self) -> &[Task] {
        self.list.data.as_deref().unwrap_or(&[])
    }

    pub fn list_state(&self) -> &OperationState<Vec<Task>> { &self.list }
    pub fn mutation_state(&self) -> &OperationState<Task> { &self.mutation }
    pub fn deletion_state(&self) -> &OperationState<()> { &self.deletion }

    pub fn is_loading(&self) -> bool {
        self.list.loading || self.mutation.loading || self.deletion.loading
    }

    /// The message of the latest operation, if it failed
    pub fn error(&self) -> Option<&str> {
        self.mutation.error.as_deref()
            .or_else(|| self.deletion.error.as_deref())
            .or_else(|| self.list.error.as_deref())
    }

    /// A new operation hides the errors of the previous ones
    fn forget_errors(&mut self) {
        self.list.clear_error();
        self.mutation.clear_error();
        self.deletion.clear_error();
    }

    /// The message of the latest calendar operation, if it failed
    pub fn calendar_error(&self) -> Option<String> {
        self.calendar.borrow().failure_message()
    }

    pub async fn refresh(&mut self) -> Result<Vec<Task>> {
        let service = &self.service;
        self.list.run(async move { Ok(service.get_all().await) }).await
    }

    pub async fn create(&mut self, input: NewTask) -> Result<Task> {
        self.forget_errors();
        let task = self.mutation.run(self.service.create(input)).await?;
        self.refresh().await?;
        Ok(task)
    }

    pub async fn update(&mut self, id: &EntityId, update: TaskUpdate) -> Result<Task> {
        self.forget_errors();
        let task = self.mutation.run(self.service.update(id, update)).await?;
        self.refresh().await?;
        Ok(task)
    }

    pub async fn delete(&mut self, id: &EntityId) -> Result<()> {
        self.forget_errors();
        self.deletion.run(self.service.delete(id)).await?;
        self.refresh().await?;
        Ok(())
    }

    pub async fn mark_complete(&mut self, id: &EntityId) -> Result<Task> {
        self.forget_errors();
        let task = self.mutation.run(self.service.mark_complete(id)).await?;
        self.refresh().await?;
        Ok(task)
    }

    pub async fn mark_in_progress(&mut self, id: &EntityId) -> Result<Task> {
        self.forget_errors();
        let task = self.mutation.run(self.service.mark_in_progress(id)).await?;
        self.refresh().await?;
        Ok(task)
    }

    pub async fn toggle_completion(&mut self, id: &EntityId) -> Result<Task> {
        self.forget_errors();
        let task = self.mutation.run(self.service.toggle_completion(id)).await?;
        self.refresh().await?;
        Ok(task)
    }

    pub async fn sync_calendar(&self) -> bool {
        self.service.sync_calendar().await
    }

    /// The current tasks, filtered by `view` relative to `now`
    pub fn view(&self, view: &View, now: &DateTime<Local>) -> Vec<&Task> {
        view.apply(self.tasks(), now)
    }

    pub fn today(&self) -> Vec<&Task> { View::Today.apply_now(self.tasks()) }
    pub fn upcoming(&self) -> Vec<&Task> { View::Upcoming.apply_now(self.tasks()) }
    pub fn completed(&self) -> Vec<&Task> { View::Completed.apply_now(self.tasks()) }
    pub fn search(&self, query: &str) -> Vec<&Task> { View::Search(query.to_string()).apply_now(self.tasks()) }
}


/// Everything a project list needs
#[derive(Debug)]
pub struct ProjectsHook {
    service: ProjectService,
    list: OperationState<Vec<Project>>,
    mutation: OperationState<Project>,
    deletion: OperationState<()>,
    calendar: FeedbackReceiver,
}

impl ProjectsHook {
    pub fn new(service: ProjectService) -> Self {
        let calendar = service.task_service().calendar().subscribe();
        Self {
            service,
            list: OperationState::default(),
            mutation: OperationState::default(),
            deletion: OperationState::default(),
            calendar,
        }
    }

    /// The projects, as of the latest refresh
    pub fn projects(&self) -> &[Project] {
        self.list.data.as_deref().unwrap_or(&[])
    }

    pub fn list_state(&self) -> &OperationState<Vec<Project>> { &self.list }
    pub fn mutation_state(&self) -> &OperationState<Project> { &self.mutation }
    pub fn deletion_state(&self) -> &OperationState<()> { &self.deletion }

    pub fn is_loading(&self) -> bool {
        self.list.loading || self.mutation.loading || self.deletion.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.mutation.error.as_deref()
            .or_else(|| self.deletion.error.as_deref())
            .or_else(|| self.list.error.as_deref())
    }

    fn forget_errors(&mut self) {
        self.list.clear_error();
        self.mutation.clear_error();
        self.deletion.clear_error();
    }

    /// The message of the latest calendar operation, if it failed
    pub fn calendar_error(&self) -> Option<String> {
        self.calendar.borrow().failure_message()
    }

    pub async fn refresh(&mut self) -> Result<Vec<Project>> {
        let service = &self.service;
        self.list.run(async move { Ok(service.get_all().await) }).await
    }

    /// The tasks of a project, in order
    pub async fn tasks_of(&self, project_id: &EntityId) -> Result<Vec<Task>> {
        self.service.get_tasks(project_id).await
    }

    pub async fn create(&mut self, input: NewProject) -> Result<Project> {
        self.forget_errors();
        let project = self.mutation.run(self.service.create(input)).await?;
        self.refresh().await?;
        Ok(project)
    }

    pub async fn update(&mut self, id: &EntityId, update: ProjectUpdate) -> Result<Project> {
        self.forget_errors();
        let project = self.mutation.run(self.service.update(id, update)).await?;
        self.refresh().await?;
        Ok(project)
    }

    pub async fn delete(&mut self, id: &EntityId) -> Result<()> {
        self.forget_errors();
        self.deletion.run(self.service.delete(id)).await?;
        self.refresh().await?;
        Ok(())
    }

    pub async fn add_task(&mut self, project_id: &EntityId, task_id: &EntityId) -> Result<Project> {
        self.forget_errors();
        let project = self.mutation.run(self.service.add_task(project_id, task_id)).await?;
        self.refresh().await?;
        Ok(project)
    }

    pub async fn remove_task(&mut self, project_id: &EntityId, task_id: &EntityId) -> Result<Project> {
        self.forget_errors();
        let project = self.mutation.run(self.service.remove_task(project_id, task_id)).await?;
        self.refresh().await?;
        Ok(project)
    }

    pub async fn promote_task_to_project(&mut self, task: &Task) -> Result<Project> {
        self.forget_errors();
        let project = self.mutation.run(self.service.promote_task_to_project(task)).await?;
        self.refresh().await?;
        Ok(project)
    }

    pub async fn sync_calendar(&self) -> bool {
        self.service.sync_calendar().await
    }

    pub fn view(&self, view: &View, now: &DateTime<Local>) -> Vec<&Project> {
        view.apply(self.projects(), now)
    }

    pub fn today(&self) -> Vec<&Project> { View::Today.apply_now(self.projects()) }
    pub fn upcoming(&self) -> Vec<&Project> { View::Upcoming.apply_now(self.projects()) }
    pub fn completed(&self) -> Vec<&Project> { View::Completed.apply_now(self.projects()) }
    pub fn search(&self, query: &str) -> Vec<&Project> { View::Search(query.to_string()).apply_now(self.projects()) }
}
