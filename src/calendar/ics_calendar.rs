//! A calendar that exports every task and project as an iCal (`VTODO`) file into a folder

use std::error::Error;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ics::properties::{Completed, Created, Description, DtStart, Due, LastModified, Status, Summary};
use ics::{ICalendar, ToDo};

use crate::calendar::CalendarSync;
use crate::item::Priority;
use crate::project::{Project, ProjectStatus};
use crate::settings::default_prod_id;
use crate::task::{Task, TaskStatus};

/// Writes one `.ics` file per entity. The event id of an entity is the stem of its file
#[derive(Debug, Clone, PartialEq)]
pub struct IcsCalendar {
    folder: PathBuf,
}

impl IcsCalendar {
    pub fn new(folder: &Path) -> Self {
        Self { folder: PathBuf::from(folder) }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// The file an event id is stored into
    pub fn file_for(&self, event_id: &str) -> PathBuf {
        self.folder.join(sanitize_filename::sanitize(event_id) + ".ics")
    }

    fn write(&self, event_id: &str, content: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        std::fs::create_dir_all(&self.folder)?;
        std::fs::write(self.file_for(event_id), content)?;
        Ok(())
    }

    fn remove(&self, event_id: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        match std::fs::remove_file(self.file_for(event_id)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

fn task_event_id(task: &Task) -> String {
    match task.calendar_event_id() {
        Some(id) => id.to_string(),
        None => format!("task-{}", task.id()),
    }
}

fn project_event_id(project: &Project) -> String {
    match project.calendar_event_id() {
        Some(id) => id.to_string(),
        None => format!("project-{}", project.id()),
    }
}

#[async_trait]
impl CalendarSync for IcsCalendar {
    async fn sync_tasks(&self, tasks: &[Task]) -> Result<(), Box<dyn Error + Send + Sync>> {
        for task in tasks {
            self.write(&task_event_id(task), &build_from_task(task))?;
        }
        Ok(())
    }

    async fn sync_projects(&self, projects: &[Project]) -> Result<(), Box<dyn Error + Send + Sync>> {
        for project in projects {
            self.write(&project_event_id(project), &build_from_project(project))?;
        }
        Ok(())
    }

    async fn update_task_event(&self, task: &Task) -> Result<Option<String>, Box<dyn Error + Send + Sync>> {
        let event_id = task_event_id(task);
        self.write(&event_id, &build_from_task(task))?;
        Ok(Some(event_id))
    }

    async fn delete_task_event(&self, task: &Task) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.remove(&task_event_id(task))
    }

    async fn update_project_event(&self, project: &Project) -> Result<Option<String>, Box<dyn Error + Send + Sync>> {
        let event_id = project_event_id(project);
        self.write(&event_id, &build_from_project(project))?;
        Ok(Some(event_id))
    }

    async fn delete_project_event(&self, project: &Project) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.remove(&project_event_id(project))
    }
}


/// Create an iCal item from a task
pub fn build_from_task(task: &Task) -> String {
    let event_id = task_event_id(task);
    let s_last_modified = format_date_time(task.updated_at());

    let mut todo = ToDo::new(event_id, s_last_modified.clone());
    todo.push(Created::new(format_date_time(task.created_at())));
    todo.push(LastModified::new(s_last_modified));
    todo.push(Summary::new(task.title()));
    if let Some(description) = task.description() {
        todo.push(Description::new(description));
    }
    if let Some(from_date) = task.from_date() {
        todo.push(DtStart::new(format_date_time(from_date)));
    }
    if let Some(to_date) = task.to_date() {
        todo.push(Due::new(format_date_time(to_date)));
    }
    if let Some(completed_at) = task.completed_at() {
        todo.push(Completed::new(format_date_time(completed_at)));
    }
    todo.push(ics::properties::Priority::new(ical_priority(task.priority())));
    todo.push(match task.status() {
        TaskStatus::Pending => Status::needs_action(),
        TaskStatus::InProgress => Status::in_process(),
        TaskStatus::Completed => Status::completed(),
    });

    let mut calendar = ICalendar::new("2.0", default_prod_id());
    calendar.add_todo(todo);
    calendar.to_string()
}

/// Create an iCal item from a project
pub fn build_from_project(project: &Project) -> String {
    let event_id = project_event_id(project);
    let s_last_modified = format_date_time(project.updated_at());

    let mut todo = ToDo::new(event_id, s_last_modified.clone());
    todo.push(Created::new(format_date_time(project.created_at())));
    todo.push(LastModified::new(s_last_modified));
    todo.push(Summary::new(project.title()));
    if let Some(description) = project.description() {
        todo.push(Description::new(description));
    }
    if let Some(due_date) = project.due_date() {
        todo.push(Due::new(format_date_time(due_date)));
    }
    if let Some(completed_at) = project.completed_at() {
        todo.push(Completed::new(format_date_time(completed_at)));
    }
    todo.push(ics::properties::Priority::new(ical_priority(project.priority())));
    todo.push(match project.status() {
        ProjectStatus::Active => Status::in_process(),
        ProjectStatus::Completed => Status::completed(),
        ProjectStatus::Archived => Status::cancelled(),
    });

    let mut calendar = ICalendar::new("2.0", default_prod_id());
    calendar.add_todo(todo);
    calendar.to_string()
}

/// RFC 5545 priorities: 1 is the highest, 9 the lowest
fn ical_priority(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "1",
        Priority::Medium => "5",
        Priority::Low => "9",
    }
}

fn format_date_time(dt: &DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}
