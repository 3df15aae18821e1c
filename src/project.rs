//! Projects, i.e. ordered groups of tasks

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Duration, Utc};

use crate::error::EntityKind;
use crate::item::{Entity, EntityId, Priority};
use crate::settings::PROJECTS_KEY;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    Active,
    Completed,
    Archived,
}

impl Default for ProjectStatus {
    fn default() -> Self {
        ProjectStatus::Active
    }
}

impl Display for ProjectStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectStatus::Active => write!(f, "active"),
            ProjectStatus::Completed => write!(f, "completed"),
            ProjectStatus::Archived => write!(f, "archived"),
        }
    }
}

/// A project
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    id: EntityId,
    title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default)]
    status: ProjectStatus,
    #[serde(default)]
    priority: Priority,

    /// The tasks of this project, in display order. Contains no duplicates
    #[serde(default)]
    task_ids: Vec<EntityId>,

    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    due_date: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    calendar_event_id: Option<String>,
}

impl Entity for Project {
    const KIND: EntityKind = EntityKind::Project;
    const STORAGE_KEY: &'static str = PROJECTS_KEY;

    fn id(&self) -> &EntityId { &self.id }
}

impl Project {
    /// Create a brand new Project (active, unless stated otherwise), with no task.
    /// This will pick a new (random) project ID.
    pub fn new(input: NewProject) -> Self {
        let now = Utc::now();
        let status = input.status.unwrap_or_default();
        let completed_at = match status {
            ProjectStatus::Completed => Some(now),
            _ => None,
        };
        Self {
            id: EntityId::random(),
            title: input.title,
            description: input.description,
            status,
            priority: input.priority.unwrap_or_default(),
            task_ids: Vec::new(),
            created_at: now,
            updated_at: now,
            completed_at,
            due_date: input.due_date,
            calendar_event_id: None,
        }
    }

    pub fn id(&self) -> &EntityId                   { &self.id          }
    pub fn title(&self) -> &str                     { &self.title       }
    pub fn description(&self) -> Option<&str>       { self.description.as_deref() }
    pub fn status(&self) -> ProjectStatus           { self.status       }
    pub fn priority(&self) -> Priority              { self.priority     }
    pub fn task_ids(&self) -> &[EntityId]           { &self.task_ids    }
    pub fn created_at(&self) -> &DateTime<Utc>      { &self.created_at  }
    pub fn updated_at(&self) -> &DateTime<Utc>      { &self.updated_at  }
    pub fn completed_at(&self) -> Option<&DateTime<Utc>> { self.completed_at.as_ref() }
    pub fn due_date(&self) -> Option<&DateTime<Utc>>     { self.due_date.as_ref() }
    pub fn calendar_event_id(&self) -> Option<&str> { self.calendar_event_id.as_deref() }
    pub fn completed(&self) -> bool { self.status == ProjectStatus::Completed }

    pub fn contains_task(&self, task_id: &EntityId) -> bool {
        self.task_ids.contains(task_id)
    }

    fn touch(&mut self) {
        let now = Utc::now();
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::microseconds(1)
        };
    }

    /// Append a task at the end of this project.
    /// Returns `false` (and changes nothing) if the task was already there
    pub fn add_task_id(&mut self, task_id: EntityId) -> bool {
        if self.contains_task(&task_id) {
            return false;
        }
        self.touch();
        self.task_ids.push(task_id);
        true
    }

    /// Returns `false` (and changes nothing) if the task was not part of this project
    pub fn remove_task_id(&mut self, task_id: &EntityId) -> bool {
        if self.contains_task(task_id) == false {
            return false;
        }
        self.touch();
        self.task_ids.retain(|id| id != task_id);
        true
    }

    /// Record the event id a calendar gave to this project.
    /// This is bookkeeping of the sync, and leaves `updated_at` untouched
    pub(crate) fn set_calendar_event_id(&mut self, event_id: Option<String>) {
        self.calendar_event_id = event_id;
    }

    /// Merge a partial update over this project
    pub fn apply(&mut self, update: ProjectUpdate) {
        self.touch();
        if let Some(title) = update.title { self.title = title; }
        if let Some(description) = update.description { self.description = description; }
        if let Some(priority) = update.priority { self.priority = priority; }
        if let Some(due_date) = update.due_date { self.due_date = due_date; }
        if let Some(completed_at) = update.completed_at { self.completed_at = completed_at; }
        if let Some(event_id) = update.calendar_event_id { self.calendar_event_id = event_id; }
        if let Some(status) = update.status {
            match status {
                ProjectStatus::Completed => {
                    if self.completed_at.is_none() {
                        self.completed_at = Some(self.updated_at);
                    }
                },
                _ => self.completed_at = None,
            }
            self.status = status;
        }
    }
}


/// What is needed to create a project
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NewProject {
    pub title: String,
    pub description: Option<String>,
    /// Defaults to `Active`
    pub status: Option<ProjectStatus>,
    /// Defaults to `Medium`
    pub priority: Option<Priority>,
    pub due_date: Option<DateTime<Utc>>,
}

impl NewProject {
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into(), ..Self::default() }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn status(mut self, status: ProjectStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn due_date(mut self, due_date: Option<DateTime<Utc>>) -> Self {
        self.due_date = due_date;
        self
    }
}


/// A partial update of a project.
///
/// `None` leaves a field unchanged. For optional fields, `Some(None)` clears the field.
/// Task membership is not part of it, see [`ProjectService::add_task`](crate::project_service::ProjectService::add_task).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProjectUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<ProjectStatus>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub completed_at: Option<Option<DateTime<Utc>>>,
    pub calendar_event_id: Option<Option<String>>,
}

impl ProjectUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn status(mut self, status: ProjectStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn due_date(mut self, due_date: Option<DateTime<Utc>>) -> Self {
        self.due_date = Some(due_date);
        self
    }
}
