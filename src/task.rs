//! To-do tasks

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Duration, Utc};

use crate::error::EntityKind;
use crate::item::{Entity, EntityId, Priority};
use crate::settings::TASKS_KEY;

/// The progress of a task
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Pending
    }
}

impl Display for TaskStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::InProgress => write!(f, "in progress"),
            TaskStatus::Completed => write!(f, "completed"),
        }
    }
}

/// A to-do task
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    id: EntityId,
    title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default)]
    status: TaskStatus,
    #[serde(default)]
    priority: Priority,

    /// The project this task belongs to. `None` for standalone tasks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    project_id: Option<EntityId>,

    /// Start of the scheduled window
    #[serde(default, skip_serializing_if = "Option::is_none")]
    from_date: Option<DateTime<Utc>>,
    /// End of the scheduled window. This is what "today" and "upcoming" views look at
    #[serde(default, skip_serializing_if = "Option::is_none")]
    to_date: Option<DateTime<Utc>>,
    /// Set when the task becomes completed, cleared when it is reopened
    #[serde(default, skip_serializing_if = "Option::is_none")]
    completed_at: Option<DateTime<Utc>>,

    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,

    /// The reference of this task in an external calendar, if it has been synced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    calendar_event_id: Option<String>,
}

impl Entity for Task {
    const KIND: EntityKind = EntityKind::Task;
    const STORAGE_KEY: &'static str = TASKS_KEY;

    fn id(&self) -> &EntityId { &self.id }
}

impl Task {
    /// Create a brand new pending Task.
    /// This will pick a new (random) task ID.
    pub fn new(input: NewTask) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::random(),
            title: input.title,
            description: input.description,
            status: TaskStatus::Pending,
            priority: input.priority.unwrap_or_default(),
            project_id: input.project_id,
            from_date: input.from_date,
            to_date: input.to_date,
            completed_at: None,
            created_at: now,
            updated_at: now,
            calendar_event_id: None,
        }
    }

    pub fn id(&self) -> &EntityId                   { &self.id          }
    pub fn title(&self) -> &str                     { &self.title       }
    pub fn description(&self) -> Option<&str>       { self.description.as_deref() }
    pub fn status(&self) -> TaskStatus              { self.status       }
    pub fn priority(&self) -> Priority              { self.priority     }
    pub fn project_id(&self) -> Option<&EntityId>   { self.project_id.as_ref() }
    pub fn from_date(&self) -> Option<&DateTime<Utc>>    { self.from_date.as_ref() }
    pub fn to_date(&self) -> Option<&DateTime<Utc>>      { self.to_date.as_ref() }
    pub fn completed_at(&self) -> Option<&DateTime<Utc>> { self.completed_at.as_ref() }
    pub fn created_at(&self) -> &DateTime<Utc>      { &self.created_at  }
    pub fn updated_at(&self) -> &DateTime<Utc>      { &self.updated_at  }
    pub fn calendar_event_id(&self) -> Option<&str> { self.calendar_event_id.as_deref() }
    pub fn completed(&self) -> bool { self.status == TaskStatus::Completed }
    pub fn is_standalone(&self) -> bool { self.project_id.is_none() }

    /// Refresh `updated_at`, making sure it never goes backwards
    fn touch(&mut self) {
        let now = Utc::now();
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::microseconds(1)
        };
    }

    fn change_status(&mut self, new_status: TaskStatus) {
        match (self.status, new_status) {
            (TaskStatus::Completed, TaskStatus::Completed) => (),
            (_, TaskStatus::Completed) => self.completed_at = Some(self.updated_at),
            (_, _) => self.completed_at = None,
        }
        self.status = new_status;
    }

    /// Set the status.
    /// This updates `completed_at` and the "last modified" field
    pub fn set_status(&mut self, new_status: TaskStatus) {
        self.touch();
        self.change_status(new_status);
    }

    /// Link this task to a project (or make it standalone).
    /// This updates its "last modified" field
    pub fn set_project_id(&mut self, project_id: Option<EntityId>) {
        self.touch();
        self.project_id = project_id;
    }

    /// Record the event id a calendar gave to this task.
    /// This is bookkeeping of the sync, and leaves `updated_at` untouched
    pub(crate) fn set_calendar_event_id(&mut self, event_id: Option<String>) {
        self.calendar_event_id = event_id;
    }

    /// Merge a partial update over this task
    pub fn apply(&mut self, update: TaskUpdate) {
        self.touch();
        if let Some(title) = update.title { self.title = title; }
        if let Some(description) = update.description { self.description = description; }
        if let Some(priority) = update.priority { self.priority = priority; }
        if let Some(project_id) = update.project_id { self.project_id = project_id; }
        if let Some(from_date) = update.from_date { self.from_date = from_date; }
        if let Some(to_date) = update.to_date { self.to_date = to_date; }
        if let Some(event_id) = update.calendar_event_id { self.calendar_event_id = event_id; }
        if let Some(status) = update.status { self.change_status(status); }
    }
}


/// What is needed to create a task
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    /// Defaults to `Medium`
    pub priority: Option<Priority>,
    pub project_id: Option<EntityId>,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into(), ..Self::default() }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn scheduled(mut self, from_date: Option<DateTime<Utc>>, to_date: Option<DateTime<Utc>>) -> Self {
        self.from_date = from_date;
        self.to_date = to_date;
        self
    }
}


/// A partial update of a task.
///
/// `None` leaves a field unchanged. For optional fields, `Some(None)` clears the field.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub project_id: Option<Option<EntityId>>,
    pub from_date: Option<Option<DateTime<Utc>>>,
    pub to_date: Option<Option<DateTime<Utc>>>,
    pub calendar_event_id: Option<Option<String>>,
}

impl TaskUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn project_id(mut self, project_id: Option<EntityId>) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn from_date(mut self, from_date: Option<DateTime<Utc>>) -> Self {
        self.from_date = Some(from_date);
        self
    }

    pub fn to_date(mut self, to_date: Option<DateTime<Utc>>) -> Self {
        self.to_date = Some(to_date);
        self
    }

    pub fn calendar_event_id(mut self, event_id: Option<String>) -> Self {
        self.calendar_event_id = Some(event_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_task_defaults() {
        let task = Task::new(NewTask::new("Buy milk"));
        assert_eq!(task.status(), TaskStatus::Pending);
        assert_eq!(task.priority(), Priority::Medium);
        assert_eq!(task.created_at(), task.updated_at());
        assert!(task.completed_at().is_none());
        assert!(task.is_standalone());
    }

    #[test]
    fn completion_sets_and_clears_timestamp() {
        let mut task = Task::new(NewTask::new("Buy milk"));
        task.set_status(TaskStatus::Completed);
        let completed_at = *task.completed_at().unwrap();
        assert!(completed_at >= *task.created_at());

        // completing twice keeps the first timestamp
        task.set_status(TaskStatus::Completed);
        assert_eq!(task.completed_at(), Some(&completed_at));

        task.set_status(TaskStatus::InProgress);
        assert!(task.completed_at().is_none());
    }

    #[test]
    fn updated_at_strictly_increases() {
        let mut task = Task::new(NewTask::new("Buy milk"));
        let mut previous = *task.updated_at();
        for _ in 0..10 {
            task.apply(TaskUpdate::new().priority(Priority::High));
            assert!(*task.updated_at() > previous);
            previous = *task.updated_at();
        }
    }

    #[test]
    fn partial_update_can_clear_fields() {
        let mut task = Task::new(NewTask::new("Buy milk").description("2 litres"));
        task.apply(TaskUpdate::new().title("Buy oat milk"));
        assert_eq!(task.title(), "Buy oat milk");
        assert_eq!(task.description(), Some("2 litres"));

        task.apply(TaskUpdate::new().description(None));
        assert_eq!(task.description(), None);
    }

    #[test]
    fn update_builders_cover_every_field() {
        let from = Utc::now();
        let to = from + Duration::hours(2);
        let mut task = Task::new(NewTask::new("Call plumber"));
        task.apply(TaskUpdate::new()
            .from_date(Some(from))
            .to_date(Some(to))
            .calendar_event_id(Some("evt-1".to_string())));
        assert_eq!(task.from_date(), Some(&from));
        assert_eq!(task.to_date(), Some(&to));
        assert_eq!(task.calendar_event_id(), Some("evt-1"));

        task.apply(TaskUpdate::new().from_date(None).calendar_event_id(None));
        assert_eq!(task.from_date(), None);
        assert_eq!(task.to_date(), Some(&to));
        assert_eq!(task.calendar_event_id(), None);
    }

    #[test]
    fn storing_an_event_id_keeps_updated_at() {
        let mut task = Task::new(NewTask::new("Buy milk"));
        task.set_calendar_event_id(Some("evt-1".to_string()));
        assert_eq!(task.calendar_event_id(), Some("evt-1"));
        assert_eq!(task.created_at(), task.updated_at());
    }

    #[test]
    fn stored_layout_uses_camel_case() {
        let mut task = Task::new(NewTask::new("Buy milk"));
        task.set_status(TaskStatus::InProgress);
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["status"], "IN_PROGRESS");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("projectId").is_none());
    }
}
