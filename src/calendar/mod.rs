//! Synchronisation of tasks and projects to an external calendar
//!
//! Calendars are collaborators of the services: a local mutation is always written first, then forwarded to the calendar.
//! Calendar failures never undo the local mutation. They are logged, and published to the listeners of a [`CalendarBridge`].

pub mod ics_calendar;
pub mod mock_calendar;
pub mod sync_progress;

use std::error::Error;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Error as CalendarError;
use crate::project::Project;
use crate::task::Task;
use sync_progress::{feedback_channel, FeedbackReceiver, FeedbackSender, SyncEvent};

pub use ics_calendar::IcsCalendar;
pub use mock_calendar::MockCalendar;

/// An external calendar that mirrors tasks and projects
#[async_trait]
pub trait CalendarSync: Send + Sync {
    /// Push every task to the calendar
    async fn sync_tasks(&self, tasks: &[Task]) -> Result<(), Box<dyn Error + Send + Sync>>;
    /// Push every project to the calendar
    async fn sync_projects(&self, projects: &[Project]) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Create or update the event of a task. Returns the event id, if this calendar assigns one
    async fn update_task_event(&self, task: &Task) -> Result<Option<String>, Box<dyn Error + Send + Sync>>;
    async fn delete_task_event(&self, task: &Task) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Create or update the event of a project. Returns the event id, if this calendar assigns one
    async fn update_project_event(&self, project: &Project) -> Result<Option<String>, Box<dyn Error + Send + Sync>>;
    async fn delete_project_event(&self, project: &Project) -> Result<(), Box<dyn Error + Send + Sync>>;
}


/// A calendar that does nothing, for when no calendar integration is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCalendar;

#[async_trait]
impl CalendarSync for NoCalendar {
    async fn sync_tasks(&self, _tasks: &[Task]) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
    async fn sync_projects(&self, _projects: &[Project]) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
    async fn update_task_event(&self, _task: &Task) -> Result<Option<String>, Box<dyn Error + Send + Sync>> {
        Ok(None)
    }
    async fn delete_task_event(&self, _task: &Task) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
    async fn update_project_event(&self, _project: &Project) -> Result<Option<String>, Box<dyn Error + Send + Sync>> {
        Ok(None)
    }
    async fn delete_project_event(&self, _project: &Project) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}


/// Wraps a [`CalendarSync`] so that its failures are non-fatal.
///
/// Every outcome is sent as a [`SyncEvent`] to the receivers returned by [`CalendarBridge::subscribe`].
#[derive(Clone)]
pub struct CalendarBridge {
    calendar: Arc<dyn CalendarSync>,
    feedback_sender: Arc<FeedbackSender>,
    feedback_receiver: FeedbackReceiver,
    n_errors: Arc<AtomicU32>,
}

impl CalendarBridge {
    pub fn new(calendar: Arc<dyn CalendarSync>) -> Self {
        let (sender, receiver) = feedback_channel();
        Self {
            calendar,
            feedback_sender: Arc::new(sender),
            feedback_receiver: receiver,
            n_errors: Arc::new(AtomicU32::new(0)),
        }
    }

    /// A bridge to a [`NoCalendar`]
    pub fn disabled() -> Self {
        Self::new(Arc::new(NoCalendar))
    }

    /// Get a receiver that tracks the latest calendar outcome
    pub fn subscribe(&self) -> FeedbackReceiver {
        self.feedback_receiver.clone()
    }

    /// How many calendar operations have failed since this bridge was created
    pub fn n_errors(&self) -> u32 {
        self.n_errors.load(Ordering::SeqCst)
    }

    fn report<T>(&self, operation: &str, subject: &str, result: Result<T, Box<dyn Error + Send + Sync>>) -> Option<T> {
        match result {
            Ok(value) => {
                log::debug!("Calendar: {} of {} succeeded", operation, subject);
                let _ = self.feedback_sender.send(SyncEvent::Succeeded {
                    operation: operation.to_string(),
                    subject: subject.to_string(),
                });
                Some(value)
            },
            Err(err) => {
                let err = CalendarError::Calendar(err.to_string());
                log::warn!("{} of {} failed: {}", operation, subject, err);
                self.n_errors.fetch_add(1, Ordering::SeqCst);
                let _ = self.feedback_sender.send(SyncEvent::Failed {
                    operation: operation.to_string(),
                    subject: subject.to_string(),
                    details: err.to_string(),
                });
                None
            },
        }
    }

    /// Forward a created or updated task. Returns the event id assigned by the calendar, if any
    pub async fn task_changed(&self, task: &Task) -> Option<String> {
        let result = self.calendar.update_task_event(task).await;
        self.report("update", &format!("task {}", task.id()), result).flatten()
    }

    pub async fn task_deleted(&self, task: &Task) -> bool {
        let result = self.calendar.delete_task_event(task).await;
        self.report("delete", &format!("task {}", task.id()), result).is_some()
    }

    /// Forward a created or updated project. Returns the event id assigned by the calendar, if any
    pub async fn project_changed(&self, project: &Project) -> Option<String> {
        let result = self.calendar.update_project_event(project).await;
        self.report("update", &format!("project {}", project.id()), result).flatten()
    }

    pub async fn project_deleted(&self, project: &Project) -> bool {
        let result = self.calendar.delete_project_event(project).await;
        self.report("delete", &format!("project {}", project.id()), result).is_some()
    }

    pub async fn sync_tasks(&self, tasks: &[Task]) -> bool {
        let result = self.calendar.sync_tasks(tasks).await;
        self.report("sync", &format!("{} tasks", tasks.len()), result).is_some()
    }

    pub async fn sync_projects(&self, projects: &[Project]) -> bool {
        let result = self.calendar.sync_projects(projects).await;
        self.report("sync", &format!("{} projects", projects.len()), result).is_some()
    }
}

impl std::fmt::Debug for CalendarBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalendarBridge")
            .field("n_errors", &self.n_errors())
            .finish()
    }
}
