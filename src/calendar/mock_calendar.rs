//! A calendar that only records what it is asked to do. Useful in tests

use std::error::Error;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::calendar::CalendarSync;
use crate::mock_behaviour::MockBehaviour;
use crate::project::Project;
use crate::task::Task;

/// A calendar that keeps a log of the calls it receives, and that can be told to fail through a [`MockBehaviour`]
#[derive(Debug, Default)]
pub struct MockCalendar {
    calls: Mutex<Vec<String>>,
    mock_behaviour: Option<Arc<Mutex<MockBehaviour>>>,
}

impl MockCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_behaviour(behaviour: Arc<Mutex<MockBehaviour>>) -> Self {
        Self { calls: Mutex::new(Vec::new()), mock_behaviour: Some(behaviour) }
    }

    /// The calls that succeeded so far, e.g. `"update_task <id>"`
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    fn check<F>(&self, f: F) -> Result<(), Box<dyn Error + Send + Sync>>
    where
        F: FnOnce(&mut MockBehaviour) -> Result<(), Box<dyn Error + Send + Sync>>,
    {
        match &self.mock_behaviour {
            None => Ok(()),
            Some(behaviour) => {
                let mut behaviour = behaviour.lock().map_err(|_| "poisoned mock behaviour")?;
                f(&mut behaviour)
            },
        }
    }

    fn record(&self, call: String) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

#[async_trait]
impl CalendarSync for MockCalendar {
    async fn sync_tasks(&self, tasks: &[Task]) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.check(|b| b.can_sync())?;
        self.record(format!("sync_tasks {}", tasks.len()));
        Ok(())
    }

    async fn sync_projects(&self, projects: &[Project]) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.check(|b| b.can_sync())?;
        self.record(format!("sync_projects {}", projects.len()));
        Ok(())
    }

    async fn update_task_event(&self, task: &Task) -> Result<Option<String>, Box<dyn Error + Send + Sync>> {
        self.check(|b| b.can_update_event())?;
        self.record(format!("update_task {}", task.id()));
        Ok(Some(format!("mock-{}", task.id())))
    }

    async fn delete_task_event(&self, task: &Task) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.check(|b| b.can_delete_event())?;
        self.record(format!("delete_task {}", task.id()));
        Ok(())
    }

    async fn update_project_event(&self, project: &Project) -> Result<Option<String>, Box<dyn Error + Send + Sync>> {
        self.check(|b| b.can_update_event())?;
        self.record(format!("update_project {}", project.id()));
        Ok(Some(format!("mock-{}", project.id())))
    }

    async fn delete_project_event(&self, project: &Project) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.check(|b| b.can_delete_event())?;
        self.record(format!("delete_project {}", project.id()));
        Ok(())
    }
}
