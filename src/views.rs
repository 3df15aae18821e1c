//! Derived views, i.e. filtered and sorted projections of the task and project collections
//!
//! These are recomputed on demand and never stored.

use std::cmp::Ordering;

use chrono::{DateTime, Local, Utc};

use crate::item::Priority;
use crate::project::Project;
use crate::task::Task;

/// What the views need to know about a task or a project
pub trait Schedulable {
    fn title(&self) -> &str;
    fn description(&self) -> Option<&str>;
    fn priority(&self) -> Priority;
    /// The end of the scheduled window: `to_date` for tasks, `due_date` for projects
    fn deadline(&self) -> Option<&DateTime<Utc>>;
    fn is_completed(&self) -> bool;
    /// Whether this belongs to no project
    fn is_standalone(&self) -> bool;
}

impl Schedulable for Task {
    fn title(&self) -> &str { Task::title(self) }
    fn description(&self) -> Option<&str> { Task::description(self) }
    fn priority(&self) -> Priority { Task::priority(self) }
    fn deadline(&self) -> Option<&DateTime<Utc>> { self.to_date() }
    fn is_completed(&self) -> bool { self.completed() }
    fn is_standalone(&self) -> bool { Task::is_standalone(self) }
}

impl Schedulable for Project {
    fn title(&self) -> &str { Project::title(self) }
    fn description(&self) -> Option<&str> { Project::description(self) }
    fn priority(&self) -> Priority { Project::priority(self) }
    fn deadline(&self) -> Option<&DateTime<Utc>> { self.due_date() }
    fn is_completed(&self) -> bool { self.completed() }
    fn is_standalone(&self) -> bool { false }
}


/// The views a list can be filtered with
#[derive(Clone, Debug, PartialEq)]
pub enum View {
    /// Everything
    All,
    /// Items whose deadline falls on the current (local) calendar day
    Today,
    /// Items whose deadline is strictly in the future
    Upcoming,
    /// Completed items
    Completed,
    /// Tasks that belong to no project
    Standalone,
    /// Case-insensitive match on title and description
    Search(String),
}

impl Default for View {
    fn default() -> Self {
        View::All
    }
}

impl View {
    /// Filter `items`, relative to the given current time
    pub fn apply<'a, T: Schedulable>(&self, items: &'a [T], now: &DateTime<Local>) -> Vec<&'a T> {
        match self {
            View::All => items.iter().collect(),
            View::Today => today(items, now),
            View::Upcoming => upcoming(items, &now.with_timezone(&Utc)),
            View::Completed => completed(items),
            View::Standalone => items.iter().filter(|item| item.is_standalone()).collect(),
            View::Search(query) => search(items, query),
        }
    }

    /// Filter `items`, relative to the current time
    pub fn apply_now<'a, T: Schedulable>(&self, items: &'a [T]) -> Vec<&'a T> {
        self.apply(items, &Local::now())
    }
}

/// Items whose deadline is on the same local day as `now`
pub fn today<'a, T: Schedulable>(items: &'a [T], now: &DateTime<Local>) -> Vec<&'a T> {
    let today = now.date_naive();
    items.iter()
        .filter(|item| match item.deadline() {
            None => false,
            Some(deadline) => deadline.with_timezone(&Local).date_naive() == today,
        })
        .collect()
}

/// Items whose deadline is strictly after `now`
pub fn upcoming<'a, T: Schedulable>(items: &'a [T], now: &DateTime<Utc>) -> Vec<&'a T> {
    items.iter()
        .filter(|item| item.deadline().map(|deadline| deadline > now).unwrap_or(false))
        .collect()
}

pub fn completed<T: Schedulable>(items: &[T]) -> Vec<&T> {
    items.iter().filter(|item| item.is_completed()).collect()
}

/// Items whose title or description contains `query`, ignoring case
pub fn search<'a, T: Schedulable>(items: &'a [T], query: &str) -> Vec<&'a T> {
    let query = query.to_lowercase();
    items.iter()
        .filter(|item| {
            item.title().to_lowercase().contains(&query)
                || item.description().map(|d| d.to_lowercase().contains(&query)).unwrap_or(false)
        })
        .collect()
}


/// Compare alphabetically, ignoring case
pub fn compare_alpha<T: Schedulable>(left: &&T, right: &&T) -> Ordering {
    Ord::cmp(&left.title().to_lowercase(), &right.title().to_lowercase())
}

/// Highest priority first, then earliest deadline first (items without deadline last)
pub fn compare_urgency<T: Schedulable>(left: &&T, right: &&T) -> Ordering {
    let by_priority = left.priority().rank().cmp(&right.priority().rank());
    let by_deadline = match (left.deadline(), right.deadline()) {
        (Some(l), Some(r)) => l.cmp(r),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_priority.then(by_deadline)
}
