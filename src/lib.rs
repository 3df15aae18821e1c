//! This crate provides a local-first task and project manager.
//!
//! Tasks and projects are persisted as two JSON collections in a key/value [`storage`] (a folder on disk, or memory).
//! The [`TaskService`] and the [`ProjectService`] apply the business rules on top of it, and keep both sides of the task/project link consistent. \
//! Every mutation can also be forwarded to an external [`calendar`], whose failures never undo a local change.
//!
//! User interfaces would typically use the [`hooks`], that track loading and error states, and expose the derived [`views`] (today, upcoming, completed, search...).

pub mod error;
pub use error::{Error, Result};
pub mod settings;

mod item;
pub use item::{Entity, EntityId, Priority};
pub mod task;
pub use task::Task;
pub mod project;
pub use project::Project;

pub mod mock_behaviour;
pub mod storage;
pub mod serializer;
pub mod repository;

pub mod calendar;
pub mod task_service;
pub use task_service::TaskService;
pub mod project_service;
pub use project_service::ProjectService;

pub mod views;
pub mod hooks;
