//! Support for library configuration options

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use once_cell::sync::Lazy;

/// The storage key under which the task collection is stored
pub const TASKS_KEY: &str = "tasks";
/// The storage key under which the project collection is stored
pub const PROJECTS_KEY: &str = "projects";

/// Environment variable that overrides the data directory
pub const DATA_DIR_ENV: &str = "TASKDECK_DATA_DIR";

/// Part of the ProdID string that describes the organization (example of a ProdID string: `-//ABC Corporation//My Product//EN`).
/// Feel free to override it when initing this library.
pub static ORG_NAME: Lazy<Arc<Mutex<String>>> = Lazy::new(|| Arc::new(Mutex::new("My organization".to_string())));

/// Part of the ProdID string that describes the product name (example of a ProdID string: `-//ABC Corporation//My Product//EN`).
/// Feel free to override it when initing this library.
pub static PRODUCT_NAME: Lazy<Arc<Mutex<String>>> = Lazy::new(|| Arc::new(Mutex::new("TaskDeck".to_string())));

/// The PRODID that is written into generated iCal files
pub fn default_prod_id() -> String {
    let org = ORG_NAME.lock().map(|s| s.clone()).unwrap_or_default();
    let product = PRODUCT_NAME.lock().map(|s| s.clone()).unwrap_or_default();
    format!("-//{}//{}//EN", org, product)
}

/// Runtime settings of an application using this crate
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    /// The folder where the task and project collections are stored
    pub data_dir: PathBuf,
    /// If set, tasks and projects are also exported as iCal files into this folder
    pub ics_dir: Option<PathBuf>,
}

impl Settings {
    /// Build settings from the environment.
    ///
    /// The data directory is `$TASKDECK_DATA_DIR`, or the platform data directory, or `./taskdeck-data` as a last resort.
    pub fn from_env() -> Self {
        let data_dir = std::env::var_os(DATA_DIR_ENV)
            .map(PathBuf::from)
            .or_else(|| dirs::data_dir().map(|p| p.join("taskdeck")))
            .unwrap_or_else(|| PathBuf::from("taskdeck-data"));

        Self { data_dir, ics_dir: None }
    }

    pub fn with_data_dir(mut self, data_dir: PathBuf) -> Self {
        self.data_dir = data_dir;
        self
    }

    pub fn with_ics_dir(mut self, ics_dir: Option<PathBuf>) -> Self {
        self.ics_dir = ics_dir;
        self
    }
}
