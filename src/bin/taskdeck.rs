//! A command-line front-end for taskdeck

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use clap::{Parser, Subcommand, ValueEnum};

use taskdeck::calendar::{CalendarBridge, IcsCalendar};
use taskdeck::hooks::{ProjectsHook, TasksHook};
use taskdeck::project::{NewProject, ProjectStatus, ProjectUpdate};
use taskdeck::settings::Settings;
use taskdeck::storage::StorageService;
use taskdeck::task::NewTask;
use taskdeck::views::{compare_alpha, compare_urgency, View};
use taskdeck::{EntityId, Priority, Project, ProjectService, Task, TaskService};

#[derive(Parser)]
#[command(name = "taskdeck", about = "Manage tasks and projects")]
struct Cli {
    /// Where tasks and projects are stored (defaults to $TASKDECK_DATA_DIR, or the platform data directory)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Also export tasks and projects as iCal files into this folder
    #[arg(long, global = true)]
    ics: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum ViewArg {
    All,
    Today,
    Upcoming,
    Completed,
    Standalone,
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Alpha,
    Urgency,
}

#[derive(Subcommand)]
enum Command {
    /// List tasks
    List {
        #[arg(long, value_enum, default_value = "all")]
        view: ViewArg,
        #[arg(long, value_enum)]
        sort: Option<SortArg>,
    },
    /// Create a task
    Add {
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        priority: Option<Priority>,
        /// RFC 3339 timestamp, or a YYYY-MM-DD day
        #[arg(long)]
        due: Option<String>,
    },
    /// Mark a task as in progress
    Start { id: String },
    /// Mark a task as completed
    Done { id: String },
    /// Toggle the completion of a task
    Toggle { id: String },
    /// Delete a task
    Rm { id: String },
    /// Search tasks and projects
    Search { query: String },
    /// List projects
    Projects,
    /// Create a project
    ProjectAdd {
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long)]
        due: Option<String>,
    },
    /// Mark a project as completed
    ProjectDone { id: String },
    /// Delete a project. Its tasks are kept
    ProjectRm { id: String },
    /// Add a task to a project
    Link { project: String, task: String },
    /// Remove a task from a project
    Unlink { project: String, task: String },
    /// Turn a task into a project containing it
    Promote { task: String },
    /// Push everything to the calendar
    Sync,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let mut settings = Settings::from_env().with_ics_dir(cli.ics.clone());
    if let Some(data_dir) = &cli.data_dir {
        settings = settings.with_data_dir(data_dir.clone());
    }
    log::debug!("Using settings {:?}", settings);

    let storage = StorageService::in_folder(&settings.data_dir);
    let calendar = match &settings.ics_dir {
        Some(folder) => CalendarBridge::new(Arc::new(IcsCalendar::new(folder))),
        None => CalendarBridge::disabled(),
    };
    let task_service = TaskService::new(storage.clone(), calendar);
    let project_service = ProjectService::new(storage, task_service.clone());
    let mut tasks = TasksHook::new(task_service);
    let mut projects = ProjectsHook::new(project_service);
    tasks.refresh().await?;
    projects.refresh().await?;

    match cli.command {
        Command::List { view, sort } => {
            let view = match view {
                ViewArg::All => View::All,
                ViewArg::Today => View::Today,
                ViewArg::Upcoming => View::Upcoming,
                ViewArg::Completed => View::Completed,
                ViewArg::Standalone => View::Standalone,
            };
            let mut listed = tasks.view(&view, &Local::now());
            match sort {
                Some(SortArg::Alpha) => listed.sort_by(compare_alpha),
                Some(SortArg::Urgency) => listed.sort_by(compare_urgency),
                None => (),
            }
            for task in listed {
                print_task(task);
            }
        },
        Command::Add { title, description, priority, due } => {
            let input = NewTask {
                title,
                description,
                priority,
                to_date: due.as_deref().map(parse_date).transpose()?,
                ..NewTask::default()
            };
            let task = tasks.create(input).await?;
            print_task(&task);
        },
        Command::Start { id } => print_task(&tasks.mark_in_progress(&EntityId::from(id)).await?),
        Command::Done { id } => print_task(&tasks.mark_complete(&EntityId::from(id)).await?),
        Command::Toggle { id } => print_task(&tasks.toggle_completion(&EntityId::from(id)).await?),
        Command::Rm { id } => {
            tasks.delete(&EntityId::from(id)).await?;
            println!("Deleted.");
        },
        Command::Search { query } => {
            for project in projects.search(&query) {
                print_project(project);
            }
            for task in tasks.search(&query) {
                print_task(task);
            }
        },
        Command::Projects => {
            for project in projects.projects() {
                print_project(project);
                for task in projects.tasks_of(project.id()).await? {
                    print!("    ");
                    print_task(&task);
                }
            }
        },
        Command::ProjectAdd { title, description, priority, due } => {
            let input = NewProject {
                title,
                description,
                priority,
                due_date: due.as_deref().map(parse_date).transpose()?,
                ..NewProject::default()
            };
            print_project(&projects.create(input).await?);
        },
        Command::ProjectDone { id } => {
            let update = ProjectUpdate::new().status(ProjectStatus::Completed);
            print_project(&projects.update(&EntityId::from(id), update).await?);
        },
        Command::ProjectRm { id } => {
            projects.delete(&EntityId::from(id)).await?;
            println!("Deleted.");
        },
        Command::Link { project, task } => {
            print_project(&projects.add_task(&EntityId::from(project), &EntityId::from(task)).await?);
        },
        Command::Unlink { project, task } => {
            print_project(&projects.remove_task(&EntityId::from(project), &EntityId::from(task)).await?);
        },
        Command::Promote { task } => {
            let task = tasks.tasks().iter()
                .find(|t| t.id().as_str() == task)
                .cloned()
                .ok_or_else(|| taskdeck::Error::task_not_found(&task))?;
            print_project(&projects.promote_task_to_project(&task).await?);
        },
        Command::Sync => {
            if tasks.sync_calendar().await == false || projects.sync_calendar().await == false {
                log::warn!("Calendar sync did not complete, see the previous log lines for more info.");
            }
        },
    }

    if let Some(message) = tasks.calendar_error().or_else(|| projects.calendar_error()) {
        eprintln!("Warning: {}", message);
    }
    Ok(())
}

fn parse_date(s: &str) -> Result<DateTime<Utc>, Box<dyn Error>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    let day = NaiveDate::parse_from_str(s, "%Y-%m-%d")?;
    let end_of_day = day.and_hms_opt(23, 59, 59).ok_or("invalid time")?;
    let local = Local.from_local_datetime(&end_of_day)
        .earliest()
        .ok_or_else(|| format!("{} does not exist in the local time zone", s))?;
    Ok(local.with_timezone(&Utc))
}

fn print_task(task: &Task) {
    let completion = if task.completed() { "✓" } else { " " };
    let due = task.to_date()
        .map(|d| format!(" (due {})", d.with_timezone(&Local).format("%Y-%m-%d %H:%M")))
        .unwrap_or_default();
    println!("{} {}\t[{}, {}]{}\t{}", completion, task.title(), task.status(), task.priority(), due, task.id());
}

fn print_project(project: &Project) {
    println!("# {}\t[{}, {}, {} tasks]\t{}", project.title(), project.status(), project.priority(), project.task_ids().len(), project.id());
}
