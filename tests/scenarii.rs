//! End-to-end scenarios over the services, persisted into a folder

use std::path::Path;

use taskdeck::calendar::CalendarBridge;
use taskdeck::project::NewProject;
use taskdeck::storage::StorageService;
use taskdeck::task::{NewTask, TaskStatus, TaskUpdate};
use taskdeck::{EntityId, Priority, ProjectService, TaskService};

fn services_in(folder: &Path) -> (TaskService, ProjectService) {
    let storage = StorageService::in_folder(folder);
    let tasks = TaskService::new(storage.clone(), CalendarBridge::disabled());
    let projects = ProjectService::new(storage, tasks.clone());
    (tasks, projects)
}

#[tokio::test]
async fn buy_milk() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();
    let (tasks, _) = services_in(dir.path());

    let task = tasks.create(NewTask::new("Buy milk").priority(Priority::Medium)).await.unwrap();
    assert_eq!(task.status(), TaskStatus::Pending);
    assert!(task.id().as_str().is_empty() == false);
    assert_eq!(task.created_at(), task.updated_at());

    let done = tasks.mark_complete(task.id()).await.unwrap();
    assert_eq!(done.status(), TaskStatus::Completed);
    assert!(done.completed_at().unwrap() >= task.created_at());
}

#[tokio::test]
async fn launch_project() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();
    let (tasks, projects) = services_in(dir.path());

    let project = projects.create(NewProject::new("Launch")).await.unwrap();
    let task = tasks.create(NewTask::new("Write copy")).await.unwrap();

    let project = projects.add_task(project.id(), task.id()).await.unwrap();
    assert_eq!(project.task_ids(), &[task.id().clone()]);
    assert_eq!(tasks.get_by_id(task.id()).await.unwrap().project_id(), Some(project.id()));

    projects.delete(project.id()).await.unwrap();
    assert_eq!(tasks.get_by_id(task.id()).await.unwrap().project_id(), None);
    assert!(projects.get_all().await.iter().all(|p| p.id() != project.id()));
}

#[tokio::test]
async fn deleting_a_project_unlinks_all_its_tasks() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();
    let (tasks, projects) = services_in(dir.path());

    let project = projects.create(NewProject::new("Move out")).await.unwrap();
    let mut ids = Vec::new();
    for title in &["Pack", "Clean", "Hand keys over"] {
        let task = tasks.create(NewTask::new(*title)).await.unwrap();
        projects.add_task(project.id(), task.id()).await.unwrap();
        ids.push(task.id().clone());
    }
    // This one points at the project without being listed in it
    let stray = tasks.create(NewTask::new("Cancel internet")).await.unwrap();
    tasks.update(stray.id(), TaskUpdate::new().project_id(Some(project.id().clone()))).await.unwrap();
    ids.push(stray.id().clone());

    projects.delete(project.id()).await.unwrap();

    for id in &ids {
        assert_eq!(tasks.get_by_id(id).await.unwrap().project_id(), None);
    }
    assert_eq!(tasks.get_all().await.len(), 4);
    assert!(projects.get_all().await.is_empty());
}

#[tokio::test]
async fn data_survives_a_restart() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();

    let (task_id, project_id) = {
        let (tasks, projects) = services_in(dir.path());
        let task = tasks.create(NewTask::new("Plan trip").description("Somewhere warm")).await.unwrap();
        let project = projects.promote_task_to_project(&task).await.unwrap();
        (task.id().clone(), project.id().clone())
    };

    let (tasks, projects) = services_in(dir.path());
    let task = tasks.get_by_id(&task_id).await.unwrap();
    let project = projects.get_by_id(&project_id).await.unwrap();
    assert_eq!(task.project_id(), Some(&project_id));
    assert_eq!(project.task_ids(), &[task_id]);
    assert_eq!(project.description(), Some("Somewhere warm"));
}

#[tokio::test]
async fn corrupted_files_read_as_empty_collections() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("tasks.json"), "{{{ definitely not json").unwrap();

    let (tasks, _) = services_in(dir.path());
    assert!(tasks.get_all().await.is_empty());
    assert!(tasks.delete(&EntityId::from("anything")).await.unwrap_err().is_not_found());

    // the next write replaces the corrupted data
    tasks.create(NewTask::new("Fresh start")).await.unwrap();
    assert_eq!(tasks.get_all().await.len(), 1);
}
