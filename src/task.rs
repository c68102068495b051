// src/task.rs

use actix_web::{web, HttpMessage, HttpRequest, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use mongodb::bson::{doc, to_bson};
use serde::Deserialize;
use log::{error, info};

use crate::app_state::AppState;
use crate::auth::CurrentUser;
use crate::board::group_by_status;
use crate::models::project::Project;
use crate::models::task::{Task, TaskPriority, TaskStatus};
use crate::validation;

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub tags: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub points: Option<i32>,
    pub assigned_user_ids: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub tags: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub points: Option<i32>,
    pub assigned_user_ids: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskStatusRequest {
    pub status: TaskStatus,
}

fn current_user(req: &HttpRequest) -> Option<String> {
    req.extensions().get::<CurrentUser>().map(|u| u.0.clone())
}

async fn project_exists(data: &AppState, project_id: i64) -> Result<bool, mongodb::error::Error> {
    let projects_coll = data.mongodb.db.collection::<Project>("projects");
    Ok(projects_coll
        .find_one(doc! { "id": project_id })
        .await?
        .is_some())
}

async fn fetch_project_tasks(
    data: &AppState,
    project_id: i64,
) -> Result<Vec<Task>, mongodb::error::Error> {
    let tasks_coll = data.mongodb.db.collection::<Task>("tasks");
    let mut cursor = tasks_coll.find(doc! { "project_id": project_id }).await?;
    let mut tasks = Vec::new();
    while let Some(task) = cursor.next().await {
        tasks.push(task?);
    }
    Ok(tasks)
}

/// GET /projects/{id}/tasks
pub async fn list_tasks_by_project(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> impl Responder {
    if current_user(&req).is_none() {
        return HttpResponse::Unauthorized().body("Unauthorized");
    }
    let project_id = path.into_inner();

    match fetch_project_tasks(&data, project_id).await {
        Ok(tasks) => HttpResponse::Ok().json(tasks),
        Err(e) => {
            error!("Error fetching tasks for project {}: {}", project_id, e);
            HttpResponse::InternalServerError().body("Failed to fetch tasks")
        }
    }
}

/// GET /projects/{id}/board
/// The task list partitioned into the four status columns.
pub async fn get_project_board(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> impl Responder {
    if current_user(&req).is_none() {
        return HttpResponse::Unauthorized().body("Unauthorized");
    }
    let project_id = path.into_inner();

    match project_exists(&data, project_id).await {
        Ok(true) => {}
        Ok(false) => return HttpResponse::NotFound().body("Project not found"),
        Err(e) => {
            error!("Error fetching project {}: {}", project_id, e);
            return HttpResponse::InternalServerError().body("Failed to fetch board");
        }
    }

    match fetch_project_tasks(&data, project_id).await {
        Ok(tasks) => HttpResponse::Ok().json(group_by_status(&tasks)),
        Err(e) => {
            error!("Error fetching tasks for project {}: {}", project_id, e);
            HttpResponse::InternalServerError().body("Failed to fetch board")
        }
    }
}

/// POST /projects/{id}/tasks
pub async fn create_task(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i64>,
    payload: web::Json<CreateTaskRequest>,
) -> impl Responder {
    if current_user(&req).is_none() {
        return HttpResponse::Unauthorized().body("Unauthorized");
    }
    let project_id = path.into_inner();

    // Validation failures never reach the store.
    if let Err(msg) = validation::task_form(
        &payload.title,
        payload.description.as_deref(),
        payload.status,
        payload.start_date,
        payload.due_date,
    ) {
        return HttpResponse::BadRequest().body(msg);
    }

    match project_exists(&data, project_id).await {
        Ok(true) => {}
        Ok(false) => return HttpResponse::NotFound().body("Project not found"),
        Err(e) => {
            error!("Error fetching project {}: {}", project_id, e);
            return HttpResponse::InternalServerError().body("Failed to create task");
        }
    }

    let id = match data.mongodb.next_sequence("tasks").await {
        Ok(id) => id,
        Err(e) => {
            error!("Error allocating task id: {}", e);
            return HttpResponse::InternalServerError().body("Failed to create task");
        }
    };

    let new_task = Task {
        id,
        project_id,
        title: payload.title.clone(),
        description: payload.description.clone(),
        status: payload.status.unwrap_or(TaskStatus::ToDo),
        priority: payload.priority.unwrap_or(TaskPriority::Low),
        tags: payload.tags.clone(),
        start_date: payload.start_date,
        due_date: payload.due_date,
        points: payload.points,
        assigned_user_ids: payload.assigned_user_ids.clone().unwrap_or_default(),
        created_at: Utc::now(),
    };

    let tasks_coll = data.mongodb.db.collection::<Task>("tasks");
    match tasks_coll.insert_one(&new_task).await {
        Ok(_) => {
            info!("Task created: {} in project {}", new_task.id, project_id);
            HttpResponse::Ok().json(new_task)
        }
        Err(e) => {
            error!("Error creating task: {}", e);
            HttpResponse::InternalServerError().body("Failed to create task")
        }
    }
}

/// PUT /tasks/{id}
pub async fn update_task(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i64>,
    payload: web::Json<UpdateTaskRequest>,
) -> impl Responder {
    if current_user(&req).is_none() {
        return HttpResponse::Unauthorized().body("Unauthorized");
    }
    let task_id = path.into_inner();

    if let Some(title) = &payload.title {
        if let Err(msg) = validation::require_text("Task title", title) {
            return HttpResponse::BadRequest().body(msg);
        }
    }
    if let Err(msg) = validation::optional_text("Description", payload.description.as_deref()) {
        return HttpResponse::BadRequest().body(msg);
    }
    if let Err(msg) = validation::date_range(
        "Start date",
        "Due date",
        payload.start_date,
        payload.due_date,
    ) {
        return HttpResponse::BadRequest().body(msg);
    }

    let mut set_doc = doc! {};
    if let Some(title) = &payload.title {
        set_doc.insert("title", title.clone());
    }
    if let Some(description) = &payload.description {
        set_doc.insert("description", description.clone());
    }
    if let Some(status) = payload.status {
        match to_bson(&status) {
            Ok(b) => {
                set_doc.insert("status", b);
            }
            Err(e) => {
                error!("Error encoding status: {}", e);
                return HttpResponse::InternalServerError().body("Failed to update task");
            }
        }
    }
    if let Some(priority) = payload.priority {
        match to_bson(&priority) {
            Ok(b) => {
                set_doc.insert("priority", b);
            }
            Err(e) => {
                error!("Error encoding priority: {}", e);
                return HttpResponse::InternalServerError().body("Failed to update task");
            }
        }
    }
    if let Some(tags) = &payload.tags {
        set_doc.insert("tags", tags.clone());
    }
    if let Some(start) = payload.start_date {
        set_doc.insert("start_date", start.to_rfc3339());
    }
    if let Some(due) = payload.due_date {
        set_doc.insert("due_date", due.to_rfc3339());
    }
    if let Some(points) = payload.points {
        set_doc.insert("points", points);
    }
    if let Some(users) = &payload.assigned_user_ids {
        set_doc.insert("assigned_user_ids", users.clone());
    }
    if set_doc.is_empty() {
        return HttpResponse::BadRequest().body("No fields to update");
    }

    let tasks_coll = data.mongodb.db.collection::<Task>("tasks");
    match tasks_coll
        .update_one(doc! { "id": task_id }, doc! { "$set": set_doc })
        .await
    {
        Ok(res) if res.matched_count == 1 => HttpResponse::Ok().body("Task updated"),
        Ok(_) => HttpResponse::NotFound().body("Task not found"),
        Err(e) => {
            error!("Error updating task {}: {}", task_id, e);
            HttpResponse::InternalServerError().body("Failed to update task")
        }
    }
}

/// PUT /tasks/{id}/status
/// A status change is a direct assignment; every transition between
/// the four statuses is permitted.
pub async fn update_task_status(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i64>,
    payload: web::Json<UpdateTaskStatusRequest>,
) -> impl Responder {
    if current_user(&req).is_none() {
        return HttpResponse::Unauthorized().body("Unauthorized");
    }
    let task_id = path.into_inner();

    let status = match to_bson(&payload.status) {
        Ok(b) => b,
        Err(e) => {
            error!("Error encoding status: {}", e);
            return HttpResponse::InternalServerError().body("Failed to update task status");
        }
    };

    let tasks_coll = data.mongodb.db.collection::<Task>("tasks");
    match tasks_coll
        .update_one(doc! { "id": task_id }, doc! { "$set": { "status": status } })
        .await
    {
        Ok(res) if res.matched_count == 1 => match tasks_coll.find_one(doc! { "id": task_id }).await
        {
            Ok(Some(task)) => {
                info!("Task {} moved to {}", task_id, task.status.label());
                HttpResponse::Ok().json(task)
            }
            Ok(None) => HttpResponse::NotFound().body("Task not found"),
            Err(e) => {
                error!("Error fetching task {}: {}", task_id, e);
                HttpResponse::InternalServerError().body("Failed to update task status")
            }
        },
        Ok(_) => HttpResponse::NotFound().body("Task not found"),
        Err(e) => {
            error!("Error updating status of task {}: {}", task_id, e);
            HttpResponse::InternalServerError().body("Failed to update task status")
        }
    }
}

/// DELETE /tasks/{id}
pub async fn delete_task(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> impl Responder {
    if current_user(&req).is_none() {
        return HttpResponse::Unauthorized().body("Unauthorized");
    }
    let task_id = path.into_inner();

    let tasks_coll = data.mongodb.db.collection::<Task>("tasks");
    match tasks_coll.delete_one(doc! { "id": task_id }).await {
        Ok(res) if res.deleted_count == 1 => {
            info!("Task deleted: {}", task_id);
            HttpResponse::Ok().body("Task deleted")
        }
        Ok(_) => HttpResponse::NotFound().body("Task not found or already deleted"),
        Err(e) => {
            error!("Error deleting task {}: {}", task_id, e);
            HttpResponse::InternalServerError().body("Failed to delete task")
        }
    }
}
