// src/project.rs

use std::collections::HashMap;

use actix_web::{web, HttpMessage, HttpRequest, HttpResponse, Responder};
use chrono::Utc;
use futures_util::StreamExt;
use mongodb::bson::{doc, Document};
use serde::Deserialize;
use log::{error, info};

use crate::app_state::AppState;
use crate::auth::CurrentUser;
use crate::filters::{filter_and_sort, ListCriteria};
use crate::models::project::{Project, ProjectWithTasks};
use crate::models::task::Task;
use crate::models::{ProjectTeam, Team};
use crate::validation;

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    pub description: Option<String>,
    /// YYYY-MM-DD, empty string counts as unset.
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AssignTeamRequest {
    pub team_id: i64,
}

fn current_user(req: &HttpRequest) -> Option<String> {
    req.extensions().get::<CurrentUser>().map(|u| u.0.clone())
}

/// Fetches every task for the given project ids and returns them
/// keyed by project, preserving store order within each project.
async fn tasks_by_project(
    data: &AppState,
    project_ids: &[i64],
) -> Result<HashMap<i64, Vec<Task>>, mongodb::error::Error> {
    let mut by_project: HashMap<i64, Vec<Task>> = HashMap::new();
    if project_ids.is_empty() {
        return Ok(by_project);
    }
    let tasks_coll = data.mongodb.db.collection::<Task>("tasks");
    let mut cursor = tasks_coll
        .find(doc! { "project_id": { "$in": project_ids.to_vec() } })
        .await?;
    while let Some(task) = cursor.next().await {
        let task = task?;
        by_project.entry(task.project_id).or_default().push(task);
    }
    Ok(by_project)
}

/// Fetches the teams assigned to the given project ids, keyed by
/// project.
async fn teams_by_project(
    data: &AppState,
    project_ids: &[i64],
) -> Result<HashMap<i64, Vec<Team>>, mongodb::error::Error> {
    let mut by_project: HashMap<i64, Vec<Team>> = HashMap::new();
    if project_ids.is_empty() {
        return Ok(by_project);
    }

    let joins_coll = data.mongodb.db.collection::<ProjectTeam>("project_teams");
    let mut joins = Vec::new();
    let mut cursor = joins_coll
        .find(doc! { "project_id": { "$in": project_ids.to_vec() } })
        .await?;
    while let Some(join) = cursor.next().await {
        joins.push(join?);
    }

    let team_ids: Vec<i64> = joins.iter().map(|j| j.team_id).collect();
    let mut teams: HashMap<i64, Team> = HashMap::new();
    if !team_ids.is_empty() {
        let teams_coll = data.mongodb.db.collection::<Team>("teams");
        let mut cursor = teams_coll.find(doc! { "id": { "$in": team_ids } }).await?;
        while let Some(team) = cursor.next().await {
            let team = team?;
            teams.insert(team.id, team);
        }
    }

    for join in joins {
        if let Some(team) = teams.get(&join.team_id) {
            by_project
                .entry(join.project_id)
                .or_default()
                .push(team.clone());
        }
    }
    Ok(by_project)
}

/// GET /projects
/// Lists projects with embedded tasks and teams, filtered and sorted
/// by the query-string criteria.
pub async fn list_projects(
    req: HttpRequest,
    data: web::Data<AppState>,
    criteria: web::Query<ListCriteria>,
) -> impl Responder {
    if current_user(&req).is_none() {
        return HttpResponse::Unauthorized().body("Unauthorized");
    }

    let projects_coll = data.mongodb.db.collection::<Project>("projects");
    let mut cursor = match projects_coll.find(doc! {}).await {
        Ok(c) => c,
        Err(e) => {
            error!("Error fetching projects: {}", e);
            return HttpResponse::InternalServerError().body("Failed to fetch projects");
        }
    };
    let mut projects = Vec::new();
    while let Some(res) = cursor.next().await {
        match res {
            Ok(p) => projects.push(p),
            Err(e) => {
                error!("Cursor error reading projects: {}", e);
                return HttpResponse::InternalServerError().body("Failed to fetch projects");
            }
        }
    }

    let ids: Vec<i64> = projects.iter().map(|p| p.id).collect();
    let mut tasks = match tasks_by_project(&data, &ids).await {
        Ok(t) => t,
        Err(e) => {
            error!("Error fetching tasks for project list: {}", e);
            return HttpResponse::InternalServerError().body("Failed to fetch projects");
        }
    };
    let mut teams = match teams_by_project(&data, &ids).await {
        Ok(t) => t,
        Err(e) => {
            error!("Error fetching teams for project list: {}", e);
            return HttpResponse::InternalServerError().body("Failed to fetch projects");
        }
    };

    let embedded: Vec<ProjectWithTasks> = projects
        .into_iter()
        .map(|project| {
            let tasks = tasks.remove(&project.id).unwrap_or_default();
            let teams = teams.remove(&project.id).unwrap_or_default();
            ProjectWithTasks {
                project,
                tasks,
                teams,
            }
        })
        .collect();

    HttpResponse::Ok().json(filter_and_sort(embedded, &criteria.into_inner()))
}

/// POST /projects
pub async fn create_project(
    req: HttpRequest,
    data: web::Data<AppState>,
    payload: web::Json<CreateProjectRequest>,
) -> impl Responder {
    if current_user(&req).is_none() {
        return HttpResponse::Unauthorized().body("Unauthorized");
    }

    // Validation failures never reach the store.
    let dates = match validation::project_form(
        Some(&payload.name),
        true,
        payload.description.as_deref(),
        payload.start_date.as_deref(),
        payload.end_date.as_deref(),
    ) {
        Ok(dates) => dates,
        Err(msg) => return HttpResponse::BadRequest().body(msg),
    };

    let id = match data.mongodb.next_sequence("projects").await {
        Ok(id) => id,
        Err(e) => {
            error!("Error allocating project id: {}", e);
            return HttpResponse::InternalServerError().body("Failed to create project");
        }
    };

    let new_project = Project {
        id,
        name: payload.name.clone(),
        description: payload.description.clone(),
        start_date: dates.start,
        end_date: dates.end,
        created_at: Utc::now(),
    };
    let projects_coll = data.mongodb.db.collection::<Project>("projects");
    match projects_coll.insert_one(&new_project).await {
        Ok(_) => {
            info!("Project created: {}", new_project.id);
            HttpResponse::Ok().json(new_project)
        }
        Err(e) => {
            error!("Error creating project: {}", e);
            HttpResponse::InternalServerError().body("Failed to create project")
        }
    }
}

/// GET /projects/{id}
/// A missing project answers 404 so the client can render its empty
/// state rather than an error state.
pub async fn get_project(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> impl Responder {
    if current_user(&req).is_none() {
        return HttpResponse::Unauthorized().body("Unauthorized");
    }
    let project_id = path.into_inner();

    let projects_coll = data.mongodb.db.collection::<Project>("projects");
    let project = match projects_coll.find_one(doc! { "id": project_id }).await {
        Ok(Some(p)) => p,
        Ok(None) => return HttpResponse::NotFound().body("Project not found"),
        Err(e) => {
            error!("Error fetching project {}: {}", project_id, e);
            return HttpResponse::InternalServerError().body("Failed to fetch project");
        }
    };

    let mut tasks = match tasks_by_project(&data, &[project_id]).await {
        Ok(t) => t,
        Err(e) => {
            error!("Error fetching tasks for project {}: {}", project_id, e);
            return HttpResponse::InternalServerError().body("Failed to fetch project");
        }
    };
    let mut teams = match teams_by_project(&data, &[project_id]).await {
        Ok(t) => t,
        Err(e) => {
            error!("Error fetching teams for project {}: {}", project_id, e);
            return HttpResponse::InternalServerError().body("Failed to fetch project");
        }
    };

    HttpResponse::Ok().json(ProjectWithTasks {
        project,
        tasks: tasks.remove(&project_id).unwrap_or_default(),
        teams: teams.remove(&project_id).unwrap_or_default(),
    })
}

/// PUT /projects/{id}
pub async fn update_project(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i64>,
    payload: web::Json<UpdateProjectRequest>,
) -> impl Responder {
    if current_user(&req).is_none() {
        return HttpResponse::Unauthorized().body("Unauthorized");
    }
    let project_id = path.into_inner();

    let dates = match validation::project_form(
        payload.name.as_deref(),
        false,
        payload.description.as_deref(),
        payload.start_date.as_deref(),
        payload.end_date.as_deref(),
    ) {
        Ok(dates) => dates,
        Err(msg) => return HttpResponse::BadRequest().body(msg),
    };

    let mut set_doc = doc! {};
    if let Some(name) = &payload.name {
        set_doc.insert("name", name.clone());
    }
    if let Some(desc) = &payload.description {
        set_doc.insert("description", desc.clone());
    }
    if let Some(start) = dates.start {
        set_doc.insert("start_date", start.to_rfc3339());
    }
    if let Some(end) = dates.end {
        set_doc.insert("end_date", end.to_rfc3339());
    }
    if set_doc.is_empty() {
        return HttpResponse::BadRequest().body("No fields to update");
    }

    let projects_coll = data.mongodb.db.collection::<Project>("projects");
    match projects_coll
        .update_one(doc! { "id": project_id }, doc! { "$set": set_doc })
        .await
    {
        Ok(res) if res.matched_count == 1 => HttpResponse::Ok().body("Project updated"),
        Ok(_) => HttpResponse::NotFound().body("Project not found"),
        Err(e) => {
            error!("Error updating project {}: {}", project_id, e);
            HttpResponse::InternalServerError().body("Failed to update project")
        }
    }
}

/// DELETE /projects/{id}
/// Task deletion cascades at the store boundary before the project
/// record goes away.
pub async fn delete_project(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> impl Responder {
    if current_user(&req).is_none() {
        return HttpResponse::Unauthorized().body("Unauthorized");
    }
    let project_id = path.into_inner();

    let tasks_coll = data.mongodb.db.collection::<Document>("tasks");
    if let Err(e) = tasks_coll
        .delete_many(doc! { "project_id": project_id })
        .await
    {
        error!("Error deleting tasks for project {}: {}", project_id, e);
        return HttpResponse::InternalServerError().body("Failed to delete project");
    }
    let joins_coll = data.mongodb.db.collection::<Document>("project_teams");
    if let Err(e) = joins_coll
        .delete_many(doc! { "project_id": project_id })
        .await
    {
        error!(
            "Error deleting team assignments for project {}: {}",
            project_id, e
        );
        return HttpResponse::InternalServerError().body("Failed to delete project");
    }

    let projects_coll = data.mongodb.db.collection::<Project>("projects");
    match projects_coll.delete_one(doc! { "id": project_id }).await {
        Ok(res) if res.deleted_count == 1 => {
            info!("Project deleted: {}", project_id);
            HttpResponse::Ok().body("Project deleted")
        }
        Ok(_) => HttpResponse::NotFound().body("Project not found"),
        Err(e) => {
            error!("Error deleting project {}: {}", project_id, e);
            HttpResponse::InternalServerError().body("Failed to delete project")
        }
    }
}

/// POST /projects/{id}/teams
pub async fn assign_team(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i64>,
    payload: web::Json<AssignTeamRequest>,
) -> impl Responder {
    if current_user(&req).is_none() {
        return HttpResponse::Unauthorized().body("Unauthorized");
    }
    let project_id = path.into_inner();

    let projects_coll = data.mongodb.db.collection::<Project>("projects");
    match projects_coll.find_one(doc! { "id": project_id }).await {
        Ok(Some(_)) => {}
        Ok(None) => return HttpResponse::NotFound().body("Project not found"),
        Err(e) => {
            error!("Error fetching project {}: {}", project_id, e);
            return HttpResponse::InternalServerError().body("Failed to assign team");
        }
    }

    let teams_coll = data.mongodb.db.collection::<Team>("teams");
    match teams_coll.find_one(doc! { "id": payload.team_id }).await {
        Ok(Some(_)) => {}
        Ok(None) => return HttpResponse::BadRequest().body("Team not found"),
        Err(e) => {
            error!("Error fetching team {}: {}", payload.team_id, e);
            return HttpResponse::InternalServerError().body("Failed to assign team");
        }
    }

    let joins_coll = data.mongodb.db.collection::<ProjectTeam>("project_teams");
    match joins_coll
        .find_one(doc! { "project_id": project_id, "team_id": payload.team_id })
        .await
    {
        Ok(Some(_)) => return HttpResponse::BadRequest().body("Team already assigned to project"),
        Ok(None) => {}
        Err(e) => {
            error!(
                "Error checking assignment of team {} to project {}: {}",
                payload.team_id, project_id, e
            );
            return HttpResponse::InternalServerError().body("Failed to assign team");
        }
    }

    let join = ProjectTeam {
        project_id,
        team_id: payload.team_id,
    };
    match joins_coll.insert_one(&join).await {
        Ok(_) => {
            info!("Team {} assigned to project {}", payload.team_id, project_id);
            HttpResponse::Ok().json(join)
        }
        Err(e) => {
            error!("Error assigning team: {}", e);
            HttpResponse::InternalServerError().body("Failed to assign team")
        }
    }
}
