// src/main.rs

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{http, middleware::Logger, web, App, HttpServer};
use env_logger::Env;
use log::info;

use managepro_be::app_state::AppState;
use managepro_be::auth::{login, session, signup, Authentication};
use managepro_be::project::{
    assign_team, create_project, delete_project, get_project, list_projects, update_project,
};
use managepro_be::task::{
    create_task, delete_task, get_project_board, list_tasks_by_project, update_task,
    update_task_status,
};
use managepro_be::user_management::{
    change_password, get_profile, list_users, update_profile, upload_picture,
};
use managepro_be::{config, db};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = config::Config::from_env();
    let mongodb = Arc::new(db::MongoDB::init(&config.mongo_uri, &config.database_name).await);

    info!("Server running at http://0.0.0.0:8080");
    info!("Allowed CORS origin: {}", config.frontend_origin);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&config.frontend_origin)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                http::header::CONTENT_TYPE,
                http::header::ACCEPT,
                http::header::AUTHORIZATION,
            ])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .wrap(Authentication::new(config.jwt_secret.clone()))
            .app_data(web::Data::new(AppState {
                mongodb: mongodb.clone(),
                config: config.clone(),
            }))
            .service(
                web::scope("/auth")
                    .route("/signup", web::post().to(signup))
                    .route("/login", web::post().to(login))
                    .route("/session", web::get().to(session)),
            )
            .service(
                web::scope("/projects")
                    .route("", web::get().to(list_projects))
                    .route("", web::post().to(create_project))
                    .route("/{project_id}", web::get().to(get_project))
                    .route("/{project_id}", web::put().to(update_project))
                    .route("/{project_id}", web::delete().to(delete_project))
                    .route("/{project_id}/teams", web::post().to(assign_team))
                    .route("/{project_id}/board", web::get().to(get_project_board))
                    .route("/{project_id}/tasks", web::get().to(list_tasks_by_project))
                    .route("/{project_id}/tasks", web::post().to(create_task)),
            )
            .service(
                web::scope("/tasks")
                    .route("/{task_id}", web::put().to(update_task))
                    .route("/{task_id}/status", web::put().to(update_task_status))
                    .route("/{task_id}", web::delete().to(delete_task)),
            )
            .service(
                web::scope("/users")
                    .route("", web::get().to(list_users))
                    .route("/me", web::get().to(get_profile))
                    .route("/me", web::put().to(update_profile))
                    .route("/me/password", web::post().to(change_password))
                    .route("/me/picture", web::post().to(upload_picture)),
            )
    })
    .bind("0.0.0.0:8080")?
    .run()
    .await
}
