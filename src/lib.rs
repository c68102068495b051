pub mod app_state;
pub mod auth;
pub mod board;
pub mod config;
pub mod coordinator;
pub mod db;
pub mod filters;
pub mod models;
pub mod project;
pub mod task;
pub mod user_management;
pub mod validation;
