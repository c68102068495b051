// src/user_management.rs

use actix_web::{web, HttpMessage, HttpRequest, HttpResponse, Responder};
use bcrypt::{hash, verify, DEFAULT_COST};
use futures_util::StreamExt;
use mongodb::bson::doc;
use serde::Deserialize;
use log::error;

use crate::app_state::AppState;
use crate::auth::CurrentUser;
use crate::models::user::{PublicUser, User, UserSummary};
use crate::validation;

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct UploadPictureRequest {
    pub image_url: String,
}

fn current_user(req: &HttpRequest) -> Option<String> {
    req.extensions().get::<CurrentUser>().map(|u| u.0.clone())
}

/// GET /users
/// Id/name pairs for the task assignment picker.
pub async fn list_users(req: HttpRequest, data: web::Data<AppState>) -> impl Responder {
    if current_user(&req).is_none() {
        return HttpResponse::Unauthorized().body("Unauthorized");
    }

    let users_coll = data.mongodb.db.collection::<User>("users");
    let mut cursor = match users_coll.find(doc! {}).await {
        Ok(c) => c,
        Err(e) => {
            error!("Error fetching users: {}", e);
            return HttpResponse::InternalServerError().body("Failed to fetch users");
        }
    };

    let mut users: Vec<UserSummary> = Vec::new();
    while let Some(res) = cursor.next().await {
        match res {
            Ok(user) => users.push(UserSummary {
                id: user.id,
                name: user.name,
            }),
            Err(e) => {
                error!("Cursor error reading users: {}", e);
                return HttpResponse::InternalServerError().body("Failed to fetch users");
            }
        }
    }
    HttpResponse::Ok().json(users)
}

/// GET /users/me
pub async fn get_profile(req: HttpRequest, data: web::Data<AppState>) -> impl Responder {
    let user_id = match current_user(&req) {
        Some(id) => id,
        None => return HttpResponse::Unauthorized().body("Unauthorized"),
    };

    let users_coll = data.mongodb.db.collection::<User>("users");
    match users_coll.find_one(doc! { "id": &user_id }).await {
        Ok(Some(user)) => HttpResponse::Ok().json(PublicUser::from(user)),
        Ok(None) => HttpResponse::NotFound().body("User not found"),
        Err(e) => {
            error!("Error fetching profile: {}", e);
            HttpResponse::InternalServerError().body("Failed to fetch profile")
        }
    }
}

/// PUT /users/me
/// The username uniqueness check excludes the caller so re-saving an
/// unchanged name is not an error.
pub async fn update_profile(
    req: HttpRequest,
    data: web::Data<AppState>,
    payload: web::Json<UpdateProfileRequest>,
) -> impl Responder {
    let user_id = match current_user(&req) {
        Some(id) => id,
        None => return HttpResponse::Unauthorized().body("Unauthorized"),
    };

    if let Some(name) = &payload.name {
        if let Err(msg) = validation::require_text("Name", name) {
            return HttpResponse::BadRequest().body(msg);
        }
    }
    if let Some(email) = &payload.email {
        if let Err(msg) = validation::email_shape(email) {
            return HttpResponse::BadRequest().body(msg);
        }
    }
    if payload.name.is_none() && payload.email.is_none() {
        return HttpResponse::BadRequest().body("No fields to update");
    }

    let users_coll = data.mongodb.db.collection::<User>("users");

    if let Some(name) = &payload.name {
        let taken = users_coll
            .find_one(doc! { "name": name, "id": { "$ne": &user_id } })
            .await;
        match taken {
            Ok(Some(_)) => {
                return HttpResponse::BadRequest()
                    .body("Username is already taken. Please choose another.")
            }
            Ok(None) => {}
            Err(e) => {
                error!("Error checking username: {}", e);
                return HttpResponse::InternalServerError().body("Failed to update profile");
            }
        }
    }

    let mut set_doc = doc! {};
    if let Some(name) = &payload.name {
        set_doc.insert("name", name.clone());
    }
    if let Some(email) = &payload.email {
        set_doc.insert("email", email.clone());
    }

    match users_coll
        .update_one(doc! { "id": &user_id }, doc! { "$set": set_doc })
        .await
    {
        Ok(res) if res.matched_count == 1 => {
            match users_coll.find_one(doc! { "id": &user_id }).await {
                Ok(Some(user)) => HttpResponse::Ok().json(serde_json::json!({
                    "message": "Profile updated successfully",
                    "user": PublicUser::from(user),
                })),
                Ok(None) => HttpResponse::NotFound().body("User not found"),
                Err(e) => {
                    error!("Error re-fetching profile: {}", e);
                    HttpResponse::InternalServerError().body("Failed to update profile")
                }
            }
        }
        Ok(_) => HttpResponse::NotFound().body("User not found"),
        Err(e) => {
            error!("Error updating profile: {}", e);
            HttpResponse::InternalServerError().body("Failed to update profile")
        }
    }
}

/// POST /users/me/password
pub async fn change_password(
    req: HttpRequest,
    data: web::Data<AppState>,
    payload: web::Json<ChangePasswordRequest>,
) -> impl Responder {
    let user_id = match current_user(&req) {
        Some(id) => id,
        None => return HttpResponse::Unauthorized().body("Unauthorized"),
    };

    if payload.new_password.len() < 6 {
        return HttpResponse::BadRequest().body("Password must be at least 6 characters");
    }

    let users_coll = data.mongodb.db.collection::<User>("users");
    let user = match users_coll.find_one(doc! { "id": &user_id }).await {
        Ok(Some(user)) => user,
        Ok(None) => return HttpResponse::NotFound().body("User not found"),
        Err(e) => {
            error!("Error fetching user for password change: {}", e);
            return HttpResponse::InternalServerError().body("Failed to change password");
        }
    };

    if !verify(&payload.old_password, &user.hashed_password).unwrap_or(false) {
        return HttpResponse::BadRequest().body("Incorrect old password");
    }

    let hashed = match hash(&payload.new_password, DEFAULT_COST) {
        Ok(h) => h,
        Err(e) => {
            error!("Error hashing new password: {}", e);
            return HttpResponse::InternalServerError().body("Failed to change password");
        }
    };

    match users_coll
        .update_one(
            doc! { "id": &user_id },
            doc! { "$set": { "hashed_password": hashed } },
        )
        .await
    {
        Ok(_) => HttpResponse::Ok()
            .json(serde_json::json!({ "message": "Password changed successfully" })),
        Err(e) => {
            error!("Error updating password: {}", e);
            HttpResponse::InternalServerError().body("Failed to change password")
        }
    }
}

/// POST /users/me/picture
pub async fn upload_picture(
    req: HttpRequest,
    data: web::Data<AppState>,
    payload: web::Json<UploadPictureRequest>,
) -> impl Responder {
    let user_id = match current_user(&req) {
        Some(id) => id,
        None => return HttpResponse::Unauthorized().body("Unauthorized"),
    };

    if !payload.image_url.starts_with("http://") && !payload.image_url.starts_with("https://") {
        return HttpResponse::BadRequest().body("Invalid image URL");
    }

    let users_coll = data.mongodb.db.collection::<User>("users");
    match users_coll
        .update_one(
            doc! { "id": &user_id },
            doc! { "$set": { "image": &payload.image_url } },
        )
        .await
    {
        Ok(res) if res.matched_count == 1 => HttpResponse::Ok()
            .json(serde_json::json!({ "message": "Profile picture updated successfully" })),
        Ok(_) => HttpResponse::NotFound().body("User not found"),
        Err(e) => {
            error!("Error updating picture: {}", e);
            HttpResponse::InternalServerError().body("Failed to update profile picture")
        }
    }
}
