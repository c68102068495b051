// src/auth.rs

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use actix_web::{
    body::{BoxBody, MessageBody},
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http, web, Error, HttpMessage, HttpRequest, HttpResponse, Responder,
};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use futures_util::future::{ok, Ready};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::doc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use log::error;

use crate::app_state::AppState;
use crate::models::user::{PublicUser, User};
use crate::validation;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

/// Authenticated user id attached to the request by the middleware.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub String);

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub fn create_jwt(user_id: &str, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let expiration = Utc::now() + Duration::hours(24);
    let claims = Claims {
        sub: user_id.to_string(),
        exp: expiration.timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
}

pub fn validate_jwt(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

/// Parses `Bearer <token>` and attaches the authenticated user id to
/// the request. A malformed or expired token is rejected here; a
/// missing header passes through so public routes keep working, and
/// protected handlers answer 401 themselves.
#[derive(Debug)]
pub struct Authentication {
    jwt_secret: String,
}

impl Authentication {
    pub fn new(jwt_secret: String) -> Self {
        Authentication { jwt_secret }
    }
}

impl<S, B> Transform<S, ServiceRequest> for Authentication
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Transform = AuthMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthMiddleware {
            service,
            jwt_secret: self.jwt_secret.clone(),
        })
    }
}

pub struct AuthMiddleware<S> {
    service: S,
    jwt_secret: String,
}

impl<S, B> Service<ServiceRequest> for AuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if let Some(auth_header) = req.headers().get(http::header::AUTHORIZATION) {
            if let Ok(auth_str) = auth_header.to_str() {
                if let Some(token) = auth_str.strip_prefix("Bearer ") {
                    match validate_jwt(token.trim(), &self.jwt_secret) {
                        Ok(claims) => {
                            req.extensions_mut().insert(CurrentUser(claims.sub));
                        }
                        Err(e) => {
                            let (req_parts, _payload) = req.into_parts();
                            let resp = HttpResponse::Unauthorized()
                                .body(format!("Invalid token: {}", e))
                                .map_into_boxed_body();
                            let srv_resp = ServiceResponse::new(req_parts, resp);
                            return Box::pin(async move { Ok(srv_resp) });
                        }
                    }
                }
            }
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            Ok(res.map_into_boxed_body())
        })
    }
}

/// POST /auth/signup
pub async fn signup(
    data: web::Data<AppState>,
    payload: web::Json<SignupRequest>,
) -> impl Responder {
    if let Err(msg) = validation::require_text("Name", &payload.name) {
        return HttpResponse::BadRequest().body(msg);
    }
    if let Err(msg) = validation::email_shape(&payload.email) {
        return HttpResponse::BadRequest().body(msg);
    }
    if payload.password.len() < 6 {
        return HttpResponse::BadRequest().body("Password must be at least 6 characters");
    }

    let users_coll = data.mongodb.db.collection::<User>("users");
    match users_coll.find_one(doc! { "email": &payload.email }).await {
        Ok(Some(_)) => return HttpResponse::BadRequest().body("Email already registered"),
        Ok(None) => {}
        Err(e) => {
            error!("Error checking email uniqueness: {}", e);
            return HttpResponse::InternalServerError().body("Failed to sign up");
        }
    }

    let hashed_password = match hash(&payload.password, DEFAULT_COST) {
        Ok(h) => h,
        Err(e) => {
            error!("Error hashing password: {}", e);
            return HttpResponse::InternalServerError().body("Failed to sign up");
        }
    };

    let new_user = User {
        id: Uuid::new_v4().to_string(),
        name: payload.name.clone(),
        email: payload.email.clone(),
        hashed_password,
        image: None,
    };
    match users_coll.insert_one(&new_user).await {
        Ok(_) => HttpResponse::Ok().json(PublicUser::from(new_user)),
        Err(e) => {
            error!("Error creating user: {}", e);
            HttpResponse::InternalServerError().body("Failed to sign up")
        }
    }
}

/// POST /auth/login
/// An unknown email and a wrong password are indistinguishable to the
/// caller.
pub async fn login(data: web::Data<AppState>, payload: web::Json<LoginRequest>) -> impl Responder {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return HttpResponse::BadRequest().body("Email and password are required");
    }

    let users_coll = data.mongodb.db.collection::<User>("users");
    let user = match users_coll.find_one(doc! { "email": &payload.email }).await {
        Ok(Some(user)) => user,
        Ok(None) => return HttpResponse::Unauthorized().body("Invalid email or password"),
        Err(e) => {
            error!("Error fetching user at login: {}", e);
            return HttpResponse::InternalServerError().body("Failed to log in");
        }
    };

    if !verify(&payload.password, &user.hashed_password).unwrap_or(false) {
        return HttpResponse::Unauthorized().body("Invalid email or password");
    }

    match create_jwt(&user.id, &data.config.jwt_secret) {
        Ok(token) => HttpResponse::Ok().json(serde_json::json!({
            "token": token,
            "user": PublicUser::from(user),
        })),
        Err(e) => {
            error!("Error signing token: {}", e);
            HttpResponse::InternalServerError().body("Failed to log in")
        }
    }
}

/// GET /auth/session
/// Returns a fresh session object for the bearer token rather than
/// whatever the token was minted with.
pub async fn session(req: HttpRequest, data: web::Data<AppState>) -> impl Responder {
    let user_id = match req.extensions().get::<CurrentUser>() {
        Some(user) => user.0.clone(),
        None => return HttpResponse::Unauthorized().body("Unauthorized"),
    };

    let users_coll = data.mongodb.db.collection::<User>("users");
    match users_coll.find_one(doc! { "id": &user_id }).await {
        Ok(Some(user)) => HttpResponse::Ok().json(PublicUser::from(user)),
        Ok(None) => HttpResponse::Unauthorized().body("Unauthorized"),
        Err(e) => {
            error!("Error fetching session user: {}", e);
            HttpResponse::InternalServerError().body("Failed to fetch session")
        }
    }
}
