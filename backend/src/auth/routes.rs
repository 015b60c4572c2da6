use actix_web::{HttpResponse, Result, web};
use log::error;
use shared::{AuthResponse, AuthUser, LoginRequest, SignupRequest};

use crate::db::users::UserRepository;

use super::jwt::JwtService;
use super::middleware::AuthenticatedUser;
use super::password;

#[derive(serde::Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_json(message: &str) -> ErrorResponse {
    ErrorResponse {
        error: message.to_string(),
    }
}

pub async fn signup(
    body: web::Json<SignupRequest>,
    users: web::Data<UserRepository>,
) -> Result<HttpResponse> {
    let name = body.name.trim();
    let username = body.username.trim().to_lowercase();

    if name.is_empty() || username.is_empty() || body.password.is_empty() {
        return Ok(HttpResponse::BadRequest().json(error_json("Please fill out all fields.")));
    }
    if body.password != body.confirm_password {
        return Ok(HttpResponse::BadRequest().json(error_json("Passwords do not match.")));
    }

    match users.find_by_username(&username).await {
        Ok(Some(_)) => {
            return Ok(HttpResponse::Conflict().json(error_json("Username already exists.")));
        }
        Ok(None) => {}
        Err(e) => {
            error!("Failed to check username {}: {:?}", username, e);
            return Ok(HttpResponse::InternalServerError().json(error_json("Signup failed.")));
        }
    }

    let password_hash = password::hash_password(&body.password);
    match users.create(name, &username, &password_hash).await {
        Ok(id) => {
            log::info!("Created user {} with id {}", username, id);
            Ok(HttpResponse::Created().json(AuthUser {
                id,
                name: name.to_string(),
                username,
            }))
        }
        Err(e) => {
            // A concurrent signup can still trip the UNIQUE constraint.
            error!("Failed to create user {}: {:?}", username, e);
            Ok(HttpResponse::Conflict().json(error_json("Username already exists.")))
        }
    }
}

pub async fn login(
    body: web::Json<LoginRequest>,
    users: web::Data<UserRepository>,
    jwt_service: web::Data<JwtService>,
) -> Result<HttpResponse> {
    let username = body.username.trim().to_lowercase();

    let user = match users.find_by_username(&username).await {
        Ok(user) => user,
        Err(e) => {
            error!("Failed to look up user {}: {:?}", username, e);
            return Ok(HttpResponse::InternalServerError().json(error_json("Login failed.")));
        }
    };

    let Some(user) = user else {
        return Ok(
            HttpResponse::Unauthorized().json(error_json("Invalid username or password."))
        );
    };
    if !password::verify_password(&body.password, &user.password_hash) {
        return Ok(
            HttpResponse::Unauthorized().json(error_json("Invalid username or password."))
        );
    }

    let auth_user = AuthUser::from(user);
    match jwt_service.generate_token(&auth_user) {
        Ok(token) => Ok(HttpResponse::Ok().json(AuthResponse {
            token,
            user: auth_user,
        })),
        Err(e) => {
            error!("Failed to generate token for {}: {:?}", username, e);
            Ok(HttpResponse::InternalServerError().json(error_json("Login failed.")))
        }
    }
}

pub async fn me(
    user: AuthenticatedUser,
    users: web::Data<UserRepository>,
) -> Result<HttpResponse> {
    match users.find_by_id(user.0).await {
        Ok(Some(record)) => Ok(HttpResponse::Ok().json(AuthUser::from(record))),
        Ok(None) => Ok(HttpResponse::NotFound().json(error_json("User not found."))),
        Err(e) => {
            error!("Failed to fetch user {}: {:?}", user.0, e);
            Ok(HttpResponse::InternalServerError().json(error_json("Failed to fetch user.")))
        }
    }
}
