use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::response::{ApiError, AppJson, JSend};
use crate::auth::Registration;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub college: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user_id: String,
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<JSend<MessageResponse>>), ApiError> {
    state
        .auth
        .register(Registration {
            name: req.name,
            college: req.college,
            phone: req.phone,
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok(JSend::created(MessageResponse {
        message: "User registered successfully".to_string(),
    }))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<Json<JSend<LoginResponse>>, ApiError> {
    let outcome = state.auth.login(&req.email, &req.password).await?;

    Ok(JSend::success(LoginResponse {
        message: "Login successful".to_string(),
        token: outcome.token,
        user_id: outcome.user_id,
    }))
}
