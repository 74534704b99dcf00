//! HTTP endpoints under `/v1`. Handlers only parse input and shape output;
//! the work happens in `checkin` and `admin`.
use crate::admin::{self, NewGroup, NewUser, UserUpdate};
use crate::checkin::{self, CheckIn};
use crate::errors::YokedError;
use crate::resolver::ProvisioningSet;
use crate::settings::Settings;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use miette::IntoDiagnostic;
use sea_orm::DatabaseConnection;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub db: DatabaseConnection,
}

#[derive(Serialize)]
struct CheckInResponse {
    status: &'static str,
    users: ProvisioningSet,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/status", post(status))
        .route("/v1/instances", get(list_instances))
        .route("/v1/instance/{id}", get(get_instance))
        .route("/v1/groups", get(list_groups))
        .route("/v1/group", post(create_group))
        .route("/v1/group/{id}", get(get_group).delete(delete_group))
        .route(
            "/v1/group/{id}/users/{user_id}",
            put(add_group_user).delete(remove_group_user),
        )
        .route(
            "/v1/group/{id}/instances/{instance_id}",
            put(add_group_instance).delete(remove_group_instance),
        )
        .route("/v1/users", get(list_users))
        .route("/v1/user", post(create_user))
        .route(
            "/v1/user/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/v1/roles", get(list_roles))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(settings: Settings, db: DatabaseConnection) -> miette::Result<()> {
    let state = AppState {
        settings: Arc::new(settings),
        db,
    };

    let addr: SocketAddr = state
        .settings
        .listen_addr()
        .parse()
        .map_err(|e| miette::miette!("bad listen addr: {e}"))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .into_diagnostic()?;
    tracing::info!(%addr, "Check-in API listening");

    axum::serve(listener, router(state))
        .await
        .into_diagnostic()?;
    Ok(())
}

/// JSON body parsed regardless of `Content-Type`. Parse failures are
/// `invalid_request`.
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, YokedError> {
    serde_json::from_slice(body)
        .map_err(|e| YokedError::InvalidRequest(format!("malformed request body: {e}")))
}

/// POST /v1/status
async fn status(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, YokedError> {
    let req = CheckIn::from_payload(parse_body(&body)?)?;
    let outcome = checkin::check_in(&state.db, req).await?;

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/v1/instance/{}", outcome.instance_id))],
        Json(CheckInResponse {
            status: "OK",
            users: outcome.users,
        }),
    ))
}

async fn list_instances(State(state): State<AppState>) -> Result<Json<Value>, YokedError> {
    let instances = admin::list_instances(&state.db).await?;
    Ok(Json(json!({ "instances": instances })))
}

async fn get_instance(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Value>, YokedError> {
    let instance = admin::get_instance(&state.db, id).await?;
    Ok(Json(json!({ "instances": instance })))
}

// Groups

async fn list_groups(State(state): State<AppState>) -> Result<Json<Value>, YokedError> {
    let groups = admin::list_groups(&state.db).await?;
    Ok(Json(json!({ "groups": groups })))
}

async fn create_group(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, YokedError> {
    let req: NewGroup = parse_body(&body)?;
    let group = admin::create_group(&state.db, req).await?;
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/v1/group/{}", group.id))],
        Json(json!({ "groups": group })),
    ))
}

async fn get_group(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Value>, YokedError> {
    let group = admin::get_group(&state.db, id).await?;
    Ok(Json(json!({ "groups": group })))
}

async fn delete_group(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Value>, YokedError> {
    admin::delete_group(&state.db, id).await?;
    Ok(Json(json!({ "status": "OK" })))
}

async fn add_group_user(
    State(state): State<AppState>,
    Path((id, user_id)): Path<(i32, i32)>,
) -> Result<Json<Value>, YokedError> {
    let group = admin::add_user_to_group(&state.db, id, user_id).await?;
    Ok(Json(json!({ "groups": group })))
}

async fn remove_group_user(
    State(state): State<AppState>,
    Path((id, user_id)): Path<(i32, i32)>,
) -> Result<Json<Value>, YokedError> {
    let group = admin::remove_user_from_group(&state.db, id, user_id).await?;
    Ok(Json(json!({ "groups": group })))
}

async fn add_group_instance(
    State(state): State<AppState>,
    Path((id, instance_id)): Path<(i32, i32)>,
) -> Result<Json<Value>, YokedError> {
    let instance = admin::add_instance_to_group(&state.db, id, instance_id).await?;
    Ok(Json(json!({ "instances": instance })))
}

async fn remove_group_instance(
    State(state): State<AppState>,
    Path((id, instance_id)): Path<(i32, i32)>,
) -> Result<Json<Value>, YokedError> {
    let instance = admin::remove_instance_from_group(&state.db, id, instance_id).await?;
    Ok(Json(json!({ "instances": instance })))
}

// Users

async fn list_users(State(state): State<AppState>) -> Result<Json<Value>, YokedError> {
    let users = admin::list_users(&state.db).await?;
    Ok(Json(json!({ "users": users })))
}

async fn create_user(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, YokedError> {
    let req: NewUser = parse_body(&body)?;
    let user = admin::create_user(&state.db, req).await?;
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/v1/user/{}", user.id))],
        Json(json!({ "users": user })),
    ))
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Value>, YokedError> {
    let user = admin::get_user(&state.db, id).await?;
    Ok(Json(json!({ "users": user })))
}

async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    body: Bytes,
) -> Result<Json<Value>, YokedError> {
    let req: UserUpdate = parse_body(&body)?;
    let user = admin::update_user(&state.db, id, req).await?;
    Ok(Json(json!({ "users": user })))
}

async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Value>, YokedError> {
    admin::delete_user(&state.db, id).await?;
    Ok(Json(json!({ "status": "OK" })))
}

async fn list_roles(State(state): State<AppState>) -> Result<Json<Value>, YokedError> {
    let roles = admin::list_roles(&state.db).await?;
    Ok(Json(json!({ "roles": roles })))
}
