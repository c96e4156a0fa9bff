use super::{ApiError, AppState};
use crate::db;
use crate::entities::{NewUser, User, UserId, UserUpdate};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;

/// Optional exact-name filter for GET /users
#[derive(Debug, Default, Deserialize)]
pub struct NameFilter {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// GET /users - All users, newest first, or those matching both names
pub async fn all_users(
    State(state): State<AppState>,
    Query(filter): Query<NameFilter>,
) -> Result<Json<Vec<User>>, ApiError> {
    let users = match (filter.first_name, filter.last_name) {
        (Some(first), Some(last)) => {
            state
                .with_db(move |conn| db::find_users_by_name(conn, &first, &last))
                .await?
        }
        (None, None) => state.with_db(db::all_users).await?,
        _ => {
            return Err(ApiError::bad_request(
                "filter by name needs both first_name and last_name",
            ))
        }
    };

    Ok(Json(users))
}

/// GET /users/:id
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Json<User>, ApiError> {
    let user = state
        .with_db(move |conn| db::find_user_by_id(conn, id))
        .await?;
    Ok(Json(user))
}

/// POST /users
pub async fn create_user(
    State(state): State<AppState>,
    Json(new_user): Json<NewUser>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    new_user.validate().map_err(ApiError::bad_request)?;

    let user = state
        .with_db(move |conn| db::insert_user(conn, new_user))
        .await?;
    tracing::info!(user_id = user.id, "user created");

    Ok((StatusCode::CREATED, Json(user)))
}

/// PUT /users/:id - Partial update of first/last name
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    Json(update): Json<UserUpdate>,
) -> Result<Json<User>, ApiError> {
    let blank = |name: &Option<String>| name.as_deref().map_or(false, |n| n.trim().is_empty());
    if blank(&update.first_name) || blank(&update.last_name) {
        return Err(ApiError::bad_request("names may not be blank"));
    }

    let user = state
        .with_db(move |conn| db::update_user(conn, id, &update))
        .await?;
    Ok(Json(user))
}

/// DELETE /users/:id - Accounts of the user are left in place
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Json<&'static str>, ApiError> {
    state.with_db(move |conn| db::delete_user(conn, id)).await?;
    tracing::info!(user_id = id, "user deleted");

    Ok(Json("User Deleted"))
}
