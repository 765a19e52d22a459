use crate::{
    auth::AuthenticatedUserId,
    error::AppError,
    models::{CreateTaskRequest, TaskChanges},
    AppState,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde_json::json;

/// Lists the authenticated user's to-dos as `{ "todos": [...] }`, oldest first.
#[get("")]
pub async fn list_todos(
    state: web::Data<AppState>,
    user_id: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let todos = state.tasks.list(user_id.0).await?;
    Ok(HttpResponse::Ok().json(json!({ "todos": todos })))
}

/// Creates a to-do for the authenticated user.
///
/// ## Responses:
/// - `201 Created`: the new task, with `completed: false`.
/// - `400 Bad Request`: the title is missing or blank after trimming.
#[post("")]
pub async fn create_todo(
    state: web::Data<AppState>,
    user_id: AuthenticatedUserId,
    body: web::Json<CreateTaskRequest>,
) -> Result<impl Responder, AppError> {
    let title = body.title.as_deref().unwrap_or_default();
    let task = state.tasks.create(user_id.0, title).await?;
    Ok(HttpResponse::Created().json(task))
}

/// Updates `title` and/or `completed` of an owned to-do.
///
/// ## Responses:
/// - `200 OK`: the updated task.
/// - `400 Bad Request`: a supplied title is blank after trimming.
/// - `404 Not Found`: no such task, or it belongs to someone else.
#[put("/{id}")]
pub async fn update_todo(
    state: web::Data<AppState>,
    user_id: AuthenticatedUserId,
    task_id: web::Path<i32>,
    changes: web::Json<TaskChanges>,
) -> Result<impl Responder, AppError> {
    let task = state
        .tasks
        .update(user_id.0, task_id.into_inner(), &changes)
        .await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Deletes an owned to-do.
#[delete("/{id}")]
pub async fn delete_todo(
    state: web::Data<AppState>,
    user_id: AuthenticatedUserId,
    task_id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    state.tasks.delete(user_id.0, task_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "msg": "To-do deleted successfully"
    })))
}
