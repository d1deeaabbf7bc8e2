use crate::{
    entities::{Category, Task},
    error::ApiError,
    filters::{self, TaskQuery, TaskSummary},
    storage::Storage,
    validation,
};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Extension, Path, Query,
    },
    http::StatusCode,
    Json,
};
use serde_json::Value;
use std::sync::Arc;

pub type SharedStorage = Arc<dyn Storage>;

pub async fn get_tasks(
    query: Result<Query<TaskQuery>, QueryRejection>,
    Extension(store): Extension<SharedStorage>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let Query(query) = query?;
    let tasks = query.apply(store.get_tasks().await);
    tracing::debug!(count = tasks.len(), ?query, "listed tasks");
    Ok(Json(tasks))
}

pub async fn task_summary(Extension(store): Extension<SharedStorage>) -> Json<TaskSummary> {
    let tasks = store.get_tasks().await;
    let categories = store.get_categories().await;
    Json(filters::summarize(&tasks, &categories))
}

pub async fn get_task(
    path: Result<Path<i64>, PathRejection>,
    Extension(store): Extension<SharedStorage>,
) -> Result<Json<Task>, ApiError> {
    let Path(id) = path?;
    store
        .get_task(id)
        .await
        .map(Json)
        .ok_or(ApiError::NotFound("task"))
}

pub async fn create_task(
    Extension(store): Extension<SharedStorage>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let Json(body) = payload?;
    let new_task = validation::new_task(&body)?;

    let task = store.create_task(new_task).await;
    tracing::info!(task_id = task.id, "task created");
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update_task(
    path: Result<Path<i64>, PathRejection>,
    Extension(store): Extension<SharedStorage>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Task>, ApiError> {
    let Path(id) = path?;
    let Json(body) = payload?;
    let update = validation::task_update(&body)?;

    match store.update_task(id, update).await {
        Some(task) => {
            tracing::info!(task_id = id, "task updated");
            Ok(Json(task))
        }
        None => Err(ApiError::NotFound("task")),
    }
}

pub async fn delete_task(
    path: Result<Path<i64>, PathRejection>,
    Extension(store): Extension<SharedStorage>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = path?;
    if store.delete_task(id).await {
        tracing::info!(task_id = id, "task deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("task"))
    }
}

pub async fn get_categories(Extension(store): Extension<SharedStorage>) -> Json<Vec<Category>> {
    Json(store.get_categories().await)
}

pub async fn create_category(
    Extension(store): Extension<SharedStorage>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    let Json(body) = payload?;
    let new_category = validation::new_category(&body)?;

    let category = store.create_category(new_category).await;
    tracing::info!(category_id = category.id, name = %category.name, "category created");
    Ok((StatusCode::CREATED, Json(category)))
}
