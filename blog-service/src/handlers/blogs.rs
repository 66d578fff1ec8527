use crate::dtos::{BlogResponse, CreateBlogRequest, MessageResponse, UpdateBlogRequest};
use crate::utils::JsonBody;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

pub async fn list_blogs(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let blogs = state
        .blogs()?
        .find_all()
        .await
        .map_err(|e| e.into_app_error("Failed to fetch blogs"))?;

    tracing::info!(count = blogs.len(), "Fetched blogs");
    Ok(Json(
        blogs.into_iter().map(BlogResponse::from).collect::<Vec<_>>(),
    ))
}

pub async fn create_blog(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CreateBlogRequest>,
) -> Result<impl IntoResponse, AppError> {
    let request =
        body.ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Blog data cannot be empty")))?;
    let new_blog = request
        .into_new_blog()
        .map_err(|e| e.into_app_error("Failed to create blog"))?;

    let blog = state
        .blogs()?
        .create(new_blog)
        .await
        .map_err(|e| e.into_app_error("Failed to create blog"))?;

    let response = BlogResponse::from(blog);
    tracing::info!(blog_id = %response.id, "Created blog");
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn get_blog(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let blog = state
        .blogs()?
        .find_by_id(&id)
        .await
        .map_err(|e| e.into_app_error("Failed to fetch blog"))?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Blog not found")))?;

    Ok(Json(BlogResponse::from(blog)))
}

pub async fn update_blog(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<UpdateBlogRequest>,
) -> Result<impl IntoResponse, AppError> {
    let request = body
        .filter(|request| !request.is_empty())
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Update data cannot be empty")))?;
    let changes = request
        .into_changes()
        .map_err(|e| e.into_app_error("Failed to update blog"))?;

    let blog = state
        .blogs()?
        .update(&id, &changes)
        .await
        .map_err(|e| e.into_app_error("Failed to update blog"))?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Blog not found")))?;

    tracing::info!(blog_id = %id, "Updated blog");
    Ok(Json(BlogResponse::from(blog)))
}

pub async fn delete_blog(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = state
        .blogs()?
        .delete(&id)
        .await
        .map_err(|e| e.into_app_error("Failed to delete blog"))?;

    if deleted == 0 {
        return Err(AppError::NotFound(anyhow::anyhow!("Blog not found")));
    }

    tracing::info!(blog_id = %id, "Deleted blog");
    Ok(Json(MessageResponse {
        message: "Blog deleted successfully".to_string(),
    }))
}
