use crate::endpoint::{EntityEndpoint, Payload, Resource};
use crate::error::ApiError;
use axum::body::Bytes;
use axum::extract::rejection::PathRejection;
use axum::extract::{Json, Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

#[derive(Debug)]
pub struct ApiSuccess<T: Serialize> {
    status: StatusCode,
    location: Option<String>,
    data: Option<T>,
}

impl<T: Serialize> ApiSuccess<T> {
    pub const fn ok(data: T) -> Self {
        Self {
            status: StatusCode::OK,
            location: None,
            data: Some(data),
        }
    }

    pub const fn created(location: String, data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            location: Some(location),
            data: Some(data),
        }
    }
}

impl ApiSuccess<()> {
    pub const fn no_content() -> Self {
        Self {
            status: StatusCode::NO_CONTENT,
            location: None,
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        let mut response = match self.data {
            Some(data) => (self.status, Json(data)).into_response(),
            None => self.status.into_response(),
        };
        if let Some(location) = self.location {
            if let Ok(value) = location.parse() {
                response.headers_mut().insert(header::LOCATION, value);
            }
        }
        response
    }
}

pub async fn list<R: Resource>(
    State(endpoint): State<EntityEndpoint<R>>,
) -> Result<ApiSuccess<Vec<R::View>>, ApiError> {
    endpoint.list().await.map(ApiSuccess::ok)
}

pub async fn get<R: Resource>(
    State(endpoint): State<EntityEndpoint<R>>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<ApiSuccess<R::View>, ApiError> {
    let id = path_id(&endpoint, "get", path)?;
    endpoint.get(id).await.map(ApiSuccess::ok)
}

pub async fn create<R: Resource>(
    State(endpoint): State<EntityEndpoint<R>>,
    body: Bytes,
) -> Result<ApiSuccess<R::View>, ApiError> {
    let created = endpoint.create(Payload::from_json(&body)).await?;
    let location = format!("/{}/{}", R::NAME, created.id);
    Ok(ApiSuccess::created(location, created.view))
}

pub async fn update<R: Resource>(
    State(endpoint): State<EntityEndpoint<R>>,
    path: Result<Path<i32>, PathRejection>,
    body: Bytes,
) -> Result<ApiSuccess<()>, ApiError> {
    let id = path_id(&endpoint, "update", path)?;
    endpoint.update(id, Payload::from_json(&body)).await?;
    Ok(ApiSuccess::no_content())
}

pub async fn delete<R: Resource>(
    State(endpoint): State<EntityEndpoint<R>>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<ApiSuccess<()>, ApiError> {
    let id = path_id(&endpoint, "delete", path)?;
    endpoint.delete(id).await?;
    Ok(ApiSuccess::no_content())
}

/// An id segment that is not an `i32` is a validation failure of that operation.
fn path_id<R: Resource>(
    endpoint: &EntityEndpoint<R>,
    operation: &str,
    path: Result<Path<i32>, PathRejection>,
) -> Result<i32, ApiError> {
    match path {
        Ok(Path(id)) => Ok(id),
        Err(rejection) => endpoint.reject(
            operation,
            ApiError::invalid("id", format!("id must be an integer: {}", rejection.body_text())),
        ),
    }
}
