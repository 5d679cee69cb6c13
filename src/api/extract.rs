//! JSON body extraction with API-envelope rejections.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    response::{IntoResponse, Response},
};

use super::error::{ApiError, ErrorCode};

/// `axum::Json` wrapper whose rejection is an [`ApiError`], so a malformed
/// or incomplete request body surfaces as a 400 `{"err": ...}` like every
/// other client error instead of axum's plain-text 422.
#[derive(Debug, Clone)]
pub struct Json<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Json<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Json(value)),
            Err(rejection) => Err(ApiError::new(
                ErrorCode::ValidationError,
                rejection.body_text(),
            )),
        }
    }
}

impl<T> IntoResponse for Json<T>
where
    axum::Json<T>: IntoResponse,
{
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::ErrorResponse;
    use crate::db::CreateWorkoutRequest;
    use axum::body::Body;
    use axum::http::{header, StatusCode};

    fn json_request(body: &str) -> Request {
        axum::http::Request::builder()
            .method("POST")
            .uri("/workouts")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn valid_body_deserializes() {
        let req = json_request(r#"{"title": "Leg day", "date": "2024-03-01T18:00:00Z"}"#);
        let Json(parsed) = Json::<CreateWorkoutRequest>::from_request(req, &())
            .await
            .unwrap();
        assert_eq!(parsed.title, "Leg day");
    }

    #[tokio::test]
    async fn missing_required_field_is_a_400_with_the_error_envelope() {
        let req = json_request(r#"{"durationInMinutes": 30}"#);
        let err = Json::<CreateWorkoutRequest>::from_request(req, &())
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(body.err.contains("title"));
    }

    #[tokio::test]
    async fn malformed_json_is_a_400() {
        let req = json_request("{not json");
        let err = Json::<CreateWorkoutRequest>::from_request(req, &())
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_content_type_is_a_400() {
        let req = axum::http::Request::builder()
            .method("POST")
            .uri("/workouts")
            .body(Body::from(r#"{"title": "x", "date": "2024-03-01T18:00:00Z"}"#))
            .unwrap();
        let err = Json::<CreateWorkoutRequest>::from_request(req, &())
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
