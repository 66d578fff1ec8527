use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;
use service_core::error::AppError;

/// JSON request body that may be absent.
///
/// An empty body or a literal `null` yields `JsonBody(None)` so handlers can
/// answer with their own "cannot be empty" message. Anything that is not
/// valid JSON for `T` is rejected with 400 `Invalid JSON body`.
pub struct JsonBody<T>(pub Option<T>);

#[axum::async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|e| {
            AppError::BadRequest(anyhow::anyhow!(e.body_text()).context("Invalid JSON body"))
        })?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(JsonBody(None));
        }

        let value = serde_json::from_slice::<Option<T>>(&bytes).map_err(|e| {
            tracing::warn!(error = %e, "Rejected malformed JSON body");
            AppError::BadRequest(anyhow::Error::new(e).context("Invalid JSON body"))
        })?;

        Ok(JsonBody(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Payload {
        title: String,
    }

    async fn extract(body: &'static str) -> Result<Option<Payload>, AppError> {
        let req = Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        JsonBody::<Payload>::from_request(req, &()).await.map(|JsonBody(v)| v)
    }

    #[tokio::test]
    async fn empty_and_null_bodies_are_absent() {
        assert!(extract("").await.unwrap().is_none());
        assert!(extract("  \n").await.unwrap().is_none());
        assert!(extract("null").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn valid_body_is_parsed() {
        let payload = extract(r#"{"title":"A"}"#).await.unwrap().unwrap();
        assert_eq!(payload.title, "A");
    }

    #[tokio::test]
    async fn malformed_body_is_a_bad_request() {
        match extract("{not json").await {
            Err(AppError::BadRequest(err)) => assert_eq!(err.to_string(), "Invalid JSON body"),
            Err(other) => panic!("unexpected error: {other:?}"),
            Ok(_) => panic!("malformed body was accepted"),
        }
    }
}
