//! HTTP face of the assistant bridge.
//!
//! `POST /analyze-sales` (also `POST /`) takes `{ question, salesData, loadedSheets }`
//! and answers `{ response }`, or `{ error }` with a non-2xx status.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use log::{error, info};
use tower_http::cors::{Any, CorsLayer};

use crate::error::{Result, SalesPulseError};
use crate::llm::{CompletionService, SalesAssistant};
use crate::schema::{AnalyzeRequest, AnalyzeResponse, ErrorResponse};

pub struct ApiError(SalesPulseError);

impl From<SalesPulseError> for ApiError {
    fn from(err: SalesPulseError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            SalesPulseError::InvalidRequest(_)
            | SalesPulseError::NoDataLoaded
            | SalesPulseError::SerializationError(_) => StatusCode::BAD_REQUEST,
            SalesPulseError::UpstreamUnavailable(_) | SalesPulseError::EmptyResponse => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorResponse {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
        ])
}

pub fn router<C>(assistant: Arc<SalesAssistant<C>>) -> Router
where
    C: CompletionService + 'static,
{
    Router::new()
        .route("/", post(analyze_sales::<C>).options(preflight))
        .route("/analyze-sales", post(analyze_sales::<C>).options(preflight))
        .layer(cors())
        .with_state(assistant)
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn analyze_sales<C: CompletionService + 'static>(
    State(assistant): State<Arc<SalesAssistant<C>>>,
    body: Bytes,
) -> std::result::Result<Json<AnalyzeResponse>, ApiError> {
    let outcome = answer(assistant.as_ref(), &body[..]).await;
    if let Err(e) = &outcome {
        error!("Error in analyze-sales: {}", e);
    }
    Ok(Json(outcome?))
}

async fn answer<C: CompletionService>(
    assistant: &SalesAssistant<C>,
    body: &[u8],
) -> Result<AnalyzeResponse> {
    let request: AnalyzeRequest = serde_json::from_slice(body)?;

    if request.question.trim().is_empty() || request.sales_data.is_empty() {
        return Err(SalesPulseError::InvalidRequest(
            "question and salesData are required".to_string(),
        ));
    }

    let response = assistant
        .ask(
            &request.question,
            &request.sales_data,
            &request.loaded_sheets,
        )
        .await?;
    Ok(AnalyzeResponse { response })
}

pub async fn serve<C>(bind_addr: &str, assistant: SalesAssistant<C>) -> Result<()>
where
    C: CompletionService + 'static,
{
    let app = router(Arc::new(assistant));
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("analyze-sales listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::CompletionPrompt;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct Echo;

    #[async_trait]
    impl CompletionService for Echo {
        async fn complete(&self, prompt: &CompletionPrompt) -> Result<String> {
            let question = prompt.user.rsplit("**PERGUNTA:** ").next().unwrap_or_default();
            Ok(format!("eco: {}", question))
        }
    }

    struct Down;

    #[async_trait]
    impl CompletionService for Down {
        async fn complete(&self, _prompt: &CompletionPrompt) -> Result<String> {
            Err(SalesPulseError::UpstreamUnavailable("429 Too Many Requests".to_string()))
        }
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn valid_body() -> Value {
        json!({
            "question": "Qual mês vendeu mais?",
            "salesData": [{ "produto": "Café", "valor": 10, "month_name": "Janeiro", "month_index": 1 }],
            "loadedSheets": ["Janeiro"]
        })
    }

    #[tokio::test]
    async fn test_answers_question() {
        let app = router(Arc::new(SalesAssistant::new(Echo)));
        let response = app
            .oneshot(post_json("/analyze-sales", valid_body()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({ "response": "eco: Qual mês vendeu mais?" })
        );
    }

    #[tokio::test]
    async fn test_rejects_missing_data() {
        let app = router(Arc::new(SalesAssistant::new(Echo)));
        let response = app
            .oneshot(post_json("/", json!({ "question": "Total?", "salesData": [] })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("salesData"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_json_error() {
        let app = router(Arc::new(SalesAssistant::new(Echo)));
        let request = Request::builder()
            .method(Method::POST)
            .uri("/analyze-sales")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_upstream_failure_is_bad_gateway() {
        let app = router(Arc::new(SalesAssistant::new(Down)));
        let response = app
            .oneshot(post_json("/analyze-sales", valid_body()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("429"));
    }

    #[tokio::test]
    async fn test_preflight_is_permissive() {
        let app = router(Arc::new(SalesAssistant::new(Echo)));
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/analyze-sales")
            .header(header::ORIGIN, "https://dashboard.example")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type, apikey")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert!(response.status().is_success());
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
        let allowed = response.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS]
            .to_str()
            .unwrap()
            .to_ascii_lowercase();
        assert!(allowed.contains("apikey"));
        assert!(allowed.contains("x-client-info"));
    }

    #[tokio::test]
    async fn test_bare_options_succeeds() {
        let app = router(Arc::new(SalesAssistant::new(Echo)));
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
