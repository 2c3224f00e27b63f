//! HTTP Gateway (C7): the only component in this repository that depends on
//! axum/tower. Translates multipart HTTP requests into validated
//! [`judgehouse_core::service::Request`] values and pipeline results back
//! into the JSON contract: `{ statusCode, status, output?, error? }`.
//!
//! Owns no judging logic. Every handler's job is parse -> validate -> hand
//! to [`Service::judge`] -> map the result to a status code and body.

use axum::Router;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response as AxumResponse};
use axum::routing::{get, post};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use judgehouse_core::service::{GatewayError, Service};
use judgehouse_core::validator::{self, RawRequest};

/// Build the gateway's router bound to `service`. `GET /health` is excluded
/// from admission accounting — it never touches [`Service::judge`].
pub fn router(service: Service) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/submit", post(submit_generic))
        .route("/{language}", post(submit_language))
        .with_state(service)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn health() -> &'static str {
    "OK"
}

/// `{ statusCode, status, output?, error? }`. `statusCode`/`status` carry the
/// verdict's numeric code and name on a completed judgment; on an error path
/// (400/429/500) they instead echo the HTTP status code and its reason
/// phrase, and `error` carries the message. A completed judgment never sets
/// `error`; an error response never sets `output`.
#[derive(Debug, Serialize)]
struct JudgmentBody {
    #[serde(rename = "statusCode")]
    status_code: u32,
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

async fn submit_language(
    State(service): State<Service>,
    Path(language): Path<String>,
    multipart: Multipart,
) -> AxumResponse {
    handle_submission(&service, Some(language), multipart).await
}

async fn submit_generic(State(service): State<Service>, multipart: Multipart) -> AxumResponse {
    handle_submission(&service, None, multipart).await
}

async fn handle_submission(
    service: &Service,
    path_language: Option<String>,
    mut multipart: Multipart,
) -> AxumResponse {
    let mut language_tag = path_language;
    let mut source_filename = None;
    let mut source = None;
    let mut expected_output_filename = None;
    let mut expected_output = None;
    let mut input_filename = None;
    let mut input = None;
    let mut time_limit = None;
    let mut memory_limit_mb = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => return bad_request(format!("malformed multipart body: {err}")),
        };
        let name = field.name().unwrap_or("").to_string();
        let file_name = field.file_name().map(str::to_string);

        match name.as_str() {
            "sourceCode" => {
                source_filename = file_name;
                source = match field.bytes().await {
                    Ok(bytes) => Some(bytes.to_vec()),
                    Err(err) => return bad_request(format!("failed to read sourceCode: {err}")),
                };
            }
            "expectedOutput" => {
                expected_output_filename = file_name;
                expected_output = match field.bytes().await {
                    Ok(bytes) => Some(bytes.to_vec()),
                    Err(err) => {
                        return bad_request(format!("failed to read expectedOutput: {err}"));
                    }
                };
            }
            "input" => {
                input_filename = file_name;
                input = match field.bytes().await {
                    Ok(bytes) => Some(bytes.to_vec()),
                    Err(err) => return bad_request(format!("failed to read input: {err}")),
                };
            }
            "language" => match field.text().await {
                Ok(text) => language_tag = Some(text),
                Err(err) => return bad_request(format!("invalid language field: {err}")),
            },
            "timeLimit" => match field.text().await.ok().and_then(|t| t.parse::<f64>().ok()) {
                Some(value) => time_limit = Some(value),
                None => return bad_request("timeLimit must be a number".to_string()),
            },
            "memoryLimit" => {
                match field.text().await.ok().and_then(|t| t.parse::<u64>().ok()) {
                    Some(value) => memory_limit_mb = Some(value),
                    None => return bad_request("memoryLimit must be a non-negative integer".to_string()),
                }
            }
            other => {
                warn!(field = other, "ignoring unrecognized multipart field");
            }
        }
    }

    let Some(language_tag) = language_tag else {
        return bad_request("missing language (route segment or 'language' field)".to_string());
    };
    let Some(source_filename) = source_filename else {
        return bad_request("sourceCode part must carry a filename".to_string());
    };
    let Some(source) = source else {
        return bad_request("missing sourceCode field".to_string());
    };
    let Some(expected_output_filename) = expected_output_filename else {
        return bad_request("expectedOutput part must carry a filename".to_string());
    };
    let Some(expected_output) = expected_output else {
        return bad_request("missing expectedOutput field".to_string());
    };
    let Some(time_limit) = time_limit else {
        return bad_request("missing timeLimit field".to_string());
    };
    let Some(memory_limit_mb) = memory_limit_mb else {
        return bad_request("missing memoryLimit field".to_string());
    };
    if input.is_some() != input_filename.is_some() {
        return bad_request("input part must carry a filename".to_string());
    }

    let raw = RawRequest {
        language_tag,
        source_filename,
        source,
        expected_output_filename,
        expected_output,
        input_filename,
        input,
        time_limit,
        memory_limit_mb,
    };

    let request = match validator::validate(raw, service.registry(), &service.config().validation) {
        Ok(request) => request,
        Err(err) => return bad_request(err.to_string()),
    };

    match service.judge(request).await {
        Ok(response) => (
            StatusCode::OK,
            Json(JudgmentBody {
                status_code: response.status_code,
                status: response.status,
                output: response.output,
                error: None,
            }),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

fn status_for_error(err: &GatewayError) -> StatusCode {
    match err {
        GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
        GatewayError::Throttled(_) => StatusCode::TOO_MANY_REQUESTS,
        GatewayError::SandboxUnavailable(_) | GatewayError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_body(status: StatusCode, message: String) -> JudgmentBody {
    JudgmentBody {
        status_code: u32::from(status.as_u16()),
        status: status.canonical_reason().unwrap_or("Error").to_string(),
        output: None,
        error: Some(message),
    }
}

fn bad_request(message: String) -> AxumResponse {
    (
        StatusCode::BAD_REQUEST,
        Json(error_body(StatusCode::BAD_REQUEST, message)),
    )
        .into_response()
}

fn error_response(err: GatewayError) -> AxumResponse {
    let status = status_for_error(&err);
    (status, Json(error_body(status, err.to_string()))).into_response()
}
