//! The HTTP surface: `GET`/`OPTIONS /api/generate-qr`.

use axum::{
    extract::{RawQuery, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};
use url::{form_urlencoded, Url};
use utoipa::ToSchema;

use crate::config::RenderConfig;
use crate::error::QrError;

const CORS_HEADERS: [(HeaderName, &str); 3] = [
    (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
    (header::ACCESS_CONTROL_ALLOW_METHODS, "GET, OPTIONS"),
    (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type, Authorization"),
];

const NO_CACHE_HEADERS: [(HeaderName, &str); 3] = [
    (
        header::CACHE_CONTROL,
        "no-store, no-cache, must-revalidate, proxy-revalidate",
    ),
    (header::PRAGMA, "no-cache"),
    (header::EXPIRES, "0"),
];

/// Characters that survive URL sanitising; everything else is dropped before validation.
const URL_SAFE_PUNCTUATION: &str = "$-_.+!*'(),{}|\\^~[]`<>#%\";/?:@&=";

/// Schemes that are valid without a `//host` authority.
const HOSTLESS_SCHEMES: [&str; 3] = ["mailto", "news", "file"];

#[derive(Clone)]
pub struct AppState {
    render: RenderConfig,
}

impl AppState {
    pub fn new(render: RenderConfig) -> Self {
        Self { render }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct GenerateQrParams {
    url: Option<String>,
    // Kept as text: anything that is not a leading integer counts as "not given".
    size: Option<String>,
}

impl GenerateQrParams {
    /// Reads `url` and `size` from a raw query string. A repeated key keeps its last value and
    /// unknown keys are ignored, so no query string is ever rejected outright.
    pub fn from_query(query: Option<&str>) -> Self {
        let mut params = Self::default();
        for (key, value) in form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
            match key.as_ref() {
                "url" => params.url = Some(value.into_owned()),
                "size" => params.size = Some(value.into_owned()),
                _ => {}
            }
        }
        params
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ErrorBody {
    #[schema(example = false)]
    pub success: bool,
    #[schema(example = "Invalid URL")]
    pub message: String,
}

/// Builds the service router.
pub fn routes(render: RenderConfig) -> Router {
    Router::new()
        .route(
            "/api/generate-qr",
            get(generate_qr)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .merge(crate::openapi::routes())
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(AppState::new(render))
}

/// Renders `url` as a PNG QR code.
#[utoipa::path(
    get,
    path = "/api/generate-qr",
    operation_id = "generateQrGet",
    tag = "QR Code Generation",
    summary = "Generate QR code via GET request",
    description = "Generates a QR code image for the provided URL with optional size customization.",
    params(
        ("url" = String, Query, description = "The URL to encode in the QR code",
            example = "https://circle.cma.gov.ae/DocumentVerification?docId=00008331-NG-vZox"),
        ("size" = Option<i64>, Query, description = "Size of the QR code in pixels (default: 300)",
            example = 100),
    ),
    responses(
        (status = 200, description = "QR code image generated successfully",
            content_type = "image/png", body = String,
            headers(
                ("Cache-Control" = String, description = "Always no-store"),
            )),
        (status = 422, description = "Validation Error - Invalid URL", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody),
    )
)]
pub async fn generate_qr(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Response, ApiError> {
    let params = GenerateQrParams::from_query(query.as_deref());
    let url = match params.url {
        Some(url) if is_valid_url(&url) => url,
        other => {
            warn!(url = ?other, "rejected QR request with invalid URL");
            return Err(QrError::invalid_url().into());
        }
    };
    let size = state.render.resolve_size(parse_size(params.size.as_deref()));

    let render = state.render.clone();
    let png = tokio::task::spawn_blocking(move || crate::generate_png(&url, size, &render))
        .await
        .map_err(|err| {
            error!("QR encoding task failed: {err}");
            ApiError::Internal
        })??;

    Ok((
        StatusCode::OK,
        CORS_HEADERS,
        NO_CACHE_HEADERS,
        [(header::CONTENT_TYPE, "image/png")],
        png,
    )
        .into_response())
}

async fn preflight() -> impl IntoResponse {
    (StatusCode::OK, CORS_HEADERS)
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            success: false,
            message: "Not Found".to_string(),
        }),
    )
}

async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "GET, OPTIONS")],
        CORS_HEADERS,
        Json(ErrorBody {
            success: false,
            message: "Method Not Allowed".to_string(),
        }),
    )
}

/// Sanitises `raw` the way a URL filter would and checks that what remains is an absolute URL.
/// Apart from `mailto:`, `news:` and `file:`, the scheme must be followed by a `//host`
/// authority. The unsanitised string is what gets encoded.
pub fn is_valid_url(raw: &str) -> bool {
    let sanitized: String = raw
        .chars()
        .filter(|&c| c.is_ascii_alphanumeric() || URL_SAFE_PUNCTUATION.contains(c))
        .collect();
    let Ok(url) = Url::parse(&sanitized) else {
        return false;
    };
    if HOSTLESS_SCHEMES.contains(&url.scheme()) {
        return true;
    }
    // the parser also accepts `https:host` and `https:/host`
    let has_authority = sanitized
        .get(url.scheme().len()..)
        .is_some_and(|rest| rest.starts_with("://"));
    has_authority && url.has_host()
}

/// Reads a size the way an integer cast would: optional leading whitespace and sign, then as
/// many digits as follow. No digits means 0. Saturates instead of overflowing.
pub fn parse_size(raw: Option<&str>) -> i64 {
    let Some(raw) = raw else {
        return 0;
    };
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let value = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, d| acc.saturating_mul(10).saturating_add(i64::from(d - b'0')));
    if negative {
        -value
    } else {
        value
    }
}

pub enum ApiError {
    Qr(QrError),
    Internal,
}

impl From<QrError> for ApiError {
    fn from(err: QrError) -> Self {
        Self::Qr(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Qr(err) => {
                if matches!(err, QrError::Image(_)) {
                    error!("PNG encoding failed: {err}");
                }
                (StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
            }
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error".to_string(),
            ),
        };
        (
            status,
            CORS_HEADERS,
            Json(ErrorBody {
                success: false,
                message,
            }),
        )
            .into_response()
    }
}
