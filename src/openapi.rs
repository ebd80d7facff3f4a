//! OpenAPI description of the HTTP surface, served as JSON and through a Scalar viewer.

use axum::{routing::get, Json, Router};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::api::{self, ErrorBody};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "QR Code Generation API",
        version = "1.0.0",
        description = "API for generating QR codes",
        contact(
            name = "API Support",
            email = "api@example.com"
        )
    ),
    servers(
        (url = "http://localhost:8000", description = "Local development server"),
        (url = "https://qr.cma.gov.ae", description = "Production server"),
    ),
    tags(
        (name = "QR Code Generation", description = "PNG QR codes for URLs"),
    ),
    paths(api::generate_qr),
    components(schemas(ErrorBody)),
)]
pub struct ApiDoc;

/// `/openapi.json` and the `/docs` viewer.
pub fn routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let api = ApiDoc::openapi();
    let json = api.clone();
    Router::new()
        .route("/openapi.json", get(move || async move { Json(json) }))
        .merge(Scalar::with_url("/docs", api))
}
