//! # CIMA Watch REST API
//!
//! Configuration endpoints for the shortage watcher:
//! - `GET /health` — liveness probe
//! - `GET /config` — current recipients and hospital name (defaults when
//!   unset)
//! - `POST /config` — validate and upsert the single subscription
//! - `POST /catalog/parse` — preview-parse an uploaded CSV catalog
//!
//! Handles HTTP concerns only (JSON shapes, status codes, CORS, OpenAPI
//! docs); validation rules live with the value types and the core catalog
//! parser. The system is single-tenant: `POST /config` always upserts the
//! one subscription row.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use cimawatch_core::parse_catalog;
use cimawatch_store::{FileStore, SubscriptionUpdate};
use cimawatch_types::{EmailAddress, HospitalName};

/// Application state shared across REST handlers.
#[derive(Clone)]
pub struct AppState {
    store: Arc<FileStore>,
}

#[derive(OpenApi)]
#[openapi(
    paths(health, get_config, save_config, parse_catalog_preview),
    components(schemas(
        HealthRes,
        ConfigRes,
        SaveConfigReq,
        SaveConfigRes,
        ParseCatalogRes,
        ErrorRes
    ))
)]
struct ApiDoc;

#[derive(Serialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Serialize, ToSchema)]
pub struct ConfigRes {
    pub emails: Vec<String>,
    pub hospital_name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct SaveConfigReq {
    pub emails: Vec<String>,
    pub catalog_codes: Vec<String>,
    #[serde(default)]
    pub hospital_name: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct SaveConfigRes {
    pub success: bool,
    pub message: String,
    pub subscription_id: String,
}

#[derive(Serialize, ToSchema)]
pub struct ParseCatalogRes {
    pub count: usize,
    pub codes: Vec<String>,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorRes>);

fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorRes {
            error: message.into(),
        }),
    )
}

/// Builds the configuration API router, with Swagger UI mounted.
pub fn router(store: Arc<FileStore>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/config", get(get_config))
        .route("/config", post(save_config))
        .route("/catalog/parse", post(parse_catalog_preview))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(AppState { store })
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Health check response", body = HealthRes))
)]
/// Health check endpoint for monitoring and load balancers.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "CIMA Watch API is alive".into(),
    })
}

#[utoipa::path(
    get,
    path = "/config",
    responses(
        (status = 200, description = "Current configuration", body = ConfigRes),
        (status = 500, description = "Store failure", body = ErrorRes)
    )
)]
/// Returns the current recipients and hospital name.
///
/// When nothing has been configured yet this returns an empty recipient
/// list and the default hospital name rather than an error, so the UI can
/// render the empty form. Catalog codes are deliberately not echoed back;
/// the catalog can run to thousands of rows.
#[axum::debug_handler]
async fn get_config(State(state): State<AppState>) -> Result<Json<ConfigRes>, ApiError> {
    let subscription = state.store.load_subscription().map_err(|e| {
        tracing::error!(error = %e, "failed to load subscription");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorRes {
                error: "Error al cargar la configuración".into(),
            }),
        )
    })?;

    Ok(Json(match subscription {
        Some(s) => ConfigRes {
            emails: s.emails.iter().map(|e| e.to_string()).collect(),
            hospital_name: s.hospital_name,
        },
        None => ConfigRes {
            emails: Vec::new(),
            hospital_name: HospitalName::DEFAULT.into(),
        },
    }))
}

#[utoipa::path(
    post,
    path = "/config",
    request_body = SaveConfigReq,
    responses(
        (status = 200, description = "Configuration saved", body = SaveConfigRes),
        (status = 400, description = "Validation failure", body = ErrorRes),
        (status = 500, description = "Store failure", body = ErrorRes)
    )
)]
/// Validates and upserts the subscription configuration.
///
/// Rejections carry the specific violating values: the invalid email
/// addresses are listed back to the caller so the form can highlight them.
#[axum::debug_handler]
async fn save_config(
    State(state): State<AppState>,
    Json(req): Json<SaveConfigReq>,
) -> Result<Json<SaveConfigRes>, ApiError> {
    if req.emails.is_empty() {
        return Err(bad_request("Se requiere al menos un email"));
    }

    let mut emails = Vec::with_capacity(req.emails.len());
    let mut invalid = Vec::new();
    for raw in &req.emails {
        match EmailAddress::new(raw) {
            Ok(email) => emails.push(email),
            Err(_) => invalid.push(raw.trim().to_owned()),
        }
    }
    if !invalid.is_empty() {
        return Err(bad_request(format!(
            "Emails inválidos: {}",
            invalid.join(", ")
        )));
    }

    if req.catalog_codes.is_empty() {
        return Err(bad_request(
            "Se requiere un catálogo con códigos nacionales",
        ));
    }
    let catalog = cimawatch_core::CatalogSet::from_raw(&req.catalog_codes);
    if catalog.is_empty() {
        return Err(bad_request(
            "Ningún código del catálogo contiene dígitos válidos",
        ));
    }

    let subscription = state
        .store
        .save_subscription(SubscriptionUpdate {
            emails,
            catalog_codes: catalog.sorted_codes(),
            hospital_name: HospitalName::new(req.hospital_name.as_deref().unwrap_or_default())
                .as_str()
                .to_owned(),
        })
        .map_err(|e| {
            tracing::error!(error = %e, "failed to save subscription");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorRes {
                    error: "Error al guardar la configuración".into(),
                }),
            )
        })?;

    Ok(Json(SaveConfigRes {
        success: true,
        message: "Configuración guardada correctamente".into(),
        subscription_id: subscription.id.to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/catalog/parse",
    request_body = String,
    responses(
        (status = 200, description = "Parsed catalog codes", body = ParseCatalogRes),
        (status = 422, description = "Catalog could not be parsed", body = ErrorRes)
    )
)]
/// Preview-parses a CSV/TSV catalog upload.
///
/// Returns the normalized codes that would be stored, or a 422 with the
/// human-readable ingestion error (missing code column, no valid codes).
/// Nothing is persisted; the client follows up with `POST /config`.
#[axum::debug_handler]
async fn parse_catalog_preview(body: String) -> Result<Json<ParseCatalogRes>, ApiError> {
    match parse_catalog(&body) {
        Ok(catalog) => {
            let codes = catalog.sorted_codes();
            Ok(Json(ParseCatalogRes {
                count: codes.len(),
                codes,
            }))
        }
        Err(e) => Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorRes {
                error: e.to_string(),
            }),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn test_router(temp: &TempDir) -> Router {
        let store = Arc::new(FileStore::open(temp.path()).unwrap());
        router(store)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_get_config_defaults_when_unset() {
        let temp = TempDir::new().unwrap();
        let response = test_router(&temp)
            .oneshot(Request::get("/config").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["emails"], serde_json::json!([]));
        assert_eq!(json["hospital_name"], "Hospital");
    }

    #[tokio::test]
    async fn test_save_then_get_config() {
        let temp = TempDir::new().unwrap();
        let app = test_router(&temp);

        let response = app
            .clone()
            .oneshot(post_json(
                "/config",
                serde_json::json!({
                    "emails": ["farmacia@hospital.es"],
                    "catalog_codes": ["712345", "654 321"],
                    "hospital_name": "Hospital La Paz"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);

        let response = app
            .oneshot(Request::get("/config").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["emails"][0], "farmacia@hospital.es");
        assert_eq!(json["hospital_name"], "Hospital La Paz");
    }

    #[tokio::test]
    async fn test_save_config_lists_invalid_emails() {
        let temp = TempDir::new().unwrap();
        let response = test_router(&temp)
            .oneshot(post_json(
                "/config",
                serde_json::json!({
                    "emails": ["valid@hospital.es", "broken-address", "also bad"],
                    "catalog_codes": ["712345"]
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        let error = json["error"].as_str().unwrap();
        assert!(error.contains("broken-address"));
        assert!(error.contains("also bad"));
    }

    #[tokio::test]
    async fn test_save_config_rejects_empty_lists() {
        let temp = TempDir::new().unwrap();
        let app = test_router(&temp);

        let response = app
            .clone()
            .oneshot(post_json(
                "/config",
                serde_json::json!({ "emails": [], "catalog_codes": ["712345"] }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(post_json(
                "/config",
                serde_json::json!({ "emails": ["a@b.es"], "catalog_codes": [] }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_parse_catalog_preview_ok() {
        let temp = TempDir::new().unwrap();
        let response = test_router(&temp)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/catalog/parse")
                    .body(Body::from("CN;Nombre\n712345;AMOXICILINA\n"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["count"], 1);
        assert_eq!(json["codes"][0], "712345");
    }

    #[tokio::test]
    async fn test_parse_catalog_preview_reports_missing_column() {
        let temp = TempDir::new().unwrap();
        let response = test_router(&temp)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/catalog/parse")
                    .body(Body::from("id;name\n1;x\n"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("no code column"));
    }
}
