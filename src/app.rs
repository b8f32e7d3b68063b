use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{ApiConfig, AppConfig, SecurityConfig};
use crate::error::ApiError;
use crate::handlers::{properties, system};
use crate::middleware::resolve_identity_middleware;
use crate::services::{DynPropertyService, ServiceError};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<DynPropertyService>,
    pub security: Arc<SecurityConfig>,
    pub api: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(service: Arc<DynPropertyService>, config: &AppConfig) -> Self {
        Self {
            service,
            security: Arc::new(config.security.clone()),
            api: Arc::new(config.api.clone()),
        }
    }

    /// HTTP form of a service failure under this state's security settings
    pub fn api_error(&self, err: ServiceError) -> ApiError {
        ApiError::from_service(err, self.security.legacy_owner_denied_status)
    }
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.api.max_request_size_bytes;

    Router::new()
        // Public
        .route("/", get(system::root))
        .route("/health", get(system::health))
        // Listings
        .merge(property_routes())
        .layer(from_fn_with_state(state.security.clone(), resolve_identity_middleware))
        // Global middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.security))
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}

fn property_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/properties",
            get(properties::property_list).post(properties::property_create),
        )
        // Static segments win over `:id`
        .route("/properties/featured", get(properties::property_featured))
        .route("/properties/search", get(properties::property_search))
        .route("/properties/user", get(properties::property_by_user_missing))
        .route("/properties/user/", get(properties::property_by_user_missing))
        .route("/properties/user/:user_id", get(properties::property_by_user))
        .route(
            "/properties/:id",
            get(properties::property_show)
                .put(properties::property_update)
                .delete(properties::property_delete),
        )
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if security.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::issue_token;
    use crate::config::{IngestionConfig, PaginationConfig};
    use crate::database::{MemoryPropertyStore, PropertyStore};
    use crate::ingest::{MemoryObjectStore, ObjectStore};
    use crate::services::PropertyService;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    const BOUNDARY: &str = "propertyapitestboundary";

    fn test_config() -> AppConfig {
        let mut config = AppConfig::from_env();
        config.security.jwt_secret = "router-test-secret".to_string();
        config.security.legacy_owner_denied_status = false;
        config.api.public_base_url = None;
        config.api.request_timeout_secs = 10;
        config.pagination = PaginationConfig {
            default_page_size: 6,
            max_page_size: 50,
        };
        config.ingestion = IngestionConfig {
            namespace: "propertypulse".into(),
            max_concurrency: 2,
            max_image_bytes: 1024,
            cleanup_on_failure: true,
        };
        config
    }

    fn app() -> (Router, AppConfig) {
        app_with(test_config())
    }

    fn app_with(config: AppConfig) -> (Router, AppConfig) {
        let store: Arc<dyn PropertyStore> = Arc::new(MemoryPropertyStore::new());
        let objects: Arc<dyn ObjectStore> = Arc::new(MemoryObjectStore::new());
        let service = PropertyService::new(store, objects, config.pagination.clone(), &config.ingestion);
        (router(AppState::new(Arc::new(service), &config)), config)
    }

    fn bearer(config: &AppConfig, user: &str) -> String {
        format!("Bearer {}", issue_token(user, &config.security).unwrap())
    }

    /// Build a multipart body from text fields plus `images` file parts
    fn multipart(fields: &[(&str, &str)], images: &[(&str, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n").as_bytes(),
            );
        }
        for (file_name, bytes) in images {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"images\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn form_request(method: &str, uri: &str, auth: Option<&str>, body: Vec<u8>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"));
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(Body::from(body)).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn create(app: &Router, auth: &str, name: &str) -> Value {
        let body = multipart(
            &[("type", "Apartment"), ("name", name), ("location.city", "Boston"), ("amenities", "Wifi")],
            &[("front.png", b"png-bytes".as_slice())],
        );
        let response = app
            .clone()
            .oneshot(form_request("POST", "/properties", Some(auth), body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(header::LOCATION));
        json(response).await
    }

    #[tokio::test]
    async fn health_and_root_respond() {
        let (app, _) = app();
        let response = app.clone().oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let response = app.oneshot(get("/")).await.unwrap();
        assert_eq!(json(response).await["success"], true);
    }

    #[tokio::test]
    async fn create_then_fetch_round_trips() {
        let (app, config) = app();
        let created = create(&app, &bearer(&config, "owner123"), "Harbor Loft").await;
        let id = created["id"].as_str().unwrap().to_string();
        assert_eq!(created["property"]["owner"], "owner123");
        assert_eq!(created["property"]["images"].as_array().unwrap().len(), 1);

        let response = app.oneshot(get(&format!("/properties/{}", id))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let fetched = json(response).await;
        assert_eq!(fetched["name"], "Harbor Loft");
        assert_eq!(fetched["location"]["city"], "Boston");
        assert_eq!(fetched["amenities"][0], "Wifi");
    }

    #[tokio::test]
    async fn anonymous_create_is_unauthorized() {
        let (app, _) = app();
        let body = multipart(&[("type", "Apartment"), ("name", "x")], &[]);
        let response = app.oneshot(form_request("POST", "/properties", None, body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json(response).await;
        assert_eq!(body["error"], true);
        assert_eq!(body["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn non_owner_update_is_forbidden() {
        let (app, config) = app();
        let created = create(&app, &bearer(&config, "owner123"), "Harbor Loft").await;
        let uri = format!("/properties/{}", created["id"].as_str().unwrap());

        let body = multipart(&[("type", "Apartment"), ("name", "Stolen")], &[]);
        let response = app
            .clone()
            .oneshot(form_request("PUT", &uri, Some(&bearer(&config, "owner1234")), body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .clone()
            .oneshot(Request::builder().method("DELETE").uri(&uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(&uri)
                    .header(header::AUTHORIZATION, bearer(&config, "owner123"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["message"], "Property deleted");
    }

    #[tokio::test]
    async fn legacy_switch_reports_non_owner_as_unauthorized() {
        let mut config = test_config();
        config.security.legacy_owner_denied_status = true;
        let (app, config) = app_with(config);
        let created = create(&app, &bearer(&config, "owner123"), "Harbor Loft").await;
        let uri = format!("/properties/{}", created["id"].as_str().unwrap());

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(&uri)
                    .header(header::AUTHORIZATION, bearer(&config, "owner1234"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn missing_required_fields_are_rejected() {
        let (app, config) = app();
        let body = multipart(&[("type", "Apartment")], &[]);
        let response = app
            .oneshot(form_request("POST", "/properties", Some(&bearer(&config, "u1")), body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json(response).await["field_errors"]["name"].is_string());
    }

    #[tokio::test]
    async fn static_routes_and_bad_ids() {
        let (app, config) = app();
        create(&app, &bearer(&config, "owner123"), "Harbor Loft").await;

        let response = app.clone().oneshot(get("/properties/user/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app.clone().oneshot(get("/properties/user/owner123")).await.unwrap();
        assert_eq!(json(response).await.as_array().unwrap().len(), 1);

        let response = app.clone().oneshot(get("/properties/featured")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(json(response).await.as_array().unwrap().is_empty());

        let response = app.oneshot(get("/properties/not-a-uuid")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn search_and_pagination() {
        let (app, config) = app();
        let auth = bearer(&config, "owner123");
        for name in ["Harbor Loft", "Lakeside Cabin", "City Studio"] {
            create(&app, &auth, name).await;
        }

        let response = app.clone().oneshot(get("/properties/search?location=lake&propertyType=All")).await.unwrap();
        let found = json(response).await;
        assert_eq!(found.as_array().unwrap().len(), 1);
        assert_eq!(found[0]["name"], "Lakeside Cabin");

        let response = app.clone().oneshot(get("/properties/search?location=a.*")).await.unwrap();
        assert!(json(response).await.as_array().unwrap().is_empty());

        let response = app.clone().oneshot(get("/properties?page=2&pageSize=2")).await.unwrap();
        let page = json(response).await;
        assert_eq!(page["total"], 3);
        assert_eq!(page["properties"].as_array().unwrap().len(), 1);

        let response = app.oneshot(get("/properties?page=abc&pageSize=")).await.unwrap();
        let page = json(response).await;
        assert_eq!(page["properties"].as_array().unwrap().len(), 3);
    }
}
