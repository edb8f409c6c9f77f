use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, security_headers_middleware, trace_id, KeyAttemptLimiter,
};
use crate::routes::{auth, device_location, device_locations, floorplans, health, locations};
use shared::jwt::JwtConfig;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub jwt: Arc<JwtConfig>,
    pub key_limiter: Option<Arc<KeyAttemptLimiter>>,
}

pub fn create_app(config: Config, pool: PgPool) -> Router {
    let config = Arc::new(config);

    let jwt = Arc::new(JwtConfig::with_leeway(
        &config.jwt.secret,
        config.jwt.token_expiry_secs,
        config.jwt.leeway_secs,
    ));

    // Key throttling is disabled when the attempt budget is 0
    let key_limiter = if config.security.key_attempts_per_minute > 0 {
        Some(Arc::new(KeyAttemptLimiter::new(
            config.security.key_attempts_per_minute,
        )))
    } else {
        None
    };

    let state = AppState {
        pool,
        config: config.clone(),
        jwt,
        key_limiter,
    };

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // API routes (v1). Authorization is decided per handler: the
    // single-device endpoint accepts a device key or operator
    // credentials, everything else requires an operator.
    let api_routes = Router::new()
        .route(
            "/api/v1/device/:device_id/location",
            get(device_location::get_device_location)
                .put(device_location::put_device_location)
                .patch(device_location::patch_device_location)
                .delete(device_location::delete_device_location),
        )
        .route("/api/v1/location/geojson", get(locations::geojson_locations))
        .route(
            "/api/v1/location/:location_id/device",
            get(locations::devices_at_location),
        )
        .route(
            "/api/v1/location",
            get(locations::list_locations).post(locations::create_location),
        )
        .route(
            "/api/v1/location/:location_id",
            get(locations::get_location)
                .put(locations::update_location)
                .patch(locations::update_location)
                .delete(locations::delete_location),
        )
        .route(
            "/api/v1/floorplan",
            get(floorplans::list_floorplans).post(floorplans::create_floorplan),
        )
        .route(
            "/api/v1/floorplan/:floorplan_id",
            get(floorplans::get_floorplan)
                .put(floorplans::update_floorplan)
                .patch(floorplans::update_floorplan)
                .delete(floorplans::delete_floorplan),
        )
        .route(
            "/api/v1/devicelocation",
            get(device_locations::list_device_locations)
                .post(device_locations::create_device_location),
        )
        .route(
            "/api/v1/devicelocation/:association_id",
            get(device_locations::get_device_location)
                .put(device_locations::update_device_location)
                .patch(device_locations::update_device_location)
                .delete(device_locations::delete_device_location),
        )
        .route("/api/v1/auth/login", post(auth::login));

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
