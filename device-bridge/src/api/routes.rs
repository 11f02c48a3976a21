use axum::{
    http::{HeaderValue, Method},
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers::{health, ui_device};
use super::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Browser clients are only allowed from the local machine
    let cors = CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost"),
            HeaderValue::from_static("http://127.0.0.1"),
        ])
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(tower_http::cors::Any);

    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Window content
        .route(
            "/uiDevice/dumpWindowHierarchy",
            get(ui_device::dump_window_hierarchy),
        )
        .route("/uiDevice/screenshot", get(ui_device::screenshot))
        .route("/uiDevice/findObject", get(ui_device::find_object))
        .route(
            "/uiDevice/lastTraversedText",
            get(ui_device::last_traversed_text),
        )
        // Device info
        .route(
            "/uiDevice/currentPackageName",
            get(ui_device::current_package_name),
        )
        .route("/uiDevice/displayHeight", get(ui_device::display_height))
        .route("/uiDevice/displayWidth", get(ui_device::display_width))
        .route("/uiDevice/displayRotation", get(ui_device::display_rotation))
        .route("/uiDevice/displaySizeDp", get(ui_device::display_size_dp))
        .route("/uiDevice/productName", get(ui_device::product_name))
        // Interaction
        .route("/uiDevice/click", get(ui_device::click))
        .route("/uiDevice/pressBack", get(ui_device::press_back))
        .route("/uiDevice/pressDelete", get(ui_device::press_delete))
        .route("/uiDevice/pressEnter", get(ui_device::press_enter))
        .route("/uiDevice/pressHome", get(ui_device::press_home))
        .route("/uiDevice/pressKeyCode", get(ui_device::press_key_code))
        // Waits
        .route("/uiDevice/waitForIdle", get(ui_device::wait_for_idle))
        .route(
            "/uiDevice/waitForWindowUpdate",
            get(ui_device::wait_for_window_update),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
