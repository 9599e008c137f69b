use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::{
    AppState, health, list_statuses, status_by_description, status_by_index, status_by_name,
};
use crate::snmp::Connector;

pub fn create_router<C: Connector>(state: AppState<C>) -> Router {
    Router::new()
        .route("/health", get(health::<C>))
        .route("/olt/{olt_ip}/onts/status", get(list_statuses::<C>))
        .route("/olt/{olt_ip}/ont/{ont_index}/status", get(status_by_index::<C>))
        .route(
            "/olt/{olt_ip}/onts/by-description/{description}",
            get(status_by_description::<C>),
        )
        .route("/olt/{olt_ip}/onts/by-name/{ont_name}/status", get(status_by_name::<C>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
