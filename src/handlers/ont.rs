use axum::Json;
use axum::extract::{Path, Query, State};

use crate::error::Result;
use crate::handlers::AppState;
use crate::models::{OltQueryParams, OntListResponse, OntResponse};
use crate::snmp::Connector;

/// GET /olt/{olt_ip}/onts/status
pub async fn list_statuses<C: Connector>(
    State(state): State<AppState<C>>,
    Path(olt_ip): Path<String>,
    Query(params): Query<OltQueryParams>,
) -> Result<Json<OntListResponse>> {
    let service = &state.service;
    let query = service.query(&olt_ip, params.community.as_deref(), params.profile.as_deref())?;

    let data = service.list_statuses(&query).await?;
    Ok(Json(OntListResponse { olt_ip, data }))
}

/// GET /olt/{olt_ip}/ont/{ont_index}/status
pub async fn status_by_index<C: Connector>(
    State(state): State<AppState<C>>,
    Path((olt_ip, ont_index)): Path<(String, String)>,
    Query(params): Query<OltQueryParams>,
) -> Result<Json<OntResponse>> {
    let service = &state.service;
    let query = service.query(&olt_ip, params.community.as_deref(), params.profile.as_deref())?;

    let record = service.status_by_index(&query, &ont_index).await?;
    Ok(Json(OntResponse::new(olt_ip, record)))
}

/// GET /olt/{olt_ip}/onts/by-description/{description}
pub async fn status_by_description<C: Connector>(
    State(state): State<AppState<C>>,
    Path((olt_ip, description)): Path<(String, String)>,
    Query(params): Query<OltQueryParams>,
) -> Result<Json<OntResponse>> {
    let service = &state.service;
    let query = service.query(&olt_ip, params.community.as_deref(), params.profile.as_deref())?;

    let record = service.status_by_description(&query, &description).await?;
    Ok(Json(OntResponse::new(olt_ip, record)))
}

/// GET /olt/{olt_ip}/onts/by-name/{ont_name}/status
pub async fn status_by_name<C: Connector>(
    State(state): State<AppState<C>>,
    Path((olt_ip, ont_name)): Path<(String, String)>,
    Query(params): Query<OltQueryParams>,
) -> Result<Json<OntResponse>> {
    let service = &state.service;
    let query = service.query(&olt_ip, params.community.as_deref(), params.profile.as_deref())?;

    let record = service.status_by_name(&query, &ont_name).await?;
    Ok(Json(OntResponse::new(olt_ip, record)))
}
