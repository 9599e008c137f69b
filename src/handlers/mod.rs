use std::sync::Arc;

use axum::Json;
use axum::response::{IntoResponse, Response};
use tracing::{debug, warn};

use crate::error::Error;
use crate::models::ErrorBody;
use crate::ont::OntService;

pub mod health;
pub mod ont;

pub use health::health;
pub use ont::{list_statuses, status_by_description, status_by_index, status_by_name};

/// Общее состояние обработчиков
pub struct AppState<C> {
    pub service: Arc<OntService<C>>,
}

impl<C> AppState<C> {
    pub fn new(service: OntService<C>) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

// derive(Clone) потребовал бы C: Clone
impl<C> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            warn!(status = status.as_u16(), error = %self, "request failed");
        } else {
            debug!(status = status.as_u16(), error = %self, "request rejected");
        }

        (
            status,
            Json(ErrorBody {
                detail: self.to_string(),
            }),
        )
            .into_response()
    }
}
