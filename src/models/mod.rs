pub mod ont;

pub use ont::{ErrorBody, OltQueryParams, OntListResponse, OntResponse, OntStatusBody};
