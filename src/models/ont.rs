use serde::{Deserialize, Serialize};

use crate::ont::OntStatusRecord;

/// Параметры query string для всех ONT эндпоинтов
#[derive(Debug, Default, Deserialize)]
pub struct OltQueryParams {
    /// Community string, перекрывает значение по умолчанию
    pub community: Option<String>,
    /// Профиль устройства, перекрывает профиль по умолчанию
    pub profile: Option<String>,
}

/// Ответ со списком ONT
#[derive(Debug, Serialize)]
pub struct OntListResponse {
    pub olt_ip: String,
    pub data: Vec<OntStatusRecord>,
}

/// Ответ для одного ONT
#[derive(Debug, Serialize)]
pub struct OntResponse {
    pub olt_ip: String,
    pub data: OntStatusBody,
}

/// Запись ONT, дополненная адресом OLT
#[derive(Debug, Serialize)]
pub struct OntStatusBody {
    pub olt_ip: String,
    pub ont_index: String,
    pub status_code: i64,
    pub status_text: String,
}

impl OntResponse {
    pub fn new(olt_ip: String, record: OntStatusRecord) -> Self {
        Self {
            data: OntStatusBody {
                olt_ip: olt_ip.clone(),
                ont_index: record.ont_index,
                status_code: record.status_code,
                status_text: record.status_text,
            },
            olt_ip,
        }
    }
}

/// Тело ответа с ошибкой
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}
