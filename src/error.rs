use std::time::Duration;

use axum::http::StatusCode;

use crate::snmp::{ErrorStatus, Oid};

/// Результат операций сервиса
pub type Result<T> = std::result::Result<T, Error>;

/// Ошибки опроса OLT.
///
/// Транспортные и протокольные ошибки относятся к устройству (504),
/// промахи поиска - к 404, нарушения формата ответа - к 500.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Нет ответа за отведённое время после всех повторов
    #[error("SNMP timeout after {elapsed:?} waiting for {target} ({retries} retries)")]
    Timeout {
        target: String,
        elapsed: Duration,
        retries: u32,
    },

    /// Не удалось открыть сессию (адрес не резолвится, сокет не создаётся)
    #[error("SNMP target {target} unreachable: {source}")]
    Unreachable {
        target: String,
        #[source]
        source: std::io::Error,
    },

    /// Пришёл ответ на чужой request-id (опоздавший ответ на прошлую попытку).
    /// Сокет уже пересоздан, клиент повторяет запрос в пределах дедлайна.
    #[error("stale SNMP response from {target} discarded")]
    StaleResponse { target: String },

    /// Ошибка отправки/приёма на уровне SNMP библиотеки
    #[error("SNMP transport error with {target}: {message}")]
    Transport { target: String, message: String },

    /// Устройство вернуло ненулевой error-status
    #[error("SNMP error from {target}: {status} at index {index}{}", describe_oid(.oid))]
    Protocol {
        target: String,
        status: ErrorStatus,
        index: u32,
        oid: Option<Oid>,
    },

    /// Ничего не найдено (ни по индексу, ни по описанию/имени)
    #[error("{0} not found")]
    NotFound(String),

    /// OID из ответа не лежит под ожидаемым базовым OID
    #[error("malformed OID {oid}: expected a child of {base}")]
    MalformedOid { oid: String, base: String },

    /// Значение не того типа, что ожидалось
    #[error("type mismatch at {oid}: expected {expected}, got {found}")]
    TypeMismatch {
        oid: String,
        expected: &'static str,
        found: String,
    },

    /// Ответ устройства нарушает контракт (например, OID не возрастает при walk)
    #[error("malformed response from {target}: {message}")]
    MalformedResponse { target: String, message: String },

    /// Невалидная строка OID
    #[error("invalid OID: {0}")]
    InvalidOid(String),

    /// Индекс ONT из запроса не является числовым
    #[error("invalid ONT index {0:?}: expected a dotted numeric suffix")]
    InvalidIndex(String),

    /// Запрошен профиль, которого нет в конфигурации
    #[error("unknown device profile {0:?}")]
    UnknownProfile(String),
}

fn describe_oid(oid: &Option<Oid>) -> String {
    match oid {
        Some(oid) => format!(" (OID {oid})"),
        None => String::new(),
    }
}

impl Error {
    /// HTTP статус, которым ошибка отдаётся клиенту
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Timeout { .. }
            | Error::Unreachable { .. }
            | Error::StaleResponse { .. }
            | Error::Transport { .. }
            | Error::Protocol { .. } => StatusCode::GATEWAY_TIMEOUT,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::InvalidIndex(_) | Error::UnknownProfile(_) => StatusCode::BAD_REQUEST,
            Error::MalformedOid { .. }
            | Error::TypeMismatch { .. }
            | Error::MalformedResponse { .. }
            | Error::InvalidOid(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
