use std::fmt;

use crate::error::{Error, Result};

use super::Oid;

/// Значение из varbind, уже отвязанное от буфера сессии
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnmpValue {
    Integer(i64),
    /// Counter32, Gauge/Unsigned32, TimeTicks, Counter64
    Unsigned(u64),
    OctetString(Vec<u8>),
    ObjectIdentifier(Oid),
    Null,
    NoSuchObject,
    NoSuchInstance,
    EndOfMibView,
    /// Прочие типы в текстовом виде
    Other(String),
}

impl SnmpValue {
    /// Исключение v2c вместо значения (noSuchObject/noSuchInstance/endOfMibView)
    pub fn is_exception(&self) -> bool {
        matches!(
            self,
            SnmpValue::NoSuchObject | SnmpValue::NoSuchInstance | SnmpValue::EndOfMibView
        )
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            SnmpValue::Integer(_) => "INTEGER",
            SnmpValue::Unsigned(_) => "UNSIGNED",
            SnmpValue::OctetString(_) => "OCTET STRING",
            SnmpValue::ObjectIdentifier(_) => "OBJECT IDENTIFIER",
            SnmpValue::Null => "NULL",
            SnmpValue::NoSuchObject => "noSuchObject",
            SnmpValue::NoSuchInstance => "noSuchInstance",
            SnmpValue::EndOfMibView => "endOfMibView",
            SnmpValue::Other(_) => "OTHER",
        }
    }
}

/// Пара (OID, значение)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarBind {
    pub oid: Oid,
    pub value: SnmpValue,
}

impl VarBind {
    pub fn new(oid: Oid, value: SnmpValue) -> Self {
        Self { oid, value }
    }
}

/// Приводит значение к коду статуса
pub fn coerce_status_code(binding: &VarBind) -> Result<i64> {
    match &binding.value {
        SnmpValue::Integer(code) => Ok(*code),
        SnmpValue::Unsigned(code) => i64::try_from(*code).map_err(|_| Error::TypeMismatch {
            oid: binding.oid.to_string(),
            expected: "INTEGER",
            found: format!("UNSIGNED {code}"),
        }),
        other => Err(Error::TypeMismatch {
            oid: binding.oid.to_string(),
            expected: "INTEGER",
            found: other.type_name().to_string(),
        }),
    }
}

/// Декодирует OCTET STRING как ASCII.
///
/// Байты вне ASCII отбрасываются, пробелы по краям срезаются.
/// Для нестроковых значений возвращает `None`.
pub fn decode_text(value: &SnmpValue) -> Option<String> {
    match value {
        SnmpValue::OctetString(bytes) => {
            let ascii: String = bytes
                .iter()
                .filter(|b| b.is_ascii())
                .map(|&b| char::from(b))
                .collect();
            Some(ascii.trim().to_string())
        }
        _ => None,
    }
}

/// Коды error-status из RFC 3416
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorStatus {
    NoError,
    TooBig,
    NoSuchName,
    BadValue,
    ReadOnly,
    GenErr,
    NoAccess,
    WrongType,
    WrongLength,
    WrongEncoding,
    WrongValue,
    NoCreation,
    InconsistentValue,
    ResourceUnavailable,
    CommitFailed,
    UndoFailed,
    AuthorizationError,
    NotWritable,
    InconsistentName,
    Unknown(u32),
}

impl ErrorStatus {
    pub fn from_u32(code: u32) -> Self {
        match code {
            0 => Self::NoError,
            1 => Self::TooBig,
            2 => Self::NoSuchName,
            3 => Self::BadValue,
            4 => Self::ReadOnly,
            5 => Self::GenErr,
            6 => Self::NoAccess,
            7 => Self::WrongType,
            8 => Self::WrongLength,
            9 => Self::WrongEncoding,
            10 => Self::WrongValue,
            11 => Self::NoCreation,
            12 => Self::InconsistentValue,
            13 => Self::ResourceUnavailable,
            14 => Self::CommitFailed,
            15 => Self::UndoFailed,
            16 => Self::AuthorizationError,
            17 => Self::NotWritable,
            18 => Self::InconsistentName,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NoError => "noError",
            Self::TooBig => "tooBig",
            Self::NoSuchName => "noSuchName",
            Self::BadValue => "badValue",
            Self::ReadOnly => "readOnly",
            Self::GenErr => "genErr",
            Self::NoAccess => "noAccess",
            Self::WrongType => "wrongType",
            Self::WrongLength => "wrongLength",
            Self::WrongEncoding => "wrongEncoding",
            Self::WrongValue => "wrongValue",
            Self::NoCreation => "noCreation",
            Self::InconsistentValue => "inconsistentValue",
            Self::ResourceUnavailable => "resourceUnavailable",
            Self::CommitFailed => "commitFailed",
            Self::UndoFailed => "undoFailed",
            Self::AuthorizationError => "authorizationError",
            Self::NotWritable => "notWritable",
            Self::InconsistentName => "inconsistentName",
            Self::Unknown(code) => return write!(f, "unknown({code})"),
        };
        f.write_str(name)
    }
}
