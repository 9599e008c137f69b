use std::fmt;

use serde::{Deserialize, Deserializer};

use crate::error::{Error, Result};

/// OID в виде последовательности чисел.
///
/// Сравнение `Ord` лексикографическое по компонентам, то есть совпадает
/// с порядком, в котором агент отдаёт OID при walk.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Oid(Vec<u64>);

impl Oid {
    /// Парсит строку вида `1.3.6.1...` или `.1.3.6.1...`
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim().trim_start_matches('.');
        if trimmed.is_empty() {
            return Err(Error::InvalidOid(s.to_string()));
        }

        let parts: std::result::Result<Vec<u64>, _> =
            trimmed.split('.').map(|p| p.parse::<u64>()).collect();

        parts
            .map(Self)
            .map_err(|e| Error::InvalidOid(format!("{s}: {e}")))
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.0
    }

    /// Лежит ли OID в поддереве `base` (включая сам `base`)
    pub fn starts_with(&self, base: &Oid) -> bool {
        self.0.starts_with(&base.0)
    }

    /// Дописывает к OID числовой суффикс индекса (`base` + "." + `index`)
    pub fn child(&self, index: &str) -> Result<Self> {
        let suffix = Oid::parse(index).map_err(|_| Error::InvalidIndex(index.to_string()))?;
        if index.trim().starts_with('.') {
            return Err(Error::InvalidIndex(index.to_string()));
        }

        let mut parts = self.0.clone();
        parts.extend(suffix.0);
        Ok(Self(parts))
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for part in &self.0 {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{part}")?;
            first = false;
        }
        Ok(())
    }
}

// Профили хранят OID строками, валидируем их сразу при загрузке
impl<'de> Deserialize<'de> for Oid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Oid::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Извлекает индекс ONT из OID ответа.
///
/// Ответ всегда имеет вид `base_oid + "." + <index>`, индекс возвращается как есть.
/// Ведущая точка допускается с обеих сторон.
pub fn extract_index(oid: &str, base_oid: &str) -> Result<String> {
    let malformed = || Error::MalformedOid {
        oid: oid.to_string(),
        base: base_oid.to_string(),
    };

    let full = oid.trim().trim_start_matches('.');
    let base = base_oid.trim().trim_start_matches('.');

    let index = full
        .strip_prefix(base)
        .and_then(|rest| rest.strip_prefix('.'))
        .ok_or_else(malformed)?;

    if index.is_empty() {
        return Err(malformed());
    }

    Ok(index.to_string())
}
