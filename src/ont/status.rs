use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Текст для кодов, которых нет в таблице
pub const UNKNOWN_STATUS: &str = "unknown";

/// Таблица код статуса -> текст.
///
/// Коды зависят от прошивки OLT, поэтому таблица приходит из профиля устройства.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusMap(BTreeMap<i64, String>);

impl StatusMap {
    pub fn new<I, L>(entries: I) -> Self
    where
        I: IntoIterator<Item = (i64, L)>,
        L: Into<String>,
    {
        Self(
            entries
                .into_iter()
                .map(|(code, label)| (code, label.into()))
                .collect(),
        )
    }

    /// Текст статуса, `"unknown"` для любого кода вне таблицы
    pub fn resolve(&self, code: i64) -> &str {
        self.0
            .get(&code)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_STATUS)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
