use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::ont::StatusMap;
use crate::snmp::Oid;

/// Базовые OID таблиц ONT для конкретного семейства OLT
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileOids {
    /// Статус ONT (INTEGER, индекс - суффикс OID)
    pub status: Oid,
    /// Описание ONT (OCTET STRING)
    pub description: Oid,
    /// Имя ONT (OCTET STRING)
    pub name: Oid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    pub name: String, // Название профиля, например "zte-c300"
    pub oids: ProfileOids,
    pub status_map: StatusMap, // код статуса -> текст, зависит от прошивки
}

impl Profile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Не удалось прочитать файл: {}", path.display()))?;

        Self::from_yaml(&content)
            .with_context(|| format!("Не удалось загрузить профиль: {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let profile: Profile =
            serde_yml::from_str(content).context("Не удалось распарсить YAML")?;

        if profile.name.trim().is_empty() {
            anyhow::bail!("У профиля нет имени");
        }
        if profile.status_map.is_empty() {
            anyhow::bail!("Профиль '{}': пустая таблица статусов", profile.name);
        }

        Ok(profile)
    }
}

/// Краткое описание профиля для /health
#[derive(Debug, Clone, Serialize)]
pub struct ProfileSummary {
    pub name: String,
    pub status_oid: String,
    pub statuses: usize,
}

impl From<&Profile> for ProfileSummary {
    fn from(profile: &Profile) -> Self {
        Self {
            name: profile.name.clone(),
            status_oid: profile.oids.status.to_string(),
            statuses: profile.status_map.len(),
        }
    }
}
