use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

pub mod profile;
pub mod settings;

pub use profile::{Profile, ProfileOids, ProfileSummary};
pub use settings::Settings;

/// Каталог с профилями по умолчанию
pub const DEFAULT_PROFILES_DIR: &str = "./profiles";

/// Главная конфигурация приложения.
///
/// Собирается один раз при старте и дальше только читается.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Профили устройств по имени
    pub profiles: BTreeMap<String, Profile>,
    /// Базовые настройки
    pub settings: Settings,
}

impl AppConfig {
    /// Загружает конфигурацию: профили из `PROFILES_DIR` и переопределения из окружения
    pub fn load() -> Result<Self> {
        let dir = env::var("PROFILES_DIR").unwrap_or_else(|_| DEFAULT_PROFILES_DIR.to_string());
        let mut settings = Settings::default();
        apply_overrides(&mut settings, |key| env::var(key).ok())?;

        let profiles = load_profiles(&dir)?;
        Self::new(profiles, settings)
    }

    /// Собирает конфигурацию из готовых частей с проверкой профиля по умолчанию
    pub fn new(profiles: impl IntoIterator<Item = Profile>, settings: Settings) -> Result<Self> {
        let mut by_name = BTreeMap::new();
        for profile in profiles {
            if let Some(previous) = by_name.insert(profile.name.clone(), profile) {
                anyhow::bail!("Профиль '{}' описан дважды", previous.name);
            }
        }

        if by_name.is_empty() {
            anyhow::bail!("Не найдено ни одного профиля устройства");
        }
        if !by_name.contains_key(&settings.default_profile) {
            anyhow::bail!(
                "Профиль по умолчанию '{}' не найден (есть: {})",
                settings.default_profile,
                by_name.keys().cloned().collect::<Vec<_>>().join(", ")
            );
        }

        Ok(Self {
            profiles: by_name,
            settings,
        })
    }

    /// Профиль по имени, либо профиль по умолчанию
    pub fn profile(&self, name: Option<&str>) -> Option<&Profile> {
        self.profiles
            .get(name.unwrap_or(&self.settings.default_profile))
    }

    /// Community по умолчанию
    pub fn community(&self) -> &str {
        &self.settings.auth.v2c.community
    }
}

/// Читает все `*.yaml`/`*.yml` из каталога
pub fn load_profiles(dir: impl AsRef<Path>) -> Result<Vec<Profile>> {
    let dir = dir.as_ref();
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Не удалось открыть каталог профилей: {}", dir.display()))?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == "yaml" || ext == "yml")
        })
        .collect();
    paths.sort();

    paths.iter().map(Profile::load).collect()
}

/// Переопределения из переменных окружения.
///
/// `lookup` вынесен параметром, чтобы не трогать окружение процесса в тестах.
pub fn apply_overrides<F>(settings: &mut Settings, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(community) = lookup("SNMP_COMMUNITY_STRING") {
        settings.auth.v2c.community = community;
    }
    if let Some(port) = lookup("SNMP_PORT") {
        settings.connection.port = port
            .parse()
            .with_context(|| format!("SNMP_PORT: невалидный порт '{port}'"))?;
    }
    if let Some(timeout) = lookup("SNMP_TIMEOUT_MS") {
        settings.connection.timeout_ms = timeout
            .parse()
            .with_context(|| format!("SNMP_TIMEOUT_MS: невалидное значение '{timeout}'"))?;
    }
    if let Some(retries) = lookup("SNMP_RETRIES") {
        settings.connection.retries = retries
            .parse()
            .with_context(|| format!("SNMP_RETRIES: невалидное значение '{retries}'"))?;
    }
    if let Some(listen) = lookup("LISTEN_ADDR") {
        settings.server.listen = listen;
    }
    if let Some(profile) = lookup("OLT_PROFILE") {
        settings.default_profile = profile;
    }
    Ok(())
}
