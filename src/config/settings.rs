use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::snmp::ClientOptions;

/// Базовые настройки приложения
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Настройки подключения
    pub connection: ConnectionSettings,
    /// Настройки аутентификации
    pub auth: AuthSettings,
    /// HTTP сервер
    pub server: ServerSettings,
    /// Профиль по умолчанию, если в запросе не указан `profile`
    pub default_profile: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionSettings {
    /// UDP порт агента
    pub port: u16,
    /// Таймаут одной попытки SNMP запроса (миллисекунды)
    pub timeout_ms: u64,
    /// Количество повторов при таймауте
    pub retries: u32,
    /// max-repetitions для GETBULK при walk
    pub max_repetitions: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    /// Настройки SNMPv2c
    pub v2c: SnmpV2cSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnmpV2cSettings {
    /// Community string по умолчанию
    pub community: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Адрес, на котором слушает HTTP API
    pub listen: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            connection: ConnectionSettings {
                port: 161,
                timeout_ms: 3000,
                retries: 2,
                max_repetitions: 10,
            },
            auth: AuthSettings {
                v2c: SnmpV2cSettings {
                    community: "public".to_string(),
                },
            },
            server: ServerSettings {
                listen: "0.0.0.0:8000".to_string(),
            },
            default_profile: "zte-c300".to_string(),
        }
    }
}

impl Settings {
    /// Параметры SNMP клиента для одной операции
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            timeout: Duration::from_millis(self.connection.timeout_ms),
            retries: self.connection.retries,
            max_repetitions: self.connection.max_repetitions,
        }
    }
}
