use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::{AppConfig, Profile};
use crate::error::{Error, Result};
use crate::snmp::{
    Connector, Oid, SnmpClient, SnmpSession, Target, VarBind, coerce_status_code, extract_index,
};

pub mod identity;
pub mod status;

pub use identity::find_index_by_value;
pub use status::{StatusMap, UNKNOWN_STATUS};

/// Состояние одного ONT
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OntStatusRecord {
    pub ont_index: String,
    pub status_code: i64,
    pub status_text: String,
}

impl OntStatusRecord {
    /// Разбирает varbind из таблицы статусов
    pub fn from_binding(binding: &VarBind, base: &Oid, statuses: &StatusMap) -> Result<Self> {
        let ont_index = extract_index(&binding.oid.to_string(), &base.to_string())?;
        let status_code = coerce_status_code(binding)?;

        Ok(Self {
            ont_index,
            status_code,
            status_text: statuses.resolve(status_code).to_string(),
        })
    }
}

/// Параметры одного запроса к OLT
#[derive(Debug, Clone)]
pub struct OntQuery<'a> {
    pub target: Target,
    pub profile: &'a Profile,
}

/// Опрос ONT на OLT.
///
/// Каждая операция открывает одну сессию и закрывает её по выходу из функции,
/// включая ветки с ошибками. Все операции только читают.
pub struct OntService<C> {
    connector: C,
    config: Arc<AppConfig>,
}

impl<C: Connector> OntService<C> {
    pub fn new(connector: C, config: Arc<AppConfig>) -> Self {
        Self { connector, config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Собирает параметры запроса: community и профиль из запроса или по умолчанию
    pub fn query(
        &self,
        olt_ip: &str,
        community: Option<&str>,
        profile: Option<&str>,
    ) -> Result<OntQuery<'_>> {
        let profile = self
            .config
            .profile(profile)
            .ok_or_else(|| Error::UnknownProfile(profile.unwrap_or_default().to_string()))?;

        let community = community
            .filter(|c| !c.is_empty())
            .unwrap_or(self.config.community());

        Ok(OntQuery {
            target: Target::new(olt_ip, self.config.settings.connection.port, community),
            profile,
        })
    }

    /// Статусы всех ONT в порядке OID устройства
    pub async fn list_statuses(&self, query: &OntQuery<'_>) -> Result<Vec<OntStatusRecord>> {
        let mut client = self.open(query).await?;
        let base = &query.profile.oids.status;

        let bindings = client.walk(base).collect().await?;
        let records = bindings
            .iter()
            .map(|vb| OntStatusRecord::from_binding(vb, base, &query.profile.status_map))
            .collect::<Result<Vec<_>>>()?;

        info!(
            olt = %query.target,
            profile = %query.profile.name,
            count = records.len(),
            "ONT statuses collected"
        );
        Ok(records)
    }

    /// Статус одного ONT по индексу
    pub async fn status_by_index(
        &self,
        query: &OntQuery<'_>,
        index: &str,
    ) -> Result<OntStatusRecord> {
        // Невалидный индекс отсекаем до открытия сессии
        let oid = query.profile.oids.status.child(index)?;
        let mut client = self.open(query).await?;
        Self::status_at(&mut client, query, &oid, index).await
    }

    /// Статус ONT по описанию
    pub async fn status_by_description(
        &self,
        query: &OntQuery<'_>,
        description: &str,
    ) -> Result<OntStatusRecord> {
        let base = &query.profile.oids.description;
        self.status_by_attribute(query, base, "description", description)
            .await
    }

    /// Статус ONT по имени
    pub async fn status_by_name(&self, query: &OntQuery<'_>, name: &str) -> Result<OntStatusRecord> {
        self.status_by_attribute(query, &query.profile.oids.name, "name", name)
            .await
    }

    async fn status_by_attribute(
        &self,
        query: &OntQuery<'_>,
        base: &Oid,
        attribute: &str,
        value: &str,
    ) -> Result<OntStatusRecord> {
        let mut client = self.open(query).await?;

        let index = find_index_by_value(&mut client, base, value)
            .await?
            .ok_or_else(|| Error::NotFound(format!("ONT with {attribute} {value:?}")))?;
        debug!(olt = %query.target, attribute, index = %index, "ONT resolved");

        let oid = query.profile.oids.status.child(&index)?;
        Self::status_at(&mut client, query, &oid, &index).await
    }

    async fn status_at<S: SnmpSession>(
        client: &mut SnmpClient<S>,
        query: &OntQuery<'_>,
        oid: &Oid,
        index: &str,
    ) -> Result<OntStatusRecord> {
        let binding = client.get(oid).await?;
        if binding.value.is_exception() {
            return Err(Error::NotFound(format!("ONT {index}")));
        }

        let profile = query.profile;
        OntStatusRecord::from_binding(&binding, &profile.oids.status, &profile.status_map)
    }

    async fn open(&self, query: &OntQuery<'_>) -> Result<SnmpClient<C::Session>> {
        SnmpClient::connect(
            &self.connector,
            query.target.clone(),
            self.config.settings.client_options(),
        )
        .await
    }
}
