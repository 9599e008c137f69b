use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::net::Ipv6Addr;
use std::time::Duration;

use tokio::time::{Instant, timeout};
use tracing::{debug, warn};

use crate::error::{Error, Result};

use super::{ErrorStatus, Oid, SnmpValue, VarBind};

/// Адрес устройства и community для одной операции
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: u16,
    pub community: String,
}

impl Target {
    pub fn new(host: impl Into<String>, port: u16, community: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            community: community.into(),
        }
    }

    /// Адрес в виде `host:port` (IPv6 в квадратных скобках)
    pub fn address(&self) -> String {
        if self.host.parse::<Ipv6Addr>().is_ok() {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address())
    }
}

/// Один PDU запроса
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Get(Oid),
    GetBulk { oid: Oid, max_repetitions: u32 },
}

impl Request {
    pub fn oid(&self) -> &Oid {
        match self {
            Request::Get(oid) => oid,
            Request::GetBulk { oid, .. } => oid,
        }
    }
}

/// PDU ответа без привязки к конкретной библиотеке
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    pub error_status: u32,
    pub error_index: u32,
    pub varbinds: Vec<VarBind>,
}

/// Открытая SNMP сессия (сокет). Закрывается при drop.
pub trait SnmpSession: Send {
    /// Один обмен запрос/ответ, без таймаутов и повторов
    fn exchange(&mut self, request: &Request) -> impl Future<Output = Result<Response>> + Send;
}

/// Фабрика сессий
pub trait Connector: Send + Sync + 'static {
    type Session: SnmpSession;

    fn connect(&self, target: &Target) -> impl Future<Output = Result<Self::Session>> + Send;
}

/// Таймауты и повторы одной операции
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientOptions {
    /// Ожидание ответа на одну попытку
    pub timeout: Duration,
    /// Дополнительные попытки после таймаута
    pub retries: u32,
    pub max_repetitions: u32,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(3),
            retries: 2,
            max_repetitions: 10,
        }
    }
}

impl ClientOptions {
    /// Общий бюджет операции: timeout * (retries + 1)
    pub fn budget(&self) -> Duration {
        self.timeout.saturating_mul(self.retries.saturating_add(1))
    }
}

/// SNMP клиент поверх одной сессии.
///
/// Владеет сессией: сокет освобождается, когда клиент выходит из области видимости,
/// в том числе при ошибке или отмене future обработчика.
pub struct SnmpClient<S> {
    session: S,
    target: Target,
    options: ClientOptions,
}

impl<S: SnmpSession> SnmpClient<S> {
    pub fn new(session: S, target: Target, options: ClientOptions) -> Self {
        Self {
            session,
            target,
            options,
        }
    }

    /// Открывает сессию через коннектор
    pub async fn connect<C>(connector: &C, target: Target, options: ClientOptions) -> Result<Self>
    where
        C: Connector<Session = S>,
    {
        let session = connector.connect(&target).await?;
        debug!(agent = %target, "SNMP session opened");
        Ok(Self::new(session, target, options))
    }

    /// SNMP GET одного полностью квалифицированного OID
    pub async fn get(&mut self, oid: &Oid) -> Result<VarBind> {
        let deadline = Instant::now() + self.options.budget();
        let response = self.request(&Request::Get(oid.clone()), deadline).await?;

        response
            .varbinds
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(format!("OID {oid}")))
    }

    /// Ленивый walk поддерева `base` через GETBULK
    pub fn walk(&mut self, base: &Oid) -> Walk<'_, S> {
        let deadline = Instant::now() + self.options.budget();
        Walk {
            base: base.clone(),
            cursor: base.clone(),
            buffer: VecDeque::new(),
            deadline,
            done: false,
            client: self,
        }
    }

    /// Запрос с повторами по таймауту в пределах общего дедлайна операции
    async fn request(&mut self, request: &Request, deadline: Instant) -> Result<Response> {
        let started = Instant::now();
        let mut attempt = 0;

        // Опоздавший ответ попыткой не считается, но дедлайн общий
        while attempt <= self.options.retries {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }

            let wait = self.options.timeout.min(remaining);
            match timeout(wait, self.session.exchange(request)).await {
                Ok(Ok(response)) => return self.check_status(request, response),
                Ok(Err(Error::StaleResponse { .. })) => {
                    debug!(
                        agent = %self.target,
                        oid = %request.oid(),
                        attempt,
                        "stale SNMP response discarded, resending"
                    );
                }
                Ok(Err(e)) => return Err(e),
                Err(_) => {
                    debug!(
                        agent = %self.target,
                        oid = %request.oid(),
                        attempt,
                        "SNMP request timed out"
                    );
                    attempt += 1;
                }
            }
        }

        warn!(
            agent = %self.target,
            oid = %request.oid(),
            retries = self.options.retries,
            "SNMP request gave up"
        );
        Err(Error::Timeout {
            target: self.target.address(),
            elapsed: started.elapsed(),
            retries: self.options.retries,
        })
    }

    fn check_status(&self, request: &Request, response: Response) -> Result<Response> {
        if response.error_status == 0 {
            return Ok(response);
        }

        // error-index считается с 1, в запросе всегда один OID
        let oid = (response.error_index == 1).then(|| request.oid().clone());
        Err(Error::Protocol {
            target: self.target.address(),
            status: ErrorStatus::from_u32(response.error_status),
            index: response.error_index,
            oid,
        })
    }
}

/// Поток varbind'ов поддерева в порядке возрастания OID.
///
/// Все GETBULK запросы делят один дедлайн, поэтому зависший на середине walk
/// не получает новый таймаут на каждый пакет.
pub struct Walk<'c, S> {
    client: &'c mut SnmpClient<S>,
    base: Oid,
    cursor: Oid,
    buffer: VecDeque<VarBind>,
    deadline: Instant,
    done: bool,
}

impl<S: SnmpSession> Walk<'_, S> {
    /// Следующий varbind или `None`, когда поддерево закончилось
    pub async fn next(&mut self) -> Option<Result<VarBind>> {
        loop {
            if let Some(binding) = self.buffer.pop_front() {
                return Some(Ok(binding));
            }
            if self.done {
                return None;
            }
            if let Err(e) = self.fetch().await {
                self.done = true;
                return Some(Err(e));
            }
        }
    }

    /// Собирает весь walk в вектор
    pub async fn collect(mut self) -> Result<Vec<VarBind>> {
        let mut results = Vec::new();
        while let Some(binding) = self.next().await {
            results.push(binding?);
        }
        Ok(results)
    }

    async fn fetch(&mut self) -> Result<()> {
        let request = Request::GetBulk {
            oid: self.cursor.clone(),
            max_repetitions: self.client.options.max_repetitions.max(1),
        };
        let response = self.client.request(&request, self.deadline).await?;

        if response.varbinds.is_empty() {
            self.done = true;
            return Ok(());
        }

        for binding in response.varbinds {
            if binding.value == SnmpValue::EndOfMibView || !binding.oid.starts_with(&self.base) {
                self.done = true;
                break;
            }
            if binding.oid <= self.cursor {
                return Err(Error::MalformedResponse {
                    target: self.client.target.address(),
                    message: format!(
                        "non-increasing OID {} after {} during walk of {}",
                        binding.oid, self.cursor, self.base
                    ),
                });
            }

            self.cursor = binding.oid.clone();
            self.buffer.push_back(binding);
        }

        Ok(())
    }
}
