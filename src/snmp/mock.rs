//! Симулированный SNMP агент для тестов.
//!
//! Отвечает на GET и GETBULK из отсортированной таблицы OID. Умеет молчать,
//! отвечать с задержкой, фиксированным error-status или опоздавшими ответами,
//! отказывать в соединении.
//! Считает запросы и открытые сессии.

use std::collections::BTreeMap;
use std::io;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::error::{Error, Result};

use super::client::{Connector, Request, Response, SnmpSession, Target};
use super::{Oid, SnmpValue, VarBind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Behavior {
    Respond,
    Silent,
    ErrorStatus { status: u32, index: u32 },
    Unreachable,
}

/// Симулированное устройство
#[derive(Debug)]
pub struct MockDevice {
    table: BTreeMap<Oid, SnmpValue>,
    behavior: Behavior,
    delay: Duration,
    stale_replies: AtomicUsize,
    requests: AtomicUsize,
    open_sessions: AtomicUsize,
    sessions_opened: AtomicUsize,
    last_target: Mutex<Option<Target>>,
}

impl MockDevice {
    pub fn builder() -> MockDeviceBuilder {
        MockDeviceBuilder::default()
    }

    /// Сколько PDU было получено
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Сколько сессий открыто прямо сейчас
    pub fn open_sessions(&self) -> usize {
        self.open_sessions.load(Ordering::SeqCst)
    }

    /// Сколько сессий было открыто за всё время
    pub fn sessions_opened(&self) -> usize {
        self.sessions_opened.load(Ordering::SeqCst)
    }

    /// Адрес и community последней открытой сессии
    pub fn last_target(&self) -> Option<Target> {
        self.last_target
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn answer(&self, request: &Request) -> Response {
        match request {
            Request::Get(oid) => {
                let value = self
                    .table
                    .get(oid)
                    .cloned()
                    .unwrap_or(SnmpValue::NoSuchInstance);
                Response {
                    varbinds: vec![VarBind::new(oid.clone(), value)],
                    ..Response::default()
                }
            }
            Request::GetBulk {
                oid,
                max_repetitions,
            } => {
                let limit = usize::try_from(*max_repetitions).unwrap_or(usize::MAX);
                let mut varbinds: Vec<VarBind> = self
                    .table
                    .range(oid.clone()..)
                    .filter(|(next, _)| *next > oid)
                    .take(limit)
                    .map(|(next, value)| VarBind::new(next.clone(), value.clone()))
                    .collect();

                if varbinds.is_empty() {
                    varbinds.push(VarBind::new(oid.clone(), SnmpValue::EndOfMibView));
                }

                Response {
                    varbinds,
                    ..Response::default()
                }
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct MockDeviceBuilder {
    table: BTreeMap<Oid, SnmpValue>,
    behavior: Option<Behavior>,
    delay: Duration,
    stale_replies: usize,
}

impl MockDeviceBuilder {
    /// Добавляет значение. Невалидный OID в тестовых данных - ошибка программиста.
    pub fn value(mut self, oid: &str, value: SnmpValue) -> Self {
        let oid = match Oid::parse(oid) {
            Ok(oid) => oid,
            Err(e) => panic!("bad OID in mock data: {e}"),
        };
        self.table.insert(oid, value);
        self
    }

    pub fn integer(self, oid: &str, value: i64) -> Self {
        self.value(oid, SnmpValue::Integer(value))
    }

    pub fn string(self, oid: &str, value: impl AsRef<[u8]>) -> Self {
        self.value(oid, SnmpValue::OctetString(value.as_ref().to_vec()))
    }

    /// Никогда не отвечает
    pub fn silent(mut self) -> Self {
        self.behavior = Some(Behavior::Silent);
        self
    }

    /// На любой запрос отвечает заданным error-status
    pub fn error_status(mut self, status: u32, index: u32) -> Self {
        self.behavior = Some(Behavior::ErrorStatus { status, index });
        self
    }

    /// Сессию открыть нельзя
    pub fn unreachable(mut self) -> Self {
        self.behavior = Some(Behavior::Unreachable);
        self
    }

    /// Первые `count` ответов приходят с чужим request-id
    pub fn stale_replies(mut self, count: usize) -> Self {
        self.stale_replies = count;
        self
    }

    /// Задержка перед каждым ответом
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn build(self) -> MockDevice {
        MockDevice {
            table: self.table,
            behavior: self.behavior.unwrap_or(Behavior::Respond),
            delay: self.delay,
            stale_replies: AtomicUsize::new(self.stale_replies),
            requests: AtomicUsize::new(0),
            open_sessions: AtomicUsize::new(0),
            sessions_opened: AtomicUsize::new(0),
            last_target: Mutex::new(None),
        }
    }
}

/// Коннектор к симулированному устройству
#[derive(Debug, Clone)]
pub struct MockConnector {
    device: Arc<MockDevice>,
}

impl MockConnector {
    pub fn new(device: Arc<MockDevice>) -> Self {
        Self { device }
    }

    pub fn device(&self) -> &Arc<MockDevice> {
        &self.device
    }
}

impl Connector for MockConnector {
    type Session = MockSession;

    async fn connect(&self, target: &Target) -> Result<Self::Session> {
        if self.device.behavior == Behavior::Unreachable {
            return Err(Error::Unreachable {
                target: target.address(),
                source: io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"),
            });
        }

        *self
            .device
            .last_target
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(target.clone());
        self.device.open_sessions.fetch_add(1, Ordering::SeqCst);
        self.device.sessions_opened.fetch_add(1, Ordering::SeqCst);
        Ok(MockSession {
            device: Arc::clone(&self.device),
        })
    }
}

/// Сессия с симулированным устройством
#[derive(Debug)]
pub struct MockSession {
    device: Arc<MockDevice>,
}

impl SnmpSession for MockSession {
    async fn exchange(&mut self, request: &Request) -> Result<Response> {
        self.device.requests.fetch_add(1, Ordering::SeqCst);

        if !self.device.delay.is_zero() {
            tokio::time::sleep(self.device.delay).await;
        }

        let stale = self
            .device
            .stale_replies
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if stale {
            return Err(Error::StaleResponse {
                target: "mock".to_string(),
            });
        }

        match self.device.behavior {
            Behavior::Silent => std::future::pending().await,
            Behavior::ErrorStatus { status, index } => Ok(Response {
                error_status: status,
                error_index: index,
                varbinds: vec![VarBind::new(request.oid().clone(), SnmpValue::Null)],
            }),
            Behavior::Respond | Behavior::Unreachable => Ok(self.device.answer(request)),
        }
    }
}

impl Drop for MockSession {
    fn drop(&mut self) {
        self.device.open_sessions.fetch_sub(1, Ordering::SeqCst);
    }
}
