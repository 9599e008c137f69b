use snmp2::{AsyncSession, Value};
use tracing::{debug, trace};

use crate::error::{Error, Result};

use super::client::{Connector, Request, Response, SnmpSession, Target};
use super::{Oid, SnmpValue, VarBind};

/// SNMPv2c сессия поверх `snmp2::AsyncSession` (один UDP сокет).
///
/// Буферы сессии лежат в куче (feature `heap_buffers`), иначе ~128 КБ
/// переезжают по стеку вместе с future обработчика.
pub struct SnmpClientV2c {
    session: AsyncSession,
    target: Target,
}

impl SnmpClientV2c {
    pub async fn new(target: &Target) -> Result<Self> {
        Ok(Self {
            session: open_session(target).await?,
            target: target.clone(),
        })
    }

    async fn fail(&mut self, error: snmp2::Error) -> Result<Response> {
        // Ответ на попытку, брошенную по таймауту. Дальше сокет всегда отстаёт на один ответ,
        // поэтому старый сокет выбрасываем вместе с очередью датаграмм.
        if error == snmp2::Error::RequestIdMismatch {
            debug!(agent = %self.target, "request-id mismatch, reopening socket");
            self.session = open_session(&self.target).await?;
            return Err(Error::StaleResponse {
                target: self.target.address(),
            });
        }

        Err(Error::Transport {
            target: self.target.address(),
            message: error.to_string(),
        })
    }
}

async fn open_session(target: &Target) -> Result<AsyncSession> {
    let address = target.address();
    AsyncSession::new_v2c(address.as_str(), target.community.as_bytes(), 0)
        .await
        .map_err(|source| Error::Unreachable {
            target: address,
            source,
        })
}

impl SnmpSession for SnmpClientV2c {
    async fn exchange(&mut self, request: &Request) -> Result<Response> {
        let oid = to_snmp2_oid(request.oid())?;

        let sent = match request {
            Request::Get(_) => self.session.get(&oid).await,
            Request::GetBulk {
                max_repetitions, ..
            } => self.session.getbulk(&[&oid], 0, *max_repetitions).await,
        };

        let pdu = match sent {
            Ok(pdu) => pdu,
            Err(e) => return self.fail(e).await,
        };

        let error_status = pdu.error_status;
        let error_index = pdu.error_index;

        let mut varbinds = Vec::new();
        for (oid, value) in pdu.varbinds {
            let oid = Oid::parse(&oid.to_string())?;
            varbinds.push(VarBind::new(oid, SnmpValue::from(value)));
        }

        trace!(agent = %self.target, count = varbinds.len(), "SNMP response decoded");

        Ok(Response {
            error_status,
            error_index,
            varbinds,
        })
    }
}

/// Коннектор, открывающий реальные UDP сессии
#[derive(Debug, Clone, Copy, Default)]
pub struct UdpConnector;

impl Connector for UdpConnector {
    type Session = SnmpClientV2c;

    async fn connect(&self, target: &Target) -> Result<Self::Session> {
        SnmpClientV2c::new(target).await
    }
}

fn to_snmp2_oid(oid: &Oid) -> Result<snmp2::Oid<'static>> {
    snmp2::Oid::from(oid.as_slice())
        .map_err(|e| Error::InvalidOid(format!("не удалось создать Oid из {oid}: {e:?}")))
}

impl From<Value<'_>> for SnmpValue {
    fn from(value: Value<'_>) -> Self {
        match value {
            Value::Integer(v) => SnmpValue::Integer(v),
            Value::OctetString(bytes) => SnmpValue::OctetString(bytes.to_vec()),
            Value::Counter32(v) | Value::Unsigned32(v) | Value::Timeticks(v) => {
                SnmpValue::Unsigned(u64::from(v))
            }
            Value::Counter64(v) => SnmpValue::Unsigned(v),
            Value::Null => SnmpValue::Null,
            Value::NoSuchObject => SnmpValue::NoSuchObject,
            Value::NoSuchInstance => SnmpValue::NoSuchInstance,
            Value::EndOfMibView => SnmpValue::EndOfMibView,
            Value::ObjectIdentifier(oid) => match Oid::parse(&oid.to_string()) {
                Ok(oid) => SnmpValue::ObjectIdentifier(oid),
                Err(_) => SnmpValue::Other(oid.to_string()),
            },
            other => SnmpValue::Other(format!("{other:?}")),
        }
    }
}
