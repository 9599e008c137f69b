//! Настоящий SNMPv2c транспорт против агента на loopback.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use snmp2::{MessageType, Pdu, Varbinds};
use tokio::net::UdpSocket;
use tower::ServiceExt;

use olt_snmp_api::Error;
use olt_snmp_api::config::{AppConfig, Profile, Settings};
use olt_snmp_api::handlers::AppState;
use olt_snmp_api::ont::OntService;
use olt_snmp_api::routes::create_router;
use olt_snmp_api::snmp::{ClientOptions, Oid, SnmpClient, SnmpValue, Target, UdpConnector};

const STATUS: &str = "1.3.6.1.4.1.3902.1012.3.28.2.1.4";
const NAME: &str = "1.3.6.1.4.1.3902.1012.3.28.1.1.2";

fn tlv(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    match content.len() {
        len if len < 0x80 => out.push(len as u8),
        len if len <= 0xFF => out.extend([0x81, len as u8]),
        len => out.extend([0x82, (len >> 8) as u8, len as u8]),
    }
    out.extend_from_slice(content);
    out
}

fn integer(value: i64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    while start < 7 {
        let redundant = (bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0)
            || (bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0);
        if !redundant {
            break;
        }
        start += 1;
    }
    tlv(0x02, &bytes[start..])
}

fn octets(value: &[u8]) -> Vec<u8> {
    tlv(0x04, value)
}

fn counter32(value: u8) -> Vec<u8> {
    assert!(value < 0x80);
    tlv(0x41, &[value])
}

fn varbind(oid: &Oid, value: &[u8]) -> Vec<u8> {
    let encoded = snmp2::Oid::from(oid.as_slice()).unwrap();
    let mut content = tlv(0x06, encoded.as_bytes());
    content.extend_from_slice(value);
    tlv(0x30, &content)
}

#[derive(Default)]
struct AgentBuilder {
    table: BTreeMap<Oid, Vec<u8>>,
    silent: bool,
    first_reply_delay: Duration,
}

impl AgentBuilder {
    fn value(mut self, oid: &str, encoded: Vec<u8>) -> Self {
        self.table.insert(Oid::parse(oid).unwrap(), encoded);
        self
    }

    fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    fn first_reply_delay(mut self, delay: Duration) -> Self {
        self.first_reply_delay = delay;
        self
    }

    async fn start(self) -> Agent {
        let socket = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
        let addr = socket.local_addr().unwrap();
        let requests = Arc::new(AtomicUsize::new(0));

        let state = Arc::new(self);
        let counter = Arc::clone(&requests);
        tokio::spawn(async move {
            let mut buf = vec![0u8; 65_535];
            loop {
                let Ok((len, peer)) = socket.recv_from(&mut buf).await else {
                    return;
                };
                let seen = counter.fetch_add(1, Ordering::SeqCst);
                if state.silent {
                    continue;
                }
                let Some(reply) = state.answer(&buf[..len]) else {
                    continue;
                };

                let delay = if seen == 0 {
                    state.first_reply_delay
                } else {
                    Duration::ZERO
                };
                let socket = Arc::clone(&socket);
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = socket.send_to(&reply, peer).await;
                });
            }
        });

        Agent { addr, requests }
    }

    /// Ответ в том же сообщении: тот же request-id и community, тип Response
    fn answer(&self, datagram: &[u8]) -> Option<Vec<u8>> {
        let request = Pdu::from_bytes(datagram).ok()?;
        let (asked, _) = request.varbinds.clone().next()?;
        let asked = Oid::parse(&asked.to_string()).ok()?;

        let bindings: Vec<(Oid, Vec<u8>)> = match request.message_type {
            MessageType::GetRequest => {
                let value = self.table.get(&asked).cloned().unwrap_or_else(|| vec![0x81, 0x00]);
                vec![(asked, value)]
            }
            MessageType::GetBulkRequest => {
                // в GETBULK на местах error-status/error-index лежат non-repeaters (0)
                // и max-repetitions
                let limit = request.error_status.max(request.error_index).max(1) as usize;
                let next: Vec<(Oid, Vec<u8>)> = self
                    .table
                    .iter()
                    .filter(|(oid, _)| **oid > asked)
                    .take(limit)
                    .map(|(oid, value)| (oid.clone(), value.clone()))
                    .collect();
                if next.is_empty() {
                    vec![(asked, vec![0x82, 0x00])]
                } else {
                    next
                }
            }
            _ => return None,
        };

        let encoded: Vec<u8> = bindings
            .iter()
            .flat_map(|(oid, value)| varbind(oid, value))
            .collect();

        let mut response = request.clone();
        response.message_type = MessageType::Response;
        response.error_status = 0;
        response.error_index = 0;
        response.varbinds = Varbinds::from_bytes(&encoded);
        response.to_bytes().ok()
    }
}

struct Agent {
    addr: SocketAddr,
    requests: Arc<AtomicUsize>,
}

impl Agent {
    fn builder() -> AgentBuilder {
        AgentBuilder::default()
    }

    fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn target(&self) -> Target {
        Target::new("127.0.0.1", self.addr.port(), "public")
    }
}

fn options(timeout_ms: u64, retries: u32) -> ClientOptions {
    ClientOptions {
        timeout: Duration::from_millis(timeout_ms),
        retries,
        max_repetitions: 2,
    }
}

fn oid(s: &str) -> Oid {
    Oid::parse(s).unwrap()
}

#[tokio::test]
async fn get_decodes_agent_values() {
    let agent = Agent::builder()
        .value(&format!("{STATUS}.10"), integer(3))
        .value(&format!("{NAME}.10"), octets(b"ONT-BUDI"))
        .value("1.3.6.1.2.1.2.2.1.10.1", counter32(7))
        .start()
        .await;
    let mut client = SnmpClient::connect(&UdpConnector, agent.target(), options(500, 0))
        .await
        .unwrap();

    let status = client.get(&oid(&format!("{STATUS}.10"))).await.unwrap();
    assert_eq!(status.oid.to_string(), format!("{STATUS}.10"));
    assert_eq!(status.value, SnmpValue::Integer(3));

    let name = client.get(&oid(&format!("{NAME}.10"))).await.unwrap();
    assert_eq!(name.value, SnmpValue::OctetString(b"ONT-BUDI".to_vec()));

    let counter = client.get(&oid("1.3.6.1.2.1.2.2.1.10.1")).await.unwrap();
    assert_eq!(counter.value, SnmpValue::Unsigned(7));

    let missing = client.get(&oid(&format!("{STATUS}.99"))).await.unwrap();
    assert_eq!(missing.value, SnmpValue::NoSuchInstance);
}

#[tokio::test]
async fn walk_follows_several_getbulk_pages() {
    let agent = Agent::builder()
        .value(&format!("{STATUS}.1"), integer(3))
        .value(&format!("{STATUS}.2"), integer(1))
        .value(&format!("{STATUS}.3"), integer(4))
        .value(&format!("{STATUS}.4"), integer(3))
        .value(&format!("{STATUS}.5"), integer(-1))
        .value("1.3.6.1.4.1.3902.1012.3.28.2.1.5.1", integer(0))
        .start()
        .await;
    let mut client = SnmpClient::connect(&UdpConnector, agent.target(), options(500, 0))
        .await
        .unwrap();

    let rows = client.walk(&oid(STATUS)).collect().await.unwrap();
    let values: Vec<SnmpValue> = rows.into_iter().map(|vb| vb.value).collect();
    assert_eq!(
        values,
        [3, 1, 4, 3, -1].map(SnmpValue::Integer).to_vec()
    );
    // max_repetitions = 2: страницы [1,2] [3,4] [5,чужой OID]
    assert_eq!(agent.requests(), 3);
}

#[tokio::test]
async fn walk_ends_at_end_of_mib_view() {
    let agent = Agent::builder()
        .value(&format!("{STATUS}.1"), integer(3))
        .start()
        .await;
    let mut client = SnmpClient::connect(&UdpConnector, agent.target(), options(500, 0))
        .await
        .unwrap();

    let rows = client.walk(&oid(STATUS)).collect().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(agent.requests(), 2);
}

#[tokio::test]
async fn silent_agent_times_out_after_retries() {
    let agent = Agent::builder().silent().start().await;
    let mut client = SnmpClient::connect(&UdpConnector, agent.target(), options(50, 2))
        .await
        .unwrap();

    let err = client.get(&oid(&format!("{STATUS}.1"))).await.unwrap_err();
    assert!(matches!(err, Error::Timeout { retries: 2, .. }), "got {err:?}");
    assert_eq!(agent.requests(), 3);
}

#[tokio::test]
async fn late_reply_does_not_break_the_next_request() {
    // Первый ответ опаздывает: клиент успевает повторить запрос и получить второй ответ,
    // а опоздавший остаётся в сокете до следующего запроса.
    let agent = Agent::builder()
        .value(&format!("{STATUS}.1"), integer(3))
        .value(&format!("{STATUS}.2"), integer(4))
        .first_reply_delay(Duration::from_millis(150))
        .start()
        .await;
    let mut client = SnmpClient::connect(&UdpConnector, agent.target(), options(100, 1))
        .await
        .unwrap();

    let first = client.get(&oid(&format!("{STATUS}.1"))).await.unwrap();
    assert_eq!(first.value, SnmpValue::Integer(3));

    tokio::time::sleep(Duration::from_millis(150)).await;

    let second = client.get(&oid(&format!("{STATUS}.2"))).await.unwrap();
    assert_eq!(second.value, SnmpValue::Integer(4));
    assert_eq!(agent.requests(), 4);
}

fn app(agent: &Agent) -> axum::Router {
    let mut settings = Settings::default();
    settings.default_profile = "zte-c320-v2".to_string();
    settings.connection.port = agent.addr.port();
    settings.connection.timeout_ms = 200;
    settings.connection.retries = 0;

    let profile = Profile::from_yaml(
        r#"
name: zte-c320-v2
oids:
  status: .1.3.6.1.4.1.3902.1012.3.28.2.1.4
  description: .1.3.6.1.4.1.3902.1012.3.28.1.1.3
  name: .1.3.6.1.4.1.3902.1012.3.28.1.1.2
status_map:
  1: LOS
  3: Working
  4: DyingGasp
"#,
    )
    .unwrap();
    let config = Arc::new(AppConfig::new([profile], settings).unwrap());
    create_router(AppState::new(OntService::new(UdpConnector, config)))
}

async fn get(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn router_serves_real_transport_on_worker_threads() {
    let agent = Agent::builder()
        .value(&format!("{STATUS}.10"), integer(3))
        .value(&format!("{STATUS}.11"), integer(1))
        .value(&format!("{NAME}.10"), octets(b"ONT-BUDI"))
        .value(&format!("{NAME}.11"), octets(b"ONT-WARUNG"))
        .start()
        .await;
    let app = app(&agent);

    let (status, body) = get(&app, "/olt/127.0.0.1/onts/status").await;
    assert_eq!(status, StatusCode::OK);
    let texts: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["status_text"].as_str().unwrap())
        .collect();
    assert_eq!(texts, ["Working", "LOS"]);

    let (status, body) = get(&app, "/olt/127.0.0.1/onts/by-name/ONT-WARUNG/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["ont_index"], "11");
    assert_eq!(body["data"]["status_text"], "LOS");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn router_reports_silent_olt_as_gateway_timeout() {
    let agent = Agent::builder().silent().start().await;
    let app = app(&agent);

    let (status, body) = get(&app, "/olt/127.0.0.1/onts/by-name/x/status").await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert!(body["detail"].as_str().unwrap().contains("timeout"));
}
