pub mod client;
pub mod mock;
pub mod oid;
pub mod v2c;
pub mod varbind;

pub use client::{ClientOptions, Connector, Request, Response, SnmpClient, SnmpSession, Target, Walk};
pub use oid::{Oid, extract_index};
pub use v2c::{SnmpClientV2c, UdpConnector};
pub use varbind::{ErrorStatus, SnmpValue, VarBind, coerce_status_code, decode_text};
