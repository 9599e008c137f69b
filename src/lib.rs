//! HTTP API статусов ONT на OLT поверх SNMPv2c.

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod ont;
pub mod routes;
pub mod snmp;

pub use error::{Error, Result};
