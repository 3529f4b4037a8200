//! The zagent pipeline: collect host metrics, append them to a local log and
//! forward them to a Zabbix collector through `zabbix_sender`.

pub mod agent;
pub mod config;
pub mod error;
pub mod recorder;
pub mod transmitter;
