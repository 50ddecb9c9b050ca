#![cfg_attr(not(feature = "std"), no_std)]

//! # ntc-tempsens
//! ## An eight channel NTC thermistor board that answers over serial
//!
//! Features:
//! - `T<n>` query protocol at 9600 baud, replies as two-decimal ASCII
//! - Five-sample averaging with a 10ms settling delay per channel
//! - Beta (Steinhart-Hart) conversion for 10k/3950 NTC thermistors
//! - MCP3008 SPI ADC adapter for the RP2040 firmware
//! - Host-side client and CLI (`host` feature)

// This must go first so the logging macros are visible to every module.
mod fmt;

pub mod channel;
pub mod config;
pub mod error;
pub mod mcp3008;
pub mod protocol;
pub mod sampler;
pub mod service;
pub mod thermistor;

#[cfg(feature = "host")]
pub mod host;

#[cfg(test)]
mod mock;

pub use channel::{Channel, ChannelMap};
pub use config::ServiceConfig;
pub use error::Error;
pub use protocol::{QueryParser, Reply};
pub use sampler::AnalogInput;
pub use service::TempSensService;
pub use thermistor::Thermistor;
