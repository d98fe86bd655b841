//! Cosmovisor bootstrapper for Cosmos SDK nodes

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod application;
pub mod arch;
pub mod bootstrap;
pub mod codebase;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod fetch;
pub mod prelude;
pub mod resolver;
pub mod status;
pub mod upgrade;

pub use crate::application::BootApplication;

// Map type used within this application
use std::collections::BTreeMap as Map;
