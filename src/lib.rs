// Plugin registry gateway

pub mod cli;
pub mod config;
pub mod enrich;
pub mod error;
pub mod formatter;
pub mod index;
pub mod query;
pub mod server;
pub mod service;
pub mod stats;
pub mod validator;
