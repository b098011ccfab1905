//! HTTP surface over the in-memory stock ledger: configuration, routing,
//! request/response mapping and low-stock notification delivery.

pub mod app;
pub mod config;
pub mod notify;
