#![deny(missing_docs)]

//! Core library for the tenant screening portal.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Chat-completion gateway client and streaming helpers.
pub mod llm;
/// Structured logging and tracing setup.
pub mod logging;
/// Screening activity counters.
pub mod metrics;
/// Document summarization, corpus assembly, and evaluation pipeline.
pub mod screening;
/// Object-store gateway integration.
pub mod storage;
