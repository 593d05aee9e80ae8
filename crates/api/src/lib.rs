//! HTTP API: routing and request/response mapping over the planning engines.

pub mod app;
