//! HTTP API: configuration, request pipeline, routing, and handlers.

pub mod app;
pub mod config;
pub mod context;
pub mod middleware;
