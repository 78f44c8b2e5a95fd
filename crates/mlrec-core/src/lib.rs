//! Core mlrec library (config, credentials, API client, rendering, operations).

pub mod api;
pub mod config;
pub mod credentials;
pub mod ops;
pub mod panel;
pub mod render;
