//! Microsoft Graph Integration
//!
//! OneDrive（Microsoft Graph）との通信

pub mod client;
pub mod models;

pub use client::GraphClient;
