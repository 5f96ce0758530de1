//! Blizzard integration for Servana
//!
//! This crate provides a client for the World of Warcraft game data API:
//! the OAuth client-credentials exchange, item names and icons, and
//! connected-realm auction listings.

pub mod auth;
pub mod client;
pub mod config;
pub mod types;

pub use auth::BlizzardAuth;
pub use client::BlizzardClient;
pub use config::BlizzardConfig;
