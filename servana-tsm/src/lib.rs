//! TradeSkillMaster integration for Servana
//!
//! Region-wide market value and sale rate per item, authenticated with an
//! API-key token grant.

pub mod auth;
pub mod client;
pub mod config;
pub mod types;

pub use auth::TsmAuth;
pub use client::TsmClient;
pub use config::TsmConfig;
