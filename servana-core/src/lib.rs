//! Core types for the Servana auction price checker
//!
//! This crate defines the shared data structures used across the workspace:
//! tokens and providers, items and market statistics, per-realm price
//! snapshots, the error taxonomy, and the traits the services use to talk to
//! the remote APIs.

pub mod api;
pub mod error;
pub mod item;
pub mod market;
pub mod price;
pub mod provider;

pub use api::{GameDataApi, MarketRegistry, PricingApi, TokenExchange};
pub use error::{ErrorCategory, ServanaError, ServanaResult};
pub use item::{Item, ItemId, MarketStat};
pub use market::{AuctionListing, MarketPriceSnapshot, Realm, RealmId};
pub use price::Copper;
pub use provider::{IssuedToken, Provider, Token};
