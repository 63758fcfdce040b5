#![allow(clippy::new_without_default)]

//! Public API for the banking portal client crate.
//!
//! Raw backend JSON goes through [`adapters`] into the typed records in
//! [`models`]; [`loader`] caches named GraphQL queries and [`views`] reads
//! them back as view-models. [`session`] and [`socket`] track the live
//! connection.

pub mod adapters;
pub mod client;
pub mod config;
pub mod currency;
pub mod errors;
pub mod export;
pub mod loader;
pub mod models;
pub mod mutations;
pub mod queries;
pub mod raw;
pub mod session;
pub mod socket;
pub mod views;

pub use client::{GraphqlTransport, HttpTransport};
pub use config::Config;
pub use loader::LoaderRegistry;
pub use models::{Account, CurrencyBalance, Transaction};
pub use session::Session;
pub use views::Views;
