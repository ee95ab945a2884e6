//! Catalog API transport
//!
//! The client issues parametrized queries against the streaming backend and
//! hands back response envelopes; pagination and merge policy live in the
//! model layer on top.

pub mod catalog;

pub use catalog::{CatalogClient, CatalogError, ItemsEnvelope, Pagination};
