//! Core types and trait definitions for the Depot service.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! store backend and the real-time hub are injected into
//! [`service::Service`] through the [`store::DepotStore`] and
//! [`event::Broadcaster`] traits.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod catalog;
pub mod error;
pub mod event;
pub mod order;
pub mod service;
pub mod store;
pub mod ticket;
pub mod user;

pub use error::{Error, ErrorKind, Result};
