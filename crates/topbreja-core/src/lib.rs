//! Core types and trait definitions for TopBreja.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::BrejaStore`] and
//! [`session::AuthProvider`]; the API layer drives the [`recorder::Recorder`]
//! and the [`session::SessionResolver`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod beer;
pub mod dto;
pub mod engagement;
pub mod error;
pub mod image;
pub mod ranking;
pub mod recorder;
pub mod session;
pub mod store;
pub mod user;

pub use error::{Error, Result};
