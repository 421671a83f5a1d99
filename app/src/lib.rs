//! Transit map viewer: API client, viewer state and Leptos components.
//!
//! Everything here builds natively as well as for wasm32, so the CLI and
//! the tests drive the same session logic as the browser.

#![recursion_limit = "256"]

pub mod client;
pub mod components;
pub mod components_impl;
pub mod config;
pub mod entities;
pub mod error;
pub mod geo;
pub mod reconcile;
pub mod schedule;
pub mod session;
pub mod types;
pub mod viewer;

pub use client::{TransitApi, TransitClient};
pub use config::Config;
pub use error::{Result, ViewerError};
pub use session::{MapCommand, Session};
pub use viewer::Viewer;
