//! Library crate for usrdir-console.
//!
//! This crate exposes the building blocks of the TUI:
//! - Remote directory client and wire types (`api`)
//! - Application state, key handling and intent dispatch (`app`)
//! - Command line and config file settings (`config`)
//! - Error and result types (`error`)
//! - In-memory filter and sort over the loaded page (`search`)
//! - Client-side state container and its slices (`store`)
//! - UI rendering (`ui`)
//!
//! It is used by the `usrdir-console` binary and by tests.
#![doc = include_str!("../README.md")]
#![deny(rustdoc::broken_intra_doc_links)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod search;
pub mod store;
pub mod ui;

// Re-export commonly used items at the crate root for convenience
/// Error and result types shared across the crate.
pub use error::{ConsoleError, Result};
