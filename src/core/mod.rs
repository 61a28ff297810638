//! Core modules for the admission pipeline.
//!
//! Request model, path resolution, classification, the session store, and
//! the gatekeeper that ties them together.

pub mod classify;
pub mod config;
pub mod emit;
pub mod error;
pub mod gatekeeper;
pub mod output;
pub mod paths;
pub mod request;
pub mod store;
pub mod time;
