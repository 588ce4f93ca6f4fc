//! note-history-cli library: file-backed storage and configuration.
//!
//! This is a thin layer between the `note-history` engine and the
//! `note-history` binary, exposed so integration tests can reach it.

pub mod config;
pub mod json_store;

pub use json_store::{JsonFileStore, StorageInfo};
