//! Core types and trait definitions for the tally capture tracker.
//!
//! This crate is deliberately free of database and process dependencies.
//! All other crates depend on it; it depends on nothing heavier than serde.

pub mod capture;
pub mod recognize;
pub mod store;
