//! Core types shared across cfgmeta facilities
//!
//! This crate provides foundational types used by the error, logging and
//! constraint facilities:
//!
//! - **Schema constants**: Canonical field keys and event names
//! - **Messages**: Coded, human-readable reasons reported by constraint handlers

pub mod message;
pub mod schema;

pub use message::Message;
