//! Structured logging for metamodel operations.
//!
//! Tree builds, manifest loads and constraint evaluations emit a `start`
//! event followed by one `end` or `end_error` event, keyed by `op` and the
//! field names in `cfgmeta_core_types::schema`. Hosts call `init` once with
//! the profile from their configuration; `CFGMETA_LOG` overrides the filter.
//!
//! ```rust
//! use cfgmeta_core::logging_facility::{init, Profile};
//!
//! init(Profile::Development);
//! ```

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile, LOG_ENV};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
