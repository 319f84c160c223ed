//! `log_op_*` macros.
//!
//! Every metamodel operation that can fail on user input (tree build,
//! manifest load, constraint evaluation) brackets itself with a start event
//! and exactly one end or end_error event. Extra fields pass straight through
//! to `tracing`.

/// Start of an operation.
///
/// ```
/// # use cfgmeta_core::log_op_start;
/// log_op_start!("build_definition_tree");
/// log_op_start!("resolve_default_values", property = "listen-port");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)*)?) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::cfgmeta_core_types::schema::EVENT_START,
            $($($field)*)?
        )
    };
}

/// Successful end of an operation; `duration_ms` is required.
///
/// ```
/// # use cfgmeta_core::log_op_end;
/// log_op_end!("constraint_usable", duration_ms = 3, reason_count = 0);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::cfgmeta_core_types::schema::EVENT_END,
            duration_ms = $duration,
            $($($field)*)?
        )
    };
}

/// Failed end of an operation.
///
/// `$err` is anything convertible into `ExError`; its code, and the
/// definition and property it names, are recorded under `err.*`.
///
/// ```
/// # use cfgmeta_core::{log_op_error, errors::ConfigError};
/// let err = ConfigError::PropertyNotFound {
///     definition: "ldap-connection-handler".to_string(),
///     property: "listen-port".to_string(),
/// };
/// log_op_error!("property_definition", err, duration_ms = 1);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::cfgmeta_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?ex_err.kind(),
            err.code = ex_err.code(),
            err.definition = ex_err.definition(),
            err.property = ex_err.property(),
            $($($field)*)?
        );
    }};
}
