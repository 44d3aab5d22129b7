//! Canonical logging macros
//!
//! These macros provide a structured, consistent way to log operations.

/// Log the start of an operation
///
/// # Example
///
/// ```
/// # use docdex_core::log_op_start;
/// log_op_start!("reindex");
/// log_op_start!("reindex", document_id = "doc-1", index_id = "by-year");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = docdex_core_types::schema::EVENT_START,
        );
    };
    ($op:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = docdex_core_types::schema::EVENT_START,
            $($field)*
        );
    };
}

/// Log the successful end of an operation
///
/// # Example
///
/// ```
/// # use docdex_core::log_op_end;
/// log_op_end!("reindex", duration_ms = 12);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = docdex_core_types::schema::EVENT_END,
            duration_ms = $duration,
        );
    };
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = docdex_core_types::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    };
}

/// Log a failed operation with its stable error code
///
/// # Example
///
/// ```
/// # use docdex_core::log_op_error;
/// log_op_error!("reindex", "ERR_REINDEX", "root expression failed");
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $code:expr, $message:expr) => {
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = docdex_core_types::schema::EVENT_END_ERROR,
            err.code = $code,
            message = %$message,
        );
    };
}
