//! Error types used by the studiovisor runtime and event listeners.
//!
//! This module defines two main error enums:
//!
//! - [`LifecycleError`]: errors raised while constructing or materializing an instance.
//! - [`ListenerError`]: errors raised by individual event listeners.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging.
//! Listener errors never leave the event bus: they are logged and counted in
//! [`EmitReport`](crate::EmitReport).

use thiserror::Error;

/// # Errors produced by the instance lifecycle.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// `build()` was called outside a tokio runtime, so materialization cannot be scheduled.
    #[error("no tokio runtime available to materialize the store")]
    NoRuntime,

    /// The store factory returned an error.
    #[error("store materialization failed: {error}")]
    Materialize {
        /// The underlying error message.
        error: String,
    },

    /// The store factory panicked while materializing.
    #[error("store materialization panicked: {info}")]
    MaterializePanicked {
        /// Panic payload rendered as text.
        info: String,
    },
}

impl LifecycleError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use studiovisor::LifecycleError;
    ///
    /// let err = LifecycleError::Materialize { error: "bad config".into() };
    /// assert_eq!(err.as_label(), "lifecycle_materialize_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            LifecycleError::NoRuntime => "lifecycle_no_runtime",
            LifecycleError::Materialize { .. } => "lifecycle_materialize_failed",
            LifecycleError::MaterializePanicked { .. } => "lifecycle_materialize_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            LifecycleError::NoRuntime => "no runtime".to_string(),
            LifecycleError::Materialize { error } => format!("error: {error}"),
            LifecycleError::MaterializePanicked { info } => format!("panic: {info}"),
        }
    }
}

/// # Errors produced by event listeners.
///
/// Reported at the bus boundary; sibling listeners keep running.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ListenerError {
    /// Listener returned an error.
    #[error("listener for '{event}' failed: {error}")]
    Failed {
        /// Event being emitted.
        event: String,
        /// The underlying error message.
        error: String,
    },

    /// Listener panicked.
    #[error("listener for '{event}' panicked: {info}")]
    Panicked {
        /// Event being emitted.
        event: String,
        /// Panic payload rendered as text.
        info: String,
    },

    /// A non-callable value was subscribed (usually a legacy option holding plain data).
    #[error("listener for '{event}' is not callable")]
    NotCallable {
        /// Event being emitted.
        event: String,
    },
}

impl ListenerError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use studiovisor::ListenerError;
    ///
    /// let err = ListenerError::NotCallable { event: "taskLoad".into() };
    /// assert_eq!(err.as_label(), "listener_not_callable");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ListenerError::Failed { .. } => "listener_failed",
            ListenerError::Panicked { .. } => "listener_panicked",
            ListenerError::NotCallable { .. } => "listener_not_callable",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ListenerError::Failed { error, .. } => format!("error: {error}"),
            ListenerError::Panicked { info, .. } => format!("panic: {info}"),
            ListenerError::NotCallable { .. } => "value is not callable".to_string(),
        }
    }

    /// Name of the event whose emission produced this error.
    pub fn event(&self) -> &str {
        match self {
            ListenerError::Failed { event, .. }
            | ListenerError::Panicked { event, .. }
            | ListenerError::NotCallable { event } => event,
        }
    }
}

/// Renders a panic payload as text.
pub(crate) fn panic_info(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_info_extracts_str_and_string() {
        let a: Box<dyn std::any::Any + Send> = Box::new("boom");
        let b: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        let c: Box<dyn std::any::Any + Send> = Box::new(7u32);

        assert_eq!(panic_info(&*a), "boom");
        assert_eq!(panic_info(&*b), "bang");
        assert_eq!(panic_info(&*c), "unknown panic");
    }

    #[test]
    fn test_listener_error_event() {
        let err = ListenerError::Failed {
            event: "submitAnnotation".into(),
            error: "nope".into(),
        };
        assert_eq!(err.event(), "submitAnnotation");
        assert_eq!(err.as_message(), "error: nope");
    }
}
