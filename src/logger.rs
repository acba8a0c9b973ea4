// MIT License - Copyright (c) 2026 Peter Wright
// Lares4 WebSocket client

//! Logging capability handed to the client.
//!
//! The client never looks a logger up on its own: it uses the one passed to
//! [`Lares4Client::connect_with_logger`](crate::Lares4Client::connect_with_logger),
//! or [`TracingLogger`] when none is given.

/// Four leveled, single-message log methods.
pub trait Logger: Send + Sync {
    fn info(&self, message: &str);
    fn error(&self, message: &str);
    fn warn(&self, message: &str);
    fn debug(&self, message: &str);
}

/// Forwards to `tracing` under the `lares4` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn info(&self, message: &str) {
        tracing::info!(target: "lares4", "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "lares4", "{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "lares4", "{}", message);
    }

    fn debug(&self, message: &str) {
        tracing::debug!(target: "lares4", "{}", message);
    }
}
