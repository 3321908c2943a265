//! Instrumentation client
//!
//! Call [`DebugBreak::here`] or [`DebugBreak::here_async`] to pause until a
//! controller resumes the breakpoint over MCP.
//!
//! ```rust,ignore
//! use mcpdebugger::client::{DebugBreak, DebugBreakConfig};
//!
//! let debug = DebugBreak::new(DebugBreakConfig::default());
//! debug.here();                // blocks this thread
//! debug.here_async().await;    // suspends this task
//! ```
//!
//! Failing to reach the debug server is never fatal: it is logged and the
//! program carries on without pausing.

pub mod capture;

use std::future::Future;
use std::panic::Location;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

use crate::breakpoints::BreakpointContext;
use crate::config::{local_url, DEFAULT_PORT};

/// Instrumentation settings
#[derive(Debug, Clone)]
pub struct DebugBreakConfig {
    /// Base URL of the debug server
    pub server_url: String,
    /// Whether breakpoints pause at all
    pub enabled: bool,
}

impl Default for DebugBreakConfig {
    fn default() -> Self {
        Self {
            server_url: local_url(DEFAULT_PORT),
            enabled: true,
        }
    }
}

/// What happened at a breakpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseOutcome {
    /// Paused and was resumed by the controller
    Resumed,
    /// Breakpoints are disabled
    Skipped,
    /// Could not pause; execution continued
    Failed,
}

/// Reasons a pause could not happen
#[derive(Error, Debug)]
pub enum PauseError {
    #[error("Failed to connect to server: {0}")]
    Connection(#[from] reqwest::Error),

    #[error("Server rejected breakpoint: {0}")]
    Status(reqwest::StatusCode),

    #[error("Failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("Breakpoint thread panicked")]
    Thread,
}

/// Cooperative breakpoint handle
pub struct DebugBreak {
    http: reqwest::Client,
    server_url: String,
    enabled: AtomicBool,
}

impl DebugBreak {
    pub fn new(config: DebugBreakConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            server_url: config.server_url.trim_end_matches('/').to_string(),
            enabled: AtomicBool::new(config.enabled),
        }
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Relaxed);
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Blocking breakpoint - parks the current thread until resumed
    ///
    /// Safe to call from inside an async runtime, though that blocks a worker
    /// thread; prefer [`DebugBreak::here_async`] there.
    #[track_caller]
    pub fn here(&self) -> PauseOutcome {
        if !self.is_enabled() {
            return PauseOutcome::Skipped;
        }

        let context = capture::capture_context(Location::caller());
        let result = if tokio::runtime::Handle::try_current().is_ok() {
            // A runtime cannot be blocked on from inside another one
            std::thread::scope(|scope| {
                scope
                    .spawn(|| self.pause_blocking(context))
                    .join()
                    .unwrap_or(Err(PauseError::Thread))
            })
        } else {
            self.pause_blocking(context)
        };

        self.finish(result)
    }

    /// Async breakpoint - suspends the calling task without holding a thread
    #[track_caller]
    pub fn here_async(&self) -> impl Future<Output = PauseOutcome> + '_ {
        // Capture synchronously so the location is the caller's
        let location = Location::caller();
        let context = self
            .is_enabled()
            .then(|| capture::capture_context(location));

        async move {
            match context {
                Some(context) => {
                    let result = send_break(&self.http, &self.server_url, &context).await;
                    self.finish(result)
                }
                None => PauseOutcome::Skipped,
            }
        }
    }

    /// Pause with an explicit context instead of capturing one
    pub async fn pause_with(&self, context: BreakpointContext) -> PauseOutcome {
        if !self.is_enabled() {
            return PauseOutcome::Skipped;
        }
        let result = send_break(&self.http, &self.server_url, &context).await;
        self.finish(result)
    }

    fn pause_blocking(&self, context: BreakpointContext) -> Result<(), PauseError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        // Connections pooled by one runtime do not outlive it
        let http = reqwest::Client::new();
        runtime.block_on(send_break(&http, &self.server_url, &context))
    }

    fn finish(&self, result: Result<(), PauseError>) -> PauseOutcome {
        match result {
            Ok(()) => PauseOutcome::Resumed,
            Err(e) => {
                tracing::warn!(server = %self.server_url, "[DebugBreak] {}", e);
                PauseOutcome::Failed
            }
        }
    }
}

/// Post the context to `/break` and wait for the response
async fn send_break(
    http: &reqwest::Client,
    server_url: &str,
    context: &BreakpointContext,
) -> Result<(), PauseError> {
    tracing::debug!(id = %context.id, "Pausing at {}", context.location_label());

    let response = http
        .post(format!("{}/break", server_url))
        .json(context)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(PauseError::Status(response.status()));
    }
    Ok(())
}
