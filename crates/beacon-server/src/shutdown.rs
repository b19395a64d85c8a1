//! Shutdown signalling.
//!
//! [`ShutdownSignal`] is the trigger the lifecycle hands to the serve loop:
//! once fired, the loop stops accepting and drains in-flight calls. The same
//! type, built with [`ShutdownSignal::with_os_signals`], lets a binary wait for
//! SIGINT/SIGTERM.
//!
//! # Example
//!
//! ```rust,ignore
//! use beacon_server::ShutdownSignal;
//!
//! let os = ShutdownSignal::with_os_signals();
//! os.recv().await;
//! server.stop(Duration::from_secs(10)).await?;
//! ```

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

/// One-shot stop request shared between the lifecycle and its serve loop.
///
/// Clones share state: triggering any clone wakes every receiver.
///
/// # Example
///
/// ```rust
/// use beacon_server::ShutdownSignal;
///
/// let shutdown = ShutdownSignal::new();
/// let observer = shutdown.clone();
///
/// shutdown.trigger();
/// assert!(observer.is_shutdown());
/// ```
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    sender: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    /// Creates a new, untriggered signal.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Triggers the signal. Idempotent.
    ///
    /// Returns `true` only for the call that actually fired it.
    pub fn trigger(&self) -> bool {
        self.sender.send_if_modified(|triggered| {
            if *triggered {
                false
            } else {
                *triggered = true;
                true
            }
        })
    }

    /// Whether the signal has fired.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        *self.sender.borrow()
    }

    /// Future resolving once the signal fires.
    ///
    /// Completes immediately if the signal already fired. Never completes if
    /// every clone of the signal is dropped without triggering.
    pub fn recv(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut receiver = self.sender.subscribe();
        async move {
            if receiver.wait_for(|triggered| *triggered).await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    /// Creates a signal that fires on SIGTERM or SIGINT (Ctrl+C).
    ///
    /// Must be called from within a tokio runtime. If the handlers cannot be
    /// installed the failure is logged and the signal never fires on its own.
    #[must_use]
    pub fn with_os_signals() -> Self {
        let signal = Self::new();

        let trigger = signal.clone();
        tokio::spawn(async move {
            match wait_for_os_signal().await {
                Ok(name) => {
                    tracing::info!(signal = name, "Stop requested by OS signal");
                    trigger.trigger();
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install OS signal handlers");
                }
            }
        });

        signal
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
async fn wait_for_os_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    let name = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(name)
}

#[cfg(not(unix))]
async fn wait_for_os_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("ctrl-c")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_starts_untriggered() {
        assert!(!ShutdownSignal::default().is_shutdown());
    }

    #[test]
    fn test_trigger_reports_first_call_only() {
        let signal = ShutdownSignal::new();
        assert!(signal.trigger());
        assert!(!signal.trigger());
        assert!(signal.is_shutdown());
    }

    #[test]
    fn test_clones_share_state() {
        let lifecycle = ShutdownSignal::new();
        let serve_loop = lifecycle.clone();

        lifecycle.trigger();
        assert!(serve_loop.is_shutdown());
    }

    #[tokio::test]
    async fn test_recv_completes_when_triggered() {
        let signal = ShutdownSignal::new();
        let receiver = signal.recv();

        tokio::spawn({
            let signal = signal.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                signal.trigger();
            }
        });

        tokio::time::timeout(Duration::from_secs(1), receiver)
            .await
            .expect("recv should complete");
    }

    #[test]
    fn test_recv_ready_if_already_triggered() {
        let signal = ShutdownSignal::new();
        signal.trigger();

        let mut receiver = tokio_test::task::spawn(signal.recv());
        tokio_test::assert_ready!(receiver.poll());
    }

    #[test]
    fn test_recv_pending_until_triggered() {
        let signal = ShutdownSignal::new();

        let mut receiver = tokio_test::task::spawn(signal.recv());
        tokio_test::assert_pending!(receiver.poll());

        signal.trigger();
        assert!(receiver.is_woken());
        tokio_test::assert_ready!(receiver.poll());
    }

    #[tokio::test]
    async fn test_with_os_signals_starts_untriggered() {
        let signal = ShutdownSignal::with_os_signals();
        assert!(!signal.is_shutdown());
    }
}
