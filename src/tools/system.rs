//! Process lifecycle: turns termination signals into a shutdown future.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use tokio::signal::unix::{SignalKind, signal};

static RUNNING: AtomicBool = AtomicBool::new(true);

/// Spawns a task which flips [`is_running`] to `false` once SIGINT, SIGTERM or SIGHUP arrives.
pub fn install_termination_listener() {
    tokio::spawn(async move {
        let mut sig_term = signal(SignalKind::terminate()).ok();
        let mut sig_int = signal(SignalKind::interrupt()).ok();
        let mut sig_hup = signal(SignalKind::hangup()).ok();

        let received = tokio::select! {
            Some(_) = async { sig_int.as_mut()?.recv().await } => "SIGINT",
            Some(_) = async { sig_term.as_mut()?.recv().await } => "SIGTERM",
            Some(_) = async { sig_hup.as_mut()?.recv().await } => "SIGHUP",
            else => {
                tracing::warn!("No termination signal could be registered");
                return;
            }
        };

        tracing::info!(signal = received, "Received termination signal. Shutting down...");
        request_shutdown();
    });
}

pub fn request_shutdown() {
    RUNNING.store(false, Ordering::Relaxed);
}

pub fn is_running() -> bool {
    RUNNING.load(Ordering::Relaxed)
}

/// Completes once a shutdown has been requested.
pub async fn await_shutdown() {
    while is_running() {
        tokio::time::sleep(tokio::time::Duration::from_millis(250)).await;
    }
}
