// Abort Token for waiting loops

use crate::error::{AuroraXError, Result};
use crate::port::Sleeper;
use std::time::Duration;
use tokio::sync::watch;

/// Abort signal observed by `wait` and `cancel(wait = true)`
#[derive(Debug, Clone)]
pub struct AbortToken {
    rx: Option<watch::Receiver<bool>>,
}

impl AbortToken {
    /// Token that never fires
    pub fn never() -> Self {
        Self { rx: None }
    }

    /// Check if abort was requested
    pub fn is_aborted(&self) -> bool {
        self.rx.as_ref().map(|rx| *rx.borrow()).unwrap_or(false)
    }

    /// Wait for abort signal
    ///
    /// Pends forever if the handle is dropped without aborting.
    pub async fn wait(&mut self) {
        match self.rx.as_mut() {
            Some(rx) => {
                while !*rx.borrow() {
                    if rx.changed().await.is_err() {
                        std::future::pending::<()>().await;
                    }
                }
            }
            None => std::future::pending::<()>().await,
        }
    }
}

impl Default for AbortToken {
    fn default() -> Self {
        Self::never()
    }
}

/// Abort sender
pub struct AbortHandle {
    tx: watch::Sender<bool>,
}

impl AbortHandle {
    /// Signal abort to every waiting loop holding a token
    pub fn abort(&self) {
        let _ = self.tx.send(true);
    }
}

/// Create an abort channel
pub fn abort_channel() -> (AbortHandle, AbortToken) {
    let (tx, rx) = watch::channel(false);
    (AbortHandle { tx }, AbortToken { rx: Some(rx) })
}

/// Sleep for `duration` unless the token fires first
pub async fn sleep_or_abort(sleeper: &dyn Sleeper, duration: Duration, abort: &AbortToken) -> Result<()> {
    if abort.is_aborted() {
        return Err(AuroraXError::Aborted);
    }
    let mut token = abort.clone();
    tokio::select! {
        _ = sleeper.sleep(duration) => Ok(()),
        _ = token.wait() => Err(AuroraXError::Aborted),
    }
}
