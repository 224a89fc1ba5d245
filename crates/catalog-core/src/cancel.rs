//! Caller-supplied cancellation for network calls.
//!
//! A [`Cancel`] combines an explicit trigger (a [`CancelHandle`]) and an
//! optional deadline. Wrapping a call with [`Cancel::guard`] turns either one
//! into [`Error::Cancelled`] instead of letting the wait run on.

use std::future::{pending, Future};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{sleep_until, Instant};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct Cancel {
    signal: Option<watch::Receiver<bool>>,
    deadline: Option<Instant>,
}

/// Trigger side of a [`Cancel`]; cancels every clone of its token.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl Cancel {
    /// A token that never fires.
    pub fn never() -> Self {
        Self::default()
    }

    pub fn pair() -> (CancelHandle, Cancel) {
        let (tx, rx) = watch::channel(false);
        (CancelHandle { tx }, Cancel { signal: Some(rx), deadline: None })
    }

    /// Add a deadline `timeout` from now; an earlier existing deadline wins.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let at = Instant::now() + timeout;
        self.deadline = Some(self.deadline.map_or(at, |d| d.min(at)));
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.reason().is_some()
    }

    fn reason(&self) -> Option<&'static str> {
        if self.signal.as_ref().is_some_and(|rx| *rx.borrow()) {
            return Some("cancelled by caller");
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Some("deadline elapsed");
        }
        None
    }

    async fn fired(&self) -> &'static str {
        let signal = async {
            match &self.signal {
                Some(rx) => {
                    let mut rx = rx.clone();
                    loop {
                        let fired = *rx.borrow_and_update();
                        if fired {
                            return;
                        }
                        if rx.changed().await.is_err() {
                            // handle dropped without cancelling
                            pending::<()>().await;
                        }
                    }
                }
                None => pending::<()>().await,
            }
        };
        let deadline = async {
            match self.deadline {
                Some(at) => sleep_until(at).await,
                None => pending::<()>().await,
            }
        };
        tokio::select! {
            () = signal => "cancelled by caller",
            () = deadline => "deadline elapsed",
        }
    }

    /// Run `fut` unless this token fires first.
    pub async fn guard<F, T>(&self, what: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if let Some(reason) = self.reason() {
            return Err(Error::Cancelled(format!("{what}: {reason}")));
        }
        tokio::select! {
            biased;
            reason = self.fired() => Err(Error::Cancelled(format!("{what}: {reason}"))),
            res = fut => res,
        }
    }
}
