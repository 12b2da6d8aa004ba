//! Payment status confirmation after the provider redirects back.
//!
//! # State machine
//!
//! ```text
//! checking(1) -> checking(2) -> ... -> checking(max) -> timeout
//!      |              |                     |
//!      +--------------+---------------------+--> success | expired | error
//! ```
//!
//! Each attempt is one `GET /api/checkout/status/{id}`. `paid` wins over
//! `expired`; any request failure ends in `error` without retrying. There is
//! no wait after the last attempt.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use agrimap_core::{PaymentSession, PaymentSessionId};

use crate::api::StorefrontApi;
use crate::config::PollConfig;
use crate::error::AppError;

/// Source of delays between polls.
pub trait Clock: Send + Sync + 'static {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Wall-clock delays via `tokio::time`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Where the confirmation page is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentState {
    /// Waiting on status request number `attempt` (1-based).
    Checking { attempt: u32 },
    Success(PaymentSession),
    Expired,
    Timeout,
    Error,
}

impl PaymentState {
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Checking { .. })
    }

    /// Page heading.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::Checking { .. } => "Verifying Payment",
            Self::Success(_) => "Payment Successful!",
            Self::Expired => "Payment Expired",
            Self::Timeout => "Still Processing",
            Self::Error => "Payment Verification Failed",
        }
    }

    /// Body copy shown under the heading.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::Checking { .. } => "Checking payment status...",
            Self::Success(_) => "Thank you for your purchase. Your order has been confirmed.",
            Self::Expired => "Payment session expired. Please try again.",
            Self::Timeout => {
                "Payment status check timed out. Please check your email for confirmation."
            }
            Self::Error => "Error checking payment status. Please try again.",
        }
    }

    /// Every outcome recovers the same way: back to the shop.
    #[must_use]
    pub const fn recovery_path(&self) -> &'static str {
        "/"
    }
}

/// Polls the status endpoint until a terminal state.
pub struct PaymentPoller<A, C = TokioClock> {
    api: A,
    clock: C,
    config: PollConfig,
}

impl<A: StorefrontApi> PaymentPoller<A, TokioClock> {
    #[must_use]
    pub const fn new(api: A, config: PollConfig) -> Self {
        Self::with_clock(api, TokioClock, config)
    }
}

impl<A: StorefrontApi, C: Clock> PaymentPoller<A, C> {
    #[must_use]
    pub const fn with_clock(api: A, clock: C, config: PollConfig) -> Self {
        Self { api, clock, config }
    }

    /// Poll to completion without outside cancellation.
    pub async fn poll(&self, id: &PaymentSessionId) -> PaymentState {
        let (state, _) = watch::channel(PaymentState::Checking { attempt: 1 });
        // An uncancelled token never fires, so the run always settles
        self.run(id, &CancellationToken::new(), &state)
            .await
            .unwrap_or(PaymentState::Error)
    }

    /// Drive the state machine, publishing every transition to `state`.
    ///
    /// Returns `None` when cancelled; no request is issued after that.
    #[instrument(skip(self, cancel, state), fields(payment_session = %id))]
    pub async fn run(
        &self,
        id: &PaymentSessionId,
        cancel: &CancellationToken,
        state: &watch::Sender<PaymentState>,
    ) -> Option<PaymentState> {
        let max_attempts = self.config.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            state.send_replace(PaymentState::Checking { attempt });

            let response = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!(attempt, "Payment polling cancelled");
                    return None;
                }
                response = self.api.checkout_status(id) => response,
            };

            let session = match response {
                Ok(session) => session,
                Err(e) => {
                    AppError::from(e).report();
                    return Some(settle(state, PaymentState::Error));
                }
            };

            if session.is_paid() {
                return Some(settle(state, PaymentState::Success(session)));
            }
            if session.is_expired() {
                return Some(settle(state, PaymentState::Expired));
            }

            debug!(
                attempt,
                payment_status = %session.payment_status,
                status = %session.status,
                "Payment not settled yet"
            );

            if attempt < max_attempts {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => {
                        debug!(attempt, "Payment polling cancelled");
                        return None;
                    }
                    () = self.clock.sleep(self.config.interval) => {}
                }
            }
        }

        Some(settle(state, PaymentState::Timeout))
    }
}

impl<A, C> PaymentPoller<A, C>
where
    A: StorefrontApi + 'static,
    C: Clock,
{
    /// Run on a background task. Dropping the handle does not stop it; call
    /// [`PollHandle::cancel`].
    #[must_use]
    pub fn spawn(self, id: PaymentSessionId) -> PollHandle {
        let (tx, rx) = watch::channel(PaymentState::Checking { attempt: 1 });
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let task = tokio::spawn(async move { self.run(&id, &token, &tx).await });

        PollHandle {
            state: rx,
            cancel,
            task,
        }
    }
}

fn settle(state: &watch::Sender<PaymentState>, terminal: PaymentState) -> PaymentState {
    tracing::info!(outcome = terminal.title(), "Payment polling finished");
    state.send_replace(terminal.clone());
    terminal
}

/// Handle to a spawned poller.
pub struct PollHandle {
    state: watch::Receiver<PaymentState>,
    cancel: CancellationToken,
    task: JoinHandle<Option<PaymentState>>,
}

impl PollHandle {
    /// Latest published state.
    #[must_use]
    pub fn current(&self) -> PaymentState {
        self.state.borrow().clone()
    }

    /// Receiver for state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PaymentState> {
        self.state.clone()
    }

    /// Stop polling (e.g. the page was left).
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the task; `None` if it was cancelled.
    ///
    /// # Errors
    ///
    /// Returns error if the task panicked.
    pub async fn wait(self) -> Result<Option<PaymentState>, AppError> {
        self.task
            .await
            .map_err(|e| AppError::Internal(format!("payment poller task failed: {e}")))
    }
}
