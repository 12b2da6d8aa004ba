//! Payment confirmation.

use agrimap_core::PaymentSessionId;
use agrimap_storefront::Storefront;
use agrimap_storefront::payment::PaymentState;

use super::CommandError;
use crate::output;

/// Poll a payment session until it settles, printing progress.
///
/// Ctrl-C cancels the poller; no request is sent after that.
pub async fn confirm(storefront: &Storefront, payment_session: &str) -> Result<(), CommandError> {
    let max_attempts = storefront.config().poll.max_attempts;
    let handle = storefront.confirm_payment(PaymentSessionId::new(payment_session));
    let mut states = handle.subscribe();

    loop {
        let state = states.borrow_and_update().clone();
        if let PaymentState::Checking { attempt } = state {
            output::line(&format!(
                "Checking payment status ({attempt}/{max_attempts})..."
            ));
        } else {
            break;
        }

        tokio::select! {
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                handle.cancel();
                break;
            }
        }
    }

    match handle.wait().await? {
        Some(state) => {
            output::payment(&state);
            output::line(&format!("Return to shop: {}", state.recovery_path()));
            Ok(())
        }
        None => Err(CommandError::Interrupted),
    }
}
