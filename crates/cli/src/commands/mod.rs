//! Subcommand implementations.

pub mod cart;
pub mod catalog;
pub mod page;
pub mod payment;

use thiserror::Error;

use agrimap_storefront::AppError;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Storefront flow failed (already shown as a notice).
    #[error(transparent)]
    Storefront(#[from] AppError),

    /// Page URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Interrupted before the flow finished.
    #[error("Interrupted")]
    Interrupted,
}
