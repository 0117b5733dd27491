use crate::domain::account::AccountId;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, WalletError>;

/// Errors surfaced by the wallet core.
///
/// Every expected policy failure has its own variant so callers can react to
/// the specific kind; only `Persistence` represents an unexpected fault.
#[derive(Error, Debug)]
pub enum WalletError {
    #[error("amount must be positive with at most two decimal places")]
    InvalidAmount,

    #[error("cannot transfer funds to your own account")]
    SelfTransferNotAllowed,

    #[error("recipient not found")]
    RecipientNotFound,

    #[error("account {0} not found")]
    AccountNotFound(AccountId),

    #[error("email already registered: {0}")]
    EmailTaken(String),

    #[error("daily transfer limit exceeded: {sent_today} of {limit} already sent")]
    DailyLimitExceeded {
        limit: Decimal,
        sent_today: Decimal,
        remaining: Decimal,
    },

    #[error("insufficient funds")]
    InsufficientFunds,

    #[error("timed out waiting for the account lock")]
    ConcurrencyConflict,

    #[error("storage error: {0}")]
    Persistence(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WalletError {
    /// Stable error kind string reported to callers.
    pub fn kind(&self) -> &'static str {
        match self {
            WalletError::InvalidAmount => "invalid_amount",
            WalletError::SelfTransferNotAllowed => "self_transfer_not_allowed",
            WalletError::RecipientNotFound => "recipient_not_found",
            WalletError::AccountNotFound(_) => "account_not_found",
            WalletError::EmailTaken(_) => "email_taken",
            WalletError::DailyLimitExceeded { .. } => "daily_limit_exceeded",
            WalletError::InsufficientFunds => "insufficient_funds",
            WalletError::ConcurrencyConflict => "concurrency_conflict",
            WalletError::Persistence(_) => "persistence_failure",
            WalletError::Csv(_) | WalletError::Io(_) => "io_error",
        }
    }

    /// Structured detail for the caller-facing failure payload.
    ///
    /// Storage faults are reported generically; the underlying message only
    /// goes to the logs.
    pub fn detail(&self) -> Value {
        match self {
            WalletError::DailyLimitExceeded {
                limit,
                sent_today,
                remaining,
            } => json!({
                "limit": limit,
                "sent_today": sent_today,
                "remaining": remaining,
            }),
            WalletError::Persistence(_) => json!({ "message": "internal storage error" }),
            other => json!({ "message": other.to_string() }),
        }
    }
}

impl From<serde_json::Error> for WalletError {
    fn from(err: serde_json::Error) -> Self {
        WalletError::Persistence(err.to_string())
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for WalletError {
    fn from(err: rocksdb::Error) -> Self {
        WalletError::Persistence(err.to_string())
    }
}
