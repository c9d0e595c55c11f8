//! Core error types for the bank sync bridge.
//!
//! Every variant is terminal for the single record it concerns: the pipeline
//! logs it and moves on. HTTP-specific errors are converted to these types by
//! the ledger client implementation.

use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the bridge.
#[derive(Error, Debug)]
pub enum Error {
    /// Policy rejection of a zero amount record; no network call was made.
    #[error("Transactions with zero amount are not accepted (transaction {transaction_id})")]
    ZeroAmountRejected { transaction_id: String },

    /// No ledger account carries a mapping tag for the source account.
    #[error("No ledger account is mapped to source account {0}")]
    AccountMappingNotFound(String),

    /// Several ledger accounts carry the same mapping tag value.
    #[error("Source account {source_account_id} is mapped by several ledger accounts: {}", ledger_account_ids.join(", "))]
    AmbiguousAccountMapping {
        source_account_id: String,
        ledger_account_ids: Vec<String>,
    },

    /// Transport failure or non-success status while talking to the ledger.
    #[error("Ledger API unavailable: {0}")]
    LedgerApiUnavailable(String),

    /// The ledger refused to create the transaction.
    #[error("Failed to create transaction, status code: {status} {body}")]
    SubmissionFailed { status: u16, body: String },

    #[error("Invalid mapping tag: {0}")]
    InvalidMappingTag(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl Error {
    /// Short machine-friendly name of the error kind, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::ZeroAmountRejected { .. } => "zero_amount_rejected",
            Error::AccountMappingNotFound(_) => "account_mapping_not_found",
            Error::AmbiguousAccountMapping { .. } => "ambiguous_account_mapping",
            Error::LedgerApiUnavailable(_) => "ledger_api_unavailable",
            Error::SubmissionFailed { .. } => "submission_failed",
            Error::InvalidMappingTag(_) => "invalid_mapping_tag",
            Error::Unexpected(_) => "unexpected",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_failed_message_carries_status_and_body() {
        let err = Error::SubmissionFailed {
            status: 500,
            body: "{\"message\":\"boom\"}".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to create transaction, status code: 500 {\"message\":\"boom\"}"
        );
        assert_eq!(err.kind(), "submission_failed");
    }

    #[test]
    fn test_ambiguous_mapping_lists_accounts() {
        let err = Error::AmbiguousAccountMapping {
            source_account_id: "acc-1".to_string(),
            ledger_account_ids: vec!["3".to_string(), "7".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Source account acc-1 is mapped by several ledger accounts: 3, 7"
        );
    }
}
