//! # pay-core
//!
//! Core types and traits for the Stripe payment bundle.
//!
//! This crate provides:
//! - `FinancialTransaction`, `TransactionSnapshot` and `TransactionOutcome`
//!   for the transaction lifecycle
//! - `ExtendedData`, the typed parameter/metadata bag
//! - `PaymentPlugin` trait and `PluginRegistry` for gateway plugins
//! - `PluginController` to run a transaction through the matching plugin
//! - `PaymentError`, `FinancialError` and `ActionRequired`
//!
//! ## Example
//!
//! ```rust,ignore
//! use pay_core::{ExtendedData, FinancialTransaction, PluginController, PluginError};
//! use rust_decimal_macros::dec;
//!
//! let mut tx = FinancialTransaction::new(dec!(10.00), "usd")
//!     .with_extended_data(ExtendedData::new().with_token("tok_visa"));
//!
//! match controller.approve_and_deposit("stripe_checkout", &mut tx, false).await {
//!     Ok(()) => println!("settled {}", tx.processed_amount),
//!     Err(PluginError::ActionRequired(signal)) => prompt_user(signal.client_secret),
//!     Err(err) => eprintln!("payment failed: {}", err),
//! }
//! ```

pub mod controller;
pub mod error;
pub mod extended_data;
pub mod plugin;
pub mod transaction;

// Re-exports for convenience
pub use controller::PluginController;
pub use error::{
    ActionRequired, ErrorKind, FinancialError, PaymentError, PaymentResult, PluginError,
};
pub use extended_data::ExtendedData;
pub use plugin::{BoxedPaymentPlugin, PaymentPlugin, PluginRegistry};
pub use transaction::{
    truncate_reason, DataPatch, Disposition, FinancialTransaction, TransactionOutcome,
    TransactionPatch, TransactionSnapshot, TransactionState, REASON_CODE_MAX_LEN,
    REASON_CODE_SUCCESS, RESPONSE_CODE_FAILED, RESPONSE_CODE_SUCCESS,
};
