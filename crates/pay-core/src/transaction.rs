//! # Financial Transactions
//!
//! The transaction record owned by the payment workflow, the immutable
//! snapshot handed to plugins, and the outcome a plugin hands back.
//!
//! Plugins never mutate a transaction. They read a `TransactionSnapshot` and
//! return a `TransactionOutcome`; the caller applies it with
//! `FinancialTransaction::apply`.

use crate::error::{ActionRequired, FinancialError, PluginError};
use crate::extended_data::ExtendedData;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Response code recorded on success
pub const RESPONSE_CODE_SUCCESS: &str = "success";
/// Reason code recorded on success
pub const REASON_CODE_SUCCESS: &str = "none";
/// Response code recorded on a classified failure
pub const RESPONSE_CODE_FAILED: &str = "FAILED";
/// Maximum length (in characters) of a reason code
pub const REASON_CODE_MAX_LEN: usize = 100;

/// State of a financial transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionState {
    New,
    Pending,
    Success,
    Failed,
}

impl Default for TransactionState {
    fn default() -> Self {
        TransactionState::New
    }
}

/// One attempt to move money against a payment instruction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialTransaction {
    pub id: String,

    #[serde(default)]
    pub state: TransactionState,

    /// Requested amount, major currency units
    pub target_amount: Decimal,

    /// Lowercase ISO 4217 code of the payment instruction
    pub currency: String,

    /// Amount settled by the gateway, major currency units
    #[serde(default)]
    pub processed_amount: Decimal,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_code: Option<String>,

    /// Gateway-assigned id (charge, payment intent or refund)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_number: Option<String>,

    /// Id of the payment or credit this transaction belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_id: Option<String>,

    /// Id of the owning payment (deposits) or credit (refunds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,

    #[serde(default)]
    pub extended_data: ExtendedData,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl FinancialTransaction {
    /// Create a new transaction in state `NEW`
    pub fn new(target_amount: Decimal, currency: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            state: TransactionState::New,
            target_amount,
            currency: currency.into().to_lowercase(),
            processed_amount: Decimal::ZERO,
            response_code: None,
            reason_code: None,
            reference_number: None,
            tracking_id: None,
            source_id: None,
            extended_data: ExtendedData::new(),
            updated_at: None,
        }
    }

    /// Builder: set the extended data
    pub fn with_extended_data(mut self, data: ExtendedData) -> Self {
        self.extended_data = data;
        self
    }

    /// Builder: set the owning payment/credit id
    pub fn with_source_id(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self
    }

    /// Builder: set the state
    pub fn with_state(mut self, state: TransactionState) -> Self {
        self.state = state;
        self
    }

    /// Builder: set the gateway reference
    pub fn with_reference_number(mut self, reference: impl Into<String>) -> Self {
        self.reference_number = Some(reference.into());
        self
    }

    /// Immutable view handed to a plugin
    pub fn snapshot(&self) -> TransactionSnapshot {
        TransactionSnapshot {
            state: self.state,
            target_amount: self.target_amount,
            currency: self.currency.clone(),
            reference_number: self.reference_number.clone(),
            source_id: self.source_id.clone(),
            extended_data: self.extended_data.clone(),
        }
    }

    /// Apply a plugin outcome.
    ///
    /// The patch is always applied before the disposition is surfaced, so a
    /// failed transaction is already `FAILED` when the error reaches the
    /// caller.
    pub fn apply(&mut self, outcome: TransactionOutcome) -> Result<(), PluginError> {
        let TransactionOutcome { patch, disposition } = outcome;
        self.apply_patch(patch);

        match disposition {
            Disposition::Approved => Ok(()),
            Disposition::ActionRequired(signal) => Err(PluginError::ActionRequired(signal)),
            Disposition::Failed(error) => Err(PluginError::Financial(error)),
        }
    }

    fn apply_patch(&mut self, patch: TransactionPatch) {
        if let Some(state) = patch.state {
            self.state = state;
        }
        if let Some(amount) = patch.processed_amount {
            self.processed_amount = amount;
        }
        if patch.response_code.is_some() {
            self.response_code = patch.response_code;
        }
        if patch.reason_code.is_some() {
            self.reason_code = patch.reason_code;
        }
        if patch.reference_number.is_some() {
            self.reference_number = patch.reference_number;
        }
        if patch.tracking_id.is_some() {
            self.tracking_id = patch.tracking_id;
        }
        match patch.data {
            DataPatch::Merge(data) => self.extended_data.merge(data),
            DataPatch::Replace(data) => self.extended_data = data,
        }
        self.updated_at = Some(Utc::now());
    }
}

/// Transaction fields a plugin is allowed to read
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionSnapshot {
    pub state: TransactionState,
    pub target_amount: Decimal,
    pub currency: String,
    pub reference_number: Option<String>,
    pub source_id: Option<String>,
    pub extended_data: ExtendedData,
}

/// Extended data change carried by a patch
#[derive(Debug, Clone, PartialEq)]
pub enum DataPatch {
    /// Set every field present in the bag, keep the rest
    Merge(ExtendedData),
    /// Discard the current bag entirely
    Replace(ExtendedData),
}

impl Default for DataPatch {
    fn default() -> Self {
        DataPatch::Merge(ExtendedData::new())
    }
}

impl DataPatch {
    /// Mutable access to the bag being merged or installed
    pub fn data_mut(&mut self) -> &mut ExtendedData {
        match self {
            DataPatch::Merge(data) | DataPatch::Replace(data) => data,
        }
    }
}

/// Field writes produced by one plugin call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionPatch {
    pub state: Option<TransactionState>,
    pub processed_amount: Option<Decimal>,
    pub response_code: Option<String>,
    pub reason_code: Option<String>,
    pub reference_number: Option<String>,
    pub tracking_id: Option<String>,
    pub data: DataPatch,
}

impl TransactionPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a settled amount with the success codes
    pub fn succeed(&mut self, processed_amount: Decimal, reference_number: Option<String>) {
        self.state = Some(TransactionState::Success);
        self.processed_amount = Some(processed_amount);
        self.response_code = Some(RESPONSE_CODE_SUCCESS.to_string());
        self.reason_code = Some(REASON_CODE_SUCCESS.to_string());
        if reference_number.is_some() {
            self.reference_number = reference_number;
        }
    }

    /// Record a classified failure
    pub fn fail(&mut self, reason_code: impl Into<String>) {
        self.state = Some(TransactionState::Failed);
        self.response_code = Some(RESPONSE_CODE_FAILED.to_string());
        self.reason_code = Some(reason_code.into());
    }
}

/// Terminal disposition of one plugin call
#[derive(Debug, Clone, PartialEq)]
pub enum Disposition {
    Approved,
    ActionRequired(ActionRequired),
    Failed(FinancialError),
}

/// What a plugin hands back to the workflow
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionOutcome {
    pub patch: TransactionPatch,
    pub disposition: Disposition,
}

impl TransactionOutcome {
    pub fn approved(patch: TransactionPatch) -> Self {
        Self {
            patch,
            disposition: Disposition::Approved,
        }
    }

    pub fn action_required(patch: TransactionPatch, signal: ActionRequired) -> Self {
        Self {
            patch,
            disposition: Disposition::ActionRequired(signal),
        }
    }

    pub fn failed(patch: TransactionPatch, error: FinancialError) -> Self {
        Self {
            patch,
            disposition: Disposition::Failed(error),
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self.disposition, Disposition::Approved)
    }
}

/// Truncate a gateway message to a reason code
pub fn truncate_reason(message: &str) -> String {
    message.chars().take(REASON_CODE_MAX_LEN).collect()
}
