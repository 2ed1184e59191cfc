//! Response classification shared by both checkout flows.

use crate::gateway::GatewayResponse;
use pay_core::{
    truncate_reason, DataPatch, ErrorKind, ExtendedData, FinancialError, PaymentResult,
    TransactionOutcome, TransactionPatch, TransactionSnapshot,
};
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{info, warn};

const MINOR_UNITS_PER_MAJOR: i64 = 100;

pub(crate) const MISSING_AMOUNT: &str = "Gateway reported success without an amount";
const INVALID_RESPONSE_KIND: &str = "invalid_response";

/// `amount / 100` of a successful response
pub(crate) fn processed_amount(response: &GatewayResponse) -> Option<Decimal> {
    response
        .amount()
        .map(|amount| amount / Decimal::from(MINOR_UNITS_PER_MAJOR))
}

/// Turn a failed response into a classified failure.
///
/// `error.type` is recorded on the error but every type gets the same
/// treatment: response code `FAILED`, message truncated into the reason code,
/// state `FAILED`.
pub(crate) fn failure(
    response: &GatewayResponse,
    transaction: &TransactionSnapshot,
    patch: TransactionPatch,
) -> TransactionOutcome {
    fail(
        response.message().unwrap_or_default().to_string(),
        ErrorKind::from_type(response.error_type()),
        response.error(),
        transaction,
        patch,
    )
}

/// A success without an amount cannot settle. It fails like a declined
/// payment, keeping whatever metadata the patch already carries.
pub(crate) fn malformed(
    response: &GatewayResponse,
    transaction: &TransactionSnapshot,
    patch: TransactionPatch,
) -> TransactionOutcome {
    warn!(
        "{} for transaction \"{}\".",
        MISSING_AMOUNT,
        response.transaction_reference().unwrap_or_default()
    );

    fail(
        MISSING_AMOUNT.to_string(),
        ErrorKind::Other(INVALID_RESPONSE_KIND.to_string()),
        Value::Null,
        transaction,
        patch,
    )
}

fn fail(
    message: String,
    kind: ErrorKind,
    error: Value,
    transaction: &TransactionSnapshot,
    mut patch: TransactionPatch,
) -> TransactionOutcome {
    let reason_code = truncate_reason(&message);
    patch.fail(reason_code.clone());

    let error = FinancialError {
        kind,
        error,
        reason_code,
        tracking_id: patch
            .tracking_id
            .clone()
            .or_else(|| transaction.source_id.clone()),
        reference_number: patch
            .reference_number
            .clone()
            .or_else(|| transaction.reference_number.clone()),
        message,
    };

    TransactionOutcome::failed(patch, error)
}

/// Classify a refund response. Identical for both flows.
///
/// On success the transaction's extended data is replaced by a bag holding
/// only the raw response under `stripe_response`.
pub(crate) fn credit_outcome(
    response: &GatewayResponse,
    transaction: &TransactionSnapshot,
    mut patch: TransactionPatch,
    logging: bool,
) -> PaymentResult<TransactionOutcome> {
    if response.is_successful() {
        let Some(amount) = processed_amount(response) else {
            return Ok(malformed(response, transaction, patch));
        };
        let reference = response.transaction_reference().map(String::from);

        let mut replacement = ExtendedData::new();
        replacement.stripe_response = Some(response.raw());

        patch.succeed(amount, reference.clone());
        patch.data = DataPatch::Replace(replacement);

        if logging {
            info!(
                "Refund is successful for transaction \"{}\".",
                reference.as_deref().unwrap_or_default()
            );
        }

        return Ok(TransactionOutcome::approved(patch));
    }

    if logging {
        info!(
            "Refund failed for transaction \"{}\" with message: {}.",
            response.transaction_reference().unwrap_or_default(),
            response.message().unwrap_or_default()
        );
    }

    Ok(failure(response, transaction, patch))
}

/// Log the serialized request and response payloads
pub(crate) fn log_exchange(response: &GatewayResponse) {
    let request = response
        .request_data()
        .map(|request| request.to_string())
        .unwrap_or_else(|| "null".to_string());
    info!("{}", request);
    info!("{}", response.raw());
}
