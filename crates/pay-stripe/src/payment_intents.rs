//! # Stripe Checkout (Payment Intents API)
//!
//! A purchase creates a payment intent. The intent either succeeds, fails,
//! or asks the front-end SDK to take over (3-D Secure and friends). In the
//! last case the workflow parks the transaction as `PENDING`; the next
//! `approve_and_deposit` confirms the intent instead of purchasing again.

use crate::config::{StripeConfig, DEFAULT_PROCESSES_TYPE};
use crate::gateway::{
    expandable_id, BoxedStripeGateway, ConfirmRequest, GatewayResponse, PurchaseRequest,
    RefundRequest,
};
use crate::outcome::{credit_outcome, failure, log_exchange, malformed, processed_amount};
use async_trait::async_trait;
use pay_core::{
    ActionRequired, PaymentError, PaymentPlugin, PaymentResult, TransactionOutcome,
    TransactionPatch, TransactionSnapshot, TransactionState,
};
use tracing::{debug, info, instrument};

/// Plugin for the Stripe Payment Intents API
pub struct CheckoutPaymentIntentsPlugin {
    gateway: BoxedStripeGateway,
    processes_type: String,
    logging: bool,
}

impl CheckoutPaymentIntentsPlugin {
    pub fn new(gateway: BoxedStripeGateway) -> Self {
        Self {
            gateway,
            processes_type: DEFAULT_PROCESSES_TYPE.to_string(),
            logging: true,
        }
    }

    /// Create from an instance configuration
    pub fn from_config(config: &StripeConfig, gateway: BoxedStripeGateway) -> Self {
        Self::new(gateway)
            .with_processes_type(config.processes_type.clone())
            .with_logging(config.logging)
    }

    /// Builder: set the payment method name this plugin processes
    pub fn with_processes_type(mut self, processes_type: impl Into<String>) -> Self {
        self.processes_type = processes_type.into();
        self
    }

    /// Builder: enable or disable payload logging
    pub fn with_logging(mut self, logging: bool) -> Self {
        self.logging = logging;
        self
    }

    pub fn processes_type(&self) -> &str {
        &self.processes_type
    }

    pub(crate) fn purchase_request(transaction: &TransactionSnapshot) -> PaymentResult<PurchaseRequest> {
        let data = &transaction.extended_data;
        let token = data.token.clone().ok_or_else(|| {
            PaymentError::InvalidRequest("extended data has no token".to_string())
        })?;

        Ok(PurchaseRequest {
            amount: transaction.target_amount,
            currency: transaction.currency.clone(),
            description: data.description.clone(),
            token,
            payment_method: data.payment_method.clone(),
            confirm: data.confirm,
            return_url: data.return_url.clone(),
            destination: data.destination.clone(),
            receipt_email: data.receipt_email.clone(),
            statement_descriptor: data.statement_descriptor.clone(),
            application_fee: data.application_fee,
            stripe_version: data.stripe_version.clone(),
            connected_stripe_account_header: data.connected_stripe_account_header.clone(),
            metadata: data.metadata.clone(),
        })
    }

    pub(crate) fn confirm_request(transaction: &TransactionSnapshot) -> PaymentResult<ConfirmRequest> {
        let data = &transaction.extended_data;
        let payment_intent_reference = transaction.reference_number.clone().ok_or_else(|| {
            PaymentError::InvalidRequest(
                "pending transaction has no payment intent reference".to_string(),
            )
        })?;

        Ok(ConfirmRequest {
            payment_intent_reference,
            stripe_version: data.stripe_version.clone(),
            connected_stripe_account_header: data.connected_stripe_account_header.clone(),
        })
    }

    pub(crate) fn refund_request(transaction: &TransactionSnapshot) -> PaymentResult<RefundRequest> {
        let data = &transaction.extended_data;
        let transaction_reference = data.charge_id.clone().ok_or_else(|| {
            PaymentError::InvalidRequest("extended data has no charge_id".to_string())
        })?;

        Ok(RefundRequest {
            amount: transaction.target_amount,
            currency: transaction.currency.clone(),
            transaction_reference,
            refund_application_fee: data.refund_application_fee.unwrap_or(true),
            token: None,
            stripe_version: data.stripe_version.clone(),
            connected_stripe_account_header: data.connected_stripe_account_header.clone(),
            metadata: data.metadata.clone(),
        })
    }

    /// Intent id, plus the ids of the first charge attached to the intent
    fn capture_metadata(response: &GatewayResponse, patch: &mut TransactionPatch) {
        let data = patch.data.data_mut();

        if response.has("id") {
            data.payment_intent_id = response.payment_intent_reference().map(String::from);
        }

        let Some(charge) = response.first_charge() else {
            return;
        };
        let field = |key: &str| charge.get(key).and_then(expandable_id).map(String::from);

        if charge.contains_key("id") {
            data.charge_id = field("id");
        }
        if charge.contains_key("balance_transaction") {
            data.balance_transaction_id = field("balance_transaction");
        }
        if charge.contains_key("application_fee") {
            data.application_fee_id = field("application_fee");
        }
    }

    fn classify(
        &self,
        response: &GatewayResponse,
        transaction: &TransactionSnapshot,
        mut patch: TransactionPatch,
    ) -> PaymentResult<TransactionOutcome> {
        Self::capture_metadata(response, &mut patch);

        let reference = response.payment_intent_reference().unwrap_or_default();

        if response.is_successful() {
            let Some(amount) = processed_amount(response) else {
                return Ok(malformed(response, transaction, patch));
            };
            patch.succeed(amount, Some(reference.to_string()));

            if self.logging {
                info!("Payment is successful for transaction \"{}\".", reference);
            }

            return Ok(TransactionOutcome::approved(patch));
        }

        if response.is_action_required() {
            let client_secret = response.client_secret().map(String::from);
            patch.reference_number = Some(reference.to_string());
            patch.data.data_mut().client_secret = client_secret.clone();

            let signal = ActionRequired {
                reference_number: reference.to_string(),
                client_secret,
            };
            return Ok(TransactionOutcome::action_required(patch, signal));
        }

        if self.logging {
            info!(
                "Payment failed for transaction \"{}\" with message: {}.",
                reference,
                response.message().unwrap_or_default()
            );
        }

        Ok(failure(response, transaction, patch))
    }
}

#[async_trait]
impl PaymentPlugin for CheckoutPaymentIntentsPlugin {
    fn processes(&self, method: &str) -> bool {
        method == self.processes_type
    }

    #[instrument(skip(self, transaction), fields(processes_type = %self.processes_type))]
    async fn approve_and_deposit(
        &self,
        transaction: &TransactionSnapshot,
        _retry: bool,
    ) -> PaymentResult<TransactionOutcome> {
        let mut patch = TransactionPatch::new();

        let response = if transaction.state == TransactionState::Pending {
            let request = Self::confirm_request(transaction)?;
            debug!("confirming payment intent {}", request.payment_intent_reference);
            self.gateway.confirm(&request).await?.with_request(&request)
        } else {
            let request = Self::purchase_request(transaction)?;
            patch.tracking_id = transaction.source_id.clone();
            self.gateway.purchase(&request).await?.with_request(&request)
        };

        if self.logging {
            log_exchange(&response);
        }

        self.classify(&response, transaction, patch)
    }

    #[instrument(skip(self, transaction), fields(processes_type = %self.processes_type))]
    async fn credit(
        &self,
        transaction: &TransactionSnapshot,
        _retry: bool,
    ) -> PaymentResult<TransactionOutcome> {
        let request = Self::refund_request(transaction)?;
        let response = self.gateway.refund(&request).await?.with_request(&request);

        if self.logging {
            log_exchange(&response);
        }

        let patch = TransactionPatch {
            tracking_id: transaction.source_id.clone(),
            ..Default::default()
        };

        credit_outcome(&response, transaction, patch, self.logging)
    }

    fn plugin_name(&self) -> &'static str {
        "stripe_checkout_payment_intents"
    }
}
