//! # Stripe Checkout (Charges API)
//!
//! Legacy flow: a purchase creates a charge that either settles or fails.
//! The charge id is recorded as `stripe_charge_id` so a later refund can
//! reference it.

use crate::config::{StripeConfig, DEFAULT_PROCESSES_TYPE};
use crate::gateway::{BoxedStripeGateway, GatewayResponse, PurchaseRequest, RefundRequest};
use crate::outcome::{credit_outcome, failure, log_exchange, malformed, processed_amount};
use async_trait::async_trait;
use pay_core::{
    PaymentError, PaymentPlugin, PaymentResult, TransactionOutcome, TransactionPatch,
    TransactionSnapshot,
};
use tracing::{info, instrument};

/// Plugin for the Stripe Charges API
pub struct CheckoutPlugin {
    gateway: BoxedStripeGateway,
    processes_type: String,
    logging: bool,
}

impl CheckoutPlugin {
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
            payment_method: None,
            confirm: None,
            return_url: None,
            destination: data.destination.clone(),
            receipt_email: data.receipt_email.clone(),
            statement_descriptor: data.statement_descriptor.clone(),
            application_fee: data.application_fee,
            stripe_version: data.stripe_version.clone(),
            connected_stripe_account_header: data.connected_stripe_account_header.clone(),
            metadata: data.metadata.clone(),
        })
    }

    pub(crate) fn refund_request(transaction: &TransactionSnapshot) -> PaymentResult<RefundRequest> {
        let data = &transaction.extended_data;
        let transaction_reference = data.stripe_charge_id.clone().ok_or_else(|| {
            PaymentError::InvalidRequest("extended data has no stripe_charge_id".to_string())
        })?;

        Ok(RefundRequest {
            amount: transaction.target_amount,
            currency: transaction.currency.clone(),
            transaction_reference,
            refund_application_fee: data.refund_application_fee.unwrap_or(true),
            token: data.token.clone(),
            stripe_version: data.stripe_version.clone(),
            connected_stripe_account_header: data.connected_stripe_account_header.clone(),
            metadata: data.metadata.clone(),
        })
    }

    /// Charge ids found at the top level of the response
    fn capture_metadata(response: &GatewayResponse, patch: &mut TransactionPatch) {
        let data = patch.data.data_mut();

        if response.has("id") {
            data.stripe_charge_id = response.transaction_reference().map(String::from);
        }
        if response.has("balance_transaction") {
            data.balance_transaction_id = response.balance_transaction_reference().map(String::from);
        }
        if response.has("application_fee") {
            data.application_fee_id = response.application_fee_reference().map(String::from);
        }
    }

    fn classify(
        &self,
        response: &GatewayResponse,
        transaction: &TransactionSnapshot,
        mut patch: TransactionPatch,
    ) -> PaymentResult<TransactionOutcome> {
        Self::capture_metadata(response, &mut patch);

        let reference = response.transaction_reference().unwrap_or_default();

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
impl PaymentPlugin for CheckoutPlugin {
    fn processes(&self, method: &str) -> bool {
        method == self.processes_type
    }

    #[instrument(skip(self, transaction), fields(processes_type = %self.processes_type))]
    async fn approve_and_deposit(
        &self,
        transaction: &TransactionSnapshot,
        _retry: bool,
    ) -> PaymentResult<TransactionOutcome> {
        let request = Self::purchase_request(transaction)?;
        let response = self.gateway.purchase(&request).await?.with_request(&request);

        if self.logging {
            log_exchange(&response);
        }

        let patch = TransactionPatch {
            tracking_id: transaction.source_id.clone(),
            ..Default::default()
        };

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
        "stripe_checkout"
    }
}
