//! # Plugin Controller
//!
//! Drives a transaction through the plugin registered for its payment
//! method: snapshot, call, apply.

use crate::error::{PaymentError, PluginError};
use crate::plugin::{BoxedPaymentPlugin, PluginRegistry};
use crate::transaction::{FinancialTransaction, TransactionOutcome, TransactionState};
use tracing::{debug, info, instrument, warn};

/// Workflow entry point over a `PluginRegistry`
#[derive(Clone, Default)]
pub struct PluginController {
    registry: PluginRegistry,
}

impl PluginController {
    pub fn new(registry: PluginRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    fn plugin_for(&self, method: &str) -> Result<&BoxedPaymentPlugin, PluginError> {
        self.registry.find(method).ok_or_else(|| {
            PluginError::Payment(PaymentError::PluginNotFound {
                method: method.to_string(),
            })
        })
    }

    /// Charge the transaction, or confirm it if it is already `PENDING`.
    ///
    /// An action-required outcome moves the transaction to `PENDING`, so the
    /// next call for the same transaction continues with a confirm.
    #[instrument(skip(self, transaction), fields(transaction_id = %transaction.id))]
    pub async fn approve_and_deposit(
        &self,
        method: &str,
        transaction: &mut FinancialTransaction,
        retry: bool,
    ) -> Result<(), PluginError> {
        let plugin = self.plugin_for(method)?;
        debug!("approve_and_deposit via {}", plugin.plugin_name());

        let outcome = plugin
            .approve_and_deposit(&transaction.snapshot(), retry)
            .await?;

        self.finish(transaction, outcome)
    }

    /// Refund the transaction
    #[instrument(skip(self, transaction), fields(transaction_id = %transaction.id))]
    pub async fn credit(
        &self,
        method: &str,
        transaction: &mut FinancialTransaction,
        retry: bool,
    ) -> Result<(), PluginError> {
        let plugin = self.plugin_for(method)?;
        debug!("credit via {}", plugin.plugin_name());

        let outcome = plugin.credit(&transaction.snapshot(), retry).await?;

        self.finish(transaction, outcome)
    }

    fn finish(
        &self,
        transaction: &mut FinancialTransaction,
        outcome: TransactionOutcome,
    ) -> Result<(), PluginError> {
        match transaction.apply(outcome) {
            Ok(()) => {
                info!(state = ?transaction.state, "transaction settled");
                Ok(())
            }
            Err(PluginError::ActionRequired(signal)) => {
                transaction.state = TransactionState::Pending;
                info!(reference = %signal.reference_number, "user action required");
                Err(PluginError::ActionRequired(signal))
            }
            Err(err) => {
                warn!(error = %err, "transaction failed");
                Err(err)
            }
        }
    }
}
