mod common;

use common::{error_response, keys, Call, ScriptedGateway};
use pay_core::{
    ExtendedData, FinancialTransaction, PaymentError, PluginController, PluginError,
    PluginRegistry, TransactionState, REASON_CODE_SUCCESS, RESPONSE_CODE_FAILED,
    RESPONSE_CODE_SUCCESS,
};
use pay_stripe::{CheckoutPaymentIntentsPlugin, GatewayResponse};
use rust_decimal_macros::dec;
use serde_json::json;
use std::sync::Arc;

fn controller(gateway: Arc<ScriptedGateway>) -> PluginController {
    let plugin = CheckoutPaymentIntentsPlugin::new(gateway).with_processes_type("stripe_checkout");
    PluginController::new(PluginRegistry::new().with_plugin("default", Arc::new(plugin)))
}

fn purchase_tx() -> FinancialTransaction {
    FinancialTransaction::new(dec!(10.00), "usd")
        .with_source_id("pay_1")
        .with_extended_data(ExtendedData::new().with_token("tok_x"))
}

#[tokio::test]
async fn purchase_success_records_charge_metadata() {
    let gateway = Arc::new(ScriptedGateway::new().respond(
        GatewayResponse::new(
            json!({
                "id": "ch_1",
                "amount": 1000,
                "charges": {"data": [{"id": "ch_1", "balance_transaction": "txn_1"}]}
            }),
            true,
            false,
        )
        .unwrap(),
    ));
    let mut tx = purchase_tx();

    controller(gateway.clone())
        .approve_and_deposit("stripe_checkout", &mut tx, false)
        .await
        .unwrap();

    assert_eq!(tx.state, TransactionState::Success);
    assert_eq!(tx.processed_amount, dec!(10.00));
    assert_eq!(tx.reference_number.as_deref(), Some("ch_1"));
    assert_eq!(tx.tracking_id.as_deref(), Some("pay_1"));
    assert_eq!(tx.response_code.as_deref(), Some(RESPONSE_CODE_SUCCESS));
    assert_eq!(tx.reason_code.as_deref(), Some(REASON_CODE_SUCCESS));
    assert_eq!(tx.extended_data.charge_id.as_deref(), Some("ch_1"));
    assert_eq!(tx.extended_data.balance_transaction_id.as_deref(), Some("txn_1"));
    assert_eq!(tx.extended_data.payment_intent_id.as_deref(), Some("ch_1"));
    assert!(tx.extended_data.application_fee_id.is_none());
    assert!(matches!(gateway.calls()[0], Call::Purchase(_)));
}

#[tokio::test]
async fn action_required_keeps_reference_and_client_secret() {
    let gateway = Arc::new(ScriptedGateway::new().respond(
        GatewayResponse::payment_intent(json!({
            "id": "pi_1",
            "status": "requires_action",
            "client_secret": "pi_1_secret_abc",
            "next_action": {"type": "use_stripe_sdk"}
        }))
        .unwrap(),
    ));
    let mut tx = purchase_tx();

    let result = controller(gateway)
        .approve_and_deposit("stripe_checkout", &mut tx, false)
        .await;

    match result {
        Err(PluginError::ActionRequired(signal)) => {
            assert_eq!(signal.reference_number, "pi_1");
            assert_eq!(signal.client_secret.as_deref(), Some("pi_1_secret_abc"));
        }
        other => panic!("expected action required, got {:?}", other),
    }
    assert_ne!(tx.state, TransactionState::Failed);
    assert_eq!(tx.reference_number.as_deref(), Some("pi_1"));
    assert_eq!(tx.extended_data.client_secret.as_deref(), Some("pi_1_secret_abc"));
    assert!(tx.response_code.is_none());
}

#[tokio::test]
async fn pending_transaction_is_confirmed_not_purchased() {
    let gateway = Arc::new(
        ScriptedGateway::new().respond(
            GatewayResponse::payment_intent(json!({
                "id": "pi_1", "status": "succeeded", "amount": 1000
            }))
            .unwrap(),
        ),
    );
    let mut data = ExtendedData::new().with_token("tok_x").with_receipt_email("a@b.c");
    data.connected_stripe_account_header = Some("acct_1".into());
    let mut tx = FinancialTransaction::new(dec!(10.00), "usd")
        .with_state(TransactionState::Pending)
        .with_reference_number("pi_1")
        .with_extended_data(data);

    controller(gateway.clone())
        .approve_and_deposit("stripe_checkout", &mut tx, true)
        .await
        .unwrap();

    let calls = gateway.calls();
    assert_eq!(calls.len(), 1);
    match &calls[0] {
        Call::Confirm(request) => {
            let value = serde_json::to_value(request).unwrap();
            assert_eq!(
                keys(&value),
                vec!["connectedStripeAccountHeader", "paymentIntentReference"]
            );
            assert_eq!(value["paymentIntentReference"], json!("pi_1"));
        }
        other => panic!("expected confirm, got {:?}", other),
    }
    assert_eq!(tx.state, TransactionState::Success);
}

#[tokio::test]
async fn new_transaction_is_purchased_with_only_present_keys() {
    let gateway = Arc::new(
        ScriptedGateway::new().respond(
            GatewayResponse::payment_intent(json!({
                "id": "pi_2", "status": "succeeded", "amount": 500
            }))
            .unwrap(),
        ),
    );
    let mut tx = purchase_tx();

    controller(gateway.clone())
        .approve_and_deposit("stripe_checkout", &mut tx, false)
        .await
        .unwrap();

    match &gateway.calls()[0] {
        Call::Purchase(request) => {
            let value = serde_json::to_value(request).unwrap();
            assert_eq!(keys(&value), vec!["amount", "currency", "description", "token"]);
            assert!(value.get("receipt_email").is_none());
            assert!(value.get("metadata").is_none());
        }
        other => panic!("expected purchase, got {:?}", other),
    }
    assert_eq!(tx.processed_amount, dec!(5));
}

#[tokio::test]
async fn action_then_confirm_round_trip() {
    let gateway = Arc::new(
        ScriptedGateway::new()
            .respond(
                GatewayResponse::payment_intent(json!({
                    "id": "pi_3",
                    "status": "requires_action",
                    "client_secret": "pi_3_secret",
                    "next_action": {"type": "use_stripe_sdk"}
                }))
                .unwrap(),
            )
            .respond(
                GatewayResponse::payment_intent(json!({
                    "id": "pi_3",
                    "status": "succeeded",
                    "amount": 2599,
                    "charges": {"data": [{"id": "ch_3", "application_fee": "fee_3"}]}
                }))
                .unwrap(),
            ),
    );
    let controller = controller(gateway.clone());
    let mut tx = purchase_tx();

    let first = controller
        .approve_and_deposit("stripe_checkout", &mut tx, false)
        .await;
    assert!(first.unwrap_err().is_action_required());
    assert_eq!(tx.state, TransactionState::Pending);

    controller
        .approve_and_deposit("stripe_checkout", &mut tx, true)
        .await
        .unwrap();

    let calls = gateway.calls();
    assert!(matches!(calls[0], Call::Purchase(_)));
    assert!(matches!(calls[1], Call::Confirm(_)));
    assert_eq!(tx.state, TransactionState::Success);
    assert_eq!(tx.processed_amount, dec!(25.99));
    assert_eq!(tx.extended_data.charge_id.as_deref(), Some("ch_3"));
    assert_eq!(tx.extended_data.application_fee_id.as_deref(), Some("fee_3"));
    assert_eq!(tx.extended_data.client_secret.as_deref(), Some("pi_3_secret"));
}

#[tokio::test]
async fn failure_handling_is_identical_across_error_types() {
    let mut observed = Vec::new();

    for error_type in ["api_error", "card_error", "arbitrary_unknown"] {
        let gateway = Arc::new(
            ScriptedGateway::new().respond(error_response(error_type, "Your card was declined.")),
        );
        let mut tx = purchase_tx();

        let result = controller(gateway)
            .approve_and_deposit("stripe_checkout", &mut tx, false)
            .await;

        let error = match result {
            Err(PluginError::Financial(error)) => error,
            other => panic!("expected financial error, got {:?}", other),
        };
        assert_eq!(error.kind.as_str(), error_type);
        assert_eq!(error.error["type"], json!(error_type));
        assert_eq!(error.tracking_id.as_deref(), Some("pay_1"));

        observed.push((tx.state, tx.response_code.clone(), tx.reason_code.clone()));
    }

    let expected = (
        TransactionState::Failed,
        Some(RESPONSE_CODE_FAILED.to_string()),
        Some("Your card was declined.".to_string()),
    );
    assert!(observed.iter().all(|o| *o == expected));
}

#[tokio::test]
async fn reason_code_truncated_at_hundred_chars() {
    for (len, expected) in [(100, 100), (101, 100), (20, 20)] {
        let message = "x".repeat(len);
        let gateway = Arc::new(ScriptedGateway::new().respond(error_response("card_error", &message)));
        let mut tx = purchase_tx();

        let result = controller(gateway)
            .approve_and_deposit("stripe_checkout", &mut tx, false)
            .await;

        let error = match result {
            Err(PluginError::Financial(error)) => error,
            other => panic!("expected financial error, got {:?}", other),
        };
        assert_eq!(tx.reason_code.as_ref().map(|r| r.chars().count()), Some(expected));
        assert_eq!(error.reason_code.chars().count(), expected);
        assert_eq!(error.message.len(), len);
    }
}

#[tokio::test]
async fn refund_replaces_extended_data() {
    let refund = json!({"id": "re_1", "amount": 1000, "charge": "ch_1"});
    let gateway = Arc::new(ScriptedGateway::new().respond(GatewayResponse::refund(refund.clone()).unwrap()));
    let mut data = ExtendedData::new().with_token("tok_x").with_description("order 42");
    data.charge_id = Some("ch_1".into());
    data.extra.insert("unrelated".into(), json!("value"));
    let mut tx = FinancialTransaction::new(dec!(10.00), "usd")
        .with_source_id("credit_1")
        .with_extended_data(data);

    controller(gateway.clone())
        .credit("stripe_checkout", &mut tx, false)
        .await
        .unwrap();

    match &gateway.calls()[0] {
        Call::Refund(request) => {
            assert_eq!(request.transaction_reference, "ch_1");
            assert!(request.refund_application_fee);
        }
        other => panic!("expected refund, got {:?}", other),
    }
    assert_eq!(tx.state, TransactionState::Success);
    assert_eq!(tx.processed_amount, dec!(10));
    assert_eq!(tx.reference_number.as_deref(), Some("re_1"));
    assert_eq!(tx.tracking_id.as_deref(), Some("credit_1"));
    assert_eq!(tx.extended_data.len(), 1);
    assert_eq!(tx.extended_data.stripe_response, Some(refund));
    assert!(!tx.extended_data.has("unrelated"));
    assert!(!tx.extended_data.has("token"));
}

#[tokio::test]
async fn refund_failure_keeps_extended_data() {
    let gateway = Arc::new(
        ScriptedGateway::new().respond(error_response("invalid_request_error", "Charge already refunded")),
    );
    let mut data = ExtendedData::new();
    data.charge_id = Some("ch_1".into());
    let mut tx = FinancialTransaction::new(dec!(10.00), "usd").with_extended_data(data);

    let result = controller(gateway).credit("stripe_checkout", &mut tx, false).await;

    assert!(matches!(result, Err(PluginError::Financial(_))));
    assert_eq!(tx.state, TransactionState::Failed);
    assert_eq!(tx.reason_code.as_deref(), Some("Charge already refunded"));
    assert_eq!(tx.extended_data.charge_id.as_deref(), Some("ch_1"));
}

#[tokio::test]
async fn transport_errors_propagate_without_touching_state() {
    let gateway = Arc::new(ScriptedGateway::new().fail_with(PaymentError::NetworkError("timeout".into())));
    let mut tx = purchase_tx();

    let result = controller(gateway)
        .approve_and_deposit("stripe_checkout", &mut tx, false)
        .await;

    assert!(matches!(
        result,
        Err(PluginError::Payment(PaymentError::NetworkError(_)))
    ));
    assert_eq!(tx.state, TransactionState::New);
    assert!(tx.response_code.is_none());
}

#[tokio::test]
async fn missing_token_is_rejected_before_any_call() {
    let gateway = Arc::new(ScriptedGateway::new());
    let mut tx = FinancialTransaction::new(dec!(10.00), "usd");

    let result = controller(gateway.clone())
        .approve_and_deposit("stripe_checkout", &mut tx, false)
        .await;

    assert!(matches!(
        result,
        Err(PluginError::Payment(PaymentError::InvalidRequest(_)))
    ));
    assert!(gateway.calls().is_empty());
}
