#![allow(dead_code)]

use async_trait::async_trait;
use pay_core::{PaymentError, PaymentResult};
use pay_stripe::{ConfirmRequest, GatewayResponse, PurchaseRequest, RefundRequest, StripeGateway};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

/// A gateway call as seen by the scripted gateway
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Purchase(PurchaseRequest),
    Confirm(ConfirmRequest),
    Refund(RefundRequest),
}

/// Replays queued responses and records every request it receives
#[derive(Default)]
pub struct ScriptedGateway {
    responses: Mutex<VecDeque<PaymentResult<GatewayResponse>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, response: GatewayResponse) -> Self {
        self.responses.lock().unwrap().push_back(Ok(response));
        self
    }

    pub fn fail_with(self, error: PaymentError) -> Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn next(&self, call: Call) -> PaymentResult<GatewayResponse> {
        self.calls.lock().unwrap().push(call);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(PaymentError::Internal("no scripted response".into())))
    }
}

#[async_trait]
impl StripeGateway for ScriptedGateway {
    async fn purchase(&self, request: &PurchaseRequest) -> PaymentResult<GatewayResponse> {
        self.next(Call::Purchase(request.clone()))
    }

    async fn confirm(&self, request: &ConfirmRequest) -> PaymentResult<GatewayResponse> {
        self.next(Call::Confirm(request.clone()))
    }

    async fn refund(&self, request: &RefundRequest) -> PaymentResult<GatewayResponse> {
        self.next(Call::Refund(request.clone()))
    }
}

/// Failed charge response with the given error type and message
pub fn error_response(error_type: &str, message: &str) -> GatewayResponse {
    GatewayResponse::charge(serde_json::json!({
        "error": {"type": error_type, "message": message, "code": "x"}
    }))
    .unwrap()
}

pub fn keys(value: &Value) -> Vec<String> {
    value.as_object().unwrap().keys().cloned().collect()
}
