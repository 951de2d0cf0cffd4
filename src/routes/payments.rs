use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};

use crate::handlers::bank_accounts::{create_bank_account, get_bank_accounts};
use crate::handlers::payments::{
    approve_payment, create_payment, get_completed_payments, get_payment, get_pending_payments,
    reject_payment, MAX_PAYMENT_BODY_SIZE,
};
use crate::handlers::refunds::{approve_refund, get_refunds, reject_refund, request_refund};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/create-payment",
            post(create_payment).layer(DefaultBodyLimit::max(MAX_PAYMENT_BODY_SIZE)),
        )
        .route("/approve-payment/:id", patch(approve_payment))
        .route("/reject-payment/:id", patch(reject_payment))
        .route("/get-payment/:id", get(get_payment))
        .route("/get-pending-payments", get(get_pending_payments))
        .route("/get-completed-payments", get(get_completed_payments))
        .route("/get-bank-accounts", get(get_bank_accounts))
        .route("/create-bank-account", post(create_bank_account))
        .route("/refund", post(request_refund))
        .route("/approve-refund/:id", patch(approve_refund))
        .route("/reject-refund/:id", patch(reject_refund))
        .route("/get-refunds", get(get_refunds))
}
