use axum::{
    extract::{Multipart, Path, State},
    response::Json,
};
use chrono::Utc;
use futures_util::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId},
    options::ReturnDocument,
    Collection,
};
use tracing::{info, warn};

use crate::{
    errors::{AppError, Result},
    handlers::registrations::expand_registration,
    models::bank_account::{BankAccount, BankAccountView},
    models::payment::{Payment, PaymentDetail, PaymentResponse, PaymentStatus, PaymentType},
    models::registration::Registration,
    state::AppState,
};

const MAX_SCREENSHOT_SIZE: usize = 10 * 1024 * 1024; // 10MB

// Request cap for the upload route: the screenshot plus headroom for the
// text fields and multipart framing. Axum's default body limit sits well
// under the screenshot cap and would reject large uploads before the
// handler ever saw them.
pub(crate) const MAX_PAYMENT_BODY_SIZE: usize = MAX_SCREENSHOT_SIZE + 1024 * 1024;

// Submit a payment against a registration: form fields plus a proof-of-
// transfer screenshot. The screenshot lands in object storage under the
// payment's own id, so the record is inserted before the upload.
pub async fn create_payment(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<PaymentResponse>> {
    let mut registration = String::new();
    let mut bank_account = String::new();
    let mut payment_type = String::new();
    let mut amount = String::new();
    let mut screenshot: Option<(bytes::Bytes, String)> = None;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "registration" => {
                registration = field.text().await?;
            }
            "bankAccount" => {
                bank_account = field.text().await?;
            }
            "paymentType" => {
                payment_type = field.text().await?;
            }
            "amount" => {
                amount = field.text().await?;
            }
            "screenshot" => {
                let content_type = field
                    .content_type()
                    .map(|m| m.to_string())
                    .unwrap_or_default();
                if !content_type.starts_with("image/") {
                    return Err(AppError::InvalidScreenshotFormat);
                }

                let data = field.bytes().await?;
                if data.len() > MAX_SCREENSHOT_SIZE {
                    return Err(AppError::ScreenshotTooLarge);
                }

                screenshot = Some((data, content_type));
            }
            _ => {}
        }
    }

    if registration.is_empty() || bank_account.is_empty() {
        return Err(AppError::invalid_data("registration and bankAccount are required"));
    }

    let registration_id = ObjectId::parse_str(&registration)?;
    let bank_account_id = ObjectId::parse_str(&bank_account)?;
    let payment_type = PaymentType::parse(&payment_type)
        .ok_or_else(|| AppError::invalid_data(format!("Unknown payment type: {}", payment_type)))?;
    let amount: f64 = amount.parse()?;
    let (screenshot_bytes, screenshot_mime) = screenshot.ok_or(AppError::MissingScreenshot)?;

    let storage = state
        .storage
        .as_ref()
        .ok_or_else(|| AppError::ServiceUnavailable("storage is not configured".to_string()))?;

    let payments: Collection<Payment> = state.db.collection("payments");
    let mut payment = Payment::new(registration_id, bank_account_id, payment_type, amount);
    payments.insert_one(&payment).await?;

    // The storage provider may rewrite the key; store what it answers.
    let key = payment.id.map(|id| id.to_hex()).unwrap_or_default();
    let stored_key = storage
        .upload(&key, &screenshot_bytes, &screenshot_mime)
        .await?;

    payments
        .update_one(
            doc! { "_id": payment.id },
            doc! { "$set": { "screenshot": &stored_key, "updatedAt": Utc::now() } },
        )
        .await?;
    payment.screenshot = Some(stored_key);

    // Link the payment and flag the registration paid-in-flight. A missing
    // registration does not fail the submission.
    let registrations: Collection<Registration> = state.db.collection("registrations");
    let result = registrations
        .update_one(doc! { "_id": registration_id }, payment.submission_cascade())
        .await?;
    if result.matched_count == 0 {
        warn!("Payment {} references missing registration {}", key, registration);
    }

    info!("Payment {} submitted for registration {}", key, registration);

    Ok(Json(PaymentResponse::from(payment)))
}

pub async fn approve_payment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PaymentResponse>> {
    let payments: Collection<Payment> = state.db.collection("payments");
    let payment = claim_pending_payment(&payments, &id, PaymentStatus::Approved).await?;

    // One atomic write settles the amount and confirms the booking. If the
    // registration has vanished the payment still stays approved.
    let registrations: Collection<Registration> = state.db.collection("registrations");
    let result = registrations
        .update_one(doc! { "_id": payment.registration }, payment.approval_cascade())
        .await?;
    if result.matched_count == 0 {
        warn!(
            "Approved payment {} has no registration {}",
            id,
            payment.registration.to_hex()
        );
    }

    info!("Payment {} approved for {}", id, payment.amount);

    Ok(Json(PaymentResponse::from(payment)))
}

pub async fn reject_payment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PaymentResponse>> {
    let payments: Collection<Payment> = state.db.collection("payments");
    let payment = claim_pending_payment(&payments, &id, PaymentStatus::Rejected).await?;

    // The balance was never decremented for a pending payment; unlinking it
    // is the whole cascade.
    let registrations: Collection<Registration> = state.db.collection("registrations");
    let result = registrations
        .update_one(doc! { "_id": payment.registration }, Payment::rejection_cascade())
        .await?;
    if result.matched_count == 0 {
        warn!(
            "Rejected payment {} has no registration {}",
            id,
            payment.registration.to_hex()
        );
    }

    info!("Payment {} rejected", id);

    Ok(Json(PaymentResponse::from(payment)))
}

/// Atomically moves a pending payment to `next`. The filter only matches
/// `pendingApproval`, so a payment that was already resolved misses; the
/// follow-up read tells an unknown id (404) apart from a replay (409).
async fn claim_pending_payment(
    payments: &Collection<Payment>,
    id: &str,
    next: PaymentStatus,
) -> Result<Payment> {
    let oid = ObjectId::parse_str(id)?;

    let claimed = payments
        .find_one_and_update(Payment::claim_filter(oid), Payment::claim_update(next))
        .return_document(ReturnDocument::After)
        .await?;

    match claimed {
        Some(payment) => Ok(payment),
        None => match payments.find_one(doc! { "_id": oid }).await? {
            Some(existing) => Err(AppError::PaymentAlreadyProcessed(
                existing.status.as_str().to_string(),
            )),
            None => Err(AppError::PaymentNotFound),
        },
    }
}

pub async fn get_payment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PaymentDetail>> {
    let payments: Collection<Payment> = state.db.collection("payments");

    let filter = doc! { "_id": ObjectId::parse_str(&id)? };
    let payment = payments
        .find_one(filter)
        .await?
        .ok_or(AppError::PaymentNotFound)?;

    let detail = expand_payment(&state, payment).await?;
    Ok(Json(detail))
}

// The admin review queue.
pub async fn get_pending_payments(
    State(state): State<AppState>,
) -> Result<Json<Vec<PaymentDetail>>> {
    payments_by_status(state, PaymentStatus::PendingApproval).await
}

pub async fn get_completed_payments(
    State(state): State<AppState>,
) -> Result<Json<Vec<PaymentDetail>>> {
    payments_by_status(state, PaymentStatus::Approved).await
}

async fn payments_by_status(
    state: AppState,
    status: PaymentStatus,
) -> Result<Json<Vec<PaymentDetail>>> {
    let payments: Collection<Payment> = state.db.collection("payments");

    let cursor = payments.find(doc! { "status": status.as_str() }).await?;
    let mut results: Vec<Payment> = cursor.try_collect().await?;

    results.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let mut details = Vec::with_capacity(results.len());
    for payment in results {
        details.push(expand_payment(&state, payment).await?);
    }

    Ok(Json(details))
}

async fn expand_payment(state: &AppState, payment: Payment) -> Result<PaymentDetail> {
    let registrations: Collection<Registration> = state.db.collection("registrations");
    let registration = match registrations
        .find_one(doc! { "_id": payment.registration })
        .await?
    {
        Some(registration) => Some(expand_registration(state, registration).await?),
        None => None,
    };

    let bank_accounts: Collection<BankAccount> = state.db.collection("bankaccounts");
    let bank_account = bank_accounts
        .find_one(doc! { "_id": payment.bank_account })
        .await?
        .map(BankAccountView::from);

    let screenshot_url = match (&payment.screenshot, state.storage.as_deref()) {
        (Some(key), Some(storage)) => Some(storage.signed_url(key)),
        _ => None,
    };

    Ok(PaymentDetail::from_parts(payment, registration, bank_account, screenshot_url))
}
