use axum::{
    extract::{Path, State},
    response::Json,
};
use futures_util::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId},
    options::ReturnDocument,
    Collection,
};
use tracing::{info, warn};
use validator::Validate;

use crate::{
    errors::{AppError, Result},
    handlers::registrations::expand_registration,
    models::payment::{Payment, PaymentResponse},
    models::refund::{Refund, RefundDetail, RefundResponse, RefundStatus, RequestRefundRequest},
    models::registration::Registration,
    state::AppState,
};

// A traveler asks for their money back. The registration is moved to
// refundProcessing before the refund exists, so a failure in between leaves
// the authoritative record already flagged.
pub async fn request_refund(
    State(state): State<AppState>,
    Json(payload): Json<RequestRefundRequest>,
) -> Result<Json<RefundResponse>> {
    payload.validate()?;

    let registration_id = ObjectId::parse_str(&payload.registration)?;

    let registrations: Collection<Registration> = state.db.collection("registrations");
    let result = registrations
        .update_one(doc! { "_id": registration_id }, Refund::processing_cascade())
        .await?;
    if result.matched_count == 0 {
        warn!("Refund requested for missing registration {}", payload.registration);
    }

    let refunds: Collection<Refund> = state.db.collection("refunds");
    let refund = Refund::new(registration_id, payload);
    refunds.insert_one(&refund).await?;

    info!(
        "Refund {} requested for registration {}",
        refund.id.map(|id| id.to_hex()).unwrap_or_default(),
        registration_id.to_hex()
    );

    Ok(Json(RefundResponse::from(refund)))
}

pub async fn approve_refund(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RefundResponse>> {
    resolve_refund(state, id, RefundStatus::Cleared).await
}

pub async fn reject_refund(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RefundResponse>> {
    resolve_refund(state, id, RefundStatus::Rejected).await
}

// Terminal transition of the refund record only. The registration stays in
// refundProcessing until an operator moves it.
async fn resolve_refund(
    state: AppState,
    id: String,
    next: RefundStatus,
) -> Result<Json<RefundResponse>> {
    let refunds: Collection<Refund> = state.db.collection("refunds");

    let filter = doc! { "_id": ObjectId::parse_str(&id)? };
    let refund = refunds
        .find_one_and_update(filter, Refund::resolution_update(next))
        .return_document(ReturnDocument::After)
        .await?
        .ok_or(AppError::RefundNotFound)?;

    info!("Refund {} {}", id, next.as_str());

    Ok(Json(RefundResponse::from(refund)))
}

// The admin refund queue: every refund with its registration, traveler,
// flagship and linked payment.
pub async fn get_refunds(State(state): State<AppState>) -> Result<Json<Vec<RefundDetail>>> {
    let refunds: Collection<Refund> = state.db.collection("refunds");

    let cursor = refunds.find(doc! {}).await?;
    let mut results: Vec<Refund> = cursor.try_collect().await?;

    results.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let registrations: Collection<Registration> = state.db.collection("registrations");
    let payments: Collection<Payment> = state.db.collection("payments");

    let mut details = Vec::with_capacity(results.len());
    for refund in results {
        let registration = match registrations
            .find_one(doc! { "_id": refund.registration })
            .await?
        {
            Some(registration) => {
                let payment_id = registration.payment_id;
                let mut detail = expand_registration(&state, registration).await?;

                if let Some(payment_id) = payment_id {
                    detail.payment = payments
                        .find_one(doc! { "_id": payment_id })
                        .await?
                        .map(PaymentResponse::from);
                }

                Some(detail)
            }
            None => None,
        };

        details.push(RefundDetail::from_parts(refund, registration));
    }

    Ok(Json(details))
}
