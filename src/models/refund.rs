use chrono::{DateTime, Utc};
use mongodb::bson::{self, doc, oid::ObjectId, Document};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::registration::{RegistrationDetail, RegistrationStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RefundStatus {
    Pending,
    Cleared,
    Rejected,
}

impl RefundStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefundStatus::Pending => "pending",
            RefundStatus::Cleared => "cleared",
            RefundStatus::Rejected => "rejected",
        }
    }
}

/// A request to reverse a registration's payment, carrying the traveler's
/// bank details and trip feedback. Clearing or rejecting it does not write
/// back to the registration; the registration stays in `refundProcessing`
/// until an operator moves it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Refund {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub registration: ObjectId,
    pub bank_details: String,
    pub reason: String,
    pub feedback: String,
    pub rating: i32,

    pub status: RefundStatus,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Refund {
    pub fn new(registration: ObjectId, req: RequestRefundRequest) -> Self {
        let now = Utc::now();

        Refund {
            id: Some(ObjectId::new()),
            registration,
            bank_details: req.bank_details,
            reason: req.reason,
            feedback: req.feedback,
            rating: req.rating,
            status: RefundStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Registration update when a refund is requested: the status flips to
    /// `refundProcessing` whatever it was before, and nothing else moves.
    pub fn processing_cascade() -> Document {
        doc! {
            "$set": {
                "status": RegistrationStatus::RefundProcessing.as_str(),
                "updatedAt": Utc::now(),
            }
        }
    }

    /// Terminal transition of the refund itself. Deliberately no cascade.
    pub fn resolution_update(next: RefundStatus) -> Document {
        doc! {
            "$set": {
                "status": next.as_str(),
                "updatedAt": Utc::now(),
            }
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RequestRefundRequest {
    #[validate(length(min = 1))]
    pub registration: String,

    #[validate(length(min = 1))]
    pub bank_details: String,

    #[validate(length(min = 1))]
    pub reason: String,

    #[validate(length(min = 1))]
    pub feedback: String,

    pub rating: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundResponse {
    pub id: String,
    pub registration: String,
    pub bank_details: String,
    pub reason: String,
    pub feedback: String,
    pub rating: i32,
    pub status: RefundStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Refund> for RefundResponse {
    fn from(refund: Refund) -> Self {
        RefundResponse {
            id: refund.id.map(|id| id.to_hex()).unwrap_or_default(),
            registration: refund.registration.to_hex(),
            bank_details: refund.bank_details,
            reason: refund.reason,
            feedback: refund.feedback,
            rating: refund.rating,
            status: refund.status,
            created_at: refund.created_at,
            updated_at: refund.updated_at,
        }
    }
}

/// Refund with its registration expanded (traveler, flagship and payment)
/// for the admin refund queue.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundDetail {
    pub id: String,
    pub bank_details: String,
    pub reason: String,
    pub feedback: String,
    pub rating: i32,
    pub status: RefundStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration: Option<RegistrationDetail>,
}

impl RefundDetail {
    pub fn from_parts(refund: Refund, registration: Option<RegistrationDetail>) -> Self {
        RefundDetail {
            id: refund.id.map(|id| id.to_hex()).unwrap_or_default(),
            bank_details: refund.bank_details,
            reason: refund.reason,
            feedback: refund.feedback,
            rating: refund.rating,
            status: refund.status,
            created_at: refund.created_at,
            updated_at: refund.updated_at,
            registration,
        }
    }
}
