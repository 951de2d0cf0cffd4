use chrono::{DateTime, Utc};
use mongodb::bson::{self, doc, oid::ObjectId, Bson, Document};
use serde::{Deserialize, Serialize};

use crate::models::bank_account::BankAccountView;
use crate::models::registration::{RegistrationDetail, RegistrationStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PaymentStatus {
    PendingApproval,
    Approved,
    Rejected,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::PendingApproval => "pendingApproval",
            PaymentStatus::Approved => "approved",
            PaymentStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PaymentType {
    FullPayment,
    PartialPayment,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::FullPayment => "fullPayment",
            PaymentType::PartialPayment => "partialPayment",
        }
    }

    /// Multipart form values arrive as plain text.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "fullPayment" => Some(PaymentType::FullPayment),
            "partialPayment" => Some(PaymentType::PartialPayment),
            _ => None,
        }
    }
}

/// One attempted settlement toward a registration's balance. The amount is
/// caller-supplied and deliberately not checked against `amountDue`; the
/// administrator sees both numbers when reviewing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub registration: ObjectId,
    pub bank_account: ObjectId,
    pub payment_type: PaymentType,
    pub amount: f64,

    // Storage key; null until the screenshot upload lands.
    pub screenshot: Option<String>,

    pub status: PaymentStatus,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

// Every document the approve/reject cascade sends to MongoDB is built here,
// next to the data it mutates, so the ordering and atomicity rules have one
// home. The handlers never assemble these updates ad hoc.
impl Payment {
    /// The id is generated client side because it doubles as the storage
    /// key for the screenshot.
    pub fn new(
        registration: ObjectId,
        bank_account: ObjectId,
        payment_type: PaymentType,
        amount: f64,
    ) -> Self {
        let now = Utc::now();

        Payment {
            id: Some(ObjectId::new()),
            registration,
            bank_account,
            payment_type,
            amount,
            screenshot: None,
            status: PaymentStatus::PendingApproval,
            created_at: now,
            updated_at: now,
        }
    }

    /// Atomic claim: only matches while the payment is still pending, so a
    /// second approve/reject of the same payment finds nothing to update
    /// instead of cascading twice.
    pub fn claim_filter(id: ObjectId) -> Document {
        doc! {
            "_id": id,
            "status": PaymentStatus::PendingApproval.as_str(),
        }
    }

    pub fn claim_update(next: PaymentStatus) -> Document {
        doc! {
            "$set": {
                "status": next.as_str(),
                "updatedAt": Utc::now(),
            }
        }
    }

    /// Registration update when this payment is submitted: link it and mark
    /// the registration paid-in-flight. The balance is untouched until
    /// approval.
    pub fn submission_cascade(&self) -> Document {
        doc! {
            "$set": {
                "paymentId": self.id,
                "isPaid": true,
                "updatedAt": Utc::now(),
            }
        }
    }

    /// Registration update when this payment is approved: one atomic write
    /// that settles the amount against the balance and confirms the booking.
    pub fn approval_cascade(&self) -> Document {
        doc! {
            "$inc": { "amountDue": -self.amount },
            "$set": {
                "isPaid": true,
                "status": RegistrationStatus::Confirmed.as_str(),
                "updatedAt": Utc::now(),
            }
        }
    }

    /// Registration update when a payment is rejected: unlink it. The
    /// balance was never decremented for an unapproved payment, so there is
    /// nothing to restore, and the registration status is left alone.
    pub fn rejection_cascade() -> Document {
        doc! {
            "$set": {
                "isPaid": false,
                "paymentId": Bson::Null,
                "updatedAt": Utc::now(),
            }
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub id: String,
    pub registration: String,
    pub bank_account: String,
    pub payment_type: PaymentType,
    pub amount: f64,
    pub screenshot: Option<String>,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        PaymentResponse {
            id: payment.id.map(|id| id.to_hex()).unwrap_or_default(),
            registration: payment.registration.to_hex(),
            bank_account: payment.bank_account.to_hex(),
            payment_type: payment.payment_type,
            amount: payment.amount,
            screenshot: payment.screenshot,
            status: payment.status,
            created_at: payment.created_at,
            updated_at: payment.updated_at,
        }
    }
}

/// Expanded payment for the admin review screens: the registration (with
/// traveler and flagship), the receiving bank account and a signed URL for
/// the screenshot.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetail {
    pub id: String,
    pub payment_type: PaymentType,
    pub amount: f64,
    pub screenshot: Option<String>,
    pub screenshot_url: Option<String>,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration: Option<RegistrationDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_account: Option<BankAccountView>,
}

impl PaymentDetail {
    pub fn from_parts(
        payment: Payment,
        registration: Option<RegistrationDetail>,
        bank_account: Option<BankAccountView>,
        screenshot_url: Option<String>,
    ) -> Self {
        PaymentDetail {
            id: payment.id.map(|id| id.to_hex()).unwrap_or_default(),
            payment_type: payment.payment_type,
            amount: payment.amount,
            screenshot: payment.screenshot,
            screenshot_url,
            status: payment.status,
            created_at: payment.created_at,
            updated_at: payment.updated_at,
            registration,
            bank_account,
        }
    }
}
