use chrono::{DateTime, Utc};
use mongodb::bson::{self, doc, oid::ObjectId, Document};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::flagship::FlagshipView;
use crate::models::payment::PaymentResponse;
use crate::models::user::TravelerView;

/// Every status a registration can hold, closed so transition code has to
/// match exhaustively. `accepted` comes from the administrative review of
/// the request itself; `confirmed` only ever comes from an approved payment.
/// `completed`, `refunded` and `notReserved` are written by batch tooling
/// outside this service but must round-trip through reads here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RegistrationStatus {
    Pending,
    Accepted,
    Confirmed,
    Rejected,
    NotReserved,
    Refunded,
    RefundProcessing,
    Completed,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Pending => "pending",
            RegistrationStatus::Accepted => "accepted",
            RegistrationStatus::Confirmed => "confirmed",
            RegistrationStatus::Rejected => "rejected",
            RegistrationStatus::NotReserved => "notReserved",
            RegistrationStatus::Refunded => "refunded",
            RegistrationStatus::RefundProcessing => "refundProcessing",
            RegistrationStatus::Completed => "completed",
        }
    }
}

/// Statuses that put a trip in the "past" half of a traveler's passport.
pub const PAST_TRIP_STATUSES: [RegistrationStatus; 2] =
    [RegistrationStatus::Completed, RegistrationStatus::Refunded];

/// One traveler's booking request against one flagship. Aggregate root of
/// the booking workflow: payments and refunds reference it and reach back to
/// mutate `paymentId`, `isPaid`, `amountDue` and `status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    // Immutable after creation.
    pub flagship_id: ObjectId,
    pub user_id: ObjectId,

    // Maintained by the payment processor.
    pub payment_id: Option<ObjectId>,
    // True from the moment a payment is submitted, before any approval:
    // "a payment is in flight or settled", not "the balance is paid off".
    pub is_paid: bool,

    // Traveler preferences, stored verbatim and never touched again.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub joining_from_city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bed_preference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_sharing: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_members: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expectations: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trip_type: Option<String>,

    pub price: f64,
    // Invariant: price minus the sum of approved payment amounts.
    pub amount_due: f64,

    pub status: RegistrationStatus,
    pub comment: Option<String>,
    pub rating_id: Option<ObjectId>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Registration {
    /// Fresh registration: pending, unpaid, owing the full price.
    pub fn new(flagship_id: ObjectId, user_id: ObjectId, req: CreateRegistrationRequest) -> Self {
        let now = Utc::now();

        Registration {
            id: Some(ObjectId::new()),
            flagship_id,
            user_id,
            payment_id: None,
            is_paid: false,
            joining_from_city: req.joining_from_city,
            tier: req.tier,
            bed_preference: req.bed_preference,
            room_sharing: req.room_sharing,
            group_members: req.group_members,
            expectations: req.expectations,
            trip_type: req.trip_type,
            price: req.price,
            amount_due: req.price,
            status: RegistrationStatus::Pending,
            comment: None,
            rating_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Administrative accept/reject of the registration request itself,
    /// independent of any payment.
    pub fn review_update(status: RegistrationStatus, comment: &str) -> Document {
        doc! {
            "$set": {
                "status": status.as_str(),
                "comment": comment,
                "updatedAt": Utc::now(),
            }
        }
    }

    /// Registrations for trips the traveler has finished or backed out of.
    pub fn past_passport_filter(user_id: ObjectId) -> Document {
        doc! {
            "userId": user_id,
            "status": { "$in": [PAST_TRIP_STATUSES[0].as_str(), PAST_TRIP_STATUSES[1].as_str()] },
        }
    }

    /// Everything else: the upcoming half of the passport.
    pub fn upcoming_passport_filter(user_id: ObjectId) -> Document {
        doc! {
            "userId": user_id,
            "status": { "$nin": [PAST_TRIP_STATUSES[0].as_str(), PAST_TRIP_STATUSES[1].as_str()] },
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRegistrationRequest {
    #[validate(length(min = 1))]
    pub flagship_id: String,

    #[validate(range(min = 0.0))]
    pub price: f64,

    pub joining_from_city: Option<String>,
    pub tier: Option<String>,
    pub bed_preference: Option<String>,
    pub room_sharing: Option<String>,
    pub group_members: Option<Vec<String>>,
    pub expectations: Option<String>,
    pub trip_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRegistrationResponse {
    pub registration_id: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRegistrationRequest {
    pub comment: String,
}

/// Registration response, optionally expanded with its references. The
/// expansions are filled per endpoint: passports carry the flagship,
/// get-by-id adds the traveler, the refund list adds the payment.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationDetail {
    pub id: String,
    pub flagship_id: String,
    pub user_id: String,
    pub payment_id: Option<String>,
    pub is_paid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub joining_from_city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bed_preference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_sharing: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_members: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expectations: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trip_type: Option<String>,
    pub price: f64,
    pub amount_due: f64,
    pub status: RegistrationStatus,
    pub comment: Option<String>,
    pub rating_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub flagship: Option<FlagshipView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<TravelerView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentResponse>,
}

impl RegistrationDetail {
    pub fn from_parts(
        registration: Registration,
        flagship: Option<FlagshipView>,
        user: Option<TravelerView>,
    ) -> Self {
        RegistrationDetail {
            id: registration.id.map(|id| id.to_hex()).unwrap_or_default(),
            flagship_id: registration.flagship_id.to_hex(),
            user_id: registration.user_id.to_hex(),
            payment_id: registration.payment_id.map(|id| id.to_hex()),
            is_paid: registration.is_paid,
            joining_from_city: registration.joining_from_city,
            tier: registration.tier,
            bed_preference: registration.bed_preference,
            room_sharing: registration.room_sharing,
            group_members: registration.group_members,
            expectations: registration.expectations,
            trip_type: registration.trip_type,
            price: registration.price,
            amount_due: registration.amount_due,
            status: registration.status,
            comment: registration.comment,
            rating_id: registration.rating_id.map(|id| id.to_hex()),
            created_at: registration.created_at,
            updated_at: registration.updated_at,
            flagship,
            user,
            payment: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(price: f64) -> CreateRegistrationRequest {
        CreateRegistrationRequest {
            flagship_id: ObjectId::new().to_hex(),
            price,
            joining_from_city: Some("Lahore".to_string()),
            tier: Some("standard".to_string()),
            bed_preference: None,
            room_sharing: None,
            group_members: None,
            expectations: None,
            trip_type: None,
        }
    }

    #[test]
    fn new_registration_owes_the_full_price() {
        let registration = Registration::new(ObjectId::new(), ObjectId::new(), request(45000.0));

        assert_eq!(registration.status, RegistrationStatus::Pending);
        assert_eq!(registration.price, 45000.0);
        assert_eq!(registration.amount_due, 45000.0);
        assert!(!registration.is_paid);
        assert!(registration.payment_id.is_none());
        assert!(registration.comment.is_none());
    }

    #[test]
    fn statuses_serialize_camel_case() {
        assert_eq!(RegistrationStatus::Pending.as_str(), "pending");
        assert_eq!(RegistrationStatus::NotReserved.as_str(), "notReserved");
        assert_eq!(RegistrationStatus::RefundProcessing.as_str(), "refundProcessing");

        for status in [
            RegistrationStatus::Pending,
            RegistrationStatus::Accepted,
            RegistrationStatus::Confirmed,
            RegistrationStatus::Rejected,
            RegistrationStatus::NotReserved,
            RegistrationStatus::Refunded,
            RegistrationStatus::RefundProcessing,
            RegistrationStatus::Completed,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn stored_document_uses_camel_case_fields() {
        let registration = Registration::new(ObjectId::new(), ObjectId::new(), request(1000.0));
        let document = bson::to_document(&registration).unwrap();

        assert!(document.contains_key("flagshipId"));
        assert!(document.contains_key("userId"));
        assert!(document.contains_key("amountDue"));
        assert!(document.contains_key("isPaid"));
        assert_eq!(document.get_str("status").unwrap(), "pending");
        assert_eq!(document.get_f64("amountDue").unwrap(), 1000.0);
        // Unset preferences stay out of the document entirely.
        assert!(!document.contains_key("bedPreference"));
        // Workflow-owned nullables are stored as explicit nulls.
        assert!(document.get("paymentId").unwrap().as_null().is_some());
    }

    #[test]
    fn review_update_writes_status_and_comment() {
        let update = Registration::review_update(RegistrationStatus::Accepted, "welcome aboard");
        let set = update.get_document("$set").unwrap();

        assert_eq!(set.get_str("status").unwrap(), "accepted");
        assert_eq!(set.get_str("comment").unwrap(), "welcome aboard");
        assert!(set.contains_key("updatedAt"));
    }

    #[test]
    fn passport_filters_split_on_the_same_bucket() {
        let user_id = ObjectId::new();

        let past = Registration::past_passport_filter(user_id);
        let statuses = past.get_document("status").unwrap();
        let bucket = statuses.get_array("$in").unwrap();
        assert_eq!(bucket.len(), 2);
        assert!(bucket.iter().any(|s| s.as_str() == Some("completed")));
        assert!(bucket.iter().any(|s| s.as_str() == Some("refunded")));

        let upcoming = Registration::upcoming_passport_filter(user_id);
        let statuses = upcoming.get_document("status").unwrap();
        let bucket = statuses.get_array("$nin").unwrap();
        assert_eq!(bucket.len(), 2);
    }
}
