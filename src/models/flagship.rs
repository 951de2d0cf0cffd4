use chrono::{DateTime, Utc};
use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

use crate::services::storage::StorageService;

/// A bookable group trip. The admin CMS that creates and edits these lives
/// outside this service; we only read them, so most fields are optional and
/// `status`/`publish` stay as the CMS's own strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flagship {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    #[serde(default)]
    pub trip_name: String,
    pub destination: Option<String>,
    pub category: Option<String>,

    pub start_date: Option<BsonDateTime>,
    pub end_date: Option<BsonDateTime>,
    pub days: Option<i32>,

    // The CMS stores prices as strings ("45000"), not numbers.
    pub base_price: Option<String>,
    pub total_seats: Option<i32>,

    // Object-storage keys, resolved to signed URLs at read time only.
    #[serde(default)]
    pub images: Vec<String>,
    pub detailed_plan: Option<String>,

    pub status: Option<String>,
    pub publish: Option<bool>,

    pub created_at: Option<BsonDateTime>,
    pub updated_at: Option<BsonDateTime>,
}

/// Read view of a flagship with storage keys swapped for time-limited
/// signed URLs. Never persisted.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagshipView {
    pub id: String,
    pub trip_name: String,
    pub destination: Option<String>,
    pub category: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub days: Option<i32>,
    pub base_price: Option<String>,
    pub total_seats: Option<i32>,
    pub images: Vec<String>,
    pub detailed_plan: Option<String>,
    pub status: Option<String>,
    pub publish: Option<bool>,
}

impl FlagshipView {
    /// Builds the response view. When the storage service is down the raw
    /// keys pass through untouched so reads keep working in degraded mode.
    pub fn resolve(flagship: Flagship, storage: Option<&StorageService>) -> Self {
        let sign = |key: String| match storage {
            Some(storage) => storage.signed_url(&key),
            None => key,
        };

        FlagshipView {
            id: flagship.id.map(|id| id.to_hex()).unwrap_or_default(),
            trip_name: flagship.trip_name,
            destination: flagship.destination,
            category: flagship.category,
            start_date: flagship.start_date.map(|d| d.to_chrono()),
            end_date: flagship.end_date.map(|d| d.to_chrono()),
            days: flagship.days,
            base_price: flagship.base_price,
            total_seats: flagship.total_seats,
            images: flagship.images.into_iter().map(&sign).collect(),
            detailed_plan: flagship.detailed_plan.map(&sign),
            status: flagship.status,
            publish: flagship.publish,
        }
    }
}
