use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use futures_util::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, Document},
    options::ReturnDocument,
    Collection,
};
use tracing::{info, warn};
use validator::Validate;

use crate::{
    errors::{AppError, Result},
    models::flagship::{Flagship, FlagshipView},
    models::registration::{
        CreateRegistrationRequest, CreateRegistrationResponse, Registration, RegistrationDetail,
        RegistrationStatus, ReviewRegistrationRequest,
    },
    models::user::{Claims, Traveler, TravelerView},
    services::mail::RegistrationSnapshot,
    state::AppState,
};

// Book a spot on a flagship. The traveler comes from the token, the trip
// from the body; both must exist before anything is written.
pub async fn create_registration(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateRegistrationRequest>,
) -> Result<(StatusCode, Json<CreateRegistrationResponse>)> {
    payload.validate()?;

    let user_id = ObjectId::parse_str(&claims.sub)?;
    let flagship_id = ObjectId::parse_str(&payload.flagship_id)?;

    let users: Collection<Traveler> = state.db.collection("users");
    let traveler = users
        .find_one(doc! { "_id": user_id })
        .await?
        .ok_or(AppError::UserNotFound)?;

    let flagships: Collection<Flagship> = state.db.collection("flagships");
    let flagship = flagships
        .find_one(doc! { "_id": flagship_id })
        .await?
        .ok_or(AppError::FlagshipNotFound)?;

    let registrations: Collection<Registration> = state.db.collection("registrations");
    let registration = Registration::new(flagship_id, user_id, payload);
    registrations.insert_one(&registration).await?;

    let registration_id = registration.id.map(|id| id.to_hex()).unwrap_or_default();
    info!("Created registration {} for trip {}", registration_id, flagship.trip_name);

    // Re-read what was stored so the admin mail reflects the persisted
    // record, then send best-effort. Once the insert has succeeded, nothing
    // on the notification path, the sourcing read included, fails the
    // booking.
    if let Some(mail) = &state.mail {
        let stored = match registrations.find_one(doc! { "_id": registration.id }).await {
            Ok(Some(stored)) => stored,
            Ok(None) => registration,
            Err(e) => {
                warn!("Snapshot re-read failed for {}: {}", registration_id, e);
                registration
            }
        };
        let snapshot = RegistrationSnapshot::new(&stored, &flagship, &traveler);

        if let Err(e) = mail.registration_created(&snapshot).await {
            warn!("Registration mail failed for {}: {}", registration_id, e);
        }
    }

    let response = CreateRegistrationResponse {
        registration_id,
        message: "Registration created successfully".to_string(),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn approve_registration(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<ReviewRegistrationRequest>,
) -> Result<Json<RegistrationDetail>> {
    review_registration(state, id, RegistrationStatus::Accepted, payload).await
}

pub async fn reject_registration(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<ReviewRegistrationRequest>,
) -> Result<Json<RegistrationDetail>> {
    review_registration(state, id, RegistrationStatus::Rejected, payload).await
}

async fn review_registration(
    state: AppState,
    id: String,
    status: RegistrationStatus,
    payload: ReviewRegistrationRequest,
) -> Result<Json<RegistrationDetail>> {
    let collection: Collection<Registration> = state.db.collection("registrations");

    let filter = doc! { "_id": ObjectId::parse_str(&id)? };
    let update = Registration::review_update(status, &payload.comment);

    let registration = collection
        .find_one_and_update(filter, update)
        .return_document(ReturnDocument::After)
        .await?
        .ok_or(AppError::RegistrationNotFound)?;

    info!("Registration {} reviewed as {}", id, status.as_str());

    Ok(Json(RegistrationDetail::from_parts(registration, None, None)))
}

pub async fn get_registration_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RegistrationDetail>> {
    let collection: Collection<Registration> = state.db.collection("registrations");

    let filter = doc! { "_id": ObjectId::parse_str(&id)? };
    let registration = collection
        .find_one(filter)
        .await?
        .ok_or(AppError::RegistrationNotFound)?;

    let detail = expand_registration(&state, registration).await?;

    Ok(Json(detail))
}

// Trips the caller has already finished or backed out of.
pub async fn past_passport(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<RegistrationDetail>>> {
    let user_id = ObjectId::parse_str(&claims.sub)?;
    passport(state, Registration::past_passport_filter(user_id)).await
}

// Everything still ahead of the caller, pending and confirmed alike.
pub async fn upcoming_passport(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<RegistrationDetail>>> {
    let user_id = ObjectId::parse_str(&claims.sub)?;
    passport(state, Registration::upcoming_passport_filter(user_id)).await
}

async fn passport(state: AppState, filter: Document) -> Result<Json<Vec<RegistrationDetail>>> {
    let collection: Collection<Registration> = state.db.collection("registrations");

    let cursor = collection.find(filter).await?;
    let mut registrations: Vec<Registration> = cursor.try_collect().await?;

    registrations.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let mut details = Vec::with_capacity(registrations.len());
    for registration in registrations {
        let flagship = expand_flagship(&state, registration.flagship_id).await?;
        details.push(RegistrationDetail::from_parts(registration, flagship, None));
    }

    Ok(Json(details))
}

/// Registration with both references expanded, shared with the payment and
/// refund review screens.
pub(crate) async fn expand_registration(
    state: &AppState,
    registration: Registration,
) -> Result<RegistrationDetail> {
    let flagship = expand_flagship(state, registration.flagship_id).await?;
    let traveler = expand_traveler(state, registration.user_id).await?;

    Ok(RegistrationDetail::from_parts(registration, flagship, traveler))
}

// Missing references expand to nothing rather than failing the read; the
// stored id is still in the response.
pub(crate) async fn expand_flagship(
    state: &AppState,
    flagship_id: ObjectId,
) -> Result<Option<FlagshipView>> {
    let collection: Collection<Flagship> = state.db.collection("flagships");
    let flagship = collection.find_one(doc! { "_id": flagship_id }).await?;

    Ok(flagship.map(|f| FlagshipView::resolve(f, state.storage.as_deref())))
}

pub(crate) async fn expand_traveler(
    state: &AppState,
    user_id: ObjectId,
) -> Result<Option<TravelerView>> {
    let collection: Collection<Traveler> = state.db.collection("users");
    let traveler = collection.find_one(doc! { "_id": user_id }).await?;

    Ok(traveler.map(TravelerView::from))
}
