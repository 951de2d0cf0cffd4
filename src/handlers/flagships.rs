use axum::{
    extract::{Path, State},
    response::Json,
};
use futures_util::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId},
    Collection,
};

use crate::{
    errors::{AppError, Result},
    models::flagship::{Flagship, FlagshipView},
    state::AppState,
};

// Browse trips, newest first. Image keys come back as signed URLs.
pub async fn get_flagships(State(state): State<AppState>) -> Result<Json<Vec<FlagshipView>>> {
    let collection: Collection<Flagship> = state.db.collection("flagships");

    let cursor = collection.find(doc! {}).await?;
    let mut flagships: Vec<Flagship> = cursor.try_collect().await?;

    flagships.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let views: Vec<FlagshipView> = flagships
        .into_iter()
        .map(|f| FlagshipView::resolve(f, state.storage.as_deref()))
        .collect();

    Ok(Json(views))
}

pub async fn get_flagship_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FlagshipView>> {
    let collection: Collection<Flagship> = state.db.collection("flagships");

    let filter = doc! { "_id": ObjectId::parse_str(&id)? };
    let flagship = collection
        .find_one(filter)
        .await?
        .ok_or(AppError::FlagshipNotFound)?;

    Ok(Json(FlagshipView::resolve(flagship, state.storage.as_deref())))
}
