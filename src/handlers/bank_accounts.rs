use axum::{extract::State, response::Json};
use futures_util::TryStreamExt;
use mongodb::{bson::doc, Collection};
use tracing::info;
use validator::Validate;

use crate::{
    errors::Result,
    models::bank_account::{BankAccount, BankAccountView, CreateBankAccountRequest},
    state::AppState,
};

pub async fn get_bank_accounts(
    State(state): State<AppState>,
) -> Result<Json<Vec<BankAccountView>>> {
    let collection: Collection<BankAccount> = state.db.collection("bankaccounts");

    let cursor = collection.find(doc! {}).await?;
    let accounts: Vec<BankAccount> = cursor.try_collect().await?;

    let views: Vec<BankAccountView> = accounts.into_iter().map(BankAccountView::from).collect();

    Ok(Json(views))
}

pub async fn create_bank_account(
    State(state): State<AppState>,
    Json(payload): Json<CreateBankAccountRequest>,
) -> Result<Json<BankAccountView>> {
    payload.validate()?;

    let collection: Collection<BankAccount> = state.db.collection("bankaccounts");

    let account = BankAccount::from(payload);
    collection.insert_one(&account).await?;

    info!("Created bank account at {}", account.bank_name);

    Ok(Json(BankAccountView::from(account)))
}
