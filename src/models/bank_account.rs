use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A company bank account travelers transfer into. The stored field is
/// literally `IBAN`, kept for compatibility with the existing collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccount {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub bank_name: String,
    pub account_number: String,
    #[serde(rename = "IBAN")]
    pub iban: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBankAccountRequest {
    #[validate(length(min = 1))]
    pub bank_name: String,

    #[validate(length(min = 1))]
    pub account_number: String,

    #[validate(length(min = 1))]
    #[serde(rename = "IBAN")]
    pub iban: String,
}

impl From<CreateBankAccountRequest> for BankAccount {
    fn from(req: CreateBankAccountRequest) -> Self {
        BankAccount {
            id: Some(ObjectId::new()),
            bank_name: req.bank_name,
            account_number: req.account_number,
            iban: req.iban,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccountView {
    pub id: String,
    pub bank_name: String,
    pub account_number: String,
    #[serde(rename = "IBAN")]
    pub iban: String,
}

impl From<BankAccount> for BankAccountView {
    fn from(account: BankAccount) -> Self {
        BankAccountView {
            id: account.id.map(|id| id.to_hex()).unwrap_or_default(),
            bank_name: account.bank_name,
            account_number: account.account_number,
            iban: account.iban,
        }
    }
}
