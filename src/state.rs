use std::sync::Arc;

use mongodb::Database;

use crate::services::mail::MailService;
use crate::services::storage::StorageService;

/// Shared handles for every request. Storage and mail are optional so the
/// server can come up in a degraded mode when their credentials are absent;
/// handlers that cannot work without them answer 503 instead.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub storage: Option<Arc<StorageService>>,
    pub mail: Option<Arc<MailService>>,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        AppState {
            db,
            storage: None,
            mail: None,
        }
    }

    pub fn with_storage(mut self, storage: Arc<StorageService>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn with_mail(mut self, mail: Arc<MailService>) -> Self {
        self.mail = Some(mail);
        self
    }
}
