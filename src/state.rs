use std::sync::Arc;

use crate::auth::{AuthKeys, JwtError};
use crate::config::{AppConfig, ContentConfig};
use crate::database::Database;
use crate::tracking::{PgEventSink, Tracker};

/// Everything a handler needs, cloned into each request.
#[derive(Clone, Debug)]
pub struct AppState {
    pub db: Database,
    pub auth: Arc<AuthKeys>,
    pub tracker: Tracker,
    pub content: Arc<ContentConfig>,
}

impl AppState {
    /// Production wiring: events go to the same database.
    pub fn new(db: Database, config: &AppConfig) -> Result<Self, JwtError> {
        let tracker = Tracker::new(Arc::new(PgEventSink::new(db.clone())));
        Self::with_tracker(db, config, tracker)
    }

    pub fn with_tracker(db: Database, config: &AppConfig, tracker: Tracker) -> Result<Self, JwtError> {
        Ok(Self {
            db,
            auth: Arc::new(AuthKeys::from_config(&config.security)?),
            tracker,
            content: Arc::new(config.content.clone()),
        })
    }
}
