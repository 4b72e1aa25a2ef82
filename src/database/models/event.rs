use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::PgExecutor;

use crate::database::manager;
use crate::database::models::{ModelResult, Required};
use crate::database::{DynamicQuery, SqlResult};

/// Append-only telemetry record. Zero ids and empty strings count as absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Event {
    pub event_type: String,
    pub level_id: Option<i32>,
    #[serde(alias = "draft_id")]
    pub draft_id: Option<i32>,
    /// Always taken from the caller's token.
    #[serde(skip_deserializing)]
    pub uid: Option<i32>,
    pub time: Option<i32>,
    pub body: Option<Map<String, Value>>,
    pub state: Option<String>,
}

impl Event {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            ..Default::default()
        }
    }

    pub fn uid(mut self, uid: i32) -> Self {
        self.uid = Some(uid);
        self
    }

    pub fn level(mut self, level_id: i32) -> Self {
        self.level_id = Some(level_id);
        self
    }

    pub fn draft(mut self, draft_id: i32) -> Self {
        self.draft_id = Some(draft_id);
        self
    }

    fn insert_query(&self) -> SqlResult {
        let mut query = DynamicQuery::insert("events").set("event_type", &self.event_type);
        if let Some(level_id) = self.level_id.filter(|v| *v != 0) {
            query = query.set("level_id", level_id);
        }
        if let Some(uid) = self.uid.filter(|v| *v != 0) {
            query = query.set("uid", uid);
        }
        if let Some(time) = self.time.filter(|v| *v != 0) {
            query = query.set("time", time);
        }
        if let Some(draft_id) = self.draft_id.filter(|v| *v != 0) {
            query = query.set("draft_id", draft_id);
        }
        if let Some(body) = &self.body {
            query = query.set("body", body.clone());
        }
        if let Some(state) = self.state.as_deref().filter(|s| !s.is_empty()) {
            query = query.set("state", state);
        }
        query.build()
    }
}

pub async fn insert<'e, E>(executor: E, event: &Event) -> ModelResult<()>
where
    E: PgExecutor<'e>,
{
    Required::new().text("eventType", &event.event_type).finish()?;

    manager::execute(executor, &event.insert_query()).await?;
    Ok(())
}
