use serde::Deserialize;
use tracing::info;

use crate::database::models::level::{self, NewLevel};
use crate::database::models::{course_data, draft, ModelError, ModelResult, Required};
use crate::database::{Database, DatabaseError};

/// Body of `POST /levels/fromDraft`. The draft supplies name (unless given),
/// car, soundtrack and course data.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PublishDraft {
    pub draft_id: i32,
    pub name: String,
    pub difficulty: i32,
    pub description: String,
    pub theme: i32,
}

pub struct LevelService {
    db: Database,
}

impl LevelService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Turns a draft into a level and deletes the draft.
    ///
    /// Runs in one transaction holding a row lock on the draft: a second
    /// publish of the same draft waits, then finds it gone.
    pub async fn publish_draft(&self, uid: i32, params: &PublishDraft) -> ModelResult<i32> {
        Required::new()
            .number("draftId", params.draft_id)
            .number("uid", uid)
            .finish()?;

        let mut tx = self.db.pool().begin().await?;

        let source = draft::get_for_update(&mut *tx, params.draft_id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("draft {}", params.draft_id)))?;
        if source.uid != uid {
            return Err(ModelError::Forbidden("draft belongs to another user".to_string()));
        }
        let map_data = match &source.course_data {
            Some(map) if source.has_course_data() => map,
            _ => return Err(ModelError::Invalid("no course data".to_string())),
        };

        let name = if !params.name.is_empty() {
            params.name.clone()
        } else if !source.name.is_empty() {
            source.name.clone()
        } else {
            return Err(ModelError::MissingFields(vec!["name"]));
        };

        let new_level = NewLevel {
            difficulty: params.difficulty,
            name,
            description: params.description.clone(),
            uid,
            theme: params.theme,
            car: source.car,
            soundtrack: source.soundtrack,
            course_data: Some(map_data.clone()),
        };
        new_level.validate()?;

        let id = level::insert(&mut *tx, &new_level).await?;
        course_data::create(&mut *tx, id, map_data).await?;
        draft::delete(&mut *tx, source.id).await?;
        tx.commit().await?;

        info!(uid, draft_id = source.id, level_id = id, "Published draft");
        Ok(id)
    }
}
