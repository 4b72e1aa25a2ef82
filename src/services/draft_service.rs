use crate::database::models::draft::{self, Draft, NewDraft};
use crate::database::models::event::Event;
use crate::database::models::{level, ModelResult, Required};
use crate::database::Database;
use crate::tracking::Tracker;

pub struct DraftService {
    db: Database,
    fork_prefix: String,
}

impl DraftService {
    pub fn new(db: Database, fork_prefix: impl Into<String>) -> Self {
        Self {
            db,
            fork_prefix: fork_prefix.into(),
        }
    }

    /// Returns the caller's draft of a level, creating one from the level
    /// when there is none. Forking someone else's level prefixes the name and
    /// leaves the draft unlinked from the original.
    pub async fn level_draft(&self, tracker: &Tracker, level_id: i32, uid: i32) -> ModelResult<Draft> {
        Required::new()
            .number("levelId", level_id)
            .number("uid", uid)
            .finish()?;

        if let Some(existing) = draft::find_for_level(&self.db, level_id, uid).await? {
            return Ok(existing);
        }

        let source = level::get(&self.db, level_id).await?;
        let new_draft = self.fork(&source, uid);
        let id = draft::create(&self.db, &new_draft).await?;

        // The route cannot tell whether a draft was created, so track here.
        tracker.fire(Event::new("draft_create").uid(uid).draft(id));

        draft::get(&self.db, id).await
    }

    fn fork(&self, source: &level::Level, uid: i32) -> NewDraft {
        let owner = source.uid == uid;
        NewDraft {
            name: if owner {
                source.name.clone()
            } else {
                format!("{} {}", self.fork_prefix, source.name)
            },
            level_id: owner.then_some(source.id),
            course_data: source.course_data.clone(),
            theme: source.theme,
            car: source.car,
            soundtrack: source.soundtrack,
            uid,
        }
    }
}
