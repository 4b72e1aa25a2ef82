use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, PgExecutor};

use crate::database::manager;
use crate::database::models::{CourseData, ModelResult, Required};
use crate::database::{raw, Database, DatabaseError, DynamicQuery};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub id: i32,
    pub name: String,
    pub level_id: Option<i32>,
    pub created: DateTime<Utc>,
    pub updated: Option<DateTime<Utc>>,
    pub course_data: Option<CourseData>,
    pub theme: i32,
    pub car: i32,
    pub soundtrack: i32,
    pub uid: i32,
}

#[derive(Debug, FromRow)]
pub(crate) struct DraftRow {
    id: i32,
    name: String,
    level_id: Option<i32>,
    created: DateTime<Utc>,
    updated: Option<DateTime<Utc>>,
    course_data: Option<Json<CourseData>>,
    theme: i32,
    car: i32,
    soundtrack: i32,
    uid: i32,
}

impl From<DraftRow> for Draft {
    fn from(row: DraftRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            level_id: row.level_id,
            created: row.created,
            updated: row.updated,
            course_data: row.course_data.map(|Json(map)| map),
            theme: row.theme,
            car: row.car,
            soundtrack: row.soundtrack,
            uid: row.uid,
        }
    }
}

impl Draft {
    /// True when there is course data worth publishing.
    pub fn has_course_data(&self) -> bool {
        self.course_data.as_ref().is_some_and(|map| !map.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewDraft {
    pub name: String,
    pub level_id: Option<i32>,
    pub course_data: Option<CourseData>,
    pub theme: i32,
    pub car: i32,
    pub soundtrack: i32,
    #[serde(skip)]
    pub uid: i32,
}

impl NewDraft {
    pub fn validate(&self) -> ModelResult<()> {
        Required::new()
            .text("name", &self.name)
            .number("uid", self.uid)
            .number("car", self.car)
            .number("soundtrack", self.soundtrack)
            .finish()
    }

    fn insert_query(&self) -> DynamicQuery {
        let mut query = DynamicQuery::insert("drafts")
            .set("name", &self.name)
            .set("uid", self.uid)
            .set("car", self.car)
            .set("soundtrack", self.soundtrack);
        if let Some(level_id) = self.level_id.filter(|id| *id != 0) {
            query = query.set("level_id", level_id);
        }
        if let Some(map_data) = &self.course_data {
            query = query.set("course_data", map_data.clone());
        }
        if self.theme != 0 {
            query = query.set("theme", self.theme);
        }
        query.returning("id")
    }
}

/// Partial update. Zero values are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DraftUpdate {
    pub id: i32,
    #[serde(skip)]
    pub uid: i32,
    pub name: String,
    pub course_data: Option<CourseData>,
    pub theme: i32,
    pub car: i32,
    pub soundtrack: i32,
}

impl DraftUpdate {
    fn update_query(&self, now: DateTime<Utc>) -> DynamicQuery {
        let mut query = DynamicQuery::update("drafts").set("updated", now);
        if !self.name.is_empty() {
            query = query.set("name", &self.name);
        }
        if self.theme != 0 {
            query = query.set("theme", self.theme);
        }
        if self.car != 0 {
            query = query.set("car", self.car);
        }
        if self.soundtrack != 0 {
            query = query.set("soundtrack", self.soundtrack);
        }
        if let Some(map_data) = &self.course_data {
            query = query.set("course_data", map_data.clone());
        }
        query.where_("id", "=", self.id).and("uid", "=", self.uid)
    }
}

pub async fn create(db: &Database, draft: &NewDraft) -> ModelResult<i32> {
    draft.validate()?;

    let sql = draft.insert_query().build();
    Ok(db.fetch_scalar::<i32>(&sql).await?)
}

pub async fn update(db: &Database, update: &DraftUpdate) -> ModelResult<()> {
    Required::new()
        .number("id", update.id)
        .number("uid", update.uid)
        .finish()?;

    let sql = update.update_query(Utc::now()).build();
    if db.execute(&sql).await? == 0 {
        return Err(DatabaseError::NotFound(format!("draft {}", update.id)).into());
    }
    Ok(())
}

pub async fn get(db: &Database, id: i32) -> ModelResult<Draft> {
    Required::new().number("id", id).finish()?;

    let sql = raw("SELECT * FROM drafts WHERE id = $1;", vec![id.into()]);
    Ok(db.fetch_one::<DraftRow>(&sql).await?.into())
}

/// Locks the draft row for the rest of the surrounding transaction.
pub(crate) async fn get_for_update<'e, E>(executor: E, id: i32) -> ModelResult<Option<Draft>>
where
    E: PgExecutor<'e>,
{
    let sql = raw("SELECT * FROM drafts WHERE id = $1 FOR UPDATE;", vec![id.into()]);
    let row = manager::fetch_optional::<_, DraftRow>(executor, &sql).await?;
    Ok(row.map(Draft::from))
}

/// The requester's own draft of a level, if any.
pub async fn find_for_level(db: &Database, level_id: i32, uid: i32) -> ModelResult<Option<Draft>> {
    Required::new()
        .number("levelId", level_id)
        .number("uid", uid)
        .finish()?;

    let sql = raw(
        "SELECT * FROM drafts WHERE level_id = $1 AND uid = $2 ORDER BY id LIMIT 1;",
        vec![level_id.into(), uid.into()],
    );
    Ok(db.fetch_optional::<DraftRow>(&sql).await?.map(Draft::from))
}

pub async fn by_user(db: &Database, uid: i32) -> ModelResult<Vec<Draft>> {
    Required::new().number("uid", uid).finish()?;

    let sql = raw("SELECT * FROM drafts WHERE uid = $1 ORDER BY id;", vec![uid.into()]);
    let rows = db.fetch_all::<DraftRow>(&sql).await?;
    Ok(rows.into_iter().map(Draft::from).collect())
}

/// Unscoped delete, for callers that already checked ownership.
pub(crate) async fn delete<'e, E>(executor: E, id: i32) -> ModelResult<u64>
where
    E: PgExecutor<'e>,
{
    let sql = raw("DELETE FROM drafts WHERE id = $1;", vec![id.into()]);
    Ok(manager::execute(executor, &sql).await?)
}

/// Deletes the draft only if `uid` owns it.
pub async fn delete_owned(db: &Database, id: i32, uid: i32) -> ModelResult<()> {
    Required::new().number("id", id).number("uid", uid).finish()?;

    let sql = raw("DELETE FROM drafts WHERE id = $1 AND uid = $2;", vec![id.into(), uid.into()]);
    if db.execute(&sql).await? == 0 {
        return Err(DatabaseError::NotFound(format!("draft {id}")).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::SqlArg;
    use serde_json::json;

    #[test]
    fn insert_skips_optional_zero_fields() {
        let draft = NewDraft {
            name: "Loop".to_string(),
            uid: 2,
            car: 1,
            soundtrack: 3,
            level_id: Some(0),
            ..Default::default()
        };
        let sql = draft.insert_query().build();
        assert_eq!(
            sql.query,
            "INSERT INTO drafts (name, uid, car, soundtrack) VALUES ($1, $2, $3, $4) RETURNING id;"
        );
    }

    #[test]
    fn insert_includes_level_and_course_data() {
        let mut course = CourseData::new();
        course.insert("tiles".to_string(), json!([1, 2]));
        let draft = NewDraft {
            name: "Loop".to_string(),
            uid: 2,
            car: 1,
            soundtrack: 3,
            level_id: Some(9),
            course_data: Some(course),
            theme: 4,
        };
        let sql = draft.insert_query().build();
        assert_eq!(
            sql.query,
            "INSERT INTO drafts (name, uid, car, soundtrack, level_id, course_data, theme) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id;"
        );
        assert_eq!(sql.params[5], SqlArg::Json(json!({"tiles": [1, 2]})));
    }

    #[test]
    fn update_is_scoped_to_the_owner() {
        let update = DraftUpdate {
            id: 4,
            uid: 8,
            car: 2,
            ..Default::default()
        };
        let sql = update.update_query(Utc::now()).build();
        assert_eq!(sql.query, "UPDATE drafts SET updated = $1, car = $2 WHERE id = $3 AND uid = $4;");
    }

    #[test]
    fn empty_course_data_is_not_publishable() {
        let mut draft = Draft {
            id: 1,
            name: "D".to_string(),
            level_id: None,
            created: Utc::now(),
            updated: None,
            course_data: Some(CourseData::new()),
            theme: 0,
            car: 1,
            soundtrack: 1,
            uid: 1,
        };
        assert!(!draft.has_course_data());
        draft.course_data = None;
        assert!(!draft.has_course_data());
        draft.course_data = Some(json!({"a": 1}).as_object().cloned().unwrap());
        assert!(draft.has_course_data());
    }
}
