use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, PgExecutor};
use tracing::warn;

use crate::database::manager;
use crate::database::models::draft::Draft;
use crate::database::models::{course_data, CourseData, ModelError, ModelResult, Required};
use crate::database::{raw, Database, DatabaseError, DynamicQuery};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Level {
    pub id: i32,
    pub difficulty: i32,
    pub name: String,
    pub description: String,
    pub uid: i32,
    pub created: DateTime<Utc>,
    pub updated: Option<DateTime<Utc>>,
    pub theme: i32,
    pub car: i32,
    pub soundtrack: i32,
    /// Absent from info views, which do not join course_data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_data: Option<CourseData>,
}

#[derive(Debug, FromRow)]
pub(crate) struct LevelRow {
    id: i32,
    difficulty: i32,
    name: String,
    description: String,
    uid: i32,
    created: DateTime<Utc>,
    updated: Option<DateTime<Utc>>,
    theme: i32,
    car: i32,
    soundtrack: i32,
    #[sqlx(default)]
    course_data: Option<Json<CourseData>>,
}

impl From<LevelRow> for Level {
    fn from(row: LevelRow) -> Self {
        Self {
            id: row.id,
            difficulty: row.difficulty,
            name: row.name,
            description: row.description,
            uid: row.uid,
            created: row.created,
            updated: row.updated,
            theme: row.theme,
            car: row.car,
            soundtrack: row.soundtrack,
            course_data: row.course_data.map(|Json(map)| map),
        }
    }
}

pub(crate) fn into_levels(rows: Vec<LevelRow>) -> Vec<Level> {
    rows.into_iter().map(Level::from).collect()
}

/// Body of a level creation. The owner comes from the token, never the body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewLevel {
    pub difficulty: i32,
    pub name: String,
    pub description: String,
    #[serde(skip)]
    pub uid: i32,
    pub theme: i32,
    pub car: i32,
    pub soundtrack: i32,
    pub course_data: Option<CourseData>,
}

impl NewLevel {
    pub fn validate(&self) -> ModelResult<()> {
        Required::new()
            .number("difficulty", self.difficulty)
            .text("name", &self.name)
            .text("description", &self.description)
            .number("uid", self.uid)
            .number("theme", self.theme)
            .number("car", self.car)
            .number("soundtrack", self.soundtrack)
            .present("courseData", &self.course_data)
            .finish()
    }

    fn insert_query(&self) -> DynamicQuery {
        DynamicQuery::insert("levels")
            .set("difficulty", self.difficulty)
            .set("name", &self.name)
            .set("description", &self.description)
            .set("uid", self.uid)
            .set("theme", self.theme)
            .set("car", self.car)
            .set("soundtrack", self.soundtrack)
            .returning("id")
    }
}

/// Partial update. Zero values are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LevelUpdate {
    pub id: i32,
    #[serde(skip)]
    pub uid: i32,
    pub name: String,
    pub difficulty: i32,
    pub description: String,
    pub theme: i32,
    pub car: i32,
    pub soundtrack: i32,
    pub course_data: Option<CourseData>,
}

impl LevelUpdate {
    fn update_query(&self, now: DateTime<Utc>) -> DynamicQuery {
        let mut query = DynamicQuery::update("levels").set("updated", now);
        if !self.name.is_empty() {
            query = query.set("name", &self.name);
        }
        if self.difficulty != 0 {
            query = query.set("difficulty", self.difficulty);
        }
        if !self.description.is_empty() {
            query = query.set("description", &self.description);
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
        query.where_("id", "=", self.id).and("uid", "=", self.uid)
    }
}

/// Inserts only the level row. Course data is the caller's job.
pub(crate) async fn insert<'e, E>(executor: E, level: &NewLevel) -> ModelResult<i32>
where
    E: PgExecutor<'e>,
{
    let sql = level.insert_query().build();
    Ok(manager::fetch_scalar::<_, i32>(executor, &sql).await?)
}

/// Inserts the level, then its course data. When the second insert fails the
/// level row is deleted again on a best-effort basis.
pub async fn create(db: &Database, level: &NewLevel) -> ModelResult<i32> {
    level.validate()?;
    let map_data = level.course_data.as_ref().ok_or_else(|| ModelError::MissingFields(vec!["courseData"]))?;

    let id = insert(db.pool(), level).await?;
    if let Err(e) = course_data::create(db.pool(), id, map_data).await {
        warn!(level_id = id, "course data insert failed, removing level: {}", e);
        let cleanup = raw("DELETE FROM levels WHERE id = $1;", vec![id.into()]);
        if let Err(cleanup_err) = db.execute(&cleanup).await {
            warn!(level_id = id, "compensating delete failed: {}", cleanup_err);
        }
        return Err(e);
    }
    Ok(id)
}

/// Level with its course data.
pub async fn get(db: &Database, id: i32) -> ModelResult<Level> {
    Required::new().number("id", id).finish()?;

    let sql = raw(
        "SELECT l.*, c.map_data course_data FROM levels l INNER JOIN course_data c ON l.id = c.level_id WHERE l.id = $1;",
        vec![id.into()],
    );
    Ok(db.fetch_one::<LevelRow>(&sql).await?.into())
}

/// Level metadata only.
pub async fn get_info(db: &Database, id: i32) -> ModelResult<Level> {
    Required::new().number("id", id).finish()?;

    let sql = raw("SELECT * FROM levels WHERE id = $1;", vec![id.into()]);
    Ok(db.fetch_one::<LevelRow>(&sql).await?.into())
}

pub async fn by_user(db: &Database, uid: i32) -> ModelResult<Vec<Level>> {
    Required::new().number("uid", uid).finish()?;

    let sql = raw("SELECT * FROM levels WHERE uid = $1 ORDER BY id;", vec![uid.into()]);
    Ok(into_levels(db.fetch_all::<LevelRow>(&sql).await?))
}

/// Applies a partial update scoped to the owner. A level that does not exist
/// or belongs to someone else reports not found.
pub async fn update(db: &Database, update: &LevelUpdate) -> ModelResult<()> {
    Required::new()
        .number("id", update.id)
        .number("uid", update.uid)
        .finish()?;

    let mut tx = db.pool().begin().await?;
    let sql = update.update_query(Utc::now()).build();
    if manager::execute(&mut *tx, &sql).await? == 0 {
        return Err(DatabaseError::NotFound(format!("level {}", update.id)).into());
    }
    if let Some(map_data) = &update.course_data {
        course_data::update(&mut *tx, update.id, map_data).await?;
    }
    tx.commit().await?;
    Ok(())
}

/// Copies a draft's contents over the level it was forked from. The level
/// owner has to be the draft owner and the draft has to carry course data.
pub async fn update_from_draft(db: &Database, level_id: i32, draft: &Draft) -> ModelResult<()> {
    Required::new().number("levelId", level_id).finish()?;

    let owner = raw("SELECT uid FROM levels WHERE id = $1;", vec![level_id.into()]);
    let level_uid = db.fetch_scalar::<i32>(&owner).await?;
    if level_uid != draft.uid || !draft.has_course_data() {
        return Err(ModelError::Invalid("invalid draft".to_string()));
    }

    let changes = LevelUpdate {
        id: level_id,
        uid: level_uid,
        name: draft.name.clone(),
        car: draft.car,
        soundtrack: draft.soundtrack,
        course_data: draft.course_data.clone(),
        ..Default::default()
    };
    update(db, &changes).await
}

pub async fn query_fts(db: &Database, query: &str) -> ModelResult<Vec<Level>> {
    Required::new().text("query", query).finish()?;

    let sql = raw("SELECT * FROM query_gin(null::levels, $1);", vec![query.into()]);
    Ok(into_levels(db.fetch_all::<LevelRow>(&sql).await?))
}

/// Deleting a level would orphan leaderboards, collections and drafts; there
/// is no cascade for it yet.
pub async fn delete(_db: &Database, _id: i32) -> ModelResult<()> {
    Err(ModelError::NotImplemented)
}

pub async fn trending(db: &Database) -> ModelResult<Vec<Level>> {
    let sql = raw("SELECT * FROM trending_levels;", Vec::new());
    Ok(into_levels(db.fetch_all::<LevelRow>(&sql).await?))
}
