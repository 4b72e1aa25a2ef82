use serde::Deserialize;

use crate::database::models::level::{into_levels, Level, LevelRow};
use crate::database::models::{ModelResult, Required};
use crate::database::{raw, Database, DynamicQuery};

/// A level/collection pair, as sent by the link and unlink endpoints.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CollectionLevel {
    pub collection_id: i32,
    pub level_id: i32,
}

impl CollectionLevel {
    fn validate(&self) -> ModelResult<()> {
        Required::new()
            .number("collectionId", self.collection_id)
            .number("levelId", self.level_id)
            .finish()
    }
}

pub async fn link(db: &Database, pair: CollectionLevel) -> ModelResult<()> {
    pair.validate()?;

    let sql = DynamicQuery::insert("collection_levels")
        .set("collection_id", pair.collection_id)
        .set("level_id", pair.level_id)
        .build();
    db.execute(&sql).await?;
    Ok(())
}

pub async fn unlink(db: &Database, pair: CollectionLevel) -> ModelResult<()> {
    pair.validate()?;

    let sql = raw(
        "DELETE FROM collection_levels WHERE collection_id = $1 AND level_id = $2;",
        vec![pair.collection_id.into(), pair.level_id.into()],
    );
    db.execute(&sql).await?;
    Ok(())
}

/// Levels of a collection, without course data.
pub async fn levels(db: &Database, collection_id: i32) -> ModelResult<Vec<Level>> {
    Required::new().number("collectionId", collection_id).finish()?;

    let sql = raw(
        "SELECT l.* FROM collection_levels c INNER JOIN levels l ON c.level_id = l.id WHERE c.collection_id = $1 ORDER BY c.id;",
        vec![collection_id.into()],
    );
    Ok(into_levels(db.fetch_all::<LevelRow>(&sql).await?))
}
