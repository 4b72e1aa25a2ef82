use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::models::{ModelResult, Required};
use crate::database::{raw, Database, DatabaseError, DynamicQuery};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Collection {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub uid: i32,
    pub created: DateTime<Utc>,
    pub updated: Option<DateTime<Utc>>,
}

/// Collection joined with its owner's display name.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CollectionData {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub collection: Collection,
    pub user_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewCollection {
    pub name: String,
    pub description: String,
    #[serde(skip)]
    pub uid: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CollectionUpdate {
    pub id: i32,
    #[serde(skip)]
    pub uid: i32,
    pub name: String,
    pub description: String,
}

const SELECT_WITH_OWNER: &str =
    "SELECT c.id, c.name, c.description, c.uid, c.created, c.updated, u.name user_name FROM collection c INNER JOIN users u ON c.uid = u.id";

pub async fn create(db: &Database, collection: &NewCollection) -> ModelResult<i32> {
    Required::new()
        .text("name", &collection.name)
        .number("uid", collection.uid)
        .finish()?;

    let sql = DynamicQuery::insert("collection")
        .set("uid", collection.uid)
        .set("name", &collection.name)
        .set("description", &collection.description)
        .returning("id")
        .build();
    Ok(db.fetch_scalar::<i32>(&sql).await?)
}

pub async fn get(db: &Database, id: i32) -> ModelResult<CollectionData> {
    Required::new().number("id", id).finish()?;

    let sql = raw(&format!("{SELECT_WITH_OWNER} WHERE c.id = $1;"), vec![id.into()]);
    Ok(db.fetch_one::<CollectionData>(&sql).await?)
}

pub async fn by_user(db: &Database, uid: i32) -> ModelResult<Vec<CollectionData>> {
    Required::new().number("uid", uid).finish()?;

    let sql = raw(&format!("{SELECT_WITH_OWNER} WHERE c.uid = $1 ORDER BY c.id;"), vec![uid.into()]);
    Ok(db.fetch_all::<CollectionData>(&sql).await?)
}

pub async fn delete(db: &Database, id: i32, uid: i32) -> ModelResult<()> {
    Required::new().number("id", id).number("uid", uid).finish()?;

    let sql = raw("DELETE FROM collection WHERE id = $1 AND uid = $2;", vec![id.into(), uid.into()]);
    if db.execute(&sql).await? == 0 {
        return Err(DatabaseError::NotFound(format!("collection {id}")).into());
    }
    Ok(())
}

pub async fn update(db: &Database, update: &CollectionUpdate) -> ModelResult<()> {
    Required::new()
        .number("id", update.id)
        .number("uid", update.uid)
        .finish()?;

    let mut query = DynamicQuery::update("collection").set("updated", Utc::now());
    if !update.name.is_empty() {
        query = query.set("name", &update.name);
    }
    if !update.description.is_empty() {
        query = query.set("description", &update.description);
    }
    let sql = query.where_("id", "=", update.id).and("uid", "=", update.uid).build();

    if db.execute(&sql).await? == 0 {
        return Err(DatabaseError::NotFound(format!("collection {}", update.id)).into());
    }
    Ok(())
}

pub async fn query_fts(db: &Database, query: &str) -> ModelResult<Vec<Collection>> {
    Required::new().text("query", query).finish()?;

    let sql = raw("SELECT * FROM query_gin(null::collection, $1);", vec![query.into()]);
    Ok(db.fetch_all::<Collection>(&sql).await?)
}

/// Whether `uid` owns the collection. A missing collection is not found.
pub async fn is_owner(db: &Database, collection_id: i32, uid: i32) -> ModelResult<bool> {
    Required::new().number("collectionId", collection_id).finish()?;

    let sql = raw("SELECT uid FROM collection WHERE id = $1;", vec![collection_id.into()]);
    let owner = db.fetch_scalar::<i32>(&sql).await?;
    Ok(owner == uid)
}

pub async fn trending(db: &Database) -> ModelResult<Vec<Collection>> {
    let sql = raw(
        "SELECT id, name, description, uid, created, updated FROM trending_collections;",
        Vec::new(),
    );
    Ok(db.fetch_all::<Collection>(&sql).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_data_flattens_into_one_object() {
        let data = CollectionData {
            collection: Collection {
                id: 2,
                name: "Best of".to_string(),
                description: String::new(),
                uid: 1,
                created: Utc::now(),
                updated: None,
            },
            user_name: "Ana".to_string(),
        };
        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value["id"], 2);
        assert_eq!(value["userName"], "Ana");
        assert!(value.get("collection").is_none());
    }
}
