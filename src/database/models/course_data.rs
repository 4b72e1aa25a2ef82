use serde_json::{Map, Value};
use sqlx::PgExecutor;

use crate::database::manager;
use crate::database::models::{ModelResult, Required};
use crate::database::DynamicQuery;

/// Level geometry as sent by the client. Stored verbatim in a JSONB column.
pub type CourseData = Map<String, Value>;

pub async fn create<'e, E>(executor: E, level_id: i32, map_data: &CourseData) -> ModelResult<()>
where
    E: PgExecutor<'e>,
{
    Required::new().number("levelId", level_id).finish()?;

    let sql = DynamicQuery::insert("course_data")
        .set("level_id", level_id)
        .set("map_data", map_data.clone())
        .build();
    manager::execute(executor, &sql).await?;
    Ok(())
}

pub async fn update<'e, E>(executor: E, level_id: i32, map_data: &CourseData) -> ModelResult<u64>
where
    E: PgExecutor<'e>,
{
    Required::new().number("levelId", level_id).finish()?;

    let sql = DynamicQuery::update("course_data")
        .set("map_data", map_data.clone())
        .where_("level_id", "=", level_id)
        .build();
    Ok(manager::execute(executor, &sql).await?)
}
