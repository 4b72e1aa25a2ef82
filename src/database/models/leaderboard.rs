use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::database::models::{ModelResult, Required};
use crate::database::{raw, Database};

/// How many entries a leaderboard shows.
pub const LEADERBOARD_SIZE: usize = 10;

#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub level_id: i32,
    pub uid: i32,
    pub time: i32,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "userName")]
    pub name: String,
}

/// Best finishing times for a level, fastest first.
pub async fn for_level(db: &Database, level_id: i32) -> ModelResult<Vec<LeaderboardEntry>> {
    Required::new().number("levelId", level_id).finish()?;

    let sql = raw(
        &format!(
            "SELECT level_id, uid, time, timestamp, name FROM leaderboard WHERE level_id = $1 ORDER BY time LIMIT {LEADERBOARD_SIZE};"
        ),
        vec![level_id.into()],
    );
    Ok(db.fetch_all::<LeaderboardEntry>(&sql).await?)
}
