//! Per-level aggregates over the events table.
//!
//! Each statistic is a grouped SELECT assembled with [`DynamicQuery`]; the
//! optional `gt`/`lt` thresholds are applied to the grouped rows afterwards.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::models::{ModelResult, Required};
use crate::database::{Database, DynamicQuery, SqlResult};

/// Time window and value thresholds shared by every statistic.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct StatsFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub gt: Option<f64>,
    pub lt: Option<f64>,
}

impl StatsFilter {
    /// Inclusive on both ends; a missing bound does not filter.
    pub fn admits(&self, value: f64) -> bool {
        self.gt.map_or(true, |gt| value >= gt) && self.lt.map_or(true, |lt| value <= lt)
    }

    pub fn retain<T: Measured>(&self, rows: &mut Vec<T>) {
        rows.retain(|row| self.admits(row.value()));
    }
}

/// The number a statistic row is filtered on.
pub trait Measured {
    fn value(&self) -> f64;
}

#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyStarts {
    pub game_starts: i64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct DailyCompletes {
    #[serde(rename = "gameCompletes")]
    pub game_complete: i64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyAvgTime {
    pub avg_time: Option<f64>,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyUniqueUsers {
    pub unique_users: i64,
    pub month: i32,
}

impl Measured for DailyStarts {
    fn value(&self) -> f64 {
        self.game_starts as f64
    }
}

impl Measured for DailyCompletes {
    fn value(&self) -> f64 {
        self.game_complete as f64
    }
}

impl Measured for DailyAvgTime {
    fn value(&self) -> f64 {
        self.avg_time.unwrap_or_default()
    }
}

impl Measured for MonthlyUniqueUsers {
    fn value(&self) -> f64 {
        self.unique_users as f64
    }
}

const DAY: &str = "date(timestamp)";
const MONTH: &str = "EXTRACT(MONTH FROM timestamp)";

fn grouped_query(
    aggregate: &str,
    bucket: &str,
    group: &str,
    event_type: &str,
    level_id: i32,
    filter: &StatsFilter,
) -> SqlResult {
    let mut query = DynamicQuery::select_from("events")
        .select(aggregate)
        .select(bucket)
        .where_("event_type", "=", event_type)
        .and("level_id", "=", level_id);
    if let Some(from) = filter.from {
        query = query.and("timestamp", ">=", from);
    }
    if let Some(to) = filter.to {
        query = query.and("timestamp", "<=", to);
    }
    query.group_by(group).build()
}

fn starts_query(level_id: i32, filter: &StatsFilter) -> SqlResult {
    grouped_query("COUNT(*) game_starts", "date(timestamp) AS date", DAY, "game_start", level_id, filter)
}

fn completes_query(level_id: i32, filter: &StatsFilter) -> SqlResult {
    grouped_query("COUNT(*) game_complete", "date(timestamp) AS date", DAY, "game_finish", level_id, filter)
}

fn avg_time_query(level_id: i32, filter: &StatsFilter) -> SqlResult {
    grouped_query("AVG(time)::float8 avg_time", "date(timestamp) AS date", DAY, "game_finish", level_id, filter)
}

fn unique_users_query(level_id: i32, filter: &StatsFilter) -> SqlResult {
    grouped_query(
        "COUNT(DISTINCT uid) unique_users",
        "EXTRACT(MONTH FROM timestamp)::int AS month",
        MONTH,
        "game_finish",
        level_id,
        filter,
    )
}

async fn run<T>(db: &Database, sql: SqlResult, filter: &StatsFilter) -> ModelResult<Vec<T>>
where
    T: Measured + for<'r> FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
{
    let mut rows = db.fetch_all::<T>(&sql).await?;
    filter.retain(&mut rows);
    Ok(rows)
}

/// `game_start` events per day.
pub async fn starts(db: &Database, level_id: i32, filter: &StatsFilter) -> ModelResult<Vec<DailyStarts>> {
    Required::new().number("levelId", level_id).finish()?;
    run(db, starts_query(level_id, filter), filter).await
}

/// `game_finish` events per day.
pub async fn completes(db: &Database, level_id: i32, filter: &StatsFilter) -> ModelResult<Vec<DailyCompletes>> {
    Required::new().number("levelId", level_id).finish()?;
    run(db, completes_query(level_id, filter), filter).await
}

/// Mean finishing time per day.
pub async fn avg_time(db: &Database, level_id: i32, filter: &StatsFilter) -> ModelResult<Vec<DailyAvgTime>> {
    Required::new().number("levelId", level_id).finish()?;
    run(db, avg_time_query(level_id, filter), filter).await
}

/// Distinct finishers per calendar month.
pub async fn unique_users(
    db: &Database,
    level_id: i32,
    filter: &StatsFilter,
) -> ModelResult<Vec<MonthlyUniqueUsers>> {
    Required::new().number("levelId", level_id).finish()?;
    run(db, unique_users_query(level_id, filter), filter).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn starts_are_grouped_per_day() {
        let sql = starts_query(6, &StatsFilter::default());
        assert_eq!(
            sql.query,
            "SELECT COUNT(*) game_starts, date(timestamp) AS date FROM events WHERE event_type = $1 AND level_id = $2 GROUP BY date(timestamp);"
        );
        assert_eq!(sql.params.len(), 2);
    }

    #[test]
    fn time_window_adds_predicates() {
        let filter = StatsFilter {
            from: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            to: Some(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()),
            ..Default::default()
        };
        let sql = unique_users_query(6, &filter);
        assert_eq!(
            sql.query,
            "SELECT COUNT(DISTINCT uid) unique_users, EXTRACT(MONTH FROM timestamp)::int AS month FROM events WHERE event_type = $1 AND level_id = $2 AND timestamp >= $3 AND timestamp <= $4 GROUP BY EXTRACT(MONTH FROM timestamp);"
        );
        assert_eq!(sql.params.len(), 4);
    }

    #[test]
    fn thresholds_are_inclusive() {
        let filter = StatsFilter {
            gt: Some(2.0),
            lt: Some(5.0),
            ..Default::default()
        };
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let mut rows: Vec<DailyStarts> = [1, 2, 4, 5, 9]
            .into_iter()
            .map(|n| DailyStarts { game_starts: n, date: day })
            .collect();
        filter.retain(&mut rows);
        let kept: Vec<i64> = rows.iter().map(|r| r.game_starts).collect();
        assert_eq!(kept, vec![2, 4, 5]);
    }

    #[test]
    fn no_thresholds_keep_everything() {
        let filter = StatsFilter::default();
        assert!(filter.admits(0.0));
        assert!(filter.admits(1e9));
    }
}
