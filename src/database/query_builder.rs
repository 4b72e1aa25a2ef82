//! Fluent assembler for parameterized INSERT / UPDATE / SELECT statements.
//!
//! Every configuration call consumes the builder and hands back a new value,
//! so a conditional chain has to be threaded explicitly:
//!
//! ```
//! use maker_api::database::query_builder::DynamicQuery;
//!
//! let mut query = DynamicQuery::update("drafts");
//! let name = "Night drive";
//! if !name.is_empty() {
//!     query = query.set("name", name);
//! }
//! let sql = query.where_("id", "=", 3).and("uid", "=", 9).build();
//! assert_eq!(sql.query, "UPDATE drafts SET name = $1 WHERE id = $2 AND uid = $3;");
//! ```
//!
//! Identifiers and select expressions are emitted verbatim. They must be
//! literals chosen by the calling code, never request input.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

/// A single positional argument of a built statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlArg {
    Int(i32),
    Float(f64),
    Bool(bool),
    Text(String),
    Json(Value),
    Timestamp(DateTime<Utc>),
}

impl From<i32> for SqlArg {
    fn from(v: i32) -> Self {
        SqlArg::Int(v)
    }
}

impl From<f64> for SqlArg {
    fn from(v: f64) -> Self {
        SqlArg::Float(v)
    }
}

impl From<bool> for SqlArg {
    fn from(v: bool) -> Self {
        SqlArg::Bool(v)
    }
}

impl From<&str> for SqlArg {
    fn from(v: &str) -> Self {
        SqlArg::Text(v.to_string())
    }
}

impl From<String> for SqlArg {
    fn from(v: String) -> Self {
        SqlArg::Text(v)
    }
}

impl From<&String> for SqlArg {
    fn from(v: &String) -> Self {
        SqlArg::Text(v.clone())
    }
}

impl From<Value> for SqlArg {
    fn from(v: Value) -> Self {
        SqlArg::Json(v)
    }
}

impl From<Map<String, Value>> for SqlArg {
    fn from(v: Map<String, Value>) -> Self {
        SqlArg::Json(Value::Object(v))
    }
}

impl From<DateTime<Utc>> for SqlArg {
    fn from(v: DateTime<Utc>) -> Self {
        SqlArg::Timestamp(v)
    }
}

/// Statement text plus its positional arguments, ready to bind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<SqlArg>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryKind {
    #[default]
    Unset,
    Insert,
    Update,
    Select,
}

#[derive(Debug, Clone)]
struct Predicate {
    column: String,
    op: String,
}

#[derive(Debug, Clone, Default)]
pub struct DynamicQuery {
    table: String,
    kind: QueryKind,
    columns: Vec<String>,
    values: Vec<SqlArg>,
    select_list: Vec<String>,
    predicates: Vec<Predicate>,
    predicate_values: Vec<SqlArg>,
    group_by: Option<String>,
    returning: Option<String>,
}

impl DynamicQuery {
    pub fn insert(table: impl Into<String>) -> Self {
        Self::begin(table, QueryKind::Insert)
    }

    pub fn update(table: impl Into<String>) -> Self {
        Self::begin(table, QueryKind::Update)
    }

    pub fn select_from(table: impl Into<String>) -> Self {
        Self::begin(table, QueryKind::Select)
    }

    fn begin(table: impl Into<String>, kind: QueryKind) -> Self {
        Self {
            table: table.into(),
            kind,
            ..Self::default()
        }
    }

    /// Assign `column` for INSERT or UPDATE. Ignored for SELECT.
    pub fn set(mut self, column: &str, value: impl Into<SqlArg>) -> Self {
        match self.kind {
            QueryKind::Insert | QueryKind::Update => {
                self.columns.push(column.to_string());
                self.values.push(value.into());
            }
            QueryKind::Select | QueryKind::Unset => {
                tracing::warn!("set({}) ignored on {:?} query for {}", column, self.kind, self.table);
            }
        }
        self
    }

    /// Append a raw select expression, e.g. `COUNT(*) game_starts`.
    pub fn select(mut self, expr: &str) -> Self {
        if self.kind == QueryKind::Select {
            self.select_list.push(expr.to_string());
        } else {
            tracing::warn!("select({}) ignored on {:?} query for {}", expr, self.kind, self.table);
        }
        self
    }

    /// Start the WHERE clause. Replaces any predicates added earlier.
    pub fn where_(mut self, column: &str, op: &str, value: impl Into<SqlArg>) -> Self {
        self.predicates.clear();
        self.predicate_values.clear();
        self.and(column, op, value)
    }

    pub fn and(mut self, column: &str, op: &str, value: impl Into<SqlArg>) -> Self {
        self.predicates.push(Predicate {
            column: column.to_string(),
            op: op.to_string(),
        });
        self.predicate_values.push(value.into());
        self
    }

    pub fn group_by(mut self, expr: &str) -> Self {
        self.group_by = Some(expr.to_string());
        self
    }

    pub fn returning(mut self, column: &str) -> Self {
        self.returning = Some(column.to_string());
        self
    }

    pub fn build(self) -> SqlResult {
        match self.kind {
            QueryKind::Update => self.build_update(),
            QueryKind::Insert => self.build_insert(),
            QueryKind::Select => self.build_select(),
            QueryKind::Unset => SqlResult::default(),
        }
    }

    fn build_update(self) -> SqlResult {
        let assignments = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, column)| format!("{} = ${}", column, i + 1))
            .collect::<Vec<_>>()
            .join(", ");

        let mut query = format!("UPDATE {} SET {}", self.table, assignments);
        if let Some(clause) = self.where_clause(self.columns.len()) {
            query.push_str(" WHERE ");
            query.push_str(&clause);
        }
        query.push(';');

        let mut params = self.values;
        params.extend(self.predicate_values);
        SqlResult { query, params }
    }

    fn build_insert(self) -> SqlResult {
        let placeholders = (1..=self.columns.len())
            .map(|i| format!("${}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let returning = self
            .returning
            .as_deref()
            .map(|column| format!(" RETURNING {}", column))
            .unwrap_or_default();

        let query = format!(
            "INSERT INTO {} ({}) VALUES ({}){};",
            self.table,
            self.columns.join(", "),
            placeholders,
            returning
        );
        SqlResult { query, params: self.values }
    }

    fn build_select(self) -> SqlResult {
        let mut query = format!("SELECT {} FROM {}", self.select_list.join(", "), self.table);
        if let Some(clause) = self.where_clause(0) {
            query.push_str(" WHERE ");
            query.push_str(&clause);
        }
        if let Some(group_by) = &self.group_by {
            query.push_str(" GROUP BY ");
            query.push_str(group_by);
        }
        query.push(';');
        SqlResult { query, params: self.predicate_values }
    }

    /// Predicates joined by AND, numbered after the first `offset` placeholders.
    fn where_clause(&self, offset: usize) -> Option<String> {
        if self.predicates.is_empty() {
            return None;
        }
        let clause = self
            .predicates
            .iter()
            .enumerate()
            .map(|(i, p)| format!("{} {} ${}", p.column, p.op, offset + i + 1))
            .collect::<Vec<_>>()
            .join(" AND ");
        Some(clause)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placeholder_count(query: &str) -> usize {
        let mut seen = std::collections::BTreeSet::new();
        let bytes = query.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'$' {
                let start = i + 1;
                let mut end = start;
                while end < bytes.len() && bytes[end].is_ascii_digit() {
                    end += 1;
                }
                if end > start {
                    seen.insert(query[start..end].to_string());
                }
                i = end;
            } else {
                i += 1;
            }
        }
        seen.len()
    }

    #[test]
    fn insert_with_returning() {
        let sql = DynamicQuery::insert("levels")
            .set("name", "A")
            .set("uid", 5)
            .returning("id")
            .build();
        assert_eq!(sql.query, "INSERT INTO levels (name, uid) VALUES ($1, $2) RETURNING id;");
        assert_eq!(sql.params, vec![SqlArg::Text("A".into()), SqlArg::Int(5)]);
    }

    #[test]
    fn insert_numbers_columns_in_call_order() {
        let mut query = DynamicQuery::insert("events");
        for (i, column) in ["event_type", "uid", "level_id", "draft_id", "state"].iter().enumerate() {
            query = query.set(column, i as i32);
        }
        let sql = query.build();
        assert_eq!(
            sql.query,
            "INSERT INTO events (event_type, uid, level_id, draft_id, state) VALUES ($1, $2, $3, $4, $5);"
        );
        assert_eq!(sql.params, (0..5).map(SqlArg::Int).collect::<Vec<_>>());
    }

    #[test]
    fn update_with_owner_scope() {
        let sql = DynamicQuery::update("levels")
            .set("name", "B")
            .where_("id", "=", 7)
            .and("uid", "=", 5)
            .build();
        assert_eq!(sql.query, "UPDATE levels SET name = $1 WHERE id = $2 AND uid = $3;");
        assert_eq!(
            sql.params,
            vec![SqlArg::Text("B".into()), SqlArg::Int(7), SqlArg::Int(5)]
        );
    }

    #[test]
    fn update_without_predicates_has_no_where() {
        let sql = DynamicQuery::update("users").set("name", "x").set("email", "y").build();
        assert_eq!(sql.query, "UPDATE users SET name = $1, email = $2;");
        assert!(!sql.query.contains("WHERE"));
    }

    #[test]
    fn update_chains_k_and_conditions() {
        let mut query = DynamicQuery::update("drafts").set("name", "n").where_("id", "=", 1);
        for k in 0..4 {
            query = query.and(&format!("c{}", k), "<>", k);
        }
        let sql = query.build();
        let where_part = sql.query.split(" WHERE ").nth(1).unwrap_or_default();
        assert_eq!(where_part.split(" AND ").count(), 5);
        assert_eq!(
            where_part,
            "id = $2 AND c0 <> $3 AND c1 <> $4 AND c2 <> $5 AND c3 <> $6;"
        );
    }

    #[test]
    fn interleaved_where_keeps_placeholders_aligned() {
        let sql = DynamicQuery::update("levels")
            .where_("id", "=", 7)
            .set("name", "B")
            .and("uid", "=", 5)
            .set("theme", 2)
            .build();
        assert_eq!(
            sql.query,
            "UPDATE levels SET name = $1, theme = $2 WHERE id = $3 AND uid = $4;"
        );
        assert_eq!(
            sql.params,
            vec![SqlArg::Text("B".into()), SqlArg::Int(2), SqlArg::Int(7), SqlArg::Int(5)]
        );
    }

    #[test]
    fn where_replaces_earlier_predicates() {
        let sql = DynamicQuery::select_from("drafts")
            .select("*")
            .where_("id", "=", 1)
            .where_("uid", "=", 2)
            .build();
        assert_eq!(sql.query, "SELECT * FROM drafts WHERE uid = $1;");
        assert_eq!(sql.params, vec![SqlArg::Int(2)]);
    }

    #[test]
    fn select_with_aggregates_and_group_by() {
        let sql = DynamicQuery::select_from("events")
            .select("COUNT(*) game_starts")
            .select("date(timestamp)")
            .where_("event_type", "=", "game_start")
            .and("level_id", "=", 4)
            .group_by("date(timestamp)")
            .build();
        assert_eq!(
            sql.query,
            "SELECT COUNT(*) game_starts, date(timestamp) FROM events WHERE event_type = $1 AND level_id = $2 GROUP BY date(timestamp);"
        );
        assert_eq!(sql.params.len(), 2);
    }

    #[test]
    fn select_without_columns_is_degenerate() {
        let sql = DynamicQuery::select_from("levels").build();
        assert_eq!(sql.query, "SELECT  FROM levels;");
        assert!(sql.params.is_empty());
    }

    #[test]
    fn group_by_last_call_wins() {
        let sql = DynamicQuery::select_from("events")
            .select("COUNT(*)")
            .group_by("uid")
            .group_by("level_id")
            .build();
        assert_eq!(sql.query, "SELECT COUNT(*) FROM events GROUP BY level_id;");
    }

    #[test]
    fn unset_query_builds_nothing() {
        let sql = DynamicQuery::default().set("name", "x").where_("id", "=", 1).build();
        assert_eq!(sql, SqlResult::default());
    }

    #[test]
    fn misplaced_calls_are_ignored() {
        let sql = DynamicQuery::select_from("levels").select("id").set("name", "x").build();
        assert_eq!(sql.query, "SELECT id FROM levels;");
        assert!(sql.params.is_empty());

        let sql = DynamicQuery::insert("levels").select("id").set("name", "x").build();
        assert_eq!(sql.query, "INSERT INTO levels (name) VALUES ($1);");
    }

    #[test]
    fn clones_branch_independently() {
        let base = DynamicQuery::update("drafts").set("name", "a");
        let left = base.clone().set("theme", 1).where_("id", "=", 1).build();
        let right = base.where_("id", "=", 2).build();
        assert_eq!(left.query, "UPDATE drafts SET name = $1, theme = $2 WHERE id = $3;");
        assert_eq!(right.query, "UPDATE drafts SET name = $1 WHERE id = $2;");
    }

    #[test]
    fn placeholder_count_matches_params_for_every_kind() {
        let built = vec![
            DynamicQuery::insert("t").set("a", 1).set("b", "x").where_("z", "=", 9).build(),
            DynamicQuery::update("t").set("a", 1).where_("id", "=", 2).and("u", "=", 3).build(),
            DynamicQuery::update("t").set("a", 1).build(),
            DynamicQuery::select_from("t").select("a").where_("b", ">=", 1.5).build(),
            DynamicQuery::select_from("t").select("a").build(),
            DynamicQuery::default().build(),
        ];
        for sql in built {
            assert_eq!(placeholder_count(&sql.query), sql.params.len(), "{}", sql.query);
        }
    }
}
