//! Entity types and their data-access functions.
//!
//! Every function validates its required fields before touching the store,
//! then builds SQL (through [`DynamicQuery`](crate::database::DynamicQuery)
//! or as a literal) and maps rows into the public entity types.

pub mod collection;
pub mod collection_levels;
pub mod course_data;
pub mod draft;
pub mod event;
pub mod leaderboard;
pub mod level;
pub mod stats;
pub mod user;

use thiserror::Error;

use crate::database::DatabaseError;

pub use course_data::CourseData;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("{0}")]
    Invalid(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("not implemented")]
    NotImplemented,

    #[error("could not encode JSON: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("could not hash password: {0}")]
    Password(#[from] bcrypt::BcryptError),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for ModelError {
    fn from(err: sqlx::Error) -> Self {
        ModelError::Database(err.into())
    }
}

pub type ModelResult<T> = Result<T, ModelError>;

/// Collects the names of required fields that hold their zero value.
#[derive(Debug, Default)]
pub struct Required {
    missing: Vec<&'static str>,
}

impl Required {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &'static str, value: &str) -> Self {
        if value.is_empty() {
            self.missing.push(name);
        }
        self
    }

    pub fn number(mut self, name: &'static str, value: i32) -> Self {
        if value == 0 {
            self.missing.push(name);
        }
        self
    }

    pub fn present<T>(mut self, name: &'static str, value: &Option<T>) -> Self {
        if value.is_none() {
            self.missing.push(name);
        }
        self
    }

    pub fn finish(self) -> ModelResult<()> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(ModelError::MissingFields(self.missing))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_reports_every_zero_field_in_order() {
        let err = Required::new()
            .text("name", "")
            .number("uid", 4)
            .number("theme", 0)
            .present::<i32>("courseData", &None)
            .finish()
            .unwrap_err();

        match err {
            ModelError::MissingFields(fields) => assert_eq!(fields, vec!["name", "theme", "courseData"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn required_passes_when_all_fields_are_set() {
        assert!(Required::new().text("email", "a@b.c").number("id", 1).finish().is_ok());
    }
}
