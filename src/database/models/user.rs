use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::warn;

use crate::auth::password;
use crate::database::models::{ModelError, ModelResult, Required};
use crate::database::{raw, Database, DatabaseError, DynamicQuery};

/// Full account row. Carries the password hash, so it never leaves this module
/// except through [`User::to_user_data`].
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub password: String,
    pub joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// Public view of an account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserData {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    pub fn to_user_data(&self) -> UserData {
        UserData {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            joined: self.joined,
            last_login: self.last_login,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Registration {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

impl Registration {
    pub fn validate(&self) -> ModelResult<()> {
        Required::new()
            .text("email", &self.email)
            .text("password", &self.password)
            .text("name", &self.name)
            .finish()
    }
}

/// Creates the account and returns its id.
pub async fn register(db: &Database, registration: &Registration) -> ModelResult<i32> {
    registration.validate()?;

    let hash = password::hash(&registration.password).await?;
    let sql = DynamicQuery::insert("users")
        .set("email", &registration.email)
        .set("name", &registration.name)
        .set("password", hash)
        .returning("id")
        .build();
    Ok(db.fetch_scalar::<i32>(&sql).await?)
}

/// Resolves credentials to the account. Unknown email and wrong password are
/// indistinguishable to the caller.
pub async fn authenticate(db: &Database, credentials: &Credentials) -> ModelResult<User> {
    Required::new()
        .text("email", &credentials.email)
        .text("password", &credentials.password)
        .finish()?;

    let sql = raw("SELECT * FROM users WHERE email = $1;", vec![(&credentials.email).into()]);
    let user = match db.fetch_optional::<User>(&sql).await? {
        Some(user) => user,
        None => return Err(ModelError::InvalidCredentials),
    };

    if !password::verify(&credentials.password, &user.password).await? {
        return Err(ModelError::InvalidCredentials);
    }
    Ok(user)
}

/// Stamps last_login. A failure here must not fail the login itself.
pub async fn record_login(db: &Database, user: &mut User) {
    let now = Utc::now();
    let sql = DynamicQuery::update("users")
        .set("last_login", now)
        .where_("id", "=", user.id)
        .build();
    match db.execute(&sql).await {
        Ok(_) => user.last_login = Some(now),
        Err(e) => warn!(uid = user.id, "token issued, failed to update last login: {}", e),
    }
}

pub async fn get(db: &Database, id: i32) -> ModelResult<UserData> {
    Required::new().number("id", id).finish()?;

    let sql = raw("SELECT * FROM users WHERE id = $1;", vec![id.into()]);
    let user = db.fetch_one::<User>(&sql).await?;
    Ok(user.to_user_data())
}

/// Applies the non-empty fields of `update`. Nothing to change is a no-op.
pub async fn update_profile(db: &Database, id: i32, update: &ProfileUpdate) -> ModelResult<()> {
    Required::new().number("id", id).finish()?;
    if update.name.is_empty() && update.email.is_empty() {
        return Ok(());
    }

    let mut query = DynamicQuery::update("users");
    if !update.name.is_empty() {
        query = query.set("name", &update.name);
    }
    if !update.email.is_empty() {
        query = query.set("email", &update.email);
    }
    let sql = query.where_("id", "=", id).build();

    if db.execute(&sql).await? == 0 {
        return Err(DatabaseError::NotFound(format!("user {id}")).into());
    }
    Ok(())
}

pub async fn query_fts(db: &Database, query: &str) -> ModelResult<Vec<UserData>> {
    Required::new().text("query", query).finish()?;

    let sql = raw("SELECT * FROM query_gin(null::users, $1);", vec![query.into()]);
    let users = db.fetch_all::<User>(&sql).await?;
    Ok(users.iter().map(User::to_user_data).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_requires_every_field() {
        let registration = Registration {
            email: "driver@example.com".to_string(),
            password: String::new(),
            name: "Driver".to_string(),
        };
        match registration.validate() {
            Err(ModelError::MissingFields(fields)) => assert_eq!(fields, vec!["password"]),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn user_data_drops_the_password_hash() {
        let user = User {
            id: 3,
            email: "a@b.c".to_string(),
            name: "A".to_string(),
            password: "$2b$12$hash".to_string(),
            joined: Utc::now(),
            last_login: None,
        };
        let json = serde_json::to_value(user.to_user_data()).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["last_login"], serde_json::Value::Null);
    }
}
