//! User repository: credentials, roles, and audit timestamps.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::{Instrument, info, info_span};

use crate::clock;
use crate::error::{Error, is_unique_violation};
use crate::password;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    User,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }

    /// Stored roles outside the enum collapse to `user`; the migration
    /// normalizes them, this covers rows read before it runs.
    #[must_use]
    pub fn from_db(value: &str) -> Self {
        match value {
            "admin" => Self::Admin,
            _ => Self::User,
        }
    }
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: String,
    pub updated_at: String,
}

fn map_user(row: &SqliteRow) -> User {
    let role: String = row.get("role");
    User {
        id: row.get("id"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        role: Role::from_db(&role),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Insert a new user. The store's UNIQUE constraint is the arbiter of
/// username ownership; a violation surfaces as `Conflict`.
pub async fn create(
    pool: &SqlitePool,
    username: &str,
    password: &str,
    role: Role,
) -> Result<User, Error> {
    let stamp = clock::now_wib();
    let password_hash = password::hash(password);
    let query = r"
        INSERT INTO users (username, password_hash, role, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id, username, password_hash, role, created_at, updated_at
    ";
    let span = info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(username)
        .bind(&password_hash)
        .bind(role.as_str())
        .bind(&stamp)
        .bind(&stamp)
        .fetch_one(pool)
        .instrument(span)
        .await;

    match row {
        Ok(row) => Ok(map_user(&row)),
        Err(err) if is_unique_violation(&err) => {
            Err(Error::Conflict("Username is already taken.".to_string()))
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn find_by_username(pool: &SqlitePool, username: &str) -> Result<Option<User>, Error> {
    let query = r"
        SELECT id, username, password_hash, role, created_at, updated_at
        FROM users
        WHERE username = ?
    ";
    let span = info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(username)
        .fetch_optional(pool)
        .instrument(span)
        .await?;
    Ok(row.as_ref().map(map_user))
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>, Error> {
    let query = r"
        SELECT id, username, password_hash, role, created_at, updated_at
        FROM users
        WHERE id = ?
    ";
    let span = info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(span)
        .await?;
    Ok(row.as_ref().map(map_user))
}

/// Rehash and overwrite the stored credential, refreshing `updated_at`.
pub async fn update_password(pool: &SqlitePool, id: i64, new_password: &str) -> Result<(), Error> {
    let query = "UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?";
    let span = info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = "UPDATE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(password::hash(new_password))
        .bind(clock::now_wib())
        .bind(id)
        .execute(pool)
        .instrument(span)
        .await?;
    if result.rows_affected() == 0 {
        return Err(Error::NotFound("No such user.".to_string()));
    }
    Ok(())
}

/// Rename a user; the UNIQUE constraint turns a name held by a different
/// user into `Conflict`. Renaming to the current name is a no-op update
/// that still refreshes `updated_at`.
pub async fn update_username(pool: &SqlitePool, id: i64, new_username: &str) -> Result<(), Error> {
    let query = "UPDATE users SET username = ?, updated_at = ? WHERE id = ?";
    let span = info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = "UPDATE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(new_username)
        .bind(clock::now_wib())
        .bind(id)
        .execute(pool)
        .instrument(span)
        .await;

    match result {
        Ok(done) if done.rows_affected() == 0 => {
            Err(Error::NotFound("No such user.".to_string()))
        }
        Ok(_) => Ok(()),
        Err(err) if is_unique_violation(&err) => {
            Err(Error::Conflict("Username is already taken.".to_string()))
        }
        Err(err) => Err(err.into()),
    }
}

/// Delete a user row; dependent prediction records go with it via the
/// cascade rule.
pub async fn delete(pool: &SqlitePool, id: i64) -> Result<(), Error> {
    let query = "DELETE FROM users WHERE id = ?";
    let span = info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = "DELETE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(id)
        .execute(pool)
        .instrument(span)
        .await?;
    if result.rows_affected() == 0 {
        return Err(Error::NotFound("No such user.".to_string()));
    }
    Ok(())
}

/// Guarantee the admin account before serving traffic. Idempotent: creates
/// the account when absent, promotes a same-named account that lost the
/// role, and leaves a healthy admin untouched.
pub async fn ensure_admin(pool: &SqlitePool, username: &str, password: &str) -> Result<(), Error> {
    match find_by_username(pool, username).await? {
        None => {
            create(pool, username, password, Role::Admin).await?;
            info!(username, "bootstrapped admin account");
            Ok(())
        }
        Some(user) if user.role != Role::Admin => {
            let query = "UPDATE users SET role = ?, updated_at = ? WHERE id = ?";
            let span = info_span!(
                "db.query",
                db.system = "sqlite",
                db.operation = "UPDATE",
                db.statement = query
            );
            sqlx::query(query)
                .bind(Role::Admin.as_str())
                .bind(clock::now_wib())
                .bind(user.id)
                .execute(pool)
                .instrument(span)
                .await?;
            info!(username, "promoted existing account to admin");
            Ok(())
        }
        Some(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store;

    async fn pool() -> SqlitePool {
        let pool = store::connect_in_memory().await.expect("pool");
        store::migrate(&pool).await.expect("migrate");
        pool
    }

    #[tokio::test]
    async fn create_hashes_the_password_and_stamps_both_timestamps() {
        let pool = pool().await;
        let user = create(&pool, "alice", "pw1234", Role::User).await.expect("create");
        assert_ne!(user.password_hash, "pw1234");
        assert!(password::verify("pw1234", &user.password_hash));
        assert_eq!(user.created_at, user.updated_at);
        assert!(user.created_at.ends_with("WIB"));
    }

    #[tokio::test]
    async fn duplicate_usernames_conflict_without_a_second_row() {
        let pool = pool().await;
        create(&pool, "alice", "pw1234", Role::User).await.expect("first");
        let err = create(&pool, "alice", "other", Role::User).await.expect_err("second");
        assert!(matches!(err, Error::Conflict(_)));

        let count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM users WHERE username = 'alice'")
            .fetch_one(&pool)
            .await
            .expect("count")
            .get("n");
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn usernames_are_case_sensitive_as_stored() {
        let pool = pool().await;
        create(&pool, "alice", "pw1234", Role::User).await.expect("create");
        assert!(find_by_username(&pool, "Alice").await.expect("query").is_none());
        assert!(find_by_username(&pool, "alice").await.expect("query").is_some());
    }

    #[tokio::test]
    async fn rename_to_a_taken_name_conflicts_and_leaves_both_rows() {
        let pool = pool().await;
        let alice = create(&pool, "alice", "pw1234", Role::User).await.expect("alice");
        let bob = create(&pool, "bob", "pw1234", Role::User).await.expect("bob");

        let err = update_username(&pool, bob.id, "alice").await.expect_err("conflict");
        assert!(matches!(err, Error::Conflict(_)));

        let alice_after = find_by_id(&pool, alice.id).await.expect("query").expect("row");
        let bob_after = find_by_id(&pool, bob.id).await.expect("query").expect("row");
        assert_eq!(alice_after.username, "alice");
        assert_eq!(bob_after.username, "bob");
        assert_eq!(bob_after.updated_at, bob.updated_at);
    }

    #[tokio::test]
    async fn update_password_rehashes_and_refreshes_updated_at() {
        let pool = pool().await;
        let user = create(&pool, "alice", "pw1234", Role::User).await.expect("create");
        update_password(&pool, user.id, "new-password").await.expect("update");
        let after = find_by_id(&pool, user.id).await.expect("query").expect("row");
        assert!(password::verify("new-password", &after.password_hash));
        assert!(!password::verify("pw1234", &after.password_hash));
    }

    #[tokio::test]
    async fn updates_against_a_missing_user_are_not_found() {
        let pool = pool().await;
        assert!(matches!(
            update_password(&pool, 999, "pw").await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            update_username(&pool, 999, "ghost").await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(delete(&pool, 999).await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn ensure_admin_creates_promotes_and_then_rests() {
        let pool = pool().await;

        ensure_admin(&pool, "admin", "admin").await.expect("bootstrap");
        let admin = find_by_username(&pool, "admin").await.expect("query").expect("row");
        assert_eq!(admin.role, Role::Admin);

        // Second run leaves the row untouched.
        ensure_admin(&pool, "admin", "admin").await.expect("idempotent");
        let again = find_by_username(&pool, "admin").await.expect("query").expect("row");
        assert_eq!(again.updated_at, admin.updated_at);

        // A demoted same-named account gets promoted back.
        sqlx::query("UPDATE users SET role = 'user' WHERE id = ?")
            .bind(admin.id)
            .execute(&pool)
            .await
            .expect("demote");
        ensure_admin(&pool, "admin", "admin").await.expect("promote");
        let promoted = find_by_username(&pool, "admin").await.expect("query").expect("row");
        assert_eq!(promoted.role, Role::Admin);
    }

    #[tokio::test]
    async fn role_parsing_defaults_unknown_values_to_user() {
        assert_eq!(Role::from_db("admin"), Role::Admin);
        assert_eq!(Role::from_db("user"), Role::User);
        assert_eq!(Role::from_db("operator"), Role::User);
    }
}
