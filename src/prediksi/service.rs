//! Application service: orchestrates credentials, policy, repositories, and
//! the classifier. Handlers translate the `Error` values produced here into
//! flashes and redirects; nothing in this module touches HTTP.

use sqlx::SqlitePool;
use tracing::info;

use crate::classifier::{Classification, Classifier, FEATURE_COUNT};
use crate::error::Error;
use crate::password;
use crate::policy;
use crate::store::predictions::{self, PredictionRecord, DEFAULT_HISTORY_LIMIT};
use crate::store::users::{self, Role, User};

/// Check credentials and return the account. One message for both unknown
/// user and wrong password.
pub async fn login(pool: &SqlitePool, username: &str, password: &str) -> Result<User, Error> {
    let invalid = || Error::Auth("Invalid username or password.".to_string());
    let Some(user) = users::find_by_username(pool, username.trim()).await? else {
        return Err(invalid());
    };
    if !password::verify(password, &user.password_hash) {
        return Err(invalid());
    }
    info!(username = %user.username, "login succeeded");
    Ok(user)
}

/// Create a new account. Nothing is persisted on any validation failure.
pub async fn register(
    pool: &SqlitePool,
    username: &str,
    password: &str,
    password_confirm: &str,
) -> Result<User, Error> {
    let username = username.trim();
    if username.is_empty() || password.trim().is_empty() || password_confirm.trim().is_empty() {
        return Err(Error::Validation(
            "Username and password are required.".to_string(),
        ));
    }
    if password != password_confirm {
        return Err(Error::Validation(
            "Passwords do not match. Please try again.".to_string(),
        ));
    }
    policy::check_registration(username)?;
    let user = users::create(pool, username, password, Role::User).await?;
    info!(username = %user.username, "registered new account");
    Ok(user)
}

/// Parse the raw form inputs. Any non-numeric value fails the whole batch;
/// the handler echoes the raw strings back for correction.
pub fn parse_features(raw: [&str; FEATURE_COUNT]) -> Result<[f64; FEATURE_COUNT], Error> {
    let mut features = [0.0; FEATURE_COUNT];
    for (slot, value) in features.iter_mut().zip(raw) {
        *slot = value
            .trim()
            .parse()
            .map_err(|_| Error::Validation("All inputs must be numeric.".to_string()))?;
    }
    Ok(features)
}

/// Classify the submission and append it to the user's history.
pub async fn submit_prediction(
    pool: &SqlitePool,
    classifier: &dyn Classifier,
    user_id: i64,
    raw: [&str; FEATURE_COUNT],
) -> Result<(Classification, PredictionRecord), Error> {
    let features = parse_features(raw)?;
    let outcome = classifier.classify(features);
    let record =
        predictions::append(pool, user_id, features, outcome.class_id, &outcome.label).await?;
    Ok((outcome, record))
}

pub async fn change_password(pool: &SqlitePool, user_id: i64, password: &str) -> Result<(), Error> {
    if password.trim().is_empty() {
        return Err(Error::Validation("A new password is required.".to_string()));
    }
    users::update_password(pool, user_id, password).await
}

/// Rename the account after the policy signs off; returns the stored name.
pub async fn change_username(
    pool: &SqlitePool,
    current: &User,
    requested: &str,
) -> Result<String, Error> {
    let requested = requested.trim();
    if requested.is_empty() {
        return Err(Error::Validation("A new username is required.".to_string()));
    }
    policy::check_username_change(current, requested)?;
    users::update_username(pool, current.id, requested).await?;
    Ok(requested.to_string())
}

pub async fn history(pool: &SqlitePool, user_id: i64) -> Result<Vec<PredictionRecord>, Error> {
    predictions::recent_for_user(pool, user_id, DEFAULT_HISTORY_LIMIT).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::CentroidModel;
    use crate::store;
    use sqlx::Row;

    async fn pool() -> SqlitePool {
        let pool = store::connect_in_memory().await.expect("pool");
        store::migrate(&pool).await.expect("migrate");
        pool
    }

    #[tokio::test]
    async fn login_rejects_unknown_user_and_wrong_password_alike() {
        let pool = pool().await;
        register(&pool, "alice", "pw1234", "pw1234").await.expect("register");

        let unknown = login(&pool, "nobody", "pw1234").await.expect_err("unknown");
        let wrong = login(&pool, "alice", "nope").await.expect_err("wrong");
        assert_eq!(unknown.to_string(), wrong.to_string());

        let user = login(&pool, "alice", "pw1234").await.expect("login");
        assert_eq!(user.username, "alice");
    }

    #[tokio::test]
    async fn login_trims_the_submitted_username() {
        let pool = pool().await;
        register(&pool, "alice", "pw1234", "pw1234").await.expect("register");
        assert!(login(&pool, "  alice  ", "pw1234").await.is_ok());
    }

    #[tokio::test]
    async fn register_validates_before_touching_the_store() {
        let pool = pool().await;
        assert!(matches!(
            register(&pool, "", "pw", "pw").await,
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            register(&pool, "alice", "pw1", "pw2").await,
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            register(&pool, "Admin", "pw", "pw").await,
            Err(Error::Validation(_))
        ));

        let count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM users")
            .fetch_one(&pool)
            .await
            .expect("count")
            .get::<i64, _>("n");
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn register_twice_conflicts() {
        let pool = pool().await;
        register(&pool, "alice", "pw1234", "pw1234").await.expect("first");
        assert!(matches!(
            register(&pool, "alice", "pw1234", "pw1234").await,
            Err(Error::Conflict(_))
        ));
    }

    #[test]
    fn parse_features_accepts_numbers_and_rejects_text() {
        assert_eq!(
            parse_features(["5.1", " 3.5 ", "1.4", "0.2"]).expect("parse"),
            [5.1, 3.5, 1.4, 0.2]
        );
        assert!(matches!(
            parse_features(["5.1", "petal", "1.4", "0.2"]),
            Err(Error::Validation(_))
        ));
    }

    #[tokio::test]
    async fn a_failed_submission_leaves_history_unchanged() {
        let pool = pool().await;
        let user = register(&pool, "alice", "pw1234", "pw1234").await.expect("register");
        let model = CentroidModel::pretrained();

        let err = submit_prediction(&pool, &model, user.id, ["x", "3.5", "1.4", "0.2"])
            .await
            .expect_err("parse failure");
        assert!(matches!(err, Error::Validation(_)));
        assert!(history(&pool, user.id).await.expect("history").is_empty());
    }

    #[tokio::test]
    async fn a_successful_submission_heads_the_history() {
        let pool = pool().await;
        let user = register(&pool, "alice", "pw1234", "pw1234").await.expect("register");
        let model = CentroidModel::pretrained();

        let (outcome, record) =
            submit_prediction(&pool, &model, user.id, ["5.1", "3.5", "1.4", "0.2"])
                .await
                .expect("submit");
        assert_eq!(outcome.label, "Iris-setosa");

        let recent = history(&pool, user.id).await.expect("history");
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, record.id);
        assert_eq!(recent[0].label, "Iris-setosa");
    }

    #[tokio::test]
    async fn change_password_requires_a_non_empty_value() {
        let pool = pool().await;
        let user = register(&pool, "alice", "pw1234", "pw1234").await.expect("register");
        assert!(matches!(
            change_password(&pool, user.id, "  ").await,
            Err(Error::Validation(_))
        ));
        change_password(&pool, user.id, "fresh").await.expect("update");
        assert!(login(&pool, "alice", "fresh").await.is_ok());
    }

    #[tokio::test]
    async fn change_username_runs_the_policy_then_the_store() {
        let pool = pool().await;
        users::ensure_admin(&pool, "admin", "admin").await.expect("admin");
        let alice = register(&pool, "alice", "pw1234", "pw1234").await.expect("alice");
        let admin = users::find_by_username(&pool, "admin")
            .await
            .expect("query")
            .expect("row");

        assert!(matches!(
            change_username(&pool, &admin, "root").await,
            Err(Error::Auth(_))
        ));
        assert!(matches!(
            change_username(&pool, &alice, "ADMIN").await,
            Err(Error::Auth(_))
        ));

        let stored = change_username(&pool, &alice, " alice2 ").await.expect("rename");
        assert_eq!(stored, "alice2");
        assert!(users::find_by_username(&pool, "alice2")
            .await
            .expect("query")
            .is_some());
    }
}
