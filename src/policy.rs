//! Role-based authorization rules for account names.

use crate::error::Error;
use crate::store::users::{Role, User};

/// The reserved administrator username. Exactly one account carries it, and
/// it never changes hands.
pub const ADMIN_USERNAME: &str = "admin";

/// A username is reserved when it matches the admin name, case-insensitively.
#[must_use]
pub fn is_reserved(username: &str) -> bool {
    username.eq_ignore_ascii_case(ADMIN_USERNAME)
}

/// Registration never hands out the reserved name, regardless of requester.
pub fn check_registration(username: &str) -> Result<(), Error> {
    if is_reserved(username) {
        return Err(Error::Validation(
            "That username is not available.".to_string(),
        ));
    }
    Ok(())
}

/// Username-change rules, evaluated in precedence order:
/// 1. the admin identity is pinned to its current name;
/// 2. no non-admin may adopt the reserved name;
/// 3. conflicts with other users are enforced store-level by the repository.
pub fn check_username_change(current: &User, requested: &str) -> Result<(), Error> {
    if current.role == Role::Admin && requested != current.username {
        return Err(Error::Auth(
            "The admin username cannot be changed.".to_string(),
        ));
    }
    if is_reserved(requested) && current.role != Role::Admin {
        return Err(Error::Auth("That username is not available.".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64, username: &str, role: Role) -> User {
        User {
            id,
            username: username.to_string(),
            password_hash: String::new(),
            role,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn admin_cannot_change_its_username() {
        let admin = user(1, ADMIN_USERNAME, Role::Admin);
        assert!(matches!(
            check_username_change(&admin, "root"),
            Err(Error::Auth(_))
        ));
    }

    #[test]
    fn admin_keeping_its_username_is_allowed() {
        let admin = user(1, ADMIN_USERNAME, Role::Admin);
        assert!(check_username_change(&admin, ADMIN_USERNAME).is_ok());
    }

    #[test]
    fn non_admin_cannot_adopt_the_reserved_name() {
        let alice = user(2, "alice", Role::User);
        assert!(matches!(
            check_username_change(&alice, "admin"),
            Err(Error::Auth(_))
        ));
        assert!(matches!(
            check_username_change(&alice, "ADMIN"),
            Err(Error::Auth(_))
        ));
    }

    #[test]
    fn ordinary_renames_are_allowed() {
        let alice = user(2, "alice", Role::User);
        assert!(check_username_change(&alice, "alice2").is_ok());
    }

    #[test]
    fn registration_rejects_the_reserved_name_case_insensitively() {
        assert!(check_registration("admin").is_err());
        assert!(check_registration("Admin").is_err());
        assert!(check_registration("alice").is_ok());
    }
}
