//! Visibility scope of a request.
//!
//! A user with an active family works inside that family; everyone else works
//! on their personal records. The scope is resolved once per operation and
//! passed down explicitly.

use serde::Serialize;
use uuid::Uuid;

use crate::User;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Scope {
    Personal(Uuid),
    Family(Uuid),
}

impl Scope {
    /// Family stamped on records created in this scope.
    #[must_use]
    pub fn family_id(self) -> Option<Uuid> {
        match self {
            Scope::Personal(_) => None,
            Scope::Family(id) => Some(id),
        }
    }

    /// Stable key identifying the `(user, family)` bucket budgets are
    /// validated in.
    #[must_use]
    pub fn budget_key(user_id: Uuid, family_id: Option<Uuid>) -> String {
        match family_id {
            Some(family_id) => format!("{user_id}:{family_id}"),
            None => format!("{user_id}:personal"),
        }
    }
}

/// Resolves the scope of `user` from its active family.
#[must_use]
pub fn resolve_scope(user: &User) -> Scope {
    match user.active_family_id {
        Some(family_id) => Scope::Family(family_id),
        None => Scope::Personal(user.id),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::Currency;

    fn user(active_family_id: Option<Uuid>) -> User {
        User {
            id: Uuid::new_v4(),
            email: "asha@example.com".to_string(),
            full_name: "Asha".to_string(),
            default_currency: Currency::Inr,
            active_family_id,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn no_active_family_is_personal() {
        let u = user(None);
        assert_eq!(resolve_scope(&u), Scope::Personal(u.id));
        assert_eq!(resolve_scope(&u).family_id(), None);
    }

    #[test]
    fn active_family_wins() {
        let family = Uuid::new_v4();
        let u = user(Some(family));
        assert_eq!(resolve_scope(&u), Scope::Family(family));
        assert_eq!(resolve_scope(&u).family_id(), Some(family));
    }

    #[test]
    fn budget_key_separates_personal_and_family() {
        let user_id = Uuid::new_v4();
        let family = Uuid::new_v4();
        assert_ne!(
            Scope::budget_key(user_id, None),
            Scope::budget_key(user_id, Some(family))
        );
    }
}
