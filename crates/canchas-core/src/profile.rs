//! User profiles and favorites.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{FavoriteId, FieldId, UserId};

/// Access role stored on the profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Can manage fields, bookings and statements.
    Admin,
    /// Regular customer.
    #[default]
    User,
}

impl Role {
    /// Lowercase name as stored.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Profile attached to an auth user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Same ID as the auth user.
    pub id: UserId,
    /// Access role.
    pub role: Role,
    /// First name.
    pub first_name: Option<String>,
    /// Last name.
    pub last_name: Option<String>,
    /// Contact phone.
    pub phone: Option<String>,
    /// When the profile was created.
    pub created_at: DateTime<Utc>,
    /// When the profile was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Create an empty profile with the `user` role.
    #[must_use]
    pub fn new(id: UserId) -> Self {
        let now = Utc::now();
        Self {
            id,
            role: Role::User,
            first_name: None,
            last_name: None,
            phone: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this profile grants admin access.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// A field bookmarked by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favorite {
    /// Favorite ID.
    pub id: FavoriteId,
    /// Owning user.
    pub user_id: UserId,
    /// Bookmarked field.
    pub field_id: FieldId,
    /// When it was added.
    pub created_at: DateTime<Utc>,
}

impl Favorite {
    /// Create a favorite.
    #[must_use]
    pub fn new(user_id: UserId, field_id: FieldId) -> Self {
        Self {
            id: FavoriteId::generate(),
            user_id,
            field_id,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_profile_is_not_admin() {
        let profile = Profile::new(UserId::generate());
        assert_eq!(profile.role, Role::User);
        assert!(!profile.is_admin());
    }

    #[test]
    fn role_parses_stored_names() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert!("owner".parse::<Role>().is_err());
    }
}
