//! Primitive types and newtypes for type-safe API interactions.
//!
//! The backend identifies every record by a numeric id. Wrapping them keeps
//! a staff id from being passed where a user id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! numeric_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wrap a raw id.
            pub fn new(id: u64) -> Self {
                Self(id)
            }

            /// Get the raw id.
            pub fn get(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }
    };
}

numeric_id!(
    /// Id of a staff (administrator) account.
    ///
    /// ```
    /// use adminpanel_rs::AdminId;
    ///
    /// let admin = AdminId::new(7);
    /// assert_eq!(admin.to_string(), "7");
    /// ```
    AdminId
);

numeric_id!(
    /// Id of an end-user account.
    UserId
);

numeric_id!(
    /// Id of a user group.
    GroupId
);

numeric_id!(
    /// Id of a stored database backup.
    BackupId
);

numeric_id!(
    /// Id of a public API session.
    PublicSessionId
);

numeric_id!(
    /// Id of a logged public API query.
    QueryId
);

/// Key of an object held by the caching engine (e.g. `app.systemConfig`).
///
/// Ids are 2-40 characters of ASCII letters, digits and `-._+`.
///
/// # Example
///
/// ```
/// use adminpanel_rs::CacheObjectId;
///
/// let id = CacheObjectId::new("app.systemConfig").expect("valid id");
/// assert_eq!(id.as_str(), "app.systemConfig");
/// assert!(CacheObjectId::new("no spaces allowed").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CacheObjectId(String);

impl CacheObjectId {
    /// Create a cache object id, validating the format.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`](crate::Error::InvalidInput) when the
    /// id is too short, too long or contains other characters.
    pub fn new(id: impl Into<String>) -> crate::Result<Self> {
        let id = id.into();
        crate::validate::validate_cache_object_id(&id)?;
        Ok(Self(id))
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for CacheObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_ids() {
        let user = UserId::new(42);
        assert_eq!(user.get(), 42);
        assert_eq!(user.to_string(), "42");
        assert_eq!(serde_json::to_value(user).unwrap(), serde_json::json!(42));

        let group: GroupId = serde_json::from_value(serde_json::json!(3)).unwrap();
        assert_eq!(group, GroupId::from(3));
    }

    #[test]
    fn test_cache_object_id_valid() {
        let id = CacheObjectId::new("app.publicAPIAccess").unwrap();
        assert_eq!(id.as_str(), "app.publicAPIAccess");
        assert!(CacheObjectId::new("a+b_c-d.e").is_ok());
    }

    #[test]
    fn test_cache_object_id_invalid() {
        assert!(CacheObjectId::new("a").is_err());
        assert!(CacheObjectId::new("x".repeat(41)).is_err());
        assert!(CacheObjectId::new("app/config").is_err());
        assert!(CacheObjectId::new("").is_err());
    }
}
