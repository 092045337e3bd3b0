//! Update permission checks for media items

use std::collections::HashSet;

use crate::media::MediaItem;

/// Permission to update any media item
pub const UPDATE_ANY_MEDIA: &str = "update any media";

/// Permission to update media items the account owns
pub const UPDATE_OWN_MEDIA: &str = "update own media";

/// Acting principal for an administrative action
#[derive(Debug, Clone)]
pub struct Account {
    pub id: String,
    permissions: HashSet<String>,
}

impl Account {
    /// Create an account with the given permissions
    #[must_use]
    pub fn new<I, S>(id: impl Into<String>, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    /// Account that may update every media item
    #[must_use]
    pub fn admin(id: impl Into<String>) -> Self {
        Self::new(id, [UPDATE_ANY_MEDIA])
    }

    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    /// Whether this account may update the item
    #[must_use]
    pub fn can_update(&self, item: &MediaItem) -> bool {
        self.has_permission(UPDATE_ANY_MEDIA)
            || (self.has_permission(UPDATE_OWN_MEDIA) && item.owner_id == self.id)
    }
}
