//! Role and permission rules.
//!
//! Roles form a closed set, so every authorization decision is an exhaustive
//! match. A role string that does not parse is a data error surfaced at the
//! repository boundary, never a silent pass.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Editor,
    Author,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Editor => "editor",
            Self::Author => "author",
        }
    }

    /// Parse a stored role string. Returns `None` for anything outside the
    /// known set.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(Self::Admin),
            "editor" => Some(Self::Editor),
            "author" => Some(Self::Author),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    CreatePosts,
    EditPosts,
    DeletePosts,
    PublishPosts,
    ManageUsers,
    EditOwnPosts,
}

impl Permission {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreatePosts => "create_posts",
            Self::EditPosts => "edit_posts",
            Self::DeletePosts => "delete_posts",
            Self::PublishPosts => "publish_posts",
            Self::ManageUsers => "manage_users",
            Self::EditOwnPosts => "edit_own_posts",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Check whether a role grants a permission.
#[inline]
#[must_use]
pub const fn has_permission(role: Role, permission: Permission) -> bool {
    use Permission::{CreatePosts, DeletePosts, EditOwnPosts, EditPosts, ManageUsers, PublishPosts};

    match role {
        Role::Admin => matches!(
            permission,
            CreatePosts | EditPosts | DeletePosts | PublishPosts | ManageUsers
        ),
        Role::Editor => matches!(
            permission,
            CreatePosts | EditPosts | DeletePosts | PublishPosts
        ),
        Role::Author => matches!(permission, CreatePosts | EditOwnPosts),
    }
}

/// Check whether a user may edit or delete a specific post.
///
/// Admins and editors may touch any post; authors only their own.
#[inline]
#[must_use]
pub const fn can_edit_post(role: Role, user_id: i32, author_id: i32) -> bool {
    match role {
        Role::Admin | Role::Editor => true,
        Role::Author => user_id == author_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_permissions() {
        assert!(has_permission(Role::Admin, Permission::ManageUsers));
        assert!(has_permission(Role::Admin, Permission::DeletePosts));
        assert!(has_permission(Role::Admin, Permission::PublishPosts));
        assert!(!has_permission(Role::Admin, Permission::EditOwnPosts));
    }

    #[test]
    fn test_editor_permissions() {
        assert!(has_permission(Role::Editor, Permission::EditPosts));
        assert!(has_permission(Role::Editor, Permission::DeletePosts));
        assert!(!has_permission(Role::Editor, Permission::ManageUsers));
    }

    #[test]
    fn test_author_permissions() {
        assert!(has_permission(Role::Author, Permission::CreatePosts));
        assert!(has_permission(Role::Author, Permission::EditOwnPosts));
        assert!(!has_permission(Role::Author, Permission::EditPosts));
        assert!(!has_permission(Role::Author, Permission::DeletePosts));
        assert!(!has_permission(Role::Author, Permission::PublishPosts));
        assert!(!has_permission(Role::Author, Permission::ManageUsers));
    }

    #[test]
    fn test_can_edit_post_ownership() {
        assert!(can_edit_post(Role::Admin, 1, 99));
        assert!(can_edit_post(Role::Editor, 1, 99));
        assert!(can_edit_post(Role::Author, 7, 7));
        assert!(!can_edit_post(Role::Author, 7, 8));
    }

    #[test]
    fn test_role_parse_round_trip() {
        for role in [Role::Admin, Role::Editor, Role::Author] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("superuser"), None);
        assert_eq!(Role::parse(""), None);
    }
}
