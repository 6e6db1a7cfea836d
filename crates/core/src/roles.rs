//! Role name constants.
//!
//! Roles are stored by name in the `roles` table and embedded in JWT
//! claims. Admins confirm control changes and manage users/VPN clients;
//! operators acknowledge breaches and request control changes; viewers
//! have read-only access.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_OPERATOR: &str = "operator";
pub const ROLE_VIEWER: &str = "viewer";

/// All valid role names, used when validating user create/update payloads.
pub const ALL_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_OPERATOR, ROLE_VIEWER];
