// crates/brewlog-records/src/user.rs
// ============================================================================
// Module: Users
// Description: User profiles keyed by uid, with roles and activation state.
// Purpose: Map authenticated identities to callers and manage roles.
// Dependencies: brewlog-core, serde
// ============================================================================

//! ## Overview
//! Profiles live at `users/{uid}` in the flat shape and are owned by the user
//! they describe. Role changes and role listings need a privileged caller; an
//! active admin profile yields one through [`UserProfile::caller`].
//!
//! # Invariants
//! - A profile's id equals the uid of the caller that registered it.
//! - Only privileged callers may grant the `admin` role.

use brewlog_core::Caller;
use brewlog_core::CollectionDescriptor;
use brewlog_core::OwnerId;
use brewlog_core::RecordId;
use brewlog_core::RecordShape;
use brewlog_core::StoreContext;
use brewlog_core::Timestamp;
use brewlog_core::TypedCollection;
use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::error::RecordsError;
use crate::schema;

/// User collection path.
pub const USERS_PATH: &str = "users";

// ============================================================================
// SECTION: Types
// ============================================================================

/// User role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Full access to every record.
    Admin,
    /// Manages their own brewing records.
    #[default]
    Brewer,
    /// Reads their own records.
    Viewer,
}

impl UserRole {
    /// Every role.
    pub const ALL: [Self; 3] = [Self::Admin, Self::Brewer, Self::Viewer];

    /// Returns the stored label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Brewer => "brewer",
            Self::Viewer => "viewer",
        }
    }
}

/// Stored user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// User id.
    pub id: RecordId,
    /// Display name.
    pub display_name: String,
    /// Email address.
    pub email: String,
    /// Role.
    pub role: UserRole,
    /// Whether the account is active.
    pub is_active: bool,
    /// Last login time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<Timestamp>,
    /// Deactivation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deactivated_at: Option<Timestamp>,
    /// Registering identity.
    pub created_by: OwnerId,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last update time.
    pub updated_at: Timestamp,
}

impl UserProfile {
    /// Returns the caller acting as this user.
    ///
    /// Active admins act with privileged access; everyone else is limited to
    /// the records they own.
    #[must_use]
    pub fn caller(&self) -> Caller {
        let id = OwnerId::from(self.id.clone());
        if self.role == UserRole::Admin && self.is_active {
            Caller::privileged(id)
        } else {
            Caller::owner(id)
        }
    }
}

/// Data for a new profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDraft {
    /// Display name.
    pub display_name: String,
    /// Email address.
    pub email: String,
    /// Requested role.
    pub role: UserRole,
}

/// Self-service profile update.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    /// New display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// New email address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Account-level changes made by the repository itself.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct AccountChange {
    /// New role.
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<UserRole>,
    /// New activation flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    is_active: Option<bool>,
    /// New last login.
    #[serde(skip_serializing_if = "Option::is_none")]
    last_login: Option<Timestamp>,
    /// New deactivation time; `Some(None)` clears it.
    #[serde(skip_serializing_if = "Option::is_none")]
    deactivated_at: Option<Option<Timestamp>>,
}

/// Stored form of a new profile.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewProfile<'a> {
    /// Registration data.
    #[serde(flatten)]
    draft: &'a UserDraft,
    /// Activation flag.
    is_active: bool,
}

// ============================================================================
// SECTION: Schema
// ============================================================================

/// Returns the user collection descriptor.
///
/// # Errors
///
/// Returns [`RecordsError::Schema`] when the pinned schema fails to compile.
pub fn user_descriptor() -> Result<CollectionDescriptor, RecordsError> {
    let mut properties = schema::properties([
        ("displayName", schema::text()),
        ("email", json!({"type": "string", "pattern": schema::EMAIL_PATTERN})),
        ("role", schema::one_of(&UserRole::ALL.map(UserRole::as_str))),
        ("isActive", json!({"type": "boolean"})),
        ("lastLogin", schema::nullable(schema::timestamp())),
        ("deactivatedAt", schema::nullable(schema::timestamp())),
    ]);
    schema::with_flat_audit(&mut properties);
    let mut required = vec!["displayName", "email", "role", "isActive"];
    required.extend(schema::FLAT_AUDIT_REQUIRED);
    schema::descriptor(USERS_PATH, schema::object(&required, properties), RecordShape::Flat)
}

// ============================================================================
// SECTION: Repository
// ============================================================================

/// User profile collection.
#[derive(Debug, Clone)]
pub struct UserRepository {
    /// Context supplying the clock.
    context: StoreContext,
    /// Profile collection.
    users: TypedCollection<UserProfile>,
}

impl UserRepository {
    /// Builds the repository on `context`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError::Schema`] when the pinned schema fails to compile.
    pub fn new(context: &StoreContext) -> Result<Self, RecordsError> {
        Ok(Self {
            context: context.clone(),
            users: context.collection(user_descriptor()?),
        })
    }

    /// Returns the typed profile collection.
    #[must_use]
    pub const fn collection(&self) -> &TypedCollection<UserProfile> {
        &self.users
    }

    /// Registers the caller's own profile under their uid.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError::Forbidden`] when a non-privileged caller asks
    /// for the admin role, [`RecordsError::Store`] with a conflict when the
    /// profile exists, and validation or store errors otherwise.
    pub async fn register(
        &self,
        draft: &UserDraft,
        caller: &Caller,
    ) -> Result<UserProfile, RecordsError> {
        if draft.role == UserRole::Admin && !caller.is_privileged() {
            return Err(RecordsError::Forbidden {
                action: "register as admin",
            });
        }
        let uid = RecordId::new(caller.id().as_str())?;
        let record = NewProfile {
            draft,
            is_active: true,
        };
        let profile = self.users.create_with_id(&uid, &record, caller).await?;
        info!(user = %uid, role = draft.role.as_str(), "user registered");
        Ok(profile)
    }

    /// Returns profile `uid` when visible.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the read fails.
    pub async fn profile(
        &self,
        uid: &RecordId,
        caller: &Caller,
    ) -> Result<Option<UserProfile>, RecordsError> {
        Ok(self.users.get(uid, caller).await?)
    }

    /// Applies a self-service change to profile `uid`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the profile is missing or hidden, or the
    /// merged profile fails validation.
    pub async fn update_profile(
        &self,
        uid: &RecordId,
        patch: &ProfilePatch,
        caller: &Caller,
    ) -> Result<UserProfile, RecordsError> {
        Ok(self.users.update(uid, patch, caller).await?)
    }

    /// Changes the role of user `uid`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError::Forbidden`] for non-privileged callers and
    /// [`RecordsError`] when the profile is missing.
    pub async fn update_role(
        &self,
        uid: &RecordId,
        role: UserRole,
        caller: &Caller,
    ) -> Result<UserProfile, RecordsError> {
        if !caller.is_privileged() {
            return Err(RecordsError::Forbidden {
                action: "change user roles",
            });
        }
        let change = AccountChange {
            role: Some(role),
            ..AccountChange::default()
        };
        let profile = self.users.update(uid, &change, caller).await?;
        info!(user = %uid, role = role.as_str(), by = %caller.id(), "user role changed");
        Ok(profile)
    }

    /// Stamps the last login time of user `uid`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the profile is missing or hidden.
    pub async fn update_last_login(
        &self,
        uid: &RecordId,
        caller: &Caller,
    ) -> Result<UserProfile, RecordsError> {
        let change = AccountChange {
            last_login: Some(self.context.clock().now()),
            ..AccountChange::default()
        };
        Ok(self.users.update(uid, &change, caller).await?)
    }

    /// Returns every profile with `role`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError::Forbidden`] for non-privileged callers.
    pub async fn users_by_role(
        &self,
        role: UserRole,
        caller: &Caller,
    ) -> Result<Vec<UserProfile>, RecordsError> {
        if !caller.is_privileged() {
            return Err(RecordsError::Forbidden {
                action: "list users by role",
            });
        }
        Ok(self.users.find(caller, |profile| profile.role == role).await?)
    }

    /// Deactivates user `uid`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the profile is missing or hidden.
    pub async fn deactivate(
        &self,
        uid: &RecordId,
        caller: &Caller,
    ) -> Result<UserProfile, RecordsError> {
        let change = AccountChange {
            is_active: Some(false),
            deactivated_at: Some(Some(self.context.clock().now())),
            ..AccountChange::default()
        };
        let profile = self.users.update(uid, &change, caller).await?;
        info!(user = %uid, by = %caller.id(), "user deactivated");
        Ok(profile)
    }

    /// Reactivates user `uid` and clears its deactivation time.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError`] when the profile is missing or hidden.
    pub async fn reactivate(
        &self,
        uid: &RecordId,
        caller: &Caller,
    ) -> Result<UserProfile, RecordsError> {
        let change = AccountChange {
            is_active: Some(true),
            deactivated_at: Some(None),
            ..AccountChange::default()
        };
        let profile = self.users.update(uid, &change, caller).await?;
        info!(user = %uid, by = %caller.id(), "user reactivated");
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test assertions use unwrap for clarity.")]

    use tracing_test::traced_test;

    use super::*;

    fn draft(role: UserRole) -> UserDraft {
        UserDraft {
            display_name: "Brewer".to_string(),
            email: "brewer@example.com".to_string(),
            role,
        }
    }

    #[tokio::test]
    #[traced_test]
    async fn account_changes_are_logged() {
        let users = UserRepository::new(&StoreContext::in_memory()).unwrap();
        let root = Caller::privileged(OwnerId::new("root").unwrap());
        let brewer = Caller::owner(OwnerId::new("u1").unwrap());
        users.register(&draft(UserRole::Brewer), &brewer).await.unwrap();
        let uid = RecordId::new("u1").unwrap();
        users.update_role(&uid, UserRole::Viewer, &root).await.unwrap();
        users.deactivate(&uid, &root).await.unwrap();
        assert!(logs_contain("user registered"));
        assert!(logs_contain("user role changed"));
        assert!(logs_contain("user deactivated"));
    }

    #[tokio::test]
    async fn owners_cannot_deactivate_others() {
        let users = UserRepository::new(&StoreContext::in_memory()).unwrap();
        let brewer = Caller::owner(OwnerId::new("u1").unwrap());
        let other = Caller::owner(OwnerId::new("u2").unwrap());
        users.register(&draft(UserRole::Brewer), &brewer).await.unwrap();
        let uid = RecordId::new("u1").unwrap();
        assert!(users.deactivate(&uid, &other).await.unwrap_err().is_not_found());
        let profile = users.profile(&uid, &brewer).await.unwrap().unwrap();
        assert!(profile.is_active);
        assert_eq!(profile.created_by.as_str(), "u1");
    }
}
