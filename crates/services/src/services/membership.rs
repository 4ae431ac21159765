//! Seam over the staff-membership store.

use async_trait::async_trait;
use db::models::staff_member::{StaffMember, StaffMembership};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Lookup operations the login-redirect decision depends on.
///
/// Both queries only surface memberships whose invitation has been accepted;
/// the gating lives in the store, not in callers.
#[async_trait]
pub trait MembershipLookup: Send + Sync {
    async fn find_accepted_by_email(
        &self,
        email: &str,
    ) -> Result<Option<StaffMembership>, sqlx::Error>;

    async fn find_accepted_by_user_id(
        &self,
        user_id: Uuid,
    ) -> Result<Option<StaffMembership>, sqlx::Error>;
}

/// Membership store backed by the portal database.
#[derive(Clone)]
pub struct DbMembershipStore {
    pool: SqlitePool,
}

impl DbMembershipStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipLookup for DbMembershipStore {
    async fn find_accepted_by_email(
        &self,
        email: &str,
    ) -> Result<Option<StaffMembership>, sqlx::Error> {
        StaffMember::find_accepted_by_email(&self.pool, email).await
    }

    async fn find_accepted_by_user_id(
        &self,
        user_id: Uuid,
    ) -> Result<Option<StaffMembership>, sqlx::Error> {
        StaffMember::find_accepted_by_user_id(&self.pool, user_id).await
    }
}
