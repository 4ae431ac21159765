use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use strum_macros::{Display, EnumString};
use tracing::warn;
use ts_rs::TS;
use uuid::Uuid;

use super::branch::{Branch, BranchType};

/// Role a staff member holds at their branch.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum StaffType {
    Resident,
    #[default]
    Assistant,
}

impl StaffType {
    fn parse_lossy(value: &str) -> Self {
        value.parse().unwrap_or_else(|_| {
            warn!(staff_type = %value, "unrecognized staff type, defaulting to assistant");
            Self::default()
        })
    }
}

/// A staff record linking a veterinary staff person to a clinic branch.
///
/// Created when a clinic owner invites staff; `assigned_user_id` may be
/// reconciled to a concrete account id after the invited person signs up, so
/// lookups exist for both the email and the id key.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct StaffMember {
    pub id: Uuid,
    pub staff_email: String,
    pub assigned_user_id: Option<Uuid>,
    pub staff_type: StaffType,
    pub designated_branch_id: Uuid,
    pub invitation_accepted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Staff record together with the branch it is designated to.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct StaffMembership {
    pub staff: StaffMember,
    pub branch: Option<Branch>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateStaffMember {
    pub staff_email: String,
    pub assigned_user_id: Option<Uuid>,
    pub staff_type: StaffType,
    pub designated_branch_id: Uuid,
    pub invitation_accepted: bool,
}

#[derive(FromRow)]
struct MembershipRow {
    id: Uuid,
    staff_email: String,
    assigned_user_id: Option<Uuid>,
    staff_type: String,
    designated_branch_id: Uuid,
    invitation_accepted: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    branch_id: Option<Uuid>,
    branch_name: Option<String>,
    branch_type: Option<String>,
    branch_address: Option<String>,
    branch_created_at: Option<DateTime<Utc>>,
    branch_updated_at: Option<DateTime<Utc>>,
}

impl From<MembershipRow> for StaffMembership {
    fn from(row: MembershipRow) -> Self {
        let branch = match (
            row.branch_id,
            row.branch_name,
            row.branch_created_at,
            row.branch_updated_at,
        ) {
            (Some(id), Some(name), Some(created_at), Some(updated_at)) => Some(Branch {
                id,
                name,
                branch_type: row
                    .branch_type
                    .as_deref()
                    .map(BranchType::parse_lossy)
                    .unwrap_or_default(),
                address: row.branch_address,
                created_at,
                updated_at,
            }),
            _ => None,
        };

        Self {
            staff: StaffMember {
                id: row.id,
                staff_email: row.staff_email,
                assigned_user_id: row.assigned_user_id,
                staff_type: StaffType::parse_lossy(&row.staff_type),
                designated_branch_id: row.designated_branch_id,
                invitation_accepted: row.invitation_accepted,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            branch,
        }
    }
}

const MEMBERSHIP_SELECT: &str = r#"SELECT
    s.id, s.staff_email, s.assigned_user_id, s.staff_type,
    s.designated_branch_id, s.invitation_accepted, s.created_at, s.updated_at,
    b.id AS branch_id, b.name AS branch_name, b.branch_type AS branch_type,
    b.address AS branch_address, b.created_at AS branch_created_at,
    b.updated_at AS branch_updated_at
FROM staff_members s
LEFT JOIN branches b ON b.id = s.designated_branch_id"#;

impl StaffMember {
    /// Find the accepted staff membership for an email address.
    ///
    /// Records with `invitation_accepted = false` are filtered in SQL so a
    /// pending invite never grants branch-role routing. Oldest record wins if
    /// the at-most-one invariant is ever violated.
    pub async fn find_accepted_by_email(
        pool: &SqlitePool,
        email: &str,
    ) -> Result<Option<StaffMembership>, sqlx::Error> {
        let sql = format!(
            "{MEMBERSHIP_SELECT}
             WHERE s.staff_email = $1 AND s.invitation_accepted = 1
             ORDER BY s.created_at ASC
             LIMIT 1"
        );
        let row = sqlx::query_as::<_, MembershipRow>(&sql)
            .bind(email)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(StaffMembership::from))
    }

    /// Find the accepted staff membership reconciled to an account id.
    pub async fn find_accepted_by_user_id(
        pool: &SqlitePool,
        user_id: Uuid,
    ) -> Result<Option<StaffMembership>, sqlx::Error> {
        let sql = format!(
            "{MEMBERSHIP_SELECT}
             WHERE s.assigned_user_id = $1 AND s.invitation_accepted = 1
             ORDER BY s.created_at ASC
             LIMIT 1"
        );
        let row = sqlx::query_as::<_, MembershipRow>(&sql)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(StaffMembership::from))
    }

    pub async fn find_by_id(
        pool: &SqlitePool,
        id: Uuid,
    ) -> Result<Option<StaffMembership>, sqlx::Error> {
        let sql = format!("{MEMBERSHIP_SELECT} WHERE s.id = $1");
        let row = sqlx::query_as::<_, MembershipRow>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(StaffMembership::from))
    }

    pub async fn create(
        pool: &SqlitePool,
        data: &CreateStaffMember,
        id: Uuid,
    ) -> Result<StaffMembership, sqlx::Error> {
        sqlx::query(
            r#"INSERT INTO staff_members
               (id, staff_email, assigned_user_id, staff_type, designated_branch_id, invitation_accepted)
               VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(id)
        .bind(&data.staff_email)
        .bind(data.assigned_user_id)
        .bind(data.staff_type.to_string())
        .bind(data.designated_branch_id)
        .bind(data.invitation_accepted)
        .execute(pool)
        .await?;

        Self::find_by_id(pool, id).await?.ok_or(sqlx::Error::RowNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DBService, models::branch::CreateBranch};

    async fn setup_branch(pool: &SqlitePool, branch_type: BranchType) -> Branch {
        Branch::create(
            pool,
            &CreateBranch {
                name: "Happy Paws Clinic".to_string(),
                branch_type,
                address: None,
            },
            Uuid::new_v4(),
        )
        .await
        .expect("create branch")
    }

    fn invite(email: &str, branch_id: Uuid, accepted: bool) -> CreateStaffMember {
        CreateStaffMember {
            staff_email: email.to_string(),
            assigned_user_id: None,
            staff_type: StaffType::Resident,
            designated_branch_id: branch_id,
            invitation_accepted: accepted,
        }
    }

    #[tokio::test]
    async fn email_lookup_requires_accepted_invitation() {
        let db = DBService::new_in_memory().await.expect("db");
        let branch = setup_branch(&db.pool, BranchType::MainBranch).await;

        StaffMember::create(
            &db.pool,
            &invite("pending@example.com", branch.id, false),
            Uuid::new_v4(),
        )
        .await
        .expect("create pending member");

        let found = StaffMember::find_accepted_by_email(&db.pool, "pending@example.com")
            .await
            .expect("lookup");
        assert!(found.is_none(), "pending invitation must not resolve");

        StaffMember::create(
            &db.pool,
            &invite("accepted@example.com", branch.id, true),
            Uuid::new_v4(),
        )
        .await
        .expect("create accepted member");

        let found = StaffMember::find_accepted_by_email(&db.pool, "accepted@example.com")
            .await
            .expect("lookup")
            .expect("accepted membership resolves");
        assert_eq!(found.staff.staff_email, "accepted@example.com");
        assert_eq!(
            found.branch.expect("branch joined").branch_type,
            BranchType::MainBranch
        );
    }

    #[tokio::test]
    async fn user_id_lookup_finds_reconciled_member() {
        let db = DBService::new_in_memory().await.expect("db");
        let branch = setup_branch(&db.pool, BranchType::SubBranch).await;
        let user_id = Uuid::new_v4();

        let mut data = invite("vet@example.com", branch.id, true);
        data.assigned_user_id = Some(user_id);
        StaffMember::create(&db.pool, &data, Uuid::new_v4())
            .await
            .expect("create member");

        let found = StaffMember::find_accepted_by_user_id(&db.pool, user_id)
            .await
            .expect("lookup")
            .expect("membership resolves by id");
        assert_eq!(found.staff.assigned_user_id, Some(user_id));
        assert_eq!(
            found.branch.expect("branch joined").branch_type,
            BranchType::SubBranch
        );

        let missing = StaffMember::find_accepted_by_user_id(&db.pool, Uuid::new_v4())
            .await
            .expect("lookup");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn unknown_branch_type_decodes_to_main_branch() {
        let db = DBService::new_in_memory().await.expect("db");
        let branch = setup_branch(&db.pool, BranchType::SubBranch).await;

        sqlx::query("UPDATE branches SET branch_type = 'mobile-unit' WHERE id = $1")
            .bind(branch.id)
            .execute(&db.pool)
            .await
            .expect("update branch type");

        StaffMember::create(
            &db.pool,
            &invite("vet@example.com", branch.id, true),
            Uuid::new_v4(),
        )
        .await
        .expect("create member");

        let found = StaffMember::find_accepted_by_email(&db.pool, "vet@example.com")
            .await
            .expect("lookup")
            .expect("membership resolves");
        assert_eq!(
            found.branch.expect("branch joined").branch_type,
            BranchType::MainBranch
        );
    }

    #[tokio::test]
    async fn dangling_branch_yields_membership_without_branch() {
        let db = DBService::new_in_memory().await.expect("db");

        StaffMember::create(
            &db.pool,
            &invite("orphan@example.com", Uuid::new_v4(), true),
            Uuid::new_v4(),
        )
        .await
        .expect("create member");

        let found = StaffMember::find_accepted_by_email(&db.pool, "orphan@example.com")
            .await
            .expect("lookup")
            .expect("membership resolves");
        assert!(found.branch.is_none());
    }

    #[tokio::test]
    async fn oldest_accepted_membership_wins() {
        let db = DBService::new_in_memory().await.expect("db");
        let main = setup_branch(&db.pool, BranchType::MainBranch).await;
        let sub = setup_branch(&db.pool, BranchType::SubBranch).await;

        let newer = StaffMember::create(
            &db.pool,
            &invite("dup@example.com", sub.id, true),
            Uuid::new_v4(),
        )
        .await
        .expect("create newer member");

        let older = StaffMember::create(
            &db.pool,
            &invite("dup@example.com", main.id, true),
            Uuid::new_v4(),
        )
        .await
        .expect("create older member");

        sqlx::query("UPDATE staff_members SET created_at = datetime('now', '-1 day') WHERE id = $1")
            .bind(older.staff.id)
            .execute(&db.pool)
            .await
            .expect("backdate member");

        let found = StaffMember::find_accepted_by_email(&db.pool, "dup@example.com")
            .await
            .expect("lookup")
            .expect("membership resolves");
        assert_eq!(found.staff.id, older.staff.id);
        assert_ne!(found.staff.id, newer.staff.id);
    }
}
