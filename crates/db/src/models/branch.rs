use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use strum_macros::{Display, EnumString};
use tracing::warn;
use ts_rs::TS;
use uuid::Uuid;

/// Classification of a clinic location.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum BranchType {
    #[default]
    MainBranch,
    SubBranch,
    VetOwner,
}

impl BranchType {
    /// Decode a stored branch type. Unrecognized values fall back to the
    /// main-branch default instead of failing the row.
    pub fn parse_lossy(value: &str) -> Self {
        value.parse().unwrap_or_else(|_| {
            warn!(branch_type = %value, "unrecognized branch type, defaulting to main-branch");
            Self::default()
        })
    }

    /// Dashboard landing route for staff of this branch type.
    pub fn dashboard_route(&self) -> &'static str {
        match self {
            BranchType::MainBranch => "/dashboard/main-branch",
            BranchType::SubBranch => "/dashboard/sub-branch",
            BranchType::VetOwner => "/dashboard/vet-owner",
        }
    }
}

/// A clinic branch.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Branch {
    pub id: Uuid,
    pub name: String,
    pub branch_type: BranchType,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateBranch {
    pub name: String,
    pub branch_type: BranchType,
    pub address: Option<String>,
}

#[derive(FromRow)]
struct BranchRow {
    id: Uuid,
    name: String,
    branch_type: String,
    address: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BranchRow> for Branch {
    fn from(row: BranchRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            branch_type: BranchType::parse_lossy(&row.branch_type),
            address: row.address,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl Branch {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let row = sqlx::query_as::<_, BranchRow>(
            r#"SELECT id, name, branch_type, address, created_at, updated_at
               FROM branches
               WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(Branch::from))
    }

    pub async fn create(
        pool: &SqlitePool,
        data: &CreateBranch,
        id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query(
            r#"INSERT INTO branches (id, name, branch_type, address)
               VALUES ($1, $2, $3, $4)"#,
        )
        .bind(id)
        .bind(&data.name)
        .bind(data.branch_type.to_string())
        .bind(&data.address)
        .execute(pool)
        .await?;

        Self::find_by_id(pool, id).await?.ok_or(sqlx::Error::RowNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_lossy_accepts_known_types() {
        assert_eq!(BranchType::parse_lossy("main-branch"), BranchType::MainBranch);
        assert_eq!(BranchType::parse_lossy("sub-branch"), BranchType::SubBranch);
        assert_eq!(BranchType::parse_lossy("vet-owner"), BranchType::VetOwner);
    }

    #[test]
    fn parse_lossy_defaults_unknown_types() {
        assert_eq!(BranchType::parse_lossy("mobile-unit"), BranchType::MainBranch);
        assert_eq!(BranchType::parse_lossy(""), BranchType::MainBranch);
    }

    #[test]
    fn dashboard_route_mapping() {
        assert_eq!(BranchType::MainBranch.dashboard_route(), "/dashboard/main-branch");
        assert_eq!(BranchType::SubBranch.dashboard_route(), "/dashboard/sub-branch");
        assert_eq!(BranchType::VetOwner.dashboard_route(), "/dashboard/vet-owner");
    }
}
