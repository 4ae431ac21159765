//! Post-login routing: resolve staff membership and decide which dashboard an
//! authenticated user lands on.

use db::models::staff_member::StaffMembership;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use ts_rs::TS;
use uuid::Uuid;

use super::membership::MembershipLookup;

/// Landing route for users with no staff membership and no profile role.
pub const PET_OWNER_ROUTE: &str = "/dashboard/pet-owner";

/// Why a redirect is being computed. Threaded explicitly through the call
/// chain so the direct post-login call and the event-driven auth-state
/// listener can be told apart without a shared flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
pub enum LoginIntent {
    Manual,
    AuthListener,
}

/// Which arm of the decision produced the route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
pub enum RedirectSource {
    BranchRole,
    FallbackRole,
    Default,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct RedirectDecision {
    pub route: String,
    pub source: RedirectSource,
    pub intent: LoginIntent,
}

pub struct LoginRedirectService;

impl LoginRedirectService {
    /// Find the staff membership for an authenticated identity, if any.
    ///
    /// The email lookup runs first and short-circuits; the user-id lookup
    /// only runs on an email miss. Staff records can be created before the
    /// invited person has an account (matched by email) and reconciled to a
    /// concrete account id later (matched by id), so both keys are tried.
    /// Store failures degrade to "not staff" so an infrastructure hiccup
    /// never blocks an ordinary pet-owner login.
    pub async fn resolve_staff_membership(
        store: &dyn MembershipLookup,
        email: Option<&str>,
        user_id: Option<Uuid>,
    ) -> Option<StaffMembership> {
        if let Some(email) = email {
            match store.find_accepted_by_email(email).await {
                Ok(Some(membership)) => return Some(membership),
                Ok(None) => {}
                Err(e) => {
                    warn!(
                        email = %email,
                        error = %e,
                        "staff lookup by email failed, treating as no match"
                    );
                }
            }
        }

        if let Some(user_id) = user_id {
            match store.find_accepted_by_user_id(user_id).await {
                Ok(Some(membership)) => return Some(membership),
                Ok(None) => {}
                Err(e) => {
                    warn!(
                        user_id = %user_id,
                        error = %e,
                        "staff lookup by user id failed, treating as no match"
                    );
                }
            }
        }

        None
    }

    /// Decide the dashboard route for an authenticated user.
    ///
    /// Total: every input combination yields a valid route. A membership with
    /// a branch routes by branch type; everyone else gets the fallback role's
    /// dashboard, or the pet-owner default when no role is supplied.
    pub async fn redirect_route(
        store: &dyn MembershipLookup,
        email: Option<&str>,
        user_id: Option<Uuid>,
        fallback_role: Option<&str>,
        intent: LoginIntent,
    ) -> RedirectDecision {
        let membership = Self::resolve_staff_membership(store, email, user_id).await;

        let (route, source) = match membership.as_ref().and_then(|m| m.branch.as_ref()) {
            Some(branch) => (
                branch.branch_type.dashboard_route().to_string(),
                RedirectSource::BranchRole,
            ),
            None => match fallback_role.filter(|role| !role.is_empty()) {
                Some(role) => (format!("/dashboard/{role}"), RedirectSource::FallbackRole),
                None => (PET_OWNER_ROUTE.to_string(), RedirectSource::Default),
            },
        };

        info!(
            route = %route,
            source = ?source,
            intent = ?intent,
            staff = membership.is_some(),
            "login redirect decided"
        );

        RedirectDecision {
            route,
            source,
            intent,
        }
    }
}
