//! Caller identity extraction. JWT issuance and verification are external
//! collaborators per §1; this core trusts an upstream gateway to have
//! already authenticated the caller and to forward identity as two
//! headers, `x-user-id` and `x-user-role`. What this core *does* own is
//! the ownership check those headers feed: a standard user's queries are
//! implicitly scoped to `user_id = caller`, an admin's are not (§4.H).

use crate::presentation::envelope::ApiError;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use loadtest_domain::UserId;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Standard,
}

#[derive(Debug, Clone, Copy)]
pub struct Caller {
    pub user_id: UserId,
    pub role: Role,
}

impl Caller {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// The user-id filter a list/query endpoint should apply: `None` for
    /// an admin (no restriction), `Some(caller)` for a standard user.
    pub fn ownership_filter(&self) -> Option<UserId> {
        if self.is_admin() {
            None
        } else {
            Some(self.user_id)
        }
    }

    /// Whether `owner` may be acted on by this caller.
    pub fn may_act_on(&self, owner: UserId) -> bool {
        self.is_admin() || self.user_id == owner
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id_header = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::validation("missing x-user-id header"))?;
        let user_id = UserId::from_str(user_id_header).map_err(|_| ApiError::validation("x-user-id is not a valid identifier"))?;

        let role = match parts.headers.get("x-user-role").and_then(|v| v.to_str().ok()) {
            Some("admin") => Role::Admin,
            _ => Role::Standard,
        };

        Ok(Caller { user_id, role })
    }
}

#[allow(dead_code)]
pub const UNAUTHORIZED: StatusCode = StatusCode::UNAUTHORIZED;
