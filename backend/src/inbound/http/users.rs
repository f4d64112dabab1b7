//! Account API handlers.
//!
//! ```text
//! GET /api/v1/users/me
//! GET /api/v1/users/me/history
//! ```

use actix_web::{get, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Credits, Error, HistoryRecord, UserAccount};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::BearerIdentity;
use crate::inbound::http::state::HttpState;

/// Identity and balance of the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountBody {
    #[schema(value_type = String, format = Uuid)]
    pub id: Uuid,
    pub credits: Credits,
}

impl From<UserAccount> for AccountBody {
    fn from(value: UserAccount) -> Self {
        Self {
            id: *value.id.as_uuid(),
            credits: value.credits,
        }
    }
}

/// One completed generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntryBody {
    #[schema(value_type = String, format = Uuid)]
    pub id: Uuid,
    /// Uploaded file name, or `local_upload` when none was supplied.
    pub source_reference: String,
    pub result_reference: String,
    pub created_at: DateTime<Utc>,
}

impl From<HistoryRecord> for HistoryEntryBody {
    fn from(value: HistoryRecord) -> Self {
        Self {
            id: *value.id.as_uuid(),
            source_reference: value.source_reference.as_str().to_owned(),
            result_reference: value.result_reference.into(),
            created_at: value.created_at,
        }
    }
}

/// Current account of the authenticated caller.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Account", body = AccountBody),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "No account for the caller", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "currentUser",
    security(("bearerAuth" = []))
)]
#[get("/users/me")]
pub async fn current_user(
    state: web::Data<HttpState>,
    identity: BearerIdentity,
) -> ApiResult<web::Json<AccountBody>> {
    let account = state.accounts.account(identity.user_id()).await?;
    Ok(web::Json(account.into()))
}

/// Generation history of the authenticated caller, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/users/me/history",
    responses(
        (status = 200, description = "History", body = [HistoryEntryBody]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "currentUserHistory",
    security(("bearerAuth" = []))
)]
#[get("/users/me/history")]
pub async fn current_user_history(
    state: web::Data<HttpState>,
    identity: BearerIdentity,
) -> ApiResult<web::Json<Vec<HistoryEntryBody>>> {
    let history = state.accounts.history(identity.user_id()).await?;
    Ok(web::Json(history.into_iter().map(Into::into).collect()))
}
