//! Bearer credential extraction.
//!
//! Handlers take a [`BearerIdentity`] argument to require an authenticated
//! caller. The token is resolved through the `IdentityProvider` port held in
//! [`HttpState`].

use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;
use tracing::debug;

use crate::domain::{Error, UserId};

use super::state::HttpState;

const BEARER_PREFIX: &str = "Bearer ";

/// Identity of the authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerIdentity(UserId);

impl BearerIdentity {
    pub fn user_id(&self) -> &UserId {
        &self.0
    }

    pub fn into_user_id(self) -> UserId {
        self.0
    }
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix(BEARER_PREFIX)?.trim();
    (!token.is_empty()).then(|| token.to_owned())
}

impl FromRequest for BearerIdentity {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = bearer_token(req);
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        Box::pin(async move {
            let state =
                state.ok_or_else(|| Error::internal("HTTP state is not configured"))?;
            let token = token.ok_or_else(|| Error::unauthorized("Not authorized, no token"))?;
            let user_id = state.identity.resolve(&token).await.map_err(|err| {
                debug!(error = %err, "bearer credential rejected");
                Error::unauthorized("Not authorized, token failed")
            })?;
            Ok(Self(user_id))
        })
    }
}
