//! Profile identity extractor.

use std::future::{Ready, ready};

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header::HeaderMap};

use super::error::AppError;

/// Header carrying the profile whose quota a request is charged to.
///
/// Authentication happens upstream; by the time a request reaches this
/// service the header is trusted.
pub const PROFILE_ID_HEADER: &str = "X-Profile-Id";

/// The licensing subject of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileId(pub String);

impl ProfileId {
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, AppError> {
        let value = headers
            .get(PROFILE_ID_HEADER)
            .ok_or_else(|| AppError::BadRequest(format!("missing {PROFILE_ID_HEADER} header")))?;

        let id = value
            .to_str()
            .map_err(|_| AppError::BadRequest(format!("{PROFILE_ID_HEADER} is not valid text")))?
            .trim();

        if id.is_empty() {
            return Err(AppError::BadRequest(format!("{PROFILE_ID_HEADER} is empty")));
        }
        Ok(ProfileId(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromRequest for ProfileId {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(ProfileId::from_headers(req.headers()))
    }
}
