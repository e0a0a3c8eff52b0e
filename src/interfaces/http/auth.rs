//! Resolves the calling account from its API token.

use super::state::HttpState;
use crate::domain::user::User;
use crate::error::PaymentError;
use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, web};
use std::future::Future;
use std::pin::Pin;

/// The account making the request, from `Authorization: Token <key>`.
pub struct AuthenticatedUser(pub User);

fn token_from(req: &HttpRequest) -> Option<String> {
    let header = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    let known_scheme = scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer");
    (known_scheme && !token.is_empty()).then(|| token.to_string())
}

impl FromRequest for AuthenticatedUser {
    type Error = PaymentError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        let token = token_from(req);
        Box::pin(async move {
            let state = state
                .ok_or_else(|| PaymentError::Storage("HTTP state is not configured".to_string()))?;
            let token = token.ok_or(PaymentError::Unauthorized)?;
            state
                .users
                .find_by_token(&token)
                .await?
                .map(Self)
                .ok_or(PaymentError::Unauthorized)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_token_schemes() {
        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "Token abc123"))
            .to_http_request();
        assert_eq!(token_from(&req).as_deref(), Some("abc123"));

        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer xyz"))
            .to_http_request();
        assert_eq!(token_from(&req).as_deref(), Some("xyz"));

        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "Basic dXNlcjpwYXNz"))
            .to_http_request();
        assert!(token_from(&req).is_none());

        assert!(token_from(&TestRequest::default().to_http_request()).is_none());
    }
}
