/// Cookie Session Middleware
///
/// Authenticates each request from its token cookies, silently refreshing
/// the session when only the refresh cookie is still valid. The recovered
/// identity is injected into request extensions for route handlers, and
/// reissued tokens are written back as cookies on the response.

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    Error, HttpMessage, HttpResponse,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::{auth_cookies, TokenAuthenticator, ACCESS_COOKIE, REFRESH_COOKIE};
use crate::configuration::CookieSettings;

/// Where unauthenticated requests to protected scopes are sent.
pub const LOGIN_PATH: &str = "/login";

/// Cookie authentication for a scope
///
/// `optional` lets anonymous requests through; `required` redirects them to
/// the login page with the original path as `redirect`.
pub struct CookieAuth {
    authenticator: TokenAuthenticator,
    cookies: CookieSettings,
    required: bool,
}

impl CookieAuth {
    pub fn optional(authenticator: TokenAuthenticator, cookies: CookieSettings) -> Self {
        Self {
            authenticator,
            cookies,
            required: false,
        }
    }

    pub fn required(authenticator: TokenAuthenticator, cookies: CookieSettings) -> Self {
        Self {
            authenticator,
            cookies,
            required: true,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for CookieAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = CookieAuthService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(CookieAuthService {
            service: Rc::new(service),
            authenticator: self.authenticator.clone(),
            cookies: self.cookies.clone(),
            required: self.required,
        }))
    }
}

pub struct CookieAuthService<S> {
    service: Rc<S>,
    authenticator: TokenAuthenticator,
    cookies: CookieSettings,
    required: bool,
}

fn login_redirect(path: &str) -> HttpResponse {
    let location = format!("{}?redirect={}", LOGIN_PATH, urlencoding::encode(path));
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

impl<S, B> Service<ServiceRequest> for CookieAuthService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let access = req.cookie(ACCESS_COOKIE).map(|c| c.value().to_string());
        let refresh = req.cookie(REFRESH_COOKIE).map(|c| c.value().to_string());

        let outcome = self
            .authenticator
            .refresh_flow(access.as_deref(), refresh.as_deref());

        let state = match outcome {
            Ok(state) => state,
            Err(e) => {
                tracing::debug!(path = %req.path(), error = %e, "Request is not authenticated");
                if self.required {
                    let response = login_redirect(req.path());
                    return Box::pin(async move {
                        Ok(req.into_response(response).map_into_right_body())
                    });
                }

                let service = self.service.clone();
                return Box::pin(async move {
                    service.call(req).await.map(|res| res.map_into_left_body())
                });
            }
        };

        tracing::debug!(
            user_id = state.payload().user_id,
            username = %state.payload().username,
            "Session authenticated"
        );
        req.extensions_mut().insert(state.payload().clone());

        let reissued = state.reissued_tokens().map(|tokens| auth_cookies(tokens, &self.cookies));
        let service = self.service.clone();

        Box::pin(async move {
            let mut res = service.call(req).await?;

            // Cookies set by the handler itself (a fresh login) take precedence.
            let handler_set = res
                .response()
                .cookies()
                .any(|c| c.name() == ACCESS_COOKIE || c.name() == REFRESH_COOKIE);

            if let (Some(cookies), false) = (reissued, handler_set) {
                for cookie in &cookies {
                    res.response_mut().add_cookie(cookie)?;
                }
            }

            Ok(res.map_into_left_body())
        })
    }
}
