/// Authentication Middleware
///
/// Runs the validate-or-refresh flow on every protected request. On the
/// fast path it injects the authenticated `Identity` into request
/// extensions and forwards to the handler. When the access token has
/// expired and the refresh token is still valid, it answers with a
/// distinguished `TOKEN_REFRESHED` response and does NOT run the
/// handler; the client must retry the original request with the new
/// access token.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage, HttpResponse,
};
use futures::future::LocalBoxFuture;
use sqlx::PgPool;
use std::rc::Rc;

use crate::auth::{authenticate, AuthOutcome};
use crate::configuration::JwtSettings;
use crate::error::AppError;

const REFRESH_TOKEN_HEADER: &str = "X-Refresh-Token";

/// Authentication middleware for protected routes.
///
/// Extracts the bearer access token from the Authorization header and
/// the opaque refresh token from `X-Refresh-Token`.
pub struct AuthMiddleware {
    jwt_config: JwtSettings,
}

impl AuthMiddleware {
    pub fn new(jwt_config: JwtSettings) -> Self {
        Self { jwt_config }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
            jwt_config: self.jwt_config.clone(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    jwt_config: JwtSettings,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let access_token = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::to_owned);

        let refresh_token = req
            .headers()
            .get(REFRESH_TOKEN_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::to_owned);

        let jwt_config = self.jwt_config.clone();
        let service = self.service.clone();

        Box::pin(async move {
            let pool = req
                .app_data::<web::Data<PgPool>>()
                .cloned()
                .ok_or_else(|| Error::from(AppError::Internal("Database pool not configured".to_string())))?;

            let outcome = authenticate(
                pool.get_ref(),
                &jwt_config,
                access_token.as_deref(),
                refresh_token.as_deref(),
            )
            .await;

            match outcome {
                Ok(AuthOutcome::Authenticated(identity)) => {
                    tracing::debug!(
                        user_id = %identity.user_id,
                        "Access token validated"
                    );
                    req.extensions_mut().insert(identity);
                    service.call(req).await
                }
                Ok(AuthOutcome::Refreshed { access_token }) => {
                    // Terminal for this request: the handler never runs.
                    let response = HttpResponse::Ok().json(serde_json::json!({
                        "message": "access token refreshed",
                        "access_token": access_token,
                        "code": "TOKEN_REFRESHED"
                    }));
                    Err(actix_web::error::InternalError::from_response(
                        "token refreshed",
                        response,
                    )
                    .into())
                }
                Err(e) => Err(e.into()),
            }
        })
    }
}
