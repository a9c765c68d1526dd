use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage, HttpResponse,
};
use futures_util::future::LocalBoxFuture;
use std::{
    future::{ready, Ready},
    rc::Rc,
};

use crate::middleware::auth::validate_jwt_from_request;
use crate::models::auth::Role;
use crate::models::common::ApiResponse;

/// Lets a request through only with a valid token carrying `role`.
///
/// Rejections are answered here with the usual `ApiResponse` envelope:
/// 401 for a missing or bad token, 403 for the wrong role. Accepted claims are
/// stored in the request extensions.
pub struct RequireRole {
    role: Role,
}

impl RequireRole {
    pub fn admin() -> Self {
        Self { role: Role::Admin }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRole
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireRoleService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireRoleService {
            service: Rc::new(service),
            role: self.role,
        }))
    }
}

pub struct RequireRoleService<S> {
    service: Rc<S>,
    role: Role,
}

impl<S, B> Service<ServiceRequest> for RequireRoleService<S>
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
        let rejection = match validate_jwt_from_request(&req) {
            Ok(claims) if claims.role == self.role => {
                req.extensions_mut().insert(claims);
                None
            }
            Ok(claims) => {
                tracing::warn!(
                    "{} with role {:?} tried {} {}",
                    claims.username,
                    claims.role,
                    req.method(),
                    req.path()
                );
                Some(HttpResponse::Forbidden().json(ApiResponse::<()>::error("Insufficient privileges")))
            }
            Err(e) => Some(HttpResponse::Unauthorized().json(ApiResponse::<()>::error(e.to_string()))),
        };

        if let Some(response) = rejection {
            return Box::pin(async move { Ok(req.into_response(response).map_into_right_body()) });
        }

        let service = self.service.clone();
        Box::pin(async move {
            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}
