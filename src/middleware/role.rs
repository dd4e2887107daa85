use crate::modules::auth::dto::TokenClaims;
use crate::modules::auth::model::UserRole;
use crate::common::response::ApiError;
use axum::{
    extract::{Request, Extension},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

pub async fn admin_guard(
    Extension(claims): Extension<TokenClaims>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if claims.role != UserRole::Admin.as_str() {
        return Err(ApiError("Forbidden: Admin access required".to_string(), StatusCode::FORBIDDEN));
    }

    Ok(next.run(req).await)
}
