#![cfg(test)]

use crate::features::auth::model::{AuthenticatedUser, UserRole};

use axum::{extract::Request, middleware::Next, Router};
use uuid::Uuid;

pub fn create_admin_user() -> AuthenticatedUser {
    AuthenticatedUser {
        user_id: "test-admin".to_string(),
        email: Some("admin@example.com".to_string()),
        role: UserRole::Admin,
        department_ids: Vec::new(),
    }
}

pub fn create_owner_user(department_ids: Vec<Uuid>) -> AuthenticatedUser {
    AuthenticatedUser {
        user_id: "test-owner".to_string(),
        email: Some("owner@example.com".to_string()),
        role: UserRole::Owner,
        department_ids,
    }
}

/// Inject a fixed user into every request, bypassing token validation
pub fn with_user(router: Router, user: AuthenticatedUser) -> Router {
    router.layer(axum::middleware::from_fn(
        move |mut request: Request, next: Next| {
            let user = user.clone();
            async move {
                request.extensions_mut().insert(user);
                next.run(request).await
            }
        },
    ))
}
