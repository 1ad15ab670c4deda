//! Static routes.

use axum::Json;

use crate::error::MessageResponse;

pub const WELCOME_MESSAGE: &str = "Welcome to the Home page of package 1!";
pub const DUMMY_MESSAGE: &str = "Dummy response from package 1";

/// GET /
pub async fn home() -> &'static str {
    WELCOME_MESSAGE
}

/// GET /dummy
pub async fn dummy() -> Json<MessageResponse> {
    Json(MessageResponse::new(DUMMY_MESSAGE))
}
