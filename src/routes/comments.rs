use rocket::State;
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket_okapi::openapi;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::{Comment, CreateComment};
use crate::services::CommentService;

/// Up to 50 most recent comments for an offer.
#[openapi(tag = "Comments")]
#[get("/offers/<offer_id>/comments")]
pub async fn list_comments(
    comments: &State<CommentService>,
    offer_id: i32,
) -> Result<Json<Vec<Comment>>, ApiError> {
    Ok(Json(comments.list_for_offer(offer_id).await?))
}

#[openapi(tag = "Comments")]
#[post("/offers/<offer_id>/comments", data = "<payload>")]
pub async fn create_comment(
    comments: &State<CommentService>,
    user: AuthUser,
    offer_id: i32,
    payload: Json<CreateComment>,
) -> Result<status::Custom<Json<Comment>>, ApiError> {
    let comment = comments
        .create(payload.into_inner(), offer_id, user.id())
        .await?;
    Ok(status::Custom(Status::Created, Json(comment)))
}
