use rocket::State;
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket_okapi::openapi;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::{CreateOffer, Offer, PaginatedResponse};
use crate::routes::params::PaginationParams;
use crate::services::OfferService;

/// List offers, newest first.
#[openapi(tag = "Offers")]
#[get("/offers?<params..>")]
pub async fn list_offers(
    offers: &State<OfferService>,
    params: Option<PaginationParams>,
) -> Result<Json<PaginatedResponse<Offer>>, ApiError> {
    let params = params.unwrap_or_default();
    let (page, size) = (params.page(), params.size());

    let (data, total) = offers.find(page, size).await?;
    Ok(Json(PaginatedResponse::new(data, page, size, total)))
}

#[openapi(tag = "Offers")]
#[get("/offers/<offer_id>")]
pub async fn get_offer(
    offers: &State<OfferService>,
    offer_id: i32,
) -> Result<Json<Offer>, ApiError> {
    offers
        .find_by_id(offer_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("offer {offer_id} not found")))
}

/// Create an offer authored by the caller.
#[openapi(tag = "Offers")]
#[post("/offers", data = "<payload>")]
pub async fn create_offer(
    offers: &State<OfferService>,
    user: AuthUser,
    payload: Json<CreateOffer>,
) -> Result<status::Custom<Json<Offer>>, ApiError> {
    let offer = offers.create(payload.into_inner(), user.id()).await?;
    Ok(status::Custom(Status::Created, Json(offer)))
}

/// Delete an offer. Only its author may do so.
#[openapi(tag = "Offers")]
#[delete("/offers/<offer_id>")]
pub async fn delete_offer(
    offers: &State<OfferService>,
    user: AuthUser,
    offer_id: i32,
) -> Result<status::NoContent, ApiError> {
    offers.delete(offer_id, user.id()).await?;
    Ok(status::NoContent)
}
