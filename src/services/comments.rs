use std::sync::Arc;

use crate::models::{Comment, CreateComment, NewComment};
use crate::repository::{CommentRepository, OfferRepository};
use crate::services::{ServiceError, ServiceResult};
use crate::validation::Validate;

pub const MAX_COMMENTS_PER_OFFER: i64 = 50;

#[derive(Clone)]
pub struct CommentService {
    comments: Arc<dyn CommentRepository>,
    offers: Arc<dyn OfferRepository>,
}

impl CommentService {
    pub fn new(comments: Arc<dyn CommentRepository>, offers: Arc<dyn OfferRepository>) -> Self {
        Self { comments, offers }
    }

    pub async fn create(
        &self,
        dto: CreateComment,
        offer_id: i32,
        user_id: i32,
    ) -> ServiceResult<Comment> {
        dto.validate()?;
        self.ensure_offer(offer_id).await?;

        let comment = self
            .comments
            .insert(NewComment {
                text: dto.text,
                rating: dto.rating,
                offer_id,
                user_id,
            })
            .await?;

        log::info!("comment {} added to offer {}", comment.id, offer_id);
        Ok(comment)
    }

    /// Newest comments for an offer.
    pub async fn list_for_offer(&self, offer_id: i32) -> ServiceResult<Vec<Comment>> {
        self.ensure_offer(offer_id).await?;
        Ok(self
            .comments
            .list_for_offer(offer_id, MAX_COMMENTS_PER_OFFER)
            .await?)
    }

    async fn ensure_offer(&self, offer_id: i32) -> ServiceResult<()> {
        match self.offers.find_by_id(offer_id).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::NotFound(format!("offer {offer_id}"))),
        }
    }
}
