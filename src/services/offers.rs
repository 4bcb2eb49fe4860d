use std::sync::Arc;

use crate::models::{CreateOffer, NewOffer, Offer};
use crate::repository::OfferRepository;
use crate::services::{ServiceError, ServiceResult};
use crate::validation::Validate;

#[derive(Clone)]
pub struct OfferService {
    repository: Arc<dyn OfferRepository>,
}

impl OfferService {
    pub fn new(repository: Arc<dyn OfferRepository>) -> Self {
        Self { repository }
    }

    /// Validate and store a new offer authored by `user_id`.
    ///
    /// Offers are never deduplicated: the same payload stored twice yields
    /// two rows.
    pub async fn create(&self, dto: CreateOffer, user_id: i32) -> ServiceResult<Offer> {
        dto.validate()?;

        let offer = self
            .repository
            .insert(NewOffer {
                title: dto.title,
                description: dto.description,
                post_date: dto.post_date,
                city: dto.city,
                preview_image: dto.preview_image,
                images: dto.images,
                is_premium: dto.is_premium,
                is_favorite: dto.is_favorite,
                rating: dto.rating,
                housing_type: dto.housing_type,
                rooms: dto.rooms,
                guests: dto.guests,
                price: dto.price,
                goods: dto.goods,
                location: dto.location,
                user_id,
            })
            .await?;

        log::info!("new offer created: {}", offer.title);
        Ok(offer)
    }

    pub async fn find_by_id(&self, id: i32) -> ServiceResult<Option<Offer>> {
        Ok(self.repository.find_by_id(id).await?)
    }

    /// One page of offers (1-based) plus the total number of offers.
    pub async fn find(&self, page: i64, size: i64) -> ServiceResult<(Vec<Offer>, i64)> {
        let size = size.max(1);
        // pages far past the end saturate to an empty result
        let offset = (page.max(1) - 1).saturating_mul(size);
        let offers = self.repository.list(size, offset).await?;
        let total = self.repository.count().await?;
        Ok((offers, total))
    }

    /// Delete an offer on behalf of `requester_id`, who must be its author.
    pub async fn delete(&self, id: i32, requester_id: i32) -> ServiceResult<()> {
        let offer = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("offer {id}")))?;

        if offer.user_id != requester_id {
            return Err(ServiceError::Forbidden(format!(
                "offer {id} belongs to another user"
            )));
        }

        self.repository.delete(id).await?;
        log::info!("offer {} deleted by user {}", id, requester_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MemoryStore, sample_offer};

    #[tokio::test]
    async fn create_does_not_deduplicate() {
        let store = MemoryStore::new();
        let service = OfferService::new(store.offers());

        let first = service.create(sample_offer(), 1).await.expect("first");
        let second = service.create(sample_offer(), 1).await.expect("second");

        assert_ne!(first.id, second.id);
        assert_eq!(store.offer_count(), 2);
    }

    #[tokio::test]
    async fn find_pages_newest_first() {
        let store = MemoryStore::new();
        let service = OfferService::new(store.offers());

        for day in 1..=3 {
            let mut dto = sample_offer();
            dto.post_date = format!("2024-03-0{day}T10:00:00Z").parse().expect("date");
            dto.title = format!("Offer number {day} in town");
            service.create(dto, 1).await.expect("create");
        }

        let (page, total) = service.find(1, 2).await.expect("page one");
        assert_eq!(total, 3);
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].title, "Offer number 3 in town");

        let (rest, _) = service.find(2, 2).await.expect("page two");
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].title, "Offer number 1 in town");
    }

    #[tokio::test]
    async fn find_past_the_last_page_is_empty() {
        let store = MemoryStore::new();
        let service = OfferService::new(store.offers());
        service.create(sample_offer(), 1).await.expect("create");

        let (page, total) = service.find(i64::MAX, 100).await.expect("huge page");
        assert!(page.is_empty());
        assert_eq!(total, 1);
    }

    #[tokio::test]
    async fn only_the_author_may_delete() {
        let store = MemoryStore::new();
        let service = OfferService::new(store.offers());
        let offer = service.create(sample_offer(), 1).await.expect("create");

        let err = service.delete(offer.id, 2).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        service.delete(offer.id, 1).await.expect("delete");
        assert_eq!(store.offer_count(), 0);

        let err = service.delete(offer.id, 1).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
