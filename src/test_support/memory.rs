//! In-memory repositories mirroring the Postgres behaviour closely enough for
//! service, route and import tests.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;

use crate::db::DatabaseClient;
use crate::models::{Comment, NewComment, NewOffer, NewUser, Offer, User};
use crate::repository::{
    CommentRepository, OfferRepository, PersistenceError, PersistenceResult, Repositories,
    UserRepository,
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    offers: Vec<Offer>,
    comments: Vec<Comment>,
    next_user_id: i32,
    next_offer_id: i32,
    next_comment_id: i32,
    offer_inserts: usize,
    failing_offer_insert: Option<usize>,
}

/// Shared in-memory tables. Clones see the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> Arc<dyn UserRepository> {
        Arc::new(self.clone())
    }

    pub fn offers(&self) -> Arc<dyn OfferRepository> {
        Arc::new(self.clone())
    }

    pub fn comments(&self) -> Arc<dyn CommentRepository> {
        Arc::new(self.clone())
    }

    pub fn repositories(&self) -> Repositories {
        Repositories {
            users: self.users(),
            offers: self.offers(),
            comments: self.comments(),
        }
    }

    /// Make the `nth` offer insert from now on (1-based) fail as if the
    /// database had dropped the write. Later inserts succeed again.
    pub fn fail_offer_insert(&self, nth: usize) {
        let mut tables = self.tables.lock();
        tables.failing_offer_insert = Some(tables.offer_inserts + nth);
    }

    pub fn user_count(&self) -> usize {
        self.tables.lock().users.len()
    }

    pub fn offer_count(&self) -> usize {
        self.tables.lock().offers.len()
    }

    pub fn users_snapshot(&self) -> Vec<User> {
        self.tables.lock().users.clone()
    }

    pub fn offers_snapshot(&self) -> Vec<Offer> {
        self.tables.lock().offers.clone()
    }
}

#[rocket::async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_email(&self, email: &str) -> PersistenceResult<Option<User>> {
        let tables = self.tables.lock();
        Ok(tables
            .users
            .iter()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_id(&self, id: i32) -> PersistenceResult<Option<User>> {
        Ok(self.tables.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn insert(&self, user: NewUser) -> PersistenceResult<User> {
        let mut tables = self.tables.lock();
        if tables
            .users
            .iter()
            .any(|existing| existing.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(PersistenceError::Rejected(format!(
                "duplicate email {}",
                user.email
            )));
        }

        tables.next_user_id += 1;
        let created = User {
            id: tables.next_user_id,
            name: user.name,
            email: user.email,
            avatar: user.avatar,
            user_type: user.user_type,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        tables.users.push(created.clone());
        Ok(created)
    }
}

#[rocket::async_trait]
impl OfferRepository for MemoryStore {
    async fn insert(&self, offer: NewOffer) -> PersistenceResult<Offer> {
        let mut tables = self.tables.lock();
        tables.offer_inserts += 1;
        if tables.failing_offer_insert == Some(tables.offer_inserts) {
            return Err(PersistenceError::Unavailable(format!(
                "write of offer '{}' failed",
                offer.title
            )));
        }

        tables.next_offer_id += 1;
        let created = Offer {
            id: tables.next_offer_id,
            title: offer.title,
            description: offer.description,
            post_date: offer.post_date,
            city: offer.city,
            preview_image: offer.preview_image,
            images: offer.images,
            is_premium: offer.is_premium,
            is_favorite: offer.is_favorite,
            rating: offer.rating,
            housing_type: offer.housing_type,
            rooms: offer.rooms,
            guests: offer.guests,
            price: offer.price,
            goods: offer.goods,
            location: offer.location,
            user_id: offer.user_id,
            comment_count: 0,
            created_at: Utc::now(),
        };
        tables.offers.push(created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: i32) -> PersistenceResult<Option<Offer>> {
        Ok(self.tables.lock().offers.iter().find(|o| o.id == id).cloned())
    }

    async fn list(&self, limit: i64, offset: i64) -> PersistenceResult<Vec<Offer>> {
        let mut offers = self.tables.lock().offers.clone();
        offers.sort_by(|a, b| b.post_date.cmp(&a.post_date).then(b.id.cmp(&a.id)));
        Ok(offers
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count(&self) -> PersistenceResult<i64> {
        Ok(self.tables.lock().offers.len() as i64)
    }

    async fn delete(&self, id: i32) -> PersistenceResult<bool> {
        let mut tables = self.tables.lock();
        let before = tables.offers.len();
        tables.offers.retain(|offer| offer.id != id);
        tables.comments.retain(|comment| comment.offer_id != id);
        Ok(tables.offers.len() != before)
    }
}

#[rocket::async_trait]
impl CommentRepository for MemoryStore {
    async fn insert(&self, comment: NewComment) -> PersistenceResult<Comment> {
        let mut tables = self.tables.lock();
        let Some(offer) = tables.offers.iter_mut().find(|o| o.id == comment.offer_id) else {
            return Err(PersistenceError::Rejected(format!(
                "offer {} does not exist",
                comment.offer_id
            )));
        };
        offer.comment_count += 1;

        tables.next_comment_id += 1;
        let created = Comment {
            id: tables.next_comment_id,
            text: comment.text,
            rating: comment.rating,
            offer_id: comment.offer_id,
            user_id: comment.user_id,
            created_at: Utc::now(),
        };
        tables.comments.push(created.clone());
        Ok(created)
    }

    async fn list_for_offer(&self, offer_id: i32, limit: i64) -> PersistenceResult<Vec<Comment>> {
        let mut comments: Vec<Comment> = self
            .tables
            .lock()
            .comments
            .iter()
            .filter(|c| c.offer_id == offer_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        comments.truncate(limit.max(0) as usize);
        Ok(comments)
    }
}

/// [`DatabaseClient`] over a [`MemoryStore`], tracking connection lifecycle.
pub struct MemoryDatabaseClient {
    store: MemoryStore,
    reachable: bool,
    connected: bool,
    connected_uri: Option<String>,
    disconnects: usize,
}

impl MemoryDatabaseClient {
    pub fn new(store: MemoryStore) -> Self {
        Self {
            store,
            reachable: true,
            connected: false,
            connected_uri: None,
            disconnects: 0,
        }
    }

    /// A client whose `connect` always fails.
    pub fn unreachable(store: MemoryStore) -> Self {
        Self {
            reachable: false,
            ..Self::new(store)
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn connected_uri(&self) -> Option<&str> {
        self.connected_uri.as_deref()
    }

    pub fn disconnect_calls(&self) -> usize {
        self.disconnects
    }
}

#[rocket::async_trait]
impl DatabaseClient for MemoryDatabaseClient {
    async fn connect(&mut self, uri: &str) -> PersistenceResult<()> {
        if !self.reachable {
            return Err(PersistenceError::Unavailable(format!(
                "connection refused: {uri}"
            )));
        }
        self.connected = true;
        self.connected_uri = Some(uri.to_string());
        Ok(())
    }

    async fn disconnect(&mut self) -> PersistenceResult<()> {
        self.connected = false;
        self.disconnects += 1;
        Ok(())
    }

    fn repositories(&self) -> PersistenceResult<Repositories> {
        if self.connected {
            Ok(self.store.repositories())
        } else {
            Err(PersistenceError::NotConnected)
        }
    }
}
