//! Postgres-backed repositories.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::models::{
    Comment, HousingType, Location, NewComment, NewOffer, NewUser, Offer, User, UserType,
};
use crate::repository::{
    CommentRepository, OfferRepository, PersistenceError, PersistenceResult, UserRepository,
};

const USER_COLUMNS: &str = "id, name, email, avatar, user_type, password_hash, created_at";

const OFFER_COLUMNS: &str = r#"id, title, description, post_date, city, preview_image, images,
    is_premium, is_favorite, rating, housing_type, rooms, guests, price, goods,
    latitude, longitude, user_id, comment_count, created_at"#;

#[derive(Debug, FromRow)]
struct UserRow {
    id: i32,
    name: String,
    email: String,
    avatar: Option<String>,
    user_type: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = PersistenceError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let user_type = UserType::parse(&row.user_type).ok_or_else(|| {
            PersistenceError::Corrupt(format!("user {} has type '{}'", row.id, row.user_type))
        })?;
        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            avatar: row.avatar,
            user_type,
            password_hash: row.password_hash,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct OfferRow {
    id: i32,
    title: String,
    description: String,
    post_date: DateTime<Utc>,
    city: String,
    preview_image: String,
    images: Vec<String>,
    is_premium: bool,
    is_favorite: bool,
    rating: f64,
    housing_type: String,
    rooms: i32,
    guests: i32,
    price: i32,
    goods: Vec<String>,
    latitude: f64,
    longitude: f64,
    user_id: i32,
    comment_count: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<OfferRow> for Offer {
    type Error = PersistenceError;

    fn try_from(row: OfferRow) -> Result<Self, Self::Error> {
        let housing_type = HousingType::parse(&row.housing_type).ok_or_else(|| {
            PersistenceError::Corrupt(format!(
                "offer {} has housing type '{}'",
                row.id, row.housing_type
            ))
        })?;
        Ok(Offer {
            id: row.id,
            title: row.title,
            description: row.description,
            post_date: row.post_date,
            city: row.city,
            preview_image: row.preview_image,
            images: row.images,
            is_premium: row.is_premium,
            is_favorite: row.is_favorite,
            rating: row.rating,
            housing_type,
            rooms: row.rooms,
            guests: row.guests,
            price: row.price,
            goods: row.goods,
            location: Location {
                latitude: row.latitude,
                longitude: row.longitude,
            },
            user_id: row.user_id,
            comment_count: row.comment_count,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[rocket::async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_email(&self, email: &str) -> PersistenceResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn find_by_id(&self, id: i32) -> PersistenceResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn insert(&self, user: NewUser) -> PersistenceResult<User> {
        let sql = format!(
            "INSERT INTO users (name, email, avatar, user_type, password_hash) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&user.name)
            .bind(&user.email)
            .bind(user.avatar.as_deref())
            .bind(user.user_type.as_str())
            .bind(&user.password_hash)
            .fetch_one(&self.pool)
            .await?;

        log::debug!("inserted user {} ({})", row.id, row.email);
        User::try_from(row)
    }
}

#[derive(Debug, Clone)]
pub struct PgOfferRepository {
    pool: PgPool,
}

impl PgOfferRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[rocket::async_trait]
impl OfferRepository for PgOfferRepository {
    async fn insert(&self, offer: NewOffer) -> PersistenceResult<Offer> {
        let sql = format!(
            r#"INSERT INTO offers (
                title, description, post_date, city, preview_image, images,
                is_premium, is_favorite, rating, housing_type, rooms, guests, price, goods,
                latitude, longitude, user_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING {OFFER_COLUMNS}"#
        );
        let row = sqlx::query_as::<_, OfferRow>(&sql)
            .bind(&offer.title)
            .bind(&offer.description)
            .bind(offer.post_date)
            .bind(&offer.city)
            .bind(&offer.preview_image)
            .bind(&offer.images)
            .bind(offer.is_premium)
            .bind(offer.is_favorite)
            .bind(offer.rating)
            .bind(offer.housing_type.as_str())
            .bind(offer.rooms)
            .bind(offer.guests)
            .bind(offer.price)
            .bind(&offer.goods)
            .bind(offer.location.latitude)
            .bind(offer.location.longitude)
            .bind(offer.user_id)
            .fetch_one(&self.pool)
            .await?;

        log::debug!("inserted offer {} for user {}", row.id, row.user_id);
        Offer::try_from(row)
    }

    async fn find_by_id(&self, id: i32) -> PersistenceResult<Option<Offer>> {
        let sql = format!("SELECT {OFFER_COLUMNS} FROM offers WHERE id = $1");
        let row = sqlx::query_as::<_, OfferRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Offer::try_from).transpose()
    }

    async fn list(&self, limit: i64, offset: i64) -> PersistenceResult<Vec<Offer>> {
        let sql = format!(
            "SELECT {OFFER_COLUMNS} FROM offers ORDER BY post_date DESC, id DESC LIMIT $1 OFFSET $2"
        );
        let rows = sqlx::query_as::<_, OfferRow>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Offer::try_from).collect()
    }

    async fn count(&self) -> PersistenceResult<i64> {
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM offers")
            .fetch_one(&self.pool)
            .await?;
        Ok(total.0)
    }

    async fn delete(&self, id: i32) -> PersistenceResult<bool> {
        let result = sqlx::query("DELETE FROM offers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Debug, Clone)]
pub struct PgCommentRepository {
    pool: PgPool,
}

impl PgCommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[rocket::async_trait]
impl CommentRepository for PgCommentRepository {
    async fn insert(&self, comment: NewComment) -> PersistenceResult<Comment> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Comment>(
            r#"INSERT INTO comments (text, rating, offer_id, user_id)
               VALUES ($1, $2, $3, $4)
               RETURNING id, text, rating, offer_id, user_id, created_at"#,
        )
        .bind(&comment.text)
        .bind(comment.rating)
        .bind(comment.offer_id)
        .bind(comment.user_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE offers SET comment_count = comment_count + 1 WHERE id = $1")
            .bind(comment.offer_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn list_for_offer(&self, offer_id: i32, limit: i64) -> PersistenceResult<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(
            r#"SELECT id, text, rating, offer_id, user_id, created_at
               FROM comments
               WHERE offer_id = $1
               ORDER BY created_at DESC, id DESC
               LIMIT $2"#,
        )
        .bind(offer_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(comments)
    }
}
