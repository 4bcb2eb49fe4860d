use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ===== Enumerations =====

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Regular,
    Pro,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Regular => "regular",
            UserType::Pro => "pro",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "regular" => Some(UserType::Regular),
            "pro" => Some(UserType::Pro),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HousingType {
    Apartment,
    House,
    Room,
    Hotel,
}

impl HousingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HousingType::Apartment => "apartment",
            HousingType::House => "house",
            HousingType::Room => "room",
            HousingType::Hotel => "hotel",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "apartment" => Some(HousingType::Apartment),
            "house" => Some(HousingType::House),
            "room" => Some(HousingType::Room),
            "hotel" => Some(HousingType::Hotel),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

// ===== Persisted entities =====

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
    pub user_type: UserType,
    #[serde(skip)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub post_date: DateTime<Utc>,
    pub city: String,
    pub preview_image: String,
    pub images: Vec<String>,
    pub is_premium: bool,
    pub is_favorite: bool,
    pub rating: f64,
    pub housing_type: HousingType,
    pub rooms: i32,
    pub guests: i32,
    pub price: i32,
    pub goods: Vec<String>,
    pub location: Location,
    pub user_id: i32,
    pub comment_count: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i32,
    pub text: String,
    pub rating: i32,
    pub offer_id: i32,
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
}

// ===== Insert payloads (already validated and hashed) =====

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
    pub user_type: UserType,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewOffer {
    pub title: String,
    pub description: String,
    pub post_date: DateTime<Utc>,
    pub city: String,
    pub preview_image: String,
    pub images: Vec<String>,
    pub is_premium: bool,
    pub is_favorite: bool,
    pub rating: f64,
    pub housing_type: HousingType,
    pub rooms: i32,
    pub guests: i32,
    pub price: i32,
    pub goods: Vec<String>,
    pub location: Location,
    pub user_id: i32,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub text: String,
    pub rating: i32,
    pub offer_id: i32,
    pub user_id: i32,
}

// ===== Request payloads =====

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub avatar: Option<String>,
    pub user_type: UserType,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateOffer {
    pub title: String,
    pub description: String,
    pub post_date: DateTime<Utc>,
    pub city: String,
    pub preview_image: String,
    pub images: Vec<String>,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub is_favorite: bool,
    pub rating: f64,
    pub housing_type: HousingType,
    pub rooms: i32,
    pub guests: i32,
    pub price: i32,
    #[serde(default)]
    pub goods: Vec<String>,
    pub location: Location,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateComment {
    pub text: String,
    pub rating: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// ===== Response wrappers =====

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub page: i64,
    pub size: i64,
    pub total_elements: i64,
    pub total_pages: i64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, page: i64, size: i64, total_elements: i64) -> Self {
        let total_pages = if size > 0 {
            (total_elements + size - 1) / size
        } else {
            0
        };
        Self {
            data,
            page,
            size,
            total_elements,
            total_pages,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_parse_case_insensitively() {
        assert_eq!(UserType::parse(" Pro "), Some(UserType::Pro));
        assert_eq!(UserType::parse("admin"), None);
        assert_eq!(HousingType::parse("HOTEL"), Some(HousingType::Hotel));
        assert_eq!(HousingType::parse("castle"), None);
    }

    #[test]
    fn user_serialization_omits_password_hash() {
        let user = User {
            id: 7,
            name: "Keks".into(),
            email: "keks@example.com".into(),
            avatar: None,
            user_type: UserType::Pro,
            password_hash: "deadbeef".into(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).expect("serialize");
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["userType"], "pro");
    }

    #[test]
    fn pagination_rounds_total_pages_up() {
        let page = PaginatedResponse::new(vec![1, 2], 1, 2, 5);
        assert_eq!(page.total_pages, 3);
    }
}
