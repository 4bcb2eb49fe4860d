//! Field-level validation for incoming payloads.
//!
//! Each payload implements [`Validate`] and reports every failing field at
//! once.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{CreateComment, CreateOffer, CreateUser};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// A single invalid property together with its offending value.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct FieldError {
    pub property: String,
    pub value: Value,
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, property: &str, value: impl Into<Value>, message: impl Into<String>) {
        let message = message.into();
        match self.0.iter_mut().find(|err| err.property == property) {
            Some(existing) => existing.messages.push(message),
            None => self.0.push(FieldError {
                property: property.to_string(),
                value: value.into(),
                messages: vec![message],
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }

    pub fn into_fields(self) -> Vec<FieldError> {
        self.0
    }

    pub fn has(&self, property: &str) -> bool {
        self.0.iter().any(|err| err.property == property)
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|err| format!("{}: {}", err.property, err.messages.join(", ")))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

fn check_length(errors: &mut ValidationErrors, property: &str, value: &str, min: usize, max: usize) {
    let len = value.chars().count();
    if len < min || len > max {
        errors.add(
            property,
            value,
            format!("{property} length must be between {min} and {max} characters"),
        );
    }
}

fn check_range<T>(errors: &mut ValidationErrors, property: &str, value: T, min: T, max: T)
where
    T: PartialOrd + fmt::Display + Copy + Into<Value>,
{
    if value < min || value > max {
        errors.add(
            property,
            value,
            format!("{property} must be between {min} and {max}"),
        );
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

impl Validate for CreateUser {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if !is_valid_email(&self.email) {
            errors.add("email", self.email.as_str(), "email must be a valid address");
        }
        check_length(&mut errors, "name", &self.name, 1, 15);
        check_length(&mut errors, "password", &self.password, 6, 12);
        if let Some(avatar) = &self.avatar {
            if avatar.trim().is_empty() {
                errors.add("avatar", avatar.as_str(), "avatar must be a non-empty path");
            }
        }

        errors.into_result()
    }
}

impl Validate for CreateOffer {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        check_length(&mut errors, "title", &self.title, 10, 100);
        check_length(&mut errors, "description", &self.description, 20, 1024);
        if self.city.trim().is_empty() {
            errors.add("city", self.city.as_str(), "city is required");
        }
        if self.preview_image.trim().is_empty() {
            errors.add("previewImage", self.preview_image.as_str(), "preview image is required");
        }
        if self.images.is_empty() {
            errors.add("images", Value::Array(Vec::new()), "at least one image is required");
        }
        check_range(&mut errors, "rating", self.rating, 1.0, 5.0);
        check_range(&mut errors, "rooms", self.rooms, 1, 8);
        check_range(&mut errors, "guests", self.guests, 1, 10);
        check_range(&mut errors, "price", self.price, 100, 100_000);
        check_range(&mut errors, "latitude", self.location.latitude, -90.0, 90.0);
        check_range(&mut errors, "longitude", self.location.longitude, -180.0, 180.0);

        errors.into_result()
    }
}

impl Validate for CreateComment {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_length(&mut errors, "text", &self.text, 5, 1024);
        check_range(&mut errors, "rating", self.rating, 1, 5);
        errors.into_result()
    }
}
