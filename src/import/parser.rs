//! TSV record parsing.
//!
//! Column order (no header row):
//!
//! | # | field | format |
//! |---|-------|--------|
//! | 0 | title | text |
//! | 1 | description | text |
//! | 2 | date | RFC 3339 |
//! | 3 | rating | decimal |
//! | 4 | author name | text |
//! | 5 | author email | text |
//! | 6 | author avatar | path, may be empty |
//! | 7 | user type | `regular` / `pro` |
//! | 8 | city | text |
//! | 9 | preview image | path |
//! | 10 | images | `;`-separated |
//! | 11 | premium | `true` / `false` |
//! | 12 | favorite | `true` / `false` |
//! | 13 | housing type | `apartment` / `house` / `room` / `hotel` |
//! | 14 | rooms | integer |
//! | 15 | guests | integer |
//! | 16 | price | integer |
//! | 17 | goods | `;`-separated |
//! | 18 | latitude | decimal |
//! | 19 | longitude | decimal |

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

use crate::models::{CreateOffer, CreateUser, HousingType, Location, UserType};

pub const COLUMN_COUNT: usize = 20;
const LIST_SEPARATOR: char = ';';

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("expected {expected} columns, found {found}")]
    ColumnCount { expected: usize, found: usize },
    #[error("column '{field}' is empty")]
    EmptyField { field: &'static str },
    #[error("column '{field}' is not a valid number: '{value}'")]
    InvalidNumber { field: &'static str, value: String },
    #[error("column '{field}' is not a valid date: '{value}'")]
    InvalidDate { field: &'static str, value: String },
    #[error("column '{field}' is not a boolean: '{value}'")]
    InvalidBoolean { field: &'static str, value: String },
    #[error("unknown user type '{0}'")]
    UnknownUserType(String),
    #[error("unknown housing type '{0}'")]
    UnknownHousingType(String),
}

/// Author columns of an imported row.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorRecord {
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
    pub user_type: UserType,
}

/// One parsed TSV row. Lives only for the duration of the import.
#[derive(Debug, Clone, PartialEq)]
pub struct OfferRecord {
    pub title: String,
    pub description: String,
    pub post_date: DateTime<Utc>,
    pub rating: f64,
    pub author: AuthorRecord,
    pub city: String,
    pub preview_image: String,
    pub images: Vec<String>,
    pub is_premium: bool,
    pub is_favorite: bool,
    pub housing_type: HousingType,
    pub rooms: i32,
    pub guests: i32,
    pub price: i32,
    pub goods: Vec<String>,
    pub location: Location,
}

struct Columns<'a> {
    values: Vec<&'a str>,
}

impl<'a> Columns<'a> {
    fn text(&self, index: usize, field: &'static str) -> Result<String, ParseError> {
        let value = self.values[index].trim();
        if value.is_empty() {
            return Err(ParseError::EmptyField { field });
        }
        Ok(value.to_string())
    }

    fn optional_text(&self, index: usize) -> Option<String> {
        let value = self.values[index].trim();
        (!value.is_empty()).then(|| value.to_string())
    }

    fn number<T: FromStr>(&self, index: usize, field: &'static str) -> Result<T, ParseError> {
        let value = self.values[index].trim();
        value.parse::<T>().map_err(|_| ParseError::InvalidNumber {
            field,
            value: value.to_string(),
        })
    }

    fn finite(&self, index: usize, field: &'static str) -> Result<f64, ParseError> {
        let value: f64 = self.number(index, field)?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(ParseError::InvalidNumber {
                field,
                value: self.values[index].trim().to_string(),
            })
        }
    }

    fn boolean(&self, index: usize, field: &'static str) -> Result<bool, ParseError> {
        let value = self.values[index].trim();
        match value.to_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(ParseError::InvalidBoolean {
                field,
                value: value.to_string(),
            }),
        }
    }

    fn date(&self, index: usize, field: &'static str) -> Result<DateTime<Utc>, ParseError> {
        let value = self.values[index].trim();
        DateTime::parse_from_rfc3339(value)
            .map(|date| date.with_timezone(&Utc))
            .map_err(|_| ParseError::InvalidDate {
                field,
                value: value.to_string(),
            })
    }

    fn list(&self, index: usize) -> Vec<String> {
        self.values[index]
            .split(LIST_SEPARATOR)
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Parse one raw TSV line into an [`OfferRecord`].
pub fn parse_offer(line: &str) -> Result<OfferRecord, ParseError> {
    let values: Vec<&str> = line.trim_end_matches(['\r', '\n']).split('\t').collect();
    if values.len() != COLUMN_COUNT {
        return Err(ParseError::ColumnCount {
            expected: COLUMN_COUNT,
            found: values.len(),
        });
    }
    let cols = Columns { values };

    let user_type_raw = cols.text(7, "userType")?;
    let user_type =
        UserType::parse(&user_type_raw).ok_or(ParseError::UnknownUserType(user_type_raw))?;
    let housing_raw = cols.text(13, "housingType")?;
    let housing_type =
        HousingType::parse(&housing_raw).ok_or(ParseError::UnknownHousingType(housing_raw))?;

    Ok(OfferRecord {
        title: cols.text(0, "title")?,
        description: cols.text(1, "description")?,
        post_date: cols.date(2, "date")?,
        rating: cols.finite(3, "rating")?,
        author: AuthorRecord {
            name: cols.text(4, "authorName")?,
            email: cols.text(5, "authorEmail")?,
            avatar: cols.optional_text(6),
            user_type,
        },
        city: cols.text(8, "city")?,
        preview_image: cols.text(9, "previewImage")?,
        images: cols.list(10),
        is_premium: cols.boolean(11, "isPremium")?,
        is_favorite: cols.boolean(12, "isFavorite")?,
        housing_type,
        rooms: cols.number(14, "rooms")?,
        guests: cols.number(15, "guests")?,
        price: cols.number(16, "price")?,
        goods: cols.list(17),
        location: Location {
            latitude: cols.finite(18, "latitude")?,
            longitude: cols.finite(19, "longitude")?,
        },
    })
}

impl OfferRecord {
    /// Serialise back into the column order accepted by [`parse_offer`].
    pub fn to_tsv_line(&self) -> String {
        let separator = LIST_SEPARATOR.to_string();
        let columns = [
            self.title.clone(),
            self.description.clone(),
            self.post_date.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            self.rating.to_string(),
            self.author.name.clone(),
            self.author.email.clone(),
            self.author.avatar.clone().unwrap_or_default(),
            self.author.user_type.as_str().to_string(),
            self.city.clone(),
            self.preview_image.clone(),
            self.images.join(&separator),
            self.is_premium.to_string(),
            self.is_favorite.to_string(),
            self.housing_type.as_str().to_string(),
            self.rooms.to_string(),
            self.guests.to_string(),
            self.price.to_string(),
            self.goods.join(&separator),
            self.location.latitude.to_string(),
            self.location.longitude.to_string(),
        ];
        columns.join("\t")
    }

    /// Author payload; the import source carries no password of its own.
    pub fn author_payload(&self, password: &str) -> CreateUser {
        CreateUser {
            name: self.author.name.clone(),
            email: self.author.email.clone(),
            avatar: self.author.avatar.clone(),
            user_type: self.author.user_type,
            password: password.to_string(),
        }
    }

    pub fn offer_payload(&self) -> CreateOffer {
        CreateOffer {
            title: self.title.clone(),
            description: self.description.clone(),
            post_date: self.post_date,
            city: self.city.clone(),
            preview_image: self.preview_image.clone(),
            images: self.images.clone(),
            is_premium: self.is_premium,
            is_favorite: self.is_favorite,
            rating: self.rating,
            housing_type: self.housing_type,
            rooms: self.rooms,
            guests: self.guests,
            price: self.price,
            goods: self.goods.clone(),
            location: self.location,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_tsv_line;

    #[test]
    fn parses_a_complete_row() {
        let record = parse_offer(&sample_tsv_line("keks@example.com")).expect("parse");

        assert_eq!(record.title, "Canal view loft in the old town");
        assert_eq!(record.post_date.to_rfc3339(), "2024-04-12T09:30:00+00:00");
        assert_eq!(record.rating, 4.8);
        assert_eq!(record.author.email, "keks@example.com");
        assert_eq!(record.author.user_type, UserType::Pro);
        assert_eq!(record.images, vec!["img/1.jpg", "img/2.jpg"]);
        assert!(record.is_premium);
        assert!(!record.is_favorite);
        assert_eq!(record.housing_type, HousingType::Apartment);
        assert_eq!((record.rooms, record.guests, record.price), (2, 4, 320));
        assert_eq!(record.goods, vec!["Breakfast", "Washer", "Wi-Fi"]);
        assert_eq!(record.location.latitude, 52.370216);
    }

    #[test]
    fn round_trips_through_tsv() {
        let line = sample_tsv_line("keks@example.com");
        let record = parse_offer(&line).expect("parse");
        let reparsed = parse_offer(&record.to_tsv_line()).expect("reparse");
        assert_eq!(record, reparsed);
        assert_eq!(record.to_tsv_line(), line);
    }

    #[test]
    fn rejects_non_numeric_rating() {
        let line = sample_tsv_line("keks@example.com").replacen("\t4.8\t", "\tgreat\t", 1);
        let err = parse_offer(&line).unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidNumber {
                field: "rating",
                value: "great".into()
            }
        );
    }

    #[test]
    fn rejects_malformed_date_instead_of_defaulting() {
        let line = sample_tsv_line("keks@example.com").replacen("2024-04-12T09:30:00Z", "yesterday", 1);
        assert!(matches!(
            parse_offer(&line),
            Err(ParseError::InvalidDate { field: "date", .. })
        ));
    }

    #[test]
    fn rejects_wrong_column_count() {
        assert_eq!(
            parse_offer("just\tthree\tcolumns").unwrap_err(),
            ParseError::ColumnCount {
                expected: COLUMN_COUNT,
                found: 3
            }
        );
    }

    #[test]
    fn rejects_unknown_enumerations() {
        let line = sample_tsv_line("keks@example.com").replacen("\tpro\t", "\tadmin\t", 1);
        assert_eq!(
            parse_offer(&line).unwrap_err(),
            ParseError::UnknownUserType("admin".into())
        );

        let line = sample_tsv_line("keks@example.com").replacen("\tapartment\t", "\tcastle\t", 1);
        assert_eq!(
            parse_offer(&line).unwrap_err(),
            ParseError::UnknownHousingType("castle".into())
        );
    }

    #[test]
    fn empty_avatar_becomes_none() {
        let line = sample_tsv_line("keks@example.com").replacen("\tavatars/keks.jpg\t", "\t\t", 1);
        let record = parse_offer(&line).expect("parse");
        assert_eq!(record.author.avatar, None);
        assert_eq!(record.author_payload("123456").password, "123456");
    }
}
