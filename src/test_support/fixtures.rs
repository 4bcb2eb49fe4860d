use std::io::Write;

use chrono::{TimeZone, Utc};
use tempfile::NamedTempFile;

use crate::models::{CreateOffer, CreateUser, HousingType, Location, UserType};

pub fn sample_user(email: &str) -> CreateUser {
    CreateUser {
        name: "Keks".into(),
        email: email.into(),
        avatar: Some("avatars/keks.jpg".into()),
        user_type: UserType::Pro,
        password: "123456".into(),
    }
}

/// A `CreateOffer` that passes validation.
pub fn sample_offer() -> CreateOffer {
    CreateOffer {
        title: "Canal view loft in the old town".into(),
        description: "Bright loft overlooking the canal, two minutes from the station.".into(),
        post_date: Utc.with_ymd_and_hms(2024, 4, 12, 9, 30, 0).unwrap(),
        city: "Amsterdam".into(),
        preview_image: "img/preview.jpg".into(),
        images: vec!["img/1.jpg".into(), "img/2.jpg".into()],
        is_premium: true,
        is_favorite: false,
        rating: 4.8,
        housing_type: HousingType::Apartment,
        rooms: 2,
        guests: 4,
        price: 320,
        goods: vec!["Breakfast".into(), "Washer".into(), "Wi-Fi".into()],
        location: Location {
            latitude: 52.370216,
            longitude: 4.895168,
        },
    }
}

/// One valid TSV row describing [`sample_offer`] authored by `email`.
pub fn sample_tsv_line(email: &str) -> String {
    [
        "Canal view loft in the old town",
        "Bright loft overlooking the canal, two minutes from the station.",
        "2024-04-12T09:30:00Z",
        "4.8",
        "Keks",
        email,
        "avatars/keks.jpg",
        "pro",
        "Amsterdam",
        "img/preview.jpg",
        "img/1.jpg;img/2.jpg",
        "true",
        "false",
        "apartment",
        "2",
        "4",
        "320",
        "Breakfast;Washer;Wi-Fi",
        "52.370216",
        "4.895168",
    ]
    .join("\t")
}

/// Write `lines` to a temporary file, newline separated, without a trailing
/// newline after the last one.
pub fn tsv_fixture(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp tsv");
    file.write_all(lines.join("\n").as_bytes())
        .expect("write temp tsv");
    file.flush().expect("flush temp tsv");
    file
}
