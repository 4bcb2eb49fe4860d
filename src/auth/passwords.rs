use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

fn keyed_mac(salt: &str) -> HmacSha256 {
    HmacSha256::new_from_slice(salt.as_bytes()).expect("HMAC accepts keys of any length")
}

/// HMAC-SHA256 of `line` keyed with `salt`, hex encoded.
pub fn create_sha256(line: &str, salt: &str) -> String {
    let mut mac = keyed_mac(salt);
    mac.update(line.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Salted password hashing shared by registration, login and the importer.
#[derive(Debug, Clone)]
pub struct PasswordService {
    salt: String,
}

impl PasswordService {
    pub fn new(salt: impl Into<String>) -> Self {
        Self { salt: salt.into() }
    }

    pub fn salt(&self) -> &str {
        &self.salt
    }

    pub fn hash_password(&self, password: &str) -> String {
        create_sha256(password, &self.salt)
    }

    pub fn verify_password(&self, password: &str, encoded: &str) -> bool {
        let Ok(expected) = hex::decode(encoded) else {
            return false;
        };
        let mut mac = keyed_mac(&self.salt);
        mac.update(password.as_bytes());
        mac.verify_slice(&expected).is_ok()
    }
}
