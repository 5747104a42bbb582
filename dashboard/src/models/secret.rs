//! Database credentials carried by SQL steps

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::DashboardError;

/// Password of a SQL deployment step
///
/// Held as a `SecretString` so it is zeroized on drop and redacted from
/// `Debug`. On the wire it is base64, which the backend decodes; that is a
/// transport encoding, not protection. Templates are saved without passwords
/// unless explicitly configured otherwise.
pub struct DbPassword(SecretString);

impl DbPassword {
    pub fn new(password: impl Into<String>) -> Self {
        Self(SecretString::from(password.into()))
    }

    /// Decode the base64 wire form
    pub fn from_encoded(encoded: &str) -> Result<Self, DashboardError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| DashboardError::Parse(format!("dbPassword is not valid base64: {}", e)))?;
        let password = String::from_utf8(bytes)
            .map_err(|_| DashboardError::Parse("dbPassword is not valid UTF-8".to_string()))?;
        Ok(Self::new(password))
    }

    /// Base64 wire form
    pub fn encoded(&self) -> String {
        STANDARD.encode(self.0.expose_secret().as_bytes())
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.0.expose_secret().is_empty()
    }
}

impl Clone for DbPassword {
    fn clone(&self) -> Self {
        Self::new(self.expose().to_owned())
    }
}

impl PartialEq for DbPassword {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for DbPassword {}

impl fmt::Debug for DbPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DbPassword([REDACTED])")
    }
}

impl Serialize for DbPassword {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.encoded())
    }
}

impl<'de> Deserialize<'de> for DbPassword {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        DbPassword::from_encoded(&encoded).map_err(serde::de::Error::custom)
    }
}
