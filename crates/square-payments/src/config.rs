//! Square Credentials
//!
//! Credentials are a plain value owned by whoever composes the handler.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SquareError};

pub const ACCESS_TOKEN_VAR: &str = "SQUARE_ACCESS_TOKEN";
pub const ENVIRONMENT_VAR: &str = "SQUARE_ENVIRONMENT";
pub const LOCATION_ID_VAR: &str = "SQUARE_LOCATION_ID";

/// Square API environment
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SquareEnvironment {
    #[default]
    Sandbox,
    Production,
}

impl SquareEnvironment {
    /// REST base URL for this environment
    pub const fn base_url(self) -> &'static str {
        match self {
            Self::Sandbox => "https://connect.squareupsandbox.com",
            Self::Production => "https://connect.squareup.com",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sandbox => "sandbox",
            Self::Production => "production",
        }
    }
}

impl fmt::Display for SquareEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SquareEnvironment {
    type Err = SquareError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sandbox" => Ok(Self::Sandbox),
            "production" => Ok(Self::Production),
            other => Err(SquareError::Config(format!(
                "unknown Square environment '{other}' (expected 'sandbox' or 'production')"
            ))),
        }
    }
}

/// Credentials for one Square seller location
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SquareCredentials {
    pub access_token: String,
    pub environment: SquareEnvironment,
    pub location_id: String,
}

impl SquareCredentials {
    pub fn new(
        access_token: impl Into<String>,
        environment: SquareEnvironment,
        location_id: impl Into<String>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            environment,
            location_id: location_id.into(),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let access_token = std::env::var(ACCESS_TOKEN_VAR)
            .map_err(|_| SquareError::Config(format!("{ACCESS_TOKEN_VAR} not set")))?;
        let environment = std::env::var(ENVIRONMENT_VAR)
            .map_err(|_| SquareError::Config(format!("{ENVIRONMENT_VAR} not set")))?
            .parse()?;
        let location_id = std::env::var(LOCATION_ID_VAR)
            .map_err(|_| SquareError::Config(format!("{LOCATION_ID_VAR} not set")))?;

        Ok(Self::new(access_token, environment, location_id))
    }
}

// Keep the access token out of logs
impl fmt::Debug for SquareCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SquareCredentials")
            .field("access_token", &"<redacted>")
            .field("environment", &self.environment)
            .field("location_id", &self.location_id)
            .finish()
    }
}
