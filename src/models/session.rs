use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write;
use std::str::FromStr;

use crate::models::role::Role;

/// Which storefront the client is running as. Each keeps its own cart.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Storefront {
    #[default]
    Office,
    School,
}

impl fmt::Display for Storefront {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Storefront::Office => write!(f, "office"),
            Storefront::School => write!(f, "school"),
        }
    }
}

impl FromStr for Storefront {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "office" => Ok(Storefront::Office),
            "school" => Ok(Storefront::School),
            other => Err(anyhow::anyhow!("Unknown storefront: {}", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Session {
    pub username: String,
    pub role: Role,
    pub department: Option<String>,
    pub started_at: DateTime<Utc>,
}

impl Session {
    pub fn new(username: String, role: Role, department: Option<String>) -> Self {
        Self {
            username: username.trim().to_string(),
            role,
            department: department
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            started_at: Utc::now(),
        }
    }
}

/// Storage key for the cart belonging to a storefront and (optional) signed-in user.
///
/// Signed-out carts live under `cart.<storefront>.guest`, signed-in ones under
/// `cart.<storefront>.user.<escaped username>`. Distinct usernames always map to
/// distinct keys.
pub fn cart_key(storefront: Storefront, session: Option<&Session>) -> String {
    match session {
        Some(session) => format!("cart.{}.user.{}", storefront, escape_owner(&session.username)),
        None => format!("cart.{}.guest", storefront),
    }
}

/// `[A-Za-z0-9.-]` pass through; every other byte, `_` included, becomes `_XX`.
fn escape_owner(username: &str) -> String {
    let mut escaped = String::with_capacity(username.len());
    for byte in username.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'-') {
            escaped.push(char::from(byte));
        } else {
            let _ = write!(escaped, "_{:02X}", byte);
        }
    }
    escaped
}
