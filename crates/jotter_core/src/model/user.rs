//! Account profile returned by the auth endpoints.

use serde::{Deserialize, Serialize};

/// Server-issued account identifier.
pub type UserId = String;

/// Public profile of the signed-in account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "user_id")]
    pub id: UserId,
    #[serde(rename = "user_name")]
    pub display_name: String,
    #[serde(rename = "user_email")]
    pub email: String,
}
