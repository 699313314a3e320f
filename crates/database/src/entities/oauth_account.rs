use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An external identity linked to a local account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthLink {
    pub user_id: String,
    pub provider: String,
    pub provider_account_id: String,
    pub created_at: DateTime<Utc>,
}
