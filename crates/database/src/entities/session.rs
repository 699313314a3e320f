//! Session entity definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-side half of a session. The signed token only points at this row, so
/// deleting it revokes the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SessionRecord {
    pub id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn expiry_is_inclusive() {
        let now = Utc::now();
        let record = SessionRecord {
            id: "s1".into(),
            user_id: "u1".into(),
            created_at: now - Duration::hours(1),
            expires_at: now,
        };

        assert!(record.is_expired_at(now));
        assert!(!record.is_expired_at(now - Duration::seconds(1)));
    }
}
