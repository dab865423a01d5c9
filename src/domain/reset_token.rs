//! Password reset token.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// One-time token allowing a password change without the old password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordResetToken {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
}

impl PasswordResetToken {
    /// Issue a fresh random token for `user_id` valid for `ttl`.
    pub fn issue(user_id: Uuid, ttl: Duration) -> Self {
        let now = Utc::now();
        // Two v4 UUIDs give 244 random bits.
        let token = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        Self {
            token,
            user_id,
            created_at: now,
            expires_at: now + ttl,
            used_at: None,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.used_at.is_none() && !self.is_expired(now)
    }
}
