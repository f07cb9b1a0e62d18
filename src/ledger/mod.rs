//! External collaborators: the balance ledger and the identity provider
//!
//! Both are consumed through narrow async contracts. A ledger call that
//! returns an error means no mutation happened remotely; callers must leave
//! their local view untouched.

mod memory;

pub use memory::{InMemoryIdentity, InMemoryLedger, LedgerRecord};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Signed-in user as reported by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub balance: u64,
    pub total_winnings: u64,
    #[serde(with = "spin_timestamp")]
    pub last_wheel_spin: DateTime<Utc>,
}

impl UserProfile {
    /// Profile for a freshly registered user: starting balance and a wheel
    /// spin date far enough back that the wheel is available immediately
    pub fn registered(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            balance: crate::consts::STARTING_BALANCE,
            total_winnings: 0,
            last_wheel_spin: never_spun(),
        }
    }
}

/// Sentinel spin timestamp for users who never spun (2000-01-01)
pub fn never_spun() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(2000, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Parse a stored spin timestamp: RFC 3339, or a bare `YYYY-MM-DD` date
/// taken as midnight UTC
pub fn parse_spin_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

mod spin_timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&dt.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_spin_timestamp(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid spin timestamp: {raw}")))
    }
}

/// Persistent balance store
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn update_balance(&self, user_id: &str, new_balance: u64) -> Result<(), LedgerError>;

    async fn update_balance_and_winnings(
        &self,
        user_id: &str,
        new_balance: u64,
        new_total_winnings: u64,
    ) -> Result<(), LedgerError>;

    async fn update_balance_and_last_spin(
        &self,
        user_id: &str,
        new_balance: u64,
        new_spin: DateTime<Utc>,
    ) -> Result<(), LedgerError>;
}

/// Current-user lookup
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_user(&self) -> Option<UserProfile>;

    async fn sign_out(&self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_bare_date() {
        let dt = parse_spin_timestamp("2000-01-01").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2000, 1, 1));
        assert_eq!(dt.hour(), 0);
        assert_eq!(dt, never_spun());
    }

    #[test]
    fn test_parse_rfc3339() {
        let dt = parse_spin_timestamp("2026-03-04T22:15:00+02:00").unwrap();
        assert_eq!(dt.hour(), 20);
        assert_eq!(dt.day(), 4);
        assert!(parse_spin_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_profile_json() {
        let json = r#"{
            "id": "u1",
            "email": "demo@example.com",
            "balance": 100,
            "totalWinnings": 5,
            "lastWheelSpin": "2000-01-01"
        }"#;
        let profile: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.balance, 100);
        assert_eq!(profile.last_wheel_spin, never_spun());

        let back = serde_json::to_string(&profile).unwrap();
        let again: UserProfile = serde_json::from_str(&back).unwrap();
        assert_eq!(again, profile);
    }

    #[test]
    fn test_registered_defaults() {
        let profile = UserProfile::registered("u2", "new@example.com");
        assert_eq!(profile.balance, 150);
        assert_eq!(profile.total_winnings, 0);
        assert_eq!(profile.last_wheel_spin, never_spun());
    }
}
