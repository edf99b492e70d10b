//! Family and member entities.
//!
//! A family is the scoping boundary for every task query. Members earn
//! points through task settlement; the streak counter is maintained by an
//! external job and only stored here.

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A group of users sharing one task pool, joined via invite code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Family {
    pub id: Uuid,
    pub name: String,
    /// Unique human-shareable code, e.g. `DUPO-K3F9`.
    pub invite_code: String,
}

/// A family member with a running point total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    /// Running total, adjusted only by task settlement.
    pub points: i64,
    /// Consecutive-day completion counter, maintained externally.
    pub streak: i64,
    pub family_id: Option<Uuid>,
}

const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Build a shareable invite code: the first letters of the family name
/// uppercased, then a dash and four random characters. Ambiguous glyphs
/// (O/0, I/1) are excluded from the random part.
pub fn generate_invite_code(family_name: &str) -> String {
    let prefix: String = family_name
        .chars()
        .filter(|c| c.is_alphanumeric())
        .take(4)
        .collect::<String>()
        .to_uppercase();
    let prefix = if prefix.is_empty() {
        "FAM".to_string()
    } else {
        prefix
    };

    let mut rng = rand::thread_rng();
    let suffix: String = (0..4)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect();

    format!("{prefix}-{suffix}")
}
