use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Characters a project access code is drawn from.
const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of a project access code.
pub const CODE_LEN: usize = 8;

/// Metadata for one shared board, keyed by its access code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub code: String,
    pub title: String,
    pub admin_name: String,
    pub created_at: DateTime<Utc>,
    /// Optional embedded logo as `data:image/png;base64,...`; empty when unset.
    pub logo_base64: String,
}

impl Project {
    pub fn new(code: String, title: String, admin_name: String) -> Self {
        Self {
            code,
            title,
            admin_name,
            created_at: Utc::now(),
            logo_base64: String::new(),
        }
    }

    /// Generate a random 8-character uppercase alphanumeric access code.
    pub fn generate_code() -> String {
        let mut rng = rand::thread_rng();
        (0..CODE_LEN)
            .map(|_| CODE_CHARSET[rng.gen_range(0..CODE_CHARSET.len())] as char)
            .collect()
    }
}
