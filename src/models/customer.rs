use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A garage customer. Identity is supplied by the session layer;
/// only ownership stamping happens here.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Customer {
    pub id: Uuid,
    pub full_name: String,
    pub phone: String,
    pub address: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    pub fn new(full_name: String, phone: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            full_name,
            phone,
            address: None,
            active: true,
            created_at: Utc::now(),
        }
    }
}
