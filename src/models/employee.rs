use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A garage employee who receives vehicles and writes repair quotes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Employee {
    pub id: Uuid,
    pub full_name: String,
    pub phone: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Employee {
    pub fn new(full_name: String, phone: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            full_name,
            phone,
            active: true,
            created_at: Utc::now(),
        }
    }
}
