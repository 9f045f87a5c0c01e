use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A labor service offered by the garage. The catalog price is consulted
/// only when a repair line is created; settled lines keep their snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Service {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Service {
    pub fn new(name: String, description: Option<String>, price: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            description,
            price,
            active: true,
            created_at: Utc::now(),
        }
    }
}

/// A spare part in stock.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SparePart {
    pub id: Uuid,
    pub name: String,
    pub unit_price: Decimal,
    pub unit: String,
    pub supplier: Option<String>,
    pub inventory: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl SparePart {
    pub fn new(name: String, unit_price: Decimal, unit: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            unit_price,
            unit,
            supplier: None,
            inventory: 0,
            active: true,
            created_at: Utc::now(),
        }
    }
}
