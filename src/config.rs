use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub gateway: GatewaySettings,
    pub application: ApplicationSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub pool_size: u32,
}

/// Connection details for the VNPay payment gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewaySettings {
    /// Merchant terminal code issued by the gateway.
    pub tmn_code: String,
    /// Shared HMAC-SHA512 signing secret. Never logged.
    pub hash_secret: String,
    /// Gateway redirect base URL.
    pub payment_url: String,
    /// URL the gateway sends the customer back to.
    pub return_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationSettings {
    pub port: u16,
    pub log_level: String,
    /// The single authoritative VAT rate applied at settlement.
    pub vat_rate: Decimal,
    /// Daily booking capacity for appointments.
    pub max_slots_per_day: i64,
}

impl Settings {
    pub fn new() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        builder.build()?.try_deserialize()
    }
}
