pub mod logging;

pub use logging::{init_logging, mask_sensitive, LogConfig, LogFormat};
