pub mod decoder_config;

pub use decoder_config::{ConfigError, DecoderConfig};
