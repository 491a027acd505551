//! OpenRTB Native 请求解码。
//!
//! 把不同版本、不同接入方式（直接对象 / 包装字符串）的 Native 请求
//! 统一解码为一个 1.1 结构的 [`Request`]。

pub mod config;
pub mod decode;
pub mod error;
pub mod logging;
pub mod native;

pub use config::DecoderConfig;
pub use decode::{decode, Decoder, VariantPolicy};
pub use error::{DecodeError, DecodeErrorKind};
pub use native::{Asset, AssetKind, Request};
