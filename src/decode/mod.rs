//! Native 请求解码流水线：
//! 原始字节 -> 解包 -> 版本归一 -> 字段解码 -> 素材解码 -> `Request`。
//! 任何一步失败都直接返回该步的错误，不会产出半成品。

pub mod asset;
pub mod coerce;
pub mod migrate;
pub mod unwrap;

use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::debug;

use crate::config::DecoderConfig;
use crate::error::{DecodeError, Result};
use crate::native::{Asset, Request};

pub use asset::{decode_asset, VariantPolicy};
pub use migrate::{normalize, Layout, Normalized, CANONICAL_VERSION};
pub use unwrap::{unwrap, Unwrapped, WRAPPER_KEYS};

/// 无状态解码器，可以在任意线程间复制使用
#[derive(Debug, Clone, Copy, Default)]
pub struct Decoder {
    config: DecoderConfig,
}

impl Decoder {
    pub fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// 从原始字节解码
    pub fn decode(&self, raw: &[u8]) -> Result<Request> {
        let document = unwrap::parse_document(raw, "request body")?;
        self.decode_value(document)
    }

    /// 从文本解码，常见于 `imp.native.request` 已经被取出来的场景
    pub fn decode_str(&self, raw: &str) -> Result<Request> {
        self.decode(raw.as_bytes())
    }

    /// 从已解析的 JSON 解码
    pub fn decode_value(&self, document: Value) -> Result<Request> {
        let unwrapped = unwrap(document, self.config.max_wrap_depth)?;
        let normalized = normalize(unwrapped.payload)?;
        let payload = &normalized.payload;
        let fields = coerce::Fields::new(payload, "");

        let context_type_id = fields.code("context")?;
        let context_sub_type_id = fields.code("contextsubtype")?;
        let placement_type_id = fields.code("plcmttype")?;
        let placement_count = fields.count("plcmtcnt")?;
        let sequence = fields.integer("seq")?;
        let layout_id = fields.code("layout")?;
        let ad_unit_id = fields.code("adunit")?;
        let ext = fields.ext();

        let assets = decode_assets(payload, self.config.variant_policy)?;
        debug!(
            version = %normalized.version,
            is_wrapped = unwrapped.is_wrapped,
            assets = assets.len(),
            "native request decoded"
        );

        Ok(Request {
            version: normalized.version,
            context_type_id,
            context_sub_type_id,
            placement_type_id,
            placement_count,
            sequence,
            layout_id,
            ad_unit_id,
            assets,
            ext,
            is_wrapped: unwrapped.is_wrapped,
        })
    }
}

/// 用默认配置解码
pub fn decode(raw: &[u8]) -> Result<Request> {
    Decoder::default().decode(raw)
}

/// 按输入顺序解码素材；没有 `assets` 时返回空列表
fn decode_assets(payload: &Map<String, Value>, policy: VariantPolicy) -> Result<Vec<Asset>> {
    let Some(Value::Array(items)) = payload.get("assets") else {
        return Ok(Vec::new());
    };

    let mut seen = HashSet::with_capacity(items.len());
    let mut assets = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let asset = decode_asset(index, item, policy)?;
        if !seen.insert(asset.id) {
            return Err(DecodeError::invalid_scalar(
                format!("assets[{}].id", index),
                format!("duplicate asset id {}", asset.id),
            ));
        }
        assets.push(asset);
    }
    Ok(assets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::{ContextSubTypeId, ContextTypeId, PlacementTypeId};
    use serde_json::json;

    #[test]
    fn decodes_direct_current_request() {
        let request = decode(
            br#"{"ver":"1.1","context":3,"contextsubtype":13,"plcmttype":11,"plcmtcnt":1,"seq":2,
                 "assets":[{"id":123,"required":1,"title":{"len":140}}]}"#,
        )
        .unwrap();

        assert_eq!(request.version, "1.1");
        assert_eq!(request.context_type_id, Some(ContextTypeId(3)));
        assert_eq!(request.context_sub_type_id, Some(ContextSubTypeId(13)));
        assert_eq!(request.placement_type_id, Some(PlacementTypeId(11)));
        assert_eq!(request.placement_count.as_deref(), Some("1"));
        assert_eq!(request.sequence, Some(2));
        assert_eq!(request.assets.len(), 1);
        assert!(!request.is_wrapped);
    }

    #[test]
    fn missing_assets_decode_to_empty_list() {
        let request = decode(br#"{"ver":"1.2"}"#).unwrap();
        assert!(request.assets.is_empty());

        let request = decode(br#"{"ver":"1.1","assets":null}"#).unwrap();
        assert!(request.assets.is_empty());
    }

    #[test]
    fn first_failing_stage_wins() {
        let err = decode(b"{not json").unwrap_err();
        assert!(matches!(err, DecodeError::MalformedJson { context: "request body", .. }));

        let err = decode(b"").unwrap_err();
        assert!(matches!(err, DecodeError::MalformedJson { .. }));

        let err = decode(br#"{"ver":"1.1","plcmtcnt":"many","assets":[{"id":1}]}"#).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::InvalidScalar { ref field, .. } if field == "plcmtcnt"
        ));
    }

    #[test]
    fn duplicate_asset_ids_are_rejected() {
        let err = decode(br#"{"assets":[{"id":1,"title":{"len":10}},{"id":1,"data":{"type":2}}]}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            DecodeError::InvalidScalar { ref field, .. } if field == "assets[1].id"
        ));
    }

    #[test]
    fn policy_comes_from_config() {
        let asset = json!({"id": 1, "title": {"len": 5}, "img": {"w": 1}});
        let input = json!({"ver": "1.1", "assets": [asset]});

        assert!(Decoder::default().decode_value(input.clone()).is_err());

        let decoder = Decoder::new(DecoderConfig {
            variant_policy: VariantPolicy::Priority,
            ..DecoderConfig::default()
        });
        let request = decoder.decode_value(input).unwrap();
        assert_eq!(request.assets[0].kind.key(), "title");
    }

    #[test]
    fn legacy_fields_and_ext_are_preserved() {
        let request =
            decode(br#"{"ver":"1.0","layout":3,"adunit":2,"ext":{"k":"v"},"assets":[]}"#).unwrap();
        assert_eq!(request.version, "1.0");
        assert_eq!(request.layout_id.map(i64::from), Some(3));
        assert_eq!(request.ad_unit_id.map(i64::from), Some(2));
        assert_eq!(request.ext, Some(json!({"k": "v"})));
    }

    #[test]
    fn text_input_uses_the_same_pipeline() {
        let decoder = Decoder::new(DecoderConfig {
            max_wrap_depth: 0,
            ..DecoderConfig::default()
        });
        assert_eq!(decoder.config().max_wrap_depth, 0);

        let request = decoder.decode_str(r#"{"ver":"1.1","assets":[]}"#).unwrap();
        assert!(!request.is_wrapped);

        let err = decoder.decode_str(r#"{"request":"{\"assets\":[]}"}"#).unwrap_err();
        assert!(matches!(err, DecodeError::UnrecognizedShape(_)));
    }

    #[test]
    fn outer_version_reaches_inner_request() {
        let request = decode(br#"{"ver":"1.2","request":"{\"assets\":[]}"}"#).unwrap();
        assert_eq!(request.version, "1.2");
        assert!(request.is_wrapped);
    }

    #[test]
    fn huge_counts_survive_decoding() {
        let request = decode(br#"{"ver":"1.1","plcmtcnt":18446744073709551615}"#).unwrap();
        assert_eq!(request.placement_count.as_deref(), Some("18446744073709551615"));
    }

    #[test]
    fn pathological_nesting_is_an_error() {
        let depth = 10_000;
        let raw = format!(
            r#"{{"ver":"1.1","assets":[],"ext":{}{}}}"#,
            "[".repeat(depth),
            "]".repeat(depth)
        );
        let err = decode(raw.as_bytes()).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedJson { .. }));

        let nested = 100;
        let raw = format!(
            r#"{{"ver":"1.1","assets":[],"ext":{}{}}}"#,
            "[".repeat(nested),
            "]".repeat(nested)
        );
        assert!(decode(raw.as_bytes()).unwrap().ext.is_some());
    }
}
