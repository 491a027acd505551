use serde_json::{Map, Value};
use tracing::debug;

use crate::decode::coerce::{type_name, version_string};
use crate::error::{DecodeError, Result};

/// 统一后的版本号，旧版请求缺省 `ver` 时使用
pub const CANONICAL_VERSION: &str = "1.1";

/// 旧版字段名 -> 1.1 字段名，只改名，不改值
pub const LEGACY_ALIASES: [(&str, &str); 6] = [
    ("contexttype", "context"),
    ("contextsubtypeid", "contextsubtype"),
    ("placementtype", "plcmttype"),
    ("plcmtcount", "plcmtcnt"),
    ("sequence", "seq"),
    ("asset", "assets"),
];

/// 请求的字段布局
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// 1.1 及以后
    Current,
    /// 1.1 之前（没有 `ver`，或版本低于 1.1）
    Legacy,
}

/// 版本归一后的请求体
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub payload: Map<String, Value>,
    pub version: String,
    pub layout: Layout,
}

/// 取版本号的 (major, minor)，`1.1.0`、`1.2-beta` 这种也能识别
fn parse_version(text: &str) -> Option<(u64, u64)> {
    let mut parts = text.trim().split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = match parts.next() {
        Some(part) => {
            let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse().ok()?
        }
        None => 0,
    };
    Some((major, minor))
}

/// 根据 `ver` 判断字段布局，同时给出最终的版本号
pub fn detect_layout(payload: &Map<String, Value>) -> Result<(Layout, String)> {
    let declared = match payload.get("ver").filter(|value| !value.is_null()) {
        Some(value) => Some(version_string("ver", value)?).filter(|v| !v.trim().is_empty()),
        None => None,
    };

    let Some(version) = declared else {
        return Ok((Layout::Legacy, CANONICAL_VERSION.to_string()));
    };

    let parsed = parse_version(&version).ok_or_else(|| {
        DecodeError::invalid_scalar("ver", format!("unrecognized version {:?}", version))
    })?;
    let layout = if parsed >= (1, 1) {
        Layout::Current
    } else {
        Layout::Legacy
    };
    Ok((layout, version))
}

fn rewrite_legacy(payload: &mut Map<String, Value>) -> Result<()> {
    for (legacy, current) in LEGACY_ALIASES {
        // null 等同于缺省，不参与改名也不算冲突
        let Some(value) = payload.remove(legacy).filter(|value| !value.is_null()) else {
            continue;
        };
        if payload.get(current).is_some_and(|existing| !existing.is_null()) {
            return Err(DecodeError::UnrecognizedShape(format!(
                "`{}` and its legacy alias `{}` are both present",
                current, legacy
            )));
        }
        payload.insert(current.to_string(), value);
    }

    // 旧版素材列表可能包了一层：{"assets": {"asset": [...]}}
    if matches!(payload.get("assets"), Some(Value::Object(_))) {
        if let Some(Value::Object(mut wrapper)) = payload.remove("assets") {
            let list = match (wrapper.remove("asset"), wrapper.is_empty()) {
                (Some(list @ Value::Array(_)), true) => list,
                _ => {
                    return Err(DecodeError::UnrecognizedShape(
                        "legacy `assets` object must hold a single `asset` array".to_string(),
                    ))
                }
            };
            payload.insert("assets".to_string(), list);
        }
    }
    Ok(())
}

fn check_assets_shape(payload: &Map<String, Value>) -> Result<()> {
    match payload.get("assets") {
        None | Some(Value::Null) | Some(Value::Array(_)) => Ok(()),
        Some(other) => Err(DecodeError::UnrecognizedShape(format!(
            "`assets` must be an array, found {}",
            type_name(other)
        ))),
    }
}

/// 把请求体统一成 1.1 的字段布局。
/// 1.1 请求原样通过；旧版请求按 `LEGACY_ALIASES` 改名并展开素材列表。
pub fn normalize(mut payload: Map<String, Value>) -> Result<Normalized> {
    let (layout, version) = detect_layout(&payload)?;
    if layout == Layout::Legacy {
        rewrite_legacy(&mut payload)?;
    }
    check_assets_shape(&payload)?;

    debug!(?layout, version = %version, "native payload normalized");
    Ok(Normalized {
        payload,
        version,
        layout,
    })
}
