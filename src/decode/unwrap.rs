use serde_json::{Map, Value};
use tracing::debug;

use crate::decode::coerce::type_name;
use crate::error::{DecodeError, Result};

/// 包装字段名：`native` 是 Native 1.0 的外层对象，
/// `request` 是 OpenRTB `imp.native.request` 的字符串形式
pub const WRAPPER_KEYS: [&str; 2] = ["native", "request"];

/// JSON 嵌套层数上限，与 serde_json 的递归上限一致
pub const MAX_NESTING: usize = 128;

/// 解包结果
#[derive(Debug, Clone, PartialEq)]
pub struct Unwrapped {
    pub payload: Map<String, Value>,
    pub is_wrapped: bool,
}

/// 扫描数组/对象的嵌套深度，字符串内的括号不计
fn check_nesting(bytes: &[u8], context: &'static str) -> Result<()> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for &byte in bytes {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'[' | b'{' => {
                depth += 1;
                if depth > MAX_NESTING {
                    return Err(DecodeError::MalformedJson {
                        context,
                        message: format!("nesting exceeds {} levels", MAX_NESTING),
                    });
                }
            }
            b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    Ok(())
}

/// 用 simd-json 解析原始字节，先限制嵌套深度
pub(crate) fn parse_document(bytes: &[u8], context: &'static str) -> Result<Value> {
    check_nesting(bytes, context)?;
    // simd-json 需要可变缓冲区
    let mut buffer = bytes.to_vec();
    simd_json::serde::from_slice::<Value>(&mut buffer).map_err(|e| {
        DecodeError::MalformedJson {
            context,
            message: e.to_string(),
        }
    })
}

/// 判断对象是否是包装层：含有包装字段（值为字符串或对象），且本身没有素材列表
fn wrapped_value(map: &mut Map<String, Value>) -> Option<Value> {
    if map.contains_key("assets") || map.contains_key("asset") {
        return None;
    }
    let key = WRAPPER_KEYS.iter().find(|key| {
        matches!(
            map.get(**key),
            Some(Value::String(_)) | Some(Value::Object(_))
        )
    })?;
    map.remove(*key)
}

/// 找到真正的 Native 请求对象。
///
/// 直接对象原样返回；字符串或包装对象逐层剥开，
/// 最多剥 `max_depth` 层，任何一层被剥开都记为 `is_wrapped`。
/// 包装层上的 `ver`（如 `imp.native.ver`）在内层没有声明版本时继承下来，
/// 多层时以最内层的为准。
pub fn unwrap(document: Value, max_depth: usize) -> Result<Unwrapped> {
    let mut current = document;
    let mut depth = 0usize;
    let mut inherited_version: Option<Value> = None;

    loop {
        let inner = match current {
            Value::Object(mut map) => match wrapped_value(&mut map) {
                Some(inner) => {
                    if let Some(version) = map.remove("ver").filter(|v| !v.is_null()) {
                        inherited_version = Some(version);
                    }
                    match inner {
                        Value::String(encoded) => {
                            parse_document(encoded.as_bytes(), "wrapped request string")?
                        }
                        inner => inner,
                    }
                }
                None => {
                    let declared = map.get("ver").is_some_and(|v| !v.is_null());
                    if let (false, Some(version)) = (declared, inherited_version) {
                        map.insert("ver".to_string(), version);
                    }
                    debug!(depth, is_wrapped = depth > 0, "native payload unwrapped");
                    return Ok(Unwrapped {
                        payload: map,
                        is_wrapped: depth > 0,
                    });
                }
            },
            Value::String(encoded) => {
                parse_document(encoded.as_bytes(), "wrapped request string")?
            }
            other => {
                return Err(DecodeError::UnrecognizedShape(format!(
                    "expected a JSON object or a JSON-encoded string, found {}",
                    type_name(&other)
                )))
            }
        };

        depth += 1;
        if depth > max_depth {
            return Err(DecodeError::UnrecognizedShape(format!(
                "request is wrapped more than {} levels deep",
                max_depth
            )));
        }
        current = inner;
    }
}
