//! 标量类型归一。
//!
//! 不同上游对同一个字段会发出不同的 JSON 类型（最典型的是 `plcmtcnt`，
//! 有人发数字，有人发字符串）。这里在解码边界把它们统一成一种类型，
//! 下游永远看不到这种歧义。

use serde_json::{Map, Number, Value};

use crate::error::{DecodeError, Result};

/// JSON 值的类型名，用于错误信息
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn number_to_integer(field: &str, number: &Number) -> Result<i64> {
    if let Some(value) = number.as_i64() {
        return Ok(value);
    }
    if number.is_u64() {
        return Err(DecodeError::invalid_scalar(
            field,
            format!("integer {} is out of range", number),
        ));
    }
    match number.as_f64() {
        Some(value)
            if value.fract() == 0.0 && (i64::MIN as f64..i64::MAX as f64).contains(&value) =>
        {
            Ok(value as i64)
        }
        _ => Err(DecodeError::invalid_scalar(
            field,
            format!("expected an integer, found {}", number),
        )),
    }
}

fn is_count(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

/// 数字或数字字符串 -> i64
pub fn integer(field: &str, value: &Value) -> Result<i64> {
    match value {
        Value::Number(number) => number_to_integer(field, number),
        Value::String(text) => text.trim().parse::<i64>().map_err(|_| {
            DecodeError::invalid_scalar(
                field,
                format!("expected an integer, found string {:?}", text),
            )
        }),
        other => Err(DecodeError::invalid_scalar(
            field,
            format!("expected an integer, found {}", type_name(other)),
        )),
    }
}

/// 计数字段 -> 规范字符串。
/// 字符串原样保留（必须全是数字），数字渲染为不带小数点的十进制。
pub fn count_string(field: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(text) if is_count(text) => Ok(text.clone()),
        Value::String(text) => Err(DecodeError::invalid_scalar(
            field,
            format!("expected a numeric count, found string {:?}", text),
        )),
        // 计数没有上界，u64 全范围都按十进制渲染
        Value::Number(number) if number.is_u64() => Ok(number.to_string()),
        Value::Number(number) => {
            let count = number_to_integer(field, number)?;
            if count < 0 {
                return Err(DecodeError::invalid_scalar(
                    field,
                    format!("count must not be negative, found {}", count),
                ));
            }
            Ok(count.to_string())
        }
        other => Err(DecodeError::invalid_scalar(
            field,
            format!("expected a count as number or string, found {}", type_name(other)),
        )),
    }
}

/// 版本号：字符串原样，数字（例如 `1.1`）渲染为字符串
pub fn version_string(field: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(text) => Ok(text.clone()),
        Value::Number(number) => Ok(number.to_string()),
        other => Err(DecodeError::invalid_scalar(
            field,
            format!("expected a version string, found {}", type_name(other)),
        )),
    }
}

/// 带字段路径的对象读取器。
///
/// 所有读取都会把完整路径（如 `assets[2].img.w`）带进错误里。
/// JSON `null` 一律视为缺省。
pub struct Fields<'a> {
    map: &'a Map<String, Value>,
    prefix: String,
}

impl<'a> Fields<'a> {
    pub fn new(map: &'a Map<String, Value>, prefix: impl Into<String>) -> Self {
        Self {
            map,
            prefix: prefix.into(),
        }
    }

    pub fn path(&self, key: &str) -> String {
        if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", self.prefix, key)
        }
    }

    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|value| !value.is_null())
    }

    pub fn integer(&self, key: &str) -> Result<Option<i64>> {
        self.get(key)
            .map(|value| integer(&self.path(key), value))
            .transpose()
    }

    pub fn required_integer(&self, key: &str) -> Result<i64> {
        self.integer(key)?
            .ok_or_else(|| DecodeError::invalid_scalar(self.path(key), "missing required value"))
    }

    pub fn count(&self, key: &str) -> Result<Option<String>> {
        self.get(key)
            .map(|value| count_string(&self.path(key), value))
            .transpose()
    }

    /// 枚举代码，0 表示未设置
    pub fn code<T: From<i64>>(&self, key: &str) -> Result<Option<T>> {
        Ok(self.integer(key)?.filter(|value| *value != 0).map(T::from))
    }

    pub fn required_code<T: From<i64>>(&self, key: &str) -> Result<T> {
        self.required_integer(key).map(T::from)
    }

    /// 0/1 标志位，也接受 JSON 布尔值
    pub fn flag(&self, key: &str) -> Result<i32> {
        let value = match self.get(key) {
            None => return Ok(0),
            Some(Value::Bool(flag)) => return Ok(i32::from(*flag)),
            Some(value) => integer(&self.path(key), value)?,
        };
        match value {
            0 => Ok(0),
            1 => Ok(1),
            other => Err(DecodeError::invalid_scalar(
                self.path(key),
                format!("expected 0 or 1, found {}", other),
            )),
        }
    }

    /// 字符串列表，保持顺序，不去重
    pub fn strings(&self, key: &str) -> Result<Vec<String>> {
        let path = self.path(key);
        match self.get(key) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, item)| match item {
                    Value::String(text) => Ok(text.clone()),
                    other => Err(DecodeError::invalid_scalar(
                        format!("{}[{}]", path, i),
                        format!("expected a string, found {}", type_name(other)),
                    )),
                })
                .collect(),
            Some(other) => Err(DecodeError::invalid_scalar(
                path,
                format!("expected an array, found {}", type_name(other)),
            )),
        }
    }

    /// 整数列表，保持顺序，不去重
    pub fn integers(&self, key: &str) -> Result<Vec<i64>> {
        let path = self.path(key);
        match self.get(key) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, item)| integer(&format!("{}[{}]", path, i), item))
                .collect(),
            Some(other) => Err(DecodeError::invalid_scalar(
                path,
                format!("expected an array, found {}", type_name(other)),
            )),
        }
    }

    pub fn ext(&self) -> Option<Value> {
        self.get("ext").cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn count_accepts_number_and_numeric_string() {
        assert_eq!(count_string("plcmtcnt", &json!(12)).unwrap(), "12");
        assert_eq!(count_string("plcmtcnt", &json!("12")).unwrap(), "12");
        assert_eq!(count_string("plcmtcnt", &json!(12.0)).unwrap(), "12");
        assert_eq!(count_string("plcmtcnt", &json!("007")).unwrap(), "007");
    }

    #[test]
    fn count_keeps_full_unsigned_range() {
        let max = u64::MAX.to_string();
        assert_eq!(count_string("plcmtcnt", &json!(u64::MAX)).unwrap(), max);
        assert_eq!(count_string("plcmtcnt", &json!(max.clone())).unwrap(), max);

        let above_i64 = i64::MAX as u64 + 1;
        assert_eq!(
            count_string("plcmtcnt", &json!(above_i64)).unwrap(),
            above_i64.to_string()
        );
    }

    #[test]
    fn count_rejects_text_fractions_and_other_types() {
        let rejected = [
            json!("twelve"),
            json!(""),
            json!("-1"),
            json!(1.5),
            json!(-3),
            json!(-3.0),
            json!(true),
            json!([1]),
        ];
        for value in rejected {
            let err = count_string("plcmtcnt", &value).unwrap_err();
            assert!(
                matches!(err, DecodeError::InvalidScalar { ref field, .. } if field == "plcmtcnt"),
                "{:?} should be rejected, got {:?}",
                value,
                err
            );
        }
    }

    #[test]
    fn integer_tolerates_numeric_strings() {
        assert_eq!(integer("len", &json!(140)).unwrap(), 140);
        assert_eq!(integer("len", &json!(" 140 ")).unwrap(), 140);
        assert_eq!(integer("len", &json!(140.0)).unwrap(), 140);
        assert!(integer("len", &json!("abc")).is_err());
        assert!(integer("len", &json!(u64::MAX)).is_err());
        assert!(integer("len", &json!(null)).is_err());
    }

    #[test]
    fn version_renders_numbers() {
        assert_eq!(version_string("ver", &json!("1.2")).unwrap(), "1.2");
        assert_eq!(version_string("ver", &json!(1.1)).unwrap(), "1.1");
        assert!(version_string("ver", &json!({})).is_err());
    }

    #[test]
    fn fields_report_full_path() {
        let map = json!({"w": "wide", "mimes": ["image/png", 3], "required": 2})
            .as_object()
            .cloned()
            .unwrap();
        let fields = Fields::new(&map, "assets[1].img");

        let err = fields.integer("w").unwrap_err();
        assert!(matches!(
            err,
            DecodeError::InvalidScalar { ref field, .. } if field == "assets[1].img.w"
        ));

        let err = fields.strings("mimes").unwrap_err();
        assert!(matches!(
            err,
            DecodeError::InvalidScalar { ref field, .. } if field == "assets[1].img.mimes[1]"
        ));

        assert!(fields.flag("required").is_err());
        assert_eq!(fields.flag("missing").unwrap(), 0);
    }

    #[test]
    fn fields_treat_null_and_zero_codes_as_unset() {
        let map = json!({"context": 0, "plcmttype": null, "seq": 4, "required": true})
            .as_object()
            .cloned()
            .unwrap();
        let fields = Fields::new(&map, "");

        assert_eq!(fields.code::<i64>("context").unwrap(), None);
        assert_eq!(fields.code::<i64>("plcmttype").unwrap(), None);
        assert_eq!(fields.integer("seq").unwrap(), Some(4));
        assert_eq!(fields.flag("required").unwrap(), 1);
        assert!(fields.required_integer("id").is_err());
    }
}
