use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::decode::coerce::{type_name, Fields};
use crate::error::{DecodeError, Result};
use crate::native::{Asset, AssetKind, Data, Image, Protocol, Title, Video};

/// 一个 asset 同时出现多个变体键时的处理策略
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum VariantPolicy {
    /// 直接拒绝
    #[default]
    Reject,
    /// 按 `VARIANT_KEYS` 的顺序取第一个
    Priority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VariantTag {
    Title,
    Image,
    Video,
    Data,
}

/// 变体键，按优先级排列。`image` 是 `img` 的别名
const VARIANT_KEYS: [(&str, VariantTag); 5] = [
    ("title", VariantTag::Title),
    ("img", VariantTag::Image),
    ("image", VariantTag::Image),
    ("video", VariantTag::Video),
    ("data", VariantTag::Data),
];

fn decode_title(fields: &Fields) -> Result<Title> {
    Ok(Title {
        length: fields.required_integer("len")?,
        ext: fields.ext(),
    })
}

fn decode_image(fields: &Fields) -> Result<Image> {
    Ok(Image {
        type_id: fields.code("type")?,
        width_min: fields.integer("wmin")?,
        height_min: fields.integer("hmin")?,
        width: fields.integer("w")?,
        height: fields.integer("h")?,
        mimes: fields.strings("mimes")?,
        ext: fields.ext(),
    })
}

fn decode_data(fields: &Fields) -> Result<Data> {
    Ok(Data {
        type_id: fields.required_code("type")?,
        length: fields.integer("len")?,
        ext: fields.ext(),
    })
}

fn decode_video(fields: &Fields) -> Result<Video> {
    Ok(Video {
        min_duration: fields.required_integer("minduration")?,
        max_duration: fields.required_integer("maxduration")?,
        protocols: fields
            .integers("protocols")?
            .into_iter()
            .map(Protocol::from)
            .collect(),
        mimes: fields.strings("mimes")?,
        ext: fields.ext(),
    })
}

/// 找出唯一的变体；多个时按策略处理
fn select_variant<'a>(
    index: usize,
    fields: &Fields<'a>,
    policy: VariantPolicy,
) -> Result<(&'static str, VariantTag, &'a Map<String, Value>)> {
    let mut present = Vec::with_capacity(1);
    for (key, tag) in VARIANT_KEYS {
        match fields.get(key) {
            None => {}
            Some(Value::Object(body)) => present.push((key, tag, body)),
            Some(other) => {
                return Err(DecodeError::invalid_variant(
                    index,
                    format!("`{}` must be an object, found {}", key, type_name(other)),
                ))
            }
        }
    }

    match (present.as_slice(), policy) {
        ([], _) => Err(DecodeError::invalid_variant(
            index,
            "none of title, img, data, video is present",
        )),
        ([only], _) => Ok(*only),
        ([first, ..], VariantPolicy::Priority) => {
            let keys: Vec<&str> = present.iter().map(|(key, _, _)| *key).collect();
            warn!(
                index,
                chosen = first.0,
                present = ?keys,
                "asset carries several variants, keeping the first by priority"
            );
            Ok(*first)
        }
        (_, VariantPolicy::Reject) => {
            let keys: Vec<&str> = present.iter().map(|(key, _, _)| *key).collect();
            Err(DecodeError::invalid_variant(
                index,
                format!("expected exactly one variant, found {}", keys.join(", ")),
            ))
        }
    }
}

/// 解码 `assets` 中的一个元素。
///
/// `id` 和 `required` 总是解码；随后根据出现的变体键
/// 解出唯一的变体，其余变体不存在（而不是零值）。
pub fn decode_asset(index: usize, value: &Value, policy: VariantPolicy) -> Result<Asset> {
    let Value::Object(map) = value else {
        return Err(DecodeError::invalid_variant(
            index,
            format!("expected an object, found {}", type_name(value)),
        ));
    };

    let prefix = format!("assets[{}]", index);
    let fields = Fields::new(map, prefix.clone());
    let id = fields.required_integer("id")?;
    let required = fields.flag("required")?;

    let (key, tag, body) = select_variant(index, &fields, policy)?;
    let variant = Fields::new(body, format!("{}.{}", prefix, key));
    let kind = match tag {
        VariantTag::Title => AssetKind::Title(decode_title(&variant)?),
        VariantTag::Image => AssetKind::Image(decode_image(&variant)?),
        VariantTag::Data => AssetKind::Data(decode_data(&variant)?),
        VariantTag::Video => AssetKind::Video(decode_video(&variant)?),
    };

    Ok(Asset {
        id,
        required,
        kind,
        ext: fields.ext(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::{DataTypeId, ImageTypeId};
    use serde_json::json;

    fn strict(index: usize, value: Value) -> Result<Asset> {
        decode_asset(index, &value, VariantPolicy::Reject)
    }

    fn field_of(err: &DecodeError) -> Option<&str> {
        match err {
            DecodeError::InvalidScalar { field, .. } => Some(field.as_str()),
            _ => None,
        }
    }

    #[test]
    fn decodes_each_variant() {
        let title = strict(0, json!({"id": 123, "required": 1, "title": {"len": 140}})).unwrap();
        assert_eq!(title.id, 123);
        assert_eq!(title.required, 1);
        assert_eq!(title.kind, AssetKind::Title(Title { length: 140, ext: None }));

        let img = json!({
            "type": 3, "wmin": 836, "hmin": 627, "w": 1000, "h": 800, "mimes": ["image/jpg"]
        });
        let image = strict(1, json!({"id": 128, "img": img})).unwrap();
        assert_eq!(image.required, 0);
        assert_eq!(
            image.image(),
            Some(&Image {
                type_id: Some(ImageTypeId::MAIN),
                width_min: Some(836),
                height_min: Some(627),
                width: Some(1000),
                height: Some(800),
                mimes: vec!["image/jpg".to_string()],
                ext: None,
            })
        );

        let data = strict(2, json!({"id": 126, "required": 1, "data": {"type": 1, "len": 25}}))
            .unwrap();
        assert_eq!(
            data.data().map(|d| (d.type_id, d.length)),
            Some((DataTypeId::SPONSORED, Some(25)))
        );

        let video = json!({
            "minduration": 15, "maxduration": 30, "protocols": [2, 3], "mimes": ["video/mp4"]
        });
        let video = strict(3, json!({"id": 4, "video": video})).unwrap();
        let video = video.video().unwrap();
        assert_eq!((video.min_duration, video.max_duration), (15, 30));
        assert_eq!(video.protocols, vec![Protocol::VAST2, Protocol::VAST3]);
    }

    #[test]
    fn lists_keep_order_and_duplicates() {
        let mimes = json!(["image/png", "image/jpg", "image/png"]);
        let asset = strict(0, json!({"id": 1, "img": {"mimes": mimes}})).unwrap();
        assert_eq!(asset.image().unwrap().mimes, vec!["image/png", "image/jpg", "image/png"]);
    }

    #[test]
    fn image_alias_is_accepted() {
        let asset = strict(0, json!({"id": 1, "image": {"w": 50}})).unwrap();
        assert_eq!(asset.image().and_then(|i| i.width), Some(50));
    }

    #[test]
    fn zero_variants_is_rejected() {
        let value = json!({"id": 1, "required": 1, "title": null});
        let err = decode_asset(5, &value, VariantPolicy::Priority).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidAssetVariant { index: 5, .. }));
    }

    #[test]
    fn multiple_variants_follow_policy() {
        let value = json!({"id": 9, "data": {"type": 2}, "img": {"w": 10}, "title": {"len": 20}});

        let err = decode_asset(0, &value, VariantPolicy::Reject).unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidAssetVariant {
                index: 0,
                reason: "expected exactly one variant, found title, img, data".to_string(),
            }
        );

        let asset = decode_asset(0, &value, VariantPolicy::Priority).unwrap();
        assert_eq!(asset.kind.key(), "title");

        let value = json!({
            "id": 9,
            "data": {"type": 2},
            "video": {"minduration": 1, "maxduration": 2}
        });
        let asset = decode_asset(0, &value, VariantPolicy::Priority).unwrap();
        assert_eq!(asset.kind.key(), "video");
    }

    #[test]
    fn nested_errors_carry_field_path() {
        let err = strict(2, json!({"id": 1, "img": {"w": "wide"}})).unwrap_err();
        assert_eq!(field_of(&err), Some("assets[2].img.w"));

        let err = strict(0, json!({"id": 1, "title": {}})).unwrap_err();
        assert_eq!(field_of(&err), Some("assets[0].title.len"));

        let err = strict(0, json!({"title": {"len": 1}})).unwrap_err();
        assert_eq!(field_of(&err), Some("assets[0].id"));
    }

    #[test]
    fn non_object_entries_are_rejected() {
        let err = strict(1, json!("title")).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidAssetVariant { index: 1, .. }));

        let err = strict(1, json!({"id": 1, "title": 140})).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidAssetVariant { index: 1, .. }));
    }
}
