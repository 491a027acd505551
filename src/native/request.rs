use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::decode::Decoder;
use crate::native::codes::{
    AdUnitId, ContextSubTypeId, ContextTypeId, DataTypeId, ImageTypeId, LayoutId, PlacementTypeId,
    Protocol,
};

/// 解码后的 Native 请求（统一为 1.1 结构）。
///
/// 无论输入是直接对象还是被包装的字符串、是 1.1 还是更早的字段布局，
/// 解码结果都是同一个形状。序列化时使用 Native 1.1 的字段名，
/// `is_wrapped` 只记录来源，不参与序列化。
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Request {
    #[serde(rename = "ver")]
    pub version: String,

    #[serde(rename = "context", skip_serializing_if = "Option::is_none")]
    pub context_type_id: Option<ContextTypeId>,

    #[serde(rename = "contextsubtype", skip_serializing_if = "Option::is_none")]
    pub context_sub_type_id: Option<ContextSubTypeId>,

    #[serde(rename = "plcmttype", skip_serializing_if = "Option::is_none")]
    pub placement_type_id: Option<PlacementTypeId>,

    /// 源 JSON 里可能是数字也可能是字符串，这里统一为字符串
    #[serde(rename = "plcmtcnt", skip_serializing_if = "Option::is_none")]
    pub placement_count: Option<String>,

    #[serde(rename = "seq", skip_serializing_if = "Option::is_none")]
    pub sequence: Option<i64>,

    /// Native 1.0 字段，1.1 已废弃但仍有上游在发
    #[serde(rename = "layout", skip_serializing_if = "Option::is_none")]
    pub layout_id: Option<LayoutId>,

    #[serde(rename = "adunit", skip_serializing_if = "Option::is_none")]
    pub ad_unit_id: Option<AdUnitId>,

    pub assets: Vec<Asset>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,

    #[serde(skip)]
    pub is_wrapped: bool,
}

impl<'de> Deserialize<'de> for Request {
    /// 走完整的解码流水线，便于嵌入到其它 serde 结构里（例如 `imp.native`）
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let document = Value::deserialize(deserializer)?;
        Decoder::default()
            .decode_value(document)
            .map_err(D::Error::custom)
    }
}

/// 单个素材位
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Asset {
    pub id: i64,
    pub required: i32,
    #[serde(flatten)]
    pub kind: AssetKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,
}

/// 素材变体，有且仅有一个
#[derive(Serialize, Debug, Clone, PartialEq)]
pub enum AssetKind {
    #[serde(rename = "title")]
    Title(Title),
    #[serde(rename = "img")]
    Image(Image),
    #[serde(rename = "data")]
    Data(Data),
    #[serde(rename = "video")]
    Video(Video),
}

impl AssetKind {
    /// 协议中该变体对应的键名
    pub fn key(&self) -> &'static str {
        match self {
            AssetKind::Title(_) => "title",
            AssetKind::Image(_) => "img",
            AssetKind::Data(_) => "data",
            AssetKind::Video(_) => "video",
        }
    }
}

impl Asset {
    pub fn title(&self) -> Option<&Title> {
        match &self.kind {
            AssetKind::Title(title) => Some(title),
            _ => None,
        }
    }

    pub fn image(&self) -> Option<&Image> {
        match &self.kind {
            AssetKind::Image(image) => Some(image),
            _ => None,
        }
    }

    pub fn data(&self) -> Option<&Data> {
        match &self.kind {
            AssetKind::Data(data) => Some(data),
            _ => None,
        }
    }

    pub fn video(&self) -> Option<&Video> {
        match &self.kind {
            AssetKind::Video(video) => Some(video),
            _ => None,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Title {
    #[serde(rename = "len")]
    pub length: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct Image {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_id: Option<ImageTypeId>,
    #[serde(rename = "wmin", skip_serializing_if = "Option::is_none")]
    pub width_min: Option<i64>,
    #[serde(rename = "hmin", skip_serializing_if = "Option::is_none")]
    pub height_min: Option<i64>,
    #[serde(rename = "w", skip_serializing_if = "Option::is_none")]
    pub width: Option<i64>,
    #[serde(rename = "h", skip_serializing_if = "Option::is_none")]
    pub height: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mimes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Data {
    #[serde(rename = "type")]
    pub type_id: DataTypeId,
    #[serde(rename = "len", skip_serializing_if = "Option::is_none")]
    pub length: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Video {
    #[serde(rename = "minduration")]
    pub min_duration: i64,
    #[serde(rename = "maxduration")]
    pub max_duration: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub protocols: Vec<Protocol>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mimes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,
}
