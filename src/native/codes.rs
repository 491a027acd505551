use serde::{Deserialize, Serialize};

/// 声明一个透明的整数代码类型。
/// 未知取值原样保留，不在解码阶段拒绝。
macro_rules! native_code {
    ($(#[$meta:meta])* $name:ident { $($(#[$cmeta:meta])* $konst:ident = $value:expr,)* }) => {
        $(#[$meta])*
        #[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            $($(#[$cmeta])* pub const $konst: $name = $name($value);)*
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                $name(value)
            }
        }

        impl From<$name> for i64 {
            fn from(code: $name) -> Self {
                code.0
            }
        }
    };
}

native_code!(
    /// 广告所处内容的上下文类型（`context`）
    ContextTypeId {
        CONTENT = 1,
        SOCIAL = 2,
        PRODUCT = 3,
    }
);

native_code!(
    /// 更细粒度的上下文类型（`contextsubtype`）
    ContextSubTypeId {
        GENERAL = 10,
        ARTICLE = 11,
        VIDEO = 12,
        AUDIO = 13,
        IMAGE = 14,
        USER_GENERATED = 15,
        SOCIAL = 20,
        EMAIL = 21,
        CHAT = 22,
        SELLING = 30,
        APP_STORE = 31,
        PRODUCT_REVIEW = 32,
    }
);

native_code!(
    /// 广告位的展现形式（`plcmttype`）
    PlacementTypeId {
        IN_FEED = 1,
        ATOMIC = 2,
        OUTSIDE = 3,
        RECOMMENDATION = 4,
    }
);

native_code!(
    /// Native 1.0 的布局（`layout`），1.1 起废弃
    LayoutId {
        CONTENT_WALL = 1,
        APP_WALL = 2,
        NEWS_FEED = 3,
        CHAT_LIST = 4,
        CAROUSEL = 5,
        CONTENT_STREAM = 6,
        GRID = 7,
    }
);

native_code!(
    /// Native 1.0 的广告单元（`adunit`），1.1 起废弃
    AdUnitId {
        PAID_SEARCH = 1,
        RECOMMENDATION_WIDGET = 2,
        PROMOTED_LISTING = 3,
        IAB_IN_AD_NATIVE = 4,
        CUSTOM = 5,
    }
);

native_code!(
    /// 图片素材的角色（`img.type`）
    ImageTypeId {
        ICON = 1,
        LOGO = 2,
        MAIN = 3,
    }
);

native_code!(
    /// 数据素材的语义（`data.type`）
    DataTypeId {
        SPONSORED = 1,
        DESC = 2,
        RATING = 3,
        LIKES = 4,
        DOWNLOADS = 5,
        PRICE = 6,
        SALE_PRICE = 7,
        PHONE = 8,
        ADDRESS = 9,
        DESC2 = 10,
        DISPLAY_URL = 11,
        CTA_TEXT = 12,
    }
);

native_code!(
    /// OpenRTB 视频协议代码，整个协议族共用
    Protocol {
        VAST1 = 1,
        VAST2 = 2,
        VAST3 = 3,
        VAST1_WRAPPER = 4,
        VAST2_WRAPPER = 5,
        VAST3_WRAPPER = 6,
        VAST4 = 7,
        VAST4_WRAPPER = 8,
        DAAST1 = 9,
        DAAST1_WRAPPER = 10,
    }
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_serialize_as_plain_integers() {
        let json = serde_json::to_string(&vec![Protocol::VAST2, Protocol::VAST3]).unwrap();
        assert_eq!(json, "[2,3]");

        let unknown: ImageTypeId = serde_json::from_str("501").unwrap();
        assert_eq!(unknown, ImageTypeId(501));
        assert_eq!(i64::from(DataTypeId::CTA_TEXT), 12);
    }
}
