pub mod codes;
pub mod request;

pub use codes::{
    AdUnitId, ContextSubTypeId, ContextTypeId, DataTypeId, ImageTypeId, LayoutId, PlacementTypeId,
    Protocol,
};
pub use request::{Asset, AssetKind, Data, Image, Request, Title, Video};
