//! Common types shared by the layer health-check crates.

pub mod bbox;
pub mod crs;
pub mod error;
pub mod layer;

pub use bbox::{BboxParseError, BoundingBox};
pub use crs::{CrsCode, CrsParseError};
pub use error::{WmsError, WmsResult};
pub use layer::{LayerId, LayerIdError};
