//! In-process map rendering for layer previews.
//!
//! A rendering engine is built from a layer's configuration document merged
//! over a base configuration, then invoked in-process with an HTTP-shaped
//! request:
//! - `engine`: request/response contract and the `RenderEngine` seam
//! - `merge`: base configuration and document merging
//! - `proxy`: engine that forwards GetMap to the layer's upstream WMS

pub mod engine;
pub mod error;
pub mod merge;
pub mod proxy;

pub use engine::{BodyStream, EngineFactory, RenderEngine, RenderRequest, RenderResponse};
pub use error::RenderError;
pub use merge::{default_base_config, load_base_config, merge_config, DEFAULT_BASE_CONFIG};
pub use proxy::{ProxyEngine, ProxyEngineFactory, WmsSource, SERVICE_PATH};
