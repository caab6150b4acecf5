//! On-demand preview generation: freshness negotiation, cache lookup,
//! rendering and detached cache population.

mod dispatcher;
mod freshness;
mod key;
mod renderer;
mod response;
mod writer;

pub use dispatcher::{PreviewHandler, PreviewRequest};
pub use freshness::{etag_for, http_date, Freshness, Validators};
pub use key::preview_cache_key;
pub use renderer::{PreviewRenderer, RenderPolicy, RenderTarget, BIG_DIMENSION, THUMB_DIMENSION};
pub use response::{content_disposition, PreviewBody, PreviewResponse};
pub use writer::{CacheWriter, WriterConfig};
