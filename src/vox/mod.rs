//! Speech from pre-recorded clips: keys, requests and the engine that
//! schedules them.

pub mod decode;
pub mod engine;
pub mod fetch;
pub mod key;
pub mod request;
pub mod settings;

pub use decode::{ClipDecoder, MockDecoder, SymphoniaDecoder};
pub use engine::{EngineStatus, StopCallback, VoxEngine};
pub use fetch::{AutoFetcher, ClipFetcher, FileFetcher, MockFetcher};
#[cfg(feature = "http")]
pub use fetch::HttpFetcher;
pub use key::{VoxKey, format_keys};
pub use request::{ClipLoader, RequestOutcome, VoxRequest};
pub use settings::{VoxSettings, remap_rate, volume_to_gain};
