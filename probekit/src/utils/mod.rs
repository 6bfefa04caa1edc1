pub mod host;
pub(crate) mod serde_duration;

pub use host::{HostKind, normalize_host, validate_label};
