// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! jido-core: document model, frontmatter codec, path policy, and the
//! ambient error/result/config/telemetry plumbing shared by every other
//! crate in the workspace.

pub mod clock;
pub mod config;
pub mod document;
pub mod error;
pub mod frontmatter;
pub mod id;
pub mod ids;
pub mod path_policy;
pub mod result;
pub mod retry;
pub mod telemetry;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::Config;
pub use document::{
    BodyPatch, Document, FrontmatterMode, LineEndings, NormalizeOptions, ParseOptions, Scalar,
    SerializeOptions, TrailingWhitespace,
};
pub use error::{ErrorCategory, ErrorCode, JidoError};
pub use frontmatter::{FrontmatterSyntax, ParsedFrontmatter};
pub use id::{IdGen, ShortId, UuidIdGen};
pub use ids::{CorrelationId, LockToken, SessionId};
pub use path_policy::resolve_path;
pub use result::{ActionMetadata, ActionResult, Idempotency, Status};
pub use retry::{retry_with_backoff, BackoffPolicy};
pub use telemetry::{ActionTelemetry, NoopTelemetrySink, TelemetrySink};
