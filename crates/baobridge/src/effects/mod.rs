//! Threads, sessions and the host-facing driver.
//!
//! Each session runs its verifier on a dedicated thread that blocks inside
//! [`PullReader`]; the host side only ever deposits values or awaits
//! notifications, so it is safe to call from an async runtime.

mod feed;
mod reader;
mod registry;
mod session;

pub use feed::{ChunkReader, feed, verify_stream};
pub use reader::PullReader;
pub use registry::Registry;
pub use session::Session;
