//! inlink: pack a binary payload into a shareable locator string.
//!
//! A payload (typically an image) is compressed until its encoded form
//! fits a hard symbol budget, then packed into a high-radix text encoding
//! over a configurable locator-safe alphabet. No server-side storage is
//! involved; the string is the artifact.
//!
//! The two core subsystems are the [`codec`] (base-N conversion with an
//! integrity header and two interchangeable digit backends) and the
//! [`search`] engine (quality/scale search under a length budget). See
//! the module docs for the wire layouts and the search phases.

pub mod alphabet;
pub mod backend;
pub mod codec;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod parallel;
pub mod render;
pub mod search;
pub mod sequential;

pub use alphabet::Alphabet;
pub use backend::{AcceleratedBackend, DigitBackend};
pub use codec::{BackendState, Decoded, RadixCodec};
pub use config::CodecConfig;
pub use error::{AlphabetError, BackendError, DecodeError, InlinkError, SearchError};
pub use orchestrator::{Orchestrator, PackReport};
pub use parallel::ParallelBackend;
pub use render::{OutputFormat, RenderError, RenderPrimitive};
pub use search::{SearchAttempt, SearchBounds, SearchConfig, SearchEngine, SearchOutcome, SearchResult};
pub use sequential::SequentialBackend;

/// Default locator-safe alphabet: unreserved URI characters plus two
/// sub-delimiters that survive common copy/paste paths unescaped.
pub const DEFAULT_ALPHABET: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~!*";
