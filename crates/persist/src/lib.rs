//! Tagged binary persistence: statically declared field tables, container
//! codecs, and category-framed snapshots of top-level units.
//!
//! # Invariants
//! - Every record is `[tag][name hash][payload]`; every compound Start is
//!   closed by exactly one End carrying the same name hash.
//! - A compound's inner length lets any reader step over it unread.
//! - Fields match records by tag and name hash only, never by position, so
//!   added, removed and reordered fields stay readable in both directions.
//! - Name hashes are FNV-1a 32 over UTF-8 and never depend on the process.

pub mod codec;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod engine;
pub mod error;
pub mod field;
pub mod hash;
pub mod inspect;
pub mod scanner;
pub mod snapshot;
pub mod tag;
pub mod types;
pub mod wire;

pub use codec::Element;
pub use codec::array::Grid;
pub use codec::class::Polymorph;
pub use codec::enumeration::PersistEnum;
pub use config::CodecConfig;
pub use decoder::Decoder;
pub use encoder::Encoder;
pub use engine::{Engine, decode, encode};
pub use error::PersistError;
pub use field::{FieldDescriptor, FieldTable, FieldTableBuilder, Persist, Persistable};
pub use hash::{NAME_HASH_VERSION, index_hash, name_hash};
pub use inspect::{OutlineNode, outline};
pub use scanner::{Record, Scanner};
pub use snapshot::{Category, SnapshotOrchestrator, SnapshotReport, decode_snapshot, encode_snapshot};
pub use tag::{CodecKind, FieldMarker, Tag, ValueKind};
pub use types::TypeRegistry;
