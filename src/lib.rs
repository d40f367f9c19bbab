//! # flow-pack
//!
//! Bit-exact packing of flow accounting records into 256-bit storage words.
//!
//! ## Overview
//!
//! Ledger storage is paid for per word, so the two records kept for every
//! distribution flow are packed densely:
//!
//! - [`FlowIndexData`]: the aggregate state of a distribution index;
//! - [`FlowSubscriptionData`]: one subscriber's relationship to an index.
//!
//! Each record has a fixed [`Layout`] mapping its fields to a word, a bit
//! offset and a width. Most fields are stored verbatim and round-trip
//! exactly. Deposits are too wide for that and are *clipped*: stored as a
//! mantissa and an exponent, rounded toward zero with a loss below
//! `amount / 2^52` (see [`ClipFormat`]).
//!
//! ## Quick Start
//!
//! ```rust
//! use flow_pack::{FlowSubscriptionData, PackedRecord};
//!
//! let subscription = FlowSubscriptionData {
//!     subscription_id: 15,
//!     flow_rate: 1_000_000_000_000_000_000,
//!     units: 10,
//!     index_id: 24,
//!     publisher: "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap(),
//!     timestamp: 1_618_876_800,
//! };
//!
//! // Two 256-bit words, ready for two storage slots.
//! let words = subscription.encode_bytes().unwrap();
//! assert_eq!(words.len(), 2);
//!
//! let decoded = FlowSubscriptionData::decode_bytes(&words).unwrap();
//! assert_eq!(decoded, subscription);
//! ```
//!
//! ## Layers
//!
//! | Module | Role |
//! |--------|------|
//! | [`bitfield`] | checked reads and writes of a field within a word |
//! | [`clip`] | mantissa/exponent compression of amounts |
//! | [`layout`] | declarative, compile-time checked record layouts |
//! | [`codec`] | packing field values into words and back |
//!
//! Everything is pure and stateless; layouts are `const` data and can be
//! shared across threads freely.
//!
//! ## Logging
//!
//! Encode and decode emit `tracing` events: `trace` on success and `debug`
//! on failure, carrying the layout name and offending field. Install a
//! subscriber to see them.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod address;
pub mod bitfield;
pub mod clip;
pub mod codec;
mod error;
pub mod layout;
mod records;
mod word;

#[cfg(feature = "serde")]
mod serde_interop;

pub use address::{Address, ADDRESS_BITS, ADDRESS_BYTES};
pub use clip::{ClipFormat, Clipped, DEPOSIT_CLIP, DEPOSIT_SHIFT_GRANULARITY};
pub use codec::{decode_fields, encode_fields, PackedRecord};
pub use error::PackError;
pub use layout::{FieldKind, FieldSpec, FieldValue, Layout};
pub use records::{
    FlowIndexData, FlowSubscriptionData, FLOW_INDEX_LAYOUT, FLOW_RATE_BITS,
    FLOW_SUBSCRIPTION_LAYOUT, ID_BITS, TIMESTAMP_BITS, UNITS_BITS,
};
pub use word::{U256, WORD_BITS, WORD_BYTES};

/// Convenience type alias for Results with PackError.
pub type Result<T> = std::result::Result<T, PackError>;
