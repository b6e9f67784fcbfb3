//! Source adapters.
//!
//! Each adapter turns one provider's records into a [`CanonicalSample`]
//! (crate::types::CanonicalSample). Adapters are total: a missing or
//! malformed field becomes a documented default, never an error. Their only
//! state is the latest normalized view of their source.
//!
//! - [`MemoryFeedAdapter`] reads physics, graphics and static records keyed
//!   by a [`FieldMap`] resolved once from the configured [`SchemaVersion`].
//! - [`BroadcastFeedAdapter`] reads structured [`BroadcastEvent`]s and
//!   decoded datagrams and tracks which car is the player's.

mod broadcast;
mod field_map;
mod memory;

pub use broadcast::{BroadcastEvent, BroadcastFeedAdapter, BroadcastInput, BroadcastOutcome};
pub use field_map::{FieldMap, GraphicsKeys, PhysicsKeys, SchemaVersion, StaticKeys};
pub use memory::{MemoryFeedAdapter, MemoryRecord};
