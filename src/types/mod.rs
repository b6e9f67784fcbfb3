//! Core types for fused telemetry.
//!
//! ## Architecture
//!
//! Data moves through three layers of types:
//! - Memory-feed records ([`PhysicsSample`], [`GraphicsSample`], [`StaticSessionInfo`])
//!   are the normalized form of what the memory feed pushes.
//! - [`CanonicalSample`] is one source's latest view, built from typed sections
//!   such as [`Motion`], [`Standing`] and [`LapTimes`].
//! - [`MergedSnapshot`] is the per-category resolution of both sources plus
//!   liveness metadata ([`LivenessReport`], [`ActiveProtocol`]).
//!
//! Every type here is plain data: `Clone`, `PartialEq` and serde-serializable,
//! with `specta::Type` under the `tauri` feature.

mod canonical;
mod samples;
mod sections;
mod snapshot;
mod source;
mod update_rate;

pub use canonical::{BroadcastSample, CanonicalSample, MemoryFeedSample};
pub use samples::{GraphicsSample, PhysicsSample, StaticSessionInfo};
pub use sections::{
    AidState, AidsData, BrakeData, BroadcastingEvent, CarIdentity, CarLocation, ControlsData,
    DriverIdentity, EnergyData, EngineData, ErsState, GForceData, KersState, LapRecord, LapTimes,
    Motion, PlayerInfo, RealtimeData, SessionData, Standing, SuspensionData, TrackData, TyreData,
};
pub use snapshot::MergedSnapshot;
pub use source::{
    ActiveProtocol, Confidence, LinkState, LivenessReport, SourceId, SourceLiveness,
};
pub use update_rate::UpdateRate;
