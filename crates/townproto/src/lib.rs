//! `townproto`: wire types shared by the town daemons.
//!
//! Everything here is plain serde JSON with camelCase field casing. The
//! core stays wire-agnostic; adapters convert through the snapshot types in
//! this crate at the boundary.

pub mod events;
pub mod rest;
pub mod snapshot;

pub use events::{ClientEvent, ServerEvent};
pub use rest::Envelope;
pub use snapshot::{AreaSnapshot, BoundingBoxDto, DirectionDto, LocationDto, PlayerSnapshot};
