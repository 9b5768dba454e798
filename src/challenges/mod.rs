//! Location-anchored challenge tracking.
//!
//! A challenge ties a fitness goal to a geographic anchor and radius:
//! - steps walked while the challenge is active
//! - distance covered
//! - edge-triggered geofence visits
//! - peak walking speed
//!
//! Data flows one direction: an observation enters the [`ProgressEngine`],
//! which updates each active [`Challenge`]; the [`ChallengeStore`]
//! re-partitions the available/active/completed collections consumers read.

pub mod catalog;
pub mod progress;
pub mod store;
pub mod types;

// Re-exports for convenience
pub use catalog::{load_catalog, starter_challenges, CatalogError};
pub use progress::{Observation, ProgressEngine, TieBreak};
pub use store::{ChallengeError, ChallengeEvent, ChallengeStore};
pub use types::{
    Challenge, ChallengeLocation, ChallengeState, ChallengeType, ProgressBaseline,
};
