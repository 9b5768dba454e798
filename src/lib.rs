//! StepQuest - Location-Anchored Fitness Challenge Core
//!
//! Tracks location-anchored fitness challenges: a stream of (location, step
//! count, distance, speed) observations drives, for every challenge the user
//! has joined, a progress value, a completion decision, and a lifecycle
//! transition (available -> active -> completed/expired).
//!
//! Data flows one direction: an [`Observation`] enters the
//! [`ProgressEngine`], which updates each active [`Challenge`]; the
//! [`ChallengeStore`] then re-partitions the available/active/completed
//! collections that consumers read for display.
//!
//! The crate performs no I/O of its own beyond optional catalog loading:
//! the observation source (location/motion sampling) and persistence of
//! challenge definitions are external collaborators.

pub mod challenges;
pub mod geo;

// Re-export commonly used types
pub use challenges::progress::{Observation, ProgressEngine, TieBreak};
pub use challenges::store::{ChallengeError, ChallengeEvent, ChallengeStore};
pub use challenges::types::{
    Challenge, ChallengeLocation, ChallengeState, ChallengeType, ProgressBaseline,
};
pub use geo::Coordinate;
