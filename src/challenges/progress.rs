//! Challenge progress engine.
//!
//! Consumes one observation at a time and advances progress and lifecycle
//! state for active challenges. The engine owns the transient per-challenge
//! geofence flag used for edge-triggered visit counting, keyed by challenge
//! id, so it is never persisted with the challenge itself.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::types::{Challenge, ChallengeState};
use crate::geo::Coordinate;

/// One timestamped snapshot of user location and motion data.
#[derive(Debug, Clone, Copy)]
pub struct Observation {
    /// Current user location
    pub location: Coordinate,
    /// Daily step total from the step source
    pub total_steps: u32,
    /// Daily distance total, in meters
    pub total_distance_meters: f64,
    /// Current speed in km/h
    pub speed_kmh: f64,
    /// When the observation was taken
    pub now: DateTime<Utc>,
}

impl Observation {
    /// Create an observation stamped with the given time.
    pub fn new(
        location: Coordinate,
        total_steps: u32,
        total_distance_meters: f64,
        speed_kmh: f64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            location,
            total_steps,
            total_distance_meters,
            speed_kmh,
            now,
        }
    }
}

/// Which outcome wins when a single observation both completes a challenge
/// and crosses its expiry date.
///
/// A documented policy choice, not a derived requirement; the default biases
/// toward `Expired` when both trigger in the same tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieBreak {
    /// Expiry is checked first; a too-late completion is filed as expired
    #[default]
    ExpiryFirst,
    /// Completion is checked first; an on-the-buzzer effort still counts
    CompletionFirst,
}

/// Transient per-challenge geofence state.
#[derive(Debug, Clone, Copy, Default)]
struct GeofenceState {
    /// Whether the previous observation was inside the radius
    was_inside: bool,
}

/// Advances challenge progress from observations.
///
/// Logically single-threaded: observations arrive serially from one source
/// and are applied one at a time. The engine never raises errors for
/// out-of-range numeric input; it clamps.
pub struct ProgressEngine {
    tie_break: TieBreak,
    tracking: HashMap<Uuid, GeofenceState>,
}

impl ProgressEngine {
    /// Create an engine with the default expiry-first tie-break.
    pub fn new() -> Self {
        Self::with_tie_break(TieBreak::default())
    }

    /// Create an engine with an explicit tie-break policy.
    pub fn with_tie_break(tie_break: TieBreak) -> Self {
        Self {
            tie_break,
            tracking: HashMap::new(),
        }
    }

    /// The configured tie-break policy.
    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    /// Apply one observation to one challenge.
    ///
    /// No-op unless the challenge is `Active`: available challenges are
    /// activated externally through the store, and terminal challenges are
    /// never mutated again, so repeating a call has no observable effect.
    pub fn update(&mut self, challenge: &mut Challenge, observation: &Observation) {
        if challenge.state != ChallengeState::Active {
            return;
        }

        let distance_to_anchor = challenge.distance_to(observation.location);
        let inside = distance_to_anchor <= challenge.radius_meters;

        // Edge-triggered entry: a visit counts on the outside -> inside
        // transition, not on every observation inside the radius.
        let tracking = self.tracking.entry(challenge.id).or_default();
        let entered = inside && !tracking.was_inside;
        tracking.was_inside = inside;

        if entered && challenge.target_visits.is_some() {
            challenge.visit_count += 1;
            tracing::debug!(
                "Challenge '{}' visit {} recorded at {:.0}m from anchor",
                challenge.title,
                challenge.visit_count,
                distance_to_anchor
            );
        }

        // Baseline deltas, clamped at zero
        challenge.steps_progress = observation
            .total_steps
            .saturating_sub(challenge.steps_at_start.unwrap_or(0));
        challenge.distance_progress_meters = (observation.total_distance_meters
            - challenge.distance_at_start.unwrap_or(0.0))
        .max(0.0);
        if observation.speed_kmh > challenge.max_speed_kmh {
            challenge.max_speed_kmh = observation.speed_kmh;
        }

        match self.tie_break {
            TieBreak::ExpiryFirst => {
                if !self.check_expiry(challenge, observation.now) {
                    self.check_completion(challenge, observation.now);
                }
            }
            TieBreak::CompletionFirst => {
                if !self.check_completion(challenge, observation.now) {
                    self.check_expiry(challenge, observation.now);
                }
            }
        }
    }

    fn check_expiry(&mut self, challenge: &mut Challenge, now: DateTime<Utc>) -> bool {
        if challenge.is_overdue(now) {
            challenge.mark_expired();
            self.tracking.remove(&challenge.id);
            tracing::info!("Challenge '{}' expired", challenge.title);
            return true;
        }
        false
    }

    fn check_completion(&mut self, challenge: &mut Challenge, now: DateTime<Utc>) -> bool {
        if challenge.targets_met() {
            challenge.mark_completed(now);
            self.tracking.remove(&challenge.id);
            tracing::info!(
                "Challenge '{}' completed after {} steps, {:.0}m, {} visits",
                challenge.title,
                challenge.steps_progress,
                challenge.distance_progress_meters,
                challenge.visit_count
            );
            return true;
        }
        false
    }

    /// Drop transient tracking for a challenge that left the store.
    pub fn forget(&mut self, id: Uuid) {
        self.tracking.remove(&id);
    }

    /// Clear all transient tracking.
    pub fn reset(&mut self) {
        self.tracking.clear();
    }
}

impl Default for ProgressEngine {
    fn default() -> Self {
        Self::new()
    }
}
