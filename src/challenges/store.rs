//! Challenge store and partitioning.
//!
//! Owns the canonical challenge instances, partitioned into available,
//! active, and completed collections, and drives the progress engine over
//! the active set one observation at a time.

use chrono::{DateTime, Utc};
use crossbeam::channel::{Receiver, Sender};
use uuid::Uuid;

use super::progress::{Observation, ProgressEngine};
use super::types::{Challenge, ChallengeState, ChallengeType, ProgressBaseline};
use crate::geo::Coordinate;

/// Lifecycle event delivered to subscribers.
#[derive(Debug, Clone)]
pub enum ChallengeEvent {
    /// A challenge moved from available to active
    Started(Challenge),
    /// A challenge reached all of its targets
    Completed(Challenge),
    /// A challenge passed its expiry date unfinished
    Expired(Challenge),
}

/// Challenge management errors.
///
/// All failures are local and synchronous; nothing is thrown across the
/// update loop.
#[derive(Debug, thiserror::Error)]
pub enum ChallengeError {
    #[error("Challenge not found: {0}")]
    NotFound(Uuid),

    #[error("Challenge is {0}, not startable")]
    InvalidTransition(ChallengeState),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Owns the canonical challenge instances, partitioned by lifecycle state.
///
/// Expired challenges are filed under the completed collection for display
/// but keep their `Expired` state tag. Mutation goes through `&mut self`,
/// so a single writer at a time is guaranteed by the borrow checker and
/// readers only ever observe state between completed calls.
pub struct ChallengeStore {
    available: Vec<Challenge>,
    active: Vec<Challenge>,
    completed: Vec<Challenge>,
    engine: ProgressEngine,
    event_tx: Option<Sender<ChallengeEvent>>,
}

impl ChallengeStore {
    /// Create a store around a progress engine.
    pub fn new(engine: ProgressEngine) -> Self {
        Self {
            available: Vec::new(),
            active: Vec::new(),
            completed: Vec::new(),
            engine,
            event_tx: None,
        }
    }

    /// Get an event receiver for lifecycle events.
    pub fn event_receiver(&mut self) -> Receiver<ChallengeEvent> {
        let (tx, rx) = crossbeam::channel::unbounded();
        self.event_tx = Some(tx);
        rx
    }

    /// Send an event if a subscriber is attached.
    fn send_event(&self, event: ChallengeEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(event);
        }
    }

    /// File a new challenge definition under available.
    pub fn add_challenge(&mut self, challenge: Challenge) -> Result<(), ChallengeError> {
        validate(&challenge)?;
        if challenge.state != ChallengeState::Available {
            return Err(ChallengeError::InvalidTransition(challenge.state));
        }
        tracing::debug!("Challenge '{}' added as available", challenge.title);
        self.available.push(challenge);
        Ok(())
    }

    /// Reload persisted challenges, filing each under its state's partition.
    ///
    /// Persistence is an external collaborator; whatever state, baselines,
    /// and counters it supplies are taken as authoritative.
    pub fn load<I: IntoIterator<Item = Challenge>>(&mut self, challenges: I) {
        for challenge in challenges {
            match challenge.state {
                ChallengeState::Available => self.available.push(challenge),
                ChallengeState::Active => self.active.push(challenge),
                ChallengeState::Completed | ChallengeState::Expired => {
                    self.completed.push(challenge)
                }
            }
        }
    }

    /// Start an available challenge, capturing the caller-supplied baseline.
    ///
    /// Fails without touching any state if the challenge is not available.
    pub fn start_challenge(
        &mut self,
        id: Uuid,
        baseline: ProgressBaseline,
        now: DateTime<Utc>,
    ) -> Result<(), ChallengeError> {
        let Some(pos) = self.available.iter().position(|c| c.id == id) else {
            return match self.find(id) {
                Some(challenge) => Err(ChallengeError::InvalidTransition(challenge.state)),
                None => Err(ChallengeError::NotFound(id)),
            };
        };

        let mut challenge = self.available.remove(pos);
        challenge.activate(baseline, now);
        tracing::info!(
            "Challenge '{}' started with baseline {} steps / {:.0}m",
            challenge.title,
            baseline.steps,
            baseline.distance_meters
        );
        self.send_event(ChallengeEvent::Started(challenge.clone()));
        self.active.push(challenge);
        Ok(())
    }

    /// Remove an active challenge from the store entirely.
    ///
    /// The engine's transient tracking for it is dropped as well.
    pub fn cancel_challenge(&mut self, id: Uuid) -> Result<Challenge, ChallengeError> {
        let Some(pos) = self.active.iter().position(|c| c.id == id) else {
            return match self.find(id) {
                Some(challenge) => Err(ChallengeError::InvalidTransition(challenge.state)),
                None => Err(ChallengeError::NotFound(id)),
            };
        };

        let challenge = self.active.remove(pos);
        self.engine.forget(id);
        tracing::info!("Challenge '{}' cancelled", challenge.title);
        Ok(challenge)
    }

    /// Apply one observation to every active challenge, then re-partition.
    ///
    /// This is the only place progress moves challenges between partitions.
    /// A challenge that cannot advance never aborts the rest of the batch:
    /// the engine clamps bad input instead of failing.
    pub fn apply_observation(&mut self, observation: &Observation) {
        let engine = &mut self.engine;
        for challenge in self.active.iter_mut() {
            engine.update(challenge, observation);
        }
        self.repartition();
    }

    /// File active challenges whose expiry passed without an observation.
    pub fn expire_overdue(&mut self, now: DateTime<Utc>) {
        let engine = &mut self.engine;
        for challenge in self.active.iter_mut() {
            if challenge.is_overdue(now) {
                challenge.mark_expired();
                engine.forget(challenge.id);
                tracing::info!("Challenge '{}' expired", challenge.title);
            }
        }
        self.repartition();
    }

    /// Move terminal challenges out of the active partition.
    fn repartition(&mut self) {
        let mut index = 0;
        while index < self.active.len() {
            if self.active[index].state.is_terminal() {
                let challenge = self.active.remove(index);
                match challenge.state {
                    ChallengeState::Completed => {
                        self.send_event(ChallengeEvent::Completed(challenge.clone()))
                    }
                    ChallengeState::Expired => {
                        self.send_event(ChallengeEvent::Expired(challenge.clone()))
                    }
                    _ => {}
                }
                self.completed.push(challenge);
            } else {
                index += 1;
            }
        }
    }

    /// Challenges not yet joined.
    pub fn available(&self) -> &[Challenge] {
        &self.available
    }

    /// Challenges currently accumulating progress.
    pub fn active(&self) -> &[Challenge] {
        &self.active
    }

    /// Finished challenges, completed and expired alike.
    pub fn completed(&self) -> &[Challenge] {
        &self.completed
    }

    /// Look a challenge up in any partition.
    pub fn find(&self, id: Uuid) -> Option<&Challenge> {
        self.available
            .iter()
            .chain(self.active.iter())
            .chain(self.completed.iter())
            .find(|c| c.id == id)
    }

    /// Number of active challenges.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Number of challenges finished by reaching their targets.
    pub fn total_completed(&self) -> usize {
        self.completed
            .iter()
            .filter(|c| c.state == ChallengeState::Completed)
            .count()
    }

    /// Share of joined challenges that ended completed, in [0, 1].
    pub fn completion_rate(&self) -> f64 {
        let total = self.completed.len() + self.active.len();
        if total == 0 {
            return 0.0;
        }
        self.total_completed() as f64 / total as f64
    }

    /// The active challenge whose anchor is closest to a coordinate.
    pub fn nearest_active_challenge(&self, from: Coordinate) -> Option<&Challenge> {
        self.active.iter().min_by(|a, b| {
            a.distance_to(from)
                .partial_cmp(&b.distance_to(from))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }

    /// Distance in meters to the nearest active challenge anchor.
    pub fn distance_to_nearest(&self, from: Coordinate) -> Option<f64> {
        self.nearest_active_challenge(from)
            .map(|c| c.distance_to(from))
    }
}

impl Default for ChallengeStore {
    fn default() -> Self {
        Self::new(ProgressEngine::new())
    }
}

/// Check a definition at the construction boundary: the type's required
/// target must be present and positive, and the geofence must have extent.
fn validate(challenge: &Challenge) -> Result<(), ChallengeError> {
    if !(challenge.radius_meters > 0.0) {
        return Err(ChallengeError::ValidationError(
            "Geofence radius must be positive".to_string(),
        ));
    }

    let target_set = match challenge.challenge_type {
        ChallengeType::StepsAtLocation => challenge.target_steps.map_or(false, |t| t > 0),
        ChallengeType::DistanceWalk => {
            challenge.target_distance_meters.map_or(false, |t| t > 0.0)
        }
        ChallengeType::VisitLocation => challenge.target_visits.map_or(false, |t| t >= 1),
        ChallengeType::SpeedChallenge => challenge.target_speed_kmh.map_or(false, |t| t > 0.0),
    };

    if !target_set {
        return Err(ChallengeError::ValidationError(format!(
            "{} challenges require a positive target",
            challenge.challenge_type
        )));
    }

    Ok(())
}
