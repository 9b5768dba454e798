//! Challenge type definitions.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::{self, Coordinate};

/// Kind of location-anchored challenge.
///
/// The kind determines which target field is required; additional targets
/// may be set alongside it and all set targets must be satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeType {
    /// Walk a number of steps while the challenge is active
    StepsAtLocation,
    /// Cover a walking distance
    DistanceWalk,
    /// Enter the anchor geofence a number of times
    VisitLocation,
    /// Reach a peak walking speed
    SpeedChallenge,
}

impl ChallengeType {
    /// Get display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            ChallengeType::StepsAtLocation => "Steps at Location",
            ChallengeType::DistanceWalk => "Distance Walk",
            ChallengeType::VisitLocation => "Visit Location",
            ChallengeType::SpeedChallenge => "Speed Challenge",
        }
    }

    /// Get all challenge types.
    pub fn all() -> Vec<ChallengeType> {
        vec![
            ChallengeType::StepsAtLocation,
            ChallengeType::DistanceWalk,
            ChallengeType::VisitLocation,
            ChallengeType::SpeedChallenge,
        ]
    }
}

impl std::fmt::Display for ChallengeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Lifecycle state of a challenge.
///
/// Transitions are monotonic: `Available -> Active -> {Completed, Expired}`.
/// Nothing leaves `Completed` or `Expired`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeState {
    /// Published but not yet joined
    Available,
    /// Joined and accumulating progress
    Active,
    /// All targets reached
    Completed,
    /// Expiry date passed before all targets were reached
    Expired,
}

impl ChallengeState {
    /// Whether no further transitions can happen from this state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChallengeState::Completed | ChallengeState::Expired)
    }

    /// Get display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            ChallengeState::Available => "Available",
            ChallengeState::Active => "Active",
            ChallengeState::Completed => "Completed",
            ChallengeState::Expired => "Expired",
        }
    }
}

impl std::fmt::Display for ChallengeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// The fixed anchor a challenge is tied to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeLocation {
    /// Display name of the place
    pub name: String,
    /// Latitude in WGS-84 degrees
    pub latitude: f64,
    /// Longitude in WGS-84 degrees
    pub longitude: f64,
}

impl ChallengeLocation {
    /// Create a new anchor location.
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
        }
    }

    /// The anchor as a coordinate.
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Caller-supplied daily totals captured when a challenge starts.
///
/// Progress is measured as the delta from these values, so a challenge
/// started mid-day does not get credit for steps walked before joining.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ProgressBaseline {
    /// Daily step total at activation
    pub steps: u32,
    /// Daily distance total at activation, in meters
    pub distance_meters: f64,
}

impl ProgressBaseline {
    /// Create a baseline from current daily totals.
    pub fn new(steps: u32, distance_meters: f64) -> Self {
        Self {
            steps,
            distance_meters,
        }
    }
}

/// A location-anchored challenge.
///
/// The `ChallengeStore` owns the canonical instances; the `ProgressEngine`
/// mutates the accumulator fields one observation at a time. Everything here
/// is persistable: the transient geofence flag used for edge-triggered visit
/// counting lives in the engine, keyed by challenge id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    /// Unique identifier
    pub id: Uuid,
    /// Kind of challenge
    pub challenge_type: ChallengeType,
    /// Display title
    pub title: String,
    /// Display description
    pub description: String,
    /// Anchor location
    pub location: ChallengeLocation,
    /// Geofence radius around the anchor, in meters
    pub radius_meters: f64,
    /// Step target
    pub target_steps: Option<u32>,
    /// Distance target in meters
    pub target_distance_meters: Option<f64>,
    /// Qualifying geofence entry target
    pub target_visits: Option<u32>,
    /// Peak speed target in km/h
    pub target_speed_kmh: Option<f64>,
    /// Lifecycle state
    pub state: ChallengeState,
    /// Daily step total captured at activation
    pub steps_at_start: Option<u32>,
    /// Daily distance total captured at activation, in meters
    pub distance_at_start: Option<f64>,
    /// Steps walked since activation
    pub steps_progress: u32,
    /// Distance covered since activation, in meters
    pub distance_progress_meters: f64,
    /// Highest speed observed while active, in km/h
    pub max_speed_kmh: f64,
    /// Qualifying geofence entries while active
    pub visit_count: u32,
    /// When the challenge was started
    pub started_date: Option<DateTime<Utc>>,
    /// When all targets were first reached
    pub completed_date: Option<DateTime<Utc>>,
    /// Optional deadline; past this an unfinished challenge expires
    pub expiry_date: Option<DateTime<Utc>>,
}

impl Challenge {
    /// Default geofence radius in meters.
    pub const DEFAULT_RADIUS_METERS: f64 = 500.0;

    /// Create a new challenge in the `Available` state.
    pub fn new(
        challenge_type: ChallengeType,
        title: impl Into<String>,
        description: impl Into<String>,
        location: ChallengeLocation,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            challenge_type,
            title: title.into(),
            description: description.into(),
            location,
            radius_meters: Self::DEFAULT_RADIUS_METERS,
            target_steps: None,
            target_distance_meters: None,
            target_visits: None,
            target_speed_kmh: None,
            state: ChallengeState::Available,
            steps_at_start: None,
            distance_at_start: None,
            steps_progress: 0,
            distance_progress_meters: 0.0,
            max_speed_kmh: 0.0,
            visit_count: 0,
            started_date: None,
            completed_date: None,
            expiry_date: None,
        }
    }

    /// Set the geofence radius.
    pub fn with_radius(mut self, radius_meters: f64) -> Self {
        self.radius_meters = radius_meters;
        self
    }

    /// Set the step target.
    pub fn with_target_steps(mut self, steps: u32) -> Self {
        self.target_steps = Some(steps);
        self
    }

    /// Set the distance target in meters.
    pub fn with_target_distance(mut self, meters: f64) -> Self {
        self.target_distance_meters = Some(meters);
        self
    }

    /// Set the geofence entry target.
    pub fn with_target_visits(mut self, visits: u32) -> Self {
        self.target_visits = Some(visits);
        self
    }

    /// Set the peak speed target in km/h.
    pub fn with_target_speed(mut self, kmh: f64) -> Self {
        self.target_speed_kmh = Some(kmh);
        self
    }

    /// Set an explicit expiry date.
    pub fn with_expiry(mut self, expiry: DateTime<Utc>) -> Self {
        self.expiry_date = Some(expiry);
        self
    }

    /// Expire the challenge a number of days from now.
    pub fn with_duration_days(mut self, days: u16) -> Self {
        self.expiry_date = Some(Utc::now() + Duration::days(days as i64));
        self
    }

    /// Ratio of progress to target for every set target, each saturated
    /// to [0, 1]. Empty when the challenge has no targets.
    fn dimension_ratios(&self) -> Vec<f64> {
        let mut ratios = Vec::new();

        if let Some(target) = self.target_steps.filter(|t| *t > 0) {
            ratios.push(self.steps_progress as f64 / target as f64);
        }
        if let Some(target) = self.target_distance_meters.filter(|t| *t > 0.0) {
            ratios.push(self.distance_progress_meters / target);
        }
        if let Some(target) = self.target_visits.filter(|t| *t > 0) {
            ratios.push(self.visit_count as f64 / target as f64);
        }
        if let Some(target) = self.target_speed_kmh.filter(|t| *t > 0.0) {
            ratios.push(self.max_speed_kmh / target);
        }

        ratios.iter().map(|r| r.clamp(0.0, 1.0)).collect()
    }

    /// Overall progress in [0, 1].
    ///
    /// The minimum across all set target dimensions: a challenge with both a
    /// step and a distance target is only as complete as its slowest
    /// dimension. 0.0 when no targets are set. Derived on every call, never
    /// stored, so it cannot drift from the accumulators.
    pub fn progress_percent(&self) -> f64 {
        self.dimension_ratios()
            .into_iter()
            .reduce(f64::min)
            .unwrap_or(0.0)
    }

    /// Whether every set target dimension has reached its target.
    pub fn targets_met(&self) -> bool {
        let ratios = self.dimension_ratios();
        !ratios.is_empty() && ratios.iter().all(|r| *r >= 1.0)
    }

    /// Distance from a coordinate to the anchor, in meters.
    pub fn distance_to(&self, from: Coordinate) -> f64 {
        geo::distance_meters(from, self.location.coordinate())
    }

    /// Whether a coordinate lies inside the geofence.
    pub fn contains(&self, point: Coordinate) -> bool {
        self.distance_to(point) <= self.radius_meters
    }

    /// Whole days until expiry (None if no expiry; negative if past).
    pub fn days_remaining(&self, now: DateTime<Utc>) -> Option<i64> {
        self.expiry_date.map(|expiry| (expiry - now).num_days())
    }

    /// Whether the expiry date has passed.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.expiry_date.map(|expiry| now > expiry).unwrap_or(false)
    }

    /// Capture the activation baseline and move to `Active`.
    ///
    /// Callers go through `ChallengeStore::start_challenge`, which guards
    /// the transition.
    pub(crate) fn activate(&mut self, baseline: ProgressBaseline, now: DateTime<Utc>) {
        debug_assert_eq!(self.state, ChallengeState::Available);
        self.steps_at_start = Some(baseline.steps);
        self.distance_at_start = Some(baseline.distance_meters);
        self.started_date = Some(now);
        self.state = ChallengeState::Active;
    }

    /// Move to `Completed`, stamping `completed_date` the first time only.
    pub(crate) fn mark_completed(&mut self, now: DateTime<Utc>) {
        if self.completed_date.is_none() {
            self.completed_date = Some(now);
        }
        self.state = ChallengeState::Completed;
    }

    /// Move to `Expired`.
    pub(crate) fn mark_expired(&mut self) {
        self.state = ChallengeState::Expired;
    }
}
