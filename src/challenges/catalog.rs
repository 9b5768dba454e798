//! Built-in and file-based challenge catalogs.
//!
//! Challenge definitions can be shipped as a TOML file; when none exists a
//! small starter set is used so the store is never empty on first run.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::types::{Challenge, ChallengeLocation, ChallengeType};

/// Catalog file contents.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    challenge: Vec<CatalogEntry>,
}

/// One `[[challenge]]` entry in a catalog file.
#[derive(Debug, Deserialize)]
struct CatalogEntry {
    #[serde(rename = "type")]
    challenge_type: ChallengeType,
    title: String,
    description: String,
    location_name: String,
    latitude: f64,
    longitude: f64,
    #[serde(default = "default_radius")]
    radius_meters: f64,
    target_steps: Option<u32>,
    target_distance_meters: Option<f64>,
    target_visits: Option<u32>,
    target_speed_kmh: Option<f64>,
    duration_days: Option<u16>,
}

fn default_radius() -> f64 {
    Challenge::DEFAULT_RADIUS_METERS
}

impl CatalogEntry {
    fn into_challenge(self) -> Challenge {
        let mut challenge = Challenge::new(
            self.challenge_type,
            self.title,
            self.description,
            ChallengeLocation::new(self.location_name, self.latitude, self.longitude),
        )
        .with_radius(self.radius_meters);

        if let Some(steps) = self.target_steps {
            challenge = challenge.with_target_steps(steps);
        }
        if let Some(meters) = self.target_distance_meters {
            challenge = challenge.with_target_distance(meters);
        }
        if let Some(visits) = self.target_visits {
            challenge = challenge.with_target_visits(visits);
        }
        if let Some(kmh) = self.target_speed_kmh {
            challenge = challenge.with_target_speed(kmh);
        }
        if let Some(days) = self.duration_days {
            challenge = challenge.with_duration_days(days);
        }

        challenge
    }
}

/// Load a challenge catalog from a TOML file.
pub fn load_catalog(path: &Path) -> Result<Vec<Challenge>, CatalogError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| CatalogError::IoError(e.to_string()))?;

    let file: CatalogFile =
        toml::from_str(&content).map_err(|e| CatalogError::ParseError(e.to_string()))?;

    Ok(file
        .challenge
        .into_iter()
        .map(CatalogEntry::into_challenge)
        .collect())
}

/// Get the default catalog file path.
pub fn default_catalog_path() -> PathBuf {
    directories::ProjectDirs::from("com", "stepquest", "StepQuest")
        .map(|dirs| dirs.data_dir().join("challenges.toml"))
        .unwrap_or_else(|| PathBuf::from("challenges.toml"))
}

/// Load the default catalog, falling back to the starter set.
pub fn load_or_default() -> Vec<Challenge> {
    let path = default_catalog_path();
    if path.exists() {
        match load_catalog(&path) {
            Ok(challenges) => return challenges,
            Err(e) => tracing::warn!("Failed to load challenge catalog: {}", e),
        }
    }
    starter_challenges()
}

/// Starter challenges used when no catalog file exists.
pub fn starter_challenges() -> Vec<Challenge> {
    let park = ChallengeLocation::new("Central Park", 40.7812, -73.9665);

    vec![
        Challenge::new(
            ChallengeType::StepsAtLocation,
            "10,000 Steps in the Park",
            "Walk 10,000 steps inside Central Park",
            park.clone(),
        )
        .with_radius(1_000.0)
        .with_target_steps(10_000)
        .with_duration_days(7),
        Challenge::new(
            ChallengeType::DistanceWalk,
            "5 km Riverside Walk",
            "Cover 5 kilometers along the waterfront",
            park.clone(),
        )
        .with_target_distance(5_000.0)
        .with_duration_days(14),
        Challenge::new(
            ChallengeType::VisitLocation,
            "Explorer",
            "Visit the park on 10 separate occasions",
            park,
        )
        .with_radius(10_000.0)
        .with_target_visits(10)
        .with_duration_days(30),
    ]
}

/// Catalog errors.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}
