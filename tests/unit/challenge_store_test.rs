//! Unit tests for store partitioning and lifecycle operations.

use chrono::{Duration, Utc};
use stepquest::{
    Challenge, ChallengeError, ChallengeEvent, ChallengeLocation, ChallengeState, ChallengeStore,
    ChallengeType, Observation, ProgressBaseline, ProgressEngine,
};
use uuid::Uuid;

fn park() -> ChallengeLocation {
    ChallengeLocation::new("Central Park", 40.7812, -73.9665)
}

fn steps_challenge(title: &str, target: u32) -> Challenge {
    Challenge::new(ChallengeType::StepsAtLocation, title, "", park()).with_target_steps(target)
}

#[test]
fn test_partitions_start_empty() {
    let store = ChallengeStore::new(ProgressEngine::new());
    assert!(store.available().is_empty());
    assert!(store.active().is_empty());
    assert!(store.completed().is_empty());
    assert_eq!(store.completion_rate(), 0.0);
}

#[test]
fn test_partitions_stay_disjoint_across_lifecycle() {
    let mut store = ChallengeStore::new(ProgressEngine::new());
    let now = Utc::now();

    for i in 0..3 {
        store
            .add_challenge(steps_challenge(&format!("Challenge {}", i), 1_000))
            .unwrap();
    }
    let first = store.available()[0].id;
    store
        .start_challenge(first, ProgressBaseline::default(), now)
        .unwrap();

    assert_eq!(store.available().len(), 2);
    assert_eq!(store.active().len(), 1);

    // Complete the active one
    store.apply_observation(&Observation::new(park().coordinate(), 2_000, 0.0, 0.0, now));

    assert_eq!(store.available().len(), 2);
    assert_eq!(store.active().len(), 0);
    assert_eq!(store.completed().len(), 1);

    let total = store.available().len() + store.active().len() + store.completed().len();
    assert_eq!(total, 3);
}

#[test]
fn test_start_reports_not_startable_for_completed() {
    let mut store = ChallengeStore::new(ProgressEngine::new());
    let now = Utc::now();
    let challenge = steps_challenge("One shot", 100);
    let id = challenge.id;
    store.add_challenge(challenge).unwrap();
    store
        .start_challenge(id, ProgressBaseline::default(), now)
        .unwrap();
    store.apply_observation(&Observation::new(park().coordinate(), 500, 0.0, 0.0, now));

    let result = store.start_challenge(id, ProgressBaseline::default(), now);
    assert!(matches!(
        result,
        Err(ChallengeError::InvalidTransition(ChallengeState::Completed))
    ));
}

#[test]
fn test_one_finished_challenge_does_not_stop_the_batch() {
    let mut store = ChallengeStore::new(ProgressEngine::new());
    let now = Utc::now();

    let expiring = steps_challenge("Expiring", 1_000_000).with_expiry(now - Duration::hours(1));
    let ongoing = steps_challenge("Ongoing", 10_000);
    let expiring_id = expiring.id;
    let ongoing_id = ongoing.id;
    store.add_challenge(expiring).unwrap();
    store.add_challenge(ongoing).unwrap();
    store
        .start_challenge(expiring_id, ProgressBaseline::default(), now - Duration::days(1))
        .unwrap();
    store
        .start_challenge(ongoing_id, ProgressBaseline::default(), now)
        .unwrap();

    store.apply_observation(&Observation::new(park().coordinate(), 4_000, 0.0, 0.0, now));

    // The expired one is filed away; the other still accumulated progress
    assert_eq!(store.find(expiring_id).unwrap().state, ChallengeState::Expired);
    let ongoing = store.find(ongoing_id).unwrap();
    assert_eq!(ongoing.state, ChallengeState::Active);
    assert_eq!(ongoing.steps_progress, 4_000);
}

#[test]
fn test_events_cover_the_whole_lifecycle() {
    let mut store = ChallengeStore::new(ProgressEngine::new());
    let events = store.event_receiver();
    let now = Utc::now();

    let completes = steps_challenge("Completes", 100);
    let expires = steps_challenge("Expires", 1_000_000).with_expiry(now - Duration::hours(1));
    let completes_id = completes.id;
    let expires_id = expires.id;
    store.add_challenge(completes).unwrap();
    store.add_challenge(expires).unwrap();
    store
        .start_challenge(completes_id, ProgressBaseline::default(), now)
        .unwrap();
    store
        .start_challenge(expires_id, ProgressBaseline::default(), now)
        .unwrap();

    store.apply_observation(&Observation::new(park().coordinate(), 500, 0.0, 0.0, now));

    let collected: Vec<ChallengeEvent> = events.try_iter().collect();
    let started = collected
        .iter()
        .filter(|e| matches!(e, ChallengeEvent::Started(_)))
        .count();
    let completed = collected
        .iter()
        .filter(|e| matches!(e, ChallengeEvent::Completed(c) if c.id == completes_id))
        .count();
    let expired = collected
        .iter()
        .filter(|e| matches!(e, ChallengeEvent::Expired(c) if c.id == expires_id))
        .count();

    assert_eq!(started, 2);
    assert_eq!(completed, 1);
    assert_eq!(expired, 1);
}

#[test]
fn test_cancel_unknown_and_unstarted() {
    let mut store = ChallengeStore::new(ProgressEngine::new());
    let challenge = steps_challenge("Idle", 100);
    let id = challenge.id;
    store.add_challenge(challenge).unwrap();

    // Still available, not cancellable
    assert!(matches!(
        store.cancel_challenge(id),
        Err(ChallengeError::InvalidTransition(ChallengeState::Available))
    ));
    assert!(matches!(
        store.cancel_challenge(Uuid::new_v4()),
        Err(ChallengeError::NotFound(_))
    ));
}

#[test]
fn test_snapshots_are_side_effect_free() {
    let mut store = ChallengeStore::new(ProgressEngine::new());
    store.add_challenge(steps_challenge("Idle", 100)).unwrap();

    let before: Vec<Uuid> = store.available().iter().map(|c| c.id).collect();
    let _ = store.available();
    let _ = store.active();
    let _ = store.completed();
    let after: Vec<Uuid> = store.available().iter().map(|c| c.id).collect();

    assert_eq!(before, after);
}
