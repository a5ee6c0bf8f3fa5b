//! Tests for round assembly and the round builder.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rand::SeedableRng;
use rand::rngs::StdRng;

use tunemetrics::cache::{CacheConfig, Memoized};
use tunemetrics::round::{RoundBuilder, RoundOptions, assemble_round};
use tunemetrics::{Album, ArtistRef, Track, TuneError};

fn track(id: &str, name: &str, duration_ms: u64, popularity: u32, released: &str) -> Track {
    Track {
        id: id.to_string(),
        name: name.to_string(),
        uri: format!("spotify:track:{id}"),
        preview_url: None,
        duration_ms,
        popularity,
        explicit: false,
        album: Album {
            id: format!("album-{id}"),
            name: "Album".to_string(),
            release_date: Some(released.to_string()),
            release_date_precision: Some("day".to_string()),
            images: vec![],
        },
        artists: vec![ArtistRef {
            id: "artist1".to_string(),
            name: "Artist".to_string(),
        }],
    }
}

fn playable(id: &str, name: &str) -> Track {
    track(id, name, 200_000, 50, "2010-05-05")
}

fn catalog(n: usize) -> Vec<Track> {
    (0..n)
        .map(|i| playable(&format!("t{i}"), &format!("Song {i}")))
        .collect()
}

// ============================================================================
// assemble_round
// ============================================================================

#[test]
fn round_invariants_hold_across_seeds() {
    let tracks = catalog(12);
    let options = RoundOptions::default();

    for seed in 0..200 {
        let mut rng = StdRng::seed_from_u64(seed);
        let round = assemble_round(&tracks, &options, &mut rng).unwrap();

        assert_eq!(round.options.len(), 4);
        assert_eq!(round.correct_track_name, round.track_to_guess.name);
        let hits = round
            .options
            .iter()
            .filter(|o| **o == round.correct_track_name)
            .count();
        assert_eq!(hits, 1, "target must appear exactly once");
        let unique: HashSet<&String> = round.options.iter().collect();
        assert_eq!(unique.len(), round.options.len(), "options must be distinct");
        assert!(round.track_to_guess.duration_ms > 5_000);
    }
}

#[test]
fn unplayable_catalog_has_no_round() {
    let tracks = vec![
        track("a", "Skit", 5_000, 10, "2001-01-01"),
        track("b", "Intro", 1_200, 10, "2001-01-01"),
    ];
    let mut rng = StdRng::seed_from_u64(1);
    assert!(assemble_round(&tracks, &RoundOptions::default(), &mut rng).is_none());
    assert!(assemble_round(&[], &RoundOptions::default(), &mut rng).is_none());
}

#[test]
fn only_playable_tracks_are_targets_or_options() {
    let tracks = vec![
        playable("a", "Long One"),
        track("b", "Short One", 3_000, 99, "2020-01-01"),
        playable("c", "Long Two"),
    ];
    for seed in 0..50 {
        let mut rng = StdRng::seed_from_u64(seed);
        let round = assemble_round(&tracks, &RoundOptions::default(), &mut rng).unwrap();
        assert_ne!(round.track_to_guess.id, "b");
        assert!(!round.options.contains(&"Short One".to_string()));
        assert_eq!(round.options.len(), 2);
    }
}

#[test]
fn small_catalog_yields_shorter_option_list() {
    let tracks = catalog(2);
    let mut rng = StdRng::seed_from_u64(9);
    let round = assemble_round(&tracks, &RoundOptions::default(), &mut rng).unwrap();

    let names: HashSet<String> = round.options.into_iter().collect();
    assert_eq!(
        names,
        HashSet::from(["Song 0".to_string(), "Song 1".to_string()])
    );
}

#[test]
fn duplicate_names_are_offered_once() {
    let tracks = vec![
        playable("a", "Intro"),
        playable("b", "Intro"),
        playable("c", "Intro"),
        playable("d", "Outro"),
        playable("e", "Interlude"),
    ];
    for seed in 0..100 {
        let mut rng = StdRng::seed_from_u64(seed);
        let round = assemble_round(&tracks, &RoundOptions::default(), &mut rng).unwrap();
        let unique: HashSet<&String> = round.options.iter().collect();
        assert_eq!(unique.len(), round.options.len());
        assert_eq!(round.options.len(), 3);
    }
}

#[test]
fn each_policy_contributes_its_extreme() {
    let mut tracks = vec![
        track("hit", "Hit", 200_000, 100, "2010-05-05"),
        track("flop", "Flop", 200_000, 0, "2010-05-05"),
        track("old", "Old", 200_000, 50, "1970-01-01"),
        track("new", "New", 200_000, 50, "2024-01-01"),
    ];
    tracks.extend((0..6).map(|i| playable(&format!("m{i}"), &format!("Middle {i}"))));

    let options = RoundOptions::new().option_count(5);
    let mut checked = 0;
    for seed in 0..100 {
        let mut rng = StdRng::seed_from_u64(seed);
        let round = assemble_round(&tracks, &options, &mut rng).unwrap();
        if !round.correct_track_name.starts_with("Middle") {
            continue;
        }
        checked += 1;
        let names: HashSet<&str> = round.options.iter().map(String::as_str).collect();
        let expected: HashSet<&str> = ["Hit", "Flop", "Old", "New", round.correct_track_name.as_str()]
            .into_iter()
            .collect();
        assert_eq!(names, expected);
    }
    assert!(checked > 0);
}

#[test]
fn missing_release_dates_count_as_newest() {
    // Equal popularity and dates everywhere else: ties resolve to the first
    // inserted track, so only Newest can ever pick the undated one.
    let mut tracks: Vec<Track> = (0..6)
        .map(|i| playable(&format!("m{i}"), &format!("Middle {i}")))
        .collect();
    let mut undated = playable("u", "Undated");
    undated.album.release_date = None;
    tracks.push(undated);

    let options = RoundOptions::new().option_count(2);
    let mut seen_undated = 0;
    for seed in 0..200 {
        let mut rng = StdRng::seed_from_u64(seed);
        let round = assemble_round(&tracks, &options, &mut rng).unwrap();
        if round.options.iter().any(|o| o == "Undated") && round.correct_track_name != "Undated" {
            seen_undated += 1;
        }
    }
    assert!(seen_undated > 0);
}

#[test]
fn answer_position_is_uniform() {
    let tracks = catalog(4);
    let options = RoundOptions::default();
    let mut rng = StdRng::seed_from_u64(42);
    let mut positions = [0u32; 4];
    let mut targets = [0u32; 4];
    let runs = 10_000;

    for _ in 0..runs {
        let round = assemble_round(&tracks, &options, &mut rng).unwrap();
        let pos = round
            .options
            .iter()
            .position(|o| *o == round.correct_track_name)
            .unwrap();
        positions[pos] += 1;
        let idx: usize = round.track_to_guess.id[1..].parse().unwrap();
        targets[idx] += 1;
    }

    for count in positions.iter().chain(targets.iter()) {
        let share = f64::from(*count) / f64::from(runs);
        assert!(
            (0.15..=0.35).contains(&share),
            "share {share} outside 15-35% (positions {positions:?}, targets {targets:?})"
        );
    }
}

// ============================================================================
// RoundBuilder
// ============================================================================

fn builder_over(tracks: Vec<Track>, calls: Arc<AtomicUsize>) -> RoundBuilder {
    let cache = Memoized::new(
        "artist_catalog",
        &CacheConfig::default(),
        move |(_artist, _token): (String, String)| {
            let tracks = tracks.clone();
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(tracks)
            }
        },
    );
    RoundBuilder::new(cache, RoundOptions::default())
}

#[tokio::test]
async fn builder_reuses_cached_catalog() {
    let calls = Arc::new(AtomicUsize::new(0));
    let builder = builder_over(catalog(8), Arc::clone(&calls));

    let first = builder.build_round("artist1", "tok").await.unwrap().unwrap();
    let second = builder.build_round("artist1", "tok").await.unwrap().unwrap();
    assert_eq!(first.options.len(), 4);
    assert_eq!(second.options.len(), 4);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // A different token is a different cache key.
    builder.build_round("artist1", "other").await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn builder_returns_none_without_playable_tracks() {
    let calls = Arc::new(AtomicUsize::new(0));
    let builder = builder_over(
        vec![track("a", "Skit", 4_000, 1, "2000-01-01")],
        calls,
    );
    assert!(builder.build_round("artist1", "tok").await.unwrap().is_none());
}

#[tokio::test]
async fn builder_propagates_fetch_errors() {
    let cache: Memoized<(String, String), Vec<Track>> = Memoized::new(
        "artist_catalog",
        &CacheConfig::default(),
        |_: (String, String)| async { Err(TuneError::ExpiredUserSession { status: 401 }) },
    );
    let builder = RoundBuilder::new(cache, RoundOptions::default());

    let err = builder.build_round("artist1", "tok").await.unwrap_err();
    assert!(err.is_auth_failure());
}
