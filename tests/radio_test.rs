mod common;

use std::collections::HashSet;

use common::*;
use sporadio::{
    Error,
    management::{PointerStore, RecordKey},
    radio::{
        self, INITIAL_RECOMMENDATIONS, MAX_SEEDS, RADIO_TARGET_SIZE, RadioOptions, RefillOutcome,
        SeedSource, SeenTracks, Session, expand, playlist,
    },
    spotify::MusicProvider,
    types::{Artist, Playlist, RecommendationSeed, RepeatState},
};

fn no_extra_rounds() -> RadioOptions {
    RadioOptions { extra_rounds: 0 }
}

fn assert_unique(ids: &[String]) {
    let set: HashSet<&String> = ids.iter().collect();
    assert_eq!(set.len(), ids.len(), "duplicate ids in {ids:?}");
}

#[tokio::test]
async fn test_playlist_seed_is_unique_sample_of_one_page() {
    let fake = FakeProvider::new();
    let source = fake.add_playlist("src", "Road Trip", ids("p", 120));
    let mut session = session(fake);

    let seed = radio::resolve_seed(&mut session, SeedSource::Playlist(source))
        .await
        .unwrap();

    assert_eq!(seed.name, "Road Trip");
    assert!((1..=MAX_SEEDS).contains(&seed.tracks.len()));
    assert_unique(&seed.tracks);

    // three pages; the short last one is never sampled
    let pages: HashSet<usize> = seed
        .tracks
        .iter()
        .map(|id| id[1..].parse::<usize>().unwrap() / 50)
        .collect();
    assert_eq!(pages.len(), 1);
    assert!(pages.iter().all(|page| *page < 2));
}

#[tokio::test]
async fn test_small_album_seeds_every_track() {
    let fake = FakeProvider::with(|state| {
        state
            .albums
            .insert("alb".to_string(), vec![track("a1"), track("a2"), track("a3")]);
    });
    let mut session = session(fake);
    let album = session.provider.album("alb").await.unwrap();

    let seed = radio::resolve_seed(&mut session, SeedSource::Album(album))
        .await
        .unwrap();

    let got: HashSet<String> = seed.tracks.into_iter().collect();
    let expected: HashSet<String> = ["a1", "a2", "a3"].iter().map(|s| s.to_string()).collect();
    assert_eq!(got, expected);
}

#[tokio::test]
async fn test_empty_sources_are_rejected() {
    let fake = FakeProvider::with(|state| {
        state.albums.insert("empty".to_string(), Vec::new());
    });
    let empty_playlist = fake.add_playlist("nothing", "Nothing", Vec::new());
    let mut session = session(fake);
    let album = session.provider.album("empty").await.unwrap();

    let result = radio::resolve_seed(&mut session, SeedSource::Album(album)).await;
    assert!(matches!(result, Err(Error::EmptySource(_))));

    let result = radio::resolve_seed(&mut session, SeedSource::Playlist(empty_playlist)).await;
    assert!(matches!(result, Err(Error::EmptySource(_))));

    let result = radio::resolve_seed(&mut session, SeedSource::SavedTracks).await;
    assert!(matches!(result, Err(Error::EmptySource(_))));
}

#[tokio::test]
async fn test_artist_seed_uses_artist_id() {
    let mut session = session(FakeProvider::new());
    let artist = Artist {
        id: "art-1".to_string(),
        name: "Band".to_string(),
        genres: Vec::new(),
    };

    let seed = radio::resolve_seed(&mut session, SeedSource::Artist(artist))
        .await
        .unwrap();

    assert_eq!(seed.name, "Band");
    assert!(seed.tracks.is_empty());
    assert_eq!(
        seed.recommendation_seed(),
        RecommendationSeed::from_artist("art-1".to_string())
    );
}

#[tokio::test]
async fn test_playing_track_is_the_seed() {
    let fake = FakeProvider::with(|state| state.playback = Some(playing("song-a", None, 42_000)));
    let mut session = session(fake);

    let seed = radio::resolve_seed(&mut session, SeedSource::CurrentlyPlaying)
        .await
        .unwrap();

    assert_eq!(seed.tracks, vec!["song-a".to_string()]);
    assert_eq!(seed.position_ms, Some(42_000));
}

#[tokio::test]
async fn test_nothing_playing_activates_device_and_picks_saved_track() {
    let fake = FakeProvider::with(|state| {
        state.saved = ids("s", 30).iter().map(|id| track(id)).collect();
    });
    let mut session = session(fake);
    session.store.save(&device("dev-42")).await.unwrap();

    let seed = radio::resolve_seed(&mut session, SeedSource::CurrentlyPlaying)
        .await
        .unwrap();

    assert_eq!(seed.tracks.len(), 1);
    let index: usize = seed.tracks[0][1..].parse().unwrap();
    assert!(index < 10, "picked {} outside the first 10", seed.tracks[0]);
    assert!(
        session
            .provider
            .calls()
            .contains(&Call::Transfer("dev-42".to_string(), true))
    );
}

#[tokio::test]
async fn test_paused_track_picks_saved_track_without_activation() {
    let fake = FakeProvider::with(|state| {
        let mut paused = playing("song-a", None, 42_000);
        paused.is_playing = false;
        state.playback = Some(paused);
        state.saved = ids("s", 30).iter().map(|id| track(id)).collect();
    });
    let mut session = session(fake);
    session.store.save(&device("dev-42")).await.unwrap();

    let seed = radio::resolve_seed(&mut session, SeedSource::CurrentlyPlaying)
        .await
        .unwrap();

    assert_eq!(seed.tracks.len(), 1);
    assert!(seed.tracks[0].starts_with('s'));
    assert_eq!(seed.position_ms, None);
    assert!(
        session
            .provider
            .calls()
            .iter()
            .all(|c| !matches!(c, Call::Transfer(..)))
    );
}

#[tokio::test]
async fn test_same_rng_seed_samples_the_same_tracks() {
    let mut picks = Vec::new();
    for _ in 0..2 {
        let fake = FakeProvider::new();
        let source = fake.add_playlist("src", "Big", ids("p", 400));
        let mut session = Session::seeded(USER_ID, fake, sporadio::management::MemoryStore::new(), 99);
        let seed = radio::resolve_seed(&mut session, SeedSource::Playlist(source))
            .await
            .unwrap();
        picks.push(seed.tracks);
    }
    assert_eq!(picks[0], picks[1]);
}

#[tokio::test]
async fn test_expand_never_returns_seen_tracks() {
    let fake = FakeProvider::with(|state| {
        state.recommendations = Recommendations::Fixed(
            ["r1", "r2", "r3", "r4"].iter().map(|s| s.to_string()).collect(),
        );
    });
    let mut seen: SeenTracks = ["r2", "r4"].iter().map(|s| s.to_string()).collect();

    let expansion = expand(
        &fake,
        &RecommendationSeed::from_track("seed".to_string()),
        50,
        &mut seen,
    )
    .await
    .unwrap();

    assert_eq!(expansion.fresh, vec!["r1".to_string(), "r3".to_string()]);
    assert_eq!(expansion.candidates.len(), 4);
    assert!(expansion.fresh.iter().all(|id| seen.contains(id)));
    assert_eq!(seen.len(), 4);
}

#[tokio::test]
async fn test_clear_twice_is_a_noop() {
    let mut session = session(FakeProvider::new());
    let created = playlist::get_or_create(&mut session, "Mix").await.unwrap();

    let first = playlist::clear(&mut session).await.unwrap();
    let second = playlist::clear(&mut session).await.unwrap();

    assert_eq!(first.map(|p| p.id), Some(created.id.clone()));
    assert!(second.is_none());
    assert!(!session.store.contains(RecordKey::ActiveRadioPlaylist));
    let unfollows = session
        .provider
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::Unfollow(_)))
        .count();
    assert_eq!(unfollows, 1);
}

#[tokio::test]
async fn test_failed_unfollow_keeps_pointer() {
    let mut session = session(FakeProvider::new());
    playlist::get_or_create(&mut session, "Mix").await.unwrap();
    session.provider.state.lock().unwrap().fail_unfollow = true;

    let result = playlist::clear(&mut session).await;

    assert!(matches!(result, Err(Error::Provider { status: 500, .. })));
    assert!(session.store.contains(RecordKey::ActiveRadioPlaylist));
}

#[tokio::test]
async fn test_append_250_tracks_in_three_batches() {
    let fake = FakeProvider::new();
    fake.add_playlist("pl", "Radio", Vec::new());
    let mut written = SeenTracks::new();

    let sent = playlist::append_batch(&fake, "pl", &ids("t", 250), &mut written)
        .await
        .unwrap();

    assert_eq!(sent.len(), 250);
    assert_eq!(add_batches(&fake.calls()), vec![100, 100, 50]);
}

#[tokio::test]
async fn test_append_skips_tracks_already_written() {
    let fake = FakeProvider::new();
    fake.add_playlist("pl", "Radio", Vec::new());
    let mut written = SeenTracks::new();

    playlist::append_batch(&fake, "pl", &ids("t", 10), &mut written)
        .await
        .unwrap();
    let mut again = ids("t", 15);
    again.push("t3".to_string());
    let sent = playlist::append_batch(&fake, "pl", &again, &mut written)
        .await
        .unwrap();

    assert_eq!(sent, ids("t", 15)[10..].to_vec());
    let members = fake.membership("pl");
    assert_eq!(members.len(), 15);
    assert_unique(&members);
}

#[tokio::test]
async fn test_get_or_create_reuses_tracked_playlist() {
    let mut session = session(FakeProvider::new());

    let first = playlist::get_or_create(&mut session, "My Mix").await.unwrap();
    let second = playlist::get_or_create(&mut session, "Other").await.unwrap();

    assert_eq!(first.name, "My Mix - autoradio");
    assert_eq!(first.public, Some(false));
    assert_eq!(second.id, first.id);
    let stored = session.store.load::<Playlist>().await.unwrap().unwrap();
    assert_eq!(stored.id, first.id);
    let creates: Vec<Call> = session
        .provider
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::CreatePlaylist(_)))
        .collect();
    assert_eq!(creates, vec![Call::CreatePlaylist("My Mix - autoradio".to_string())]);
}

#[tokio::test]
async fn test_unpersisted_playlist_is_rolled_back() {
    let mut session = Session::seeded(USER_ID, FakeProvider::new(), FailingStore, 1);

    let result = playlist::get_or_create(&mut session, "Mix").await;

    assert!(matches!(
        result,
        Err(Error::Persistence {
            key: RecordKey::ActiveRadioPlaylist,
            ..
        })
    ));
    assert!(
        session
            .provider
            .calls()
            .contains(&Call::Unfollow("radio-1".to_string()))
    );
    assert_eq!(session.provider.playlist_count(), 0);
}

#[tokio::test]
async fn test_song_radio_holds_seed_and_99_recommendations() {
    let fake = FakeProvider::with(|state| state.playback = Some(playing("A", None, 0)));
    let mut session = session(fake);

    let summary = radio::start_radio(&mut session, SeedSource::CurrentlyPlaying, no_extra_rounds())
        .await
        .unwrap();

    assert_eq!(summary.tracks, 100);
    let members = session.provider.membership(&summary.playlist.id);
    assert_eq!(members.len(), 100);
    assert_eq!(members[0], "A");
    assert_unique(&members);

    let calls = session.provider.calls();
    assert!(calls.contains(&Call::Recommendations(
        RecommendationSeed::from_track("A".to_string()),
        INITIAL_RECOMMENDATIONS
    )));
    let plays = play_calls(&calls);
    assert_eq!(plays.len(), 1);
    assert_eq!(
        plays[0].context_uri.as_deref(),
        Some(summary.playlist.uri.as_str())
    );
    assert_eq!(plays[0].offset.map(|o| o.position), Some(0));
    assert_eq!(plays[0].position_ms, None);
    assert!(calls.contains(&Call::SetRepeat(RepeatState::Context)));
}

#[tokio::test]
async fn test_radio_resumes_at_song_progress() {
    let fake = FakeProvider::with(|state| state.playback = Some(playing("A", None, 30_000)));
    let mut session = session(fake);

    radio::start_radio(&mut session, SeedSource::CurrentlyPlaying, no_extra_rounds())
        .await
        .unwrap();

    let plays = play_calls(&session.provider.calls());
    assert!(plays[0].position_ms.is_some_and(|ms| ms >= 30_000));
}

#[tokio::test]
async fn test_extra_rounds_fill_radio_to_target() {
    let fake = FakeProvider::with(|state| state.playback = Some(playing("A", None, 0)));
    let mut session = session(fake);

    let summary = radio::start_radio(&mut session, SeedSource::CurrentlyPlaying, RadioOptions::default())
        .await
        .unwrap();

    assert_eq!(summary.tracks, RADIO_TARGET_SIZE);
    let members = session.provider.membership(&summary.playlist.id);
    assert_eq!(members.len(), RADIO_TARGET_SIZE);
    assert_unique(&members);
}

#[tokio::test]
async fn test_new_radio_replaces_previous_one() {
    let fake = FakeProvider::with(|state| state.playback = Some(playing("A", None, 0)));
    let mut session = session(fake);
    let old = playlist::get_or_create(&mut session, "Old").await.unwrap();

    let summary = radio::start_radio(&mut session, SeedSource::CurrentlyPlaying, no_extra_rounds())
        .await
        .unwrap();

    assert_ne!(summary.playlist.id, old.id);
    assert!(session.provider.calls().contains(&Call::Unfollow(old.id)));
    let stored = session.store.load::<Playlist>().await.unwrap().unwrap();
    assert_eq!(stored.id, summary.playlist.id);
    assert_eq!(session.provider.playlist_count(), 1);
}

#[tokio::test]
async fn test_radio_plays_on_saved_device_when_none_is_active() {
    let fake = FakeProvider::with(|state| {
        state.playback = Some(playing("A", None, 0));
        state.no_active_device = true;
    });
    let mut session = session(fake);
    session.store.save(&device("dev-42")).await.unwrap();

    radio::start_radio(&mut session, SeedSource::CurrentlyPlaying, no_extra_rounds())
        .await
        .unwrap();

    let plays = play_calls(&session.provider.calls());
    assert_eq!(plays.len(), 2);
    assert_eq!(plays[0].device_id, None);
    assert_eq!(plays[1].device_id.as_deref(), Some("dev-42"));
}

#[tokio::test]
async fn test_refill_ignores_idle_and_foreign_playback() {
    let fake = FakeProvider::new();
    let radio_playlist = fake.add_playlist("radio", "Mix - autoradio", ids("r", 10));
    let mut session = session(fake);
    session.store.save(&radio_playlist).await.unwrap();

    assert_eq!(radio::refill(&mut session).await.unwrap(), RefillOutcome::Idle);

    session.provider.state.lock().unwrap().playback =
        Some(playing("r3", Some("spotify:playlist:other"), 0));
    assert_eq!(radio::refill(&mut session).await.unwrap(), RefillOutcome::NotRadio);
    assert_eq!(session.provider.membership("radio").len(), 10);
}

#[tokio::test]
async fn test_refill_trims_played_tracks_and_tops_up() {
    let fake = FakeProvider::new();
    let radio_playlist = fake.add_playlist("radio", "Mix - autoradio", ids("r", 500));
    fake.state.lock().unwrap().playback = Some(playing("r499", Some(&radio_playlist.uri), 0));
    let mut session = session(fake);
    session.store.save(&radio_playlist).await.unwrap();

    let outcome = radio::refill(&mut session).await.unwrap();

    assert_eq!(
        outcome,
        RefillOutcome::Refilled {
            removed: 499,
            added: 499
        }
    );
    let members = session.provider.membership("radio");
    assert_eq!(members.len(), RADIO_TARGET_SIZE);
    assert_eq!(members[0], "r499");
    assert_unique(&members);

    let calls = session.provider.calls();
    let removals: Vec<usize> = calls
        .iter()
        .filter_map(|c| match c {
            Call::RemoveTracks(_, ids) => Some(ids.len()),
            _ => None,
        })
        .collect();
    assert_eq!(removals, vec![100, 100, 100, 100, 99]);
    assert!(calls.contains(&Call::SetRepeat(RepeatState::Context)));
}

#[tokio::test]
async fn test_refill_scan_stops_when_current_track_is_missing() {
    let fake = FakeProvider::new();
    let radio_playlist = fake.add_playlist("radio", "Mix - autoradio", ids("r", 500));
    fake.state.lock().unwrap().playback = Some(playing("ghost", Some(&radio_playlist.uri), 0));
    let mut session = session(fake);
    session.store.save(&radio_playlist).await.unwrap();

    let outcome = radio::refill(&mut session).await.unwrap();

    assert_eq!(outcome, RefillOutcome::Refilled { removed: 0, added: 0 });
    let calls = session.provider.calls();
    let scanned: Vec<u32> = calls
        .iter()
        .filter_map(|c| match c {
            Call::PlaylistItems(_, offset) => Some(*offset),
            _ => None,
        })
        .collect();
    assert_eq!(scanned, (0..10).map(|page| page * 50).collect::<Vec<u32>>());
    assert!(!calls.iter().any(|c| matches!(c, Call::RemoveTracks(..))));
    assert_eq!(session.provider.membership("radio").len(), 500);
}

#[tokio::test]
async fn test_refill_stops_when_recommendations_run_dry() {
    let fake = FakeProvider::with(|state| {
        state.recommendations = Recommendations::Fixed(
            ["x1", "x2", "x3"].iter().map(|s| s.to_string()).collect(),
        );
    });
    let radio_playlist = fake.add_playlist("radio", "Mix - autoradio", ids("r", 10));
    fake.state.lock().unwrap().playback = Some(playing("r0", Some(&radio_playlist.uri), 0));
    let mut session = session(fake);
    session.store.save(&radio_playlist).await.unwrap();

    let outcome = radio::refill(&mut session).await.unwrap();

    assert_eq!(outcome, RefillOutcome::Refilled { removed: 0, added: 3 });
    let recommendation_calls = session
        .provider
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::Recommendations(..)))
        .count();
    assert_eq!(recommendation_calls, 2);
    assert_eq!(session.provider.membership("radio").len(), 13);
}

#[tokio::test]
async fn test_saved_songs_radio_loads_five_pages() {
    let fake = FakeProvider::with(|state| {
        state.saved = ids("s", 300).iter().map(|id| track(id)).collect();
    });
    let mut session = session(fake);

    let summary = radio::play_saved_tracks(&mut session, 10).await.unwrap();

    assert_eq!(summary.playlist.name, "Saved Songs - autoradio");
    assert_eq!(summary.tracks, 250);
    let members = session.provider.membership(&summary.playlist.id);
    assert_eq!(members.first().map(String::as_str), Some("s10"));
    assert_eq!(play_calls(&session.provider.calls()).len(), 1);
}
