//! Playlist mutation and pointer bookkeeping.

mod common;

use common::*;
use core_library::lyrics::RawLyric;
use core_library::models::{LyricLine, RollMode};
use core_library::LibraryError;
use core_playback::BackendCall;
use core_runtime::events::PlaylistEvent;
use core_runtime::PlayerConfig;
use core_service::CoreError;

#[tokio::test]
async fn mutations_bump_the_list_version() {
    let mut h = harness();

    h.core.append(song(1));
    h.core.append_range(songs(2..4));
    h.core.insert(song(9), 1).unwrap();
    h.core.insert_next(song(8));

    assert_eq!(h.core.len(), 5);
    assert_eq!(h.core.list_version(), 4);
    assert_eq!(
        playlist_events(&mut h.events),
        (1..=4)
            .map(|version| PlaylistEvent::ListChanged { version })
            .collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn insert_past_the_end_is_a_caller_error() {
    let h = harness();
    h.core.append(song(1));

    let err = h.core.insert(song(2), 5).unwrap_err();
    assert!(matches!(err, CoreError::IndexOutOfRange { index: 5, len: 1 }));
    assert!(err.is_contract_violation());
    assert_eq!(h.core.len(), 1);

    h.core.insert(song(2), 1).unwrap();
    assert_eq!(h.core.playlist()[1], song(2));
}

#[tokio::test]
async fn insert_before_pointer_keeps_the_selection() {
    let h = harness();
    h.core.append_range(songs(0..3));
    h.core.move_to(1);

    h.core.insert_range(songs(10..12), 0).unwrap();

    assert_eq!(h.core.current_index(), Some(3));
    assert_eq!(h.core.playlist()[3], song(1));
    assert_eq!(h.core.now_playing(), Some(song(1)));

    h.core.insert(song(20), 4).unwrap();
    assert_eq!(h.core.current_index(), Some(3));
}

#[tokio::test]
async fn insert_next_lands_at_the_pointer() {
    let h = harness();
    h.core.insert_next(song(1));
    assert_eq!(h.core.playlist(), vec![song(1)]);

    h.core.append_range(songs(2..4));
    h.core.move_to(2);
    h.core.insert_next(song(9));

    assert_eq!(h.core.playlist()[2], song(9));
    assert_eq!(h.core.current_index(), Some(3));
    assert_eq!(h.core.now_playing(), Some(song(3)));
}

#[tokio::test]
async fn move_next_skips_a_song_inserted_next() {
    let h = harness();
    h.core.append_range(songs(0..4));
    h.core.move_to(1);

    h.core.insert_next(song(9));
    h.core.move_next().await.unwrap();

    assert_eq!(h.core.playlist()[1], song(9));
    assert_eq!(h.core.current_index(), Some(3));
    assert_eq!(h.core.now_playing(), Some(song(2)));
}

#[tokio::test]
async fn removing_below_the_pointer_follows_the_song() {
    let mut h = harness();
    h.core.append_range(songs(0..5));
    h.core.move_to(3);
    h.events.drain();

    h.core.remove_at(1).await.unwrap();

    assert_eq!(h.core.current_index(), Some(2));
    assert_eq!(h.core.playlist()[2], song(3));
    assert_eq!(h.core.now_playing(), Some(song(3)));
    let events = playlist_events(&mut h.events);
    assert!(matches!(events.as_slice(), [PlaylistEvent::ListChanged { .. }]));
}

#[tokio::test]
async fn removing_above_the_pointer_is_plain() {
    let h = harness();
    h.core.append_range(songs(0..3));
    h.core.move_to(0);

    h.core.remove_at(2).await.unwrap();

    assert_eq!(h.core.current_index(), Some(0));
    assert_eq!(h.core.len(), 2);
    assert!(h.backend.history().is_empty());
}

#[tokio::test]
async fn removing_the_current_song_selects_and_loads_its_successor() {
    let mut h = harness();
    h.core.append_range(songs(0..3));
    h.core.move_to(1);
    h.events.drain();

    h.core.remove_at(1).await.unwrap();

    assert_eq!(h.core.current_index(), Some(1));
    assert_eq!(h.core.now_playing(), Some(song(2)));
    let events = playlist_events(&mut h.events);
    assert!(matches!(events[0], PlaylistEvent::ListChanged { .. }));
    assert_eq!(
        events[1],
        PlaylistEvent::ItemChanged {
            new: Some(song(2)),
            old: Some(song(1)),
        }
    );
    assert_eq!(h.provider.media_calls(), vec!["sg2".to_string()]);
    assert_eq!(
        h.backend.history(),
        vec![BackendCall::Load(Some("file:sg2.mp3".to_string()))]
    );
}

#[tokio::test]
async fn removing_the_current_last_song_wraps_to_the_head() {
    let h = harness();
    h.core.append_range(songs(0..3));
    h.core.move_to(2);

    h.core.remove_at(2).await.unwrap();

    assert_eq!(h.core.current_index(), Some(0));
    assert_eq!(h.core.now_playing(), Some(song(0)));
}

#[tokio::test]
async fn removing_the_only_song_clears_and_stops() {
    let mut h = harness();
    h.core.append(song(1));
    h.core.move_to(0);
    h.events.drain();

    h.core.remove_at(0).await.unwrap();

    assert!(h.core.is_empty());
    assert_eq!(h.core.current_index(), None);
    assert_eq!(h.core.now_playing(), None);
    let events = playlist_events(&mut h.events);
    assert!(matches!(events.as_slice(), [PlaylistEvent::ListCleared { .. }]));
    assert_eq!(h.backend.history(), vec![BackendCall::Stop]);
}

#[tokio::test]
async fn stale_removes_are_ignored() {
    let mut h = harness();
    h.core.append_range(songs(0..2));
    h.events.drain();

    h.core.remove_at(2).await.unwrap();
    h.core.remove_at(usize::MAX).await.unwrap();

    assert_eq!(h.core.len(), 2);
    assert!(playlist_events(&mut h.events).is_empty());
}

#[tokio::test]
async fn clear_resets_selection_and_publishes_cleared() {
    let mut h = harness();
    h.core.append_range(songs(0..3));
    h.core.move_to(1);
    h.events.drain();

    h.core.clear();

    assert!(h.core.is_empty());
    assert_eq!(h.core.current_index(), None);
    assert_eq!(h.core.now_playing(), None);
    assert_eq!(
        playlist_events(&mut h.events),
        vec![PlaylistEvent::ListCleared { version: 2 }]
    );
}

#[tokio::test]
async fn move_to_publishes_previous_and_new() {
    let mut h = harness();
    h.core.append_range(songs(0..3));
    h.events.drain();

    assert!(h.core.move_to(0));
    assert!(h.core.move_to(2));
    assert!(!h.core.move_to(3));

    assert_eq!(
        playlist_events(&mut h.events),
        vec![
            PlaylistEvent::ItemChanged {
                new: Some(song(0)),
                old: None,
            },
            PlaylistEvent::ItemChanged {
                new: Some(song(2)),
                old: Some(song(0)),
            },
        ]
    );
    assert_eq!(h.core.current_index(), Some(2));
}

#[tokio::test]
async fn move_previous_wraps_around() {
    let h = harness();
    h.core.move_previous();
    assert_eq!(h.core.current_index(), None);

    h.core.append_range(songs(0..3));
    h.core.move_previous();
    assert_eq!(h.core.current_index(), Some(2));
    h.core.move_previous();
    assert_eq!(h.core.current_index(), Some(1));
    h.core.move_to(0);
    h.core.move_previous();
    assert_eq!(h.core.current_index(), Some(2));
}

#[tokio::test]
async fn next_pointer_follows_the_roll_mode() {
    let h = harness();
    assert_eq!(h.core.next_pointer(), None);

    h.core.append_range(songs(0..5));
    h.core.move_to(4);
    assert_eq!(h.core.next_pointer(), Some(0));

    h.core.set_roll_mode(RollMode::SinglePlay);
    assert_eq!(h.core.next_pointer(), Some(4));

    h.core.set_roll_mode(RollMode::Shuffled);
    for _ in 0..50 {
        let next = h.core.next_pointer().unwrap();
        assert!(next < 4);
    }
}

#[tokio::test]
async fn unknown_roll_mode_code_is_rejected() {
    let h = harness_with(
        FakeProvider::new(),
        PlayerConfig::default().with_default_roll_mode(RollMode::Shuffled),
    );
    assert_eq!(h.core.roll_mode(), RollMode::Shuffled);

    h.core.set_roll_mode_code(1).unwrap();
    assert_eq!(h.core.roll_mode(), RollMode::SinglePlay);

    let err = h.core.set_roll_mode_code(7).unwrap_err();
    assert!(err.is_contract_violation());
    assert_eq!(h.core.roll_mode(), RollMode::SinglePlay);
}

#[tokio::test]
async fn preconditions_are_reported() {
    let h = harness();
    assert!(matches!(
        h.core.load_now_playing().await,
        Err(CoreError::NothingSelected)
    ));
    assert!(matches!(
        h.core.load_from_source().await,
        Err(CoreError::NoSourceBound)
    ));
    assert!(matches!(
        h.core.load_lyrics().await,
        Err(CoreError::NothingSelected)
    ));
}

#[tokio::test]
async fn unregistered_provider_surfaces_to_the_caller() {
    let h = harness();
    let mut stranger = song(1);
    stranger.id = core_library::models::ItemId::parse("xyzsg1").unwrap();
    h.core.append(stranger);
    h.core.move_to(0);

    let err = h.core.load_now_playing().await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::Library(LibraryError::ProviderNotRegistered(ref id)) if id == "xyz"
    ));
}

// ============================================================================
// Lyrics
// ============================================================================

#[tokio::test]
async fn lyrics_publish_loading_then_result() {
    let target = song(1);
    let provider = FakeProvider::new().with_lyric(&target, RawLyric::Instrumental);
    let mut h = harness_with(provider, PlayerConfig::default());
    h.core.append(target);
    h.core.move_to(0);
    h.events.drain();

    let lines = h.core.load_lyrics().await.unwrap();

    assert_eq!(lines, vec![LyricLine::instrumental()]);
    assert_eq!(h.core.lyrics(), lines);
    assert_eq!(
        playlist_events(&mut h.events),
        vec![
            PlaylistEvent::LyricsChanged {
                lines: vec![LyricLine::loading()]
            },
            PlaylistEvent::LyricsChanged {
                lines: vec![LyricLine::instrumental()]
            },
        ]
    );
}

#[tokio::test]
async fn missing_lyrics_yield_the_no_lyric_sentinel() {
    let h = harness();
    h.core.append(song(1));
    h.core.move_to(0);

    assert_eq!(
        h.core.load_lyrics().await.unwrap(),
        vec![LyricLine::no_lyric()]
    );
}

#[tokio::test]
async fn translations_are_merged_when_the_provider_has_them() {
    let target = song(1);
    let base = FakeProvider::new().with_lyric(
        &target,
        RawLyric::Text("[00:01.00]Hello\n[00:03.50]World".to_string()),
    );
    let provider = TranslatingFake::new(base)
        .with_translation(&target, RawLyric::Text("[00:01.00]Bonjour".to_string()));

    let h = harness();
    h.core.register_provider(std::sync::Arc::new(provider));
    h.core.append(target);
    h.core.move_to(0);

    let lines = h.core.load_lyrics().await.unwrap();

    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].text, "Hello");
    assert_eq!(lines[0].translation.as_deref(), Some("Bonjour"));
    assert!(lines[0].has_translation);
    assert!(!lines[1].has_translation);
}
