//! Transport-control adapter against a recording surface and a mockall mock.

mod common;

use async_trait::async_trait;
use bridge_traits::transport::{
    NowPlayingMetadata, TimelineProperties, TransportButton, TransportControlSurface,
    TransportRequest, TransportStatus,
};
use bridge_traits::error::Result as BridgeResult;
use bytes::Bytes;
use common::*;
use core_library::models::{Album, Container, ItemId, Song, SourceKind};
use core_playback::BackendCall;
use core_runtime::events::{CoreEvent, PlaybackEvent, PlaylistEvent};
use core_runtime::PlayerConfig;
use core_service::{CoreError, TransportControlAdapter};
use mockall::mock;
use mockall::predicate::eq;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq)]
enum SurfaceCall {
    Buttons(Vec<TransportButton>),
    Metadata(NowPlayingMetadata),
    Thumbnail(Bytes),
    Timeline(TimelineProperties),
    Status(TransportStatus),
}

#[derive(Default)]
struct RecordingSurface {
    calls: Mutex<Vec<SurfaceCall>>,
}

impl RecordingSurface {
    fn calls(&self) -> Vec<SurfaceCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: SurfaceCall) -> bridge_traits::error::Result<()> {
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

#[async_trait]
impl TransportControlSurface for RecordingSurface {
    async fn set_enabled_buttons(
        &self,
        buttons: Vec<TransportButton>,
    ) -> bridge_traits::error::Result<()> {
        self.record(SurfaceCall::Buttons(buttons))
    }

    async fn update_metadata(
        &self,
        metadata: NowPlayingMetadata,
    ) -> bridge_traits::error::Result<()> {
        self.record(SurfaceCall::Metadata(metadata))
    }

    async fn update_thumbnail(&self, image: Bytes) -> bridge_traits::error::Result<()> {
        self.record(SurfaceCall::Thumbnail(image))
    }

    async fn update_timeline(
        &self,
        timeline: TimelineProperties,
    ) -> bridge_traits::error::Result<()> {
        self.record(SurfaceCall::Timeline(timeline))
    }

    async fn set_playback_status(
        &self,
        status: TransportStatus,
    ) -> bridge_traits::error::Result<()> {
        self.record(SurfaceCall::Status(status))
    }
}

mock! {
    Surface {}

    #[async_trait]
    impl TransportControlSurface for Surface {
        async fn set_enabled_buttons(&self, buttons: Vec<TransportButton>) -> BridgeResult<()>;
        async fn update_metadata(&self, metadata: NowPlayingMetadata) -> BridgeResult<()>;
        async fn update_thumbnail(&self, image: Bytes) -> BridgeResult<()>;
        async fn update_timeline(&self, timeline: TimelineProperties) -> BridgeResult<()>;
        async fn set_playback_status(&self, status: TransportStatus) -> BridgeResult<()>;
    }
}

fn adapter_with(
    config: PlayerConfig,
) -> (Arc<TransportControlAdapter>, Arc<RecordingSurface>, Harness) {
    let h = harness_with(FakeProvider::new(), config);
    let surface = Arc::new(RecordingSurface::default());
    let adapter = Arc::new(TransportControlAdapter::new(
        Arc::clone(&h.core),
        surface.clone(),
    ));
    (adapter, surface, h)
}

fn adapter() -> (Arc<TransportControlAdapter>, Arc<RecordingSurface>, Harness) {
    adapter_with(PlayerConfig::default())
}

fn item_changed(song: Song) -> CoreEvent {
    CoreEvent::Playlist(PlaylistEvent::ItemChanged {
        new: Some(song),
        old: None,
    })
}

// ============================================================================
// Outbound
// ============================================================================

#[tokio::test]
async fn item_change_pushes_metadata_timeline_and_cover() {
    let (adapter, surface, _h) = adapter();

    adapter.mirror(&item_changed(song(1))).await.unwrap();

    let calls = surface.calls();
    assert_eq!(calls[0], SurfaceCall::Buttons(TransportButton::ALL.to_vec()));
    assert_eq!(
        calls[1],
        SurfaceCall::Metadata(NowPlayingMetadata {
            title: "Song 1".to_string(),
            artist: "Alice / Bob".to_string(),
            album_title: "First Album".to_string(),
            duration: Duration::from_secs(201),
        })
    );
    assert_eq!(
        calls[2],
        SurfaceCall::Timeline(TimelineProperties::spanning(Duration::from_secs(201)))
    );

    let cover = SurfaceCall::Thumbnail(Bytes::from_static(b"\x89PNG-cover"));
    let recorder = surface.clone();
    assert!(eventually(|| recorder.calls().contains(&cover)).await);
}

#[tokio::test]
async fn missing_cover_is_not_an_error() {
    let (adapter, surface, _h) = adapter();
    let bare_album = Album::new(Container::new(
        ItemId::from_parts(PROVIDER, "al", "2").unwrap(),
        "No Art",
        SourceKind::Linear,
    ));
    let mut plain = song(3);
    plain.album = Arc::new(bare_album);

    adapter.mirror(&item_changed(plain)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(!surface
        .calls()
        .iter()
        .any(|call| matches!(call, SurfaceCall::Thumbnail(_))));
}

#[tokio::test]
async fn playback_status_is_mirrored() {
    let (adapter, surface, _h) = adapter();

    for event in [
        PlaybackEvent::Playing,
        PlaybackEvent::Paused,
        PlaybackEvent::Stopped,
    ] {
        adapter.mirror(&CoreEvent::Playback(event)).await.unwrap();
    }

    assert_eq!(
        surface.calls(),
        vec![
            SurfaceCall::Status(TransportStatus::Playing),
            SurfaceCall::Status(TransportStatus::Paused),
            SurfaceCall::Status(TransportStatus::Stopped),
        ]
    );
}

#[tokio::test]
async fn position_sync_is_opt_in() {
    let position = CoreEvent::Playback(PlaybackEvent::PositionChanged {
        position_ms: 30_000,
        duration_ms: 200_000,
    });

    let (adapter, surface, _h) = adapter();
    adapter.mirror(&position).await.unwrap();
    assert!(surface.calls().is_empty());

    let (adapter, surface, _h) =
        adapter_with(PlayerConfig::default().with_sync_transport_position(true));
    adapter.mirror(&position).await.unwrap();
    assert_eq!(
        surface.calls(),
        vec![SurfaceCall::Timeline(
            TimelineProperties::spanning(Duration::from_secs(200))
                .with_position(Duration::from_secs(30))
        )]
    );
}

#[tokio::test]
async fn list_cleared_tears_down_the_surface() {
    let (adapter, surface, _h) = adapter();
    adapter
        .mirror(&CoreEvent::Playlist(PlaylistEvent::ListCleared { version: 3 }))
        .await
        .unwrap();

    assert_eq!(
        surface.calls(),
        vec![
            SurfaceCall::Buttons(Vec::new()),
            SurfaceCall::Status(TransportStatus::Stopped),
        ]
    );
}

#[tokio::test]
async fn disabled_sync_is_inert() {
    let (adapter, surface, _h) = adapter_with(PlayerConfig::default().with_sync_transport(false));

    assert!(adapter.spawn_event_pump().is_none());
    adapter.mirror(&item_changed(song(1))).await.unwrap();
    adapter
        .mirror(&CoreEvent::Playback(PlaybackEvent::Playing))
        .await
        .unwrap();

    assert!(surface.calls().is_empty());
}

#[tokio::test]
async fn event_pump_follows_the_core() {
    let (adapter, surface, h) = adapter();
    let _pump = adapter.spawn_event_pump().unwrap();

    h.core.append_range(songs(0..2));
    h.core.move_to_and_play(1).await.unwrap();

    let recorder = surface.clone();
    assert!(
        eventually(|| {
            let calls = recorder.calls();
            calls.iter().any(|c| matches!(c, SurfaceCall::Metadata(m) if m.title == "Song 1"))
                && calls.contains(&SurfaceCall::Status(TransportStatus::Playing))
        })
        .await
    );
}

#[tokio::test]
async fn mock_surface_receives_status() {
    let h = harness();
    let mut surface = MockSurface::new();
    surface
        .expect_set_playback_status()
        .with(eq(TransportStatus::Paused))
        .times(1)
        .returning(|_| Ok(()));

    let adapter = TransportControlAdapter::new(Arc::clone(&h.core), Arc::new(surface));
    adapter
        .mirror(&CoreEvent::Playback(PlaybackEvent::Paused))
        .await
        .unwrap();
}

#[tokio::test]
async fn surface_errors_propagate_from_mirror() {
    let h = harness();
    let mut surface = MockSurface::new();
    surface.expect_set_playback_status().returning(|_| {
        Err(bridge_traits::BridgeError::OperationFailed(
            "surface gone".to_string(),
        ))
    });

    let adapter = TransportControlAdapter::new(Arc::clone(&h.core), Arc::new(surface));
    let err = adapter
        .mirror(&CoreEvent::Playback(PlaybackEvent::Playing))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Bridge(_)));
    assert!(!err.is_contract_violation());
}

// ============================================================================
// Inbound
// ============================================================================

#[tokio::test]
async fn every_button_reaches_the_core() {
    let (adapter, _surface, h) = adapter();
    h.core.append_range(songs(0..3));
    h.core.move_to(0);
    h.core.load_now_playing().await.unwrap();
    h.backend.clear_history();

    for button in [TransportButton::Play, TransportButton::Pause, TransportButton::Stop] {
        adapter
            .handle_request(TransportRequest::button(button))
            .await
            .unwrap();
    }
    assert_eq!(
        h.backend.history(),
        vec![BackendCall::Play, BackendCall::Pause, BackendCall::Stop]
    );

    adapter
        .handle_request(TransportRequest::button(TransportButton::Next))
        .await
        .unwrap();
    assert_eq!(h.core.current_index(), Some(1));

    adapter
        .handle_request(TransportRequest::Button("Previous".to_string()))
        .await
        .unwrap();
    assert_eq!(h.core.current_index(), Some(0));
    assert_eq!(h.backend.history().last(), Some(&BackendCall::Play));

    adapter
        .handle_request(TransportRequest::Seek(Duration::from_secs(12)))
        .await
        .unwrap();
    assert_eq!(
        h.backend.history().last(),
        Some(&BackendCall::Seek(Duration::from_secs(12)))
    );
}

#[tokio::test]
async fn unknown_button_is_a_contract_violation() {
    let (adapter, _surface, _h) = adapter();

    let err = adapter
        .handle_request(TransportRequest::Button("record".to_string()))
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::UnrecognizedButton(ref name) if name == "record"));
    assert!(err.is_contract_violation());
}

#[tokio::test]
async fn run_stops_at_the_first_unmodeled_request() {
    let (adapter, _surface, h) = adapter();
    h.core.append(song(0));
    h.core.move_to(0);
    h.core.load_now_playing().await.unwrap();
    h.backend.clear_history();

    let (tx, rx) = mpsc::channel(8);
    tx.send(TransportRequest::button(TransportButton::Play)).await.unwrap();
    tx.send(TransportRequest::Seek(Duration::from_secs(5))).await.unwrap();
    tx.send(TransportRequest::Button("rewind".to_string())).await.unwrap();
    tx.send(TransportRequest::button(TransportButton::Pause)).await.unwrap();
    drop(tx);

    let err = adapter.run(rx).await.unwrap_err();

    assert!(matches!(err, CoreError::UnrecognizedButton(_)));
    assert_eq!(
        h.backend.history(),
        vec![BackendCall::Play, BackendCall::Seek(Duration::from_secs(5))]
    );
}

#[tokio::test]
async fn run_survives_ordinary_failures() {
    let (adapter, _surface, h) = adapter();
    let (tx, rx) = mpsc::channel(4);
    tx.send(TransportRequest::button(TransportButton::Next)).await.unwrap();
    tx.send(TransportRequest::button(TransportButton::Play)).await.unwrap();
    drop(tx);

    adapter.run(rx).await.unwrap();

    assert_eq!(h.backend.history().last(), Some(&BackendCall::Play));
}
