use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use parking_lot::Mutex;
use pollcast::domain::music::{self, CurrentlyPlaying, Track};
use pollcast::{
    Bus, Event, EventKind, Observe, PollerConfig, Precacher, Producer, ProducerError, ProducerFn,
    Streamer, StreamerConfig, Telemetry,
};
use tokio::time;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct Recorder(Mutex<Vec<EventKind>>);

#[async_trait]
impl Observe for Recorder {
    async fn on_event(&self, ev: &Event) {
        self.0.lock().push(ev.kind);
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}

fn interval(ms: u64) -> PollerConfig {
    let mut cfg = PollerConfig::named("it");
    cfg.interval = Duration::from_millis(ms);
    cfg
}

fn playing(track: &str, playing: bool) -> CurrentlyPlaying {
    CurrentlyPlaying {
        timestamp: SystemTime::now(),
        track: Track {
            id: track.into(),
            uri: String::new(),
            external_url: String::new(),
            name: track.into(),
            duration: Duration::from_secs(180),
            album: None,
            artists: Vec::new(),
        },
        progress: Duration::ZERO,
        playing,
    }
}

#[tokio::test(start_paused = true)]
async fn latency_inversion_settles_without_deadlock() -> anyhow::Result<()> {
    // Cycle 1 takes 500ms, cycle 2 takes 10ms: 2 lands first, 1 overwrites it.
    let calls = Arc::new(AtomicU64::new(0));
    let producer = ProducerFn::arc("inverted", move || {
        let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
        async move {
            let delay = if n == 1 { 500 } else { 10 };
            time::sleep(Duration::from_millis(delay)).await;
            Ok::<_, ProducerError>((n <= 2).then_some(n))
        }
    });

    let cache = Precacher::builder(producer).config(interval(100)).spawn()?;
    time::sleep(Duration::from_secs(1)).await;

    let entry = cache.results()?;
    let value = entry.get().copied();
    assert!(matches!(value, Some(1) | Some(2)), "got {value:?}");
    assert!(entry.error.is_none());
    cache.stop();
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn fan_out_reaches_every_subscriber_in_the_same_order() -> anyhow::Result<()> {
    let calls = Arc::new(AtomicU64::new(0));
    // The short delay lets every subscriber register before cycle 1 lands.
    let producer = ProducerFn::arc("counter", move || {
        let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
        async move {
            time::sleep(Duration::from_millis(5)).await;
            Ok::<_, ProducerError>(Some(n))
        }
    });

    let mut cfg = StreamerConfig::default();
    cfg.poller.interval = Duration::from_millis(50);
    cfg.sink_capacity = 16;
    let streamer = Streamer::builder(producer).config(cfg).spawn()?;

    let token = CancellationToken::new();
    let mut receivers = Vec::new();
    for _ in 0..4 {
        receivers.push(streamer.subscribe(token.clone()).await);
    }
    assert_eq!(streamer.subscriber_count().await, 4);

    time::sleep(Duration::from_millis(500)).await;
    streamer.stop().await;

    let mut seen: Vec<Vec<u64>> = Vec::new();
    for rx in &mut receivers {
        let mut cycles = Vec::new();
        while let Some(result) = rx.recv().await {
            cycles.push(result.cycle);
        }
        seen.push(cycles);
    }
    assert!(!seen[0].is_empty());
    assert!(seen.iter().all(|s| *s == seen[0]));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn cancelled_subscriber_gets_nothing_more() -> anyhow::Result<()> {
    let producer = ProducerFn::arc("tick", || async { Ok::<_, ProducerError>(Some(())) });
    let mut cfg = StreamerConfig::default();
    cfg.poller.interval = Duration::from_millis(50);
    cfg.sink_capacity = 64;
    let streamer = Streamer::builder(producer).config(cfg).spawn()?;

    let leaving = CancellationToken::new();
    let staying = CancellationToken::new();
    let mut gone = streamer.subscribe(leaving.clone()).await;
    let mut kept = streamer.subscribe(staying.clone()).await;

    gone.recv().await.expect("first delivery");
    leaving.cancel();
    time::sleep(Duration::from_millis(300)).await;

    let mut after_cancel = 0;
    while gone.recv().await.is_some() {
        after_cancel += 1;
    }
    assert!(after_cancel <= 1, "at most one delivery already in the buffer");
    assert!(kept.recv().await.is_some());
    assert_eq!(streamer.subscriber_count().await, 1);

    streamer.stop().await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn stop_with_invocation_in_flight_drops_result() -> anyhow::Result<()> {
    let rec = Arc::new(Recorder::default());
    let telemetry = Telemetry::builder().observer(rec.clone()).build();

    let producer = ProducerFn::arc("slow", || async {
        time::sleep(Duration::from_secs(2)).await;
        Ok::<_, ProducerError>(Some("late"))
    });
    let cache = Precacher::builder(producer)
        .config(interval(60_000))
        .bus(telemetry.bus())
        .initial("seed")
        .spawn()?;

    time::sleep(Duration::from_millis(100)).await;
    cache.stop();
    time::sleep(Duration::from_secs(3)).await;

    assert_eq!(cache.latest().as_deref(), Some(&"seed"));
    telemetry.shutdown().await;

    let kinds = rec.0.lock().clone();
    assert!(kinds.contains(&EventKind::PollerStopped));
    assert!(kinds.contains(&EventKind::ResultDropped));
    assert!(!kinds.contains(&EventKind::CacheStored));
    Ok(())
}

/// Replays `items` (5ms each), then reports nothing playing.
fn script(items: Vec<Option<CurrentlyPlaying>>) -> Arc<impl Producer<Value = CurrentlyPlaying>> {
    let queue = Arc::new(Mutex::new(VecDeque::from(items)));
    ProducerFn::arc("now-playing", move || {
        let next = queue.lock().pop_front().flatten();
        async move {
            time::sleep(Duration::from_millis(5)).await;
            Ok::<_, ProducerError>(next)
        }
    })
}

#[tokio::test(start_paused = true)]
async fn session_stream_reports_only_transitions() -> anyhow::Result<()> {
    let producer = script(vec![
        Some(playing("A", true)),
        Some(playing("A", false)),
        Some(playing("A", false)),
        None,
        None,
        Some(playing("A", true)),
    ]);
    let mut cfg = StreamerConfig::default();
    cfg.poller.interval = Duration::from_millis(100);
    cfg.sink_capacity = 8;
    let streamer = Streamer::builder(producer)
        .config(cfg)
        .bus(Bus::new(256))
        .spawn()?;

    let token = CancellationToken::new();
    let mut rx = streamer
        .subscribe_filtered(token.clone(), music::session_filter())
        .await;

    let mut sessions = Vec::new();
    for _ in 0..4 {
        let result = rx.recv().await.expect("transition");
        sessions.push(music::session_of(result.get()));
    }
    use pollcast::Session::*;
    assert_eq!(sessions, vec![Playing, Paused, Stopped, Playing]);

    token.cancel();
    streamer.stop().await;
    Ok(())
}
