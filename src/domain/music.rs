//! # Currently-playing music.
//!
//! Model of a "now playing" snapshot plus the predicates used to decide which
//! snapshots are worth pushing to live subscribers.
//!
//! ## Filters
//! - [`playback_filter`]: forwards when the play flag, progress or track changes;
//!   `timestamp` is ignored.
//! - [`session_filter`]: tri-state; repeated "paused" or "nothing playing" polls
//!   collapse into one notification.
//!
//! ## Stream events
//! [`NowPlayingEvents`] turns a raw result stream into client-facing events:
//! ```text
//! error                               → Error
//! nothing → nothing                   → (skip)
//! appear / disappear / play flag /
//!   track change                      → NowPlaying(snapshot)
//! same track, still playing           → Progress(progress)
//! same track, still paused            → (skip)
//! ```

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::{
    error::ProducerError,
    filters::{ChangeFilter, Continuity, SameBy, Session},
    producers::PollResult,
};

/// A performer credited on a track or album.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artist {
    /// Upstream identifier.
    pub id: String,
    /// Player-native URI.
    pub uri: String,
    /// Public web link.
    pub external_url: String,
    /// Display name.
    pub name: String,
}

/// Cover art; dimensions are in pixels when the upstream reports them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    /// Where the image is served from.
    pub url: String,
    /// Width, if known.
    pub width: Option<u32>,
    /// Height, if known.
    pub height: Option<u32>,
}

/// A release a track belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Album {
    /// Upstream identifier.
    pub id: String,
    /// Player-native URI.
    pub uri: String,
    /// Public web link.
    pub external_url: String,
    /// Display title.
    pub name: String,
    /// Cover art, largest first.
    pub images: Vec<Image>,
    /// Album-level credits.
    pub artists: Vec<Artist>,
}

/// A unit of playable music.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    /// Upstream identifier; the only field the playback filter compares.
    pub id: String,
    /// Player-native URI.
    pub uri: String,
    /// Public web link.
    pub external_url: String,
    /// Display title.
    pub name: String,
    /// Full length of the track.
    pub duration: Duration,
    /// Release the track belongs to, if known.
    pub album: Option<Album>,
    /// Track-level credits.
    pub artists: Vec<Artist>,
}

/// What is playing right now, as reported by the upstream player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentlyPlaying {
    /// When the upstream produced this snapshot. Changes on every poll.
    pub timestamp: SystemTime,
    /// The track loaded in the player.
    pub track: Track,
    /// Position within `track`.
    pub progress: Duration,
    /// `false` while paused.
    pub playing: bool,
}

/// Equal on play flag, progress and track identity.
pub fn same_playback(a: &CurrentlyPlaying, b: &CurrentlyPlaying) -> bool {
    a.playing == b.playing && a.progress == b.progress && a.track.id == b.track.id
}

/// Classifies a snapshot; no snapshot means nothing is playing.
pub fn session_of(current: Option<&CurrentlyPlaying>) -> Session {
    match current {
        None => Session::Stopped,
        Some(c) if c.playing => Session::Playing,
        Some(_) => Session::Paused,
    }
}

/// Return type of [`playback_filter`].
pub type PlaybackFilter =
    ChangeFilter<CurrentlyPlaying, SameBy<fn(&CurrentlyPlaying, &CurrentlyPlaying) -> bool>>;

/// Return type of [`session_filter`].
pub type SessionFilter =
    ChangeFilter<CurrentlyPlaying, Continuity<fn(Option<&CurrentlyPlaying>) -> Session>>;

/// Equality filter over [`same_playback`].
pub fn playback_filter() -> PlaybackFilter {
    let same: fn(&CurrentlyPlaying, &CurrentlyPlaying) -> bool = same_playback;
    ChangeFilter::new(SameBy::new(same))
}

/// Tri-state filter over [`session_of`].
pub fn session_filter() -> SessionFilter {
    let classify: fn(Option<&CurrentlyPlaying>) -> Session = session_of;
    ChangeFilter::new(Continuity::new(classify))
}

/// Client-facing stream event.
#[derive(Debug, Clone, PartialEq)]
pub enum NowPlayingEvent {
    /// The producer failed this cycle.
    Error(ProducerError),
    /// Something appeared, disappeared, paused, resumed or changed track.
    NowPlaying(Option<Arc<CurrentlyPlaying>>),
    /// The same track keeps playing.
    Progress(Duration),
}

/// Stateful converter from poll results to [`NowPlayingEvent`]s.
#[derive(Debug, Default)]
pub struct NowPlayingEvents {
    prev: Option<Arc<CurrentlyPlaying>>,
}

impl NowPlayingEvents {
    /// Starts with nothing playing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the event for `result`, or `None` if it carries nothing to send.
    pub fn classify(&mut self, result: &PollResult<CurrentlyPlaying>) -> Option<NowPlayingEvent> {
        let prev = std::mem::replace(&mut self.prev, result.value.clone());
        if let Some(e) = &result.error {
            return Some(NowPlayingEvent::Error(e.clone()));
        }

        match (prev.as_deref(), result.get()) {
            (None, None) => None,
            (Some(p), Some(c)) if p.playing == c.playing && p.track.id == c.track.id => {
                c.playing.then_some(NowPlayingEvent::Progress(c.progress))
            }
            _ => Some(NowPlayingEvent::NowPlaying(result.value.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: &str) -> Track {
        Track {
            id: id.into(),
            uri: format!("music:track:{id}"),
            external_url: format!("https://music.example.com/track/{id}"),
            name: format!("Track {id}"),
            duration: Duration::from_secs(200),
            album: None,
            artists: Vec::new(),
        }
    }

    fn snapshot(id: &str, playing: bool, progress_ms: u64, ts: u64) -> CurrentlyPlaying {
        CurrentlyPlaying {
            timestamp: SystemTime::UNIX_EPOCH + Duration::from_secs(ts),
            track: track(id),
            progress: Duration::from_millis(progress_ms),
            playing,
        }
    }

    #[test]
    fn test_playback_filter_ignores_timestamp_but_not_progress() {
        let mut filter = playback_filter();
        let a = PollResult::value(1, snapshot("A", true, 1000, 1));
        let a_later = PollResult::value(2, snapshot("A", true, 1000, 2));
        let a_moved = PollResult::value(3, snapshot("A", true, 1001, 3));

        assert!(filter.admit(&a));
        assert!(!filter.admit(&a_later));
        assert!(filter.admit(&a_moved));
    }

    #[test]
    fn test_progress_noise_suppressed_when_predicate_excludes_it() {
        let same_track = |a: &CurrentlyPlaying, b: &CurrentlyPlaying| {
            a.playing == b.playing && a.track.id == b.track.id
        };
        let mut filter = ChangeFilter::new(SameBy::new(same_track));

        assert!(filter.admit(&PollResult::value(1, snapshot("A", true, 1000, 1))));
        assert!(!filter.admit(&PollResult::value(2, snapshot("A", true, 1001, 2))));
        assert!(filter.admit(&PollResult::value(3, snapshot("B", true, 0, 3))));
    }

    #[test]
    fn test_session_filter_sequence() {
        let mut filter = session_filter();
        let input = [
            PollResult::value(1, snapshot("A", true, 0, 1)),
            PollResult::value(2, snapshot("A", false, 10, 2)),
            PollResult::value(3, snapshot("A", false, 10, 3)),
            PollResult::empty(4),
            PollResult::empty(5),
            PollResult::value(6, snapshot("A", true, 10, 6)),
        ];

        let cycles: Vec<u64> = input
            .iter()
            .filter(|r| filter.admit(r))
            .map(|r| r.cycle)
            .collect();
        assert_eq!(cycles, vec![1, 2, 4, 6]);
    }

    #[test]
    fn test_filters_agree_with_events_on_leading_silence() {
        let nothing = PollResult::empty(1);
        let mut playback = playback_filter();
        let mut session = session_filter();
        let mut events = NowPlayingEvents::new();

        assert!(!playback.admit(&nothing));
        assert!(!session.admit(&nothing));
        assert_eq!(events.classify(&nothing), None);

        let started = PollResult::value(2, snapshot("A", true, 0, 2));
        assert!(playback.admit(&started));
        assert!(session.admit(&started));
        assert!(events.classify(&started).is_some());
    }

    #[test]
    fn test_now_playing_events() {
        let mut events = NowPlayingEvents::new();

        assert_eq!(events.classify(&PollResult::empty(1)), None);

        let started = PollResult::value(2, snapshot("A", true, 0, 2));
        assert!(matches!(
            events.classify(&started),
            Some(NowPlayingEvent::NowPlaying(Some(_)))
        ));

        let moved = PollResult::value(3, snapshot("A", true, 500, 3));
        assert_eq!(
            events.classify(&moved),
            Some(NowPlayingEvent::Progress(Duration::from_millis(500)))
        );

        let paused = PollResult::value(4, snapshot("A", false, 500, 4));
        assert!(matches!(
            events.classify(&paused),
            Some(NowPlayingEvent::NowPlaying(_))
        ));
        let still = PollResult::value(5, snapshot("A", false, 500, 5));
        assert_eq!(events.classify(&still), None);

        let err = ProducerError::fail("token expired");
        assert_eq!(
            events.classify(&PollResult::failed(6, err.clone())),
            Some(NowPlayingEvent::Error(err))
        );
        assert_eq!(
            events.classify(&PollResult::empty(7)),
            None,
            "error carried no snapshot, so nothing to nothing"
        );
    }
}
