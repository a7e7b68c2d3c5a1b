//! Lyric composition
//!
//! Turns raw provider lyric payloads (LRC or plain text) into ordered
//! [`LyricLine`]s, merging an optional translation by timestamp. Tracks with
//! no usable lyric always produce exactly one sentinel line.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::models::LyricLine;

/// Lyric payload as returned by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawLyric {
    /// The provider marks the track as instrumental.
    Instrumental,
    /// The provider has no lyric for the track.
    Missing,
    /// LRC or plain text.
    Text(String),
}

/// Build the display lines for a track.
pub fn compose_lyrics(primary: RawLyric, translation: Option<RawLyric>) -> Vec<LyricLine> {
    let text = match primary {
        RawLyric::Instrumental => return vec![LyricLine::instrumental()],
        RawLyric::Missing => return vec![LyricLine::no_lyric()],
        RawLyric::Text(text) => text,
    };

    let mut lines = parse_lrc(&text);
    if lines.is_empty() {
        return vec![LyricLine::no_lyric()];
    }

    if let Some(RawLyric::Text(translated)) = translation {
        let by_time: HashMap<Duration, String> = parse_lrc(&translated)
            .into_iter()
            .filter(|line| !line.text.is_empty())
            .map(|line| (line.time, line.text))
            .collect();

        for line in &mut lines {
            if let Some(translated) = by_time.get(&line.time) {
                *line = line.clone().with_translation(translated.clone());
            }
        }
    }

    lines
}

/// Parse LRC text. Lines may carry several time tags; metadata tags such as
/// `[ar:...]` are skipped; untagged text lands at time zero. Output is sorted
/// by time, stable for equal timestamps.
pub fn parse_lrc(text: &str) -> Vec<LyricLine> {
    let mut lines = Vec::new();

    for raw_line in text.lines() {
        let mut rest = raw_line.trim();
        if rest.is_empty() {
            continue;
        }

        let mut times = Vec::new();
        let mut saw_tag = false;
        while let Some(tail) = rest.strip_prefix('[') {
            let Some(close) = tail.find(']') else { break };
            saw_tag = true;
            if let Some(time) = parse_timestamp(&tail[..close]) {
                times.push(time);
            }
            rest = tail[close + 1..].trim_start();
        }

        let body = rest.trim();
        if times.is_empty() {
            // Metadata-only line.
            if saw_tag {
                continue;
            }
            lines.push(LyricLine::new(Duration::ZERO, body));
        } else {
            for time in times {
                lines.push(LyricLine::new(time, body));
            }
        }
    }

    lines.sort_by_key(|line| line.time);
    lines
}

/// `mm:ss`, `mm:ss.xx`, `mm:ss.xxx` or `mm:ss:xx`.
fn parse_timestamp(tag: &str) -> Option<Duration> {
    let (minutes, rest) = tag.split_once(':')?;
    let minutes: u64 = minutes.trim().parse().ok()?;

    let (seconds, fraction) = match rest.find(|c: char| c == '.' || c == ':') {
        Some(split) => (&rest[..split], Some(&rest[split + 1..])),
        None => (rest, None),
    };
    let seconds: u64 = seconds.trim().parse().ok()?;
    if seconds >= 60 {
        return None;
    }

    let millis = match fraction {
        Some(digits) if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) => {
            let padded: String = digits.chars().chain("00".chars()).take(3).collect();
            padded.parse::<u64>().ok()?
        }
        Some(_) => return None,
        None => 0,
    };

    // Tags from provider text can carry absurd minute counts.
    let millis = minutes
        .checked_mul(60_000)?
        .checked_add(seconds * 1_000 + millis)?;
    Some(Duration::from_millis(millis))
}
