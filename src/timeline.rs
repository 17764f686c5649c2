/// Projection of chapters onto the playback timeline
///
/// Markers keep the order the extraction service produced. They are not
/// re-sorted, so an unsorted payload displays in payload order. Clamping
/// a seek into the playable range is the player's job.
use crate::annotations::Chapter;
use serde::Serialize;

/// One entry of the chapter panel and the scrub-bar overlay
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MarkerEntry {
    /// Position in the chapter sequence; the stable identity of the entry
    pub index: usize,
    /// Seek target in seconds
    pub time: f64,
    pub label: String,
    /// `mm:ss` or `h:mm:ss`
    pub timestamp: String,
    /// False when the chapter lies past the known media duration
    pub within_duration: bool,
}

/// A request for the player to seek
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeekRequest {
    pub index: usize,
    pub time: f64,
}

/// Rendered marker list
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct MarkerViewModel {
    pub entries: Vec<MarkerEntry>,
}

impl MarkerViewModel {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Seek target for a selected entry
    pub fn select(&self, index: usize) -> Option<SeekRequest> {
        self.entries.get(index).map(|entry| SeekRequest {
            index: entry.index,
            time: entry.time,
        })
    }

    /// `(time, label)` pairs for the player's native marker overlay
    pub fn overlay(&self) -> Vec<Chapter> {
        self.entries
            .iter()
            .map(|entry| Chapter::new(entry.time, entry.label.clone()))
            .collect()
    }

    /// Chapter panel lines, `time: label`
    pub fn panel_lines(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| {
                let flag = if entry.within_duration { "" } else { " (past end)" };
                format!("{}: {}{}", entry.timestamp, entry.label, flag)
            })
            .collect()
    }
}

/// Binds chapters to the timeline of one media asset
#[derive(Debug, Clone, Copy, Default)]
pub struct TimelineMarkerBinder {
    duration: Option<f64>,
}

impl TimelineMarkerBinder {
    pub fn new(duration: Option<f64>) -> Self {
        Self { duration }
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn set_duration(&mut self, duration: Option<f64>) {
        self.duration = duration;
    }

    /// Pure projection of chapters to markers, in input order
    pub fn render(&self, chapters: &[Chapter]) -> MarkerViewModel {
        let entries = chapters
            .iter()
            .enumerate()
            .map(|(index, chapter)| MarkerEntry {
                index,
                time: chapter.time,
                label: chapter.label.clone(),
                timestamp: format_timestamp(chapter.time),
                within_duration: self.duration.map_or(true, |d| chapter.time <= d),
            })
            .collect();

        MarkerViewModel { entries }
    }
}

/// Format seconds as `mm:ss`, or `h:mm:ss` from one hour on
pub fn format_timestamp(seconds: f64) -> String {
    // `as` saturates at u64::MAX
    let total_seconds = if seconds.is_finite() && seconds > 0.0 {
        seconds.min(u64::MAX as f64) as u64
    } else {
        0
    };
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}
