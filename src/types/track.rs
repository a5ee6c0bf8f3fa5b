//! Catalog track types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A playable track from an artist's catalog.
///
/// `id` uniquely identifies a track within one catalog fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    /// Playable-media reference (e.g. `spotify:track:...`).
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    pub duration_ms: u64,
    /// Ordinal popularity, higher is more popular.
    #[serde(default)]
    pub popularity: u32,
    #[serde(default)]
    pub explicit: bool,
    pub album: Album,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
}

impl Track {
    /// Whether `artist_id` is credited on this track.
    pub fn is_credited_to(&self, artist_id: &str) -> bool {
        self.artists.iter().any(|a| a.id == artist_id)
    }
}

/// The album a track belongs to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Album {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    /// "year", "month" or "day".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date_precision: Option<String>,
    #[serde(default)]
    pub images: Vec<Image>,
}

impl Album {
    /// Release date as Unix milliseconds (UTC midnight).
    ///
    /// Year- and month-precision dates are pinned to the first day of the
    /// period. Returns `None` for absent or unparseable dates.
    pub fn release_timestamp_ms(&self) -> Option<i64> {
        let raw = self.release_date.as_deref()?.trim();
        let mut parts = raw.splitn(3, '-');
        let year: i32 = parts.next()?.parse().ok()?;
        let month: u32 = match parts.next() {
            Some(m) => m.parse().ok()?,
            None => 1,
        };
        let day: u32 = match parts.next() {
            Some(d) => d.parse().ok()?,
            None => 1,
        };
        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis())
    }
}

/// Cover art reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// A contributing artist credit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistRef {
    pub id: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn album(date: Option<&str>) -> Album {
        Album {
            id: "a".into(),
            name: "A".into(),
            release_date: date.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn day_precision_timestamp() {
        assert_eq!(
            album(Some("1970-01-02")).release_timestamp_ms(),
            Some(86_400_000)
        );
    }

    #[test]
    fn year_precision_pins_to_january_first() {
        assert_eq!(
            album(Some("1971")).release_timestamp_ms(),
            album(Some("1971-01-01")).release_timestamp_ms()
        );
    }

    #[test]
    fn month_precision_is_earlier_than_later_day() {
        let month = album(Some("2001-05")).release_timestamp_ms().unwrap();
        let day = album(Some("2001-05-20")).release_timestamp_ms().unwrap();
        assert!(month < day);
    }

    #[test]
    fn invalid_or_missing_dates_have_no_timestamp() {
        assert_eq!(album(None).release_timestamp_ms(), None);
        assert_eq!(album(Some("0000-00-00")).release_timestamp_ms(), None);
        assert_eq!(album(Some("soon")).release_timestamp_ms(), None);
        assert_eq!(album(Some("2020-13-01")).release_timestamp_ms(), None);
    }
}
