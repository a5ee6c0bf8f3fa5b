//! Upstream catalog response types and conversion.
//!
//! Handles the album listing (`/artists/{id}/albums`) and batched album
//! lookup (`/albums?ids=...`) responses and converts album track listings
//! into [`Track`]. Absent or null numeric and boolean fields fall back to
//! defaults instead of failing the whole page.

use serde::Deserialize;

use crate::types::{Album, ArtistRef, Image, Track};

/// A cursor-paginated list (`items` + `next` URL).
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub(crate) struct Paging<T> {
    #[serde(default)]
    pub items: Vec<T>,
    #[serde(default)]
    pub next: Option<String>,
}

/// Album entry in an artist's album listing.
#[derive(Debug, Deserialize)]
pub(crate) struct AlbumRef {
    #[serde(default)]
    pub id: Option<String>,
}

/// Response of a batched album lookup. Unknown ids come back as `null`.
#[derive(Debug, Deserialize)]
pub(crate) struct AlbumsBatch {
    #[serde(default)]
    pub albums: Vec<Option<FullAlbum>>,
}

/// Full album object including the first page of its track listing.
#[derive(Debug, Deserialize)]
pub(crate) struct FullAlbum {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub release_date_precision: Option<String>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub tracks: Option<Paging<WireTrack>>,
}

impl FullAlbum {
    /// Split into the album fields every track carries and its first track page.
    pub fn into_parts(self) -> (Album, Paging<WireTrack>) {
        let album = Album {
            id: self.id,
            name: self.name,
            release_date: self.release_date,
            release_date_precision: self.release_date_precision,
            images: self.images,
        };
        let tracks = self.tracks.unwrap_or(Paging {
            items: Vec::new(),
            next: None,
        });
        (album, tracks)
    }
}

/// Track entry inside an album's track listing.
#[derive(Debug, Deserialize)]
pub(crate) struct WireTrack {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub duration_ms: Option<i64>,
    #[serde(default)]
    pub popularity: Option<i64>,
    #[serde(default)]
    pub explicit: Option<bool>,
    #[serde(default)]
    pub artists: Vec<WireArtist>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireArtist {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl WireTrack {
    /// Normalize into a [`Track`] owned by `album`.
    ///
    /// Tracks without an id (e.g. local files) cannot be deduplicated and
    /// are dropped. Negative durations clamp to zero.
    pub fn into_track(self, album: &Album) -> Option<Track> {
        let id = self.id.filter(|id| !id.is_empty())?;
        let artists = self
            .artists
            .into_iter()
            .filter_map(|a| {
                Some(ArtistRef {
                    id: a.id?,
                    name: a.name.unwrap_or_default(),
                })
            })
            .collect();

        Some(Track {
            uri: self.uri.unwrap_or_else(|| format!("spotify:track:{id}")),
            id,
            name: self.name.unwrap_or_default(),
            preview_url: self.preview_url,
            duration_ms: self.duration_ms.unwrap_or(0).max(0) as u64,
            popularity: self.popularity.unwrap_or(0).clamp(0, i64::from(u32::MAX)) as u32,
            explicit: self.explicit.unwrap_or(false),
            album: album.clone(),
            artists,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn album() -> Album {
        Album {
            id: "al1".into(),
            name: "Album".into(),
            ..Default::default()
        }
    }

    #[test]
    fn missing_fields_default() {
        let wire: WireTrack = serde_json::from_value(serde_json::json!({
            "id": "t1",
            "name": "Song",
            "duration_ms": null,
            "artists": [{"id": "ar1", "name": "Artist"}]
        }))
        .unwrap();

        let track = wire.into_track(&album()).unwrap();
        assert_eq!(track.duration_ms, 0);
        assert_eq!(track.popularity, 0);
        assert!(!track.explicit);
        assert_eq!(track.uri, "spotify:track:t1");
        assert_eq!(track.album.id, "al1");
        assert!(track.is_credited_to("ar1"));
    }

    #[test]
    fn track_without_id_is_dropped() {
        let wire: WireTrack =
            serde_json::from_value(serde_json::json!({"name": "Local file"})).unwrap();
        assert!(wire.into_track(&album()).is_none());
    }

    #[test]
    fn negative_duration_clamps() {
        let wire: WireTrack =
            serde_json::from_value(serde_json::json!({"id": "t", "duration_ms": -5})).unwrap();
        assert_eq!(wire.into_track(&album()).unwrap().duration_ms, 0);
    }

    #[test]
    fn paging_without_items_is_empty() {
        let page: Paging<AlbumRef> =
            serde_json::from_value(serde_json::json!({"next": null})).unwrap();
        assert!(page.items.is_empty());
        assert!(page.next.is_none());

        let album: FullAlbum = serde_json::from_value(serde_json::json!({
            "id": "al1",
            "tracks": {"next": "https://api.example/next"}
        }))
        .unwrap();
        let (_, tracks) = album.into_parts();
        assert!(tracks.items.is_empty());
        assert_eq!(tracks.next.as_deref(), Some("https://api.example/next"));
    }

    #[test]
    fn batch_tolerates_null_albums() {
        let batch: AlbumsBatch =
            serde_json::from_value(serde_json::json!({"albums": [null]})).unwrap();
        assert_eq!(batch.albums.len(), 1);
        assert!(batch.albums[0].is_none());
    }
}
