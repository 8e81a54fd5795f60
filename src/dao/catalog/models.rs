//! Wire shapes of the catalog token and search endpoints.

use serde::Deserialize;

use crate::state::game::Track;

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Lifetime of the token in seconds.
    pub expires_in: u64,
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub tracks: Option<TrackPage>,
}

#[derive(Debug, Deserialize)]
pub struct TrackPage {
    #[serde(default)]
    pub items: Option<Vec<TrackItem>>,
}

#[derive(Debug, Deserialize)]
pub struct TrackItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ArtistItem>,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub album: Option<AlbumItem>,
}

#[derive(Debug, Deserialize)]
pub struct ArtistItem {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct AlbumItem {
    #[serde(default)]
    pub images: Vec<ImageItem>,
}

#[derive(Debug, Deserialize)]
pub struct ImageItem {
    pub url: String,
}

impl SearchResponse {
    /// Flatten the response into domain tracks, treating a missing page as empty.
    pub fn into_tracks(self) -> Vec<Track> {
        self.tracks
            .and_then(|page| page.items)
            .unwrap_or_default()
            .into_iter()
            .map(Into::into)
            .collect()
    }
}

impl From<TrackItem> for Track {
    fn from(item: TrackItem) -> Self {
        let artist = item
            .artists
            .into_iter()
            .map(|artist| artist.name)
            .collect::<Vec<_>>()
            .join(", ");
        let artwork_url = item
            .album
            .and_then(|album| album.images.into_iter().next())
            .map(|image| image.url);

        Self {
            id: item.id,
            name: item.name,
            artist,
            preview_url: item.preview_url,
            artwork_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_items_map_to_tracks() {
        let payload = r#"{
            "tracks": {
                "items": [
                    {
                        "id": "t1",
                        "name": "Song",
                        "artists": [{"name": "First"}, {"name": "Second"}],
                        "preview_url": "https://p.example/t1.mp3",
                        "album": {"images": [{"url": "https://i.example/big.jpg"}, {"url": "https://i.example/small.jpg"}]}
                    },
                    {
                        "id": "t2",
                        "name": "No Preview",
                        "artists": [{"name": "Solo"}],
                        "preview_url": null,
                        "album": {"images": []}
                    }
                ]
            }
        }"#;

        let tracks = serde_json::from_str::<SearchResponse>(payload)
            .unwrap()
            .into_tracks();

        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].artist, "First, Second");
        assert_eq!(
            tracks[0].artwork_url.as_deref(),
            Some("https://i.example/big.jpg")
        );
        assert_eq!(tracks[1].preview_url, None);
        assert_eq!(tracks[1].artwork_url, None);
    }

    #[test]
    fn missing_items_yield_no_tracks() {
        let response: SearchResponse = serde_json::from_str(r#"{"tracks": {}}"#).unwrap();
        assert!(response.into_tracks().is_empty());

        let response: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(response.into_tracks().is_empty());
    }
}
