use serde::Deserialize;

use crate::modules::comment::MediaKind;
use crate::modules::import::ExternalIds;
use crate::modules::match_dispatch::MatchRequest;

/// §6 "Webhook ingress: `POST /webhook/{type}?api_key=…` where
/// type∈{emby, jellyfin}. Body is vendor-specific JSON... Ignore any event
/// other than new-item-added; ignore items whose type is not episode or
/// movie." Emby and Jellyfin payloads differ in field names but carry the
/// same information, so both are parsed into this one shape.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbyWebhookPayload {
    #[serde(rename = "Event")]
    pub event: String,
    #[serde(rename = "Item")]
    pub item: EmbyItem,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbyItem {
    #[serde(rename = "Type")]
    pub item_type: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "SeriesName")]
    pub series_name: Option<String>,
    #[serde(rename = "ParentIndexNumber")]
    pub season_number: Option<i32>,
    #[serde(rename = "IndexNumber")]
    pub episode_number: Option<i32>,
    #[serde(rename = "ProviderIds")]
    #[serde(default)]
    pub provider_ids: ProviderIds,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderIds {
    #[serde(rename = "Tmdb")]
    pub tmdb: Option<String>,
    #[serde(rename = "Tvdb")]
    pub tvdb: Option<String>,
    #[serde(rename = "Imdb")]
    pub imdb: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JellyfinWebhookPayload {
    #[serde(rename = "NotificationType")]
    pub notification_type: String,
    #[serde(rename = "ItemType")]
    pub item_type: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "SeriesName")]
    pub series_name: Option<String>,
    #[serde(rename = "SeasonNumber")]
    pub season_number: Option<i32>,
    #[serde(rename = "EpisodeNumber")]
    pub episode_number: Option<i32>,
    #[serde(rename = "Provider_tmdb")]
    pub provider_tmdb: Option<String>,
    #[serde(rename = "Provider_tvdb")]
    pub provider_tvdb: Option<String>,
    #[serde(rename = "Provider_imdb")]
    pub provider_imdb: Option<String>,
}

/// Returns `None` for events/item-types §6 says to ignore: anything but
/// new-item-added, and any item whose type is not episode or movie.
pub fn emby_to_match_request(payload: &EmbyWebhookPayload) -> Option<MatchRequest> {
    if payload.event != "library.new" && payload.event != "item.add" {
        return None;
    }
    to_match_request(
        &payload.item.item_type,
        payload.item.series_name.as_deref().unwrap_or(&payload.item.name),
        payload.item.season_number,
        payload.item.episode_number,
        payload.item.provider_ids.tmdb.as_deref(),
        payload.item.provider_ids.tvdb.as_deref(),
        payload.item.provider_ids.imdb.as_deref(),
    )
}

pub fn jellyfin_to_match_request(payload: &JellyfinWebhookPayload) -> Option<MatchRequest> {
    if payload.notification_type != "ItemAdded" {
        return None;
    }
    to_match_request(
        &payload.item_type,
        payload.series_name.as_deref().unwrap_or(&payload.name),
        payload.season_number,
        payload.episode_number,
        payload.provider_tmdb.as_deref(),
        payload.provider_tvdb.as_deref(),
        payload.provider_imdb.as_deref(),
    )
}

#[allow(clippy::too_many_arguments)]
fn to_match_request(
    item_type: &str,
    title: &str,
    season_number: Option<i32>,
    episode_number: Option<i32>,
    tmdb: Option<&str>,
    tvdb: Option<&str>,
    imdb: Option<&str>,
) -> Option<MatchRequest> {
    let kind = match item_type {
        "Episode" => MediaKind::TvSeries,
        "Movie" => MediaKind::Movie,
        _ => return None,
    };

    let external_ids = if tmdb.is_some() || tvdb.is_some() || imdb.is_some() {
        Some(ExternalIds {
            tmdb_id: tmdb.and_then(|v| v.parse().ok()),
            tmdb_episode_group_id: None,
            bangumi_id: None,
            tvdb_id: tvdb.and_then(|v| v.parse().ok()),
            douban_id: None,
            imdb_id: imdb.map(|v| v.to_string()),
        })
    } else {
        None
    };

    Some(MatchRequest {
        title: title.to_string(),
        kind,
        season: season_number.unwrap_or(1),
        episode: episode_number.unwrap_or(1),
        external_ids,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emby_ignores_non_add_events() {
        let payload = EmbyWebhookPayload {
            event: "playback.start".to_string(),
            item: EmbyItem {
                item_type: "Episode".to_string(),
                name: "Ep".to_string(),
                series_name: Some("Show".to_string()),
                season_number: Some(1),
                episode_number: Some(1),
                provider_ids: ProviderIds::default(),
            },
        };
        assert!(emby_to_match_request(&payload).is_none());
    }

    #[test]
    fn emby_ignores_non_episode_movie_items() {
        let payload = EmbyWebhookPayload {
            event: "library.new".to_string(),
            item: EmbyItem {
                item_type: "Season".to_string(),
                name: "Season 1".to_string(),
                series_name: Some("Show".to_string()),
                season_number: Some(1),
                episode_number: None,
                provider_ids: ProviderIds::default(),
            },
        };
        assert!(emby_to_match_request(&payload).is_none());
    }

    #[test]
    fn emby_episode_maps_series_title_and_season() {
        let payload = EmbyWebhookPayload {
            event: "library.new".to_string(),
            item: EmbyItem {
                item_type: "Episode".to_string(),
                name: "Episode One".to_string(),
                series_name: Some("Show".to_string()),
                season_number: Some(2),
                episode_number: Some(5),
                provider_ids: ProviderIds { tmdb: Some("123".to_string()), tvdb: None, imdb: None },
            },
        };
        let request = emby_to_match_request(&payload).unwrap();
        assert_eq!(request.title, "Show");
        assert_eq!(request.season, 2);
        assert_eq!(request.episode, 5);
        assert_eq!(request.external_ids.unwrap().tmdb_id, Some(123));
    }

    #[test]
    fn jellyfin_movie_defaults_season_to_one() {
        let payload = JellyfinWebhookPayload {
            notification_type: "ItemAdded".to_string(),
            item_type: "Movie".to_string(),
            name: "A Film".to_string(),
            series_name: None,
            season_number: None,
            episode_number: None,
            provider_tmdb: None,
            provider_tvdb: None,
            provider_imdb: None,
        };
        let request = jellyfin_to_match_request(&payload).unwrap();
        assert_eq!(request.kind, MediaKind::Movie);
        assert_eq!(request.season, 1);
    }
}
