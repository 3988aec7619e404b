use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use url::Url;
use uuid::Uuid;

use crate::{
    error::{DrtvError, DrtvResult},
    util::{
        http::{fetch_text, HttpClient},
        url::extract_ids,
    },
};

pub const BASE_URL: &str = "https://www.dr.dk/drtv";

const ITEM_API_URL: &str = "https://production-cdn.dr-massive.com/api/items";
const STREAM_API_URL: &str = "https://production.dr-massive.com/api/account/items";
const PAGE_API_URL: &str = "https://production-cdn.dr-massive.com/api/page";
const ANONYMOUS_SSO_URL: &str = "https://isl.dr-massive.com/api/authorization/anonymous-sso";

const ITEM_PARAMS: &[(&str, &str)] = &[
    ("device", "web_browser"),
    ("ff", "idp,ldp,rpt"),
    ("lang", "da"),
    ("expand", "all"),
    ("sub", "Anonymous"),
];

const STREAM_PARAMS: &[(&str, &str)] = &[
    ("delivery", "stream"),
    ("device", "web_browser"),
    ("ff", "idp,ldp,rpt"),
    ("lang", "da"),
    ("resolution", "HD-1080"),
    ("sub", "Anonymous"),
];

static YEAR_REGEXP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"fra (\d{4})").unwrap());

#[derive(Debug, Deserialize)]
struct TokenEntry {
    #[serde(rename = "type")]
    kind: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct StreamEntry {
    url: Option<String>,
    format: Option<String>,
    #[serde(rename = "accessService")]
    access_service: Option<String>,
}

/// One downloadable delivery of a title, as reported by the stream API.
#[derive(Debug, Clone)]
pub struct Format {
    pub format_id: String,
    pub url: String,
    pub preference: Option<i8>,
}

/// Metadata of a single playable item.
#[derive(Debug, Clone)]
pub struct VideoInfo {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub duration: Option<u64>,
    pub year: Option<String>,
    pub season_number: Option<u64>,
    pub episode_number: Option<u64>,
    pub episode_name: Option<String>,
    pub formats: Vec<Format>,
}

/// Episode URLs of one season, in site order.
#[derive(Debug, Clone)]
pub struct SeasonInfo {
    pub season_number: Option<u64>,
    pub episode_urls: Vec<String>,
}

pub struct InfoExtractor {
    client: HttpClient,
    token: String,
}

impl InfoExtractor {
    /// Obtains an anonymous catalog token and keeps it for the API calls
    /// that follow.
    pub async fn new(client: HttpClient) -> DrtvResult<Self> {
        log::info!("Obtaining anonymous token");
        let response = client
            .post(ANONYMOUS_SSO_URL)
            .query(&[
                ("device", "phone_android"),
                ("lang", "da"),
                ("supportFallbackToken", "true"),
            ])
            .json(&serde_json::json!({
                "deviceId": Uuid::new_v4().to_string(),
                "scopes": ["Catalog"],
                "optout": true,
            }))
            .send()
            .await?
            .error_for_status()?;

        let entries: Vec<TokenEntry> = response.json().await?;
        let token = entries
            .into_iter()
            .find(|entry| entry.kind == "UserAccount")
            .map(|entry| entry.value)
            .ok_or(DrtvError::TokenRetrieval)?;

        Ok(Self { client, token })
    }

    pub async fn extract(&self, url: &str) -> DrtvResult<VideoInfo> {
        let (_, item_id) = extract_ids(url)?;
        log::info!("{item_id}: Downloading item metadata");
        let item: Value = serde_json::from_str(
            &fetch_text(
                &self.client,
                format!("{ITEM_API_URL}/{item_id}"),
                Some(ITEM_PARAMS),
                Some(&self.token),
            )
            .await?,
        )?;

        let video_id = item
            .get("customId")
            .and_then(|id| id.as_str())
            .and_then(|id| id.rsplit(':').next())
            .filter(|id| !id.is_empty())
            .unwrap_or(&item_id)
            .to_string();

        log::info!("{video_id}: Fetching stream data");
        let streams: Vec<StreamEntry> = serde_json::from_str(
            &fetch_text(
                &self.client,
                format!("{STREAM_API_URL}/{item_id}/videos"),
                Some(STREAM_PARAMS),
                Some(&self.token),
            )
            .await?,
        )?;

        log::debug!("{video_id}: Parsing available formats");
        let formats = streams.into_iter().filter_map(parse_format).collect();

        let season = item.get("season");
        let season_title = season
            .and_then(|season| season.get("title"))
            .and_then(|title| title.as_str());
        let title = season_title
            .or_else(|| item.get("title").and_then(|title| title.as_str()))
            .unwrap_or_default()
            .to_string();

        let description = item
            .get("description")
            .and_then(|description| description.as_str())
            .map(str::to_string);
        let year = description
            .as_deref()
            .and_then(|description| YEAR_REGEXP.captures(description))
            .and_then(|capture| capture.get(1))
            .map(|year| year.as_str().to_string())
            .or_else(|| {
                item.get("releaseYear")
                    .and_then(Value::as_u64)
                    .map(|year| year.to_string())
            });

        let episode_name = item
            .get("episodeName")
            .and_then(|name| name.as_str())
            .map(|name| match season_title {
                Some(season_title) => name
                    .replace(&format!("{season_title}:"), "")
                    .trim()
                    .to_string(),
                None => name.trim().to_string(),
            })
            .filter(|name| !name.is_empty());

        Ok(VideoInfo {
            id: video_id,
            title,
            description,
            duration: item.get("duration").and_then(Value::as_u64),
            year,
            season_number: season
                .and_then(|season| season.get("seasonNumber"))
                .and_then(Value::as_u64),
            episode_number: item.get("episodeNumber").and_then(Value::as_u64),
            episode_name,
            formats,
        })
    }
}

fn parse_format(stream: StreamEntry) -> Option<Format> {
    let url = stream.url?;
    let mut format_id = stream.format.unwrap_or_else(|| "na".to_string());
    let preference = match stream.access_service.as_deref() {
        Some(service @ ("SpokenSubtitles" | "SignLanguage" | "VisuallyInterpreted")) => {
            format_id = format!("{format_id}-{service}");
            Some(-1)
        }
        Some("StandardVideo") | None => Some(1),
        Some(_) => None,
    };

    Some(Format {
        format_id,
        url,
        preference,
    })
}

/// First format the site reports as a standard video delivery.
pub fn best_format(formats: &[Format]) -> DrtvResult<&Format> {
    if formats.is_empty() {
        return Err(DrtvError::Extraction(
            "no formats for media were available".to_string(),
        ));
    }

    let format = formats
        .iter()
        .find(|format| format.preference == Some(1))
        .ok_or_else(|| DrtvError::Extraction("no suitable formats found".to_string()))?;
    log::debug!("Optimal format selected: '{}'", format.format_id);
    Ok(format)
}

pub struct SeasonExtractor<'a> {
    extractor: &'a InfoExtractor,
}

impl<'a> SeasonExtractor<'a> {
    pub fn new(extractor: &'a InfoExtractor) -> Self {
        Self { extractor }
    }

    pub async fn extract(&self, url: &str) -> DrtvResult<SeasonInfo> {
        let (display_id, season_id) = extract_ids(url)?;
        log::info!("{display_id}_{season_id}: Downloading season metadata");
        let item = fetch_page_item(
            &self.extractor.client,
            &format!("/saeson/{display_id}_{season_id}"),
        )
        .await?;

        let episodes = item
            .get("episodes")
            .and_then(|episodes| episodes.get("items"))
            .and_then(Value::as_array);

        let base_url = Url::parse(BASE_URL)?;
        let mut episode_urls = Vec::new();
        for episode in episodes.into_iter().flatten() {
            if let Some(path) = episode.get("path").and_then(Value::as_str) {
                episode_urls.push(base_url.join(path)?.to_string());
            }
        }

        let season_number = item.get("seasonNumber").and_then(Value::as_u64);
        log::info!(
            "Found {} episodes in season {}",
            episode_urls.len(),
            season_number.unwrap_or_default()
        );

        Ok(SeasonInfo {
            season_number,
            episode_urls,
        })
    }
}

pub struct SeriesExtractor<'a> {
    seasons: SeasonExtractor<'a>,
}

impl<'a> SeriesExtractor<'a> {
    pub fn new(extractor: &'a InfoExtractor) -> Self {
        Self {
            seasons: SeasonExtractor::new(extractor),
        }
    }

    /// Walks every season of a series through the season extractor.
    pub async fn extract(&self, url: &str) -> DrtvResult<Vec<SeasonInfo>> {
        let (display_id, series_id) = extract_ids(url)?;
        log::info!("{display_id}_{series_id}: Downloading series metadata");
        let item = fetch_page_item(
            &self.seasons.extractor.client,
            &format!("/serie/{display_id}_{series_id}"),
        )
        .await?;

        let seasons = item
            .get("show")
            .and_then(|show| show.get("seasons"))
            .and_then(|seasons| seasons.get("items"))
            .and_then(Value::as_array);

        let base_url = Url::parse(BASE_URL)?;
        let mut season_info = Vec::new();
        for season in seasons.into_iter().flatten() {
            let Some(path) = season.get("path").and_then(Value::as_str) else {
                continue;
            };
            let season_url = base_url.join(path)?;
            log::info!("Processing season: {season_url}");
            season_info.push(self.seasons.extract(season_url.as_str()).await?);
        }

        log::info!("Total seasons found: {}", season_info.len());
        Ok(season_info)
    }
}

async fn fetch_page_item(client: &HttpClient, path: &str) -> DrtvResult<Value> {
    let page: Value = serde_json::from_str(
        &fetch_text(
            client,
            PAGE_API_URL,
            Some(&[
                ("device", "web_browser"),
                ("item_detail_expand", "all"),
                ("lang", "da"),
                ("max_list_prefetch", "3"),
                ("path", path),
            ]),
            None,
        )
        .await?,
    )?;

    page.get("entries")
        .and_then(|entries| entries.get(0))
        .and_then(|entry| entry.get("item"))
        .cloned()
        .ok_or_else(|| DrtvError::Extraction(format!("no page entry for {path}")))
}
