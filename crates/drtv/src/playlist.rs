use std::collections::HashMap;

use url::Url;

const AUDIO_MARKER: &str = "#EXT-X-MEDIA:TYPE=AUDIO";
const SUBTITLES_MARKER: &str = "#EXT-X-MEDIA:TYPE=SUBTITLES";
const STREAM_INF_MARKER: &str = "#EXT-X-STREAM-INF:";
const MAP_MARKER: &str = "#EXT-X-MAP:";

/// Attributes decoded from a single `#EXT-X-*` directive line.
///
/// Keys are case-folded to lowercase; source order is preserved. A value is
/// either a double-quoted string (quotes stripped) or an unquoted run up to
/// the next comma or end of line.
#[derive(Debug, Clone, Default)]
pub struct AttributeMap(Vec<(String, String)>);

impl AttributeMap {
    pub fn parse(line: &str) -> Self {
        let mut rest = line.split_once(':').map(|(_, rest)| rest).unwrap_or(line);
        let mut pairs: Vec<(String, String)> = Vec::new();

        loop {
            rest = rest.trim_start_matches(',').trim_start();
            if rest.is_empty() {
                break;
            }
            let Some(eq) = rest.find('=') else {
                break;
            };
            let key = rest[..eq].trim().to_ascii_lowercase();
            rest = &rest[eq + 1..];

            let value = if let Some(quoted) = rest.strip_prefix('"') {
                match quoted.find('"') {
                    Some(end) => {
                        let value = &quoted[..end];
                        rest = &quoted[end + 1..];
                        value
                    }
                    // unterminated quote, take the remainder
                    None => {
                        let value = quoted;
                        rest = "";
                        value
                    }
                }
            } else {
                match rest.find(',') {
                    Some(end) => {
                        let value = &rest[..end];
                        rest = &rest[end..];
                        value
                    }
                    None => {
                        let value = rest;
                        rest = "";
                        value
                    }
                }
            };

            if !key.is_empty() && !pairs.iter().any(|(existing, _)| existing == &key) {
                pairs.push((key, value.to_string()));
            }
        }

        Self(pairs)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(existing, _)| existing.as_str() == key)
            .map(|(_, value)| value.as_str())
    }
}

/// One video rendition: an `#EXT-X-STREAM-INF` directive merged with the URI
/// line that follows it.
#[derive(Debug, Clone)]
pub struct VideoStream {
    pub uri: Url,
    /// `WIDTHxHEIGHT` as declared in the manifest.
    pub resolution: String,
    pub bandwidth: u64,
    pub average_bandwidth: Option<u64>,
    pub frame_rate: Option<String>,
    /// First entry of the `CODECS` list.
    pub codec: Option<String>,
    /// `AUDIO` group this rendition joins to.
    pub audio_group: String,
}

impl VideoStream {
    fn from_attrs(attrs: &AttributeMap, uri: Url) -> Option<Self> {
        Some(Self {
            uri,
            resolution: attrs.get("resolution")?.to_string(),
            bandwidth: attrs.get("bandwidth")?.parse().ok()?,
            average_bandwidth: attrs
                .get("average-bandwidth")
                .and_then(|value| value.parse().ok()),
            frame_rate: attrs.get("frame-rate").map(str::to_string),
            codec: first_codec(attrs),
            audio_group: attrs.get("audio")?.to_string(),
        })
    }

    /// Height component of the resolution attribute.
    pub fn height(&self) -> Option<&str> {
        self.resolution.split_once('x').map(|(_, height)| height)
    }
}

/// One audio rendition from an `#EXT-X-MEDIA:TYPE=AUDIO` directive.
///
/// Only the group id is required for selection; language and name are
/// display metadata DR usually, but not always, declares.
#[derive(Debug, Clone)]
pub struct AudioStream {
    pub uri: Url,
    pub group_id: String,
    pub language: Option<String>,
    pub name: Option<String>,
    /// Second `CODECS` entry of whichever video rendition references this
    /// group. DR never declares the codec on the audio directive itself.
    pub codec: Option<String>,
}

impl AudioStream {
    fn from_attrs(attrs: &AttributeMap, uri: Url) -> Option<Self> {
        Some(Self {
            uri,
            group_id: attrs.get("group-id")?.to_string(),
            language: attrs.get("language").map(str::to_string),
            name: attrs.get("name").map(str::to_string),
            codec: None,
        })
    }
}

/// One subtitle rendition from an `#EXT-X-MEDIA:TYPE=SUBTITLES` directive.
///
/// The URI points directly at the `.vtt` payload; the subtitle playlist
/// indirection DR publishes is skipped.
#[derive(Debug, Clone)]
pub struct SubtitleStream {
    pub uri: Url,
    pub language: Option<String>,
    pub name: Option<String>,
}

impl SubtitleStream {
    fn from_attrs(attrs: &AttributeMap, uri: Url) -> Option<Self> {
        Some(Self {
            uri,
            language: attrs.get("language").map(str::to_string),
            name: attrs.get("name").map(str::to_string),
        })
    }
}

/// Candidate streams of one title, grouped by kind, in manifest order.
#[derive(Debug, Clone, Default)]
pub struct MasterPlaylist {
    pub videos: Vec<VideoStream>,
    pub audios: Vec<AudioStream>,
    pub subtitles: Vec<SubtitleStream>,
}

impl MasterPlaylist {
    /// Parses a master playlist in a single pass.
    ///
    /// Blank lines and unrecognized directives are ignored. Records missing
    /// a required attribute, or an `#EXT-X-STREAM-INF` with no following URI
    /// line, are dropped rather than reported: partial manifest corruption
    /// must not abort the streams that did parse.
    pub fn parse(base_url: &Url, content: &str) -> Self {
        let mut playlist = Self::default();
        // audio group id -> audio codec, collected from the video directives
        // and applied to the audio streams after the pass
        let mut audio_codecs: HashMap<String, String> = HashMap::new();
        let mut pending: Option<AttributeMap> = None;

        for line in content.lines() {
            let line = line.trim();
            if line.starts_with(AUDIO_MARKER) {
                let attrs = AttributeMap::parse(line);
                if let Some(uri) = attrs.get("uri").and_then(|uri| base_url.join(uri).ok()) {
                    if let Some(audio) = AudioStream::from_attrs(&attrs, uri) {
                        playlist.audios.push(audio);
                    }
                }
            } else if line.starts_with(SUBTITLES_MARKER) {
                let attrs = AttributeMap::parse(line);
                if let Some(uri) = attrs
                    .get("uri")
                    .map(rewrite_subtitle_uri)
                    .and_then(|uri| base_url.join(&uri).ok())
                {
                    if let Some(subtitle) = SubtitleStream::from_attrs(&attrs, uri) {
                        playlist.subtitles.push(subtitle);
                    }
                }
            } else if line.starts_with(STREAM_INF_MARKER) {
                let attrs = AttributeMap::parse(line);
                if let (Some(group), Some(codec)) = (attrs.get("audio"), second_codec(&attrs)) {
                    audio_codecs.entry(group.to_string()).or_insert(codec);
                }
                pending = Some(attrs);
            } else if line.is_empty() || line.starts_with('#') {
                // other directives never consume the pending variant
            } else if let Some(attrs) = pending.take() {
                if let Ok(uri) = base_url.join(line) {
                    if let Some(video) = VideoStream::from_attrs(&attrs, uri) {
                        playlist.videos.push(video);
                    }
                }
            }
        }

        for audio in &mut playlist.audios {
            audio.codec = audio_codecs.get(&audio.group_id).cloned();
        }

        playlist
    }
}

fn first_codec(attrs: &AttributeMap) -> Option<String> {
    attrs
        .get("codecs")
        .and_then(|codecs| codecs.split(',').next())
        .map(|codec| codec.trim().to_string())
        .filter(|codec| !codec.is_empty())
}

fn second_codec(attrs: &AttributeMap) -> Option<String> {
    attrs
        .get("codecs")
        .and_then(|codecs| codecs.split(',').nth(1))
        .map(|codec| codec.trim().to_string())
        .filter(|codec| !codec.is_empty())
}

fn rewrite_subtitle_uri(uri: &str) -> String {
    match uri.strip_suffix("/playlist.m3u8") {
        Some(stripped) => format!("{stripped}.vtt"),
        None => uri.to_string(),
    }
}

/// Locates the initialization segment of a media playlist.
///
/// Returns `None` when the playlist carries no `#EXT-X-MAP` directive or its
/// URI does not resolve against the base.
pub fn extract_map_uri(content: &str, base_url: &Url) -> Option<Url> {
    let line = content
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with(MAP_MARKER))?;
    let attrs = AttributeMap::parse(line);
    let uri = urlencoding::decode(attrs.get("uri")?).ok()?;
    base_url.join(&uri).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MASTER: &str = r#"#EXTM3U
#EXT-X-VERSION:7
#EXT-X-INDEPENDENT-SEGMENTS
#EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID="audio-aacl-96",LANGUAGE="da",NAME="Dansk",DEFAULT=YES,AUTOSELECT=YES,CHANNELS="2",URI="audio/da/playlist.m3u8"
#EXT-X-MEDIA:TYPE=SUBTITLES,GROUP-ID="subs",LANGUAGE="da",NAME="Dansk",DEFAULT=NO,URI="subtitles/da/playlist.m3u8"
#EXT-X-MEDIA:TYPE=SUBTITLES,GROUP-ID="subs",LANGUAGE="da",NAME="DanishHardOfHearing",URI="subtitles/da-hoh/playlist.m3u8"
#EXT-X-STREAM-INF:BANDWIDTH=2000000,AVERAGE-BANDWIDTH=1800000,CODECS="avc1.64001F,mp4a.40.2",RESOLUTION=1280x720,FRAME-RATE=25,AUDIO="audio-aacl-96",SUBTITLES="subs"
video/720/playlist.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=5000000,AVERAGE-BANDWIDTH=4500000,CODECS="avc1.640028,mp4a.40.2",RESOLUTION=1920x1080,FRAME-RATE=25,AUDIO="audio-aacl-96",SUBTITLES="subs"
video/1080/playlist.m3u8
"#;

    fn base_url() -> Url {
        Url::parse("https://drtv-cdn.example.com/title/master.m3u8").unwrap()
    }

    #[test]
    fn parses_video_streams_with_resolved_uris() {
        let playlist = MasterPlaylist::parse(&base_url(), MASTER);

        assert_eq!(playlist.videos.len(), 2);
        assert_eq!(
            playlist.videos[0].uri.as_str(),
            "https://drtv-cdn.example.com/title/video/720/playlist.m3u8"
        );
        assert_eq!(playlist.videos[0].resolution, "1280x720");
        assert_eq!(playlist.videos[0].bandwidth, 2000000);
        assert_eq!(playlist.videos[0].average_bandwidth, Some(1800000));
        assert_eq!(playlist.videos[0].frame_rate.as_deref(), Some("25"));
        assert_eq!(playlist.videos[0].codec.as_deref(), Some("avc1.64001F"));
        assert_eq!(playlist.videos[0].audio_group, "audio-aacl-96");
        assert_eq!(playlist.videos[1].resolution, "1920x1080");
    }

    #[test]
    fn stream_inf_without_uri_is_dropped() {
        let content = "#EXT-X-STREAM-INF:BANDWIDTH=2000000,RESOLUTION=1280x720,AUDIO=\"aac\"\n";
        let playlist = MasterPlaylist::parse(&base_url(), content);
        assert!(playlist.videos.is_empty());
    }

    #[test]
    fn other_directives_do_not_consume_the_pending_variant() {
        let content = "#EXT-X-STREAM-INF:BANDWIDTH=2000000,RESOLUTION=1280x720,AUDIO=\"aac\"\n\
                       #EXT-X-SESSION-DATA:DATA-ID=\"com.example\"\n\
                       \n\
                       video.m3u8\n";
        let playlist = MasterPlaylist::parse(&base_url(), content);
        assert_eq!(playlist.videos.len(), 1);
        assert_eq!(
            playlist.videos[0].uri.as_str(),
            "https://drtv-cdn.example.com/title/video.m3u8"
        );
    }

    #[test]
    fn video_missing_required_attribute_is_dropped() {
        // no BANDWIDTH
        let content = "#EXT-X-STREAM-INF:RESOLUTION=1280x720,AUDIO=\"aac\"\nvideo.m3u8\n";
        let playlist = MasterPlaylist::parse(&base_url(), content);
        assert!(playlist.videos.is_empty());
    }

    #[test]
    fn audio_codec_is_backfilled_from_the_video_directive() {
        let playlist = MasterPlaylist::parse(&base_url(), MASTER);

        assert_eq!(playlist.audios.len(), 1);
        let audio = &playlist.audios[0];
        assert_eq!(audio.group_id, "audio-aacl-96");
        assert_eq!(audio.language.as_deref(), Some("da"));
        assert_eq!(audio.name.as_deref(), Some("Dansk"));
        assert_eq!(audio.codec.as_deref(), Some("mp4a.40.2"));
    }

    #[test]
    fn audio_codec_is_unset_without_a_matching_video_directive() {
        let content = "#EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID=\"other\",LANGUAGE=\"da\",NAME=\"Dansk\",URI=\"audio.m3u8\"\n\
                       #EXT-X-STREAM-INF:BANDWIDTH=1,RESOLUTION=640x360,CODECS=\"avc1,mp4a\",AUDIO=\"aac\"\n\
                       video.m3u8\n";
        let playlist = MasterPlaylist::parse(&base_url(), content);
        assert_eq!(playlist.audios.len(), 1);
        assert_eq!(playlist.audios[0].codec, None);
    }

    #[test]
    fn subtitle_uri_is_rewritten_to_the_vtt_payload() {
        let playlist = MasterPlaylist::parse(&base_url(), MASTER);

        assert_eq!(playlist.subtitles.len(), 2);
        assert_eq!(
            playlist.subtitles[0].uri.as_str(),
            "https://drtv-cdn.example.com/title/subtitles/da.vtt"
        );
        assert_eq!(
            playlist.subtitles[1].uri.as_str(),
            "https://drtv-cdn.example.com/title/subtitles/da-hoh.vtt"
        );
    }

    #[test]
    fn attribute_values_decode_quoted_and_bare_tokens() {
        let attrs = AttributeMap::parse(
            "#EXT-X-STREAM-INF:BANDWIDTH=2000000,RESOLUTION=1280x720,CODECS=\"avc1.64001F,mp4a.40.2\",NAME=\"A, B\"",
        );
        assert_eq!(attrs.get("bandwidth"), Some("2000000"));
        assert_eq!(attrs.get("resolution"), Some("1280x720"));
        assert_eq!(attrs.get("codecs"), Some("avc1.64001F,mp4a.40.2"));
        assert_eq!(attrs.get("name"), Some("A, B"));
        assert_eq!(attrs.get("BANDWIDTH"), None, "keys are lowercased");
    }

    #[test]
    fn extract_map_uri_returns_none_without_a_map_line() {
        let content = "#EXTM3U\n#EXT-X-TARGETDURATION:10\nsegment.mp4\n";
        assert!(extract_map_uri(content, &base_url()).is_none());
    }

    #[test]
    fn extract_map_uri_decodes_and_resolves() {
        let content = "#EXTM3U\n#EXT-X-MAP:URI=\"init%2Dsegment.mp4\"\n";
        let uri = extract_map_uri(content, &base_url()).unwrap();
        assert_eq!(
            uri.as_str(),
            "https://drtv-cdn.example.com/title/init-segment.mp4"
        );
    }
}
