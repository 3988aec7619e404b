use crate::{
    error::{DrtvError, DrtvResult},
    playlist::{AudioStream, MasterPlaylist, SubtitleStream, VideoStream},
};

/// One concrete (video, audio, subtitle) choice out of a master playlist.
#[derive(Debug, Clone)]
pub struct SelectedStreams {
    pub video: VideoStream,
    pub audio: AudioStream,
    pub subtitle: Option<SubtitleStream>,
}

/// Picks the streams to download for a desired resolution like `"720p"`.
///
/// The first video rendition whose height matches wins; its `AUDIO` group
/// decides the audio rendition. Subtitles are taken from the end of the
/// list, where DR sorts the most complete track. Requesting subtitles on a
/// title that has none is a warning, not an error.
pub fn select_streams(
    playlist: &MasterPlaylist,
    resolution: &str,
    include_subtitles: bool,
) -> DrtvResult<SelectedStreams> {
    let subtitle = if include_subtitles {
        let subtitle = playlist.subtitles.last();
        if subtitle.is_none() {
            log::warn!("Subtitles were requested, but the manifest offers none");
        }
        subtitle.cloned()
    } else {
        None
    };

    let height = resolution.strip_suffix('p').unwrap_or(resolution);
    let video = playlist
        .videos
        .iter()
        .find(|video| video.height() == Some(height))
        .ok_or_else(|| {
            DrtvError::StreamNotFound(format!("no video stream with resolution '{resolution}'"))
        })?;

    let audio = playlist
        .audios
        .iter()
        .find(|audio| audio.group_id == video.audio_group)
        .ok_or_else(|| {
            DrtvError::StreamNotFound(format!(
                "no audio stream for group '{}'",
                video.audio_group
            ))
        })?;

    Ok(SelectedStreams {
        video: video.clone(),
        audio: audio.clone(),
        subtitle,
    })
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::*;
    use crate::playlist::MasterPlaylist;

    fn parse(content: &str) -> MasterPlaylist {
        let base_url = Url::parse("https://drtv-cdn.example.com/title/master.m3u8").unwrap();
        MasterPlaylist::parse(&base_url, content)
    }

    #[test]
    fn selects_video_by_height_and_audio_by_group() {
        let playlist = parse(
            "#EXT-X-STREAM-INF:RESOLUTION=1280x720,BANDWIDTH=2000000,AUDIO=\"aac\",CODECS=\"avc1,mp4a\"\n\
             video.m3u8\n\
             #EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID=\"aac\",LANGUAGE=\"da\",NAME=\"Dansk\",URI=\"audio.m3u8\"\n",
        );

        let streams = select_streams(&playlist, "720p", false).unwrap();
        assert_eq!(streams.video.resolution, "1280x720");
        assert_eq!(streams.audio.group_id, "aac");
        assert_eq!(streams.audio.codec.as_deref(), Some("mp4a"));
        assert!(streams.subtitle.is_none());
    }

    #[test]
    fn unavailable_resolution_is_an_error() {
        let playlist = parse(
            "#EXT-X-STREAM-INF:RESOLUTION=1920x1080,BANDWIDTH=1,AUDIO=\"aac\"\nvideo.m3u8\n",
        );

        let error = select_streams(&playlist, "9999p", false).unwrap_err();
        assert!(matches!(error, DrtvError::StreamNotFound(_)));
        assert!(error.to_string().contains("9999p"));
    }

    #[test]
    fn missing_audio_group_is_an_error() {
        let playlist = parse(
            "#EXT-X-STREAM-INF:RESOLUTION=1920x1080,BANDWIDTH=1,AUDIO=\"surround\"\nvideo.m3u8\n\
             #EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID=\"stereo\",LANGUAGE=\"da\",NAME=\"Dansk\",URI=\"audio.m3u8\"\n",
        );

        let error = select_streams(&playlist, "1080p", false).unwrap_err();
        assert!(error.to_string().contains("surround"));
    }

    #[test]
    fn height_match_is_string_equal() {
        // "0720" is not "720"; formatting differences never match
        let playlist = parse(
            "#EXT-X-STREAM-INF:RESOLUTION=1280x0720,BANDWIDTH=1,AUDIO=\"aac\"\nvideo.m3u8\n",
        );

        assert!(select_streams(&playlist, "720p", false).is_err());
    }

    #[test]
    fn first_matching_video_wins() {
        let playlist = parse(
            "#EXT-X-STREAM-INF:RESOLUTION=1280x720,BANDWIDTH=1000,AUDIO=\"aac\"\nfirst.m3u8\n\
             #EXT-X-STREAM-INF:RESOLUTION=1280x720,BANDWIDTH=9000,AUDIO=\"aac\"\nsecond.m3u8\n\
             #EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID=\"aac\",LANGUAGE=\"da\",NAME=\"Dansk\",URI=\"audio.m3u8\"\n",
        );

        let streams = select_streams(&playlist, "720p", false).unwrap();
        assert_eq!(streams.video.bandwidth, 1000);
    }

    #[test]
    fn last_subtitle_stream_is_chosen() {
        let playlist = parse(
            "#EXT-X-MEDIA:TYPE=SUBTITLES,GROUP-ID=\"subs\",LANGUAGE=\"da\",NAME=\"Dansk\",URI=\"subs/da/playlist.m3u8\"\n\
             #EXT-X-MEDIA:TYPE=SUBTITLES,GROUP-ID=\"subs\",LANGUAGE=\"da\",NAME=\"DanishHardOfHearing\",URI=\"subs/da-hoh/playlist.m3u8\"\n\
             #EXT-X-STREAM-INF:RESOLUTION=1280x720,BANDWIDTH=1,AUDIO=\"aac\"\nvideo.m3u8\n\
             #EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID=\"aac\",LANGUAGE=\"da\",NAME=\"Dansk\",URI=\"audio.m3u8\"\n",
        );

        let streams = select_streams(&playlist, "720p", true).unwrap();
        assert_eq!(
            streams.subtitle.unwrap().name.as_deref(),
            Some("DanishHardOfHearing")
        );
    }

    #[test]
    fn audio_directive_without_display_metadata_still_selects() {
        let playlist = parse(
            "#EXT-X-STREAM-INF:RESOLUTION=1280x720,BANDWIDTH=2000000,AUDIO=\"aac\",CODECS=\"avc1,mp4a\"\n\
             video.m3u8\n\
             #EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID=\"aac\",URI=\"audio.m3u8\"\n",
        );

        let streams = select_streams(&playlist, "720p", false).unwrap();
        assert_eq!(streams.video.resolution, "1280x720");
        assert_eq!(streams.audio.group_id, "aac");
        assert_eq!(streams.audio.codec.as_deref(), Some("mp4a"));
        assert!(streams.audio.language.is_none());
    }

    #[test]
    fn requested_subtitles_may_be_absent() {
        let playlist = parse(
            "#EXT-X-STREAM-INF:RESOLUTION=1280x720,BANDWIDTH=1,AUDIO=\"aac\"\nvideo.m3u8\n\
             #EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID=\"aac\",LANGUAGE=\"da\",NAME=\"Dansk\",URI=\"audio.m3u8\"\n",
        );

        let streams = select_streams(&playlist, "720p", true).unwrap();
        assert!(streams.subtitle.is_none());
    }
}
