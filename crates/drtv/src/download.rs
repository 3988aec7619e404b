use std::path::{Path, PathBuf};

use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::{fs::File, io::AsyncWriteExt};
use url::Url;

use crate::{
    error::{DrtvError, DrtvResult},
    extract::{best_format, VideoInfo},
    listing::render_format_table,
    merge::merge_streams,
    playlist::{extract_map_uri, MasterPlaylist},
    select::{select_streams, SelectedStreams},
    util::{
        filename::generate_filename,
        http::{fetch_text, HttpClient},
        subtitle::vtt_to_srt,
    },
};

/// Per-item download settings.
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// Desired video resolution, e.g. `"1080p"`.
    pub resolution: String,
    pub include_subtitles: bool,
    /// Render the format listing instead of downloading.
    pub list_formats: bool,
    /// User naming template with `{key}` placeholders.
    pub naming_template: Option<String>,
}

pub struct Downloader {
    client: HttpClient,
}

impl Downloader {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// Resolves one item into a merged `{base}.mp4` in the working
    /// directory, or renders the format listing when requested.
    pub async fn download(&self, info: &VideoInfo, options: &DownloadOptions) -> DrtvResult<()> {
        let base_filename = generate_filename(info, options.naming_template.as_deref())?;

        let stream_url = Url::parse(&best_format(&info.formats)?.url)?;
        log::info!("Downloading m3u8 manifest...");
        let manifest = fetch_text(&self.client, stream_url.clone(), None, None).await?;
        let playlist = MasterPlaylist::parse(&stream_url, &manifest);

        if options.list_formats {
            println!("{}", render_format_table(&playlist));
            return Ok(());
        }

        let output = PathBuf::from(format!("{base_filename}.mp4"));
        if output.exists() {
            log::info!("{base_filename} is already downloaded");
            return Ok(());
        }

        let streams = select_streams(&playlist, &options.resolution, options.include_subtitles)?;

        let video_file = self
            .download_stream(&streams.video.uri, &base_filename, "video")
            .await?;
        let audio_file = self
            .download_stream(&streams.audio.uri, &base_filename, "audio")
            .await?;
        let subtitle_file = self.download_subtitle(&streams, &base_filename).await?;

        log::info!("{}: Merging streams into {}", info.id, output.display());
        merge_streams(&video_file, &audio_file, subtitle_file.as_deref(), &output).await?;

        cleanup(&[Some(video_file), Some(audio_file), subtitle_file]).await;

        Ok(())
    }

    /// Fetches a rendition's own playlist and downloads its initialization
    /// segment, which DR serves as the complete elementary stream.
    async fn download_stream(
        &self,
        uri: &Url,
        base_filename: &str,
        stream_type: &str,
    ) -> DrtvResult<PathBuf> {
        let manifest = fetch_text(&self.client, uri.clone(), None, None).await?;
        let map_uri = extract_map_uri(&manifest, uri).ok_or_else(|| {
            log::error!("Could not find {stream_type} MAP URI");
            DrtvError::MapSegmentNotFound(stream_type.to_string())
        })?;

        let path = PathBuf::from(format!("{base_filename}.{stream_type}"));
        self.download_file(map_uri, &path).await?;
        log::info!("{stream_type} stream saved as {}", path.display());
        Ok(path)
    }

    async fn download_subtitle(
        &self,
        streams: &SelectedStreams,
        base_filename: &str,
    ) -> DrtvResult<Option<PathBuf>> {
        let Some(subtitle) = &streams.subtitle else {
            return Ok(None);
        };

        let vtt = fetch_text(&self.client, subtitle.uri.clone(), None, None).await?;
        let path = PathBuf::from(format!("{base_filename}.srt"));
        tokio::fs::write(&path, vtt_to_srt(&vtt)).await?;
        log::info!("Subtitles saved as {}", path.display());
        Ok(Some(path))
    }

    async fn download_file(&self, url: Url, path: &Path) -> DrtvResult<()> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DrtvError::HttpError(status));
        }

        let progress = ProgressBar::new(response.content_length().unwrap_or(0));
        progress.set_style(
            ProgressStyle::with_template(
                "{bytes}/{total_bytes} {wide_bar} {bytes_per_sec} {percent}%",
            )
            .unwrap(),
        );

        log::info!("Destination: {}", path.display());
        let mut file = File::create(path).await?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            progress.inc(chunk.len() as u64);
        }
        file.flush().await?;
        progress.finish();

        Ok(())
    }
}

async fn cleanup(files: &[Option<PathBuf>]) {
    for path in files.iter().flatten() {
        if let Err(error) = tokio::fs::remove_file(path).await {
            log::error!("Error deleting {}: {error}", path.display());
        }
    }
}
