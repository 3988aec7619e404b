use drtv::{
    download::{DownloadOptions, Downloader},
    extract::{InfoExtractor, SeasonExtractor, SeasonInfo, SeriesExtractor},
    util::{http::HttpClient, url::is_valid_drtv_url},
    DrtvError,
};

#[derive(clap::Parser, Debug, Clone)]
pub struct DrtvDlArgs {
    /// Debug output
    #[clap(long, alias = "debug")]
    pub verbose: bool,

    /// Desired video resolution (e.g. 1080p, 720p)
    #[clap(long, default_value = "360p")]
    resolution: String,

    /// Download with subtitles
    #[clap(long)]
    include_subs: bool,

    /// User-custom naming template, e.g. "{title} E{episode_number} {year} [{id}]"
    #[clap(long)]
    ntmpl: Option<String>,

    /// Use the specified proxy for all requests, in host:port format
    #[clap(long)]
    proxy: Option<String>,

    /// List available formats instead of downloading
    #[clap(long)]
    list_formats: bool,

    /// Timeout seconds for each HTTP connection
    #[clap(long, default_value = "10")]
    timeout: u64,

    /// URL of the video, season or series to download
    url: String,
}

impl DrtvDlArgs {
    pub async fn run(self) -> anyhow::Result<()> {
        if !is_valid_drtv_url(&self.url) {
            return Err(DrtvError::InvalidUrl(self.url).into());
        }

        log::info!("Processing URL: {}", self.url);
        let client = HttpClient::new(self.proxy.as_deref(), self.timeout)?;
        let extractor = InfoExtractor::new(client.clone()).await?;
        let downloader = Downloader::new(client);
        let options = DownloadOptions {
            resolution: self.resolution,
            include_subtitles: self.include_subs,
            list_formats: self.list_formats,
            naming_template: self.ntmpl,
        };

        if self.url.contains("/drtv/serie/") {
            log::info!("Identified as a series URL");
            let seasons = SeriesExtractor::new(&extractor).extract(&self.url).await?;
            let total = seasons.len();
            for (index, season) in seasons.iter().enumerate() {
                log::info!("Processing season {} of {total}", index + 1);
                download_season(&extractor, &downloader, season, &options).await?;
            }
        } else if self.url.contains("/drtv/saeson/") {
            log::info!("Identified as a season URL");
            let season = SeasonExtractor::new(&extractor).extract(&self.url).await?;
            if let Some(number) = season.season_number {
                log::info!("Starting download of season {number}");
            }
            download_season(&extractor, &downloader, &season, &options).await?;
        } else {
            log::info!("Identified as a single item URL");
            let info = extractor.extract(&self.url).await?;
            downloader.download(&info, &options).await?;
        }

        Ok(())
    }
}

/// Downloads a season episode by episode. A failure on one episode is
/// reported and does not stop the ones that follow.
async fn download_season(
    extractor: &InfoExtractor,
    downloader: &Downloader,
    season: &SeasonInfo,
    options: &DownloadOptions,
) -> anyhow::Result<()> {
    let total = season.episode_urls.len();
    for (index, episode_url) in season.episode_urls.iter().enumerate() {
        log::info!("Processing episode {} of {total}", index + 1);
        let info = extractor.extract(episode_url).await?;
        if let Err(error) = downloader.download(&info, options).await {
            log::error!("{episode_url}: {error}");
        }
    }
    Ok(())
}
