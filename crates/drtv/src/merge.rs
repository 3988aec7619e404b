use std::path::Path;

use tokio::process::Command;

use crate::error::{DrtvError, DrtvResult};

/// Muxes the elementary streams into one container with ffmpeg, copying
/// codecs.
///
/// The subtitle codec follows the output container: SubRip for mkv/webm,
/// mov_text for mp4/mov. Any other container cannot carry the subtitle
/// track and fails before ffmpeg is spawned.
pub async fn merge_streams(
    video: &Path,
    audio: &Path,
    subtitle: Option<&Path>,
    output: &Path,
) -> DrtvResult<()> {
    let ffmpeg = which::which("ffmpeg")?;

    let mut command = Command::new(ffmpeg);
    command.arg("-y").args(["-loglevel", "error"]);
    command.arg("-i").arg(video);
    command.arg("-i").arg(audio);
    if let Some(subtitle) = subtitle {
        command.arg("-i").arg(subtitle);
    }
    command.args(["-c:v", "copy", "-c:a", "copy"]);
    if subtitle.is_some() {
        command.args(["-c:s", subtitle_codec(output)?]);
    }
    command.arg(output);

    log::info!("Merging streams...");
    let result = command.output().await?;
    if !result.status.success() {
        return Err(DrtvError::MergeError(
            String::from_utf8_lossy(&result.stderr).trim().to_string(),
        ));
    }

    Ok(())
}

fn subtitle_codec(output: &Path) -> DrtvResult<&'static str> {
    let container = output
        .extension()
        .and_then(|extension| extension.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    match container.as_str() {
        "mkv" | "webm" => Ok("srt"),
        "mp4" | "mov" => Ok("mov_text"),
        _ => Err(DrtvError::ContainerNotSupported(container)),
    }
}
