use crate::playlist::MasterPlaylist;

const HEADER: [&str; 9] = [
    "ID",
    "EXT",
    "FPS",
    "RESOLUTION",
    "TBR",
    "VBR",
    "VCODEC",
    "ACODEC",
    "PROTOCOL",
];

/// Renders every candidate stream of a master playlist as a table.
///
/// Pure projection of the parsed manifest; no selection logic.
pub fn render_format_table(playlist: &MasterPlaylist) -> String {
    let mut rows: Vec<Vec<String>> = vec![HEADER.iter().map(|s| s.to_string()).collect()];

    for audio in &playlist.audios {
        let language = audio.language.as_deref().unwrap_or("und");
        let name = audio.name.as_deref().unwrap_or_default();
        rows.push(vec![
            format!("audio_{}-{name}-{language}", audio.group_id),
            "mp4".to_string(),
            "n/a".to_string(),
            "audio only".to_string(),
            "n/a".to_string(),
            "n/a".to_string(),
            "audio only".to_string(),
            format!("[{language}] {name}"),
            "m3u8".to_string(),
        ]);
    }

    for subtitle in &playlist.subtitles {
        let language = subtitle.language.as_deref().unwrap_or("und");
        let name = subtitle.name.as_deref().unwrap_or_default();
        rows.push(vec![
            format!("subs_{name}-{language}"),
            "vtt".to_string(),
            "n/a".to_string(),
            "subtitles".to_string(),
            "n/a".to_string(),
            "n/a".to_string(),
            "sub only".to_string(),
            format!("[{language}] {name}"),
            "m3u8".to_string(),
        ]);
    }

    for video in &playlist.videos {
        rows.push(vec![
            format!("video_{}", video.bandwidth),
            "mp4".to_string(),
            video.frame_rate.clone().unwrap_or_else(|| "n/a".to_string()),
            video.resolution.clone(),
            format!("{}k", video.bandwidth / 1000),
            video
                .average_bandwidth
                .map(|bandwidth| format!("{}k", bandwidth / 1000))
                .unwrap_or_else(|| "n/a".to_string()),
            video.codec.clone().unwrap_or_else(|| "n/a".to_string()),
            "video only".to_string(),
            "m3u8".to_string(),
        ]);
    }

    let widths: Vec<usize> = (0..HEADER.len())
        .map(|column| {
            rows.iter()
                .map(|row| row[column].chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();
    let total_width = widths.iter().sum::<usize>() + 3 * (widths.len() - 1);
    let separator = "─".repeat(total_width);

    let mut table = String::new();
    table.push('\n');
    table.push_str(&separator);
    table.push('\n');
    for (index, row) in rows.iter().enumerate() {
        let line = row
            .iter()
            .zip(widths.iter().copied())
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join(" │ ");
        table.push_str(line.trim_end());
        table.push('\n');
        if index == 0 {
            table.push_str(&separator);
            table.push('\n');
        }
    }
    table.push_str(&separator);
    table.push('\n');
    table
}
