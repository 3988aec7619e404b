use std::sync::LazyLock;

use regex::Regex;

static VTT_TIMESTAMP_REGEXP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{2}:\d{2}:\d{2})\.(\d{3})").unwrap());

/// Converts WebVTT subtitle text to SubRip.
///
/// DR cues carry no identifiers, so cues are renumbered from 1; timestamps
/// switch from dot to comma milliseconds.
pub fn vtt_to_srt(vtt: &str) -> String {
    let content = vtt.strip_prefix("WEBVTT\n\n").unwrap_or(vtt);
    let content = VTT_TIMESTAMP_REGEXP.replace_all(content, "$1,$2");

    let mut srt = String::new();
    for (index, cue) in content.split("\n\n").enumerate() {
        srt.push_str(&format!("{}\n{cue}\n\n", index + 1));
    }
    srt
}

#[cfg(test)]
mod tests {
    use super::vtt_to_srt;

    #[test]
    fn numbers_cues_and_rewrites_timestamps() {
        let vtt = "WEBVTT\n\n\
                   00:00:01.000 --> 00:00:04.000\nHvad siger du?\n\n\
                   00:00:05.500 --> 00:00:07.250\nIkke noget.";

        let srt = vtt_to_srt(vtt);
        assert_eq!(
            srt,
            "1\n00:00:01,000 --> 00:00:04,000\nHvad siger du?\n\n\
             2\n00:00:05,500 --> 00:00:07,250\nIkke noget.\n\n"
        );
    }

    #[test]
    fn text_without_header_is_converted_as_is() {
        let srt = vtt_to_srt("00:00:01.000 --> 00:00:02.000\nHej");
        assert!(srt.starts_with("1\n00:00:01,000 --> 00:00:02,000\nHej"));
    }
}
