use std::sync::LazyLock;

use regex::Regex;

use crate::{
    error::{DrtvError, DrtvResult},
    extract::VideoInfo,
};

static TEMPLATE_KEY_REGEXP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\w+)\}").unwrap());
static FORBIDDEN_CHARS_REGEXP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*]"#).unwrap());

/// Builds the output base name, either from a user template with `{key}`
/// placeholders or from the default `Title S01E02 - Episode [id]` shapes.
///
/// A template key that is unknown, or known but unset for this item, is an
/// error; season and episode numbers are zero-padded to two digits.
pub fn generate_filename(info: &VideoInfo, template: Option<&str>) -> DrtvResult<String> {
    let filename = match template {
        Some(template) => {
            let mut filename = template.to_string();
            for capture in TEMPLATE_KEY_REGEXP.captures_iter(template) {
                let key = &capture[1];
                let value = template_value(info, &key.to_lowercase())
                    .ok_or_else(|| DrtvError::TemplateKey(key.to_string()))?;
                filename = filename.replace(&format!("{{{key}}}"), &value);
            }
            filename
        }
        None => match (info.season_number, info.episode_number) {
            (Some(season), Some(episode)) => format!(
                "{} S{season:02}E{episode:02} - {} [{}]",
                info.title,
                info.episode_name.as_deref().unwrap_or_default(),
                info.id
            ),
            _ => match &info.year {
                Some(year) => format!("{} ({year}) [{}]", info.title, info.id),
                None => format!("{} [{}]", info.title, info.id),
            },
        },
    };

    Ok(sanitize_filename(&filename))
}

fn template_value(info: &VideoInfo, key: &str) -> Option<String> {
    match key {
        "id" => Some(info.id.clone()),
        "title" => Some(info.title.clone()),
        "description" => info.description.clone(),
        "duration" => info.duration.map(|duration| duration.to_string()),
        "year" => info.year.clone(),
        "season_number" => info.season_number.map(|number| format!("{number:02}")),
        "episode_number" => info.episode_number.map(|number| format!("{number:02}")),
        "episode_name" => info.episode_name.clone(),
        _ => None,
    }
}

/// Replaces characters that are unsafe in file names.
pub fn sanitize_filename(filename: &str) -> String {
    FORBIDDEN_CHARS_REGEXP
        .replace_all(filename, " - ")
        .replace("  ", " ")
}
