use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;

use super::media::{get_media, MediaKind, MediaMessage};


static MENTION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"@[a-zA-Z0-9_]+").unwrap());
static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").unwrap());
static ILLEGAL_CHARS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[\\/:*?"<>|]"#).unwrap());
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

// Used when the name is still empty after looking at the caption and the file itself.
const FALLBACK_EXTENSIONS: [(MediaKind, &str); 7] = [
    (MediaKind::Photo, "jpg"),
    (MediaKind::Audio, "mp3"),
    (MediaKind::Voice, "ogg"),
    (MediaKind::Video, "mp4"),
    (MediaKind::Animation, "mp4"),
    (MediaKind::VideoNote, "mp4"),
    (MediaKind::Sticker, "webp"),
];

const EXTENSION_WINDOW: usize = 5;


pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}


/// Turns a caption into something usable as a file name: first line only,
/// without mentions, links and characters that are illegal in paths.
pub fn clean_caption(caption: &str) -> String {
    if caption.is_empty() {
        return String::new();
    }

    let first_line = caption.split('\n').next().unwrap_or_default().trim();

    let name = MENTION_RE.replace_all(first_line, "");
    let name = URL_RE.replace_all(&name, "");
    let name = ILLEGAL_CHARS_RE.replace_all(&name, "");
    let name = WHITESPACE_RE.replace_all(&name, " ");

    name.trim().to_string()
}

fn extension_for_type_name(type_name: &str) -> Option<&'static str> {
    match type_name {
        "photo" => Some(".jpg"),
        "audio" => Some(".mp3"),
        "voice" => Some(".ogg"),
        "video" | "animation" | "videonote" => Some(".mp4"),
        "sticker" => Some(".webp"),
        _ => None,
    }
}

fn has_extension(name: &str) -> bool {
    let count = name.chars().count();

    name.chars()
        .skip(count.saturating_sub(EXTENSION_WINDOW))
        .any(|c| c == '.')
}

pub fn get_file_name(message: &MediaMessage, clock: &impl Clock) -> String {
    let media = match get_media(message) {
        Some(v) => v,
        None => return format!("file_{}.bin", clock.now().format(TIMESTAMP_FORMAT)),
    };

    let internal_name = media.file_name().filter(|name| !name.is_empty());
    let caption_name = message
        .caption
        .as_deref()
        .map(clean_caption)
        .filter(|name| !name.is_empty());

    let candidate = match (caption_name, internal_name) {
        (Some(caption_name), None) => Some(caption_name),
        (Some(caption_name), Some(internal_name))
            if caption_name.chars().count() > internal_name.chars().count() =>
        {
            Some(caption_name)
        }
        (_, internal_name) => internal_name.map(str::to_string),
    };

    let mut file_name = match candidate {
        Some(v) => v,
        None => {
            let extension = FALLBACK_EXTENSIONS
                .iter()
                .find(|(kind, _)| message.attachment(*kind).is_some())
                .map(|(_, extension)| *extension)
                .unwrap_or("bin");

            format!("Thunder_{}.{extension}", clock.now().format(TIMESTAMP_FORMAT))
        }
    };

    if !has_extension(&file_name) {
        if let Some(extension) = extension_for_type_name(media.kind.type_name()) {
            if !file_name.to_lowercase().ends_with(extension) {
                file_name.push_str(extension);
            }
        }
    }

    file_name
}
