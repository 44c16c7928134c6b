use super::file_id::types::FileId;


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Document,
    Photo,
    Sticker,
    Animation,
    Video,
    Voice,
    VideoNote,
}

impl MediaKind {
    /// Order in which attachments are looked up on a message.
    pub const PRIORITY: [MediaKind; 8] = [
        MediaKind::Audio,
        MediaKind::Document,
        MediaKind::Photo,
        MediaKind::Sticker,
        MediaKind::Animation,
        MediaKind::Video,
        MediaKind::Voice,
        MediaKind::VideoNote,
    ];

    /// Lower-cased type name of the attachment, e.g. `videonote`.
    pub fn type_name(self) -> &'static str {
        match self {
            MediaKind::Audio => "audio",
            MediaKind::Document => "document",
            MediaKind::Photo => "photo",
            MediaKind::Sticker => "sticker",
            MediaKind::Animation => "animation",
            MediaKind::Video => "video",
            MediaKind::Voice => "voice",
            MediaKind::VideoNote => "videonote",
        }
    }
}


#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Media {
    pub kind: MediaKind,
    pub file_id: Option<String>,
    pub file_unique_id: Option<String>,
    pub file_size: Option<u64>,
    pub file_name: Option<String>,
}

impl Media {
    pub fn new(kind: MediaKind) -> Self {
        Self {
            kind,
            file_id: None,
            file_unique_id: None,
            file_size: None,
            file_name: None,
        }
    }

    pub fn file_id(&self) -> Option<&str> {
        self.file_id.as_deref()
    }

    pub fn file_unique_id(&self) -> Option<&str> {
        self.file_unique_id.as_deref()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }
}


#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaMessage {
    pub attachments: Vec<Media>,
    pub caption: Option<String>,
    pub empty: bool,
}

impl MediaMessage {
    pub fn with_media(media: Media) -> Self {
        Self {
            attachments: vec![media],
            ..Default::default()
        }
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn attachment(&self, kind: MediaKind) -> Option<&Media> {
        self.attachments.iter().find(|media| media.kind == kind)
    }
}


pub fn get_media(message: &MediaMessage) -> Option<&Media> {
    MediaKind::PRIORITY
        .iter()
        .find_map(|kind| message.attachment(*kind))
}

pub fn get_unique_id(message: &MediaMessage) -> Option<&str> {
    get_media(message).and_then(Media::file_unique_id)
}

pub fn get_hash(message: &MediaMessage) -> String {
    match get_unique_id(message) {
        Some(unique_id) => unique_id.chars().take(6).collect(),
        None => String::new(),
    }
}

pub fn get_file_size(message: &MediaMessage) -> u64 {
    get_media(message)
        .and_then(|media| media.file_size)
        .unwrap_or(0)
}

pub fn parse_file_id(message: &MediaMessage) -> Option<FileId> {
    let file_id = get_media(message)?.file_id()?;

    FileId::decode(file_id).ok()
}
