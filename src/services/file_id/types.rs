use base64::{engine::general_purpose, Engine};
use serde::{Serialize, Serializer};


#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    Thumbnail,
    ChatPhoto,
    Photo,
    Voice,
    Video,
    Document,
    Encrypted,
    Temp,
    Sticker,
    Audio,
    Animation,
    EncryptedThumbnail,
    Wallpaper,
    VideoNote,
    SecureRaw,
    Secure,
    Background,
    DocumentAsFile,
}

impl FileType {
    pub fn from_id(id: i32) -> Option<Self> {
        let file_type = match id {
            0 => Self::Thumbnail,
            1 => Self::ChatPhoto,
            2 => Self::Photo,
            3 => Self::Voice,
            4 => Self::Video,
            5 => Self::Document,
            6 => Self::Encrypted,
            7 => Self::Temp,
            8 => Self::Sticker,
            9 => Self::Audio,
            10 => Self::Animation,
            11 => Self::EncryptedThumbnail,
            12 => Self::Wallpaper,
            13 => Self::VideoNote,
            14 => Self::SecureRaw,
            15 => Self::Secure,
            16 => Self::Background,
            17 => Self::DocumentAsFile,
            _ => return None,
        };

        Some(file_type)
    }

    pub fn id(self) -> i32 {
        self as i32
    }

    /// Photo-like files carry a volume id and a thumbnail source after the
    /// media id; everything else is addressed as a document.
    pub fn is_photo(self) -> bool {
        matches!(self, Self::Thumbnail | Self::ChatPhoto | Self::Photo)
    }
}


#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ThumbnailSource {
    Legacy {
        secret: i64,
        local_id: i32,
    },
    Thumbnail {
        thumbnail_file_type: FileType,
        thumbnail_size: char,
        local_id: i32,
    },
    ChatPhotoSmall {
        chat_id: i64,
        chat_access_hash: i64,
        local_id: i32,
    },
    ChatPhotoBig {
        chat_id: i64,
        chat_access_hash: i64,
        local_id: i32,
    },
    StickerSetThumbnail {
        sticker_set_id: i64,
        sticker_set_access_hash: i64,
        local_id: i32,
    },
}

impl ThumbnailSource {
    pub fn id(&self) -> i32 {
        match self {
            Self::Legacy { .. } => 0,
            Self::Thumbnail { .. } => 1,
            Self::ChatPhotoSmall { .. } => 2,
            Self::ChatPhotoBig { .. } => 3,
            Self::StickerSetThumbnail { .. } => 4,
        }
    }
}


#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FileLocation {
    Web {
        url: String,
        access_hash: i64,
    },
    Document {
        #[serde(serialize_with = "serialize_b64")]
        file_reference: Vec<u8>,
        media_id: i64,
        access_hash: i64,
    },
    Photo {
        #[serde(serialize_with = "serialize_b64")]
        file_reference: Vec<u8>,
        media_id: i64,
        access_hash: i64,
        volume_id: i64,
        thumbnail: ThumbnailSource,
    },
}


/// Structured form of a Bot API `file_id` token.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FileId {
    pub major: u8,
    pub minor: u8,
    pub file_type: FileType,
    pub dc_id: i32,
    pub location: FileLocation,
}

impl FileId {
    pub fn media_id(&self) -> Option<i64> {
        match &self.location {
            FileLocation::Web { .. } => None,
            FileLocation::Document { media_id, .. } | FileLocation::Photo { media_id, .. } => {
                Some(*media_id)
            }
        }
    }
}


fn serialize_b64<S>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&general_purpose::STANDARD.encode(data))
}
