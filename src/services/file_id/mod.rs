pub mod types;

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};

use self::types::{FileId, FileLocation, FileType, ThumbnailSource};


const WEB_LOCATION_FLAG: i32 = 1 << 24;
const FILE_REFERENCE_FLAG: i32 = 1 << 25;

const DEFAULT_MAJOR: u8 = 4;
const DEFAULT_MINOR: u8 = 30;

// Tokens are url-safe base64 without padding, but tolerate padded input.
const TOKEN_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);


#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error("file id is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("file id ended unexpectedly")]
    UnexpectedEnd,

    #[error("unknown file type {0}")]
    UnknownFileType(i32),

    #[error("unknown thumbnail source {0}")]
    UnknownThumbnailSource(i32),

    #[error("invalid thumbnail size {0}")]
    InvalidThumbnailSize(i32),
}


fn rle_decode(data: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len());
    let mut zero = false;

    for &byte in data {
        if byte == 0 {
            zero = true;
            continue;
        }

        if zero {
            result.resize(result.len() + byte as usize, 0);
            zero = false;
        } else {
            result.push(byte);
        }
    }

    result
}

fn rle_encode(data: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len());
    let mut zeros: u8 = 0;

    for &byte in data {
        if byte == 0 {
            if zeros == u8::MAX {
                result.extend([0, zeros]);
                zeros = 0;
            }
            zeros += 1;
            continue;
        }

        if zeros > 0 {
            result.extend([0, zeros]);
            zeros = 0;
        }
        result.push(byte);
    }

    if zeros > 0 {
        result.extend([0, zeros]);
    }

    result
}


struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8], DecodeError> {
        let end = self.pos.checked_add(count).ok_or(DecodeError::UnexpectedEnd)?;
        let chunk = self.data.get(self.pos..end).ok_or(DecodeError::UnexpectedEnd)?;
        self.pos = end;
        Ok(chunk)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut buf = [0; N];
        buf.copy_from_slice(self.take(N)?);
        Ok(buf)
    }

    fn read_i32(&mut self) -> Result<i32, DecodeError> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    fn read_i64(&mut self) -> Result<i64, DecodeError> {
        Ok(i64::from_le_bytes(self.read_array()?))
    }

    /// TL-serialized byte string: short or long length prefix, padded to four bytes.
    fn read_bytes(&mut self) -> Result<Vec<u8>, DecodeError> {
        let [first] = self.read_array::<1>()?;

        let (length, padding) = if first <= 253 {
            let length = first as usize;
            (length, (4 - (length + 1) % 4) % 4)
        } else {
            let [a, b, c] = self.read_array::<3>()?;
            let length = u32::from_le_bytes([a, b, c, 0]) as usize;
            (length, (4 - length % 4) % 4)
        };

        let value = self.take(length)?.to_vec();
        self.take(padding)?;

        Ok(value)
    }

    fn read_string(&mut self) -> Result<String, DecodeError> {
        Ok(String::from_utf8_lossy(&self.read_bytes()?).into_owned())
    }
}


fn write_bytes(buf: &mut Vec<u8>, value: &[u8]) {
    let length = value.len();

    let padding = if length <= 253 {
        buf.push(length as u8);
        (4 - (length + 1) % 4) % 4
    } else {
        buf.push(254);
        buf.extend_from_slice(&(length as u32).to_le_bytes()[..3]);
        (4 - length % 4) % 4
    };

    buf.extend_from_slice(value);
    buf.resize(buf.len() + padding, 0);
}


fn read_thumbnail_source(
    reader: &mut Reader,
    major: u8,
) -> Result<ThumbnailSource, DecodeError> {
    let source_id = if major < 4 { 0 } else { reader.read_i32()? };

    let source = match source_id {
        0 => ThumbnailSource::Legacy {
            secret: reader.read_i64()?,
            local_id: reader.read_i32()?,
        },
        1 => {
            let file_type_id = reader.read_i32()?;
            let thumbnail_file_type = FileType::from_id(file_type_id)
                .ok_or(DecodeError::UnknownFileType(file_type_id))?;

            let size = reader.read_i32()?;
            let thumbnail_size = u32::try_from(size)
                .ok()
                .and_then(char::from_u32)
                .ok_or(DecodeError::InvalidThumbnailSize(size))?;

            ThumbnailSource::Thumbnail {
                thumbnail_file_type,
                thumbnail_size,
                local_id: reader.read_i32()?,
            }
        }
        2 => ThumbnailSource::ChatPhotoSmall {
            chat_id: reader.read_i64()?,
            chat_access_hash: reader.read_i64()?,
            local_id: reader.read_i32()?,
        },
        3 => ThumbnailSource::ChatPhotoBig {
            chat_id: reader.read_i64()?,
            chat_access_hash: reader.read_i64()?,
            local_id: reader.read_i32()?,
        },
        4 => ThumbnailSource::StickerSetThumbnail {
            sticker_set_id: reader.read_i64()?,
            sticker_set_access_hash: reader.read_i64()?,
            local_id: reader.read_i32()?,
        },
        other => return Err(DecodeError::UnknownThumbnailSource(other)),
    };

    Ok(source)
}

fn write_thumbnail_source(buf: &mut Vec<u8>, source: &ThumbnailSource, major: u8) {
    if major >= 4 {
        buf.extend_from_slice(&source.id().to_le_bytes());
    }

    match source {
        ThumbnailSource::Legacy { secret, local_id } => {
            buf.extend_from_slice(&secret.to_le_bytes());
            buf.extend_from_slice(&local_id.to_le_bytes());
        }
        ThumbnailSource::Thumbnail {
            thumbnail_file_type,
            thumbnail_size,
            local_id,
        } => {
            buf.extend_from_slice(&thumbnail_file_type.id().to_le_bytes());
            buf.extend_from_slice(&(*thumbnail_size as i32).to_le_bytes());
            buf.extend_from_slice(&local_id.to_le_bytes());
        }
        ThumbnailSource::ChatPhotoSmall {
            chat_id,
            chat_access_hash,
            local_id,
        }
        | ThumbnailSource::ChatPhotoBig {
            chat_id,
            chat_access_hash,
            local_id,
        } => {
            buf.extend_from_slice(&chat_id.to_le_bytes());
            buf.extend_from_slice(&chat_access_hash.to_le_bytes());
            buf.extend_from_slice(&local_id.to_le_bytes());
        }
        ThumbnailSource::StickerSetThumbnail {
            sticker_set_id,
            sticker_set_access_hash,
            local_id,
        } => {
            buf.extend_from_slice(&sticker_set_id.to_le_bytes());
            buf.extend_from_slice(&sticker_set_access_hash.to_le_bytes());
            buf.extend_from_slice(&local_id.to_le_bytes());
        }
    }
}


impl FileId {
    pub fn new(file_type: FileType, dc_id: i32, location: FileLocation) -> Self {
        Self {
            major: DEFAULT_MAJOR,
            minor: DEFAULT_MINOR,
            file_type,
            dc_id,
            location,
        }
    }

    pub fn decode(token: &str) -> Result<Self, DecodeError> {
        let decoded = rle_decode(&TOKEN_ENGINE.decode(token)?);

        let (&major, rest) = decoded.split_last().ok_or(DecodeError::UnexpectedEnd)?;
        let (minor, body) = if major < 4 {
            (0, rest)
        } else {
            let (&minor, body) = rest.split_last().ok_or(DecodeError::UnexpectedEnd)?;
            (minor, body)
        };

        let mut reader = Reader::new(body);

        let raw_type = reader.read_i32()?;
        let dc_id = reader.read_i32()?;

        let has_web_location = raw_type & WEB_LOCATION_FLAG != 0;
        let has_file_reference = raw_type & FILE_REFERENCE_FLAG != 0;

        let type_id = raw_type & !WEB_LOCATION_FLAG & !FILE_REFERENCE_FLAG;
        let file_type = FileType::from_id(type_id).ok_or(DecodeError::UnknownFileType(type_id))?;

        if has_web_location {
            let url = reader.read_string()?;
            let access_hash = reader.read_i64()?;

            return Ok(Self {
                major,
                minor,
                file_type,
                dc_id,
                location: FileLocation::Web { url, access_hash },
            });
        }

        let file_reference = if has_file_reference {
            reader.read_bytes()?
        } else {
            vec![]
        };

        let media_id = reader.read_i64()?;
        let access_hash = reader.read_i64()?;

        let location = if file_type.is_photo() {
            let volume_id = reader.read_i64()?;
            let thumbnail = read_thumbnail_source(&mut reader, major)?;

            FileLocation::Photo {
                file_reference,
                media_id,
                access_hash,
                volume_id,
                thumbnail,
            }
        } else {
            FileLocation::Document {
                file_reference,
                media_id,
                access_hash,
            }
        };

        Ok(Self {
            major,
            minor,
            file_type,
            dc_id,
            location,
        })
    }

    pub fn encode(&self) -> String {
        let mut buf = Vec::new();

        let mut raw_type = self.file_type.id();
        match &self.location {
            FileLocation::Web { .. } => raw_type |= WEB_LOCATION_FLAG,
            FileLocation::Document { file_reference, .. }
            | FileLocation::Photo { file_reference, .. } => {
                if !file_reference.is_empty() {
                    raw_type |= FILE_REFERENCE_FLAG;
                }
            }
        }

        buf.extend_from_slice(&raw_type.to_le_bytes());
        buf.extend_from_slice(&self.dc_id.to_le_bytes());

        match &self.location {
            FileLocation::Web { url, access_hash } => {
                write_bytes(&mut buf, url.as_bytes());
                buf.extend_from_slice(&access_hash.to_le_bytes());
            }
            FileLocation::Document {
                file_reference,
                media_id,
                access_hash,
            } => {
                if !file_reference.is_empty() {
                    write_bytes(&mut buf, file_reference);
                }
                buf.extend_from_slice(&media_id.to_le_bytes());
                buf.extend_from_slice(&access_hash.to_le_bytes());
            }
            FileLocation::Photo {
                file_reference,
                media_id,
                access_hash,
                volume_id,
                thumbnail,
            } => {
                if !file_reference.is_empty() {
                    write_bytes(&mut buf, file_reference);
                }
                buf.extend_from_slice(&media_id.to_le_bytes());
                buf.extend_from_slice(&access_hash.to_le_bytes());
                buf.extend_from_slice(&volume_id.to_le_bytes());
                write_thumbnail_source(&mut buf, thumbnail, self.major);
            }
        }

        if self.major >= 4 {
            buf.push(self.minor);
        }
        buf.push(self.major);

        TOKEN_ENGINE.encode(rle_encode(&buf))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn document_id() -> FileId {
        FileId::new(
            FileType::Document,
            2,
            FileLocation::Document {
                file_reference: vec![1, 0, 0, 0, 7, 42],
                media_id: 5_368_762_813_254_091_526,
                access_hash: -1_234_567_890_123,
            },
        )
    }

    #[test]
    fn test_rle_decode_expands_zero_runs() {
        assert_eq!(rle_decode(&[1, 0, 3, 2]), vec![1, 0, 0, 0, 2]);
        assert_eq!(rle_decode(&[0, 2]), vec![0, 0]);
        assert_eq!(rle_decode(&[5, 0]), vec![5]);
    }

    #[test]
    fn test_rle_encode_compresses_zero_runs() {
        assert_eq!(rle_encode(&[1, 0, 0, 0, 2]), vec![1, 0, 3, 2]);
        assert_eq!(rle_encode(&[0; 300]), vec![0, 255, 0, 45]);
    }

    #[test]
    fn test_decode_handcrafted_document() {
        let mut raw = Vec::new();
        raw.extend_from_slice(&5i32.to_le_bytes());
        raw.extend_from_slice(&4i32.to_le_bytes());
        raw.extend_from_slice(&77i64.to_le_bytes());
        raw.extend_from_slice(&(-3i64).to_le_bytes());
        raw.push(DEFAULT_MINOR);
        raw.push(DEFAULT_MAJOR);

        let token = TOKEN_ENGINE.encode(rle_encode(&raw));
        let file_id = FileId::decode(&token).unwrap();

        assert_eq!(file_id.file_type, FileType::Document);
        assert_eq!(file_id.dc_id, 4);
        assert_eq!(file_id.major, 4);
        assert_eq!(file_id.minor, 30);
        assert_eq!(
            file_id.location,
            FileLocation::Document {
                file_reference: vec![],
                media_id: 77,
                access_hash: -3,
            }
        );
        assert_eq!(file_id.media_id(), Some(77));
    }

    #[test]
    fn test_decode_legacy_photo_without_minor() {
        let mut raw = Vec::new();
        raw.extend_from_slice(&2i32.to_le_bytes());
        raw.extend_from_slice(&1i32.to_le_bytes());
        raw.extend_from_slice(&10i64.to_le_bytes());
        raw.extend_from_slice(&11i64.to_le_bytes());
        raw.extend_from_slice(&12i64.to_le_bytes());
        raw.extend_from_slice(&13i64.to_le_bytes());
        raw.extend_from_slice(&14i32.to_le_bytes());
        raw.push(2);

        let token = TOKEN_ENGINE.encode(rle_encode(&raw));
        let file_id = FileId::decode(&token).unwrap();

        assert_eq!(file_id.major, 2);
        assert_eq!(file_id.minor, 0);
        assert_eq!(
            file_id.location,
            FileLocation::Photo {
                file_reference: vec![],
                media_id: 10,
                access_hash: 11,
                volume_id: 12,
                thumbnail: ThumbnailSource::Legacy {
                    secret: 13,
                    local_id: 14,
                },
            }
        );
    }

    const FILE_REFERENCE: [u8; 25] = [
        0x01, 0x00, 0x00, 0x0a, 0x2b, 0x65, 0xf0, 0xc3, 0x1d, 0x9e, 0x4a, 0x7b, 0x55, 0xc2, 0xe1,
        0xf0, 0x8d, 0x3a, 0x6b, 0x9c, 0x04, 0xe7, 0xf1, 0x2a, 0x3b,
    ];

    #[test]
    fn test_decode_bot_api_document_token() {
        let file_id = FileId::decode(
            "BQACAgIAAxkBAAIKK2Xwwx2eSntVwuHwjTprnATn8So7AAIDQbO7idiQSr1ZJm5Qp4uiHgQ",
        )
        .unwrap();

        assert_eq!(file_id.major, 4);
        assert_eq!(file_id.minor, 30);
        assert_eq!(file_id.file_type, FileType::Document);
        assert_eq!(file_id.dc_id, 2);
        assert_eq!(
            file_id.location,
            FileLocation::Document {
                file_reference: FILE_REFERENCE.to_vec(),
                media_id: 5_373_032_441_524_207_875,
                access_hash: -6_734_104_853_915_215_427,
            }
        );
    }

    #[test]
    fn test_decode_bot_api_photo_token() {
        let token = "AgACAgQAAxkBAAIKK2Xwwx2eSntVwuHwjTprnATn8So7AAIY2q5wZIFfS537FJVqdBhjAAgBAAMCAAN5AAceBA";
        let file_id = FileId::decode(token).unwrap();

        assert_eq!(file_id.file_type, FileType::Photo);
        assert_eq!(file_id.dc_id, 4);
        assert_eq!(
            file_id.location,
            FileLocation::Photo {
                file_reference: FILE_REFERENCE.to_vec(),
                media_id: 5_431_201_944_019_327_512,
                access_hash: 7_140_585_210_312_457_117,
                volume_id: 0,
                thumbnail: ThumbnailSource::Thumbnail {
                    thumbnail_file_type: FileType::Photo,
                    thumbnail_size: 'y',
                    local_id: 0,
                },
            }
        );
        assert_eq!(file_id.encode(), token);
    }

    #[test]
    fn test_document_with_file_reference_survives_encoding() {
        let file_id = document_id();
        assert_eq!(FileId::decode(&file_id.encode()).unwrap(), file_id);
    }

    #[test]
    fn test_photo_thumbnail_and_web_location_survive_encoding() {
        let photo = FileId::new(
            FileType::Photo,
            4,
            FileLocation::Photo {
                file_reference: vec![9; 300],
                media_id: 1,
                access_hash: 2,
                volume_id: 3,
                thumbnail: ThumbnailSource::Thumbnail {
                    thumbnail_file_type: FileType::Photo,
                    thumbnail_size: 'x',
                    local_id: 5,
                },
            },
        );
        assert_eq!(FileId::decode(&photo.encode()).unwrap(), photo);

        let web = FileId::new(
            FileType::Photo,
            0,
            FileLocation::Web {
                url: "https://example.com/cat.jpg".to_string(),
                access_hash: 99,
            },
        );
        assert_eq!(FileId::decode(&web.encode()).unwrap(), web);
    }

    #[test]
    fn test_decode_accepts_padded_token() {
        let token = document_id().encode();
        let padded = format!("{token}{}", "=".repeat((4 - token.len() % 4) % 4));

        assert_eq!(FileId::decode(&padded).unwrap(), document_id());
    }

    #[test]
    fn test_decode_rejects_invalid_base64() {
        assert!(matches!(
            FileId::decode("not a file id!"),
            Err(DecodeError::Base64(_))
        ));
    }

    #[test]
    fn test_decode_rejects_truncated_token() {
        assert!(matches!(FileId::decode(""), Err(DecodeError::UnexpectedEnd)));

        let token = document_id().encode();
        let raw = rle_decode(&TOKEN_ENGINE.decode(&token).unwrap());
        let truncated = [&raw[..10], &raw[raw.len() - 2..]].concat();

        assert!(matches!(
            FileId::decode(&TOKEN_ENGINE.encode(rle_encode(&truncated))),
            Err(DecodeError::UnexpectedEnd)
        ));
    }

    #[test]
    fn test_decode_rejects_unknown_file_type() {
        let mut raw = Vec::new();
        raw.extend_from_slice(&99i32.to_le_bytes());
        raw.extend_from_slice(&1i32.to_le_bytes());
        raw.extend_from_slice(&[7; 16]);
        raw.extend([DEFAULT_MINOR, DEFAULT_MAJOR]);

        assert!(matches!(
            FileId::decode(&TOKEN_ENGINE.encode(rle_encode(&raw))),
            Err(DecodeError::UnknownFileType(99))
        ));
    }
}
