use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use teloxide::{
    prelude::*,
    types::{ChatId, FileMeta, Message, MessageId},
    ApiError, RequestError,
};
use tracing::warn;

use super::{
    media::{Media, MediaKind, MediaMessage},
    FetchError, MessageSource,
};


pub struct RoundRobinBot {
    bots: Vec<Bot>,
    current_index: AtomicUsize,
}

impl RoundRobinBot {
    /// Panics if `bot_tokens` is empty.
    pub fn new(bot_tokens: &[String]) -> Self {
        assert!(!bot_tokens.is_empty(), "RoundRobinBot needs at least one bot token");

        RoundRobinBot {
            bots: bot_tokens.iter().map(Bot::new).collect(),
            current_index: AtomicUsize::new(0),
        }
    }

    pub fn get_bot(&self) -> &Bot {
        let index = self.current_index.fetch_add(1, Ordering::Relaxed) % self.bots.len();
        &self.bots[index]
    }
}


fn media_from_meta(kind: MediaKind, file: &FileMeta, file_name: Option<&String>) -> Media {
    Media {
        kind,
        file_id: Some(file.id.to_string()),
        file_unique_id: Some(file.unique_id.to_string()),
        file_size: Some(u64::from(file.size)),
        file_name: file_name.cloned(),
    }
}

impl From<&Message> for MediaMessage {
    fn from(message: &Message) -> Self {
        let mut attachments = vec![];

        if let Some(audio) = message.audio() {
            attachments.push(media_from_meta(
                MediaKind::Audio,
                &audio.file,
                audio.file_name.as_ref(),
            ));
        }
        if let Some(document) = message.document() {
            attachments.push(media_from_meta(
                MediaKind::Document,
                &document.file,
                document.file_name.as_ref(),
            ));
        }
        // Sizes are sorted ascending, the last one is the original.
        if let Some(photo) = message.photo().and_then(|sizes| sizes.last()) {
            attachments.push(media_from_meta(MediaKind::Photo, &photo.file, None));
        }
        if let Some(sticker) = message.sticker() {
            attachments.push(media_from_meta(MediaKind::Sticker, &sticker.file, None));
        }
        if let Some(animation) = message.animation() {
            attachments.push(media_from_meta(
                MediaKind::Animation,
                &animation.file,
                animation.file_name.as_ref(),
            ));
        }
        if let Some(video) = message.video() {
            attachments.push(media_from_meta(
                MediaKind::Video,
                &video.file,
                video.file_name.as_ref(),
            ));
        }
        if let Some(voice) = message.voice() {
            attachments.push(media_from_meta(MediaKind::Voice, &voice.file, None));
        }
        if let Some(video_note) = message.video_note() {
            attachments.push(media_from_meta(MediaKind::VideoNote, &video_note.file, None));
        }

        MediaMessage {
            attachments,
            caption: message.caption().map(str::to_string),
            empty: false,
        }
    }
}


fn fetch_error(err: RequestError) -> Result<Option<MediaMessage>, FetchError> {
    match err {
        RequestError::RetryAfter(seconds) => Err(FetchError::RetryAfter(Duration::from_secs(
            u64::from(seconds.seconds()),
        ))),
        RequestError::Api(ApiError::MessageToForwardNotFound) => Ok(None),
        err => Err(FetchError::Request(Box::new(err))),
    }
}


/// Reads messages through the Bot API, which has no call for fetching a
/// message by id: the message is forwarded into a dump chat and the copy
/// is removed afterwards.
pub struct TelegramMessageSource {
    bots: RoundRobinBot,
    dump_chat_id: ChatId,
}

impl TelegramMessageSource {
    pub fn new(bots: RoundRobinBot, dump_chat_id: i64) -> Self {
        Self {
            bots,
            dump_chat_id: ChatId(dump_chat_id),
        }
    }
}

impl MessageSource for TelegramMessageSource {
    async fn get_message(
        &self,
        chat_id: i64,
        message_id: i32,
    ) -> Result<Option<MediaMessage>, FetchError> {
        let bot = self.bots.get_bot();

        let forwarded = match bot
            .forward_message(self.dump_chat_id, ChatId(chat_id), MessageId(message_id))
            .await
        {
            Ok(v) => v,
            Err(err) => return fetch_error(err),
        };

        let message = MediaMessage::from(&forwarded);

        if let Err(err) = bot.delete_message(self.dump_chat_id, forwarded.id).await {
            warn!(
                chat_id = self.dump_chat_id.0,
                message_id = forwarded.id.0,
                error = ?err,
                "Failed to delete forwarded message"
            );
        }

        Ok(Some(message))
    }
}
