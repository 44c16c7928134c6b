pub mod bots;
pub mod file_id;
pub mod filename;
pub mod media;

use std::{future::Future, time::Duration};

use tracing::{error, info, warn};

use crate::serializers::FileProperties;

use self::{
    file_id::{types::FileId, DecodeError},
    filename::{get_file_name, Clock},
    media::{get_file_size, get_hash, get_media, get_unique_id, parse_file_id, MediaMessage},
};


#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct FileNotFound(pub String);


#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("rate limited, retry after {0:?}")]
    RetryAfter(Duration),

    #[error("{0}")]
    Request(#[source] Box<dyn std::error::Error + Send + Sync>),
}


#[derive(thiserror::Error, Debug)]
enum ResolveError {
    #[error(transparent)]
    NotFound(#[from] FileNotFound),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}


/// Anything that can look up a chat message by its id.
pub trait MessageSource {
    fn get_message(
        &self,
        chat_id: i64,
        message_id: i32,
    ) -> impl Future<Output = Result<Option<MediaMessage>, FetchError>> + Send;
}


async fn fetch_message<S: MessageSource>(
    source: &S,
    chat_id: i64,
    message_id: i32,
) -> Result<MediaMessage, ResolveError> {
    let message = match source.get_message(chat_id, message_id).await {
        Err(FetchError::RetryAfter(wait)) => {
            warn!(chat_id, message_id, ?wait, "Rate limited, retrying once");
            tokio::time::sleep(wait).await;
            source.get_message(chat_id, message_id).await?
        }
        other => other?,
    };

    match message {
        Some(message) if !message.empty => Ok(message),
        _ => Err(FileNotFound("Message not found".to_string()).into()),
    }
}

fn file_id_of(message: &MediaMessage) -> Result<FileId, ResolveError> {
    let media = match get_media(message) {
        Some(v) => v,
        None => return Err(FileNotFound("No media in message".to_string()).into()),
    };

    let file_id = match (media.file_id(), media.file_unique_id()) {
        (Some(file_id), Some(_)) => file_id,
        _ => return Err(FileNotFound("Media metadata incomplete".to_string()).into()),
    };

    Ok(FileId::decode(file_id)?)
}

fn normalize<T>(
    result: Result<T, ResolveError>,
    chat_id: i64,
    message_id: i32,
) -> Result<T, FileNotFound> {
    result.map_err(|err| {
        error!(chat_id, message_id, error = ?err, "Error while resolving file: {err}");
        FileNotFound(err.to_string())
    })
}


pub async fn resolve_file_id<S: MessageSource>(
    source: &S,
    chat_id: i64,
    message_id: i32,
) -> Result<FileId, FileNotFound> {
    let result = async {
        let message = fetch_message(source, chat_id, message_id).await?;
        file_id_of(&message)
    }
    .await;

    let file_id = normalize(result, chat_id, message_id)?;

    info!(
        chat_id,
        message_id,
        file_type = ?file_id.file_type,
        media_id = ?file_id.media_id(),
        "Resolved file id"
    );

    Ok(file_id)
}


pub fn get_file_properties(
    message: &MediaMessage,
    chat_id: i64,
    message_id: i32,
    clock: &impl Clock,
) -> FileProperties {
    FileProperties {
        chat_id,
        message_id,
        unique_id: get_unique_id(message).map(str::to_string),
        hash: get_hash(message),
        file_size: get_file_size(message),
        file_name: get_file_name(message, clock),
        file_id: parse_file_id(message),
    }
}

pub async fn resolve_file_properties<S: MessageSource>(
    source: &S,
    chat_id: i64,
    message_id: i32,
    clock: &impl Clock,
) -> Result<FileProperties, FileNotFound> {
    let result = async {
        let message = fetch_message(source, chat_id, message_id).await?;
        file_id_of(&message)?;
        Ok::<_, ResolveError>(get_file_properties(&message, chat_id, message_id, clock))
    }
    .await;

    let properties = normalize(result, chat_id, message_id)?;

    info!(
        chat_id,
        message_id,
        file_name = %properties.file_name,
        file_size = properties.file_size,
        "Resolved file properties"
    );

    Ok(properties)
}
