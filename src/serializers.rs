use crate::services::file_id::types::FileId;

#[derive(serde::Serialize, Debug, Clone)]
pub struct FileProperties {
    pub chat_id: i64,
    pub message_id: i32,
    pub unique_id: Option<String>,
    pub hash: String,
    pub file_size: u64,
    pub file_name: String,
    pub file_id: Option<FileId>,
}
