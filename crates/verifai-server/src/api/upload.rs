//! Multipart form parsing for document uploads.

use crate::api::error_response;
use crate::pipeline::UploadedDocument;
use axum::extract::multipart::{Field, MultipartError};
use axum::http::StatusCode;
use axum::response::Response;
use utoipa::ToSchema;

/// 单文件上传表单
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct DocumentUploadForm {
    /// 证件图像文件
    #[schema(value_type = String, format = Binary)]
    pub document: Vec<u8>,
}

/// 批量上传表单
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct BatchUploadForm {
    /// 批次名称（可选）
    pub name: Option<String>,
    /// 证件图像文件（可重复，最多 50 个）
    #[schema(value_type = Vec<String>, format = Binary)]
    pub documents: Vec<Vec<u8>>,
}

/// Maps a multipart read failure to the envelope, keeping axum's status
/// (413 when the body limit was hit).
pub(crate) fn multipart_error_response(trace_id: &str, err: MultipartError) -> Response {
    let status = err.status();
    let code = if status == StatusCode::PAYLOAD_TOO_LARGE {
        "payload_too_large"
    } else {
        "bad_request"
    };
    error_response(status, trace_id, code, &err.body_text())
}

pub(crate) enum FileError {
    Multipart(MultipartError),
    TooLarge { file_name: String, limit: usize },
}

impl FileError {
    pub(crate) fn into_response(self, trace_id: &str) -> Response {
        match self {
            Self::Multipart(e) => multipart_error_response(trace_id, e),
            Self::TooLarge { file_name, limit } => error_response(
                StatusCode::PAYLOAD_TOO_LARGE,
                trace_id,
                "payload_too_large",
                &format!("File '{file_name}' exceeds the {limit} byte limit"),
            ),
        }
    }
}

/// Reads a file field into memory, enforcing the per-file size cap.
pub(crate) async fn read_file(
    field: Field<'_>,
    index: usize,
    max_file_bytes: usize,
) -> Result<UploadedDocument, FileError> {
    let file_name = field
        .file_name()
        .filter(|n| !n.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("document-{}", index + 1));
    let content_type = field.content_type().map(str::to_string);
    let bytes = field.bytes().await.map_err(FileError::Multipart)?;
    if bytes.len() > max_file_bytes {
        return Err(FileError::TooLarge {
            file_name,
            limit: max_file_bytes,
        });
    }
    Ok(UploadedDocument {
        file_name,
        content_type,
        bytes: bytes.to_vec(),
    })
}
