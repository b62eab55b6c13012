//! Submission-side validation, mirroring the storage service rules.
//!
//! The queue itself admits any submission as `Waiting`; Transfer Client
//! implementations call these helpers before moving bytes, so a file
//! that the storage service would reject fails immediately with a
//! `Permanent` classification.

use prephub_protocol::FileCategory;
use prephub_protocol::constants::{MAX_FILE_NAME_LEN, MAX_UPLOAD_SIZE};

use crate::client::TransferJob;
use crate::error::TransferError;

/// Makes a file name safe for the remote object path: characters
/// outside letters, digits, `.`, `_` and `-` become `_`, and the result
/// is capped at [`MAX_FILE_NAME_LEN`] characters.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_FILE_NAME_LEN)
        .collect()
}

/// Maps a file name to its category and MIME type by extension.
pub fn category_for_name(name: &str) -> (FileCategory, &'static str) {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => (FileCategory::Image, "image/jpeg"),
        "png" => (FileCategory::Image, "image/png"),
        "gif" => (FileCategory::Image, "image/gif"),
        "webp" => (FileCategory::Image, "image/webp"),
        "bmp" => (FileCategory::Image, "image/bmp"),
        "pdf" => (FileCategory::Document, "application/pdf"),
        "doc" => (FileCategory::Document, "application/msword"),
        "docx" => (
            FileCategory::Document,
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        ),
        "txt" => (FileCategory::Document, "text/plain"),
        "rtf" => (FileCategory::Document, "application/rtf"),
        _ => (FileCategory::Other, "application/octet-stream"),
    }
}

/// Checks a job against the storage limits before any bytes move.
pub fn validate_job(job: &TransferJob) -> Result<(), TransferError> {
    if job.display_name.is_empty() {
        return Err(TransferError::Validation("file name is required".into()));
    }
    if job.declared_size > MAX_UPLOAD_SIZE {
        return Err(TransferError::SizeLimit {
            size: job.declared_size,
            limit: MAX_UPLOAD_SIZE,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use prephub_protocol::{ErrorClass, UploadDestination};
    use std::path::PathBuf;

    fn job(name: &str, size: i64) -> TransferJob {
        TransferJob {
            task_id: "t1".into(),
            attempt: 1,
            source_path: PathBuf::from("/tmp").join(name),
            display_name: name.into(),
            declared_size: size,
            destination: UploadDestination {
                assignment_id: 1,
                student_id: 2,
                category: FileCategory::Other,
            },
        }
    }

    #[test]
    fn sanitize_replaces_unsafe_characters() {
        assert_eq!(sanitize_file_name("my essay (v2).pdf"), "my_essay__v2_.pdf");
        assert_eq!(sanitize_file_name("a/b\\c.txt"), "a_b_c.txt");
        // Unicode letters survive: submissions are commonly named in
        // Chinese.
        assert_eq!(sanitize_file_name("第3章笔记.pdf"), "第3章笔记.pdf");
    }

    #[test]
    fn sanitize_caps_length() {
        let long = "x".repeat(500);
        assert_eq!(sanitize_file_name(&long).chars().count(), MAX_FILE_NAME_LEN);
    }

    #[test]
    fn categories_by_extension() {
        assert_eq!(
            category_for_name("photo.JPG"),
            (FileCategory::Image, "image/jpeg")
        );
        assert_eq!(
            category_for_name("notes.pdf"),
            (FileCategory::Document, "application/pdf")
        );
        assert_eq!(
            category_for_name("archive.zip"),
            (FileCategory::Other, "application/octet-stream")
        );
        assert_eq!(
            category_for_name("noextension"),
            (FileCategory::Other, "application/octet-stream")
        );
    }

    #[test]
    fn oversize_job_is_rejected_permanently() {
        let err = validate_job(&job("big.bin", MAX_UPLOAD_SIZE + 1)).unwrap_err();
        assert!(matches!(err, TransferError::SizeLimit { .. }));
        assert_eq!(err.class(), ErrorClass::Permanent);
    }

    #[test]
    fn unnamed_job_is_rejected() {
        let err = validate_job(&job("", 100)).unwrap_err();
        assert!(matches!(err, TransferError::Validation(_)));
    }

    #[test]
    fn job_within_limits_passes() {
        assert!(validate_job(&job("ok.png", 1024)).is_ok());
    }
}
