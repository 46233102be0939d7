//! Exam-paper PDF generation.

use tutor_backend::{ExamPdfRequest, ProgressBackend};
use tutor_domain::error::{Error, Result};
use tutor_domain::Topic;

/// Ask the backend to typeset `content` for `topic`.  Returns the URL of
/// the generated PDF.
pub async fn generate(backend: &dyn ProgressBackend, topic: &Topic, content: &str) -> Result<String> {
    if content.trim().is_empty() {
        return Err(Error::Validation("exam content is empty".into()));
    }
    let url = backend
        .generate_exam_pdf(ExamPdfRequest {
            topic_title: topic.title.clone(),
            content: content.to_owned(),
            topic_code: topic.code.clone(),
        })
        .await?;
    tracing::info!(topic_code = %topic.code, url = %url, "exam pdf generated");
    Ok(url)
}
