//! Rate-topic and record-exam submissions.
//!
//! Both forms validate locally first; an invalid form returns
//! [`Error::Validation`] and nothing is sent.

use tutor_backend::{ProgressBackend, RateTopicRequest, RecordExamRequest};
use tutor_domain::error::{Error, Result};

/// System message shown after a rating is stored.
pub const RATING_SAVED: &str = "Your understanding rating has been saved.";
/// System message shown after an exam score is stored.
pub const EXAM_RECORDED: &str = "Your exam practice score has been recorded.";

pub fn validate_rating(req: &RateTopicRequest) -> Result<()> {
    if !(1..=5).contains(&req.rating) {
        return Err(Error::Validation("Please select a rating".into()));
    }
    if req.topic_code.trim().is_empty() {
        return Err(Error::Validation("topic code is required".into()));
    }
    Ok(())
}

pub fn validate_exam(req: &RecordExamRequest) -> Result<()> {
    if req.max_score == 0 {
        return Err(Error::Validation("Maximum score must be greater than zero".into()));
    }
    if req.score > req.max_score {
        return Err(Error::Validation(
            "Score cannot be greater than maximum score".into(),
        ));
    }
    if req.topic_code.trim().is_empty() {
        return Err(Error::Validation("topic code is required".into()));
    }
    Ok(())
}

/// Validate and submit a topic rating.
pub async fn rate_topic(backend: &dyn ProgressBackend, req: RateTopicRequest) -> Result<()> {
    validate_rating(&req)?;
    let topic_code = req.topic_code.clone();
    let rating = req.rating;
    backend.rate_topic(req).await?;
    tracing::info!(topic_code = %topic_code, rating, "topic rating saved");
    Ok(())
}

/// Validate and submit an exam practice score.
pub async fn record_exam(backend: &dyn ProgressBackend, req: RecordExamRequest) -> Result<()> {
    validate_exam(&req)?;
    let topic_code = req.topic_code.clone();
    let (score, max_score) = (req.score, req.max_score);
    backend.record_exam(req).await?;
    tracing::info!(topic_code = %topic_code, score, max_score, "exam score recorded");
    Ok(())
}
