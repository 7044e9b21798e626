use chrono::Utc;

use crate::error::{Error, Result};
use crate::model::{
    mongodb::{Coll, Id},
    question::Question,
};

/// Look up a question that is visible to the public: it must exist and its
/// publication date must not be in the future. A future-dated question gets
/// the same NotFound as a missing one.
pub async fn published_question_by_id(
    question_id: Id,
    questions: &Coll<Question>,
) -> Result<Question> {
    questions
        .find_one(Question::published_by_id(question_id, Utc::now()), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Question with ID '{question_id}'")))
}
