//! API-level representations of questions and choices.
//!
//! The database types use BSON datetimes; these use plain chrono serde so
//! timestamps travel as RFC 3339 strings in JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    choice::Choice,
    mongodb::Id,
    question::{Question, MAX_TEXT_LENGTH},
};

/// A question as it appears in the public listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSummary {
    pub id: Id,
    pub question_text: String,
    pub pub_date: DateTime<Utc>,
}

impl From<Question> for QuestionSummary {
    fn from(question: Question) -> Self {
        Self {
            id: question.id,
            question_text: question.question_text,
            pub_date: question.pub_date,
        }
    }
}

/// A choice as presented on the detail page: no vote count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceDesc {
    pub id: Id,
    pub choice_text: String,
}

/// A choice as presented on the results page, tally included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceTally {
    pub id: Id,
    pub choice_text: String,
    pub votes: u32,
}

/// A question plus its choices, for the detail/voting page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionDetail {
    pub id: Id,
    pub question_text: String,
    pub pub_date: DateTime<Utc>,
    pub choices: Vec<ChoiceDesc>,
}

impl QuestionDetail {
    pub fn new(question: Question, choices: Vec<Choice>) -> Self {
        Self {
            id: question.id,
            question_text: question.question_text,
            pub_date: question.pub_date,
            choices: choices
                .into_iter()
                .map(|choice| ChoiceDesc {
                    id: choice.id,
                    choice_text: choice.choice_text,
                })
                .collect(),
        }
    }
}

/// A question plus its choices and their tallies, for the results page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionResults {
    pub id: Id,
    pub question_text: String,
    pub pub_date: DateTime<Utc>,
    pub choices: Vec<ChoiceTally>,
}

impl QuestionResults {
    pub fn new(question: Question, choices: Vec<Choice>) -> Self {
        Self {
            id: question.id,
            question_text: question.question_text,
            pub_date: question.pub_date,
            choices: choices
                .into_iter()
                .map(|choice| ChoiceTally {
                    id: choice.id,
                    choice_text: choice.choice_text,
                    votes: choice.votes,
                })
                .collect(),
        }
    }
}

/// Response to a vote that didn't select a valid choice: the error message
/// plus the question re-presented for another attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteRetry {
    pub error_message: String,
    pub question: QuestionDetail,
}

/// Specification for creating a new question with its choices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSpec {
    pub question_text: String,
    pub pub_date: DateTime<Utc>,
    pub choices: Vec<String>,
}

impl QuestionSpec {
    /// Check the text bounds and that there is something to vote on.
    pub fn validate(&self) -> Result<()> {
        validate_text("Question text", &self.question_text)?;
        if self.choices.is_empty() {
            return Err(Error::bad_request("A question needs at least one choice"));
        }
        for choice_text in &self.choices {
            validate_text("Choice text", choice_text)?;
        }
        Ok(())
    }
}

fn validate_text(what: &str, text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(Error::bad_request(format!("{what} must not be empty")));
    }
    if text.chars().count() > MAX_TEXT_LENGTH {
        return Err(Error::bad_request(format!(
            "{what} must be at most {MAX_TEXT_LENGTH} characters"
        )));
    }
    Ok(())
}

/// A question as it appears in the administrative listing, including the
/// publication-recency flag and regardless of publication date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminQuestion {
    pub id: Id,
    pub question_text: String,
    pub pub_date: DateTime<Utc>,
    pub was_published_recently: bool,
}

impl From<Question> for AdminQuestion {
    fn from(question: Question) -> Self {
        let was_published_recently = question.was_published_recently();
        Self {
            id: question.id,
            question_text: question.question_text,
            pub_date: question.pub_date,
            was_published_recently,
        }
    }
}
