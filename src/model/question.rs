use chrono::{DateTime, Duration, Utc};
use mongodb::bson::{doc, serde_helpers::chrono_datetime_as_bson_datetime, Document};
use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Maximum length of question and choice text, in characters.
pub const MAX_TEXT_LENGTH: usize = 200;

/// A poll topic. It becomes visible to the public once its publication date
/// has passed, and is never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "_id")]
    pub id: Id,
    pub question_text: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub pub_date: DateTime<Utc>,
}

impl Question {
    pub fn new(question_text: String, pub_date: DateTime<Utc>) -> Self {
        Self {
            id: Id::new(),
            question_text,
            pub_date,
        }
    }

    /// Was this question published within the day leading up to `now`?
    /// Inclusive at both ends; a future publication date is never recent.
    pub fn was_published_recently_at(&self, now: DateTime<Utc>) -> bool {
        now - Duration::days(1) <= self.pub_date && self.pub_date <= now
    }

    /// [`Question::was_published_recently_at`] against the current time.
    pub fn was_published_recently(&self) -> bool {
        self.was_published_recently_at(Utc::now())
    }

    /// Filter matching every question already published at `now`.
    pub fn published_filter(now: DateTime<Utc>) -> Document {
        doc! {"pub_date": {"$lte": now}}
    }

    /// Filter matching the question with the given ID, provided it was
    /// already published at `now`. A future-dated question is
    /// indistinguishable from a missing one.
    pub fn published_by_id(question_id: Id, now: DateTime<Utc>) -> Document {
        doc! {"_id": question_id, "pub_date": {"$lte": now}}
    }
}
