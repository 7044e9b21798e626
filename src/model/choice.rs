use mongodb::{bson::doc, options::FindOptions};
use rocket::futures::TryStreamExt;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::mongodb::{Coll, Id};

/// A selectable answer to a [`Question`](crate::model::question::Question).
/// Its vote counter starts at zero and only ever increases; a choice cannot
/// outlive its owning question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    #[serde(rename = "_id")]
    pub id: Id,
    pub question_id: Id,
    pub choice_text: String,
    pub votes: u32,
}

impl Choice {
    pub fn new(question_id: Id, choice_text: String) -> Self {
        Self {
            id: Id::new(),
            question_id,
            choice_text,
            votes: 0,
        }
    }

    /// All choices belonging to the given question, in creation order.
    pub async fn for_question(choices: &Coll<Choice>, question_id: Id) -> Result<Vec<Choice>> {
        let options = FindOptions::builder().sort(doc! {"_id": 1}).build();
        let choices = choices
            .find(doc! {"question_id": question_id}, options)
            .await?
            .try_collect()
            .await?;
        Ok(choices)
    }

    /// Atomically add one vote to the given choice, provided it belongs to
    /// the given question. Returns false (and changes nothing) if it doesn't
    /// exist or belongs to a different question.
    pub async fn record_vote(
        choices: &Coll<Choice>,
        question_id: Id,
        choice_id: Id,
    ) -> Result<bool> {
        let filter = doc! {"_id": choice_id, "question_id": question_id};
        let update = doc! {"$inc": {"votes": 1}};
        let result = choices.update_one(filter, update, None).await?;
        Ok(result.modified_count == 1)
    }
}
