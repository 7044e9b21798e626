//! Administrative interface: create and delete questions, and list them all
//! (including future-dated ones) with their publication-recency flag.

use mongodb::{bson::doc, options::FindOptions};
use rocket::{futures::TryStreamExt, serde::json::Json, Route};

use crate::error::{Error, Result};
use crate::model::{
    api::{AdminQuestion, QuestionSpec},
    choice::Choice,
    mongodb::{Coll, Id},
    question::Question,
};

pub fn routes() -> Vec<Route> {
    routes![list_questions, create_question, delete_question]
}

#[get("/admin/polls")]
async fn list_questions(questions: Coll<Question>) -> Result<Json<Vec<AdminQuestion>>> {
    let options = FindOptions::builder().sort(doc! {"pub_date": -1}).build();
    let all_questions = questions
        .find(None, options)
        .await?
        .try_collect::<Vec<_>>()
        .await?;

    Ok(Json(all_questions.into_iter().map(Into::into).collect()))
}

#[post("/admin/polls", data = "<spec>", format = "json")]
async fn create_question(
    spec: Json<QuestionSpec>,
    questions: Coll<Question>,
    choices: Coll<Choice>,
) -> Result<Json<AdminQuestion>> {
    let spec = spec.into_inner();
    spec.validate()?;

    let question = Question::new(spec.question_text, spec.pub_date);
    let new_choices = spec
        .choices
        .into_iter()
        .map(|text| Choice::new(question.id, text))
        .collect::<Vec<_>>();

    questions.insert_one(&question, None).await?;
    choices.insert_many(&new_choices, None).await?;
    info!(
        "Created question {} with {} choices",
        question.id,
        new_choices.len()
    );

    Ok(Json(question.into()))
}

#[delete("/admin/polls/<question_id>")]
async fn delete_question(
    question_id: Id,
    questions: Coll<Question>,
    choices: Coll<Choice>,
) -> Result<()> {
    let result = questions.delete_one(question_id.as_doc(), None).await?;
    if result.deleted_count == 0 {
        return Err(Error::not_found(format!(
            "Question with ID '{question_id}'"
        )));
    }

    // A choice cannot outlive its question.
    let cascade = choices
        .delete_many(doc! {"question_id": question_id}, None)
        .await?;
    info!(
        "Deleted question {} and its {} choices",
        question_id, cascade.deleted_count
    );

    Ok(())
}
