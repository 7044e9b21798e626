use chrono::Utc;
use mongodb::{bson::doc, options::FindOptions};
use rocket::{
    form::Form, futures::TryStreamExt, response::Redirect, serde::json::Json, Route,
};

use crate::error::Result;
use crate::model::{
    api::{QuestionDetail, QuestionResults, QuestionSummary, VoteRetry},
    choice::Choice,
    mongodb::{Coll, Id},
    question::Question,
};

use super::common::published_question_by_id;

/// The message shown when a vote does not select a valid choice.
pub const NO_CHOICE_MESSAGE: &str = "You didn't select a choice.";

pub fn routes() -> Vec<Route> {
    routes![index, detail, results, vote]
}

#[get("/polls")]
async fn index(questions: Coll<Question>) -> Result<Json<Vec<QuestionSummary>>> {
    let options = FindOptions::builder().sort(doc! {"pub_date": -1}).build();
    let published = questions
        .find(Question::published_filter(Utc::now()), options)
        .await?
        .try_collect::<Vec<_>>()
        .await?;

    Ok(Json(published.into_iter().map(Into::into).collect()))
}

#[get("/polls/<question_id>")]
async fn detail(
    question_id: Id,
    questions: Coll<Question>,
    choices: Coll<Choice>,
) -> Result<Json<QuestionDetail>> {
    let question = published_question_by_id(question_id, &questions).await?;
    let question_choices = Choice::for_question(&choices, question_id).await?;

    Ok(Json(QuestionDetail::new(question, question_choices)))
}

#[get("/polls/<question_id>/results")]
async fn results(
    question_id: Id,
    questions: Coll<Question>,
    choices: Coll<Choice>,
) -> Result<Json<QuestionResults>> {
    let question = published_question_by_id(question_id, &questions).await?;
    let question_choices = Choice::for_question(&choices, question_id).await?;

    Ok(Json(QuestionResults::new(question, question_choices)))
}

#[derive(FromForm)]
struct VoteForm {
    /// Missing or unparseable selections both come through as `None`.
    choice: Option<Id>,
}

/// The two ways a vote can play out: success redirects to the results page,
/// an invalid selection re-presents the question for another attempt.
#[derive(Responder)]
enum VoteOutcome {
    Recorded(Redirect),
    #[response(status = 422)]
    Rejected(Json<VoteRetry>),
}

#[post("/polls/<question_id>/vote", data = "<form>")]
async fn vote(
    question_id: Id,
    form: Form<VoteForm>,
    questions: Coll<Question>,
    choices: Coll<Choice>,
) -> Result<VoteOutcome> {
    let question = published_question_by_id(question_id, &questions).await?;

    let selected = match form.choice {
        Some(choice_id) => choice_id,
        None => return rejected(question, &choices).await,
    };

    if Choice::record_vote(&choices, question_id, selected).await? {
        Ok(VoteOutcome::Recorded(Redirect::to(uri!(results(
            question_id
        )))))
    } else {
        // The choice doesn't exist, or belongs to a different question.
        rejected(question, &choices).await
    }
}

/// Build the re-displayed question page for an invalid selection.
async fn rejected(question: Question, choices: &Coll<Choice>) -> Result<VoteOutcome> {
    let question_choices = Choice::for_question(choices, question.id).await?;
    Ok(VoteOutcome::Rejected(Json(VoteRetry {
        error_message: NO_CHOICE_MESSAGE.to_string(),
        question: QuestionDetail::new(question, question_choices),
    })))
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, Utc};
    use mongodb::Database;
    use rocket::{
        http::{ContentType, Status},
        local::asynchronous::Client,
        serde::json::serde_json,
    };

    use crate::client_and_db;

    use super::*;

    async fn insert_question(
        db: &Database,
        text: &str,
        pub_date: DateTime<Utc>,
        choice_texts: &[&str],
    ) -> (Question, Vec<Choice>) {
        let question = Question::new(text.to_string(), pub_date);
        let choices = choice_texts
            .iter()
            .map(|text| Choice::new(question.id, text.to_string()))
            .collect::<Vec<_>>();

        Coll::<Question>::from_db(db)
            .insert_one(&question, None)
            .await
            .unwrap();
        if !choices.is_empty() {
            Coll::<Choice>::from_db(db)
                .insert_many(&choices, None)
                .await
                .unwrap();
        }

        (question, choices)
    }

    async fn stored_choices(db: &Database, question_id: Id) -> Vec<Choice> {
        Choice::for_question(&Coll::from_db(db), question_id)
            .await
            .unwrap()
    }

    #[db_test]
    async fn index_lists_published_questions_newest_first(client: Client, db: Database) {
        let now = Utc::now();
        insert_question(&db, "Older", now - Duration::days(5), &[]).await;
        insert_question(&db, "Newest", now - Duration::hours(1), &[]).await;
        insert_question(&db, "Future", now + Duration::days(5), &[]).await;

        let response = client.get(uri!(index)).dispatch().await;
        assert_eq!(Status::Ok, response.status());

        let raw_response = response.into_string().await.unwrap();
        let summaries = serde_json::from_str::<Vec<QuestionSummary>>(&raw_response).unwrap();
        let texts = summaries
            .iter()
            .map(|question| question.question_text.as_str())
            .collect::<Vec<_>>();
        assert_eq!(vec!["Newest", "Older"], texts);
    }

    #[db_test]
    async fn index_is_empty_when_everything_is_future_dated(client: Client, db: Database) {
        let now = Utc::now();
        insert_question(&db, "Soon", now + Duration::hours(1), &[]).await;
        insert_question(&db, "Later", now + Duration::days(30), &[]).await;

        let response = client.get(uri!(index)).dispatch().await;
        assert_eq!(Status::Ok, response.status());

        let raw_response = response.into_string().await.unwrap();
        let summaries = serde_json::from_str::<Vec<QuestionSummary>>(&raw_response).unwrap();
        assert!(summaries.is_empty());
    }

    #[db_test]
    async fn detail_shows_choices_without_votes(client: Client, db: Database) {
        let now = Utc::now();
        let (question, _) =
            insert_question(&db, "Colour?", now - Duration::hours(1), &["Red", "Blue"]).await;

        let response = client.get(uri!(detail(question.id))).dispatch().await;
        assert_eq!(Status::Ok, response.status());

        let raw_response = response.into_string().await.unwrap();
        let fetched = serde_json::from_str::<QuestionDetail>(&raw_response).unwrap();
        assert_eq!(question.id, fetched.id);
        assert_eq!("Colour?", fetched.question_text);
        let texts = fetched
            .choices
            .iter()
            .map(|choice| choice.choice_text.as_str())
            .collect::<Vec<_>>();
        assert_eq!(vec!["Red", "Blue"], texts);
    }

    #[db_test]
    async fn results_show_tallies(client: Client, db: Database) {
        let now = Utc::now();
        let (question, choices) =
            insert_question(&db, "Colour?", now - Duration::hours(1), &["Red", "Blue"]).await;
        Choice::record_vote(&Coll::from_db(&db), question.id, choices[1].id)
            .await
            .unwrap();

        let response = client.get(uri!(results(question.id))).dispatch().await;
        assert_eq!(Status::Ok, response.status());

        let raw_response = response.into_string().await.unwrap();
        let fetched = serde_json::from_str::<QuestionResults>(&raw_response).unwrap();
        let tallies = fetched
            .choices
            .iter()
            .map(|choice| (choice.choice_text.as_str(), choice.votes))
            .collect::<Vec<_>>();
        assert_eq!(vec![("Red", 0), ("Blue", 1)], tallies);
    }

    #[db_test]
    async fn future_question_is_hidden(client: Client, db: Database) {
        let now = Utc::now();
        let (question, _) =
            insert_question(&db, "Future", now + Duration::days(1), &["Yes"]).await;

        let response = client.get(uri!(detail(question.id))).dispatch().await;
        assert_eq!(Status::NotFound, response.status());

        let response = client.get(uri!(results(question.id))).dispatch().await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[db_test]
    async fn unknown_question_is_not_found(client: Client, db: Database) {
        let response = client.get(uri!(detail(Id::new()))).dispatch().await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[db_test]
    async fn vote_increments_only_the_chosen_choice(client: Client, db: Database) {
        let now = Utc::now();
        let (question, choices) =
            insert_question(&db, "Colour?", now - Duration::hours(1), &["Red", "Blue"]).await;

        let response = client
            .post(uri!(vote(question.id)))
            .header(ContentType::Form)
            .body(format!("choice={}", choices[0].id))
            .dispatch()
            .await;

        assert_eq!(Status::SeeOther, response.status());
        assert_eq!(
            Some(uri!(results(question.id)).to_string().as_str()),
            response.headers().get_one("Location")
        );

        let stored = stored_choices(&db, question.id).await;
        let votes = stored.iter().map(|choice| choice.votes).collect::<Vec<_>>();
        assert_eq!(vec![1, 0], votes);
    }

    #[db_test]
    async fn vote_without_selection_changes_nothing(client: Client, db: Database) {
        let now = Utc::now();
        let (question, _) =
            insert_question(&db, "Colour?", now - Duration::hours(1), &["Red", "Blue"]).await;

        let response = client
            .post(uri!(vote(question.id)))
            .header(ContentType::Form)
            .body("")
            .dispatch()
            .await;

        assert_eq!(Status::UnprocessableEntity, response.status());
        let raw_response = response.into_string().await.unwrap();
        let retry = serde_json::from_str::<VoteRetry>(&raw_response).unwrap();
        assert_eq!(NO_CHOICE_MESSAGE, retry.error_message);
        assert_eq!(question.id, retry.question.id);
        assert_eq!(2, retry.question.choices.len());

        let stored = stored_choices(&db, question.id).await;
        assert!(stored.iter().all(|choice| choice.votes == 0));
    }

    #[db_test]
    async fn vote_for_another_questions_choice_changes_nothing(client: Client, db: Database) {
        let now = Utc::now();
        let (question, _) =
            insert_question(&db, "Colour?", now - Duration::hours(1), &["Red", "Blue"]).await;
        let (other, other_choices) =
            insert_question(&db, "Shape?", now - Duration::hours(2), &["Square"]).await;

        let response = client
            .post(uri!(vote(question.id)))
            .header(ContentType::Form)
            .body(format!("choice={}", other_choices[0].id))
            .dispatch()
            .await;

        assert_eq!(Status::UnprocessableEntity, response.status());
        let raw_response = response.into_string().await.unwrap();
        let retry = serde_json::from_str::<VoteRetry>(&raw_response).unwrap();
        assert_eq!(NO_CHOICE_MESSAGE, retry.error_message);

        let stored = stored_choices(&db, question.id).await;
        assert!(stored.iter().all(|choice| choice.votes == 0));
        let stored = stored_choices(&db, other.id).await;
        assert!(stored.iter().all(|choice| choice.votes == 0));
    }

    #[db_test]
    async fn vote_on_future_question_is_not_found(client: Client, db: Database) {
        let now = Utc::now();
        let (question, choices) =
            insert_question(&db, "Future", now + Duration::days(1), &["Yes"]).await;

        let response = client
            .post(uri!(vote(question.id)))
            .header(ContentType::Form)
            .body(format!("choice={}", choices[0].id))
            .dispatch()
            .await;

        assert_eq!(Status::NotFound, response.status());
        let stored = stored_choices(&db, question.id).await;
        assert!(stored.iter().all(|choice| choice.votes == 0));
    }
}
