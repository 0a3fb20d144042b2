use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::db::operations::{
    self, Journey, JourneyCompletion, LearningStyleRecord, LearningStyleUpsert,
    LearningStyleWithUser, NewCompletion, NewJourney, NewOption, NewQuestion, NewTutorial,
    NewUser, RefreshToken, Tutorial, TutorialOption, TutorialQuestion, User, UserMetric,
};
use crate::db::{DatabaseProxy, StorageError};

pub type StorageResult<T> = Result<T, StorageError>;

/// Typed access to every table the service touches. Lookups report absence
/// as `None`; deciding whether that is an error is left to the caller.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn list_journeys(&self) -> StorageResult<Vec<Journey>>;
    async fn find_journey(&self, id: i64) -> StorageResult<Option<Journey>>;
    async fn find_journey_by_name(&self, name: &str) -> StorageResult<Option<Journey>>;
    async fn create_journey(&self, journey: NewJourney) -> StorageResult<Journey>;
    async fn update_journey(&self, journey: Journey) -> StorageResult<Journey>;
    async fn delete_journey(&self, id: i64) -> StorageResult<bool>;

    async fn list_tutorials(&self, journey_id: i64) -> StorageResult<Vec<Tutorial>>;
    async fn find_tutorial(&self, journey_id: i64, id: i64) -> StorageResult<Option<Tutorial>>;
    async fn find_tutorial_by_id(&self, id: i64) -> StorageResult<Option<Tutorial>>;
    async fn find_duplicate_tutorial(
        &self,
        journey_id: i64,
        title: &str,
        position: i32,
        exclude_id: Option<i64>,
    ) -> StorageResult<Option<Tutorial>>;
    async fn create_tutorial(&self, tutorial: NewTutorial) -> StorageResult<Tutorial>;
    async fn update_tutorial(&self, tutorial: Tutorial) -> StorageResult<Tutorial>;
    async fn delete_tutorial(&self, id: i64) -> StorageResult<bool>;

    async fn list_questions(&self, tutorial_id: i64) -> StorageResult<Vec<TutorialQuestion>>;
    async fn find_question(
        &self,
        tutorial_id: i64,
        id: i64,
    ) -> StorageResult<Option<TutorialQuestion>>;
    async fn find_question_by_id(&self, id: i64) -> StorageResult<Option<TutorialQuestion>>;
    async fn find_duplicate_question(
        &self,
        tutorial_id: i64,
        question_text: &str,
        position: i32,
        exclude_id: Option<i64>,
    ) -> StorageResult<Option<TutorialQuestion>>;
    async fn create_question(&self, question: NewQuestion) -> StorageResult<TutorialQuestion>;
    async fn update_question(&self, question: TutorialQuestion) -> StorageResult<TutorialQuestion>;
    async fn delete_question(&self, id: i64) -> StorageResult<bool>;

    async fn list_options(&self, question_id: i64) -> StorageResult<Vec<TutorialOption>>;
    async fn find_option(&self, question_id: i64, id: i64) -> StorageResult<Option<TutorialOption>>;
    async fn find_duplicate_option(
        &self,
        question_id: i64,
        option_label: Option<&str>,
        option_text: &str,
        exclude_id: Option<i64>,
    ) -> StorageResult<Option<TutorialOption>>;
    async fn create_option(&self, option: NewOption) -> StorageResult<TutorialOption>;
    async fn update_option_text(
        &self,
        id: i64,
        option_text: &str,
    ) -> StorageResult<Option<TutorialOption>>;
    async fn delete_options_for_question(&self, question_id: i64) -> StorageResult<u64>;
    async fn delete_option(&self, id: i64) -> StorageResult<bool>;

    async fn find_completion(
        &self,
        journey_id: i64,
        user_id: i64,
    ) -> StorageResult<Option<JourneyCompletion>>;
    async fn create_completion(&self, completion: NewCompletion) -> StorageResult<JourneyCompletion>;
    async fn add_study_duration(
        &self,
        id: i64,
        minutes: i32,
        at: DateTime<Utc>,
    ) -> StorageResult<Option<JourneyCompletion>>;
    async fn aggregate_learning_metrics(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StorageResult<Vec<UserMetric>>;

    async fn find_user(&self, id: i64) -> StorageResult<Option<User>>;
    async fn create_user(&self, user: NewUser) -> StorageResult<User>;

    async fn create_refresh_token(
        &self,
        token: &str,
        user_id: Option<i64>,
    ) -> StorageResult<RefreshToken>;
    async fn find_refresh_token(&self, token: &str) -> StorageResult<Option<RefreshToken>>;
    async fn delete_refresh_token(&self, token: &str) -> StorageResult<bool>;

    async fn upsert_learning_style(
        &self,
        upsert: LearningStyleUpsert,
    ) -> StorageResult<LearningStyleRecord>;
    async fn find_learning_style(
        &self,
        user_id: i64,
        period: Option<NaiveDate>,
    ) -> StorageResult<Option<LearningStyleRecord>>;
    async fn latest_learning_style(
        &self,
        user_id: i64,
    ) -> StorageResult<Option<LearningStyleWithUser>>;
    async fn list_learning_styles_by_period(
        &self,
        period: NaiveDate,
    ) -> StorageResult<Vec<LearningStyleWithUser>>;
}

/// Postgres-backed repository sharing the process-wide pool.
#[derive(Clone)]
pub struct PgRepository {
    proxy: Arc<DatabaseProxy>,
}

impl PgRepository {
    pub fn new(proxy: Arc<DatabaseProxy>) -> Self {
        Self { proxy }
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn list_journeys(&self) -> StorageResult<Vec<Journey>> {
        Ok(operations::select_journeys(self.proxy.pool()).await?)
    }

    async fn find_journey(&self, id: i64) -> StorageResult<Option<Journey>> {
        Ok(operations::select_journey(self.proxy.pool(), id).await?)
    }

    async fn find_journey_by_name(&self, name: &str) -> StorageResult<Option<Journey>> {
        Ok(operations::select_journey_by_name(self.proxy.pool(), name).await?)
    }

    async fn create_journey(&self, journey: NewJourney) -> StorageResult<Journey> {
        Ok(operations::insert_journey(self.proxy.pool(), &journey).await?)
    }

    async fn update_journey(&self, journey: Journey) -> StorageResult<Journey> {
        Ok(operations::update_journey_row(self.proxy.pool(), &journey).await?)
    }

    async fn delete_journey(&self, id: i64) -> StorageResult<bool> {
        Ok(operations::delete_journey_row(self.proxy.pool(), id).await?)
    }

    async fn list_tutorials(&self, journey_id: i64) -> StorageResult<Vec<Tutorial>> {
        Ok(operations::select_tutorials(self.proxy.pool(), journey_id).await?)
    }

    async fn find_tutorial(&self, journey_id: i64, id: i64) -> StorageResult<Option<Tutorial>> {
        let tutorial = operations::select_tutorial(self.proxy.pool(), id).await?;
        Ok(tutorial.filter(|t| t.journey_id == journey_id))
    }

    async fn find_tutorial_by_id(&self, id: i64) -> StorageResult<Option<Tutorial>> {
        Ok(operations::select_tutorial(self.proxy.pool(), id).await?)
    }

    async fn find_duplicate_tutorial(
        &self,
        journey_id: i64,
        title: &str,
        position: i32,
        exclude_id: Option<i64>,
    ) -> StorageResult<Option<Tutorial>> {
        Ok(operations::select_duplicate_tutorial(
            self.proxy.pool(),
            journey_id,
            title,
            position,
            exclude_id,
        )
        .await?)
    }

    async fn create_tutorial(&self, tutorial: NewTutorial) -> StorageResult<Tutorial> {
        Ok(operations::insert_tutorial(self.proxy.pool(), &tutorial).await?)
    }

    async fn update_tutorial(&self, tutorial: Tutorial) -> StorageResult<Tutorial> {
        Ok(operations::update_tutorial_row(self.proxy.pool(), &tutorial).await?)
    }

    async fn delete_tutorial(&self, id: i64) -> StorageResult<bool> {
        Ok(operations::delete_tutorial_row(self.proxy.pool(), id).await?)
    }

    async fn list_questions(&self, tutorial_id: i64) -> StorageResult<Vec<TutorialQuestion>> {
        Ok(operations::select_questions(self.proxy.pool(), tutorial_id).await?)
    }

    async fn find_question(
        &self,
        tutorial_id: i64,
        id: i64,
    ) -> StorageResult<Option<TutorialQuestion>> {
        let question = operations::select_question(self.proxy.pool(), id).await?;
        Ok(question.filter(|q| q.tutorial_id == tutorial_id))
    }

    async fn find_question_by_id(&self, id: i64) -> StorageResult<Option<TutorialQuestion>> {
        Ok(operations::select_question(self.proxy.pool(), id).await?)
    }

    async fn find_duplicate_question(
        &self,
        tutorial_id: i64,
        question_text: &str,
        position: i32,
        exclude_id: Option<i64>,
    ) -> StorageResult<Option<TutorialQuestion>> {
        Ok(operations::select_duplicate_question(
            self.proxy.pool(),
            tutorial_id,
            question_text,
            position,
            exclude_id,
        )
        .await?)
    }

    async fn create_question(&self, question: NewQuestion) -> StorageResult<TutorialQuestion> {
        Ok(operations::insert_question(self.proxy.pool(), &question).await?)
    }

    async fn update_question(&self, question: TutorialQuestion) -> StorageResult<TutorialQuestion> {
        Ok(operations::update_question_row(self.proxy.pool(), &question).await?)
    }

    async fn delete_question(&self, id: i64) -> StorageResult<bool> {
        Ok(operations::delete_question_row(self.proxy.pool(), id).await?)
    }

    async fn list_options(&self, question_id: i64) -> StorageResult<Vec<TutorialOption>> {
        Ok(operations::select_options(self.proxy.pool(), question_id).await?)
    }

    async fn find_option(&self, question_id: i64, id: i64) -> StorageResult<Option<TutorialOption>> {
        let option = operations::select_option(self.proxy.pool(), id).await?;
        Ok(option.filter(|o| o.question_id == question_id))
    }

    async fn find_duplicate_option(
        &self,
        question_id: i64,
        option_label: Option<&str>,
        option_text: &str,
        exclude_id: Option<i64>,
    ) -> StorageResult<Option<TutorialOption>> {
        Ok(operations::select_duplicate_option(
            self.proxy.pool(),
            question_id,
            option_label,
            option_text,
            exclude_id,
        )
        .await?)
    }

    async fn create_option(&self, option: NewOption) -> StorageResult<TutorialOption> {
        Ok(operations::insert_option(self.proxy.pool(), &option).await?)
    }

    async fn update_option_text(
        &self,
        id: i64,
        option_text: &str,
    ) -> StorageResult<Option<TutorialOption>> {
        Ok(operations::update_option_text_row(self.proxy.pool(), id, option_text).await?)
    }

    async fn delete_options_for_question(&self, question_id: i64) -> StorageResult<u64> {
        Ok(operations::delete_options_for_question_rows(self.proxy.pool(), question_id).await?)
    }

    async fn delete_option(&self, id: i64) -> StorageResult<bool> {
        Ok(operations::delete_option_row(self.proxy.pool(), id).await?)
    }

    async fn find_completion(
        &self,
        journey_id: i64,
        user_id: i64,
    ) -> StorageResult<Option<JourneyCompletion>> {
        Ok(operations::select_completion(self.proxy.pool(), journey_id, user_id).await?)
    }

    async fn create_completion(&self, completion: NewCompletion) -> StorageResult<JourneyCompletion> {
        Ok(operations::insert_completion(self.proxy.pool(), &completion).await?)
    }

    async fn add_study_duration(
        &self,
        id: i64,
        minutes: i32,
        at: DateTime<Utc>,
    ) -> StorageResult<Option<JourneyCompletion>> {
        Ok(operations::add_study_minutes(self.proxy.pool(), id, minutes, at).await?)
    }

    async fn aggregate_learning_metrics(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StorageResult<Vec<UserMetric>> {
        Ok(operations::aggregate_learning_metrics(self.proxy.pool(), start, end).await?)
    }

    async fn find_user(&self, id: i64) -> StorageResult<Option<User>> {
        Ok(operations::select_user(self.proxy.pool(), id).await?)
    }

    async fn create_user(&self, user: NewUser) -> StorageResult<User> {
        Ok(operations::insert_user(self.proxy.pool(), &user).await?)
    }

    async fn create_refresh_token(
        &self,
        token: &str,
        user_id: Option<i64>,
    ) -> StorageResult<RefreshToken> {
        Ok(operations::insert_refresh_token(self.proxy.pool(), token, user_id).await?)
    }

    async fn find_refresh_token(&self, token: &str) -> StorageResult<Option<RefreshToken>> {
        Ok(operations::select_refresh_token(self.proxy.pool(), token).await?)
    }

    async fn delete_refresh_token(&self, token: &str) -> StorageResult<bool> {
        Ok(operations::delete_refresh_token_row(self.proxy.pool(), token).await?)
    }

    async fn upsert_learning_style(
        &self,
        upsert: LearningStyleUpsert,
    ) -> StorageResult<LearningStyleRecord> {
        Ok(operations::upsert_learning_style(self.proxy.pool(), &upsert).await?)
    }

    async fn find_learning_style(
        &self,
        user_id: i64,
        period: Option<NaiveDate>,
    ) -> StorageResult<Option<LearningStyleRecord>> {
        Ok(operations::select_learning_style(self.proxy.pool(), user_id, period).await?)
    }

    async fn latest_learning_style(
        &self,
        user_id: i64,
    ) -> StorageResult<Option<LearningStyleWithUser>> {
        Ok(operations::select_latest_learning_style(self.proxy.pool(), user_id).await?)
    }

    async fn list_learning_styles_by_period(
        &self,
        period: NaiveDate,
    ) -> StorageResult<Vec<LearningStyleWithUser>> {
        Ok(operations::select_learning_styles_by_period(self.proxy.pool(), period).await?)
    }
}
