use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;

use crate::db::operations::{
    Journey, JourneyCompletion, LearningStyleRecord, LearningStyleUpsert, LearningStyleWithUser,
    NewCompletion, NewJourney, NewOption, NewQuestion, NewTutorial, NewUser, RefreshToken,
    Tutorial, TutorialOption, TutorialQuestion, User, UserIdentity, UserMetric,
};
use crate::db::repository::{Repository, StorageResult};
use crate::db::StorageError;

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: BTreeMap<i64, User>,
    refresh_tokens: BTreeMap<i64, RefreshToken>,
    journeys: BTreeMap<i64, Journey>,
    tutorials: BTreeMap<i64, Tutorial>,
    questions: BTreeMap<i64, TutorialQuestion>,
    options: BTreeMap<i64, TutorialOption>,
    completions: BTreeMap<i64, JourneyCompletion>,
    learning_styles: BTreeMap<i64, LearningStyleRecord>,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn with_user(&self, record: &LearningStyleRecord) -> Option<LearningStyleWithUser> {
        let user = self.users.get(&record.user_id)?;
        Some(LearningStyleWithUser {
            record: record.clone(),
            user: UserIdentity::from(user),
        })
    }
}

/// Process-local repository with the same constraints as the Postgres schema.
/// Used by the test suite and by local runs without `DATABASE_URL`.
#[derive(Default)]
pub struct InMemoryRepository {
    tables: Mutex<Tables>,
    aggregate_calls: AtomicUsize,
    style_writes: AtomicUsize,
    fail_style_writes_after: Mutex<Option<usize>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times the metrics aggregate has been queried.
    pub fn aggregate_calls(&self) -> usize {
        self.aggregate_calls.load(Ordering::SeqCst)
    }

    pub fn learning_style_count(&self) -> usize {
        self.tables.lock().learning_styles.len()
    }

    /// Lets the first `successful` learning-style writes through, then
    /// reports the storage as unavailable.
    pub fn fail_learning_style_writes_after(&self, successful: usize) {
        *self.fail_style_writes_after.lock() = Some(successful);
    }

    pub fn set_submission_rating(&self, completion_id: i64, rating: Option<f64>) -> bool {
        let mut tables = self.tables.lock();
        match tables.completions.get_mut(&completion_id) {
            Some(completion) => {
                completion.avg_submission_rating = rating;
                true
            }
            None => false,
        }
    }
}

fn violation(message: impl Into<String>) -> StorageError {
    StorageError::Constraint(message.into())
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn list_journeys(&self) -> StorageResult<Vec<Journey>> {
        Ok(self.tables.lock().journeys.values().cloned().collect())
    }

    async fn find_journey(&self, id: i64) -> StorageResult<Option<Journey>> {
        Ok(self.tables.lock().journeys.get(&id).cloned())
    }

    async fn find_journey_by_name(&self, name: &str) -> StorageResult<Option<Journey>> {
        let tables = self.tables.lock();
        Ok(tables.journeys.values().find(|j| j.name == name).cloned())
    }

    async fn create_journey(&self, journey: NewJourney) -> StorageResult<Journey> {
        let mut tables = self.tables.lock();
        if tables.journeys.values().any(|j| j.name == journey.name) {
            return Err(violation("developer_journeys.name must be unique"));
        }
        let now = Utc::now();
        let row = Journey {
            id: tables.allocate_id(),
            name: journey.name,
            summary: journey.summary,
            point: journey.point,
            required_point: journey.required_point,
            xp: journey.xp,
            required_xp: journey.required_xp,
            status: journey.status,
            listed: journey.listed,
            dead_line: journey.dead_line,
            duration: journey.duration,
            created_at: now,
            updated_at: now,
        };
        tables.journeys.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_journey(&self, journey: Journey) -> StorageResult<Journey> {
        let mut tables = self.tables.lock();
        if tables
            .journeys
            .values()
            .any(|j| j.name == journey.name && j.id != journey.id)
        {
            return Err(violation("developer_journeys.name must be unique"));
        }
        let Some(existing) = tables.journeys.get_mut(&journey.id) else {
            return Err(StorageError::Sqlx(sqlx::Error::RowNotFound));
        };
        *existing = Journey {
            created_at: existing.created_at,
            updated_at: Utc::now(),
            ..journey
        };
        Ok(existing.clone())
    }

    async fn delete_journey(&self, id: i64) -> StorageResult<bool> {
        let mut tables = self.tables.lock();
        if tables.tutorials.values().any(|t| t.journey_id == id) {
            return Err(violation("journey still has tutorials"));
        }
        tables.completions.retain(|_, c| c.journey_id != id);
        Ok(tables.journeys.remove(&id).is_some())
    }

    async fn list_tutorials(&self, journey_id: i64) -> StorageResult<Vec<Tutorial>> {
        let tables = self.tables.lock();
        let mut tutorials: Vec<Tutorial> = tables
            .tutorials
            .values()
            .filter(|t| t.journey_id == journey_id)
            .cloned()
            .collect();
        tutorials.sort_by_key(|t| (t.position, t.id));
        Ok(tutorials)
    }

    async fn find_tutorial(&self, journey_id: i64, id: i64) -> StorageResult<Option<Tutorial>> {
        let tables = self.tables.lock();
        Ok(tables
            .tutorials
            .get(&id)
            .filter(|t| t.journey_id == journey_id)
            .cloned())
    }

    async fn find_tutorial_by_id(&self, id: i64) -> StorageResult<Option<Tutorial>> {
        Ok(self.tables.lock().tutorials.get(&id).cloned())
    }

    async fn find_duplicate_tutorial(
        &self,
        journey_id: i64,
        title: &str,
        position: i32,
        exclude_id: Option<i64>,
    ) -> StorageResult<Option<Tutorial>> {
        let tables = self.tables.lock();
        Ok(tables
            .tutorials
            .values()
            .find(|t| {
                t.journey_id == journey_id
                    && t.title == title
                    && t.position == position
                    && Some(t.id) != exclude_id
            })
            .cloned())
    }

    async fn create_tutorial(&self, tutorial: NewTutorial) -> StorageResult<Tutorial> {
        let mut tables = self.tables.lock();
        if !tables.journeys.contains_key(&tutorial.journey_id) {
            return Err(violation("tutorial references a missing journey"));
        }
        if tables.tutorials.values().any(|t| {
            t.journey_id == tutorial.journey_id
                && t.title == tutorial.title
                && t.position == tutorial.position
        }) {
            return Err(violation("tutorial (journey_id, title, position) must be unique"));
        }
        let now = Utc::now();
        let row = Tutorial {
            id: tables.allocate_id(),
            journey_id: tutorial.journey_id,
            title: tutorial.title,
            position: tutorial.position,
            status: tutorial.status,
            author_id: tutorial.author_id,
            created_at: now,
            updated_at: now,
        };
        tables.tutorials.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_tutorial(&self, tutorial: Tutorial) -> StorageResult<Tutorial> {
        let mut tables = self.tables.lock();
        let Some(existing) = tables.tutorials.get_mut(&tutorial.id) else {
            return Err(StorageError::Sqlx(sqlx::Error::RowNotFound));
        };
        existing.title = tutorial.title;
        existing.position = tutorial.position;
        existing.status = tutorial.status;
        existing.updated_at = Utc::now();
        Ok(existing.clone())
    }

    async fn delete_tutorial(&self, id: i64) -> StorageResult<bool> {
        let mut tables = self.tables.lock();
        if tables.questions.values().any(|q| q.tutorial_id == id) {
            return Err(violation("tutorial still has questions"));
        }
        Ok(tables.tutorials.remove(&id).is_some())
    }

    async fn list_questions(&self, tutorial_id: i64) -> StorageResult<Vec<TutorialQuestion>> {
        let tables = self.tables.lock();
        let mut questions: Vec<TutorialQuestion> = tables
            .questions
            .values()
            .filter(|q| q.tutorial_id == tutorial_id)
            .cloned()
            .collect();
        questions.sort_by_key(|q| (q.position, q.id));
        Ok(questions)
    }

    async fn find_question(
        &self,
        tutorial_id: i64,
        id: i64,
    ) -> StorageResult<Option<TutorialQuestion>> {
        let tables = self.tables.lock();
        Ok(tables
            .questions
            .get(&id)
            .filter(|q| q.tutorial_id == tutorial_id)
            .cloned())
    }

    async fn find_question_by_id(&self, id: i64) -> StorageResult<Option<TutorialQuestion>> {
        Ok(self.tables.lock().questions.get(&id).cloned())
    }

    async fn find_duplicate_question(
        &self,
        tutorial_id: i64,
        question_text: &str,
        position: i32,
        exclude_id: Option<i64>,
    ) -> StorageResult<Option<TutorialQuestion>> {
        let tables = self.tables.lock();
        Ok(tables
            .questions
            .values()
            .find(|q| {
                q.tutorial_id == tutorial_id
                    && q.question_text == question_text
                    && q.position == position
                    && Some(q.id) != exclude_id
            })
            .cloned())
    }

    async fn create_question(&self, question: NewQuestion) -> StorageResult<TutorialQuestion> {
        let mut tables = self.tables.lock();
        if !tables.tutorials.contains_key(&question.tutorial_id) {
            return Err(violation("question references a missing tutorial"));
        }
        let row = TutorialQuestion {
            id: tables.allocate_id(),
            tutorial_id: question.tutorial_id,
            question_text: question.question_text,
            position: question.position,
            created_at: Utc::now(),
        };
        tables.questions.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_question(&self, question: TutorialQuestion) -> StorageResult<TutorialQuestion> {
        let mut tables = self.tables.lock();
        let Some(existing) = tables.questions.get_mut(&question.id) else {
            return Err(StorageError::Sqlx(sqlx::Error::RowNotFound));
        };
        existing.question_text = question.question_text;
        existing.position = question.position;
        Ok(existing.clone())
    }

    async fn delete_question(&self, id: i64) -> StorageResult<bool> {
        let mut tables = self.tables.lock();
        if tables.options.values().any(|o| o.question_id == id) {
            return Err(violation("question still has options"));
        }
        Ok(tables.questions.remove(&id).is_some())
    }

    async fn list_options(&self, question_id: i64) -> StorageResult<Vec<TutorialOption>> {
        let tables = self.tables.lock();
        Ok(tables
            .options
            .values()
            .filter(|o| o.question_id == question_id)
            .cloned()
            .collect())
    }

    async fn find_option(&self, question_id: i64, id: i64) -> StorageResult<Option<TutorialOption>> {
        let tables = self.tables.lock();
        Ok(tables
            .options
            .get(&id)
            .filter(|o| o.question_id == question_id)
            .cloned())
    }

    async fn find_duplicate_option(
        &self,
        question_id: i64,
        option_label: Option<&str>,
        option_text: &str,
        exclude_id: Option<i64>,
    ) -> StorageResult<Option<TutorialOption>> {
        let tables = self.tables.lock();
        Ok(tables
            .options
            .values()
            .find(|o| {
                o.question_id == question_id
                    && o.option_text == option_text
                    && option_label.map_or(true, |label| o.option_label == label)
                    && Some(o.id) != exclude_id
            })
            .cloned())
    }

    async fn create_option(&self, option: NewOption) -> StorageResult<TutorialOption> {
        let mut tables = self.tables.lock();
        if !tables.questions.contains_key(&option.question_id) {
            return Err(violation("option references a missing question"));
        }
        let row = TutorialOption {
            id: tables.allocate_id(),
            question_id: option.question_id,
            option_label: option.option_label,
            option_text: option.option_text,
        };
        tables.options.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_option_text(
        &self,
        id: i64,
        option_text: &str,
    ) -> StorageResult<Option<TutorialOption>> {
        let mut tables = self.tables.lock();
        Ok(tables.options.get_mut(&id).map(|option| {
            option.option_text = option_text.to_string();
            option.clone()
        }))
    }

    async fn delete_options_for_question(&self, question_id: i64) -> StorageResult<u64> {
        let mut tables = self.tables.lock();
        let before = tables.options.len();
        tables.options.retain(|_, o| o.question_id != question_id);
        Ok((before - tables.options.len()) as u64)
    }

    async fn delete_option(&self, id: i64) -> StorageResult<bool> {
        Ok(self.tables.lock().options.remove(&id).is_some())
    }

    async fn find_completion(
        &self,
        journey_id: i64,
        user_id: i64,
    ) -> StorageResult<Option<JourneyCompletion>> {
        let tables = self.tables.lock();
        Ok(tables
            .completions
            .values()
            .find(|c| c.journey_id == journey_id && c.user_id == user_id)
            .cloned())
    }

    async fn create_completion(&self, completion: NewCompletion) -> StorageResult<JourneyCompletion> {
        let mut tables = self.tables.lock();
        if !tables.journeys.contains_key(&completion.journey_id) {
            return Err(violation("completion references a missing journey"));
        }
        if !tables.users.contains_key(&completion.user_id) {
            return Err(violation("completion references a missing user"));
        }
        if tables
            .completions
            .values()
            .any(|c| c.journey_id == completion.journey_id && c.user_id == completion.user_id)
        {
            return Err(violation("completion (journey_id, user_id) must be unique"));
        }
        let row = JourneyCompletion {
            id: tables.allocate_id(),
            journey_id: completion.journey_id,
            user_id: completion.user_id,
            enrolling_times: 1,
            enrollments_at: completion.enrolled_at,
            last_enrolled_at: completion.enrolled_at,
            study_duration: completion.study_duration,
            avg_submission_rating: None,
            created_at: completion.enrolled_at,
        };
        tables.completions.insert(row.id, row.clone());
        Ok(row)
    }

    async fn add_study_duration(
        &self,
        id: i64,
        minutes: i32,
        at: DateTime<Utc>,
    ) -> StorageResult<Option<JourneyCompletion>> {
        let mut tables = self.tables.lock();
        Ok(tables.completions.get_mut(&id).map(|completion| {
            completion.study_duration += minutes;
            completion.last_enrolled_at = at;
            completion.clone()
        }))
    }

    async fn aggregate_learning_metrics(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StorageResult<Vec<UserMetric>> {
        self.aggregate_calls.fetch_add(1, Ordering::SeqCst);

        #[derive(Default)]
        struct Acc {
            journeys: BTreeSet<i64>,
            total: i64,
            ratings: Vec<f64>,
            ratios: Vec<f64>,
        }

        let tables = self.tables.lock();
        let mut by_user: BTreeMap<i64, Acc> = BTreeMap::new();
        for completion in tables.completions.values() {
            if completion.created_at < start || completion.created_at > end {
                continue;
            }
            let Some(journey) = tables.journeys.get(&completion.journey_id) else {
                continue;
            };
            let acc = by_user.entry(completion.user_id).or_default();
            acc.journeys.insert(completion.journey_id);
            acc.total += i64::from(completion.study_duration);
            if let Some(rating) = completion.avg_submission_rating {
                acc.ratings.push(rating);
            }
            acc.ratios.push(if journey.duration == 0 {
                0.0
            } else {
                f64::from(completion.study_duration) / f64::from(journey.duration)
            });
        }

        Ok(by_user
            .into_iter()
            .map(|(user_id, acc)| {
                UserMetric::from_totals(
                    user_id,
                    acc.journeys.len() as i64,
                    acc.total,
                    mean(&acc.ratings),
                    mean(&acc.ratios),
                )
            })
            .collect())
    }

    async fn find_user(&self, id: i64) -> StorageResult<Option<User>> {
        Ok(self.tables.lock().users.get(&id).cloned())
    }


    async fn create_user(&self, user: NewUser) -> StorageResult<User> {
        let mut tables = self.tables.lock();
        if tables
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(violation("users.email must be unique"));
        }
        let row = User {
            id: tables.allocate_id(),
            display_name: user.display_name,
            name: user.name,
            email: user.email,
            password: user.password,
            phone: user.phone,
            user_role: user.user_role,
            created_at: Utc::now(),
        };
        tables.users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn create_refresh_token(
        &self,
        token: &str,
        user_id: Option<i64>,
    ) -> StorageResult<RefreshToken> {
        let mut tables = self.tables.lock();
        if tables.refresh_tokens.values().any(|t| t.token == token) {
            return Err(violation("refresh_tokens.token must be unique"));
        }
        let row = RefreshToken {
            id: tables.allocate_id(),
            token: token.to_string(),
            user_id,
            created_at: Utc::now(),
        };
        tables.refresh_tokens.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_refresh_token(&self, token: &str) -> StorageResult<Option<RefreshToken>> {
        let tables = self.tables.lock();
        Ok(tables
            .refresh_tokens
            .values()
            .find(|t| t.token == token)
            .cloned())
    }

    async fn delete_refresh_token(&self, token: &str) -> StorageResult<bool> {
        let mut tables = self.tables.lock();
        let before = tables.refresh_tokens.len();
        tables.refresh_tokens.retain(|_, t| t.token != token);
        Ok(tables.refresh_tokens.len() < before)
    }

    async fn upsert_learning_style(
        &self,
        upsert: LearningStyleUpsert,
    ) -> StorageResult<LearningStyleRecord> {
        if let Some(limit) = *self.fail_style_writes_after.lock() {
            if self.style_writes.load(Ordering::SeqCst) >= limit {
                return Err(StorageError::Unavailable(
                    "learning style writes disabled".to_string(),
                ));
            }
        }

        let mut tables = self.tables.lock();
        if !tables.users.contains_key(&upsert.user_id) {
            return Err(violation("learning style references a missing user"));
        }

        let existing = tables
            .learning_styles
            .values()
            .find(|r| r.user_id == upsert.user_id && r.period == upsert.period)
            .map(|r| r.id);
        let id = match existing {
            Some(id) => id,
            None => tables.allocate_id(),
        };

        let record = LearningStyleRecord {
            id,
            user_id: upsert.user_id,
            period: upsert.period,
            learning_style: upsert.learning_style,
            description: upsert.description,
            recommendations: upsert.recommendations,
            avg_completion_ratio: upsert.avg_completion_ratio,
            created_at: upsert.created_at,
        };
        tables.learning_styles.insert(id, record.clone());
        self.style_writes.fetch_add(1, Ordering::SeqCst);
        Ok(record)
    }

    async fn find_learning_style(
        &self,
        user_id: i64,
        period: Option<NaiveDate>,
    ) -> StorageResult<Option<LearningStyleRecord>> {
        let tables = self.tables.lock();
        Ok(tables
            .learning_styles
            .values()
            .filter(|r| r.user_id == user_id && period.map_or(true, |p| r.period == p))
            .max_by_key(|r| (r.created_at, r.id))
            .cloned())
    }

    async fn latest_learning_style(
        &self,
        user_id: i64,
    ) -> StorageResult<Option<LearningStyleWithUser>> {
        let tables = self.tables.lock();
        Ok(tables
            .learning_styles
            .values()
            .filter(|r| r.user_id == user_id)
            .max_by_key(|r| (r.period, r.created_at))
            .and_then(|r| tables.with_user(r)))
    }

    async fn list_learning_styles_by_period(
        &self,
        period: NaiveDate,
    ) -> StorageResult<Vec<LearningStyleWithUser>> {
        let tables = self.tables.lock();
        let mut records: Vec<&LearningStyleRecord> = tables
            .learning_styles
            .values()
            .filter(|r| r.period == period)
            .collect();
        records.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(records.into_iter().filter_map(|r| tables.with_user(r)).collect())
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            display_name: email.to_string(),
            name: email.to_string(),
            email: email.to_string(),
            password: "hashed".to_string(),
            phone: None,
            user_role: 0,
        }
    }

    async fn journey(repo: &InMemoryRepository, name: &str, duration: i32) -> Journey {
        repo.create_journey(NewJourney {
            name: name.to_string(),
            duration,
            ..NewJourney::default()
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn aggregate_groups_by_user_inside_window() {
        let repo = InMemoryRepository::new();
        let user = repo.create_user(new_user("a@example.com")).await.unwrap();
        let other = repo.create_user(new_user("b@example.com")).await.unwrap();
        let rust = journey(&repo, "Rust", 100).await;
        let sql = journey(&repo, "SQL", 0).await;

        let inside = Utc.with_ymd_and_hms(2024, 2, 10, 12, 0, 0).unwrap();
        let outside = Utc.with_ymd_and_hms(2024, 3, 2, 12, 0, 0).unwrap();

        let first = repo
            .create_completion(NewCompletion {
                journey_id: rust.id,
                user_id: user.id,
                study_duration: 80,
                enrolled_at: inside,
            })
            .await
            .unwrap();
        repo.set_submission_rating(first.id, Some(4.0));
        repo.create_completion(NewCompletion {
            journey_id: sql.id,
            user_id: user.id,
            study_duration: 40,
            enrolled_at: inside,
        })
        .await
        .unwrap();
        repo.create_completion(NewCompletion {
            journey_id: rust.id,
            user_id: other.id,
            study_duration: 50,
            enrolled_at: outside,
        })
        .await
        .unwrap();

        let start = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap();
        let metrics = repo.aggregate_learning_metrics(start, end).await.unwrap();

        assert_eq!(metrics.len(), 1);
        let metric = &metrics[0];
        assert_eq!(metric.user_id, user.id);
        assert_eq!(metric.module_count, 2);
        assert_eq!(metric.total_study_duration, 120);
        assert_eq!(metric.avg_study_per_module, 60.0);
        assert_eq!(metric.avg_submission_rating, 4.0);
        // (0.8 + 0) / 2, the zero-target journey counts as 0
        assert!((metric.avg_completion_ratio - 0.4).abs() < 1e-9);
        assert_eq!(repo.aggregate_calls(), 1);
    }

    #[tokio::test]
    async fn upsert_overwrites_same_user_and_period() {
        let repo = InMemoryRepository::new();
        let user = repo.create_user(new_user("a@example.com")).await.unwrap();
        let period = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();

        let upsert = |style: &str| LearningStyleUpsert {
            user_id: user.id,
            period,
            learning_style: style.to_string(),
            description: "d".to_string(),
            recommendations: vec![],
            avg_completion_ratio: 0.5,
            created_at: Utc::now(),
        };

        let first = repo.upsert_learning_style(upsert("Consistent")).await.unwrap();
        let second = repo.upsert_learning_style(upsert("Reflective")).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(repo.learning_style_count(), 1);
        let found = repo
            .find_learning_style(user.id, Some(period))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.learning_style, "Reflective");
    }

    #[tokio::test]
    async fn delete_journey_is_restricted_by_tutorials() {
        let repo = InMemoryRepository::new();
        let rust = journey(&repo, "Rust", 10).await;
        repo.create_tutorial(NewTutorial {
            journey_id: rust.id,
            title: "Ownership".to_string(),
            position: 1,
            status: 1,
            author_id: None,
        })
        .await
        .unwrap();

        assert!(matches!(
            repo.delete_journey(rust.id).await,
            Err(StorageError::Constraint(_))
        ));
    }
}
