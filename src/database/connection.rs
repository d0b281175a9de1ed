use std::{borrow::Cow, collections::BTreeMap, str::FromStr};

use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
    SqliteConnection,
};
use tracing::instrument;

use super::quiz::{QuestionRecord, TopicRecord};
use crate::{
    error::{Error, Result},
    quiz::{Question, QuizDocument, Topic},
};

pub struct Connection {
    pool: SqlitePool,
}

/// What an import did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub topic_id: i64,
    pub topic_name: String,
    pub imported: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseStats {
    pub topics_count: i64,
    pub questions_count: i64,
    pub question_types: BTreeMap<String, i64>,
    pub difficulties: BTreeMap<i64, i64>,
}

/// Turns a SQLAlchemy style `sqlite:///relative/path.db` into a URL sqlx understands.
pub fn normalize_url(url: &str) -> Cow<'_, str> {
    match url.strip_prefix("sqlite:///") {
        Some(rest) if rest.starts_with('/') => Cow::Owned(format!("sqlite://{rest}")),
        Some(rest) => Cow::Owned(format!("sqlite:{rest}")),
        None => Cow::Borrowed(url),
    }
}

impl Connection {
    #[instrument(level = "info")]
    pub async fn connect(connection_string: &str) -> Result<Self> {
        let url = normalize_url(connection_string);
        log::debug!("Connecting to {}", url);
        let options = SqliteConnectOptions::from_str(&url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    pub async fn ensure_schema(&self) -> Result<()> {
        log::debug!("Running migrations");
        sqlx::migrate!().run(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[allow(async_fn_in_trait)]
pub trait CheckConnection {
    async fn test_connection(&self) -> Result<()>;

    async fn stats(&self) -> Result<DatabaseStats>;
}

#[allow(async_fn_in_trait)]
pub trait RetrieveTopic {
    async fn existing_topics(&self) -> Result<Vec<Topic>>;

    async fn topic_questions(&self, topic_id: i64) -> Result<Vec<Question>>;

    async fn export_topic(&self, topic_id: i64) -> Result<Option<QuizDocument>>;
}

#[allow(async_fn_in_trait)]
pub trait ImportTopic {
    async fn import_document(
        &self,
        document: &QuizDocument,
        update_existing: bool,
    ) -> Result<ImportReport>;
}

impl CheckConnection for Connection {
    async fn test_connection(&self) -> Result<()> {
        let one: i64 = sqlx::query_scalar("SELECT 1").fetch_one(&self.pool).await?;
        log::debug!("Connection check returned {}", one);
        Ok(())
    }

    async fn stats(&self) -> Result<DatabaseStats> {
        let topics_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM topics")
            .fetch_one(&self.pool)
            .await?;
        let questions_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions")
            .fetch_one(&self.pool)
            .await?;

        let question_types: Vec<(String, i64)> = sqlx::query_as(
            "SELECT question_type, COUNT(*) FROM questions GROUP BY question_type",
        )
        .fetch_all(&self.pool)
        .await?;

        let difficulties: Vec<(Option<i64>, i64)> =
            sqlx::query_as("SELECT difficulty, COUNT(*) FROM questions GROUP BY difficulty")
                .fetch_all(&self.pool)
                .await?;

        let mut by_difficulty = BTreeMap::new();
        for (difficulty, count) in difficulties {
            *by_difficulty.entry(difficulty.unwrap_or(1)).or_insert(0) += count;
        }

        Ok(DatabaseStats {
            topics_count,
            questions_count,
            question_types: question_types.into_iter().collect(),
            difficulties: by_difficulty,
        })
    }
}

impl RetrieveTopic for Connection {
    async fn existing_topics(&self) -> Result<Vec<Topic>> {
        let records: Vec<TopicRecord> =
            sqlx::query_as("SELECT id, name, description FROM topics ORDER BY id")
                .fetch_all(&self.pool)
                .await?;

        Ok(records.into_iter().map(Topic::from).collect())
    }

    async fn topic_questions(&self, topic_id: i64) -> Result<Vec<Question>> {
        let records: Vec<QuestionRecord> = sqlx::query_as(
            "SELECT id, topic_id, text, options, correct_answer, question_type, difficulty, media_url, explanation \
             FROM questions WHERE topic_id = ? ORDER BY id",
        )
        .bind(topic_id)
        .fetch_all(&self.pool)
        .await?;

        let mut questions = Vec::with_capacity(records.len());
        for record in records {
            match Question::try_from(record) {
                Ok(question) => questions.push(question),
                Err(e) => log::error!("Skipping unreadable question in topic {}: {}", topic_id, e),
            }
        }
        Ok(questions)
    }

    async fn export_topic(&self, topic_id: i64) -> Result<Option<QuizDocument>> {
        let record: Option<TopicRecord> =
            sqlx::query_as("SELECT id, name, description FROM topics WHERE id = ?")
                .bind(topic_id)
                .fetch_optional(&self.pool)
                .await?;

        let Some(record) = record else {
            log::info!("Topic {} not found", topic_id);
            return Ok(None);
        };

        let questions = self.topic_questions(topic_id).await?;
        log::info!("Exporting topic {} with {} questions", topic_id, questions.len());
        Ok(Some(QuizDocument {
            topic: record.into(),
            questions,
        }))
    }
}

impl ImportTopic for Connection {
    async fn import_document(
        &self,
        document: &QuizDocument,
        update_existing: bool,
    ) -> Result<ImportReport> {
        log::debug!("Creating transaction");
        let mut tx = self.pool.begin().await?;
        let topic = &document.topic;

        let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM topics WHERE id = ?")
            .bind(topic.id)
            .fetch_optional(&mut *tx)
            .await?;

        let topic_id = match existing {
            Some(id) if !update_existing => return Err(Error::TopicExists(id)),
            Some(id) => {
                log::debug!("Updating topic {}", id);
                sqlx::query("UPDATE topics SET name = ?, description = ? WHERE id = ?")
                    .bind(&topic.name)
                    .bind(&topic.description)
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
                id
            }
            None => {
                log::debug!("Adding topic {}", topic.id);
                sqlx::query("INSERT INTO topics (id, name, description) VALUES (?, ?, ?)")
                    .bind(topic.id)
                    .bind(&topic.name)
                    .bind(&topic.description)
                    .execute(&mut *tx)
                    .await?
                    .last_insert_rowid()
            }
        };

        let mut report = ImportReport {
            topic_id,
            topic_name: topic.name.clone(),
            imported: 0,
            skipped: 0,
            failed: 0,
        };

        for question in &document.questions {
            match import_question(&mut *tx, topic_id, question, update_existing).await {
                Ok(true) => report.imported += 1,
                Ok(false) => report.skipped += 1,
                Err(e) => {
                    log::error!("Failed to import question '{}': {}", question.short_text(), e);
                    report.failed += 1;
                }
            }
        }

        log::debug!("Closing transaction");
        tx.commit().await?;
        log::info!(
            "Imported topic '{}' ({}): {} questions, {} skipped",
            report.topic_name,
            report.topic_id,
            report.imported,
            report.skipped
        );
        Ok(report)
    }
}

/// Returns `false` when an existing question was left alone.
async fn import_question(
    conn: &mut SqliteConnection,
    topic_id: i64,
    question: &Question,
    update_existing: bool,
) -> Result<bool> {
    let existing: Option<i64> = match question.id {
        Some(id) => {
            sqlx::query_scalar("SELECT id FROM questions WHERE id = ? AND topic_id = ?")
                .bind(id)
                .bind(topic_id)
                .fetch_optional(&mut *conn)
                .await?
        }
        None => None,
    };

    let options = serde_json::to_string(&question.options)?;
    let correct_answer = serde_json::to_string(&question.correct_answer)?;

    match existing {
        Some(_) if !update_existing => Ok(false),
        Some(id) => {
            sqlx::query(
                "UPDATE questions SET text = ?, options = ?, correct_answer = ?, question_type = ?, \
                 difficulty = ?, media_url = ?, explanation = ? WHERE id = ?",
            )
            .bind(&question.text)
            .bind(&options)
            .bind(&correct_answer)
            .bind(question.question_type.as_str())
            .bind(i64::from(question.difficulty))
            .bind(&question.media_url)
            .bind(&question.explanation)
            .bind(id)
            .execute(&mut *conn)
            .await?;
            Ok(true)
        }
        None => {
            sqlx::query(
                "INSERT INTO questions (topic_id, text, options, correct_answer, question_type, difficulty, media_url, explanation) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(topic_id)
            .bind(&question.text)
            .bind(&options)
            .bind(&correct_answer)
            .bind(question.question_type.as_str())
            .bind(i64::from(question.difficulty))
            .bind(&question.media_url)
            .bind(&question.explanation)
            .execute(&mut *conn)
            .await?;
            Ok(true)
        }
    }
}
