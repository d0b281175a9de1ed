use sqlx::prelude::FromRow;

use crate::quiz::{Question, QuestionType, Topic};

#[derive(Debug, Clone, FromRow)]
pub struct TopicRecord {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

/// A `questions` row. Options and correct answers are stored as JSON text.
#[derive(Debug, Clone, FromRow)]
pub struct QuestionRecord {
    pub id: i64,
    pub topic_id: i64,
    pub text: String,
    pub options: String,
    pub correct_answer: String,
    pub question_type: String,
    pub difficulty: Option<i64>,
    pub media_url: Option<String>,
    pub explanation: Option<String>,
}

impl From<TopicRecord> for Topic {
    fn from(record: TopicRecord) -> Self {
        Topic {
            id: record.id,
            name: record.name,
            description: record.description.unwrap_or_default(),
        }
    }
}

impl TryFrom<QuestionRecord> for Question {
    type Error = String;

    fn try_from(record: QuestionRecord) -> Result<Self, Self::Error> {
        let options: Vec<String> = serde_json::from_str(&record.options)
            .map_err(|e| format!("options of question {}: {}", record.id, e))?;
        let correct_answer = parse_answer(&record.correct_answer)
            .map_err(|e| format!("correct answer of question {}: {}", record.id, e))?;
        let question_type = record.question_type.parse::<QuestionType>()?;
        let difficulty = record
            .difficulty
            .and_then(|d| u8::try_from(d).ok())
            .unwrap_or(1);

        Ok(Question {
            id: Some(record.id),
            text: record.text,
            options,
            correct_answer,
            question_type,
            difficulty,
            explanation: record.explanation.unwrap_or_default(),
            media_url: record.media_url,
        })
    }
}

// Accepts `[0, 2]`, `["0", "2"]` and a bare `1`.
fn parse_answer(raw: &str) -> Result<Vec<usize>, serde_json::Error> {
    #[derive(serde::Deserialize)]
    struct Wrapper {
        #[serde(deserialize_with = "crate::quiz::answer_indices")]
        correct_answer: Vec<usize>,
    }

    let value: serde_json::Value = serde_json::from_str(raw)?;
    let value = match value {
        serde_json::Value::Array(_) => value,
        single => serde_json::Value::Array(vec![single]),
    };
    let wrapper: Wrapper = serde_json::from_value(serde_json::json!({ "correct_answer": value }))?;
    Ok(wrapper.correct_answer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(options: &str, correct: &str, kind: &str) -> QuestionRecord {
        QuestionRecord {
            id: 7,
            topic_id: 1,
            text: "When?".into(),
            options: options.into(),
            correct_answer: correct.into(),
            question_type: kind.into(),
            difficulty: Some(2),
            media_url: None,
            explanation: None,
        }
    }

    #[test]
    fn converts_stored_json_columns() {
        let question = Question::try_from(record(r#"["862", "988"]"#, "[1]", "single")).unwrap();
        assert_eq!(question.id, Some(7));
        assert_eq!(question.options, vec!["862", "988"]);
        assert_eq!(question.correct_answer, vec![1]);
        assert_eq!(question.explanation, "");

        let question = Question::try_from(record(r#"["a", "b"]"#, r#"["1", "0"]"#, "sequence")).unwrap();
        assert_eq!(question.correct_answer, vec![1, 0]);

        let question = Question::try_from(record(r#"["a", "b"]"#, "0", "single")).unwrap();
        assert_eq!(question.correct_answer, vec![0]);
    }

    #[test]
    fn refuses_broken_rows() {
        assert!(Question::try_from(record("not json", "[0]", "single")).is_err());
        assert!(Question::try_from(record(r#"["a"]"#, "[0]", "essay")).is_err());
    }
}
