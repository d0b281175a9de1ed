use std::collections::HashSet;

use serde_json::Value;
use thiserror::Error;

use crate::quiz::{Question, QuestionType};

pub const MIN_OPTIONS: usize = 2;
pub const DIFFICULTY_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

/// Why an edited question was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    #[error("Question text cannot be empty")]
    EmptyText,
    #[error("There must be at least 2 answer options")]
    TooFewOptions,
    #[error("Choose at least one correct answer")]
    NoCorrectAnswer,
    #[error("A single choice question takes exactly one correct answer")]
    SingleNeedsOne,
    #[error("A sequence question must order every option exactly once")]
    IncompleteSequence,
    #[error("Correct answer {0} does not match any option")]
    IndexOutOfRange(usize),
    #[error("Correct answer {0} is listed twice")]
    DuplicateIndex(usize),
    #[error("Difficulty must be between 1 and 5, got {0}")]
    Difficulty(u8),
}

pub fn validate_question(question: &Question) -> Result<(), DraftError> {
    if question.text.trim().is_empty() {
        return Err(DraftError::EmptyText);
    }
    if question.options.len() < MIN_OPTIONS {
        return Err(DraftError::TooFewOptions);
    }
    if question.correct_answer.is_empty() {
        return Err(DraftError::NoCorrectAnswer);
    }
    if !DIFFICULTY_RANGE.contains(&question.difficulty) {
        return Err(DraftError::Difficulty(question.difficulty));
    }

    let mut seen = HashSet::new();
    for &index in &question.correct_answer {
        if index >= question.options.len() {
            return Err(DraftError::IndexOutOfRange(index + 1));
        }
        if !seen.insert(index) {
            return Err(DraftError::DuplicateIndex(index + 1));
        }
    }

    match question.question_type {
        QuestionType::Single if question.correct_answer.len() != 1 => {
            Err(DraftError::SingleNeedsOne)
        }
        QuestionType::Sequence if question.correct_answer.len() != question.options.len() => {
            Err(DraftError::IncompleteSequence)
        }
        _ => Ok(()),
    }
}

/// Checks raw JSON before it goes to the database. Returns every problem found.
pub fn validate_for_import(data: &Value) -> Vec<String> {
    let mut errors = Vec::new();

    match data.get("topic") {
        None => errors.push("Missing 'topic' section".to_owned()),
        Some(Value::Object(topic)) => {
            let name = topic.get("name").and_then(Value::as_str).unwrap_or("");
            if name.trim().is_empty() {
                errors.push("Topic name cannot be empty".to_owned());
            }
        }
        Some(_) => errors.push("'topic' section must be an object".to_owned()),
    }

    match data.get("questions") {
        None => errors.push("Missing 'questions' section".to_owned()),
        Some(Value::Array(questions)) => {
            if questions.is_empty() {
                errors.push("Question list cannot be empty".to_owned());
            }
            for (i, question) in questions.iter().enumerate() {
                check_question(i + 1, question, &mut errors);
            }
        }
        Some(_) => errors.push("'questions' section must be an array".to_owned()),
    }

    errors
}

fn check_question(number: usize, question: &Value, errors: &mut Vec<String>) {
    let Some(question) = question.as_object() else {
        errors.push(format!("Question {number} must be an object"));
        return;
    };

    let text = question.get("text").and_then(Value::as_str).unwrap_or("");
    if text.trim().is_empty() {
        errors.push(format!("Question {number}: missing or empty text"));
    }

    match question.get("options") {
        None | Some(Value::Null) => {
            errors.push(format!("Question {number}: no answer options"))
        }
        Some(Value::Array(options)) if options.is_empty() => {
            errors.push(format!("Question {number}: no answer options"))
        }
        Some(Value::Array(options)) if options.len() < MIN_OPTIONS => errors.push(format!(
            "Question {number}: there must be at least {MIN_OPTIONS} answer options"
        )),
        Some(Value::Array(_)) => {}
        Some(_) => errors.push(format!("Question {number}: options must be a list")),
    }

    if !question.contains_key("correct_answer") {
        errors.push(format!("Question {number}: missing correct answer"));
    }

    let kind = question.get("question_type").and_then(Value::as_str);
    if kind.and_then(|k| k.parse::<QuestionType>().ok()).is_none() {
        errors.push(format!("Question {number}: invalid question type"));
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn question(kind: QuestionType, correct: Vec<usize>) -> Question {
        Question {
            id: Some(1),
            text: "Pick".into(),
            options: vec!["a".into(), "b".into(), "c".into()],
            correct_answer: correct,
            question_type: kind,
            difficulty: 3,
            explanation: String::new(),
            media_url: None,
        }
    }

    #[test]
    fn accepts_each_kind() {
        assert_eq!(validate_question(&question(QuestionType::Single, vec![2])), Ok(()));
        assert_eq!(validate_question(&question(QuestionType::Multiple, vec![0, 2])), Ok(()));
        assert_eq!(validate_question(&question(QuestionType::Sequence, vec![2, 0, 1])), Ok(()));
    }

    #[test]
    fn refuses_broken_questions() {
        let mut q = question(QuestionType::Single, vec![0]);
        q.text = "   ".into();
        assert_eq!(validate_question(&q), Err(DraftError::EmptyText));

        let mut q = question(QuestionType::Single, vec![0]);
        q.options.truncate(1);
        assert_eq!(validate_question(&q), Err(DraftError::TooFewOptions));

        let q = question(QuestionType::Multiple, vec![]);
        assert_eq!(validate_question(&q), Err(DraftError::NoCorrectAnswer));

        let q = question(QuestionType::Single, vec![0, 1]);
        assert_eq!(validate_question(&q), Err(DraftError::SingleNeedsOne));

        let q = question(QuestionType::Multiple, vec![3]);
        assert_eq!(validate_question(&q), Err(DraftError::IndexOutOfRange(4)));

        let q = question(QuestionType::Sequence, vec![0, 1]);
        assert_eq!(validate_question(&q), Err(DraftError::IncompleteSequence));

        let q = question(QuestionType::Sequence, vec![0, 1, 1]);
        assert_eq!(validate_question(&q), Err(DraftError::DuplicateIndex(2)));

        let mut q = question(QuestionType::Single, vec![0]);
        q.difficulty = 6;
        assert_eq!(validate_question(&q), Err(DraftError::Difficulty(6)));
    }

    #[test]
    fn import_check_passes_clean_data() {
        let data = json!({
            "topic": {"id": 1, "name": "History"},
            "questions": [{"text": "Q", "options": ["a", "b"], "correct_answer": [0], "question_type": "single"}]
        });
        assert!(validate_for_import(&data).is_empty());
    }

    #[test]
    fn import_check_collects_every_problem() {
        let data = json!({
            "topic": {"id": 1, "name": " "},
            "questions": [
                "oops",
                {"text": "", "options": ["a"], "question_type": "essay"},
                {"text": "ok", "options": [], "correct_answer": [0], "question_type": "multiple"}
            ]
        });
        let errors = validate_for_import(&data);
        assert_eq!(
            errors,
            vec![
                "Topic name cannot be empty",
                "Question 1 must be an object",
                "Question 2: missing or empty text",
                "Question 2: there must be at least 2 answer options",
                "Question 2: missing correct answer",
                "Question 2: invalid question type",
                "Question 3: no answer options",
            ]
        );
    }

    #[test]
    fn import_check_reports_missing_sections() {
        let errors = validate_for_import(&json!({"topic": [], "questions": {}}));
        assert_eq!(
            errors,
            vec![
                "'topic' section must be an object",
                "'questions' section must be an array"
            ]
        );
        let errors = validate_for_import(&json!({}));
        assert_eq!(errors.len(), 2);
    }
}
