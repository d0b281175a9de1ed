use std::{fmt, fs, path::Path};

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{
    error::{Error, Result},
    validation::validate_for_import,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    #[default]
    Single,
    Multiple,
    Sequence,
}

impl QuestionType {
    pub const ALL: [QuestionType; 3] = [
        QuestionType::Single,
        QuestionType::Multiple,
        QuestionType::Sequence,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Single => "single",
            QuestionType::Multiple => "multiple",
            QuestionType::Sequence => "sequence",
        }
    }

    /// Correct answers a question of this type starts with.
    pub fn default_answer(&self, options: usize) -> Vec<usize> {
        match self {
            QuestionType::Single | QuestionType::Multiple => vec![0],
            QuestionType::Sequence => (0..options).collect(),
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        QuestionType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown question type '{s}'"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl Default for Topic {
    fn default() -> Self {
        Self {
            id: 1,
            name: String::new(),
            description: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub text: String,
    pub options: Vec<String>,
    #[serde(deserialize_with = "answer_indices")]
    pub correct_answer: Vec<usize>,
    pub question_type: QuestionType,
    #[serde(default = "default_difficulty")]
    pub difficulty: u8,
    #[serde(default)]
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
}

fn default_difficulty() -> u8 {
    1
}

// Sequence answers were historically written as strings ("0", "2", ...).
pub(crate) fn answer_indices<'de, D>(deserializer: D) -> std::result::Result<Vec<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Index {
        Number(usize),
        Text(String),
    }

    Vec::<Index>::deserialize(deserializer)?
        .into_iter()
        .map(|index| match index {
            Index::Number(n) => Ok(n),
            Index::Text(s) => s.trim().parse::<usize>().map_err(|_| {
                de::Error::invalid_value(de::Unexpected::Str(&s), &"an option index")
            }),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct QuizDocument {
    pub topic: Topic,
    pub questions: Vec<Question>,
}

impl QuizDocument {
    pub fn from_json_str(content: &str) -> Result<Self> {
        Self::from_value(parse_json(content)?)
    }

    /// Well-formed JSON that does not fit the schema is reported with every problem found.
    pub fn from_value(value: Value) -> Result<Self> {
        match value.as_object() {
            Some(map) if map.contains_key("topic") && map.contains_key("questions") => {}
            _ => return Err(Error::MissingSections),
        }
        serde_json::from_value(value.clone()).map_err(|e| {
            let mut problems = validate_for_import(&value);
            if problems.is_empty() {
                problems.push(e.to_string());
            }
            Error::InvalidDocument(problems)
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json_str(&read_json_file(path)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        fs::write(path, self.to_json_pretty()?).map_err(|e| Error::io(path, e))
    }

    pub fn question(&self, index: usize) -> Result<&Question> {
        self.questions.get(index).ok_or(Error::NoSuchQuestion(index + 1))
    }

    pub fn question_mut(&mut self, index: usize) -> Result<&mut Question> {
        self.questions
            .get_mut(index)
            .ok_or(Error::NoSuchQuestion(index + 1))
    }

    pub fn next_question_id(&self) -> i64 {
        self.questions
            .iter()
            .filter_map(|q| q.id)
            .max()
            .unwrap_or(0)
            .max(self.questions.len() as i64)
            + 1
    }
}

/// Reads a file into a string, for callers that want the raw JSON.
pub fn read_json_file(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    fs::read_to_string(path).map_err(|e| Error::io(path, e))
}

/// Syntax errors only; the shape is checked separately.
pub fn parse_json(content: &str) -> Result<Value> {
    serde_json::from_str(content).map_err(Error::InvalidJson)
}

impl Question {
    pub fn is_correct(&self, option: usize) -> bool {
        self.correct_answer.contains(&option)
    }

    /// Question text cut down for list views.
    pub fn short_text(&self) -> String {
        if self.text.chars().count() > 40 {
            let head: String = self.text.chars().take(40).collect();
            format!("{head}...")
        } else {
            self.text.clone()
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Topic #{}\nName: {}\nDescription: {}",
            self.id, self.name, self.description
        )
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.text)?;
        writeln!(
            f,
            "Type: {}  Difficulty: {}",
            self.question_type, self.difficulty
        )?;
        for (i, option) in self.options.iter().enumerate() {
            let mark = if self.is_correct(i) { 'V' } else { 'X' };
            writeln!(f, "  {}) {} ({})", i + 1, option, mark)?;
        }
        if self.question_type == QuestionType::Sequence {
            let order: Vec<String> = self
                .correct_answer
                .iter()
                .map(|i| (i + 1).to_string())
                .collect();
            writeln!(f, "Order: {}", order.join(" -> "))?;
        }
        if !self.explanation.is_empty() {
            writeln!(f, "Explanation: {}", self.explanation)?;
        }
        Ok(())
    }
}
