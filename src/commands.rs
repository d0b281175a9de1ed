use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::{
    editor::{QuestionEdit, SequenceMove, TopicEdit},
    error::{Error, Result},
    quiz::QuestionType,
    validation::DraftError,
};

#[derive(Parser, Debug)]
#[command(version, about = "Author quiz question files for the quiz bot")]
pub struct Cli {
    /// Quiz JSON file to work on.
    #[arg(short, long, global = true)]
    pub file: Option<PathBuf>,

    /// Database URL.
    #[arg(long, env = "DB_ENGINE", global = true)]
    pub database: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// One line typed into the shell.
#[derive(Parser, Debug)]
#[command(no_binary_name = true, name = "quizmaker")]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start a new document.
    New(TopicArgs),
    /// Open a quiz file.
    Open { path: PathBuf },
    /// Save to the current file.
    Save,
    /// Save to a new file.
    SaveAs { path: PathBuf },
    /// Show the topic and the question list.
    Show,
    /// Edit the topic.
    Topic(TopicArgs),
    /// Add a question with default content.
    Add,
    /// Delete a question.
    Delete { question: Option<usize> },
    /// Duplicate a question.
    Duplicate { question: Option<usize> },
    /// Select the question later commands apply to.
    Select { question: usize },
    /// Show a question in full.
    View { question: Option<usize> },
    /// Change fields of a question.
    Edit(EditArgs),
    /// Append an answer option.
    OptionAdd {
        question: Option<usize>,
        #[arg(short, long)]
        text: Option<String>,
    },
    /// Remove the last answer option.
    OptionRemove { question: Option<usize> },
    /// Move an entry of a sequence answer.
    Sequence {
        position: usize,
        #[arg(value_enum)]
        direction: Direction,
        #[arg(short, long)]
        question: Option<usize>,
    },
    /// Attach an image, copied into the media folder on save.
    Image {
        path: PathBuf,
        #[arg(short, long)]
        question: Option<usize>,
    },
    /// Detach the image of a question.
    ImageRemove { question: Option<usize> },
    /// Check the document, or a quiz file as it is on disk, before a database import.
    Validate { path: Option<PathBuf> },
    /// Test the database connection and show statistics.
    DbCheck,
    /// List topics stored in the database.
    DbTopics,
    /// Load a topic from the database into the editor.
    DbExport {
        topic_id: i64,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Import the document into the database.
    DbImport {
        /// Update the topic and questions that already exist.
        #[arg(long)]
        update: bool,
    },
    /// Interactive editing session.
    Shell,
    /// Leave the shell.
    Quit {
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicArgs {
    #[arg(long)]
    pub id: Option<i64>,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct EditArgs {
    pub question: Option<usize>,
    #[arg(long)]
    pub text: Option<String>,
    #[arg(long = "type")]
    pub question_type: Option<QuestionType>,
    #[arg(long)]
    pub difficulty: Option<u8>,
    #[arg(long)]
    pub explanation: Option<String>,
    /// Replaces every option; repeat for each one.
    #[arg(long = "option")]
    pub options: Vec<String>,
    /// Correct option numbers, e.g. `--correct 1,3`. Order matters for sequences.
    #[arg(long, value_delimiter = ',')]
    pub correct: Vec<usize>,
    #[arg(long, conflicts_with = "no_image")]
    pub image: Option<PathBuf>,
    #[arg(long)]
    pub no_image: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl From<Direction> for SequenceMove {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Up => SequenceMove::Up,
            Direction::Down => SequenceMove::Down,
        }
    }
}

impl From<TopicArgs> for TopicEdit {
    fn from(args: TopicArgs) -> Self {
        TopicEdit {
            id: args.id,
            name: args.name,
            description: args.description,
        }
    }
}

impl EditArgs {
    pub fn into_edit(self) -> Result<QuestionEdit> {
        let correct_answer = if self.correct.is_empty() {
            None
        } else {
            Some(
                self.correct
                    .into_iter()
                    .map(|number| number.checked_sub(1).ok_or(DraftError::IndexOutOfRange(0)))
                    .collect::<std::result::Result<Vec<_>, _>>()?,
            )
        };

        Ok(QuestionEdit {
            text: self.text,
            question_type: self.question_type,
            difficulty: self.difficulty,
            explanation: self.explanation,
            options: (!self.options.is_empty()).then_some(self.options),
            correct_answer,
            image: self.image,
            remove_image: self.no_image,
        })
    }
}

/// Turns a 1-based question number from the command line into an index.
pub fn question_index(number: Option<usize>) -> Result<Option<usize>> {
    match number {
        Some(0) => Err(Error::NoSuchQuestion(0)),
        Some(n) => Ok(Some(n - 1)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &[&str]) -> Command {
        ShellLine::try_parse_from(line).unwrap().command
    }

    #[test]
    fn parses_edit_with_options_and_answers() {
        let command = parse(&[
            "edit", "2", "--type", "multiple", "--option", "Kyiv", "--option", "Moscow",
            "--option", "Minsk", "--correct", "1,3",
        ]);
        let Command::Edit(args) = command else {
            panic!("expected edit");
        };
        assert_eq!(args.question, Some(2));
        let edit = args.into_edit().unwrap();
        assert_eq!(edit.question_type, Some(QuestionType::Multiple));
        assert_eq!(edit.options.unwrap().len(), 3);
        assert_eq!(edit.correct_answer, Some(vec![0, 2]));
    }

    #[test]
    fn unchanged_fields_stay_unset() {
        let Command::Edit(args) = parse(&["edit", "--text", "Who?"]) else {
            panic!("expected edit");
        };
        let edit = args.into_edit().unwrap();
        assert_eq!(edit.text.as_deref(), Some("Who?"));
        assert_eq!(edit.options, None);
        assert_eq!(edit.correct_answer, None);
    }

    #[test]
    fn option_number_zero_is_refused() {
        let Command::Edit(args) = parse(&["edit", "--correct", "0"]) else {
            panic!("expected edit");
        };
        assert!(args.into_edit().is_err());
    }

    #[test]
    fn parses_kebab_case_commands() {
        assert_eq!(
            parse(&["sequence", "2", "up", "-q", "1"]),
            Command::Sequence {
                position: 2,
                direction: Direction::Up,
                question: Some(1)
            }
        );
        assert_eq!(parse(&["db-import", "--update"]), Command::DbImport { update: true });
        assert_eq!(parse(&["validate"]), Command::Validate { path: None });
        assert_eq!(
            parse(&["save-as", "out.json"]),
            Command::SaveAs {
                path: PathBuf::from("out.json")
            }
        );
        assert!(ShellLine::try_parse_from(["edit", "--type", "essay"]).is_err());
    }

    #[test]
    fn question_numbers_are_one_based() {
        assert_eq!(question_index(Some(1)).unwrap(), Some(0));
        assert_eq!(question_index(None).unwrap(), None);
        assert!(question_index(Some(0)).is_err());
    }
}
