use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::instrument;

use crate::{
    constructor::{self, default_option, new_document},
    error::{Error, Result},
    media::{self, ImageStatus, PendingImage},
    quiz::{Question, QuestionType, QuizDocument},
    state::Session,
    validation::{validate_question, DraftError, MIN_OPTIONS},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicEdit {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Changed fields of a question. Unset fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionEdit {
    pub text: Option<String>,
    pub question_type: Option<QuestionType>,
    pub difficulty: Option<u8>,
    pub explanation: Option<String>,
    pub options: Option<Vec<String>>,
    /// Zero-based option indices.
    pub correct_answer: Option<Vec<usize>>,
    pub image: Option<PathBuf>,
    pub remove_image: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceMove {
    Up,
    Down,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveReport {
    pub path: PathBuf,
    pub copied_images: Vec<String>,
    pub failed_images: Vec<(String, String)>,
}

impl Session {
    #[instrument(level = "info", skip(self))]
    pub fn new_file(&mut self, topic: TopicEdit) {
        log::info!("Starting a new document");
        let has_fields = topic != TopicEdit::default();
        *self = Session::new(new_document());
        self.edit_topic(topic);
        // an untouched blank document has nothing worth saving
        self.dirty = has_fields;
    }

    #[instrument(level = "info", skip(self, path), fields(file = %path.as_ref().display()))]
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let document = QuizDocument::load(path)?;
        log::info!(
            "Opened '{}' with {} questions",
            path.display(),
            document.questions.len()
        );
        *self = Session::new(document);
        self.file_path = Some(path.to_path_buf());
        Ok(())
    }

    pub fn save(&mut self, media_dir: &Path) -> Result<SaveReport> {
        let path = self.file_path.clone().ok_or(Error::NoFilePath)?;
        self.save_to(&path, media_dir)
    }

    pub fn save_as(&mut self, path: impl Into<PathBuf>, media_dir: &Path) -> Result<SaveReport> {
        let path = path.into();
        let report = self.save_to(&path, media_dir)?;
        self.file_path = Some(path);
        Ok(report)
    }

    #[instrument(level = "info", skip(self, path, media_dir), fields(file = %path.display()))]
    fn save_to(&mut self, path: &Path, media_dir: &Path) -> Result<SaveReport> {
        let mut report = SaveReport {
            path: path.to_path_buf(),
            ..SaveReport::default()
        };

        let referenced: Vec<String> = self
            .document
            .questions
            .iter()
            .filter_map(|q| q.media_url.clone())
            .collect();
        self.pending_images
            .retain(|url, _| referenced.contains(url));

        let pending: Vec<PendingImage> = self.pending_images.values().cloned().collect();
        for image in pending {
            match image.copy_into(media_dir) {
                Ok(_) => {
                    self.pending_images.remove(&image.media_url);
                    report.copied_images.push(image.media_url);
                }
                Err(e) => {
                    log::error!("Failed to copy image {}: {}", image.source.display(), e);
                    report.failed_images.push((image.media_url, e.to_string()));
                }
            }
        }

        self.document.write(path)?;
        self.dirty = false;
        log::info!("Saved {} questions to '{}'", self.document.questions.len(), path.display());
        Ok(report)
    }

    pub fn edit_topic(&mut self, edit: TopicEdit) {
        let topic = &mut self.document.topic;
        if let Some(id) = edit.id {
            topic.id = id;
        }
        if let Some(name) = edit.name {
            topic.name = name.trim().to_owned();
        }
        if let Some(description) = edit.description {
            topic.description = description.trim().to_owned();
        }
        self.dirty = true;
    }

    /// The question an operation applies to: the given index, else the selection.
    pub fn target(&self, index: Option<usize>) -> Result<usize> {
        let index = index.or(self.selected).ok_or(Error::NothingSelected)?;
        self.document.question(index)?;
        Ok(index)
    }

    pub fn select(&mut self, index: usize) -> Result<&Question> {
        self.document.question(index)?;
        self.selected = Some(index);
        self.document.question(index)
    }

    pub fn add_question(&mut self) -> usize {
        let index = constructor::add_question(&mut self.document);
        self.selected = Some(index);
        self.dirty = true;
        index
    }

    #[instrument(level = "info", skip(self))]
    pub fn delete_question(&mut self, index: Option<usize>) -> Result<Question> {
        let index = self.target(index)?;
        let removed = self.document.questions.remove(index);
        if let Some(url) = &removed.media_url {
            self.pending_images.remove(url);
        }
        log::info!("Deleted question {}: {}", index + 1, removed.short_text());
        self.selected = None;
        self.dirty = true;
        Ok(removed)
    }

    pub fn duplicate_question(&mut self, index: Option<usize>) -> Result<usize> {
        let index = self.target(index)?;
        let copy = constructor::duplicate_question(&mut self.document, index)
            .ok_or(Error::NoSuchQuestion(index + 1))?;
        if let Some(url) = self.document.questions[copy].media_url.clone() {
            // the copy points at the same file; give it its own pending copy too
            if let Some(pending) = self.pending_images.get(&url).cloned() {
                let twin = PendingImage::new(pending.source);
                self.document.questions[copy].media_url = Some(twin.media_url.clone());
                self.pending_images.insert(twin.media_url.clone(), twin);
            }
        }
        self.selected = Some(copy);
        self.dirty = true;
        Ok(copy)
    }

    /// Validates the edited question and only then replaces the stored one.
    #[instrument(level = "info", skip(self, edit))]
    pub fn apply_changes(&mut self, index: Option<usize>, edit: QuestionEdit) -> Result<&Question> {
        let index = self.target(index)?;
        let current = self.document.question(index)?;
        let previous_type = current.question_type;
        let mut draft = current.clone();

        if let Some(text) = edit.text {
            draft.text = text.trim().to_owned();
        }
        if let Some(kind) = edit.question_type {
            draft.question_type = kind;
        }
        if let Some(difficulty) = edit.difficulty {
            draft.difficulty = difficulty;
        }
        if let Some(explanation) = edit.explanation {
            draft.explanation = explanation.trim().to_owned();
        }
        let options_changed = edit.options.is_some();
        if let Some(options) = edit.options {
            draft.options = options
                .into_iter()
                .filter(|option| !option.trim().is_empty())
                .collect();
        }
        match edit.correct_answer {
            Some(correct) => draft.correct_answer = correct,
            None if options_changed || draft.question_type != previous_type => {
                reconcile_answers(&mut draft)
            }
            None => {}
        }
        if draft.id.is_none() {
            draft.id = Some(index as i64 + 1);
        }

        validate_question(&draft)?;

        let mut pending = None;
        if edit.remove_image {
            draft.media_url = None;
        }
        if let Some(source) = edit.image {
            fs::metadata(&source).map_err(|e| Error::io(&source, e))?;
            let image = PendingImage::new(source);
            draft.media_url = Some(image.media_url.clone());
            pending = Some(image);
        }

        let old_url = self.document.questions[index].media_url.clone();
        if let Some(old_url) = old_url.filter(|url| draft.media_url.as_ref() != Some(url)) {
            self.pending_images.remove(&old_url);
        }
        if let Some(image) = pending {
            self.pending_images.insert(image.media_url.clone(), image);
        }

        log::info!("Applied changes to question {}", index + 1);
        self.document.questions[index] = draft;
        self.selected = Some(index);
        self.dirty = true;
        Ok(&self.document.questions[index])
    }

    /// Appends an option and returns its zero-based index.
    pub fn add_option(&mut self, index: Option<usize>, text: Option<String>) -> Result<usize> {
        let index = self.target(index)?;
        let question = self.document.question_mut(index)?;
        let position = question.options.len();
        let text = text
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| default_option(position + 1));
        question.options.push(text);
        if question.question_type == QuestionType::Sequence {
            question.correct_answer.push(position);
        }
        self.dirty = true;
        Ok(position)
    }

    /// Removes the last option, dropping correct answers that pointed at it.
    pub fn remove_option(&mut self, index: Option<usize>) -> Result<String> {
        let index = self.target(index)?;
        let question = self.document.question_mut(index)?;
        if question.options.len() <= MIN_OPTIONS {
            return Err(DraftError::TooFewOptions.into());
        }
        let removed = question.options.pop().unwrap_or_default();
        reconcile_answers(question);
        self.dirty = true;
        Ok(removed)
    }

    /// Moves the entry at `position` of a sequence answer one step.
    pub fn move_sequence(
        &mut self,
        index: Option<usize>,
        position: usize,
        direction: SequenceMove,
    ) -> Result<&[usize]> {
        let index = self.target(index)?;
        let question = self.document.question_mut(index)?;
        if question.question_type != QuestionType::Sequence {
            return Err(Error::NotASequence(index + 1));
        }
        let order = &mut question.correct_answer;
        if position >= order.len() {
            return Err(Error::NoSuchSequenceEntry(index + 1, position + 1));
        }
        match direction {
            SequenceMove::Up if position > 0 => order.swap(position, position - 1),
            SequenceMove::Down if position + 1 < order.len() => order.swap(position, position + 1),
            _ => {}
        }
        self.dirty = true;
        Ok(&self.document.questions[index].correct_answer)
    }

    /// Attaches an image without touching the rest of the question.
    pub fn select_image(&mut self, index: Option<usize>, source: impl Into<PathBuf>) -> Result<String> {
        let index = self.target(index)?;
        let source = source.into();
        fs::metadata(&source).map_err(|e| Error::io(&source, e))?;

        let image = PendingImage::new(source);
        let media_url = image.media_url.clone();
        let question = self.document.question_mut(index)?;
        if let Some(old_url) = question.media_url.replace(media_url.clone()) {
            self.pending_images.remove(&old_url);
        }
        self.pending_images.insert(media_url.clone(), image);
        self.selected = Some(index);
        self.dirty = true;
        Ok(media_url)
    }

    pub fn remove_image(&mut self, index: Option<usize>) -> Result<()> {
        let index = self.target(index)?;
        let question = self.document.question_mut(index)?;
        if let Some(url) = question.media_url.take() {
            self.pending_images.remove(&url);
            self.dirty = true;
        }
        Ok(())
    }

    pub fn image_status(&self, index: usize, media_dir: &Path) -> Result<ImageStatus> {
        let question = self.document.question(index)?;
        let url = question.media_url.as_deref();
        Ok(media::image_status(
            url,
            url.and_then(|u| self.pending_images.get(u)),
            media_dir,
        ))
    }
}

/// Brings correct answers back in line with the options and the question type.
fn reconcile_answers(question: &mut Question) {
    let count = question.options.len();
    let mut kept: Vec<usize> = Vec::new();
    for &index in &question.correct_answer {
        if index < count && !kept.contains(&index) {
            kept.push(index);
        }
    }

    question.correct_answer = match question.question_type {
        QuestionType::Single => kept.into_iter().take(1).collect(),
        QuestionType::Multiple => kept,
        QuestionType::Sequence => {
            for missing in 0..count {
                if !kept.contains(&missing) {
                    kept.push(missing);
                }
            }
            kept
        }
    };
    if question.correct_answer.is_empty() {
        question.correct_answer = question.question_type.default_answer(count);
    }
}
