use crate::quiz::{Question, QuestionType, QuizDocument, Topic};

pub fn new_document() -> QuizDocument {
    QuizDocument {
        topic: Topic::default(),
        questions: Vec::new(),
    }
}

pub fn default_option(number: usize) -> String {
    format!("Option {number}")
}

pub fn default_question(id: i64) -> Question {
    Question {
        id: Some(id),
        text: "New question".to_owned(),
        options: (1..=4).map(default_option).collect(),
        correct_answer: vec![0],
        question_type: QuestionType::Single,
        difficulty: 1,
        explanation: String::new(),
        media_url: None,
    }
}

/// Appends a fresh question and returns its index.
pub fn add_question(document: &mut QuizDocument) -> usize {
    let id = document.next_question_id();
    log::info!("Adding question {} to topic '{}'", id, document.topic.name);
    document.questions.push(default_question(id));
    document.questions.len() - 1
}

/// Copies the question at `index` right after itself and returns the copy's index.
pub fn duplicate_question(document: &mut QuizDocument, index: usize) -> Option<usize> {
    let mut copy = document.questions.get(index)?.clone();
    copy.id = Some(document.next_question_id());
    log::info!("Duplicating question {} as {:?}", index + 1, copy.id);
    document.questions.insert(index + 1, copy);
    Some(index + 1)
}
