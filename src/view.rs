use std::fmt::Write;

use crate::{
    database::{DatabaseStats, ImportReport},
    editor::SaveReport,
    media::ImageStatus,
    quiz::{Question, QuizDocument, Topic},
};

pub fn topic_header(topic: &Topic) -> String {
    format!("Name: {}\nDescription: {}", topic.name, topic.description)
}

/// The question list, one row per question; the selected one is marked.
pub fn question_list(document: &QuizDocument, selected: Option<usize>) -> String {
    let mut out = topic_header(&document.topic);
    out.push_str("\n\n");
    if document.questions.is_empty() {
        out.push_str("No questions yet. Use 'add' to create one.");
        return out;
    }

    let _ = writeln!(out, "   {:>3}  {:<9} {:<10} Text", "No", "Type", "Difficulty");
    for (i, question) in document.questions.iter().enumerate() {
        let marker = if selected == Some(i) { '>' } else { ' ' };
        let _ = writeln!(
            out,
            " {} {:>3}  {:<9} {:<10} {}",
            marker,
            i + 1,
            question.question_type,
            question.difficulty,
            question.short_text()
        );
    }
    out.truncate(out.trim_end().len());
    out
}

pub fn question_details(index: usize, question: &Question, image: &ImageStatus) -> String {
    let mut out = format!("Question {}", index + 1);
    if let Some(id) = question.id {
        let _ = write!(out, " (id {id})");
    }
    let _ = write!(out, "\n{question}");
    let image = match image {
        ImageStatus::None => "no image".to_owned(),
        ImageStatus::Pending(source) => format!("{} (copied on save)", source.display()),
        ImageStatus::Stored(path) => path.display().to_string(),
        ImageStatus::Missing(url) => format!("image not found: {url}"),
    };
    let _ = write!(out, "Image: {image}");
    out
}

pub fn topics_list(topics: &[Topic]) -> String {
    if topics.is_empty() {
        return "No topics in the database.".to_owned();
    }
    topics
        .iter()
        .map(|topic| format!("{}: {}", topic.id, topic.name))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn stats(stats: &DatabaseStats) -> String {
    let mut out = format!(
        "Topics: {}, Questions: {}",
        stats.topics_count, stats.questions_count
    );
    for (kind, count) in &stats.question_types {
        let _ = write!(out, "\n  {kind}: {count}");
    }
    for (difficulty, count) in &stats.difficulties {
        let _ = write!(out, "\n  difficulty {difficulty}: {count}");
    }
    out
}

pub fn save_report(report: &SaveReport) -> String {
    let mut out = format!("Saved '{}'", report.path.display());
    if !report.copied_images.is_empty() {
        let _ = write!(out, ", copied {} image(s)", report.copied_images.len());
    }
    for (url, error) in &report.failed_images {
        let _ = write!(out, "\nCould not copy image {url}: {error}");
    }
    out
}

pub fn import_report(report: &ImportReport) -> String {
    let mut out = format!(
        "Imported topic '{}' (id {}), questions: {}",
        report.topic_name, report.topic_id, report.imported
    );
    if report.skipped > 0 {
        let _ = write!(out, ", skipped existing: {}", report.skipped);
    }
    if report.failed > 0 {
        let _ = write!(out, ", failed: {}", report.failed);
    }
    out
}

pub fn validation_errors(errors: &[String]) -> String {
    if errors.is_empty() {
        return "Data passed validation.".to_owned();
    }
    let mut out = String::from("Problems found:");
    for error in errors {
        let _ = write!(out, "\n  - {error}");
    }
    out
}
