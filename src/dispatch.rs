use std::path::{Path, PathBuf};

use tracing::instrument;

use crate::{
    commands::{question_index, Command},
    config::Config,
    database::{CheckConnection, Connection, ImportTopic, RetrieveTopic},
    error::{Error, Result},
    quiz,
    state::Session,
    validation::validate_for_import,
    view,
};

/// What a command produced for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub message: String,
    pub quit: bool,
}

impl Outcome {
    fn show(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            quit: false,
        }
    }
}

pub struct App {
    pub session: Session,
    pub config: Config,
    database_url: String,
    connection: Option<Connection>,
}

impl App {
    pub fn new(config: Config, database_url: Option<String>) -> Self {
        let database_url = database_url.unwrap_or_else(|| config.db_engine.clone());
        Self {
            session: Session::default(),
            config,
            database_url,
            connection: None,
        }
    }

    /// Connects on first use and hands out the pieces database commands need.
    async fn database(&mut self) -> Result<(&mut Session, &Config, &Connection)> {
        let connection = match self.connection.take() {
            Some(connection) => connection,
            None => {
                let connection = Connection::connect(&self.database_url).await?;
                connection.ensure_schema().await?;
                connection
            }
        };
        let connection = self.connection.insert(connection);
        Ok((&mut self.session, &self.config, &*connection))
    }

    pub async fn close(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.close().await;
        }
    }
}

#[instrument(level = "debug", skip(app))]
pub async fn dispatch(app: &mut App, command: Command) -> Result<Outcome> {
    let media_dir = app.config.media_dir.clone();
    let session = &mut app.session;

    let message = match command {
        Command::New(topic) => {
            session.new_file(topic.into());
            format!("New document started.\n{}", view::topic_header(&session.document().topic))
        }
        Command::Open { path } => {
            session.open(&path)?;
            format!(
                "Opened '{}'.\n{}",
                path.display(),
                view::question_list(session.document(), None)
            )
        }
        Command::Save => view::save_report(&session.save(&media_dir)?),
        Command::SaveAs { path } => view::save_report(&session.save_as(path, &media_dir)?),
        Command::Show => view::question_list(session.document(), session.selected()),
        Command::Topic(topic) => {
            session.edit_topic(topic.into());
            view::topic_header(&session.document().topic)
        }
        Command::Add => {
            let index = session.add_question();
            question_view(session, index, &media_dir)?
        }
        Command::Delete { question } => {
            let removed = session.delete_question(question_index(question)?)?;
            format!("Deleted question: {}", removed.short_text())
        }
        Command::Duplicate { question } => {
            let index = session.duplicate_question(question_index(question)?)?;
            format!("Duplicated as question {}.", index + 1)
        }
        Command::Select { question } => {
            let index = question_index(Some(question))?.unwrap_or_default();
            session.select(index)?;
            question_view(session, index, &media_dir)?
        }
        Command::View { question } => {
            let index = session.target(question_index(question)?)?;
            question_view(session, index, &media_dir)?
        }
        Command::Edit(args) => {
            let index = question_index(args.question)?;
            let edit = args.into_edit()?;
            session.apply_changes(index, edit)?;
            let index = session.target(index)?;
            format!("Changes saved.\n{}", question_view(session, index, &media_dir)?)
        }
        Command::OptionAdd { question, text } => {
            let index = question_index(question)?;
            let position = session.add_option(index, text)?;
            let question = session.document().question(session.target(index)?)?;
            format!("Added option {}: {}", position + 1, question.options[position])
        }
        Command::OptionRemove { question } => {
            let removed = session.remove_option(question_index(question)?)?;
            format!("Removed option: {removed}")
        }
        Command::Sequence {
            position,
            direction,
            question,
        } => {
            let index = session.target(question_index(question)?)?;
            let position = position
                .checked_sub(1)
                .ok_or(Error::NoSuchSequenceEntry(index + 1, 0))?;
            let order = session.move_sequence(Some(index), position, direction.into())?;
            let order: Vec<String> = order.iter().map(|i| (i + 1).to_string()).collect();
            format!("Order: {}", order.join(" -> "))
        }
        Command::Image { path, question } => {
            let url = session.select_image(question_index(question)?, path)?;
            format!("Image set to {url}, it is copied into the media folder on save.")
        }
        Command::ImageRemove { question } => {
            session.remove_image(question_index(question)?)?;
            "Image removed.".to_owned()
        }
        Command::Validate { path } => {
            let data = match path {
                Some(path) => quiz::parse_json(&quiz::read_json_file(&path)?)?,
                None => serde_json::to_value(session.document())?,
            };
            view::validation_errors(&validate_for_import(&data))
        }
        Command::DbCheck => {
            let (_, _, connection) = app.database().await?;
            db_check(connection).await?
        }
        Command::DbTopics => {
            let (_, _, connection) = app.database().await?;
            view::topics_list(&connection.existing_topics().await?)
        }
        Command::DbExport { topic_id, output } => {
            let (session, config, connection) = app.database().await?;
            db_export(session, config, connection, topic_id, output).await?
        }
        Command::DbImport { update } => {
            let (session, _, connection) = app.database().await?;
            db_import(session, connection, update).await?
        }
        Command::Shell => "Already in the shell.".to_owned(),
        Command::Quit { force } => {
            if session.is_dirty() && !force {
                "There are unsaved changes. Save them or use 'quit --force'.".to_owned()
            } else {
                return Ok(Outcome {
                    message: "Bye.".to_owned(),
                    quit: true,
                });
            }
        }
    };

    Ok(Outcome::show(message))
}

fn question_view(session: &Session, index: usize, media_dir: &Path) -> Result<String> {
    let question = session.document().question(index)?;
    let image = session.image_status(index, media_dir)?;
    Ok(view::question_details(index, question, &image))
}

async fn db_check<Connect: CheckConnection>(connection: &Connect) -> Result<String> {
    connection.test_connection().await?;
    let stats = connection.stats().await?;
    Ok(format!("Connection OK.\n{}", view::stats(&stats)))
}

#[instrument(level = "info", skip(session, config, connection))]
async fn db_export<Connect: RetrieveTopic>(
    session: &mut Session,
    config: &Config,
    connection: &Connect,
    topic_id: i64,
    output: Option<PathBuf>,
) -> Result<String> {
    let document = connection
        .export_topic(topic_id)
        .await?
        .ok_or(Error::TopicNotFound(topic_id))?;
    let count = document.questions.len();
    session.replace_document(document);

    let mut message = format!("Loaded topic {topic_id} with {count} questions.");
    if let Some(output) = output {
        let report = session.save_as(output, &config.media_dir)?;
        message = format!("{message}\n{}", view::save_report(&report));
    }
    Ok(message)
}

#[instrument(level = "info", skip(session, connection))]
async fn db_import<Connect: ImportTopic>(
    session: &Session,
    connection: &Connect,
    update: bool,
) -> Result<String> {
    let data = serde_json::to_value(session.document())?;
    let errors = validate_for_import(&data);
    if !errors.is_empty() {
        return Err(Error::ImportRejected(errors));
    }
    let report = connection.import_document(session.document(), update).await?;
    Ok(view::import_report(&report))
}
