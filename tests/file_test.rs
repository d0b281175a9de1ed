mod common;

use common::{create_test_app, temp_dir};
use quizmaker::{
    commands::{Command, EditArgs, TopicArgs},
    dispatch::dispatch,
    quiz::{QuestionType, QuizDocument},
    runner::run_once,
    Error,
};

#[tokio::test]
async fn saved_file_reopens_with_same_content() {
    let mut app = create_test_app("roundtrip");
    let path = app.config.questions_dir.join("history.json");

    dispatch(
        &mut app,
        Command::New(TopicArgs {
            id: Some(7),
            name: Some("  Ukrainian history ".into()),
            description: Some("Kyivan Rus".into()),
        }),
    )
    .await
    .unwrap();
    dispatch(&mut app, Command::Add).await.unwrap();
    let edit = EditArgs {
        text: Some("Which cities were capitals?".into()),
        question_type: Some(QuestionType::Multiple),
        difficulty: Some(3),
        options: vec!["Kyiv".into(), "Lviv".into(), "Kharkiv".into()],
        correct: vec![1, 3],
        ..EditArgs::default()
    };
    dispatch(&mut app, Command::Edit(edit)).await.unwrap();
    dispatch(&mut app, Command::SaveAs { path: path.clone() })
        .await
        .unwrap();
    assert!(!app.session.is_dirty());

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["topic"]["name"], "Ukrainian history");
    assert_eq!(raw["questions"][0]["correct_answer"], serde_json::json!([0, 2]));
    assert_eq!(raw["questions"][0]["question_type"], "multiple");

    let document = QuizDocument::load(&path).unwrap();
    assert_eq!(&document, app.session.document());
}

#[tokio::test]
async fn string_answers_are_accepted_on_open() {
    let dir = temp_dir("legacy");
    let path = dir.join("legacy.json");
    std::fs::write(
        &path,
        r#"{
            "topic": {"id": 2, "name": "Cossacks"},
            "questions": [{
                "id": 1,
                "text": "Order the hetmans",
                "options": ["Khmelnytsky", "Vyhovsky", "Mazepa"],
                "correct_answer": ["0", "1", "2"],
                "question_type": "sequence"
            }]
        }"#,
    )
    .unwrap();

    let mut app = create_test_app("legacy_app");
    dispatch(&mut app, Command::Open { path }).await.unwrap();
    let question = &app.session.document().questions[0];
    assert_eq!(question.correct_answer, vec![0, 1, 2]);
    assert_eq!(question.difficulty, 1);
    assert_eq!(app.session.document().topic.description, "");
}

#[tokio::test]
async fn file_without_sections_is_refused() {
    let dir = temp_dir("broken");
    let path = dir.join("broken.json");
    std::fs::write(&path, r#"{"questions": []}"#).unwrap();

    let mut app = create_test_app("broken_app");
    let result = dispatch(&mut app, Command::Open { path }).await;
    assert!(matches!(result, Err(Error::MissingSections)));
    assert!(app.session.file_path().is_none());
}

const ESSAY_FILE: &str = r#"{
    "topic": {"id": 3, "name": "Hetmanate"},
    "questions": [
        {"text": "Describe the Pereiaslav council", "options": ["a", "b"],
         "correct_answer": [0], "question_type": "essay"},
        {"text": "Who led the uprising of 1648?", "options": ["Khmelnytsky", "Doroshenko"],
         "question_type": "single"}
    ]
}"#;

#[tokio::test]
async fn schema_problems_are_listed_on_open_and_validate() {
    let dir = temp_dir("essay");
    let path = dir.join("essay.json");
    std::fs::write(&path, ESSAY_FILE).unwrap();
    let expected = [
        "Question 1: invalid question type".to_owned(),
        "Question 2: missing correct answer".to_owned(),
    ];

    let mut app = create_test_app("essay_app");
    let result = dispatch(&mut app, Command::Open { path: path.clone() }).await;
    let Err(Error::InvalidDocument(problems)) = result else {
        panic!("open should list the schema problems");
    };
    assert_eq!(problems, expected);

    let message = dispatch(&mut app, Command::Validate { path: Some(path) })
        .await
        .unwrap()
        .message;
    assert_eq!(
        message,
        format!("Problems found:\n  - {}\n  - {}", expected[0], expected[1])
    );

    let broken = dir.join("broken.json");
    std::fs::write(&broken, "{\"topic\": ").unwrap();
    assert!(matches!(
        dispatch(&mut app, Command::Validate { path: Some(broken) }).await,
        Err(Error::InvalidJson(_))
    ));
}

#[tokio::test]
async fn failed_image_copy_still_writes_the_file() {
    let mut app = create_test_app("failed_copy");
    let source = temp_dir("vanishing").join("portrait.jpg");
    std::fs::write(&source, b"jpeg").unwrap();
    let path = app.config.questions_dir.join("portraits.json");

    dispatch(&mut app, Command::Add).await.unwrap();
    dispatch(
        &mut app,
        Command::Image {
            path: source.clone(),
            question: None,
        },
    )
    .await
    .unwrap();
    std::fs::remove_file(&source).unwrap();

    let message = dispatch(&mut app, Command::SaveAs { path: path.clone() })
        .await
        .unwrap()
        .message;
    assert!(message.contains("Could not copy image"));
    assert!(path.exists());
    assert_eq!(app.session.pending_count(), 1);

    let report = app.session.save(&app.config.media_dir).unwrap();
    assert_eq!(report.failed_images.len(), 1);
    assert!(report.copied_images.is_empty());
}

#[tokio::test]
async fn blank_new_document_can_be_left_and_still_written() {
    let mut app = create_test_app("blank_new");
    dispatch(&mut app, Command::New(TopicArgs::default()))
        .await
        .unwrap();
    assert!(dispatch(&mut app, Command::Quit { force: false }).await.unwrap().quit);

    let file = app.config.questions_dir.join("blank.json");
    run_once(&mut app, Some(file.clone()), Command::New(TopicArgs::default()))
        .await
        .unwrap();
    assert!(QuizDocument::load(&file).unwrap().questions.is_empty());
}

#[tokio::test]
async fn images_are_copied_on_save() {
    let mut app = create_test_app("images");
    let source = temp_dir("image_source").join("map.png");
    std::fs::write(&source, b"not really a png").unwrap();
    let path = app.config.questions_dir.join("maps.json");

    dispatch(&mut app, Command::Add).await.unwrap();
    dispatch(
        &mut app,
        Command::Image {
            path: source,
            question: Some(1),
        },
    )
    .await
    .unwrap();
    let url = app.session.document().questions[0]
        .media_url
        .clone()
        .unwrap();
    assert!(url.starts_with("images/question_"));
    assert!(url.ends_with(".png"));
    assert!(!app.config.media_dir.join(&url).exists());

    let message = dispatch(&mut app, Command::SaveAs { path })
        .await
        .unwrap()
        .message;
    assert!(message.contains("copied 1 image(s)"));
    assert!(app.config.media_dir.join(&url).exists());
    assert_eq!(app.session.pending_count(), 0);
}

#[tokio::test]
async fn one_shot_commands_save_to_the_file() {
    let mut app = create_test_app("one_shot");
    let file = app.config.questions_dir.join("quick.json");

    run_once(
        &mut app,
        Some(file.clone()),
        Command::New(TopicArgs {
            name: Some("Quick".into()),
            ..TopicArgs::default()
        }),
    )
    .await
    .unwrap();
    assert!(file.exists());

    run_once(&mut app, Some(file.clone()), Command::Add).await.unwrap();
    run_once(&mut app, Some(file.clone()), Command::Add).await.unwrap();
    run_once(
        &mut app,
        Some(file.clone()),
        Command::Duplicate { question: Some(1) },
    )
    .await
    .unwrap();

    let document = QuizDocument::load(&file).unwrap();
    assert_eq!(document.topic.name, "Quick");
    let ids: Vec<Option<i64>> = document.questions.iter().map(|q| q.id).collect();
    assert_eq!(ids, vec![Some(1), Some(3), Some(2)]);

    assert!(matches!(
        run_once(&mut app, Some(file), Command::Quit { force: false }).await,
        Err(Error::ShellOnly("quit"))
    ));
}
