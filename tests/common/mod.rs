#![allow(dead_code)]

use std::path::{Path, PathBuf};

use quizmaker::{config::Config, database::Connection, dispatch::App};

/// A fresh directory under the system temp dir, unique per test.
pub fn temp_dir(name: &str) -> PathBuf {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    let id = COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!(
        "quizmaker_{}_{}_{}",
        name,
        std::process::id(),
        id
    ));
    // Clean up leftovers from previous runs
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("failed to create test directory");
    dir
}

pub fn database_url(dir: &Path) -> String {
    format!("sqlite:{}", dir.join("quiz.db").display())
}

pub fn create_test_app(name: &str) -> App {
    let dir = temp_dir(name);
    let config = Config::with_data_dir(&dir);
    config.ensure_dirs().expect("failed to create data directories");
    App::new(config, Some(database_url(&dir)))
}

pub async fn create_test_db(name: &str) -> Connection {
    let dir = temp_dir(name);
    let connection = Connection::connect(&database_url(&dir))
        .await
        .expect("failed to open test database");
    connection
        .ensure_schema()
        .await
        .expect("failed to run migrations");
    connection
}
