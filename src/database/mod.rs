pub mod connection;
pub mod quiz;

pub use connection::{
    CheckConnection, Connection, DatabaseStats, ImportReport, ImportTopic, RetrieveTopic,
};
