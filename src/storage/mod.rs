pub mod db;
mod gate;
pub mod models;
mod notes;
pub mod query;
mod tables;
mod users;

pub use db::{Database, DatabaseError};
pub use gate::{CommitGate, WriteError};
pub use query::{NoteQuery, SortMode};
pub use tables::*;
