pub mod auth;
pub mod exams;
pub mod logs;
pub mod notes;
pub mod scores;
pub mod study;
pub mod users;
pub mod vocab;
