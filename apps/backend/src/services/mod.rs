pub mod auth;
pub mod exams;
pub mod records;
pub mod storage;
pub mod study;
