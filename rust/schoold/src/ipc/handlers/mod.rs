pub mod attendance;
pub mod circulars;
pub mod core;
pub mod homework;
pub mod imports;
pub mod reports;
pub mod setup;
pub mod students;
pub mod teachers;
