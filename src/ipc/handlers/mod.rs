pub mod backup;
pub mod classes;
pub mod core;
pub mod import;
pub mod photos;
pub mod students;
