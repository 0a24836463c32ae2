pub mod runner;
pub mod table;
pub mod types;
