pub mod parser;
pub mod sizing;
