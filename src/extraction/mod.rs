// Result extraction: solver values back to assignment tables

pub mod extractor;

pub use extractor::{ExtractError, ResultExtractor, Schedule};
