// Data model: parameter tensors and the sources that produce them

pub mod dataset;
pub mod error;
pub mod generator;
pub mod source;

pub use dataset::{Dataset, Dimensions};
pub use error::DataError;
pub use generator::InstanceGenerator;
pub use source::{DataSource, JsonFileSource};
