pub mod error;
pub mod files;
pub mod mask;
pub mod processor;
pub mod source;
pub mod tabular;
pub mod tensor;
