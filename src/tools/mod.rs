//! Operation declarations for function calling, and argument validation.

pub mod types;
pub mod validation;
pub mod vocabulary;

pub use types::{OperationParameters, ParameterBuilder, ToolDefinition};
pub use validation::validate_arguments;
pub use vocabulary::{Binding, Declaration, Vocabulary};
