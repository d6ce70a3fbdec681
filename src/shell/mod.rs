pub mod executor;
pub mod interpreter;

pub use executor::{ExecutionResult, ExecutionStatus, ShellError, ShellExecutor};
pub use interpreter::Interpreter;
