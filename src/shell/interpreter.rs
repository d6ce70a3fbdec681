use crate::shell::executor::ShellError;
use std::path::PathBuf;

/// PowerShell arguments placed before the command text
const POWERSHELL_ARGS: &[&str] = &["-NoProfile", "-NonInteractive", "-Command"];

/// Shell interpreter used to run proposed commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpreter {
    program: String,
    args: Vec<String>,
}

impl Interpreter {
    /// Create an interpreter from a program name (or path) and the arguments
    /// that precede the command text
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Windows PowerShell on Windows, PowerShell Core (`pwsh`) everywhere else
    pub fn platform_default() -> Self {
        let program = if cfg!(windows) { "powershell.exe" } else { "pwsh" };
        Self::new(program, POWERSHELL_ARGS.iter().copied())
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Locate the interpreter binary on PATH (or check an explicit path)
    pub fn resolve(&self) -> Result<PathBuf, ShellError> {
        which::which(&self.program)
            .map_err(|_| ShellError::InterpreterNotFound(self.program.clone()))
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::platform_default()
    }
}
