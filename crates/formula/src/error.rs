use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormulaError {
    #[error("Formula parse error in '{0}': {1}")]
    Parse(String, String),

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Function '{function}' error: {message}")]
    FunctionError { function: String, message: String },

    #[error("Type error: {0}")]
    TypeError(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Expression nested too deeply (limit {0})")]
    TooDeep(usize),
}

impl FormulaError {
    pub(crate) fn function(function: &str, message: impl Into<String>) -> Self {
        FormulaError::FunctionError {
            function: function.to_string(),
            message: message.into(),
        }
    }
}
