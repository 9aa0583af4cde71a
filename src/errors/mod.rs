use crate::host::HostError;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Argument,
    Conversion,
    Eval,
    Encoding,
    Initialization,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Argument => "ArgumentError",
            Self::Conversion => "ConversionError",
            Self::Eval => "EvalError",
            Self::Encoding => "EncodingError",
            Self::Initialization => "InitializationError",
            Self::Internal => "InternalError",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// Wrong arity or type at the host boundary, detected before the
    /// interpreter is touched
    Argument {
        function: String,
        position: usize,
        message: String,
    },
    /// Host value with no interpreter representation, or a cyclic table
    Conversion(String),
    /// Script or command failed; carries the interpreter's result verbatim
    Eval(String),
    Encoding(String),
    Initialization(String),
    Internal(String),
}

impl BridgeError {
    pub fn argument(function: &str, position: usize, message: impl Into<String>) -> Self {
        Self::Argument {
            function: function.to_string(),
            position,
            message: message.into(),
        }
    }

    pub fn conversion(message: impl Into<String>) -> Self {
        Self::Conversion(message.into())
    }

    pub fn eval(message: impl Into<String>) -> Self {
        Self::Eval(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Argument { .. } => ErrorKind::Argument,
            Self::Conversion(_) => ErrorKind::Conversion,
            Self::Eval(_) => ErrorKind::Eval,
            Self::Encoding(_) => ErrorKind::Encoding,
            Self::Initialization(_) => ErrorKind::Initialization,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Argument {
                function,
                position,
                message,
            } => {
                write!(f, "bad argument #{} to '{}' ({})", position, function, message)
            }
            Self::Conversion(message) => f.write_str(message),
            Self::Eval(message) | Self::Encoding(message) => f.write_str(message),
            Self::Initialization(message) => {
                write!(f, "interpreter initialization failed: {}", message)
            }
            Self::Internal(message) => write!(f, "internal error: {}", message),
        }
    }
}

impl std::error::Error for BridgeError {}

impl From<BridgeError> for HostError {
    fn from(error: BridgeError) -> Self {
        HostError::new(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
