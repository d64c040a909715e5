use thiserror::Error;

/// Errors produced while parsing, validating or post-processing a tree.
///
/// Every public entry point returns this type; a failed parse never hands
/// back a partial tree.
#[derive(Debug, Error)]
pub enum Error {
    /// The grammar met a token it cannot place at this point
    #[error("unexpected token {got} at position {position}: expected {expected} near \"{context}\"")]
    UnexpectedToken {
        got: String,
        expected: String,
        position: usize,
        context: String,
    },

    /// Lexical failure reported by the token source
    #[error("lex error at position {position}: {message}")]
    Lex { message: String, position: usize },

    /// The input produced more tokens than the configured cap
    #[error("input exceeds the limit of {limit} tokens")]
    TokenLimitExceeded { limit: usize },

    /// Groups, prefix operators, calls or sub-selects nested past the
    /// configured depth
    #[error("nesting deeper than {limit} levels at position {position}")]
    NestingTooDeep { limit: usize, position: usize },

    /// A numeric literal that fits neither an i64 nor a decimal
    #[error("invalid number literal '{0}'")]
    InvalidNumber(String),

    /// A function was called with the wrong number of arguments
    #[error("function {func_name}() expects {want} arguments, got {got}")]
    ArityMismatch {
        func_name: String,
        want: String,
        got: usize,
    },

    /// Strict mode only: the function name is not registered
    #[error("unknown function {name}()")]
    UnknownFunction { name: String },

    #[error("BETWEEN near \"{context}\" must have the form x BETWEEN a AND b")]
    MalformedBetween { context: String },

    #[error("IN near \"{context}\" needs a parenthesized list or an identity")]
    MalformedIn { context: String },

    /// INSERT row width differs from the field list
    #[error("INSERT row has {got} values but {want} fields were named")]
    ValueCountMismatch { want: usize, got: usize },

    #[error("include found but no includer was provided")]
    NoIncluder,

    #[error("include '{name}' could not be resolved")]
    IncludeNotFound { name: String },

    #[error("includes nested deeper than {depth} levels")]
    MaxIncludeDepthExceeded { depth: usize },

    #[error("include resolution was cancelled")]
    Cancelled,

    #[error("function registry is frozen; cannot register {name}()")]
    RegistryFrozen { name: String },

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
