/// Recoverable errors: malformed input text, unsupported module content and
/// target/convention lookups. Precondition violations inside the assigner
/// are not errors; they abort.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[cfg(feature = "wasmparser")]
    #[error("WASM parsing error: {0}")]
    WasmParse(#[from] wasmparser::BinaryReaderError),

    #[error("Unknown value kind `{0}`")]
    UnknownValueKind(String),

    #[error("Invalid signature `{input}`: {reason}")]
    InvalidSignature { input: String, reason: String },

    #[error("Unknown target `{0}`")]
    UnknownTarget(String),

    #[error("Unknown calling convention `{0}`")]
    UnknownConvention(String),

    #[error("The {convention} calling convention is not available on {target}")]
    ConventionUnavailable {
        convention: &'static str,
        target: &'static str,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
