//! Crate-wide error type.
//!
//! Transport failures, validation failures, and malformed replies all land
//! here; a failed trigger-write post-condition does not: that is an
//! expected outcome and is reported as `Ok(false)` by the transaction.

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("reply is not valid text: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// A value outside its enumerated set, rejected before anything is
    /// written to the instrument.
    #[error("{value:?} is not a valid {name}")]
    Validation { name: &'static str, value: String },

    #[error("reply {reply:?} is missing its payload delimiter")]
    MissingDelimiter { reply: String },

    #[error("could not parse {text:?} as a number")]
    BadNumber { text: String },

    #[error("unrecognized {name} token {token:?}")]
    UnknownToken { name: &'static str, token: String },

    /// The waveform buffer ends before the fixed descriptor layout does.
    #[error("buffer too short: need {needed} bytes, got {got}")]
    BufferTooShort { needed: usize, got: usize },

    /// Descriptor fields that unpack fine but cannot describe a capture.
    #[error("descriptor reports invalid sample count {count}")]
    BadSampleCount { count: i32 },
}
