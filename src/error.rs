// Copyright 2020 Xavier Gillard
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of
// this software and associated documentation files (the "Software"), to deal in
// the Software without restriction, including without limitation the rights to
// use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS
// FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER
// IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! Fatal error type. Only conditions that must abort the driver flow through
//! here; recoverable black-box failures live on the Cache entry as an
//! `EvalStatus`, never as a `MadsError`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MadsError {
    /// Invalid dimension, inconsistent bounds, unknown option: fatal at
    /// Initialization / `ParametersBuilder::build`.
    #[error("parameter error: {0}")]
    Parameter(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("(de)serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// An invariant the engine relies on was violated (e.g. a trial point
    /// not on the mesh after projection). Always a bug, never user error.
    #[error("internal consistency violation at {file}:{line}: {message}")]
    Internal {
        message: String,
        file: &'static str,
        line: u32,
    },
}

/// Construct an `Internal` error tagged with the call site, mirroring the
/// file+line context the spec requires for consistency violations.
#[macro_export]
macro_rules! internal_error {
    ($($arg:tt)*) => {
        $crate::MadsError::Internal {
            message: format!($($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

pub type MadsResult<T> = Result<T, MadsError>;
