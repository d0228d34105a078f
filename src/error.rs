// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `error` module defines the crate-wide error and result types.

use std::fmt;

/// `Error` enumerates all the ways a [`crate::get`] call can fail.
#[derive(Debug)]
pub enum Error {
    /// No parser claims the file: the extension is unknown and the magic bytes do not match
    /// any of the eight supported container families.
    Unsupported(&'static str),
    /// The container was recognized but its bytes are structurally invalid: a bad magic value,
    /// a truncated required block, or a declared size that exceeds the file.
    Parse(String),
    /// An I/O error occurred while reading, seeking, or querying the byte source.
    Io(std::io::Error),
    /// The caller supplied an invalid combination of arguments (e.g. neither a path nor a
    /// source, or both).
    Argument(&'static str),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Unsupported(what) => write!(f, "unsupported format: {what}"),
            Error::Parse(msg) => write!(f, "malformed container: {msg}"),
            Error::Io(err) => write!(f, "io error: {err}"),
            Error::Argument(msg) => write!(f, "invalid argument: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

/// Shorthand for constructing a [`Error::Parse`] and returning it from the current function.
pub(crate) fn parse_error<T>(msg: impl Into<String>) -> Result<T> {
    Err(Error::Parse(msg.into()))
}

/// Shorthand for constructing a [`Error::Unsupported`] and returning it from the current
/// function.
pub(crate) fn unsupported_error<T>(what: &'static str) -> Result<T> {
    Err(Error::Unsupported(what))
}
