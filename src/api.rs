//! Result extraction from upload responses.
//!
//! Upload endpoints all answer with some JSON object, but each one puts the
//! resulting URL somewhere different. A target's `ResultGetter` is a dotted
//! path (e.g. `data.url`) naming the keys to walk to reach it.

use serde_json::{Map, Value};
use std::error::Error;
use std::fmt;


/// A parsed upload response. Only JSON objects are accepted at the top level.
pub type Response = Map<String, Value>;

/// Why a dotted path could not be resolved.
#[derive(Debug, PartialEq, Eq)]
pub enum ExtractError {
    /// The key is not present in the enclosing object
    Missing(String),
    /// An intermediate key holds something other than an object
    NotAnObject(String),
    /// The final key holds something other than a string
    NotAString(String),
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractError::Missing(key) => write!(f, "missing field `{key}`"),
            ExtractError::NotAnObject(key) => {
                write!(f, "field `{key}` is not an object")
            }
            ExtractError::NotAString(key) => {
                write!(f, "field `{key}` is not a string")
            }
        }
    }
}

impl Error for ExtractError {}

/// Walks `path` (split on `.`) through `response` and returns the string at
/// the end of it.
pub fn extract<'a>(
    response: &'a Response,
    path: &str,
) -> Result<&'a str, ExtractError> {
    let (parents, leaf) = match path.rsplit_once('.') {
        Some((parents, leaf)) => (Some(parents), leaf),
        None => (None, path),
    };

    let mut object = response;
    for key in parents.into_iter().flat_map(|p| p.split('.')) {
        object = lookup(object, key)?
            .as_object()
            .ok_or_else(|| ExtractError::NotAnObject(key.to_string()))?;
    }

    lookup(object, leaf)?
        .as_str()
        .ok_or_else(|| ExtractError::NotAString(leaf.to_string()))
}

fn lookup<'a>(object: &'a Response, key: &str) -> Result<&'a Value, ExtractError> {
    object
        .get(key)
        .ok_or_else(|| ExtractError::Missing(key.to_string()))
}
