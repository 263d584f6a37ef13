//! Bridge response envelopes.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::Error;

type Result<T> = std::result::Result<T, Error>;

/// An error element reported by the bridge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiError {
    #[serde(rename = "type")]
    pub kind: u16,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub description: String,
}

impl ApiError {
    pub const UNAUTHORIZED_USER: u16 = 1;
    pub const RESOURCE_NOT_AVAILABLE: u16 = 3;
    pub const LINK_BUTTON_NOT_PRESSED: u16 = 101;

    pub fn new(kind: u16, address: &str, description: &str) -> Self {
        ApiError {
            kind,
            address: address.to_string(),
            description: description.to_string(),
        }
    }

    pub fn is_link_button_not_pressed(&self) -> bool {
        self.kind == Self::LINK_BUTTON_NOT_PRESSED
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (type {}, address {:?})",
            self.description, self.kind, self.address
        )
    }
}

/// One element of a bridge envelope.
///
/// Mutating calls answer with `[{"success": {...}}, {"error": {...}}, ...]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ApiResponse {
    Success(Value),
    Error(ApiError),
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, ApiResponse::Success(_))
    }

    /// The changed-path to value mapping of a success element.
    ///
    /// Some calls (e.g. deletes) report success as a plain string, which yields `None`.
    pub fn success(&self) -> Option<&Map<String, Value>> {
        match self {
            ApiResponse::Success(Value::Object(map)) => Some(map),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            ApiResponse::Error(err) => Some(err),
            ApiResponse::Success(_) => None,
        }
    }
}

/// The ordered list of results returned by a mutating bridge call.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Envelope(pub Vec<ApiResponse>);

impl Envelope {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ApiResponse> {
        self.0.iter()
    }

    /// The success mapping of the first element, or the error it carries.
    pub fn first_success(&self) -> Result<&Map<String, Value>> {
        match self.0.first() {
            None => Err(Error::InvalidResponse(
                "the bridge didn't return a valid response".into(),
            )),
            Some(ApiResponse::Error(err)) => Err(Error::from_bridge(err.clone())),
            Some(ApiResponse::Success(Value::Object(map))) => Ok(map),
            Some(ApiResponse::Success(other)) => Err(Error::InvalidResponse(format!(
                "expected success object, got {other}"
            ))),
        }
    }

    /// Fails on the first error element anywhere in the envelope.
    pub fn check_all(&self) -> Result<()> {
        if self.0.is_empty() {
            return Err(Error::InvalidResponse(
                "the bridge didn't return a valid response".into(),
            ));
        }
        match self.0.iter().find_map(ApiResponse::error) {
            Some(err) => Err(Error::from_bridge(err.clone())),
            None => Ok(()),
        }
    }

    pub fn errors(&self) -> impl Iterator<Item = &ApiError> {
        self.0.iter().filter_map(ApiResponse::error)
    }

    /// Look up a string value in the first success element.
    pub(crate) fn first_string(&self, key: &str) -> Result<String> {
        self.first_success()?
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .ok_or_else(|| Error::InvalidResponse(format!("success element has no {key:?}")))
    }
}

impl<'a> IntoIterator for &'a Envelope {
    type Item = &'a ApiResponse;
    type IntoIter = std::slice::Iter<'a, ApiResponse>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Detect a bridge rejection in any decoded body.
///
/// The bridge reports failures on every endpoint, reads included, as an array
/// whose first element is an `error` object.
pub(crate) fn check_rejection(value: &Value) -> Result<()> {
    let Some(first) = value.as_array().and_then(|items| items.first()) else {
        return Ok(());
    };
    let Some(err) = first.get("error") else {
        return Ok(());
    };
    let err: ApiError = serde_json::from_value(err.clone()).map_err(Error::JsonLoad)?;
    Err(Error::from_bridge(err))
}

/// Order a bridge resource map (`{"2": .., "1": .., "10": ..}`) by numeric id.
pub(crate) fn order_by_id<T>(
    resources: impl IntoIterator<Item = (String, T)>,
) -> Result<Vec<(u32, T)>> {
    let mut ordered = resources
        .into_iter()
        .map(|(key, resource)| {
            key.parse::<u32>()
                .map(|id| (id, resource))
                .map_err(|_| Error::InvalidResponse(format!("resource id {key:?} is not a number")))
        })
        .collect::<Result<Vec<_>>>()?;
    ordered.sort_by_key(|(id, _)| *id);
    Ok(ordered)
}
