//! Management object names
//!
//! A name has the form `domain:key=value[,key=value]*`. Parsing is strict:
//! patterns (`*`, `?`) are rejected, keys must be unique and every value is
//! either a plain token or a quoted string. Two names compare equal when
//! they have the same domain and the same set of properties, whatever the
//! order the caller wrote them in.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Characters that may never appear in a key or an unquoted value
const RESERVED: [char; 7] = [':', ',', '=', '*', '?', '"', '\n'];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ObjectNameError {
    #[error("object name is empty")]
    Empty,

    #[error("missing ':' between domain and key properties")]
    MissingDomainSeparator,

    #[error("domain contains an illegal character: {0:?}")]
    IllegalDomainChar(char),

    #[error("object name has no key properties")]
    NoProperties,

    #[error("key property '{0}' is not of the form key=value")]
    MalformedProperty(String),

    #[error("key contains an illegal character: {0:?}")]
    IllegalKeyChar(char),

    #[error("empty key in key properties")]
    EmptyKey,

    #[error("empty value for key '{0}'")]
    EmptyValue(String),

    #[error("value for key '{key}' contains an illegal character: {ch:?}")]
    IllegalValueChar { key: String, ch: char },

    #[error("unterminated quoted value for key '{0}'")]
    UnterminatedQuote(String),

    #[error("invalid escape sequence in quoted value for key '{0}'")]
    InvalidEscape(String),

    #[error("duplicate key '{0}'")]
    DuplicateKey(String),
}

/// A validated management object name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectName {
    domain: String,
    properties: BTreeMap<String, String>,
}

impl ObjectName {
    /// Parse and validate a caller-supplied name
    pub fn parse(input: &str) -> Result<Self, ObjectNameError> {
        if input.is_empty() {
            return Err(ObjectNameError::Empty);
        }

        let (domain, props) = input
            .split_once(':')
            .ok_or(ObjectNameError::MissingDomainSeparator)?;

        if let Some(ch) = domain.chars().find(|c| matches!(c, '\n' | '*' | '?')) {
            return Err(ObjectNameError::IllegalDomainChar(ch));
        }

        if props.is_empty() {
            return Err(ObjectNameError::NoProperties);
        }

        let mut properties = BTreeMap::new();
        let mut rest = props;

        loop {
            let (key, after_key) = rest
                .split_once('=')
                .ok_or_else(|| ObjectNameError::MalformedProperty(rest.to_string()))?;

            validate_key(key)?;

            let (value, remainder) = if after_key.starts_with('"') {
                split_quoted(key, after_key)?
            } else {
                let end = after_key.find(',').unwrap_or(after_key.len());
                let value = &after_key[..end];
                validate_unquoted(key, value)?;
                (value.to_string(), &after_key[end..])
            };

            if properties.insert(key.to_string(), value).is_some() {
                return Err(ObjectNameError::DuplicateKey(key.to_string()));
            }

            match remainder.strip_prefix(',') {
                Some(next) if !next.is_empty() => rest = next,
                Some(_) => return Err(ObjectNameError::MalformedProperty(String::new())),
                None if remainder.is_empty() => break,
                None => return Err(ObjectNameError::MalformedProperty(remainder.to_string())),
            }
        }

        Ok(Self {
            domain: domain.to_string(),
            properties,
        })
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Look up the raw value of one key property
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Canonical string form: properties sorted by key
    pub fn canonical(&self) -> String {
        self.to_string()
    }
}

fn validate_key(key: &str) -> Result<(), ObjectNameError> {
    if key.is_empty() {
        return Err(ObjectNameError::EmptyKey);
    }
    match key.chars().find(|c| RESERVED.contains(c)) {
        Some(ch) => Err(ObjectNameError::IllegalKeyChar(ch)),
        None => Ok(()),
    }
}

fn validate_unquoted(key: &str, value: &str) -> Result<(), ObjectNameError> {
    if value.is_empty() {
        return Err(ObjectNameError::EmptyValue(key.to_string()));
    }
    match value.chars().find(|c| RESERVED.contains(c)) {
        Some(ch) => Err(ObjectNameError::IllegalValueChar {
            key: key.to_string(),
            ch,
        }),
        None => Ok(()),
    }
}

/// Split a quoted value off the front of `input`. The returned value keeps
/// its quotes and escapes so the canonical form round-trips.
fn split_quoted<'a>(key: &str, input: &'a str) -> Result<(String, &'a str), ObjectNameError> {
    let mut chars = input.char_indices().skip(1);

    while let Some((idx, ch)) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some((_, '\\' | '"' | '*' | '?' | 'n')) => {}
                _ => return Err(ObjectNameError::InvalidEscape(key.to_string())),
            },
            '"' => {
                let end = idx + 1;
                return Ok((input[..end].to_string(), &input[end..]));
            }
            '\n' => {
                return Err(ObjectNameError::IllegalValueChar {
                    key: key.to_string(),
                    ch,
                })
            }
            _ => {}
        }
    }

    Err(ObjectNameError::UnterminatedQuote(key.to_string()))
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.domain)?;
        for (i, (key, value)) in self.properties.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}={}", key, value)?;
        }
        Ok(())
    }
}

impl FromStr for ObjectName {
    type Err = ObjectNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ObjectName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ObjectName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
