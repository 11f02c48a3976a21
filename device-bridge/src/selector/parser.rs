use std::fmt;
use std::str::FromStr;

use regex::Regex;
use thiserror::Error;

/// Marks a value as a pattern rather than a literal
pub const PATTERN_SENTINEL: char = '$';
const CLAUSE_SEPARATOR: char = ',';
const KEY_SEPARATOR: char = '@';

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Selector is empty")]
    Empty,

    #[error("Malformed clause '{0}': expected key@value")]
    MalformedClause(String),

    #[error("Unknown selector key '{0}'")]
    UnknownKey(String),

    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Recognized selector keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Clickable,
    Depth,
    Desc,
    Res,
    Text,
    Scrollable,
}

impl Key {
    pub fn as_str(self) -> &'static str {
        match self {
            Key::Clickable => "clickable",
            Key::Depth => "depth",
            Key::Desc => "desc",
            Key::Res => "res",
            Key::Text => "text",
            Key::Scrollable => "scrollable",
        }
    }

    /// Node attribute the key is compared against. `depth` has none: it is
    /// the node's position in the tree.
    pub fn attribute_name(self) -> Option<&'static str> {
        match self {
            Key::Clickable => Some("clickable"),
            Key::Depth => None,
            Key::Desc => Some("content-desc"),
            Key::Res => Some("resource-id"),
            Key::Text => Some("text"),
            Key::Scrollable => Some("scrollable"),
        }
    }
}

impl FromStr for Key {
    type Err = ParseError;

    /// Exact, case-sensitive match
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clickable" => Ok(Key::Clickable),
            "depth" => Ok(Key::Depth),
            "desc" => Ok(Key::Desc),
            "res" => Ok(Key::Res),
            "text" => Ok(Key::Text),
            "scrollable" => Ok(Key::Scrollable),
            other => Err(ParseError::UnknownKey(other.to_string())),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `key@value` clause
#[derive(Debug, Clone)]
pub struct Criterion {
    pub key: Key,
    pub value: String,
    pub is_pattern: bool,
    /// Anchored form of `value`, compiled once at parse time
    pattern: Option<Regex>,
}

impl Criterion {
    pub fn literal(key: Key, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
            is_pattern: false,
            pattern: None,
        }
    }

    pub fn pattern(key: Key, value: impl Into<String>) -> Result<Self, ParseError> {
        let value = value.into();
        let compiled = Regex::new(&format!("^(?:{})$", value)).map_err(|e| {
            ParseError::InvalidPattern {
                pattern: value.clone(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self {
            key,
            value,
            is_pattern: true,
            pattern: Some(compiled),
        })
    }

    /// Literal equality, or a full match of the pattern
    pub fn matches_value(&self, candidate: &str) -> bool {
        match &self.pattern {
            Some(re) => re.is_match(candidate),
            None => self.value == candidate,
        }
    }
}

impl PartialEq for Criterion {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.value == other.value && self.is_pattern == other.is_pattern
    }
}

impl Eq for Criterion {}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_pattern {
            write!(f, "{}{}{}{}", self.key, KEY_SEPARATOR, PATTERN_SENTINEL, self.value)
        } else {
            write!(f, "{}{}{}", self.key, KEY_SEPARATOR, self.value)
        }
    }
}

/// Non-empty, ordered list of criteria with unique keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    criteria: Vec<Criterion>,
}

impl Selector {
    /// Build from criteria. A repeated key replaces the earlier clause and
    /// takes the position of the last occurrence.
    pub fn new(criteria: impl IntoIterator<Item = Criterion>) -> Result<Self, ParseError> {
        let mut unique: Vec<Criterion> = Vec::new();
        for criterion in criteria {
            unique.retain(|c| c.key != criterion.key);
            unique.push(criterion);
        }
        if unique.is_empty() {
            return Err(ParseError::Empty);
        }
        Ok(Self { criteria: unique })
    }

    /// Selector matching a resource id literally
    pub fn resource_id(id: impl Into<String>) -> Self {
        Self {
            criteria: vec![Criterion::literal(Key::Res, id)],
        }
    }

    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, criterion) in self.criteria.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", CLAUSE_SEPARATOR)?;
            }
            write!(f, "{}", criterion)?;
        }
        Ok(())
    }
}

impl FromStr for Selector {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

/// Parse `key@[$]value,...` into a [`Selector`]
pub fn parse(raw: &str) -> Result<Selector, ParseError> {
    if raw.is_empty() {
        return Err(ParseError::Empty);
    }

    let criteria = raw
        .split(CLAUSE_SEPARATOR)
        .filter(|clause| !clause.is_empty())
        .map(parse_clause)
        .collect::<Result<Vec<_>, _>>()?;

    Selector::new(criteria)
}

fn parse_clause(clause: &str) -> Result<Criterion, ParseError> {
    let (key, value) = clause
        .split_once(KEY_SEPARATOR)
        .ok_or_else(|| ParseError::MalformedClause(clause.to_string()))?;
    let key: Key = key.parse()?;

    match value.strip_prefix(PATTERN_SENTINEL) {
        Some(pattern) => Criterion::pattern(key, pattern),
        None => Ok(Criterion::literal(key, value)),
    }
}
