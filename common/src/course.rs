use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const COURSE_V1_PREFIX: &str = "course-v1:";

/// Why a string could not be read as a course key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CourseIdError {
    #[error("course key is empty")]
    Empty,
    #[error("course key '{0}' must have exactly three parts (org, course, run)")]
    WrongPartCount(String),
    #[error("course key '{key}' has an empty {part} component")]
    EmptyPart { key: String, part: &'static str },
    #[error("course key '{key}' contains invalid character {ch:?}")]
    InvalidCharacter { key: String, ch: char },
}

/// How the key was written. Both spellings stay stable through a round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum KeyStyle {
    /// `org/course/run`
    Slashed,
    /// `course-v1:org+course+run`
    Versioned,
}

/// A validated course key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CourseId {
    org: String,
    course: String,
    run: String,
    style: KeyStyle,
}

impl CourseId {
    /// Build a `course-v1:` key from its parts.
    pub fn new(org: &str, course: &str, run: &str) -> Result<Self, CourseIdError> {
        let raw = format!("{COURSE_V1_PREFIX}{org}+{course}+{run}");
        Self::from_parts(&raw, [org, course, run], KeyStyle::Versioned)
    }

    pub fn org(&self) -> &str {
        &self.org
    }

    pub fn course(&self) -> &str {
        &self.course
    }

    pub fn run(&self) -> &str {
        &self.run
    }

    fn from_parts(raw: &str, parts: [&str; 3], style: KeyStyle) -> Result<Self, CourseIdError> {
        for (part, label) in parts.iter().zip(["org", "course", "run"]) {
            if part.is_empty() {
                return Err(CourseIdError::EmptyPart {
                    key: raw.to_string(),
                    part: label,
                });
            }
            if let Some(ch) = part.chars().find(|c| !is_key_char(*c)) {
                return Err(CourseIdError::InvalidCharacter {
                    key: raw.to_string(),
                    ch,
                });
            }
        }
        let [org, course, run] = parts;
        Ok(Self {
            org: org.to_string(),
            course: course.to_string(),
            run: run.to_string(),
            style,
        })
    }
}

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-' | '~')
}

impl FromStr for CourseId {
    type Err = CourseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CourseIdError::Empty);
        }
        let (body, sep, style) = match s.strip_prefix(COURSE_V1_PREFIX) {
            Some(body) => (body, '+', KeyStyle::Versioned),
            None => (s, '/', KeyStyle::Slashed),
        };
        let parts: Vec<&str> = body.split(sep).collect();
        match parts.as_slice() {
            [org, course, run] => Self::from_parts(s, [*org, *course, *run], style),
            _ => Err(CourseIdError::WrongPartCount(s.to_string())),
        }
    }
}

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.style {
            KeyStyle::Slashed => write!(f, "{}/{}/{}", self.org, self.course, self.run),
            KeyStyle::Versioned => write!(
                f,
                "{COURSE_V1_PREFIX}{}+{}+{}",
                self.org, self.course, self.run
            ),
        }
    }
}

// Course keys travel as their string form.
impl Serialize for CourseId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CourseId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// The cached course summary that enrollment and date logic read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseOverview {
    pub id: CourseId,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
}

impl CourseOverview {
    pub fn new(id: CourseId) -> Self {
        Self {
            display_name: id.course().to_string(),
            id,
            start: None,
            end: None,
        }
    }

    /// True once the course has begun. A course with no start date has not.
    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        self.start.is_some_and(|start| start <= now)
    }

    /// True once the course end date is in the past.
    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        self.end.is_some_and(|end| end <= now)
    }
}
