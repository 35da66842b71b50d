use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::course::CourseId;

/// The enrollment track a learner can take in a course.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CourseModeSlug {
    #[default]
    Honor,
    Audit,
    Verified,
    Professional,
    NoIdProfessional,
}

impl CourseModeSlug {
    /// Tracks that must be paid for before enrolling. Never auto-enrolled.
    pub fn is_professional(self) -> bool {
        matches!(
            self,
            CourseModeSlug::Professional | CourseModeSlug::NoIdProfessional
        )
    }

    pub fn is_free(self) -> bool {
        matches!(self, CourseModeSlug::Honor | CourseModeSlug::Audit)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CourseModeSlug::Honor => "honor",
            CourseModeSlug::Audit => "audit",
            CourseModeSlug::Verified => "verified",
            CourseModeSlug::Professional => "professional",
            CourseModeSlug::NoIdProfessional => "no-id-professional",
        }
    }
}

impl fmt::Display for CourseModeSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A track offered by a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseModeRecord {
    pub course_id: CourseId,
    pub slug: CourseModeSlug,
    #[serde(default)]
    pub display_name: String,
    /// For the verified track this is the upgrade deadline.
    #[serde(default)]
    pub expiration: Option<DateTime<Utc>>,
}

impl CourseModeRecord {
    pub fn new(course_id: CourseId, slug: CourseModeSlug) -> Self {
        Self {
            course_id,
            slug,
            display_name: slug.as_str().to_string(),
            expiration: None,
        }
    }

    pub fn with_expiration(mut self, expiration: DateTime<Utc>) -> Self {
        self.expiration = Some(expiration);
        self
    }
}

/// Look up one track of a course among the loaded mode records.
pub fn mode_for_course<'a>(
    modes: &'a [CourseModeRecord],
    course_id: &CourseId,
    slug: CourseModeSlug,
) -> Option<&'a CourseModeRecord> {
    modes
        .iter()
        .find(|m| &m.course_id == course_id && m.slug == slug)
}

/// The slugs a course offers, in record order.
pub fn modes_for_course(modes: &[CourseModeRecord], course_id: &CourseId) -> Vec<CourseModeSlug> {
    modes
        .iter()
        .filter(|m| &m.course_id == course_id)
        .map(|m| m.slug)
        .collect()
}

/// Upgrade deadline for a course: the expiration of its verified track.
pub fn verified_upgrade_deadline(
    modes: &[CourseModeRecord],
    course_id: &CourseId,
) -> Option<DateTime<Utc>> {
    mode_for_course(modes, course_id, CourseModeSlug::Verified).and_then(|m| m.expiration)
}
