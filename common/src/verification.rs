use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::course::CourseId;

/// Status of a learner's most recent photo-verification attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    /// No attempt on record.
    #[default]
    None,
    Submitted,
    Pending,
    Approved,
    Denied,
    MustReverify,
    Expired,
    #[serde(other)]
    Unknown,
}

impl VerificationStatus {
    /// Only an approved attempt counts. Unrecognized statuses do not.
    pub fn is_approved(self) -> bool {
        self == VerificationStatus::Approved
    }

    /// The learner has to submit photos again.
    pub fn must_retry(self) -> bool {
        matches!(
            self,
            VerificationStatus::Denied | VerificationStatus::MustReverify
        )
    }
}

/// Last date a course accepts a successful verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationDeadline {
    pub course_id: CourseId,
    pub deadline: DateTime<Utc>,
}

pub fn deadline_for_course(
    deadlines: &[VerificationDeadline],
    course_id: &CourseId,
) -> Option<DateTime<Utc>> {
    deadlines
        .iter()
        .find(|d| &d.course_id == course_id)
        .map(|d| d.deadline)
}
