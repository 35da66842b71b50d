use serde::{Deserialize, Serialize};

use crate::course::CourseId;
use crate::identity::UserId;

/// Lifecycle of a certificate record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificateStatus {
    Unavailable,
    Generating,
    Downloadable,
    Notpassing,
    Regenerating,
    Error,
    #[serde(other)]
    Unknown,
}

/// A certificate record for one learner in one course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedCertificate {
    pub user_id: UserId,
    pub course_id: CourseId,
    pub status: CertificateStatus,
}

/// Find the learner's certificate record for a course, whatever its status.
pub fn certificate_for_student<'a>(
    certificates: &'a [GeneratedCertificate],
    user_id: UserId,
    course_id: &CourseId,
) -> Option<&'a GeneratedCertificate> {
    certificates
        .iter()
        .find(|c| c.user_id == user_id && &c.course_id == course_id)
}
