use serde::{Deserialize, Serialize};

use crate::course::CourseId;

/// Builds the LMS paths that date blocks and enrollment outcomes link to.
///
/// `root` is prepended without its trailing slashes; leave it empty for
/// site-relative links.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LmsUrls {
    #[serde(default)]
    pub root: String,
}

impl LmsUrls {
    pub fn new(root: &str) -> Self {
        Self {
            root: root.trim_end_matches('/').to_string(),
        }
    }

    fn base(&self) -> &str {
        self.root.trim_end_matches('/')
    }

    pub fn upgrade_and_verify(&self, course_id: &CourseId) -> String {
        format!("{}/verify_student/upgrade/{course_id}/", self.base())
    }

    pub fn verify_now(&self, course_id: &CourseId) -> String {
        format!("{}/verify_student/verify-now/{course_id}/", self.base())
    }

    pub fn reverify(&self) -> String {
        format!("{}/verify_student/reverify", self.base())
    }

    /// The "choose your track" page.
    pub fn course_modes_choose(&self, course_id: &CourseId) -> String {
        format!("{}/course_modes/choose/{course_id}/", self.base())
    }

    pub fn embargo_blocked(&self, message_key: &str) -> String {
        format!("{}/embargo/blocked-message/enrollment/{message_key}/", self.base())
    }
}
