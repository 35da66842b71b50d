use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::course::CourseId;
use crate::urls::LmsUrls;

/// A course that may not be accessed from some countries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestrictedCourse {
    pub course_id: CourseId,
    /// ISO 3166 alpha-2 codes, upper case.
    pub blocked_countries: BTreeSet<String>,
    /// Selects the message shown on the blocked page.
    #[serde(default = "default_message_key")]
    pub enroll_message_key: String,
}

fn default_message_key() -> String {
    "default".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbargoRules {
    #[serde(default)]
    pub restricted: Vec<RestrictedCourse>,
}

impl EmbargoRules {
    pub fn restrict(&mut self, course_id: CourseId, countries: &[&str]) {
        self.restricted.push(RestrictedCourse {
            course_id,
            blocked_countries: countries.iter().map(|c| c.to_ascii_uppercase()).collect(),
            enroll_message_key: default_message_key(),
        });
    }

    /// Where to send the learner if enrolling from `country` is blocked.
    /// An unknown country is never blocked.
    pub fn redirect_if_blocked(
        &self,
        course_id: &CourseId,
        country: Option<&str>,
        urls: &LmsUrls,
    ) -> Option<String> {
        let country = country?.to_ascii_uppercase();
        self.restricted
            .iter()
            .filter(|r| &r.course_id == course_id)
            .find(|r| r.blocked_countries.contains(&country))
            .map(|r| {
                tracing::debug!(course = %course_id, country = %country, "enrollment blocked by embargo");
                urls.embargo_blocked(&r.enroll_message_key)
            })
    }
}
