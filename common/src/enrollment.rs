use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::certificate::{certificate_for_student, GeneratedCertificate};
use crate::course::{CourseId, CourseIdError, CourseOverview};
use crate::course_mode::{mode_for_course, modes_for_course, CourseModeRecord, CourseModeSlug};
use crate::embargo::EmbargoRules;
use crate::identity::UserId;
use crate::order::{OrderError, OrderLookup, OrderNumber};
use crate::refund::{refund_window_end, RefundConfiguration};
use crate::urls::LmsUrls;

pub const ORDER_NAMESPACE: &str = "order";
pub const ORDER_NUMBER_ATTRIBUTE: &str = "order_number";

/// Free-form key/value data hung off an enrollment, grouped by namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentAttribute {
    pub namespace: String,
    pub name: String,
    pub value: String,
}

impl EnrollmentAttribute {
    /// The attribute linking an enrollment to the commerce order that paid for it.
    pub fn order_number(number: &str) -> Self {
        Self {
            namespace: ORDER_NAMESPACE.to_string(),
            name: ORDER_NUMBER_ATTRIBUTE.to_string(),
            value: number.to_string(),
        }
    }
}

/// A learner's enrollment in one course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseEnrollment {
    pub user_id: UserId,
    pub course: CourseOverview,
    #[serde(default)]
    pub mode: CourseModeSlug,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
    /// Administrative override: always refundable when set.
    #[serde(default)]
    pub can_refund: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub attributes: Vec<EnrollmentAttribute>,
}

fn active_by_default() -> bool {
    true
}

/// Records `refundable` consults besides the enrollment itself.
#[derive(Debug, Clone, Copy)]
pub struct RefundFacts<'a> {
    pub certificates: &'a [GeneratedCertificate],
    pub modes: &'a [CourseModeRecord],
    pub config: &'a RefundConfiguration,
}

impl CourseEnrollment {
    pub fn new(user_id: UserId, course: CourseOverview, mode: CourseModeSlug) -> Self {
        Self {
            user_id,
            course,
            mode,
            is_active: true,
            can_refund: false,
            created_at: None,
            attributes: Vec::new(),
        }
    }

    pub fn course_id(&self) -> &CourseId {
        &self.course.id
    }

    pub fn attribute(&self, namespace: &str, name: &str) -> Option<&EnrollmentAttribute> {
        self.attributes
            .iter()
            .find(|a| a.namespace == namespace && a.name == name)
    }

    pub fn order_number(&self) -> Option<OrderNumber> {
        self.attribute(ORDER_NAMESPACE, ORDER_NUMBER_ATTRIBUTE)
            .map(|a| OrderNumber(a.value.clone()))
    }

    /// Last instant this enrollment can be refunded, or `None` when no order
    /// is linked to it. Order-service failures are returned, never defaulted.
    pub async fn refund_window_end_date<L: OrderLookup>(
        &self,
        orders: &L,
        config: &RefundConfiguration,
    ) -> Result<Option<DateTime<Utc>>, OrderError> {
        let Some(number) = self.order_number() else {
            tracing::debug!(
                user = %self.user_id,
                course = %self.course.id,
                "no order linked to enrollment; refund window undefined"
            );
            return Ok(None);
        };

        let order = orders.placed_order(&number).await.map_err(|e| {
            tracing::warn!(order = %number, error = %e, "failed to fetch order for refund window");
            e
        })?;

        Ok(Some(refund_window_end(
            order.date_placed,
            self.course.start,
            config.refund_window,
        )))
    }

    /// The part of the refund decision that needs no order lookup.
    /// `None` means it comes down to the refund window.
    pub fn refund_precheck(&self, facts: &RefundFacts<'_>) -> Option<bool> {
        if self.can_refund {
            return Some(true);
        }
        if certificate_for_student(facts.certificates, self.user_id, self.course_id()).is_some() {
            return Some(false);
        }
        if mode_for_course(facts.modes, self.course_id(), CourseModeSlug::Verified).is_none() {
            return Some(false);
        }
        None
    }

    pub async fn refundable<L: OrderLookup>(
        &self,
        orders: &L,
        facts: &RefundFacts<'_>,
        now: DateTime<Utc>,
    ) -> Result<bool, OrderError> {
        if let Some(decided) = self.refund_precheck(facts) {
            return Ok(decided);
        }
        let window_end = self.refund_window_end_date(orders, facts.config).await?;
        Ok(within_refund_window(window_end, now))
    }
}

/// No known window end counts as still refundable.
pub fn within_refund_window(window_end: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    window_end.map_or(true, |end| now < end)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnrollmentError {
    #[error("missing course id")]
    MissingCourseId,
    #[error("invalid course id: {0}")]
    InvalidCourseId(#[from] CourseIdError),
    #[error("course {0} does not exist")]
    UnknownCourse(CourseId),
    #[error("enrollment action '{0}' is invalid")]
    InvalidAction(String),
    #[error("you are not enrolled in course {0}")]
    NotEnrolled(CourseId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentAction {
    Enroll,
    Unenroll,
}

impl FromStr for EnrollmentAction {
    type Err = EnrollmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enroll" => Ok(EnrollmentAction::Enroll),
            "unenroll" => Ok(EnrollmentAction::Unenroll),
            other => Err(EnrollmentError::InvalidAction(other.to_string())),
        }
    }
}

/// The raw form fields of an enroll/unenroll request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnrollmentRequest {
    pub action: String,
    #[serde(default)]
    pub course_id: Option<String>,
    #[serde(default)]
    pub email_opt_in: Option<String>,
}

impl EnrollmentRequest {
    pub fn new(action: &str, course_id: &str) -> Self {
        Self {
            action: action.to_string(),
            course_id: Some(course_id.to_string()),
            email_opt_in: None,
        }
    }
}

/// Marketing e-mail preference to store for the course's organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailOptIn {
    pub org: String,
    pub opted_in: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentOutcome {
    /// Where the client should go next. Empty means the dashboard.
    pub next_url: String,
    /// Track the learner was enrolled in, if any.
    pub enrolled: Option<CourseModeSlug>,
    pub email_opt_in: Option<EmailOptIn>,
}

/// Every enrollment known to this process, at most one per (user, course).
///
/// Serialized as a plain list. Loading goes through [`EnrollmentLedger::insert`],
/// so a later record for the same pair replaces an earlier one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<CourseEnrollment>", into = "Vec<CourseEnrollment>")]
pub struct EnrollmentLedger {
    enrollments: Vec<CourseEnrollment>,
}

impl From<Vec<CourseEnrollment>> for EnrollmentLedger {
    fn from(records: Vec<CourseEnrollment>) -> Self {
        let mut ledger = Self::default();
        for enrollment in records {
            ledger.insert(enrollment);
        }
        ledger
    }
}

impl From<EnrollmentLedger> for Vec<CourseEnrollment> {
    fn from(ledger: EnrollmentLedger) -> Self {
        ledger.enrollments
    }
}

impl EnrollmentLedger {
    pub fn get(&self, user_id: UserId, course_id: &CourseId) -> Option<&CourseEnrollment> {
        self.enrollments
            .iter()
            .find(|e| e.user_id == user_id && e.course_id() == course_id)
    }

    fn position(&self, user_id: UserId, course_id: &CourseId) -> Option<usize> {
        self.enrollments
            .iter()
            .position(|e| e.user_id == user_id && e.course_id() == course_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CourseEnrollment> {
        self.enrollments.iter()
    }

    /// Store a loaded enrollment, replacing any record for the same (user, course).
    pub fn insert(&mut self, enrollment: CourseEnrollment) {
        match self.position(enrollment.user_id, enrollment.course_id()) {
            Some(idx) => self.enrollments[idx] = enrollment,
            None => self.enrollments.push(enrollment),
        }
    }

    pub fn is_enrolled(&self, user_id: UserId, course_id: &CourseId) -> bool {
        self.get(user_id, course_id).is_some_and(|e| e.is_active)
    }

    /// `(mode, is_active)` of the learner's enrollment, active or not.
    pub fn enrollment_mode_for_user(
        &self,
        user_id: UserId,
        course_id: &CourseId,
    ) -> Option<(CourseModeSlug, bool)> {
        self.get(user_id, course_id).map(|e| (e.mode, e.is_active))
    }

    /// Create or reactivate an enrollment in the given track.
    pub fn enroll(
        &mut self,
        user_id: UserId,
        course: &CourseOverview,
        mode: CourseModeSlug,
        now: DateTime<Utc>,
    ) -> &CourseEnrollment {
        let idx = match self.position(user_id, &course.id) {
            Some(idx) => {
                let existing = &mut self.enrollments[idx];
                existing.mode = mode;
                existing.is_active = true;
                idx
            }
            None => {
                let mut enrollment = CourseEnrollment::new(user_id, course.clone(), mode);
                enrollment.created_at = Some(now);
                self.enrollments.push(enrollment);
                self.enrollments.len() - 1
            }
        };
        tracing::info!(user = %user_id, course = %course.id, mode = %mode, "enrolled");
        &self.enrollments[idx]
    }

    pub fn unenroll(&mut self, user_id: UserId, course_id: &CourseId) -> Result<(), EnrollmentError> {
        match self.position(user_id, course_id) {
            Some(idx) if self.enrollments[idx].is_active => {
                self.enrollments[idx].is_active = false;
                tracing::info!(user = %user_id, course = %course_id, "unenrolled");
                Ok(())
            }
            _ => Err(EnrollmentError::NotEnrolled(course_id.clone())),
        }
    }

    pub fn add_attribute(
        &mut self,
        user_id: UserId,
        course_id: &CourseId,
        attribute: EnrollmentAttribute,
    ) -> Result<(), EnrollmentError> {
        let idx = self
            .position(user_id, course_id)
            .ok_or_else(|| EnrollmentError::NotEnrolled(course_id.clone()))?;
        self.enrollments[idx].attributes.push(attribute);
        Ok(())
    }
}

/// Handles enroll/unenroll requests against the course catalog.
pub struct EnrollmentDesk<'a> {
    pub courses: &'a [CourseOverview],
    pub modes: &'a [CourseModeRecord],
    pub embargo: &'a EmbargoRules,
    pub urls: &'a LmsUrls,
}

impl EnrollmentDesk<'_> {
    pub fn change_enrollment(
        &self,
        ledger: &mut EnrollmentLedger,
        user_id: UserId,
        request: &EnrollmentRequest,
        country: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<EnrollmentOutcome, EnrollmentError> {
        let course_id: CourseId = request
            .course_id
            .as_deref()
            .ok_or(EnrollmentError::MissingCourseId)?
            .parse()?;

        match request.action.parse::<EnrollmentAction>()? {
            EnrollmentAction::Enroll => self.enroll(ledger, user_id, &course_id, request, country, now),
            EnrollmentAction::Unenroll => {
                ledger.unenroll(user_id, &course_id)?;
                Ok(EnrollmentOutcome::default())
            }
        }
    }

    fn enroll(
        &self,
        ledger: &mut EnrollmentLedger,
        user_id: UserId,
        course_id: &CourseId,
        request: &EnrollmentRequest,
        country: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<EnrollmentOutcome, EnrollmentError> {
        let course = self
            .courses
            .iter()
            .find(|c| &c.id == course_id)
            .ok_or_else(|| EnrollmentError::UnknownCourse(course_id.clone()))?;

        // Recorded even when the enrollment itself does not go through.
        // A blank value means the form did not ask.
        let email_opt_in = request
            .email_opt_in
            .as_deref()
            .filter(|v| !v.is_empty())
            .map(|v| EmailOptIn {
                org: course_id.org().to_string(),
                opted_in: v == "true",
            });

        if let Some(redirect) = self.embargo.redirect_if_blocked(course_id, country, self.urls) {
            return Ok(EnrollmentOutcome {
                next_url: redirect,
                enrolled: None,
                email_opt_in,
            });
        }

        let offered = modes_for_course(self.modes, course_id);
        let professional = offered.iter().any(|m| m.is_professional());
        let can_auto_enroll =
            !professional && (offered.is_empty() || offered.iter().any(|m| m.is_free()));

        let enrolled = if can_auto_enroll {
            let mode = auto_enroll_mode(&offered);
            ledger.enroll(user_id, course, mode, now);
            Some(mode)
        } else {
            tracing::debug!(course = %course_id, "track selection required before enrolling");
            None
        };

        let next_url = if professional || offered.contains(&CourseModeSlug::Verified) {
            self.urls.course_modes_choose(course_id)
        } else {
            String::new()
        };

        Ok(EnrollmentOutcome {
            next_url,
            enrolled,
            email_opt_in,
        })
    }
}

fn auto_enroll_mode(offered: &[CourseModeSlug]) -> CourseModeSlug {
    if !offered.contains(&CourseModeSlug::Honor) && offered.contains(&CourseModeSlug::Audit) {
        CourseModeSlug::Audit
    } else {
        CourseModeSlug::Honor
    }
}
