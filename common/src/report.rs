//! Detailed enrollment report data.
//!
//! A report row is an ordered list of `(column label, value)` pairs. Where the
//! data comes from is up to the [`EnrollmentReportProvider`] implementation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::course::CourseId;
use crate::enrollment::EnrollmentLedger;
use crate::identity::{User, UserId};

pub type ReportRow = Vec<(String, Value)>;

const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    #[error("no profile for user {0}")]
    UnknownUser(UserId),
    #[error("user {user} has no enrollment in {course}")]
    NotEnrolled { user: UserId, course: CourseId },
}

/// Capability contract for per-learner report data.
pub trait EnrollmentReportProvider {
    fn enrollment_info(&self, user: &User, course_id: &CourseId) -> Result<ReportRow, ReportError>;

    fn user_profile(&self, user_id: UserId) -> Result<ReportRow, ReportError>;

    fn payment_info(&self, user: &User, course_id: &CourseId) -> Result<ReportRow, ReportError>;
}

/// Profile fields stored beside the account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub year_of_birth: Option<u16>,
    #[serde(default)]
    pub mailing_address: String,
    #[serde(default)]
    pub goals: String,
    /// Extended registration fields (first-name, last-name, company, title).
    #[serde(default)]
    pub meta: Map<String, Value>,
}

impl UserProfile {
    fn meta_str(&self, key: &str) -> Value {
        self.meta
            .get(key)
            .cloned()
            .unwrap_or_else(|| Value::String(String::new()))
    }
}

/// What a learner paid for one course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub user_id: UserId,
    pub course_id: CourseId,
    pub order_number: String,
    /// Smallest currency unit.
    pub amount: u64,
    pub currency: String,
    pub status: String,
}

/// Report provider backed by in-process records.
pub struct LedgerReportProvider<'a> {
    pub ledger: &'a EnrollmentLedger,
    pub profiles: &'a [UserProfile],
    pub payments: &'a [PaymentRecord],
}

fn row(pairs: Vec<(&str, Value)>) -> ReportRow {
    pairs
        .into_iter()
        .map(|(label, value)| (label.to_string(), value))
        .collect()
}

fn format_amount(amount: u64) -> String {
    format!("{}.{:02}", amount / 100, amount % 100)
}

impl EnrollmentReportProvider for LedgerReportProvider<'_> {
    fn enrollment_info(&self, user: &User, course_id: &CourseId) -> Result<ReportRow, ReportError> {
        let enrollment = self
            .ledger
            .get(user.id, course_id)
            .ok_or_else(|| ReportError::NotEnrolled {
                user: user.id,
                course: course_id.clone(),
            })?;

        let enrolled_on = enrollment
            .created_at
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
            .unwrap_or(Value::Null);
        let order = enrollment
            .order_number()
            .map(|n| n.0)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        Ok(row(vec![
            ("Enrollment Date", enrolled_on),
            ("Enrollment Mode", Value::from(enrollment.mode.as_str())),
            ("Currently Enrolled", Value::Bool(enrollment.is_active)),
            ("Order Number", Value::String(order)),
        ]))
    }

    fn user_profile(&self, user_id: UserId) -> Result<ReportRow, ReportError> {
        let profile = self
            .profiles
            .iter()
            .find(|p| p.user_id == user_id)
            .ok_or(ReportError::UnknownUser(user_id))?;

        Ok(row(vec![
            ("User ID", Value::from(profile.user_id.0)),
            ("Username", Value::from(profile.username.as_str())),
            ("Email", Value::from(profile.email.as_str())),
            ("Full Name", Value::from(profile.name.as_str())),
            ("First Name", profile.meta_str("first-name")),
            ("Last Name", profile.meta_str("last-name")),
            ("Company Name", profile.meta_str("company")),
            ("Title", profile.meta_str("title")),
            ("Language", Value::from(profile.language.as_str())),
            ("Country", Value::from(profile.country.as_str())),
            (
                "Year of Birth",
                profile.year_of_birth.map(Value::from).unwrap_or(Value::Null),
            ),
            ("Mailing Address", Value::from(profile.mailing_address.as_str())),
            ("Goals", Value::from(profile.goals.as_str())),
            ("City", Value::from(profile.city.as_str())),
        ]))
    }

    fn payment_info(&self, user: &User, course_id: &CourseId) -> Result<ReportRow, ReportError> {
        let payment = self
            .payments
            .iter()
            .find(|p| p.user_id == user.id && &p.course_id == course_id);

        Ok(match payment {
            Some(p) => row(vec![
                ("Order Number", Value::from(p.order_number.as_str())),
                ("Payment Amount", Value::String(format_amount(p.amount))),
                ("Currency", Value::from(p.currency.as_str())),
                ("Payment Status", Value::from(p.status.as_str())),
            ]),
            None => row(vec![
                ("Order Number", Value::from(NOT_AVAILABLE)),
                ("Payment Amount", Value::from(NOT_AVAILABLE)),
                ("Currency", Value::from(NOT_AVAILABLE)),
                ("Payment Status", Value::from(NOT_AVAILABLE)),
            ]),
        })
    }
}
