//! On-disk snapshot of one learner's view of one course.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use courseware_common::certificate::GeneratedCertificate;
use courseware_common::course::CourseOverview;
use courseware_common::course_mode::CourseModeRecord;
use courseware_common::date_summary::DateSummaryContext;
use courseware_common::embargo::EmbargoRules;
use courseware_common::enrollment::{CourseEnrollment, EnrollmentLedger, RefundFacts};
use courseware_common::identity::User;
use courseware_common::refund::{RefundConfiguration, RefundConfigurationHistory};
use courseware_common::report::{LedgerReportProvider, PaymentRecord, UserProfile};
use courseware_common::urls::LmsUrls;
use courseware_common::verification::{deadline_for_course, VerificationDeadline, VerificationStatus};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse snapshot {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to write snapshot {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Evaluation instant. The wall clock is used when absent.
    #[serde(default)]
    pub now: Option<DateTime<Utc>>,
    pub user: User,
    /// The course being looked at.
    pub course: CourseOverview,
    /// Other catalog courses the learner may enroll in.
    #[serde(default)]
    pub courses: Vec<CourseOverview>,
    #[serde(default)]
    pub modes: Vec<CourseModeRecord>,
    #[serde(default)]
    pub enrollments: EnrollmentLedger,
    #[serde(default)]
    pub verification_status: VerificationStatus,
    #[serde(default)]
    pub verification_deadlines: Vec<VerificationDeadline>,
    #[serde(default)]
    pub certificates: Vec<GeneratedCertificate>,
    #[serde(default)]
    pub refund_configurations: RefundConfigurationHistory,
    #[serde(default)]
    pub embargo: EmbargoRules,
    #[serde(default)]
    pub profiles: Vec<UserProfile>,
    #[serde(default)]
    pub payments: Vec<PaymentRecord>,
}

impl Snapshot {
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let raw = fs::read_to_string(path).map_err(|source| SnapshotError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| SnapshotError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        let write_err = |source: std::io::Error| SnapshotError::Write {
            path: path.to_path_buf(),
            source,
        };
        let json = serde_json::to_string_pretty(self).map_err(|e| write_err(e.into()))?;
        fs::write(path, json).map_err(write_err)
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }

    /// The learner's enrollment in the snapshot course, active or not.
    pub fn enrollment(&self) -> Option<&CourseEnrollment> {
        self.enrollments.get(self.user.id, &self.course.id)
    }

    pub fn refund_configuration(&self) -> RefundConfiguration {
        self.refund_configurations.current()
    }

    pub fn refund_facts<'a>(&'a self, config: &'a RefundConfiguration) -> RefundFacts<'a> {
        RefundFacts {
            certificates: &self.certificates,
            modes: &self.modes,
            config,
        }
    }

    pub fn date_context<'a>(&'a self, urls: &'a LmsUrls, now: DateTime<Utc>) -> DateSummaryContext<'a> {
        DateSummaryContext {
            enrollment: self.enrollment(),
            modes: &self.modes,
            verification_deadline: deadline_for_course(&self.verification_deadlines, &self.course.id),
            verification_status: self.verification_status,
            ..DateSummaryContext::new(&self.course, urls, now)
        }
    }

    /// The snapshot course followed by the rest of the catalog.
    pub fn catalog(&self) -> Vec<CourseOverview> {
        std::iter::once(self.course.clone())
            .chain(self.courses.iter().cloned())
            .collect()
    }

    pub fn report_provider(&self) -> LedgerReportProvider<'_> {
        LedgerReportProvider {
            ledger: &self.enrollments,
            profiles: &self.profiles,
            payments: &self.payments,
        }
    }
}
