//! Course date summary blocks.
//!
//! Each block is a small fact about the course timeline (today, start, end,
//! upgrade deadline, verification deadline). Blocks are rebuilt for every
//! evaluation from a [`DateSummaryContext`] and decide on their own whether
//! they apply; [`select_blocks`] keeps the ones that do.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::course::CourseOverview;
use crate::course_mode::{verified_upgrade_deadline, CourseModeRecord, CourseModeSlug};
use crate::enrollment::CourseEnrollment;
use crate::urls::LmsUrls;
use crate::verification::VerificationStatus;

/// Display format for block dates, e.g. "Jan 02, 2015".
pub const DATE_FORMAT: &str = "%b %d, %Y";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateSummaryKind {
    TodaysDate,
    CourseStartDate,
    CourseEndDate,
    VerifiedUpgradeDeadlineDate,
    VerificationDeadlineDate,
}

/// Where a learner stands relative to the verification deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationDeadlineState {
    Upcoming,
    Retry,
    Passed,
}

impl VerificationDeadlineState {
    pub fn as_str(self) -> &'static str {
        match self {
            VerificationDeadlineState::Upcoming => "verification-deadline-upcoming",
            VerificationDeadlineState::Retry => "verification-deadline-retry",
            VerificationDeadlineState::Passed => "verification-deadline-passed",
        }
    }
}

/// Inputs shared by every block. `now` is captured once so all blocks agree.
#[derive(Debug, Clone, Copy)]
pub struct DateSummaryContext<'a> {
    pub course: &'a CourseOverview,
    pub enrollment: Option<&'a CourseEnrollment>,
    pub modes: &'a [CourseModeRecord],
    pub verification_deadline: Option<DateTime<Utc>>,
    pub verification_status: VerificationStatus,
    pub urls: &'a LmsUrls,
    pub now: DateTime<Utc>,
}

impl<'a> DateSummaryContext<'a> {
    pub fn new(course: &'a CourseOverview, urls: &'a LmsUrls, now: DateTime<Utc>) -> Self {
        Self {
            course,
            enrollment: None,
            modes: &[],
            verification_deadline: None,
            verification_status: VerificationStatus::None,
            urls,
            now,
        }
    }

    fn has_active_verified_enrollment(&self) -> bool {
        self.enrollment
            .is_some_and(|e| e.is_active && e.mode == CourseModeSlug::Verified)
    }
}

/// One informational block for the course info page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateSummary {
    pub kind: DateSummaryKind,
    pub date: Option<DateTime<Utc>>,
    pub is_enabled: bool,
    pub title: String,
    pub description: String,
    pub link: String,
    pub link_text: String,
    /// Block-specific css/state tag.
    pub state: String,
    /// Whether the template prints `date` next to the title.
    pub show_date: bool,
}

impl DateSummary {
    fn blank(kind: DateSummaryKind, state: &str, date: Option<DateTime<Utc>>) -> Self {
        Self {
            kind,
            date,
            is_enabled: false,
            title: String::new(),
            description: String::new(),
            link: String::new(),
            link_text: String::new(),
            state: state.to_string(),
            show_date: true,
        }
    }

    pub fn todays_date(ctx: &DateSummaryContext<'_>) -> Self {
        let mut block = Self::blank(DateSummaryKind::TodaysDate, "todays-date", Some(ctx.now));
        block.is_enabled = true;
        block.title = format!("Today is {}", ctx.now.format(DATE_FORMAT));
        block.show_date = false;
        block
    }

    pub fn course_start_date(ctx: &DateSummaryContext<'_>) -> Self {
        let mut block = Self::blank(DateSummaryKind::CourseStartDate, "start-date", ctx.course.start);
        block.title = "Course Starts".to_string();
        block.is_enabled = ctx.course.start.is_some() && !ctx.course.has_started(ctx.now);
        block
    }

    pub fn course_end_date(ctx: &DateSummaryContext<'_>) -> Self {
        let mut block = Self::blank(DateSummaryKind::CourseEndDate, "end-date", ctx.course.end);
        block.title = "Course End".to_string();
        if ctx.course.end.is_some() {
            block.is_enabled = true;
            block.description = if !ctx.course.has_ended(ctx.now) {
                "To earn a certificate, you must complete all requirements before this date."
            } else {
                "This course is archived, which means you can review course content but it is no longer active."
            }
            .to_string();
        }
        block
    }

    pub fn verified_upgrade_deadline_date(ctx: &DateSummaryContext<'_>) -> Self {
        let deadline = verified_upgrade_deadline(ctx.modes, &ctx.course.id);
        let mut block = Self::blank(
            DateSummaryKind::VerifiedUpgradeDeadlineDate,
            "verified-upgrade-deadline",
            deadline,
        );
        block.title = "Verification Upgrade Deadline".to_string();
        block.description = "You are still eligible to upgrade to a Verified Certificate!".to_string();
        block.link_text = "Upgrade to Verified Certificate".to_string();
        block.link = ctx.urls.upgrade_and_verify(&ctx.course.id);
        block.is_enabled = deadline.is_some_and(|d| ctx.now < d);
        block
    }

    pub fn verification_deadline_date(ctx: &DateSummaryContext<'_>) -> Self {
        let state = verification_deadline_state(ctx);
        let mut block = Self::blank(
            DateSummaryKind::VerificationDeadlineDate,
            state.as_str(),
            ctx.verification_deadline,
        );

        if state == VerificationDeadlineState::Passed {
            block.title = "Missed Verification Deadline".to_string();
            block.description =
                "Unfortunately you missed this course's deadline for a successful verification."
                    .to_string();
        } else {
            block.title = "Verification Deadline".to_string();
            block.description = "You must successfully complete verification before this date to qualify for a Verified Certificate.".to_string();
        }

        let (link_text, link) = match state {
            VerificationDeadlineState::Upcoming => {
                ("Verify My Identity", ctx.urls.verify_now(&ctx.course.id))
            }
            VerificationDeadlineState::Retry => ("Retry Verification", ctx.urls.reverify()),
            VerificationDeadlineState::Passed => ("Learn More", String::new()),
        };
        block.link_text = link_text.to_string();
        block.link = link;

        block.is_enabled = ctx.verification_deadline.is_some()
            && ctx.has_active_verified_enrollment()
            && !ctx.verification_status.is_approved();
        block
    }

    /// The block date in display form.
    pub fn formatted_date(&self) -> Option<String> {
        self.date.map(|d| d.format(DATE_FORMAT).to_string())
    }
}

/// Passed once the deadline instant is reached; retry when the last attempt
/// was rejected.
pub fn verification_deadline_state(ctx: &DateSummaryContext<'_>) -> VerificationDeadlineState {
    match ctx.verification_deadline {
        Some(deadline) if deadline <= ctx.now => VerificationDeadlineState::Passed,
        _ if ctx.verification_status.must_retry() => VerificationDeadlineState::Retry,
        _ => VerificationDeadlineState::Upcoming,
    }
}

/// Build every candidate block and keep the enabled ones, in construction order.
pub fn select_blocks(ctx: &DateSummaryContext<'_>) -> Vec<DateSummary> {
    let candidates = [
        DateSummary::todays_date(ctx),
        DateSummary::course_start_date(ctx),
        DateSummary::course_end_date(ctx),
        DateSummary::verified_upgrade_deadline_date(ctx),
        DateSummary::verification_deadline_date(ctx),
    ];
    let blocks: Vec<DateSummary> = candidates.into_iter().filter(|b| b.is_enabled).collect();
    tracing::debug!(
        course = %ctx.course.id,
        enabled = blocks.len(),
        "selected date summary blocks"
    );
    blocks
}

/// Order blocks by date for display; dateless blocks go last. Stable.
pub fn sort_chronologically(blocks: &mut [DateSummary]) {
    blocks.sort_by_key(|b| (b.date.is_none(), b.date));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course::CourseId;
    use crate::identity::UserId;
    use chrono::{Duration, TimeZone};
    use std::collections::HashSet;

    use super::DateSummaryKind::*;

    /// Course and learner state for one scenario, relative to `now`.
    struct Setup {
        days_till_start: i64,
        days_till_end: i64,
        days_till_upgrade_deadline: Option<i64>,
        enrollment_mode: Option<CourseModeSlug>,
        days_till_verification_deadline: Option<i64>,
        verification_status: VerificationStatus,
    }

    impl Default for Setup {
        fn default() -> Self {
            Self {
                days_till_start: 1,
                days_till_end: 14,
                days_till_upgrade_deadline: Some(4),
                enrollment_mode: Some(CourseModeSlug::Verified),
                days_till_verification_deadline: Some(14),
                verification_status: VerificationStatus::None,
            }
        }
    }

    struct Scenario {
        course: CourseOverview,
        enrollment: CourseEnrollment,
        modes: Vec<CourseModeRecord>,
        verification_deadline: Option<DateTime<Utc>>,
        verification_status: VerificationStatus,
        urls: LmsUrls,
        now: DateTime<Utc>,
    }

    impl Setup {
        fn build(self, now: DateTime<Utc>) -> Scenario {
            let mut course = CourseOverview::new(CourseId::new("edX", "DemoX", "run").unwrap());
            course.start = Some(now + Duration::days(self.days_till_start));
            course.end = Some(now + Duration::days(self.days_till_end));

            let mut modes = Vec::new();
            let mode = match (self.enrollment_mode, self.days_till_upgrade_deadline) {
                (Some(mode), Some(days)) => {
                    modes.push(
                        CourseModeRecord::new(course.id.clone(), mode)
                            .with_expiration(now + Duration::days(days)),
                    );
                    mode
                }
                _ => CourseModeSlug::Honor,
            };
            let enrollment = CourseEnrollment::new(UserId(1), course.clone(), mode);

            Scenario {
                course,
                enrollment,
                modes,
                verification_deadline: self
                    .days_till_verification_deadline
                    .map(|days| now + Duration::days(days)),
                verification_status: self.verification_status,
                urls: LmsUrls::default(),
                now,
            }
        }
    }

    impl Scenario {
        fn ctx(&self) -> DateSummaryContext<'_> {
            DateSummaryContext {
                course: &self.course,
                enrollment: Some(&self.enrollment),
                modes: &self.modes,
                verification_deadline: self.verification_deadline,
                verification_status: self.verification_status,
                urls: &self.urls,
                now: self.now,
            }
        }
    }

    fn frozen_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2015, 1, 2, 0, 0, 0).unwrap()
    }

    fn assert_block_types(setup: Setup, expected: &[DateSummaryKind]) {
        let scenario = setup.build(Utc::now());
        let blocks = select_blocks(&scenario.ctx());
        assert_eq!(blocks.len(), expected.len());
        let kinds: HashSet<_> = blocks.iter().map(|b| b.kind).collect();
        assert_eq!(kinds, expected.iter().copied().collect());
    }

    // ── Which blocks are enabled ──

    #[test]
    fn test_before_course_run() {
        assert_block_types(
            Setup::default(),
            &[
                CourseEndDate,
                CourseStartDate,
                TodaysDate,
                VerificationDeadlineDate,
                VerifiedUpgradeDeadlineDate,
            ],
        );
    }

    #[test]
    fn test_after_course_run() {
        assert_block_types(
            Setup {
                days_till_start: -10,
                days_till_end: -5,
                days_till_upgrade_deadline: Some(-6),
                days_till_verification_deadline: Some(-5),
                verification_status: VerificationStatus::Approved,
                ..Setup::default()
            },
            &[TodaysDate, CourseEndDate],
        );
    }

    #[test]
    fn test_during_course_run() {
        assert_block_types(
            Setup {
                days_till_start: -1,
                ..Setup::default()
            },
            &[
                TodaysDate,
                CourseEndDate,
                VerificationDeadlineDate,
                VerifiedUpgradeDeadlineDate,
            ],
        );
    }

    #[test]
    fn test_verification_approved() {
        assert_block_types(
            Setup {
                days_till_start: -10,
                days_till_upgrade_deadline: Some(-1),
                days_till_verification_deadline: Some(1),
                verification_status: VerificationStatus::Approved,
                ..Setup::default()
            },
            &[TodaysDate, CourseEndDate],
        );
    }

    #[test]
    fn test_after_upgrade_deadline() {
        assert_block_types(
            Setup {
                days_till_start: -10,
                days_till_upgrade_deadline: Some(-1),
                ..Setup::default()
            },
            &[TodaysDate, CourseEndDate, VerificationDeadlineDate],
        );
    }

    #[test]
    fn test_after_verification_deadline() {
        assert_block_types(
            Setup {
                days_till_start: -10,
                days_till_upgrade_deadline: Some(-2),
                days_till_verification_deadline: Some(-1),
                ..Setup::default()
            },
            &[TodaysDate, CourseEndDate, VerificationDeadlineDate],
        );
    }

    #[test]
    fn test_selection_keeps_construction_order() {
        let scenario = Setup::default().build(frozen_now());
        let kinds: Vec<_> = select_blocks(&scenario.ctx()).iter().map(|b| b.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TodaysDate,
                CourseStartDate,
                CourseEndDate,
                VerifiedUpgradeDeadlineDate,
                VerificationDeadlineDate,
            ]
        );
    }

    #[test]
    fn test_sort_chronologically() {
        let scenario = Setup::default().build(frozen_now());
        let mut blocks = select_blocks(&scenario.ctx());
        sort_chronologically(&mut blocks);
        let kinds: Vec<_> = blocks.iter().map(|b| b.kind).collect();
        // today, start (+1), upgrade (+4), then end and verification (+14) in insertion order
        assert_eq!(
            kinds,
            vec![
                TodaysDate,
                CourseStartDate,
                VerifiedUpgradeDeadlineDate,
                CourseEndDate,
                VerificationDeadlineDate,
            ]
        );

        let mut with_undated = vec![
            DateSummary::blank(CourseEndDate, "end-date", None),
            DateSummary::todays_date(&scenario.ctx()),
        ];
        sort_chronologically(&mut with_undated);
        assert_eq!(with_undated[0].kind, TodaysDate);
    }

    // ── Individual blocks ──

    #[test]
    fn test_blank_block_defaults() {
        let block = DateSummary::blank(CourseStartDate, "", None);
        assert!(!block.is_enabled);
        assert_eq!(block.formatted_date(), None);
    }

    #[test]
    fn test_date_render() {
        let mut block = DateSummary::blank(CourseStartDate, "", None);
        block.date = Some(frozen_now());
        assert_eq!(block.formatted_date().as_deref(), Some("Jan 02, 2015"));
    }

    #[test]
    fn test_todays_date() {
        let scenario = Setup::default().build(frozen_now());
        let block = DateSummary::todays_date(&scenario.ctx());
        assert!(block.is_enabled);
        assert_eq!(block.date, Some(frozen_now()));
        assert_eq!(block.title, "Today is Jan 02, 2015");
        assert!(!block.show_date);
    }

    #[test]
    fn test_course_start_date() {
        let scenario = Setup::default().build(Utc::now());
        let block = DateSummary::course_start_date(&scenario.ctx());
        assert_eq!(block.date, scenario.course.start);
        assert!(block.is_enabled);
    }

    #[test]
    fn test_course_start_date_without_start() {
        let mut scenario = Setup::default().build(Utc::now());
        scenario.course.start = None;
        assert!(!DateSummary::course_start_date(&scenario.ctx()).is_enabled);
    }

    #[test]
    fn test_course_end_date_during_course() {
        let scenario = Setup {
            days_till_start: -1,
            ..Setup::default()
        }
        .build(Utc::now());
        let block = DateSummary::course_end_date(&scenario.ctx());
        assert_eq!(
            block.description,
            "To earn a certificate, you must complete all requirements before this date."
        );
    }

    #[test]
    fn test_course_end_date_after_course() {
        let scenario = Setup {
            days_till_start: -2,
            days_till_end: -1,
            ..Setup::default()
        }
        .build(Utc::now());
        let block = DateSummary::course_end_date(&scenario.ctx());
        assert_eq!(
            block.description,
            "This course is archived, which means you can review course content but it is no longer active."
        );
    }

    #[test]
    fn test_course_without_end_has_no_end_block() {
        let mut scenario = Setup::default().build(Utc::now());
        scenario.course.end = None;
        let block = DateSummary::course_end_date(&scenario.ctx());
        assert!(!block.is_enabled);
        assert_eq!(block.date, None);
    }

    #[test]
    fn test_verified_upgrade_deadline_date() {
        let scenario = Setup {
            days_till_upgrade_deadline: Some(1),
            ..Setup::default()
        }
        .build(frozen_now());
        let block = DateSummary::verified_upgrade_deadline_date(&scenario.ctx());
        assert_eq!(block.date, Some(frozen_now() + Duration::days(1)));
        assert_eq!(
            block.link,
            "/verify_student/upgrade/course-v1:edX+DemoX+run/"
        );
        assert!(block.is_enabled);
    }

    #[test]
    fn test_without_upgrade_deadline() {
        let scenario = Setup {
            enrollment_mode: None,
            ..Setup::default()
        }
        .build(Utc::now());
        let block = DateSummary::verified_upgrade_deadline_date(&scenario.ctx());
        assert_eq!(block.date, None);
        assert!(!block.is_enabled);
    }

    #[test]
    fn test_no_verification_deadline() {
        let scenario = Setup {
            days_till_start: -1,
            days_till_verification_deadline: None,
            ..Setup::default()
        }
        .build(Utc::now());
        assert!(!DateSummary::verification_deadline_date(&scenario.ctx()).is_enabled);
    }

    #[test]
    fn test_audit_mode() {
        let scenario = Setup {
            days_till_start: -1,
            enrollment_mode: Some(CourseModeSlug::Audit),
            ..Setup::default()
        }
        .build(Utc::now());
        assert!(!DateSummary::verification_deadline_date(&scenario.ctx()).is_enabled);
    }

    #[test]
    fn test_unknown_status_still_shows_deadline() {
        let scenario = Setup {
            days_till_start: -1,
            verification_status: VerificationStatus::Unknown,
            ..Setup::default()
        }
        .build(Utc::now());
        assert!(DateSummary::verification_deadline_date(&scenario.ctx()).is_enabled);
    }

    #[test]
    fn test_verification_deadline_date_upcoming() {
        let scenario = Setup {
            days_till_start: -1,
            ..Setup::default()
        }
        .build(frozen_now());
        let block = DateSummary::verification_deadline_date(&scenario.ctx());
        assert_eq!(block.state, "verification-deadline-upcoming");
        assert_eq!(block.title, "Verification Deadline");
        assert_eq!(block.date, Some(frozen_now() + Duration::days(14)));
        assert_eq!(
            block.description,
            "You must successfully complete verification before this date to qualify for a Verified Certificate."
        );
        assert_eq!(block.link_text, "Verify My Identity");
        assert_eq!(
            block.link,
            "/verify_student/verify-now/course-v1:edX+DemoX+run/"
        );
    }

    #[test]
    fn test_verification_deadline_date_retry() {
        let scenario = Setup {
            days_till_start: -1,
            verification_status: VerificationStatus::Denied,
            ..Setup::default()
        }
        .build(frozen_now());
        let block = DateSummary::verification_deadline_date(&scenario.ctx());
        assert_eq!(block.state, "verification-deadline-retry");
        assert_eq!(block.title, "Verification Deadline");
        assert_eq!(block.date, Some(frozen_now() + Duration::days(14)));
        assert_eq!(block.link_text, "Retry Verification");
        assert_eq!(block.link, "/verify_student/reverify");
    }

    #[test]
    fn test_verification_deadline_date_denied() {
        let scenario = Setup {
            days_till_start: -10,
            verification_status: VerificationStatus::Denied,
            days_till_verification_deadline: Some(-1),
            ..Setup::default()
        }
        .build(frozen_now());
        let block = DateSummary::verification_deadline_date(&scenario.ctx());
        assert_eq!(block.state, "verification-deadline-passed");
        assert_eq!(block.title, "Missed Verification Deadline");
        assert_eq!(block.date, Some(frozen_now() - Duration::days(1)));
        assert_eq!(
            block.description,
            "Unfortunately you missed this course's deadline for a successful verification."
        );
        assert_eq!(block.link_text, "Learn More");
        assert_eq!(block.link, "");
    }

    #[test]
    fn test_verification_state_flips_at_deadline_instant() {
        let mut scenario = Setup {
            days_till_start: -1,
            ..Setup::default()
        }
        .build(frozen_now());

        scenario.verification_deadline = Some(frozen_now() + Duration::nanoseconds(1));
        assert_eq!(
            verification_deadline_state(&scenario.ctx()),
            VerificationDeadlineState::Upcoming
        );

        scenario.verification_deadline = Some(frozen_now());
        assert_eq!(
            verification_deadline_state(&scenario.ctx()),
            VerificationDeadlineState::Passed
        );
    }
}
