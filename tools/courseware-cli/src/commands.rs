//! What each subcommand computes, separated from argument parsing and output.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use courseware_common::course::CourseId;
use courseware_common::date_summary::{select_blocks, sort_chronologically, DateSummary};
use courseware_common::enrollment::{
    within_refund_window, EnrollmentDesk, EnrollmentOutcome, EnrollmentRequest,
};
use courseware_common::order::{OrderLookup, OrderNumber};
use courseware_common::report::{EnrollmentReportProvider, ReportRow};
use courseware_common::urls::LmsUrls;
use serde::Serialize;

use crate::snapshot::Snapshot;

pub fn date_summary(snapshot: &Snapshot, urls: &LmsUrls, chronological: bool) -> Vec<DateSummary> {
    let ctx = snapshot.date_context(urls, snapshot.now());
    let mut blocks = select_blocks(&ctx);
    if chronological {
        sort_chronologically(&mut blocks);
    }
    blocks
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefundReport {
    pub course_id: CourseId,
    pub order_number: Option<OrderNumber>,
    pub refund_window_end: Option<DateTime<Utc>>,
    pub refundable: bool,
}

/// Decides refundability, fetching the order only when the decision needs
/// the window. When the decision is already made, the window end is reported
/// on a best-effort basis and a failed lookup leaves it unknown.
pub async fn refund_report<L: OrderLookup>(snapshot: &Snapshot, orders: &L) -> Result<RefundReport> {
    let enrollment = snapshot.enrollment().ok_or_else(|| {
        anyhow!(
            "user {} is not enrolled in {}",
            snapshot.user.username,
            snapshot.course.id
        )
    })?;
    let config = snapshot.refund_configuration();
    let now = snapshot.now();

    let (refundable, refund_window_end) =
        match enrollment.refund_precheck(&snapshot.refund_facts(&config)) {
            Some(decided) => {
                let end = enrollment
                    .refund_window_end_date(orders, &config)
                    .await
                    .unwrap_or_else(|e| {
                        tracing::warn!(error = %e, "refund window unknown; decision does not need it");
                        None
                    });
                (decided, end)
            }
            None => {
                let end = enrollment
                    .refund_window_end_date(orders, &config)
                    .await
                    .context("resolving refund window")?;
                (within_refund_window(end, now), end)
            }
        };

    Ok(RefundReport {
        course_id: enrollment.course_id().clone(),
        order_number: enrollment.order_number(),
        refund_window_end,
        refundable,
    })
}

/// Applies an enroll/unenroll request to the snapshot's enrollments.
pub fn change_enrollment(
    snapshot: &mut Snapshot,
    urls: &LmsUrls,
    request: &EnrollmentRequest,
    country: Option<&str>,
) -> Result<EnrollmentOutcome> {
    let catalog = snapshot.catalog();
    let now = snapshot.now();
    let desk = EnrollmentDesk {
        courses: &catalog,
        modes: &snapshot.modes,
        embargo: &snapshot.embargo,
        urls,
    };
    let outcome = desk.change_enrollment(
        &mut snapshot.enrollments,
        snapshot.user.id,
        request,
        country,
        now,
    )?;
    Ok(outcome)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LearnerReport {
    pub profile: ReportRow,
    pub enrollment: ReportRow,
    pub payment: ReportRow,
}

pub fn learner_report(snapshot: &Snapshot) -> Result<LearnerReport> {
    let provider = snapshot.report_provider();
    let user = &snapshot.user;
    let course_id = &snapshot.course.id;
    Ok(LearnerReport {
        profile: provider.user_profile(user.id)?,
        enrollment: provider.enrollment_info(user, course_id)?,
        payment: provider.payment_info(user, course_id)?,
    })
}
