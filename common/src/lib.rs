pub mod certificate;
pub mod course;
pub mod course_mode;
pub mod date_summary;
pub mod embargo;
pub mod enrollment;
pub mod identity;
pub mod order;
pub mod refund;
pub mod report;
pub mod urls;
pub mod verification;
