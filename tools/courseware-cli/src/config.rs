use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::ecommerce::{EcommerceConfig, DEFAULT_TOKEN_TTL};

#[derive(Debug, Parser)]
#[command(name = "courseware", about = "Course dates, refund windows and enrollment tools")]
pub struct Cli {
    /// Root URL of the LMS, used to build links.
    #[arg(long, env = "LMS_ROOT_URL", default_value = "")]
    pub lms_root: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the date summary blocks that apply to the snapshot's course.
    Dates {
        #[arg(long)]
        snapshot: PathBuf,
        /// Order blocks by date instead of by kind.
        #[arg(long)]
        chronological: bool,
    },
    /// Resolve the refund window and refundability of the learner's enrollment.
    Refund {
        #[arg(long)]
        snapshot: PathBuf,
        #[command(flatten)]
        ecommerce: EcommerceArgs,
    },
    /// Enroll in or unenroll from a course.
    Enroll {
        #[arg(long)]
        snapshot: PathBuf,
        /// `enroll` or `unenroll`.
        #[arg(long, default_value = "enroll")]
        action: String,
        /// Defaults to the snapshot's course.
        #[arg(long)]
        course_id: Option<String>,
        #[arg(long)]
        email_opt_in: Option<bool>,
        /// ISO country code the request comes from.
        #[arg(long)]
        country: Option<String>,
        /// Write the updated enrollments back to the snapshot.
        #[arg(long)]
        save: bool,
    },
    /// Print the enrollment report rows for the snapshot's learner.
    Report {
        #[arg(long)]
        snapshot: PathBuf,
    },
}

#[derive(Debug, Clone, Args)]
pub struct EcommerceArgs {
    /// API root of the e-commerce service.
    #[arg(long = "ecommerce-api-url", env = "ECOMMERCE_API_URL")]
    pub api_url: String,

    /// Shared secret used to sign JWTs for the e-commerce service.
    #[arg(long = "ecommerce-signing-key", env = "ECOMMERCE_API_SIGNING_KEY", hide_env_values = true)]
    pub signing_key: String,

    /// Request timeout in seconds.
    #[arg(long = "ecommerce-timeout-secs", env = "ECOMMERCE_TIMEOUT_SECS", default_value_t = 5)]
    pub timeout_secs: u64,
}

impl EcommerceArgs {
    pub fn config(&self) -> EcommerceConfig {
        EcommerceConfig {
            api_url: self.api_url.clone(),
            signing_key: self.signing_key.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            token_ttl: DEFAULT_TOKEN_TTL,
        }
    }
}
