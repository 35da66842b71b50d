use anyhow::{Context, Result};
use clap::Parser;
use courseware_common::enrollment::EnrollmentRequest;
use courseware_common::urls::LmsUrls;
use courseware_cli::commands;
use courseware_cli::config::{Cli, Command};
use courseware_cli::ecommerce::EcommerceClient;
use courseware_cli::snapshot::Snapshot;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("encoding output")?;
    println!("{out}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let urls = LmsUrls::new(&cli.lms_root);

    match cli.command {
        Command::Dates {
            snapshot,
            chronological,
        } => {
            let snap = Snapshot::load(&snapshot)?;
            print_json(&commands::date_summary(&snap, &urls, chronological))
        }
        Command::Refund {
            snapshot,
            ecommerce,
        } => {
            let snap = Snapshot::load(&snapshot)?;
            let client = EcommerceClient::for_user(&ecommerce.config(), &snap.user)?;
            print_json(&commands::refund_report(&snap, &client).await?)
        }
        Command::Enroll {
            snapshot,
            action,
            course_id,
            email_opt_in,
            country,
            save,
        } => {
            let mut snap = Snapshot::load(&snapshot)?;
            let request = EnrollmentRequest {
                action,
                course_id: Some(course_id.unwrap_or_else(|| snap.course.id.to_string())),
                email_opt_in: email_opt_in.map(|v| v.to_string()),
            };
            let outcome = commands::change_enrollment(&mut snap, &urls, &request, country.as_deref())?;
            if save {
                snap.save(&snapshot)?;
                tracing::info!(path = %snapshot.display(), "saved snapshot");
            }
            print_json(&outcome)
        }
        Command::Report { snapshot } => {
            let snap = Snapshot::load(&snapshot)?;
            print_json(&commands::learner_report(&snap)?)
        }
    }
}
