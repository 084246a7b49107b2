//! # Classify Subcommand
//!
//! Runs the same triage a complaint gets at intake, without a server.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;

use civic_core::{classify, sla_deadline, sla_hours, Severity, Triage, TriageOverrides};

/// Arguments for `civic classify`.
#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Complaint title.
    #[arg(long)]
    pub title: String,

    /// Complaint description.
    #[arg(long, default_value = "")]
    pub description: String,

    /// Override the inferred category.
    #[arg(long)]
    pub category: Option<String>,

    /// Override the inferred severity (LOW, MEDIUM, HIGH, CRITICAL).
    #[arg(long)]
    pub severity: Option<String>,

    /// Override the routing department.
    #[arg(long)]
    pub department: Option<String>,

    /// Emit JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct Report {
    #[serde(flatten)]
    triage: Triage,
    sla_hours: i64,
    sla_deadline: DateTime<Utc>,
}

fn report(args: &ClassifyArgs, now: DateTime<Utc>) -> Result<Report> {
    let severity = args
        .severity
        .as_deref()
        .map(str::parse::<Severity>)
        .transpose()
        .context("invalid --severity")?;
    let triage = classify(&args.title, &args.description).with_overrides(TriageOverrides {
        category: args.category.clone(),
        severity,
        department: args.department.clone(),
    });
    Ok(Report {
        sla_hours: sla_hours(triage.severity),
        sla_deadline: sla_deadline(triage.severity, now),
        triage,
    })
}

/// Render the triage result as text or JSON.
pub fn render(args: &ClassifyArgs, now: DateTime<Utc>) -> Result<String> {
    let r = report(args, now)?;
    if args.json {
        return serde_json::to_string_pretty(&r).context("failed to encode report");
    }
    Ok(format!(
        "category:    {}\nseverity:    {}\ndepartment:  {}\nsla:         {}h (due {})",
        r.triage.category,
        r.triage.severity,
        r.triage.department,
        r.sla_hours,
        r.sla_deadline.to_rfc3339()
    ))
}

pub fn run_classify(args: &ClassifyArgs) -> Result<u8> {
    println!("{}", render(args, Utc::now())?);
    Ok(0)
}
