use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use tracing::debug;

use quarterly_grades::config::Config;
use quarterly_grades::models::{Quarter, Remarks, Subject};
use quarterly_grades::roster::{GradeSource, Roster, StudentFilter};
use quarterly_grades::session::Session;
use quarterly_grades::{grades, report};

#[derive(Parser)]
#[command(name = "quarterly-grades")]
#[command(about = "Quarterly grade averages, final marks and reports", long_about = None)]
struct Cli {
    /// Roster CSV to use instead of the built-in sample data
    #[arg(long, global = true)]
    roster: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Csv,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Show one quarter's grades with pass/fail status
    Quarter {
        #[arg(long)]
        student: String,
        #[arg(long, default_value = "q1")]
        quarter: Quarter,
    },
    /// Show the final mark (average of quarter averages)
    Final {
        #[arg(long)]
        student: String,
    },
    /// Show one subject's score across quarters
    Trend {
        #[arg(long)]
        student: String,
        #[arg(long)]
        subject: Subject,
    },
    /// Show study suggestions for a quarter
    Suggest {
        #[arg(long)]
        student: String,
        #[arg(long)]
        quarter: Option<Quarter>,
    },
    /// Search students by name or email
    Search {
        #[arg(default_value = "")]
        term: String,
        #[arg(long)]
        grade_level: Option<u8>,
        /// Enrollment status, e.g. active or inactive
        #[arg(long)]
        status: Option<String>,
        /// passed, failed or incomplete
        #[arg(long)]
        remarks: Option<Remarks>,
    },
    /// Generate a markdown report
    Report {
        #[arg(long)]
        student: String,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Export every student's final mark
    Export {
        #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Check a login and print the resulting session
    #[command(group(
        ArgGroup::new("identity")
            .args(["admin", "email"])
            .required(true)
            .multiple(false)
    ))]
    Login {
        #[arg(long)]
        admin: Option<String>,
        #[arg(long, requires = "admin")]
        password: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        name: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().with_roster(cli.roster);

    let roster = match &config.roster {
        Some(path) => Roster::load_csv(path)?,
        None => {
            debug!("no roster configured, using sample data");
            Roster::sample()?
        }
    };

    match cli.command {
        Commands::Quarter { student, quarter } => {
            let profile = roster.student(&student)?;
            let sheet = roster.sheet(&student)?;
            let record = sheet
                .period(quarter)
                .with_context(|| format!("{} has no grades for {quarter}", profile.name))?;

            println!("{}'s grades for {quarter}:", profile.name);
            for (subject, score) in record.iter() {
                println!(
                    "- {subject}: {} {}",
                    score.value(),
                    grades::classify(score.value())
                );
            }
            let average = grades::average_of(record)?;
            println!(
                "Average {average:.1} {} ({})",
                grades::classify(average),
                grades::band(average)
            );
        }
        Commands::Final { student } => {
            let profile = roster.student(&student)?;
            let sheet = roster.sheet(&student)?;
            for period in sheet.periods() {
                println!("- {}: {:.1}", period.quarter, grades::average_of(period)?);
            }
            let mark = grades::final_mark(sheet)?;
            println!(
                "{} final mark {mark:.1} {} ({})",
                profile.name,
                grades::classify(mark),
                grades::band(mark)
            );
        }
        Commands::Trend { student, subject } => {
            let sheet = roster.sheet(&student)?;
            let trend = grades::subject_trend(sheet, subject)?;
            let points: Vec<String> = sheet
                .periods()
                .iter()
                .zip(&trend)
                .map(|(period, score)| format!("{} {score}", period.quarter))
                .collect();
            println!("{subject}: {}", points.join(", "));
            println!("Average {:.1}", grades::subject_average(sheet, subject)?);
        }
        Commands::Suggest { student, quarter } => {
            let sheet = roster.sheet(&student)?;
            let record = match quarter {
                Some(quarter) => sheet.period(quarter),
                None => sheet.periods().last(),
            }
            .context("no grades recorded for that quarter")?;

            let suggestions = grades::suggest(record);
            if suggestions.is_empty() {
                println!("No subjects below 80 in {}.", record.quarter);
                return Ok(());
            }
            for (subject, score) in &suggestions.failing {
                println!("- {subject} ({score}): failing, focus here first");
            }
            for (subject, score) in &suggestions.needs_improvement {
                println!("- {subject} ({score}): needs improvement");
            }
        }
        Commands::Search {
            term,
            grade_level,
            status,
            remarks,
        } => {
            let matches = roster.filter(&StudentFilter {
                term,
                grade_level,
                status,
                remarks,
            });

            if matches.is_empty() {
                println!("No students found.");
                return Ok(());
            }
            for student in matches {
                println!(
                    "- [{}] {} ({}, grade {}, {}, {})",
                    student.id,
                    student.name,
                    student.email,
                    student.grade_level,
                    student.status,
                    roster.remarks(&student.id)
                );
            }
        }
        Commands::Report { student, out } => {
            let profile = roster.student(&student)?;
            let sheet = roster.sheet(&student)?;
            let markdown = report::build_report(profile, sheet);
            std::fs::write(&out, markdown)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Export { format, out } => {
            let body = match format {
                ExportFormat::Csv => {
                    let mut buffer = Vec::new();
                    report::export_csv(&mut buffer, &roster)?;
                    String::from_utf8(buffer)?
                }
                ExportFormat::Json => report::export_json(&roster)?,
            };
            match out {
                Some(path) => {
                    std::fs::write(&path, body)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("Export written to {}.", path.display());
                }
                None => print!("{body}"),
            }
        }
        Commands::Login {
            admin,
            password,
            email,
            name,
        } => {
            let session = match (admin, email) {
                (Some(username), _) => Session::login_admin(
                    config.admin.as_ref(),
                    &username,
                    password.as_deref().unwrap_or_default(),
                )?,
                (None, Some(email)) => Session::login_student(&roster, &email, name.as_deref())?,
                (None, None) => anyhow::bail!("either --admin or --email is required"),
            };
            println!("{}", serde_json::to_string_pretty(&session)?);
            session.logout();
        }
    }

    Ok(())
}
