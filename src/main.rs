use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use clap::{ArgGroup, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

mod aggregate;
mod batch;
mod classify;
mod db;
mod error;
mod models;
mod prospectus;
mod report;
mod status;

use aggregate::{EvaluationSort, SortField};
use models::{CourseRecord, Semester};

#[derive(Parser)]
#[command(name = "prospectus-evaluator")]
#[command(about = "Curriculum prospectus and transfer credit evaluation tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load a demo curriculum catalog and demo students
    Seed,
    /// Copy a program's catalog into a student's prospectus
    Enroll {
        #[arg(long)]
        program: String,
        #[arg(long)]
        student: String,
    },
    /// List a student's prospectus grouped by year and semester
    Prospectus {
        #[arg(long)]
        student: String,
        #[arg(long)]
        program: String,
    },
    /// Toggle a single subject's passed status immediately
    SetStatus {
        #[arg(long)]
        student: String,
        #[arg(long)]
        program: String,
        #[arg(long)]
        year: i16,
        #[arg(long)]
        semester: Semester,
        #[arg(long)]
        code: String,
        #[arg(long, action = clap::ArgAction::Set)]
        passed: bool,
    },
    /// Apply status toggles from a CSV and commit them in one batch
    SaveAll {
        #[arg(long)]
        student: String,
        #[arg(long)]
        program: String,
        #[arg(long)]
        csv: PathBuf,
    },
    /// Reset every subject in a student's prospectus to not passed
    ResetAll {
        #[arg(long)]
        student: String,
        #[arg(long)]
        program: String,
    },
    /// Record an evaluation from extracted course records
    Evaluate {
        #[arg(long)]
        student: String,
        #[arg(long)]
        evaluator: String,
        #[arg(long)]
        csv: PathBuf,
    },
    /// List evaluation history; repeat --sort to flip the direction
    #[command(group(
        ArgGroup::new("scope")
            .args(["email", "evaluator"])
            .multiple(false)
    ))]
    History {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        evaluator: Option<String>,
        #[arg(long = "sort")]
        sort: Vec<SortField>,
    },
    /// Generate a markdown report over the evaluation history
    #[command(group(
        ArgGroup::new("scope")
            .args(["email", "evaluator"])
            .multiple(false)
    ))]
    Report {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        evaluator: Option<String>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn read_status_csv(path: &Path) -> anyhow::Result<Vec<status::StatusToggle>> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        year: i16,
        semester: String,
        code: String,
        passed: bool,
    }

    let mut reader = csv::Reader::from_path(path)?;
    let mut toggles = Vec::new();

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        toggles.push(status::StatusToggle {
            year: models::validate_year(row.year)?,
            semester: row.semester.parse()?,
            code: row.code,
            passed: row.passed,
        });
    }

    Ok(toggles)
}

fn read_course_csv(path: &Path) -> anyhow::Result<Vec<CourseRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut courses = Vec::new();
    for result in reader.deserialize::<CourseRecord>() {
        courses.push(result?);
    }
    Ok(courses)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("prospectus_evaluator=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed catalog and students inserted.");
        }
        Commands::Enroll { program, student } => {
            let summary = prospectus::initialize(&pool, &program, &student).await?;
            println!(
                "Prospectus initialized for {student}: {} write(s) across {} chunk commit(s).",
                summary.ops, summary.chunks
            );
        }
        Commands::Prospectus { student, program } => {
            if !db::is_initialized(&pool, &student, &program).await? {
                println!("Student {student} has no prospectus for {program} yet. Run enroll first.");
                return Ok(());
            }

            let record = db::get_student(&pool, &student).await?;
            let subjects = db::list_subjects(&pool, &student, &program).await?;
            let stats = aggregate::compute_completion(&subjects);

            println!(
                "Prospectus for {} ({}), {}",
                record.full_name, record.id, record.course
            );
            for year_group in aggregate::group_by_year_then_semester(&subjects) {
                for semester_group in year_group.semesters {
                    println!("Year {}, {}", year_group.year, semester_group.semester);
                    for subject in semester_group.subjects {
                        println!(
                            "  [{}] {:<8} {} ({} units)",
                            if subject.passed { "x" } else { " " },
                            subject.code,
                            subject.description,
                            subject.units
                        );
                    }
                }
            }
            println!(
                "Completed {} of {} subjects ({}%).",
                stats.passed_count, stats.total, stats.percentage
            );
        }
        Commands::SetStatus {
            student,
            program,
            year,
            semester,
            code,
            passed,
        } => {
            let year = models::validate_year(year)?;
            db::update_subject_status(&pool, &student, &program, year, semester, &code, passed)
                .await?;
            let subject =
                db::get_subject(&pool, &student, &program, year, semester, &code).await?;
            println!(
                "{} {} marked {}.",
                subject.code,
                subject.description,
                if subject.passed { "passed" } else { "not passed" }
            );
        }
        Commands::SaveAll {
            student,
            program,
            csv,
        } => {
            let subjects = db::list_subjects(&pool, &student, &program).await?;
            let toggles = read_status_csv(&csv)?;
            let edited = status::apply_toggles(subjects, &toggles);
            let summary = status::save_all(&pool, &student, &edited).await?;
            println!(
                "Saved {} status(es) across {} chunk commit(s).",
                summary.ops, summary.chunks
            );
        }
        Commands::ResetAll { student, program } => {
            let subjects = db::list_subjects(&pool, &student, &program).await?;
            let summary = status::reset_all(&pool, &student, &subjects).await?;
            println!(
                "Reset {} subject(s) across {} chunk commit(s).",
                summary.ops, summary.chunks
            );
        }
        Commands::Evaluate {
            student,
            evaluator,
            csv,
        } => {
            let record = db::get_student(&pool, &student).await?;
            let courses = read_course_csv(&csv)?;
            let result = classify::classify(courses.clone());
            if result.is_empty() {
                println!("No course records found in {}; nothing recorded.", csv.display());
                return Ok(());
            }

            let evaluation = models::EvaluationRecord {
                id: Uuid::new_v4(),
                student_id: record.id,
                student_name: record.full_name,
                email: record.email,
                course: record.course,
                year_level: record.year_level,
                evaluation_date: Utc::now(),
                evaluator_name: evaluator,
                courses,
            };
            db::insert_evaluation(&pool, &evaluation).await?;

            println!(
                "Evaluation recorded for {}: {} course(s), {} passed, {} failed, {} not credited.",
                evaluation.student_name,
                result.len(),
                result.passed.len(),
                result.failed.len(),
                result.not_credited.len()
            );
            for course in &result.not_credited {
                println!("  not credited: {} {}", course.code, course.description);
            }
        }
        Commands::History {
            email,
            evaluator,
            sort,
        } => {
            let mut records =
                db::fetch_evaluations(&pool, email.as_deref(), evaluator.as_deref()).await?;

            // Each --sort is one header click: repeats flip the
            // direction, a new field starts ascending again.
            let mut order: Option<EvaluationSort> = None;
            for field in sort {
                match order {
                    None => order = Some(EvaluationSort::new(field)),
                    Some(ref mut order) => order.toggle(field),
                }
            }
            let order = order.unwrap_or_else(|| EvaluationSort::new(SortField::EvaluationDate));
            tracing::debug!(
                field = ?order.field(),
                direction = ?order.direction(),
                "history ordering"
            );
            order.sort(&mut records);

            if records.is_empty() {
                println!("No evaluations on record for this scope.");
                return Ok(());
            }
            for record in &records {
                let summary = report::summarize_outcomes(std::slice::from_ref(record));
                println!(
                    "- {} ({}, year {}) evaluated by {} on {}: {} passed / {} failed / {} not credited",
                    record.student_name,
                    record.email,
                    record.year_level,
                    record.evaluator_name,
                    record.evaluation_date.format("%Y-%m-%d"),
                    summary.passed,
                    summary.failed,
                    summary.not_credited
                );
            }
        }
        Commands::Report {
            email,
            evaluator,
            out,
        } => {
            let records =
                db::fetch_evaluations(&pool, email.as_deref(), evaluator.as_deref()).await?;
            let scope = email.as_deref().or(evaluator.as_deref());
            let report = report::build_report(scope, &records);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
