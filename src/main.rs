use clap::{Parser, Subcommand};
use colored::Colorize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use lumi_pg_reporter::report::json::{self, ReportedOutcome, RunSummary};
use lumi_pg_reporter::report::naming::normalize_test_name;
use lumi_pg_reporter::store::{migrations, PgResultStore};
use lumi_pg_reporter::utils::config::{ReporterOptions, DATABASE_URL_ENV};
use lumi_pg_reporter::{PostgresReporter, Reporter, TestStatus};

#[derive(Parser)]
#[command(name = "lumi-pg-reporter")]
#[command(author = "NL Team")]
#[command(version = "0.1.3")]
#[command(about = "Persist end-to-end test results into PostgreSQL", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply SQL migrations (run once, not from concurrent runners)
    Migrate {
        /// PostgreSQL connection url (falls back to DATABASE_URL)
        #[arg(long)]
        database_url: Option<String>,

        /// Directory of *.sql files, applied in name order
        #[arg(short, long, default_value = "./migrations")]
        dir: PathBuf,
    },

    /// Record a run file into a new test session
    Record {
        /// Path to the run JSON (list of finished tests)
        results: PathBuf,

        /// Reporter options file (YAML or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// PostgreSQL connection url (overrides the config file)
        #[arg(long)]
        database_url: Option<String>,

        /// Environment label stored on the session
        #[arg(short, long)]
        environment: Option<String>,

        /// Commit id (resolved with git when omitted)
        #[arg(long)]
        commit: Option<String>,

        /// Session metadata as key=value, can be specified multiple times
        #[arg(short, long, value_parser = parse_key_value)]
        meta: Vec<(String, String)>,

        /// Write the run summary JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected key=value, got '{}'", s))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Migrate { database_url, dir } => {
            let url = database_url
                .or_else(|| std::env::var(DATABASE_URL_ENV).ok())
                .ok_or_else(|| anyhow::anyhow!("No database url (use --database-url or DATABASE_URL)"))?;

            println!(
                "{} Applying migrations from: {}",
                "▶".green().bold(),
                dir.display()
            );
            let store = PgResultStore::connect_lazy(&url, 1)?;
            let applied = migrations::run_migrations(store.pool(), &dir).await?;
            println!("{} Applied {} migration(s)", "✅".green(), applied);
        }

        Commands::Record {
            results,
            config,
            database_url,
            environment,
            commit,
            meta,
            output,
        } => {
            let mut options = match config {
                Some(path) => ReporterOptions::from_file(&path)?,
                None => ReporterOptions::default(),
            };
            if let Some(url) = database_url {
                options.connection_url = url;
            }
            options.apply_env(std::env::var(DATABASE_URL_ENV).ok());
            if environment.is_some() {
                options.environment = environment;
            }
            if commit.is_some() {
                options.commit_id = commit;
            }
            if !meta.is_empty() {
                options
                    .metadata
                    .get_or_insert_with(BTreeMap::new)
                    .extend(meta);
            }

            let run = json::load_run(&results)?;
            println!(
                "{} Recording {} test(s) from: {}",
                "▶".green().bold(),
                run.tests.len(),
                results.display()
            );
            if let Some(ref env) = options.environment {
                println!("  Environment: {}", env.cyan());
            }

            let mut reporter = PostgresReporter::connect(options)?;

            let mut handles = Vec::with_capacity(run.tests.len());
            for recorded in run.tests {
                let original = recorded.result.status;
                let name = normalize_test_name(&recorded.test.title_path);
                let result = recorded.result.shared();
                reporter.on_test_end(recorded.test, result.clone());
                handles.push((name, original, result));
            }

            let session_id = match reporter.finalize().await {
                Ok(id) => id,
                Err(e) => {
                    println!("{} Reporting failed: {}", "❌".red(), e);
                    std::process::exit(2);
                }
            };

            let mut outcomes = Vec::with_capacity(handles.len());
            for (test_name, original, result) in handles {
                let status = result.read().await.status;
                let downgraded = status != original;
                let label = match status {
                    TestStatus::Passed => status.to_string().green(),
                    TestStatus::Skipped if downgraded => {
                        format!("{} (was {})", status, original).yellow()
                    }
                    TestStatus::Skipped => status.to_string().yellow(),
                    _ => status.to_string().red(),
                };
                println!("  {} {}", label, test_name);
                outcomes.push(ReportedOutcome {
                    test_name,
                    status,
                    downgraded,
                });
            }

            let summary = RunSummary {
                session_id,
                outcomes,
            };
            println!("  Session: {}", summary.session_id.cyan());
            json::write_summary(&summary, output.as_deref()).await?;

            if !summary.passed() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
