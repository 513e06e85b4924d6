//! examgen CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "examgen", version, about = "Personalized exam generator")]
struct Cli {
    /// Settings file (defaults to ./examgen.toml, then ~/.config/examgen/config.toml)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose exams for everyone signed up and render the documents
    Generate {
        /// Exam plan file
        #[arg(long)]
        plan: PathBuf,

        /// Random seed, overriding the plan's `random seed:`
        #[arg(long)]
        seed: Option<String>,

        /// Output directory, overriding the settings file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Treat this date (YYYY-MM-DD) as today
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// Check an exam plan against the question bank and history
    Validate {
        /// Exam plan file
        #[arg(long)]
        plan: PathBuf,

        /// Treat this date (YYYY-MM-DD) as today
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// Render every question in the bank, grouped by topic and difficulty
    Bank {
        /// Exam plan file (for the questions file and course name)
        #[arg(long)]
        plan: PathBuf,

        /// Output directory, overriding the settings file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Swap one question on a recorded exam
    Replace {
        /// Exam plan file (for the questions file and exam type)
        #[arg(long)]
        plan: PathBuf,

        /// Student id
        #[arg(long)]
        student: String,

        /// Question id to take off the exam
        #[arg(long)]
        old: String,

        /// Question id to put in its place
        #[arg(long)]
        new: String,

        /// Exam type (defaults to the plan's)
        #[arg(long)]
        exam_type: Option<String>,
    },

    /// Delete a recorded exam so it is composed again next run
    Remove {
        /// Student id
        #[arg(long)]
        student: String,

        /// Exam type
        #[arg(long)]
        exam_type: String,
    },

    /// Create starter settings, exam plan and question bank
    Init,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("examgen=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let settings = cli.settings;

    let result = match cli.command {
        Commands::Generate {
            plan,
            seed,
            output,
            today,
        } => commands::generate::execute(settings, plan, seed, output, today),
        Commands::Validate { plan, today } => commands::validate::execute(settings, plan, today),
        Commands::Bank { plan, output } => commands::bank::execute(settings, plan, output),
        Commands::Replace {
            plan,
            student,
            old,
            new,
            exam_type,
        } => commands::replace::execute(settings, plan, student, old, new, exam_type),
        Commands::Remove { student, exam_type } => {
            commands::remove::execute(settings, student, exam_type)
        }
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
