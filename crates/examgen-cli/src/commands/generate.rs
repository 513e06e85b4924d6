//! The `examgen generate` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use examgen_core::composer::{ComposedExam, ExamComposer, ProgressReporter, Relaxation};
use examgen_core::plan::{parse_plan, seed_from_str, validate_plan, ExamPlan};
use examgen_core::report::GenerationReport;
use examgen_core::session::{ExamSession, Schedule, SessionOutcome};
use examgen_io::settings::{load_settings_from, ExamgenSettings};
use examgen_io::signups::{read_slotted_signups, read_student_list};
use examgen_report::latex::RenderOptions;
use examgen_report::output::write_session_documents;

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_exam_start(&self, student_id: &str, exam_type: &str) {
        eprintln!("  Composing: {exam_type} :: {student_id}");
    }

    fn on_exam_complete(&self, exam: &ComposedExam) {
        let ids: Vec<&str> = exam.questions.iter().map(|q| q.id.as_str()).collect();
        let status = if exam.reused { " (from history)" } else { "" };
        eprintln!("  Done: {} [{}]{status}", exam.student_id, ids.join(", "));
    }

    fn on_relaxation(&self, r: &Relaxation) {
        eprintln!(
            "  Relaxed: {} :: {} / {} -> {} (tier {})",
            r.student_id, r.topic, r.difficulty, r.question_id, r.tier
        );
    }
}

/// Build the schedule an exam plan's signups describe.
fn load_schedule(settings: &ExamgenSettings, plan: &ExamPlan, today: NaiveDate) -> Result<Schedule> {
    let Some(signups) = &plan.signups else {
        anyhow::bail!("exam plan has no 'signups:' file");
    };
    let path = settings.data_path(&signups.path);
    if signups.slotted {
        read_slotted_signups(&path, plan.generate_up_to_from(today))
    } else {
        read_student_list(&path, plan.exam_date.unwrap_or(today))
    }
}

pub fn execute(
    settings_path: Option<PathBuf>,
    plan_path: PathBuf,
    seed: Option<String>,
    output: Option<PathBuf>,
    today: Option<NaiveDate>,
) -> Result<()> {
    let settings = load_settings_from(settings_path.as_deref())?;
    let plan = parse_plan(&plan_path)?;
    for w in validate_plan(&plan) {
        let prefix = w
            .directive
            .as_ref()
            .map(|d| format!("[{d}] "))
            .unwrap_or_default();
        eprintln!("Warning: {prefix}{}", w.message);
    }

    let pool = super::load_plan_pool(&settings, &plan, &plan_path)?;
    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let schedule = load_schedule(&settings, &plan, today)?;
    if schedule.is_empty() {
        println!("No exams scheduled; nothing to generate.");
        return Ok(());
    }

    let store = settings.history_store();
    let mut history = store.load_latest()?;

    let seed = seed.as_deref().map(seed_from_str).unwrap_or_else(|| plan.seed());
    tracing::debug!(seed, "seeding generator");
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let config = plan.session_config();
    let groups = plan.groups();
    let session = ExamSession::new(ExamComposer::new(&pool, &config, &groups));

    eprintln!(
        "examgen v{}: {} {}, {} booking(s) across {} day(s)",
        env!("CARGO_PKG_VERSION"),
        plan.course,
        plan.exam_type,
        schedule.len(),
        schedule.dates().count()
    );

    let outcome = session
        .generate(&schedule, &mut history, &mut rng, &ConsoleReporter)
        .with_context(|| format!("generation of '{}' exams aborted; history not saved", plan.exam_type))?;

    print_summary(&outcome);

    if outcome.composed_count() > 0 {
        let path = store.save(&history)?;
        eprintln!("History saved to: {}", path.display());
    }

    let out_dir = output.unwrap_or_else(|| settings.output_dir.clone());
    let opts = RenderOptions {
        images_dir: settings.images_dir.clone(),
        rubric: plan.rubric.clone(),
    };
    let written = write_session_documents(
        &out_dir,
        &plan.course,
        &plan.exam_type,
        &outcome.exams,
        plan.layout,
        &opts,
    )?;
    for path in &written {
        eprintln!("Wrote: {}", path.display());
    }

    let report = GenerationReport::from_outcome(&plan.course, &plan.exam_type, seed, &outcome);
    let timestamp = report.created_at.format("%Y-%m-%dT%H%M%S");
    let report_path = out_dir.join(format!("report-{timestamp}.json"));
    report.save_json(&report_path)?;
    eprintln!("Report saved to: {}", report_path.display());

    Ok(())
}

fn print_summary(outcome: &SessionOutcome) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Date", "Time", "Student", "Questions", "Status"]);

    for exam in &outcome.exams {
        let status = if exam.is_placeholder() {
            "empty"
        } else if exam.reused {
            "reused"
        } else {
            "new"
        };
        let ids: Vec<&str> = exam.questions.iter().map(|q| q.id.as_str()).collect();
        table.add_row(vec![
            Cell::new(exam.date.format("%Y-%m-%d %a")),
            Cell::new(&exam.time),
            Cell::new(&exam.student_id),
            Cell::new(ids.join(", ")),
            Cell::new(status),
        ]);
    }

    eprintln!("\n{table}");
    eprintln!(
        "{} composed, {} reused, {} relaxation(s)",
        outcome.composed_count(),
        outcome.reused_count(),
        outcome.relaxations.len()
    );
}
