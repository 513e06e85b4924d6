//! The `examgen validate` command.

use std::path::PathBuf;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use comfy_table::{Cell, Table};

use examgen_core::composer::{ExamComposer, StudentGroups};
use examgen_core::history::History;
use examgen_core::plan::{parse_plan, validate_plan};
use examgen_core::pool::QuestionPool;
use examgen_io::settings::load_settings_from;

/// Question ids listed in the exposure table.
const TOP_EXPOSURES: usize = 10;

pub fn execute(settings_path: Option<PathBuf>, plan_path: PathBuf, today: Option<NaiveDate>) -> Result<()> {
    let settings = load_settings_from(settings_path.as_deref())?;
    let plan = parse_plan(&plan_path)?;
    println!(
        "Exam plan: {} {} ({} slots, ordering {}, cutoff {:?})",
        plan.course,
        plan.exam_type,
        plan.topics.len(),
        plan.ordering,
        plan.cutoff
    );

    let warnings = validate_plan(&plan);
    for w in &warnings {
        let prefix = w
            .directive
            .as_ref()
            .map(|d| format!("  [{d}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    let pool = super::load_plan_pool(&settings, &plan, &plan_path)?;
    print_difficulty_table(&pool);

    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let reference = plan.exam_date.unwrap_or(today);
    let cutoff = plan.cutoff.cutoff_for(reference);
    let config = plan.session_config();
    let groups: StudentGroups = plan.groups();
    let composer = ExamComposer::new(&pool, &config, &groups);
    let feasible = pool
        .questions_of_date_cutoff(cutoff)
        .and_then(|eligible| composer.check_feasibility(&eligible));
    match feasible {
        Ok(candidates) => {
            println!("Feasible for exams on {reference} (questions completed by {cutoff}).");
            if !candidates.is_empty() {
                println!("Wildcard candidates: {}", candidates.join(", "));
            }
        }
        Err(e) => println!("  ERROR: {e}"),
    }

    let history = settings.history_store().load_latest()?;
    print_exposure_table(&history, &plan.exam_type);

    if warnings.is_empty() {
        println!("Exam plan valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }
    Ok(())
}

fn print_difficulty_table(pool: &QuestionPool) {
    let mut table = Table::new();
    table.set_header(vec!["Difficulty", "Questions"]);
    for (difficulty, count) in pool.difficulty_counts() {
        table.add_row(vec![Cell::new(difficulty), Cell::new(count)]);
    }
    println!("\nQuestion bank: {} question(s)\n{table}", pool.len());
}

fn print_exposure_table(history: &History, exam_type: &str) {
    if history.is_empty() {
        println!("\nNo exam history yet.");
        return;
    }

    let all = history.exposure_counts(None);
    let this_type = history.exposure_counts(Some(exam_type));
    let mut ranked: Vec<(&String, &usize)> = all.iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

    let mut table = Table::new();
    table.set_header(vec!["Question", "All exams", exam_type]);
    for (id, count) in ranked.into_iter().take(TOP_EXPOSURES) {
        table.add_row(vec![
            Cell::new(id),
            Cell::new(count),
            Cell::new(this_type.get(id).copied().unwrap_or(0)),
        ]);
    }
    println!(
        "\nHistory: {} exam(s) across {} student(s)\n{table}",
        history.len(),
        history.students().count()
    );
}
