//! The `examgen replace` command.

use std::path::PathBuf;

use anyhow::Result;

use examgen_core::plan::parse_plan;
use examgen_io::settings::load_settings_from;

pub fn execute(
    settings_path: Option<PathBuf>,
    plan_path: PathBuf,
    student_id: String,
    old_id: String,
    new_id: String,
    exam_type: Option<String>,
) -> Result<()> {
    let settings = load_settings_from(settings_path.as_deref())?;
    let plan = parse_plan(&plan_path)?;
    let exam_type = exam_type.unwrap_or_else(|| plan.exam_type.clone());
    let pool = super::load_plan_pool(&settings, &plan, &plan_path)?;

    let Some(replacement) = pool.find(&new_id).cloned() else {
        anyhow::bail!("question '{new_id}' is not in the question bank");
    };

    let store = settings.history_store();
    let mut history = store.load_latest()?;
    if history
        .exam(&student_id, &exam_type)
        .is_some_and(|qs| qs.iter().any(|q| q.id == new_id))
    {
        anyhow::bail!("question '{new_id}' is already on {student_id}'s {exam_type} exam");
    }

    let old = history.replace_question(&student_id, &exam_type, &old_id, replacement)?;
    let path = store.save(&history)?;

    println!(
        "Replaced {} ({} / {}) with {new_id} on {student_id}'s {exam_type} exam.",
        old.id, old.topic, old.difficulty
    );
    println!("History saved to: {}", path.display());
    Ok(())
}
