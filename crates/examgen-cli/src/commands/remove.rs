//! The `examgen remove` command.

use std::path::PathBuf;

use anyhow::Result;

use examgen_io::settings::load_settings_from;

pub fn execute(settings_path: Option<PathBuf>, student_id: String, exam_type: String) -> Result<()> {
    let settings = load_settings_from(settings_path.as_deref())?;
    let store = settings.history_store();
    let mut history = store.load_latest()?;

    let removed = history.remove_exam(&student_id, &exam_type)?;
    let path = store.save(&history)?;

    println!(
        "Removed {student_id}'s {exam_type} exam ({} question(s)); it will be composed again next run.",
        removed.len()
    );
    println!("History saved to: {}", path.display());
    Ok(())
}
