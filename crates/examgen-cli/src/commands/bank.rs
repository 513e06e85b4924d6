//! The `examgen bank` command.

use std::path::PathBuf;

use anyhow::Result;

use examgen_core::plan::parse_plan;
use examgen_io::settings::load_settings_from;
use examgen_report::latex::RenderOptions;
use examgen_report::output::write_question_bank;

pub fn execute(settings_path: Option<PathBuf>, plan_path: PathBuf, output: Option<PathBuf>) -> Result<()> {
    let settings = load_settings_from(settings_path.as_deref())?;
    let plan = parse_plan(&plan_path)?;
    let pool = super::load_plan_pool(&settings, &plan, &plan_path)?;

    let out_dir = output.unwrap_or_else(|| settings.output_dir.clone());
    let opts = RenderOptions {
        images_dir: settings.images_dir.clone(),
        rubric: String::new(),
    };
    let path = write_question_bank(&out_dir, &plan.course, &pool, &opts)?;
    println!(
        "Question bank ({} questions, {} topics): {}",
        pool.len(),
        pool.topics().count(),
        path.display()
    );
    Ok(())
}
