pub mod bank;
pub mod generate;
pub mod init;
pub mod remove;
pub mod replace;
pub mod validate;

use std::path::Path;

use anyhow::Result;

use examgen_core::plan::ExamPlan;
use examgen_core::pool::QuestionPool;
use examgen_io::questions::load_question_pool;
use examgen_io::settings::ExamgenSettings;

/// Load the question bank an exam plan names.
fn load_plan_pool(settings: &ExamgenSettings, plan: &ExamPlan, plan_path: &Path) -> Result<QuestionPool> {
    anyhow::ensure!(
        !plan.questions.is_empty(),
        "{}: missing 'questions:' directive",
        plan_path.display()
    );
    load_question_pool(&settings.data_path(&plan.questions))
}
