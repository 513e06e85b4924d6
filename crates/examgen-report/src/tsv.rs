//! Tab-separated export of composed exams for learning-management-system import.
//!
//! One row per question. Question text is flattened to a single line so each
//! row stays a single record.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use csv::{QuoteStyle, WriterBuilder};

use examgen_core::model::Exam;

use crate::latex::{question_body, Audience, Flavor, RenderOptions};

pub const LMS_HEADER: [&str; 10] = [
    "Person",
    "QuestionID",
    "Topic",
    "Difficulty",
    "Source",
    "Question_latex",
    "Image1",
    "Image1Caption",
    "Image2",
    "Image2Caption",
];

/// Write every non-placeholder exam as LMS rows.
pub fn write_lms_rows<W: Write>(out: W, exams: &[Exam], opts: &RenderOptions) -> Result<()> {
    let mut wtr = WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(QuoteStyle::Never)
        .from_writer(out);
    wtr.write_record(LMS_HEADER)?;

    for exam in exams.iter().filter(|e| !e.is_placeholder()) {
        for q in &exam.questions {
            let body = question_body(q, Audience::Student, Flavor::Lms, opts);
            let image = |i: usize| q.images.get(i).map(|img| (img.file.as_str(), img.caption.as_str()));
            let (image1, caption1) = image(0).unwrap_or_default();
            let (image2, caption2) = image(1).unwrap_or_default();
            let difficulty = q.difficulty.to_string();
            wtr.write_record([
                exam.student_id.as_str(),
                q.id.as_str(),
                q.topic.as_str(),
                difficulty.as_str(),
                q.source.as_str(),
                body.as_str(),
                image1,
                caption1,
                image2,
                caption2,
            ])?;
        }
    }
    wtr.flush()?;
    Ok(())
}

/// Render LMS rows into a string.
pub fn render_lms_tsv(exams: &[Exam], opts: &RenderOptions) -> Result<String> {
    let mut buf = Vec::new();
    write_lms_rows(&mut buf, exams, opts)?;
    String::from_utf8(buf).context("LMS export is not valid UTF-8")
}

pub fn write_lms_tsv(exams: &[Exam], opts: &RenderOptions, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create LMS export: {}", path.display()))?;
    write_lms_rows(file, exams, opts)
}
