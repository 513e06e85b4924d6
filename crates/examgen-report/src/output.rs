//! Writes a session's documents to an output directory.
//!
//! Per exam day: the student document(s), an instructor copy with notes and
//! an LMS export. File names start with the course and exam type with spaces
//! removed, then the date and weekday, e.g. `LING200Midterm-20210610Thursday.tex`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;

use examgen_core::model::{DocumentLayout, Exam};
use examgen_core::pool::QuestionPool;

use crate::latex::{render_exam_day, render_question_bank, render_single_exam, Audience, RenderOptions};
use crate::tsv::write_lms_tsv;

fn squash(s: &str) -> String {
    s.split_whitespace().collect()
}

/// File name stem for one day: `{course}{exam type}-{YYYYmmddWeekday}`.
pub fn day_stem(course: &str, exam_type: &str, date: NaiveDate) -> String {
    format!(
        "{}{}-{}",
        squash(course),
        squash(exam_type),
        date.format("%Y%m%d%A")
    )
}

fn write(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}

/// Write every document for `exams`, grouped by date. Returns the paths written.
pub fn write_session_documents(
    out_dir: &Path,
    course: &str,
    exam_type: &str,
    exams: &[Exam],
    layout: DocumentLayout,
    opts: &RenderOptions,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create output directory: {}", out_dir.display()))?;

    let mut by_day: BTreeMap<NaiveDate, Vec<Exam>> = BTreeMap::new();
    for exam in exams {
        by_day.entry(exam.date).or_default().push(exam.clone());
    }

    let mut written = Vec::new();
    for (date, day_exams) in &by_day {
        let stem = day_stem(course, exam_type, *date);

        match layout {
            DocumentLayout::Batch => {
                let path = out_dir.join(format!("{stem}.tex"));
                write(&path, &render_exam_day(*date, day_exams, Audience::Student, opts))?;
                written.push(path);
            }
            DocumentLayout::Separate => {
                let mut blanks = 0;
                for exam in day_exams {
                    let sid = if exam.is_placeholder() {
                        blanks += 1;
                        format!("empty{blanks}")
                    } else {
                        exam.student_id.clone()
                    };
                    let path = out_dir.join(format!("{stem}-sid{sid}.tex"));
                    // A student booked twice on one day sits the same exam.
                    if written.contains(&path) {
                        continue;
                    }
                    write(&path, &render_single_exam(exam, opts))?;
                    written.push(path);
                }
            }
        }

        let instructor = out_dir.join(format!("{stem}_instructorcopy.tex"));
        write(
            &instructor,
            &render_exam_day(*date, day_exams, Audience::Instructor, opts),
        )?;
        written.push(instructor);

        let tsv = out_dir.join(format!("{stem}.tsv"));
        write_lms_tsv(day_exams, opts, &tsv)?;
        written.push(tsv);

        tracing::info!(
            date = %date,
            exams = day_exams.len(),
            "wrote exam documents"
        );
    }
    Ok(written)
}

/// Write the full question bank document as `{course}-questionbank.tex`.
pub fn write_question_bank(
    out_dir: &Path,
    course: &str,
    pool: &QuestionPool,
    opts: &RenderOptions,
) -> Result<PathBuf> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create output directory: {}", out_dir.display()))?;
    let path = out_dir.join(format!("{}-questionbank.tex", squash(course)));
    write(&path, &render_question_bank(pool, opts))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use examgen_core::model::{Difficulty, Question};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 6, day).unwrap()
    }

    fn exams() -> Vec<Exam> {
        let q = Question::new("QU001", "Syntax", Difficulty::Easy);
        vec![
            Exam {
                student_id: "1001".into(),
                date: d(10),
                time: "10:00".into(),
                questions: vec![q.clone()],
                reused: false,
            },
            Exam {
                student_id: String::new(),
                date: d(10),
                time: "10:30".into(),
                questions: Vec::new(),
                reused: false,
            },
            Exam {
                student_id: "1002".into(),
                date: d(11),
                time: "9:00".into(),
                questions: vec![q],
                reused: false,
            },
        ]
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn stem_squashes_spaces() {
        assert_eq!(day_stem("LING 200", "Final Exam", d(10)), "LING200FinalExam-20210610Thursday");
    }

    #[test]
    fn batch_layout_files() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_session_documents(
            dir.path(),
            "LING 200",
            "midterm",
            &exams(),
            DocumentLayout::Batch,
            &RenderOptions::default(),
        )
        .unwrap();
        assert_eq!(
            names(&paths),
            vec![
                "LING200midterm-20210610Thursday.tex",
                "LING200midterm-20210610Thursday_instructorcopy.tex",
                "LING200midterm-20210610Thursday.tsv",
                "LING200midterm-20210611Friday.tex",
                "LING200midterm-20210611Friday_instructorcopy.tex",
                "LING200midterm-20210611Friday.tsv",
            ]
        );
        assert!(paths.iter().all(|p| p.exists()));
    }

    #[test]
    fn separate_layout_files() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_session_documents(
            dir.path(),
            "LING200",
            "midterm",
            &exams(),
            DocumentLayout::Separate,
            &RenderOptions::default(),
        )
        .unwrap();
        let names = names(&paths);
        assert!(names.contains(&"LING200midterm-20210610Thursday-sid1001.tex".to_string()));
        assert!(names.contains(&"LING200midterm-20210610Thursday-sidempty1.tex".to_string()));
        assert!(names.contains(&"LING200midterm-20210610Thursday_instructorcopy.tex".to_string()));
        assert!(!names.contains(&"LING200midterm-20210610Thursday.tex".to_string()));
    }

    #[test]
    fn separate_layout_keeps_every_blank_slot() {
        let dir = tempfile::tempdir().unwrap();
        let mut exams = exams();
        exams.push(Exam {
            student_id: String::new(),
            date: d(10),
            time: "11:00".into(),
            questions: Vec::new(),
            reused: false,
        });
        let rebooked = Exam {
            reused: true,
            time: "11:30".into(),
            ..exams[0].clone()
        };
        exams.push(rebooked);
        let paths = write_session_documents(
            dir.path(),
            "LING200",
            "midterm",
            &exams,
            DocumentLayout::Separate,
            &RenderOptions::default(),
        )
        .unwrap();
        let names = names(&paths);
        let thursday: Vec<&String> = names
            .iter()
            .filter(|n| n.starts_with("LING200midterm-20210610Thursday-sid"))
            .collect();
        assert_eq!(
            thursday,
            vec![
                "LING200midterm-20210610Thursday-sid1001.tex",
                "LING200midterm-20210610Thursday-sidempty1.tex",
                "LING200midterm-20210610Thursday-sidempty2.tex",
            ]
        );
        let unique: std::collections::HashSet<&String> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
    }

    #[test]
    fn question_bank_file() {
        let dir = tempfile::tempdir().unwrap();
        let pool = QuestionPool::from_questions(vec![Question::new("QU001", "Syntax", Difficulty::Easy)]);
        let path = write_question_bank(dir.path(), "LING 200", &pool, &RenderOptions::default()).unwrap();
        assert_eq!(path.file_name().unwrap(), "LING200-questionbank.tex");
        assert!(std::fs::read_to_string(path).unwrap().contains("ALL QUESTIONS"));
    }
}
