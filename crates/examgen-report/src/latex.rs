//! LaTeX renderer for exam documents and the question bank.
//!
//! Output targets XeLaTeX (the preamble loads `fontspec` with an IPA-capable
//! font). Question text from the bank is inserted verbatim since it is
//! already LaTeX; only data blocks get bracket escaping.

use chrono::NaiveDate;

use examgen_core::model::{Exam, ImageArrangement, Question};
use examgen_core::pool::QuestionPool;

/// Who the document is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Student,
    /// Adds each question's instructor comments.
    Instructor,
}

/// Where the rendered question text ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    /// A page in a `.tex` document, with topic and source header lines.
    Document,
    /// A single tab-separated cell: no header, no newlines.
    Lms,
}

/// Settings shared by every rendered page.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Path prefix for `\includegraphics`.
    pub images_dir: String,
    /// Footer at the bottom of each question page.
    pub rubric: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            images_dir: "../images".to_string(),
            rubric: String::new(),
        }
    }
}

/// Wrap square brackets in braces so `[pʰat]` is not read as an optional argument.
pub fn escape_brackets(text: &str) -> String {
    text.replace('[', "{[").replace(']', "]}")
}

fn image_path(opts: &RenderOptions, file: &str) -> String {
    let dir = opts.images_dir.trim_end_matches('/');
    if dir.is_empty() {
        file.to_string()
    } else {
        format!("{dir}/{file}")
    }
}

fn figure(out: &mut String, opts: &RenderOptions, file: &str, caption: &str) {
    out.push_str("\\begin{figure}[H]\n");
    out.push_str(&format!("\\includegraphics{{{}}}\n", image_path(opts, file)));
    if !caption.is_empty() {
        out.push_str(&format!("\\caption{{{caption}}}\n"));
    }
    out.push_str("\\end{figure}\n");
}

fn subfigure(out: &mut String, opts: &RenderOptions, file: &str, caption: &str) {
    out.push_str("\\begin{subfigure}{.5\\textwidth}\n");
    out.push_str("\\centering\n");
    out.push_str(&format!(
        "\\includegraphics[width=.9\\linewidth]{{{}}}\n",
        image_path(opts, file)
    ));
    if !caption.is_empty() {
        out.push_str(&format!("\\caption{{{caption}}}\n"));
    }
    out.push_str("\\end{subfigure}\n");
}

/// The body of one question.
pub fn question_body(q: &Question, audience: Audience, flavor: Flavor, opts: &RenderOptions) -> String {
    let mut out = String::new();
    if flavor == Flavor::Document {
        out.push_str(&format!("Topic: {}\\\\\n", q.topic));
        out.push_str(&format!("Source: {}\\\\\n\n", q.source));
    }
    out.push_str(&q.instructions);
    out.push_str("\\\\\n\n");

    for block in &q.data {
        out.push_str(&escape_brackets(block));
        out.push_str("\n\n");
    }

    match q.images.as_slice() {
        [] => {}
        [only] => figure(&mut out, opts, &only.file, &only.caption),
        [first, second, ..] => match q.image_arrangement {
            ImageArrangement::Vertical => {
                figure(&mut out, opts, &first.file, &first.caption);
                figure(&mut out, opts, &second.file, &second.caption);
            }
            ImageArrangement::Horizontal => {
                out.push_str("\\begin{figure}[H]\n");
                subfigure(&mut out, opts, &first.file, &first.caption);
                subfigure(&mut out, opts, &second.file, &second.caption);
                out.push_str("\\end{figure}\n");
            }
        },
    }

    if audience == Audience::Instructor {
        out.push_str(&format!(
            "\n~\\\\\nINSTRUCTOR NOTES: {}\n\n",
            q.instructor_comments
        ));
    }
    out.push('\n');

    match flavor {
        Flavor::Document => out,
        Flavor::Lms => out.replace("\n\n", "~\\\\").replace('\n', " "),
    }
}

/// Preamble, optionally followed by a two-line title page.
pub fn document_head(title: Option<(&str, &str)>) -> String {
    let mut out = String::new();
    out.push_str("% Compile with XeLaTeX; fontspec is required.\n");
    out.push_str("\\documentclass[12pt]{article}\n");
    out.push_str("\\setlength\\parindent{0pt}\n\n");
    for package in [
        "parskip",
        "fullpage",
        "moresize",
        "graphicx",
        "caption",
        "subcaption",
        "float",
        "xcolor",
        "soul",
        "fontspec",
    ] {
        out.push_str(&format!("\\usepackage{{{package}}}\n"));
        if package == "parskip" {
            out.push_str("\\usepackage[margin=0.5in]{geometry}\n");
        }
    }
    out.push_str("\\setmainfont{Doulos SIL}\n\n");
    out.push_str("\\begin{document}\n\n");

    if let Some((line1, line2)) = title {
        out.push_str("\\begin{center}\n");
        out.push_str(&format!("\\textbf{{{{\\color{{violet}}{{\\HUGE {line1}\\\\}}}}}}\n\n"));
        out.push_str(&format!("\\textbf{{{{\\color{{violet}}{{\\HUGE {line2}\\\\}}}}}}\n\n"));
        out.push_str("\\end{center}\n");
        out.push_str("\\newpage\n\n");
    }
    out
}

pub fn document_foot() -> String {
    "\\end{document}\n\n".to_string()
}

/// Cover page for one exam. Blank ids print as "empty".
pub fn exam_start(student_id: &str, time: &str) -> String {
    let sid = if student_id.trim().is_empty() {
        "empty"
    } else {
        student_id
    };
    let mut out = String::new();
    out.push_str("\\begin{center}\n");
    out.push_str("\\textbf{{\\color{blue}{\\HUGE START OF EXAM\\\\}}}\n\n");
    out.push_str(&format!("\\textbf{{{{\\color{{blue}}{{\\HUGE Student ID: {sid}\\\\}}}}}}\n\n"));
    out.push_str(&format!("\\textbf{{{{\\color{{blue}}{{\\HUGE {time}\\\\}}}}}}\n\n"));
    out.push_str("\\end{center}\n");
    out.push_str("\\newpage\n\n");
    out
}

pub fn exam_end() -> String {
    "\\begin{center}\n\\textbf{{\\color{red}{\\HUGE END OF EXAM}}}\\\\\n\n\\end{center}\n\\newpage\n\n"
        .to_string()
}

/// One numbered question page with the rubric at the bottom.
pub fn question_page(number: usize, q: &Question, audience: Audience, opts: &RenderOptions) -> String {
    let mut out = format!("{{\\large Question {number}}}\\\\\n\n");
    out.push_str(&question_body(q, audience, Flavor::Document, opts));
    out.push_str("\\vfill\n");
    out.push_str(&opts.rubric);
    out.push('\n');
    out.push_str("\\newpage\n\n");
    out
}

/// Cover, question pages and end page of one exam. Placeholders get only a cover.
pub fn exam_pages(exam: &Exam, audience: Audience, opts: &RenderOptions) -> String {
    let mut out = exam_start(&exam.student_id, &exam.time);
    if exam.is_placeholder() {
        return out;
    }
    for (i, q) in exam.questions.iter().enumerate() {
        out.push_str(&question_page(i + 1, q, audience, opts));
    }
    out.push_str(&exam_end());
    out
}

/// Title lines for a day's batched document.
fn day_title(date: NaiveDate) -> String {
    date.format("%Y%m%d %A").to_string()
}

/// Every exam of one day in a single document.
pub fn render_exam_day(date: NaiveDate, exams: &[Exam], audience: Audience, opts: &RenderOptions) -> String {
    let subtitle = match audience {
        Audience::Student => "ALL EXAMS",
        Audience::Instructor => "ALL EXAMS (with notes)",
    };
    let mut out = document_head(Some((&day_title(date), subtitle)));
    for exam in exams {
        out.push_str(&exam_pages(exam, audience, opts));
    }
    out.push_str(&document_foot());
    out
}

/// One student's exam as a standalone document without a title page.
pub fn render_single_exam(exam: &Exam, opts: &RenderOptions) -> String {
    let mut out = document_head(None);
    out.push_str(&exam_pages(exam, Audience::Student, opts));
    out.push_str(&document_foot());
    out
}

/// Every question in the pool, grouped by topic then difficulty, with
/// completion dates and instructor notes.
pub fn render_question_bank(pool: &QuestionPool, opts: &RenderOptions) -> String {
    let mut out = document_head(Some(("ALL QUESTIONS", "BY TOPIC")));
    for (topic, difficulty, questions) in pool.groups() {
        out.push_str(&format!(
            "\\textbf{{\\underline{{\\huge {topic} / {difficulty}\\\\}}}}\n\n"
        ));
        for (i, q) in questions.iter().enumerate() {
            let completed = q
                .completed
                .map(|d| d.format("%Y%m%d").to_string())
                .unwrap_or_else(|| "-nodate-".to_string());
            out.push_str(&format!(
                "~\\\\\n\n{{\\large Question {}}} (completed {completed}) - ",
                i + 1
            ));
            out.push_str(&question_body(q, Audience::Instructor, Flavor::Document, opts));
        }
        out.push_str("\\newpage");
    }
    out.push_str(&document_foot());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use examgen_core::model::{Difficulty, Image};

    fn question() -> Question {
        let mut q = Question::new("QU001", "Phonology", Difficulty::Easy).with_source("Workbook 2");
        q.instructions = "Transcribe the word.".into();
        q.data = vec!["[pʰat]".into()];
        q.instructor_comments = "Aspiration matters.".into();
        q
    }

    fn opts() -> RenderOptions {
        RenderOptions {
            images_dir: "../images".into(),
            rubric: "/10".into(),
        }
    }

    #[test]
    fn escapes_brackets() {
        assert_eq!(escape_brackets("[a] and [b]"), "{[a]} and {[b]}");
        assert_eq!(escape_brackets("none"), "none");
    }

    #[test]
    fn student_body_has_header_and_no_notes() {
        let body = question_body(&question(), Audience::Student, Flavor::Document, &opts());
        assert!(body.starts_with("Topic: Phonology\\\\\nSource: Workbook 2\\\\\n\n"));
        assert!(body.contains("Transcribe the word.\\\\\n\n"));
        assert!(body.contains("{[pʰat]}"));
        assert!(!body.contains("INSTRUCTOR NOTES"));
    }

    #[test]
    fn instructor_body_has_notes() {
        let body = question_body(&question(), Audience::Instructor, Flavor::Document, &opts());
        assert!(body.contains("INSTRUCTOR NOTES: Aspiration matters."));
    }

    #[test]
    fn lms_body_is_one_line() {
        let body = question_body(&question(), Audience::Student, Flavor::Lms, &opts());
        assert!(!body.contains('\n'));
        assert!(!body.contains("Topic:"));
        assert!(body.starts_with("Transcribe the word.\\\\~\\\\"));
    }

    #[test]
    fn image_layouts() {
        let mut q = question();
        q.images = vec![Image {
            file: "a.png".into(),
            caption: "A".into(),
        }];
        let one = question_body(&q, Audience::Student, Flavor::Document, &opts());
        assert!(one.contains("\\includegraphics{../images/a.png}"));
        assert!(one.contains("\\caption{A}"));

        q.images.push(Image {
            file: "b.png".into(),
            caption: String::new(),
        });
        let vertical = question_body(&q, Audience::Student, Flavor::Document, &opts());
        assert_eq!(vertical.matches("\\begin{figure}[H]").count(), 2);
        assert_eq!(vertical.matches("\\caption{").count(), 1);

        q.image_arrangement = ImageArrangement::Horizontal;
        let horizontal = question_body(&q, Audience::Student, Flavor::Document, &opts());
        assert_eq!(horizontal.matches("\\begin{figure}[H]").count(), 1);
        assert_eq!(horizontal.matches("\\begin{subfigure}").count(), 2);
        assert!(horizontal.contains("[width=.9\\linewidth]{../images/b.png}"));
    }

    #[test]
    fn day_document_structure() {
        let date = NaiveDate::from_ymd_opt(2021, 6, 10).unwrap();
        let exams = vec![
            Exam {
                student_id: "1001".into(),
                date,
                time: "10:00".into(),
                questions: vec![question(), question()],
                reused: false,
            },
            Exam {
                student_id: String::new(),
                date,
                time: "10:30".into(),
                questions: Vec::new(),
                reused: false,
            },
        ];
        let doc = render_exam_day(date, &exams, Audience::Student, &opts());
        assert!(doc.contains("\\HUGE 20210610 Thursday\\\\"));
        assert!(doc.contains("\\HUGE ALL EXAMS\\\\"));
        assert!(doc.contains("Student ID: 1001"));
        assert!(doc.contains("Student ID: empty"));
        assert_eq!(doc.matches("START OF EXAM").count(), 2);
        assert_eq!(doc.matches("END OF EXAM").count(), 1);
        assert!(doc.contains("{\\large Question 2}\\\\"));
        assert_eq!(doc.matches("\\vfill\n/10\n").count(), 2);
        assert!(doc.trim_end().ends_with("\\end{document}"));

        let instr = render_exam_day(date, &exams, Audience::Instructor, &opts());
        assert!(instr.contains("ALL EXAMS (with notes)"));
        assert_eq!(instr.matches("INSTRUCTOR NOTES").count(), 2);
    }

    #[test]
    fn single_exam_has_no_title_page() {
        let exam = Exam {
            student_id: "1001".into(),
            date: NaiveDate::from_ymd_opt(2021, 6, 10).unwrap(),
            time: String::new(),
            questions: vec![question()],
            reused: false,
        };
        let doc = render_single_exam(&exam, &opts());
        assert!(!doc.contains("violet"));
        assert!(doc.contains("Student ID: 1001"));
    }

    #[test]
    fn question_bank_lists_dates() {
        let mut dated = question();
        dated.completed = NaiveDate::from_ymd_opt(2021, 1, 5);
        let mut undated = question();
        undated.id = "QU002".into();
        let pool = QuestionPool::from_questions(vec![dated, undated]);
        let doc = render_question_bank(&pool, &opts());
        assert!(doc.contains("\\huge Phonology / easy\\\\"));
        assert!(doc.contains("(completed 20210105)"));
        assert!(doc.contains("(completed -nodate-)"));
        assert_eq!(doc.matches("INSTRUCTOR NOTES").count(), 2);
    }
}
