//! examgen-report: Exam documents and LMS export.
//!
//! Renders composed exams and the question bank as XeLaTeX sources, and
//! exports questions as tab-separated rows for LMS import.

pub mod latex;
pub mod output;
pub mod tsv;

pub use latex::{Audience, RenderOptions};
pub use output::{write_question_bank, write_session_documents};
