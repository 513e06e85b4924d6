//! examgen-core: Question selection and exam composition engine.
//!
//! This crate holds the data model, the question pool and history, the
//! combination generator, the tiered unique-question selector, and the
//! composer and session driver that tie them together. File formats live in
//! `examgen-io`; rendering lives in `examgen-report`.

pub mod combination;
pub mod composer;
pub mod dates;
pub mod error;
pub mod history;
pub mod model;
pub mod ordering;
pub mod plan;
pub mod pool;
pub mod report;
pub mod selector;
pub mod session;

pub use composer::{ComposedExam, ExamComposer, NoopReporter, ProgressReporter, Relaxation, StudentGroups};
pub use error::{ComposeError, CorrectionError};
pub use history::History;
pub use model::{Difficulty, Exam, Question, SessionConfig};
pub use pool::QuestionPool;
pub use session::{ExamSession, Schedule, SessionOutcome};
