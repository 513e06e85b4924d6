//! Session driver: compose every scheduled exam in date and timeslot order.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::composer::{ExamComposer, ProgressReporter, Relaxation};
use crate::error::ComposeError;
use crate::history::History;
use crate::model::Exam;

/// One booked timeslot. A blank student id keeps the slot as a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub time: String,
    pub student_id: String,
}

/// Exam bookings grouped by date; bookings keep their sign-up order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    days: BTreeMap<NaiveDate, Vec<Booking>>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, date: NaiveDate, time: impl Into<String>, student_id: impl Into<String>) {
        self.days.entry(date).or_default().push(Booking {
            time: time.into(),
            student_id: student_id.into(),
        });
    }

    /// Every listed student sits on `date` with no timeslot.
    pub fn single_day<I, S>(date: NaiveDate, student_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut schedule = Self::new();
        for sid in student_ids {
            schedule.push(date, "", sid);
        }
        schedule
    }

    /// Drop days after `last`.
    pub fn until(mut self, last: NaiveDate) -> Self {
        self.days.retain(|d, _| *d <= last);
        self
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.days.keys().copied()
    }

    pub fn bookings(&self, date: NaiveDate) -> &[Booking] {
        self.days.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &Booking)> {
        self.days
            .iter()
            .flat_map(|(d, bookings)| bookings.iter().map(move |b| (*d, b)))
    }

    /// Distinct, non-blank student ids.
    pub fn students(&self) -> BTreeSet<&str> {
        self.iter()
            .map(|(_, b)| b.student_id.as_str())
            .filter(|s| !s.trim().is_empty())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.days.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

/// Everything one session produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionOutcome {
    /// In schedule order, placeholders included.
    pub exams: Vec<Exam>,
    pub relaxations: Vec<Relaxation>,
}

impl SessionOutcome {
    /// Exams composed in this run, and so newly written to history.
    pub fn composed_count(&self) -> usize {
        self.exams
            .iter()
            .filter(|e| !e.is_placeholder() && !e.reused)
            .count()
    }

    pub fn reused_count(&self) -> usize {
        self.exams.iter().filter(|e| e.reused).count()
    }

    pub fn exams_on(&self, date: NaiveDate) -> impl Iterator<Item = &Exam> {
        self.exams.iter().filter(move |e| e.date == date)
    }
}

/// Runs an [`ExamComposer`] over a whole [`Schedule`].
pub struct ExamSession<'a> {
    composer: ExamComposer<'a>,
}

impl<'a> ExamSession<'a> {
    pub fn new(composer: ExamComposer<'a>) -> Self {
        Self { composer }
    }

    /// Compose exams in ascending date order, then sign-up order within a day.
    ///
    /// Stops at the first fatal error; exams composed before that point stay
    /// recorded in `history`.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        schedule: &Schedule,
        history: &mut History,
        rng: &mut R,
        reporter: &dyn ProgressReporter,
    ) -> Result<SessionOutcome, ComposeError> {
        let exam_type = self.composer.config().exam_type.clone();
        let mut outcome = SessionOutcome::default();

        for (date, booking) in schedule.iter() {
            if booking.student_id.trim().is_empty() {
                outcome.exams.push(Exam {
                    student_id: String::new(),
                    date,
                    time: booking.time.clone(),
                    questions: Vec::new(),
                    reused: false,
                });
                continue;
            }

            reporter.on_exam_start(&booking.student_id, &exam_type);
            let composed = self
                .composer
                .compose(history, &booking.student_id, date, rng)?;
            for relaxation in &composed.relaxations {
                reporter.on_relaxation(relaxation);
            }
            reporter.on_exam_complete(&composed);

            outcome.relaxations.extend(composed.relaxations);
            outcome.exams.push(Exam {
                student_id: composed.student_id,
                date,
                time: booking.time.clone(),
                questions: composed.questions,
                reused: composed.reused,
            });
        }

        tracing::info!(
            exam_type = %exam_type,
            exams = outcome.exams.len(),
            reused = outcome.reused_count(),
            relaxations = outcome.relaxations.len(),
            "session complete"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::{NoopReporter, StudentGroups};
    use crate::model::{CutoffPolicy, Difficulty, OrderingPolicy, Question, SessionConfig};
    use crate::pool::QuestionPool;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::cell::RefCell;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn pool() -> QuestionPool {
        QuestionPool::from_questions((0..10).map(|i| {
            Question::new(format!("Q{i}"), "Syntax", Difficulty::Easy)
                .with_source(format!("src{i}"))
                .with_completed(date(2021, 1, 1))
        }))
    }

    fn cfg() -> SessionConfig {
        SessionConfig {
            exam_type: "final".into(),
            topics: vec!["Syntax".into(), "Syntax".into()],
            difficulties: vec![Difficulty::Easy, Difficulty::Easy],
            pinned: Vec::new(),
            wildcard_topics: Vec::new(),
            ordering: OrderingPolicy::Random,
            cutoff: CutoffPolicy::PreviousFriday,
        }
    }

    #[derive(Default)]
    struct Recorder {
        started: RefCell<Vec<String>>,
    }

    impl ProgressReporter for Recorder {
        fn on_exam_start(&self, student_id: &str, _exam_type: &str) {
            self.started.borrow_mut().push(student_id.to_string());
        }
        fn on_exam_complete(&self, _exam: &crate::composer::ComposedExam) {}
        fn on_relaxation(&self, _relaxation: &Relaxation) {}
    }

    #[test]
    fn schedule_orders_dates_and_keeps_signup_order() {
        let mut schedule = Schedule::new();
        schedule.push(date(2021, 5, 20), "10:00", "S3");
        schedule.push(date(2021, 5, 18), "9:00", "S2");
        schedule.push(date(2021, 5, 18), "8:00", "S1");
        let order: Vec<&str> = schedule.iter().map(|(_, b)| b.student_id.as_str()).collect();
        assert_eq!(order, vec!["S2", "S1", "S3"]);
        assert_eq!(schedule.clone().until(date(2021, 5, 19)).len(), 2);
    }

    #[test]
    fn generates_in_schedule_order_with_placeholders() {
        let pool = pool();
        let config = cfg();
        let groups = StudentGroups::default();
        let session = ExamSession::new(ExamComposer::new(&pool, &config, &groups));

        let mut schedule = Schedule::new();
        schedule.push(date(2021, 5, 19), "10:00", "S2");
        schedule.push(date(2021, 5, 18), "9:00", "S1");
        schedule.push(date(2021, 5, 18), "9:30", "");

        let mut history = History::new();
        let recorder = Recorder::default();
        let outcome = session
            .generate(&schedule, &mut history, &mut ChaCha8Rng::seed_from_u64(3), &recorder)
            .unwrap();

        assert_eq!(*recorder.started.borrow(), vec!["S1", "S2"]);
        assert_eq!(outcome.exams.len(), 3);
        assert!(outcome.exams[1].is_placeholder());
        assert_eq!(outcome.exams[1].time, "9:30");
        assert_eq!(outcome.composed_count(), 2);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn rerun_reuses_history() {
        let pool = pool();
        let config = cfg();
        let groups = StudentGroups::default();
        let session = ExamSession::new(ExamComposer::new(&pool, &config, &groups));
        let schedule = Schedule::single_day(date(2021, 5, 18), ["S1", "S2"]);

        let mut history = History::new();
        let first = session
            .generate(&schedule, &mut history, &mut ChaCha8Rng::seed_from_u64(1), &NoopReporter)
            .unwrap();
        let snapshot = history.clone();
        let second = session
            .generate(&schedule, &mut history, &mut ChaCha8Rng::seed_from_u64(2), &NoopReporter)
            .unwrap();

        assert_eq!(history, snapshot);
        assert_eq!(second.reused_count(), 2);
        assert_eq!(second.composed_count(), 0);
        let questions = |o: &SessionOutcome| o.exams.iter().map(|e| e.questions.clone()).collect::<Vec<_>>();
        assert_eq!(questions(&first), questions(&second));
    }

    #[test]
    fn repeated_booking_counts_as_composed_once() {
        let pool = pool();
        let config = cfg();
        let groups = StudentGroups::default();
        let session = ExamSession::new(ExamComposer::new(&pool, &config, &groups));

        let mut schedule = Schedule::new();
        schedule.push(date(2021, 5, 18), "9:00", "S1");
        schedule.push(date(2021, 5, 18), "10:00", "S1");

        let mut history = History::new();
        let outcome = session
            .generate(&schedule, &mut history, &mut ChaCha8Rng::seed_from_u64(4), &NoopReporter)
            .unwrap();

        assert_eq!(history.len(), 1);
        assert_eq!(outcome.composed_count(), 1);
        assert_eq!(outcome.reused_count(), 1);
        assert!(!outcome.exams[0].reused);
        assert!(outcome.exams[1].reused);
        assert_eq!(outcome.exams[0].questions, outcome.exams[1].questions);
    }

    #[test]
    fn fatal_error_stops_session() {
        let pool = pool();
        let mut config = cfg();
        config.topics = vec!["Phonology".into(), "Syntax".into()];
        let groups = StudentGroups::default();
        let session = ExamSession::new(ExamComposer::new(&pool, &config, &groups));
        let schedule = Schedule::single_day(date(2021, 5, 18), ["S1"]);
        let mut history = History::new();
        let err = session
            .generate(&schedule, &mut history, &mut ChaCha8Rng::seed_from_u64(1), &NoopReporter)
            .unwrap_err();
        assert!(err.is_configuration_error());
        assert!(history.is_empty());
    }
}
