use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use examgen_core::combination::CombinationGenerator;
use examgen_core::composer::{ExamComposer, NoopReporter, StudentGroups};
use examgen_core::history::History;
use examgen_core::model::{CutoffPolicy, Difficulty, OrderingPolicy, Question, SessionConfig};
use examgen_core::pool::QuestionPool;
use examgen_core::session::{ExamSession, Schedule};

const TOPICS: [&str; 6] = [
    "Phonetics",
    "Phonology",
    "Morphology",
    "Syntax",
    "Semantics",
    "Pragmatics",
];

fn make_pool(per_group: usize) -> QuestionPool {
    let done = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
    let mut qs = Vec::new();
    for topic in TOPICS {
        for diff in Difficulty::ALL {
            for i in 0..per_group {
                qs.push(
                    Question::new(format!("{topic}-{diff}-{i}"), topic, diff)
                        .with_source(format!("{topic}-{diff}-{i}"))
                        .with_subtypes([format!("{topic}-{}", i % 3)])
                        .with_completed(done),
                );
            }
        }
    }
    QuestionPool::from_questions(qs)
}

fn make_config() -> SessionConfig {
    SessionConfig {
        exam_type: "midterm".into(),
        topics: vec![
            "Phonology".into(),
            "Morphology".into(),
            "Syntax".into(),
            "WILD".into(),
        ],
        difficulties: vec![
            Difficulty::Easy,
            Difficulty::Medium,
            Difficulty::Hard,
            Difficulty::VeryHard,
        ],
        pinned: Vec::new(),
        wildcard_topics: vec!["Semantics".into(), "Pragmatics".into()],
        ordering: OrderingPolicy::VeryHardLast,
        cutoff: CutoffPolicy::PreviousFriday,
    }
}

fn bench_combination(c: &mut Criterion) {
    let pool = make_pool(5);
    let topics: Vec<String> = TOPICS.iter().map(|t| t.to_string()).collect();
    let diffs = [
        Difficulty::Easy,
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::VeryHard,
    ];
    let generator = CombinationGenerator::new(&pool, &[]);

    c.bench_function("combination/6 slots", |b| {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        b.iter(|| generator.generate(black_box(&topics), black_box(&diffs), &mut rng))
    });
}

fn bench_session(c: &mut Criterion) {
    let mut group = c.benchmark_group("session");
    let pool = make_pool(20);
    let config = make_config();
    let groups = StudentGroups::new(
        (0..20)
            .map(|g| vec![format!("S{}", g * 2), format!("S{}", g * 2 + 1)])
            .collect(),
    );
    let date = NaiveDate::from_ymd_opt(2021, 6, 10).unwrap();
    let schedule = Schedule::single_day(date, (0..40).map(|i| format!("S{i}")));

    group.bench_function("40 students", |b| {
        b.iter(|| {
            let session = ExamSession::new(ExamComposer::new(&pool, &config, &groups));
            let mut history = History::new();
            let mut rng = ChaCha8Rng::seed_from_u64(42);
            session
                .generate(black_box(&schedule), &mut history, &mut rng, &NoopReporter)
                .map(|outcome| outcome.exams.len())
        })
    });

    group.finish();
}

criterion_group!(benches, bench_combination, bench_session);
criterion_main!(benches);
