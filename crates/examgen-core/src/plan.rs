//! Exam plan parser.
//!
//! An exam plan is a flat text file with one `key: value` directive per
//! line. Lists are `;`-separated. Unknown lines and `#` comments are ignored.
//!
//! ```text
//! questions: bank.tsv
//! signups: none students.tsv
//! course: LING 200
//! exam type: midterm 2021-06-10
//! student groups: S1, S2; S3, S4
//! random seed: wugz
//! ordering: 4
//! topics: Phonology; Morphology; WILD
//! difficulties: easy; hard [Phonology]; very hard
//! wildcard topics: Syntax; Semantics
//! rubric: 4 points
//! ```

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::composer::StudentGroups;
use crate::dates;
use crate::model::{
    is_wildcard, CutoffPolicy, Difficulty, DocumentLayout, OrderingPolicy, PinnedPair,
    SessionConfig,
};

/// Seed used when the plan names none.
pub const DEFAULT_SEED: &str = "wugz";

/// Where the exam's student list comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupSource {
    pub path: String,
    /// `true` for date/time/student rows, `false` for a flat list of ids.
    pub slotted: bool,
}

/// Everything an exam plan file specifies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamPlan {
    /// Question bank file, relative to the data directory.
    pub questions: String,
    pub signups: Option<SignupSource>,
    pub course: String,
    pub exam_type: String,
    /// Exam date for flat (unslotted) signups.
    pub exam_date: Option<NaiveDate>,
    pub student_groups: Vec<Vec<String>>,
    pub random_seed: String,
    /// Last schedule date to compose; Friday of the current week when absent.
    pub generate_up_to: Option<NaiveDate>,
    pub ordering: OrderingPolicy,
    pub topics: Vec<String>,
    pub difficulties: Vec<Difficulty>,
    pub pinned: Vec<PinnedPair>,
    /// Pinned pairs whose topic is not in `topics`; these are ignored.
    pub unmatched_pins: Vec<PinnedPair>,
    pub wildcard_topics: Vec<String>,
    /// Footer printed at the bottom of every question page.
    pub rubric: String,
    pub cutoff: CutoffPolicy,
    pub layout: DocumentLayout,
}

impl Default for ExamPlan {
    fn default() -> Self {
        Self {
            questions: String::new(),
            signups: None,
            course: String::new(),
            exam_type: String::new(),
            exam_date: None,
            student_groups: Vec::new(),
            random_seed: DEFAULT_SEED.to_string(),
            generate_up_to: None,
            ordering: OrderingPolicy::AsSpecified,
            topics: Vec::new(),
            difficulties: Vec::new(),
            pinned: Vec::new(),
            unmatched_pins: Vec::new(),
            wildcard_topics: Vec::new(),
            rubric: String::new(),
            cutoff: CutoffPolicy::PreviousFriday,
            layout: DocumentLayout::Batch,
        }
    }
}

impl ExamPlan {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            exam_type: self.exam_type.clone(),
            topics: self.topics.clone(),
            difficulties: self.difficulties.clone(),
            pinned: self.pinned.clone(),
            wildcard_topics: self.wildcard_topics.clone(),
            ordering: self.ordering,
            cutoff: self.cutoff,
        }
    }

    pub fn groups(&self) -> StudentGroups {
        StudentGroups::new(self.student_groups.clone())
    }

    pub fn seed(&self) -> u64 {
        seed_from_str(&self.random_seed)
    }

    /// Last date to compose exams for, relative to `today`.
    pub fn generate_up_to_from(&self, today: NaiveDate) -> NaiveDate {
        self.generate_up_to
            .unwrap_or_else(|| dates::friday_of_this_week(today))
    }

    pub fn wildcard_slots(&self) -> usize {
        self.topics.iter().filter(|t| is_wildcard(t)).count()
    }
}

/// Turn a seed string into a `u64`: numbers are used as-is, anything else
/// goes through 64-bit FNV-1a so the mapping is stable across platforms.
pub fn seed_from_str(seed: &str) -> u64 {
    let seed = seed.trim();
    if let Ok(n) = seed.parse::<u64>() {
        return n;
    }
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    seed.bytes()
        .fold(OFFSET, |hash, b| (hash ^ u64::from(b)).wrapping_mul(PRIME))
}

/// Read and parse an exam plan file.
pub fn parse_plan(path: &Path) -> Result<ExamPlan> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read exam plan: {}", path.display()))?;

    parse_plan_str(&content, path)
}

/// Parse exam plan text (useful for testing).
pub fn parse_plan_str(content: &str, source_path: &Path) -> Result<ExamPlan> {
    let mut plan = ExamPlan::default();
    let mut raw_pins: Vec<PinnedPair> = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        let at = || format!("{}:{}", source_path.display(), line_no);

        match key.trim().to_lowercase().as_str() {
            "questions" => plan.questions = value.to_string(),
            "signups" => {
                let mut words = value.split_whitespace();
                plan.signups = match (words.next(), words.next()) {
                    (Some("none"), Some(file)) => Some(SignupSource {
                        path: file.to_string(),
                        slotted: false,
                    }),
                    (Some("none"), None) | (None, _) => None,
                    (Some(file), _) => Some(SignupSource {
                        path: file.to_string(),
                        slotted: true,
                    }),
                };
            }
            "course" => plan.course = value.to_string(),
            "exam type" => {
                let mut words = value.split_whitespace();
                plan.exam_type = words.next().unwrap_or_default().to_string();
                if let Some(date) = words.next() {
                    plan.exam_date = Some(
                        dates::find_iso_date(date)
                            .with_context(|| format!("{}: invalid exam date '{date}'", at()))?,
                    );
                }
            }
            "student groups" => {
                plan.student_groups = split_list(value, ';')
                    .map(|group| split_list(group, ',').map(String::from).collect::<Vec<_>>())
                    .filter(|group| !group.is_empty())
                    .collect();
            }
            "random seed" => {
                if !value.is_empty() {
                    plan.random_seed = value.to_string();
                }
            }
            "generate up to" => {
                if !value.is_empty() {
                    plan.generate_up_to = Some(
                        dates::find_iso_date(value)
                            .with_context(|| format!("{}: invalid date '{value}'", at()))?,
                    );
                }
            }
            "ordering" => {
                if !value.is_empty() {
                    plan.ordering = value
                        .parse()
                        .map_err(|e: String| anyhow::anyhow!("{}: {}", at(), e))?;
                }
            }
            "topics" => plan.topics = split_list(value, ';').map(String::from).collect(),
            "difficulties" => {
                plan.difficulties.clear();
                raw_pins.clear();
                for entry in split_list(value, ';') {
                    let (diff_text, pinned_topic) = match entry.split_once('[') {
                        Some((d, rest)) => {
                            let topic = rest.split(']').next().unwrap_or_default().trim();
                            (d.trim(), (!topic.is_empty()).then_some(topic))
                        }
                        None => (entry, None),
                    };
                    let difficulty: Difficulty = diff_text
                        .parse()
                        .map_err(|e: String| anyhow::anyhow!("{}: {}", at(), e))?;
                    plan.difficulties.push(difficulty);
                    if let Some(topic) = pinned_topic {
                        raw_pins.push(PinnedPair::new(topic, difficulty));
                    }
                }
            }
            "wildcard topics" => {
                plan.wildcard_topics = split_list(value, ';').map(String::from).collect()
            }
            "rubric" => plan.rubric = value.to_string(),
            "cutoff" => {
                plan.cutoff = value
                    .parse()
                    .map_err(|e: String| anyhow::anyhow!("{}: {}", at(), e))?;
            }
            "layout" => {
                plan.layout = value
                    .parse()
                    .map_err(|e: String| anyhow::anyhow!("{}: {}", at(), e))?;
            }
            other => tracing::debug!("{}: ignoring unknown directive '{other}'", at()),
        }
    }

    for pin in raw_pins {
        if plan.topics.contains(&pin.topic) {
            plan.pinned.push(pin);
        } else {
            tracing::warn!(
                "{}: pinned topic '{}' is not in topics; ignoring",
                source_path.display(),
                pin.topic
            );
            plan.unmatched_pins.push(pin);
        }
    }

    if plan.exam_type.is_empty() {
        anyhow::bail!("{}: missing 'exam type:' directive", source_path.display());
    }

    Ok(plan)
}

fn split_list(value: &str, sep: char) -> impl Iterator<Item = &str> {
    value.split(sep).map(str::trim).filter(|s| !s.is_empty())
}

/// A warning from exam plan validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The directive the warning concerns.
    pub directive: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Check an exam plan for problems that would make composition fail or
/// behave unexpectedly.
pub fn validate_plan(plan: &ExamPlan) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if plan.topics.is_empty() {
        warnings.push(ValidationWarning {
            directive: Some("topics".into()),
            message: "no topics listed; exams would be empty".into(),
        });
    }

    if plan.topics.len() != plan.difficulties.len() {
        warnings.push(ValidationWarning {
            directive: Some("difficulties".into()),
            message: format!(
                "{} topic(s) but {} difficulty entries",
                plan.topics.len(),
                plan.difficulties.len()
            ),
        });
    }

    if plan.questions.is_empty() {
        warnings.push(ValidationWarning {
            directive: Some("questions".into()),
            message: "no question bank file named".into(),
        });
    }

    let mut seen = HashSet::new();
    for topic in &plan.wildcard_topics {
        if !seen.insert(topic) {
            warnings.push(ValidationWarning {
                directive: Some("wildcard topics".into()),
                message: format!("duplicate wildcard topic: {topic}"),
            });
        }
    }

    let wild = plan.wildcard_slots();
    if wild > seen.len() {
        warnings.push(ValidationWarning {
            directive: Some("wildcard topics".into()),
            message: format!(
                "{wild} wildcard slot(s) but only {} distinct wildcard topic(s)",
                seen.len()
            ),
        });
    }

    for pin in &plan.unmatched_pins {
        warnings.push(ValidationWarning {
            directive: Some("difficulties".into()),
            message: format!("pinned topic '{}' is not in topics and will be ignored", pin.topic),
        });
    }

    if plan.signups.as_ref().is_some_and(|s| !s.slotted) && plan.exam_date.is_none() {
        warnings.push(ValidationWarning {
            directive: Some("exam type".into()),
            message: "flat signups without an exam date; today's date will be used".into(),
        });
    }

    warnings
}
