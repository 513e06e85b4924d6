//! Core data model types for examgen.
//!
//! Questions, difficulties, exams, and the per-session composition settings
//! that the rest of the engine consumes.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates;

/// Topic placeholder resolved at composition time from the wildcard candidates.
pub const WILDCARD: &str = "WILD";

/// Returns `true` if `topic` is the wildcard placeholder.
pub fn is_wildcard(topic: &str) -> bool {
    topic == WILDCARD
}

/// Question difficulty, ordered from easiest to hardest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    VeryHard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::VeryHard,
    ];

    /// Easy and medium questions are eligible to open an exam.
    pub fn is_easy_or_medium(self) -> bool {
        matches!(self, Difficulty::Easy | Difficulty::Medium)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
            Difficulty::VeryHard => write!(f, "very hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" | "med" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            "very hard" | "very-hard" | "veryhard" | "vhard" => Ok(Difficulty::VeryHard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// How two images on one question are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageArrangement {
    #[default]
    Vertical,
    Horizontal,
}

impl ImageArrangement {
    /// Anything other than "horizontal" stacks the images vertically.
    pub fn parse_lenient(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("horizontal") {
            ImageArrangement::Horizontal
        } else {
            ImageArrangement::Vertical
        }
    }
}

/// An image attached to a question.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// File name, relative to the images directory.
    pub file: String,
    #[serde(default)]
    pub caption: String,
}

/// A single bank question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Stable, opaque identifier.
    pub id: String,
    pub topic: String,
    pub difficulty: Difficulty,
    /// Provenance; two questions with the same source count as duplicates
    /// when checking what a student has already seen.
    #[serde(default)]
    pub source: String,
    /// Subtype tags; at most one question per tag on an exam when possible.
    #[serde(default)]
    pub subtypes: Vec<String>,
    /// The question becomes eligible once this date has passed the cutoff.
    #[serde(default)]
    pub completed: Option<NaiveDate>,
    #[serde(default)]
    pub instructions: String,
    /// Up to two data blocks.
    #[serde(default)]
    pub data: Vec<String>,
    /// Up to two images.
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub image_arrangement: ImageArrangement,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub omit: bool,
    /// Shown only on instructor copies.
    #[serde(default)]
    pub instructor_comments: String,
}

impl Question {
    /// Minimal constructor used by loaders and tests.
    pub fn new(id: impl Into<String>, topic: impl Into<String>, difficulty: Difficulty) -> Self {
        Self {
            id: id.into(),
            topic: topic.into(),
            difficulty,
            source: String::new(),
            subtypes: Vec::new(),
            completed: None,
            instructions: String::new(),
            data: Vec::new(),
            images: Vec::new(),
            image_arrangement: ImageArrangement::Vertical,
            notes: String::new(),
            omit: false,
            instructor_comments: String::new(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_subtypes<I, S>(mut self, subtypes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subtypes = subtypes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_completed(mut self, date: NaiveDate) -> Self {
        self.completed = Some(date);
        self
    }

    /// Eligible for an exam whose cutoff is `cutoff`.
    pub fn is_completed_by(&self, cutoff: NaiveDate) -> bool {
        self.completed.is_some_and(|d| d <= cutoff)
    }
}

/// One question-bank row as read from the tabular source, before validation.
///
/// Every field is kept as text so that loaders never fail on a bad cell;
/// [`RawQuestion::into_question`] decides whether the row is usable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawQuestion {
    pub id: String,
    pub topic: String,
    pub difficulty: String,
    pub source: String,
    pub completed: String,
    /// Comma-separated subtype tags.
    pub subtypes: String,
    pub instructions: String,
    pub data1: String,
    pub data2: String,
    pub image1: String,
    pub image1_caption: String,
    pub image2: String,
    pub image2_caption: String,
    pub image_arrangement: String,
    pub notes: String,
    /// Any non-blank value marks the row as omitted.
    pub omit: String,
    pub instructor_comments: String,
}

impl RawQuestion {
    /// Convert to a [`Question`], or `None` if the row is omitted or malformed.
    pub fn into_question(self) -> Option<Question> {
        let topic = self.topic.trim();
        let difficulty = self.difficulty.trim();
        let id = self.id.trim();
        if !self.omit.trim().is_empty() || topic.is_empty() || difficulty.is_empty() || id.is_empty()
        {
            return None;
        }
        let difficulty: Difficulty = match difficulty.parse() {
            Ok(d) => d,
            Err(e) => {
                tracing::debug!(id, "skipping question row: {e}");
                return None;
            }
        };

        let data = [self.data1, self.data2]
            .into_iter()
            .filter(|d| !d.trim().is_empty())
            .collect();
        let images = [
            (self.image1, self.image1_caption),
            (self.image2, self.image2_caption),
        ]
        .into_iter()
        .filter(|(file, _)| !file.trim().is_empty())
        .map(|(file, caption)| Image {
            file: file.trim().to_string(),
            caption: caption.trim().to_string(),
        })
        .collect();

        Some(Question {
            id: id.to_string(),
            topic: topic.to_string(),
            difficulty,
            source: self.source.trim().to_string(),
            subtypes: self
                .subtypes
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            completed: dates::find_iso_date(&self.completed),
            instructions: self.instructions,
            data,
            images,
            image_arrangement: ImageArrangement::parse_lenient(&self.image_arrangement),
            notes: self.notes,
            omit: false,
            instructor_comments: self.instructor_comments,
        })
    }
}

/// A topic/difficulty pair fixed in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PinnedPair {
    /// A concrete topic or [`WILDCARD`].
    pub topic: String,
    pub difficulty: Difficulty,
}

impl PinnedPair {
    pub fn new(topic: impl Into<String>, difficulty: Difficulty) -> Self {
        Self {
            topic: topic.into(),
            difficulty,
        }
    }
}

impl fmt::Display for PinnedPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.topic, self.difficulty)
    }
}

/// Final question order within an exam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderingPolicy {
    /// Follow the configured topic order.
    #[default]
    AsSpecified,
    Random,
    /// Open with one easy or medium question, the rest random.
    EasyMediumFirst,
    /// Close with one very hard question, the rest random.
    VeryHardLast,
}

impl fmt::Display for OrderingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderingPolicy::AsSpecified => write!(f, "as-specified"),
            OrderingPolicy::Random => write!(f, "random"),
            OrderingPolicy::EasyMediumFirst => write!(f, "easy-medium-first"),
            OrderingPolicy::VeryHardLast => write!(f, "very-hard-last"),
        }
    }
}

impl FromStr for OrderingPolicy {
    type Err = String;

    /// Accepts the numeric codes 1-4 used in exam plans as well as the names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" | "as-specified" | "specified" => Ok(OrderingPolicy::AsSpecified),
            "2" | "random" => Ok(OrderingPolicy::Random),
            "3" | "easy-medium-first" => Ok(OrderingPolicy::EasyMediumFirst),
            "4" | "very-hard-last" => Ok(OrderingPolicy::VeryHardLast),
            other => Err(format!("unknown ordering policy: {other}")),
        }
    }
}

/// How an exam date maps to the question completion cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CutoffPolicy {
    /// Friday of the week before the exam.
    #[default]
    PreviousFriday,
    /// The exam date itself.
    ExamDate,
}

impl CutoffPolicy {
    pub fn cutoff_for(self, exam_date: NaiveDate) -> NaiveDate {
        match self {
            CutoffPolicy::PreviousFriday => dates::friday_of_previous_week(exam_date),
            CutoffPolicy::ExamDate => exam_date,
        }
    }
}

impl FromStr for CutoffPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "previous-friday" | "friday" => Ok(CutoffPolicy::PreviousFriday),
            "exam-date" | "same-day" => Ok(CutoffPolicy::ExamDate),
            other => Err(format!("unknown cutoff rule: {other}")),
        }
    }
}

/// Whether a day's exams share one document or each student gets their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentLayout {
    #[default]
    Batch,
    Separate,
}

impl FromStr for DocumentLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "batch" | "b" => Ok(DocumentLayout::Batch),
            "separate" | "s" => Ok(DocumentLayout::Separate),
            other => Err(format!("unknown document layout: {other}")),
        }
    }
}

/// Immutable composition settings for one exam session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// History key, e.g. "midterm".
    pub exam_type: String,
    /// One entry per question; may contain [`WILDCARD`].
    pub topics: Vec<String>,
    /// Flat difficulty multiset, same length as `topics`.
    pub difficulties: Vec<Difficulty>,
    /// Pairs taken out of the random pairing and re-added verbatim.
    pub pinned: Vec<PinnedPair>,
    /// Candidate topics for wildcard slots.
    pub wildcard_topics: Vec<String>,
    pub ordering: OrderingPolicy,
    pub cutoff: CutoffPolicy,
}

/// One student's finished exam.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exam {
    /// Blank for an unfilled timeslot.
    pub student_id: String,
    pub date: NaiveDate,
    pub time: String,
    pub questions: Vec<Question>,
    /// Taken unchanged from history rather than composed in this run.
    #[serde(default)]
    pub reused: bool,
}

impl Exam {
    /// An unfilled timeslot keeps its page in the document but has no questions.
    pub fn is_placeholder(&self) -> bool {
        self.student_id.trim().is_empty()
    }
}
