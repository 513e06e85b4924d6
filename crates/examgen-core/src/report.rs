//! Generation report: a JSON manifest of one `generate` run.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::composer::Relaxation;
use crate::selector::Tier;
use crate::session::SessionOutcome;

/// What was generated, with which seed, and where constraints were relaxed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    /// Unique run identifier.
    pub id: Uuid,
    /// When the run finished.
    pub created_at: DateTime<Utc>,
    pub course: String,
    pub exam_type: String,
    /// Numeric seed the run's generator was created from.
    pub seed: u64,
    pub exams: Vec<ExamSummary>,
    pub relaxations: Vec<Relaxation>,
}

/// One exam in a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamSummary {
    pub student_id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub time: String,
    pub question_ids: Vec<String>,
    /// `true` if the exam was taken from history rather than composed.
    #[serde(default)]
    pub reused: bool,
}

impl GenerationReport {
    /// Summarise a finished session. Placeholder slots are left out.
    pub fn from_outcome(course: &str, exam_type: &str, seed: u64, outcome: &SessionOutcome) -> Self {
        let exams = outcome
            .exams
            .iter()
            .filter(|e| !e.is_placeholder())
            .map(|e| ExamSummary {
                student_id: e.student_id.clone(),
                date: e.date,
                time: e.time.clone(),
                question_ids: e.questions.iter().map(|q| q.id.clone()).collect(),
                reused: e.reused,
            })
            .collect();

        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            course: course.to_string(),
            exam_type: exam_type.to_string(),
            seed,
            exams,
            relaxations: outcome.relaxations.clone(),
        }
    }

    /// Relaxations accepted at a tier looser than `tier`.
    pub fn relaxed_beyond(&self, tier: Tier) -> impl Iterator<Item = &Relaxation> {
        self.relaxations.iter().filter(move |r| r.tier > tier)
    }

    /// Save the report as pretty-printed JSON.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: GenerationReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }
}
