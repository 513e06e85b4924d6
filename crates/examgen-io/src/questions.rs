//! Tab-separated question bank loader.
//!
//! Column names are matched case-insensitively by prefix, so `UniqueID`,
//! `uniqueid_v2` and `UNIQUEID` all work. When several columns start with
//! `source`, the rightmost one wins (banks add a new source column per term).

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord};

use examgen_core::model::RawQuestion;
use examgen_core::pool::QuestionPool;

use crate::error::IoError;

#[derive(Debug)]
struct Columns {
    id: usize,
    topic: usize,
    difficulty: usize,
    source: Option<usize>,
    completed: Option<usize>,
    subtypes: Option<usize>,
    instructions: Option<usize>,
    data1: Option<usize>,
    data2: Option<usize>,
    image1: Option<usize>,
    image1_caption: Option<usize>,
    image2: Option<usize>,
    image2_caption: Option<usize>,
    image_arrangement: Option<usize>,
    notes: Option<usize>,
    omit: Option<usize>,
    instructor_comments: Option<usize>,
}

impl Columns {
    fn from_header(header: &StringRecord, path: &Path) -> Result<Self, IoError> {
        let names: Vec<String> = header.iter().map(|h| h.trim().to_lowercase()).collect();
        let first = |pred: &dyn Fn(&str) -> bool| names.iter().position(|n| pred(n.as_str()));
        let prefixed = |prefix: &str| first(&|n: &str| n.starts_with(prefix));
        let required = |prefix: &str, column: &'static str| {
            prefixed(prefix).ok_or_else(|| IoError::MissingColumn {
                path: path.to_path_buf(),
                column,
            })
        };

        Ok(Self {
            id: required("uniqueid", "UniqueID")?,
            topic: required("topic", "Topic")?,
            difficulty: required("difficulty", "Difficulty")?,
            source: names.iter().rposition(|n| n.starts_with("source")),
            completed: prefixed("datecompleted"),
            subtypes: prefixed("questiontype"),
            instructions: prefixed("instructions"),
            data1: prefixed("data1"),
            data2: prefixed("data2"),
            image1: first(&|n: &str| n.starts_with("image1") && !n.contains("caption")),
            image1_caption: first(&|n: &str| n.starts_with("image1") && n.contains("caption")),
            image2: first(&|n: &str| n.starts_with("image2") && !n.contains("caption")),
            image2_caption: first(&|n: &str| n.starts_with("image2") && n.contains("caption")),
            image_arrangement: prefixed("imagearrangement"),
            notes: prefixed("notes"),
            omit: prefixed("omit"),
            instructor_comments: first(&|n: &str| n.starts_with("instructor") && n.contains("comments")),
        })
    }

    fn row(&self, record: &StringRecord) -> RawQuestion {
        let get = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .unwrap_or_default()
                .to_string()
        };
        RawQuestion {
            id: get(Some(self.id)),
            topic: get(Some(self.topic)),
            difficulty: get(Some(self.difficulty)),
            source: get(self.source),
            completed: get(self.completed),
            subtypes: get(self.subtypes),
            instructions: get(self.instructions),
            data1: get(self.data1),
            data2: get(self.data2),
            image1: get(self.image1),
            image1_caption: get(self.image1_caption),
            image2: get(self.image2),
            image2_caption: get(self.image2_caption),
            image_arrangement: get(self.image_arrangement),
            notes: get(self.notes),
            omit: get(self.omit),
            instructor_comments: get(self.instructor_comments),
        }
    }
}

/// Read every row of a question bank file.
pub fn read_question_rows(path: &Path) -> Result<Vec<RawQuestion>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open question bank: {}", path.display()))?;
    read_question_rows_from(file, path)
}

/// Read question rows from any reader; `source_path` is used in messages.
pub fn read_question_rows_from<R: Read>(reader: R, source_path: &Path) -> Result<Vec<RawQuestion>> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .quoting(false)
        .from_reader(reader);

    let header = rdr
        .headers()
        .with_context(|| format!("failed to read header: {}", source_path.display()))?
        .clone();
    if header.iter().all(|h| h.trim().is_empty()) {
        return Err(IoError::MissingHeader {
            path: source_path.to_path_buf(),
        }
        .into());
    }
    let columns = Columns::from_header(&header, source_path)?;

    let mut rows = Vec::new();
    for (idx, record) in rdr.records().enumerate() {
        match record {
            Ok(record) => rows.push(columns.row(&record)),
            Err(e) => {
                tracing::debug!("skipping {} row {}: {}", source_path.display(), idx + 2, e);
            }
        }
    }
    Ok(rows)
}

/// Load a question bank straight into a [`QuestionPool`].
pub fn load_question_pool(path: &Path) -> Result<QuestionPool> {
    let rows = read_question_rows(path)?;
    let total = rows.len();
    let pool = QuestionPool::load(rows);
    tracing::info!(
        path = %path.display(),
        rows = total,
        questions = pool.len(),
        "loaded question bank"
    );
    Ok(pool)
}
