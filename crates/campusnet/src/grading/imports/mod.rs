//! Bulk score entry from gradebook CSV exports.
//!
//! Rows are matched against the course instance's assessments, run through
//! the university's late-penalty policy, and upserted one score per
//! (student, assessment) pair. Unknown assessments are counted and skipped so
//! a partially stale export does not abort the whole import.

mod parser;

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;

use super::domain::{
    Assessment, AssessmentId, CourseInstanceId, Score, StudentId, UniversityConfiguration,
    UniversityId,
};
use super::resolver::{resolve_university, ResolutionError};
use super::store::{collections, decode, encode, DocumentStore, Filter, StoreError};
use parser::ScoreRow;

#[derive(Debug, thiserror::Error)]
pub enum ScoreImportError {
    #[error("failed to read score export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid score CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {line}: {detail}")]
    InvalidRow { line: u64, detail: String },
    #[error("no configuration found for university {0}")]
    ConfigurationNotFound(UniversityId),
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Counters describing what an import run did.
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ScoreImportSummary {
    pub created: usize,
    pub updated: usize,
    pub excused: usize,
    pub skipped_unknown_assessment: usize,
}

const DEFAULT_GRADED_BY: &str = "score-import";

pub struct ScoreImporter<S> {
    store: Arc<S>,
    graded_by: String,
}

impl<S: DocumentStore> ScoreImporter<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_graded_by(store, DEFAULT_GRADED_BY)
    }

    pub fn with_graded_by(store: Arc<S>, graded_by: impl Into<String>) -> Self {
        Self {
            store,
            graded_by: graded_by.into(),
        }
    }

    pub fn from_path<P: AsRef<Path>>(
        &self,
        path: P,
        course_instance: &CourseInstanceId,
    ) -> Result<ScoreImportSummary, ScoreImportError> {
        let file = std::fs::File::open(path)?;
        self.from_reader(file, course_instance)
    }

    pub fn from_reader<R: Read>(
        &self,
        reader: R,
        course_instance: &CourseInstanceId,
    ) -> Result<ScoreImportSummary, ScoreImportError> {
        let rows = parser::parse_rows(reader)?;
        let assessments = self.course_assessments(course_instance)?;
        let configuration = self.university_configuration(course_instance)?;

        let mut summary = ScoreImportSummary::default();
        for row in rows {
            if !assessments
                .iter()
                .any(|assessment| assessment.id.0 == row.assessment)
            {
                summary.skipped_unknown_assessment += 1;
                continue;
            }

            let mut score = build_score(&row, &configuration, &self.graded_by)?;
            if score.is_excused {
                summary.excused += 1;
            }

            match self.existing_score_id(&score.student, &score.assessment)? {
                Some(id) => {
                    score.id = Some(id.clone());
                    let document = encode(collections::SCORES, &score)?;
                    self.store.update(collections::SCORES, &id, document)?;
                    summary.updated += 1;
                }
                None => {
                    let document = encode(collections::SCORES, &score)?;
                    self.store.create(collections::SCORES, document)?;
                    summary.created += 1;
                }
            }
        }

        Ok(summary)
    }

    fn course_assessments(
        &self,
        course_instance: &CourseInstanceId,
    ) -> Result<Vec<Assessment>, ScoreImportError> {
        let filter = Filter::new().eq("courseInstance", course_instance.0.clone());
        let documents = self.store.find(collections::ASSESSMENTS, &filter, 0)?;
        documents
            .into_iter()
            .map(|document| decode(collections::ASSESSMENTS, document))
            .collect::<Result<_, _>>()
            .map_err(Into::into)
    }

    fn university_configuration(
        &self,
        course_instance: &CourseInstanceId,
    ) -> Result<UniversityConfiguration, ScoreImportError> {
        let university = resolve_university(self.store.as_ref(), course_instance)?;
        let filter = Filter::new().eq("university", university.0.clone());
        let document = self
            .store
            .find(collections::UNIVERSITY_CONFIGURATIONS, &filter, 0)?
            .into_iter()
            .next()
            .ok_or(ScoreImportError::ConfigurationNotFound(university))?;
        Ok(decode(collections::UNIVERSITY_CONFIGURATIONS, document)?)
    }

    fn existing_score_id(
        &self,
        student: &StudentId,
        assessment: &AssessmentId,
    ) -> Result<Option<String>, ScoreImportError> {
        let filter = Filter::new()
            .eq("student", student.0.clone())
            .eq("assessment", assessment.0.clone());
        let existing = self
            .store
            .find(collections::SCORES, &filter, 0)?
            .into_iter()
            .next();

        match existing {
            Some(document) => {
                let score: Score = decode(collections::SCORES, document)?;
                let id = score.id.ok_or_else(|| StoreError::Malformed {
                    collection: collections::SCORES.to_string(),
                    detail: "stored score is missing its id".to_string(),
                })?;
                Ok(Some(id))
            }
            None => Ok(None),
        }
    }
}

fn build_score(
    row: &ScoreRow,
    configuration: &UniversityConfiguration,
    graded_by: &str,
) -> Result<Score, ScoreImportError> {
    let max_value = row.max_value.unwrap_or(100.0);
    if max_value <= 0.0 {
        return Err(ScoreImportError::InvalidRow {
            line: row.line,
            detail: format!("max score {max_value} must be positive"),
        });
    }
    if row.value < 0.0 || row.value > max_value {
        return Err(ScoreImportError::InvalidRow {
            line: row.line,
            detail: format!("score {} is outside 0..={max_value}", row.value),
        });
    }

    let late_penalty_amount = if row.days_late > 0 {
        row.value * configuration.late_penalty_percent_per_day / 100.0 * row.days_late as f64
    } else {
        0.0
    };
    let final_value = (row.value - late_penalty_amount).max(0.0);

    Ok(Score {
        id: None,
        student: StudentId(row.student.clone()),
        assessment: AssessmentId(row.assessment.clone()),
        value: row.value,
        max_value,
        percentage: row.value / max_value * 100.0,
        late_penalty_applied: late_penalty_amount > 0.0,
        late_penalty_amount,
        final_value,
        is_excused: row.excused,
        graded_by: Some(graded_by.to_string()),
        graded_at: Some(Utc::now()),
    })
}
