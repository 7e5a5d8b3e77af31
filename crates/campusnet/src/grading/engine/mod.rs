//! The grade calculation engine.
//!
//! Calculation runs in three phases: gather the enrollment's records from the
//! document store, fold templates and scores into a weighted aggregate, then
//! map the rounded result onto the owning university's grading scale. Reads
//! are issued sequentially and a single upsert persists the outcome; there is
//! no cross-call locking, so recalculation is last-write-wins and relies on
//! being idempotent for stable inputs.

mod mapping;
mod rounding;
mod weighted;

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use super::domain::{
    Assessment, AssessmentStatus, Enrollment, EnrollmentId, GradeAggregate,
    GradeCalculationResult, GradingScale, PassFail, Score, StudentId, UniversityConfiguration,
    UniversityId,
};
use super::resolver::{resolve_university, ResolutionError};
use super::store::{collections, decode, encode, DocumentStore, Filter, StoreError};

/// Method label recorded on every aggregate this engine writes.
pub const CALCULATION_METHOD_WEIGHTED_AVERAGE: &str = "weighted-average";

const DEFAULT_CALCULATED_BY: &str = "grade-engine";

/// Error raised by the calculation operations.
#[derive(Debug, thiserror::Error)]
pub enum GradeCalculationError {
    #[error("enrollment {0} not found")]
    EnrollmentNotFound(EnrollmentId),
    #[error("no grading scale configured for university {0}")]
    GradingScaleNotFound(UniversityId),
    #[error("no configuration found for university {0}")]
    ConfigurationNotFound(UniversityId),
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl GradeCalculationError {
    /// A referenced record is absent, as opposed to malformed content or a
    /// store fault.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::EnrollmentNotFound(_)
            | Self::GradingScaleNotFound(_)
            | Self::ConfigurationNotFound(_) => true,
            Self::Resolution(ResolutionError::Store(_)) => false,
            Self::Resolution(_) => true,
            Self::Store(StoreError::NotFound { .. }) => true,
            Self::Store(_) => false,
        }
    }

    /// A record was present but failed boundary validation.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::Store(StoreError::Malformed { .. })
                | Self::Resolution(ResolutionError::Store(StoreError::Malformed { .. }))
        )
    }
}

/// Deterministically derives grade aggregates from an enrollment's assessment
/// data and the owning university's grading policy.
pub struct GradeCalculationEngine<S> {
    store: Arc<S>,
    calculated_by: String,
}

impl<S: DocumentStore> GradeCalculationEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_calculated_by(store, DEFAULT_CALCULATED_BY)
    }

    pub fn with_calculated_by(store: Arc<S>, calculated_by: impl Into<String>) -> Self {
        Self {
            store,
            calculated_by: calculated_by.into(),
        }
    }

    /// Compute the weighted final grade for one enrollment without persisting
    /// anything.
    pub fn calculate_grade(
        &self,
        enrollment_id: &EnrollmentId,
    ) -> Result<GradeCalculationResult, GradeCalculationError> {
        let enrollment = self.load_enrollment(enrollment_id)?;
        let assessments = self.load_final_assessments(&enrollment)?;
        let templates = self.load_templates(&enrollment)?;
        let scores = self.load_scores(&enrollment.student, &assessments)?;

        let university = resolve_university(self.store.as_ref(), &enrollment.course_instance)?;
        let scale = self.load_grading_scale(&university)?;
        let configuration = self.load_configuration(&university)?;

        let aggregate = weighted::aggregate(&templates, &assessments, &scores);
        let final_numeric = rounding::round_score(
            aggregate.raw_final_score(),
            configuration.rounding_rule,
            configuration.decimal_precision,
        );
        let band = mapping::resolve_band(&scale, final_numeric);

        // Missing required work overrides whatever the band would award.
        let pass_fail = if aggregate.has_missing_required {
            PassFail::Incomplete
        } else if band.is_passing {
            PassFail::Pass
        } else {
            PassFail::Fail
        };

        Ok(GradeCalculationResult {
            enrollment: enrollment_id.clone(),
            final_numeric,
            final_letter: band.letter,
            pass_fail,
            gpa_points: band.gpa_points,
            calculation_method: CALCULATION_METHOD_WEIGHTED_AVERAGE.to_string(),
            assessment_breakdown: aggregate.breakdown,
        })
    }

    /// Unweighted mean of GPA points across the student's published
    /// aggregates; 0 when none are published.
    pub fn calculate_student_gpa(
        &self,
        student_id: &StudentId,
    ) -> Result<f64, GradeCalculationError> {
        let filter = Filter::new().eq("student", student_id.0.clone());
        let documents = self.store.find(collections::ENROLLMENTS, &filter, 0)?;
        let enrollments = documents
            .into_iter()
            .map(|document| decode::<Enrollment>(collections::ENROLLMENTS, document))
            .collect::<Result<Vec<_>, _>>()?;
        if enrollments.is_empty() {
            return Ok(0.0);
        }

        let enrollment_ids = enrollments
            .iter()
            .map(|enrollment| Value::from(enrollment.id.0.clone()))
            .collect();
        let filter = Filter::new()
            .any_of("enrollment", enrollment_ids)
            .eq("isPublished", true);
        let documents = self.store.find(collections::GRADE_AGGREGATES, &filter, 0)?;
        let aggregates = documents
            .into_iter()
            .map(|document| decode::<GradeAggregate>(collections::GRADE_AGGREGATES, document))
            .collect::<Result<Vec<_>, _>>()?;
        if aggregates.is_empty() {
            return Ok(0.0);
        }

        let total: f64 = aggregates.iter().map(|aggregate| aggregate.gpa_points).sum();
        Ok(total / aggregates.len() as f64)
    }

    /// Recalculate and upsert the enrollment's grade aggregate. Publication
    /// state is left exactly as stored; stamping `calculated_at` happens on
    /// every call.
    pub fn update_grade_aggregate(
        &self,
        enrollment_id: &EnrollmentId,
    ) -> Result<GradeAggregate, GradeCalculationError> {
        let result = self.calculate_grade(enrollment_id)?;

        let filter = Filter::new().eq("enrollment", enrollment_id.0.clone());
        let existing = self
            .store
            .find(collections::GRADE_AGGREGATES, &filter, 0)?
            .into_iter()
            .next();

        let mut aggregate = GradeAggregate {
            id: None,
            enrollment: result.enrollment,
            final_numeric: result.final_numeric,
            final_letter: result.final_letter,
            pass_fail: result.pass_fail,
            gpa_points: result.gpa_points,
            calculation_method: result.calculation_method,
            assessment_breakdown: result.assessment_breakdown,
            calculated_at: Utc::now(),
            calculated_by: self.calculated_by.clone(),
            is_published: false,
            published_at: None,
        };

        let stored = match existing {
            Some(document) => {
                let current: GradeAggregate = decode(collections::GRADE_AGGREGATES, document)?;
                let id = current.id.clone().ok_or_else(|| StoreError::Malformed {
                    collection: collections::GRADE_AGGREGATES.to_string(),
                    detail: "stored aggregate is missing its id".to_string(),
                })?;
                aggregate.id = current.id;
                aggregate.is_published = current.is_published;
                aggregate.published_at = current.published_at;
                let document = encode(collections::GRADE_AGGREGATES, &aggregate)?;
                self.store
                    .update(collections::GRADE_AGGREGATES, &id, document)?
            }
            None => {
                let document = encode(collections::GRADE_AGGREGATES, &aggregate)?;
                self.store.create(collections::GRADE_AGGREGATES, document)?
            }
        };

        Ok(decode(collections::GRADE_AGGREGATES, stored)?)
    }

    fn load_enrollment(
        &self,
        enrollment_id: &EnrollmentId,
    ) -> Result<Enrollment, GradeCalculationError> {
        let document = self
            .store
            .find_by_id(collections::ENROLLMENTS, &enrollment_id.0, 0)?
            .ok_or_else(|| GradeCalculationError::EnrollmentNotFound(enrollment_id.clone()))?;
        Ok(decode(collections::ENROLLMENTS, document)?)
    }

    fn load_final_assessments(
        &self,
        enrollment: &Enrollment,
    ) -> Result<Vec<Assessment>, GradeCalculationError> {
        let filter = Filter::new()
            .eq("courseInstance", enrollment.course_instance.0.clone())
            .any_of(
                "status",
                vec![
                    Value::from(AssessmentStatus::Locked.label()),
                    Value::from(AssessmentStatus::Published.label()),
                ],
            );
        let documents = self.store.find(collections::ASSESSMENTS, &filter, 0)?;
        documents
            .into_iter()
            .map(|document| decode(collections::ASSESSMENTS, document))
            .collect::<Result<_, _>>()
            .map_err(Into::into)
    }

    fn load_templates(
        &self,
        enrollment: &Enrollment,
    ) -> Result<Vec<super::domain::AssessmentTemplate>, GradeCalculationError> {
        let filter = Filter::new().eq("courseInstance", enrollment.course_instance.0.clone());
        let documents = self
            .store
            .find(collections::ASSESSMENT_TEMPLATES, &filter, 0)?;
        documents
            .into_iter()
            .map(|document| decode(collections::ASSESSMENT_TEMPLATES, document))
            .collect::<Result<_, _>>()
            .map_err(Into::into)
    }

    fn load_scores(
        &self,
        student: &StudentId,
        assessments: &[Assessment],
    ) -> Result<Vec<Score>, GradeCalculationError> {
        if assessments.is_empty() {
            return Ok(Vec::new());
        }

        let assessment_ids = assessments
            .iter()
            .map(|assessment| Value::from(assessment.id.0.clone()))
            .collect();
        let filter = Filter::new()
            .eq("student", student.0.clone())
            .any_of("assessment", assessment_ids);
        let documents = self.store.find(collections::SCORES, &filter, 0)?;
        documents
            .into_iter()
            .map(|document| decode(collections::SCORES, document))
            .collect::<Result<_, _>>()
            .map_err(Into::into)
    }

    fn load_grading_scale(
        &self,
        university: &UniversityId,
    ) -> Result<GradingScale, GradeCalculationError> {
        let filter = Filter::new().eq("university", university.0.clone());
        let document = self
            .store
            .find(collections::GRADING_SCALES, &filter, 0)?
            .into_iter()
            .next()
            .ok_or_else(|| GradeCalculationError::GradingScaleNotFound(university.clone()))?;
        Ok(decode(collections::GRADING_SCALES, document)?)
    }

    fn load_configuration(
        &self,
        university: &UniversityId,
    ) -> Result<UniversityConfiguration, GradeCalculationError> {
        let filter = Filter::new().eq("university", university.0.clone());
        let document = self
            .store
            .find(collections::UNIVERSITY_CONFIGURATIONS, &filter, 0)?
            .into_iter()
            .next()
            .ok_or_else(|| GradeCalculationError::ConfigurationNotFound(university.clone()))?;
        Ok(decode(collections::UNIVERSITY_CONFIGURATIONS, document)?)
    }
}
