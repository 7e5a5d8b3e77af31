//! Grade calculation for student enrollments.
//!
//! The engine gathers assessment templates, finalized assessments, scores,
//! and the owning university's grading policy from the document store, then
//! derives a weighted final grade, letter grade, pass/fail outcome, and GPA
//! contribution. Score entry from gradebook CSV exports lives here too.

pub mod domain;
pub mod engine;
pub mod imports;
pub mod resolver;
pub mod router;
pub mod store;

#[cfg(test)]
mod tests;

pub use domain::{
    Assessment, AssessmentBreakdownEntry, AssessmentId, AssessmentStatus, AssessmentTemplate,
    AssessmentTemplateId, AssessmentType, CourseInstanceId, Enrollment, EnrollmentId,
    EnrollmentStatus, GradeAggregate, GradeCalculationResult, GradeMapping, GradingScale,
    PassFail, RoundingRule, Score, StudentId, UniversityConfiguration, UniversityId,
};
pub use engine::{
    GradeCalculationEngine, GradeCalculationError, CALCULATION_METHOD_WEIGHTED_AVERAGE,
};
pub use imports::{ScoreImportError, ScoreImportSummary, ScoreImporter};
pub use resolver::{resolve_university, ResolutionError};
pub use router::grading_router;
pub use store::{collections, decode, encode, Document, DocumentStore, Filter, StoreError};
