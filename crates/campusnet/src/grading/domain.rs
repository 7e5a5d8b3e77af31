use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Identifier wrapper for student records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StudentId(pub String);

/// Identifier wrapper for enrollment records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnrollmentId(pub String);

/// Identifier wrapper for course-instance records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CourseInstanceId(pub String);

/// Identifier wrapper for assessment-template records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssessmentTemplateId(pub String);

/// Identifier wrapper for assessment records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssessmentId(pub String);

/// Identifier wrapper for university records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UniversityId(pub String);

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for EnrollmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for CourseInstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for AssessmentTemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for AssessmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for UniversityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle of a student's registration in a course instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    Pending,
    Active,
    Dropped,
    Completed,
    Failed,
    Withdrawn,
}

impl EnrollmentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            EnrollmentStatus::Pending => "pending",
            EnrollmentStatus::Active => "active",
            EnrollmentStatus::Dropped => "dropped",
            EnrollmentStatus::Completed => "completed",
            EnrollmentStatus::Failed => "failed",
            EnrollmentStatus::Withdrawn => "withdrawn",
        }
    }
}

/// A student's registration in one course instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub student: StudentId,
    pub course_instance: CourseInstanceId,
    pub status: EnrollmentStatus,
    #[serde(default)]
    pub credits_earned: f64,
}

/// Category of a gradable component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssessmentType {
    Exam,
    Assignment,
    Quiz,
    Project,
    Lab,
    Participation,
    Other,
}

/// Reusable definition of a gradable component of a course instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentTemplate {
    pub id: AssessmentTemplateId,
    pub course_instance: CourseInstanceId,
    pub name: String,
    pub weight_percent: f64,
    pub min_score: f64,
    pub max_score: f64,
    #[serde(default)]
    pub is_optional: bool,
    pub assessment_type: AssessmentType,
}

/// Publication state of a scheduled assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssessmentStatus {
    Draft,
    Open,
    Locked,
    Published,
}

impl AssessmentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            AssessmentStatus::Draft => "draft",
            AssessmentStatus::Open => "open",
            AssessmentStatus::Locked => "locked",
            AssessmentStatus::Published => "published",
        }
    }

    /// Draft and open assessments still accept score changes; only locked and
    /// published ones contribute to a final grade.
    pub const fn is_final(self) -> bool {
        matches!(self, AssessmentStatus::Locked | AssessmentStatus::Published)
    }
}

/// A scheduled, dated occurrence of a template for a course instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub id: AssessmentId,
    pub course_instance: CourseInstanceId,
    pub assessment_template: AssessmentTemplateId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<DateTime<Utc>>,
    pub status: AssessmentStatus,
}

/// A student's raw and penalty-adjusted result for one assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub student: StudentId,
    pub assessment: AssessmentId,
    pub value: f64,
    pub max_value: f64,
    #[serde(default)]
    pub percentage: f64,
    #[serde(default)]
    pub late_penalty_applied: bool,
    #[serde(default)]
    pub late_penalty_amount: f64,
    pub final_value: f64,
    #[serde(default)]
    pub is_excused: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graded_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graded_at: Option<DateTime<Utc>>,
}

/// One row of a university's grading scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeMapping {
    pub min_score: f64,
    pub max_score: f64,
    pub letter_grade: String,
    pub numeric_grade: f64,
    pub is_passing: bool,
}

/// Ordered table mapping numeric ranges to letter grades and GPA points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingScale {
    pub id: String,
    pub university: UniversityId,
    pub name: String,
    pub pass_threshold: f64,
    pub mappings: Vec<GradeMapping>,
}

/// Tie-breaking rule applied when rounding a final numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoundingRule {
    Bankers,
    RoundHalfUp,
    RoundHalfDown,
    Standard,
}

impl Default for RoundingRule {
    fn default() -> Self {
        RoundingRule::Standard
    }
}

// Unrecognized rule names fall back to standard rounding rather than failing
// the whole calculation.
impl<'de> Deserialize<'de> for RoundingRule {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.trim() {
            "bankers" => RoundingRule::Bankers,
            "round-half-up" => RoundingRule::RoundHalfUp,
            "round-half-down" => RoundingRule::RoundHalfDown,
            _ => RoundingRule::Standard,
        })
    }
}

/// University-level grading policy knobs.
///
/// The retake and late-penalty settings are consumed by score entry, not by
/// the calculation engine itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniversityConfiguration {
    pub id: String,
    pub university: UniversityId,
    #[serde(default)]
    pub rounding_rule: RoundingRule,
    pub decimal_precision: u8,
    #[serde(default)]
    pub max_retake_attempts: u8,
    #[serde(default)]
    pub late_penalty_percent_per_day: f64,
}

/// Final pass/fail outcome of a calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PassFail {
    Pass,
    Fail,
    Incomplete,
}

impl PassFail {
    pub const fn label(self) -> &'static str {
        match self {
            PassFail::Pass => "pass",
            PassFail::Fail => "fail",
            PassFail::Incomplete => "incomplete",
        }
    }
}

/// Per-template contribution detail retained for transcript audits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentBreakdownEntry {
    pub assessment_template: AssessmentTemplateId,
    pub score: f64,
    pub max_score: f64,
    /// Raw weight percent as authored on the template.
    pub weight: f64,
    pub contribution: f64,
    pub is_missing: bool,
    pub is_excused: bool,
}

/// Outcome of one grade calculation, before persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeCalculationResult {
    pub enrollment: EnrollmentId,
    pub final_numeric: f64,
    pub final_letter: String,
    pub pass_fail: PassFail,
    pub gpa_points: f64,
    pub calculation_method: String,
    pub assessment_breakdown: Vec<AssessmentBreakdownEntry>,
}

/// The persisted final-grade record for one enrollment.
///
/// Created and refreshed exclusively by the calculation engine; publication is
/// a separate manual action, so the engine never sets `is_published`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeAggregate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub enrollment: EnrollmentId,
    pub final_numeric: f64,
    pub final_letter: String,
    pub pass_fail: PassFail,
    pub gpa_points: f64,
    pub calculation_method: String,
    pub assessment_breakdown: Vec<AssessmentBreakdownEntry>,
    pub calculated_at: DateTime<Utc>,
    pub calculated_by: String,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}
