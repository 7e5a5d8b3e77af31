use crate::grading::domain::{GradeMapping, GradingScale};

/// Letter/GPA outcome of a grading-scale lookup.
pub(crate) struct GradeBand {
    pub(crate) letter: String,
    pub(crate) gpa_points: f64,
    pub(crate) is_passing: bool,
}

impl From<&GradeMapping> for GradeBand {
    fn from(mapping: &GradeMapping) -> Self {
        GradeBand {
            letter: mapping.letter_grade.clone(),
            gpa_points: mapping.numeric_grade,
            is_passing: mapping.is_passing,
        }
    }
}

/// First mapping whose inclusive range contains the rounded score wins. A
/// score outside every range falls back to the last (lowest) mapping, and an
/// empty scale yields a hardcoded failing F.
pub(crate) fn resolve_band(scale: &GradingScale, rounded_score: f64) -> GradeBand {
    scale
        .mappings
        .iter()
        .find(|mapping| mapping.min_score <= rounded_score && rounded_score <= mapping.max_score)
        .or_else(|| scale.mappings.last())
        .map(GradeBand::from)
        .unwrap_or_else(|| GradeBand {
            letter: "F".to_string(),
            gpa_points: 0.0,
            is_passing: false,
        })
}
