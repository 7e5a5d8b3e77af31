use std::collections::HashMap;

use crate::grading::domain::{
    Assessment, AssessmentBreakdownEntry, AssessmentTemplate, Score,
};

/// Intermediate totals produced by the aggregation pass.
pub(crate) struct WeightedAggregate {
    pub(crate) breakdown: Vec<AssessmentBreakdownEntry>,
    pub(crate) total_weighted_score: f64,
    pub(crate) total_weight: f64,
    pub(crate) has_missing_required: bool,
}

impl WeightedAggregate {
    /// Renormalized against the weight that actually contributed, so excused
    /// and missing components never zero out the denominator. A fully excused
    /// enrollment yields 0 rather than a division error.
    pub(crate) fn raw_final_score(&self) -> f64 {
        if self.total_weight > 0.0 {
            self.total_weighted_score / self.total_weight
        } else {
            0.0
        }
    }
}

/// Fold every template into a breakdown entry and accumulate the weighted
/// totals. A template's score is located through its finalized assessment;
/// when several scores could match, the first in scan order wins.
pub(crate) fn aggregate(
    templates: &[AssessmentTemplate],
    assessments: &[Assessment],
    scores: &[Score],
) -> WeightedAggregate {
    let template_of_assessment: HashMap<_, _> = assessments
        .iter()
        .map(|assessment| (&assessment.id, &assessment.assessment_template))
        .collect();

    let mut breakdown = Vec::with_capacity(templates.len());
    let mut total_weighted_score = 0.0;
    let mut total_weight = 0.0;
    let mut has_missing_required = false;

    for template in templates {
        let score = scores.iter().find(|score| {
            template_of_assessment.get(&score.assessment) == Some(&&template.id)
        });

        let is_missing = score.is_none() && !template.is_optional;
        let is_excused = score.map(|score| score.is_excused).unwrap_or(false);
        let score_value = score.map(|score| score.final_value).unwrap_or(0.0);
        let weight = template.weight_percent / 100.0;
        let contribution = if is_excused { 0.0 } else { score_value * weight };

        breakdown.push(AssessmentBreakdownEntry {
            assessment_template: template.id.clone(),
            score: score_value,
            max_score: template.max_score,
            weight: template.weight_percent,
            contribution,
            is_missing,
            is_excused,
        });

        if is_missing {
            has_missing_required = true;
            continue;
        }
        if is_excused {
            continue;
        }

        total_weighted_score += contribution;
        total_weight += weight;
    }

    WeightedAggregate {
        breakdown,
        total_weighted_score,
        total_weight,
        has_missing_required,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grading::domain::{
        AssessmentId, AssessmentStatus, AssessmentTemplateId, AssessmentType, CourseInstanceId,
        StudentId,
    };

    fn template(id: &str, weight: f64, optional: bool) -> AssessmentTemplate {
        AssessmentTemplate {
            id: AssessmentTemplateId(id.to_string()),
            course_instance: CourseInstanceId("ci-1".to_string()),
            name: id.to_string(),
            weight_percent: weight,
            min_score: 0.0,
            max_score: 100.0,
            is_optional: optional,
            assessment_type: AssessmentType::Exam,
        }
    }

    fn assessment(id: &str, template: &str) -> Assessment {
        Assessment {
            id: AssessmentId(id.to_string()),
            course_instance: CourseInstanceId("ci-1".to_string()),
            assessment_template: AssessmentTemplateId(template.to_string()),
            scheduled_for: None,
            status: AssessmentStatus::Locked,
        }
    }

    fn score(assessment: &str, final_value: f64, excused: bool) -> Score {
        Score {
            id: Some(format!("score-{assessment}")),
            student: StudentId("stu-1".to_string()),
            assessment: AssessmentId(assessment.to_string()),
            value: final_value,
            max_value: 100.0,
            percentage: final_value,
            late_penalty_applied: false,
            late_penalty_amount: 0.0,
            final_value,
            is_excused: excused,
            graded_by: None,
            graded_at: None,
        }
    }

    #[test]
    fn renormalizes_against_contributing_weight_only() {
        let templates = vec![
            template("midterm", 40.0, false),
            template("final", 60.0, false),
            template("quiz", 20.0, false),
        ];
        let assessments = vec![
            assessment("a-mid", "midterm"),
            assessment("a-fin", "final"),
            assessment("a-quiz", "quiz"),
        ];
        let scores = vec![
            score("a-mid", 80.0, false),
            score("a-fin", 90.0, false),
            score("a-quiz", 70.0, true),
        ];

        let aggregate = aggregate(&templates, &assessments, &scores);

        assert!(!aggregate.has_missing_required);
        assert!((aggregate.total_weight - 1.0).abs() < 1e-9);
        let expected = (80.0 * 0.4 + 90.0 * 0.6) / 1.0;
        assert!((aggregate.raw_final_score() - expected).abs() < 1e-9);
    }

    #[test]
    fn all_excused_yields_zero_without_dividing() {
        let templates = vec![template("midterm", 50.0, false), template("final", 50.0, false)];
        let assessments = vec![assessment("a-mid", "midterm"), assessment("a-fin", "final")];
        let scores = vec![score("a-mid", 80.0, true), score("a-fin", 90.0, true)];

        let aggregate = aggregate(&templates, &assessments, &scores);

        assert_eq!(aggregate.total_weight, 0.0);
        assert_eq!(aggregate.raw_final_score(), 0.0);
        assert!(!aggregate.has_missing_required);
    }

    #[test]
    fn missing_required_template_sets_flag() {
        let templates = vec![template("midterm", 40.0, false), template("final", 60.0, false)];
        let assessments = vec![assessment("a-mid", "midterm"), assessment("a-fin", "final")];
        let scores = vec![score("a-mid", 80.0, false)];

        let aggregate = aggregate(&templates, &assessments, &scores);

        assert!(aggregate.has_missing_required);
        let entry = aggregate
            .breakdown
            .iter()
            .find(|entry| entry.assessment_template.0 == "final")
            .expect("final entry present");
        assert!(entry.is_missing);
        assert_eq!(entry.contribution, 0.0);
        // Only the midterm contributed, so it alone defines the average.
        assert!((aggregate.raw_final_score() - 80.0).abs() < 1e-9);
    }

    #[test]
    fn missing_optional_template_counts_as_zero_not_missing() {
        let templates = vec![template("final", 60.0, false), template("bonus", 0.0, true)];
        let assessments = vec![assessment("a-fin", "final"), assessment("a-bonus", "bonus")];
        let scores = vec![score("a-fin", 90.0, false)];

        let aggregate = aggregate(&templates, &assessments, &scores);

        assert!(!aggregate.has_missing_required);
        let entry = aggregate
            .breakdown
            .iter()
            .find(|entry| entry.assessment_template.0 == "bonus")
            .expect("bonus entry present");
        assert!(!entry.is_missing);
        assert!(!entry.is_excused);
        assert_eq!(entry.score, 0.0);
    }

    #[test]
    fn first_matching_score_wins_for_a_template() {
        let templates = vec![template("midterm", 100.0, false)];
        let assessments = vec![assessment("a-1", "midterm"), assessment("a-2", "midterm")];
        let scores = vec![score("a-1", 70.0, false), score("a-2", 95.0, false)];

        let aggregate = aggregate(&templates, &assessments, &scores);

        assert!((aggregate.raw_final_score() - 70.0).abs() < 1e-9);
    }
}
