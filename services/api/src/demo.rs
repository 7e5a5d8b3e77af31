use crate::infra::{seed_demo_records, DemoDataset, InMemoryDocumentStore};
use campusnet::error::AppError;
use campusnet::grading::{
    collections, DocumentStore, EnrollmentId, GradeCalculationEngine, GradeCalculationResult,
    ScoreImporter,
};
use chrono::Utc;
use clap::Args;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct CalculateArgs {
    /// Enrollment to calculate (defaults to the first demo enrollment)
    #[arg(long)]
    pub(crate) enrollment: Option<String>,
    /// Optional gradebook CSV export to import before calculating
    #[arg(long)]
    pub(crate) scores_csv: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Optional gradebook CSV export to import into the demo course
    #[arg(long)]
    pub(crate) scores_csv: Option<PathBuf>,
    /// Leave aggregates unpublished instead of walking the publication step
    #[arg(long)]
    pub(crate) skip_publish: bool,
}

pub(crate) fn run_calculate(args: CalculateArgs) -> Result<(), AppError> {
    let CalculateArgs {
        enrollment,
        scores_csv,
    } = args;

    let (store, dataset) = seeded_store()?;
    import_scores(&store, &dataset, scores_csv)?;

    let enrollment = enrollment
        .map(EnrollmentId)
        .or_else(|| {
            dataset
                .enrollments
                .first()
                .map(|(enrollment, _)| enrollment.clone())
        })
        .ok_or_else(|| AppError::Io(std::io::Error::other("demo dataset has no enrollments")))?;

    let engine = GradeCalculationEngine::new(store);
    let result = engine.calculate_grade(&enrollment).map_err(AppError::from)?;
    render_result(&result);

    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        scores_csv,
        skip_publish,
    } = args;

    println!("Campusnet grade calculation demo");

    let (store, dataset) = seeded_store()?;
    import_scores(&store, &dataset, scores_csv)?;

    let engine = GradeCalculationEngine::new(store.clone());

    println!("\nCalculating grades for {} enrollments", dataset.enrollments.len());
    for (enrollment, student) in &dataset.enrollments {
        println!("\nEnrollment {} (student {})", enrollment, student);
        let result = engine.calculate_grade(enrollment).map_err(AppError::from)?;
        render_result(&result);

        let aggregate = engine
            .update_grade_aggregate(enrollment)
            .map_err(AppError::from)?;
        println!(
            "  Aggregate stored as {} (calculated at {})",
            aggregate.id.as_deref().unwrap_or("<unassigned>"),
            aggregate.calculated_at
        );

        if !skip_publish {
            if let Some(id) = aggregate.id.as_deref() {
                publish_aggregate(&store, id)?;
                println!("  Registrar published the aggregate");
            }
        }
    }

    println!("\nGPA summary (published aggregates only)");
    for (_, student) in &dataset.enrollments {
        let gpa = engine.calculate_student_gpa(student).map_err(AppError::from)?;
        println!("- {}: {:.2}", student, gpa);
    }

    Ok(())
}

fn seeded_store() -> Result<(Arc<InMemoryDocumentStore>, DemoDataset), AppError> {
    let store = Arc::new(InMemoryDocumentStore::default());
    let dataset = seed_demo_records(store.as_ref()).map_err(|err| {
        AppError::Grading(campusnet::grading::GradeCalculationError::Store(err))
    })?;
    Ok((store, dataset))
}

fn import_scores(
    store: &Arc<InMemoryDocumentStore>,
    dataset: &DemoDataset,
    scores_csv: Option<PathBuf>,
) -> Result<(), AppError> {
    let Some(path) = scores_csv else {
        return Ok(());
    };

    let importer = ScoreImporter::new(store.clone());
    let summary = importer
        .from_path(&path, &dataset.course_instance)
        .map_err(AppError::from)?;
    println!(
        "Imported scores from {}: {} created, {} updated, {} excused, {} skipped",
        path.display(),
        summary.created,
        summary.updated,
        summary.excused,
        summary.skipped_unknown_assessment
    );

    Ok(())
}

fn publish_aggregate(store: &InMemoryDocumentStore, aggregate_id: &str) -> Result<(), AppError> {
    let document = store
        .find_by_id(collections::GRADE_AGGREGATES, aggregate_id, 0)
        .map_err(store_error)?;
    let Some(mut document) = document else {
        return Ok(());
    };

    if let Some(map) = document.as_object_mut() {
        map.insert("isPublished".to_string(), json!(true));
        map.insert(
            "publishedAt".to_string(),
            Value::from(Utc::now().to_rfc3339()),
        );
    }
    store
        .update(collections::GRADE_AGGREGATES, aggregate_id, document)
        .map_err(store_error)?;

    Ok(())
}

fn store_error(err: campusnet::grading::StoreError) -> AppError {
    AppError::Grading(campusnet::grading::GradeCalculationError::Store(err))
}

fn render_result(result: &GradeCalculationResult) {
    println!(
        "  Final grade: {:.2} -> {} ({}), GPA points {:.1}",
        result.final_numeric,
        result.final_letter,
        result.pass_fail.label(),
        result.gpa_points
    );
    println!("  Method: {}", result.calculation_method);
    println!("  Breakdown:");
    for entry in &result.assessment_breakdown {
        let status = if entry.is_excused {
            " [excused]"
        } else if entry.is_missing {
            " [missing]"
        } else {
            ""
        };
        println!(
            "    - {}: {:.1}/{:.0} at weight {:.0}% -> {:.2}{}",
            entry.assessment_template, entry.score, entry.max_score, entry.weight,
            entry.contribution, status
        );
    }
}
