use serde::Deserialize;

use super::domain::{CourseInstanceId, UniversityId};
use super::store::{collections, decode, DocumentStore, StoreError};

// Minimal record shapes for the relationship hops; only the outgoing
// reference of each hop is needed here.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CourseInstanceRecord {
    course_variation: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CourseVariationRecord {
    department: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DepartmentRecord {
    faculty: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FacultyRecord {
    university: UniversityId,
}

/// Failure of one named hop in the institution chain.
#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    #[error("course instance {0} not found")]
    CourseInstanceNotFound(CourseInstanceId),
    #[error("course variation {variation} referenced by course instance {instance} not found")]
    CourseVariationNotFound {
        instance: CourseInstanceId,
        variation: String,
    },
    #[error("department {department} referenced by course variation {variation} not found")]
    DepartmentNotFound {
        variation: String,
        department: String,
    },
    #[error("faculty {faculty} referenced by department {department} not found")]
    FacultyNotFound { department: String, faculty: String },
    #[error("university {university} referenced by faculty {faculty} not found")]
    UniversityNotFound {
        faculty: String,
        university: UniversityId,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Walk course instance -> course variation -> department -> faculty ->
/// university, one named lookup per hop so a broken link reports exactly
/// where the chain snapped.
pub fn resolve_university<S: DocumentStore>(
    store: &S,
    course_instance: &CourseInstanceId,
) -> Result<UniversityId, ResolutionError> {
    let document = store
        .find_by_id(collections::COURSE_INSTANCES, &course_instance.0, 0)?
        .ok_or_else(|| ResolutionError::CourseInstanceNotFound(course_instance.clone()))?;
    let instance: CourseInstanceRecord = decode(collections::COURSE_INSTANCES, document)?;

    let document = store
        .find_by_id(collections::COURSE_VARIATIONS, &instance.course_variation, 0)?
        .ok_or_else(|| ResolutionError::CourseVariationNotFound {
            instance: course_instance.clone(),
            variation: instance.course_variation.clone(),
        })?;
    let variation: CourseVariationRecord = decode(collections::COURSE_VARIATIONS, document)?;

    let document = store
        .find_by_id(collections::DEPARTMENTS, &variation.department, 0)?
        .ok_or_else(|| ResolutionError::DepartmentNotFound {
            variation: instance.course_variation.clone(),
            department: variation.department.clone(),
        })?;
    let department: DepartmentRecord = decode(collections::DEPARTMENTS, document)?;

    let document = store
        .find_by_id(collections::FACULTIES, &department.faculty, 0)?
        .ok_or_else(|| ResolutionError::FacultyNotFound {
            department: variation.department.clone(),
            faculty: department.faculty.clone(),
        })?;
    let faculty: FacultyRecord = decode(collections::FACULTIES, document)?;

    store
        .find_by_id(collections::UNIVERSITIES, &faculty.university.0, 0)?
        .ok_or_else(|| ResolutionError::UniversityNotFound {
            faculty: department.faculty.clone(),
            university: faculty.university.clone(),
        })?;

    Ok(faculty.university)
}
