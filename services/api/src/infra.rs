use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use campusnet::grading::{
    collections, CourseInstanceId, Document, DocumentStore, EnrollmentId, Filter, StoreError,
    StudentId,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{json, Value};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Mutex-guarded stand-in for the host CMS's document store. Ids are assigned
/// sequentially per process when a record arrives without one.
#[derive(Default, Clone)]
pub(crate) struct InMemoryDocumentStore {
    collections: Arc<Mutex<HashMap<String, Vec<Document>>>>,
    sequence: Arc<AtomicU64>,
}

impl InMemoryDocumentStore {
    fn next_id(&self, collection: &str) -> String {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        format!("{collection}-{id:06}")
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn find(
        &self,
        collection: &str,
        filter: &Filter,
        _depth: u8,
    ) -> Result<Vec<Document>, StoreError> {
        let guard = self.collections.lock().expect("document store mutex poisoned");
        Ok(guard
            .get(collection)
            .map(|documents| {
                documents
                    .iter()
                    .filter(|document| filter.matches(document))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn find_by_id(
        &self,
        collection: &str,
        id: &str,
        _depth: u8,
    ) -> Result<Option<Document>, StoreError> {
        let guard = self.collections.lock().expect("document store mutex poisoned");
        Ok(guard.get(collection).and_then(|documents| {
            documents
                .iter()
                .find(|document| document.get("id").and_then(Value::as_str) == Some(id))
                .cloned()
        }))
    }

    fn create(&self, collection: &str, mut document: Document) -> Result<Document, StoreError> {
        let id = match document.get("id").and_then(Value::as_str) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => self.next_id(collection),
        };

        let mut guard = self.collections.lock().expect("document store mutex poisoned");
        let documents = guard.entry(collection.to_string()).or_default();
        if documents
            .iter()
            .any(|existing| existing.get("id").and_then(Value::as_str) == Some(id.as_str()))
        {
            return Err(StoreError::Conflict {
                collection: collection.to_string(),
            });
        }

        document
            .as_object_mut()
            .ok_or_else(|| StoreError::Malformed {
                collection: collection.to_string(),
                detail: "document must be an object".to_string(),
            })?
            .insert("id".to_string(), Value::from(id));

        documents.push(document.clone());
        Ok(document)
    }

    fn update(
        &self,
        collection: &str,
        id: &str,
        mut document: Document,
    ) -> Result<Document, StoreError> {
        let mut guard = self.collections.lock().expect("document store mutex poisoned");
        let documents = guard
            .get_mut(collection)
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        let slot = documents
            .iter_mut()
            .find(|existing| existing.get("id").and_then(Value::as_str) == Some(id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;

        document
            .as_object_mut()
            .ok_or_else(|| StoreError::Malformed {
                collection: collection.to_string(),
                detail: "document must be an object".to_string(),
            })?
            .insert("id".to_string(), Value::from(id));

        *slot = document.clone();
        Ok(document)
    }
}

/// Ids of the records seeded for demos and local exploration.
pub(crate) struct DemoDataset {
    pub(crate) course_instance: CourseInstanceId,
    pub(crate) enrollments: Vec<(EnrollmentId, StudentId)>,
}

/// Seed one university chain, a CS course instance with midterm/final/bonus
/// templates, finalized assessments, and two enrolled students: Avery with a
/// complete gradebook and Blake missing the final.
pub(crate) fn seed_demo_records(store: &InMemoryDocumentStore) -> Result<DemoDataset, StoreError> {
    let records: Vec<(&str, Value)> = vec![
        (
            collections::UNIVERSITIES,
            json!({ "id": "uni-aurora", "name": "Aurora State University" }),
        ),
        (
            collections::FACULTIES,
            json!({ "id": "fac-science", "name": "Faculty of Science", "university": "uni-aurora" }),
        ),
        (
            collections::DEPARTMENTS,
            json!({ "id": "dep-cs", "name": "Computer Science", "faculty": "fac-science" }),
        ),
        (
            collections::COURSE_VARIATIONS,
            json!({ "id": "var-cs2040", "name": "CS 2040 Data Structures", "department": "dep-cs" }),
        ),
        (
            collections::COURSE_INSTANCES,
            json!({ "id": "ci-cs2040-f25", "name": "CS 2040 Fall 2025", "courseVariation": "var-cs2040" }),
        ),
        (
            collections::GRADING_SCALES,
            json!({
                "id": "scale-aurora",
                "university": "uni-aurora",
                "name": "Aurora standard scale",
                "passThreshold": 60.0,
                "mappings": [
                    { "minScore": 90.0, "maxScore": 100.0, "letterGrade": "A", "numericGrade": 4.0, "isPassing": true },
                    { "minScore": 80.0, "maxScore": 89.99, "letterGrade": "B", "numericGrade": 3.0, "isPassing": true },
                    { "minScore": 70.0, "maxScore": 79.99, "letterGrade": "C", "numericGrade": 2.0, "isPassing": true },
                    { "minScore": 60.0, "maxScore": 69.99, "letterGrade": "D", "numericGrade": 1.0, "isPassing": true },
                    { "minScore": 0.0, "maxScore": 59.99, "letterGrade": "F", "numericGrade": 0.0, "isPassing": false },
                ],
            }),
        ),
        (
            collections::UNIVERSITY_CONFIGURATIONS,
            json!({
                "id": "cfg-aurora",
                "university": "uni-aurora",
                "roundingRule": "bankers",
                "decimalPrecision": 2,
                "maxRetakeAttempts": 1,
                "latePenaltyPercentPerDay": 5.0,
            }),
        ),
        (
            collections::ASSESSMENT_TEMPLATES,
            json!({
                "id": "tpl-midterm", "courseInstance": "ci-cs2040-f25", "name": "Midterm Exam",
                "weightPercent": 40.0, "minScore": 0.0, "maxScore": 100.0,
                "isOptional": false, "assessmentType": "exam",
            }),
        ),
        (
            collections::ASSESSMENT_TEMPLATES,
            json!({
                "id": "tpl-final", "courseInstance": "ci-cs2040-f25", "name": "Final Exam",
                "weightPercent": 60.0, "minScore": 0.0, "maxScore": 100.0,
                "isOptional": false, "assessmentType": "exam",
            }),
        ),
        (
            collections::ASSESSMENT_TEMPLATES,
            json!({
                "id": "tpl-bonus", "courseInstance": "ci-cs2040-f25", "name": "Bonus Project",
                "weightPercent": 0.0, "minScore": 0.0, "maxScore": 10.0,
                "isOptional": true, "assessmentType": "project",
            }),
        ),
        (
            collections::ASSESSMENTS,
            json!({ "id": "asm-midterm", "courseInstance": "ci-cs2040-f25", "assessmentTemplate": "tpl-midterm", "status": "locked" }),
        ),
        (
            collections::ASSESSMENTS,
            json!({ "id": "asm-final", "courseInstance": "ci-cs2040-f25", "assessmentTemplate": "tpl-final", "status": "published" }),
        ),
        (
            collections::ASSESSMENTS,
            json!({ "id": "asm-bonus", "courseInstance": "ci-cs2040-f25", "assessmentTemplate": "tpl-bonus", "status": "locked" }),
        ),
        (
            collections::SCORES,
            json!({
                "student": "stu-avery", "assessment": "asm-midterm",
                "value": 80.0, "maxValue": 100.0, "percentage": 80.0,
                "finalValue": 80.0, "isExcused": false,
            }),
        ),
        (
            collections::SCORES,
            json!({
                "student": "stu-avery", "assessment": "asm-final",
                "value": 90.0, "maxValue": 100.0, "percentage": 90.0,
                "finalValue": 90.0, "isExcused": false,
            }),
        ),
        (
            collections::SCORES,
            json!({
                "student": "stu-blake", "assessment": "asm-midterm",
                "value": 95.0, "maxValue": 100.0, "percentage": 95.0,
                "finalValue": 95.0, "isExcused": false,
            }),
        ),
        (
            collections::ENROLLMENTS,
            json!({
                "id": "enr-avery", "student": "stu-avery", "courseInstance": "ci-cs2040-f25",
                "status": "active", "creditsEarned": 0.0,
            }),
        ),
        (
            collections::ENROLLMENTS,
            json!({
                "id": "enr-blake", "student": "stu-blake", "courseInstance": "ci-cs2040-f25",
                "status": "active", "creditsEarned": 0.0,
            }),
        ),
    ];

    for (collection, document) in records {
        store.create(collection, document)?;
    }

    Ok(DemoDataset {
        course_instance: CourseInstanceId("ci-cs2040-f25".to_string()),
        enrollments: vec![
            (
                EnrollmentId("enr-avery".to_string()),
                StudentId("stu-avery".to_string()),
            ),
            (
                EnrollmentId("enr-blake".to_string()),
                StudentId("stu-blake".to_string()),
            ),
        ],
    })
}
