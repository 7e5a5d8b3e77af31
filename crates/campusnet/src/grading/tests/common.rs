use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};

use crate::grading::domain::{CourseInstanceId, EnrollmentId, StudentId};
use crate::grading::engine::GradeCalculationEngine;
use crate::grading::store::{collections, Document, DocumentStore, Filter, StoreError};

#[derive(Default, Clone)]
pub(crate) struct MemoryStore {
    collections: Arc<Mutex<HashMap<String, Vec<Document>>>>,
    sequence: Arc<AtomicU64>,
}

impl MemoryStore {
    fn next_id(&self, collection: &str) -> String {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        format!("{collection}-{id:06}")
    }
}

impl DocumentStore for MemoryStore {
    fn find(
        &self,
        collection: &str,
        filter: &Filter,
        _depth: u8,
    ) -> Result<Vec<Document>, StoreError> {
        let guard = self.collections.lock().expect("store mutex poisoned");
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
        let guard = self.collections.lock().expect("store mutex poisoned");
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

        let mut guard = self.collections.lock().expect("store mutex poisoned");
        let documents = guard.entry(collection.to_string()).or_default();
        if documents
            .iter()
            .any(|existing| existing.get("id").and_then(Value::as_str) == Some(id.as_str()))
        {
            return Err(StoreError::Conflict {
                collection: collection.to_string(),
            });
        }

        match document.as_object_mut() {
            Some(map) => {
                map.insert("id".to_string(), Value::from(id));
            }
            None => {
                return Err(StoreError::Malformed {
                    collection: collection.to_string(),
                    detail: "document must be an object".to_string(),
                })
            }
        }

        documents.push(document.clone());
        Ok(document)
    }

    fn update(
        &self,
        collection: &str,
        id: &str,
        mut document: Document,
    ) -> Result<Document, StoreError> {
        let mut guard = self.collections.lock().expect("store mutex poisoned");
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

        match document.as_object_mut() {
            Some(map) => {
                map.insert("id".to_string(), Value::from(id));
            }
            None => {
                return Err(StoreError::Malformed {
                    collection: collection.to_string(),
                    detail: "document must be an object".to_string(),
                })
            }
        }

        *slot = document.clone();
        Ok(document)
    }
}

/// Seed the institution chain and return the course instance id.
pub(crate) fn seed_institution(store: &MemoryStore) -> CourseInstanceId {
    store
        .create(
            collections::UNIVERSITIES,
            json!({ "id": "uni-aurora", "name": "Aurora State University" }),
        )
        .expect("university seeds");
    store
        .create(
            collections::FACULTIES,
            json!({ "id": "fac-science", "name": "Faculty of Science", "university": "uni-aurora" }),
        )
        .expect("faculty seeds");
    store
        .create(
            collections::DEPARTMENTS,
            json!({ "id": "dep-cs", "name": "Computer Science", "faculty": "fac-science" }),
        )
        .expect("department seeds");
    store
        .create(
            collections::COURSE_VARIATIONS,
            json!({ "id": "var-cs2040", "name": "CS 2040", "department": "dep-cs" }),
        )
        .expect("course variation seeds");
    store
        .create(
            collections::COURSE_INSTANCES,
            json!({ "id": "ci-cs2040-f25", "name": "CS 2040 Fall 2025", "courseVariation": "var-cs2040" }),
        )
        .expect("course instance seeds");

    CourseInstanceId("ci-cs2040-f25".to_string())
}

/// Seed the grading scale and university configuration used by most tests.
pub(crate) fn seed_policy(store: &MemoryStore, rounding_rule: &str, decimal_precision: u8) {
    store
        .create(
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
        )
        .expect("grading scale seeds");
    store
        .create(
            collections::UNIVERSITY_CONFIGURATIONS,
            json!({
                "id": "cfg-aurora",
                "university": "uni-aurora",
                "roundingRule": rounding_rule,
                "decimalPrecision": decimal_precision,
                "maxRetakeAttempts": 1,
                "latePenaltyPercentPerDay": 5.0,
            }),
        )
        .expect("configuration seeds");
}

pub(crate) fn seed_template(
    store: &MemoryStore,
    instance: &CourseInstanceId,
    id: &str,
    name: &str,
    weight_percent: f64,
    max_score: f64,
    is_optional: bool,
) {
    store
        .create(
            collections::ASSESSMENT_TEMPLATES,
            json!({
                "id": id,
                "courseInstance": instance.0,
                "name": name,
                "weightPercent": weight_percent,
                "minScore": 0.0,
                "maxScore": max_score,
                "isOptional": is_optional,
                "assessmentType": "exam",
            }),
        )
        .expect("template seeds");
}

pub(crate) fn seed_assessment(
    store: &MemoryStore,
    instance: &CourseInstanceId,
    id: &str,
    template: &str,
    status: &str,
) {
    store
        .create(
            collections::ASSESSMENTS,
            json!({
                "id": id,
                "courseInstance": instance.0,
                "assessmentTemplate": template,
                "status": status,
            }),
        )
        .expect("assessment seeds");
}

pub(crate) fn seed_score(
    store: &MemoryStore,
    student: &str,
    assessment: &str,
    final_value: f64,
    is_excused: bool,
) {
    store
        .create(
            collections::SCORES,
            json!({
                "student": student,
                "assessment": assessment,
                "value": final_value,
                "maxValue": 100.0,
                "percentage": final_value,
                "finalValue": final_value,
                "isExcused": is_excused,
            }),
        )
        .expect("score seeds");
}

pub(crate) fn seed_enrollment(
    store: &MemoryStore,
    id: &str,
    student: &str,
    instance: &CourseInstanceId,
) -> EnrollmentId {
    store
        .create(
            collections::ENROLLMENTS,
            json!({
                "id": id,
                "student": student,
                "courseInstance": instance.0,
                "status": "active",
                "creditsEarned": 0.0,
            }),
        )
        .expect("enrollment seeds");
    EnrollmentId(id.to_string())
}

/// The worked scenario most tests build on: midterm 40% scored 80, final 60%
/// scored 90, optional zero-weight bonus left unsubmitted.
pub(crate) struct StandardScenario {
    pub(crate) store: Arc<MemoryStore>,
    pub(crate) instance: CourseInstanceId,
    pub(crate) enrollment: EnrollmentId,
    pub(crate) student: StudentId,
}

pub(crate) fn standard_scenario() -> StandardScenario {
    let store = Arc::new(MemoryStore::default());
    let instance = seed_institution(store.as_ref());
    seed_policy(store.as_ref(), "bankers", 2);

    seed_template(store.as_ref(), &instance, "tpl-midterm", "Midterm", 40.0, 100.0, false);
    seed_template(store.as_ref(), &instance, "tpl-final", "Final", 60.0, 100.0, false);
    seed_template(store.as_ref(), &instance, "tpl-bonus", "Bonus", 0.0, 10.0, true);

    seed_assessment(store.as_ref(), &instance, "asm-midterm", "tpl-midterm", "locked");
    seed_assessment(store.as_ref(), &instance, "asm-final", "tpl-final", "published");
    seed_assessment(store.as_ref(), &instance, "asm-bonus", "tpl-bonus", "locked");

    seed_score(store.as_ref(), "stu-avery", "asm-midterm", 80.0, false);
    seed_score(store.as_ref(), "stu-avery", "asm-final", 90.0, false);

    let enrollment = seed_enrollment(store.as_ref(), "enr-avery", "stu-avery", &instance);

    StandardScenario {
        store,
        instance,
        enrollment,
        student: StudentId("stu-avery".to_string()),
    }
}

pub(crate) fn build_engine(store: Arc<MemoryStore>) -> GradeCalculationEngine<MemoryStore> {
    GradeCalculationEngine::new(store)
}
