use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Raw record shape exchanged with the document store.
pub type Document = Value;

/// Collection names as exposed by the host document store.
pub mod collections {
    pub const ENROLLMENTS: &str = "enrollments";
    pub const COURSE_INSTANCES: &str = "course-instances";
    pub const COURSE_VARIATIONS: &str = "course-variations";
    pub const DEPARTMENTS: &str = "departments";
    pub const FACULTIES: &str = "faculties";
    pub const UNIVERSITIES: &str = "universities";
    pub const ASSESSMENT_TEMPLATES: &str = "assessment-templates";
    pub const ASSESSMENTS: &str = "assessments";
    pub const SCORES: &str = "scores";
    pub const GRADING_SCALES: &str = "grading-scales";
    pub const UNIVERSITY_CONFIGURATIONS: &str = "university-configurations";
    pub const GRADE_AGGREGATES: &str = "grade-aggregates";
}

#[derive(Debug, Clone, PartialEq)]
enum Condition {
    Eq(String, Value),
    In(String, Vec<Value>),
}

/// Equality-style query filter evaluated against document fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field` to equal `value`.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq(field.into(), value.into()));
        self
    }

    /// Require `field` to equal one of `values`.
    pub fn any_of(mut self, field: impl Into<String>, values: Vec<Value>) -> Self {
        self.conditions.push(Condition::In(field.into(), values));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Evaluate the filter against one document. Relation fields may arrive
    /// either as a bare id or expanded into the related record; both compare
    /// equal to the id.
    pub fn matches(&self, document: &Document) -> bool {
        self.conditions.iter().all(|condition| match condition {
            Condition::Eq(field, expected) => document
                .get(field)
                .map(|found| value_matches(found, expected))
                .unwrap_or(false),
            Condition::In(field, expected) => document
                .get(field)
                .map(|found| expected.iter().any(|value| value_matches(found, value)))
                .unwrap_or(false),
        })
    }
}

fn value_matches(found: &Value, expected: &Value) -> bool {
    if found == expected {
        return true;
    }
    found
        .get("id")
        .map(|id| id == expected)
        .unwrap_or(false)
}

/// Error enumeration for document store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{collection} record conflicts with an existing id")]
    Conflict { collection: String },
    #[error("{collection} record {id} not found")]
    NotFound { collection: String, id: String },
    #[error("malformed {collection} record: {detail}")]
    Malformed { collection: String, detail: String },
    #[error("document store unavailable: {0}")]
    Unavailable(String),
}

/// Storage abstraction over the host CMS's generated collection API.
///
/// `depth` requests relation expansion in the returned documents; the grading
/// subsystem resolves relations explicitly and always passes `0`.
pub trait DocumentStore: Send + Sync {
    fn find(&self, collection: &str, filter: &Filter, depth: u8)
        -> Result<Vec<Document>, StoreError>;
    fn find_by_id(
        &self,
        collection: &str,
        id: &str,
        depth: u8,
    ) -> Result<Option<Document>, StoreError>;
    fn create(&self, collection: &str, document: Document) -> Result<Document, StoreError>;
    fn update(
        &self,
        collection: &str,
        id: &str,
        document: Document,
    ) -> Result<Document, StoreError>;
}

/// Deserialize a document into its typed record, reporting malformed content
/// against the collection it came from.
pub fn decode<T: DeserializeOwned>(collection: &str, document: Document) -> Result<T, StoreError> {
    serde_json::from_value(document).map_err(|err| StoreError::Malformed {
        collection: collection.to_string(),
        detail: err.to_string(),
    })
}

/// Serialize a typed record back into a document for persistence.
pub fn encode<T: Serialize>(collection: &str, record: &T) -> Result<Document, StoreError> {
    serde_json::to_value(record).map_err(|err| StoreError::Malformed {
        collection: collection.to_string(),
        detail: err.to_string(),
    })
}
