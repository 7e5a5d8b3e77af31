use serde::Deserialize;
use std::io::Read;

/// One validated-enough row of a gradebook export, before policy is applied.
#[derive(Debug)]
pub(crate) struct ScoreRow {
    pub(crate) student: String,
    pub(crate) assessment: String,
    pub(crate) value: f64,
    pub(crate) max_value: Option<f64>,
    pub(crate) excused: bool,
    pub(crate) days_late: u32,
    pub(crate) line: u64,
}

pub(crate) fn parse_rows<R: Read>(reader: R) -> Result<Vec<ScoreRow>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut rows = Vec::new();

    for (index, record) in csv_reader.deserialize::<GradebookRow>().enumerate() {
        let row = record?;
        rows.push(ScoreRow {
            student: row.student_id,
            assessment: row.assessment_id,
            value: row.score,
            max_value: row.max_score,
            excused: row.excused.as_deref().map(truthy).unwrap_or(false),
            days_late: row.days_late.unwrap_or(0),
            // Header occupies the first line of the export.
            line: index as u64 + 2,
        });
    }

    Ok(rows)
}

#[derive(Debug, Deserialize)]
struct GradebookRow {
    #[serde(rename = "Student ID")]
    student_id: String,
    #[serde(rename = "Assessment ID")]
    assessment_id: String,
    #[serde(rename = "Score")]
    score: f64,
    #[serde(rename = "Max Score", default)]
    max_score: Option<f64>,
    #[serde(rename = "Excused", default)]
    excused: Option<String>,
    #[serde(rename = "Days Late", default)]
    days_late: Option<u32>,
}

fn truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "yes" | "y" | "1"
    )
}

#[cfg(test)]
pub(crate) fn truthy_for_tests(value: &str) -> bool {
    truthy(value)
}
