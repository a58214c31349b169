use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// One person's registration for one course
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct EnrollmentRecord {
    pub full_name: String,
    pub started_at: NaiveDateTime,
    pub course: String,
    pub email: String,
    pub phone: String,
}

impl EnrollmentRecord {
    pub fn new(
        full_name: impl Into<String>,
        started_at: NaiveDateTime,
        course: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        EnrollmentRecord {
            full_name: full_name.into(),
            started_at,
            course: course.into(),
            email: email.into(),
            phone: phone.into(),
        }
    }
}

/// Ordered, typed collection of enrollment records
///
/// Only the schema step builds one from uploaded data, so every record
/// already carries all five attributes.
#[derive(Clone, Serialize, Debug, Default, PartialEq, Eq)]
pub struct EnrollmentDataset {
    records: Vec<EnrollmentRecord>,
}

/// Records sharing one course value, in dataset order
#[derive(Debug, Clone)]
pub struct CourseGroup<'a> {
    pub course: &'a str,
    pub records: Vec<&'a EnrollmentRecord>,
}

impl CourseGroup<'_> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl EnrollmentDataset {
    pub fn new(records: Vec<EnrollmentRecord>) -> Self {
        EnrollmentDataset { records }
    }

    pub fn records(&self) -> &[EnrollmentRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of unique full names, however many courses each person took
    pub fn distinct_enrollees(&self) -> usize {
        self.records
            .iter()
            .map(|r| r.full_name.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Earliest and latest start timestamp, `None` for an empty dataset
    pub fn period(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let start = self.records.iter().map(|r| r.started_at).min()?;
        let end = self.records.iter().map(|r| r.started_at).max()?;
        Some((start, end))
    }

    /// Partition by course, courses in first-seen order
    pub fn course_groups(&self) -> Vec<CourseGroup<'_>> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut groups: Vec<CourseGroup<'_>> = Vec::new();

        for record in &self.records {
            let course = record.course.as_str();
            match index.get(course) {
                Some(&i) => groups[i].records.push(record),
                None => {
                    index.insert(course, groups.len());
                    groups.push(CourseGroup {
                        course,
                        records: vec![record],
                    });
                }
            }
        }

        groups
    }

    pub fn course_count(&self) -> usize {
        self.records
            .iter()
            .map(|r| r.course.as_str())
            .collect::<HashSet<_>>()
            .len()
    }
}

impl FromIterator<EnrollmentRecord> for EnrollmentDataset {
    fn from_iter<I: IntoIterator<Item = EnrollmentRecord>>(iter: I) -> Self {
        EnrollmentDataset::new(iter.into_iter().collect())
    }
}
