use chrono::{NaiveDate, NaiveDateTime};
use enrollment_report::record::{EnrollmentDataset, EnrollmentRecord};
use enrollment_report::report::ReportGenerator;

fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

fn record(name: &str, started_at: NaiveDateTime, course: &str) -> EnrollmentRecord {
    EnrollmentRecord::new(name, started_at, course, "x@example.com", "111")
}

fn sample() -> EnrollmentDataset {
    EnrollmentDataset::new(vec![
        record("Ana", at(1, 9), "Python"),
        record("Luis", at(2, 10), "Excel"),
        record("Ana", at(3, 11), "Excel"),
    ])
}

#[test]
fn counts_each_person_once() {
    println!("\n====== Testing distinct_enrollees ======");
    assert_eq!(sample().distinct_enrollees(), 2);
    println!("✓ Ana enrolled twice is counted once");
}

#[test]
fn period_spans_earliest_to_latest() {
    let dataset = EnrollmentDataset::new(vec![
        record("B", at(5, 12), "Python"),
        record("A", at(2, 8), "Python"),
        record("C", at(9, 18), "Python"),
    ]);
    assert_eq!(dataset.period(), Some((at(2, 8), at(9, 18))));
    println!("✓ Period is taken from min and max, not from row order");
}

#[test]
fn single_record_period_starts_and_ends_together() {
    let t = at(4, 15);
    let dataset = EnrollmentDataset::new(vec![record("Ana", t, "Python")]);
    assert_eq!(dataset.period(), Some((t, t)));

    let generated = at(20, 12);
    let document = ReportGenerator::default().build(&dataset, generated).unwrap();
    let cover = document.cover().unwrap();
    assert_eq!(cover.summary.period_start, cover.summary.period_end);

    let [_, start, end] = cover.body_lines();
    assert_eq!(start, "Fecha de inicio de inscripciones: 2024-01-04 15:00:00");
    assert_eq!(end, "Fecha de fin de inscripciones: 2024-01-04 15:00:00");
    assert_eq!(
        start.trim_start_matches("Fecha de inicio de inscripciones: "),
        end.trim_start_matches("Fecha de fin de inscripciones: ")
    );
    println!("✓ One record gives a one-instant period on the cover");
}

#[test]
fn period_start_never_after_end() {
    let dataset = EnrollmentDataset::new(vec![
        record("C", at(9, 18), "Python"),
        record("A", at(9, 18), "Excel"),
        record("B", at(3, 7), "Python"),
    ]);
    let (start, end) = dataset.period().unwrap();
    assert!(start <= end);
    assert_eq!((start, end), (at(3, 7), at(9, 18)));
    println!("✓ periodStart <= periodEnd");
}

#[test]
fn empty_dataset_has_no_period() {
    let dataset = EnrollmentDataset::default();
    assert!(dataset.is_empty());
    assert_eq!(dataset.period(), None);
    assert_eq!(dataset.distinct_enrollees(), 0);
    assert!(dataset.course_groups().is_empty());
    println!("✓ Empty dataset has no period and no groups");
}

#[test]
fn groups_courses_in_first_seen_order() {
    println!("\n====== Testing course_groups ======");
    let dataset = sample();
    let groups = dataset.course_groups();

    let courses: Vec<&str> = groups.iter().map(|g| g.course).collect();
    assert_eq!(courses, vec!["Python", "Excel"]);
    assert_eq!(groups[0].len(), 1);
    assert_eq!(groups[1].len(), 2);

    let excel_names: Vec<&str> = groups[1]
        .records
        .iter()
        .map(|r| r.full_name.as_str())
        .collect();
    assert_eq!(excel_names, vec!["Luis", "Ana"]);
    assert_eq!(dataset.course_count(), 2);
    println!("✓ Groups keep first-seen course order and row order inside each course");
}

#[test]
fn group_sizes_add_up_to_record_count() {
    let dataset: EnrollmentDataset = ["A", "B", "A", "C", "B", "A"]
        .iter()
        .enumerate()
        .map(|(i, course)| record(&format!("P{}", i), at(1 + i as u32, 9), course))
        .collect();

    let groups = dataset.course_groups();
    let total: usize = groups.iter().map(|g| g.len()).sum();
    assert_eq!(total, dataset.len());
    assert!(groups.iter().all(|g| !g.is_empty()));
    assert_eq!(dataset.course_count(), groups.len());
    println!("✓ Every record lands in exactly one course group");
}
