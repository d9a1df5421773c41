use lectern::{
    lms::models::{Enrollment, Group, GroupUser},
    roster::{derive_section, find_group},
};

fn enrollment(course: Option<&str>, section: Option<&str>) -> Enrollment {
    Enrollment {
        sis_course_id:  course.map(str::to_string),
        sis_section_id: section.map(str::to_string),
    }
}

#[test]
fn section_code_strips_the_course_prefix() {
    let enrollments = vec![enrollment(
        Some("2026-INFS1000-S1C-ND-CC"),
        Some("2026-INFS1000-S1C-ND-CC-Seminar-08"),
    )];
    assert_eq!(derive_section(&enrollments).as_deref(), Some("Seminar-08"));
}

#[test]
fn synthetic_all_sections_are_rejected() {
    let enrollments = vec![enrollment(
        Some("2026-INFS1000-S1C-ND-CC"),
        Some("2026-INFS1000-S1C-ND-CC-2026_all"),
    )];
    assert_eq!(derive_section(&enrollments), None);
}

#[test]
fn purely_numeric_sections_are_rejected() {
    let enrollments = vec![enrollment(
        Some("2026-INFS1000-S1C-ND-CC"),
        Some("2026-INFS1000-S1C-ND-CC-123456"),
    )];
    assert_eq!(derive_section(&enrollments), None);
}

#[test]
fn first_surviving_enrollment_wins() {
    let enrollments = vec![
        enrollment(Some("C1"), None),
        enrollment(Some("C1"), Some("C1-999")),
        enrollment(Some("C1"), Some("C1-Workshop-02")),
        enrollment(Some("C1"), Some("C1-Workshop-05")),
    ];
    assert_eq!(derive_section(&enrollments).as_deref(), Some("Workshop-02"));
}

#[test]
fn group_is_reverse_looked_up_from_membership() {
    let groups = vec![
        Group {
            id:    1,
            name:  "Alpha".to_string(),
            users: vec![GroupUser { id: 10 }],
        },
        Group {
            id:    2,
            name:  "Beta".to_string(),
            users: vec![GroupUser { id: 20 }, GroupUser { id: 21 }],
        },
    ];

    assert_eq!(find_group(21, &groups).as_deref(), Some("Beta"));
    assert_eq!(find_group(99, &groups), None);
}
