use std::collections::HashMap;

use lectern::overrides::{OverrideRow, group_overrides, student_overrides};

fn row(id: Option<i64>, group: Option<&str>, dates: (&str, &str, &str)) -> OverrideRow {
    OverrideRow {
        group:     group.map(str::to_string),
        id,
        due_at:    Some(dates.0.to_string()),
        lock_at:   Some(dates.1.to_string()),
        unlock_at: Some(dates.2.to_string()),
    }
}

#[test]
fn group_rows_produce_one_group_scoped_override_each() {
    let groups: HashMap<String, i64> =
        [("Group A".to_string(), 11), ("Group B".to_string(), 22)].into();
    let rows = vec![
        row(None, Some("Group A"), ("2026-03-01", "2026-03-02", "2026-02-01")),
        row(None, Some("Group B"), ("2026-03-08", "2026-03-09", "2026-02-01")),
    ];

    let overrides = group_overrides(&rows, &groups).expect("known groups");

    assert_eq!(overrides.len(), rows.len());
    for override_request in &overrides {
        assert!(override_request.group_id.is_some());
        assert!(override_request.student_ids.is_none());
    }
    assert_eq!(overrides[0].group_id, Some(11));
    assert_eq!(overrides[1].group_id, Some(22));
}

#[test]
fn unknown_group_name_is_a_hard_failure() {
    let groups: HashMap<String, i64> = [("Group A".to_string(), 11)].into();
    let rows = vec![
        row(None, Some("Group A"), ("2026-03-01", "2026-03-02", "2026-02-01")),
        row(None, Some("Group Z"), ("2026-03-01", "2026-03-02", "2026-02-01")),
    ];

    let err = group_overrides(&rows, &groups).expect_err("unknown group must fail");
    assert!(err.to_string().contains("Group Z"));
}

#[test]
fn identical_date_triples_merge_into_one_override() {
    let rows = vec![
        row(Some(1), None, ("2026-03-01", "2026-03-02", "2026-02-01")),
        row(Some(2), None, ("2026-03-08", "2026-03-09", "2026-02-01")),
        row(Some(3), None, ("2026-03-01", "2026-03-02", "2026-02-01")),
    ];

    let overrides = student_overrides(&rows).expect("ids present");

    assert_eq!(overrides.len(), 2);
    assert_eq!(overrides[0].student_ids.as_deref(), Some(&[1, 3][..]));
    assert_eq!(overrides[1].student_ids.as_deref(), Some(&[2][..]));
    assert_eq!(overrides[0].title.as_deref(), Some("extension-0"));
    assert_eq!(overrides[1].title.as_deref(), Some("extension-1"));
}

#[test]
fn student_overrides_partition_the_input_rows() {
    let rows: Vec<OverrideRow> = (0..10)
        .map(|i| {
            let due = format!("2026-03-{:02}", (i % 3) + 1);
            OverrideRow {
                group:     None,
                id:        Some(i),
                due_at:    Some(due),
                lock_at:   Some("2026-04-01".to_string()),
                unlock_at: Some("2026-02-01".to_string()),
            }
        })
        .collect();

    let overrides = student_overrides(&rows).expect("ids present");

    let mut seen: Vec<i64> = overrides
        .iter()
        .flat_map(|o| o.student_ids.clone().expect("student scope"))
        .collect();
    seen.sort_unstable();
    assert_eq!(seen, (0..10).collect::<Vec<_>>());

    for override_request in &overrides {
        assert!(override_request.group_id.is_none());
    }
}

#[test]
fn empty_student_id_is_rejected() {
    let rows = vec![OverrideRow {
        group:     None,
        id:        None,
        due_at:    Some("2026-03-01".to_string()),
        lock_at:   None,
        unlock_at: None,
    }];

    assert!(student_overrides(&rows).is_err());
}
