use lectern::schedule::{layout_schedule, render_schedule};

fn groups(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("G{i}")).collect()
}

#[test]
fn fewer_groups_than_slots_leaves_empty_cells() {
    let schedule = layout_schedule(&groups(3), 3, 2);

    assert!(schedule.unscheduled.is_empty());
    assert_eq!(schedule.rows[0], vec!["G1", "G2", "G3"]);
    assert_eq!(schedule.rows[1], vec!["", "", ""]);
}

#[test]
fn more_groups_than_slots_reports_the_excess() {
    let schedule = layout_schedule(&groups(8), 3, 2);

    let placed: usize = schedule
        .rows
        .iter()
        .flatten()
        .filter(|cell| !cell.is_empty())
        .count();
    assert_eq!(placed, 6);
    assert_eq!(schedule.unscheduled, vec!["G7", "G8"]);
}

#[test]
fn layout_fills_row_major() {
    let schedule = layout_schedule(&groups(5), 2, 3);

    assert_eq!(schedule.rows[0], vec!["G1", "G2"]);
    assert_eq!(schedule.rows[1], vec!["G3", "G4"]);
    assert_eq!(schedule.rows[2], vec!["G5", ""]);
}

#[test]
fn rendered_table_labels_weeks_and_questions() {
    let table = render_schedule(&layout_schedule(&groups(2), 2, 1));

    assert!(table.contains("Week 1"));
    assert!(table.contains("Week 2"));
    assert!(table.contains("Question 1"));
    assert!(table.contains("G1"));
    assert!(table.contains('|'));
}
