use lectern::{
    discussions::{EntryKind, flatten_entries},
    lms::models::TopicEntry,
};

fn entry(id: i64, message: &str) -> TopicEntry {
    TopicEntry {
        id,
        user_id: id * 100,
        message: message.to_string(),
        // Deliberately out of chronological order: flattening must not
        // re-sort by time.
        created_at: format!("2026-03-{:02}T00:00:00Z", 30 - id),
        updated_at: None,
    }
}

#[test]
fn replies_follow_their_post_in_api_order() {
    let entries = vec![
        (entry(1, "<p>post one</p>"), vec![entry(3, "<p>reply one</p>")]),
        (entry(2, "<p>post two</p>"), vec![entry(4, "<p>reply two</p>")]),
    ];

    let contributions =
        flatten_entries(&entries, |html| Ok(html.to_string())).expect("flatten");

    let order: Vec<(i64, EntryKind)> =
        contributions.iter().map(|c| (c.id, c.kind)).collect();
    assert_eq!(order, vec![
        (1, EntryKind::Post),
        (3, EntryKind::Reply),
        (2, EntryKind::Post),
        (4, EntryKind::Reply),
    ]);
}

#[test]
fn messages_run_through_the_converter() {
    let entries = vec![(entry(1, "<p>hello</p>"), vec![])];

    let contributions =
        flatten_entries(&entries, |html| Ok(html.replace("<p>", "").replace("</p>", "")))
            .expect("flatten");

    assert_eq!(contributions[0].message, "hello");
}

#[test]
fn converter_failures_propagate() {
    let entries = vec![(entry(1, "<p>bad</p>"), vec![])];
    let result = flatten_entries(&entries, |_| anyhow::bail!("converter exploded"));
    assert!(result.is_err());
}
