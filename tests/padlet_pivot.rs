use lectern::padlet::{PadletPost, aggregate_posts, pivot_counts};

fn post(username: &str, section: &str, color: Option<&str>) -> PadletPost {
    PadletPost {
        id:            format!("p-{username}-{section}"),
        section_id:    format!("s-{section}"),
        section_title: section.to_string(),
        board_id:      "b-1".to_string(),
        board_title:   "Case Studies".to_string(),
        username:      username.to_string(),
        content:       "<p>hi</p>".to_string(),
        color:         color.map(str::to_string),
    }
}

#[test]
fn classification_totals_match_color_rules() {
    let posts = vec![
        post("ada", "W1", Some("red")),
        post("ada", "W1", None),
        post("bob", "W1", Some("red")),
        post("bob", "W2", Some("blue")),
    ];

    let counts = aggregate_posts(&posts, "red");

    let pinned_total: u64 = counts.values().map(|(pinned, _)| pinned).sum();
    let post_total: u64 = counts.values().map(|(_, posts)| posts).sum();
    assert_eq!(pinned_total, 2);
    assert_eq!(post_total, 1);

    // The blue post counts toward neither.
    assert_eq!(counts[&("bob".to_string(), "W2".to_string())], (0, 0));
}

#[test]
fn pivot_emits_two_columns_per_section_with_zero_fill() {
    let posts = vec![
        post("ada", "W1", Some("red")),
        post("bob", "W2", None),
    ];
    let (header, rows) = pivot_counts(&aggregate_posts(&posts, "red"));

    assert_eq!(header, vec![
        "username",
        "W1_pinned_count",
        "W2_pinned_count",
        "W1_post_count",
        "W2_post_count",
    ]);

    // Rows are per author, missing combinations fill as zero.
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0], vec!["ada", "1", "0", "0", "0"]);
    assert_eq!(rows[1], vec!["bob", "0", "0", "0", "1"]);
}

#[test]
fn marker_color_is_exact_match() {
    let posts = vec![post("ada", "W1", Some("dark-red"))];
    let counts = aggregate_posts(&posts, "red");
    assert_eq!(counts[&("ada".to_string(), "W1".to_string())], (0, 0));
}
