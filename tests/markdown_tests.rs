use lectern::{
    publish::markdown::{
        AssetKind, escape_headings, find_asset_refs, markdown_to_html, merge_metadata,
        split_front_matter,
    },
    templates,
};

#[test]
fn heading_markers_survive_the_template_pass() {
    let escaped = escape_headings("## Overview\n\nbody\n### Detail\n");

    let mut context = tera::Context::new();
    context.insert("title", "T");
    let rendered = templates::render_str(&escaped, &context, None).expect("render");

    assert!(rendered.starts_with("## Overview"));
    assert!(rendered.contains("### Detail"));
}

#[test]
fn escaping_only_touches_line_leading_markers() {
    let escaped = escape_headings("# Top\nnot # a heading\n");

    assert!(escaped.starts_with("{{ \"#\" }} Top"));
    assert!(escaped.contains("not # a heading"));
}

#[test]
fn front_matter_splits_metadata_from_content() {
    let doc = "---\ntitle: Week 1\npublished: true\n---\nBody text\n";
    let (metadata, content) = split_front_matter(doc).expect("parse");

    assert_eq!(
        metadata
            .get(serde_yaml::Value::String("title".into()))
            .and_then(|v| v.as_str()),
        Some("Week 1")
    );
    assert_eq!(content, "Body text\n");
}

#[test]
fn document_without_front_matter_yields_empty_metadata() {
    let (metadata, content) = split_front_matter("plain body\n").expect("parse");
    assert!(metadata.is_empty());
    assert_eq!(content, "plain body\n");
}

#[test]
fn document_metadata_overrides_global_metadata() {
    let global: serde_yaml::Mapping =
        serde_yaml::from_str("published: false\ncourse: INFS1000\n").expect("yaml");
    let doc: serde_yaml::Mapping = serde_yaml::from_str("published: true\n").expect("yaml");

    let merged = merge_metadata(&global, &doc);

    assert_eq!(
        merged.get(serde_yaml::Value::String("published".into())),
        Some(&serde_yaml::Value::Bool(true))
    );
    assert_eq!(
        merged
            .get(serde_yaml::Value::String("course".into()))
            .and_then(|v| v.as_str()),
        Some("INFS1000")
    );
}

#[test]
fn asset_refs_cover_build_links_and_images() {
    let html = r#"<a href="assessments/a1.pdf">a1</a>
<a href="https://example.com/lecture/x">external</a>
<img src="images/w1.png" />
<a href="lecture/w1.html">slides</a>"#;

    let refs = find_asset_refs(html);

    assert_eq!(refs.len(), 3);
    assert_eq!(refs[0].kind, AssetKind::Link);
    assert_eq!(refs[0].target, "assessments/a1.pdf");
    assert_eq!(refs[1].target, "lecture/w1.html");
    assert_eq!(refs[2].kind, AssetKind::Image);
    assert_eq!(refs[2].target, "images/w1.png");
}

#[test]
fn markdown_renders_tables() {
    let html = markdown_to_html("| a | b |\n|---|---|\n| 1 | 2 |\n");
    assert!(html.contains("<table>"));
}

#[test]
fn weeks_after_computes_calendar_dates() {
    let week_1 = templates::parse_week_1("2026-02-23").expect("date");
    let rendered = templates::render_str(
        "due {{ weeks_after(weeks=3) }} and {{ weeks_after(weeks=0, days=4) }}",
        &tera::Context::new(),
        Some(week_1),
    )
    .expect("render");

    assert_eq!(rendered, "due 2026-03-16 and 2026-02-27");
}
