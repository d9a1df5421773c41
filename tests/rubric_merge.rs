use lectern::{
    lms::models::{CriterionAssessment, RubricAssessment, RubricCriterion},
    moderate::{overlay_scores, zero_assessment},
};

fn rubric() -> Vec<RubricCriterion> {
    vec![
        RubricCriterion {
            id:          "_c1".to_string(),
            description: "Clarity of objectives".to_string(),
            points:      5.0,
        },
        RubricCriterion {
            id:          "_c2".to_string(),
            description: "Use of literature".to_string(),
            points:      5.0,
        },
    ]
}

#[test]
fn zero_assessment_covers_every_criterion() {
    let assessment = zero_assessment(&rubric());

    assert_eq!(assessment.len(), 2);
    for criterion in rubric() {
        let entry = assessment.get(&criterion.id).expect("criterion present");
        assert_eq!(entry.points, Some(0.0));
        assert!(entry.rating_id.is_none());
    }
}

#[test]
fn overlay_sets_absolute_points_and_keeps_other_entries() {
    let mut assessment = zero_assessment(&rubric());
    assessment.get_mut("_c2").expect("entry").comments = Some("solid".to_string());

    overlay_scores(&mut assessment, &[("_c1".to_string(), 4.5)]);

    assert_eq!(assessment["_c1"].points, Some(4.5));
    assert_eq!(assessment["_c2"].points, Some(0.0));
    assert_eq!(assessment["_c2"].comments.as_deref(), Some("solid"));
}

#[test]
fn overlay_is_idempotent() {
    let mut first = zero_assessment(&rubric());
    let scores = vec![("_c1".to_string(), 3.0), ("_c2".to_string(), 2.0)];
    overlay_scores(&mut first, &scores);

    let mut second = first.clone();
    overlay_scores(&mut second, &scores);

    // The re-applied assessment compares equal, so no second write happens.
    assert_eq!(first, second);
}

#[test]
fn overlay_inserts_missing_criteria() {
    let mut assessment = RubricAssessment::new();
    overlay_scores(&mut assessment, &[("_c9".to_string(), 1.0)]);

    assert_eq!(assessment["_c9"], CriterionAssessment {
        rating_id: None,
        comments:  None,
        points:    Some(1.0),
    });
}

#[test]
fn unchanged_overlay_compares_equal_to_original() {
    let mut original = zero_assessment(&rubric());
    original.get_mut("_c1").expect("entry").points = Some(4.0);

    // Re-importing the exported scores writes the same absolute values back.
    let exported: Vec<(String, f64)> = original
        .iter()
        .map(|(id, entry)| (id.clone(), entry.points.unwrap_or_default()))
        .collect();

    let mut reimported = original.clone();
    overlay_scores(&mut reimported, &exported);
    assert_eq!(original, reimported);
}
