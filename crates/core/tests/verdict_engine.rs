use oracle_core::model::{Category, CategoryCounts, VerdictResult};
use oracle_core::services::verdict::{verdict, VerdictPolicy};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn clear_majority_of_expected_category_passes() {
    let counts = CategoryCounts::from([(Category::Bitwise, 80), (Category::Other, 20)]);
    let judged = verdict(&counts, &[Category::Bitwise], &VerdictPolicy::default());
    assert_eq!(judged.result, VerdictResult::Pass);
    assert_eq!(judged.observed, Some(Category::Bitwise));
    assert!(close(judged.ratio, 0.8));
    assert!(close(judged.margin, 0.6));
}

#[test]
fn expected_dominant_below_threshold_is_ambiguous() {
    let counts = CategoryCounts::from([
        (Category::Bitwise, 40),
        (Category::ShiftRotate, 40),
        (Category::Other, 20),
    ]);
    let judged = verdict(&counts, &[Category::Bitwise], &VerdictPolicy::default());
    assert_eq!(judged.observed, Some(Category::Bitwise));
    assert!(close(judged.ratio, 0.4));
    assert!(close(judged.margin, 0.0));
    assert_eq!(judged.result, VerdictResult::Ambiguous);
}

#[test]
fn unexpected_category_that_outnumbers_expected_fails() {
    let counts = CategoryCounts::from([(Category::FloatAdd, 10), (Category::IntegerMultiply, 90)]);
    let judged = verdict(&counts, &[Category::FloatAdd], &VerdictPolicy::default());
    assert_eq!(judged.result, VerdictResult::Fail);
    assert_eq!(judged.observed, Some(Category::IntegerMultiply));
    assert!(close(judged.ratio, 0.9));
    assert!(close(judged.margin, 0.8));
}

#[test]
fn empty_counts_are_ambiguous_with_zero_ratio() {
    let judged = verdict(&CategoryCounts::new(), &[Category::Bitwise], &VerdictPolicy::default());
    assert_eq!(judged.result, VerdictResult::Ambiguous);
    assert_eq!(judged.observed, None);
    assert_eq!(judged.ratio, 0.0);
}

#[test]
fn tie_between_unexpected_and_expected_is_ambiguous() {
    // Other loses the priority tie-break to ShiftRotate, so ShiftRotate is
    // dominant but does not strictly beat the expected category either way.
    let counts = CategoryCounts::from([(Category::ShiftRotate, 50), (Category::Other, 50)]);
    let judged = verdict(&counts, &[Category::Other], &VerdictPolicy::default());
    assert_eq!(judged.observed, Some(Category::ShiftRotate));
    assert_eq!(judged.result, VerdictResult::Ambiguous);
}

#[test]
fn any_of_several_expected_categories_may_dominate() {
    let counts = CategoryCounts::from([(Category::ShiftRotate, 7), (Category::Bitwise, 3)]);
    let expected = [Category::Bitwise, Category::ShiftRotate];
    let judged = verdict(&counts, &expected, &VerdictPolicy::default());
    assert_eq!(judged.result, VerdictResult::Pass);
    assert_eq!(judged.observed, Some(Category::ShiftRotate));
}

#[test]
fn threshold_is_inclusive_and_configurable() {
    let counts = CategoryCounts::from([(Category::IntegerMultiply, 6), (Category::Other, 4)]);
    let expected = [Category::IntegerMultiply];
    assert_eq!(
        verdict(&counts, &expected, &VerdictPolicy::with_threshold(0.6)).result,
        VerdictResult::Pass
    );
    assert_eq!(
        verdict(&counts, &expected, &VerdictPolicy::with_threshold(0.7)).result,
        VerdictResult::Ambiguous
    );
}

#[test]
fn judging_is_idempotent() {
    let counts = CategoryCounts::from([
        (Category::FloatAdd, 12),
        (Category::ControlFlow, 5),
        (Category::Other, 9),
    ]);
    let policy = VerdictPolicy::default();
    let first = verdict(&counts, &[Category::FloatAdd], &policy);
    let second = verdict(&counts, &[Category::FloatAdd], &policy);
    assert_eq!(first, second);
}
