// library-level scenarios: build once, evaluate against subjects

use std::sync::Arc;

use lifecourse::logic::{
    parse_condition, parse_definitions, parse_timestamp, AttrValue, Condition, VitalSign,
};
use lifecourse::subject::Subject;
use serde_json::json;

fn ts(s: &str) -> i64 {
    parse_timestamp(s).unwrap()
}

fn build(value: serde_json::Value) -> Condition {
    parse_condition(&value).unwrap()
}

#[test]
fn test_screening_eligibility() {
    // women aged 50-74 without an active mastectomy care plan
    let eligible = build(json!({
        "condition_type": "And",
        "conditions": [
            { "condition_type": "Gender", "gender": "F" },
            { "condition_type": "Age", "operator": ">=", "quantity": 50, "unit": "years" },
            { "condition_type": "Age", "operator": "<", "quantity": 75, "unit": "years" },
            {
                "condition_type": "Not",
                "condition": {
                    "condition_type": "Active CarePlan",
                    "codes": [{ "system": "SNOMED-CT", "code": "736285004" }]
                }
            }
        ]
    }));

    let at = ts("2020-06-01");
    let woman = Subject::new(ts("1960-01-01")).with_gender("F");
    assert!(eligible.test(&woman, at));

    let too_young = Subject::new(ts("1975-01-01")).with_gender("F");
    assert!(!eligible.test(&too_young, at));

    let man = Subject::new(ts("1960-01-01")).with_gender("M");
    assert!(!eligible.test(&man, at));

    let excluded = woman.clone().with_care_plan("736285004");
    assert!(!eligible.test(&excluded, at));
}

#[test]
fn test_risk_factor_count() {
    let library = parse_definitions(&json!({
        "high_risk": {
            "condition_type": "At Least",
            "minimum": 2,
            "conditions": [
                { "condition_type": "Attribute", "attribute": "smoker", "operator": "==", "value": true },
                { "condition_type": "Vital Sign", "vital_sign": "BMI", "operator": ">", "value": 30 },
                { "condition_type": "Observation", "codes": [{ "system": "LOINC", "code": "4548-4" }], "operator": ">=", "value": 6.5 },
                { "condition_type": "Race", "race": "black" }
            ]
        },
        "low_risk": {
            "condition_type": "At Most",
            "maximum": 0,
            "conditions": [
                { "condition_type": "Attribute", "attribute": "smoker", "operator": "==", "value": true },
                { "condition_type": "Vital Sign", "vital_sign": "BMI", "operator": ">", "value": 30 }
            ]
        }
    }))
    .unwrap();

    let at = ts("2020-01-01");
    let high = &library["high_risk"];
    let low = &library["low_risk"];

    let one_factor = Subject::new(0).with_vital_sign(VitalSign::Bmi, 32.0);
    assert!(!high.test(&one_factor, at));
    assert!(!low.test(&one_factor, at));

    let two_factors = one_factor
        .clone()
        .with_observation("4548-4", ts("2019-01-01"), Some(7.0));
    assert!(high.test(&two_factors, at));

    let none = Subject::new(0).with_attribute("smoker", AttrValue::Bool(false));
    assert!(low.test(&none, at));
    assert!(!high.test(&none, at));
}

#[test]
fn test_treatment_pathway_with_referenced_codes() {
    // the diagnosis state stored the condition it recorded under an attribute
    let on_matching_medication = build(json!({
        "condition_type": "Or",
        "conditions": [
            { "condition_type": "Active Medication", "referenced_by_attribute": "first_line" },
            { "condition_type": "Active Medication", "referenced_by_attribute": "second_line" }
        ]
    }));

    let subject = Subject::new(0)
        .with_entry("first_line", "860975", None)
        .with_entry("second_line", "861007", None);
    assert!(!on_matching_medication.test(&subject, 0));

    let treated = subject.with_medication("861007");
    assert!(on_matching_medication.test(&treated, 0));
}

#[test]
fn test_prior_state_within_window() {
    let recent_visit = build(json!({
        "condition_type": "PriorState",
        "name": "Encounter",
        "within": { "quantity": 6, "unit": "months" }
    }));

    let subject = Subject::new(0)
        .with_state("Initial", 0, Some(0))
        .with_state("Encounter", ts("2019-01-01"), Some(ts("2019-01-02")))
        .with_state("Wait", ts("2019-01-02"), None);

    assert!(recent_visit.test(&subject, ts("2019-03-01")));
    assert!(!recent_visit.test(&subject, ts("2020-01-01")));
}

#[test]
fn test_date_gate() {
    let after_guideline = build(json!({
        "condition_type": "Date", "operator": ">=", "year": 2013
    }));
    let subject = Subject::new(0);

    assert!(!after_guideline.test(&subject, ts("2012-12-31")));
    assert!(after_guideline.test(&subject, ts("2013-01-01")));
}

#[test]
fn test_shared_condition_across_threads() {
    let condition = Arc::new(build(json!({
        "condition_type": "And",
        "conditions": [
            { "condition_type": "Symptom", "symptom": "Cough", "operator": ">=", "value": 50 },
            { "condition_type": "Age", "operator": ">=", "quantity": 18, "unit": "years" }
        ]
    })));

    let subjects: Vec<Subject> = (0..8)
        .map(|i| Subject::new(ts("1990-01-01")).with_symptom("Cough", f64::from(i * 10)))
        .collect();
    let at = ts("2020-01-01");

    let results: Vec<bool> = std::thread::scope(|scope| {
        let handles: Vec<_> = subjects
            .iter()
            .map(|subject| {
                let condition = Arc::clone(&condition);
                scope.spawn(move || condition.test(subject, at))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(
        results,
        vec![false, false, false, false, false, true, true, true]
    );
}

#[test]
fn test_display_of_built_tree() {
    let condition = build(json!({
        "condition_type": "Or",
        "conditions": [
            { "condition_type": "True" },
            { "condition_type": "Not", "condition": { "condition_type": "False" } }
        ]
    }));
    assert_eq!(condition.to_string(), "or(true, not(false))");
}
