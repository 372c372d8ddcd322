use battlestat_core::{
    Confidence, ModelConfig, PredictionOptions, ProfilePayload, Substance, TelemetrySnapshot,
    predict,
};

const CAPTURED_AT: i64 = 1_704_067_200;

#[test]
fn missing_sections_default_to_zero() {
    let snapshot = ProfilePayload::from_json(r#"{ "profile": {}, "personalstats": {} }"#)
        .unwrap()
        .into_snapshot(CAPTURED_AT);
    assert_eq!(
        snapshot,
        TelemetrySnapshot {
            captured_at: CAPTURED_AT,
            ..TelemetrySnapshot::default()
        }
    );
    let prediction = predict(&snapshot, ModelConfig::bundled(), PredictionOptions::default());
    assert!(prediction.final_estimate.abs() < f64::EPSILON);
    assert_eq!(prediction.confidence, Confidence::Low);
}

#[test]
fn payload_and_flat_snapshot_agree() {
    let payload = r#"{
        "profile": { "name": "Pair", "level": 55, "age": 1500, "rank": "Competent" },
        "personalstats": {
            "other": { "donator_days": 900, "activity": { "time": 51840000 }, "refills": { "energy": 400 } },
            "drugs": { "xanax": 800, "lsd": 20 },
            "criminalrecord": { "theft": 3000, "fraud": 800 },
            "items": { "used": { "stat_enhancers": 12 } }
        }
    }"#;
    let from_payload = ProfilePayload::from_json(payload)
        .unwrap()
        .into_snapshot(CAPTURED_AT);

    let flat = format!(
        r#"{{
            "name": "Pair", "level": 55, "rank": "Competent", "captured_at": {CAPTURED_AT},
            "age_days": 1500, "donator_days": 900, "activity_time": 51840000,
            "energy_refills": 400, "stat_enhancers": 12,
            "substances": {{ "xanax": 800, "lsd": 20 }},
            "crimes": {{ "theft": 3000, "fraud": 800 }}
        }}"#
    );
    let from_flat: TelemetrySnapshot = serde_json::from_str(&flat).unwrap();
    assert_eq!(from_payload, from_flat);
    assert_eq!(from_flat.substance(Substance::Xanax), 800);

    let model = ModelConfig::bundled();
    let options = PredictionOptions {
        rank_correction: true,
    };
    let left = predict(&from_payload, model, options);
    let right = predict(&from_flat, model, options);
    assert_eq!(left, right);
    assert!(left.energy.total > 0.0);
    assert!(left.split.legacy > 0.0);
    assert!(left.rank_correction.is_some());
}

#[test]
fn prediction_serializes_for_reporting() {
    let snapshot = TelemetrySnapshot {
        name: "Json".to_string(),
        captured_at: CAPTURED_AT,
        age_days: 300,
        activity_time: 40 * 86_400,
        ..TelemetrySnapshot::default()
    };
    let prediction = predict(&snapshot, ModelConfig::bundled(), PredictionOptions::default());
    let value = serde_json::to_value(&prediction).unwrap();
    assert_eq!(value["name"], "Json");
    assert!(value["final_estimate"].as_f64().unwrap() > 0.0);
    assert!(value["sessions"].as_array().is_some_and(|s| !s.is_empty()));
    assert!(value["rank_correction"].is_null());
    assert!(value["confidence"].is_string());
}

#[test]
fn null_counters_estimate_like_missing_ones() {
    let with_nulls = r#"{
        "profile": { "name": "Gaps", "age": 700, "rank": null, "networth": { "total": null }, "last_action": null },
        "personalstats": {
            "other": { "donator_days": null, "activity": { "time": 8640000 }, "refills": null },
            "travel": { "time_spent": null },
            "drugs": { "xanax": 40, "lsd": null },
            "criminalrecord": null,
            "items": { "used": { "energy_drinks": null, "stat_enhancers": 2 }, "found": null },
            "attacking": { "attacks": { "won": null, "lost": 3 } },
            "hospital": null
        }
    }"#;
    let without = r#"{
        "profile": { "name": "Gaps", "age": 700 },
        "personalstats": {
            "other": { "activity": { "time": 8640000 } },
            "drugs": { "xanax": 40 },
            "items": { "used": { "stat_enhancers": 2 } },
            "attacking": { "attacks": { "lost": 3 } }
        }
    }"#;
    let left = ProfilePayload::from_json(with_nulls)
        .unwrap()
        .into_snapshot(CAPTURED_AT);
    let right = ProfilePayload::from_json(without)
        .unwrap()
        .into_snapshot(CAPTURED_AT);
    assert_eq!(left, right);
    assert!(left.networth.abs() < f64::EPSILON);
    assert_eq!(left.donator_days, 0);

    let prediction = predict(&left, ModelConfig::bundled(), PredictionOptions::default());
    assert!(prediction.energy.total > 0.0);
}

#[test]
fn extreme_capture_instant_still_estimates() {
    let snapshot: TelemetrySnapshot =
        serde_json::from_str(r#"{ "captured_at": -9223372036854775000, "age_days": 10 }"#).unwrap();
    let prediction = predict(&snapshot, ModelConfig::bundled(), PredictionOptions::default());
    assert!(prediction.final_estimate.is_finite());
    assert!((prediction.split.total() - prediction.energy.total).abs() < f64::EPSILON);
}
