//! Run one feature record through a loaded artifact.

use fooddrive_core::{FeatureRecord, PredictionError};

use crate::artifact::ModelArtifact;

/// Transform then predict, returning the single-sample single-target output.
///
/// Staged artifacts go through their preprocessor first; combined artifacts
/// receive the record directly.
pub fn run(artifact: &ModelArtifact, record: &FeatureRecord) -> Result<f64, PredictionError> {
    let outputs = match artifact {
        ModelArtifact::Staged(m) => {
            let encoded = m.preprocessor.transform(record)?;
            m.regressor.predict(&encoded)?
        }
        ModelArtifact::Combined(m) => m.predictor.predict(record)?,
    };
    first_output(outputs)
}

fn first_output(outputs: Vec<f64>) -> Result<f64, PredictionError> {
    let Some(&value) = outputs.first() else {
        return Err(PredictionError::Unexpected("model returned no output".into()));
    };
    if !value.is_finite() {
        return Err(PredictionError::Unexpected(format!(
            "model returned non-finite output {value}"
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fooddrive_core::FieldValue;

    fn staged() -> ModelArtifact {
        ModelArtifact::from_json_str(
            r#"{
                "layout": "staged",
                "preprocessor": {
                    "feature_names_in": ["Neighbourhood", "Doors in Route"],
                    "transforms": [
                        {"column": "Neighbourhood", "op": "one_hot", "categories": ["Clareview", "Downtown"]},
                        {"column": "Doors in Route", "op": "passthrough"}
                    ]
                },
                "regressor": {"kind": "linear", "coefficients": [1.0, 3.0, 0.25], "intercept": 2.0}
            }"#,
        )
        .unwrap()
    }

    fn combined() -> ModelArtifact {
        ModelArtifact::from_json_str(
            r#"{
                "layout": "combined",
                "predictor": {
                    "feature_order": ["Neighbourhood", "Doors in Route"],
                    "categories": {"Neighbourhood": ["Clareview", "Downtown"]},
                    "regressor": {"kind": "random_forest", "trees": [
                        {"nodes": [{"feature": 1, "threshold": 50.0, "left": 1, "right": 2}, {"value": 8.0}, {"value": 16.0}]}
                    ]}
                }
            }"#,
        )
        .unwrap()
    }

    fn record(neighbourhood: &str, doors: i64) -> FeatureRecord {
        FeatureRecord::new()
            .with("Neighbourhood", FieldValue::Text(neighbourhood.into()))
            .with("Doors in Route", FieldValue::Integer(doors))
    }

    #[test]
    fn staged_runs_both_stages() {
        // one-hot Downtown = [0, 1]: 3 + 0.25*100 + 2
        assert_eq!(run(&staged(), &record("Downtown", 100)).unwrap(), 30.0);
    }

    #[test]
    fn combined_runs_directly() {
        assert_eq!(run(&combined(), &record("Clareview", 40)).unwrap(), 8.0);
        assert_eq!(run(&combined(), &record("Clareview", 400)).unwrap(), 16.0);
    }

    #[test]
    fn identical_inputs_identical_outputs() {
        let artifact = staged();
        let r = record("Clareview", 73);
        let first = run(&artifact, &r).unwrap();
        let second = run(&artifact, &r).unwrap();
        assert_eq!(first.to_bits(), second.to_bits());
    }

    #[test]
    fn unseen_neighbourhood_in_both_layouts() {
        let r = record("Brand New Heights", 100);
        for artifact in [staged(), combined()] {
            assert_eq!(
                run(&artifact, &r).unwrap_err(),
                PredictionError::unknown_category("Neighbourhood", "Brand New Heights")
            );
        }
    }

    #[test]
    fn failure_is_repeatable() {
        let artifact = staged();
        let r = record("Nowhere", 100);
        assert_eq!(run(&artifact, &r).unwrap_err(), run(&artifact, &r).unwrap_err());
    }

    #[test]
    fn empty_output_is_unexpected() {
        assert!(matches!(
            first_output(vec![]),
            Err(PredictionError::Unexpected(_))
        ));
    }

    #[test]
    fn non_finite_output_is_unexpected() {
        assert!(matches!(
            first_output(vec![f64::NAN]),
            Err(PredictionError::Unexpected(_))
        ));
        assert!(matches!(
            first_output(vec![f64::INFINITY, 1.0]),
            Err(PredictionError::Unexpected(_))
        ));
    }

    #[test]
    fn takes_first_of_many() {
        assert_eq!(first_output(vec![4.5, 9.0]).unwrap(), 4.5);
    }
}
