//! Inbound claim shape validation
//!
//! Runs before any storage or model work. Every violation is reported, not
//! just the first.

use serde_json::{Map, Value};

use crate::model::CLAIM_FIELDS;

/// Check a raw claim object against the closed claim schema
///
/// Returns `None` when the claim is valid, otherwise every violation found.
pub fn validate_claim(claim: &Map<String, Value>) -> Option<Vec<String>> {
    let mut errors = Vec::new();

    for field in CLAIM_FIELDS {
        match claim.get(field) {
            None => errors.push(format!("Missing field: {field}")),
            Some(Value::String(_)) => {}
            Some(other) => errors.push(format!(
                "Incorrect type for field {field}: expected str, got {}",
                json_type_name(other)
            )),
        }
    }

    for field in claim.keys() {
        if !CLAIM_FIELDS.contains(&field.as_str()) {
            errors.push(format!("Unexpected field: {field}"));
        }
    }

    if errors.is_empty() {
        None
    } else {
        Some(errors)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::claim::sample_claim_json;
    use serde_json::json;

    #[test]
    fn test_complete_claim_is_valid() {
        assert_eq!(validate_claim(&sample_claim_json()), None);
    }

    #[test]
    fn test_one_error_per_missing_field() {
        let mut claim = sample_claim_json();
        claim.remove("ClaimID");
        claim.remove("Deductible");

        let errors = validate_claim(&claim).unwrap();
        assert_eq!(
            errors,
            vec!["Missing field: ClaimID", "Missing field: Deductible"]
        );
    }

    #[test]
    fn test_wrong_types_are_reported() {
        let mut claim = sample_claim_json();
        claim.insert("ClaimAmount".into(), json!(1500));
        claim.insert("FaultPercentage".into(), json!(12.5));
        claim.insert("TotalLoss".into(), json!(false));
        claim.insert("EvidenceSources".into(), json!(["photos"]));
        claim.insert("ExpertConsulted".into(), Value::Null);

        let errors = validate_claim(&claim).unwrap();
        assert_eq!(
            errors,
            vec![
                "Incorrect type for field ClaimAmount: expected str, got int",
                "Incorrect type for field TotalLoss: expected str, got bool",
                "Incorrect type for field FaultPercentage: expected str, got float",
                "Incorrect type for field EvidenceSources: expected str, got list",
                "Incorrect type for field ExpertConsulted: expected str, got null",
            ]
        );
    }

    #[test]
    fn test_unexpected_fields_are_reported() {
        let mut claim = sample_claim_json();
        claim.insert("Notes".into(), json!("n/a"));

        let errors = validate_claim(&claim).unwrap();
        assert_eq!(errors, vec!["Unexpected field: Notes"]);
    }

    #[test]
    fn test_all_violation_kinds_accumulate() {
        let mut claim = sample_claim_json();
        claim.remove("PolicyNumber");
        claim.insert("ClaimDate".into(), json!({"y": 2024}));
        claim.insert("Extra".into(), json!("x"));

        let errors = validate_claim(&claim).unwrap();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&"Missing field: PolicyNumber".to_string()));
        assert!(
            errors.contains(&"Incorrect type for field ClaimDate: expected str, got dict".to_string())
        );
        assert!(errors.contains(&"Unexpected field: Extra".to_string()));
    }

    #[test]
    fn test_empty_claim_reports_every_field() {
        let errors = validate_claim(&Map::new()).unwrap();
        assert_eq!(errors.len(), CLAIM_FIELDS.len());
        assert!(errors.iter().all(|e| e.starts_with("Missing field: ")));
    }
}
