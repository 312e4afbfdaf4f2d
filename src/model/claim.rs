//! Claim records and prediction results

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Every field an inbound claim must carry. All are strings; no others are allowed.
pub const CLAIM_FIELDS: [&str; 22] = [
    "ClaimID",
    "PolicyNumber",
    "ClaimDate",
    "IncidentDate",
    "ReportedWithinPolicyTimeframe",
    "IncidentType",
    "EstimatedRepairCost",
    "ActualCashValue",
    "ClaimAmount",
    "PolicyCoverageLimit",
    "Deductible",
    "DriverAtFault",
    "LegalActivityInvolved",
    "EvidenceOfFraud",
    "ClaimSeverity",
    "TotalLoss",
    "PayableClaimAmount",
    "ClaimOutcome",
    "FaultPercentage",
    "EvidenceSources",
    "ExpertConsulted",
    "LiabilityDisputed",
];

/// An inbound insurance claim with a closed, flat schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct Claim {
    #[serde(rename = "ClaimID")]
    pub claim_id: String,
    pub policy_number: String,
    pub claim_date: String,
    pub incident_date: String,
    pub reported_within_policy_timeframe: String,
    pub incident_type: String,
    pub estimated_repair_cost: String,
    pub actual_cash_value: String,
    pub claim_amount: String,
    pub policy_coverage_limit: String,
    pub deductible: String,
    pub driver_at_fault: String,
    pub legal_activity_involved: String,
    pub evidence_of_fraud: String,
    pub claim_severity: String,
    pub total_loss: String,
    pub payable_claim_amount: String,
    pub claim_outcome: String,
    pub fault_percentage: String,
    pub evidence_sources: String,
    pub expert_consulted: String,
    pub liability_disputed: String,
}

/// Outcome of a single prediction request, derived from a claim and a model reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PredictionResult {
    pub prediction: Option<String>,
    #[serde(rename = "Claim")]
    pub claim: Claim,
    pub rules_used: Vec<String>,
}

/// Stored projection of a prediction result, keyed by claim ID
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct ClaimResultRecord {
    #[serde(rename = "ClaimID")]
    pub claim_id: String,
    pub policy_number: String,
    pub claim_date: String,
    pub incident_date: String,
    pub reported_within_policy_timeframe: String,
    pub incident_type: String,
    pub estimated_repair_cost: String,
    pub actual_cash_value: String,
    pub claim_amount: String,
    pub policy_coverage_limit: String,
    pub deductible: String,
    pub driver_at_fault: String,
    pub legal_activity_involved: String,
    pub evidence_of_fraud: String,
    pub claim_severity: String,
    pub total_loss: String,
    pub payable_claim_amount: String,
    pub claim_outcome: String,
    pub fault_percentage: String,
    pub evidence_sources: String,
    pub expert_consulted: String,
    pub liability_disputed: String,
    pub prediction: Option<String>,
    pub rules_used: Vec<String>,
}

impl From<&PredictionResult> for ClaimResultRecord {
    fn from(result: &PredictionResult) -> Self {
        let c = &result.claim;
        Self {
            claim_id: c.claim_id.clone(),
            policy_number: c.policy_number.clone(),
            claim_date: c.claim_date.clone(),
            incident_date: c.incident_date.clone(),
            reported_within_policy_timeframe: c.reported_within_policy_timeframe.clone(),
            incident_type: c.incident_type.clone(),
            estimated_repair_cost: c.estimated_repair_cost.clone(),
            actual_cash_value: c.actual_cash_value.clone(),
            claim_amount: c.claim_amount.clone(),
            policy_coverage_limit: c.policy_coverage_limit.clone(),
            deductible: c.deductible.clone(),
            driver_at_fault: c.driver_at_fault.clone(),
            legal_activity_involved: c.legal_activity_involved.clone(),
            evidence_of_fraud: c.evidence_of_fraud.clone(),
            claim_severity: c.claim_severity.clone(),
            total_loss: c.total_loss.clone(),
            payable_claim_amount: c.payable_claim_amount.clone(),
            claim_outcome: c.claim_outcome.clone(),
            fault_percentage: c.fault_percentage.clone(),
            evidence_sources: c.evidence_sources.clone(),
            expert_consulted: c.expert_consulted.clone(),
            liability_disputed: c.liability_disputed.clone(),
            prediction: result.prediction.clone(),
            rules_used: result.rules_used.clone(),
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_claim_json() -> serde_json::Map<String, serde_json::Value> {
    CLAIM_FIELDS
        .iter()
        .map(|f| (f.to_string(), serde_json::Value::String(format!("{f}-value"))))
        .collect()
}
