use crate::inspections::scoring::{record_rank, Flag};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of an inspection plan. Plans are created SUBMITTED, move to
/// CONCLUDED when the inspector finishes field work, and to REVIEWED once
/// board staff sign off.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum InspectionStatus {
    #[serde(rename = "SUBMITTED")]
    Submitted,
    #[serde(rename = "CONCLUDED")]
    Concluded,
    #[serde(rename = "REVIEWED")]
    Reviewed,
}

impl InspectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InspectionStatus::Submitted => "SUBMITTED",
            InspectionStatus::Concluded => "CONCLUDED",
            InspectionStatus::Reviewed => "REVIEWED",
        }
    }

    /// Accepts the lowercase labels clients send on the status route.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "submitted" => Some(InspectionStatus::Submitted),
            "concluded" => Some(InspectionStatus::Concluded),
            "reviewed" => Some(InspectionStatus::Reviewed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InspectionPlan {
    pub id: Uuid,
    pub minesite_id: Uuid,
    pub inspector_id: Uuid,
    pub status: InspectionStatus,
    pub start_date: String,
    pub end_date: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InspectionRecord {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    pub pseudo_name: String,
    pub box_value: String,
    pub flag_value: Flag,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct PlanWithRecords {
    #[serde(flatten)]
    pub plan: InspectionPlan,
    pub records: Vec<InspectionRecord>,
    pub total_score: u32,
}

impl PlanWithRecords {
    /// The plan score is the sum of the rank weights of its record flags.
    pub fn new(plan: InspectionPlan, records: Vec<InspectionRecord>) -> Self {
        let total_score = records.iter().map(|r| record_rank(r.flag_value)).sum();
        Self {
            plan,
            records,
            total_score,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePlanRequest {
    pub minesite_id: Uuid,
    pub start_date: String,
    pub end_date: String,
}

impl CreatePlanRequest {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if self.start_date.trim().is_empty() {
            errors.push("start_date must not be empty".to_string());
        }
        if self.end_date.trim().is_empty() {
            errors.push("end_date must not be empty".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddRecordRequest {
    pub category_id: Uuid,
    pub title: String,
    pub pseudo_name: String,
    pub box_value: String,
}

impl AddRecordRequest {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if self.title.trim().is_empty() {
            errors.push("title must not be empty".to_string());
        }
        if self.box_value.trim().is_empty() {
            errors.push("box_value must not be empty".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReviewPlanRequest {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels_round_trip() {
        for status in [
            InspectionStatus::Submitted,
            InspectionStatus::Concluded,
            InspectionStatus::Reviewed,
        ] {
            assert_eq!(
                InspectionStatus::parse(&status.as_str().to_lowercase()),
                Some(status)
            );
        }
        assert_eq!(InspectionStatus::parse("in_progress"), None);
        assert_eq!(InspectionStatus::parse(""), None);
    }

    fn record(flag: Flag) -> InspectionRecord {
        InspectionRecord {
            id: Uuid::new_v4(),
            plan_id: Uuid::new_v4(),
            category_id: Uuid::new_v4(),
            title: "PPE".to_string(),
            pseudo_name: "ppe".to_string(),
            box_value: "yes".to_string(),
            flag_value: flag,
            created_at: "2026-01-01".to_string(),
        }
    }

    #[test]
    fn test_plan_total_score_sums_record_ranks() {
        let plan = InspectionPlan {
            id: Uuid::new_v4(),
            minesite_id: Uuid::new_v4(),
            inspector_id: Uuid::new_v4(),
            status: InspectionStatus::Submitted,
            start_date: "2026-01-01".to_string(),
            end_date: "2026-01-05".to_string(),
            created_at: "2026-01-01".to_string(),
        };

        let with = PlanWithRecords::new(
            plan.clone(),
            vec![
                record(Flag::Red),
                record(Flag::Green),
                record(Flag::Yellow),
                record(Flag::No),
            ],
        );
        assert_eq!(with.total_score, 40 + 92);

        let empty = PlanWithRecords::new(plan, Vec::new());
        assert_eq!(empty.total_score, 0);
    }
}
