//! Risk assessment for a single manufacturing order from its state and
//! deadline.

use chrono::{Local, NaiveDate};
use rig::{completion::ToolDefinition, tool::Tool};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{
    orders::{fetch_orders, OrderSummary},
    priority::deadline_day,
};
use crate::{domain, error::MrpError, gateway::SharedStore};

/// Rates one order low, medium or high risk from its state and deadline.
pub struct OrderRisk {
    pub(crate) store: SharedStore,
}

impl OrderRisk {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }
}

#[derive(Debug, Deserialize)]
pub struct OrderRiskArgs {
    pub mo_id: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct RiskAssessment {
    pub mo_id: i64,
    pub name: String,
    pub state: String,
    pub risk_level: RiskLevel,
    pub notes: Vec<String>,
}

pub fn assess(order: &OrderSummary, today: NaiveDate) -> RiskAssessment {
    let mut notes = Vec::new();
    let level = match order.state.as_str() {
        "done" | "cancel" => {
            notes.push(format!("order is {}", order.state));
            RiskLevel::Low
        }
        state => {
            if state == "draft" {
                notes.push("order is still a draft and has not been confirmed".into());
            }
            let level = match deadline_day(order.deadline.as_deref()) {
                None => {
                    notes.push("no deadline set".into());
                    RiskLevel::Medium
                }
                Some(day) => match (day - today).num_days() {
                    d if d < 0 => {
                        notes.push(format!("deadline passed {} day(s) ago", -d));
                        RiskLevel::High
                    }
                    d @ 0..=2 if state != "progress" => {
                        notes.push(format!("due in {d} day(s) and production has not started"));
                        RiskLevel::High
                    }
                    d @ 0..=7 => {
                        notes.push(format!("due in {d} day(s)"));
                        RiskLevel::Medium
                    }
                    _ => RiskLevel::Low,
                },
            };
            if level > RiskLevel::Low {
                notes.push("material checks recommended".into());
            }
            level
        }
    };

    RiskAssessment {
        mo_id: order.id,
        name: order.name.clone(),
        state: order.state.clone(),
        risk_level: level,
        notes,
    }
}

impl Tool for OrderRisk {
    const NAME: &'static str = "order_risk";
    type Error = MrpError;
    type Args = OrderRiskArgs;
    type Output = RiskAssessment;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Assess delivery risk (low, medium, high) of a manufacturing order".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "mo_id": {
                        "type": "integer",
                        "description": "Manufacturing order id"
                    }
                },
                "required": ["mo_id"]
            }),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        if args.mo_id == 0 {
            return Err(MrpError::InvalidArgument("mo_id is required".into()));
        }
        let orders = fetch_orders(&self.store, &domain::by_id(args.mo_id)).await?;
        let order = orders
            .first()
            .ok_or_else(|| MrpError::NotFound(format!("manufacturing order {}", args.mo_id)))?;
        Ok(assess(order, Local::now().date_naive()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::testing::FakeStore;

    fn order(state: &str, deadline: Option<&str>) -> OrderSummary {
        OrderSummary {
            id: 4,
            name: "WH/MO/00004".into(),
            product: "Green Tea".into(),
            product_id: Some(7),
            qty: 100.0,
            deadline: deadline.map(str::to_string),
            state: state.into(),
            workorder_ids: Vec::new(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    #[test]
    fn overdue_is_high() {
        let out = assess(&order("confirmed", Some("2025-03-01 00:00:00")), today());
        assert_eq!(out.risk_level, RiskLevel::High);
        assert_eq!(out.notes[0], "deadline passed 9 day(s) ago");
    }

    #[test]
    fn close_deadline_depends_on_progress() {
        let waiting = assess(&order("confirmed", Some("2025-03-11")), today());
        assert_eq!(waiting.risk_level, RiskLevel::High);
        let running = assess(&order("progress", Some("2025-03-11")), today());
        assert_eq!(running.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn finished_and_distant_orders_are_low() {
        assert_eq!(
            assess(&order("done", Some("2025-03-01")), today()).risk_level,
            RiskLevel::Low
        );
        let distant = assess(&order("confirmed", Some("2025-06-01")), today());
        assert_eq!(distant.risk_level, RiskLevel::Low);
        assert!(distant.notes.is_empty());
    }

    #[test]
    fn missing_deadline_is_medium() {
        let out = assess(&order("draft", None), today());
        assert_eq!(out.risk_level, RiskLevel::Medium);
        assert_eq!(out.notes.len(), 3);
        assert_eq!(serde_json::to_value(out.risk_level).unwrap(), json!("medium"));
    }

    #[tokio::test]
    async fn unknown_order_is_not_found() {
        let tool = OrderRisk::new(Arc::new(FakeStore::default()));
        let err = tool.call(OrderRiskArgs { mo_id: 99 }).await.unwrap_err();
        assert_eq!(err.to_string(), "not found: manufacturing order 99");
    }
}
