//! Deterministic ranking of open manufacturing orders by deadline urgency.

use chrono::{Local, NaiveDate};
use rig::{completion::ToolDefinition, tool::Tool};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::orders::{fetch_orders, OrderSummary};
use crate::{domain, error::MrpError, gateway::SharedStore};

/// Ranks open orders by deadline urgency.
pub struct OrderPriority {
    pub(crate) store: SharedStore,
}

impl OrderPriority {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderPriorityArgs {}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedOrder {
    pub rank: usize,
    pub score: u32,
    pub reason: String,
    pub order: OrderSummary,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct PriorityReport {
    pub today: String,
    pub ranking: Vec<RankedOrder>,
}

/// Date part of a stored deadline ("YYYY-MM-DD HH:MM:SS" or "YYYY-MM-DD").
pub(crate) fn deadline_day(deadline: Option<&str>) -> Option<NaiveDate> {
    let text = deadline?;
    NaiveDate::parse_from_str(text.get(..10)?, "%Y-%m-%d").ok()
}

fn urgency(deadline: Option<NaiveDate>, today: NaiveDate) -> (u32, String) {
    let Some(day) = deadline else {
        return (10, "no deadline set".into());
    };
    let days = (day - today).num_days();
    match days {
        d if d < 0 => (100, format!("overdue by {} day(s)", -d)),
        0 => (80, "due today".into()),
        d @ 1..=2 => (80, format!("due in {d} day(s)")),
        d @ 3..=7 => (50, format!("due in {d} days")),
        d => (20, format!("due in {d} days")),
    }
}

/// Rank by score, then earliest deadline, then largest quantity.
pub fn rank_orders(orders: Vec<OrderSummary>, today: NaiveDate) -> Vec<RankedOrder> {
    let mut scored: Vec<_> = orders
        .into_iter()
        .map(|order| {
            let day = deadline_day(order.deadline.as_deref());
            let (score, reason) = urgency(day, today);
            (score, day, order, reason)
        })
        .collect();

    scored.sort_by(|a, b| {
        b.0.cmp(&a.0)
            .then_with(|| match (a.1, b.1) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            })
            .then_with(|| b.2.qty.total_cmp(&a.2.qty))
    });

    scored
        .into_iter()
        .enumerate()
        .map(|(i, (score, _, order, reason))| RankedOrder {
            rank: i + 1,
            score,
            reason,
            order,
        })
        .collect()
}

impl Tool for OrderPriority {
    const NAME: &'static str = "order_priority";
    type Error = MrpError;
    type Args = OrderPriorityArgs;
    type Output = PriorityReport;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Rank open manufacturing orders by deadline urgency, with a score and reason for each"
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {}
            }),
        }
    }

    async fn call(&self, _args: Self::Args) -> Result<Self::Output, Self::Error> {
        let today = Local::now().date_naive();
        let orders = fetch_orders(&self.store, &domain::open_orders()).await?;
        Ok(PriorityReport {
            today: today.to_string(),
            ranking: rank_orders(orders, today),
        })
    }
}
