//! Tool for checking work-center load on a given day.
//!
//! Reads the work orders planned to start that day and totals their expected
//! duration per work center.

use std::collections::BTreeMap;

use chrono::{Local, NaiveDate};
use rig::{completion::ToolDefinition, tool::Tool};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    coerce,
    domain,
    error::MrpError,
    gateway::{Record, SharedStore},
};

const WORKORDER_FIELDS: [&str; 7] = [
    "id",
    "name",
    "workcenter_id",
    "state",
    "date_start",
    "date_finished",
    "duration_expected",
];

/// Sums planned work-order minutes per work center for one day.
pub struct CapacityCheck {
    pub(crate) store: SharedStore,
}

impl CapacityCheck {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }
}

/// Arguments for [`CapacityCheck`].
#[derive(Debug, Default, Deserialize)]
pub struct CapacityCheckArgs {
    /// Restrict to one work center; 0 or absent means all.
    #[serde(default)]
    pub workcenter_id: Option<i64>,
    /// Day to check, `YYYY-MM-DD`. Defaults to today.
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CapacityReport {
    pub date: String,
    /// Sum of expected minutes across all returned work orders.
    pub planned_minutes: f64,
    /// Expected minutes per work-center name.
    pub by_workcenter: BTreeMap<String, f64>,
    pub workorders: Vec<Record>,
}

fn parse_day(date: Option<&str>) -> Result<NaiveDate, MrpError> {
    match date.map(str::trim).filter(|d| !d.is_empty()) {
        None => Ok(Local::now().date_naive()),
        Some(d) => NaiveDate::parse_from_str(d, "%Y-%m-%d")
            .map_err(|e| MrpError::InvalidArgument(format!("date '{d}' is not YYYY-MM-DD: {e}"))),
    }
}

fn summarize(date: NaiveDate, workorders: Vec<Record>) -> Result<CapacityReport, MrpError> {
    let mut by_workcenter = BTreeMap::new();
    let mut planned_minutes = 0.0;
    for wo in &workorders {
        let minutes = coerce::to_f64(wo.get("duration_expected").unwrap_or(&Value::Null))?;
        let center = wo
            .get("workcenter_id")
            .and_then(coerce::reference_label)
            .unwrap_or("unassigned");
        *by_workcenter.entry(center.to_string()).or_insert(0.0) += minutes;
        planned_minutes += minutes;
    }
    Ok(CapacityReport {
        date: date.format("%Y-%m-%d").to_string(),
        planned_minutes,
        by_workcenter,
        workorders,
    })
}

impl Tool for CapacityCheck {
    const NAME: &'static str = "capacity_check";
    type Error = MrpError;
    type Args = CapacityCheckArgs;
    type Output = CapacityReport;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Summarize work orders and planned minutes per work center on a date"
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "workcenter_id": {
                        "type": "integer",
                        "description": "Optional work center id to restrict the check to"
                    },
                    "date": {
                        "type": "string",
                        "description": "Day to check as YYYY-MM-DD (defaults to today)"
                    }
                }
            }),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        let day = parse_day(args.date.as_deref())?;
        let workcenter = args.workcenter_id.filter(|id| *id != 0);
        let domain = domain::workorders_on(&day.format("%Y-%m-%d").to_string(), workcenter);
        let workorders = self
            .store
            .search_read("mrp.workorder", &WORKORDER_FIELDS, &domain)
            .await?;
        summarize(day, workorders)
    }
}
