//! Search-domain builders for the object service.
//!
//! A domain is a list of `[field, operator, value]` clauses, implicitly
//! AND-ed. An empty domain means "no filter"; the gateway then omits the
//! positional domain argument entirely instead of sending `[[]]`, which some
//! servers reject.
//!
//! Every tool builds its filter through one of the named constructors below
//! so the clause shapes live in one place.

use serde_json::{json, Value};

/// States of a manufacturing order that are still being worked on.
pub const ACTIVE_MO_STATES: [&str; 2] = ["confirmed", "progress"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Domain {
    clauses: Vec<Value>,
}

impl Domain {
    /// Match every record.
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn filter(mut self, field: &str, operator: &str, value: impl Into<Value>) -> Self {
        self.clauses.push(json!([field, operator, value.into()]));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn clauses(&self) -> &[Value] {
        &self.clauses
    }

    /// Positional arguments for `search_read`: `[]` or `[[clause, ...]]`.
    pub fn positional(&self) -> Vec<Value> {
        if self.is_empty() {
            Vec::new()
        } else {
            vec![Value::Array(self.clauses.clone())]
        }
    }
}

pub fn by_id(id: i64) -> Domain {
    Domain::all().filter("id", "=", id)
}

pub fn active_orders() -> Domain {
    Domain::all().filter("state", "in", json!(ACTIVE_MO_STATES))
}

pub fn open_orders() -> Domain {
    Domain::all().filter("state", "!=", "done")
}

pub fn product_by_code(code: &str) -> Domain {
    Domain::all().filter("default_code", "=", code)
}

pub fn boms_for_template(template_id: i64) -> Domain {
    Domain::all().filter("product_tmpl_id", "=", template_id)
}

pub fn stock_for_product(product_id: i64) -> Domain {
    Domain::all().filter("product_id", "=", product_id)
}

/// Optional case-insensitive name match; empty filter text means no filter.
pub fn name_like(filter: &str) -> Domain {
    if filter.trim().is_empty() {
        Domain::all()
    } else {
        Domain::all().filter("name", "ilike", filter.trim())
    }
}

/// Work orders whose planned start falls on `date` (YYYY-MM-DD), optionally
/// restricted to one work center.
pub fn workorders_on(date: &str, workcenter_id: Option<i64>) -> Domain {
    let mut domain = Domain::all()
        .filter("date_start", ">=", format!("{date} 00:00:00"))
        .filter("date_start", "<=", format!("{date} 23:59:59"));
    if let Some(id) = workcenter_id {
        domain = domain.filter("workcenter_id", "=", id);
    }
    domain
}
