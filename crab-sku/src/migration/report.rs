//! Run reports
//!
//! Every (tenant, table) unit ends in exactly one terminal [`UnitStatus`];
//! the [`RunReport`] aggregates them and is logged at the end of the run.

use serde::Serialize;

use super::resolver::MapStats;

/// Lifecycle of one (tenant, table) unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    NotStarted,
    Scanning,
    Patching,
    /// Every candidate row received its SKU reference
    Done,
    /// Table absent or without legacy columns
    Skipped,
    /// Some candidates stayed unresolved; a later run may finish them
    Partial,
    /// Storage error; the unit's transaction was rolled back
    Failed,
}

impl UnitStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            UnitStatus::Done | UnitStatus::Skipped | UnitStatus::Partial | UnitStatus::Failed
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitReport {
    pub tenant_id: i64,
    pub table: String,
    pub status: UnitStatus,
    pub candidates: usize,
    pub resolved: usize,
    pub unresolved: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UnitReport {
    pub fn new(tenant_id: i64, table: impl Into<String>) -> Self {
        Self {
            tenant_id,
            table: table.into(),
            status: UnitStatus::NotStarted,
            candidates: 0,
            resolved: 0,
            unresolved: 0,
            error: None,
        }
    }

    /// Move to `next`; terminal states are never left.
    pub fn advance(&mut self, next: UnitStatus) {
        if self.status.is_terminal() {
            return;
        }
        tracing::trace!(tenant_id = self.tenant_id, table = %self.table, from = ?self.status, to = ?next, "Unit state");
        self.status = next;
    }

    /// Terminal state after a committed pass
    pub fn complete(&mut self) {
        let next = if self.unresolved == 0 {
            UnitStatus::Done
        } else {
            UnitStatus::Partial
        };
        self.advance(next);
    }

    /// Record a failure. Nothing of the unit was committed.
    pub fn fail(&mut self, error: impl ToString) {
        self.resolved = 0;
        self.error = Some(error.to_string());
        self.advance(UnitStatus::Failed);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TenantOutcome {
    Processed,
    Skipped { reason: String },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TenantReport {
    pub tenant_id: i64,
    #[serde(flatten)]
    pub outcome: TenantOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maps: Option<MapStats>,
    /// Attribute values created by the legacy import
    pub seeded_values: usize,
    /// SKUs created for legacy variants
    pub generated_skus: usize,
    /// Set when legacy SKU generation stopped early; the backfill still ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_error: Option<String>,
    pub units: Vec<UnitReport>,
}

impl TenantReport {
    pub fn new(tenant_id: i64) -> Self {
        Self {
            tenant_id,
            outcome: TenantOutcome::Processed,
            maps: None,
            seeded_values: 0,
            generated_skus: 0,
            generation_error: None,
            units: Vec::new(),
        }
    }

    pub fn unit(&self, table: &str) -> Option<&UnitReport> {
        self.units.iter().find(|u| u.table == table)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunTotals {
    pub tenants_processed: usize,
    pub tenants_skipped: usize,
    pub tenants_failed: usize,
    pub units_done: usize,
    pub units_partial: usize,
    pub units_skipped: usize,
    pub units_failed: usize,
    pub candidates: usize,
    pub resolved: usize,
    pub unresolved: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub tenants: Vec<TenantReport>,
    pub totals: RunTotals,
}

impl RunReport {
    pub fn push(&mut self, tenant: TenantReport) {
        let totals = &mut self.totals;
        match tenant.outcome {
            TenantOutcome::Processed => totals.tenants_processed += 1,
            TenantOutcome::Skipped { .. } => totals.tenants_skipped += 1,
            TenantOutcome::Failed { .. } => totals.tenants_failed += 1,
        }
        for unit in &tenant.units {
            match unit.status {
                UnitStatus::Done => totals.units_done += 1,
                UnitStatus::Partial => totals.units_partial += 1,
                UnitStatus::Skipped => totals.units_skipped += 1,
                UnitStatus::Failed => totals.units_failed += 1,
                _ => {}
            }
            totals.candidates += unit.candidates;
            totals.resolved += unit.resolved;
            totals.unresolved += unit.unresolved;
        }
        self.tenants.push(tenant);
    }

    pub fn tenant(&self, tenant_id: i64) -> Option<&TenantReport> {
        self.tenants.iter().find(|t| t.tenant_id == tenant_id)
    }
}
