//! Read-only report view.
//!
//! Renderers and notification policies see exactly these fields and nothing
//! of the evaluator's internals.

use crate::config::{Expectations, SiteConfig};
use crate::gear::GearId;
use crate::status::Classification;
use crate::summary::{SiteSummary, aggregate};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One evaluated gear unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GearReport {
    id: GearId,
    name: String,
    classification: Classification,
}

impl GearReport {
    pub fn new(id: GearId, name: impl Into<String>, classification: Classification) -> Self {
        Self {
            id,
            name: name.into(),
            classification,
        }
    }

    pub fn id(&self) -> &GearId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn classification(&self) -> &Classification {
        &self.classification
    }
}

/// Evaluated state of one site at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteReport {
    site: String,
    name: String,
    report_time: DateTime<Utc>,
    expectations: Expectations,
    gear: Vec<GearReport>,
    summary: SiteSummary,
}

impl SiteReport {
    /// Build a report from gear evaluated in configuration order.
    pub fn new(
        site: &SiteConfig,
        expectations: Expectations,
        report_time: DateTime<Utc>,
        gear: Vec<GearReport>,
    ) -> Self {
        let summary = aggregate(gear.iter().map(|g| (&g.id, &g.classification)));
        Self {
            site: site.id.clone(),
            name: site.name.clone(),
            report_time,
            expectations,
            gear,
            summary,
        }
    }

    /// Site key.
    pub fn site(&self) -> &str {
        &self.site
    }

    /// Site display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn report_time(&self) -> DateTime<Utc> {
        self.report_time
    }

    /// Site-wide expectations the gear was held to.
    pub fn expectations(&self) -> &Expectations {
        &self.expectations
    }

    /// Gear in configuration order.
    pub fn gear(&self) -> &[GearReport] {
        &self.gear
    }

    pub fn summary(&self) -> &SiteSummary {
        &self.summary
    }

    pub fn overall_pass(&self) -> bool {
        self.summary.overall_pass()
    }

    /// Subject line for a mailed report.
    pub fn subject(&self) -> String {
        format!("{} emergency lighting status: {}", self.name, self.summary.verdict())
    }
}
