//! Site-level aggregation of gear classifications.

use crate::gear::GearId;
use crate::status::{Classification, StatusCategory};
use serde::Serialize;
use tracing::debug;

/// Pass/fail verdict and per-category counts for one site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteSummary {
    overall_pass: bool,
    /// Category counts in first-seen order. Zero counts are omitted.
    counts: Vec<(StatusCategory, usize)>,
}

impl SiteSummary {
    /// True iff every classified unit is Pass. An empty site passes.
    pub fn overall_pass(&self) -> bool {
        self.overall_pass
    }

    /// Category counts in evaluation order.
    pub fn counts(&self) -> &[(StatusCategory, usize)] {
        &self.counts
    }

    pub fn count(&self, category: StatusCategory) -> usize {
        self.counts
            .iter()
            .find(|(c, _)| *c == category)
            .map_or(0, |(_, n)| *n)
    }

    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, n)| n).sum()
    }

    pub fn verdict(&self) -> &'static str {
        if self.overall_pass { "Pass" } else { "Fail" }
    }
}

/// Fold classifications, in configuration order, into a site summary.
pub fn aggregate<'a, I>(classifications: I) -> SiteSummary
where
    I: IntoIterator<Item = (&'a GearId, &'a Classification)>,
{
    let mut overall_pass = true;
    let mut counts: Vec<(StatusCategory, usize)> = Vec::new();

    for (id, classification) in classifications {
        let category = classification.category();
        debug!("{id}: {category}");

        if !category.is_pass() {
            overall_pass = false;
        }
        match counts.iter_mut().find(|(c, _)| *c == category) {
            Some((_, n)) => *n += 1,
            None => counts.push((category, 1)),
        }
    }

    SiteSummary {
        overall_pass,
        counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(address: u8, category: StatusCategory) -> (GearId, Classification) {
        (
            GearId::new("hq", "ground", address),
            Classification::new(category, vec![]),
        )
    }

    fn run(entries: &[(GearId, Classification)]) -> SiteSummary {
        aggregate(entries.iter().map(|(id, c)| (id, c)))
    }

    #[test]
    fn all_pass() {
        let entries = vec![
            entry(0, StatusCategory::Pass),
            entry(1, StatusCategory::Pass),
        ];
        let summary = run(&entries);
        assert!(summary.overall_pass());
        assert_eq!(summary.verdict(), "Pass");
        assert_eq!(summary.counts(), &[(StatusCategory::Pass, 2)]);
    }

    #[test]
    fn single_pending_fails_site() {
        let entries = vec![
            entry(0, StatusCategory::Pass),
            entry(1, StatusCategory::Pending),
            entry(2, StatusCategory::Pass),
        ];
        let summary = run(&entries);
        assert!(!summary.overall_pass());
        assert_eq!(summary.verdict(), "Fail");
        assert_eq!(summary.count(StatusCategory::Pending), 1);
        assert_eq!(summary.count(StatusCategory::Pass), 2);
    }

    #[test]
    fn unreachable_fails_site() {
        let entries = vec![entry(0, StatusCategory::Unreachable)];
        assert!(!run(&entries).overall_pass());
    }

    #[test]
    fn counts_keep_first_seen_order() {
        let entries = vec![
            entry(0, StatusCategory::Overdue),
            entry(1, StatusCategory::Pass),
            entry(2, StatusCategory::Fail),
            entry(3, StatusCategory::Pass),
            entry(4, StatusCategory::Overdue),
        ];
        let summary = run(&entries);
        assert_eq!(
            summary.counts(),
            &[
                (StatusCategory::Overdue, 2),
                (StatusCategory::Pass, 2),
                (StatusCategory::Fail, 1),
            ]
        );
        assert_eq!(summary.total(), 5);
        assert_eq!(summary.count(StatusCategory::Unreachable), 0);
    }

    #[test]
    fn empty_site_passes() {
        let summary = run(&[]);
        assert!(summary.overall_pass());
        assert!(summary.counts().is_empty());
    }
}
