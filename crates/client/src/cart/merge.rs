//! Per-item results of the guest-to-account merge.
//!
//! The merge is best-effort: a failed item is recorded and skipped, never
//! retried, and never blocks the rest of the migration. The report gives the
//! UI a single honest summary instead of a silent partial success.

use pawstore_core::ProductId;

/// What happened to one migrated item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The item now lives in the account's remote realm.
    Migrated,
    /// The item could not be moved and was dropped with the guest realm.
    Failed {
        /// Backend or transport error text.
        reason: String,
    },
}

/// One migrated cart line or wishlist entry.
#[derive(Debug, Clone)]
pub struct MergeItem {
    /// The product the item referenced.
    pub product_id: ProductId,
    /// Migration outcome.
    pub outcome: MergeOutcome,
}

impl MergeItem {
    fn migrated(&self) -> bool {
        matches!(self.outcome, MergeOutcome::Migrated)
    }
}

/// Collected outcome of one `Anonymous -> Authenticated` transition.
#[derive(Debug, Clone, Default)]
pub struct MergeReport {
    /// Outcomes for cart lines, in migration order.
    pub cart: Vec<MergeItem>,
    /// Outcomes for wishlist entries, in migration order.
    pub wishlist: Vec<MergeItem>,
}

impl MergeReport {
    /// Total number of items the guest realms held.
    #[must_use]
    pub fn total(&self) -> usize {
        self.cart.len() + self.wishlist.len()
    }

    /// Number of items that reached the remote realm.
    #[must_use]
    pub fn migrated(&self) -> usize {
        self.cart
            .iter()
            .chain(&self.wishlist)
            .filter(|item| item.migrated())
            .count()
    }

    /// Whether every item migrated.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.migrated() == self.total()
    }

    /// One-line summary for a notification toast.
    #[must_use]
    pub fn summary(&self) -> String {
        match (self.migrated(), self.total()) {
            (_, 0) => "No saved items to move".to_owned(),
            (m, t) if m == t => format!("All {t} saved items moved to your account"),
            (m, t) => format!("{m} of {t} saved items moved to your account"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, outcome: MergeOutcome) -> MergeItem {
        MergeItem {
            product_id: ProductId::new(id),
            outcome,
        }
    }

    #[test]
    fn test_empty_report() {
        let report = MergeReport::default();
        assert!(report.is_complete());
        assert_eq!(report.summary(), "No saved items to move");
    }

    #[test]
    fn test_partial_summary() {
        let report = MergeReport {
            cart: vec![
                item("p1", MergeOutcome::Migrated),
                item(
                    "p2",
                    MergeOutcome::Failed {
                        reason: "backend returned 500".into(),
                    },
                ),
            ],
            wishlist: vec![item("p3", MergeOutcome::Migrated)],
        };
        assert!(!report.is_complete());
        assert_eq!(report.migrated(), 2);
        assert_eq!(report.summary(), "2 of 3 saved items moved to your account");
    }

    #[test]
    fn test_complete_summary() {
        let report = MergeReport {
            cart: vec![item("p1", MergeOutcome::Migrated)],
            wishlist: vec![item("p2", MergeOutcome::Migrated)],
        };
        assert_eq!(
            report.summary(),
            "All 2 saved items moved to your account"
        );
    }
}
