//! Sorted views over the case store.
//!
//! Dates are compared as strings. Stored dates are ISO-8601 (`YYYY-MM-DD`, enforced on
//! create and import), for which string order is chronological order.

use crate::case::CaseSummary;
use crate::store::CaseStore;
use crate::CaseResult;

/// Sorts newest first. The sort is stable, so cases sharing a date keep the order the
/// backend listed them in.
pub fn sort_by_date_desc(summaries: &mut [CaseSummary]) {
    summaries.sort_by(|a, b| b.meta.date.cmp(&a.meta.date));
}

#[derive(Clone, Debug)]
pub struct CaseDirectory {
    store: CaseStore,
}

impl CaseDirectory {
    pub fn new(store: CaseStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &CaseStore {
        &self.store
    }

    /// Every case, newest first.
    pub async fn list_sorted(&self) -> CaseResult<Vec<CaseSummary>> {
        let mut summaries = self.store.list_all().await?;
        sort_by_date_desc(&mut summaries);
        Ok(summaries)
    }

    /// The `n` most recent cases, or all of them when there are fewer than `n`.
    pub async fn latest(&self, n: usize) -> CaseResult<Vec<CaseSummary>> {
        let mut summaries = self.list_sorted().await?;
        summaries.truncate(n);
        Ok(summaries)
    }
}
