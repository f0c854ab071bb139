use crate::schema::{MonthlyDataset, SalesRecord};
use log::debug;

/// How many aggregated records may be sent to the assistant.
///
/// The total is split evenly across loaded months, but each month always gets
/// at least `min_per_month` slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleBudget {
    pub total: usize,
    pub min_per_month: usize,
}

impl Default for SampleBudget {
    fn default() -> Self {
        Self {
            total: 500,
            min_per_month: 10,
        }
    }
}

impl SampleBudget {
    /// `floor(total / loaded_months)`. With no months loaded there is nothing to
    /// divide by and every record of every month is kept.
    pub fn per_month(&self, loaded_months: usize) -> Option<usize> {
        self.total.checked_div(loaded_months)
    }

    /// The number of records actually taken from each month.
    pub fn quota(&self, loaded_months: usize) -> usize {
        self.per_month(loaded_months)
            .map_or(usize::MAX, |n| n.max(self.min_per_month))
    }
}

/// Takes the first `quota` records of each month 1..=12, in month order.
///
/// This is deliberately the leading rows of each month and not a random draw:
/// the assistant sees the same rows for the same upload every time.
pub fn select_sample(
    records: &[SalesRecord],
    loaded_months: usize,
    budget: SampleBudget,
) -> MonthlyDataset {
    let quota = budget.quota(loaded_months);
    let mut sample = Vec::new();

    for month in 1..=12 {
        let before = sample.len();
        sample.extend(
            records
                .iter()
                .filter(|r| r.month_index() == Some(month))
                .take(quota)
                .cloned(),
        );
        if sample.len() > before {
            debug!("Sampled {} records from month {}", sample.len() - before, month);
        }
    }

    sample
}
