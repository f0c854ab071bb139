use crate::error::Result;
use crate::schema::{Month, MonthlyDataset};
use crate::storage::{load_dataset, month_key, KeyValueStore};
use log::debug;

/// Months with a stored dataset, in calendar order.
pub fn loaded_months(store: &dyn KeyValueStore) -> Result<Vec<Month>> {
    let mut months = Vec::new();
    for month in Month::all() {
        if store.get(&month_key(month))?.is_some() {
            months.push(month);
        }
    }
    Ok(months)
}

pub fn loaded_month_names(store: &dyn KeyValueStore) -> Result<Vec<String>> {
    Ok(loaded_months(store)?
        .into_iter()
        .map(|m| m.name().to_string())
        .collect())
}

pub fn all_months_loaded(store: &dyn KeyValueStore) -> Result<bool> {
    Ok(loaded_months(store)?.len() == Month::all().count())
}

/// Concatenates every stored month in calendar order, stamping each record with
/// `month_name` and `month_index`. An empty result means nothing is loaded.
pub fn aggregate(store: &dyn KeyValueStore) -> Result<MonthlyDataset> {
    let mut all = Vec::new();
    for month in Month::all() {
        let Some(dataset) = load_dataset(store, &month_key(month))? else {
            continue;
        };
        debug!("Aggregating {} records from {}", dataset.len(), month);
        all.extend(dataset.into_iter().map(|mut record| {
            record.stamp_month(month);
            record
        }));
    }
    Ok(all)
}
