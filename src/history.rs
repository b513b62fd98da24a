use crate::dates::{display_date, display_time};
use crate::models::{DailyRecord, DaySummary, HistoryResponse};

pub fn build_history(history: &[DailyRecord]) -> HistoryResponse {
    HistoryResponse {
        records: history.to_vec(),
        summaries: history.iter().map(summarize).collect(),
    }
}

pub fn summarize(record: &DailyRecord) -> DaySummary {
    let total_calories = record
        .meal_entries
        .iter()
        .chain(record.misc_entries.iter())
        .fold(0i64, |sum, entry| sum.saturating_add(entry.calories));

    DaySummary {
        date: record.date_key.clone(),
        date_label: display_date(&record.date_key),
        meal_count: record.meal_entries.len(),
        meal_times: record
            .meal_entries
            .iter()
            .filter(|entry| !entry.time.trim().is_empty())
            .map(|entry| display_time(&entry.time))
            .collect(),
        misc_count: record.misc_entries.len(),
        activity_count: record.activity_entries.len(),
        total_calories,
        water_intake: record.water_intake,
        ketosis: record.ketosis,
        followed_plan: record.followed_plan,
    }
}
