use rand::{Rng, distributions::Alphanumeric, thread_rng};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const ID_LEN: usize = 12;

pub const MAX_WATER: u8 = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct IntakeEntry {
    #[serde(deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(deserialize_with = "lenient::text")]
    pub source: String,
    #[serde(deserialize_with = "lenient::text")]
    pub time: String,
    #[serde(deserialize_with = "lenient::text")]
    pub serving: String,
    #[serde(deserialize_with = "lenient::int")]
    pub calories: i64,
    #[serde(deserialize_with = "lenient::int")]
    pub hunger_before: i32,
    #[serde(deserialize_with = "lenient::int")]
    pub hunger_after: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ActivityEntry {
    #[serde(deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(rename = "type", deserialize_with = "lenient::text")]
    pub kind: String,
    #[serde(deserialize_with = "lenient::text")]
    pub duration: String,
}

/// Staging value behind the meal and misc add forms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct PendingIntake {
    #[serde(deserialize_with = "lenient::text")]
    pub source: String,
    #[serde(deserialize_with = "lenient::text")]
    pub time: String,
    #[serde(deserialize_with = "lenient::text")]
    pub serving: String,
    #[serde(deserialize_with = "lenient::int")]
    pub calories: i64,
    #[serde(deserialize_with = "lenient::int")]
    pub hunger_before: i32,
    #[serde(deserialize_with = "lenient::int")]
    pub hunger_after: i32,
}

impl PendingIntake {
    pub fn into_entry(self, id: String, fallback_time: impl FnOnce() -> String) -> IntakeEntry {
        let time = if self.time.trim().is_empty() {
            fallback_time()
        } else {
            self.time
        };
        IntakeEntry {
            id,
            source: self.source,
            time,
            serving: self.serving,
            calories: self.calories,
            hunger_before: self.hunger_before,
            hunger_after: self.hunger_after,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PendingActivity {
    #[serde(rename = "type", deserialize_with = "lenient::text")]
    pub kind: String,
    #[serde(deserialize_with = "lenient::text")]
    pub duration: String,
}

/// Everything journaled for one calendar date. The JSON field names are the
/// storage contract and show up verbatim in the recovery panel.
///
/// Reading is forgiving: apart from `date`, a field holding the wrong JSON type
/// reads as its default and a malformed list element is skipped, so one bad
/// value never costs the whole record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct DailyRecord {
    #[serde(rename = "date")]
    pub date_key: String,
    #[serde(deserialize_with = "lenient::text")]
    pub protein_goal: String,
    #[serde(deserialize_with = "lenient::text")]
    pub total_protein_calories: String,
    #[serde(deserialize_with = "lenient::flag")]
    pub ketosis: bool,
    #[serde(deserialize_with = "lenient::flag")]
    pub followed_plan: bool,
    #[serde(deserialize_with = "lenient::text")]
    pub notes: String,
    #[serde(deserialize_with = "lenient::water")]
    pub water_intake: u8,
    #[serde(rename = "foodEntries", deserialize_with = "lenient::list")]
    pub meal_entries: Vec<IntakeEntry>,
    #[serde(deserialize_with = "lenient::list")]
    pub misc_entries: Vec<IntakeEntry>,
    #[serde(deserialize_with = "lenient::list")]
    pub fat_entries: Vec<Value>,
    #[serde(deserialize_with = "lenient::list")]
    pub vegetable_entries: Vec<Value>,
    #[serde(rename = "activities", deserialize_with = "lenient::list")]
    pub activity_entries: Vec<ActivityEntry>,
    #[serde(deserialize_with = "lenient::list")]
    pub supplements: Vec<Value>,
}

impl DailyRecord {
    pub fn new(date_key: impl Into<String>) -> Self {
        Self {
            date_key: date_key.into(),
            ..Self::default()
        }
    }

    /// Shallow merge: every top-level key present in `overrides` replaces the
    /// fresh record's value for `date_key`, everything else keeps its default.
    pub fn merged(date_key: &str, overrides: Map<String, Value>) -> Result<Self, serde_json::Error> {
        let mut base = match serde_json::to_value(Self::new(date_key))? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for (key, value) in overrides {
            base.insert(key, value);
        }
        serde_json::from_value(Value::Object(base))
    }
}

mod lenient {
    use super::MAX_WATER;
    use serde::{Deserialize, Deserializer, de::DeserializeOwned};
    use serde_json::Value;
    use tracing::warn;

    fn as_i64(value: &Value) -> Option<i64> {
        match value {
            Value::Number(number) => number.as_i64(),
            Value::String(raw) => raw.trim().parse().ok(),
            _ => None,
        }
    }

    /// Integers, or strings holding one. Anything else, including `null` and
    /// fractional numbers, reads as the default.
    pub fn int<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: TryFrom<i64> + Default,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(as_i64(&value)
            .and_then(|number| T::try_from(number).ok())
            .unwrap_or_default())
    }

    pub fn water<'de, D>(deserializer: D) -> Result<u8, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(as_i64(&value)
            .map(|count| count.clamp(0, i64::from(MAX_WATER)) as u8)
            .unwrap_or_default())
    }

    pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(raw) => raw,
            Value::Number(number) => number.to_string(),
            Value::Bool(flag) => flag.to_string(),
            _ => String::new(),
        })
    }

    pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Bool(flag) => flag,
            Value::String(raw) => raw.trim() == "true",
            _ => false,
        })
    }

    pub fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let Value::Array(items) = Value::deserialize(deserializer)? else {
            return Ok(Vec::new());
        };
        Ok(items
            .into_iter()
            .filter_map(|item| match serde_json::from_value(item) {
                Ok(parsed) => Some(parsed),
                Err(err) => {
                    warn!("skipping unreadable list entry: {err}");
                    None
                }
            })
            .collect())
    }
}

pub fn generate_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_LEN)
        .map(char::from)
        .collect()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecordPatch {
    pub protein_goal: Option<String>,
    pub ketosis: Option<bool>,
    pub followed_plan: Option<bool>,
    pub notes: Option<String>,
    pub water_intake: Option<u8>,
}

impl RecordPatch {
    pub fn is_empty(&self) -> bool {
        self.protein_goal.is_none()
            && self.ketosis.is_none()
            && self.followed_plan.is_none()
            && self.notes.is_none()
            && self.water_intake.is_none()
    }
}

#[derive(Debug, Deserialize)]
pub struct SelectDateRequest {
    pub date: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingEntries {
    pub meal: PendingIntake,
    pub misc: PendingIntake,
    pub activity: PendingActivity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalView {
    pub today: String,
    pub selected_date: String,
    pub date_label: String,
    pub is_today: bool,
    pub record: DailyRecord,
    pub pending: PendingEntries,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySummary {
    pub date: String,
    pub date_label: String,
    pub meal_count: usize,
    pub meal_times: Vec<String>,
    pub misc_count: usize,
    pub activity_count: usize,
    pub total_calories: i64,
    pub water_intake: u8,
    pub ketosis: bool,
    pub followed_plan: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub records: Vec<DailyRecord>,
    pub summaries: Vec<DaySummary>,
}

/// Raw slot contents, exactly as stored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecoverySnapshot {
    pub log: Option<String>,
    pub history: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn factory_record_is_blank() {
        let record = DailyRecord::new("2026-01-05");
        assert_eq!(record.date_key, "2026-01-05");
        assert!(record.protein_goal.is_empty());
        assert!(!record.ketosis);
        assert!(!record.followed_plan);
        assert_eq!(record.water_intake, 0);
        assert!(record.meal_entries.is_empty());
        assert!(record.misc_entries.is_empty());
        assert!(record.activity_entries.is_empty());
        assert_eq!(record, DailyRecord::new("2026-01-05"));
    }

    #[test]
    fn record_uses_storage_field_names() {
        let mut record = DailyRecord::new("2026-01-05");
        record.activity_entries.push(ActivityEntry {
            id: "a1".into(),
            kind: "Walk".into(),
            duration: "30 min".into(),
        });
        let value = serde_json::to_value(&record).unwrap();
        for key in [
            "date",
            "proteinGoal",
            "totalProteinCalories",
            "ketosis",
            "followedPlan",
            "notes",
            "waterIntake",
            "foodEntries",
            "miscEntries",
            "fatEntries",
            "vegetableEntries",
            "activities",
            "supplements",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(value["activities"][0]["type"], "Walk");
    }

    #[test]
    fn record_missing_newer_fields_reads_as_empty() {
        let record: DailyRecord =
            serde_json::from_value(json!({ "date": "2024-01-01", "notes": "old" })).unwrap();
        assert_eq!(record.notes, "old");
        assert!(record.misc_entries.is_empty());
        assert!(record.activity_entries.is_empty());
    }

    #[test]
    fn merged_overrides_only_present_keys() {
        let overrides = json!({ "proteinGoal": "120g", "waterIntake": 4 });
        let Value::Object(map) = overrides else { unreachable!() };
        let record = DailyRecord::merged("2026-01-05", map).unwrap();
        assert_eq!(record.date_key, "2026-01-05");
        assert_eq!(record.protein_goal, "120g");
        assert_eq!(record.water_intake, 4);
        assert!(record.notes.is_empty());
    }

    #[test]
    fn wrong_typed_fields_read_as_defaults() {
        let record: DailyRecord = serde_json::from_value(json!({
            "date": "2024-01-01",
            "proteinGoal": 120,
            "notes": null,
            "ketosis": "true",
            "followedPlan": 1,
            "waterIntake": -3,
            "foodEntries": [
                { "id": "a", "source": "Eggs", "calories": " 140 ", "hungerAfter": 2.5 },
                "not an entry",
                { "id": "b", "source": "Soup", "calories": null }
            ],
            "miscEntries": { "id": "c" },
            "activities": [{ "id": "d", "type": "Walk", "duration": 30 }]
        }))
        .unwrap();
        assert_eq!(record.protein_goal, "120");
        assert_eq!(record.notes, "");
        assert!(record.ketosis);
        assert!(!record.followed_plan);
        assert_eq!(record.water_intake, 0);
        assert_eq!(record.meal_entries.len(), 2);
        assert_eq!(record.meal_entries[0].calories, 140);
        assert_eq!(record.meal_entries[0].hunger_after, 0);
        assert_eq!(record.meal_entries[1].calories, 0);
        assert!(record.misc_entries.is_empty());
        assert_eq!(record.activity_entries[0].duration, "30");
    }

    #[test]
    fn water_is_clamped_on_read() {
        let record: DailyRecord =
            serde_json::from_value(json!({ "date": "2024-01-01", "waterIntake": "300" })).unwrap();
        assert_eq!(record.water_intake, MAX_WATER);
    }

    #[test]
    fn date_is_still_required_to_be_text() {
        assert!(serde_json::from_value::<DailyRecord>(json!({ "date": null })).is_err());
    }

    #[test]
    fn pending_intake_keeps_explicit_time() {
        let pending = PendingIntake {
            source: "Eggs".into(),
            time: "08:15".into(),
            ..PendingIntake::default()
        };
        let entry = pending.into_entry("x".into(), || "99:99".into());
        assert_eq!(entry.time, "08:15");
    }

    #[test]
    fn ids_are_distinct() {
        assert_ne!(generate_id(), generate_id());
        assert_eq!(generate_id().len(), ID_LEN);
    }
}
