use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single bodyweight reading. At most one per calendar day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeightEntry {
    pub date: NaiveDate,
    pub weight: f64,
    #[serde(default)]
    pub updated_at: i64,
}

/// Bodyweight history, kept sorted by date with unique dates.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Bodyweight {
    pub entries: Vec<WeightEntry>,
}

impl Bodyweight {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records a weight for `date`, overwriting any existing entry for that day.
    pub fn upsert(&mut self, date: NaiveDate, weight: f64, updated_at: i64) {
        match self.entries.binary_search_by_key(&date, |e| e.date) {
            Ok(idx) => {
                let entry = &mut self.entries[idx];
                entry.weight = weight;
                entry.updated_at = updated_at;
            }
            Err(idx) => self.entries.insert(
                idx,
                WeightEntry {
                    date,
                    weight,
                    updated_at,
                },
            ),
        }
    }

    pub fn latest(&self) -> Option<&WeightEntry> {
        self.entries.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_upsert_overwrites_same_day() {
        let mut bw = Bodyweight::default();
        bw.upsert(day(1), 80.0, 1);
        bw.upsert(day(1), 79.5, 2);

        assert_eq!(bw.entries.len(), 1);
        assert_eq!(bw.entries[0].weight, 79.5);
        assert_eq!(bw.entries[0].updated_at, 2);
    }

    #[test]
    fn test_upsert_keeps_dates_sorted() {
        let mut bw = Bodyweight::default();
        bw.upsert(day(3), 81.0, 1);
        bw.upsert(day(1), 80.0, 1);
        bw.upsert(day(2), 80.5, 1);

        let dates: Vec<_> = bw.entries.iter().map(|e| e.date).collect();
        assert_eq!(dates, vec![day(1), day(2), day(3)]);
        assert_eq!(bw.latest().unwrap().weight, 81.0);
    }

    #[test]
    fn test_entry_json_uses_iso_date() {
        let mut bw = Bodyweight::default();
        bw.upsert(day(1), 80.0, 100);
        let json = serde_json::to_value(&bw).unwrap();
        assert_eq!(json["entries"][0]["date"], "2024-01-01");
        assert_eq!(json["entries"][0]["updatedAt"], 100);
    }
}
