// Group-and-sum stage plus the summaries derived from it
use super::violation::{CountRecord, Dimension, Weekday};
use serde::Serialize;
use std::collections::HashMap;

/// One component of a group key. Variant order only matters between keys of
/// the same dimension, where it yields calendar, numeric or lexical order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum KeyPart {
    Weekday(Weekday),
    Hour(u8),
    Text(String),
    Missing,
}

impl KeyPart {
    fn of(record: &CountRecord, dimension: Dimension) -> Self {
        match dimension {
            Dimension::Month => KeyPart::Text(record.month.clone()),
            Dimension::Route => KeyPart::Text(record.bus_route_id.clone()),
            Dimension::ViolationType => KeyPart::Text(record.violation_type.clone()),
            Dimension::Stop => record
                .stop_name
                .clone()
                .map_or(KeyPart::Missing, KeyPart::Text),
            Dimension::Weekday => record.weekday.map_or(KeyPart::Missing, KeyPart::Weekday),
            Dimension::Hour => record.hour.map_or(KeyPart::Missing, KeyPart::Hour),
        }
    }

    pub fn label(&self) -> String {
        match self {
            KeyPart::Weekday(day) => day.to_string(),
            KeyPart::Hour(hour) => hour.to_string(),
            KeyPart::Text(text) => text.clone(),
            KeyPart::Missing => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    pub key: Vec<KeyPart>,
    pub violations: u64,
}

/// Filtered rows grouped by one or more dimensions with summed violations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Aggregate {
    pub dimensions: Vec<Dimension>,
    pub groups: Vec<Group>,
}

/// Sums `violations` per distinct key combination, keeping groups in the
/// order their key was first seen. Absent combinations are not zero-filled.
pub fn group_sum<'a, I>(rows: I, dimensions: &[Dimension]) -> Aggregate
where
    I: IntoIterator<Item = &'a CountRecord>,
{
    let mut index: HashMap<Vec<KeyPart>, usize> = HashMap::new();
    let mut groups: Vec<Group> = Vec::new();

    for row in rows {
        let key: Vec<KeyPart> = dimensions.iter().map(|d| KeyPart::of(row, *d)).collect();
        match index.get(&key) {
            Some(&slot) => groups[slot].violations += row.violations,
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(Group {
                    key,
                    violations: row.violations,
                });
            }
        }
    }

    Aggregate {
        dimensions: dimensions.to_vec(),
        groups,
    }
}

impl Aggregate {
    pub fn total(&self) -> u64 {
        self.groups.iter().map(|g| g.violations).sum()
    }

    /// Calendar weekdays, numeric hours, lexical text (chronological for
    /// YYYY-MM months), compared dimension by dimension.
    pub fn in_display_order(mut self) -> Self {
        self.groups.sort_by(|a, b| a.key.cmp(&b.key));
        self
    }

    /// Descending by count; ties keep first-encountered order.
    pub fn ranked(mut self, limit: usize) -> Self {
        self.groups.sort_by(|a, b| b.violations.cmp(&a.violations));
        self.groups.truncate(limit);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Peak {
    pub hour: u8,
    pub count: u64,
}

/// KPI numbers for the overview. `peak` is `None` when no hour has data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeakSummary {
    pub total_violations: u64,
    pub peak: Option<Peak>,
}

impl PeakSummary {
    /// Expects an aggregate grouped by [`Dimension::Hour`] alone.
    pub fn from_hourly(hourly: &Aggregate) -> Self {
        let peak = hourly
            .groups
            .iter()
            .filter_map(|g| match g.key.first() {
                Some(KeyPart::Hour(hour)) => Some(Peak {
                    hour: *hour,
                    count: g.violations,
                }),
                _ => None,
            })
            // Lowest hour wins a tie.
            .fold(None, |best: Option<Peak>, candidate| match best {
                Some(b) if b.count > candidate.count => Some(b),
                Some(b) if b.count == candidate.count && b.hour < candidate.hour => Some(b),
                _ => Some(candidate),
            });

        Self {
            total_violations: hourly.total(),
            peak,
        }
    }

    pub fn peak_hour_label(&self) -> String {
        self.peak.map_or_else(|| "-".to_string(), |p| p.hour.to_string())
    }

    pub fn peak_count_label(&self) -> String {
        self.peak
            .map_or_else(|| "-".to_string(), |p| format_count(p.count))
    }
}

/// Stops with the most violations, at most `limit` of them.
pub fn top_stops<'a, I>(rows: I, limit: usize) -> Aggregate
where
    I: IntoIterator<Item = &'a CountRecord>,
{
    group_sum(rows, &[Dimension::Stop]).ranked(limit)
}

/// Thousands separators, e.g. `12,345`.
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
