// Filter stage: conjunctive equality predicates over count tables
use super::violation::{CountRecord, CountTable, Dimension, UnknownWeekday, Weekday};
use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

pub const ALL: &str = "All";

/// A picker value: either no constraint or one concrete value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Choice<T> {
    #[default]
    All,
    Only(T),
}

impl<T> Choice<T> {
    pub fn is_all(&self) -> bool {
        matches!(self, Choice::All)
    }
}

impl Choice<String> {
    /// Absent, blank and "All" all mean no constraint.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => Choice::All,
            Some(value) if value == ALL => Choice::All,
            Some(value) => Choice::Only(value.to_string()),
        }
    }
}

impl Choice<Weekday> {
    pub fn parse(raw: Option<&str>) -> Result<Self, UnknownWeekday> {
        match Choice::<String>::parse(raw) {
            Choice::All => Ok(Choice::All),
            Choice::Only(value) => value.parse().map(Choice::Only),
        }
    }
}

impl<T: fmt::Display> fmt::Display for Choice<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::All => f.write_str(ALL),
            Choice::Only(value) => value.fmt(f),
        }
    }
}

impl<T: fmt::Display> Serialize for Choice<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The filters currently chosen on the overview page.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FilterSelection {
    pub month: Choice<String>,
    pub weekday: Choice<Weekday>,
    pub route: Choice<String>,
    pub violation_type: Choice<String>,
}

#[cfg(test)]
impl FilterSelection {
    pub fn with_month(mut self, month: &str) -> Self {
        self.month = Choice::Only(month.to_string());
        self
    }

    pub fn with_weekday(mut self, weekday: Weekday) -> Self {
        self.weekday = Choice::Only(weekday);
        self
    }

    pub fn with_route(mut self, route: &str) -> Self {
        self.route = Choice::Only(route.to_string());
        self
    }

    pub fn with_violation_type(mut self, violation_type: &str) -> Self {
        self.violation_type = Choice::Only(violation_type.to_string());
        self
    }
}

impl FilterSelection {
    /// Whether `row` satisfies every active predicate on a dimension the
    /// table carries. Dimensions missing from the table do not constrain it.
    pub fn matches(&self, table: &CountTable, row: &CountRecord) -> bool {
        let active = |dimension| table.has_dimension(dimension);

        if let Choice::Only(month) = &self.month {
            if active(Dimension::Month) && &row.month != month {
                return false;
            }
        }
        if let Choice::Only(weekday) = &self.weekday {
            if active(Dimension::Weekday) && row.weekday != Some(*weekday) {
                return false;
            }
        }
        if let Choice::Only(route) = &self.route {
            if active(Dimension::Route) && &row.bus_route_id != route {
                return false;
            }
        }
        if let Choice::Only(violation_type) = &self.violation_type {
            if active(Dimension::ViolationType) && &row.violation_type != violation_type {
                return false;
            }
        }
        true
    }

    pub fn apply<'a>(&self, table: &'a CountTable) -> Vec<&'a CountRecord> {
        table
            .rows()
            .iter()
            .filter(|row| self.matches(table, row))
            .collect()
    }
}

/// Values offered by each picker, "All" first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub months: Vec<String>,
    pub weekdays: Vec<String>,
    pub routes: Vec<String>,
    pub violation_types: Vec<String>,
}

impl FilterOptions {
    pub fn from_table(table: &CountTable) -> Self {
        let mut months: Vec<String> = distinct(table.rows().iter().map(|r| r.month.as_str()));
        // Newest first; values that are not YYYY-MM go last.
        months.sort_by(|a, b| parse_month(b).cmp(&parse_month(a)));

        let routes = distinct(table.rows().iter().map(|r| r.bus_route_id.as_str()));
        let violation_types = distinct(table.rows().iter().map(|r| r.violation_type.as_str()));

        Self {
            months: with_all(months),
            weekdays: with_all(Weekday::ALL.iter().map(|d| d.to_string()).collect()),
            routes: with_all(routes),
            violation_types: with_all(violation_types),
        }
    }

    /// Pickers with only "All", used when the weekday table is unavailable.
    pub fn empty() -> Self {
        Self {
            months: with_all(Vec::new()),
            weekdays: with_all(Weekday::ALL.iter().map(|d| d.to_string()).collect()),
            routes: with_all(Vec::new()),
            violation_types: with_all(Vec::new()),
        }
    }
}

pub fn parse_month(month: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", month.trim()), "%Y-%m-%d").ok()
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .filter(|v| !v.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn with_all(values: Vec<String>) -> Vec<String> {
    std::iter::once(ALL.to_string()).chain(values).collect()
}
