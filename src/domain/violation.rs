// Violation count domain models
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Day of the week; ordering follows the calendar (Monday first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown weekday '{0}'")]
pub struct UnknownWeekday(pub String);

impl FromStr for Weekday {
    type Err = UnknownWeekday;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Weekday::ALL
            .into_iter()
            .find(|day| day.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownWeekday(s.to_string()))
    }
}

/// A column a count table can be filtered or grouped on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Month,
    Weekday,
    Hour,
    Route,
    ViolationType,
    Stop,
}

impl Dimension {
    pub fn column(self) -> &'static str {
        match self {
            Dimension::Month => "month",
            Dimension::Weekday => "weekday",
            Dimension::Hour => "hour",
            Dimension::Route => "bus_route_id",
            Dimension::ViolationType => "violation_type",
            Dimension::Stop => "stop_name",
        }
    }
}

pub const VIOLATIONS_COLUMN: &str = "violations";

/// One row of a pre-aggregated violation count table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountRecord {
    pub month: String,
    pub weekday: Option<Weekday>,
    pub hour: Option<u8>,
    pub bus_route_id: String,
    pub violation_type: String,
    pub stop_name: Option<String>,
    pub violations: u64,
}

/// The four pre-aggregated views over the violation log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    Weekday,
    Hourly,
    Monthly,
    Stop,
}

impl TableKind {
    /// File stem of the CSV artifact backing this table.
    pub fn file_stem(self) -> &'static str {
        match self {
            TableKind::Weekday => "weekday_counts",
            TableKind::Hourly => "hourly_counts",
            TableKind::Monthly => "monthly_counts",
            TableKind::Stop => "stop_counts",
        }
    }

    /// Dimensions whose column must be present in the file.
    pub fn required_dimensions(self) -> &'static [Dimension] {
        match self {
            TableKind::Weekday => &[
                Dimension::Month,
                Dimension::Weekday,
                Dimension::Route,
                Dimension::ViolationType,
            ],
            TableKind::Hourly => &[
                Dimension::Month,
                Dimension::Weekday,
                Dimension::Hour,
                Dimension::Route,
                Dimension::ViolationType,
            ],
            TableKind::Monthly => &[Dimension::Month, Dimension::Route, Dimension::ViolationType],
            TableKind::Stop => &[
                Dimension::Month,
                Dimension::Weekday,
                Dimension::Route,
                Dimension::ViolationType,
                Dimension::Stop,
            ],
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_stem())
    }
}

/// Canonical rows of one count table, immutable after load.
#[derive(Debug, Clone)]
pub struct CountTable {
    kind: TableKind,
    dimensions: Vec<Dimension>,
    rows: Vec<CountRecord>,
}

impl CountTable {
    /// `dimensions` lists every dimension column the source file carried.
    pub fn new(kind: TableKind, dimensions: Vec<Dimension>, rows: Vec<CountRecord>) -> Self {
        Self {
            kind,
            dimensions,
            rows,
        }
    }

    pub fn kind(&self) -> TableKind {
        self.kind
    }

    pub fn rows(&self) -> &[CountRecord] {
        &self.rows
    }

    pub fn has_dimension(&self, dimension: Dimension) -> bool {
        self.dimensions.contains(&dimension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weekday_parse_is_lenient() {
        assert_eq!(" tuesday ".parse::<Weekday>(), Ok(Weekday::Tuesday));
        assert_eq!("SUNDAY".parse::<Weekday>(), Ok(Weekday::Sunday));
        assert!("Funday".parse::<Weekday>().is_err());
    }

    #[test]
    fn test_weekday_orders_by_calendar() {
        let mut days = vec![Weekday::Sunday, Weekday::Friday, Weekday::Monday];
        days.sort();
        assert_eq!(days, vec![Weekday::Monday, Weekday::Friday, Weekday::Sunday]);
    }

    #[test]
    fn test_monthly_table_does_not_require_weekday() {
        assert!(!TableKind::Monthly
            .required_dimensions()
            .contains(&Dimension::Weekday));
        assert!(TableKind::Stop.required_dimensions().contains(&Dimension::Stop));
    }
}
