//! Course schedule domain models.

use chrono::{DateTime, Datelike, NaiveTime, TimeZone, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::error::DomainError;

/// Color given to a course when the client does not pick one.
pub const DEFAULT_COURSE_COLOR: &str = "#4CAF50";

/// Monday-first weekday (Monday = 1 ... Sunday = 7).
///
/// Serialized as its number so the wire format matches the stored column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum DayOfWeek {
    Monday = 1,
    Tuesday = 2,
    Wednesday = 3,
    Thursday = 4,
    Friday = 5,
    Saturday = 6,
    Sunday = 7,
}

impl DayOfWeek {
    /// All days in display order.
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    pub fn number(&self) -> i16 {
        *self as i16
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DayOfWeek::Monday => "monday",
            DayOfWeek::Tuesday => "tuesday",
            DayOfWeek::Wednesday => "wednesday",
            DayOfWeek::Thursday => "thursday",
            DayOfWeek::Friday => "friday",
            DayOfWeek::Saturday => "saturday",
            DayOfWeek::Sunday => "sunday",
        }
    }

    /// Weekday of an instant, in the instant's own time zone.
    pub fn of<Tz: TimeZone>(at: &DateTime<Tz>) -> Self {
        at.weekday().into()
    }

    /// The following day, wrapping Sunday back to Monday.
    pub fn succ(&self) -> Self {
        match self {
            DayOfWeek::Sunday => DayOfWeek::Monday,
            other => DayOfWeek::ALL[other.number() as usize],
        }
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(weekday: Weekday) -> Self {
        // chrono numbers from Monday = 1, which is the convention used here;
        // other libraries count from Sunday and need remapping.
        match weekday.number_from_monday() {
            1 => DayOfWeek::Monday,
            2 => DayOfWeek::Tuesday,
            3 => DayOfWeek::Wednesday,
            4 => DayOfWeek::Thursday,
            5 => DayOfWeek::Friday,
            6 => DayOfWeek::Saturday,
            _ => DayOfWeek::Sunday,
        }
    }
}

impl TryFrom<i16> for DayOfWeek {
    type Error = String;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            1..=7 => Ok(DayOfWeek::ALL[(value - 1) as usize]),
            _ => Err(format!(
                "Invalid day of week: {} (expected 1 = Monday .. 7 = Sunday)",
                value
            )),
        }
    }
}

impl From<DayOfWeek> for i16 {
    fn from(day: DayOfWeek) -> Self {
        day.number()
    }
}

impl FromStr for DayOfWeek {
    type Err = String;

    /// Accepts either the number (`"3"`) or the English name (`"wednesday"`, `"wed"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(number) = trimmed.parse::<i16>() {
            return DayOfWeek::try_from(number);
        }
        let lower = trimmed.to_lowercase();
        DayOfWeek::ALL
            .into_iter()
            .find(|day| {
                day.as_str() == lower || (lower.len() == 3 && day.as_str().starts_with(lower.as_str()))
            })
            .ok_or_else(|| format!("Invalid day of week: {}", s))
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Serde for time-of-day as `HH:MM`, also accepting `HH:MM:SS` on input.
pub mod time_of_day {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    pub fn parse(raw: &str) -> Result<NaiveTime, String> {
        NaiveTime::parse_from_str(raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
            .map_err(|_| format!("Invalid time of day: {} (expected HH:MM)", raw))
    }

    pub mod option {
        use chrono::NaiveTime;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            time: &Option<NaiveTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match time {
                Some(time) => super::serialize(time, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveTime>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|raw| super::parse(&raw).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}

/// A weekly recurring course slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Course {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub day_of_week: DayOfWeek,
    #[serde(with = "time_of_day")]
    pub start_time: NaiveTime,
    #[serde(with = "time_of_day")]
    pub end_time: NaiveTime,
    pub location: Option<String>,
    pub teacher: Option<String>,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    /// Builds a new course owned by `user_id` from a validated request.
    pub fn create(
        user_id: Uuid,
        request: CreateCourseRequest,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        request.validate()?;
        check_time_range(request.start_time, request.end_time)?;

        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            name: request.name.trim().to_string(),
            day_of_week: request.day_of_week,
            start_time: request.start_time,
            end_time: request.end_time,
            location: request.location,
            teacher: request.teacher,
            color: request
                .color
                .unwrap_or_else(|| DEFAULT_COURSE_COLOR.to_string()),
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies a partial update. Nothing changes if the result would be invalid.
    pub fn apply_update(
        &mut self,
        request: UpdateCourseRequest,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        request.validate()?;
        let start_time = request.start_time.unwrap_or(self.start_time);
        let end_time = request.end_time.unwrap_or(self.end_time);
        check_time_range(start_time, end_time)?;

        if let Some(name) = request.name {
            self.name = name.trim().to_string();
        }
        if let Some(day) = request.day_of_week {
            self.day_of_week = day;
        }
        self.start_time = start_time;
        self.end_time = end_time;
        if let Some(location) = request.location {
            self.location = Some(location);
        }
        if let Some(teacher) = request.teacher {
            self.teacher = Some(teacher);
        }
        if let Some(color) = request.color {
            self.color = color;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Returns true if `time` falls inside `[start_time, end_time)`.
    pub fn is_in_session(&self, time: NaiveTime) -> bool {
        self.start_time <= time && time < self.end_time
    }
}

/// Rejects a slot that does not start strictly before it ends.
pub fn check_time_range(start: NaiveTime, end: NaiveTime) -> Result<(), DomainError> {
    if start < end {
        Ok(())
    } else {
        Err(DomainError::InvalidTimeRange { start, end })
    }
}

/// Request payload for creating a course.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCourseRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub name: String,

    pub day_of_week: DayOfWeek,

    #[serde(with = "time_of_day")]
    pub start_time: NaiveTime,

    #[serde(with = "time_of_day")]
    pub end_time: NaiveTime,

    #[validate(length(max = 100, message = "Location must be at most 100 characters"))]
    pub location: Option<String>,

    #[validate(length(max = 100, message = "Teacher must be at most 100 characters"))]
    pub teacher: Option<String>,

    #[validate(custom(function = "shared::validation::validate_hex_color"))]
    pub color: Option<String>,
}

/// Request payload for updating a course. Absent fields keep their value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateCourseRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub name: Option<String>,

    pub day_of_week: Option<DayOfWeek>,

    #[serde(default, with = "time_of_day::option", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveTime>,

    #[serde(default, with = "time_of_day::option", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveTime>,

    #[validate(length(max = 100, message = "Location must be at most 100 characters"))]
    pub location: Option<String>,

    #[validate(length(max = 100, message = "Teacher must be at most 100 characters"))]
    pub teacher: Option<String>,

    #[validate(custom(function = "shared::validation::validate_hex_color"))]
    pub color: Option<String>,
}
