// File: ./src/model/item.rs
use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{Display, EnumString};

pub type BoardId = i64;
pub type ListId = i64;
pub type CardId = i64;
pub type UserId = i64;

fn default_board_color() -> String {
    "#ffffff".to_string()
}

/// Accepts `null` where the backend declares a blank-able field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Teacher,
}

impl Role {
    /// Token endpoint used to log in with this role.
    pub fn token_path(&self) -> &'static str {
        match self {
            Role::Student => "/token/student/",
            Role::Teacher => "/token/teacher/",
        }
    }
}

/// A course. Lists hang off it, members can see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub id: BoardId,
    pub name: String,
    #[serde(default = "default_board_color")]
    pub color: String,
    #[serde(default)]
    pub owner: Option<User>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub members: Vec<User>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A column of a board. `position` orders the columns left to right.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardList {
    pub id: ListId,
    pub board: BoardId,
    pub title: String,
    #[serde(default)]
    pub position: i64,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Priority {
    #[default]
    Low,
    Med,
    High,
}

impl Priority {
    pub fn label(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Med => "Medium",
            Priority::High => "High",
        }
    }
}

// --- DUE DATES ---

/// Due timestamp as sent by the backend.
///
/// Values carrying an offset are absolute instants. Values without one are
/// wall-clock times that belong to whatever zone the reader is in, so they
/// always land on their own calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueDate {
    Zoned(DateTime<FixedOffset>),
    Floating(NaiveDateTime),
}

const FLOATING_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

impl DueDate {
    /// Parses the wire representation. Empty strings mean "no due date".
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(DueDate::Zoned(dt));
        }
        for fmt in FLOATING_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
                return Some(DueDate::Floating(naive));
            }
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .map(|d| DueDate::Floating(d.and_time(NaiveTime::MIN)))
    }

    /// Calendar date of the deadline as seen from `tz`.
    pub fn date_in<Tz: TimeZone>(&self, tz: &Tz) -> NaiveDate {
        match self {
            DueDate::Zoned(dt) => dt.with_timezone(tz).date_naive(),
            DueDate::Floating(naive) => naive.date(),
        }
    }

    pub fn local_date(&self) -> NaiveDate {
        self.date_in(&Local)
    }

    /// "HH:MM" in the given zone, used next to a card in day listings.
    pub fn time_label_in<Tz: TimeZone>(&self, tz: &Tz) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        match self {
            DueDate::Zoned(dt) => dt.with_timezone(tz).format("%H:%M").to_string(),
            DueDate::Floating(naive) => naive.format("%H:%M").to_string(),
        }
    }

    pub fn to_wire_string(&self) -> String {
        match self {
            DueDate::Zoned(dt) => dt.to_rfc3339(),
            DueDate::Floating(naive) => naive.format("%Y-%m-%dT%H:%M:%S").to_string(),
        }
    }
}

impl Serialize for DueDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_wire_string())
    }
}

impl<'de> Deserialize<'de> for DueDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DueDate::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid due date '{}'", raw)))
    }
}

fn optional_due_date<'de, D>(deserializer: D) -> Result<Option<DueDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => DueDate::parse(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid due date '{}'", s))),
    }
}

// --- CARDS ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub list: ListId,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default)]
    pub position: i64,
    #[serde(default, deserialize_with = "optional_due_date")]
    pub due_date: Option<DueDate>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub priority: Priority,
    #[serde(default, deserialize_with = "null_as_default")]
    pub assignees: Vec<UserId>,
    #[serde(default)]
    pub created_by: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board: Option<BoardId>,
}

impl Card {
    pub fn is_assigned_to(&self, user: UserId) -> bool {
        self.assignees.contains(&user)
    }
}

/// Payload for `POST /cards/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewCard {
    pub list: ListId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DueDate>,
    pub priority: Priority,
}

/// Entry of the teacher course catalogue (`GET /default-courses/`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseTemplate {
    #[serde(default)]
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub code: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub room: String,
}

/// Payload for `POST /boards/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewBoard {
    pub name: String,
    pub color: String,
}

impl NewBoard {
    pub const DEFAULT_COLOR: &'static str = "#0d6efd";

    /// Color given to courses created from a catalogue entry.
    pub const TEMPLATE_COLOR: &'static str = "#1976d2";

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: Self::DEFAULT_COLOR.to_string(),
        }
    }

    pub fn from_template(template: &CourseTemplate) -> Self {
        Self {
            name: template.name.clone(),
            color: Self::TEMPLATE_COLOR.to_string(),
        }
    }
}
