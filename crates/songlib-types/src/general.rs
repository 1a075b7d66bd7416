use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::{macros::format_description, Date};

use crate::error::Error;

/// Calendar date as it travels over the wire: `dd.mm.yyyy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DayMonthYear(Date);

impl DayMonthYear {
    pub fn date(&self) -> Date {
        self.0
    }
}

impl From<Date> for DayMonthYear {
    fn from(value: Date) -> Self {
        DayMonthYear(value)
    }
}

impl From<DayMonthYear> for Date {
    fn from(value: DayMonthYear) -> Self {
        value.0
    }
}

impl FromStr for DayMonthYear {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let date = Date::parse(s.trim(), format_description!("[day].[month].[year]"))
            .map_err(|e| Error::InvalidDate(s.to_string(), e))?;
        Ok(DayMonthYear(date))
    }
}

impl Display for DayMonthYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:02}.{:02}.{:04}",
            self.0.day(),
            u8::from(self.0.month()),
            self.0.year()
        )
    }
}

impl Serialize for DayMonthYear {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DayMonthYear {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Serde adapters for `time::Date` fields rendered as `dd.mm.yyyy`.
pub mod dmy {
    pub mod option {
        use serde::{Deserialize as _, Deserializer, Serializer};
        use time::Date;

        use crate::general::DayMonthYear;

        pub fn serialize<S>(date: &Option<Date>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match date {
                Some(date) => serializer.collect_str(&DayMonthYear(*date)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Date>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Option::<DayMonthYear>::deserialize(deserializer).map(|d| d.map(Date::from))
        }
    }
}

/// Value of a field in a partial update.
///
/// When deserialized with `#[serde(default)]` a missing field stays `Unchanged`,
/// an explicit `null` becomes `Clear` and anything else is `Set`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Patch<T> {
    #[default]
    Unchanged,
    Clear,
    Set(T),
}

impl<T> Patch<T> {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Patch::Unchanged)
    }

    pub fn as_ref(&self) -> Patch<&T> {
        match self {
            Patch::Unchanged => Patch::Unchanged,
            Patch::Clear => Patch::Clear,
            Patch::Set(v) => Patch::Set(v),
        }
    }

    pub fn map<U, F>(self, f: F) -> Patch<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Patch::Unchanged => Patch::Unchanged,
            Patch::Clear => Patch::Clear,
            Patch::Set(v) => Patch::Set(f(v)),
        }
    }

    /// `None` when unchanged, otherwise the new (possibly cleared) value.
    pub fn into_change(self) -> Option<Option<T>> {
        match self {
            Patch::Unchanged => None,
            Patch::Clear => Some(None),
            Patch::Set(v) => Some(Some(v)),
        }
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Patch::Set(v),
            None => Patch::Clear,
        }
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Patch::from)
    }
}

impl<T> Serialize for Patch<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Patch::Set(v) => v.serialize(serializer),
            Patch::Clear | Patch::Unchanged => serializer.serialize_none(),
        }
    }
}
