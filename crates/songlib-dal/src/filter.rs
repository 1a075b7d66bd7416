use sqlx::QueryBuilder;
use time::Date;
use tracing::debug;

use crate::ChosenDB;

/// Song attributes that can be used in listing filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterField {
    GroupName,
    Title,
    ReleaseYear,
    ReleaseDate,
    ReleasedAfter,
    ReleasedBefore,
    Text,
}

impl FilterField {
    pub const ALL: [FilterField; 7] = [
        FilterField::GroupName,
        FilterField::Title,
        FilterField::ReleaseYear,
        FilterField::ReleaseDate,
        FilterField::ReleasedAfter,
        FilterField::ReleasedBefore,
        FilterField::Text,
    ];

    /// Name of the query parameter carrying this filter
    pub fn param_name(&self) -> &'static str {
        match self {
            FilterField::GroupName => "groupName",
            FilterField::Title => "name",
            FilterField::ReleaseYear => "releaseYear",
            FilterField::ReleaseDate => "releaseDate",
            FilterField::ReleasedAfter => "releaseDateAfter",
            FilterField::ReleasedBefore => "releaseDateBefore",
            FilterField::Text => "text",
        }
    }
}

/// Untyped filter value, as decoded from the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Text(String),
    Integer(i64),
    Date(Date),
}

/// Typed predicate over songs. All filters in a listing are combined with AND.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SongFilter {
    GroupName(String),
    Title(String),
    ReleaseYear(i32),
    ReleaseDate(Date),
    ReleasedAfter(Date),
    ReleasedBefore(Date),
    Text(String),
}

impl SongFilter {
    pub fn field(&self) -> FilterField {
        match self {
            SongFilter::GroupName(_) => FilterField::GroupName,
            SongFilter::Title(_) => FilterField::Title,
            SongFilter::ReleaseYear(_) => FilterField::ReleaseYear,
            SongFilter::ReleaseDate(_) => FilterField::ReleaseDate,
            SongFilter::ReleasedAfter(_) => FilterField::ReleasedAfter,
            SongFilter::ReleasedBefore(_) => FilterField::ReleasedBefore,
            SongFilter::Text(_) => FilterField::Text,
        }
    }

    /// Builds typed filter from untyped input.
    ///
    /// Value of a wrong type for the field yields `None`, so a malformed
    /// parameter means "no filter" rather than a failed request.
    pub fn from_field_value(field: FilterField, value: FilterValue) -> Option<Self> {
        let filter = match (field, value) {
            (FilterField::GroupName, FilterValue::Text(s)) => SongFilter::GroupName(s),
            (FilterField::Title, FilterValue::Text(s)) => SongFilter::Title(s),
            (FilterField::Text, FilterValue::Text(s)) => SongFilter::Text(s),
            (FilterField::ReleaseYear, FilterValue::Integer(year)) => {
                SongFilter::ReleaseYear(i32::try_from(year).ok()?)
            }
            (FilterField::ReleaseDate, FilterValue::Date(d)) => SongFilter::ReleaseDate(d),
            (FilterField::ReleasedAfter, FilterValue::Date(d)) => SongFilter::ReleasedAfter(d),
            (FilterField::ReleasedBefore, FilterValue::Date(d)) => SongFilter::ReleasedBefore(d),
            (field, value) => {
                debug!("Ignoring filter {field:?} with mismatched value {value:?}");
                return None;
            }
        };
        Some(filter)
    }

    fn push_condition(&self, qb: &mut QueryBuilder<'_, ChosenDB>) {
        match self {
            SongFilter::GroupName(s) => push_contains(qb, "group_name_fold", s),
            SongFilter::Title(s) => push_contains(qb, "title_fold", s),
            SongFilter::Text(s) => push_contains(qb, "text_fold", s),
            SongFilter::ReleaseYear(year) => {
                qb.push("CAST(strftime('%Y', release_date) AS INTEGER) = ");
                qb.push_bind(*year);
            }
            SongFilter::ReleaseDate(d) => {
                qb.push("release_date = ");
                qb.push_bind(*d);
            }
            SongFilter::ReleasedAfter(d) => {
                qb.push("release_date > ");
                qb.push_bind(*d);
            }
            SongFilter::ReleasedBefore(d) => {
                qb.push("release_date < ");
                qb.push_bind(*d);
            }
        }
    }
}

const LIKE_ESCAPE: char = '\\';

fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Case folding used for searchable columns.
///
/// SQLite folds case for ASCII only, so text is folded here, both when
/// stored and when searched.
pub(crate) fn fold(text: &str) -> String {
    text.to_lowercase()
}

// column must be one of `*_fold` columns
fn push_contains(qb: &mut QueryBuilder<'_, ChosenDB>, column: &str, needle: &str) {
    qb.push(column);
    qb.push(" LIKE ");
    qb.push_bind(like_pattern(&fold(needle)));
    qb.push(" ESCAPE '\\'");
}

/// Appends WHERE clause for given filters.
///
/// Filters are applied in their natural order, independent of input order,
/// so the same set of filters always produces the same SQL.
pub(crate) fn push_filters(qb: &mut QueryBuilder<'_, ChosenDB>, filters: &[SongFilter]) {
    let mut sorted: Vec<&SongFilter> = filters.iter().collect();
    sorted.sort();
    sorted.dedup();

    for (idx, filter) in sorted.into_iter().enumerate() {
        qb.push(if idx == 0 { " WHERE " } else { " AND " });
        filter.push_condition(qb);
    }
}
