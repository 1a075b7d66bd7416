use garde::Validate;
use serde::{Deserialize, Serialize};
use songlib_types::{DayMonthYear, Patch, general::dmy};
use sqlx::{Acquire, Executor, QueryBuilder, Row};
use time::{Date, PrimitiveDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::{
    Batch, ChosenDB, ChosenRow, Error, Pagination, PagingDefaults, SongFilter,
    error::Result,
    filter::{fold, push_filters},
};

/// Metadata attached to every song, filled from music info service on creation
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SongDetail {
    #[serde(with = "dmy::option", default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, example = "16.07.2006"))]
    pub release_date: Option<Date>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Song {
    pub id: Uuid,
    #[serde(rename = "groupName")]
    pub group_name: String,
    #[serde(rename = "name")]
    pub title: String,
    #[serde(rename = "songDetail")]
    pub detail: SongDetail,
    #[serde(rename = "created_at")]
    pub created: PrimitiveDateTime,
    #[serde(rename = "updated_at")]
    pub modified: PrimitiveDateTime,
}

impl sqlx::FromRow<'_, ChosenRow> for Song {
    fn from_row(row: &ChosenRow) -> Result<Self, sqlx::Error> {
        Ok(Song {
            id: row.try_get("id")?,
            group_name: row.try_get("group_name")?,
            title: row.try_get("title")?,
            detail: SongDetail {
                release_date: row.try_get("release_date")?,
                text: row.try_get("text")?,
                link: row.try_get("link")?,
            },
            created: row.try_get("created_at")?,
            modified: row.try_get("updated_at")?,
        })
    }
}

fn not_blank(value: &str, _ctx: &()) -> garde::Result {
    if value.trim().is_empty() {
        Err(garde::Error::new("must not be blank"))
    } else {
        Ok(())
    }
}

/// Payload of song creation, as sent by clients
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateSong {
    #[serde(rename = "group")]
    #[garde(length(min = 1, max = 255), custom(not_blank))]
    pub group_name: String,
    #[serde(rename = "song")]
    #[garde(length(min = 1, max = 255), custom(not_blank))]
    pub title: String,
}

impl CreateSong {
    pub fn new(group_name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            group_name: group_name.into(),
            title: title.into(),
        }
    }

    pub fn with_detail(self, detail: SongDetail) -> NewSong {
        NewSong {
            group_name: self.group_name,
            title: self.title,
            detail,
        }
    }
}

/// Song ready to be stored, already enriched with its detail
#[derive(Debug, Clone)]
pub struct NewSong {
    pub group_name: String,
    pub title: String,
    pub detail: SongDetail,
}

fn valid_link(value: &Patch<String>, _ctx: &()) -> garde::Result {
    match value {
        Patch::Set(link) if !link.is_empty() => url::Url::parse(link)
            .map(|_| ())
            .map_err(|e| garde::Error::new(format!("invalid link: {e}"))),
        _ => Ok(()),
    }
}

const MAX_TEXT_SIZE: usize = 100_000;

fn text_size(value: &Patch<String>, _ctx: &()) -> garde::Result {
    match value {
        Patch::Set(text) if text.len() > MAX_TEXT_SIZE => Err(garde::Error::new(format!(
            "text longer than {MAX_TEXT_SIZE} bytes"
        ))),
        _ => Ok(()),
    }
}

/// Partial update of song detail.
///
/// Group name and title cannot be changed after creation.
/// Missing field is left as is, `null` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateSong {
    #[garde(skip)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, example = "16.07.2006"))]
    pub release_date: Patch<DayMonthYear>,
    #[garde(custom(text_size))]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub text: Patch<String>,
    #[garde(custom(valid_link))]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub link: Patch<String>,
}

impl UpdateSong {
    pub fn is_empty(&self) -> bool {
        self.release_date.is_unchanged() && self.text.is_unchanged() && self.link.is_unchanged()
    }
}

/// Song with its lyrics split into verses, only a page of verses is present
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SongWithVerses {
    pub id: Uuid,
    #[serde(rename = "groupName")]
    pub group_name: String,
    #[serde(rename = "name")]
    pub title: String,
    pub verses: Vec<String>,
    #[serde(rename = "created_at")]
    pub created: PrimitiveDateTime,
    #[serde(rename = "updated_at")]
    pub modified: PrimitiveDateTime,
}

impl SongWithVerses {
    pub fn new(song: Song, verses: Vec<String>) -> Self {
        Self {
            id: song.id,
            group_name: song.group_name,
            title: song.title,
            verses,
            created: song.created,
            modified: song.modified,
        }
    }
}

pub type SongRepository = SongRepositoryImpl<crate::Pool>;

pub struct SongRepositoryImpl<E> {
    executor: E,
    paging: PagingDefaults,
}

impl<'c, E> SongRepositoryImpl<E>
where
    for<'a> &'a E: Executor<'c, Database = ChosenDB> + Acquire<'c, Database = ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            paging: PagingDefaults::default(),
        }
    }

    pub fn with_paging_defaults(mut self, paging: PagingDefaults) -> Self {
        self.paging = paging;
        self
    }

    pub async fn save(&self, song: NewSong) -> Result<Song> {
        if song.group_name.trim().is_empty() {
            return Err(Error::MissingField("group_name"));
        }
        if song.title.trim().is_empty() {
            return Err(Error::MissingField("title"));
        }
        let now = crate::now();
        let group_name_fold = fold(&song.group_name);
        let title_fold = fold(&song.title);
        let text_fold = song.detail.text.as_deref().map(fold);
        let record = sqlx::query_as::<_, Song>(
            "INSERT INTO songs (id, group_name, title, release_date, text, link, \
             created_at, updated_at, group_name_fold, title_fold, text_fold) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(song.group_name)
        .bind(song.title)
        .bind(song.detail.release_date)
        .bind(song.detail.text)
        .bind(song.detail.link)
        .bind(now)
        .bind(now)
        .bind(group_name_fold)
        .bind(title_fold)
        .bind(text_fold)
        .fetch_one(&self.executor)
        .await?;
        debug!("Saved song {}", record.id);
        Ok(record)
    }

    /// Page of songs matching all filters, `total` counts every match.
    pub async fn list_matching(
        &self,
        pagination: Pagination,
        filters: &[SongFilter],
    ) -> Result<Batch<Song>> {
        let pagination = self.paging.resolve(pagination);
        let (offset, limit) = pagination.sql_bounds();

        let mut tx = self.executor.begin().await?;

        let mut count_query = QueryBuilder::<ChosenDB>::new("SELECT COUNT(*) FROM songs");
        push_filters(&mut count_query, filters);
        let total = count_query
            .build_query_scalar::<i64>()
            .fetch_one(&mut *tx)
            .await?;

        let mut page_query = QueryBuilder::<ChosenDB>::new("SELECT * FROM songs");
        push_filters(&mut page_query, filters);
        page_query.push(" ORDER BY created_at, id LIMIT ");
        page_query.push_bind(limit);
        page_query.push(" OFFSET ");
        page_query.push_bind(offset);
        let rows = page_query
            .build_query_as::<Song>()
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        let pagination = pagination.completed(rows.len() as u64, total.max(0) as u64);
        Ok(Batch { rows, pagination })
    }

    pub async fn get(&self, id: Uuid) -> Result<Song> {
        sqlx::query_as::<_, Song>("SELECT * FROM songs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.executor)
            .await?
            .ok_or_else(|| Error::RecordNotFound(format!("Song {id}")))
    }

    /// Writes only fields that are not [`Patch::Unchanged`] and refreshes `updated_at`.
    pub async fn update_fields(&self, id: Uuid, update: &UpdateSong) -> Result<Song> {
        if update.is_empty() {
            return Err(Error::EmptyUpdate);
        }

        let mut query = QueryBuilder::<ChosenDB>::new("UPDATE songs SET updated_at = ");
        query.push_bind(crate::now());
        if let Some(release_date) = update.release_date.as_ref().into_change() {
            query.push(", release_date = ");
            query.push_bind(release_date.map(DayMonthYear::date));
        }
        if let Some(text) = update.text.as_ref().into_change() {
            query.push(", text = ");
            query.push_bind(text.cloned());
            query.push(", text_fold = ");
            query.push_bind(text.map(|t| fold(t)));
        }
        if let Some(link) = update.link.as_ref().into_change() {
            query.push(", link = ");
            query.push_bind(link.cloned());
        }
        query.push(" WHERE id = ");
        query.push_bind(id);
        query.push(" RETURNING *");

        query
            .build_query_as::<Song>()
            .fetch_optional(&self.executor)
            .await?
            .ok_or_else(|| Error::RecordNotFound(format!("Song {id}")))
    }

    /// Number of deleted rows
    pub async fn delete(&self, id: Uuid) -> Result<u64> {
        let res = sqlx::query("DELETE FROM songs WHERE id = ?")
            .bind(id)
            .execute(&self.executor)
            .await?;
        Ok(res.rows_affected())
    }
}
