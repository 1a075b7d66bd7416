//! Song catalog use case: enriches new songs with music info, lists and pages
//! songs and their verses, applies partial updates and removals.

use std::future::Future;

use songlib_dal::{
    song::{CreateSong, NewSong, Song, SongDetail, SongRepository, SongWithVerses, UpdateSong},
    Batch, Pagination, PagingDefaults, SongFilter,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::music_info::LookupError;

pub mod verses;

/// Source of song metadata
pub trait MetadataLookup: Send + Sync {
    fn lookup(
        &self,
        group: &str,
        title: &str,
    ) -> impl Future<Output = Result<SongDetail, LookupError>> + Send;
}

pub type StoreResult<T> = Result<T, songlib_dal::Error>;

/// Persistence of songs.
///
/// Missing records are reported as errors for which
/// [`songlib_dal::Error::is_not_found`] holds.
pub trait SongStore: Send + Sync {
    fn save(&self, song: NewSong) -> impl Future<Output = StoreResult<Song>> + Send;

    fn list_matching(
        &self,
        pagination: Pagination,
        filters: &[SongFilter],
    ) -> impl Future<Output = StoreResult<Batch<Song>>> + Send;

    fn get(&self, id: Uuid) -> impl Future<Output = StoreResult<Song>> + Send;

    fn update_fields(
        &self,
        id: Uuid,
        update: &UpdateSong,
    ) -> impl Future<Output = StoreResult<Song>> + Send;

    /// Returns number of removed records
    fn delete(&self, id: Uuid) -> impl Future<Output = StoreResult<u64>> + Send;
}

impl SongStore for SongRepository {
    async fn save(&self, song: NewSong) -> StoreResult<Song> {
        SongRepository::save(self, song).await
    }

    async fn list_matching(
        &self,
        pagination: Pagination,
        filters: &[SongFilter],
    ) -> StoreResult<Batch<Song>> {
        SongRepository::list_matching(self, pagination, filters).await
    }

    async fn get(&self, id: Uuid) -> StoreResult<Song> {
        SongRepository::get(self, id).await
    }

    async fn update_fields(&self, id: Uuid, update: &UpdateSong) -> StoreResult<Song> {
        SongRepository::update_fields(self, id, update).await
    }

    async fn delete(&self, id: Uuid) -> StoreResult<u64> {
        SongRepository::delete(self, id).await
    }
}

pub type Result<T, E = CatalogError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("{operation}: music info lookup failed for {group} - {title}")]
    UpstreamLookupFailed {
        operation: &'static str,
        group: String,
        title: String,
        #[source]
        source: LookupError,
    },
    #[error("{operation}: persistence failed")]
    PersistenceFailed {
        operation: &'static str,
        #[source]
        source: songlib_dal::Error,
    },
    #[error("{operation}: song {id} not found")]
    NotFound { operation: &'static str, id: Uuid },
    #[error("{operation}: no fields to update for song {id}")]
    NoFieldsToUpdate { operation: &'static str, id: Uuid },
}

impl CatalogError {
    fn persistence(operation: &'static str) -> impl FnOnce(songlib_dal::Error) -> Self {
        move |source| CatalogError::PersistenceFailed { operation, source }
    }

    fn from_store(operation: &'static str, id: Uuid) -> impl FnOnce(songlib_dal::Error) -> Self {
        move |source| {
            if source.is_not_found() {
                CatalogError::NotFound { operation, id }
            } else {
                CatalogError::PersistenceFailed { operation, source }
            }
        }
    }
}

pub struct SongCatalog<L, S> {
    lookup: L,
    store: S,
    paging: PagingDefaults,
}

impl<L, S> SongCatalog<L, S>
where
    L: MetadataLookup,
    S: SongStore,
{
    pub fn new(lookup: L, store: S, paging: PagingDefaults) -> Self {
        Self {
            lookup,
            store,
            paging,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Looks up song detail and stores the enriched song.
    ///
    /// Nothing is stored when lookup fails.
    pub async fn add_song(&self, song: CreateSong) -> Result<Song> {
        const OP: &str = "add_song";
        debug!("Adding song {} - {}", song.group_name, song.title);
        let detail = self
            .lookup
            .lookup(&song.group_name, &song.title)
            .await
            .map_err(|source| CatalogError::UpstreamLookupFailed {
                operation: OP,
                group: song.group_name.clone(),
                title: song.title.clone(),
                source,
            })?;
        self.store
            .save(song.with_detail(detail))
            .await
            .map_err(CatalogError::persistence(OP))
    }

    pub async fn fetch_songs(
        &self,
        pagination: Pagination,
        filters: &[SongFilter],
    ) -> Result<Batch<Song>> {
        let pagination = self.paging.resolve(pagination);
        debug!("Fetching songs {pagination:?} with filters {filters:?}");
        self.store
            .list_matching(pagination, filters)
            .await
            .map_err(CatalogError::persistence("fetch_songs"))
    }

    /// Song with a page of its verses
    pub async fn fetch_song_with_verses(
        &self,
        id: Uuid,
        pagination: Pagination,
    ) -> Result<(SongWithVerses, Pagination)> {
        const OP: &str = "fetch_song_with_verses";
        let mut song = self
            .store
            .get(id)
            .await
            .map_err(CatalogError::from_store(OP, id))?;
        let text = song.detail.text.take();
        let (verses, pagination) =
            verses::page_verses(text.as_deref(), self.paging.resolve(pagination));
        Ok((SongWithVerses::new(song, verses), pagination))
    }

    pub async fn modify_song(&self, id: Uuid, update: UpdateSong) -> Result<Song> {
        const OP: &str = "modify_song";
        if update.is_empty() {
            return Err(CatalogError::NoFieldsToUpdate { operation: OP, id });
        }
        self.store
            .update_fields(id, &update)
            .await
            .map_err(CatalogError::from_store(OP, id))
    }

    pub async fn remove_song(&self, id: Uuid) -> Result<u64> {
        const OP: &str = "remove_song";
        let removed = self
            .store
            .delete(id)
            .await
            .map_err(CatalogError::persistence(OP))?;
        match removed {
            0 => Err(CatalogError::NotFound { operation: OP, id }),
            1 => Ok(1),
            n => {
                warn!("Removing song {id} deleted {n} records");
                Ok(n)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    };

    use songlib_types::Patch;
    use time::macros::date;
    use tracing_test::traced_test;

    use super::*;

    const HEY_JUDE_TEXT: &str = "Hey Jude, don't make it bad\n\
        Take a sad song and make it better\n\n\
        Remember to let her into your heart\n\nThen you can start to make it better";

    #[derive(Default)]
    struct MockLookup {
        fail: bool,
        calls: AtomicUsize,
    }

    impl MetadataLookup for MockLookup {
        async fn lookup(&self, _group: &str, _title: &str) -> Result<SongDetail, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(LookupError::InvalidResponse("service down".into()))
            } else {
                Ok(SongDetail {
                    release_date: Some(date!(1968 - 08 - 26)),
                    text: Some(HEY_JUDE_TEXT.into()),
                    link: Some("https://www.youtube.com/watch?v=A_MjCqQoLLA".into()),
                })
            }
        }
    }

    #[derive(Default)]
    struct MockStore {
        songs: Mutex<Vec<Song>>,
        calls: AtomicUsize,
        fail: bool,
        deleted: Option<u64>,
    }

    impl MockStore {
        fn touch(&self) -> StoreResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(songlib_dal::Error::DatabaseError(sqlx_error()))
            } else {
                Ok(())
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    fn sqlx_error() -> songlib_dal::SqlxError {
        songlib_dal::SqlxError::PoolTimedOut
    }

    fn not_found(id: Uuid) -> songlib_dal::Error {
        songlib_dal::Error::RecordNotFound(format!("Song {id}"))
    }

    impl SongStore for MockStore {
        async fn save(&self, song: NewSong) -> StoreResult<Song> {
            self.touch()?;
            let now = songlib_dal::now();
            let song = Song {
                id: Uuid::new_v4(),
                group_name: song.group_name,
                title: song.title,
                detail: song.detail,
                created: now,
                modified: now,
            };
            self.songs.lock().unwrap().push(song.clone());
            Ok(song)
        }

        async fn list_matching(
            &self,
            pagination: Pagination,
            _filters: &[SongFilter],
        ) -> StoreResult<Batch<Song>> {
            self.touch()?;
            let songs = self.songs.lock().unwrap();
            let (rows, pagination) = pagination.slice(songs.as_slice());
            Ok(Batch {
                rows: rows.to_vec(),
                pagination,
            })
        }

        async fn get(&self, id: Uuid) -> StoreResult<Song> {
            self.touch()?;
            let songs = self.songs.lock().unwrap();
            songs
                .iter()
                .find(|s| s.id == id)
                .cloned()
                .ok_or_else(|| not_found(id))
        }

        async fn update_fields(&self, id: Uuid, update: &UpdateSong) -> StoreResult<Song> {
            self.touch()?;
            let mut songs = self.songs.lock().unwrap();
            let song = songs
                .iter_mut()
                .find(|s| s.id == id)
                .ok_or_else(|| not_found(id))?;
            if let Some(text) = update.text.clone().into_change() {
                song.detail.text = text;
            }
            if let Some(link) = update.link.clone().into_change() {
                song.detail.link = link;
            }
            if let Some(date) = update.release_date.clone().into_change() {
                song.detail.release_date = date.map(|d| d.date());
            }
            Ok(song.clone())
        }

        async fn delete(&self, id: Uuid) -> StoreResult<u64> {
            self.touch()?;
            if let Some(n) = self.deleted {
                return Ok(n);
            }
            let mut songs = self.songs.lock().unwrap();
            let before = songs.len();
            songs.retain(|s| s.id != id);
            Ok((before - songs.len()) as u64)
        }
    }

    fn catalog(lookup: MockLookup, store: MockStore) -> SongCatalog<MockLookup, MockStore> {
        SongCatalog::new(lookup, store, PagingDefaults::default())
    }

    #[tokio::test]
    async fn test_add_song_enriches_detail() {
        let catalog = catalog(MockLookup::default(), MockStore::default());
        let song = catalog
            .add_song(CreateSong::new("The Beatles", "Hey Jude"))
            .await
            .unwrap();
        assert_eq!(song.group_name, "The Beatles");
        assert_eq!(song.detail.release_date, Some(date!(1968 - 08 - 26)));
        assert_eq!(catalog.lookup.calls.load(Ordering::SeqCst), 1);
        assert_eq!(catalog.store().calls(), 1);
    }

    #[tokio::test]
    async fn test_add_song_lookup_failure_skips_store() {
        let lookup = MockLookup {
            fail: true,
            ..Default::default()
        };
        let catalog = catalog(lookup, MockStore::default());
        let err = catalog
            .add_song(CreateSong::new("The Beatles", "Hey Jude"))
            .await
            .unwrap_err();
        match err {
            CatalogError::UpstreamLookupFailed {
                operation,
                group,
                title,
                ..
            } => {
                assert_eq!(operation, "add_song");
                assert_eq!(group, "The Beatles");
                assert_eq!(title, "Hey Jude");
            }
            other => panic!("Unexpected error {other:?}"),
        }
        assert_eq!(catalog.store().calls(), 0);
    }

    #[tokio::test]
    async fn test_add_song_store_failure() {
        let store = MockStore {
            fail: true,
            ..Default::default()
        };
        let catalog = catalog(MockLookup::default(), store);
        let err = catalog
            .add_song(CreateSong::new("The Beatles", "Hey Jude"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CatalogError::PersistenceFailed {
                operation: "add_song",
                ..
            }
        ));
    }

    fn assert_persistence_failed(err: CatalogError, expected_op: &str) {
        match err {
            CatalogError::PersistenceFailed {
                operation,
                source: songlib_dal::Error::DatabaseError(_),
            } => assert_eq!(operation, expected_op),
            other => panic!("Unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_store_failures_are_persistence_errors() {
        let store = MockStore {
            fail: true,
            ..Default::default()
        };
        let catalog = catalog(MockLookup::default(), store);
        let id = Uuid::new_v4();

        let err = catalog
            .fetch_songs(Pagination::default(), &[])
            .await
            .unwrap_err();
        assert_persistence_failed(err, "fetch_songs");

        let err = catalog
            .fetch_song_with_verses(id, Pagination::default())
            .await
            .unwrap_err();
        assert_persistence_failed(err, "fetch_song_with_verses");

        let update = UpdateSong {
            text: Patch::Clear,
            ..Default::default()
        };
        let err = catalog.modify_song(id, update).await.unwrap_err();
        assert_persistence_failed(err, "modify_song");

        let err = catalog.remove_song(id).await.unwrap_err();
        assert_persistence_failed(err, "remove_song");

        assert_eq!(catalog.store().calls(), 4);
    }

    #[tokio::test]
    async fn test_fetch_songs_defaults_pagination() {
        let catalog = catalog(MockLookup::default(), MockStore::default());
        for title in ["Hey Jude", "Let It Be", "Yesterday"] {
            catalog
                .add_song(CreateSong::new("The Beatles", title))
                .await
                .unwrap();
        }
        let batch = catalog
            .fetch_songs(Pagination::default(), &[])
            .await
            .unwrap();
        assert_eq!(batch.rows.len(), 3);
        assert_eq!(
            batch.pagination,
            Pagination {
                offset: 0,
                limit: 20,
                items: 3,
                total: 3
            }
        );

        let batch = catalog
            .fetch_songs(Pagination::new(2, 5), &[])
            .await
            .unwrap();
        assert_eq!(batch.rows[0].title, "Yesterday");
        assert_eq!((batch.pagination.items, batch.pagination.total), (1, 3));
    }

    #[tokio::test]
    async fn test_fetch_song_with_verses() {
        let catalog = catalog(MockLookup::default(), MockStore::default());
        let song = catalog
            .add_song(CreateSong::new("The Beatles", "Hey Jude"))
            .await
            .unwrap();

        let (with_verses, pagination) = catalog
            .fetch_song_with_verses(song.id, Pagination::new(1, 1))
            .await
            .unwrap();
        assert_eq!(with_verses.id, song.id);
        assert_eq!(with_verses.title, "Hey Jude");
        assert_eq!(
            with_verses.verses,
            vec!["Remember to let her into your heart"]
        );
        assert_eq!(
            pagination,
            Pagination {
                offset: 1,
                limit: 1,
                items: 1,
                total: 3
            }
        );

        let (with_verses, pagination) = catalog
            .fetch_song_with_verses(song.id, Pagination::default())
            .await
            .unwrap();
        assert_eq!(with_verses.verses.len(), 3);
        assert_eq!(with_verses.verses[0].lines().count(), 2);
        assert_eq!(pagination.total, 3);
    }

    struct FixedLookup(SongDetail);

    impl MetadataLookup for FixedLookup {
        async fn lookup(&self, _group: &str, _title: &str) -> Result<SongDetail, LookupError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_added_song_verses() {
        let detail = SongDetail {
            release_date: Some(date!(1968 - 01 - 02)),
            text: Some("line1\n\nline2".into()),
            link: Some("https://x".into()),
        };
        let catalog = SongCatalog::new(
            FixedLookup(detail.clone()),
            MockStore::default(),
            PagingDefaults::default(),
        );
        let song = catalog
            .add_song(CreateSong::new("The Beatles", "Hey Jude"))
            .await
            .unwrap();
        assert_eq!(song.detail, detail);

        let (with_verses, pagination) = catalog
            .fetch_song_with_verses(song.id, Pagination::new(0, 20))
            .await
            .unwrap();
        assert_eq!(with_verses.verses, vec!["line1", "line2"]);
        assert_eq!(
            pagination,
            Pagination {
                offset: 0,
                limit: 20,
                items: 2,
                total: 2
            }
        );
    }

    #[tokio::test]
    async fn test_fetch_song_with_verses_not_found() {
        let catalog = catalog(MockLookup::default(), MockStore::default());
        let id = Uuid::new_v4();
        let err = catalog
            .fetch_song_with_verses(id, Pagination::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotFound { id: missing, .. } if missing == id));
    }

    #[tokio::test]
    async fn test_modify_song_without_fields() {
        let catalog = catalog(MockLookup::default(), MockStore::default());
        let err = catalog
            .modify_song(Uuid::new_v4(), UpdateSong::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::NoFieldsToUpdate { .. }));
        assert_eq!(catalog.store().calls(), 0);
    }

    #[tokio::test]
    async fn test_modify_song() {
        let catalog = catalog(MockLookup::default(), MockStore::default());
        let song = catalog
            .add_song(CreateSong::new("The Beatles", "Hey Jude"))
            .await
            .unwrap();
        let update = UpdateSong {
            text: Patch::Clear,
            ..Default::default()
        };
        let updated = catalog.modify_song(song.id, update).await.unwrap();
        assert_eq!(updated.detail.text, None);
        assert_eq!(updated.detail.link, song.detail.link);

        let update = UpdateSong {
            link: Patch::Set("https://example.com".into()),
            ..Default::default()
        };
        let err = catalog
            .modify_song(Uuid::new_v4(), update)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_remove_song() {
        let catalog = catalog(MockLookup::default(), MockStore::default());
        let song = catalog
            .add_song(CreateSong::new("The Beatles", "Hey Jude"))
            .await
            .unwrap();
        assert_eq!(catalog.remove_song(song.id).await.unwrap(), 1);
        let err = catalog.remove_song(song.id).await.unwrap_err();
        assert!(matches!(
            err,
            CatalogError::NotFound {
                operation: "remove_song",
                ..
            }
        ));
    }

    #[traced_test]
    #[tokio::test]
    async fn test_remove_song_anomaly_is_logged() {
        let store = MockStore {
            deleted: Some(2),
            ..Default::default()
        };
        let catalog = catalog(MockLookup::default(), store);
        let removed = catalog.remove_song(Uuid::new_v4()).await.unwrap();
        assert_eq!(removed, 2);
        assert!(logs_contain("deleted 2 records"));
    }
}
