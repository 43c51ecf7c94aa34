//! Local listing cache
//!
//! SQLite table mirroring the remote listing collection. Every committed
//! write republishes the whole table through a `watch` channel, which is what
//! subscribers observe. Writers are serialized so snapshots are published in
//! commit order.

use common::error::{DatabaseError, DatabaseResult};
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Row, Sqlite, SqlitePool};
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info};

use crate::models::{Category, Listing};

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS listings (
        id TEXT PRIMARY KEY NOT NULL,
        owner_id TEXT NOT NULL,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        city TEXT NOT NULL,
        category TEXT NOT NULL,
        rooms INTEGER NOT NULL,
        price_per_night INTEGER NOT NULL,
        start_date INTEGER NOT NULL,
        end_date INTEGER NOT NULL,
        image_url TEXT NOT NULL,
        liked INTEGER NOT NULL DEFAULT 0,
        is_mine INTEGER NOT NULL DEFAULT 0
    )
"#;

const SELECT_COLUMNS: &str = "SELECT id, owner_id, title, description, city, category, rooms, \
     price_per_night, start_date, end_date, image_url, liked, is_mine FROM listings";

type Snapshot = Arc<Vec<Listing>>;

/// Reactive, SQLite-backed mirror of the remote listing collection
#[derive(Clone)]
pub struct LocalListingCache {
    pool: SqlitePool,
    snapshot: Arc<watch::Sender<Snapshot>>,
    write_lock: Arc<Mutex<()>>,
}

impl LocalListingCache {
    /// Create the table if needed and load the current contents
    pub async fn open(pool: SqlitePool) -> DatabaseResult<Self> {
        ensure_schema(&pool).await?;
        let rows = fetch_all(&pool).await?;
        info!("Local listing cache holds {} listings", rows.len());

        let (sender, _) = watch::channel(Arc::new(rows));
        Ok(Self {
            pool,
            snapshot: Arc::new(sender),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Reactive "get all": the receiver always holds the last committed table
    pub fn subscribe_all(&self) -> watch::Receiver<Snapshot> {
        self.snapshot.subscribe()
    }

    /// Reactive lookup of a single listing
    pub fn subscribe_one(&self, id: impl Into<String>) -> ListingSubscription {
        ListingSubscription {
            id: id.into(),
            receiver: self.snapshot.subscribe(),
        }
    }

    /// Last published snapshot, without touching the database
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.borrow().clone()
    }

    pub async fn all(&self) -> DatabaseResult<Vec<Listing>> {
        fetch_all(&self.pool).await
    }

    pub async fn get(&self, id: &str) -> DatabaseResult<Option<Listing>> {
        let query = format!("{} WHERE id = ?1", SELECT_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        row.as_ref().map(listing_from_row).transpose()
    }

    /// Insert or replace by id
    pub async fn upsert(&self, listing: &Listing) -> DatabaseResult<()> {
        let _guard = self.write_lock.lock().await;
        insert_row(&self.pool, listing).await?;
        self.publish().await
    }

    pub async fn upsert_all(&self, listings: &[Listing]) -> DatabaseResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await.map_err(DatabaseError::Transaction)?;
        for listing in listings {
            insert_row(&mut *tx, listing).await?;
        }
        tx.commit().await.map_err(DatabaseError::Transaction)?;
        self.publish().await
    }

    /// Remove one listing; returns whether a row was removed
    pub async fn delete(&self, id: &str) -> DatabaseResult<bool> {
        let _guard = self.write_lock.lock().await;
        let result = sqlx::query("DELETE FROM listings WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;
        self.publish().await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_all(&self) -> DatabaseResult<()> {
        let _guard = self.write_lock.lock().await;
        sqlx::query("DELETE FROM listings")
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;
        self.publish().await
    }

    /// Targeted update of the liked flag; returns whether the listing exists
    ///
    /// The stored `liked` column is advisory and per device: it records the
    /// last local toggle only. Views recompute the flag for each viewer from
    /// their liked-set, so it is never shared truth.
    pub async fn set_liked(&self, id: &str, liked: bool) -> DatabaseResult<bool> {
        let _guard = self.write_lock.lock().await;
        let result = sqlx::query("UPDATE listings SET liked = ?1 WHERE id = ?2")
            .bind(liked)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;
        self.publish().await?;
        Ok(result.rows_affected() > 0)
    }

    /// Swap the whole table for `listings` in one transaction
    ///
    /// Readers see either the previous rows or the new ones, never an empty
    /// or half-filled table. On error the transaction is rolled back when
    /// dropped and nothing is published.
    pub async fn replace_all(&self, listings: &[Listing]) -> DatabaseResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await.map_err(DatabaseError::Transaction)?;

        sqlx::query("DELETE FROM listings")
            .execute(&mut *tx)
            .await
            .map_err(DatabaseError::Query)?;
        for listing in listings {
            insert_row(&mut *tx, listing).await?;
        }

        tx.commit().await.map_err(DatabaseError::Transaction)?;
        debug!("Replaced local cache with {} listings", listings.len());
        self.publish().await
    }

    /// Re-read the table and hand the result to subscribers
    async fn publish(&self) -> DatabaseResult<()> {
        let rows = fetch_all(&self.pool).await?;
        self.snapshot.send_replace(Arc::new(rows));
        Ok(())
    }
}

/// Live view of one cached listing
pub struct ListingSubscription {
    id: String,
    receiver: watch::Receiver<Snapshot>,
}

impl ListingSubscription {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The listing as of the latest committed write, if it is cached
    pub fn current(&self) -> Option<Listing> {
        self.receiver
            .borrow()
            .iter()
            .find(|listing| listing.id == self.id)
            .cloned()
    }

    /// Wait for the next cache write and return the listing after it
    pub async fn changed(&mut self) -> Result<Option<Listing>, watch::error::RecvError> {
        self.receiver.changed().await?;
        Ok(self.current())
    }
}

async fn ensure_schema(pool: &SqlitePool) -> DatabaseResult<()> {
    sqlx::query(CREATE_TABLE)
        .execute(pool)
        .await
        .map_err(DatabaseError::Schema)?;
    Ok(())
}

async fn fetch_all<'e, E>(executor: E) -> DatabaseResult<Vec<Listing>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let query = format!("{} ORDER BY rowid", SELECT_COLUMNS);
    let rows = sqlx::query(&query)
        .fetch_all(executor)
        .await
        .map_err(DatabaseError::Query)?;

    rows.iter().map(listing_from_row).collect()
}

async fn insert_row<'e, E>(executor: E, listing: &Listing) -> DatabaseResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT OR REPLACE INTO listings
            (id, owner_id, title, description, city, category, rooms, price_per_night,
             start_date, end_date, image_url, liked, is_mine)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
        "#,
    )
    .bind(&listing.id)
    .bind(&listing.owner_id)
    .bind(&listing.title)
    .bind(&listing.description)
    .bind(&listing.city)
    .bind(listing.category.as_str())
    .bind(i64::from(listing.rooms))
    .bind(i64::from(listing.price_per_night))
    .bind(listing.start_date)
    .bind(listing.end_date)
    .bind(&listing.image_url)
    .bind(listing.liked)
    .bind(listing.is_mine)
    .execute(executor)
    .await
    .map_err(DatabaseError::Query)?;

    Ok(())
}

fn listing_from_row(row: &SqliteRow) -> DatabaseResult<Listing> {
    let category: String = row.try_get("category").map_err(DatabaseError::Query)?;
    let rooms: i64 = row.try_get("rooms").map_err(DatabaseError::Query)?;
    let price: i64 = row.try_get("price_per_night").map_err(DatabaseError::Query)?;

    Ok(Listing {
        id: row.try_get("id").map_err(DatabaseError::Query)?,
        owner_id: row.try_get("owner_id").map_err(DatabaseError::Query)?,
        title: row.try_get("title").map_err(DatabaseError::Query)?,
        description: row.try_get("description").map_err(DatabaseError::Query)?,
        city: row.try_get("city").map_err(DatabaseError::Query)?,
        category: Category::parse(&category).unwrap_or_default(),
        rooms: u32::try_from(rooms).unwrap_or(0),
        price_per_night: u32::try_from(price).unwrap_or(0),
        start_date: row.try_get("start_date").map_err(DatabaseError::Query)?,
        end_date: row.try_get("end_date").map_err(DatabaseError::Query)?,
        image_url: row.try_get("image_url").map_err(DatabaseError::Query)?,
        liked: row.try_get("liked").map_err(DatabaseError::Query)?,
        is_mine: row.try_get("is_mine").map_err(DatabaseError::Query)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::cache::{CacheConfig, init_cache_pool};

    async fn open_cache() -> DatabaseResult<LocalListingCache> {
        let pool = init_cache_pool(&CacheConfig::in_memory()).await?;
        LocalListingCache::open(pool).await
    }

    fn listing(id: &str) -> Listing {
        Listing {
            id: id.to_string(),
            owner_id: "U1".to_string(),
            title: format!("Listing {}", id),
            description: String::new(),
            city: "Haifa".to_string(),
            category: Category::Apartment,
            rooms: 3,
            price_per_night: 250,
            start_date: 1_700_000_000_000,
            end_date: 1_700_100_000_000,
            image_url: String::new(),
            liked: false,
            is_mine: false,
        }
    }

    fn ids(listings: &[Listing]) -> Vec<String> {
        listings.iter().map(|l| l.id.clone()).collect()
    }

    #[tokio::test]
    async fn test_upsert_replaces_on_conflict() -> DatabaseResult<()> {
        let cache = open_cache().await?;
        cache.upsert(&listing("A")).await?;

        let mut changed = listing("A");
        changed.title = "Renamed".to_string();
        cache.upsert(&changed).await?;

        let all = cache.all().await?;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "Renamed");
        assert_eq!(cache.get("A").await?, Some(changed));
        assert_eq!(cache.get("missing").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_set_liked_touches_only_the_flag() -> DatabaseResult<()> {
        let cache = open_cache().await?;
        cache.upsert_all(&[listing("A"), listing("B")]).await?;

        assert!(cache.set_liked("A", true).await?);
        assert!(!cache.set_liked("missing", true).await?);

        let a = cache.get("A").await?.expect("A is cached");
        assert!(a.liked);
        assert_eq!(a, Listing { liked: true, ..listing("A") });
        assert!(!cache.get("B").await?.expect("B is cached").liked);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_and_delete_all() -> DatabaseResult<()> {
        let cache = open_cache().await?;
        cache.upsert_all(&[listing("A"), listing("B"), listing("C")]).await?;

        assert!(cache.delete("B").await?);
        assert!(!cache.delete("B").await?);
        assert_eq!(ids(&cache.all().await?), vec!["A", "C"]);

        cache.delete_all().await?;
        assert!(cache.all().await?.is_empty());
        assert!(cache.snapshot().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_replace_all_is_set_equal_to_input() -> DatabaseResult<()> {
        let cache = open_cache().await?;
        cache.upsert_all(&[listing("A"), listing("B")]).await?;

        cache.replace_all(&[listing("C"), listing("D"), listing("E")]).await?;
        assert_eq!(ids(&cache.all().await?), vec!["C", "D", "E"]);
        assert_eq!(ids(&cache.snapshot()), vec!["C", "D", "E"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_subscribers_see_committed_writes() -> DatabaseResult<()> {
        let cache = open_cache().await?;
        let mut all = cache.subscribe_all();
        let mut one = cache.subscribe_one("A");
        assert!(one.current().is_none());

        cache.upsert(&listing("A")).await?;
        all.changed().await.expect("cache is alive");
        assert_eq!(ids(&all.borrow()), vec!["A"]);

        let seen = one.changed().await.expect("cache is alive");
        assert_eq!(seen.map(|l| l.id), Some("A".to_string()));

        cache.set_liked("A", true).await?;
        let seen = one.changed().await.expect("cache is alive");
        assert!(seen.is_some_and(|l| l.liked));
        Ok(())
    }

    /// Refresh back and forth between 5 and 3 rows while a reader polls
    async fn assert_readers_see_whole_tables(cache: LocalListingCache) -> DatabaseResult<()> {
        let old: Vec<Listing> = (0..5).map(|i| listing(&format!("old-{}", i))).collect();
        let new: Vec<Listing> = (0..3).map(|i| listing(&format!("new-{}", i))).collect();
        cache.replace_all(&old).await?;

        let reader = {
            let cache = cache.clone();
            tokio::spawn(async move {
                let mut counts = Vec::new();
                for _ in 0..200 {
                    counts.push(cache.all().await.map(|rows| rows.len()));
                    counts.push(Ok(cache.snapshot().len()));
                    tokio::task::yield_now().await;
                }
                counts
            })
        };

        for round in 0..20 {
            let next = if round % 2 == 0 { &new } else { &old };
            cache.replace_all(next).await?;
        }

        let counts = reader.await.expect("reader task panicked");
        for count in counts {
            let count = count?;
            assert!(count == 5 || count == 3, "observed {} rows", count);
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_readers_never_see_partial_refresh() -> DatabaseResult<()> {
        assert_readers_see_whole_tables(open_cache().await?).await
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_file_cache_readers_never_see_partial_refresh() -> DatabaseResult<()> {
        let path = std::env::temp_dir().join(format!("rentit-cache-{}.db", uuid::Uuid::new_v4()));
        let config = CacheConfig::new(format!("sqlite://{}", path.display()), 4);
        let pool = init_cache_pool(&config).await?;
        assert_eq!(pool.options().get_max_connections(), 4);

        let result = assert_readers_see_whole_tables(LocalListingCache::open(pool.clone()).await?).await;

        pool.close().await;
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
        result
    }
}
