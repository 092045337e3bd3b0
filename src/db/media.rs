//! Media repository backed by `SQLite`

use super::DbPool;
use crate::media::{Bundle, ImageField, MediaId, MediaItem, MediaRepository};
use crate::{Error, Result};

/// Fields for a media item that has not been stored yet
#[derive(Debug, Clone)]
pub struct NewMedia {
    pub bundle: Bundle,
    pub name: String,
    pub owner_id: String,
    pub image: Option<ImageField>,
}

/// Media repository for CRUD operations on media items
#[derive(Clone)]
pub struct MediaRepo {
    pool: DbPool,
}

impl MediaRepo {
    /// Create a new media repository
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert a media item and return it with its assigned id
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn create(&self, new: NewMedia) -> Result<MediaItem> {
        let conn = self.pool.get().map_err(|e| Error::Database(e.to_string()))?;

        let (target_id, uri, alt) = split_image(new.image.as_ref());
        conn.execute(
            r"
            INSERT INTO media (bundle, name, owner_id, image_target_id, image_uri, image_alt)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
            rusqlite::params![
                new.bundle.as_str(),
                new.name,
                new.owner_id,
                target_id,
                uri,
                alt,
            ],
        )?;

        let id = conn.last_insert_rowid();
        tracing::info!(media_id = id, bundle = %new.bundle, "media created");

        Ok(MediaItem {
            id,
            bundle: new.bundle,
            name: new.name,
            owner_id: new.owner_id,
            image: new.image,
        })
    }

    /// Get a media item by id
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn get(&self, id: MediaId) -> Result<Option<MediaItem>> {
        let conn = self.pool.get().map_err(|e| Error::Database(e.to_string()))?;

        let mut stmt = conn.prepare(
            r"
            SELECT id, bundle, name, owner_id, image_target_id, image_uri, image_alt
            FROM media
            WHERE id = ?1
            ",
        )?;

        let result = stmt.query_row(rusqlite::params![id], Self::row_to_media);

        match result {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Error::Database(e.to_string())),
        }
    }

    /// List media items in id order, optionally restricted to one bundle
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn list(&self, bundle: Option<&Bundle>) -> Result<Vec<MediaItem>> {
        let conn = self.pool.get().map_err(|e| Error::Database(e.to_string()))?;

        let mut stmt = conn.prepare(
            r"
            SELECT id, bundle, name, owner_id, image_target_id, image_uri, image_alt
            FROM media
            WHERE ?1 IS NULL OR bundle = ?1
            ORDER BY id
            ",
        )?;

        let rows = stmt.query_map(
            rusqlite::params![bundle.map(Bundle::as_str)],
            Self::row_to_media,
        )?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }

        Ok(items)
    }

    /// Resolve ids to items, keeping input order
    ///
    /// Unknown ids resolve to `None` so the caller can report them as
    /// invalid references.
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn resolve(&self, ids: &[MediaId]) -> Result<Vec<Option<MediaItem>>> {
        ids.iter().map(|id| self.get(*id)).collect()
    }

    /// Convert a database row to a `MediaItem`
    fn row_to_media(row: &rusqlite::Row<'_>) -> rusqlite::Result<MediaItem> {
        let id: MediaId = row.get(0)?;
        let bundle: String = row.get(1)?;
        let name: String = row.get(2)?;
        let owner_id: String = row.get(3)?;
        let target_id: Option<String> = row.get(4)?;
        let uri: Option<String> = row.get(5)?;
        let alt: Option<String> = row.get(6)?;

        // A row with neither column set has no image field at all
        let image = if target_id.is_none() && uri.is_none() {
            None
        } else {
            Some(ImageField {
                target_id: target_id.unwrap_or_default(),
                uri: uri.unwrap_or_default(),
                alt,
            })
        };

        Ok(MediaItem {
            id,
            bundle: Bundle::parse(&bundle),
            name,
            owner_id,
            image,
        })
    }
}

impl MediaRepository for MediaRepo {
    fn save(&self, item: &MediaItem) -> Result<()> {
        if item
            .alt_text()
            .is_some_and(|alt| alt.trim().is_empty())
        {
            return Err(Error::Persistence(format!(
                "media {} has an empty alt text",
                item.id
            )));
        }

        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Persistence(e.to_string()))?;

        let (target_id, uri, alt) = split_image(item.image.as_ref());
        let rows = conn
            .execute(
                r"
                UPDATE media SET
                    bundle = ?2,
                    name = ?3,
                    owner_id = ?4,
                    image_target_id = ?5,
                    image_uri = ?6,
                    image_alt = ?7,
                    updated_at = datetime('now')
                WHERE id = ?1
                ",
                rusqlite::params![
                    item.id,
                    item.bundle.as_str(),
                    item.name,
                    item.owner_id,
                    target_id,
                    uri,
                    alt,
                ],
            )
            .map_err(|e| Error::Persistence(e.to_string()))?;

        if rows == 0 {
            return Err(Error::Persistence(format!(
                "media {} does not exist",
                item.id
            )));
        }

        tracing::debug!(media_id = item.id, "media saved");
        Ok(())
    }
}

fn split_image(image: Option<&ImageField>) -> (Option<&str>, Option<&str>, Option<&str>) {
    image.map_or((None, None, None), |img| {
        (
            Some(img.target_id.as_str()),
            Some(img.uri.as_str()),
            img.alt.as_deref(),
        )
    })
}
