use std::time::Duration;

use futures::TryStreamExt as _;
use manga_types::{validator::unique, Runtime, Validator};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, Pool, Row as _};
use tracing::debug;

use crate::{
    error::Result, with_timeout, Batch, ChosenDB, ChosenRow, Error, Filters, Metadata,
    DEFAULT_QUERY_TIMEOUT,
};

pub const MANGA_SORT_SAFELIST: &[&str] = &[
    "id", "title", "year", "runtime", "-id", "-title", "-year", "-runtime",
];
pub const DEFAULT_SORT: &str = "id";

pub const MIN_YEAR: i32 = 1888;
pub const MAX_TITLE_BYTES: usize = 500;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Manga {
    pub id: i64,
    #[serde(skip)]
    pub created_at: time::PrimitiveDateTime,
    pub title: String,
    pub year: i32,
    #[cfg_attr(feature = "openapi", schema(value_type = String, example = "102 mins"))]
    pub runtime: Runtime,
    pub genres: Vec<String>,
    pub version: i64,
}

impl Manga {
    pub fn validate(&self, v: &mut Validator) {
        validate_fields(v, &self.title, self.year, self.runtime, &self.genres);
    }
}

impl sqlx::FromRow<'_, ChosenRow> for Manga {
    fn from_row(row: &ChosenRow) -> Result<Self, sqlx::Error> {
        let genres: Json<Vec<String>> = row.try_get("genres")?;
        Ok(Manga {
            id: row.try_get("id")?,
            created_at: row.try_get("created_at")?,
            title: row.try_get("title")?,
            year: row.try_get("year")?,
            runtime: Runtime::from_minutes(row.try_get("runtime")?),
            genres: genres.0,
            version: row.try_get("version")?,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(deny_unknown_fields)]
pub struct CreateManga {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub year: i32,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = String, example = "102 mins"))]
    pub runtime: Runtime,
    #[serde(default)]
    pub genres: Vec<String>,
}

impl CreateManga {
    pub fn validate(&self, v: &mut Validator) {
        validate_fields(v, &self.title, self.year, self.runtime, &self.genres);
    }
}

/// Partial update, only present fields are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(deny_unknown_fields)]
pub struct UpdateManga {
    pub title: Option<String>,
    pub year: Option<i32>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, example = "102 mins"))]
    pub runtime: Option<Runtime>,
    pub genres: Option<Vec<String>>,
}

impl UpdateManga {
    pub fn apply(self, manga: &mut Manga) {
        if let Some(title) = self.title {
            manga.title = title;
        }
        if let Some(year) = self.year {
            manga.year = year;
        }
        if let Some(runtime) = self.runtime {
            manga.runtime = runtime;
        }
        if let Some(genres) = self.genres {
            manga.genres = genres;
        }
    }
}

fn current_year() -> i32 {
    time::OffsetDateTime::now_utc().year()
}

fn validate_fields(v: &mut Validator, title: &str, year: i32, runtime: Runtime, genres: &[String]) {
    v.check(!title.is_empty(), "title", "must be provided");
    v.check(
        title.len() <= MAX_TITLE_BYTES,
        "title",
        "must not be more than 500 bytes long",
    );

    v.check(year != 0, "year", "must be provided");
    v.check(year >= MIN_YEAR, "year", "must not be earlier than 1888");
    v.check(year <= current_year(), "year", "must not be in the future");

    v.check(runtime.minutes() >= 0, "runtime", "must not be negative");

    v.check(
        genres.iter().all(|g| !g.trim().is_empty()),
        "genres",
        "must not contain empty values",
    );
    v.check(unique(genres), "genres", "must not contain duplicate values");
}

/// Every word of the title query must appear, words are quoted so FTS syntax is never interpreted.
fn fts_query(title: &str) -> String {
    title
        .split_whitespace()
        .map(|word| word.replace('"', ""))
        .filter(|word| word.chars().any(char::is_alphanumeric))
        .map(|word| format!("\"{word}\""))
        .collect::<Vec<_>>()
        .join(" ")
}

pub type MangaRepository = MangaRepositoryImpl<Pool<ChosenDB>>;

pub struct MangaRepositoryImpl<E> {
    executor: E,
    timeout: Duration,
}

impl<'c, E> MangaRepositoryImpl<E>
where
    for<'a> &'a E: sqlx::Executor<'c, Database = ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn create(&self, payload: CreateManga) -> Result<Manga> {
        let query = sqlx::query_as::<_, (i64, time::PrimitiveDateTime, i64)>(
            "INSERT INTO manga (title, year, runtime, genres) VALUES (?, ?, ?, ?) RETURNING id, created_at, version",
        )
        .bind(&payload.title)
        .bind(payload.year)
        .bind(payload.runtime.minutes())
        .bind(Json(&payload.genres))
        .fetch_one(&self.executor);
        let (id, created_at, version) =
            with_timeout(self.timeout, async { query.await.map_err(Error::from) }).await?;

        Ok(Manga {
            id,
            created_at,
            title: payload.title,
            year: payload.year,
            runtime: payload.runtime,
            genres: payload.genres,
            version,
        })
    }

    pub async fn get(&self, id: i64) -> Result<Manga> {
        if id < 1 {
            return Err(Error::RecordNotFound(format!("Manga {id}")));
        }
        let query = sqlx::query_as::<_, Manga>(
            "SELECT id, created_at, title, year, runtime, genres, version FROM manga WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.executor);

        with_timeout(self.timeout, async { query.await.map_err(Error::from) })
            .await?
            .ok_or_else(|| Error::RecordNotFound(format!("Manga {id}")))
    }

    /// Writes all mutable fields if the stored version still equals `manga.version`.
    ///
    /// A stale version and a row deleted in the meantime both end up as
    /// [`Error::EditConflict`], callers should re-fetch in either case.
    pub async fn update(&self, mut manga: Manga) -> Result<Manga> {
        let query = sqlx::query_scalar::<_, i64>(
            "UPDATE manga SET title = ?, year = ?, runtime = ?, genres = ?, version = version + 1 WHERE id = ? AND version = ? RETURNING version",
        )
        .bind(&manga.title)
        .bind(manga.year)
        .bind(manga.runtime.minutes())
        .bind(Json(&manga.genres))
        .bind(manga.id)
        .bind(manga.version)
        .fetch_optional(&self.executor);

        let updated = with_timeout(self.timeout, async { query.await.map_err(Error::from) }).await?;
        match updated {
            Some(version) => {
                manga.version = version;
                Ok(manga)
            }
            None => {
                debug!("Update of manga {} at version {} matched no row", manga.id, manga.version);
                Err(Error::EditConflict {
                    id: manga.id,
                    version: manga.version,
                })
            }
        }
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        if id < 1 {
            return Err(Error::RecordNotFound(format!("Manga {id}")));
        }
        let query = sqlx::query("DELETE FROM manga WHERE id = ?")
            .bind(id)
            .execute(&self.executor);
        let res = with_timeout(self.timeout, async { query.await.map_err(Error::from) }).await?;

        if res.rows_affected() == 0 {
            Err(Error::RecordNotFound(format!("Manga {id}")))
        } else {
            Ok(())
        }
    }

    pub async fn list(&self, title: &str, genres: &[String], filters: &Filters) -> Result<Batch<Manga>> {
        let ordering = filters.ordering()?;
        let title_query = fts_query(title);
        if !title.trim().is_empty() && title_query.is_empty() {
            debug!("Title query {title:?} has no searchable words");
            return Ok(Batch {
                rows: Vec::new(),
                metadata: Metadata::default(),
            });
        }
        let sql = format!(
            r#"
        SELECT count(*) OVER() AS total, id, created_at, title, year, runtime, genres, version
        FROM manga
        WHERE (?1 = '' OR id IN (SELECT rowid FROM manga_fts WHERE manga_fts MATCH ?1))
        AND (?2 = '[]' OR NOT EXISTS (
            SELECT 1 FROM json_each(?2) AS wanted
            WHERE wanted.value NOT IN (SELECT value FROM json_each(manga.genres))))
        ORDER BY {ordering}
        LIMIT ?3 OFFSET ?4
        "#
        );
        let rows = sqlx::query(&sql)
            .bind(title_query)
            .bind(Json(genres))
            .bind(filters.limit())
            .bind(filters.offset())
            .fetch(&self.executor)
            .try_collect::<Vec<ChosenRow>>();
        let rows = with_timeout(self.timeout, async { rows.await.map_err(Error::from) }).await?;

        let mut total_records = 0;
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            total_records = row.try_get("total")?;
            records.push(<Manga as sqlx::FromRow<ChosenRow>>::from_row(&row)?);
        }

        Ok(Batch {
            rows: records,
            metadata: Metadata::calculate(total_records, filters.page, filters.page_size),
        })
    }
}
