//! PostgreSQL implementation of the vote store.
//!
//! Provides a production-ready PostgreSQL backend for the `VoteStore`,
//! `CountAggregator` and `VoteSearch` traits.
//!
//! ## Key Features
//!
//! - Connection pooling with `sqlx::PgPool`
//! - Uniqueness of `(owner_id, resource_id)` enforced by a table constraint
//! - Optional maintained `votes_count` table written in the same transaction as votes
//! - Dynamic filtering and ordering with `QueryBuilder`
//!
//! ## Database Tables
//!
//! - `votes`: One row per cast vote
//! - `votes_count`: Aggregated like/dislike tallies per resource (maintained strategy only)
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use likes_shared::types::{
    CallerStatus, CountStrategy, LikeStatus, OwnerId, RankBy, RankingCriteria, ResourceId,
    ResourceRanking, SearchResult, SortField, TimeRange, Vote, VoteCriteria, VoteId, VoteSort,
    VotesCount, Window,
};
use sqlx::{Postgres, QueryBuilder, postgres::PgPoolOptions};
use std::collections::HashMap;
use tracing::debug;

use crate::{CountAggregator, VoteSearch, VoteStore, VoteStoreError};

const VOTE_COLUMNS: &str = "id, owner_id, resource_id, liked, created_at, modified_at";

const LIVE_COUNT_SOURCE: &str = "(SELECT resource_id, \
     COUNT(*) FILTER (WHERE liked) AS like_count, \
     COUNT(*) FILTER (WHERE NOT liked) AS dislike_count, \
     COUNT(*) AS vote_count \
     FROM votes GROUP BY resource_id)";

const MAINTAINED_COUNT_SOURCE: &str = "(SELECT resource_id, \
     likes AS like_count, \
     dislikes AS dislike_count, \
     likes + dislikes AS vote_count \
     FROM votes_count)";

#[derive(sqlx::FromRow)]
struct VoteRow {
    id: i64,
    owner_id: i64,
    resource_id: i64,
    liked: bool,
    created_at: DateTime<Utc>,
    modified_at: Option<DateTime<Utc>>,
}

impl From<VoteRow> for Vote {
    fn from(row: VoteRow) -> Self {
        Vote {
            id: row.id,
            owner_id: row.owner_id,
            resource_id: row.resource_id,
            liked: row.liked,
            created_at: row.created_at,
            modified_at: row.modified_at,
        }
    }
}

/// Per-resource `(likes, dislikes)` adjustments for the maintained counter table.
type CountDeltas = HashMap<ResourceId, (i64, i64)>;

fn deltas_for_removed(rows: &[(ResourceId, bool)]) -> CountDeltas {
    let mut deltas = CountDeltas::new();
    for (resource_id, liked) in rows {
        let entry = deltas.entry(*resource_id).or_insert((0, 0));
        if *liked {
            entry.0 -= 1;
        } else {
            entry.1 -= 1;
        }
    }
    deltas
}

fn map_create_error(
    err: sqlx::Error,
    owner_id: OwnerId,
    resource_id: ResourceId,
) -> VoteStoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            VoteStoreError::conflict(owner_id, resource_id)
        }
        _ => VoteStoreError::DatabaseError(err),
    }
}

fn push_time_range(qb: &mut QueryBuilder<'_, Postgres>, column: &str, range: &TimeRange) {
    if let Some(bound) = range.before {
        qb.push(format!(" AND {} < ", column)).push_bind(bound);
    }
    if let Some(bound) = range.after {
        qb.push(format!(" AND {} > ", column)).push_bind(bound);
    }
    if let Some(bound) = range.until {
        qb.push(format!(" AND {} <= ", column)).push_bind(bound);
    }
    if let Some(bound) = range.since {
        qb.push(format!(" AND {} >= ", column)).push_bind(bound);
    }
}

/// Filters on the caller's own vote for the resource in `resource_column`.
fn push_caller_status(
    qb: &mut QueryBuilder<'_, Postgres>,
    resource_column: &str,
    caller: &CallerStatus,
) {
    let exists = match caller.status {
        LikeStatus::NotVoted => " AND NOT EXISTS",
        _ => " AND EXISTS",
    };
    qb.push(format!(
        "{} (SELECT 1 FROM votes s WHERE s.resource_id = {} AND s.owner_id = ",
        exists, resource_column
    ))
    .push_bind(caller.owner_id);
    match caller.status {
        LikeStatus::Liked => qb.push(" AND s.liked)"),
        LikeStatus::Disliked => qb.push(" AND NOT s.liked)"),
        LikeStatus::Voted | LikeStatus::NotVoted => qb.push(")"),
    };
}

fn push_vote_filters(qb: &mut QueryBuilder<'_, Postgres>, criteria: &VoteCriteria) {
    if let Some(ids) = &criteria.ids {
        qb.push(" AND v.id = ANY(").push_bind(ids.clone()).push(")");
    }
    if let Some(owner_id) = criteria.owner_id {
        qb.push(" AND v.owner_id = ").push_bind(owner_id);
    }
    if let Some(resource_id) = criteria.resource_id {
        qb.push(" AND v.resource_id = ").push_bind(resource_id);
    }
    if let Some(liked) = criteria.liked {
        qb.push(" AND v.liked = ").push_bind(liked);
    }
    if let Some(resource_ids) = &criteria.resource_ids {
        qb.push(" AND v.resource_id = ANY(")
            .push_bind(resource_ids.clone())
            .push(")");
    }
    push_time_range(qb, "v.created_at", &criteria.created);
    push_time_range(qb, "v.modified_at", &criteria.modified);
    if let Some(caller) = &criteria.caller_status {
        push_caller_status(qb, "v.resource_id", caller);
    }
}

fn push_vote_order(qb: &mut QueryBuilder<'_, Postgres>, sort: &VoteSort) {
    let direction = sort.order.as_sql();
    let column = match sort.field {
        SortField::Id => "v.id",
        SortField::OwnerId => "v.owner_id",
        SortField::ResourceId => "v.resource_id",
        SortField::Liked => "v.liked",
        SortField::Created => "v.created_at",
        SortField::Modified => "v.modified_at",
        SortField::LikeCount => "COALESCE(agg.like_count, 0)",
        SortField::DislikeCount => "COALESCE(agg.dislike_count, 0)",
        SortField::VoteCount => "COALESCE(agg.vote_count, 0)",
        SortField::Random => {
            qb.push(" ORDER BY random()");
            return;
        }
    };
    qb.push(format!(" ORDER BY {} {}", column, direction));
    if sort.field != SortField::Id {
        qb.push(format!(", v.id {}", direction));
    }
}

// Windows built by hand can exceed BIGINT; those saturate.
fn push_window(qb: &mut QueryBuilder<'_, Postgres>, window: &Window) {
    if let Some(limit) = window.limit {
        qb.push(" LIMIT ")
            .push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
    }
    if window.offset > 0 {
        qb.push(" OFFSET ")
            .push_bind(i64::try_from(window.offset).unwrap_or(i64::MAX));
    }
}

/// PostgreSQL implementation of the vote store.
///
/// All single-vote writes run in a transaction so the maintained counter table,
/// when enabled, never drifts from the `votes` rows.
pub struct PostgresVoteStore {
    pool: sqlx::PgPool,
    strategy: CountStrategy,
}

impl PostgresVoteStore {
    /// Creates a new PostgreSQL vote store using live count aggregation.
    ///
    /// # Arguments
    ///
    /// * `pool` - Configured PostgreSQL connection pool with the required schema
    ///
    /// # Returns
    ///
    /// * `Ok(PostgresVoteStore)` - Ready-to-use store instance
    /// * `Err(VoteStoreError)` - Future validation errors (currently always succeeds)
    pub async fn new(pool: sqlx::PgPool) -> Result<Self, VoteStoreError> {
        Ok(Self {
            pool,
            strategy: CountStrategy::Live,
        })
    }

    /// Opens a pool against `database_url` and wraps it in a store.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, VoteStoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Self::new(pool).await
    }

    /// Selects how counts are answered.
    ///
    /// Switching an existing database to `Maintained` requires `rebuild_counts` first.
    pub fn with_strategy(mut self, strategy: CountStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn strategy(&self) -> CountStrategy {
        self.strategy
    }

    /// Applies the bundled schema migrations.
    pub async fn migrate(&self) -> Result<(), VoteStoreError> {
        sqlx::migrate!("./src/postgres/migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Recomputes the `votes_count` table from the `votes` rows.
    ///
    /// # Returns
    ///
    /// The number of resources with a counter row afterwards.
    pub async fn rebuild_counts(&self) -> Result<u64, VoteStoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM votes_count").execute(&mut *tx).await?;
        let inserted = sqlx::query(
            r#"
            INSERT INTO votes_count (resource_id, likes, dislikes)
            SELECT resource_id, COUNT(*) FILTER (WHERE liked), COUNT(*) FILTER (WHERE NOT liked)
            FROM votes
            GROUP BY resource_id
            "#,
        )
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(inserted.rows_affected())
    }

    fn count_source(&self) -> &'static str {
        match self.strategy {
            CountStrategy::Live => LIVE_COUNT_SOURCE,
            CountStrategy::Maintained => MAINTAINED_COUNT_SOURCE,
        }
    }

    /// Applies counter deltas within an active transaction.
    ///
    /// No-op under the live strategy. Rows that drop to zero votes are removed so the
    /// table only holds resources that have votes.
    async fn adjust_counts_tx(
        &self,
        deltas: &CountDeltas,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<(), VoteStoreError> {
        if self.strategy != CountStrategy::Maintained || deltas.is_empty() {
            return Ok(());
        }

        for (resource_id, (likes, dislikes)) in deltas {
            sqlx::query(
                r#"
                INSERT INTO votes_count (resource_id, likes, dislikes)
                VALUES ($1, $2, $3)
                ON CONFLICT (resource_id)
                DO UPDATE SET
                    likes = votes_count.likes + EXCLUDED.likes,
                    dislikes = votes_count.dislikes + EXCLUDED.dislikes
                "#,
            )
            .bind(resource_id)
            .bind(likes)
            .bind(dislikes)
            .execute(&mut **tx)
            .await?;
        }

        let resource_ids: Vec<ResourceId> = deltas.keys().copied().collect();
        sqlx::query(
            "DELETE FROM votes_count WHERE resource_id = ANY($1) AND likes <= 0 AND dislikes <= 0",
        )
        .bind(resource_ids)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    fn push_ranking_source(&self, qb: &mut QueryBuilder<'_, Postgres>, criteria: &RankingCriteria) {
        match &criteria.resource_ids {
            Some(resource_ids) => {
                qb.push(" FROM UNNEST(")
                    .push_bind(resource_ids.clone())
                    .push("::bigint[]) AS r(resource_id)");
            }
            None => {
                qb.push(" FROM (SELECT DISTINCT resource_id FROM votes) r");
            }
        }
        qb.push(" LEFT JOIN ")
            .push(self.count_source())
            .push(" agg ON agg.resource_id = r.resource_id WHERE TRUE");

        match criteria.has_likes {
            Some(true) => {
                qb.push(" AND COALESCE(agg.like_count, 0) > 0");
            }
            Some(false) => {
                qb.push(" AND COALESCE(agg.like_count, 0) = 0");
            }
            None => {}
        }
        if let Some(caller) = &criteria.caller_status {
            push_caller_status(qb, "r.resource_id", caller);
        }
    }
}

#[async_trait]
impl VoteStore for PostgresVoteStore {
    async fn create(
        &self,
        owner_id: OwnerId,
        resource_id: ResourceId,
        liked: bool,
    ) -> Result<Vote, VoteStoreError> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, VoteRow>(&format!(
            "INSERT INTO votes (owner_id, resource_id, liked, created_at) VALUES ($1, $2, $3, now()) RETURNING {}",
            VOTE_COLUMNS
        ))
        .bind(owner_id)
        .bind(resource_id)
        .bind(liked)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_create_error(e, owner_id, resource_id))?;

        let delta = if liked { (1, 0) } else { (0, 1) };
        self.adjust_counts_tx(&CountDeltas::from([(resource_id, delta)]), &mut tx)
            .await?;
        tx.commit().await?;
        Ok(row.into())
    }

    async fn find(
        &self,
        owner_id: OwnerId,
        resource_id: ResourceId,
    ) -> Result<Option<Vote>, VoteStoreError> {
        let row = sqlx::query_as::<_, VoteRow>(&format!(
            "SELECT {} FROM votes WHERE owner_id = $1 AND resource_id = $2",
            VOTE_COLUMNS
        ))
        .bind(owner_id)
        .bind(resource_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Vote::from))
    }

    async fn get(&self, id: VoteId) -> Result<Option<Vote>, VoteStoreError> {
        let row = sqlx::query_as::<_, VoteRow>(&format!(
            "SELECT {} FROM votes WHERE id = $1",
            VOTE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Vote::from))
    }

    async fn update(&self, id: VoteId, liked: bool) -> Result<Vote, VoteStoreError> {
        let mut tx = self.pool.begin().await?;
        let previous: Option<bool> =
            sqlx::query_scalar("SELECT liked FROM votes WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(previous) = previous else {
            return Err(VoteStoreError::NotFound(id));
        };

        let row = sqlx::query_as::<_, VoteRow>(&format!(
            "UPDATE votes SET liked = $2, modified_at = now() WHERE id = $1 RETURNING {}",
            VOTE_COLUMNS
        ))
        .bind(id)
        .bind(liked)
        .fetch_one(&mut *tx)
        .await?;

        if previous != liked {
            let delta = if liked { (1, -1) } else { (-1, 1) };
            self.adjust_counts_tx(&CountDeltas::from([(row.resource_id, delta)]), &mut tx)
                .await?;
        }
        tx.commit().await?;
        Ok(row.into())
    }

    async fn delete(&self, id: VoteId) -> Result<bool, VoteStoreError> {
        let mut tx = self.pool.begin().await?;
        let removed: Option<(ResourceId, bool)> =
            sqlx::query_as("DELETE FROM votes WHERE id = $1 RETURNING resource_id, liked")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(removed) = removed else {
            return Ok(false);
        };
        self.adjust_counts_tx(&deltas_for_removed(&[removed]), &mut tx)
            .await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn delete_by_resources(
        &self,
        resource_ids: &[ResourceId],
    ) -> Result<u64, VoteStoreError> {
        if resource_ids.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let deleted = sqlx::query("DELETE FROM votes WHERE resource_id = ANY($1)")
            .bind(resource_ids.to_vec())
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if self.strategy == CountStrategy::Maintained {
            sqlx::query("DELETE FROM votes_count WHERE resource_id = ANY($1)")
                .bind(resource_ids.to_vec())
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        debug!(resources = resource_ids.len(), deleted, "Deleted votes by resource");
        Ok(deleted)
    }

    async fn delete_by_owner(&self, owner_id: OwnerId) -> Result<Vec<ResourceId>, VoteStoreError> {
        let mut tx = self.pool.begin().await?;
        let removed: Vec<(ResourceId, bool)> =
            sqlx::query_as("DELETE FROM votes WHERE owner_id = $1 RETURNING resource_id, liked")
                .bind(owner_id)
                .fetch_all(&mut *tx)
                .await?;
        self.adjust_counts_tx(&deltas_for_removed(&removed), &mut tx)
            .await?;
        tx.commit().await?;

        debug!(owner_id, deleted = removed.len(), "Deleted votes by owner");
        Ok(removed.into_iter().map(|(resource_id, _)| resource_id).collect())
    }
}

#[async_trait]
impl CountAggregator for PostgresVoteStore {
    async fn counts(&self, resource_id: ResourceId) -> Result<VotesCount, VoteStoreError> {
        let (likes, dislikes): (i64, i64) = match self.strategy {
            CountStrategy::Live => {
                sqlx::query_as(
                    r#"
                    SELECT COUNT(*) FILTER (WHERE liked), COUNT(*) FILTER (WHERE NOT liked)
                    FROM votes
                    WHERE resource_id = $1
                    "#,
                )
                .bind(resource_id)
                .fetch_one(&self.pool)
                .await?
            }
            CountStrategy::Maintained => {
                sqlx::query_as("SELECT likes, dislikes FROM votes_count WHERE resource_id = $1")
                    .bind(resource_id)
                    .fetch_optional(&self.pool)
                    .await?
                    .unwrap_or((0, 0))
            }
        };
        Ok(VotesCount::new(likes, dislikes))
    }

    async fn counts_many(
        &self,
        resource_ids: &[ResourceId],
    ) -> Result<HashMap<ResourceId, VotesCount>, VoteStoreError> {
        let mut result: HashMap<ResourceId, VotesCount> = resource_ids
            .iter()
            .map(|id| (*id, VotesCount::default()))
            .collect();
        if resource_ids.is_empty() {
            return Ok(result);
        }

        let sql = match self.strategy {
            CountStrategy::Live => {
                r#"
                SELECT resource_id, COUNT(*) FILTER (WHERE liked), COUNT(*) FILTER (WHERE NOT liked)
                FROM votes
                WHERE resource_id = ANY($1)
                GROUP BY resource_id
                "#
            }
            CountStrategy::Maintained => {
                "SELECT resource_id, likes, dislikes FROM votes_count WHERE resource_id = ANY($1)"
            }
        };
        let rows: Vec<(ResourceId, i64, i64)> = sqlx::query_as(sql)
            .bind(resource_ids.to_vec())
            .fetch_all(&self.pool)
            .await?;
        for (resource_id, likes, dislikes) in rows {
            result.insert(resource_id, VotesCount::new(likes, dislikes));
        }
        Ok(result)
    }

    async fn user_status(
        &self,
        resource_id: ResourceId,
        owner_id: OwnerId,
    ) -> Result<Option<bool>, VoteStoreError> {
        let liked = sqlx::query_scalar(
            "SELECT liked FROM votes WHERE resource_id = $1 AND owner_id = $2",
        )
        .bind(resource_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(liked)
    }
}

#[async_trait]
impl VoteSearch for PostgresVoteStore {
    async fn search(&self, criteria: &VoteCriteria) -> Result<SearchResult<Vote>, VoteStoreError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT v.id, v.owner_id, v.resource_id, v.liked, v.created_at, v.modified_at FROM votes v",
        );
        if criteria.sort.field.needs_counts() {
            qb.push(" LEFT JOIN ")
                .push(self.count_source())
                .push(" agg ON agg.resource_id = v.resource_id");
        }
        qb.push(" WHERE TRUE");
        push_vote_filters(&mut qb, criteria);
        push_vote_order(&mut qb, &criteria.sort);
        if let Some(window) = &criteria.window {
            push_window(&mut qb, window);
        }

        let rows = qb.build_query_as::<VoteRow>().fetch_all(&self.pool).await?;
        let items: Vec<Vote> = rows.into_iter().map(Vote::from).collect();

        if criteria.window.is_none() {
            return Ok(SearchResult::unbounded(items));
        }

        let mut count_qb: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM votes v WHERE TRUE");
        push_vote_filters(&mut count_qb, criteria);
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        Ok(SearchResult {
            items,
            total_count: total as u64,
        })
    }

    async fn distinct_resources(
        &self,
        criteria: &VoteCriteria,
    ) -> Result<Vec<ResourceId>, VoteStoreError> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT DISTINCT v.resource_id FROM votes v WHERE TRUE");
        push_vote_filters(&mut qb, criteria);
        qb.push(" ORDER BY v.resource_id");
        let resource_ids: Vec<ResourceId> = qb.build_query_scalar().fetch_all(&self.pool).await?;
        Ok(resource_ids)
    }

    async fn rank_resources(
        &self,
        criteria: &RankingCriteria,
    ) -> Result<SearchResult<ResourceRanking>, VoteStoreError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT r.resource_id, COALESCE(agg.like_count, 0), COALESCE(agg.dislike_count, 0)",
        );
        self.push_ranking_source(&mut qb, criteria);

        let direction = criteria.order.as_sql();
        let key = match criteria.rank_by {
            RankBy::LikeCount => "COALESCE(agg.like_count, 0)",
            RankBy::DislikeCount => "COALESCE(agg.dislike_count, 0)",
            RankBy::VoteCount => "COALESCE(agg.vote_count, 0)",
        };
        qb.push(format!(
            " ORDER BY {} {}, r.resource_id {}",
            key, direction, direction
        ));
        if let Some(window) = &criteria.window {
            push_window(&mut qb, window);
        }

        let rows: Vec<(ResourceId, i64, i64)> =
            qb.build_query_as().fetch_all(&self.pool).await?;
        let items: Vec<ResourceRanking> = rows
            .into_iter()
            .map(|(resource_id, likes, dislikes)| ResourceRanking {
                resource_id,
                counts: VotesCount::new(likes, dislikes),
            })
            .collect();

        if criteria.window.is_none() {
            return Ok(SearchResult::unbounded(items));
        }

        let mut count_qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*)");
        self.push_ranking_source(&mut count_qb, criteria);
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        Ok(SearchResult {
            items,
            total_count: total as u64,
        })
    }
}
