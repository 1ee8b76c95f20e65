use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::api::health::HealthState;
use crate::db::models::{NicheSnapshotRow, ResearchRunRow};
use crate::error::Result;
use crate::types::{NicheScore, ResearchSnapshot, ResearchSource};

/// Receives research snapshots from the refresher and API handlers and
/// persists them to SQLite. Runs as a dedicated background task so a slow
/// write never holds up a request.
pub struct SnapshotWriter {
    pool: sqlx::SqlitePool,
    snapshot_rx: mpsc::Receiver<ResearchSnapshot>,
    health: Arc<HealthState>,
}

impl SnapshotWriter {
    pub fn new(
        pool: sqlx::SqlitePool,
        snapshot_rx: mpsc::Receiver<ResearchSnapshot>,
        health: Arc<HealthState>,
    ) -> Self {
        Self { pool, snapshot_rx, health }
    }

    pub async fn run(mut self) {
        while let Some(snapshot) = self.snapshot_rx.recv().await {
            self.health.dec_write_queue_pending();
            match write_snapshot(&self.pool, &snapshot).await {
                Ok(run_id) => {
                    self.health.inc_snapshots_written();
                    debug!(run_id, region = %snapshot.region, niches = snapshot.niches.len(), "Snapshot persisted");
                }
                Err(e) => error!("DB write error: {e}"),
            }
        }
    }
}

/// Queue a snapshot for the writer without waiting. A full or closed channel
/// drops the snapshot with a warning.
pub fn queue_snapshot(tx: &mpsc::Sender<ResearchSnapshot>, health: &HealthState, snapshot: ResearchSnapshot) {
    let region = snapshot.region.clone();
    match tx.try_send(snapshot) {
        Ok(()) => health.inc_write_queue_pending(),
        Err(e) => warn!(region = %region, "Snapshot not queued for DB write: {e}"),
    }
}

/// One research run plus its niches in rank order.
pub async fn write_snapshot(pool: &sqlx::SqlitePool, s: &ResearchSnapshot) -> Result<i64> {
    let mut tx = pool.begin().await?;

    let run_id = sqlx::query(
        r#"
        INSERT INTO research_runs (region, source, analyzed_videos, niche_count, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&s.region)
    .bind(s.source.to_string())
    .bind(s.analyzed_videos as i64)
    .bind(s.niches.len() as i64)
    .bind(s.created_at_ns as i64)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    for (i, n) in s.niches.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO niche_snapshots (
                run_id, rank, category_id, name,
                avg_views, engagement, competition, traffic_potential, score,
                video_count, view_concentration, data_quality
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(run_id)
        .bind(i as i64 + 1)
        .bind(&n.category_id)
        .bind(&n.name)
        .bind(n.avg_views)
        .bind(n.engagement)
        .bind(n.competition)
        .bind(n.traffic_potential)
        .bind(n.score)
        .bind(n.video_count as i64)
        .bind(n.view_concentration)
        .bind(n.data_quality.to_string())
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(run_id)
}

#[derive(Debug, Clone, Serialize)]
pub struct StoredSnapshot {
    pub run: ResearchRunRow,
    pub niches: Vec<NicheScore>,
}

/// Most recent run of one source for a region, with its niches in stored rank order.
pub async fn latest_snapshot(
    pool: &sqlx::SqlitePool,
    region: &str,
    source: ResearchSource,
) -> Result<Option<StoredSnapshot>> {
    let run: Option<ResearchRunRow> = sqlx::query_as(
        r#"
        SELECT id, region, source, analyzed_videos, niche_count, created_at
        FROM research_runs
        WHERE region = ? AND source = ?
        ORDER BY created_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .bind(region)
    .bind(source.to_string())
    .fetch_optional(pool)
    .await?;

    let Some(run) = run else {
        return Ok(None);
    };

    let rows: Vec<NicheSnapshotRow> = sqlx::query_as(
        r#"
        SELECT category_id, name, avg_views, engagement, competition,
               traffic_potential, score, video_count, view_concentration, data_quality
        FROM niche_snapshots
        WHERE run_id = ?
        ORDER BY rank ASC
        "#,
    )
    .bind(run.id)
    .fetch_all(pool)
    .await?;

    Ok(Some(StoredSnapshot {
        run,
        niches: rows.into_iter().map(NicheSnapshotRow::into_niche).collect(),
    }))
}

/// Newest-first run list for a region.
pub async fn run_history(pool: &sqlx::SqlitePool, region: &str, limit: u32) -> Result<Vec<ResearchRunRow>> {
    let rows = sqlx::query_as(
        r#"
        SELECT id, region, source, analyzed_videos, niche_count, created_at
        FROM research_runs
        WHERE region = ?
        ORDER BY created_at DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(region)
    .bind(i64::from(limit))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::DataQuality;

    pub(crate) async fn memory_pool() -> sqlx::SqlitePool {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        pool
    }

    fn niche(id: &str, score: Option<f64>) -> NicheScore {
        NicheScore {
            category_id: id.to_string(),
            name: format!("Category {id}"),
            avg_views: score.map(|s| s * 1000.0),
            engagement: Some(4.5),
            competition: score.map(|s| 100.0 - s),
            traffic_potential: score,
            score,
            video_count: 6,
            view_concentration: Some(0.25),
            data_quality: DataQuality::Medium,
        }
    }

    fn snapshot(region: &str, created_at_ns: u64, niches: Vec<NicheScore>) -> ResearchSnapshot {
        ResearchSnapshot {
            region: region.to_string(),
            source: ResearchSource::Trending,
            analyzed_videos: 50,
            niches,
            created_at_ns,
        }
    }

    #[tokio::test]
    async fn latest_snapshot_reads_back_in_rank_order() {
        let pool = memory_pool().await;
        write_snapshot(&pool, &snapshot("US", 1, vec![niche("10", Some(50.0))]))
            .await
            .unwrap();
        write_snapshot(
            &pool,
            &snapshot("US", 2, vec![niche("27", Some(80.0)), niche("24", None)]),
        )
        .await
        .unwrap();
        let mut search = snapshot("US", 3, vec![niche("lofi", Some(40.0))]);
        search.source = ResearchSource::Search;
        write_snapshot(&pool, &search).await.unwrap();

        let latest = latest_snapshot(&pool, "US", ResearchSource::Trending).await.unwrap().unwrap();
        assert_eq!(latest.run.created_at, 2);
        assert_eq!(latest.run.niche_count, 2);
        assert_eq!(latest.run.source, "trending");
        assert_eq!(latest.niches, vec![niche("27", Some(80.0)), niche("24", None)]);

        assert!(latest_snapshot(&pool, "GB", ResearchSource::Trending).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn history_is_newest_first_and_limited() {
        let pool = memory_pool().await;
        for t in 1..=4 {
            write_snapshot(&pool, &snapshot("US", t, vec![])).await.unwrap();
        }
        write_snapshot(&pool, &snapshot("JP", 9, vec![])).await.unwrap();

        let runs = run_history(&pool, "US", 3).await.unwrap();
        let times: Vec<i64> = runs.iter().map(|r| r.created_at).collect();
        assert_eq!(times, vec![4, 3, 2]);
    }

    #[tokio::test]
    async fn writer_drains_channel_and_counts() {
        let pool = memory_pool().await;
        let health = Arc::new(HealthState::new());
        let (tx, rx) = mpsc::channel(8);
        let writer = SnapshotWriter::new(pool.clone(), rx, Arc::clone(&health));

        queue_snapshot(&tx, &health, snapshot("US", 7, vec![niche("27", Some(60.0))]));
        assert_eq!(health.write_queue_pending(), 1);
        drop(tx);
        writer.run().await;

        assert_eq!(health.snapshots_written(), 1);
        assert_eq!(health.write_queue_pending(), 0);
        assert_eq!(latest_snapshot(&pool, "US", ResearchSource::Trending).await.unwrap().unwrap().run.created_at, 7);
    }
}
