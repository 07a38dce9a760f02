//! Session archival: mark-paid and table reset
//!
//! Archival closes a table's session: copy the request log into the
//! append-only history, write a summary record, delete the live
//! requests, empty the cart, and restart the session epoch. The store
//! offers no transactions, so the sequence is ordered to fail safe:
//! every copy must land before the first destructive delete, and a
//! failure after the deletes surfaces as `ArchiveIncomplete` with the
//! step that broke.
//!
//! A "recently archived" marker set up front makes reloads suppress the
//! table while the deletes propagate, so a stale snapshot cannot flash
//! the old session back onto screens.

use futures::future::join_all;
use sha2::{Digest, Sha256};
use tracing::{info, instrument, warn};

use shared::models::{ArchiveRecord, CompletedOrder, RequestKind, TableRecord};
use shared::util::{now_millis, snowflake_id};
use shared::{AppError, AppResult, ErrorCode};

use crate::commands::SessionService;
use crate::money;

/// First link of the archive hash chain
const GENESIS_HASH: &str = "genesis";

/// What happens to the table's flags after archival
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArchiveMode {
    /// Settlement: VIP status survives into the next session
    Payment,
    /// Manual reset: all flags return to defaults
    Reset,
}

impl SessionService {
    /// Settle a table after payment: archive the session and reopen the
    /// table with its VIP flag intact.
    #[instrument(skip(self), fields(instance = %self.instance_id()))]
    pub async fn mark_paid(&self, table_id: &str) -> AppResult<ArchiveRecord> {
        let mutex = self.table_mutex(table_id);
        let _guard = mutex.lock().await;
        self.archive_table(table_id, ArchiveMode::Payment).await
    }

    /// Forcibly reset a table: archive whatever session state exists and
    /// reopen with all flags cleared.
    #[instrument(skip(self), fields(instance = %self.instance_id()))]
    pub async fn reset_table(&self, table_id: &str) -> AppResult<ArchiveRecord> {
        let mutex = self.table_mutex(table_id);
        let _guard = mutex.lock().await;
        self.archive_table(table_id, ArchiveMode::Reset).await
    }

    /// Reset every known table. Failures are collected per table instead
    /// of aborting the batch.
    #[instrument(skip(self), fields(instance = %self.instance_id()))]
    pub async fn reset_all(&self) -> AppResult<usize> {
        let tables = self.store().list_tables().await?;
        let resets = tables.iter().map(|t| self.reset_table(&t.table_id));
        let results = join_all(resets).await;

        let mut failed: Vec<String> = Vec::new();
        for (table, result) in tables.iter().zip(results) {
            if let Err(err) = result {
                warn!(table_id = %table.table_id, error = %err, "reset failed");
                failed.push(table.table_id.clone());
            }
        }
        if failed.is_empty() {
            Ok(tables.len())
        } else {
            Err(AppError::with_message(
                ErrorCode::ArchiveIncomplete,
                format!("{} of {} table resets failed", failed.len(), tables.len()),
            )
            .with_detail("failed_tables", failed))
        }
    }

    async fn archive_table(&self, table_id: &str, mode: ArchiveMode) -> AppResult<ArchiveRecord> {
        let record = self.ensure_table(table_id).await?;
        let now = now_millis();

        // Suppress reloads and present the end state optimistically
        self.cache().mark_recently_archived(table_id);
        self.cache().stage_requests_cleared(table_id);
        self.cache().stage_cart_cleared(table_id);
        self.cache().stage_lock(table_id, false);
        if mode == ArchiveMode::Reset {
            self.cache().stage_vip(table_id, false);
        }

        let result = self.run_archive_steps(table_id, &record, mode, now).await;
        match result {
            Ok((archive, next_record)) => {
                // Refresh the marker so the suppression window covers the
                // deletes, then install the reopened table
                self.cache().mark_recently_archived(table_id);
                self.cache().fold_table_reset(&next_record);
                self.forced_reload(table_id).await;
                info!(
                    table_id,
                    requests = archive.request_count,
                    revenue = archive.revenue,
                    "session archived"
                );
                Ok(archive)
            }
            Err(err) => {
                self.cache().unmark_recently_archived(table_id);
                self.cache().clear_table_stages(table_id);
                self.forced_reload(table_id).await;
                Err(err)
            }
        }
    }

    async fn run_archive_steps(
        &self,
        table_id: &str,
        record: &TableRecord,
        mode: ArchiveMode,
        now: i64,
    ) -> AppResult<(ArchiveRecord, TableRecord)> {
        // Step 1: read the session's request log. Nothing destructive has
        // happened yet, so any failure aborts cleanly.
        let requests = self
            .store()
            .list_requests_for_table(table_id)
            .await
            .map_err(|e| step_failed("read_requests", e))?;

        // Step 2: copy every request into history. All copies must land
        // before the first delete; losing the audit trail is worse than
        // leaving the table open.
        for request in &requests {
            let order = CompletedOrder {
                id: format!("ord_{}", snowflake_id()),
                request_id: request.id.clone(),
                table_id: table_id.to_string(),
                kind: request.kind,
                details: request.details.clone(),
                total: request.total,
                payment_method: request.payment_method,
                created_at: request.created_at,
                archived_at: now,
            };
            self.store()
                .put_completed_order(order)
                .await
                .map_err(|e| step_failed("copy_requests", e))?;
        }

        // Step 3: summary record with the integrity hash chain. A failure
        // here loses a summary row, not session data, so it is logged and
        // the archival continues.
        let revenue = money::sum_totals(
            requests
                .iter()
                .filter(|r| r.kind == RequestKind::NewOrder)
                .map(|r| r.total),
        );
        let earliest = requests.iter().map(|r| r.created_at).min();
        let prev_hash = match self.store().last_archive_hash().await {
            Ok(Some(hash)) => hash,
            Ok(None) => GENESIS_HASH.to_string(),
            Err(err) => {
                warn!(table_id, error = %err, "previous archive hash unavailable");
                GENESIS_HASH.to_string()
            }
        };
        let mut archive = ArchiveRecord {
            id: format!("arch_{}", snowflake_id()),
            table_id: table_id.to_string(),
            request_count: requests.len(),
            revenue,
            session_started_at: record.session_start,
            archived_at: now,
            duration_minutes: earliest.map(|e| ((now - e) / 60_000).max(0)).unwrap_or(0),
            prev_hash,
            curr_hash: String::new(),
        };
        archive.curr_hash = chain_hash(&archive);
        if let Err(err) = self.store().put_archive_record(archive.clone()).await {
            warn!(table_id, error = %err, "archive summary write failed, continuing");
        }

        // Step 4: delete the live requests, then verify by re-reading.
        // The store acknowledging a delete is not trusted on its own.
        self.delete_requests_verified(table_id)
            .await
            .map_err(|e| step_failed("delete_requests", e))?;

        // Step 5: empty the cart
        self.store()
            .clear_cart(table_id)
            .await
            .map_err(|e| step_failed("clear_cart", e))?;

        // Step 6: reopen the table with a fresh session epoch. Strictly
        // after both the old epoch and every archived request timestamp,
        // even if the clock went backwards.
        let mut next_record = TableRecord::new(table_id, (now + 1).max(record.session_start + 1));
        next_record.is_vip = match mode {
            ArchiveMode::Payment => record.is_vip,
            ArchiveMode::Reset => false,
        };
        self.store()
            .put_table(next_record.clone())
            .await
            .map_err(|e| step_failed("reopen_table", e))?;

        Ok((archive, next_record))
    }

    async fn delete_requests_verified(&self, table_id: &str) -> AppResult<()> {
        for attempt in 1..=2 {
            if let Err(err) = self.store().delete_requests_for_table(table_id).await {
                if attempt == 2 {
                    return Err(err);
                }
                warn!(table_id, error = %err, "request delete failed, retrying once");
                continue;
            }
            let remaining = self.store().list_requests_for_table(table_id).await?;
            if remaining.is_empty() {
                return Ok(());
            }
            warn!(
                table_id,
                remaining = remaining.len(),
                "requests survived delete"
            );
        }
        Err(AppError::with_message(
            ErrorCode::ArchiveIncomplete,
            "request delete did not verify",
        ))
    }
}

fn step_failed(step: &str, err: AppError) -> AppError {
    AppError::with_message(
        ErrorCode::ArchiveIncomplete,
        format!("archival step {} failed: {}", step, err.message),
    )
    .with_detail("step", step)
    .with_detail("cause", err.code.to_string())
}

fn chain_hash(record: &ArchiveRecord) -> String {
    let mut hasher = Sha256::new();
    hasher.update(record.id.as_bytes());
    hasher.update(b"|");
    hasher.update(record.table_id.as_bytes());
    hasher.update(b"|");
    hasher.update(record.request_count.to_le_bytes());
    hasher.update(format!("{:.2}", record.revenue).as_bytes());
    hasher.update(b"|");
    hasher.update(record.session_started_at.to_le_bytes());
    hasher.update(record.archived_at.to_le_bytes());
    hasher.update(b"|");
    hasher.update(record.prev_hash.as_bytes());
    hex::encode(hasher.finalize())
}
