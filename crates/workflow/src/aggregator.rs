//! In-memory aggregation of one open form's worker entries.
//!
//! The aggregator is the single owner of the open form's entry state.
//! Every mutation is validated locally, persisted through the injected
//! [`EntryStore`], and only committed to memory after the remote call
//! resolves, so local state can never permanently diverge from the
//! server. All state is discarded when the form is closed.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use lineops_core::attendance::AttendanceStatus;
use lineops_core::entry::DigitalFormEntry;
use lineops_core::feedback::{Notifier, Severity};
use lineops_core::form::DigitalForm;
use lineops_core::issue::ProductionIssue;
use lineops_core::shift::ShiftType;
use lineops_core::types::EntityId;

use crate::WorkflowError;

/// Persistence seam for entry mutations (the cache layer's update path).
#[async_trait]
pub trait EntryStore: Send + Sync {
    async fn save_entry(&self, entry: &DigitalFormEntry) -> Result<(), WorkflowError>;
}

/// Tunable aggregator behavior.
#[derive(Debug, Clone, Copy)]
pub struct AggregatorPolicy {
    /// Whether a shift-type change drops hourly slots that are no longer
    /// valid for the new shift. Defaults to `false`: already-entered
    /// production data is historical record and survives until
    /// explicitly cleared.
    pub prune_on_shift_change: bool,
}

impl Default for AggregatorPolicy {
    fn default() -> Self {
        Self {
            prune_on_shift_change: false,
        }
    }
}

/// Derived statistics over the open form's entries.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormStatistics {
    pub total_output: f64,
    pub present: usize,
    pub absent: usize,
    pub late: usize,
    pub early_leave: usize,
    pub leave_approved: usize,
    pub issue_count: usize,
    /// Mean quality score across entries, `None` when the form is empty.
    pub average_quality: Option<f64>,
}

/// Holds the currently open form's entries and computes derived stats.
pub struct FormAggregator {
    store: Arc<dyn EntryStore>,
    notifier: Arc<dyn Notifier>,
    policy: AggregatorPolicy,
    form: Mutex<Option<DigitalForm>>,
    entries: Mutex<BTreeMap<EntityId, DigitalFormEntry>>,
}

impl FormAggregator {
    pub fn new(store: Arc<dyn EntryStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self::with_policy(store, notifier, AggregatorPolicy::default())
    }

    pub fn with_policy(
        store: Arc<dyn EntryStore>,
        notifier: Arc<dyn Notifier>,
        policy: AggregatorPolicy,
    ) -> Self {
        Self {
            store,
            notifier,
            policy,
            form: Mutex::new(None),
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    /// Load a form and its entries, replacing any previously open form.
    pub fn open_form(&self, form: DigitalForm, entries: Vec<DigitalFormEntry>) {
        let mut map = BTreeMap::new();
        for entry in entries {
            map.insert(entry.worker_id.clone(), entry);
        }
        *self.entries.lock().expect("aggregator entry lock poisoned") = map;
        *self.form.lock().expect("aggregator form lock poisoned") = Some(form);
    }

    /// Discard all in-memory state (UI navigated away).
    pub fn close_form(&self) {
        self.entries
            .lock()
            .expect("aggregator entry lock poisoned")
            .clear();
        *self.form.lock().expect("aggregator form lock poisoned") = None;
    }

    /// Snapshot of the currently open form, if any.
    pub fn form(&self) -> Option<DigitalForm> {
        self.form
            .lock()
            .expect("aggregator form lock poisoned")
            .clone()
    }

    /// Snapshot of one worker's entry.
    pub fn entry(&self, worker_id: &str) -> Option<DigitalFormEntry> {
        self.entries
            .lock()
            .expect("aggregator entry lock poisoned")
            .get(worker_id)
            .cloned()
    }

    /// Total output recorded for one worker.
    pub fn total_output(&self, worker_id: &str) -> Option<f64> {
        self.entry(worker_id).map(|e| e.total_output)
    }

    /// Replace the produced quantity for one slot of one worker.
    pub async fn update_hourly_data(&self, worker_id: &str, slot: &str, quantity: f64) -> bool {
        let context = "digital-form.hourly";
        let Some(mut entry) = self.entry(worker_id) else {
            return self.missing_worker(context, worker_id);
        };
        if let Err(e) = entry.set_hourly(slot, quantity) {
            self.notifier.notify(Severity::Error, context, &e.to_string());
            return false;
        }
        self.persist_and_commit(context, entry).await
    }

    /// Set a worker's attendance status.
    ///
    /// Marking a worker ABSENT deliberately does not zero their hourly
    /// data; production recorded before a partial-day absence is kept
    /// and must be cleared explicitly via [`clear_hourly_data`].
    ///
    /// [`clear_hourly_data`]: FormAggregator::clear_hourly_data
    pub async fn update_attendance_status(
        &self,
        worker_id: &str,
        status: AttendanceStatus,
    ) -> bool {
        let context = "digital-form.attendance";
        let Some(mut entry) = self.entry(worker_id) else {
            return self.missing_worker(context, worker_id);
        };
        entry.attendance_status = status;
        self.persist_and_commit(context, entry).await
    }

    /// Change which time-interval set is valid for one worker.
    ///
    /// Stale hourly slots outside the new shift are dropped only when
    /// the aggregator was built with `prune_on_shift_change`.
    pub async fn update_shift_type(&self, worker_id: &str, shift_type: ShiftType) -> bool {
        let context = "digital-form.shift";
        let Some(mut entry) = self.entry(worker_id) else {
            return self.missing_worker(context, worker_id);
        };
        entry.shift_type = shift_type;
        if self.policy.prune_on_shift_change {
            let removed = entry.prune_invalid_slots();
            if removed > 0 {
                tracing::debug!(worker_id, removed, "Pruned out-of-shift hourly slots");
            }
        }
        self.persist_and_commit(context, entry).await
    }

    /// Remove all hourly data for a worker (explicit companion action to
    /// marking them absent).
    pub async fn clear_hourly_data(&self, worker_id: &str) -> bool {
        let context = "digital-form.hourly";
        let Some(mut entry) = self.entry(worker_id) else {
            return self.missing_worker(context, worker_id);
        };
        entry.hourly_data.clear();
        entry.total_output = 0.0;
        self.persist_and_commit(context, entry).await
    }

    /// Append an issue to a worker's entry, returning its stable id once
    /// persisted.
    pub async fn add_issue(&self, worker_id: &str, issue: ProductionIssue) -> Option<Uuid> {
        let context = "digital-form.issue";
        let Some(mut entry) = self.entry(worker_id) else {
            self.missing_worker(context, worker_id);
            return None;
        };
        let issue_id = entry.add_issue(issue);
        if self.persist_and_commit(context, entry).await {
            Some(issue_id)
        } else {
            None
        }
    }

    /// Remove an issue by stable id.
    pub async fn remove_issue(&self, worker_id: &str, issue_id: Uuid) -> bool {
        let context = "digital-form.issue";
        let Some(mut entry) = self.entry(worker_id) else {
            return self.missing_worker(context, worker_id);
        };
        if !entry.remove_issue(issue_id) {
            self.notifier.notify(
                Severity::Warning,
                context,
                &format!("Issue {issue_id} not found for worker {worker_id}"),
            );
            return false;
        }
        self.persist_and_commit(context, entry).await
    }

    /// Positional convenience for UI lists: resolves the index to the
    /// issue's stable id first, then removes by identity.
    pub async fn remove_issue_at(&self, worker_id: &str, index: usize) -> bool {
        let Some(issue_id) = self
            .entry(worker_id)
            .and_then(|e| e.issues.get(index).map(|i| i.id))
        else {
            self.notifier.notify(
                Severity::Warning,
                "digital-form.issue",
                &format!("No issue at index {index} for worker {worker_id}"),
            );
            return false;
        };
        self.remove_issue(worker_id, issue_id).await
    }

    /// Compute derived statistics over all entries of the open form.
    pub fn statistics(&self) -> FormStatistics {
        let entries = self.entries.lock().expect("aggregator entry lock poisoned");
        let mut stats = FormStatistics::default();
        let mut quality_sum = 0.0;
        for entry in entries.values() {
            stats.total_output += entry.total_output;
            stats.issue_count += entry.issues.len();
            quality_sum += entry.quality_score;
            match entry.attendance_status {
                AttendanceStatus::Present => stats.present += 1,
                AttendanceStatus::Absent => stats.absent += 1,
                AttendanceStatus::Late => stats.late += 1,
                AttendanceStatus::EarlyLeave => stats.early_leave += 1,
                AttendanceStatus::LeaveApproved => stats.leave_approved += 1,
            }
        }
        if !entries.is_empty() {
            stats.average_quality = Some(quality_sum / entries.len() as f64);
        }
        stats
    }

    fn missing_worker(&self, context: &str, worker_id: &str) -> bool {
        self.notifier.notify(
            Severity::Error,
            context,
            &format!("No entry for worker {worker_id} on the open form"),
        );
        false
    }

    /// Persist the mutated entry, committing it locally only after the
    /// remote call resolves.
    async fn persist_and_commit(&self, context: &str, entry: DigitalFormEntry) -> bool {
        match self.store.save_entry(&entry).await {
            Ok(()) => {
                self.entries
                    .lock()
                    .expect("aggregator entry lock poisoned")
                    .insert(entry.worker_id.clone(), entry);
                true
            }
            Err(e) => {
                tracing::warn!(
                    worker_id = %entry.worker_id,
                    context,
                    error = %e,
                    "Entry persistence failed, local state unchanged"
                );
                self.notifier.notify(Severity::Error, context, &e.to_string());
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use lineops_core::feedback::NoopNotifier;
    use lineops_core::form::FormStatus;
    use lineops_core::issue::IssueType;

    use super::*;

    /// Store mock that records saves and can be switched to fail.
    #[derive(Default)]
    struct MockStore {
        saves: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl EntryStore for MockStore {
        async fn save_entry(&self, _entry: &DigitalFormEntry) -> Result<(), WorkflowError> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(WorkflowError::Backend("entry save failed".into()))
            } else {
                Ok(())
            }
        }
    }

    fn form(shift: ShiftType) -> DigitalForm {
        DigitalForm {
            id: "f1".into(),
            form_code: "DF-001".into(),
            form_name: "Line 1 daily".into(),
            date: chrono::NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            shift_type: shift,
            line_id: "l1".into(),
            status: FormStatus::Draft,
            created_by_id: None,
            updated_by_id: None,
            submit_time: None,
            approval_request_id: None,
            is_exported: false,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    fn open_aggregator(store: MockStore, workers: &[&str]) -> (Arc<MockStore>, FormAggregator) {
        open_with_policy(store, workers, AggregatorPolicy::default())
    }

    fn open_with_policy(
        store: MockStore,
        workers: &[&str],
        policy: AggregatorPolicy,
    ) -> (Arc<MockStore>, FormAggregator) {
        let store = Arc::new(store);
        let aggregator =
            FormAggregator::with_policy(store.clone(), Arc::new(NoopNotifier), policy);
        let entries = workers
            .iter()
            .enumerate()
            .map(|(i, w)| DigitalFormEntry::new(format!("e{i}"), "f1", *w, ShiftType::Regular))
            .collect();
        aggregator.open_form(form(ShiftType::Regular), entries);
        (store, aggregator)
    }

    #[tokio::test]
    async fn total_output_tracks_hourly_updates() {
        let (_, aggregator) = open_aggregator(MockStore::default(), &["w1"]);

        assert!(aggregator.update_hourly_data("w1", "07:30-08:30", 25.0).await);
        assert!(aggregator.update_hourly_data("w1", "08:30-09:30", 15.0).await);
        assert_eq!(aggregator.total_output("w1"), Some(40.0));

        // Replacement, not accumulation.
        assert!(aggregator.update_hourly_data("w1", "08:30-09:30", 5.0).await);
        let entry = aggregator.entry("w1").unwrap();
        assert_eq!(entry.total_output, entry.hourly_sum());
        assert_eq!(entry.total_output, 30.0);
    }

    #[tokio::test]
    async fn invalid_quantity_is_rejected_without_store_call() {
        let (store, aggregator) = open_aggregator(MockStore::default(), &["w1"]);

        assert!(!aggregator.update_hourly_data("w1", "07:30-08:30", -3.0).await);
        assert!(!aggregator.update_hourly_data("w1", "07:30-08:30", f64::NAN).await);
        assert_eq!(store.saves.load(Ordering::SeqCst), 0);
        assert_eq!(aggregator.total_output("w1"), Some(0.0));
    }

    #[tokio::test]
    async fn slot_outside_shift_is_rejected() {
        let (store, aggregator) = open_aggregator(MockStore::default(), &["w1"]);
        assert!(!aggregator.update_hourly_data("w1", "19:30-20:30", 10.0).await);
        assert_eq!(store.saves.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_save_leaves_local_state_untouched() {
        let (store, aggregator) = open_aggregator(
            MockStore {
                fail: true,
                ..MockStore::default()
            },
            &["w1"],
        );

        assert!(!aggregator.update_hourly_data("w1", "07:30-08:30", 25.0).await);
        assert_eq!(store.saves.load(Ordering::SeqCst), 1);
        assert_eq!(aggregator.total_output("w1"), Some(0.0));
        assert!(aggregator.entry("w1").unwrap().hourly_data.is_empty());
    }

    #[tokio::test]
    async fn absent_status_preserves_hourly_data() {
        let (_, aggregator) = open_aggregator(MockStore::default(), &["w1"]);
        assert!(aggregator.update_hourly_data("w1", "07:30-08:30", 25.0).await);

        assert!(aggregator
            .update_attendance_status("w1", AttendanceStatus::Absent)
            .await);
        assert_eq!(aggregator.total_output("w1"), Some(25.0));

        // Clearing is the explicit separate action.
        assert!(aggregator.clear_hourly_data("w1").await);
        assert_eq!(aggregator.total_output("w1"), Some(0.0));
    }

    #[tokio::test]
    async fn shift_change_keeps_stale_slots_by_default() {
        let (_, aggregator) = open_aggregator(MockStore::default(), &["w1"]);
        assert!(aggregator.update_shift_type("w1", ShiftType::Overtime).await);
        assert!(aggregator.update_hourly_data("w1", "19:30-20:30", 12.0).await);

        assert!(aggregator.update_shift_type("w1", ShiftType::Regular).await);
        let entry = aggregator.entry("w1").unwrap();
        assert_eq!(entry.hourly_data.len(), 1);
        assert_eq!(entry.total_output, 12.0);
    }

    #[tokio::test]
    async fn shift_change_prunes_under_policy() {
        let (_, aggregator) = open_with_policy(
            MockStore::default(),
            &["w1"],
            AggregatorPolicy {
                prune_on_shift_change: true,
            },
        );
        assert!(aggregator.update_shift_type("w1", ShiftType::Overtime).await);
        assert!(aggregator.update_hourly_data("w1", "19:30-20:30", 12.0).await);
        assert!(aggregator.update_hourly_data("w1", "07:30-08:30", 20.0).await);

        assert!(aggregator.update_shift_type("w1", ShiftType::Regular).await);
        let entry = aggregator.entry("w1").unwrap();
        assert_eq!(entry.hourly_data.len(), 1);
        assert_eq!(entry.total_output, 20.0);
    }

    #[tokio::test]
    async fn add_then_remove_issue_leaves_list_empty() {
        let (_, aggregator) = open_aggregator(MockStore::default(), &["w1"]);

        let issue = ProductionIssue::new(IssueType::Late, 8, 10.0, None).unwrap();
        let issue_id = aggregator.add_issue("w1", issue).await.unwrap();

        assert!(aggregator.remove_issue_at("w1", 0).await);
        assert!(aggregator.entry("w1").unwrap().issues.is_empty());

        // Identity-based removal of a gone issue is a clean failure.
        assert!(!aggregator.remove_issue("w1", issue_id).await);
    }

    #[tokio::test]
    async fn remove_issue_survives_index_shifts() {
        let (_, aggregator) = open_aggregator(MockStore::default(), &["w1"]);

        let first = aggregator
            .add_issue(
                "w1",
                ProductionIssue::new(IssueType::WaitingMaterials, 9, 30.0, None).unwrap(),
            )
            .await
            .unwrap();
        let second = aggregator
            .add_issue(
                "w1",
                ProductionIssue::new(IssueType::QualityIssues, 10, 5.0, None).unwrap(),
            )
            .await
            .unwrap();

        // Removing the first shifts positions; the second's id still works.
        assert!(aggregator.remove_issue("w1", first).await);
        assert!(aggregator.remove_issue("w1", second).await);
        assert!(aggregator.entry("w1").unwrap().issues.is_empty());
    }

    #[tokio::test]
    async fn statistics_aggregate_across_workers() {
        let (_, aggregator) = open_aggregator(MockStore::default(), &["w1", "w2", "w3"]);
        assert!(aggregator.update_hourly_data("w1", "07:30-08:30", 25.0).await);
        assert!(aggregator.update_hourly_data("w2", "07:30-08:30", 15.0).await);
        assert!(aggregator
            .update_attendance_status("w3", AttendanceStatus::Absent)
            .await);
        aggregator
            .add_issue(
                "w3",
                ProductionIssue::new(IssueType::Absent, 7, 100.0, None).unwrap(),
            )
            .await
            .unwrap();

        let stats = aggregator.statistics();
        assert_eq!(stats.total_output, 40.0);
        assert_eq!(stats.present, 2);
        assert_eq!(stats.absent, 1);
        assert_eq!(stats.issue_count, 1);
        assert_eq!(stats.average_quality, Some(100.0));
    }

    #[tokio::test]
    async fn unknown_worker_is_rejected() {
        let (store, aggregator) = open_aggregator(MockStore::default(), &["w1"]);
        assert!(!aggregator.update_hourly_data("w9", "07:30-08:30", 1.0).await);
        assert_eq!(store.saves.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn close_form_discards_state() {
        let (_, aggregator) = open_aggregator(MockStore::default(), &["w1"]);
        assert!(aggregator.update_hourly_data("w1", "07:30-08:30", 25.0).await);
        assert_eq!(aggregator.form().map(|f| f.id), Some("f1".to_string()));
        aggregator.close_form();
        assert!(aggregator.form().is_none());
        assert!(aggregator.entry("w1").is_none());
        assert_eq!(aggregator.statistics(), FormStatistics::default());
    }
}
