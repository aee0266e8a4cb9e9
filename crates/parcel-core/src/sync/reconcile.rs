//! Snapshot diffing.

use std::collections::HashMap;

use crate::models::{sort_checkpoints, Checkpoint, NotificationIntent, TrackingId, TrackingRecord};

/// Outcome of diffing a remote snapshot against the cached one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// One intent per new or changed active record, in remote order
    pub notifications: Vec<NotificationIntent>,
    /// Every remote record, archived ones included, with sorted checkpoints
    pub records: Vec<TrackingRecord>,
    pub new_records: usize,
    pub updated_records: usize,
}

/// Diff `remote` against `local`.
///
/// Only non-archived records on both sides take part in change detection.
/// A record is new when its id is not among the active local records, and
/// updated when its latest checkpoint differs from the cached latest
/// checkpoint in any field. Records without checkpoints never notify.
#[must_use]
pub fn reconcile(remote: Vec<TrackingRecord>, local: &[TrackingRecord]) -> Reconciliation {
    let cached_latest: HashMap<TrackingId, Option<&Checkpoint>> = local
        .iter()
        .filter(|record| !record.archived)
        .map(|record| (record.id, record.latest_checkpoint()))
        .collect();

    let mut reconciliation = Reconciliation::default();

    for record in remote.iter().filter(|record| !record.archived) {
        let latest = record.latest_checkpoint();
        match cached_latest.get(&record.id) {
            None => {
                reconciliation.new_records += 1;
                if let Some(checkpoint) = latest {
                    reconciliation
                        .notifications
                        .push(NotificationIntent::for_checkpoint(record, checkpoint));
                }
            }
            Some(cached) => {
                let Some(checkpoint) = latest else {
                    continue;
                };
                if *cached != Some(checkpoint) {
                    reconciliation.updated_records += 1;
                    reconciliation
                        .notifications
                        .push(NotificationIntent::for_checkpoint(record, checkpoint));
                }
            }
        }
    }

    reconciliation.records = remote
        .into_iter()
        .map(|mut record| {
            sort_checkpoints(&mut record.checkpoints);
            record
        })
        .collect();

    tracing::debug!(
        remote = reconciliation.records.len(),
        cached = local.len(),
        new = reconciliation.new_records,
        updated = reconciliation.updated_records,
        "Reconciled tracking snapshot"
    );

    reconciliation
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn checkpoint(time: &str, status: &str) -> Checkpoint {
        Checkpoint {
            time: time.to_string(),
            status_code: status.to_string(),
            status_name: status.to_string(),
            ..Checkpoint::default()
        }
    }

    fn record(id: i64, checkpoints: Vec<Checkpoint>) -> TrackingRecord {
        TrackingRecord {
            checkpoints,
            ..TrackingRecord::new(id, format!("LP{id:04}"))
        }
    }

    fn archived(id: i64, checkpoints: Vec<Checkpoint>) -> TrackingRecord {
        TrackingRecord {
            archived: true,
            ..record(id, checkpoints)
        }
    }

    fn notified_ids(reconciliation: &Reconciliation) -> Vec<i64> {
        reconciliation
            .notifications
            .iter()
            .map(|intent| intent.record_id.get())
            .collect()
    }

    #[test]
    fn new_records_notify_once_unless_empty() {
        let local = vec![record(1, vec![checkpoint("2024-01-01 10:00:00", "in_transit")])];
        let remote = vec![
            record(2, vec![checkpoint("2024-01-01 10:00:00", "accepted")]),
            record(3, vec![]),
            record(
                4,
                vec![
                    checkpoint("2024-01-01 10:00:00", "accepted"),
                    checkpoint("2024-01-02 10:00:00", "in_transit"),
                ],
            ),
        ];

        let result = reconcile(remote, &local);

        assert_eq!(notified_ids(&result), vec![2, 4]);
        assert_eq!(result.notifications[1].status_text, "in_transit");
        assert_eq!(result.new_records, 3);
        assert_eq!(result.updated_records, 0);
        assert_eq!(result.records.len(), 3);
    }

    #[test]
    fn unchanged_snapshot_is_idempotent() {
        let snapshot = vec![
            record(1, vec![checkpoint("2024-01-01 10:00:00", "in_transit")]),
            record(2, vec![]),
        ];

        let first = reconcile(snapshot.clone(), &[]);
        let second = reconcile(snapshot, &first.records);

        assert!(second.notifications.is_empty());
        assert_eq!(second.new_records, 0);
        assert_eq!(second.updated_records, 0);
        assert_eq!(second.records, first.records);
    }

    #[test]
    fn status_name_change_alone_counts_as_update() {
        let local = vec![record(7, vec![checkpoint("2024-01-01 10:00:00", "In transit")])];
        let mut renamed = checkpoint("2024-01-01 10:00:00", "In transit");
        renamed.status_name = "Handed to courier".to_string();
        let remote = vec![record(7, vec![renamed])];

        let result = reconcile(remote, &local);

        assert_eq!(notified_ids(&result), vec![7]);
        assert_eq!(result.notifications[0].status_text, "Handed to courier");
        assert_eq!(result.updated_records, 1);
    }

    #[test]
    fn archived_records_are_persisted_but_never_notified() {
        let local = vec![archived(1, vec![checkpoint("2024-01-01 10:00:00", "in_transit")])];
        let remote = vec![
            archived(1, vec![checkpoint("2024-01-02 10:00:00", "delivered")]),
            archived(2, vec![checkpoint("2024-01-02 10:00:00", "delivered")]),
        ];

        let result = reconcile(remote, &local);

        assert!(result.notifications.is_empty());
        assert_eq!(result.records.len(), 2);
        assert!(result.records.iter().all(|record| record.archived));
    }

    #[test]
    fn unarchived_record_is_treated_as_new() {
        let local = vec![archived(5, vec![checkpoint("2024-01-01 10:00:00", "delivered")])];
        let remote = vec![record(5, vec![checkpoint("2024-01-01 10:00:00", "delivered")])];

        let result = reconcile(remote, &local);

        assert_eq!(notified_ids(&result), vec![5]);
        assert_eq!(result.new_records, 1);
    }

    #[test]
    fn record_losing_its_checkpoints_does_not_notify() {
        let local = vec![record(3, vec![checkpoint("2024-01-01 10:00:00", "in_transit")])];
        let result = reconcile(vec![record(3, vec![])], &local);

        assert!(result.notifications.is_empty());
        assert_eq!(result.updated_records, 0);
        assert!(result.records[0].checkpoints.is_empty());
    }

    #[test]
    fn checkpoints_are_sorted_with_unparseable_first() {
        let remote = vec![record(
            1,
            vec![
                checkpoint("2024-01-03 10:00:00", "t3"),
                checkpoint("2024-01-01 10:00:00", "t1"),
                checkpoint("2024-01-02 10:00:00", "t2"),
                checkpoint("yesterday-ish", "bad"),
            ],
        )];

        let result = reconcile(remote, &[]);

        let statuses: Vec<&str> = result.records[0]
            .checkpoints
            .iter()
            .map(|checkpoint| checkpoint.status_code.as_str())
            .collect();
        assert_eq!(statuses, vec!["bad", "t1", "t2", "t3"]);
        assert_eq!(result.notifications[0].status_text, "t3");
    }

    #[test]
    fn delivery_on_next_day_notifies_once() {
        let local = vec![record(1, vec![checkpoint("2024-05-01 10:00:00", "in_transit")])];
        let remote = vec![record(
            1,
            vec![
                checkpoint("2024-05-01 10:00:00", "in_transit"),
                checkpoint("2024-05-02 09:30:00", "delivered"),
            ],
        )];

        let result = reconcile(remote, &local);

        assert_eq!(result.notifications.len(), 1);
        assert_eq!(result.notifications[0].record_id, TrackingId::new(1));
        assert_eq!(result.notifications[0].status_text, "delivered");
    }

    #[test]
    fn notifications_follow_remote_order() {
        let remote = vec![
            record(9, vec![checkpoint("2024-01-01 10:00:00", "a")]),
            record(2, vec![checkpoint("2024-01-01 10:00:00", "b")]),
            record(5, vec![checkpoint("2024-01-01 10:00:00", "c")]),
        ];

        let result = reconcile(remote, &[]);

        assert_eq!(notified_ids(&result), vec![9, 2, 5]);
    }
}
