//! Aggregate progress derivation.
//!
//! Pure functions over task snapshots, re-run after every queue
//! mutation. No I/O and no state beyond the snapshots themselves.

use prephub_protocol::constants::DEFAULT_WAITING_SIZE;
use prephub_protocol::{QueueCounts, QueueSnapshot, TaskSnapshot, TaskState};

/// Derives the aggregate queue view from the current task snapshots.
pub fn aggregate(tasks: Vec<TaskSnapshot>) -> QueueSnapshot {
    let counts = count_states(&tasks);
    let average_throughput = average_throughput(&tasks);
    let estimated_remaining_secs = estimated_remaining_secs(&tasks, average_throughput);
    QueueSnapshot {
        overall_progress: overall_progress(&tasks),
        average_throughput,
        estimated_remaining_secs,
        counts,
        tasks,
    }
}

fn count_states(tasks: &[TaskSnapshot]) -> QueueCounts {
    let mut counts = QueueCounts {
        total: tasks.len(),
        ..Default::default()
    };
    for task in tasks {
        match task.state {
            TaskState::Waiting => counts.waiting += 1,
            TaskState::Active => counts.active += 1,
            TaskState::Succeeded => counts.succeeded += 1,
            TaskState::Failed => counts.failed += 1,
        }
    }
    counts
}

/// Rounded mean contribution: 100 per succeeded task, current percent
/// per active task, 0 otherwise. Capped at 99 while any task is not yet
/// succeeded, so 100 means exactly "everything done".
fn overall_progress(tasks: &[TaskSnapshot]) -> u8 {
    if tasks.is_empty() {
        return 0;
    }
    let sum: u64 = tasks
        .iter()
        .map(|t| match t.state {
            TaskState::Succeeded => 100u64,
            TaskState::Active => u64::from(t.progress_percent),
            TaskState::Waiting | TaskState::Failed => 0,
        })
        .sum();
    let rounded = (sum as f64 / tasks.len() as f64).round() as u8;
    let all_succeeded = tasks.iter().all(|t| t.state == TaskState::Succeeded);
    if all_succeeded { 100 } else { rounded.min(99) }
}

/// Mean throughput over active tasks only, in bytes/second.
fn average_throughput(tasks: &[TaskSnapshot]) -> f64 {
    let active: Vec<f64> = tasks
        .iter()
        .filter(|t| t.state == TaskState::Active)
        .map(|t| t.throughput_estimate)
        .collect();
    if active.is_empty() {
        return 0.0;
    }
    active.iter().sum::<f64>() / active.len() as f64
}

/// Remaining seconds: bytes still to move over waiting and active
/// tasks, divided by the average throughput. 0 when throughput is
/// unknown.
fn estimated_remaining_secs(tasks: &[TaskSnapshot], average_throughput: f64) -> f64 {
    if average_throughput <= 0.0 {
        return 0.0;
    }
    let remaining: f64 = tasks
        .iter()
        .map(|t| match t.state {
            TaskState::Active => {
                t.declared_size as f64 * f64::from(100 - t.progress_percent.min(100)) / 100.0
            }
            TaskState::Waiting => {
                if t.declared_size > 0 {
                    t.declared_size as f64
                } else {
                    DEFAULT_WAITING_SIZE as f64
                }
            }
            TaskState::Succeeded | TaskState::Failed => 0.0,
        })
        .sum();
    remaining / average_throughput
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn task(state: TaskState, percent: u8, size: i64, throughput: f64) -> TaskSnapshot {
        TaskSnapshot {
            id: uuid::Uuid::new_v4().to_string(),
            display_name: "photo.jpg".into(),
            declared_size: size,
            state,
            progress_percent: percent,
            throughput_estimate: throughput,
            retry_count: 0,
            max_retries: 3,
            retryable: false,
            result_location: String::new(),
            last_error: String::new(),
            error_class: None,
            submitted_at: Utc::now(),
        }
    }

    #[test]
    fn empty_queue_aggregates_to_zero() {
        let snap = aggregate(Vec::new());
        assert_eq!(snap.overall_progress, 0);
        assert_eq!(snap.average_throughput, 0.0);
        assert_eq!(snap.estimated_remaining_secs, 0.0);
        assert_eq!(snap.counts.total, 0);
    }

    #[test]
    fn overall_progress_mixes_states() {
        // succeeded=100, active=50, waiting=0, failed=0 → mean 37.5 → 38.
        let snap = aggregate(vec![
            task(TaskState::Succeeded, 100, 1000, 0.0),
            task(TaskState::Active, 50, 1000, 500.0),
            task(TaskState::Waiting, 0, 1000, 0.0),
            task(TaskState::Failed, 80, 1000, 0.0),
        ]);
        assert_eq!(snap.overall_progress, 38);
        assert_eq!(snap.counts.waiting, 1);
        assert_eq!(snap.counts.active, 1);
        assert_eq!(snap.counts.succeeded, 1);
        assert_eq!(snap.counts.failed, 1);
        assert_eq!(snap.counts.total, 4);
    }

    #[test]
    fn overall_progress_is_100_only_when_all_succeeded() {
        // Mean of [100, 99] rounds to 100, but one task is still active.
        let snap = aggregate(vec![
            task(TaskState::Succeeded, 100, 1000, 0.0),
            task(TaskState::Active, 99, 1000, 500.0),
        ]);
        assert_eq!(snap.overall_progress, 99);

        let done = aggregate(vec![
            task(TaskState::Succeeded, 100, 1000, 0.0),
            task(TaskState::Succeeded, 100, 1000, 0.0),
        ]);
        assert_eq!(done.overall_progress, 100);
    }

    #[test]
    fn throughput_averages_active_only() {
        let snap = aggregate(vec![
            task(TaskState::Active, 10, 1000, 400.0),
            task(TaskState::Active, 20, 1000, 600.0),
            task(TaskState::Succeeded, 100, 1000, 0.0),
            task(TaskState::Waiting, 0, 1000, 0.0),
        ]);
        assert_eq!(snap.average_throughput, 500.0);
    }

    #[test]
    fn eta_sums_waiting_and_active_remainders() {
        // Active: 1000 bytes at 50% → 500 remaining.
        // Waiting: 1500 declared.
        // Throughput: 1000 B/s → 2 seconds.
        let snap = aggregate(vec![
            task(TaskState::Active, 50, 1000, 1000.0),
            task(TaskState::Waiting, 0, 1500, 0.0),
        ]);
        assert!((snap.estimated_remaining_secs - 2.0).abs() < 1e-9);
    }

    #[test]
    fn eta_uses_default_size_for_unknown_waiting() {
        let snap = aggregate(vec![
            task(TaskState::Active, 100, 1000, DEFAULT_WAITING_SIZE as f64),
            task(TaskState::Waiting, 0, 0, 0.0),
        ]);
        // Fully-progressed active contributes 0; waiting falls back to
        // the default size → exactly 1 second at this throughput.
        assert!((snap.estimated_remaining_secs - 1.0).abs() < 1e-9);
    }

    #[test]
    fn eta_clamps_to_zero_without_throughput() {
        let snap = aggregate(vec![task(TaskState::Waiting, 0, 5000, 0.0)]);
        assert_eq!(snap.estimated_remaining_secs, 0.0);
    }
}
