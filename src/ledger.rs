//! In-memory task ledger: the task collection, each task's weekly status
//! grid and the points/level counters.
//!
//! The ledger never touches storage or rendering. Callers decide how to
//! persist a mutation (see [`crate::state::SaveTier`]) and re-read state
//! after every call.
//!
//! Level policy: `update_day_status` moves the level by one step per
//! completion or failure, while `delete_task` reconciles it to
//! `points / 100`. Both rules are kept as the canonical contract; the
//! reconciliation on delete discards whatever the incremental steps produced.

use crate::models::{
    DAYS_PER_WEEK, DayEntry, DayStatus, LevelInfo, PredictionStats, Task, TaskData, TaskInput,
    TaskStats, TaskUpdate,
};
use crate::stats::{build_prediction, build_stats, consistency_bonus, week_start};
use chrono::{DateTime, Days, Duration, Local, Utc};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

const STATS_TTL: std::time::Duration = std::time::Duration::from_millis(1000);
const POINTS_PER_LEVEL: u32 = 100;

#[derive(Debug)]
struct CachedStats {
    computed_at: Instant,
    stats: Arc<TaskStats>,
}

#[derive(Debug, Default)]
pub struct TaskLedger {
    tasks: Vec<Task>,
    level: u32,
    points: u32,
    stats_cache: Option<CachedStats>,
}

impl TaskLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_data(data: TaskData) -> Self {
        Self {
            tasks: data.tasks,
            level: data.level,
            points: data.points,
            stats_cache: None,
        }
    }

    pub fn snapshot(&self) -> TaskData {
        TaskData {
            tasks: self.tasks.clone(),
            level: self.level,
            points: self.points,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn level(&self) -> LevelInfo {
        LevelInfo {
            level: self.level,
            points: self.points,
        }
    }

    pub fn add_task(&mut self, input: TaskInput) -> Task {
        self.add_task_at(Local::now(), input)
    }

    /// Fields are stored as given; nothing is validated.
    pub fn add_task_at(&mut self, now: DateTime<Local>, input: TaskInput) -> Task {
        let created_at = now.with_timezone(&Utc);
        let id = fresh_id(created_at, |candidate| self.task(candidate).is_some());

        let task = Task {
            id,
            title: input.title,
            task_type: input.task_type,
            priority: input.priority,
            due_date: input.due_date,
            weekly_status: week_grid(week_start(now)),
            created_at,
            updated_at: None,
        };

        info!(task_id = %task.id, "task added");
        self.tasks.push(task.clone());
        self.invalidate_stats();
        task
    }

    pub fn update_task(&mut self, id: &str, update: TaskUpdate) -> Option<Task> {
        let task = self.tasks.iter_mut().find(|task| task.id == id)?;

        if let Some(title) = update.title {
            task.title = Some(title);
        }
        if let Some(task_type) = update.task_type {
            task.task_type = Some(task_type);
        }
        if let Some(priority) = update.priority {
            task.priority = Some(priority);
        }
        if let Some(due_date) = update.due_date {
            task.due_date = Some(due_date);
        }
        task.updated_at = Some(Utc::now());

        Some(task.clone())
    }

    /// Sets one day of a task's week and settles the score.
    ///
    /// Choosing the status a day already holds clears it: the previous
    /// status is reversed and nothing is applied, so the net effect is the
    /// reversal delta alone. Moving between two set statuses reverses the
    /// old one and applies the new one in the same call.
    pub fn update_day_status(
        &mut self,
        task_id: &str,
        day: usize,
        status: DayStatus,
    ) -> Option<Task> {
        let task = self.tasks.iter_mut().find(|task| task.id == task_id)?;
        let entry = task.weekly_status.get_mut(day)?;

        let previous = entry.status;
        let applied = if previous == status {
            DayStatus::None
        } else {
            status
        };
        entry.status = applied;
        let updated = task.clone();

        if previous.is_set() {
            self.apply_delta(-previous.points(), -previous.level_delta());
        }
        if applied.is_set() {
            self.apply_delta(applied.points(), applied.level_delta());
        }

        debug!(
            task_id,
            day,
            ?previous,
            ?applied,
            points = self.points,
            level = self.level,
            "day status updated"
        );
        self.invalidate_stats();
        Some(updated)
    }

    /// Removes a task, refunding its week's score and recomputing the level
    /// from the remaining points.
    pub fn delete_task(&mut self, id: &str) -> Option<Task> {
        let index = self.tasks.iter().position(|task| task.id == id)?;

        let refund: i64 = self.tasks[index]
            .weekly_status
            .iter()
            .map(|entry| -entry.status.points())
            .sum();
        self.add_points(refund);
        self.level = self.points / POINTS_PER_LEVEL;

        let task = self.tasks.remove(index);
        info!(task_id = %task.id, refund, level = self.level, "task deleted");
        self.invalidate_stats();
        Some(task)
    }

    pub fn start_new_week(&mut self) -> &[Task] {
        self.start_new_week_at(Local::now())
    }

    /// Replaces every task's grid with an empty one for the current week.
    /// Points and level are left alone.
    pub fn start_new_week_at(&mut self, now: DateTime<Local>) -> &[Task] {
        let anchor = week_start(now);
        for task in &mut self.tasks {
            task.weekly_status = week_grid(anchor);
        }

        info!(tasks = self.tasks.len(), "new week started");
        self.invalidate_stats();
        &self.tasks
    }

    pub fn task_stats(&mut self) -> Arc<TaskStats> {
        self.task_stats_at(Instant::now())
    }

    pub fn task_stats_at(&mut self, now: Instant) -> Arc<TaskStats> {
        if let Some(cached) = &self.stats_cache {
            if now.saturating_duration_since(cached.computed_at) < STATS_TTL {
                return Arc::clone(&cached.stats);
            }
        }

        let stats = Arc::new(build_stats(&self.tasks));
        self.stats_cache = Some(CachedStats {
            computed_at: now,
            stats: Arc::clone(&stats),
        });
        stats
    }

    pub fn prediction_stats(&mut self) -> Option<PredictionStats> {
        let stats = self.task_stats();
        build_prediction(&self.tasks, self.level, &stats)
    }

    pub fn consistency_bonus(&self) -> u32 {
        consistency_bonus(&self.tasks)
    }

    fn apply_delta(&mut self, points: i64, level: i64) {
        self.add_points(points);
        self.level = clamp_to_u32(i64::from(self.level) + level);
    }

    fn add_points(&mut self, delta: i64) {
        self.points = clamp_to_u32(i64::from(self.points) + delta);
    }

    fn invalidate_stats(&mut self) {
        self.stats_cache = None;
    }
}

fn clamp_to_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

fn week_grid(anchor: DateTime<Local>) -> [DayEntry; DAYS_PER_WEEK] {
    std::array::from_fn(|offset| {
        let day = anchor
            .checked_add_days(Days::new(offset as u64))
            .unwrap_or(anchor + Duration::days(offset as i64));
        DayEntry {
            date: day.with_timezone(&Utc),
            status: DayStatus::None,
            enabled: true,
        }
    })
}

/// Millisecond timestamp id, bumped until it is not `taken`.
pub(crate) fn fresh_id(now: DateTime<Utc>, taken: impl Fn(&str) -> bool) -> String {
    let mut stamp = now.timestamp_millis();
    loop {
        let candidate = stamp.to_string();
        if !taken(&candidate) {
            return candidate;
        }
        stamp += 1;
    }
}
