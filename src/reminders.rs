//! One-shot reminder timers.
//!
//! Each armed reminder owns a tokio task that sleeps until the trigger time
//! and then publishes a [`ReminderFired`] event. Armed handles are indexed by
//! reminder id so deleting a reminder also cancels its timer. Reminders whose
//! time has passed are kept but never armed, including at startup.

use crate::ledger::{TaskLedger, fresh_id};
use crate::models::Reminder;
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use tokio::{sync::broadcast, task::JoinHandle, time::sleep};
use tracing::{debug, info};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub struct ReminderFired {
    pub reminder: Reminder,
    pub fired_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct ReminderScheduler {
    reminders: Vec<Reminder>,
    armed: HashMap<String, JoinHandle<()>>,
    events: broadcast::Sender<ReminderFired>,
}

impl ReminderScheduler {
    pub fn new(reminders: Vec<Reminder>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            reminders,
            armed: HashMap::new(),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReminderFired> {
        self.events.subscribe()
    }

    pub fn reminders(&self) -> &[Reminder] {
        &self.reminders
    }

    pub fn reminders_for(&self, task_id: Option<&str>) -> Vec<Reminder> {
        self.reminders
            .iter()
            .filter(|reminder| task_id.is_none_or(|id| reminder.task_id == id))
            .cloned()
            .collect()
    }

    /// Creates and arms a reminder for an existing task. The task's current
    /// title is copied onto the reminder.
    pub fn add_reminder(
        &mut self,
        ledger: &TaskLedger,
        task_id: &str,
        time: DateTime<Utc>,
        message: String,
    ) -> Option<Reminder> {
        let task = ledger.task(task_id)?;
        let id = fresh_id(Utc::now(), |candidate| {
            self.reminders.iter().any(|reminder| reminder.id == candidate)
        });

        let reminder = Reminder {
            id,
            task_id: task.id.clone(),
            task_title: task.title.clone(),
            time,
            message,
        };

        self.reminders.push(reminder.clone());
        self.schedule(&reminder);
        Some(reminder)
    }

    pub fn schedule(&mut self, reminder: &Reminder) -> bool {
        self.schedule_at(reminder, Utc::now())
    }

    /// Arms a timer when the trigger time is still ahead of `now`.
    pub fn schedule_at(&mut self, reminder: &Reminder, now: DateTime<Utc>) -> bool {
        let delay = reminder.time - now;
        if delay <= TimeDelta::zero() {
            debug!(reminder_id = %reminder.id, "reminder already due, not armed");
            return false;
        }
        let Ok(delay) = delay.to_std() else {
            return false;
        };

        let events = self.events.clone();
        let fired = reminder.clone();
        let handle = tokio::spawn(async move {
            sleep(delay).await;
            info!(reminder_id = %fired.id, task_id = %fired.task_id, "reminder fired");
            // No subscribers is not an error.
            let _ = events.send(ReminderFired {
                reminder: fired,
                fired_at: Utc::now(),
            });
        });

        self.armed.retain(|_, handle| !handle.is_finished());
        if let Some(previous) = self.armed.insert(reminder.id.clone(), handle) {
            previous.abort();
        }
        true
    }

    /// Drops every armed timer and re-arms the reminders still in the future.
    pub fn initialize(&mut self) -> usize {
        self.cleanup();
        let now = Utc::now();
        let upcoming: Vec<Reminder> = self
            .reminders
            .iter()
            .filter(|reminder| reminder.time > now)
            .cloned()
            .collect();

        let armed = upcoming
            .iter()
            .filter(|reminder| self.schedule_at(reminder, now))
            .count();
        info!(armed, stored = self.reminders.len(), "reminders initialized");
        armed
    }

    pub fn delete_reminder(&mut self, id: &str) -> Option<Reminder> {
        let index = self.reminders.iter().position(|reminder| reminder.id == id)?;
        if let Some(handle) = self.armed.remove(id) {
            handle.abort();
        }
        Some(self.reminders.remove(index))
    }

    pub fn armed_count(&self) -> usize {
        self.armed
            .values()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    pub fn cleanup(&mut self) {
        for (_, handle) in self.armed.drain() {
            handle.abort();
        }
    }
}

impl Drop for ReminderScheduler {
    fn drop(&mut self) {
        self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskInput;
    use std::time::Duration;
    use tokio::time::timeout;

    fn ledger() -> (TaskLedger, String) {
        let mut ledger = TaskLedger::new();
        let task = ledger.add_task(TaskInput {
            title: Some("Meditate".into()),
            ..TaskInput::default()
        });
        (ledger, task.id)
    }

    #[tokio::test]
    async fn unknown_task_is_rejected() {
        let (ledger, _) = ledger();
        let mut scheduler = ReminderScheduler::new(Vec::new());
        let added = scheduler.add_reminder(&ledger, "missing", Utc::now(), "hi".into());
        assert!(added.is_none());
        assert!(scheduler.reminders().is_empty());
    }

    #[tokio::test]
    async fn near_reminder_fires_exactly_once() {
        let (ledger, task_id) = ledger();
        let mut scheduler = ReminderScheduler::new(Vec::new());
        let mut events = scheduler.subscribe();

        let time = Utc::now() + TimeDelta::milliseconds(5);
        let reminder = scheduler
            .add_reminder(&ledger, &task_id, time, "stretch".into())
            .unwrap();
        assert_eq!(reminder.task_title.as_deref(), Some("Meditate"));

        let fired = timeout(Duration::from_secs(1), events.recv())
            .await
            .expect("reminder did not fire")
            .unwrap();
        assert_eq!(fired.reminder, reminder);

        assert!(
            timeout(Duration::from_millis(100), events.recv())
                .await
                .is_err()
        );
        assert_eq!(scheduler.reminders().len(), 1);
    }

    #[tokio::test]
    async fn past_reminder_is_stored_but_never_fires() {
        let (ledger, task_id) = ledger();
        let mut scheduler = ReminderScheduler::new(Vec::new());
        let mut events = scheduler.subscribe();

        let time = Utc::now() - TimeDelta::seconds(1);
        scheduler
            .add_reminder(&ledger, &task_id, time, "late".into())
            .unwrap();

        assert_eq!(scheduler.armed_count(), 0);
        assert_eq!(scheduler.reminders().len(), 1);
        assert!(
            timeout(Duration::from_millis(50), events.recv())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn deleting_cancels_armed_timer() {
        let (ledger, task_id) = ledger();
        let mut scheduler = ReminderScheduler::new(Vec::new());
        let mut events = scheduler.subscribe();

        let time = Utc::now() + TimeDelta::milliseconds(40);
        let reminder = scheduler
            .add_reminder(&ledger, &task_id, time, "drink water".into())
            .unwrap();
        assert_eq!(scheduler.armed_count(), 1);

        let removed = scheduler.delete_reminder(&reminder.id).unwrap();
        assert_eq!(removed.id, reminder.id);
        assert_eq!(scheduler.armed_count(), 0);
        assert!(
            timeout(Duration::from_millis(120), events.recv())
                .await
                .is_err()
        );
        assert!(scheduler.delete_reminder(&reminder.id).is_none());
    }

    #[tokio::test]
    async fn initialize_arms_only_future_reminders() {
        let now = Utc::now();
        let stored = vec![
            Reminder {
                id: "1".into(),
                task_id: "t".into(),
                task_title: None,
                time: now - TimeDelta::minutes(5),
                message: "gone".into(),
            },
            Reminder {
                id: "2".into(),
                task_id: "t".into(),
                task_title: Some("Old title".into()),
                time: now + TimeDelta::hours(1),
                message: "soon".into(),
            },
        ];
        let mut scheduler = ReminderScheduler::new(stored);

        assert_eq!(scheduler.initialize(), 1);
        assert_eq!(scheduler.initialize(), 1);
        assert_eq!(scheduler.armed_count(), 1);

        scheduler.cleanup();
        assert_eq!(scheduler.armed_count(), 0);
        assert_eq!(scheduler.reminders().len(), 2);
    }

    #[tokio::test]
    async fn reminders_filter_by_task() {
        let (mut ledger, first) = ledger();
        let second = ledger.add_task(TaskInput::default()).id;
        let mut scheduler = ReminderScheduler::new(Vec::new());
        let later = Utc::now() + TimeDelta::hours(2);
        scheduler.add_reminder(&ledger, &first, later, "a".into());
        scheduler.add_reminder(&ledger, &second, later, "b".into());
        scheduler.add_reminder(&ledger, &first, later, "c".into());

        assert_eq!(scheduler.reminders_for(Some(first.as_str())).len(), 2);
        assert_eq!(scheduler.reminders_for(Some(second.as_str())).len(), 1);
        assert_eq!(scheduler.reminders_for(None).len(), 3);
    }
}
