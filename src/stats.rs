use crate::models::{
    DAYS_PER_WEEK, DayStats, DayStatus, PredictionStats, StatusTotals, Task, TaskStats,
};
use chrono::{DateTime, Datelike, Days, Duration, Local, TimeZone};

const CONSISTENCY_WINDOW: usize = 10;
const MAX_LEVEL_BONUS: u32 = 25;
const MAX_CONSISTENCY_BONUS: f64 = 15.0;

/// Most recent Sunday at the same wall-clock time as `now`, stepping back
/// by calendar days so DST changes do not move the anchor off Sunday.
pub fn week_start<Tz: TimeZone>(now: DateTime<Tz>) -> DateTime<Tz> {
    let offset = now.weekday().num_days_from_sunday();
    match now.clone().checked_sub_days(Days::new(u64::from(offset))) {
        Some(start) => start,
        // Wall-clock time skipped or repeated on that Sunday.
        None => now - Duration::days(i64::from(offset)),
    }
}

pub fn build_stats(tasks: &[Task]) -> TaskStats {
    build_stats_at(Local::now(), tasks)
}

pub fn build_stats_at(now: DateTime<Local>, tasks: &[Task]) -> TaskStats {
    let start = week_start(now).date_naive();

    let mut weekly: Vec<DayStats> = (0..DAYS_PER_WEEK)
        .map(|offset| DayStats {
            date: start + Duration::days(offset as i64),
            ..DayStats::default()
        })
        .collect();

    for task in tasks {
        for (day, entry) in weekly.iter_mut().zip(task.weekly_status.iter()) {
            match entry.status {
                DayStatus::Complete => day.completed += 1,
                DayStatus::Failed => day.failed += 1,
                DayStatus::Break => day.breaks += 1,
                DayStatus::None => {}
            }
        }
    }

    let total = weekly.iter().fold(StatusTotals::default(), |acc, day| StatusTotals {
        completed: acc.completed + day.completed,
        failed: acc.failed + day.failed,
        breaks: acc.breaks + day.breaks,
    });

    TaskStats { weekly, total }
}

pub fn build_prediction(tasks: &[Task], level: u32, stats: &TaskStats) -> Option<PredictionStats> {
    if tasks.is_empty() {
        return None;
    }

    let completed = f64::from(stats.total.completed);
    let decided = completed + f64::from(stats.total.failed);
    let success_rate = if decided == 0.0 {
        0.0
    } else {
        completed / decided * 100.0
    };

    let level_bonus = level.saturating_mul(5).min(MAX_LEVEL_BONUS);
    let consistency_bonus = consistency_bonus(tasks);
    let adjusted =
        (success_rate + f64::from(level_bonus) + f64::from(consistency_bonus)).min(100.0);

    Some(PredictionStats {
        overall_success_rate: success_rate.round() as u32,
        level_bonus,
        consistency_bonus,
        adjusted_success_rate: adjusted.round() as u32,
    })
}

/// Share of completions among the last ten decided entries, walked task by
/// task and day by day (not chronologically), worth up to 15 points.
pub fn consistency_bonus(tasks: &[Task]) -> u32 {
    let decided: Vec<DayStatus> = tasks
        .iter()
        .flat_map(|task| task.weekly_status.iter().map(|entry| entry.status))
        .filter(|status| status.is_set())
        .collect();

    let recent = &decided[decided.len().saturating_sub(CONSISTENCY_WINDOW)..];
    if recent.is_empty() {
        return 0;
    }

    let completed = recent
        .iter()
        .filter(|status| **status == DayStatus::Complete)
        .count();
    let rate = completed as f64 / recent.len() as f64 * 100.0;

    (rate * 0.15).min(MAX_CONSISTENCY_BONUS).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DayEntry;
    use chrono::{NaiveDate, Utc, Weekday};

    fn task_with(statuses: &[DayStatus]) -> Task {
        let now = Utc::now();
        let weekly_status = std::array::from_fn(|i| DayEntry {
            date: now + Duration::days(i as i64),
            status: statuses.get(i).copied().unwrap_or_default(),
            enabled: true,
        });
        Task {
            id: format!("t{}", statuses.len()),
            title: Some("Read".into()),
            task_type: None,
            priority: None,
            due_date: None,
            weekly_status,
            created_at: now,
            updated_at: None,
        }
    }

    fn wednesday() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 1, 7, 15, 30, 0).unwrap()
    }

    #[test]
    fn week_start_rolls_back_to_sunday() {
        let start = week_start(wednesday());
        assert_eq!(start.weekday(), Weekday::Sun);
        assert_eq!(start.date_naive(), NaiveDate::from_ymd_opt(2026, 1, 4).unwrap());
    }

    #[test]
    fn week_start_on_sunday_is_same_day() {
        let sunday = Local.with_ymd_and_hms(2026, 1, 4, 9, 0, 0).unwrap();
        assert_eq!(week_start(sunday), sunday);
    }

    #[test]
    fn stats_count_each_day_slot() {
        use DayStatus::*;
        let tasks = vec![
            task_with(&[Complete, Failed, Break]),
            task_with(&[Complete, Complete, None, Failed]),
        ];

        let stats = build_stats_at(wednesday(), &tasks);
        assert_eq!(stats.weekly.len(), 7);
        assert_eq!(stats.weekly[0].completed, 2);
        assert_eq!(stats.weekly[1].completed, 1);
        assert_eq!(stats.weekly[1].failed, 1);
        assert_eq!(stats.weekly[2].breaks, 1);
        assert_eq!(stats.weekly[3].failed, 1);
        assert_eq!(
            stats.total,
            StatusTotals {
                completed: 3,
                failed: 2,
                breaks: 1
            }
        );
        assert_eq!(
            stats.weekly[0].date,
            NaiveDate::from_ymd_opt(2026, 1, 4).unwrap()
        );
    }

    #[test]
    fn prediction_is_none_without_tasks() {
        let stats = build_stats_at(wednesday(), &[]);
        assert!(build_prediction(&[], 3, &stats).is_none());
    }

    #[test]
    fn prediction_success_rate_from_totals() {
        use DayStatus::*;
        let tasks = vec![
            task_with(&[Complete, Complete, Complete, Complete, Failed]),
            task_with(&[Complete, Complete, Complete, Complete, Failed]),
        ];
        let stats = build_stats_at(wednesday(), &tasks);

        let prediction = build_prediction(&tasks, 2, &stats).unwrap();
        assert_eq!(prediction.overall_success_rate, 80);
        assert_eq!(prediction.level_bonus, 10);
        assert_eq!(prediction.consistency_bonus, 12);
        assert_eq!(prediction.adjusted_success_rate, 100);
    }

    #[test]
    fn prediction_with_only_breaks_has_zero_success() {
        let tasks = vec![task_with(&[DayStatus::Break])];
        let stats = build_stats_at(wednesday(), &tasks);

        let prediction = build_prediction(&tasks, 0, &stats).unwrap();
        assert_eq!(prediction.overall_success_rate, 0);
        assert_eq!(prediction.consistency_bonus, 0);
        assert_eq!(prediction.adjusted_success_rate, 0);
    }

    #[test]
    fn level_bonus_caps_at_25() {
        let tasks = vec![task_with(&[])];
        let stats = build_stats_at(wednesday(), &tasks);
        assert_eq!(build_prediction(&tasks, 40, &stats).unwrap().level_bonus, 25);
    }

    #[test]
    fn consistency_uses_last_ten_decided_entries() {
        use DayStatus::*;
        // Two of the first task's failures fall outside the window.
        let tasks = vec![
            task_with(&[Failed, Failed, Failed, Complete, Complete, Complete, Complete]),
            task_with(&[Complete, Complete, Complete, Complete, None, Break, None]),
        ];
        // Window is [F, C, C, C, C, C, C, C, C, B].
        assert_eq!(consistency_bonus(&tasks), 12);
        assert_eq!(consistency_bonus(&[task_with(&[])]), 0);
        assert_eq!(consistency_bonus(&[task_with(&[Complete])]), 15);
    }
}
