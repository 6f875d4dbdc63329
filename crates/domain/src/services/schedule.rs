//! Scheduling and status derivation.
//!
//! Pure functions over course and assignment collections. The reference
//! instant is always an argument; nothing here reads the clock, and nothing
//! here persists a derived value.

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::models::analytics::{AnalyticsSummary, DayLoad, StatusCounts};
use crate::models::assignment::{
    Assignment, AssignmentFilter, AssignmentStatus, AssignmentView, DisplayStatus,
};
use crate::models::course::{Course, DayOfWeek};

/// How long before the due time a reminder fires. Also the "due soon" window.
pub fn reminder_offset() -> Duration {
    Duration::days(1)
}

/// Monday-first weekday of `at`, in `at`'s own time zone.
pub fn day_of_week<Tz: TimeZone>(at: &DateTime<Tz>) -> DayOfWeek {
    DayOfWeek::of(at)
}

/// Courses held on `day`, earliest start first.
///
/// Time of day never excludes a course. Courses starting together keep
/// their input order.
pub fn courses_for_day(courses: &[Course], day: DayOfWeek) -> Vec<Course> {
    let mut result: Vec<Course> = courses
        .iter()
        .filter(|course| course.day_of_week == day)
        .cloned()
        .collect();
    result.sort_by_key(|course| course.start_time);
    result
}

/// Unfinished assignments that are not yet due, soonest first.
pub fn upcoming_assignments(assignments: &[Assignment], now: DateTime<Utc>) -> Vec<Assignment> {
    sorted_by_due(assignments, |a| a.due_at >= now && !a.status.is_completed())
}

/// Assignments whose stored status is exactly `status`, soonest first.
pub fn assignments_by_status(
    assignments: &[Assignment],
    status: AssignmentStatus,
) -> Vec<Assignment> {
    sorted_by_due(assignments, |a| a.status == status)
}

/// Unfinished assignments that are past due, oldest due first.
pub fn overdue_assignments(assignments: &[Assignment], now: DateTime<Utc>) -> Vec<Assignment> {
    sorted_by_due(assignments, |a| derive_status(a, now) == DisplayStatus::Overdue)
}

/// Status to display at `now`.
///
/// Completed always shows as completed. Otherwise an assignment whose due
/// time has passed shows as overdue.
pub fn derive_status(assignment: &Assignment, now: DateTime<Utc>) -> DisplayStatus {
    match assignment.status {
        AssignmentStatus::Completed => DisplayStatus::Completed,
        _ if assignment.due_at < now => DisplayStatus::Overdue,
        stored => stored.into(),
    }
}

/// Explicit user-driven status change. Any stored status may move to any other.
pub fn promote_status(
    assignment: &Assignment,
    new_status: AssignmentStatus,
    now: DateTime<Utc>,
) -> Assignment {
    Assignment {
        status: new_status,
        updated_at: now,
        ..assignment.clone()
    }
}

/// Reminder time for an assignment due at `due`: one day earlier when
/// enabled. The result may already be in the past.
pub fn reminder_timestamp(due: DateTime<Utc>, enabled: bool) -> Option<DateTime<Utc>> {
    enabled.then(|| due - reminder_offset())
}

/// Returns true if the assignment is unfinished and due within the next day.
pub fn is_due_soon(assignment: &Assignment, now: DateTime<Utc>) -> bool {
    !assignment.status.is_completed()
        && assignment.due_at >= now
        && assignment.due_at < now + reminder_offset()
}

/// Assignments for which [`is_due_soon`] holds, soonest first.
pub fn due_soon_assignments(assignments: &[Assignment], now: DateTime<Utc>) -> Vec<Assignment> {
    sorted_by_due(assignments, |a| is_due_soon(a, now))
}

/// Assignments whose reminder should have fired by `now` and still matter:
/// reminder enabled and reached, not completed, not yet due.
pub fn reminders_due(assignments: &[Assignment], now: DateTime<Utc>) -> Vec<Assignment> {
    sorted_by_due(assignments, |a| {
        a.reminder_enabled
            && a.reminder_at.is_some_and(|at| at <= now)
            && !a.status.is_completed()
            && a.due_at >= now
    })
}

/// The course in session at `at` (local weekday and time of day), if any.
pub fn current_course<Tz: TimeZone>(courses: &[Course], at: &DateTime<Tz>) -> Option<Course> {
    let time = at.time();
    courses_for_day(courses, day_of_week(at))
        .into_iter()
        .find(|course| course.is_in_session(time))
}

/// The next course starting later on the same local day as `at`.
pub fn next_course<Tz: TimeZone>(courses: &[Course], at: &DateTime<Tz>) -> Option<Course> {
    let time = at.time();
    courses_for_day(courses, day_of_week(at))
        .into_iter()
        .find(|course| course.start_time > time)
}

/// Applies a list filter.
pub fn filter_assignments(
    assignments: &[Assignment],
    filter: AssignmentFilter,
    now: DateTime<Utc>,
) -> Vec<Assignment> {
    match filter {
        AssignmentFilter::Upcoming => upcoming_assignments(assignments, now),
        AssignmentFilter::Status(status) => assignments_by_status(assignments, status),
        AssignmentFilter::Overdue => overdue_assignments(assignments, now),
    }
}

/// Pairs each assignment with its display status at `now`, keeping order.
pub fn with_display_status(assignments: Vec<Assignment>, now: DateTime<Utc>) -> Vec<AssignmentView> {
    assignments
        .into_iter()
        .map(|assignment| AssignmentView::at(assignment, now))
        .collect()
}

/// Workload snapshot at `now`.
pub fn summarize(
    courses: &[Course],
    assignments: &[Assignment],
    now: DateTime<Utc>,
) -> AnalyticsSummary {
    let courses_per_day = DayOfWeek::ALL
        .into_iter()
        .map(|day| DayLoad {
            day_of_week: day,
            courses: courses.iter().filter(|c| c.day_of_week == day).count(),
        })
        .collect();

    let mut counts = StatusCounts::default();
    for assignment in assignments {
        match derive_status(assignment, now) {
            DisplayStatus::NotStarted => counts.not_started += 1,
            DisplayStatus::InProgress => counts.in_progress += 1,
            DisplayStatus::Completed => counts.completed += 1,
            DisplayStatus::Overdue => counts.overdue += 1,
        }
    }

    let completion_rate = match counts.total() {
        0 => 0.0,
        total => counts.completed as f64 / total as f64,
    };

    AnalyticsSummary {
        generated_at: now,
        total_courses: courses.len(),
        courses_per_day,
        assignments: counts,
        due_soon: assignments.iter().filter(|a| is_due_soon(a, now)).count(),
        completion_rate,
    }
}

fn sorted_by_due<F>(assignments: &[Assignment], keep: F) -> Vec<Assignment>
where
    F: Fn(&Assignment) -> bool,
{
    let mut result: Vec<Assignment> = assignments.iter().filter(|a| keep(a)).cloned().collect();
    result.sort_by_key(|a| a.due_at);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::assignment::{AssignmentType, Priority};
    use chrono::{FixedOffset, NaiveTime};
    use fake::faker::lorem::en::Sentence;
    use fake::{Fake, Faker};
    use uuid::Uuid;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn course(name: &str, day: DayOfWeek, start: NaiveTime, end: NaiveTime) -> Course {
        let now = at(2024, 1, 1, 0, 0);
        Course {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            name: name.to_string(),
            day_of_week: day,
            start_time: start,
            end_time: end,
            location: None,
            teacher: None,
            color: "#4CAF50".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn assignment(title: &str, due_at: DateTime<Utc>, status: AssignmentStatus) -> Assignment {
        let created = due_at - Duration::days(7);
        Assignment {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            course_id: None,
            title: title.to_string(),
            description: None,
            assignment_type: AssignmentType::Homework,
            due_at,
            priority: Priority::Medium,
            status,
            reminder_enabled: false,
            reminder_at: None,
            created_at: created,
            updated_at: created,
        }
    }

    fn titles(assignments: &[Assignment]) -> Vec<&str> {
        assignments.iter().map(|a| a.title.as_str()).collect()
    }

    #[test]
    fn test_day_of_week_across_full_week() {
        // 2024-01-01 was a Monday.
        let expected = [
            DayOfWeek::Monday,
            DayOfWeek::Tuesday,
            DayOfWeek::Wednesday,
            DayOfWeek::Thursday,
            DayOfWeek::Friday,
            DayOfWeek::Saturday,
            DayOfWeek::Sunday,
        ];
        for (offset, want) in expected.iter().enumerate() {
            for hour in [0, 12, 23] {
                let instant = at(2024, 1, 1 + offset as u32, hour, 59);
                let day = day_of_week(&instant);
                assert_eq!(day, *want, "{}", instant);
                assert_eq!(day.number(), offset as i16 + 1);
            }
        }
    }

    #[test]
    fn test_day_of_week_cycles_and_stays_in_range() {
        let start = at(2023, 12, 25, 6, 0);
        for step in 0..60 {
            let instant = start + Duration::days(step);
            let day = day_of_week(&instant).number();
            assert!((1..=7).contains(&day));
            assert_eq!(day, day_of_week(&(instant + Duration::days(7))).number());
            assert_eq!(day % 7 + 1, day_of_week(&(instant + Duration::days(1))).number());
        }
    }

    #[test]
    fn test_day_of_week_uses_local_zone() {
        // Sunday 23:30 UTC is already Monday morning in UTC+8.
        let utc = at(2024, 1, 7, 23, 30);
        let shanghai = FixedOffset::east_opt(8 * 3600).unwrap();
        assert_eq!(day_of_week(&utc), DayOfWeek::Sunday);
        assert_eq!(day_of_week(&utc.with_timezone(&shanghai)), DayOfWeek::Monday);
    }

    #[test]
    fn test_courses_for_day_scenario() {
        let late = course("Late", DayOfWeek::Wednesday, time(10, 0), time(11, 40));
        let early = course("Early", DayOfWeek::Wednesday, time(8, 0), time(9, 40));
        let friday = course("Friday", DayOfWeek::Friday, time(14, 0), time(15, 40));
        let courses = vec![late, early, friday];

        let wednesday = courses_for_day(&courses, DayOfWeek::Wednesday);
        let names: Vec<&str> = wednesday.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Early", "Late"]);

        let fri = courses_for_day(&courses, DayOfWeek::Friday);
        assert_eq!(fri.len(), 1);
        assert_eq!(fri[0].name, "Friday");

        assert!(courses_for_day(&courses, DayOfWeek::Monday).is_empty());
    }

    #[test]
    fn test_courses_for_day_ties_keep_input_order() {
        let courses = vec![
            course("A", DayOfWeek::Tuesday, time(9, 0), time(10, 0)),
            course("B", DayOfWeek::Tuesday, time(9, 0), time(11, 0)),
            course("C", DayOfWeek::Tuesday, time(8, 0), time(9, 0)),
        ];
        let names: Vec<String> = courses_for_day(&courses, DayOfWeek::Tuesday)
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["C", "A", "B"]);
    }

    #[test]
    fn test_courses_for_day_generated() {
        let days = DayOfWeek::ALL;
        let courses: Vec<Course> = (0..40)
            .map(|_| {
                let day = days[(0..7usize).fake::<usize>()];
                let start_hour: u32 = (7..20).fake();
                let name: String = Sentence(1..3).fake();
                course(&name, day, time(start_hour, 0), time(start_hour + 1, 30))
            })
            .collect();

        for day in DayOfWeek::ALL {
            let result = courses_for_day(&courses, day);
            assert!(result.iter().all(|c| c.day_of_week == day));
            assert!(result.windows(2).all(|w| w[0].start_time <= w[1].start_time));
            assert_eq!(
                result.len(),
                courses.iter().filter(|c| c.day_of_week == day).count()
            );
        }
    }

    #[test]
    fn test_upcoming_excludes_completed_and_past_due() {
        let now = at(2024, 1, 5, 12, 0);
        let assignments = vec![
            assignment("later", now + Duration::days(3), AssignmentStatus::NotStarted),
            assignment("done", now + Duration::days(1), AssignmentStatus::Completed),
            assignment("missed", now - Duration::hours(1), AssignmentStatus::InProgress),
            assignment("soon", now + Duration::hours(2), AssignmentStatus::InProgress),
            assignment("exactly now", now, AssignmentStatus::NotStarted),
        ];

        let upcoming = upcoming_assignments(&assignments, now);
        assert_eq!(titles(&upcoming), vec!["exactly now", "soon", "later"]);
    }

    #[test]
    fn test_upcoming_generated_invariants() {
        let now = at(2024, 3, 1, 8, 0);
        let statuses = [
            AssignmentStatus::NotStarted,
            AssignmentStatus::InProgress,
            AssignmentStatus::Completed,
        ];
        let assignments: Vec<Assignment> = (0..50)
            .map(|_| {
                let hours: i64 = (-96..96).fake();
                let status = statuses[(0..3usize).fake::<usize>()];
                let title: String = Sentence(2..4).fake();
                let mut a = assignment(&title, now + Duration::hours(hours), status);
                a.reminder_enabled = Faker.fake();
                a
            })
            .collect();

        let upcoming = upcoming_assignments(&assignments, now);
        assert!(upcoming.iter().all(|a| a.due_at >= now));
        assert!(upcoming.iter().all(|a| !a.status.is_completed()));
        assert!(upcoming.windows(2).all(|w| w[0].due_at <= w[1].due_at));

        let overdue = overdue_assignments(&assignments, now);
        let completed = assignments_by_status(&assignments, AssignmentStatus::Completed);
        let unfinished_total = assignments.len() - completed.len();
        assert_eq!(upcoming.len() + overdue.len(), unfinished_total);
    }

    #[test]
    fn test_assignments_by_status_orders_by_due() {
        let base = at(2024, 2, 1, 0, 0);
        let assignments = vec![
            assignment("third", base + Duration::days(3), AssignmentStatus::InProgress),
            assignment("other", base, AssignmentStatus::NotStarted),
            assignment("first", base - Duration::days(2), AssignmentStatus::InProgress),
            assignment("second", base + Duration::days(1), AssignmentStatus::InProgress),
        ];

        let result = assignments_by_status(&assignments, AssignmentStatus::InProgress);
        assert_eq!(titles(&result), vec!["first", "second", "third"]);
        assert!(assignments_by_status(&assignments, AssignmentStatus::Completed).is_empty());
    }

    #[test]
    fn test_derive_status() {
        let now = at(2024, 1, 10, 9, 0);
        let past = now - Duration::minutes(1);
        let future = now + Duration::minutes(1);

        assert_eq!(
            derive_status(&assignment("a", past, AssignmentStatus::InProgress), now),
            DisplayStatus::Overdue
        );
        assert_eq!(
            derive_status(&assignment("b", past, AssignmentStatus::NotStarted), now),
            DisplayStatus::Overdue
        );
        assert_eq!(
            derive_status(&assignment("c", past, AssignmentStatus::Completed), now),
            DisplayStatus::Completed
        );
        assert_eq!(
            derive_status(&assignment("d", future, AssignmentStatus::InProgress), now),
            DisplayStatus::InProgress
        );
        assert_eq!(
            derive_status(&assignment("e", now, AssignmentStatus::NotStarted), now),
            DisplayStatus::NotStarted
        );
    }

    #[test]
    fn test_derive_status_does_not_mutate() {
        let now = at(2024, 1, 10, 9, 0);
        let a = assignment("a", now - Duration::days(1), AssignmentStatus::InProgress);
        let before = a.clone();
        let _ = derive_status(&a, now);
        assert_eq!(a, before);
    }

    #[test]
    fn test_promote_status_any_direction() {
        let now = at(2024, 1, 10, 9, 0);
        let statuses = [
            AssignmentStatus::NotStarted,
            AssignmentStatus::InProgress,
            AssignmentStatus::Completed,
        ];
        for from in statuses {
            for to in statuses {
                let a = assignment("x", now + Duration::days(1), from);
                let promoted = promote_status(&a, to, now);
                assert_eq!(promoted.status, to);
                assert_eq!(promoted.updated_at, now);
                assert_eq!(promoted.id, a.id);
                assert_eq!(promoted.due_at, a.due_at);
            }
        }
    }

    #[test]
    fn test_completion_freezes_derived_status() {
        let now = at(2024, 1, 10, 9, 0);
        let overdue = assignment("late", now - Duration::days(2), AssignmentStatus::InProgress);
        assert_eq!(derive_status(&overdue, now), DisplayStatus::Overdue);

        let completed = promote_status(&overdue, AssignmentStatus::Completed, now);
        assert_eq!(derive_status(&completed, now), DisplayStatus::Completed);

        let reopened = promote_status(&completed, AssignmentStatus::InProgress, now);
        assert_eq!(derive_status(&reopened, now), DisplayStatus::Overdue);
    }

    #[test]
    fn test_reminder_timestamp_scenario() {
        let due = at(2024, 1, 10, 0, 0);
        assert_eq!(reminder_timestamp(due, true), Some(at(2024, 1, 9, 0, 0)));
        assert_eq!(reminder_timestamp(due, false), None);
    }

    #[test]
    fn test_reminder_timestamp_may_be_in_past() {
        let now = at(2024, 1, 10, 0, 0);
        let due = now + Duration::hours(3);
        let reminder = reminder_timestamp(due, true).unwrap();
        assert_eq!(reminder, due - Duration::days(1));
        assert!(reminder < now);
    }

    #[test]
    fn test_due_soon_window() {
        let now = at(2024, 1, 10, 0, 0);
        let inside = assignment("inside", now + Duration::hours(23), AssignmentStatus::NotStarted);
        let edge = assignment("edge", now + Duration::days(1), AssignmentStatus::NotStarted);
        let past = assignment("past", now - Duration::hours(1), AssignmentStatus::NotStarted);
        let done = assignment("done", now + Duration::hours(1), AssignmentStatus::Completed);

        assert!(is_due_soon(&inside, now));
        assert!(!is_due_soon(&edge, now));
        assert!(!is_due_soon(&past, now));
        assert!(!is_due_soon(&done, now));

        let all = vec![edge, done, inside, past];
        assert_eq!(titles(&due_soon_assignments(&all, now)), vec!["inside"]);
    }

    #[test]
    fn test_reminders_due() {
        let now = at(2024, 1, 10, 12, 0);
        let mut fire = assignment("fire", now + Duration::hours(6), AssignmentStatus::NotStarted);
        fire.reminder_enabled = true;
        fire.reminder_at = reminder_timestamp(fire.due_at, true);

        let mut not_yet = assignment("not yet", now + Duration::days(3), AssignmentStatus::NotStarted);
        not_yet.reminder_enabled = true;
        not_yet.reminder_at = reminder_timestamp(not_yet.due_at, true);

        let mut finished = fire.clone();
        finished.title = "finished".to_string();
        finished.status = AssignmentStatus::Completed;

        let mut disabled = fire.clone();
        disabled.title = "disabled".to_string();
        disabled.reminder_enabled = false;
        disabled.reminder_at = None;

        let mut expired = assignment("expired", now - Duration::hours(1), AssignmentStatus::InProgress);
        expired.reminder_enabled = true;
        expired.reminder_at = reminder_timestamp(expired.due_at, true);

        let all = vec![not_yet, finished, disabled, expired, fire];
        assert_eq!(titles(&reminders_due(&all, now)), vec!["fire"]);
    }

    #[test]
    fn test_current_and_next_course() {
        let courses = vec![
            course("Morning", DayOfWeek::Wednesday, time(8, 0), time(9, 40)),
            course("Noon", DayOfWeek::Wednesday, time(10, 0), time(11, 40)),
            course("Afternoon", DayOfWeek::Wednesday, time(14, 0), time(15, 40)),
            course("Thursday", DayOfWeek::Thursday, time(8, 0), time(9, 40)),
        ];
        // 2024-01-03 was a Wednesday.
        let during = at(2024, 1, 3, 8, 30);
        assert_eq!(current_course(&courses, &during).unwrap().name, "Morning");
        assert_eq!(next_course(&courses, &during).unwrap().name, "Noon");

        let between = at(2024, 1, 3, 12, 0);
        assert!(current_course(&courses, &between).is_none());
        assert_eq!(next_course(&courses, &between).unwrap().name, "Afternoon");

        let evening = at(2024, 1, 3, 18, 0);
        assert!(current_course(&courses, &evening).is_none());
        assert!(next_course(&courses, &evening).is_none());
    }

    #[test]
    fn test_current_course_uses_local_time() {
        let courses = vec![course("Morning", DayOfWeek::Thursday, time(8, 0), time(9, 40))];
        // 2024-01-04 00:30 UTC is Thursday 08:30 in UTC+8.
        let utc = at(2024, 1, 4, 0, 30);
        let local = utc.with_timezone(&FixedOffset::east_opt(8 * 3600).unwrap());
        assert!(current_course(&courses, &utc).is_none());
        assert_eq!(current_course(&courses, &local).unwrap().name, "Morning");
    }

    #[test]
    fn test_filter_assignments_dispatch() {
        let now = at(2024, 1, 10, 0, 0);
        let assignments = vec![
            assignment("future", now + Duration::days(1), AssignmentStatus::NotStarted),
            assignment("late", now - Duration::days(1), AssignmentStatus::InProgress),
            assignment("done", now - Duration::days(1), AssignmentStatus::Completed),
        ];

        assert_eq!(
            titles(&filter_assignments(&assignments, AssignmentFilter::Upcoming, now)),
            vec!["future"]
        );
        assert_eq!(
            titles(&filter_assignments(&assignments, AssignmentFilter::Overdue, now)),
            vec!["late"]
        );
        assert_eq!(
            titles(&filter_assignments(
                &assignments,
                AssignmentFilter::Status(AssignmentStatus::Completed),
                now
            )),
            vec!["done"]
        );
        // The stored-status filter does not hide overdue items.
        assert_eq!(
            titles(&filter_assignments(
                &assignments,
                AssignmentFilter::Status(AssignmentStatus::InProgress),
                now
            )),
            vec!["late"]
        );
    }

    #[test]
    fn test_with_display_status_keeps_order() {
        let now = at(2024, 1, 10, 0, 0);
        let views = with_display_status(
            vec![
                assignment("b", now + Duration::days(1), AssignmentStatus::NotStarted),
                assignment("a", now - Duration::days(1), AssignmentStatus::NotStarted),
            ],
            now,
        );
        assert_eq!(views[0].assignment.title, "b");
        assert_eq!(views[0].display_status, DisplayStatus::NotStarted);
        assert_eq!(views[1].display_status, DisplayStatus::Overdue);
    }

    #[test]
    fn test_summarize() {
        let now = at(2024, 1, 10, 0, 0);
        let courses = vec![
            course("A", DayOfWeek::Monday, time(8, 0), time(9, 0)),
            course("B", DayOfWeek::Monday, time(10, 0), time(11, 0)),
            course("C", DayOfWeek::Friday, time(8, 0), time(9, 0)),
        ];
        let assignments = vec![
            assignment("soon", now + Duration::hours(5), AssignmentStatus::NotStarted),
            assignment("later", now + Duration::days(4), AssignmentStatus::InProgress),
            assignment("late", now - Duration::days(1), AssignmentStatus::NotStarted),
            assignment("done", now - Duration::days(1), AssignmentStatus::Completed),
        ];

        let summary = summarize(&courses, &assignments, now);
        assert_eq!(summary.total_courses, 3);
        assert_eq!(summary.courses_per_day.len(), 7);
        assert_eq!(summary.courses_per_day[0].courses, 2);
        assert_eq!(summary.courses_per_day[4].courses, 1);
        assert_eq!(summary.courses_per_day[6].day_of_week, DayOfWeek::Sunday);
        assert_eq!(
            summary.assignments,
            StatusCounts {
                not_started: 1,
                in_progress: 1,
                completed: 1,
                overdue: 1,
            }
        );
        assert_eq!(summary.due_soon, 1);
        assert!((summary.completion_rate - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_summarize_empty() {
        let summary = summarize(&[], &[], at(2024, 1, 1, 0, 0));
        assert_eq!(summary.total_courses, 0);
        assert_eq!(summary.assignments.total(), 0);
        assert_eq!(summary.completion_rate, 0.0);
    }
}
