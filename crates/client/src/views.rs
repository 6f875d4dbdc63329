//! View-state holders.
//!
//! A holder owns a refresh task that re-queries its gateway whenever the
//! gateway announces a change that concerns the holder's user or the
//! selection changes, and publishes the result on a `watch` channel.
//! Dropping the holder aborts the task.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use domain::models::{
    AssignmentFilter, AssignmentView, Course, DayOfWeek, StudyGroupSummary, UserContext,
};
use domain::services::gateway::{
    AssignmentGateway, ChangeEvent, ChangeFeed, CourseGateway, GatewayError, StudyGroupGateway,
};
use domain::services::schedule;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// What woke the refresh loop.
enum Wake {
    Refresh,
    Stop,
}

/// Waits for the next reason to refresh: a selection change, or a change
/// event that concerns `ctx` and matches `relevant`.
async fn next_wake<S>(
    selection: &mut watch::Receiver<S>,
    changes: &mut broadcast::Receiver<ChangeEvent>,
    ctx: &UserContext,
    relevant: fn(&ChangeEvent) -> bool,
) -> Wake {
    loop {
        tokio::select! {
            changed = selection.changed() => {
                return match changed {
                    Ok(()) => Wake::Refresh,
                    Err(_) => Wake::Stop,
                };
            }
            event = changes.recv() => match event {
                Ok(event) if event.concerns(ctx) && relevant(&event) => return Wake::Refresh,
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Change feed lagged, refreshing");
                    return Wake::Refresh;
                }
                Err(broadcast::error::RecvError::Closed) => return Wake::Stop,
            },
        }
    }
}

fn is_course_change(event: &ChangeEvent) -> bool {
    matches!(event, ChangeEvent::Courses { .. })
}

fn is_assignment_change(event: &ChangeEvent) -> bool {
    matches!(event, ChangeEvent::Assignments { .. })
}

fn is_group_change(event: &ChangeEvent) -> bool {
    matches!(event, ChangeEvent::Groups { .. })
}

/// Courses of the selected weekday, earliest first.
pub struct CourseScheduleView {
    day: watch::Sender<DayOfWeek>,
    courses: watch::Receiver<Vec<Course>>,
    task: JoinHandle<()>,
}

impl CourseScheduleView {
    /// Starts with the weekday of `now` in `now`'s own time zone.
    pub fn new<Tz: TimeZone>(
        gateway: Arc<dyn CourseGateway>,
        ctx: UserContext,
        now: &DateTime<Tz>,
    ) -> Self {
        Self::for_day(gateway, ctx, schedule::day_of_week(now))
    }

    pub fn for_day(gateway: Arc<dyn CourseGateway>, ctx: UserContext, day: DayOfWeek) -> Self {
        let (day_tx, mut day_rx) = watch::channel(day);
        let (courses_tx, courses) = watch::channel(Vec::new());
        let mut changes = gateway.subscribe();

        let task = tokio::spawn(async move {
            loop {
                let day = *day_rx.borrow_and_update();
                match gateway.courses_by_day(&ctx, day).await {
                    Ok(list) => {
                        courses_tx.send_replace(list);
                    }
                    Err(e) => warn_refresh_failed("course_schedule", &e),
                }

                match next_wake(&mut day_rx, &mut changes, &ctx, is_course_change).await {
                    Wake::Refresh => continue,
                    Wake::Stop => break,
                }
            }
        });

        Self {
            day: day_tx,
            courses,
            task,
        }
    }

    pub fn select_day(&self, day: DayOfWeek) {
        self.day.send_replace(day);
    }

    pub fn selected_day(&self) -> DayOfWeek {
        *self.day.borrow()
    }

    /// Receiver of the published list.
    pub fn courses(&self) -> watch::Receiver<Vec<Course>> {
        self.courses.clone()
    }

    /// Latest published list.
    pub fn snapshot(&self) -> Vec<Course> {
        self.courses.borrow().clone()
    }
}

impl Drop for CourseScheduleView {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Assignments through the selected filter, paired with their display status.
pub struct AssignmentListView {
    filter: watch::Sender<AssignmentFilter>,
    assignments: watch::Receiver<Vec<AssignmentView>>,
    task: JoinHandle<()>,
}

impl AssignmentListView {
    /// Starts with the upcoming filter.
    pub fn new(gateway: Arc<dyn AssignmentGateway>, ctx: UserContext) -> Self {
        Self::with_filter(gateway, ctx, AssignmentFilter::default())
    }

    pub fn with_filter(
        gateway: Arc<dyn AssignmentGateway>,
        ctx: UserContext,
        filter: AssignmentFilter,
    ) -> Self {
        let (filter_tx, mut filter_rx) = watch::channel(filter);
        let (assignments_tx, assignments) = watch::channel(Vec::new());
        let mut changes = gateway.subscribe();

        let task = tokio::spawn(async move {
            loop {
                let filter = *filter_rx.borrow_and_update();
                match load_assignments(gateway.as_ref(), &ctx, filter, Utc::now()).await {
                    Ok(list) => {
                        assignments_tx.send_replace(list);
                    }
                    Err(e) => warn_refresh_failed("assignment_list", &e),
                }

                match next_wake(&mut filter_rx, &mut changes, &ctx, is_assignment_change).await {
                    Wake::Refresh => continue,
                    Wake::Stop => break,
                }
            }
        });

        Self {
            filter: filter_tx,
            assignments,
            task,
        }
    }

    pub fn select_filter(&self, filter: AssignmentFilter) {
        self.filter.send_replace(filter);
    }

    pub fn selected_filter(&self) -> AssignmentFilter {
        *self.filter.borrow()
    }

    /// Receiver of the published list.
    pub fn assignments(&self) -> watch::Receiver<Vec<AssignmentView>> {
        self.assignments.clone()
    }

    /// Latest published list.
    pub fn snapshot(&self) -> Vec<AssignmentView> {
        self.assignments.borrow().clone()
    }
}

impl Drop for AssignmentListView {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Study groups the user can see, newest first.
///
/// Groups are shared, and a remote gateway only announces this device's own
/// changes; [`reload`](Self::reload) picks up everyone else's.
pub struct StudyGroupListView {
    reload: watch::Sender<()>,
    groups: watch::Receiver<Vec<StudyGroupSummary>>,
    task: JoinHandle<()>,
}

impl StudyGroupListView {
    pub fn new(gateway: Arc<dyn StudyGroupGateway>, ctx: UserContext) -> Self {
        let (reload_tx, mut reload_rx) = watch::channel(());
        let (groups_tx, groups) = watch::channel(Vec::new());
        let mut changes = gateway.subscribe();

        let task = tokio::spawn(async move {
            loop {
                let _ = reload_rx.borrow_and_update();
                match gateway.list_groups(&ctx).await {
                    Ok(list) => {
                        groups_tx.send_replace(list);
                    }
                    Err(e) => warn_refresh_failed("study_group_list", &e),
                }

                match next_wake(&mut reload_rx, &mut changes, &ctx, is_group_change).await {
                    Wake::Refresh => continue,
                    Wake::Stop => break,
                }
            }
        });

        Self {
            reload: reload_tx,
            groups,
            task,
        }
    }

    /// Re-queries the gateway now.
    pub fn reload(&self) {
        self.reload.send_replace(());
    }

    /// Receiver of the published list.
    pub fn groups(&self) -> watch::Receiver<Vec<StudyGroupSummary>> {
        self.groups.clone()
    }

    /// Latest published list.
    pub fn snapshot(&self) -> Vec<StudyGroupSummary> {
        self.groups.borrow().clone()
    }
}

impl Drop for StudyGroupListView {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn load_assignments(
    gateway: &dyn AssignmentGateway,
    ctx: &UserContext,
    filter: AssignmentFilter,
    now: DateTime<Utc>,
) -> Result<Vec<AssignmentView>, GatewayError> {
    let assignments = match filter {
        AssignmentFilter::Status(status) => gateway.assignments_by_status(ctx, status).await?,
        AssignmentFilter::Upcoming | AssignmentFilter::Overdue => {
            schedule::filter_assignments(&gateway.list_assignments(ctx).await?, filter, now)
        }
    };
    Ok(schedule::with_display_status(assignments, now))
}

fn warn_refresh_failed(view: &'static str, error: &GatewayError) {
    warn!(view, error = %error, "Refresh failed, keeping previous list");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::LocalStore;
    use async_trait::async_trait;
    use chrono::{Duration, FixedOffset, NaiveTime};
    use domain::models::assignment::{
        Assignment, AssignmentStatus, CreateAssignmentRequest, UpdateAssignmentRequest,
    };
    use domain::models::course::CreateCourseRequest;
    use domain::models::study_group::{
        CreateStudyGroupRequest, GroupMember, GroupMessage, PostMessageRequest,
        UpdateStudyGroupRequest,
    };
    use domain::models::{AssignmentType, DisplayStatus, GroupRole, Priority};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration as StdDuration;
    use uuid::Uuid;

    fn course_request(name: &str, day: DayOfWeek, hour: u32) -> CreateCourseRequest {
        CreateCourseRequest {
            name: name.to_string(),
            day_of_week: day,
            start_time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(hour + 1, 0, 0).unwrap(),
            location: None,
            teacher: None,
            color: None,
        }
    }

    fn assignment_request(title: &str, due_in: Duration) -> CreateAssignmentRequest {
        CreateAssignmentRequest {
            course_id: None,
            title: title.to_string(),
            description: None,
            assignment_type: AssignmentType::Homework,
            due_at: Utc::now() + due_in,
            priority: Priority::Low,
            reminder_enabled: false,
        }
    }

    /// Waits until the published value satisfies `done`.
    async fn wait_for<T: Clone>(rx: &mut watch::Receiver<T>, done: impl Fn(&T) -> bool) -> T {
        tokio::time::timeout(StdDuration::from_secs(5), async {
            loop {
                if done(&rx.borrow_and_update()) {
                    return rx.borrow().clone();
                }
                rx.changed().await.unwrap();
            }
        })
        .await
        .expect("view did not publish in time")
    }

    fn names(courses: &[Course]) -> Vec<String> {
        courses.iter().map(|c| c.name.clone()).collect()
    }

    #[tokio::test]
    async fn test_schedule_defaults_to_local_weekday() {
        let store = Arc::new(LocalStore::new());
        // Sunday 23:30 UTC is already Monday at UTC+8
        let now = FixedOffset::east_opt(8 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 9, 2, 7, 30, 0)
            .unwrap();
        let view = CourseScheduleView::new(store, UserContext::new(Uuid::new_v4()), &now);
        assert_eq!(view.selected_day(), DayOfWeek::Monday);
    }

    #[tokio::test]
    async fn test_schedule_follows_store_and_selection() {
        let store = Arc::new(LocalStore::new());
        let ctx = UserContext::new(Uuid::new_v4());
        store
            .create_course(&ctx, course_request("Afternoon", DayOfWeek::Monday, 14))
            .await
            .unwrap();

        let view = CourseScheduleView::for_day(store.clone(), ctx, DayOfWeek::Monday);
        let mut rx = view.courses();
        let list = wait_for(&mut rx, |list| list.len() == 1).await;
        assert_eq!(names(&list), vec!["Afternoon"]);

        store
            .create_course(&ctx, course_request("Morning", DayOfWeek::Monday, 8))
            .await
            .unwrap();
        let list = wait_for(&mut rx, |list| list.len() == 2).await;
        assert_eq!(names(&list), vec!["Morning", "Afternoon"]);

        store
            .create_course(&ctx, course_request("Friday", DayOfWeek::Friday, 9))
            .await
            .unwrap();
        view.select_day(DayOfWeek::Friday);
        let list = wait_for(&mut rx, |list| names(list) == vec!["Friday"]).await;
        assert_eq!(list[0].day_of_week, DayOfWeek::Friday);
    }

    #[tokio::test]
    async fn test_schedule_ignores_other_users() {
        let store = Arc::new(LocalStore::new());
        let me = UserContext::new(Uuid::new_v4());
        let other = UserContext::new(Uuid::new_v4());

        let view = CourseScheduleView::for_day(store.clone(), me, DayOfWeek::Tuesday);
        store
            .create_course(&other, course_request("Not mine", DayOfWeek::Tuesday, 10))
            .await
            .unwrap();
        store
            .create_course(&me, course_request("Mine", DayOfWeek::Tuesday, 11))
            .await
            .unwrap();

        let mut rx = view.courses();
        let list = wait_for(&mut rx, |list| !list.is_empty()).await;
        assert_eq!(names(&list), vec!["Mine"]);
    }

    #[tokio::test]
    async fn test_assignment_view_filters() {
        let store = Arc::new(LocalStore::new());
        let ctx = UserContext::new(Uuid::new_v4());
        store
            .create_assignment(&ctx, assignment_request("Soon", Duration::days(1)))
            .await
            .unwrap();
        let late = store
            .create_assignment(&ctx, assignment_request("Late", -Duration::days(1)))
            .await
            .unwrap();

        let view = AssignmentListView::new(store.clone(), ctx);
        assert_eq!(view.selected_filter(), AssignmentFilter::Upcoming);
        let mut rx = view.assignments();
        let list = wait_for(&mut rx, |list| !list.is_empty()).await;
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].assignment.title, "Soon");

        view.select_filter(AssignmentFilter::Overdue);
        let list = wait_for(&mut rx, |list| {
            list.first().is_some_and(|v| v.assignment.id == late.id)
        })
        .await;
        assert_eq!(list[0].display_status, DisplayStatus::Overdue);

        // Completing freezes the display status
        store
            .update_status(&ctx, late.id, AssignmentStatus::Completed)
            .await
            .unwrap();
        wait_for(&mut rx, |list| list.is_empty()).await;

        view.select_filter(AssignmentFilter::Status(AssignmentStatus::Completed));
        let list = wait_for(&mut rx, |list| list.len() == 1).await;
        assert_eq!(list[0].display_status, DisplayStatus::Completed);
    }

    /// Gateway whose reads fail once `failing` is set.
    struct FlakyGateway {
        inner: LocalStore,
        failing: AtomicBool,
    }

    impl ChangeFeed for FlakyGateway {
        fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
            self.inner.subscribe()
        }
    }

    #[async_trait]
    impl AssignmentGateway for FlakyGateway {
        async fn list_assignments(
            &self,
            ctx: &UserContext,
        ) -> Result<Vec<Assignment>, GatewayError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(GatewayError::Storage("disk on fire".to_string()));
            }
            self.inner.list_assignments(ctx).await
        }

        async fn get_assignment(
            &self,
            ctx: &UserContext,
            id: Uuid,
        ) -> Result<Assignment, GatewayError> {
            self.inner.get_assignment(ctx, id).await
        }

        async fn create_assignment(
            &self,
            ctx: &UserContext,
            request: CreateAssignmentRequest,
        ) -> Result<Assignment, GatewayError> {
            self.inner.create_assignment(ctx, request).await
        }

        async fn update_assignment(
            &self,
            ctx: &UserContext,
            id: Uuid,
            request: UpdateAssignmentRequest,
        ) -> Result<Assignment, GatewayError> {
            self.inner.update_assignment(ctx, id, request).await
        }

        async fn update_status(
            &self,
            ctx: &UserContext,
            id: Uuid,
            status: AssignmentStatus,
        ) -> Result<Assignment, GatewayError> {
            self.inner.update_status(ctx, id, status).await
        }

        async fn delete_assignment(&self, ctx: &UserContext, id: Uuid) -> Result<(), GatewayError> {
            self.inner.delete_assignment(ctx, id).await
        }
    }

    #[tokio::test]
    async fn test_errors_keep_previous_list() {
        let gateway = Arc::new(FlakyGateway {
            inner: LocalStore::new(),
            failing: AtomicBool::new(false),
        });
        let ctx = UserContext::new(Uuid::new_v4());
        gateway
            .create_assignment(&ctx, assignment_request("Kept", Duration::days(2)))
            .await
            .unwrap();

        let view = AssignmentListView::new(gateway.clone(), ctx);
        let mut rx = view.assignments();
        wait_for(&mut rx, |list| list.len() == 1).await;

        gateway.failing.store(true, Ordering::SeqCst);
        gateway
            .create_assignment(&ctx, assignment_request("Hidden", Duration::days(3)))
            .await
            .unwrap();
        tokio::time::sleep(StdDuration::from_millis(50)).await;

        let list = view.snapshot();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].assignment.title, "Kept");
    }

    fn group_request(name: &str, is_public: bool) -> CreateStudyGroupRequest {
        CreateStudyGroupRequest {
            name: name.to_string(),
            description: None,
            topic: None,
            max_members: 10,
            is_public,
        }
    }

    #[tokio::test]
    async fn test_group_list_follows_membership() {
        let store = Arc::new(LocalStore::new());
        let owner = UserContext::new(Uuid::new_v4());
        let me = UserContext::new(Uuid::new_v4());
        store
            .create_group(&owner, group_request("Hidden", false))
            .await
            .unwrap();

        let view = StudyGroupListView::new(store.clone(), me);
        let open = store
            .create_group(&owner, group_request("Open", true))
            .await
            .unwrap();

        let mut rx = view.groups();
        let list = wait_for(&mut rx, |list| !list.is_empty()).await;
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].group.name, "Open");
        assert_eq!(list[0].my_role, None);

        store.join_group(&me, open.group.id).await.unwrap();
        let list = wait_for(&mut rx, |list| {
            list.first().is_some_and(|g| g.my_role.is_some())
        })
        .await;
        assert_eq!(list[0].my_role, Some(GroupRole::Member));
        assert_eq!(list[0].member_count, 2);

        // Another user's change to a shared group reaches this view
        store.delete_group(&owner, open.group.id).await.unwrap();
        wait_for(&mut rx, |list| list.is_empty()).await;
    }

    /// Group gateway that never announces its changes.
    struct SilentGroups {
        inner: LocalStore,
        silence: broadcast::Sender<ChangeEvent>,
    }

    impl ChangeFeed for SilentGroups {
        fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
            self.silence.subscribe()
        }
    }

    #[async_trait]
    impl StudyGroupGateway for SilentGroups {
        async fn list_groups(
            &self,
            ctx: &UserContext,
        ) -> Result<Vec<StudyGroupSummary>, GatewayError> {
            self.inner.list_groups(ctx).await
        }

        async fn get_group(
            &self,
            ctx: &UserContext,
            group_id: Uuid,
        ) -> Result<StudyGroupSummary, GatewayError> {
            self.inner.get_group(ctx, group_id).await
        }

        async fn create_group(
            &self,
            ctx: &UserContext,
            request: CreateStudyGroupRequest,
        ) -> Result<StudyGroupSummary, GatewayError> {
            self.inner.create_group(ctx, request).await
        }

        async fn update_group(
            &self,
            ctx: &UserContext,
            group_id: Uuid,
            request: UpdateStudyGroupRequest,
        ) -> Result<StudyGroupSummary, GatewayError> {
            self.inner.update_group(ctx, group_id, request).await
        }

        async fn delete_group(&self, ctx: &UserContext, group_id: Uuid) -> Result<(), GatewayError> {
            self.inner.delete_group(ctx, group_id).await
        }

        async fn list_members(
            &self,
            ctx: &UserContext,
            group_id: Uuid,
        ) -> Result<Vec<GroupMember>, GatewayError> {
            self.inner.list_members(ctx, group_id).await
        }

        async fn join_group(
            &self,
            ctx: &UserContext,
            group_id: Uuid,
        ) -> Result<GroupMember, GatewayError> {
            self.inner.join_group(ctx, group_id).await
        }

        async fn remove_member(
            &self,
            ctx: &UserContext,
            group_id: Uuid,
            user_id: Uuid,
        ) -> Result<(), GatewayError> {
            self.inner.remove_member(ctx, group_id, user_id).await
        }

        async fn post_message(
            &self,
            ctx: &UserContext,
            group_id: Uuid,
            request: PostMessageRequest,
        ) -> Result<GroupMessage, GatewayError> {
            self.inner.post_message(ctx, group_id, request).await
        }

        async fn recent_messages(
            &self,
            ctx: &UserContext,
            group_id: Uuid,
            limit: usize,
        ) -> Result<Vec<GroupMessage>, GatewayError> {
            self.inner.recent_messages(ctx, group_id, limit).await
        }
    }

    #[tokio::test]
    async fn test_group_list_reload() {
        let (silence, _) = broadcast::channel(1);
        let gateway = Arc::new(SilentGroups {
            inner: LocalStore::new(),
            silence,
        });
        let ctx = UserContext::new(Uuid::new_v4());

        let view = StudyGroupListView::new(gateway.clone(), ctx);
        let mut rx = view.groups();
        tokio::time::sleep(StdDuration::from_millis(50)).await;

        gateway
            .create_group(&ctx, group_request("Quiet", true))
            .await
            .unwrap();
        tokio::time::sleep(StdDuration::from_millis(50)).await;
        assert!(view.snapshot().is_empty());

        view.reload();
        let list = wait_for(&mut rx, |list| list.len() == 1).await;
        assert_eq!(list[0].group.name, "Quiet");
    }

    #[tokio::test]
    async fn test_drop_stops_refresh_task() {
        let store = Arc::new(LocalStore::new());
        let ctx = UserContext::new(Uuid::new_v4());
        let view = AssignmentListView::new(store.clone(), ctx);
        let mut rx = view.assignments();

        drop(view);

        // The aborted task drops its sender, closing the channel
        let closed = tokio::time::timeout(StdDuration::from_secs(5), async {
            while rx.changed().await.is_ok() {}
        })
        .await;
        assert!(closed.is_ok());
    }
}
