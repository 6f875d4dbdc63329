//! Remote HTTP repository.
//!
//! Talks to the backend REST API. Calls carry the bearer token once signed
//! in; before that they name the acting user with `?user_id=`, which the
//! backend accepts on its allowlisted routes.

use std::time::Duration;

use async_trait::async_trait;
use domain::models::assignment::{
    Assignment, AssignmentStatus, CreateAssignmentRequest, UpdateAssignmentRequest,
};
use domain::models::course::{Course, CreateCourseRequest, DayOfWeek, UpdateCourseRequest};
use domain::models::note::{CreateNoteRequest, Note, UpdateNoteRequest};
use domain::models::notification::Notification;
use domain::models::study_group::{
    CreateStudyGroupRequest, GroupMember, GroupMessage, PostMessageRequest, StudyGroupSummary,
    UpdateStudyGroupRequest,
};
use domain::models::UserContext;
use domain::services::gateway::{
    AssignmentGateway, ChangeEvent, ChangeFeed, CourseGateway, GatewayError, NoteGateway,
    NotificationGateway, StudyGroupGateway, CHANGE_FEED_CAPACITY,
};
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ClientError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Stored statuses, queried one by one to assemble the full assignment list.
const ALL_STATUSES: [AssignmentStatus; 3] = [
    AssignmentStatus::NotStarted,
    AssignmentStatus::InProgress,
    AssignmentStatus::Completed,
];

/// Tokens returned by sign-in.
#[derive(Debug, Clone, Deserialize)]
pub struct Tokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

/// The signed-in account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub student_id: Option<String>,
}

impl Account {
    pub fn context(&self) -> UserContext {
        UserContext::new(self.id)
    }
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    user: Account,
    tokens: Tokens,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    tokens: Tokens,
}

#[derive(Debug, Serialize)]
struct StatusBody {
    status: AssignmentStatus,
}

/// First page of a group's message history.
#[derive(Debug, Deserialize)]
struct MessagePage {
    messages: Vec<GroupMessage>,
}

/// Remote repository over the backend API.
pub struct RemoteGateway {
    client: Client,
    base_url: Url,
    tokens: RwLock<Option<Tokens>>,
    changes: broadcast::Sender<ChangeEvent>,
}

impl RemoteGateway {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url =
            Url::parse(base_url).map_err(|e| ClientError::InvalidBaseUrl(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl(base_url.to_string()));
        }
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);

        Ok(Self {
            client,
            base_url,
            tokens: RwLock::new(None),
            changes,
        })
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::InvalidBaseUrl(e.to_string()))
    }

    /// Starts a request acting for `ctx`.
    async fn request(
        &self,
        method: Method,
        path: &str,
        ctx: Option<&UserContext>,
    ) -> Result<RequestBuilder, ClientError> {
        let builder = self.client.request(method, self.url(path)?);
        let builder = match self.tokens.read().await.as_ref() {
            Some(tokens) => builder.bearer_auth(&tokens.access_token),
            None => match ctx {
                Some(ctx) => builder.query(&[("user_id", ctx.user_id())]),
                None => builder,
            },
        };
        Ok(builder)
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }
        let body = response.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), "API request failed");
        Err(ClientError::from_response(status.as_u16(), &body))
    }

    async fn send_empty(&self, builder: RequestBuilder) -> Result<(), ClientError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(ClientError::from_response(status.as_u16(), &body))
    }

    fn announce(&self, event: ChangeEvent) {
        let _ = self.changes.send(event);
    }

    async fn authenticate(&self, path: &str, body: serde_json::Value) -> Result<Account, ClientError> {
        let builder = self.client.post(self.url(path)?).json(&body);
        let response: AuthResponse = self.send(builder).await?;
        *self.tokens.write().await = Some(response.tokens);

        info!(user_id = %response.user.id, "Signed in");
        Ok(response.user)
    }

    /// Creates an account and signs in as it.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Account, ClientError> {
        self.authenticate(
            "/api/auth/register",
            json!({"email": email, "password": password, "display_name": display_name}),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Account, ClientError> {
        self.authenticate(
            "/api/auth/login",
            json!({"email": email, "password": password}),
        )
        .await
    }

    /// Exchanges the refresh token for a new pair.
    pub async fn refresh(&self) -> Result<(), ClientError> {
        let refresh_token = self
            .tokens
            .read()
            .await
            .as_ref()
            .map(|t| t.refresh_token.clone())
            .ok_or(ClientError::NotSignedIn)?;

        let builder = self
            .client
            .post(self.url("/api/auth/refresh")?)
            .json(&json!({ "refresh_token": refresh_token }));
        let response: RefreshResponse = self.send(builder).await?;
        *self.tokens.write().await = Some(response.tokens);
        Ok(())
    }

    /// Ends the session on the backend and forgets the tokens.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let builder = self.request(Method::POST, "/api/auth/logout", None).await?;
        let result = self.send_empty(builder).await;
        *self.tokens.write().await = None;
        result
    }

    pub async fn is_signed_in(&self) -> bool {
        self.tokens.read().await.is_some()
    }
}

impl ChangeFeed for RemoteGateway {
    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }
}

#[async_trait]
impl CourseGateway for RemoteGateway {
    async fn list_courses(&self, ctx: &UserContext) -> Result<Vec<Course>, GatewayError> {
        let builder = self.request(Method::GET, "/api/courses", Some(ctx)).await?;
        Ok(self.send(builder).await?)
    }

    async fn courses_by_day(
        &self,
        ctx: &UserContext,
        day: DayOfWeek,
    ) -> Result<Vec<Course>, GatewayError> {
        let builder = self
            .request(Method::GET, "/api/courses", Some(ctx))
            .await?
            .query(&[("day", day.number())]);
        Ok(self.send(builder).await?)
    }

    async fn get_course(&self, ctx: &UserContext, id: Uuid) -> Result<Course, GatewayError> {
        let builder = self
            .request(Method::GET, &format!("/api/courses/{}", id), Some(ctx))
            .await?;
        Ok(self.send(builder).await?)
    }

    async fn create_course(
        &self,
        ctx: &UserContext,
        request: CreateCourseRequest,
    ) -> Result<Course, GatewayError> {
        let builder = self
            .request(Method::POST, "/api/courses", Some(ctx))
            .await?
            .json(&request);
        let course: Course = self.send(builder).await?;

        self.announce(ChangeEvent::Courses {
            user_id: ctx.user_id(),
        });
        Ok(course)
    }

    async fn update_course(
        &self,
        ctx: &UserContext,
        id: Uuid,
        request: UpdateCourseRequest,
    ) -> Result<Course, GatewayError> {
        let builder = self
            .request(Method::PUT, &format!("/api/courses/{}", id), Some(ctx))
            .await?
            .json(&request);
        let course: Course = self.send(builder).await?;

        self.announce(ChangeEvent::Courses {
            user_id: ctx.user_id(),
        });
        Ok(course)
    }

    async fn delete_course(&self, ctx: &UserContext, id: Uuid) -> Result<(), GatewayError> {
        let builder = self
            .request(Method::DELETE, &format!("/api/courses/{}", id), Some(ctx))
            .await?;
        self.send_empty(builder).await?;

        // The backend detaches the course's assignments and notes
        let user_id = ctx.user_id();
        self.announce(ChangeEvent::Courses { user_id });
        self.announce(ChangeEvent::Assignments { user_id });
        self.announce(ChangeEvent::Notes { user_id });
        Ok(())
    }
}

#[async_trait]
impl AssignmentGateway for RemoteGateway {
    async fn list_assignments(&self, ctx: &UserContext) -> Result<Vec<Assignment>, GatewayError> {
        // The default listing is filtered; the union of stored statuses is everything
        let (not_started, in_progress, completed) = tokio::try_join!(
            self.assignments_by_status(ctx, ALL_STATUSES[0]),
            self.assignments_by_status(ctx, ALL_STATUSES[1]),
            self.assignments_by_status(ctx, ALL_STATUSES[2]),
        )?;

        let mut all: Vec<Assignment> = not_started
            .into_iter()
            .chain(in_progress)
            .chain(completed)
            .collect();
        all.sort_by(|a, b| (a.due_at, a.created_at).cmp(&(b.due_at, b.created_at)));
        Ok(all)
    }

    async fn assignments_by_status(
        &self,
        ctx: &UserContext,
        status: AssignmentStatus,
    ) -> Result<Vec<Assignment>, GatewayError> {
        let builder = self
            .request(Method::GET, "/api/assignments", Some(ctx))
            .await?
            .query(&[("filter", status.as_str())]);
        Ok(self.send(builder).await?)
    }

    async fn get_assignment(
        &self,
        ctx: &UserContext,
        id: Uuid,
    ) -> Result<Assignment, GatewayError> {
        let builder = self
            .request(Method::GET, &format!("/api/assignments/{}", id), Some(ctx))
            .await?;
        Ok(self.send(builder).await?)
    }

    async fn create_assignment(
        &self,
        ctx: &UserContext,
        request: CreateAssignmentRequest,
    ) -> Result<Assignment, GatewayError> {
        let builder = self
            .request(Method::POST, "/api/assignments", Some(ctx))
            .await?
            .json(&request);
        let assignment: Assignment = self.send(builder).await?;

        self.announce(ChangeEvent::Assignments {
            user_id: ctx.user_id(),
        });
        Ok(assignment)
    }

    async fn update_assignment(
        &self,
        ctx: &UserContext,
        id: Uuid,
        request: UpdateAssignmentRequest,
    ) -> Result<Assignment, GatewayError> {
        let builder = self
            .request(Method::PUT, &format!("/api/assignments/{}", id), Some(ctx))
            .await?
            .json(&request);
        let assignment: Assignment = self.send(builder).await?;

        self.announce(ChangeEvent::Assignments {
            user_id: ctx.user_id(),
        });
        Ok(assignment)
    }

    async fn update_status(
        &self,
        ctx: &UserContext,
        id: Uuid,
        status: AssignmentStatus,
    ) -> Result<Assignment, GatewayError> {
        let builder = self
            .request(
                Method::PUT,
                &format!("/api/assignments/{}/status", id),
                Some(ctx),
            )
            .await?
            .json(&StatusBody { status });
        let assignment: Assignment = self.send(builder).await?;

        self.announce(ChangeEvent::Assignments {
            user_id: ctx.user_id(),
        });
        Ok(assignment)
    }

    async fn delete_assignment(&self, ctx: &UserContext, id: Uuid) -> Result<(), GatewayError> {
        let builder = self
            .request(Method::DELETE, &format!("/api/assignments/{}", id), Some(ctx))
            .await?;
        self.send_empty(builder).await?;

        // Its reminders are deleted with it
        let user_id = ctx.user_id();
        self.announce(ChangeEvent::Assignments { user_id });
        self.announce(ChangeEvent::Notifications { user_id });
        Ok(())
    }
}

#[async_trait]
impl StudyGroupGateway for RemoteGateway {
    async fn list_groups(&self, ctx: &UserContext) -> Result<Vec<StudyGroupSummary>, GatewayError> {
        let builder = self.request(Method::GET, "/api/groups", Some(ctx)).await?;
        Ok(self.send(builder).await?)
    }

    async fn get_group(
        &self,
        ctx: &UserContext,
        group_id: Uuid,
    ) -> Result<StudyGroupSummary, GatewayError> {
        let builder = self
            .request(Method::GET, &format!("/api/groups/{}", group_id), Some(ctx))
            .await?;
        Ok(self.send(builder).await?)
    }

    async fn create_group(
        &self,
        ctx: &UserContext,
        request: CreateStudyGroupRequest,
    ) -> Result<StudyGroupSummary, GatewayError> {
        let builder = self
            .request(Method::POST, "/api/groups", Some(ctx))
            .await?
            .json(&request);
        let summary: StudyGroupSummary = self.send(builder).await?;

        self.announce(ChangeEvent::Groups {
            group_id: summary.group.id,
        });
        Ok(summary)
    }

    async fn update_group(
        &self,
        ctx: &UserContext,
        group_id: Uuid,
        request: UpdateStudyGroupRequest,
    ) -> Result<StudyGroupSummary, GatewayError> {
        let builder = self
            .request(Method::PUT, &format!("/api/groups/{}", group_id), Some(ctx))
            .await?
            .json(&request);
        let summary: StudyGroupSummary = self.send(builder).await?;

        self.announce(ChangeEvent::Groups { group_id });
        Ok(summary)
    }

    async fn delete_group(&self, ctx: &UserContext, group_id: Uuid) -> Result<(), GatewayError> {
        let builder = self
            .request(Method::DELETE, &format!("/api/groups/{}", group_id), Some(ctx))
            .await?;
        self.send_empty(builder).await?;

        self.announce(ChangeEvent::Groups { group_id });
        Ok(())
    }

    async fn list_members(
        &self,
        ctx: &UserContext,
        group_id: Uuid,
    ) -> Result<Vec<GroupMember>, GatewayError> {
        let builder = self
            .request(
                Method::GET,
                &format!("/api/groups/{}/members", group_id),
                Some(ctx),
            )
            .await?;
        Ok(self.send(builder).await?)
    }

    async fn join_group(
        &self,
        ctx: &UserContext,
        group_id: Uuid,
    ) -> Result<GroupMember, GatewayError> {
        // 201 for a new membership, 200 for an existing one; both carry it
        let builder = self
            .request(
                Method::POST,
                &format!("/api/groups/{}/members", group_id),
                Some(ctx),
            )
            .await?;
        let member: GroupMember = self.send(builder).await?;

        self.announce(ChangeEvent::Groups { group_id });
        Ok(member)
    }

    async fn remove_member(
        &self,
        ctx: &UserContext,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), GatewayError> {
        let builder = self
            .request(
                Method::DELETE,
                &format!("/api/groups/{}/members/{}", group_id, user_id),
                Some(ctx),
            )
            .await?;
        self.send_empty(builder).await?;

        self.announce(ChangeEvent::Groups { group_id });
        Ok(())
    }

    async fn post_message(
        &self,
        ctx: &UserContext,
        group_id: Uuid,
        request: PostMessageRequest,
    ) -> Result<GroupMessage, GatewayError> {
        let builder = self
            .request(
                Method::POST,
                &format!("/api/groups/{}/messages", group_id),
                Some(ctx),
            )
            .await?
            .json(&request);
        let message: GroupMessage = self.send(builder).await?;

        self.announce(ChangeEvent::Messages { group_id });
        Ok(message)
    }

    async fn recent_messages(
        &self,
        ctx: &UserContext,
        group_id: Uuid,
        limit: usize,
    ) -> Result<Vec<GroupMessage>, GatewayError> {
        let builder = self
            .request(
                Method::GET,
                &format!("/api/groups/{}/messages", group_id),
                Some(ctx),
            )
            .await?
            .query(&[("limit", limit)]);
        let page: MessagePage = self.send(builder).await?;
        Ok(page.messages)
    }
}

#[async_trait]
impl NoteGateway for RemoteGateway {
    async fn list_notes(
        &self,
        ctx: &UserContext,
        course_id: Option<Uuid>,
    ) -> Result<Vec<Note>, GatewayError> {
        let mut builder = self.request(Method::GET, "/api/notes", Some(ctx)).await?;
        if let Some(course_id) = course_id {
            builder = builder.query(&[("course_id", course_id)]);
        }
        Ok(self.send(builder).await?)
    }

    async fn get_note(&self, ctx: &UserContext, id: Uuid) -> Result<Note, GatewayError> {
        let builder = self
            .request(Method::GET, &format!("/api/notes/{}", id), Some(ctx))
            .await?;
        Ok(self.send(builder).await?)
    }

    async fn create_note(
        &self,
        ctx: &UserContext,
        request: CreateNoteRequest,
    ) -> Result<Note, GatewayError> {
        let builder = self
            .request(Method::POST, "/api/notes", Some(ctx))
            .await?
            .json(&request);
        let note: Note = self.send(builder).await?;

        self.announce(ChangeEvent::Notes {
            user_id: ctx.user_id(),
        });
        Ok(note)
    }

    async fn update_note(
        &self,
        ctx: &UserContext,
        id: Uuid,
        request: UpdateNoteRequest,
    ) -> Result<Note, GatewayError> {
        let builder = self
            .request(Method::PUT, &format!("/api/notes/{}", id), Some(ctx))
            .await?
            .json(&request);
        let note: Note = self.send(builder).await?;

        self.announce(ChangeEvent::Notes {
            user_id: ctx.user_id(),
        });
        Ok(note)
    }

    async fn delete_note(&self, ctx: &UserContext, id: Uuid) -> Result<(), GatewayError> {
        let builder = self
            .request(Method::DELETE, &format!("/api/notes/{}", id), Some(ctx))
            .await?;
        self.send_empty(builder).await?;

        self.announce(ChangeEvent::Notes {
            user_id: ctx.user_id(),
        });
        Ok(())
    }
}

#[async_trait]
impl NotificationGateway for RemoteGateway {
    async fn list_notifications(
        &self,
        ctx: &UserContext,
        unread_only: bool,
    ) -> Result<Vec<Notification>, GatewayError> {
        let builder = self
            .request(Method::GET, "/api/notifications", Some(ctx))
            .await?
            .query(&[("unread", unread_only)]);
        Ok(self.send(builder).await?)
    }

    async fn mark_read(&self, ctx: &UserContext, id: Uuid) -> Result<Notification, GatewayError> {
        let builder = self
            .request(
                Method::PUT,
                &format!("/api/notifications/{}/read", id),
                Some(ctx),
            )
            .await?;
        let notification: Notification = self.send(builder).await?;

        self.announce(ChangeEvent::Notifications {
            user_id: ctx.user_id(),
        });
        Ok(notification)
    }

    async fn delete_notification(&self, ctx: &UserContext, id: Uuid) -> Result<(), GatewayError> {
        let builder = self
            .request(
                Method::DELETE,
                &format!("/api/notifications/{}", id),
                Some(ctx),
            )
            .await?;
        self.send_empty(builder).await?;

        self.announce(ChangeEvent::Notifications {
            user_id: ctx.user_id(),
        });
        Ok(())
    }
}
