//! Screen routes.

use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

/// A destination in the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Login,
    Register,
    CourseSchedule,
    Assignments,
    StudyGroups,
    Profile,
    AddCourse,
    EditCourse(Uuid),
    AddAssignment,
    EditAssignment(Uuid),
    CreateGroup,
    GroupDetail(Uuid),
}

impl Screen {
    /// First screen shown to a signed-out user.
    pub const START: Screen = Screen::Login;

    /// Bottom navigation tabs, in display order.
    pub const TABS: [Screen; 4] = [
        Screen::CourseSchedule,
        Screen::Assignments,
        Screen::StudyGroups,
        Screen::Profile,
    ];

    /// Screen shown after signing in.
    pub fn home() -> Screen {
        Screen::CourseSchedule
    }

    pub fn route(&self) -> String {
        match self {
            Screen::EditCourse(id) => format!("edit_course/{}", id),
            Screen::EditAssignment(id) => format!("edit_assignment/{}", id),
            Screen::GroupDetail(id) => format!("group_detail/{}", id),
            other => other.base_route().to_string(),
        }
    }

    fn base_route(&self) -> &'static str {
        match self {
            Screen::Login => "login",
            Screen::Register => "register",
            Screen::CourseSchedule => "course_schedule",
            Screen::Assignments => "assignments",
            Screen::StudyGroups => "study_groups",
            Screen::Profile => "profile",
            Screen::AddCourse => "add_course",
            Screen::EditCourse(_) => "edit_course",
            Screen::AddAssignment => "add_assignment",
            Screen::EditAssignment(_) => "edit_assignment",
            Screen::CreateGroup => "create_group",
            Screen::GroupDetail(_) => "group_detail",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Screen::Login => "Sign in",
            Screen::Register => "Create account",
            Screen::CourseSchedule => "Schedule",
            Screen::Assignments => "Assignments",
            Screen::StudyGroups => "Study groups",
            Screen::Profile => "Profile",
            Screen::AddCourse => "Add course",
            Screen::EditCourse(_) => "Edit course",
            Screen::AddAssignment => "Add assignment",
            Screen::EditAssignment(_) => "Edit assignment",
            Screen::CreateGroup => "New group",
            Screen::GroupDetail(_) => "Group",
        }
    }

    pub fn is_tab(&self) -> bool {
        Self::TABS.contains(self)
    }

    /// Whether the screen can be shown without signing in.
    pub fn is_public(&self) -> bool {
        matches!(self, Screen::Login | Screen::Register)
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.route())
    }
}

impl FromStr for Screen {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (base, id) = match s.split_once('/') {
            Some((base, id)) => {
                let id = Uuid::parse_str(id).map_err(|_| format!("Invalid route id: {}", id))?;
                (base, Some(id))
            }
            None => (s, None),
        };

        match (base, id) {
            ("login", None) => Ok(Screen::Login),
            ("register", None) => Ok(Screen::Register),
            ("course_schedule", None) => Ok(Screen::CourseSchedule),
            ("assignments", None) => Ok(Screen::Assignments),
            ("study_groups", None) => Ok(Screen::StudyGroups),
            ("profile", None) => Ok(Screen::Profile),
            ("add_course", None) => Ok(Screen::AddCourse),
            ("edit_course", Some(id)) => Ok(Screen::EditCourse(id)),
            ("add_assignment", None) => Ok(Screen::AddAssignment),
            ("edit_assignment", Some(id)) => Ok(Screen::EditAssignment(id)),
            ("create_group", None) => Ok(Screen::CreateGroup),
            ("group_detail", Some(id)) => Ok(Screen::GroupDetail(id)),
            _ => Err(format!("Unknown route: {}", s)),
        }
    }
}
