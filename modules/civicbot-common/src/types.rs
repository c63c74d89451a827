use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

// --- Geo Types ---

/// A resolved coordinate pair. Both components are always present —
/// an unresolvable location is represented as `Option<GeoPoint>::None`,
/// never as a half-filled pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

// --- Issue vocabulary ---

/// Issue categories reportable through the bot. `Other` is the fallback
/// when no keyword evidence matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    Pothole,
    Garbage,
    StreetLight,
    WaterIssue,
    Traffic,
    Graffiti,
    Other,
}

impl std::fmt::Display for IssueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IssueType::Pothole => write!(f, "pothole"),
            IssueType::Garbage => write!(f, "garbage"),
            IssueType::StreetLight => write!(f, "street_light"),
            IssueType::WaterIssue => write!(f, "water_issue"),
            IssueType::Traffic => write!(f, "traffic"),
            IssueType::Graffiti => write!(f, "graffiti"),
            IssueType::Other => write!(f, "other"),
        }
    }
}

impl IssueType {
    pub fn from_str_loose(s: &str) -> Self {
        match s {
            "pothole" => Self::Pothole,
            "garbage" => Self::Garbage,
            "street_light" => Self::StreetLight,
            "water_issue" => Self::WaterIssue,
            "traffic" => Self::Traffic,
            "graffiti" => Self::Graffiti,
            _ => Self::Other,
        }
    }

    /// Human-facing label used in replies ("street light", not "street_light").
    pub fn human_label(&self) -> &'static str {
        match self {
            IssueType::Pothole => "pothole",
            IssueType::Garbage => "garbage",
            IssueType::StreetLight => "street light",
            IssueType::WaterIssue => "water issue",
            IssueType::Traffic => "traffic",
            IssueType::Graffiti => "graffiti",
            IssueType::Other => "other",
        }
    }

    /// Routing department for this issue type. Total mapping — types with
    /// no dedicated department fall through to `General`.
    pub fn department(&self) -> Department {
        match self {
            IssueType::Pothole | IssueType::StreetLight | IssueType::Graffiti => {
                Department::PublicWorks
            }
            IssueType::Garbage => Department::Sanitation,
            IssueType::WaterIssue => Department::WaterDepartment,
            IssueType::Traffic => Department::TrafficDepartment,
            IssueType::Other => Department::General,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Department {
    PublicWorks,
    Sanitation,
    WaterDepartment,
    TrafficDepartment,
    General,
}

impl std::fmt::Display for Department {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Department::PublicWorks => write!(f, "public_works"),
            Department::Sanitation => write!(f, "sanitation"),
            Department::WaterDepartment => write!(f, "water_department"),
            Department::TrafficDepartment => write!(f, "traffic_department"),
            Department::General => write!(f, "general"),
        }
    }
}

impl Department {
    pub fn from_str_loose(s: &str) -> Self {
        match s {
            "public_works" => Self::PublicWorks,
            "sanitation" => Self::Sanitation,
            "water_department" => Self::WaterDepartment,
            "traffic_department" => Self::TrafficDepartment,
            _ => Self::General,
        }
    }

    pub fn human_label(&self) -> &'static str {
        match self {
            Department::PublicWorks => "Public Works",
            Department::Sanitation => "Sanitation",
            Department::WaterDepartment => "Water Department",
            Department::TrafficDepartment => "Traffic Department",
            Department::General => "General Services",
        }
    }
}

// --- Report lifecycle ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportStatus {
    Received,
    InProgress,
    Resolved,
    Archived,
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportStatus::Received => write!(f, "received"),
            ReportStatus::InProgress => write!(f, "in-progress"),
            ReportStatus::Resolved => write!(f, "resolved"),
            ReportStatus::Archived => write!(f, "archived"),
        }
    }
}

impl ReportStatus {
    pub fn from_str_loose(s: &str) -> Self {
        match s {
            "in-progress" | "in_progress" => Self::InProgress,
            "resolved" => Self::Resolved,
            "archived" => Self::Archived,
            _ => Self::Received,
        }
    }

    pub fn human_label(&self) -> &'static str {
        match self {
            ReportStatus::Received => "Received",
            ReportStatus::InProgress => "In Progress",
            ReportStatus::Resolved => "Resolved",
            ReportStatus::Archived => "Archived",
        }
    }

    /// Status state machine. Admins may move freely between received,
    /// in-progress, and resolved; archived is reachable only from resolved
    /// and is terminal.
    pub fn can_transition_to(&self, next: ReportStatus) -> bool {
        match (self, next) {
            (ReportStatus::Archived, _) => false,
            (_, ReportStatus::Archived) => *self == ReportStatus::Resolved,
            _ => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
        }
    }
}

impl Priority {
    pub fn from_str_loose(s: &str) -> Self {
        match s {
            "low" => Self::Low,
            "high" => Self::High,
            _ => Self::Medium,
        }
    }

    /// Creation-time priority from detected urgency. `Low` is reserved for
    /// admin downgrades — the pipeline never assigns it.
    pub fn from_urgency(urgency: Urgency) -> Self {
        match urgency {
            Urgency::High => Priority::High,
            Urgency::Medium | Urgency::Normal => Priority::Medium,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Normal,
    Medium,
    High,
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Urgency::Normal => write!(f, "normal"),
            Urgency::Medium => write!(f, "medium"),
            Urgency::High => write!(f, "high"),
        }
    }
}

impl Urgency {
    /// High and medium urgency both mark a report as needing follow-up.
    pub fn is_elevated(&self) -> bool {
        matches!(self, Urgency::High | Urgency::Medium)
    }
}

// --- Conversation intent ---

/// What an inbound message is asking for, decided before the report
/// pipeline runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Greeting,
    Help,
    Thanks,
    StatusCheck,
    Report,
    Unclear,
}

// --- Report entity ---

/// The central entity: one civic-issue report, as persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: i64,
    /// Opaque sender identifier (e.g. a WhatsApp phone number).
    pub reporter_id: String,
    pub issue_type: IssueType,
    pub description: String,
    pub location_text: String,
    pub coordinates: Option<GeoPoint>,
    pub image_reference: Option<String>,
    pub department: Department,
    pub status: ReportStatus,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set exactly once, on the first transition into `Resolved`.
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Creation record handed to the store. The store assigns id, status, and
/// timestamps.
#[derive(Debug, Clone, TypedBuilder)]
pub struct NewReport {
    pub reporter_id: String,
    pub issue_type: IssueType,
    pub description: String,
    pub location_text: String,
    #[builder(default)]
    pub coordinates: Option<GeoPoint>,
    #[builder(default)]
    pub image_reference: Option<String>,
    pub department: Department,
    pub priority: Priority,
}
