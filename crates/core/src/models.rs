//! Data models for Stageline
//!
//! Read models for projects, stages and tasks, plus the lifecycle rules
//! and validation that govern stage and project status changes.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::dates::flexible;
use crate::error::{CoreError, CoreResult};

/// Maximum length of a project or stage name, in characters.
pub const MAX_NAME_LEN: usize = 200;

/// Opaque reference into the external board (a group id or a board id).
///
/// The board API hands these out as numbers in some places and strings in
/// others, so equality is defined on the string form: `123` and `"123"` are
/// the same reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExternalRef(String);

impl ExternalRef {
    /// Create a reference from its string form.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The string form used for comparisons.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Coerce a JSON scalar into a reference. Objects, arrays, booleans and
    /// null are not references.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => Some(Self(s.clone())),
            serde_json::Value::Number(n) => Some(Self(number_to_string(n))),
            _ => None,
        }
    }

    /// Interpret the reference as a numeric board/group id.
    pub fn as_u64(&self) -> Option<u64> {
        self.0.trim().parse().ok()
    }
}

/// Render a JSON number the way a string coercion would: integral floats
/// lose their fractional part (`123.0` becomes `"123"`).
fn number_to_string(n: &serde_json::Number) -> String {
    if let Some(f) = n.as_f64()
        && !n.is_i64()
        && !n.is_u64()
        && f.fract() == 0.0
        && f.is_finite()
    {
        return format!("{}", f as i64);
    }
    n.to_string()
}

impl fmt::Display for ExternalRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ExternalRef {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ExternalRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u64> for ExternalRef {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl Serialize for ExternalRef {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ExternalRef {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(d)?;
        ExternalRef::from_json(&value).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "expected a string or number reference, got {}",
                value
            ))
        })
    }
}

/// Stage status
///
/// Represents the current state of a stage in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    #[default]
    Active,
    Paused,
    Completed,
}

impl StageStatus {
    /// Returns the string representation used in snapshots
    pub fn as_str(&self) -> &'static str {
        match self {
            StageStatus::Active => "active",
            StageStatus::Paused => "paused",
            StageStatus::Completed => "completed",
        }
    }

    /// Parse a status from its string representation
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(StageStatus::Active),
            "paused" => Some(StageStatus::Paused),
            "completed" => Some(StageStatus::Completed),
            _ => None,
        }
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Project status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Active,
    Completed,
    Archived,
}

impl ProjectStatus {
    /// Returns the string representation used in snapshots
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A date-ranged phase of a project, bound to one external board group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    /// Identifier, unique within the project
    pub id: String,

    /// Display label
    pub name: String,

    /// First day of the stage
    #[serde(with = "flexible")]
    pub start_date: DateTime<Utc>,

    /// Last day of the stage
    #[serde(with = "flexible")]
    pub end_date: DateTime<Utc>,

    /// Lifecycle status
    #[serde(default)]
    pub status: StageStatus,

    /// Why the stage is paused (only meaningful while paused)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pause_reason: Option<String>,

    /// Join key against externally sourced tasks
    #[serde(default, alias = "kaiten_group_id")]
    pub external_group_ref: Option<ExternalRef>,
}

impl Stage {
    /// Create an active stage with no group binding.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            start_date,
            end_date,
            status: StageStatus::Active,
            pause_reason: None,
            external_group_ref: None,
        }
    }

    /// Bind the stage to an external board group.
    pub fn with_group_ref(mut self, group_ref: impl Into<ExternalRef>) -> Self {
        self.external_group_ref = Some(group_ref.into());
        self
    }

    /// Set the stage status.
    pub fn with_status(mut self, status: StageStatus) -> Self {
        self.status = status;
        self
    }

    /// Run name, date and pause-reason validation.
    pub fn validate(&self) -> CoreResult<()> {
        validate_name(&self.name)?;
        validate_stage_dates(self.start_date, self.end_date)?;
        validate_pause_reason(self.status, self.pause_reason.as_deref())
    }

    /// Pause an active stage. The reason must not be blank.
    pub fn pause(&mut self, reason: &str) -> CoreResult<()> {
        if self.status != StageStatus::Active {
            return Err(self.transition_error(StageStatus::Paused));
        }
        if reason.trim().is_empty() {
            return Err(CoreError::validation("Pause reason is required"));
        }
        self.status = StageStatus::Paused;
        self.pause_reason = Some(reason.to_string());
        Ok(())
    }

    /// Resume a paused stage.
    pub fn resume(&mut self) -> CoreResult<()> {
        if self.status != StageStatus::Paused {
            return Err(self.transition_error(StageStatus::Active));
        }
        self.status = StageStatus::Active;
        self.pause_reason = None;
        Ok(())
    }

    /// Complete an active or paused stage.
    pub fn complete(&mut self) -> CoreResult<()> {
        if self.status == StageStatus::Completed {
            return Err(self.transition_error(StageStatus::Completed));
        }
        self.status = StageStatus::Completed;
        self.pause_reason = None;
        Ok(())
    }

    /// Reopen a completed stage.
    pub fn reactivate(&mut self) -> CoreResult<()> {
        if self.status != StageStatus::Completed {
            return Err(self.transition_error(StageStatus::Active));
        }
        self.status = StageStatus::Active;
        self.pause_reason = None;
        Ok(())
    }

    fn transition_error(&self, to: StageStatus) -> CoreError {
        CoreError::InvalidStatusTransition {
            entity: "stage",
            id: self.id.clone(),
            from: self.status.to_string(),
            to: to.to_string(),
        }
    }
}

/// A named collection of stages, bound to one external board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,

    /// Declared start; takes precedence over the stages' own bounds
    #[serde(default, with = "flexible::option")]
    pub start_date: Option<DateTime<Utc>>,

    /// Declared end; takes precedence over the stages' own bounds
    #[serde(default, with = "flexible::option")]
    pub end_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub status: ProjectStatus,

    /// External board this project was created from
    #[serde(default, alias = "kaiten_board_id")]
    pub board_ref: Option<ExternalRef>,
}

impl Project {
    /// Create an active project with no dates and no board.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            start_date: None,
            end_date: None,
            status: ProjectStatus::Active,
            board_ref: None,
        }
    }

    /// Bind the project to an external board.
    pub fn with_board_ref(mut self, board_ref: impl Into<ExternalRef>) -> Self {
        self.board_ref = Some(board_ref.into());
        self
    }

    /// Set the declared date range.
    pub fn with_dates(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }

    /// Run name and date validation.
    pub fn validate(&self) -> CoreResult<()> {
        validate_name(&self.name)?;
        validate_project_dates(self.start_date, self.end_date)
    }

    /// Mark an active project completed.
    pub fn complete(&mut self) -> CoreResult<()> {
        if self.status != ProjectStatus::Active {
            return Err(self.transition_error(ProjectStatus::Completed));
        }
        self.status = ProjectStatus::Completed;
        Ok(())
    }

    /// Archive an active or completed project.
    pub fn archive(&mut self) -> CoreResult<()> {
        if self.status == ProjectStatus::Archived {
            return Err(self.transition_error(ProjectStatus::Archived));
        }
        self.status = ProjectStatus::Archived;
        Ok(())
    }

    /// Bring an archived project back to active.
    pub fn restore(&mut self) -> CoreResult<()> {
        if self.status != ProjectStatus::Archived {
            return Err(self.transition_error(ProjectStatus::Active));
        }
        self.status = ProjectStatus::Active;
        Ok(())
    }

    fn transition_error(&self, to: ProjectStatus) -> CoreError {
        CoreError::InvalidStatusTransition {
            entity: "project",
            id: self.id.clone(),
            from: self.status.to_string(),
            to: to.to_string(),
        }
    }
}

/// A unit of work imported read-only from the external board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Identifier from the external source
    pub id: String,

    #[serde(default)]
    pub title: String,

    /// Group the card sits in on the board
    #[serde(default)]
    pub external_group_ref: Option<ExternalRef>,

    /// Completion flag derived from the board's status taxonomy
    pub is_completed: bool,

    /// Stage resolved during sync, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage_id: Option<String>,

    /// Last modification on the board, used for display ordering
    #[serde(default, with = "flexible::option", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a task with the given completion flag and no group.
    pub fn new(id: impl Into<String>, is_completed: bool) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            external_group_ref: None,
            is_completed,
            stage_id: None,
            updated_at: None,
        }
    }

    /// Set the external group the task belongs to.
    pub fn with_group_ref(mut self, group_ref: impl Into<ExternalRef>) -> Self {
        self.external_group_ref = Some(group_ref.into());
        self
    }

    /// Set a pre-resolved stage reference.
    pub fn with_stage_id(mut self, stage_id: impl Into<String>) -> Self {
        self.stage_id = Some(stage_id.into());
        self
    }

    /// Whether this task counts toward `stage`.
    ///
    /// A task belongs when its resolved stage id matches, or when both sides
    /// carry a group reference and the references are equal.
    pub fn belongs_to(&self, stage: &Stage) -> bool {
        if self.stage_id.as_deref() == Some(stage.id.as_str()) {
            return true;
        }
        match (&self.external_group_ref, &stage.external_group_ref) {
            (Some(task_ref), Some(stage_ref)) => task_ref == stage_ref,
            _ => false,
        }
    }
}

/// Validate a project or stage name: non-blank and at most [`MAX_NAME_LEN`] characters.
pub fn validate_name(name: &str) -> CoreResult<()> {
    if name.trim().is_empty() {
        return Err(CoreError::validation("Name cannot be empty"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(CoreError::validation(format!(
            "Name cannot exceed {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(())
}

/// Validate that a stage does not end before it starts.
pub fn validate_stage_dates(start: DateTime<Utc>, end: DateTime<Utc>) -> CoreResult<()> {
    if end < start {
        return Err(CoreError::validation(format!(
            "End date {} is before start date {}",
            end.date_naive(),
            start.date_naive()
        )));
    }
    Ok(())
}

/// Validate project dates; passes when either bound is absent.
pub fn validate_project_dates(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> CoreResult<()> {
    match (start, end) {
        (Some(start), Some(end)) => validate_stage_dates(start, end),
        _ => Ok(()),
    }
}

/// A paused stage must carry a non-blank reason.
pub fn validate_pause_reason(status: StageStatus, reason: Option<&str>) -> CoreResult<()> {
    if status == StageStatus::Paused && reason.is_none_or(|r| r.trim().is_empty()) {
        return Err(CoreError::validation("Pause reason is required"));
    }
    Ok(())
}
