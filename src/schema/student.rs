use super::{
    check_grade, check_not_blank, check_optional_email, deserialize_some, is_valid_username,
    next_timestamp, normalize_optional, normalize_required, parse_update, FieldReader,
    ValidationErrors,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A persisted student
///
/// `name` is derived from `first_name` and `last_name` and is recomputed on
/// every write; it is never read back from storage.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub name: String,
    pub username: String,
    pub grade: String,
    pub avatar_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guardian_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guardian_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guardian_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub assignments_completed: u32,
    pub average_score: f64,
    pub last_active: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A student that has not been saved yet (no id, no timestamps)
#[derive(Debug, Clone, PartialEq)]
pub struct NewStudent {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub grade: String,
    pub avatar_id: Uuid,
    pub pin: Option<String>,
    pub guardian_name: Option<String>,
    pub guardian_email: Option<String>,
    pub guardian_phone: Option<String>,
    pub notes: Option<String>,
    pub email: Option<String>,
    pub assignments_completed: Option<u32>,
    pub average_score: Option<f64>,
    pub last_active: Option<DateTime<Utc>>,
}

/// The closed set of fields an update may change
///
/// Optional profile fields are tri-state: absent leaves the field alone,
/// `Some(None)` clears it, `Some(Some(v))` sets it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StudentUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub grade: Option<String>,
    pub avatar_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub pin: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub guardian_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub guardian_email: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub guardian_phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub email: Option<Option<String>>,
    pub assignments_completed: Option<u32>,
    pub average_score: Option<f64>,
    pub last_active: Option<DateTime<Utc>>,
}

/// Explicit create-or-update request accepted by `save`
#[derive(Debug, Clone, PartialEq)]
pub enum StudentWrite {
    Create(NewStudent),
    Update { id: Uuid, changes: StudentUpdate },
}

pub fn display_name(first_name: &str, last_name: &str) -> String {
    format!("{} {}", first_name, last_name)
}

impl NewStudent {
    /// Unsaved student with the required fields; optional fields start absent.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        username: impl Into<String>,
        grade: impl Into<String>,
        avatar_id: Uuid,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            username: username.into(),
            grade: grade.into(),
            avatar_id,
            pin: None,
            guardian_name: None,
            guardian_email: None,
            guardian_phone: None,
            notes: None,
            email: None,
            assignments_completed: None,
            average_score: None,
            last_active: None,
        }
    }

    pub fn with_pin(mut self, pin: impl Into<String>) -> Self {
        self.pin = Some(pin.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_guardian(
        mut self,
        name: impl Into<String>,
        email: Option<String>,
        phone: Option<String>,
    ) -> Self {
        self.guardian_name = Some(name.into());
        self.guardian_email = email;
        self.guardian_phone = phone;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Validate untrusted input into an unsaved student.
    pub fn parse(raw: &Value) -> Result<Self, ValidationErrors> {
        let mut reader = FieldReader::new(raw);
        let draft = read_profile(&mut reader);
        reader.finish(draft, |draft, errors| check_new(draft, errors))
    }

    /// Check constraints on a value built in code rather than parsed.
    pub fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_new(self, &mut errors);
        errors.into_result()
    }
}

impl StudentUpdate {
    /// Parse untrusted input; unknown fields are rejected.
    pub fn parse(raw: &Value) -> Result<Self, ValidationErrors> {
        parse_update(raw)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl Student {
    /// Validate a stored document (or any untrusted full record).
    pub fn validate(raw: &Value) -> Result<Self, ValidationErrors> {
        let mut reader = FieldReader::new(raw);
        let profile = read_profile(&mut reader);
        let id = reader.required_uuid("id");
        let created_at = reader.required_timestamp("createdAt");
        let updated_at = reader.required_timestamp("updatedAt");

        let student = match (profile, id, created_at, updated_at) {
            (Some(profile), Some(id), Some(created_at), Some(updated_at)) => {
                let mut student = Student::from_new(profile, id, created_at);
                student.updated_at = updated_at;
                Some(student)
            }
            _ => None,
        };

        reader.finish(student, |student, errors| student.check_into(errors))
    }

    /// Materialize an unsaved student with its assigned id and creation time.
    pub(crate) fn from_new(new: NewStudent, id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: String::new(),
            first_name: new.first_name,
            last_name: new.last_name,
            username: new.username,
            grade: new.grade,
            avatar_id: new.avatar_id,
            pin: new.pin,
            guardian_name: new.guardian_name,
            guardian_email: new.guardian_email,
            guardian_phone: new.guardian_phone,
            notes: new.notes,
            email: new.email,
            assignments_completed: new.assignments_completed.unwrap_or(0),
            average_score: new.average_score.unwrap_or(0.0),
            last_active: new.last_active.unwrap_or(now),
            created_at: now,
            updated_at: now,
        }
        .normalized()
    }

    /// Merge an update into a copy of this record, refreshing `name` and
    /// `updated_at`. `id` and `created_at` never change.
    pub(crate) fn apply(&self, changes: StudentUpdate) -> Self {
        let mut next = self.clone();

        if let Some(first_name) = changes.first_name {
            next.first_name = first_name;
        }
        if let Some(last_name) = changes.last_name {
            next.last_name = last_name;
        }
        if let Some(username) = changes.username {
            next.username = username;
        }
        if let Some(grade) = changes.grade {
            next.grade = grade;
        }
        if let Some(avatar_id) = changes.avatar_id {
            next.avatar_id = avatar_id;
        }
        if let Some(pin) = changes.pin {
            next.pin = pin;
        }
        if let Some(guardian_name) = changes.guardian_name {
            next.guardian_name = guardian_name;
        }
        if let Some(guardian_email) = changes.guardian_email {
            next.guardian_email = guardian_email;
        }
        if let Some(guardian_phone) = changes.guardian_phone {
            next.guardian_phone = guardian_phone;
        }
        if let Some(notes) = changes.notes {
            next.notes = notes;
        }
        if let Some(email) = changes.email {
            next.email = email;
        }
        if let Some(count) = changes.assignments_completed {
            next.assignments_completed = count;
        }
        if let Some(score) = changes.average_score {
            next.average_score = score;
        }
        if let Some(last_active) = changes.last_active {
            next.last_active = last_active;
        }

        let mut next = next.normalized();
        next.updated_at = next_timestamp(self.updated_at);
        next
    }

    /// Storage form shared by create, update and load: required strings
    /// trimmed, blank optionals absent, `name` derived.
    fn normalized(mut self) -> Self {
        self.first_name = normalize_required(&self.first_name);
        self.last_name = normalize_required(&self.last_name);
        self.username = normalize_required(&self.username);
        self.grade = normalize_required(&self.grade);
        self.pin = normalize_optional(self.pin.take());
        self.guardian_name = normalize_optional(self.guardian_name.take());
        self.guardian_email = normalize_optional(self.guardian_email.take());
        self.guardian_phone = normalize_optional(self.guardian_phone.take());
        self.notes = normalize_optional(self.notes.take());
        self.email = normalize_optional(self.email.take());
        self.name = display_name(&self.first_name, &self.last_name);
        self
    }

    pub fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.check_into(&mut errors);
        errors.into_result()
    }

    fn check_into(&self, errors: &mut ValidationErrors) {
        check_not_blank(errors, "firstName", &self.first_name);
        check_not_blank(errors, "lastName", &self.last_name);
        if !is_valid_username(&self.username) {
            errors.add(
                "username",
                "must be at least 3 letters, digits or underscores",
            );
        }
        check_grade(errors, "grade", &self.grade);
        check_optional_email(errors, "email", self.email.as_deref());
        check_optional_email(errors, "guardianEmail", self.guardian_email.as_deref());
        if !self.average_score.is_finite() || self.average_score < 0.0 {
            errors.add("averageScore", "must be a non-negative number");
        }
    }

    /// PIN check: a student without a PIN accepts any submission, including
    /// none; otherwise the submitted PIN must match exactly.
    pub fn verify_pin(&self, submitted: Option<&str>) -> bool {
        match self.pin.as_deref() {
            None => true,
            Some(expected) => submitted == Some(expected),
        }
    }
}

fn read_profile(reader: &mut FieldReader<'_>) -> Option<NewStudent> {
    let first_name = reader.required_string("firstName");
    let last_name = reader.required_string("lastName");
    let username = reader.required_string("username");
    let grade = reader.required_string("grade");
    let avatar_id = reader.required_uuid("avatarId");
    let pin = reader.optional_string("pin");
    let guardian_name = reader.optional_string("guardianName");
    let guardian_email = reader.optional_string("guardianEmail");
    let guardian_phone = reader.optional_string("guardianPhone");
    let notes = reader.optional_string("notes");
    let email = reader.optional_string("email");
    let assignments_completed = reader.optional_u32("assignmentsCompleted");
    let average_score = reader.optional_f64("averageScore");
    let last_active = reader.optional_timestamp("lastActive");

    Some(NewStudent {
        first_name: first_name?,
        last_name: last_name?,
        username: username?,
        grade: grade?,
        avatar_id: avatar_id?,
        pin,
        guardian_name,
        guardian_email,
        guardian_phone,
        notes,
        email,
        assignments_completed,
        average_score,
        last_active,
    })
}

fn check_new(draft: &NewStudent, errors: &mut ValidationErrors) {
    // Materializing with placeholder identity reuses the record checks.
    Student::from_new(draft.clone(), Uuid::nil(), Utc::now()).check_into(errors);
}
