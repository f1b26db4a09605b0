use super::{
    check_grade, check_not_blank, deserialize_some, next_timestamp, normalize_optional,
    normalize_required, parse_update, FieldReader, ValidationErrors,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A persisted assignment; `title` is unique across the collection
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: Uuid,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub subject: String,
    pub grade: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAssignment {
    pub title: String,
    pub description: Option<String>,
    pub subject: String,
    pub grade: String,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AssignmentUpdate {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub description: Option<Option<String>>,
    pub subject: Option<String>,
    pub grade: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub due_date: Option<Option<DateTime<Utc>>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AssignmentWrite {
    Create(NewAssignment),
    Update { id: Uuid, changes: AssignmentUpdate },
}

impl NewAssignment {
    pub fn new(
        title: impl Into<String>,
        subject: impl Into<String>,
        grade: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: None,
            subject: subject.into(),
            grade: grade.into(),
            due_date: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn parse(raw: &Value) -> Result<Self, ValidationErrors> {
        let mut reader = FieldReader::new(raw);
        let draft = read_fields(&mut reader);
        reader.finish(draft, |draft, errors| {
            Assignment::from_new(draft.clone(), Uuid::nil(), Utc::now()).check_into(errors)
        })
    }
}

impl AssignmentUpdate {
    pub fn parse(raw: &Value) -> Result<Self, ValidationErrors> {
        parse_update(raw)
    }
}

impl Assignment {
    pub fn validate(raw: &Value) -> Result<Self, ValidationErrors> {
        let mut reader = FieldReader::new(raw);
        let fields = read_fields(&mut reader);
        let id = reader.required_uuid("id");
        let created_at = reader.required_timestamp("createdAt");
        let updated_at = reader.required_timestamp("updatedAt");

        let assignment = match (fields, id, created_at, updated_at) {
            (Some(fields), Some(id), Some(created_at), Some(updated_at)) => {
                let mut assignment = Assignment::from_new(fields, id, created_at);
                assignment.updated_at = updated_at;
                Some(assignment)
            }
            _ => None,
        };

        reader.finish(assignment, |assignment, errors| assignment.check_into(errors))
    }

    pub(crate) fn from_new(new: NewAssignment, id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: new.title,
            description: new.description,
            subject: new.subject,
            grade: new.grade,
            due_date: new.due_date,
            created_at: now,
            updated_at: now,
        }
        .normalized()
    }

    pub(crate) fn apply(&self, changes: AssignmentUpdate) -> Self {
        let mut next = self.clone();
        if let Some(title) = changes.title {
            next.title = title;
        }
        if let Some(description) = changes.description {
            next.description = description;
        }
        if let Some(subject) = changes.subject {
            next.subject = subject;
        }
        if let Some(grade) = changes.grade {
            next.grade = grade;
        }
        if let Some(due_date) = changes.due_date {
            next.due_date = due_date;
        }
        let mut next = next.normalized();
        next.updated_at = next_timestamp(self.updated_at);
        next
    }

    /// Storage form shared by create, update and load
    fn normalized(mut self) -> Self {
        self.title = normalize_required(&self.title);
        self.subject = normalize_required(&self.subject);
        self.grade = normalize_required(&self.grade);
        self.description = normalize_optional(self.description.take());
        self
    }

    pub fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.check_into(&mut errors);
        errors.into_result()
    }

    fn check_into(&self, errors: &mut ValidationErrors) {
        check_not_blank(errors, "title", &self.title);
        check_not_blank(errors, "subject", &self.subject);
        check_grade(errors, "grade", &self.grade);
    }
}

fn read_fields(reader: &mut FieldReader<'_>) -> Option<NewAssignment> {
    let title = reader.required_string("title");
    let description = reader.optional_string("description");
    let subject = reader.required_string("subject");
    let grade = reader.required_string("grade");
    let due_date = reader.optional_timestamp("dueDate");

    Some(NewAssignment {
        title: title?,
        description,
        subject: subject?,
        grade: grade?,
        due_date,
    })
}
