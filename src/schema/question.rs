use super::{
    check_not_blank, next_timestamp, normalize_required, parse_update, FieldReader,
    ValidationErrors,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

const DEFAULT_POINTS: u32 = 1;

/// A persisted question belonging to an assignment
///
/// `assignment_id` is a plain reference; nothing checks that the assignment
/// exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: Uuid,
    pub assignment_id: Uuid,
    pub prompt: String,
    pub choices: Vec<String>,
    pub correct_answer: String,
    pub points: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewQuestion {
    pub assignment_id: Uuid,
    pub prompt: String,
    pub choices: Vec<String>,
    pub correct_answer: String,
    pub points: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct QuestionUpdate {
    pub assignment_id: Option<Uuid>,
    pub prompt: Option<String>,
    pub choices: Option<Vec<String>>,
    pub correct_answer: Option<String>,
    pub points: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QuestionWrite {
    Create(NewQuestion),
    Update { id: Uuid, changes: QuestionUpdate },
}

impl NewQuestion {
    /// Free-response question
    pub fn new(
        assignment_id: Uuid,
        prompt: impl Into<String>,
        correct_answer: impl Into<String>,
    ) -> Self {
        Self {
            assignment_id,
            prompt: prompt.into(),
            choices: Vec::new(),
            correct_answer: correct_answer.into(),
            points: None,
        }
    }

    pub fn with_choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_points(mut self, points: u32) -> Self {
        self.points = Some(points);
        self
    }

    pub fn parse(raw: &Value) -> Result<Self, ValidationErrors> {
        let mut reader = FieldReader::new(raw);
        let draft = read_fields(&mut reader);
        reader.finish(draft, |draft, errors| {
            Question::from_new(draft.clone(), Uuid::nil(), Utc::now()).check_into(errors)
        })
    }
}

impl QuestionUpdate {
    pub fn parse(raw: &Value) -> Result<Self, ValidationErrors> {
        parse_update(raw)
    }
}

impl Question {
    pub fn validate(raw: &Value) -> Result<Self, ValidationErrors> {
        let mut reader = FieldReader::new(raw);
        let fields = read_fields(&mut reader);
        let id = reader.required_uuid("id");
        let created_at = reader.required_timestamp("createdAt");
        let updated_at = reader.required_timestamp("updatedAt");

        let question = match (fields, id, created_at, updated_at) {
            (Some(fields), Some(id), Some(created_at), Some(updated_at)) => {
                let mut question = Question::from_new(fields, id, created_at);
                question.updated_at = updated_at;
                Some(question)
            }
            _ => None,
        };

        reader.finish(question, |question, errors| question.check_into(errors))
    }

    pub(crate) fn from_new(new: NewQuestion, id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id,
            assignment_id: new.assignment_id,
            prompt: new.prompt,
            choices: new.choices,
            correct_answer: new.correct_answer,
            points: new.points.unwrap_or(DEFAULT_POINTS),
            created_at: now,
            updated_at: now,
        }
        .normalized()
    }

    pub(crate) fn apply(&self, changes: QuestionUpdate) -> Self {
        let mut next = self.clone();
        if let Some(assignment_id) = changes.assignment_id {
            next.assignment_id = assignment_id;
        }
        if let Some(prompt) = changes.prompt {
            next.prompt = prompt;
        }
        if let Some(choices) = changes.choices {
            next.choices = choices;
        }
        if let Some(correct_answer) = changes.correct_answer {
            next.correct_answer = correct_answer;
        }
        if let Some(points) = changes.points {
            next.points = points;
        }
        let mut next = next.normalized();
        next.updated_at = next_timestamp(self.updated_at);
        next
    }

    /// Storage form shared by create, update and load; choices are compared
    /// against the answer after trimming both.
    fn normalized(mut self) -> Self {
        self.prompt = normalize_required(&self.prompt);
        self.correct_answer = normalize_required(&self.correct_answer);
        self.choices = self
            .choices
            .iter()
            .map(|choice| normalize_required(choice))
            .collect();
        self
    }

    pub fn is_multiple_choice(&self) -> bool {
        !self.choices.is_empty()
    }

    pub fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.check_into(&mut errors);
        errors.into_result()
    }

    fn check_into(&self, errors: &mut ValidationErrors) {
        check_not_blank(errors, "prompt", &self.prompt);
        check_not_blank(errors, "correctAnswer", &self.correct_answer);
        for (index, choice) in self.choices.iter().enumerate() {
            check_not_blank(errors, &format!("choices[{}]", index), choice);
        }
        if self.is_multiple_choice() && !self.choices.contains(&self.correct_answer) {
            errors.add("correctAnswer", "must be one of the choices");
        }
        if self.points == 0 {
            errors.add("points", "must be at least 1");
        }
    }
}

fn read_fields(reader: &mut FieldReader<'_>) -> Option<NewQuestion> {
    let assignment_id = reader.required_uuid("assignmentId");
    let prompt = reader.required_string("prompt");
    let choices = reader.string_list("choices");
    let correct_answer = reader.required_string("correctAnswer");
    let points = reader.optional_u32("points");

    Some(NewQuestion {
        assignment_id: assignment_id?,
        prompt: prompt?,
        choices,
        correct_answer: correct_answer?,
        points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_points() {
        let question = Question::from_new(
            NewQuestion::new(Uuid::new_v4(), "2 + 2?", "4"),
            Uuid::new_v4(),
            Utc::now(),
        );
        assert_eq!(question.points, 1);
        assert!(!question.is_multiple_choice());
    }

    #[test]
    fn test_answer_must_be_a_choice() {
        let question = Question::from_new(
            NewQuestion::new(Uuid::new_v4(), "2 + 2?", "5").with_choices(["3", "4"]),
            Uuid::new_v4(),
            Utc::now(),
        );
        let errors = question.check().unwrap_err();
        assert_eq!(errors.get("correctAnswer"), Some("must be one of the choices"));
    }

    #[test]
    fn test_parse_rejects_zero_points() {
        let errors = NewQuestion::parse(&json!({
            "assignmentId": Uuid::new_v4().to_string(),
            "prompt": "2 + 2?",
            "correctAnswer": "4",
            "points": 0
        }))
        .unwrap_err();
        assert!(errors.contains("points"));
    }

    #[test]
    fn test_padded_answer_still_matches_padded_choice() {
        let question = Question::from_new(
            NewQuestion::new(Uuid::new_v4(), " Pick one ", "a ").with_choices(["a ", " b"]),
            Uuid::new_v4(),
            Utc::now(),
        );
        assert_eq!(question.choices, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(question.correct_answer, "a");
        assert!(question.check().is_ok());

        let raw = serde_json::to_value(&question).unwrap();
        assert_eq!(Question::validate(&raw).unwrap(), question);
    }

    #[test]
    fn test_update_rejects_unknown_field() {
        let errors = QuestionUpdate::parse(&json!({ "createdAt": "2024-01-01T00:00:00Z" }))
            .unwrap_err();
        assert_eq!(errors.get("createdAt"), Some("is not an updatable field"));
    }

    #[test]
    fn test_validate_round_trip() {
        let question = Question::from_new(
            NewQuestion::new(Uuid::new_v4(), "Capital of France?", "Paris")
                .with_choices(["Paris", "Rome"])
                .with_points(3),
            Uuid::new_v4(),
            Utc::now(),
        );
        let raw = serde_json::to_value(&question).unwrap();
        assert_eq!(Question::validate(&raw).unwrap(), question);
    }
}
