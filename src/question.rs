use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// A single questionnaire item. Its index is its position in the input sequence.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(from = "QuestionInput")]
pub struct Question {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_no: Option<String>,
    pub question_text: String,
}

impl Question {
    pub fn new<S: Into<String>>(question_text: S) -> Self {
        Self {
            question_no: None,
            question_text: question_text.into(),
        }
    }

    pub fn with_number<S: Into<String>>(mut self, question_no: S) -> Self {
        self.question_no = Some(question_no.into());
        self
    }
}

impl Display for Question {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.question_no {
            Some(no) => write!(f, "{}. {}", no, self.question_text),
            None => write!(f, "{}", self.question_text),
        }
    }
}

/// Accepted input shapes: a bare string or a full question object.
#[derive(Deserialize)]
#[serde(untagged)]
enum QuestionInput {
    Text(String),
    Full {
        #[serde(default)]
        question_no: Option<String>,
        question_text: String,
    },
}

impl From<QuestionInput> for Question {
    fn from(input: QuestionInput) -> Self {
        match input {
            QuestionInput::Text(question_text) => Question::new(question_text),
            QuestionInput::Full {
                question_no,
                question_text,
            } => Question {
                question_no,
                question_text,
            },
        }
    }
}
