use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const OPTION_COUNT: usize = 4;

/// A scenario-based multiple-choice question produced by the quiz generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    pub explanation: String,
}

impl AssessmentItem {
    /// Structural checks applied after parsing. A record failing any of them is
    /// rejected as a whole.
    pub fn is_valid(&self) -> bool {
        !self.question.trim().is_empty()
            && self.options.len() == OPTION_COUNT
            && self.correct_answer < self.options.len()
    }

    pub fn is_correct(&self, choice: usize) -> bool {
        choice == self.correct_answer
    }
}

/// Output schema declared to the completion service for quiz generation.
pub fn assessment_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "id": { "type": "INTEGER" },
            "question": { "type": "STRING" },
            "options": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "minItems": OPTION_COUNT,
                "maxItems": OPTION_COUNT
            },
            "correctAnswer": {
                "type": "INTEGER",
                "description": "0-based index of the correct answer"
            },
            "explanation": {
                "type": "STRING",
                "description": "Explanation of why the answer is correct and others are wrong"
            }
        },
        "required": ["id", "question", "options", "correctAnswer", "explanation"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(options: usize, correct: usize) -> AssessmentItem {
        AssessmentItem {
            id: None,
            question: "Which control stops lateral movement?".to_string(),
            options: (0..options).map(|i| format!("option {}", i)).collect(),
            correct_answer: correct,
            explanation: "Segmentation.".to_string(),
        }
    }

    #[test]
    fn validity_requires_four_options_and_in_range_answer() {
        assert!(item(4, 3).is_valid());
        assert!(!item(3, 0).is_valid());
        assert!(!item(5, 0).is_valid());
        assert!(!item(4, 4).is_valid());
    }

    #[test]
    fn blank_question_is_invalid() {
        let mut blank = item(4, 0);
        blank.question = "  ".to_string();
        assert!(!blank.is_valid());
    }

    #[test]
    fn schema_declares_every_field_required() {
        let schema = assessment_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert_eq!(required, vec!["id", "question", "options", "correctAnswer", "explanation"]);
        assert_eq!(schema["properties"]["options"]["minItems"], 4);
    }

    #[test]
    fn serializes_with_provider_field_names() {
        let value = serde_json::to_value(item(4, 2)).unwrap();
        assert_eq!(value["correctAnswer"], 2);
        assert!(value.get("id").is_none());
    }
}
