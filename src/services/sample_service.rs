use crate::models::question::{PresentedQuestion, Question, QuestionDetails};
use rust_decimal::Decimal;
use std::sync::OnceLock;

/// Passing threshold shown on the public sample test.
pub const SAMPLE_PASSING_PERCENTAGE: Decimal = Decimal::from_parts(60, 0, 0, false, 0);

static SAMPLE_QUESTIONS: OnceLock<Vec<Question>> = OnceLock::new();

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn build() -> Vec<Question> {
    vec![
        Question {
            id: "1".into(),
            text: "Which of these are programming languages?".into(),
            marks: 2.0,
            details: QuestionDetails::MultipleChoice {
                options: strings(&["Rust", "HTML", "Python", "CSS"]),
                correct: strings(&["Rust", "Python"]),
            },
        },
        Question {
            id: "2".into(),
            text: "What is the capital of France?".into(),
            marks: 1.0,
            details: QuestionDetails::RadioButton {
                options: strings(&["Berlin", "Madrid", "Paris", "Rome"]),
                correct: "Paris".into(),
            },
        },
        Question {
            id: "3".into(),
            text: "The sun rises in the east.".into(),
            marks: 1.0,
            details: QuestionDetails::TrueFalse { correct: true },
        },
        Question {
            id: "4".into(),
            text: "How many days are there in a leap year?".into(),
            marks: 1.0,
            details: QuestionDetails::ShortAnswer {
                correct: "366".into(),
            },
        },
        Question {
            id: "5".into(),
            text: "Which planets are gas giants?".into(),
            marks: 2.0,
            details: QuestionDetails::MultipleChoice {
                options: strings(&["Mars", "Jupiter", "Saturn", "Venus"]),
                correct: strings(&["Jupiter", "Saturn"]),
            },
        },
    ]
}

/// Fixed question set for unauthenticated visitors.
pub struct SampleService;

impl SampleService {
    pub fn questions() -> &'static [Question] {
        SAMPLE_QUESTIONS.get_or_init(build)
    }

    pub fn presented() -> Vec<PresentedQuestion> {
        Self::questions()
            .iter()
            .enumerate()
            .map(|(idx, q)| q.to_raw().present(idx))
            .collect()
    }
}
