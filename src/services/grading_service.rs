use crate::models::answer::{Answer, AnswerInput};
use crate::models::question::{Question, QuestionKind};
use crate::utils::multi_select;
use crate::utils::normalize::normalize_answer;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Client-side grading for the sample test, guest demo exams and answer review.
/// Registered-student and institute exams are scored by the platform; nothing
/// here is authoritative for them.
pub struct GradingService;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Marker {
    Correct,
    Incorrect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradedQuestion {
    pub question_id: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub student_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
    pub marks_awarded: f64,
    pub max_marks: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocalScore {
    pub earned_marks: f64,
    pub total_marks: f64,
    pub percentage: Decimal,
    pub passed: Option<bool>,
    pub correct_count: usize,
    pub items: Vec<GradedQuestion>,
}

impl LocalScore {
    pub fn percentage_f64(&self) -> f64 {
        self.percentage.to_f64().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionMark {
    pub text: String,
    pub selected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewItem {
    pub question_id: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionMark>,
    pub student_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
}

fn token_set(normalized: &str) -> HashSet<String> {
    multi_select::decode(normalized)
        .iter()
        .map(|token| normalize_answer(token))
        .collect()
}

impl GradingService {
    pub fn is_correct(kind: QuestionKind, correct_answer: &str, student_answer: &str) -> bool {
        let student = normalize_answer(student_answer);
        if student.is_empty() {
            return false;
        }
        let correct = normalize_answer(correct_answer);

        match kind {
            QuestionKind::MultipleChoice => {
                let given = token_set(&student);
                !given.is_empty() && given == token_set(&correct)
            }
            QuestionKind::RadioButton | QuestionKind::TrueFalse | QuestionKind::ShortAnswer => {
                student == correct
            }
        }
    }

    /// Student answer for `question` in the platform string encoding; empty when unanswered.
    fn answer_wire(question: &Question, answers: &HashMap<String, AnswerInput>) -> String {
        answers
            .get(&question.id)
            .map(|input| Answer::from_input(question.kind(), input).to_wire())
            .unwrap_or_default()
    }

    pub fn grade_locally(
        questions: &[Question],
        answers: &HashMap<String, AnswerInput>,
        passing_percentage: Option<Decimal>,
    ) -> LocalScore {
        let mut earned_marks = 0.0;
        let mut total_marks = 0.0;
        let mut correct_count = 0;
        let mut items = Vec::with_capacity(questions.len());

        for q in questions {
            total_marks += q.marks;
            let student_answer = Self::answer_wire(q, answers);
            let correct_answer = q.correct_answer_wire();
            let is_correct = Self::is_correct(q.kind(), &correct_answer, &student_answer);
            let marks_awarded = if is_correct { q.marks } else { 0.0 };
            if is_correct {
                correct_count += 1;
                earned_marks += q.marks;
            }
            items.push(GradedQuestion {
                question_id: q.id.clone(),
                kind: q.kind(),
                student_answer,
                correct_answer,
                is_correct,
                marks_awarded,
                max_marks: q.marks,
            });
        }

        let percentage = percentage_of(earned_marks, total_marks);
        LocalScore {
            earned_marks,
            total_marks,
            percentage,
            passed: passing_percentage.map(|threshold| percentage >= threshold),
            correct_count,
            items,
        }
    }

    pub fn review(questions: &[Question], answers: &HashMap<String, AnswerInput>) -> Vec<ReviewItem> {
        questions
            .iter()
            .map(|q| {
                let student_answer = Self::answer_wire(q, answers);
                let correct_answer = q.correct_answer_wire();
                let is_correct = Self::is_correct(q.kind(), &correct_answer, &student_answer);

                let options = if q.kind().has_options() {
                    let (selected, correct) = match q.kind() {
                        QuestionKind::MultipleChoice => (
                            token_set(&normalize_answer(&student_answer)),
                            token_set(&normalize_answer(&correct_answer)),
                        ),
                        _ => (
                            HashSet::from([normalize_answer(&student_answer)]),
                            HashSet::from([normalize_answer(&correct_answer)]),
                        ),
                    };
                    q.options()
                        .iter()
                        .map(|option| {
                            let key = normalize_answer(option);
                            let is_selected = selected.contains(&key);
                            let marker = if correct.contains(&key) {
                                Some(Marker::Correct)
                            } else if is_selected {
                                Some(Marker::Incorrect)
                            } else {
                                None
                            };
                            OptionMark {
                                text: option.clone(),
                                selected: is_selected,
                                marker,
                            }
                        })
                        .collect()
                } else {
                    Vec::new()
                };

                ReviewItem {
                    question_id: q.id.clone(),
                    text: q.text.clone(),
                    kind: q.kind(),
                    options,
                    student_answer,
                    correct_answer,
                    is_correct,
                }
            })
            .collect()
    }
}

/// `earned / total * 100`, rounded to two decimal places; zero when nothing is gradable.
pub fn percentage_of(earned: f64, total: f64) -> Decimal {
    if total <= 0.0 {
        return Decimal::ZERO;
    }
    let earned = Decimal::from_f64(earned).unwrap_or(Decimal::ZERO);
    let total = Decimal::from_f64(total).unwrap_or(Decimal::ONE);
    (earned * Decimal::ONE_HUNDRED / total).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::QuestionDetails;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn mc(id: &str, options: &[&str], correct: &[&str], marks: f64) -> Question {
        Question {
            id: id.into(),
            text: format!("question {}", id),
            marks,
            details: QuestionDetails::MultipleChoice {
                options: options.iter().map(|s| s.to_string()).collect(),
                correct: correct.iter().map(|s| s.to_string()).collect(),
            },
        }
    }

    fn short(id: &str, correct: &str, marks: f64) -> Question {
        Question {
            id: id.into(),
            text: format!("question {}", id),
            marks,
            details: QuestionDetails::ShortAnswer {
                correct: correct.into(),
            },
        }
    }

    fn radio(id: &str, options: &[&str], correct: &str) -> Question {
        Question {
            id: id.into(),
            text: format!("question {}", id),
            marks: 1.0,
            details: QuestionDetails::RadioButton {
                options: options.iter().map(|s| s.to_string()).collect(),
                correct: correct.into(),
            },
        }
    }

    #[test]
    fn short_answer_ignores_case_and_padding() {
        assert!(GradingService::is_correct(QuestionKind::ShortAnswer, "Paris", "  paris "));
    }

    #[test]
    fn radio_requires_same_option() {
        assert!(!GradingService::is_correct(QuestionKind::RadioButton, "Option A", "Option B"));
        assert!(GradingService::is_correct(QuestionKind::RadioButton, "Option A", "option a"));
    }

    #[test]
    fn multiple_choice_is_order_independent() {
        assert!(GradingService::is_correct(QuestionKind::MultipleChoice, "A and B", "B and A"));
        assert!(GradingService::is_correct(QuestionKind::MultipleChoice, "A and B", "b and a and B"));
    }

    #[test]
    fn multiple_choice_subset_is_wrong() {
        assert!(!GradingService::is_correct(QuestionKind::MultipleChoice, "A and B", "A"));
        assert!(!GradingService::is_correct(QuestionKind::MultipleChoice, "A", "A and B"));
    }

    #[test]
    fn unanswered_is_never_correct() {
        for kind in QuestionKind::ALL {
            assert!(!GradingService::is_correct(kind, "anything", ""));
            assert!(!GradingService::is_correct(kind, "", "   "));
        }
    }

    #[test]
    fn true_false_compares_normalized_strings() {
        assert!(GradingService::is_correct(QuestionKind::TrueFalse, "true", "TRUE"));
        assert!(!GradingService::is_correct(QuestionKind::TrueFalse, "true", "false"));
    }

    #[test]
    fn grade_locally_totals_marks_and_pass_flag() {
        let questions = vec![
            mc("1", &["A", "B", "C"], &["A", "C"], 2.0),
            short("2", "Paris", 1.0),
            radio("3", &["x", "y"], "y"),
        ];
        let answers = HashMap::from([
            ("1".to_string(), AnswerInput::Many(vec!["C".into(), "A".into()])),
            ("2".to_string(), AnswerInput::One("paris".into())),
            ("3".to_string(), AnswerInput::One("x".into())),
        ]);

        let score = GradingService::grade_locally(&questions, &answers, Some(dec("70")));
        assert_eq!(score.earned_marks, 3.0);
        assert_eq!(score.total_marks, 4.0);
        assert_eq!(score.percentage, dec("75"));
        assert_eq!(score.passed, Some(true));
        assert_eq!(score.correct_count, 2);
        assert_eq!(score.items[0].student_answer, "C and A");
        assert!(!score.items[2].is_correct);
        assert_eq!(score.items[2].marks_awarded, 0.0);
    }

    #[test]
    fn grade_locally_counts_missing_answers_as_wrong() {
        let questions = vec![short("1", "a", 1.0), short("2", "b", 2.0)];
        let answers = HashMap::from([("1".to_string(), AnswerInput::One("A".into()))]);
        let score = GradingService::grade_locally(&questions, &answers, None);
        assert_eq!(score.percentage, dec("33.33"));
        assert_eq!(score.passed, None);
        assert_eq!(score.items[1].student_answer, "");
    }

    #[test]
    fn empty_exam_scores_zero() {
        let score = GradingService::grade_locally(&[], &HashMap::new(), Some(dec("50")));
        assert_eq!(score.percentage, Decimal::ZERO);
        assert_eq!(score.passed, Some(false));
    }

    #[test]
    fn review_marks_correct_and_wrongly_selected_options() {
        let questions = vec![mc("1", &["A", "B", "C"], &["A", "B"], 1.0)];
        let answers = HashMap::from([(
            "1".to_string(),
            AnswerInput::One("a and C".into()),
        )]);
        let review = GradingService::review(&questions, &answers);
        let marks: Vec<Option<Marker>> = review[0].options.iter().map(|o| o.marker).collect();
        assert_eq!(
            marks,
            vec![Some(Marker::Correct), Some(Marker::Correct), Some(Marker::Incorrect)]
        );
        assert!(review[0].options[0].selected);
        assert!(!review[0].options[1].selected);
        assert!(!review[0].is_correct);
    }

    #[test]
    fn review_of_text_question_has_no_option_marks() {
        let questions = vec![short("1", "Paris", 1.0)];
        let answers = HashMap::from([("1".to_string(), AnswerInput::One(" PARIS".into()))]);
        let review = GradingService::review(&questions, &answers);
        assert!(review[0].options.is_empty());
        assert!(review[0].is_correct);
    }
}
