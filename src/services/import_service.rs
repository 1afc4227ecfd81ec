use crate::models::question::{is_valid_type, QuestionKind, RawQuestion};
use crate::models::student::{RowOutcome, RowReport, StudentRow, StudentUploadError};
use crate::utils::csv::{self, field};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use validator::ValidateEmail;

const COL_TYPE: usize = 0;
const COL_TEXT: usize = 1;
const COL_FIRST_OPTION: usize = 2;
const OPTION_COLUMNS: usize = 4;
const COL_CORRECT: usize = 6;
const COL_MARKS: usize = 7;

const COL_STUDENT_NAME: usize = 0;
const COL_STUDENT_EMAIL: usize = 1;
const COL_STUDENT_BRANCH: usize = 2;

#[derive(Debug, Clone, Default, Serialize)]
pub struct QuestionImport {
    pub questions: Vec<RawQuestion>,
    /// Line numbers of rows that were dropped as incomplete.
    pub skipped_lines: Vec<usize>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StudentImport {
    pub rows: Vec<StudentRow>,
    pub skipped: Vec<RowReport>,
}

pub struct ImportService;

impl ImportService {
    /// Maps CSV rows in the fixed column order
    /// `type, text, option1..option4, correct answer, marks` onto questions.
    ///
    /// Rows without text, without a correct answer, or with non-numeric marks
    /// are dropped. A header line falls out through the marks check.
    pub fn parse_questions_csv(text: &str) -> QuestionImport {
        let mut import = QuestionImport::default();

        for (line_no, fields) in csv::records(text) {
            match Self::map_question_row(&fields) {
                Some(question) => import.questions.push(question),
                None => {
                    tracing::debug!(line_no, "Dropping incomplete question row");
                    import.skipped_lines.push(line_no);
                }
            }
        }

        tracing::info!(
            imported = import.questions.len(),
            skipped = import.skipped_lines.len(),
            "Parsed question CSV"
        );
        import
    }

    fn map_question_row(fields: &[String]) -> Option<RawQuestion> {
        let text = field(fields, COL_TEXT);
        let correct_answer = field(fields, COL_CORRECT);
        let marks: f64 = field(fields, COL_MARKS).parse().ok()?;
        if text.is_empty() || correct_answer.is_empty() || !marks.is_finite() {
            return None;
        }

        let label = JsonValue::String(field(fields, COL_TYPE).to_string());
        let normalized = is_valid_type(&label).unwrap_or_default();
        let options = QuestionKind::from_label(&normalized)
            .filter(QuestionKind::has_options)
            .map(|_| {
                (COL_FIRST_OPTION..COL_FIRST_OPTION + OPTION_COLUMNS)
                    .map(|idx| field(fields, idx))
                    .filter(|opt| !opt.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            });

        Some(RawQuestion {
            id: None,
            text: text.to_string(),
            kind: JsonValue::String(normalized),
            options,
            correct_answer: correct_answer.to_string(),
            marks,
        })
    }

    /// Reads a roster in the column order `name, email, branch`.
    pub fn parse_students_csv(text: &str) -> StudentImport {
        let mut import = StudentImport::default();

        for (line_no, fields) in csv::records(text) {
            let name = field(&fields, COL_STUDENT_NAME);
            let email = field(&fields, COL_STUDENT_EMAIL);

            if line_no == 1 && email.eq_ignore_ascii_case("email") {
                continue;
            }
            if name.is_empty() {
                import.skipped.push(skip(line_no, email, "name is required"));
                continue;
            }
            if !email.validate_email() {
                import.skipped.push(skip(line_no, email, "a valid email is required"));
                continue;
            }

            let branch = field(&fields, COL_STUDENT_BRANCH);
            import.rows.push(StudentRow {
                line_no,
                name: name.to_string(),
                email: email.to_string(),
                branch: (!branch.is_empty()).then(|| branch.to_string()),
            });
        }

        import
    }

    /// Attaches the platform's per-email upload errors to the originating rows.
    pub fn attach_upload_errors(
        rows: &[StudentRow],
        errors: &[StudentUploadError],
    ) -> Vec<RowReport> {
        let by_email: HashMap<String, &str> = errors
            .iter()
            .map(|e| (e.email.trim().to_lowercase(), e.message.as_str()))
            .collect();

        rows.iter()
            .map(|row| {
                let outcome = match by_email.get(&row.email.trim().to_lowercase()) {
                    Some(message) => RowOutcome::Rejected {
                        message: message.to_string(),
                    },
                    None => RowOutcome::Created,
                };
                RowReport {
                    line_no: row.line_no,
                    email: Some(row.email.clone()),
                    outcome,
                }
            })
            .collect()
    }
}

fn skip(line_no: usize, email: &str, message: &str) -> RowReport {
    RowReport {
        line_no,
        email: (!email.is_empty()).then(|| email.to_string()),
        outcome: RowOutcome::Skipped {
            message: message.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUESTIONS: &str = "\
type,question,option1,option2,option3,option4,correct,marks
MultipleChoice,Pick primes,2,3,4,,2 and 3,2
radiobutton,\"Capital of France, please\",Paris,Rome,,,Paris,1
TrueFalse,Rust is memory safe,,,,,true,1
shortanswer,Author of Dune,ignored,,,,Frank Herbert,3
Multiple Choice,Spaced label,a,b,,,a,1
shortanswer,,,,,,x,1
shortanswer,No answer,,,,,,1
shortanswer,Bad marks,,,,,x,two
";

    #[test]
    fn maps_rows_by_fixed_columns() {
        let import = ImportService::parse_questions_csv(QUESTIONS);
        assert_eq!(import.questions.len(), 5);

        let mc = &import.questions[0];
        assert_eq!(mc.kind, JsonValue::String("multiplechoice".into()));
        assert_eq!(mc.options.as_deref(), Some(&["2".to_string(), "3".to_string(), "4".to_string()][..]));
        assert_eq!(mc.correct_answer, "2 and 3");
        assert_eq!(mc.marks, 2.0);

        let radio = &import.questions[1];
        assert_eq!(radio.text, "Capital of France, please");
        assert_eq!(radio.options.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn options_only_for_choice_kinds() {
        let import = ImportService::parse_questions_csv(QUESTIONS);
        assert!(import.questions[2].options.is_none());
        assert!(import.questions[3].options.is_none());
        // "multiple choice" with a space is not a canonical label
        assert_eq!(import.questions[4].kind, JsonValue::String("multiple choice".into()));
        assert!(import.questions[4].options.is_none());
    }

    #[test]
    fn incomplete_rows_are_dropped_with_line_numbers() {
        let import = ImportService::parse_questions_csv(QUESTIONS);
        assert_eq!(import.skipped_lines, vec![1, 7, 8, 9]);
    }

    #[test]
    fn roster_rows_and_skips() {
        let csv = "name,email,branch\nAsha,asha@example.com,CSE\n,nobody@example.com,\nRavi,not-an-email,\nMeena,meena@example.org,\n";
        let import = ImportService::parse_students_csv(csv);
        assert_eq!(import.rows.len(), 2);
        assert_eq!(import.rows[0].branch.as_deref(), Some("CSE"));
        assert_eq!(import.rows[1].branch, None);
        assert_eq!(import.rows[1].line_no, 5);
        assert_eq!(import.skipped.len(), 2);
        assert_eq!(import.skipped[0].line_no, 3);
    }

    #[test]
    fn malformed_roster_emails_are_skipped() {
        let csv = "Asha,a@@b.com,\nRavi,as ha@example.com,\nMeena,a@b..com,\nVik,a@b.c om,\nNia,nia@example.com,\n";
        let import = ImportService::parse_students_csv(csv);
        assert_eq!(import.rows.len(), 1);
        assert_eq!(import.rows[0].email, "nia@example.com");
        let skipped: Vec<usize> = import.skipped.iter().map(|r| r.line_no).collect();
        assert_eq!(skipped, vec![1, 2, 3, 4]);
    }

    #[test]
    fn upload_errors_map_back_by_email() {
        let import = ImportService::parse_students_csv(
            "Asha,asha@example.com,CSE\nRavi,ravi@example.com,ECE\n",
        );
        let errors = vec![StudentUploadError {
            email: "RAVI@example.com".into(),
            message: "Email already registered".into(),
        }];
        let report = ImportService::attach_upload_errors(&import.rows, &errors);
        assert_eq!(report[0].outcome, RowOutcome::Created);
        assert_eq!(
            report[1].outcome,
            RowOutcome::Rejected {
                message: "Email already registered".into()
            }
        );
        assert_eq!(report[1].line_no, 2);
    }
}
