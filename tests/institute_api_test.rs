mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
};
use serde_json::json;
use wiremock::{
    matchers::{body_partial_json, method, path},
    Mock, MockServer, ResponseTemplate,
};

use common::{app, body_json, get_request, json_request, login, send};

const BOUNDARY: &str = "beatinblink-test-boundary";

fn csv_upload(uri: &str, token: &str, csv: &str) -> Request<Body> {
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"upload.csv\"\r\nContent-Type: text/csv\r\n\r\n{csv}\r\n--{b}--\r\n",
        b = BOUNDARY,
        csv = csv
    );
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .expect("request")
}

#[tokio::test]
async fn question_csv_import_drops_incomplete_rows() {
    let server = MockServer::start().await;
    let app = app(&server.uri());
    let token = login(&app, &server, "institute", "remote-inst").await;

    let csv = "type,text,opt1,opt2,opt3,opt4,correct,marks\n\
               MultipleChoice,Pick primes,2,3,4,9,2 and 3,2\n\
               shortanswer,Capital of Peru,,,,,Lima,1\n\
               radiobutton,,A,B,,,A,1\n\
               truefalse,\"Water boils at 100C, at sea level\",,,,,true,1\n";
    let resp = send(
        &app,
        csv_upload("/api/institute/questions/import", &token, csv),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(resp).await;
    let questions = body["questions"].as_array().expect("questions");
    assert_eq!(questions.len(), 3);
    assert_eq!(questions[0]["type"], "multiplechoice");
    assert_eq!(questions[0]["options"], json!(["2", "3", "4", "9"]));
    assert_eq!(questions[0]["correctAnswer"], "2 and 3");
    assert_eq!(questions[2]["text"], "Water boils at 100C, at sea level");
    assert_eq!(body["skipped_lines"], json!([1, 4]));
}

#[tokio::test]
async fn student_roster_upload_reports_each_row() {
    let server = MockServer::start().await;
    let app = app(&server.uri());
    let token = login(&app, &server, "institute", "remote-inst").await;

    Mock::given(method("POST"))
        .and(path("/institute/students/bulk"))
        .and(body_partial_json(json!({
            "students": [
                { "name": "Asha", "email": "asha@example.com", "branch": "CSE" },
                { "name": "Ravi", "email": "ravi@example.com" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "created": 1,
            "errors": [{ "email": "RAVI@example.com", "message": "Email already registered" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let csv = "name,email,branch\nAsha,asha@example.com,CSE\nRavi,ravi@example.com,\n,nobody@example.com,ECE\n";
    let resp = send(
        &app,
        csv_upload("/api/institute/students/import", &token, csv),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(resp).await;
    assert_eq!(body["created"], 1);
    let rows = body["rows"].as_array().expect("rows");
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["status"], "created");
    assert_eq!(rows[1]["status"], "rejected");
    assert_eq!(rows[1]["message"], "Email already registered");
    assert_eq!(rows[2]["status"], "skipped");
    assert_eq!(rows[2]["line_no"], 4);
}

#[tokio::test]
async fn invalid_exam_is_rejected_before_platform_call() {
    let server = MockServer::start().await;
    let app = app(&server.uri());
    let token = login(&app, &server, "institute", "remote-inst").await;

    Mock::given(method("POST"))
        .and(path("/institute/exams"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "_id": "e1", "title": "x" })))
        .expect(0)
        .mount(&server)
        .await;

    let resp = send(
        &app,
        json_request(
            "POST",
            "/api/institute/exams",
            Some(&token),
            json!({
                "title": "Chemistry",
                "durationMinutes": 20,
                "passingMarks": 1,
                "questions": [
                    { "text": "Pick", "type": "radiobutton", "options": ["A", ""], "correctAnswer": "A", "marks": 1 }
                ]
            }),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(resp).await["error"],
        "Question 1: all options must be filled in"
    );
}

#[tokio::test]
async fn valid_exam_is_created_with_canonical_types() {
    let server = MockServer::start().await;
    let app = app(&server.uri());
    let token = login(&app, &server, "institute", "remote-inst").await;

    Mock::given(method("POST"))
        .and(path("/institute/exams"))
        .and(body_partial_json(json!({
            "title": "Chemistry",
            "questions": [{ "type": "multiplechoice", "correctAnswer": "H2O and CO2" }]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "_id": "e7", "title": "Chemistry", "durationMinutes": 20
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resp = send(
        &app,
        json_request(
            "POST",
            "/api/institute/exams",
            Some(&token),
            json!({
                "title": "Chemistry",
                "durationMinutes": 20,
                "passingMarks": 1,
                "questions": [{
                    "text": "Pick compounds",
                    "type": " MultipleChoice ",
                    "options": ["H2O", "O2", "CO2"],
                    "correctAnswer": "H2O and CO2",
                    "marks": 2
                }]
            }),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(body_json(resp).await["id"], "e7");
}

#[tokio::test]
async fn results_export_is_an_xlsx_attachment() {
    let server = MockServer::start().await;
    let app = app(&server.uri());
    let token = login(&app, &server, "institute", "remote-inst").await;

    Mock::given(method("GET"))
        .and(path("/institute/exams/e1/results"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "_id": "r1",
                "examTitle": "Physics",
                "studentName": "Asha",
                "studentEmail": "asha@example.com",
                "score": 7,
                "totalMarks": 10,
                "passed": true,
                "submittedAt": "2026-03-01T10:00:00Z"
            }
        ])))
        .mount(&server)
        .await;

    let resp = send(
        &app,
        get_request("/api/institute/exams/e1/results/export", Some(&token)),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let disposition = resp
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"results_e1_"));

    let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
    assert!(bytes.starts_with(b"PK"));
}

#[tokio::test]
async fn review_marks_selected_and_correct_options() {
    let server = MockServer::start().await;
    let app = app(&server.uri());
    let token = login(&app, &server, "institute", "remote-inst").await;

    let resp = send(
        &app,
        json_request(
            "POST",
            "/api/review",
            Some(&token),
            json!({
                "questions": [{
                    "_id": "q1",
                    "text": "Pick primes",
                    "type": "multiplechoice",
                    "options": ["2", "4", "5"],
                    "correctAnswer": "2 and 5",
                    "marks": 1
                }],
                "answers": { "q1": ["2", "4"] }
            }),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(resp).await;
    let item = &body[0];
    assert_eq!(item["is_correct"], false);
    assert_eq!(item["options"][0]["marker"], "correct");
    assert_eq!(item["options"][1]["marker"], "incorrect");
    assert_eq!(item["options"][2]["marker"], "correct");
    assert_eq!(item["options"][2]["selected"], false);
}
