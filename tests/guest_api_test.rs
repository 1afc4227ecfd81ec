mod common;

use axum::http::StatusCode;
use serde_json::json;
use wiremock::{
    matchers::{header, method, path},
    Mock, MockServer, ResponseTemplate,
};

use common::{app, body_json, get_request, guest_login, json_request, send};

async fn mount_guest_exam(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/guest/exams/d1"))
        .and(header("x-guest-code", "G-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_id": "d1",
            "title": "Demo",
            "durationMinutes": 10,
            "passingMarks": 2,
            "questions": [
                {
                    "_id": "q1",
                    "text": "Pick the even numbers",
                    "type": "multiplechoice",
                    "options": ["2", "3", "4"],
                    "correctAnswer": "2 and 4",
                    "marks": 2
                },
                {
                    "_id": "q2",
                    "text": "Ice is colder than steam",
                    "type": "TrueFalse",
                    "correctAnswer": "True",
                    "marks": 1
                }
            ]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn guest_exam_is_fetched_with_guest_code_and_hides_answers() {
    let server = MockServer::start().await;
    let app = app(&server.uri());
    let token = guest_login(&app, &server).await;
    mount_guest_exam(&server).await;

    let resp = send(&app, get_request("/api/guest/exams/d1", Some(&token))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let exam = body_json(resp).await;
    assert_eq!(exam["title"], "Demo");
    assert_eq!(exam["questions"][1]["type"], "truefalse");
    assert!(exam["questions"][0].get("correctAnswer").is_none());
}

#[tokio::test]
async fn guest_answers_are_scored_against_passing_marks() {
    let server = MockServer::start().await;
    let app = app(&server.uri());
    let token = guest_login(&app, &server).await;
    mount_guest_exam(&server).await;

    let resp = send(
        &app,
        json_request(
            "POST",
            "/api/guest/exams/d1/score",
            Some(&token),
            json!({ "answers": { "q1": "4 AND 2", "q2": "false" } }),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["earned_marks"], 2.0);
    assert_eq!(body["total_marks"], 3.0);
    assert_eq!(body["passed"], true);

    let resp = send(
        &app,
        json_request(
            "POST",
            "/api/guest/exams/d1/score",
            Some(&token),
            json!({ "answers": { "q1": ["2"], "q2": true } }),
        ),
    )
    .await;
    let body = body_json(resp).await;
    assert_eq!(body["earned_marks"], 1.0);
    assert_eq!(body["passed"], false);
}

#[tokio::test]
async fn invalid_guest_exam_never_reaches_platform() {
    let server = MockServer::start().await;
    let app = app(&server.uri());
    let token = guest_login(&app, &server).await;

    Mock::given(method("POST"))
        .and(path("/guest/exams"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "_id": "d2", "title": "x" })))
        .expect(0)
        .mount(&server)
        .await;

    let resp = send(
        &app,
        json_request(
            "POST",
            "/api/guest/exams",
            Some(&token),
            json!({
                "title": "Demo",
                "durationMinutes": 5,
                "passingMarks": 0,
                "questions": [
                    { "text": "Q", "type": "shortanswer", "correctAnswer": "x", "marks": 0 }
                ]
            }),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(resp).await["error"],
        "Question 1: marks must be a positive number"
    );
}

#[tokio::test]
async fn valid_guest_exam_is_created_with_guest_code() {
    let server = MockServer::start().await;
    let app = app(&server.uri());
    let token = guest_login(&app, &server).await;

    Mock::given(method("POST"))
        .and(path("/guest/exams"))
        .and(header("x-guest-code", "G-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_id": "d2", "title": "Demo", "durationMinutes": 5
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resp = send(
        &app,
        json_request(
            "POST",
            "/api/guest/exams",
            Some(&token),
            json!({
                "title": "Demo",
                "durationMinutes": 5,
                "passingMarks": 1,
                "questions": [
                    { "text": "Q", "type": "ShortAnswer", "correctAnswer": "x", "marks": 1 }
                ]
            }),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["id"], "d2");
}
