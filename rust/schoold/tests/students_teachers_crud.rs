mod test_support;

use serde_json::json;
use test_support::{error_code, request, request_ok, spawn_sidecar, temp_dir};

#[test]
fn student_form_reports_every_failing_field() {
    let workspace = temp_dir("schoold-student-form");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let resp = request(
        &mut stdin,
        &mut reader,
        "2",
        "students.create",
        json!({
            "name": "",
            "class": "12-A",
            "rollNo": "12a01",
            "parentEmail": "not-an-email",
            "parentPassword": "pw",
            "feeStatus": "Waived"
        }),
    );
    assert_eq!(error_code(&resp), Some("validation_failed"));
    let fields = resp
        .pointer("/error/details/fields")
        .and_then(|v| v.as_object())
        .expect("fields");
    assert_eq!(fields["name"], "Name is required");
    assert_eq!(fields["parentEmail"], "Invalid email format");
    assert_eq!(fields["feeStatus"], "Fee status must be Paid, Pending or Partial");
    assert_eq!(
        fields["rollNo"],
        "A student with this roll number already exists in this class"
    );
    assert!(!fields.contains_key("class"));
}

#[test]
fn students_create_update_delete_round_trip() {
    let workspace = temp_dir("schoold-student-crud");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "students.create",
        json!({
            "name": "Gita Rao",
            "class": "12-B",
            "rollNo": "12B07",
            "parentEmail": "gita.parent@example.com",
            "parentPassword": "gita123",
            "feeStatus": "partial"
        }),
    );
    assert_eq!(created["student"]["id"], 3);
    assert_eq!(created["student"]["feeStatus"], "Partial");

    // Keeping its own roll number is not a conflict.
    let updated = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "students.update",
        json!({
            "id": 3,
            "name": "Gita R. Rao",
            "class": "12-B",
            "rollNo": "12B07",
            "parentEmail": "gita.parent@example.com",
            "parentPassword": "gita123",
            "feeStatus": "Paid"
        }),
    );
    assert_eq!(updated["student"]["name"], "Gita R. Rao");
    assert_eq!(updated["student"]["feeStatus"], "Paid");

    let only_b = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "students.list",
        json!({ "class": "12-B" }),
    );
    let roll_nos = only_b["students"]
        .as_array()
        .expect("students")
        .iter()
        .map(|s| s["rollNo"].as_str().unwrap_or("").to_string())
        .collect::<Vec<_>>();
    assert_eq!(roll_nos, vec!["12B01", "12B07"]);

    let wrong_case = request_ok(
        &mut stdin,
        &mut reader,
        "4a",
        "students.list",
        json!({ "class": "12-b" }),
    );
    assert_eq!(wrong_case["students"].as_array().map(|a| a.len()), Some(0));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "students.delete",
        json!({ "id": 3 }),
    );
    let gone = request(
        &mut stdin,
        &mut reader,
        "6",
        "students.delete",
        json!({ "id": 3 }),
    );
    assert_eq!(error_code(&gone), Some("not_found"));

    let logs = request_ok(&mut stdin, &mut reader, "7", "logs.list", json!({}));
    assert_eq!(logs["logs"][0]["message"], "Student Gita R. Rao removed from 12-B.");
    assert_eq!(logs["logs"][1]["message"], "Student Gita Rao added to 12-B.");
}

#[test]
fn teacher_emails_are_unique_ignoring_case() {
    let workspace = temp_dir("schoold-teacher-crud");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let dup = request(
        &mut stdin,
        &mut reader,
        "2",
        "teachers.create",
        json!({
            "name": "Copy",
            "email": "TEACHER1@pshss.edu",
            "password": "x",
            "subject": "History",
            "assignedClass": "12-C"
        }),
    );
    assert_eq!(error_code(&dup), Some("validation_failed"));
    assert_eq!(
        dup.pointer("/error/details/fields/email").and_then(|v| v.as_str()),
        Some("Email already exists for another teacher")
    );

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "teachers.create",
        json!({
            "name": "Teacher 3",
            "email": "teacher3@pshss.edu",
            "password": "teacher3",
            "subject": "History",
            "assignedClass": "12-C"
        }),
    );
    assert_eq!(created["teacher"]["id"], 3);
    assert_eq!(created["teacher"]["assignedClass"], "12-C");

    let updated = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "teachers.update",
        json!({
            "id": 3,
            "name": "Teacher 3",
            "email": "Teacher3@pshss.edu",
            "password": "teacher3",
            "subject": "Geography",
            "assignedClass": "12-C"
        }),
    );
    assert_eq!(updated["teacher"]["subject"], "Geography");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "teachers.delete",
        json!({ "id": 3 }),
    );
    let listed = request_ok(&mut stdin, &mut reader, "6", "teachers.list", json!({}));
    assert_eq!(listed["teachers"].as_array().map(|a| a.len()), Some(2));
}
