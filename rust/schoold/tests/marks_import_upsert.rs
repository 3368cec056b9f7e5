mod test_support;

use serde_json::{json, Value};
use test_support::{error_code, fixture_path, request, request_ok, spawn_sidecar, temp_dir};

fn marks_of(students: &Value, roll_no: &str) -> Vec<Value> {
    students
        .as_array()
        .and_then(|arr| arr.iter().find(|s| s["rollNo"] == roll_no))
        .and_then(|s| s["marks"].as_array().cloned())
        .unwrap_or_default()
}

#[test]
fn marks_import_upserts_by_subject_within_the_class() {
    let workspace = temp_dir("schoold-marks-import");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    // Put 12A02 on the roster so two rows match.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "students.create",
        json!({
            "name": "Asha Rao",
            "class": "12-A",
            "rollNo": "12A02",
            "parentEmail": "asha.parent@example.com",
            "parentPassword": "asha123",
            "feeStatus": "Paid"
        }),
    );

    let csv = fixture_path("fixtures/imports/marks_12a.csv");
    let preview = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "marks.previewImport",
        json!({ "teacherId": 1, "inPath": csv.to_string_lossy() }),
    );
    assert_eq!(preview["class"], "12-A");
    assert_eq!(preview["subject"], "Mathematics");
    assert_eq!(preview["rowsParsed"], 6, "{}", preview);
    assert_eq!(preview["valid"], 4);
    assert_eq!(preview["invalid"], 2);
    let rows = preview["rows"].as_array().expect("rows");
    let over = rows
        .iter()
        .find(|r| r["rollNo"] == "12A03")
        .expect("12A03 row");
    assert_eq!(over["errorCode"], "invalid_domain");
    assert_eq!(over["error"], "Marks must be number between 0-100");
    let blank = rows.iter().find(|r| r["line"] == 7).expect("line 7");
    assert_eq!(blank["errorCode"], "missing_field");

    // Valid and invalid rows share the raw cells; only valid rows add a numeric score.
    let good = rows.iter().find(|r| r["rollNo"] == "12A02").expect("12A02 row");
    assert_eq!(good["status"], "ok");
    assert_eq!(good["marks"], "91.5");
    assert_eq!(good["score"], 91.5);
    assert_eq!(good["studentName"], "Asha Rao");
    assert_eq!(over["marks"], "150");
    assert!(over.get("score").is_none());

    let apply = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "marks.applyImport",
        json!({ "previewId": preview["previewId"] }),
    );
    assert_eq!(apply["committed"], true);
    assert_eq!(apply["added"], 2);
    assert_eq!(apply["updated"], 0);
    assert_eq!(apply["unmatched"], 2);
    assert_eq!(apply["message"], "Successfully uploaded marks for 2 students.");

    let listed = request_ok(&mut stdin, &mut reader, "5", "students.list", json!({}));
    let marks = marks_of(&listed["students"], "12A01");
    assert_eq!(marks.len(), 1);
    assert_eq!(marks[0]["subject"], "Mathematics");
    assert_eq!(marks[0]["score"], 78.0);
    assert_eq!(marks_of(&listed["students"], "12A02")[0]["score"], 91.5);
    // 12B01 is in another class and must not receive a mark.
    assert!(marks_of(&listed["students"], "12B01").is_empty());

    // Class names are matched exactly, so a differently cased class reaches nobody.
    let lower = request_ok(
        &mut stdin,
        &mut reader,
        "5a",
        "marks.previewImport",
        json!({
            "class": "12-a",
            "subject": "Mathematics",
            "text": "RollNo,StudentName,Marks\n12A01,Student 1,10"
        }),
    );
    let lower_apply = request_ok(
        &mut stdin,
        &mut reader,
        "5b",
        "marks.applyImport",
        json!({ "previewId": lower["previewId"] }),
    );
    assert_eq!(lower_apply["added"], 0);
    assert_eq!(lower_apply["updated"], 0);
    assert_eq!(lower_apply["unmatched"], 1);

    // Same subject again replaces rather than appends.
    let again = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "marks.previewImport",
        json!({
            "class": "12-A",
            "subject": "Mathematics",
            "text": "RollNo,StudentName,Marks\n12A01,Student 1,55"
        }),
    );
    let apply2 = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "marks.applyImport",
        json!({ "previewId": again["previewId"] }),
    );
    assert_eq!(apply2["updated"], 1);
    assert_eq!(apply2["added"], 0);

    // A different subject is a new entry.
    let science = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "marks.previewImport",
        json!({
            "class": "12-A",
            "subject": "Science",
            "text": "RollNo,StudentName,Marks\n12A01,Student 1,64"
        }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "9",
        "marks.applyImport",
        json!({ "previewId": science["previewId"] }),
    );

    let listed = request_ok(&mut stdin, &mut reader, "10", "students.list", json!({}));
    let marks = marks_of(&listed["students"], "12A01");
    assert_eq!(marks.len(), 2);
    let math = marks
        .iter()
        .find(|m| m["subject"] == "Mathematics")
        .expect("math mark");
    assert_eq!(math["score"], 55.0);
}

#[test]
fn marks_file_without_required_columns_is_rejected() {
    let workspace = temp_dir("schoold-marks-structural");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let csv = fixture_path("fixtures/imports/marks_missing_column.csv");
    let resp = request(
        &mut stdin,
        &mut reader,
        "2",
        "marks.previewImport",
        json!({ "class": "12-A", "subject": "Mathematics", "inPath": csv.to_string_lossy() }),
    );
    assert_eq!(error_code(&resp), Some("import_structural"));
    assert_eq!(
        resp.pointer("/error/message").and_then(|v| v.as_str()),
        Some("CSV missing required columns: RollNo, StudentName, Marks.")
    );
    assert_eq!(resp.pointer("/error/details/missingColumns/0"), Some(&json!("marks")));

    let empty = request(
        &mut stdin,
        &mut reader,
        "3",
        "marks.previewImport",
        json!({ "class": "12-A", "subject": "Mathematics", "text": "RollNo,StudentName,Marks\n" }),
    );
    assert_eq!(error_code(&empty), Some("import_structural"));
    assert_eq!(
        empty.pointer("/error/message").and_then(|v| v.as_str()),
        Some("CSV appears empty or invalid.")
    );

    let missing = request(
        &mut stdin,
        &mut reader,
        "4",
        "marks.previewImport",
        json!({
            "class": "12-A",
            "subject": "Mathematics",
            "inPath": workspace.join("nope.csv").to_string_lossy()
        }),
    );
    assert_eq!(error_code(&missing), Some("import_read_failed"));
}

#[test]
fn marks_preview_needs_a_target_class() {
    let workspace = temp_dir("schoold-marks-target");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let unknown = request(
        &mut stdin,
        &mut reader,
        "2",
        "marks.previewImport",
        json!({ "teacherId": 99, "text": "RollNo,StudentName,Marks\n12A01,x,1" }),
    );
    assert_eq!(error_code(&unknown), Some("not_found"));

    let no_subject = request(
        &mut stdin,
        &mut reader,
        "3",
        "marks.previewImport",
        json!({ "class": "12-A", "text": "RollNo,StudentName,Marks\n12A01,x,1" }),
    );
    assert_eq!(error_code(&no_subject), Some("bad_params"));

    // A newer preview replaces the pending one.
    let first = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "marks.previewImport",
        json!({ "teacherId": 2, "text": "RollNo,StudentName,Marks\n12B01,x,40" }),
    );
    let second = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "marks.previewImport",
        json!({ "teacherId": 2, "text": "RollNo,StudentName,Marks\n12B01,x,45" }),
    );
    assert_ne!(first["previewId"], second["previewId"]);
    let stale = request(
        &mut stdin,
        &mut reader,
        "6",
        "marks.applyImport",
        json!({ "previewId": first["previewId"] }),
    );
    assert_eq!(error_code(&stale), Some("preview_not_found"));

    let cancelled = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "imports.cancel",
        json!({ "previewId": second["previewId"] }),
    );
    assert_eq!(cancelled["cancelled"], "marks");
}
