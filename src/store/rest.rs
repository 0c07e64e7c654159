//! Record store reached over the hosted database's REST interface.
//!
//! The service speaks the PostgREST dialect: one path per table under
//! `/rest/v1`, filters as `column=eq.value` query pairs, embedded resources
//! in `select`, and `Prefer: return=representation` to get written rows
//! back in the response body.
//!
//! Column casing follows the hosted tables: students and subjects use
//! camelCase (`firstName`, `subjectCode`), grades use snake_case
//! (`student_id`), and every table has `created_at`.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use ureq::Agent;

use super::{RecordStore, StoreError, StudentOrder, SubjectOrder};
use crate::model::{
    Grade, GradeId, GradeRecord, NewGrade, NewStudent, NewSubject, Student, StudentId,
    StudentRef, Subject, SubjectId, SubjectRef,
};

const GRADE_SELECT: &str = "id,student_id,subject_id,grade,semester,period,created_at,\
students(firstName,lastName),subjects(subjectCode,subjectName,units)";

pub struct RestStore {
    base_url: String,
    api_key: String,
    agent: Agent,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StudentRow {
    id: i64,
    first_name: String,
    last_name: String,
    year_level: i64,
    course: String,
    #[serde(rename = "created_at")]
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubjectRow {
    id: i64,
    subject_code: String,
    subject_name: String,
    units: i64,
    #[serde(default)]
    description: Option<String>,
    #[serde(rename = "created_at")]
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StudentEmbed {
    first_name: String,
    last_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubjectEmbed {
    subject_code: String,
    subject_name: String,
    units: i64,
}

#[derive(Debug, Deserialize)]
struct GradeRow {
    id: i64,
    student_id: i64,
    subject_id: i64,
    grade: f64,
    semester: String,
    period: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    students: Option<StudentEmbed>,
    #[serde(default)]
    subjects: Option<SubjectEmbed>,
}

impl From<StudentRow> for Student {
    fn from(r: StudentRow) -> Self {
        Student {
            id: StudentId(r.id),
            first_name: r.first_name,
            last_name: r.last_name,
            year_level: r.year_level,
            course: r.course,
            created_at: r.created_at,
        }
    }
}

impl From<SubjectRow> for Subject {
    fn from(r: SubjectRow) -> Self {
        Subject {
            id: SubjectId(r.id),
            subject_code: r.subject_code,
            subject_name: r.subject_name,
            units: r.units,
            description: r.description,
            created_at: r.created_at,
        }
    }
}

impl From<GradeRow> for GradeRecord {
    fn from(r: GradeRow) -> Self {
        GradeRecord {
            grade: Grade {
                id: GradeId(r.id),
                student_id: StudentId(r.student_id),
                subject_id: SubjectId(r.subject_id),
                grade: r.grade,
                semester: r.semester,
                period: r.period,
                created_at: r.created_at,
            },
            student: r.students.map(|s| StudentRef {
                first_name: s.first_name,
                last_name: s.last_name,
            }),
            subject: r.subjects.map(|s| SubjectRef {
                subject_code: s.subject_code,
                subject_name: s.subject_name,
                units: s.units,
            }),
        }
    }
}

fn map_ureq_err(e: ureq::Error) -> StoreError {
    match e {
        ureq::Error::Status(code, resp) => {
            let status_text = resp.status_text().to_string();
            // PostgREST puts the useful part in the JSON body's "message".
            let body = resp.into_string().unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
                .unwrap_or(status_text);
            if (400..500).contains(&code) {
                StoreError::Rejected(format!("HTTP {code}: {message}"))
            } else {
                StoreError::Http(format!("HTTP {code}: {message}"))
            }
        }
        ureq::Error::Transport(t) => StoreError::Http(t.to_string()),
    }
}

fn eq(id: i64) -> String {
    format!("eq.{id}")
}

impl RestStore {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            agent: Agent::new(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn request(&self, method: &str, table: &str) -> ureq::Request {
        self.agent
            .request(method, &self.table_url(table))
            .set("apikey", &self.api_key)
            .set("Authorization", &format!("Bearer {}", self.api_key))
    }

    fn fetch<T: serde::de::DeserializeOwned>(&self, req: ureq::Request) -> Result<Vec<T>, StoreError> {
        let resp = req.call().map_err(map_ureq_err)?;
        resp.into_json::<Vec<T>>()
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    fn insert_one<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        body: serde_json::Value,
    ) -> Result<T, StoreError> {
        let resp = self
            .request("POST", table)
            .set("Prefer", "return=representation")
            .send_json(json!([body]))
            .map_err(map_ureq_err)?;
        let mut rows = resp
            .into_json::<Vec<T>>()
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        if rows.is_empty() {
            return Err(StoreError::Decode(format!("insert into {table} returned no row")));
        }
        Ok(rows.swap_remove(0))
    }

    fn delete_by_id(&self, table: &str, id: i64) -> Result<bool, StoreError> {
        let removed: Vec<serde_json::Value> = self.fetch(
            self.request("DELETE", table)
                .query("id", &eq(id))
                .set("Prefer", "return=representation"),
        )?;
        Ok(!removed.is_empty())
    }
}

impl RecordStore for RestStore {
    fn backend(&self) -> &'static str {
        "rest"
    }

    fn list_students(&self, order: StudentOrder) -> Result<Vec<Student>, StoreError> {
        let order = match order {
            StudentOrder::Id => "id.asc",
            StudentOrder::FirstName => "firstName.asc,id.asc",
        };
        let rows: Vec<StudentRow> = self.fetch(
            self.request("GET", "students")
                .query("select", "*")
                .query("order", order),
        )?;
        Ok(rows.into_iter().map(Student::from).collect())
    }

    fn get_student(&self, id: StudentId) -> Result<Option<Student>, StoreError> {
        let rows: Vec<StudentRow> = self.fetch(
            self.request("GET", "students")
                .query("select", "*")
                .query("id", &eq(id.get())),
        )?;
        Ok(rows.into_iter().next().map(Student::from))
    }

    fn insert_student(&self, new: &NewStudent) -> Result<Student, StoreError> {
        let row: StudentRow = self.insert_one(
            "students",
            json!({
                "firstName": new.first_name,
                "lastName": new.last_name,
                "yearLevel": new.year_level,
                "course": new.course,
            }),
        )?;
        Ok(row.into())
    }

    fn delete_student(&self, id: StudentId) -> Result<bool, StoreError> {
        self.delete_by_id("students", id.get())
    }

    fn list_subjects(&self, order: SubjectOrder) -> Result<Vec<Subject>, StoreError> {
        let order = match order {
            SubjectOrder::Id => "id.asc",
            SubjectOrder::SubjectCode => "subjectCode.asc,id.asc",
        };
        let rows: Vec<SubjectRow> = self.fetch(
            self.request("GET", "subjects")
                .query("select", "*")
                .query("order", order),
        )?;
        Ok(rows.into_iter().map(Subject::from).collect())
    }

    fn insert_subject(&self, new: &NewSubject) -> Result<Subject, StoreError> {
        let row: SubjectRow = self.insert_one(
            "subjects",
            json!({
                "subjectCode": new.subject_code,
                "subjectName": new.subject_name,
                "units": new.units,
                "description": new.description,
            }),
        )?;
        Ok(row.into())
    }

    fn delete_subject(&self, id: SubjectId) -> Result<bool, StoreError> {
        self.delete_by_id("subjects", id.get())
    }

    fn list_grades(&self, student: Option<StudentId>) -> Result<Vec<GradeRecord>, StoreError> {
        let mut req = self
            .request("GET", "grades")
            .query("select", GRADE_SELECT)
            .query("order", "id.asc");
        if let Some(id) = student {
            req = req.query("student_id", &eq(id.get()));
        }
        let rows: Vec<GradeRow> = self.fetch(req)?;
        Ok(rows.into_iter().map(GradeRecord::from).collect())
    }

    fn insert_grade(&self, new: &NewGrade) -> Result<Grade, StoreError> {
        let row: GradeRow = self.insert_one(
            "grades",
            json!({
                "student_id": new.student_id,
                "subject_id": new.subject_id,
                "grade": new.grade,
                "semester": new.semester.label(),
                "period": new.period.label(),
                "created_at": new.created_at.to_rfc3339(),
            }),
        )?;
        Ok(GradeRecord::from(row).grade)
    }

    fn delete_grade(&self, id: GradeId) -> Result<bool, StoreError> {
        self.delete_by_id("grades", id.get())
    }
}
