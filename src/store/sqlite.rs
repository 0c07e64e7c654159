use chrono::Utc;
use rusqlite::types::ToSqlOutput;
use rusqlite::{Connection, OptionalExtension, Row, ToSql};
use std::path::Path;

use super::{RecordStore, StoreError, StudentOrder, SubjectOrder};
use crate::model::{
    Grade, GradeId, GradeRecord, NewGrade, NewStudent, NewSubject, Period, Semester, Student,
    StudentId, StudentRef, Subject, SubjectId, SubjectRef,
};

pub const DB_FILE: &str = "gradebook.sqlite3";

/// Workspace-local record store.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(workspace: &Path) -> anyhow::Result<Self> {
        std::fs::create_dir_all(workspace)?;
        let conn = Connection::open(workspace.join(DB_FILE))?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    fn exists(&self, table: &str, id: i64) -> Result<bool, StoreError> {
        let sql = format!("SELECT 1 FROM {table} WHERE id = ?");
        let found: Option<i64> = self
            .conn
            .query_row(&sql, [id], |r| r.get(0))
            .optional()?;
        Ok(found.is_some())
    }
}

fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    // Grades keep dangling ids when a student or subject is removed, so no
    // FOREIGN KEY clauses here; references are checked on insert instead.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            year_level INTEGER NOT NULL,
            course TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS subjects(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            subject_code TEXT NOT NULL,
            subject_name TEXT NOT NULL,
            units INTEGER NOT NULL,
            description TEXT,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS grades(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_id INTEGER NOT NULL,
            subject_id INTEGER NOT NULL,
            grade REAL NOT NULL,
            semester TEXT NOT NULL,
            period TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_grades_student ON grades(student_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_grades_subject ON grades(subject_id)",
        [],
    )?;
    Ok(())
}

impl ToSql for Semester {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.label()))
    }
}

impl ToSql for Period {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.label()))
    }
}

const STUDENT_COLUMNS: &str = "id, first_name, last_name, year_level, course, created_at";
const SUBJECT_COLUMNS: &str = "id, subject_code, subject_name, units, description, created_at";

fn student_from_row(r: &Row<'_>) -> rusqlite::Result<Student> {
    Ok(Student {
        id: StudentId(r.get(0)?),
        first_name: r.get(1)?,
        last_name: r.get(2)?,
        year_level: r.get(3)?,
        course: r.get(4)?,
        created_at: r.get(5)?,
    })
}

fn subject_from_row(r: &Row<'_>) -> rusqlite::Result<Subject> {
    Ok(Subject {
        id: SubjectId(r.get(0)?),
        subject_code: r.get(1)?,
        subject_name: r.get(2)?,
        units: r.get(3)?,
        description: r.get(4)?,
        created_at: r.get(5)?,
    })
}

fn grade_record_from_row(r: &Row<'_>) -> rusqlite::Result<GradeRecord> {
    let first_name: Option<String> = r.get(7)?;
    let last_name: Option<String> = r.get(8)?;
    let subject_code: Option<String> = r.get(9)?;
    let subject_name: Option<String> = r.get(10)?;
    let units: Option<i64> = r.get(11)?;

    let student = match (first_name, last_name) {
        (Some(first_name), Some(last_name)) => Some(StudentRef {
            first_name,
            last_name,
        }),
        _ => None,
    };
    let subject = match (subject_code, subject_name, units) {
        (Some(subject_code), Some(subject_name), Some(units)) => Some(SubjectRef {
            subject_code,
            subject_name,
            units,
        }),
        _ => None,
    };

    Ok(GradeRecord {
        grade: Grade {
            id: GradeId(r.get(0)?),
            student_id: StudentId(r.get(1)?),
            subject_id: SubjectId(r.get(2)?),
            grade: r.get(3)?,
            semester: r.get(4)?,
            period: r.get(5)?,
            created_at: r.get(6)?,
        },
        student,
        subject,
    })
}

impl RecordStore for SqliteStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    fn list_students(&self, order: StudentOrder) -> Result<Vec<Student>, StoreError> {
        let order_by = match order {
            StudentOrder::Id => "id",
            StudentOrder::FirstName => "first_name, id",
        };
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {STUDENT_COLUMNS} FROM students ORDER BY {order_by}"))?;
        let rows = stmt
            .query_map([], student_from_row)
            .and_then(|it| it.collect::<Result<Vec<_>, _>>())?;
        Ok(rows)
    }

    fn get_student(&self, id: StudentId) -> Result<Option<Student>, StoreError> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {STUDENT_COLUMNS} FROM students WHERE id = ?"),
                [id.get()],
                student_from_row,
            )
            .optional()?;
        Ok(row)
    }

    fn insert_student(&self, new: &NewStudent) -> Result<Student, StoreError> {
        let created_at = Utc::now();
        self.conn.execute(
            "INSERT INTO students(first_name, last_name, year_level, course, created_at)
             VALUES(?, ?, ?, ?, ?)",
            (
                &new.first_name,
                &new.last_name,
                new.year_level,
                &new.course,
                created_at,
            ),
        )?;
        Ok(Student {
            id: StudentId(self.conn.last_insert_rowid()),
            first_name: new.first_name.clone(),
            last_name: new.last_name.clone(),
            year_level: new.year_level,
            course: new.course.clone(),
            created_at,
        })
    }

    fn delete_student(&self, id: StudentId) -> Result<bool, StoreError> {
        let n = self
            .conn
            .execute("DELETE FROM students WHERE id = ?", [id.get()])?;
        Ok(n > 0)
    }

    fn list_subjects(&self, order: SubjectOrder) -> Result<Vec<Subject>, StoreError> {
        let order_by = match order {
            SubjectOrder::Id => "id",
            SubjectOrder::SubjectCode => "subject_code, id",
        };
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {SUBJECT_COLUMNS} FROM subjects ORDER BY {order_by}"))?;
        let rows = stmt
            .query_map([], subject_from_row)
            .and_then(|it| it.collect::<Result<Vec<_>, _>>())?;
        Ok(rows)
    }

    fn insert_subject(&self, new: &NewSubject) -> Result<Subject, StoreError> {
        let created_at = Utc::now();
        self.conn.execute(
            "INSERT INTO subjects(subject_code, subject_name, units, description, created_at)
             VALUES(?, ?, ?, ?, ?)",
            (
                &new.subject_code,
                &new.subject_name,
                new.units,
                &new.description,
                created_at,
            ),
        )?;
        Ok(Subject {
            id: SubjectId(self.conn.last_insert_rowid()),
            subject_code: new.subject_code.clone(),
            subject_name: new.subject_name.clone(),
            units: new.units,
            description: new.description.clone(),
            created_at,
        })
    }

    fn delete_subject(&self, id: SubjectId) -> Result<bool, StoreError> {
        let n = self
            .conn
            .execute("DELETE FROM subjects WHERE id = ?", [id.get()])?;
        Ok(n > 0)
    }

    fn list_grades(&self, student: Option<StudentId>) -> Result<Vec<GradeRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT
               g.id, g.student_id, g.subject_id, g.grade, g.semester, g.period, g.created_at,
               st.first_name, st.last_name,
               sb.subject_code, sb.subject_name, sb.units
             FROM grades g
             LEFT JOIN students st ON st.id = g.student_id
             LEFT JOIN subjects sb ON sb.id = g.subject_id
             WHERE (?1 IS NULL OR g.student_id = ?1)
             ORDER BY g.id",
        )?;
        let rows = stmt
            .query_map([student.map(StudentId::get)], grade_record_from_row)
            .and_then(|it| it.collect::<Result<Vec<_>, _>>())?;
        Ok(rows)
    }

    fn insert_grade(&self, new: &NewGrade) -> Result<Grade, StoreError> {
        if !self.exists("students", new.student_id.get())? {
            return Err(StoreError::Rejected(format!(
                "student {} does not exist",
                new.student_id
            )));
        }
        if !self.exists("subjects", new.subject_id.get())? {
            return Err(StoreError::Rejected(format!(
                "subject {} does not exist",
                new.subject_id
            )));
        }

        self.conn.execute(
            "INSERT INTO grades(student_id, subject_id, grade, semester, period, created_at)
             VALUES(?, ?, ?, ?, ?, ?)",
            (
                new.student_id.get(),
                new.subject_id.get(),
                new.grade,
                new.semester,
                new.period,
                new.created_at,
            ),
        )?;
        Ok(Grade {
            id: GradeId(self.conn.last_insert_rowid()),
            student_id: new.student_id,
            subject_id: new.subject_id,
            grade: new.grade,
            semester: new.semester.label().to_string(),
            period: new.period.label().to_string(),
            created_at: new.created_at,
        })
    }

    fn delete_grade(&self, id: GradeId) -> Result<bool, StoreError> {
        let n = self
            .conn
            .execute("DELETE FROM grades WHERE id = ?", [id.get()])?;
        Ok(n > 0)
    }
}
