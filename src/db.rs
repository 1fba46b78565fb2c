use sqlx::{PgPool, Row};
use tracing::warn;

use crate::error::{CoreError, CoreResult};
use crate::models::{
    CatalogRow, CatalogSubject, EvaluationRecord, ProspectusSubject, Semester, Student,
};

pub async fn init_db(pool: &PgPool) -> CoreResult<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| CoreError::Persistence(sqlx::Error::from(e)))?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> CoreResult<()> {
    let catalog: Vec<(i16, Semester, &str, &str, i32)> = vec![
        (1, Semester::First, "CS101", "Introduction to Computing", 3),
        (1, Semester::First, "CS102", "Fundamentals of Programming", 3),
        (1, Semester::First, "MATH101", "Calculus I", 3),
        (1, Semester::First, "ENG101", "Purposive Communication", 3),
        (1, Semester::First, "GE101", "Understanding the Self", 3),
        (1, Semester::First, "NSTP101", "National Service Training I", 3),
        (1, Semester::First, "PE101", "Physical Education I", 2),
        (1, Semester::Second, "CS103", "Data Structures and Algorithms", 3),
        (1, Semester::Second, "CS104", "Discrete Mathematics", 3),
        (1, Semester::Second, "MATH102", "Calculus II", 3),
        (1, Semester::Second, "GE102", "Readings in History", 3),
        (1, Semester::Second, "NSTP102", "National Service Training II", 3),
        (1, Semester::Second, "PE102", "Physical Education II", 2),
        (2, Semester::First, "CS201", "Object-Oriented Programming", 3),
        (2, Semester::First, "CS202", "Computer Organization", 3),
        (2, Semester::First, "MATH201", "Linear Algebra", 3),
        (2, Semester::First, "STAT201", "Probability and Statistics", 3),
        (2, Semester::First, "PE201", "Physical Education III", 2),
        (2, Semester::Second, "CS203", "Design and Analysis of Algorithms", 3),
        (2, Semester::Second, "CS204", "Operating Systems", 3),
        (2, Semester::Second, "CS205", "Information Management", 3),
        (2, Semester::Second, "GE201", "Science, Technology and Society", 3),
        (2, Semester::Second, "PE202", "Physical Education IV", 2),
        (2, Semester::Summer, "CS210", "Programming Practicum", 2),
        (3, Semester::First, "CS301", "Software Engineering I", 3),
        (3, Semester::First, "CS302", "Computer Networks", 3),
        (3, Semester::First, "CS303", "Automata and Language Theory", 3),
        (3, Semester::Second, "CS304", "Software Engineering II", 3),
        (3, Semester::Second, "CS305", "Database Systems", 3),
        (3, Semester::Second, "CS306", "Human-Computer Interaction", 3),
        (3, Semester::Summer, "CS310", "Industry Immersion", 3),
        (4, Semester::First, "CS401", "Thesis I", 3),
        (4, Semester::First, "CS402", "Information Assurance and Security", 3),
        (4, Semester::Second, "CS403", "Thesis II", 3),
        (4, Semester::Second, "CS404", "Professional Issues in Computing", 3),
    ];

    for (year, semester, code, description, units) in catalog {
        sqlx::query(
            r#"
            INSERT INTO prospectus.catalog_subjects
            (program, year, semester, code, description, units)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (program, year, semester, code) DO UPDATE
            SET description = EXCLUDED.description, units = EXCLUDED.units
            "#,
        )
        .bind("BSCS")
        .bind(year)
        .bind(semester.storage_label())
        .bind(code)
        .bind(description)
        .bind(units)
        .execute(pool)
        .await?;
    }

    let students = vec![
        (
            "2023-0415",
            "Rhea Dominguez",
            "rhea.dominguez@univ.edu",
            "BS Computer Science",
            2i16,
        ),
        (
            "2024-1108",
            "Caleb Ramos",
            "caleb.ramos@univ.edu",
            "BS Computer Science",
            1i16,
        ),
        (
            "2022-0781",
            "Mara Villanueva",
            "mara.villanueva@univ.edu",
            "BS Computer Science",
            3i16,
        ),
    ];

    for (id, full_name, email, course, year_level) in students {
        sqlx::query(
            r#"
            INSERT INTO prospectus.students (id, full_name, email, course, year_level)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET full_name = EXCLUDED.full_name,
                email = EXCLUDED.email,
                course = EXCLUDED.course,
                year_level = EXCLUDED.year_level
            "#,
        )
        .bind(id)
        .bind(full_name)
        .bind(email)
        .bind(course)
        .bind(year_level)
        .execute(pool)
        .await?;
    }

    Ok(())
}

pub async fn get_student(pool: &PgPool, student_id: &str) -> CoreResult<Student> {
    let row = sqlx::query(
        "SELECT id, full_name, email, course, year_level FROM prospectus.students WHERE id = $1",
    )
    .bind(student_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| CoreError::not_found(format!("student {student_id}")))?;

    Ok(Student {
        id: row.get("id"),
        full_name: row.get("full_name"),
        email: row.get("email"),
        course: row.get("course"),
        year_level: row.get("year_level"),
    })
}

/// Reads the full catalog subtree for a program. Rows carrying a
/// semester label outside the fixed enumeration are skipped, not
/// raised, to tolerate malformed legacy data.
pub async fn fetch_catalog(pool: &PgPool, program: &str) -> CoreResult<Vec<CatalogRow>> {
    let rows = sqlx::query(
        r#"
        SELECT year, semester, code, description, units
        FROM prospectus.catalog_subjects
        WHERE program = $1
        ORDER BY year, semester, code
        "#,
    )
    .bind(program)
    .fetch_all(pool)
    .await?;

    let mut catalog = Vec::new();
    for row in rows {
        let label: String = row.get("semester");
        let semester = match Semester::from_storage(&label) {
            Ok(semester) => semester,
            Err(_) => {
                warn!(program, label = %label, "skipping catalog row with unknown semester label");
                continue;
            }
        };
        catalog.push(CatalogRow {
            year: row.get("year"),
            semester,
            subject: CatalogSubject {
                code: row.get("code"),
                description: row.get("description"),
                units: row.get("units"),
            },
        });
    }

    if catalog.is_empty() {
        return Err(CoreError::not_found(format!("catalog for program {program}")));
    }

    Ok(catalog)
}

/// Ordered by year, then semester rank (First < Second < Summer), then
/// code. The rank lives in the `Semester` enum, so ordering happens
/// after row mapping rather than in SQL.
pub async fn list_subjects(
    pool: &PgPool,
    student_id: &str,
    program: &str,
) -> CoreResult<Vec<ProspectusSubject>> {
    let rows = sqlx::query(
        r#"
        SELECT student_id, program, year, semester, code, description, units, passed
        FROM prospectus.prospectus_subjects
        WHERE student_id = $1 AND program = $2
        "#,
    )
    .bind(student_id)
    .bind(program)
    .fetch_all(pool)
    .await?;

    let mut subjects = Vec::new();
    for row in rows {
        let label: String = row.get("semester");
        let semester = match Semester::from_storage(&label) {
            Ok(semester) => semester,
            Err(_) => {
                warn!(student_id, label = %label, "skipping prospectus row with unknown semester label");
                continue;
            }
        };
        subjects.push(ProspectusSubject {
            student_id: row.get("student_id"),
            program: row.get("program"),
            year: row.get("year"),
            semester,
            code: row.get("code"),
            description: row.get("description"),
            units: row.get("units"),
            passed: row.get("passed"),
        });
    }

    subjects.sort_by(|a, b| {
        (a.year, a.semester, a.code.as_str()).cmp(&(b.year, b.semester, b.code.as_str()))
    });
    Ok(subjects)
}

pub async fn get_subject(
    pool: &PgPool,
    student_id: &str,
    program: &str,
    year: i16,
    semester: Semester,
    code: &str,
) -> CoreResult<ProspectusSubject> {
    let row = sqlx::query(
        r#"
        SELECT description, units, passed
        FROM prospectus.prospectus_subjects
        WHERE student_id = $1 AND program = $2
          AND year = $3 AND semester = $4 AND code = $5
        "#,
    )
    .bind(student_id)
    .bind(program)
    .bind(year)
    .bind(semester.storage_label())
    .bind(code)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| {
        CoreError::not_found(format!("subject {code} for student {student_id}"))
    })?;

    Ok(ProspectusSubject {
        student_id: student_id.to_string(),
        program: program.to_string(),
        year,
        semester,
        code: code.to_string(),
        description: row.get("description"),
        units: row.get("units"),
        passed: row.get("passed"),
    })
}

/// Single immediate write, distinct from the batched save-all path.
pub async fn update_subject_status(
    pool: &PgPool,
    student_id: &str,
    program: &str,
    year: i16,
    semester: Semester,
    code: &str,
    passed: bool,
) -> CoreResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE prospectus.prospectus_subjects
        SET passed = $6
        WHERE student_id = $1 AND program = $2
          AND year = $3 AND semester = $4 AND code = $5
        "#,
    )
    .bind(student_id)
    .bind(program)
    .bind(year)
    .bind(semester.storage_label())
    .bind(code)
    .bind(passed)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(CoreError::not_found(format!(
            "subject {code} for student {student_id}"
        )));
    }
    Ok(())
}

pub async fn is_initialized(pool: &PgPool, student_id: &str, program: &str) -> CoreResult<bool> {
    let row = sqlx::query(
        "SELECT 1 AS marker FROM prospectus.prospectus_roots WHERE student_id = $1 AND program = $2",
    )
    .bind(student_id)
    .bind(program)
    .fetch_optional(pool)
    .await?;
    Ok(row.is_some())
}

pub async fn insert_evaluation(pool: &PgPool, record: &EvaluationRecord) -> CoreResult<()> {
    sqlx::query(
        r#"
        INSERT INTO prospectus.evaluation_history
        (id, student_id, student_name, email, course, year_level,
         evaluation_date, evaluator_name, courses)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(record.id)
    .bind(&record.student_id)
    .bind(&record.student_name)
    .bind(&record.email)
    .bind(&record.course)
    .bind(record.year_level)
    .bind(record.evaluation_date)
    .bind(&record.evaluator_name)
    .bind(sqlx::types::Json(&record.courses))
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn fetch_evaluations(
    pool: &PgPool,
    email: Option<&str>,
    evaluator: Option<&str>,
) -> CoreResult<Vec<EvaluationRecord>> {
    let mut query = String::from(
        "SELECT id, student_id, student_name, email, course, year_level, \
         evaluation_date, evaluator_name, courses \
         FROM prospectus.evaluation_history",
    );

    if email.is_some() {
        query.push_str(" WHERE email = $1");
    } else if evaluator.is_some() {
        query.push_str(" WHERE evaluator_name = $1");
    }
    query.push_str(" ORDER BY evaluation_date");

    let mut rows = sqlx::query(&query);
    if let Some(value) = email {
        rows = rows.bind(value);
    } else if let Some(value) = evaluator {
        rows = rows.bind(value);
    }

    let records = rows.fetch_all(pool).await?;
    let mut evaluations = Vec::new();

    for row in records {
        let courses: sqlx::types::Json<Vec<crate::models::CourseRecord>> = row.get("courses");
        evaluations.push(EvaluationRecord {
            id: row.get("id"),
            student_id: row.get("student_id"),
            student_name: row.get("student_name"),
            email: row.get("email"),
            course: row.get("course"),
            year_level: row.get("year_level"),
            evaluation_date: row.get("evaluation_date"),
            evaluator_name: row.get("evaluator_name"),
            courses: courses.0,
        });
    }

    Ok(evaluations)
}
