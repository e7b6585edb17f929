//! Roster business logic - instruments, teachers and students.
//!
//! Teachers and students are never deleted: deactivation keeps every class,
//! enrollment and ledger entry that references them resolvable. All functions are
//! async and return Result types for error handling.

use crate::{
    core::{optional_text, require_text},
    entities::{
        Instrument, Student, StudentSkill, Teacher, TeacherInstrument, instrument,
        sea_orm_active_enums::{Qualification, SkillLevel},
        student, student_skill, teacher, teacher_instrument,
    },
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Creates an instrument. Names are trimmed and must be unique.
pub async fn create_instrument(db: &DatabaseConnection, name: &str) -> Result<instrument::Model> {
    let name = require_text("Instrument name", name)?;

    if get_instrument_by_name(db, &name).await?.is_some() {
        return Err(Error::validation(format!("Instrument '{name}' already exists")));
    }

    let created = instrument::ActiveModel {
        name: Set(name),
        ..Default::default()
    }
    .insert(db)
    .await?;
    tracing::info!(instrument_id = created.id, "Created instrument {}", created.name);
    Ok(created)
}

/// Finds an instrument by exact name.
pub async fn get_instrument_by_name(
    db: &DatabaseConnection,
    name: &str,
) -> Result<Option<instrument::Model>> {
    Instrument::find()
        .filter(instrument::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds an instrument by id.
pub async fn get_instrument(
    db: &DatabaseConnection,
    instrument_id: i64,
) -> Result<Option<instrument::Model>> {
    Instrument::find_by_id(instrument_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// All instruments, alphabetically.
pub async fn list_instruments(db: &DatabaseConnection) -> Result<Vec<instrument::Model>> {
    Instrument::find()
        .order_by_asc(instrument::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Creates each named instrument that does not exist yet.
///
/// Used at startup to seed the catalog from academy.toml; returns only the
/// instruments that were created.
pub async fn seed_instruments(
    db: &DatabaseConnection,
    names: &[String],
) -> Result<Vec<instrument::Model>> {
    let mut created = Vec::new();
    for name in names {
        let trimmed = name.trim();
        if trimmed.is_empty() || get_instrument_by_name(db, trimmed).await?.is_some() {
            continue;
        }
        created.push(create_instrument(db, trimmed).await?);
    }
    Ok(created)
}

/// Input for [`create_teacher`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTeacher {
    /// Full name
    pub name: String,
    /// Mailing address
    pub address: String,
    /// Contact email
    pub email: String,
    /// Primary phone number
    pub primary_contact: String,
    /// Date of birth
    pub date_of_birth: Option<Date>,
    /// Biography
    pub biography: Option<String>,
    /// Musical specialization
    pub specialization: String,
    /// Highest qualification
    pub qualification: Qualification,
    /// Date the teacher joined
    pub date_of_enrollment: Date,
    /// Hourly rate in dollars
    pub hourly_rate: f64,
    /// Instruments the teacher teaches
    pub instrument_ids: Vec<i64>,
}

async fn ensure_instruments_exist<C>(db: &C, instrument_ids: &[i64]) -> Result<()>
where
    C: ConnectionTrait,
{
    for &instrument_id in instrument_ids {
        Instrument::find_by_id(instrument_id)
            .one(db)
            .await?
            .ok_or_else(|| Error::not_found("instrument", instrument_id))?;
    }
    Ok(())
}

fn dedup_ids(ids: &[i64]) -> Vec<i64> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// Creates a teacher together with the instruments they teach.
pub async fn create_teacher(db: &DatabaseConnection, input: NewTeacher) -> Result<teacher::Model> {
    let name = require_text("Teacher name", &input.name)?;
    if input.hourly_rate < 0.0 || !input.hourly_rate.is_finite() {
        return Err(Error::InvalidAmount {
            amount: input.hourly_rate,
        });
    }
    let instrument_ids = dedup_ids(&input.instrument_ids);

    let txn = db.begin().await?;
    ensure_instruments_exist(&txn, &instrument_ids).await?;

    let created = teacher::ActiveModel {
        name: Set(name),
        address: Set(input.address.trim().to_string()),
        email: Set(input.email.trim().to_string()),
        primary_contact: Set(input.primary_contact.trim().to_string()),
        date_of_birth: Set(input.date_of_birth),
        biography: Set(optional_text(input.biography)),
        specialization: Set(input.specialization.trim().to_string()),
        qualification: Set(input.qualification),
        date_of_enrollment: Set(input.date_of_enrollment),
        hourly_rate: Set(input.hourly_rate),
        active: Set(true),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    for instrument_id in instrument_ids {
        teacher_instrument::ActiveModel {
            teacher_id: Set(created.id),
            instrument_id: Set(instrument_id),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;
    tracing::info!(teacher_id = created.id, "Created teacher {}", created.name);
    Ok(created)
}

/// Finds a teacher by id.
pub async fn get_teacher(
    db: &DatabaseConnection,
    teacher_id: i64,
) -> Result<Option<teacher::Model>> {
    Teacher::find_by_id(teacher_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Loads a teacher or fails with [`Error::NotFound`].
pub(crate) async fn require_teacher<C>(db: &C, teacher_id: i64) -> Result<teacher::Model>
where
    C: ConnectionTrait,
{
    Teacher::find_by_id(teacher_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("teacher", teacher_id))
}

/// Ids of the instruments a teacher teaches.
pub async fn teacher_instrument_ids<C>(db: &C, teacher_id: i64) -> Result<Vec<i64>>
where
    C: ConnectionTrait,
{
    let links = TeacherInstrument::find()
        .filter(teacher_instrument::Column::TeacherId.eq(teacher_id))
        .order_by_asc(teacher_instrument::Column::InstrumentId)
        .all(db)
        .await?;
    Ok(links.into_iter().map(|l| l.instrument_id).collect())
}

/// Whether a teacher is qualified for an instrument.
pub(crate) async fn teaches_instrument<C>(db: &C, teacher_id: i64, instrument_id: i64) -> Result<bool>
where
    C: ConnectionTrait,
{
    let link = TeacherInstrument::find()
        .filter(teacher_instrument::Column::TeacherId.eq(teacher_id))
        .filter(teacher_instrument::Column::InstrumentId.eq(instrument_id))
        .one(db)
        .await?;
    Ok(link.is_some())
}

/// Marks a teacher inactive. Existing classes and enrollments are untouched.
pub async fn deactivate_teacher(db: &DatabaseConnection, teacher_id: i64) -> Result<teacher::Model> {
    let existing = require_teacher(db, teacher_id).await?;
    let mut model: teacher::ActiveModel = existing.into();
    model.active = Set(false);
    let updated = model.update(db).await?;
    tracing::info!(teacher_id, "Deactivated teacher");
    Ok(updated)
}

/// Filter for [`list_teachers`]; `None` fields match everything.
#[derive(Debug, Clone, Default)]
pub struct TeacherFilter {
    /// Only active (or only inactive) teachers
    pub active: Option<bool>,
    /// Only teachers of this instrument
    pub instrument_id: Option<i64>,
    /// Name contains this text
    pub name_contains: Option<String>,
}

/// Teachers matching every set filter field, alphabetically.
pub async fn list_teachers(
    db: &DatabaseConnection,
    filter: &TeacherFilter,
) -> Result<Vec<teacher::Model>> {
    let mut query = Teacher::find();
    if let Some(active) = filter.active {
        query = query.filter(teacher::Column::Active.eq(active));
    }
    if let Some(instrument_id) = filter.instrument_id {
        let teacher_ids: Vec<i64> = TeacherInstrument::find()
            .filter(teacher_instrument::Column::InstrumentId.eq(instrument_id))
            .all(db)
            .await?
            .into_iter()
            .map(|l| l.teacher_id)
            .collect();
        query = query.filter(teacher::Column::Id.is_in(teacher_ids));
    }
    if let Some(text) = filter.name_contains.as_deref() {
        query = query.filter(teacher::Column::Name.contains(text));
    }
    query
        .order_by_asc(teacher::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// A student's level on one instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillInput {
    /// Instrument id
    pub instrument_id: i64,
    /// Level on that instrument
    pub level: SkillLevel,
}

/// Input for [`create_student`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStudent {
    /// Full name
    pub name: String,
    /// Mailing address
    pub address: String,
    /// Contact email
    pub email: String,
    /// Primary phone number
    pub primary_contact: String,
    /// Date of birth
    pub date_of_birth: Option<Date>,
    /// Skill level per instrument
    pub skill_levels: Vec<SkillInput>,
}

/// Creates a student together with their skill levels.
pub async fn create_student(db: &DatabaseConnection, input: NewStudent) -> Result<student::Model> {
    let name = require_text("Student name", &input.name)?;
    let instrument_ids: Vec<i64> = input.skill_levels.iter().map(|s| s.instrument_id).collect();
    if dedup_ids(&instrument_ids).len() != instrument_ids.len() {
        return Err(Error::validation(
            "A student can have only one skill level per instrument",
        ));
    }

    let txn = db.begin().await?;
    ensure_instruments_exist(&txn, &instrument_ids).await?;

    let created = student::ActiveModel {
        name: Set(name),
        address: Set(input.address.trim().to_string()),
        email: Set(input.email.trim().to_string()),
        primary_contact: Set(input.primary_contact.trim().to_string()),
        date_of_birth: Set(input.date_of_birth),
        active: Set(true),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    for skill in input.skill_levels {
        student_skill::ActiveModel {
            student_id: Set(created.id),
            instrument_id: Set(skill.instrument_id),
            level: Set(skill.level),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;
    tracing::info!(student_id = created.id, "Created student {}", created.name);
    Ok(created)
}

/// Finds a student by id.
pub async fn get_student(
    db: &DatabaseConnection,
    student_id: i64,
) -> Result<Option<student::Model>> {
    Student::find_by_id(student_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Loads a student or fails with [`Error::NotFound`].
pub(crate) async fn require_student<C>(db: &C, student_id: i64) -> Result<student::Model>
where
    C: ConnectionTrait,
{
    Student::find_by_id(student_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("student", student_id))
}

/// A student's skill levels, ordered by instrument id.
pub async fn student_skill_levels(
    db: &DatabaseConnection,
    student_id: i64,
) -> Result<Vec<SkillInput>> {
    let skills = StudentSkill::find()
        .filter(student_skill::Column::StudentId.eq(student_id))
        .order_by_asc(student_skill::Column::InstrumentId)
        .all(db)
        .await?;
    Ok(skills
        .into_iter()
        .map(|s| SkillInput {
            instrument_id: s.instrument_id,
            level: s.level,
        })
        .collect())
}

/// Sets (or replaces) a student's level on one instrument.
pub async fn set_skill_level(
    db: &DatabaseConnection,
    student_id: i64,
    skill: SkillInput,
) -> Result<()> {
    let txn = db.begin().await?;
    require_student(&txn, student_id).await?;
    ensure_instruments_exist(&txn, &[skill.instrument_id]).await?;

    let existing = StudentSkill::find()
        .filter(student_skill::Column::StudentId.eq(student_id))
        .filter(student_skill::Column::InstrumentId.eq(skill.instrument_id))
        .one(&txn)
        .await?;

    if let Some(row) = existing {
        let mut model: student_skill::ActiveModel = row.into();
        model.level = Set(skill.level);
        model.update(&txn).await?;
    } else {
        student_skill::ActiveModel {
            student_id: Set(student_id),
            instrument_id: Set(skill.instrument_id),
            level: Set(skill.level),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;
    Ok(())
}

/// Marks a student inactive.
pub async fn deactivate_student(db: &DatabaseConnection, student_id: i64) -> Result<student::Model> {
    let existing = require_student(db, student_id).await?;
    let mut model: student::ActiveModel = existing.into();
    model.active = Set(false);
    let updated = model.update(db).await?;
    tracing::info!(student_id, "Deactivated student");
    Ok(updated)
}

/// Filter for [`list_students`]; `None` fields match everything.
#[derive(Debug, Clone, Default)]
pub struct StudentFilter {
    /// Only active (or only inactive) students
    pub active: Option<bool>,
    /// Only students with a skill level on this instrument
    pub instrument_id: Option<i64>,
    /// Name contains this text
    pub name_contains: Option<String>,
}

/// Students matching every set filter field, alphabetically.
pub async fn list_students(
    db: &DatabaseConnection,
    filter: &StudentFilter,
) -> Result<Vec<student::Model>> {
    let mut query = Student::find();
    if let Some(active) = filter.active {
        query = query.filter(student::Column::Active.eq(active));
    }
    if let Some(instrument_id) = filter.instrument_id {
        let student_ids: Vec<i64> = StudentSkill::find()
            .filter(student_skill::Column::InstrumentId.eq(instrument_id))
            .all(db)
            .await?
            .into_iter()
            .map(|s| s.student_id)
            .collect();
        query = query.filter(student::Column::Id.is_in(student_ids));
    }
    if let Some(text) = filter.name_contains.as_deref() {
        query = query.filter(student::Column::Name.contains(text));
    }
    query
        .order_by_asc(student::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_instrument_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = create_instrument(&db, "   ").await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_teacher_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let mut input = teacher_input("  ", vec![]);
        let result = create_teacher(&db, input.clone()).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        input.name = "Alice".to_string();
        input.hourly_rate = -10.0;
        let result = create_teacher(&db, input).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidAmount { amount: -10.0 }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_instrument_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        create_instrument(&db, "Piano").await?;

        let result = create_instrument(&db, " Piano ").await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_seed_instruments_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        let names = vec!["Violin".to_string(), "Piano".to_string(), String::new()];

        let first = seed_instruments(&db, &names).await?;
        assert_eq!(first.len(), 2);

        let second = seed_instruments(&db, &names).await?;
        assert!(second.is_empty());

        let all = list_instruments(&db).await?;
        let names: Vec<&str> = all.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Piano", "Violin"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_teacher_with_instruments() -> Result<()> {
        let db = setup_test_db().await?;
        let piano = create_instrument(&db, "Piano").await?;
        let violin = create_instrument(&db, "Violin").await?;

        let teacher =
            create_teacher(&db, teacher_input("Alice", vec![violin.id, piano.id, piano.id]))
                .await?;
        assert!(teacher.active);
        assert_eq!(teacher.hourly_rate, 60.0);

        let taught = teacher_instrument_ids(&db, teacher.id).await?;
        assert_eq!(taught, vec![piano.id, violin.id]);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_teacher_unknown_instrument_rolls_back() -> Result<()> {
        let db = setup_test_db().await?;

        let result = create_teacher(&db, teacher_input("Alice", vec![42])).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::NotFound {
                entity: "instrument",
                id: 42
            }
        ));
        assert!(list_teachers(&db, &TeacherFilter::default()).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_list_teachers_filters_compose() -> Result<()> {
        let db = setup_test_db().await?;
        let piano = create_instrument(&db, "Piano").await?;
        let guitar = create_instrument(&db, "Guitar").await?;

        let alice = create_teacher(&db, teacher_input("Alice", vec![piano.id])).await?;
        let bob = create_teacher(&db, teacher_input("Bob", vec![piano.id, guitar.id])).await?;
        create_teacher(&db, teacher_input("Carol", vec![guitar.id])).await?;
        deactivate_teacher(&db, bob.id).await?;

        let piano_teachers = list_teachers(
            &db,
            &TeacherFilter {
                instrument_id: Some(piano.id),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(piano_teachers.len(), 2);

        let active_piano = list_teachers(
            &db,
            &TeacherFilter {
                active: Some(true),
                instrument_id: Some(piano.id),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(active_piano.len(), 1);
        assert_eq!(active_piano[0].id, alice.id);

        let by_name = list_teachers(
            &db,
            &TeacherFilter {
                name_contains: Some("aro".to_string()),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].name, "Carol");
        Ok(())
    }

    #[tokio::test]
    async fn test_student_skills_and_filters() -> Result<()> {
        let db = setup_test_db().await?;
        let piano = create_instrument(&db, "Piano").await?;
        let violin = create_instrument(&db, "Violin").await?;

        let emma = create_test_student(&db, "Emma").await?;
        set_skill_level(
            &db,
            emma.id,
            SkillInput {
                instrument_id: piano.id,
                level: SkillLevel::Beginner,
            },
        )
        .await?;
        set_skill_level(
            &db,
            emma.id,
            SkillInput {
                instrument_id: piano.id,
                level: SkillLevel::Intermediate,
            },
        )
        .await?;
        let noah = create_test_student(&db, "Noah").await?;
        set_skill_level(
            &db,
            noah.id,
            SkillInput {
                instrument_id: violin.id,
                level: SkillLevel::Advanced,
            },
        )
        .await?;

        let skills = student_skill_levels(&db, emma.id).await?;
        assert_eq!(
            skills,
            vec![SkillInput {
                instrument_id: piano.id,
                level: SkillLevel::Intermediate
            }]
        );

        let pianists = list_students(
            &db,
            &StudentFilter {
                instrument_id: Some(piano.id),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(pianists.len(), 1);
        assert_eq!(pianists[0].id, emma.id);

        deactivate_student(&db, noah.id).await?;
        let active = list_students(
            &db,
            &StudentFilter {
                active: Some(true),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(active.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_student_rejects_duplicate_skill() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let skill = SkillInput {
            instrument_id: 1,
            level: SkillLevel::Beginner,
        };
        let input = NewStudent {
            name: "Emma".to_string(),
            address: String::new(),
            email: String::new(),
            primary_contact: String::new(),
            date_of_birth: None,
            skill_levels: vec![skill, skill],
        };

        let result = create_student(&db, input).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));
        Ok(())
    }
}
