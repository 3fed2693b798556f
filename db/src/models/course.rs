use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, Set};
use serde::Serialize;

/// Represents a course (one taught class) in the `courses` table.
///
/// Courses are created and maintained by admin tooling; the attendance engine
/// treats them as read-only.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "courses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Unique course code (e.g., "SE401.P12").
    pub code: String,
    pub subject_name: String,
    /// Owning lecturer (foreign key to `users`).
    pub lecturer_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::LecturerId",
        to = "super::user::Column::Id"
    )]
    Lecturer,
    #[sea_orm(has_many = "super::course_student::Entity")]
    Enrollments,
    #[sea_orm(has_many = "super::attendance_session::Entity")]
    Sessions,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lecturer.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl Related<super::course_student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enrollments.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl Related<super::attendance_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sessions.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create(
        db: &DatabaseConnection,
        code: &str,
        subject_name: &str,
        lecturer_id: i64,
    ) -> Result<Self, DbErr> {
        let now = Utc::now();
        let course = ActiveModel {
            code: Set(code.to_owned()),
            subject_name: Set(subject_name.to_owned()),
            lecturer_id: Set(lecturer_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        course.insert(db).await
    }

    /// Whether `user_id` owns (lectures) the course.
    pub fn is_lectured_by(&self, user_id: i64) -> bool {
        self.lecturer_id == user_id
    }
}
