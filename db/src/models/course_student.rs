use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};

/// Enrollment of a student on a course's roster.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, serde::Serialize)]
#[sea_orm(table_name = "course_students")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub course_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub student_id: i64,

    /// When the student was registered; defines roster order.
    pub joined_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::course::Entity",
        from = "Column::CourseId",
        to = "super::course::Column::Id"
    )]
    Course,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::StudentId",
        to = "super::user::Column::Id"
    )]
    Student,
}

impl Related<super::course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn enroll(
        db: &DatabaseConnection,
        course_id: i64,
        student_id: i64,
    ) -> Result<Self, DbErr> {
        let enrollment = ActiveModel {
            course_id: Set(course_id),
            student_id: Set(student_id),
            joined_at: Set(Utc::now()),
        };

        enrollment.insert(db).await
    }

    pub async fn is_enrolled(
        db: &DatabaseConnection,
        course_id: i64,
        student_id: i64,
    ) -> Result<bool, DbErr> {
        Ok(Entity::find()
            .filter(Column::CourseId.eq(course_id))
            .filter(Column::StudentId.eq(student_id))
            .one(db)
            .await?
            .is_some())
    }

    /// The course roster in enrollment order (`joined_at`, then `student_id`).
    pub async fn roster(db: &DatabaseConnection, course_id: i64) -> Result<Vec<Self>, DbErr> {
        Entity::find()
            .filter(Column::CourseId.eq(course_id))
            .order_by_asc(Column::JoinedAt)
            .order_by_asc(Column::StudentId)
            .all(db)
            .await
    }
}
