use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "addresses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub student_id: Uuid,
    pub recipient: String,
    pub phone: String,
    pub campus: String,
    pub building: String,
    pub detail: String,
    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// Single-line form copied onto orders.
    pub fn formatted(&self) -> String {
        format!(
            "{} {} {} ({} {})",
            self.campus, self.building, self.detail, self.recipient, self.phone
        )
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::students::Entity",
        from = "Column::StudentId",
        to = "super::students::Column::Id"
    )]
    Students,
}

impl Related<super::students::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Students.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
