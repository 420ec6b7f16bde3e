use sea_orm::entity::prelude::*;

/// 单例表，仅 id = 1 一行
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub auto_approve_threshold: i32,
    pub high_risk_threshold: i32,
    pub email_notifications: bool,
    pub in_app_notifications: bool,
    pub auto_reject_high_risk: bool,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
