use sea_orm::entity::prelude::*;

/// How an expense recurs, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum ExpenseType {
    #[sea_orm(string_value = "one-time")]
    OneTime,
    #[sea_orm(string_value = "recurring")]
    Recurring,
    #[sea_orm(string_value = "future")]
    Future,
}

/// A spend record owned by exactly one user and categorized under a tax
/// category. Every query against this table filters on `user_id`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub description: String,
    pub amount: Decimal,
    pub date: Date,
    pub category_id: i32,
    pub expense_type: ExpenseType,
    /// Path of the uploaded receipt, relative to the upload root.
    pub receipt_path: Option<String>,
    /// Redundant with `expense_type`, kept in the schema for reporting.
    pub is_recurring: bool,
    /// Day of month, 1-28, meaningful only for recurring expenses.
    pub recurring_day: Option<i32>,
    /// Saved card charged when auto-pay is configured. Must belong to the
    /// same user; validated before persisting.
    pub payment_method_id: Option<i32>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::tax_category::Entity",
        from = "Column::CategoryId",
        to = "super::tax_category::Column::Id"
    )]
    TaxCategory,
    #[sea_orm(
        belongs_to = "super::payment_method::Entity",
        from = "Column::PaymentMethodId",
        to = "super::payment_method::Column::Id"
    )]
    PaymentMethod,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::tax_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TaxCategory.def()
    }
}

impl Related<super::payment_method::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentMethod.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
