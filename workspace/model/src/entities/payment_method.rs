use sea_orm::entity::prelude::*;

/// Lifecycle of a saved card. Deleting is a soft delete: the row stays
/// for history with `status = canceled` and is excluded from all reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum Status {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "canceled")]
    Canceled,
}

/// A saved card belonging to one user.
///
/// Invariant: at most one active method per user has `is_default = true`.
/// The clear-then-set swap runs inside a single transaction scoped by
/// `user_id` (see the payment-method handlers).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "payment_methods")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub nickname: Option<String>,
    pub card_type: String,
    /// Stored as provided; only ever read back masked to the last four.
    pub card_number: String,
    /// Two-digit month, e.g. "04".
    pub expiry_month: String,
    /// Four-digit year, e.g. "2027".
    pub expiry_year: String,
    /// Never serialized out of the API after creation.
    pub cvv: String,
    #[sea_orm(default_value = "false")]
    pub is_default: bool,
    pub status: Status,
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
    /// Expenses referencing this card for auto-pay.
    #[sea_orm(has_many = "super::expense::Entity")]
    Expense,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::expense::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expense.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
