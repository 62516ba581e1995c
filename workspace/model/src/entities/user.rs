use sea_orm::entity::prelude::*;

/// Role of a user. Admins manage user approval and tax categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum Role {
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "user")]
    User,
}

/// Represents a registered account holder.
/// `is_approved` gates login: a freshly registered user cannot log in
/// until an admin flips the flag.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    /// bcrypt hash; never serialized out of the API.
    pub password_hash: String,
    pub address: Option<String>,
    pub contact_number: Option<String>,
    pub gender: Option<String>,
    pub nationality: Option<String>,
    pub id_number: Option<String>,
    pub role: Role,
    pub is_approved: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A user owns their expenses.
    #[sea_orm(has_many = "super::expense::Entity")]
    Expense,
    /// A user owns their saved payment methods.
    #[sea_orm(has_many = "super::payment_method::Entity")]
    PaymentMethod,
}

impl Related<super::expense::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expense.def()
    }
}

impl Related<super::payment_method::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentMethod.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
