use sea_orm::entity::prelude::*;

/// A named percentage rate applied to expenses to derive their deductible
/// tax amount. The amount itself is never stored; it is recomputed from
/// the current rate at read time.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tax_categories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    /// Non-negative percentage, e.g. 5.00 for a 5% rate.
    pub tax_percentage: Decimal,
    /// Inactive categories stay attached to existing expenses.
    #[sea_orm(default_value = "true")]
    pub is_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::expense::Entity")]
    Expense,
}

impl Related<super::expense::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expense.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
