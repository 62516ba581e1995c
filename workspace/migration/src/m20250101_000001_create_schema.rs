use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create users table
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string(Users::Name))
                    .col(string(Users::Email).unique_key())
                    .col(string(Users::PasswordHash))
                    .col(string_null(Users::Address))
                    .col(string_null(Users::ContactNumber))
                    .col(string_null(Users::Gender))
                    .col(string_null(Users::Nationality))
                    .col(string_null(Users::IdNumber))
                    .col(string(Users::Role).default("user"))
                    .col(boolean(Users::IsApproved).default(false))
                    .col(timestamp_with_time_zone(Users::CreatedAt).default(Expr::current_timestamp()))
                    .to_owned(),
            )
            .await?;

        // Create tax_categories table
        manager
            .create_table(
                Table::create()
                    .table(TaxCategories::Table)
                    .if_not_exists()
                    .col(pk_auto(TaxCategories::Id))
                    .col(string(TaxCategories::Name))
                    .col(string_null(TaxCategories::Description))
                    .col(decimal(TaxCategories::TaxPercentage).decimal_len(5, 2))
                    .col(boolean(TaxCategories::IsActive).default(true))
                    .to_owned(),
            )
            .await?;

        // Create payment_methods table
        manager
            .create_table(
                Table::create()
                    .table(PaymentMethods::Table)
                    .if_not_exists()
                    .col(pk_auto(PaymentMethods::Id))
                    .col(integer(PaymentMethods::UserId))
                    .col(string_null(PaymentMethods::Nickname))
                    .col(string(PaymentMethods::CardType))
                    .col(string(PaymentMethods::CardNumber))
                    .col(string(PaymentMethods::ExpiryMonth))
                    .col(string(PaymentMethods::ExpiryYear))
                    .col(string(PaymentMethods::Cvv))
                    .col(boolean(PaymentMethods::IsDefault).default(false))
                    .col(string(PaymentMethods::Status).default("active"))
                    .col(
                        timestamp_with_time_zone(PaymentMethods::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_method_user")
                            .from(PaymentMethods::Table, PaymentMethods::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create expenses table
        manager
            .create_table(
                Table::create()
                    .table(Expenses::Table)
                    .if_not_exists()
                    .col(pk_auto(Expenses::Id))
                    .col(integer(Expenses::UserId))
                    .col(string(Expenses::Description))
                    .col(decimal(Expenses::Amount).decimal_len(16, 2))
                    .col(date(Expenses::Date))
                    .col(integer(Expenses::CategoryId))
                    .col(string(Expenses::ExpenseType).default("one-time"))
                    .col(string_null(Expenses::ReceiptPath))
                    .col(boolean(Expenses::IsRecurring).default(false))
                    .col(integer_null(Expenses::RecurringDay))
                    .col(integer_null(Expenses::PaymentMethodId))
                    .col(
                        timestamp_with_time_zone(Expenses::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expense_user")
                            .from(Expenses::Table, Expenses::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expense_category")
                            .from(Expenses::Table, Expenses::CategoryId)
                            .to(TaxCategories::Table, TaxCategories::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expense_payment_method")
                            .from(Expenses::Table, Expenses::PaymentMethodId)
                            .to(PaymentMethods::Table, PaymentMethods::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Expenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PaymentMethods::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TaxCategories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Name,
    Email,
    PasswordHash,
    Address,
    ContactNumber,
    Gender,
    Nationality,
    IdNumber,
    Role,
    IsApproved,
    CreatedAt,
}

#[derive(DeriveIden)]
enum TaxCategories {
    Table,
    Id,
    Name,
    Description,
    TaxPercentage,
    IsActive,
}

#[derive(DeriveIden)]
enum PaymentMethods {
    Table,
    Id,
    UserId,
    Nickname,
    CardType,
    CardNumber,
    ExpiryMonth,
    ExpiryYear,
    Cvv,
    IsDefault,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Expenses {
    Table,
    Id,
    UserId,
    Description,
    Amount,
    Date,
    CategoryId,
    ExpenseType,
    ReceiptPath,
    IsRecurring,
    RecurringDay,
    PaymentMethodId,
    CreatedAt,
}
