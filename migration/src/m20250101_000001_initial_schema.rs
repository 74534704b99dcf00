use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Shells::Table)
                    .if_not_exists()
                    .col(pk_auto(Shells::Id))
                    .col(string_len(Shells::Name, 8))
                    .col(string_len(Shells::Path, 32))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Access::Table)
                    .if_not_exists()
                    .col(pk_auto(Access::Id))
                    .col(string_len(Access::Name, 64))
                    .col(string_len(Access::Description, 128))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Roles::Table)
                    .if_not_exists()
                    .col(pk_auto(Roles::Id))
                    .col(string_len(Roles::Name, 64))
                    .col(string_len(Roles::Description, 256))
                    .to_owned(),
            )
            .await?;

        // Group names are deliberately not unique
        manager
            .create_table(
                Table::create()
                    .table(Groups::Table)
                    .if_not_exists()
                    .col(pk_auto(Groups::Id))
                    .col(string_len(Groups::Name, 64))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string_len(Users::Name, 64))
                    .col(string_len(Users::Username, 32))
                    .col(string_len(Users::Email, 164))
                    .col(text_null(Users::SshPublicKey))
                    .col(integer_null(Users::ShellId))
                    .col(integer_null(Users::AccessId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_users_shell")
                            .from(Users::Table, Users::ShellId)
                            .to(Shells::Table, Shells::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_users_access")
                            .from(Users::Table, Users::AccessId)
                            .to(Access::Table, Access::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_users_username")
                    .table(Users::Table)
                    .col(Users::Username)
                    .to_owned(),
            )
            .await?;

        // Instance names are the check-in key but carry no unique constraint;
        // find-or-create in the check-in path keeps them distinct.
        manager
            .create_table(
                Table::create()
                    .table(Instances::Table)
                    .if_not_exists()
                    .col(pk_auto(Instances::Id))
                    .col(string_len_null(Instances::InstanceId, 32))
                    .col(string_len(Instances::Name, 256))
                    .col(
                        ColumnDef::new(Instances::Role)
                            .string_len(64)
                            .not_null()
                            .default("Unknown"),
                    )
                    .col(json_null(Instances::Net))
                    .col(big_integer(Instances::CreatedAt))
                    .col(big_integer(Instances::LastSeen))
                    .col(json_null(Instances::RawPayload))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_instances_name")
                    .table(Instances::Table)
                    .col(Instances::Name)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Instances::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Groups::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Roles::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Access::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Shells::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Shells {
    Table,
    Id,
    Name,
    Path,
}

#[derive(DeriveIden)]
enum Access {
    Table,
    Id,
    Name,
    Description,
}

#[derive(DeriveIden)]
enum Roles {
    Table,
    Id,
    Name,
    Description,
}

#[derive(DeriveIden)]
enum Groups {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Name,
    Username,
    Email,
    SshPublicKey,
    ShellId,
    AccessId,
}

#[derive(DeriveIden)]
enum Instances {
    Table,
    Id,
    InstanceId,
    Name,
    Role,
    Net,
    CreatedAt,
    LastSeen,
    RawPayload,
}
