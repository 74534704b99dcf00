use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Group <-> User
        manager
            .create_table(
                Table::create()
                    .table(GroupUsers::Table)
                    .if_not_exists()
                    .col(integer(GroupUsers::GroupId))
                    .col(integer(GroupUsers::UserId))
                    .primary_key(
                        Index::create()
                            .col(GroupUsers::GroupId)
                            .col(GroupUsers::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_users_group")
                            .from(GroupUsers::Table, GroupUsers::GroupId)
                            .to(Groups::Table, Groups::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_users_user")
                            .from(GroupUsers::Table, GroupUsers::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Group <-> Instance
        manager
            .create_table(
                Table::create()
                    .table(GroupInstances::Table)
                    .if_not_exists()
                    .col(integer(GroupInstances::GroupId))
                    .col(integer(GroupInstances::InstanceId))
                    .primary_key(
                        Index::create()
                            .col(GroupInstances::GroupId)
                            .col(GroupInstances::InstanceId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_instances_group")
                            .from(GroupInstances::Table, GroupInstances::GroupId)
                            .to(Groups::Table, Groups::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_instances_instance")
                            .from(GroupInstances::Table, GroupInstances::InstanceId)
                            .to(Instances::Table, Instances::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Check-in looks memberships up by instance
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_group_instances_instance")
                    .table(GroupInstances::Table)
                    .col(GroupInstances::InstanceId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GroupInstances::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(GroupUsers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum GroupUsers {
    Table,
    GroupId,
    UserId,
}

#[derive(DeriveIden)]
enum GroupInstances {
    Table,
    GroupId,
    InstanceId,
}

#[derive(DeriveIden)]
enum Groups {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Instances {
    Table,
    Id,
}
