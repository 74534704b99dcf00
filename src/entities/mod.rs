pub mod access;
pub mod group;
pub mod group_instance;
pub mod group_user;
pub mod instance;
pub mod role;
pub mod shell;
pub mod user;

pub use access::Entity as Access;
pub use group::Entity as Group;
pub use group_instance::Entity as GroupInstance;
pub use group_user::Entity as GroupUser;
pub use instance::Entity as Instance;
pub use role::Entity as Role;
pub use shell::Entity as Shell;
pub use user::Entity as User;
