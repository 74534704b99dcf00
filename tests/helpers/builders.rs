use sea_orm::DatabaseConnection;
use yoked::admin::{self, NewGroup, NewUser};
use yoked::projection::{GroupView, UserView};

/// Builder for creating test users
pub struct UserBuilder {
    username: String,
    name: Option<String>,
    shell: String,
    access: String,
    ssh_pub_key: Option<String>,
}

impl UserBuilder {
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            name: None,
            shell: "bash".to_string(),
            access: "user".to_string(),
            ssh_pub_key: None,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_shell(mut self, shell: &str) -> Self {
        self.shell = shell.to_string();
        self
    }

    pub fn admin(mut self) -> Self {
        self.access = "admin".to_string();
        self
    }

    pub fn with_key(mut self, key: &str) -> Self {
        self.ssh_pub_key = Some(key.to_string());
        self
    }

    pub fn request(self) -> NewUser {
        NewUser {
            name: self.name.unwrap_or_else(|| self.username.clone()),
            email: format!("{}@example.com", self.username),
            username: self.username,
            shell: self.shell,
            access: self.access,
            ssh_pub_key: self.ssh_pub_key,
        }
    }

    pub async fn create(self, db: &DatabaseConnection) -> UserView {
        admin::create_user(db, self.request())
            .await
            .expect("Failed to create test user")
    }
}

/// Builder for creating test groups with members
pub struct GroupBuilder {
    name: String,
    user_ids: Vec<i32>,
    instance_ids: Vec<i32>,
}

impl GroupBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            user_ids: Vec::new(),
            instance_ids: Vec::new(),
        }
    }

    pub fn with_user(mut self, user: &UserView) -> Self {
        self.user_ids.push(user.id);
        self
    }

    pub fn with_instance(mut self, instance_id: i32) -> Self {
        self.instance_ids.push(instance_id);
        self
    }

    pub async fn create(self, db: &DatabaseConnection) -> GroupView {
        let group = admin::create_group(db, NewGroup { name: self.name })
            .await
            .expect("Failed to create test group");

        for user_id in self.user_ids {
            admin::add_user_to_group(db, group.id, user_id)
                .await
                .expect("Failed to add user to group");
        }
        for instance_id in self.instance_ids {
            admin::add_instance_to_group(db, group.id, instance_id)
                .await
                .expect("Failed to add instance to group");
        }

        admin::get_group(db, group.id)
            .await
            .expect("Failed to reload test group")
    }
}
