use std::future::Future;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, JoinType::InnerJoin, QueryFilter, QuerySelect, RelationTrait, Select, Set,
};
use uuid::Uuid;

use crate::entities::{
    unit,
    user::{ActiveModel, Column, Entity, Model, Relation},
};

pub struct UserAdapter<'a, C: ConnectionTrait = DatabaseConnection> {
    pub db: &'a C,
    pub query: Select<Entity>,
}

impl<'a, C: ConnectionTrait> UserAdapter<'a, C> {
    pub fn init(db: &'a C) -> Self {
        Self {
            db,
            query: Entity::find(),
        }
    }
}

impl<C: ConnectionTrait> Clone for UserAdapter<'_, C> {
    fn clone(&self) -> Self {
        Self {
            db: self.db,
            query: self.query.clone(),
        }
    }
}

pub trait UserFilter {
    fn filter_eq_id(self, id: Uuid) -> Self;
    fn filter_eq_is_active(self, is_active: bool) -> Self;
    fn filter_eq_email(self, email: &str) -> Self;
    fn filter_eq_unit(self, unit_id: Uuid) -> Self;
}

impl<C: ConnectionTrait> UserFilter for UserAdapter<'_, C> {
    fn filter_eq_id(mut self, id: Uuid) -> Self {
        self.query = self.query.filter(Column::Id.eq(id));
        self
    }

    fn filter_eq_is_active(mut self, is_active: bool) -> Self {
        self.query = self.query.filter(Column::IsActive.eq(is_active));
        self
    }

    fn filter_eq_email(mut self, email: &str) -> Self {
        self.query = self.query.filter(Column::Email.eq(email));
        self
    }

    fn filter_eq_unit(mut self, unit_id: Uuid) -> Self {
        self.query = self
            .query
            .join(InnerJoin, Relation::Unit.def())
            .filter(unit::Column::Id.eq(unit_id));
        self
    }
}

pub trait UserQuery {
    fn get_by_id(self, id: Uuid) -> impl Future<Output = Result<Option<Model>, DbErr>>;
    fn get_by_username(self, username: &str)
        -> impl Future<Output = Result<Option<Model>, DbErr>>;
    fn get_all(self) -> impl Future<Output = Result<Vec<Model>, DbErr>>;
}

impl<C: ConnectionTrait> UserQuery for UserAdapter<'_, C> {
    async fn get_by_id(self, id: Uuid) -> Result<Option<Model>, DbErr> {
        self.query.filter(Column::Id.eq(id)).one(self.db).await
    }

    async fn get_by_username(self, username: &str) -> Result<Option<Model>, DbErr> {
        self.query
            .filter(Column::Username.eq(username))
            .one(self.db)
            .await
    }

    async fn get_all(self) -> Result<Vec<Model>, DbErr> {
        self.query.all(self.db).await
    }
}

#[derive(Debug, Clone)]
pub struct CreateUserParams {
    pub username: String,
    pub email: String,
    pub password: String,
    pub is_active: bool,
}

pub trait UserMutation {
    fn create(self, params: CreateUserParams) -> impl Future<Output = Result<Model, DbErr>>;
    fn activate(self, user: Model) -> impl Future<Output = Result<Model, DbErr>>;
    fn update_password(
        self,
        user: Model,
        password: String,
    ) -> impl Future<Output = Result<Model, DbErr>>;
}

impl<C: ConnectionTrait> UserMutation for UserAdapter<'_, C> {
    async fn create(self, params: CreateUserParams) -> Result<Model, DbErr> {
        let now = Utc::now();
        ActiveModel {
            id: Set(Uuid::now_v7()),
            username: Set(params.username),
            email: Set(params.email),
            password: Set(params.password),
            is_active: Set(params.is_active),
            date_joined: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(self.db)
        .await
    }

    async fn activate(self, user: Model) -> Result<Model, DbErr> {
        let mut user = user.into_active_model();
        user.is_active = Set(true);
        user.updated_at = Set(Utc::now().into());
        user.update(self.db).await
    }

    async fn update_password(self, user: Model, password: String) -> Result<Model, DbErr> {
        let mut user = user.into_active_model();
        user.password = Set(password);
        user.updated_at = Set(Utc::now().into());
        user.update(self.db).await
    }
}
