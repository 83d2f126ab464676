use std::future::Future;

use chrono::{DateTime, FixedOffset};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, Select, Set,
};
use uuid::Uuid;

use crate::entities::{
    registration_profile::{ActiveModel, Column, Entity, Model},
    user,
};

pub struct RegistrationProfileAdapter<'a, C: ConnectionTrait = DatabaseConnection> {
    pub db: &'a C,
    pub query: Select<Entity>,
}

impl<'a, C: ConnectionTrait> RegistrationProfileAdapter<'a, C> {
    pub fn init(db: &'a C) -> Self {
        Self {
            db,
            query: Entity::find(),
        }
    }
}

impl<C: ConnectionTrait> Clone for RegistrationProfileAdapter<'_, C> {
    fn clone(&self) -> Self {
        Self {
            db: self.db,
            query: self.query.clone(),
        }
    }
}

pub trait RegistrationProfileFilter {
    fn filter_eq_user(self, user: &user::Model) -> Self;
}

impl<C: ConnectionTrait> RegistrationProfileFilter for RegistrationProfileAdapter<'_, C> {
    fn filter_eq_user(mut self, user: &user::Model) -> Self {
        self.query = self.query.filter(Column::UserId.eq(user.id));
        self
    }
}

pub trait RegistrationProfileQuery {
    fn get_by_key(self, activation_key: &str)
        -> impl Future<Output = Result<Option<Model>, DbErr>>;
    fn get_one(self) -> impl Future<Output = Result<Option<Model>, DbErr>>;
}

impl<C: ConnectionTrait> RegistrationProfileQuery for RegistrationProfileAdapter<'_, C> {
    async fn get_by_key(self, activation_key: &str) -> Result<Option<Model>, DbErr> {
        self.query
            .filter(Column::ActivationKey.eq(activation_key))
            .one(self.db)
            .await
    }

    async fn get_one(self) -> Result<Option<Model>, DbErr> {
        self.query.one(self.db).await
    }
}

#[derive(Debug, Clone)]
pub struct CreateRegistrationProfileParams {
    pub user_id: Uuid,
    pub activation_key: String,
    pub activation_started_at: DateTime<FixedOffset>,
}

pub trait RegistrationProfileMutation {
    fn create(
        self,
        params: CreateRegistrationProfileParams,
    ) -> impl Future<Output = Result<Model, DbErr>>;
    /// Returns the number of deleted rows; 0 means the profile was already gone.
    fn delete(self, profile: &Model) -> impl Future<Output = Result<u64, DbErr>>;
}

impl<C: ConnectionTrait> RegistrationProfileMutation for RegistrationProfileAdapter<'_, C> {
    async fn create(self, params: CreateRegistrationProfileParams) -> Result<Model, DbErr> {
        ActiveModel {
            id: Set(Uuid::now_v7()),
            user_id: Set(params.user_id),
            activation_key: Set(params.activation_key),
            activation_started_at: Set(params.activation_started_at),
        }
        .insert(self.db)
        .await
    }

    async fn delete(self, profile: &Model) -> Result<u64, DbErr> {
        Entity::delete_many()
            .filter(Column::Id.eq(profile.id))
            .exec(self.db)
            .await
            .map(|res| res.rows_affected)
    }
}
