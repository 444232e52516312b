//! Calendar entries: the synchronizer's writes plus manual schedule CRUD.
//!
//! The synchronizer maintains at most one active entry per visit type per
//! order and never hard-deletes; cancelled orders get their entries
//! deactivated. Every read path filters on `is_active`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::entities::schedule::{self, Entity as ScheduleEntity};
use crate::errors::ServiceError;
use crate::lifecycle::ops::{ScheduleOps, ScheduleType, SyncAction};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateScheduleInput {
    pub order_id: Option<Uuid>,
    pub schedule_type: ScheduleType,
    pub title: String,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub duration_minutes: Option<i32>,
}

#[derive(Clone)]
pub struct ScheduleService {
    db: Arc<DatabaseConnection>,
}

impl ScheduleService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Manual calendar entry, independent of any order.
    #[instrument(skip(self, input), fields(%owner))]
    pub async fn create_schedule(
        &self,
        owner: Uuid,
        input: CreateScheduleInput,
    ) -> Result<schedule::Model, ServiceError> {
        if input.title.trim().is_empty() {
            return Err(ServiceError::ValidationError("title must not be blank".into()));
        }
        let created = schedule::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(owner),
            order_id: Set(input.order_id),
            schedule_type: Set(input.schedule_type.to_string()),
            title: Set(input.title),
            date: Set(input.date),
            time: Set(input.time),
            duration_minutes: Set(input.duration_minutes),
            is_active: Set(true),
            is_completed: Set(false),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&*self.db)
        .await?;
        Ok(created)
    }

    /// Active entries in a date window, oldest first.
    pub async fn list_schedules(
        &self,
        owner: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<schedule::Model>, ServiceError> {
        let mut query = ScheduleEntity::find()
            .filter(schedule::Column::UserId.eq(owner))
            .filter(schedule::Column::IsActive.eq(true));
        if let Some(from) = from {
            query = query.filter(schedule::Column::Date.gte(from));
        }
        if let Some(to) = to {
            query = query.filter(schedule::Column::Date.lte(to));
        }
        Ok(query
            .order_by_asc(schedule::Column::Date)
            .all(&*self.db)
            .await?)
    }

    pub async fn list_for_order(
        &self,
        owner: Uuid,
        order_id: Uuid,
    ) -> Result<Vec<schedule::Model>, ServiceError> {
        Ok(ScheduleEntity::find()
            .filter(schedule::Column::UserId.eq(owner))
            .filter(schedule::Column::OrderId.eq(order_id))
            .filter(schedule::Column::IsActive.eq(true))
            .order_by_asc(schedule::Column::Date)
            .all(&*self.db)
            .await?)
    }

    async fn get_schedule(
        &self,
        owner: Uuid,
        schedule_id: Uuid,
    ) -> Result<schedule::Model, ServiceError> {
        ScheduleEntity::find_by_id(schedule_id)
            .filter(schedule::Column::UserId.eq(owner))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("schedule {schedule_id} not found")))
    }

    #[instrument(skip(self), fields(%owner, %schedule_id))]
    pub async fn complete_schedule(
        &self,
        owner: Uuid,
        schedule_id: Uuid,
    ) -> Result<schedule::Model, ServiceError> {
        let existing = self.get_schedule(owner, schedule_id).await?;
        let mut active: schedule::ActiveModel = existing.into();
        active.is_completed = Set(true);
        active.updated_at = Set(Some(Utc::now()));
        Ok(active.update(&*self.db).await?)
    }

    /// Soft delete; the row stays for audit.
    #[instrument(skip(self), fields(%owner, %schedule_id))]
    pub async fn deactivate_schedule(
        &self,
        owner: Uuid,
        schedule_id: Uuid,
    ) -> Result<(), ServiceError> {
        let existing = self.get_schedule(owner, schedule_id).await?;
        let mut active: schedule::ActiveModel = existing.into();
        active.is_active = Set(false);
        active.updated_at = Set(Some(Utc::now()));
        active.update(&*self.db).await?;
        Ok(())
    }
}

#[async_trait]
impl ScheduleOps for ScheduleService {
    async fn ensure_visit(
        &self,
        owner: Uuid,
        order_id: Uuid,
        kind: ScheduleType,
        date: NaiveDate,
    ) -> Result<SyncAction, ServiceError> {
        let existing = ScheduleEntity::find()
            .filter(schedule::Column::UserId.eq(owner))
            .filter(schedule::Column::OrderId.eq(order_id))
            .filter(schedule::Column::ScheduleType.eq(kind.to_string()))
            .filter(schedule::Column::IsActive.eq(true))
            .one(&*self.db)
            .await?;

        match existing {
            None => {
                schedule::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    user_id: Set(owner),
                    order_id: Set(Some(order_id)),
                    schedule_type: Set(kind.to_string()),
                    title: Set(format!("{kind} visit")),
                    date: Set(date),
                    time: Set(None),
                    duration_minutes: Set(None),
                    is_active: Set(true),
                    is_completed: Set(false),
                    created_at: Set(Utc::now()),
                    updated_at: Set(None),
                }
                .insert(&*self.db)
                .await?;
                info!(%order_id, %kind, %date, "visit schedule created");
                Ok(SyncAction::Created)
            }
            Some(entry) if entry.date != date => {
                let mut active: schedule::ActiveModel = entry.into();
                active.date = Set(date);
                active.updated_at = Set(Some(Utc::now()));
                active.update(&*self.db).await?;
                info!(%order_id, %kind, %date, "visit schedule moved");
                Ok(SyncAction::Updated)
            }
            Some(_) => Ok(SyncAction::Unchanged),
        }
    }

    async fn deactivate_for_order(
        &self,
        owner: Uuid,
        order_id: Uuid,
    ) -> Result<u64, ServiceError> {
        let entries = ScheduleEntity::find()
            .filter(schedule::Column::UserId.eq(owner))
            .filter(schedule::Column::OrderId.eq(order_id))
            .filter(schedule::Column::IsActive.eq(true))
            .all(&*self.db)
            .await?;

        let mut deactivated = 0u64;
        for entry in entries {
            let mut active: schedule::ActiveModel = entry.into();
            active.is_active = Set(false);
            active.updated_at = Set(Some(Utc::now()));
            active.update(&*self.db).await?;
            deactivated += 1;
        }
        Ok(deactivated)
    }
}
