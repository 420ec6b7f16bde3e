use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, EntityTrait};
use verifai_common::types::Settings;

use crate::entities::setting::{self, Entity};
use crate::error::Result;
use crate::store::VerifaiStore;

const SETTINGS_ID: i32 = 1;

fn model_to_settings(m: setting::Model) -> Settings {
    Settings {
        auto_approve_threshold: m.auto_approve_threshold,
        high_risk_threshold: m.high_risk_threshold,
        email_notifications: m.email_notifications,
        in_app_notifications: m.in_app_notifications,
        auto_reject_high_risk: m.auto_reject_high_risk,
    }
}

impl VerifaiStore {
    /// 读取全局设置；行缺失时返回默认值
    pub async fn get_settings(&self) -> Result<Settings> {
        Ok(Entity::find_by_id(SETTINGS_ID)
            .one(self.db())
            .await?
            .map(model_to_settings)
            .unwrap_or_default())
    }

    /// 整体替换全局设置
    pub async fn replace_settings(&self, settings: &Settings) -> Result<Settings> {
        let am = setting::ActiveModel {
            id: Set(SETTINGS_ID),
            auto_approve_threshold: Set(settings.auto_approve_threshold),
            high_risk_threshold: Set(settings.high_risk_threshold),
            email_notifications: Set(settings.email_notifications),
            in_app_notifications: Set(settings.in_app_notifications),
            auto_reject_high_risk: Set(settings.auto_reject_high_risk),
            updated_at: Set(Utc::now().fixed_offset()),
        };
        let model = if Entity::find_by_id(SETTINGS_ID).one(self.db()).await?.is_some() {
            am.update(self.db()).await?
        } else {
            am.insert(self.db()).await?
        };
        Ok(model_to_settings(model))
    }
}
