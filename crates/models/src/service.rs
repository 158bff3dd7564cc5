use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle states of a delivery service record.
///
/// `Registered` is initial; `Finished` and `Cancelled` are terminal apart
/// from the explicit `EnRoute -> Registered` send-back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    #[sea_orm(string_value = "registered")]
    Registered,
    #[sea_orm(string_value = "en_route")]
    EnRoute,
    #[sea_orm(string_value = "finished")]
    Finished,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    #[sea_orm(string_value = "sale")]
    Sale,
    #[sea_orm(string_value = "conditional")]
    Conditional,
    #[sea_orm(string_value = "conditional_return")]
    ConditionalReturn,
    #[sea_orm(string_value = "exchange")]
    Exchange,
    #[sea_orm(string_value = "receipt")]
    Receipt,
    #[sea_orm(string_value = "transfer")]
    Transfer,
    #[sea_orm(string_value = "marketplace")]
    Marketplace,
    #[sea_orm(string_value = "carrier")]
    Carrier,
    #[sea_orm(string_value = "other")]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    #[sea_orm(string_value = "motorcycle")]
    Motorcycle,
    #[sea_orm(string_value = "ride_hail")]
    RideHail,
    #[sea_orm(string_value = "other")]
    Other,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "service")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub neighborhood: String,
    pub kind: ServiceKind,
    pub document: String,
    pub provider: Provider,
    pub fee_applied: bool,
    pub card_machine: bool,
    pub value: f64,
    pub note: String,
    pub created_at: DateTimeWithTimeZone,
    pub status: ServiceStatus,
    pub en_route_at: Option<DateTimeWithTimeZone>,
    pub finished_at: Option<DateTimeWithTimeZone>,
    pub cancelled_at: Option<DateTimeWithTimeZone>,
    /// Dense route slot, present only while status is `EnRoute`.
    pub route_order: Option<i32>,
    pub postal_code: Option<String>,
    pub street: Option<String>,
    pub house_number: Option<i32>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub complement: Option<String>,
    pub user_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    User,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::User => Entity::belongs_to(super::user::Entity)
                .from(Column::UserId)
                .to(super::user::Column::Id)
                .into(),
        }
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Single-line address for navigation, or `None` when the record lacks
    /// the fields a routable stop needs (street, house number, city, state).
    pub fn full_address(&self) -> Option<String> {
        let street = self.street.as_deref().filter(|s| !s.trim().is_empty())?;
        let number = self.house_number?;
        let city = self.city.as_deref().filter(|s| !s.trim().is_empty())?;
        let state = self.state.as_deref().filter(|s| !s.trim().is_empty())?;
        let mut address = format!("{}, {}", street, number);
        if let Some(district) = self.district.as_deref().filter(|s| !s.trim().is_empty()) {
            address.push_str(", ");
            address.push_str(district);
        }
        address.push_str(&format!(", {} - {}", city, state));
        Some(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn blank(street: Option<&str>, number: Option<i32>, city: Option<&str>, state: Option<&str>) -> Model {
        Model {
            id: Uuid::new_v4(),
            neighborhood: "Centro".into(),
            kind: ServiceKind::Sale,
            document: "NF-1".into(),
            provider: Provider::Motorcycle,
            fee_applied: true,
            card_machine: false,
            value: 10.5,
            note: String::new(),
            created_at: Utc::now().into(),
            status: ServiceStatus::Registered,
            en_route_at: None,
            finished_at: None,
            cancelled_at: None,
            route_order: None,
            postal_code: None,
            street: street.map(Into::into),
            house_number: number,
            district: None,
            city: city.map(Into::into),
            state: state.map(Into::into),
            complement: None,
            user_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn full_address_requires_all_mandatory_fields() {
        let complete = blank(Some("Rua das Flores"), Some(123), Some("Campinas"), Some("SP"));
        assert_eq!(complete.full_address().unwrap(), "Rua das Flores, 123, Campinas - SP");

        assert!(blank(None, Some(1), Some("Campinas"), Some("SP")).full_address().is_none());
        assert!(blank(Some("Rua A"), None, Some("Campinas"), Some("SP")).full_address().is_none());
        assert!(blank(Some("Rua A"), Some(1), Some("  "), Some("SP")).full_address().is_none());
        assert!(blank(Some("Rua A"), Some(1), Some("Campinas"), None).full_address().is_none());
    }

    #[test]
    fn full_address_includes_district_when_present() {
        let mut m = blank(Some("Av. Brasil"), Some(42), Some("Campinas"), Some("SP"));
        m.district = Some("Cambuí".into());
        assert_eq!(m.full_address().unwrap(), "Av. Brasil, 42, Cambuí, Campinas - SP");
    }
}
