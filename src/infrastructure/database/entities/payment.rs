//! Payment entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(nullable)]
    pub reservation_id: Option<String>,

    pub user_id: String,
    pub listing_id: String,

    #[sea_orm(unique)]
    pub session_id: String,

    #[sea_orm(nullable)]
    pub transaction_id: Option<String>,

    /// card | cash
    pub method: String,

    /// PENDING, SUCCESS, FAILED, PAID
    pub status: String,

    /// Minor units
    pub amount: i64,
    pub currency: String,

    #[sea_orm(nullable)]
    pub expires_at: Option<DateTimeUtc>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::reservation::Entity",
        from = "Column::ReservationId",
        to = "super::reservation::Column::Id"
    )]
    Reservation,
}

impl Related<super::reservation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reservation.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
