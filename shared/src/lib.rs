use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password: String, // Hashed
    pub full_name: String,
    pub email: String,
    pub role: String, // admin, photographer, assistant, client
    pub profile_image_url: Option<String>,
    pub initials: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub client_type: Option<String>, // individual, couple, family, business
    pub lead_source: Option<String>, // referral, instagram, google, website
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shoot {
    pub id: i64,
    pub title: String,
    pub client_id: i64,
    pub shoot_type: Option<String>, // Wedding, Portrait, Family, Commercial, Event
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub location: String,
    pub status: String, // pending, confirmed, completed, delivered
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub id: i64,
    pub client_id: i64,
    pub title: String,
    pub message: Option<String>,
    pub packages: serde_json::Value,
    pub status: String, // draft, sent, accepted, declined
    pub total_amount: Option<Decimal>,
    pub expiry_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: i64,
    pub invoice_number: String,
    pub client_id: i64,
    pub shoot_id: Option<i64>,
    pub items: serde_json::Value,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub status: String, // draft, sent, pending, paid, overdue
    pub due_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub id: i64,
    pub client_id: i64,
    pub shoot_id: Option<i64>,
    pub title: String,
    pub status: String, // draft, sent, signed, expired
    pub contract_date: NaiveDate,
    pub sent_at: Option<DateTime<Utc>>,
    pub signed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gallery {
    pub id: i64,
    pub title: String,
    pub client_id: i64,
    pub shoot_id: Option<i64>,
    pub cover_image: Option<String>,
    pub photos: serde_json::Value,
    pub status: String, // draft, delivered, archived
    pub password: Option<String>,
    pub delivery_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailTemplate {
    pub id: i64,
    pub name: String,
    pub subject: String,
    pub body: String,
    pub category: String, // onboarding, booking, billing, delivery
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub due_date: Option<NaiveDate>,
    pub completed: bool,
    pub priority: String, // low, medium, high
    pub related_client_id: Option<i64>,
    pub related_shoot_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: i64,
    #[serde(rename = "type")]
    pub activity_type: String,
    pub description: String,
    pub user_id: i64,
    pub related_client_id: Option<i64>,
    pub related_shoot_id: Option<i64>,
    pub related_invoice_id: Option<i64>,
    pub related_proposal_id: Option<i64>,
    pub related_gallery_id: Option<i64>,
    pub timestamp: DateTime<Utc>,
}
