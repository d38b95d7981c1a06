use chrono::{Months, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum_macros::{Display, EnumString};

//  MEMBER & AUTHENTICATION STRUCTS
#[derive(
    Debug, Serialize, Deserialize, sqlx::Type, Display, EnumString, PartialEq, Eq, Clone, Copy, Hash,
)]
#[sqlx(type_name = "member_role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Role {
    Admin,
    User,
}

#[derive(
    Debug, Serialize, Deserialize, sqlx::Type, Display, EnumString, PartialEq, Eq, Clone, Copy, Default,
)]
#[sqlx(type_name = "plan_type", rename_all = "lowercase")]
pub enum PlanType {
    #[serde(rename = "mensal")]
    #[strum(serialize = "mensal")]
    #[sqlx(rename = "mensal")]
    #[default]
    Monthly,
    #[serde(rename = "trimestral")]
    #[strum(serialize = "trimestral")]
    #[sqlx(rename = "trimestral")]
    Quarterly,
    #[serde(rename = "semestral")]
    #[strum(serialize = "semestral")]
    #[sqlx(rename = "semestral")]
    Semiannual,
    #[serde(rename = "anual")]
    #[strum(serialize = "anual")]
    #[sqlx(rename = "anual")]
    Annual,
}

impl PlanType {
    pub fn months(self) -> u32 {
        match self {
            PlanType::Monthly => 1,
            PlanType::Quarterly => 3,
            PlanType::Semiannual => 6,
            PlanType::Annual => 12,
        }
    }

    /// Last day covered by a plan starting on `start`. Month arithmetic clamps
    /// to the end of shorter months (Jan 31 + 1 month = Feb 28/29).
    pub fn end_date(self, start: NaiveDate) -> Option<NaiveDate> {
        start.checked_add_months(Months::new(self.months()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Member {
    pub matricula: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub phone_number: Option<String>,
    pub role: Role,
    pub plan_type: PlanType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_verified: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone)]
pub struct NewMember {
    pub matricula: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub phone_number: String,
    pub role: Role,
    pub plan_type: PlanType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

// None leaves the column untouched
#[derive(Debug, Clone, Default)]
pub struct MemberChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
}

impl MemberChanges {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none() && self.phone_number.is_none()
    }
}

//  ADMIN VERIFICATION CODE (keyed singleton row)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AdminVerificationCode {
    pub code: String,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

//  PARTNERSHIPS (benefits)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Partnership {
    pub id: i32,
    pub company_name: String,
    pub company_email: String,
    pub phone_number: Option<String>,
    pub discount: f64,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone)]
pub struct NewPartnership {
    pub company_name: String,
    pub company_email: String,
    pub phone_number: Option<String>,
    pub discount: f64,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PartnershipChanges {
    pub company_name: Option<String>,
    pub company_email: Option<String>,
    pub phone_number: Option<String>,
    pub discount: Option<f64>,
    pub description: Option<String>,
}

//  CALENDAR
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct CalendarEvent {
    pub id: i32,
    pub date: NaiveDate,
    pub event_name: String,
    pub description: Option<String>,
    pub event_photo: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone)]
pub struct NewCalendarEvent {
    pub date: NaiveDate,
    pub event_name: String,
    pub description: Option<String>,
    pub event_photo: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CalendarEventChanges {
    pub date: Option<NaiveDate>,
    pub event_name: Option<String>,
    pub description: Option<String>,
    pub event_photo: Option<String>,
}

//  TUTORIALS
#[derive(
    Debug, Serialize, Deserialize, sqlx::Type, Display, EnumString, PartialEq, Eq, Clone, Copy, Default,
)]
#[sqlx(type_name = "difficulty_level", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum DifficultyLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Tutorial {
    pub id: i32,
    pub title: String,
    pub url: String,
    pub description: String,
    pub difficulty_level: DifficultyLevel,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone)]
pub struct NewTutorial {
    pub title: String,
    pub url: String,
    pub description: String,
    pub difficulty_level: DifficultyLevel,
}

#[derive(Debug, Clone, Default)]
pub struct TutorialChanges {
    pub title: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub difficulty_level: Option<DifficultyLevel>,
}

#[derive(Debug, Clone, Default)]
pub struct TutorialFilter {
    pub title: Option<String>,
    pub difficulty_level: Option<DifficultyLevel>,
    pub page: u32,
    pub page_size: u32,
}

impl TutorialFilter {
    // Widened so the largest page number cannot overflow.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }
}

#[derive(Debug, Serialize)]
pub struct TutorialPage {
    pub tutorials: Vec<Tutorial>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

//  GALLERY EVENTS & PHOTOS
#[derive(
    Debug, Serialize, Deserialize, sqlx::Type, Display, EnumString, PartialEq, Eq, Clone, Copy, Default,
)]
#[sqlx(type_name = "photo_visibility", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Visibility {
    Public,
    #[default]
    Private,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct GalleryEvent {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub event_date: NaiveDate,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone)]
pub struct GalleryEventInput {
    pub id: Option<i32>,
    pub name: String,
    pub description: Option<String>,
    pub event_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Photo {
    pub id: i32,
    pub event_id: i32,
    pub photo_url: String,
    pub photo_name: Option<String>,
    pub visibility: Visibility,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone)]
pub struct NewPhoto {
    pub photo_url: String,
    pub photo_name: Option<String>,
    pub visibility: Visibility,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn tutorial_offset_does_not_overflow() {
        let filter = TutorialFilter {
            page: u32::MAX,
            page_size: 100,
            ..Default::default()
        };
        assert_eq!(filter.offset(), u64::from(u32::MAX - 1) * 100);
        let first = TutorialFilter {
            page: 1,
            page_size: 10,
            ..Default::default()
        };
        assert_eq!(first.offset(), 0);
    }

    #[test]
    fn plan_end_dates_follow_plan_length() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(
            PlanType::Monthly.end_date(start),
            NaiveDate::from_ymd_opt(2024, 2, 15)
        );
        assert_eq!(
            PlanType::Semiannual.end_date(start),
            NaiveDate::from_ymd_opt(2024, 7, 15)
        );
        assert_eq!(
            PlanType::Annual.end_date(start),
            NaiveDate::from_ymd_opt(2025, 1, 15)
        );
    }

    #[test]
    fn plan_end_date_clamps_short_months() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(
            PlanType::Monthly.end_date(start),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
    }

    #[test]
    fn role_names_are_uppercase() {
        assert_eq!(Role::from_str("ADMIN").unwrap(), Role::Admin);
        assert_eq!(Role::User.to_string(), "USER");
        assert!(Role::from_str("admin").is_err());
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
    }

    #[test]
    fn plan_type_uses_original_names() {
        assert_eq!(
            serde_json::from_str::<PlanType>("\"trimestral\"").unwrap(),
            PlanType::Quarterly
        );
        assert_eq!(PlanType::Annual.to_string(), "anual");
    }
}
