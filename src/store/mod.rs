//! Persistence seam. Route handlers and workflows only see the `Store` trait;
//! production wires in [`postgres::PgStore`].

pub mod postgres;

#[cfg(test)]
pub mod memory;

use crate::models::all_models::{
    AdminVerificationCode, CalendarEvent, CalendarEventChanges, GalleryEvent, GalleryEventInput,
    Member, MemberChanges, NewCalendarEvent, NewMember, NewPartnership, NewPhoto, NewTutorial,
    Partnership, PartnershipChanges, Photo, Tutorial, TutorialChanges, TutorialFilter,
    Visibility,
};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    // Members
    async fn find_member(&self, matricula: &str) -> StoreResult<Option<Member>>;
    async fn find_member_by_email(&self, email: &str) -> StoreResult<Option<Member>>;
    async fn insert_member(&self, member: NewMember) -> StoreResult<Member>;
    async fn list_members_except(&self, matricula: &str) -> StoreResult<Vec<Member>>;
    /// Another member (not `matricula`) already using one of the given values.
    async fn find_conflicting_member(
        &self,
        matricula: &str,
        changes: &MemberChanges,
    ) -> StoreResult<Option<Member>>;
    async fn update_member(
        &self,
        matricula: &str,
        changes: &MemberChanges,
    ) -> StoreResult<Option<Member>>;
    async fn update_password(&self, matricula: &str, password_hash: &str) -> StoreResult<bool>;
    async fn mark_member_verified(&self, matricula: &str) -> StoreResult<bool>;
    async fn delete_member(&self, matricula: &str) -> StoreResult<bool>;

    // Admin verification code: zero or one row
    async fn admin_code(&self) -> StoreResult<Option<AdminVerificationCode>>;
    async fn upsert_admin_code(&self, code: &str) -> StoreResult<AdminVerificationCode>;

    // Partnerships
    async fn list_partnerships(&self) -> StoreResult<Vec<Partnership>>;
    async fn find_partnership(&self, id: i32) -> StoreResult<Option<Partnership>>;
    async fn insert_partnership(&self, partnership: NewPartnership) -> StoreResult<Partnership>;
    async fn update_partnership(
        &self,
        id: i32,
        changes: &PartnershipChanges,
    ) -> StoreResult<Option<Partnership>>;
    async fn delete_partnership(&self, id: i32) -> StoreResult<bool>;

    // Calendar
    async fn list_calendar_events(&self) -> StoreResult<Vec<CalendarEvent>>;
    async fn find_calendar_event(&self, id: i32) -> StoreResult<Option<CalendarEvent>>;
    async fn insert_calendar_event(&self, event: NewCalendarEvent) -> StoreResult<CalendarEvent>;
    async fn update_calendar_event(
        &self,
        id: i32,
        changes: &CalendarEventChanges,
    ) -> StoreResult<Option<CalendarEvent>>;
    async fn delete_calendar_event(&self, id: i32) -> StoreResult<bool>;

    // Tutorials
    async fn find_tutorial_by_url(&self, url: &str) -> StoreResult<Option<Tutorial>>;
    async fn insert_tutorial(&self, tutorial: NewTutorial) -> StoreResult<Tutorial>;
    async fn list_tutorials(&self, filter: &TutorialFilter) -> StoreResult<(Vec<Tutorial>, i64)>;
    async fn update_tutorial(
        &self,
        id: i32,
        changes: &TutorialChanges,
    ) -> StoreResult<Option<Tutorial>>;
    async fn delete_tutorial(&self, id: i32) -> StoreResult<bool>;

    // Gallery
    /// Creates the event when `id` is `None`, otherwise updates it in place.
    /// Returns `None` when updating an id that does not exist.
    async fn save_gallery_event(
        &self,
        event: GalleryEventInput,
    ) -> StoreResult<Option<GalleryEvent>>;
    async fn find_gallery_event(&self, id: i32) -> StoreResult<Option<GalleryEvent>>;
    /// Removes the event together with its photos.
    async fn delete_gallery_event(&self, id: i32) -> StoreResult<bool>;
    async fn set_gallery_event_description(
        &self,
        id: i32,
        description: Option<&str>,
    ) -> StoreResult<Option<GalleryEvent>>;
    async fn insert_photos(&self, event_id: i32, photos: Vec<NewPhoto>) -> StoreResult<Vec<Photo>>;
    async fn list_photos(&self, event_id: i32, public_only: bool) -> StoreResult<Vec<Photo>>;
    async fn set_photo_visibility(
        &self,
        id: i32,
        visibility: Visibility,
    ) -> StoreResult<Option<Photo>>;
    async fn delete_photo(&self, id: i32) -> StoreResult<bool>;
    async fn delete_event_photos(&self, event_id: i32) -> StoreResult<u64>;
}
