use super::{Store, StoreResult};
use crate::models::all_models::{
    AdminVerificationCode, CalendarEvent, CalendarEventChanges, GalleryEvent, GalleryEventInput,
    Member, MemberChanges, NewCalendarEvent, NewMember, NewPartnership, NewPhoto, NewTutorial,
    Partnership, PartnershipChanges, Photo, Tutorial, TutorialChanges, TutorialFilter,
    Visibility,
};
use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Tables {
    members: BTreeMap<String, Member>,
    admin_code: Option<AdminVerificationCode>,
    partnerships: BTreeMap<i32, Partnership>,
    calendar: BTreeMap<i32, CalendarEvent>,
    tutorials: BTreeMap<i32, Tutorial>,
    gallery_events: BTreeMap<i32, GalleryEvent>,
    photos: BTreeMap<i32, Photo>,
    next_id: i32,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-process `Store` used by handler and workflow tests. It also counts
/// lookups so tests can assert on the order of collaborator calls.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    partnership_lookups: Mutex<usize>,
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap()
    }

    pub fn partnership_lookups(&self) -> usize {
        *self.partnership_lookups.lock().unwrap()
    }

    pub fn member(&self, matricula: &str) -> Option<Member> {
        self.tables().members.get(matricula).cloned()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_member(&self, matricula: &str) -> StoreResult<Option<Member>> {
        Ok(self.tables().members.get(matricula).cloned())
    }

    async fn find_member_by_email(&self, email: &str) -> StoreResult<Option<Member>> {
        Ok(self
            .tables()
            .members
            .values()
            .find(|m| m.email == email)
            .cloned())
    }

    async fn insert_member(&self, member: NewMember) -> StoreResult<Member> {
        let created = Member {
            matricula: member.matricula,
            username: member.username,
            email: member.email,
            password_hash: member.password_hash,
            phone_number: Some(member.phone_number),
            role: member.role,
            plan_type: member.plan_type,
            start_date: member.start_date,
            end_date: member.end_date,
            is_verified: false,
            created_at: now(),
            updated_at: None,
        };
        self.tables()
            .members
            .insert(created.matricula.clone(), created.clone());
        Ok(created)
    }

    async fn list_members_except(&self, matricula: &str) -> StoreResult<Vec<Member>> {
        Ok(self
            .tables()
            .members
            .values()
            .filter(|m| m.matricula != matricula)
            .cloned()
            .collect())
    }

    async fn find_conflicting_member(
        &self,
        matricula: &str,
        changes: &MemberChanges,
    ) -> StoreResult<Option<Member>> {
        Ok(self
            .tables()
            .members
            .values()
            .filter(|m| m.matricula != matricula)
            .find(|m| {
                changes.username.as_deref() == Some(m.username.as_str())
                    || changes.email.as_deref() == Some(m.email.as_str())
                    || (changes.phone_number.is_some()
                        && changes.phone_number == m.phone_number)
            })
            .cloned())
    }

    async fn update_member(
        &self,
        matricula: &str,
        changes: &MemberChanges,
    ) -> StoreResult<Option<Member>> {
        let mut tables = self.tables();
        let Some(member) = tables.members.get_mut(matricula) else {
            return Ok(None);
        };
        if let Some(username) = &changes.username {
            member.username = username.clone();
        }
        if let Some(email) = &changes.email {
            member.email = email.clone();
        }
        if let Some(phone) = &changes.phone_number {
            member.phone_number = Some(phone.clone());
        }
        member.updated_at = Some(now());
        Ok(Some(member.clone()))
    }

    async fn update_password(&self, matricula: &str, password_hash: &str) -> StoreResult<bool> {
        let mut tables = self.tables();
        Ok(match tables.members.get_mut(matricula) {
            Some(member) => {
                member.password_hash = password_hash.to_string();
                member.updated_at = Some(now());
                true
            }
            None => false,
        })
    }

    async fn mark_member_verified(&self, matricula: &str) -> StoreResult<bool> {
        let mut tables = self.tables();
        Ok(match tables.members.get_mut(matricula) {
            Some(member) => {
                member.is_verified = true;
                true
            }
            None => false,
        })
    }

    async fn delete_member(&self, matricula: &str) -> StoreResult<bool> {
        Ok(self.tables().members.remove(matricula).is_some())
    }

    async fn admin_code(&self) -> StoreResult<Option<AdminVerificationCode>> {
        Ok(self.tables().admin_code.clone())
    }

    async fn upsert_admin_code(&self, code: &str) -> StoreResult<AdminVerificationCode> {
        let mut tables = self.tables();
        let stored = match tables.admin_code.take() {
            Some(existing) => AdminVerificationCode {
                code: code.to_string(),
                created_at: existing.created_at,
                updated_at: Some(now()),
            },
            None => AdminVerificationCode {
                code: code.to_string(),
                created_at: now(),
                updated_at: None,
            },
        };
        tables.admin_code = Some(stored.clone());
        Ok(stored)
    }

    async fn list_partnerships(&self) -> StoreResult<Vec<Partnership>> {
        Ok(self.tables().partnerships.values().cloned().collect())
    }

    async fn find_partnership(&self, id: i32) -> StoreResult<Option<Partnership>> {
        *self.partnership_lookups.lock().unwrap() += 1;
        Ok(self.tables().partnerships.get(&id).cloned())
    }

    async fn insert_partnership(&self, partnership: NewPartnership) -> StoreResult<Partnership> {
        let mut tables = self.tables();
        let created = Partnership {
            id: tables.next_id(),
            company_name: partnership.company_name,
            company_email: partnership.company_email,
            phone_number: partnership.phone_number,
            discount: partnership.discount,
            description: partnership.description,
            created_at: now(),
            updated_at: None,
        };
        tables.partnerships.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_partnership(
        &self,
        id: i32,
        changes: &PartnershipChanges,
    ) -> StoreResult<Option<Partnership>> {
        let mut tables = self.tables();
        let Some(partnership) = tables.partnerships.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = &changes.company_name {
            partnership.company_name = name.clone();
        }
        if let Some(email) = &changes.company_email {
            partnership.company_email = email.clone();
        }
        if let Some(phone) = &changes.phone_number {
            partnership.phone_number = Some(phone.clone());
        }
        if let Some(discount) = changes.discount {
            partnership.discount = discount;
        }
        if let Some(description) = &changes.description {
            partnership.description = Some(description.clone());
        }
        partnership.updated_at = Some(now());
        Ok(Some(partnership.clone()))
    }

    async fn delete_partnership(&self, id: i32) -> StoreResult<bool> {
        Ok(self.tables().partnerships.remove(&id).is_some())
    }

    async fn list_calendar_events(&self) -> StoreResult<Vec<CalendarEvent>> {
        let mut events: Vec<_> = self.tables().calendar.values().cloned().collect();
        events.sort_by_key(|e| (e.date, e.id));
        Ok(events)
    }

    async fn find_calendar_event(&self, id: i32) -> StoreResult<Option<CalendarEvent>> {
        Ok(self.tables().calendar.get(&id).cloned())
    }

    async fn insert_calendar_event(&self, event: NewCalendarEvent) -> StoreResult<CalendarEvent> {
        let mut tables = self.tables();
        let created = CalendarEvent {
            id: tables.next_id(),
            date: event.date,
            event_name: event.event_name,
            description: event.description,
            event_photo: event.event_photo,
            created_at: now(),
            updated_at: None,
        };
        tables.calendar.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_calendar_event(
        &self,
        id: i32,
        changes: &CalendarEventChanges,
    ) -> StoreResult<Option<CalendarEvent>> {
        let mut tables = self.tables();
        let Some(event) = tables.calendar.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(date) = changes.date {
            event.date = date;
        }
        if let Some(name) = &changes.event_name {
            event.event_name = name.clone();
        }
        if let Some(description) = &changes.description {
            event.description = Some(description.clone());
        }
        if let Some(photo) = &changes.event_photo {
            event.event_photo = Some(photo.clone());
        }
        event.updated_at = Some(now());
        Ok(Some(event.clone()))
    }

    async fn delete_calendar_event(&self, id: i32) -> StoreResult<bool> {
        Ok(self.tables().calendar.remove(&id).is_some())
    }

    async fn find_tutorial_by_url(&self, url: &str) -> StoreResult<Option<Tutorial>> {
        Ok(self
            .tables()
            .tutorials
            .values()
            .find(|t| t.url == url)
            .cloned())
    }

    async fn insert_tutorial(&self, tutorial: NewTutorial) -> StoreResult<Tutorial> {
        let mut tables = self.tables();
        let created = Tutorial {
            id: tables.next_id(),
            title: tutorial.title,
            url: tutorial.url,
            description: tutorial.description,
            difficulty_level: tutorial.difficulty_level,
            created_at: now(),
            updated_at: None,
        };
        tables.tutorials.insert(created.id, created.clone());
        Ok(created)
    }

    async fn list_tutorials(&self, filter: &TutorialFilter) -> StoreResult<(Vec<Tutorial>, i64)> {
        let needle = filter.title.as_deref().map(str::to_lowercase);
        // newest first, ids increase with insertion
        let matching: Vec<Tutorial> = self
            .tables()
            .tutorials
            .values()
            .rev()
            .filter(|t| {
                needle
                    .as_deref()
                    .map_or(true, |n| t.title.to_lowercase().contains(n))
            })
            .filter(|t| {
                filter
                    .difficulty_level
                    .map_or(true, |d| t.difficulty_level == d)
            })
            .cloned()
            .collect();

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(usize::try_from(filter.offset()).unwrap_or(usize::MAX))
            .take(filter.page_size as usize)
            .collect();
        Ok((page, total))
    }

    async fn update_tutorial(
        &self,
        id: i32,
        changes: &TutorialChanges,
    ) -> StoreResult<Option<Tutorial>> {
        let mut tables = self.tables();
        let Some(tutorial) = tables.tutorials.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = &changes.title {
            tutorial.title = title.clone();
        }
        if let Some(url) = &changes.url {
            tutorial.url = url.clone();
        }
        if let Some(description) = &changes.description {
            tutorial.description = description.clone();
        }
        if let Some(level) = changes.difficulty_level {
            tutorial.difficulty_level = level;
        }
        tutorial.updated_at = Some(now());
        Ok(Some(tutorial.clone()))
    }

    async fn delete_tutorial(&self, id: i32) -> StoreResult<bool> {
        Ok(self.tables().tutorials.remove(&id).is_some())
    }

    async fn save_gallery_event(
        &self,
        event: GalleryEventInput,
    ) -> StoreResult<Option<GalleryEvent>> {
        let mut tables = self.tables();
        match event.id {
            None => {
                let created = GalleryEvent {
                    id: tables.next_id(),
                    name: event.name,
                    description: event.description,
                    event_date: event.event_date,
                    created_at: now(),
                    updated_at: None,
                };
                tables.gallery_events.insert(created.id, created.clone());
                Ok(Some(created))
            }
            Some(id) => Ok(tables.gallery_events.get_mut(&id).map(|existing| {
                existing.name = event.name;
                existing.description = event.description;
                existing.event_date = event.event_date;
                existing.updated_at = Some(now());
                existing.clone()
            })),
        }
    }

    async fn find_gallery_event(&self, id: i32) -> StoreResult<Option<GalleryEvent>> {
        Ok(self.tables().gallery_events.get(&id).cloned())
    }

    async fn delete_gallery_event(&self, id: i32) -> StoreResult<bool> {
        let mut tables = self.tables();
        tables.photos.retain(|_, p| p.event_id != id);
        Ok(tables.gallery_events.remove(&id).is_some())
    }

    async fn set_gallery_event_description(
        &self,
        id: i32,
        description: Option<&str>,
    ) -> StoreResult<Option<GalleryEvent>> {
        let mut tables = self.tables();
        Ok(tables.gallery_events.get_mut(&id).map(|event| {
            event.description = description.map(str::to_string);
            event.updated_at = Some(now());
            event.clone()
        }))
    }

    async fn insert_photos(&self, event_id: i32, photos: Vec<NewPhoto>) -> StoreResult<Vec<Photo>> {
        let mut tables = self.tables();
        let mut created = Vec::with_capacity(photos.len());
        for photo in photos {
            let row = Photo {
                id: tables.next_id(),
                event_id,
                photo_url: photo.photo_url,
                photo_name: photo.photo_name,
                visibility: photo.visibility,
                created_at: now(),
                updated_at: None,
            };
            tables.photos.insert(row.id, row.clone());
            created.push(row);
        }
        Ok(created)
    }

    async fn list_photos(&self, event_id: i32, public_only: bool) -> StoreResult<Vec<Photo>> {
        Ok(self
            .tables()
            .photos
            .values()
            .filter(|p| p.event_id == event_id)
            .filter(|p| !public_only || p.visibility == Visibility::Public)
            .cloned()
            .collect())
    }

    async fn set_photo_visibility(
        &self,
        id: i32,
        visibility: Visibility,
    ) -> StoreResult<Option<Photo>> {
        let mut tables = self.tables();
        Ok(tables.photos.get_mut(&id).map(|photo| {
            photo.visibility = visibility;
            photo.updated_at = Some(now());
            photo.clone()
        }))
    }

    async fn delete_photo(&self, id: i32) -> StoreResult<bool> {
        Ok(self.tables().photos.remove(&id).is_some())
    }

    async fn delete_event_photos(&self, event_id: i32) -> StoreResult<u64> {
        let mut tables = self.tables();
        let before = tables.photos.len();
        tables.photos.retain(|_, p| p.event_id != event_id);
        Ok((before - tables.photos.len()) as u64)
    }
}
