use super::{Store, StoreResult};
use crate::models::all_models::{
    AdminVerificationCode, CalendarEvent, CalendarEventChanges, GalleryEvent, GalleryEventInput,
    Member, MemberChanges, NewCalendarEvent, NewMember, NewPartnership, NewPhoto, NewTutorial,
    Partnership, PartnershipChanges, Photo, Tutorial, TutorialChanges, TutorialFilter,
    Visibility,
};
use async_trait::async_trait;
use sqlx::PgPool;

const MEMBER_COLUMNS: &str = "matricula, username, email, password_hash, phone_number, role, \
     plan_type, start_date, end_date, is_verified, created_at, updated_at";

const PARTNERSHIP_COLUMNS: &str =
    "id, company_name, company_email, phone_number, discount, description, created_at, updated_at";

const CALENDAR_COLUMNS: &str =
    "id, date, event_name, description, event_photo, created_at, updated_at";

const TUTORIAL_COLUMNS: &str =
    "id, title, url, description, difficulty_level, created_at, updated_at";

const GALLERY_EVENT_COLUMNS: &str = "id, name, description, event_date, created_at, updated_at";

const PHOTO_COLUMNS: &str =
    "id, event_id, photo_url, photo_name, visibility, created_at, updated_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_member(&self, matricula: &str) -> StoreResult<Option<Member>> {
        let query = format!("SELECT {} FROM members WHERE matricula = $1", MEMBER_COLUMNS);
        let member = sqlx::query_as::<_, Member>(&query)
            .bind(matricula)
            .fetch_optional(&self.pool)
            .await?;
        Ok(member)
    }

    async fn find_member_by_email(&self, email: &str) -> StoreResult<Option<Member>> {
        let query = format!("SELECT {} FROM members WHERE email = $1", MEMBER_COLUMNS);
        let member = sqlx::query_as::<_, Member>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(member)
    }

    async fn insert_member(&self, member: NewMember) -> StoreResult<Member> {
        let query = format!(
            "INSERT INTO members (matricula, username, email, password_hash, phone_number, role, \
             plan_type, start_date, end_date) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {}",
            MEMBER_COLUMNS
        );
        let created = sqlx::query_as::<_, Member>(&query)
            .bind(&member.matricula)
            .bind(&member.username)
            .bind(&member.email)
            .bind(&member.password_hash)
            .bind(&member.phone_number)
            .bind(member.role)
            .bind(member.plan_type)
            .bind(member.start_date)
            .bind(member.end_date)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn list_members_except(&self, matricula: &str) -> StoreResult<Vec<Member>> {
        let query = format!(
            "SELECT {} FROM members WHERE matricula <> $1 ORDER BY created_at",
            MEMBER_COLUMNS
        );
        let members = sqlx::query_as::<_, Member>(&query)
            .bind(matricula)
            .fetch_all(&self.pool)
            .await?;
        Ok(members)
    }

    async fn find_conflicting_member(
        &self,
        matricula: &str,
        changes: &MemberChanges,
    ) -> StoreResult<Option<Member>> {
        let query = format!(
            "SELECT {} FROM members \
             WHERE matricula <> $1 AND (username = $2 OR email = $3 OR phone_number = $4) \
             LIMIT 1",
            MEMBER_COLUMNS
        );
        let member = sqlx::query_as::<_, Member>(&query)
            .bind(matricula)
            .bind(changes.username.as_deref())
            .bind(changes.email.as_deref())
            .bind(changes.phone_number.as_deref())
            .fetch_optional(&self.pool)
            .await?;
        Ok(member)
    }

    async fn update_member(
        &self,
        matricula: &str,
        changes: &MemberChanges,
    ) -> StoreResult<Option<Member>> {
        let query = format!(
            "UPDATE members SET \
                username = COALESCE($2, username), \
                email = COALESCE($3, email), \
                phone_number = COALESCE($4, phone_number), \
                updated_at = NOW() \
             WHERE matricula = $1 RETURNING {}",
            MEMBER_COLUMNS
        );
        let member = sqlx::query_as::<_, Member>(&query)
            .bind(matricula)
            .bind(changes.username.as_deref())
            .bind(changes.email.as_deref())
            .bind(changes.phone_number.as_deref())
            .fetch_optional(&self.pool)
            .await?;
        Ok(member)
    }

    async fn update_password(&self, matricula: &str, password_hash: &str) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE members SET password_hash = $2, updated_at = NOW() WHERE matricula = $1",
        )
        .bind(matricula)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_member_verified(&self, matricula: &str) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE members SET is_verified = TRUE, updated_at = NOW() WHERE matricula = $1",
        )
        .bind(matricula)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_member(&self, matricula: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM members WHERE matricula = $1")
            .bind(matricula)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn admin_code(&self) -> StoreResult<Option<AdminVerificationCode>> {
        let code = sqlx::query_as::<_, AdminVerificationCode>(
            "SELECT code, created_at, updated_at FROM admin_verification_code WHERE id",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(code)
    }

    async fn upsert_admin_code(&self, code: &str) -> StoreResult<AdminVerificationCode> {
        let query = r#"
            INSERT INTO admin_verification_code (id, code)
            VALUES (TRUE, $1)
            ON CONFLICT (id) DO UPDATE
            SET code = EXCLUDED.code, updated_at = NOW()
            RETURNING code, created_at, updated_at
        "#;
        let stored = sqlx::query_as::<_, AdminVerificationCode>(query)
            .bind(code)
            .fetch_one(&self.pool)
            .await?;
        Ok(stored)
    }

    async fn list_partnerships(&self) -> StoreResult<Vec<Partnership>> {
        let query = format!("SELECT {} FROM partnerships ORDER BY id", PARTNERSHIP_COLUMNS);
        let partnerships = sqlx::query_as::<_, Partnership>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(partnerships)
    }

    async fn find_partnership(&self, id: i32) -> StoreResult<Option<Partnership>> {
        let query = format!("SELECT {} FROM partnerships WHERE id = $1", PARTNERSHIP_COLUMNS);
        let partnership = sqlx::query_as::<_, Partnership>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(partnership)
    }

    async fn insert_partnership(&self, partnership: NewPartnership) -> StoreResult<Partnership> {
        let query = format!(
            "INSERT INTO partnerships (company_name, company_email, phone_number, discount, description) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            PARTNERSHIP_COLUMNS
        );
        let created = sqlx::query_as::<_, Partnership>(&query)
            .bind(&partnership.company_name)
            .bind(&partnership.company_email)
            .bind(&partnership.phone_number)
            .bind(partnership.discount)
            .bind(&partnership.description)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn update_partnership(
        &self,
        id: i32,
        changes: &PartnershipChanges,
    ) -> StoreResult<Option<Partnership>> {
        let query = format!(
            "UPDATE partnerships SET \
                company_name = COALESCE($2, company_name), \
                company_email = COALESCE($3, company_email), \
                phone_number = COALESCE($4, phone_number), \
                discount = COALESCE($5, discount), \
                description = COALESCE($6, description), \
                updated_at = NOW() \
             WHERE id = $1 RETURNING {}",
            PARTNERSHIP_COLUMNS
        );
        let partnership = sqlx::query_as::<_, Partnership>(&query)
            .bind(id)
            .bind(changes.company_name.as_deref())
            .bind(changes.company_email.as_deref())
            .bind(changes.phone_number.as_deref())
            .bind(changes.discount)
            .bind(changes.description.as_deref())
            .fetch_optional(&self.pool)
            .await?;
        Ok(partnership)
    }

    async fn delete_partnership(&self, id: i32) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM partnerships WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_calendar_events(&self) -> StoreResult<Vec<CalendarEvent>> {
        let query = format!(
            "SELECT {} FROM calendar_events ORDER BY date, id",
            CALENDAR_COLUMNS
        );
        let events = sqlx::query_as::<_, CalendarEvent>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(events)
    }

    async fn find_calendar_event(&self, id: i32) -> StoreResult<Option<CalendarEvent>> {
        let query = format!("SELECT {} FROM calendar_events WHERE id = $1", CALENDAR_COLUMNS);
        let event = sqlx::query_as::<_, CalendarEvent>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(event)
    }

    async fn insert_calendar_event(&self, event: NewCalendarEvent) -> StoreResult<CalendarEvent> {
        let query = format!(
            "INSERT INTO calendar_events (date, event_name, description, event_photo) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            CALENDAR_COLUMNS
        );
        let created = sqlx::query_as::<_, CalendarEvent>(&query)
            .bind(event.date)
            .bind(&event.event_name)
            .bind(&event.description)
            .bind(&event.event_photo)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn update_calendar_event(
        &self,
        id: i32,
        changes: &CalendarEventChanges,
    ) -> StoreResult<Option<CalendarEvent>> {
        let query = format!(
            "UPDATE calendar_events SET \
                date = COALESCE($2, date), \
                event_name = COALESCE($3, event_name), \
                description = COALESCE($4, description), \
                event_photo = COALESCE($5, event_photo), \
                updated_at = NOW() \
             WHERE id = $1 RETURNING {}",
            CALENDAR_COLUMNS
        );
        let event = sqlx::query_as::<_, CalendarEvent>(&query)
            .bind(id)
            .bind(changes.date)
            .bind(changes.event_name.as_deref())
            .bind(changes.description.as_deref())
            .bind(changes.event_photo.as_deref())
            .fetch_optional(&self.pool)
            .await?;
        Ok(event)
    }

    async fn delete_calendar_event(&self, id: i32) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM calendar_events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_tutorial_by_url(&self, url: &str) -> StoreResult<Option<Tutorial>> {
        let query = format!("SELECT {} FROM tutorials WHERE url = $1", TUTORIAL_COLUMNS);
        let tutorial = sqlx::query_as::<_, Tutorial>(&query)
            .bind(url)
            .fetch_optional(&self.pool)
            .await?;
        Ok(tutorial)
    }

    async fn insert_tutorial(&self, tutorial: NewTutorial) -> StoreResult<Tutorial> {
        let query = format!(
            "INSERT INTO tutorials (title, url, description, difficulty_level) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            TUTORIAL_COLUMNS
        );
        let created = sqlx::query_as::<_, Tutorial>(&query)
            .bind(&tutorial.title)
            .bind(&tutorial.url)
            .bind(&tutorial.description)
            .bind(tutorial.difficulty_level)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn list_tutorials(&self, filter: &TutorialFilter) -> StoreResult<(Vec<Tutorial>, i64)> {
        const FILTER: &str = "($1::text IS NULL OR title ILIKE '%' || $1 || '%') \
             AND ($2::difficulty_level IS NULL OR difficulty_level = $2)";

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM tutorials WHERE {}",
            FILTER
        ))
        .bind(filter.title.as_deref())
        .bind(filter.difficulty_level)
        .fetch_one(&self.pool)
        .await?;

        let query = format!(
            "SELECT {} FROM tutorials WHERE {} ORDER BY created_at DESC, id DESC LIMIT $3 OFFSET $4",
            TUTORIAL_COLUMNS, FILTER
        );
        let tutorials = sqlx::query_as::<_, Tutorial>(&query)
            .bind(filter.title.as_deref())
            .bind(filter.difficulty_level)
            .bind(i64::from(filter.page_size))
            .bind(i64::try_from(filter.offset()).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;

        Ok((tutorials, total))
    }

    async fn update_tutorial(
        &self,
        id: i32,
        changes: &TutorialChanges,
    ) -> StoreResult<Option<Tutorial>> {
        let query = format!(
            "UPDATE tutorials SET \
                title = COALESCE($2, title), \
                url = COALESCE($3, url), \
                description = COALESCE($4, description), \
                difficulty_level = COALESCE($5, difficulty_level), \
                updated_at = NOW() \
             WHERE id = $1 RETURNING {}",
            TUTORIAL_COLUMNS
        );
        let tutorial = sqlx::query_as::<_, Tutorial>(&query)
            .bind(id)
            .bind(changes.title.as_deref())
            .bind(changes.url.as_deref())
            .bind(changes.description.as_deref())
            .bind(changes.difficulty_level)
            .fetch_optional(&self.pool)
            .await?;
        Ok(tutorial)
    }

    async fn delete_tutorial(&self, id: i32) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM tutorials WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn save_gallery_event(
        &self,
        event: GalleryEventInput,
    ) -> StoreResult<Option<GalleryEvent>> {
        match event.id {
            None => {
                let query = format!(
                    "INSERT INTO gallery_events (name, description, event_date) \
                     VALUES ($1, $2, $3) RETURNING {}",
                    GALLERY_EVENT_COLUMNS
                );
                let created = sqlx::query_as::<_, GalleryEvent>(&query)
                    .bind(&event.name)
                    .bind(&event.description)
                    .bind(event.event_date)
                    .fetch_one(&self.pool)
                    .await?;
                Ok(Some(created))
            }
            Some(id) => {
                let query = format!(
                    "UPDATE gallery_events SET name = $2, description = $3, event_date = $4, \
                     updated_at = NOW() WHERE id = $1 RETURNING {}",
                    GALLERY_EVENT_COLUMNS
                );
                let updated = sqlx::query_as::<_, GalleryEvent>(&query)
                    .bind(id)
                    .bind(&event.name)
                    .bind(&event.description)
                    .bind(event.event_date)
                    .fetch_optional(&self.pool)
                    .await?;
                Ok(updated)
            }
        }
    }

    async fn find_gallery_event(&self, id: i32) -> StoreResult<Option<GalleryEvent>> {
        let query = format!(
            "SELECT {} FROM gallery_events WHERE id = $1",
            GALLERY_EVENT_COLUMNS
        );
        let event = sqlx::query_as::<_, GalleryEvent>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(event)
    }

    async fn delete_gallery_event(&self, id: i32) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM photos WHERE event_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM gallery_events WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_gallery_event_description(
        &self,
        id: i32,
        description: Option<&str>,
    ) -> StoreResult<Option<GalleryEvent>> {
        let query = format!(
            "UPDATE gallery_events SET description = $2, updated_at = NOW() \
             WHERE id = $1 RETURNING {}",
            GALLERY_EVENT_COLUMNS
        );
        let event = sqlx::query_as::<_, GalleryEvent>(&query)
            .bind(id)
            .bind(description)
            .fetch_optional(&self.pool)
            .await?;
        Ok(event)
    }

    async fn insert_photos(&self, event_id: i32, photos: Vec<NewPhoto>) -> StoreResult<Vec<Photo>> {
        let query = format!(
            "INSERT INTO photos (event_id, photo_url, photo_name, visibility) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            PHOTO_COLUMNS
        );

        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(photos.len());
        for photo in photos {
            let row = sqlx::query_as::<_, Photo>(&query)
                .bind(event_id)
                .bind(&photo.photo_url)
                .bind(&photo.photo_name)
                .bind(photo.visibility)
                .fetch_one(&mut *tx)
                .await?;
            created.push(row);
        }
        tx.commit().await?;

        Ok(created)
    }

    async fn list_photos(&self, event_id: i32, public_only: bool) -> StoreResult<Vec<Photo>> {
        let query = format!(
            "SELECT {} FROM photos WHERE event_id = $1 AND (NOT $2 OR visibility = 'PUBLIC') \
             ORDER BY created_at, id",
            PHOTO_COLUMNS
        );
        let photos = sqlx::query_as::<_, Photo>(&query)
            .bind(event_id)
            .bind(public_only)
            .fetch_all(&self.pool)
            .await?;
        Ok(photos)
    }

    async fn set_photo_visibility(
        &self,
        id: i32,
        visibility: Visibility,
    ) -> StoreResult<Option<Photo>> {
        let query = format!(
            "UPDATE photos SET visibility = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            PHOTO_COLUMNS
        );
        let photo = sqlx::query_as::<_, Photo>(&query)
            .bind(id)
            .bind(visibility)
            .fetch_optional(&self.pool)
            .await?;
        Ok(photo)
    }

    async fn delete_photo(&self, id: i32) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM photos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_event_photos(&self, event_id: i32) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM photos WHERE event_id = $1")
            .bind(event_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
