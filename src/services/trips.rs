use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::db::DbPool;
use crate::error::AppError;
use crate::models::gear::{Item, ItemView};
use crate::models::location::{LocationKind, NewLocation, TripLocation};
use crate::models::member::{MemberView, TripGuest, TripMember};
use crate::models::trip::{Trip, TripDraft};

/// All trip-scoped persistence. Row mapping funnels through the typed
/// models, so a corrupted location type or date label surfaces as an error
/// here instead of leaking strings into the domain.
#[derive(Clone)]
pub struct TripStore {
    db: DbPool,
}

impl TripStore {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    // ---- trips ----

    /// Insert a trip and record its creator as the organizer member.
    pub async fn create_trip(&self, owner_id: i64, draft: &TripDraft) -> Result<Trip, AppError> {
        let created_at = Utc::now();
        let mut tx = self.db.begin().await?;
        let trip_id = sqlx::query(
            r#"INSERT INTO trips (title, start_date, number_nights, created_at)
               VALUES (?1, ?2, ?3, ?4)"#,
        )
        .bind(&draft.title)
        .bind(draft.start_date)
        .bind(draft.number_nights)
        .bind(created_at)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();
        sqlx::query(
            r#"INSERT INTO trip_members (trip_id, user_id, organizer, accept_reqd)
               VALUES (?1, ?2, 1, 0)"#,
        )
        .bind(trip_id)
        .bind(owner_id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(Trip {
            id: trip_id,
            title: draft.title.clone(),
            start_date: draft.start_date,
            number_nights: draft.number_nights,
            created_at,
        })
    }

    /// Fetch a trip, answering NotFound unless `user_id` is a member.
    /// Non-members cannot tell a hidden trip from a missing one.
    pub async fn trip_for_member(&self, trip_id: i64, user_id: i64) -> Result<Trip, AppError> {
        let row = sqlx::query(
            r#"SELECT t.id, t.title, t.start_date, t.number_nights, t.created_at
               FROM trips t
               JOIN trip_members m ON m.trip_id = t.id
               WHERE t.id = ?1 AND m.user_id = ?2"#,
        )
        .bind(trip_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;
        row.as_ref().map(map_trip).ok_or(AppError::NotFound)?
    }

    /// Trips the user belongs to, earliest start first.
    pub async fn list_trips(&self, user_id: i64) -> Result<Vec<Trip>, AppError> {
        let rows = sqlx::query(
            r#"SELECT t.id, t.title, t.start_date, t.number_nights, t.created_at
               FROM trips t
               JOIN trip_members m ON m.trip_id = t.id
               WHERE m.user_id = ?1
               ORDER BY t.start_date, t.id"#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        rows.iter().map(map_trip).collect()
    }

    pub async fn update_trip(&self, trip_id: i64, draft: &TripDraft) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"UPDATE trips SET title = ?1, start_date = ?2, number_nights = ?3 WHERE id = ?4"#,
        )
        .bind(&draft.title)
        .bind(draft.start_date)
        .bind(draft.number_nights)
        .bind(trip_id)
        .execute(&self.db)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    /// Locations, members, guests and gear go with the trip (FK cascade).
    pub async fn delete_trip(&self, trip_id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM trips WHERE id = ?1")
            .bind(trip_id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    pub async fn is_organizer(&self, trip_id: i64, user_id: i64) -> Result<bool, AppError> {
        let organizer: Option<bool> = sqlx::query_scalar(
            "SELECT organizer FROM trip_members WHERE trip_id = ?1 AND user_id = ?2",
        )
        .bind(trip_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(organizer.unwrap_or(false))
    }

    // ---- locations ----

    /// All locations of a trip in insertion order. The first-of-kind
    /// semantics of trailhead/endpoint lookup depend on this order.
    pub async fn locations(&self, trip_id: i64) -> Result<Vec<TripLocation>, AppError> {
        let rows = sqlx::query(
            r#"SELECT id, trip_id, location_type, title, date, latitude, longitude
               FROM trip_locations WHERE trip_id = ?1 ORDER BY id"#,
        )
        .bind(trip_id)
        .fetch_all(&self.db)
        .await?;
        rows.iter().map(map_location).collect()
    }

    pub async fn location(&self, trip_id: i64, location_id: i64) -> Result<TripLocation, AppError> {
        let row = sqlx::query(
            r#"SELECT id, trip_id, location_type, title, date, latitude, longitude
               FROM trip_locations WHERE trip_id = ?1 AND id = ?2"#,
        )
        .bind(trip_id)
        .bind(location_id)
        .fetch_optional(&self.db)
        .await?;
        row.as_ref().map(map_location).ok_or(AppError::NotFound)?
    }

    pub async fn insert_location(&self, location: &NewLocation) -> Result<i64, AppError> {
        let id = sqlx::query(
            r#"INSERT INTO trip_locations (trip_id, location_type, title, date, latitude, longitude)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
        )
        .bind(location.trip_id)
        .bind(location.kind.code())
        .bind(&location.title)
        .bind(location.date.to_string())
        .bind(location.latitude)
        .bind(location.longitude)
        .execute(&self.db)
        .await?
        .last_insert_rowid();
        Ok(id)
    }

    pub async fn update_location(&self, location: &TripLocation) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"UPDATE trip_locations
               SET title = ?1, date = ?2, latitude = ?3, longitude = ?4
               WHERE id = ?5 AND trip_id = ?6"#,
        )
        .bind(&location.title)
        .bind(location.date.to_string())
        .bind(location.latitude)
        .bind(location.longitude)
        .bind(location.id)
        .bind(location.trip_id)
        .execute(&self.db)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    pub async fn delete_location(&self, trip_id: i64, location_id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM trip_locations WHERE id = ?1 AND trip_id = ?2")
            .bind(location_id)
            .bind(trip_id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    // ---- members & guests ----

    pub async fn members(&self, trip_id: i64) -> Result<Vec<MemberView>, AppError> {
        let rows = sqlx::query(
            r#"SELECT m.id, m.trip_id, m.user_id, m.organizer, m.accept_reqd,
                      u.username, u.email
               FROM trip_members m JOIN users u ON u.id = m.user_id
               WHERE m.trip_id = ?1 ORDER BY m.id"#,
        )
        .bind(trip_id)
        .fetch_all(&self.db)
        .await?;
        rows.iter()
            .map(|row| {
                Ok(MemberView {
                    member: TripMember {
                        id: row.try_get("id")?,
                        trip_id: row.try_get("trip_id")?,
                        user_id: row.try_get("user_id")?,
                        organizer: row.try_get("organizer")?,
                        accept_reqd: row.try_get("accept_reqd")?,
                    },
                    username: row.try_get("username")?,
                    email: row.try_get("email")?,
                })
            })
            .collect()
    }

    pub async fn user_by_email(&self, email: &str) -> Result<Option<(i64, String)>, AppError> {
        let row = sqlx::query("SELECT id, username FROM users WHERE email = ?1")
            .bind(email.trim().to_lowercase())
            .fetch_optional(&self.db)
            .await?;
        row.map(|row| Ok((row.try_get("id")?, row.try_get("username")?)))
            .transpose()
    }

    /// Invite a registered user. The membership starts un-accepted.
    pub async fn add_member(&self, trip_id: i64, user_id: i64) -> Result<(), AppError> {
        let already: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM trip_members WHERE trip_id = ?1 AND user_id = ?2",
        )
        .bind(trip_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;
        if already.is_some() {
            return Err(AppError::BadRequest(
                "That user is already on this trip".into(),
            ));
        }
        sqlx::query(
            r#"INSERT INTO trip_members (trip_id, user_id, organizer, accept_reqd)
               VALUES (?1, ?2, 0, 1)"#,
        )
        .bind(trip_id)
        .bind(user_id)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    pub async fn set_member_organizer(
        &self,
        trip_id: i64,
        member_id: i64,
        organizer: bool,
    ) -> Result<(), AppError> {
        let result =
            sqlx::query("UPDATE trip_members SET organizer = ?1 WHERE id = ?2 AND trip_id = ?3")
                .bind(organizer)
                .bind(member_id)
                .bind(trip_id)
                .execute(&self.db)
                .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    pub async fn remove_member(&self, trip_id: i64, member_id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM trip_members WHERE id = ?1 AND trip_id = ?2")
            .bind(member_id)
            .bind(trip_id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    pub async fn guests(&self, trip_id: i64) -> Result<Vec<TripGuest>, AppError> {
        let rows = sqlx::query("SELECT id, trip_id, name FROM trip_guests WHERE trip_id = ?1 ORDER BY id")
            .bind(trip_id)
            .fetch_all(&self.db)
            .await?;
        rows.iter()
            .map(|row| {
                Ok(TripGuest {
                    id: row.try_get("id")?,
                    trip_id: row.try_get("trip_id")?,
                    name: row.try_get("name")?,
                })
            })
            .collect()
    }

    pub async fn add_guest(&self, trip_id: i64, name: &str) -> Result<(), AppError> {
        sqlx::query("INSERT INTO trip_guests (trip_id, name) VALUES (?1, ?2)")
            .bind(trip_id)
            .bind(name.trim())
            .execute(&self.db)
            .await?;
        Ok(())
    }

    pub async fn remove_guest(&self, trip_id: i64, guest_id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM trip_guests WHERE id = ?1 AND trip_id = ?2")
            .bind(guest_id)
            .bind(trip_id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    // ---- gear ----

    pub async fn items(&self, trip_id: i64) -> Result<Vec<ItemView>, AppError> {
        let rows = sqlx::query(
            r#"SELECT id, trip_id, description, quantity
               FROM items WHERE trip_id = ?1 ORDER BY id"#,
        )
        .bind(trip_id)
        .fetch_all(&self.db)
        .await?;
        let mut views = Vec::with_capacity(rows.len());
        for row in &rows {
            let item = Item {
                id: row.try_get("id")?,
                trip_id: row.try_get("trip_id")?,
                description: row.try_get("description")?,
                quantity: row.try_get("quantity")?,
            };
            let owners: Vec<String> = sqlx::query_scalar(
                r#"SELECT u.username FROM item_owners o
                   JOIN users u ON u.id = o.user_id
                   WHERE o.item_id = ?1 ORDER BY o.id"#,
            )
            .bind(item.id)
            .fetch_all(&self.db)
            .await?;
            views.push(ItemView { item, owners });
        }
        Ok(views)
    }

    pub async fn add_item(
        &self,
        trip_id: i64,
        description: &str,
        quantity: u32,
    ) -> Result<i64, AppError> {
        let id = sqlx::query("INSERT INTO items (trip_id, description, quantity) VALUES (?1, ?2, ?3)")
            .bind(trip_id)
            .bind(description.trim())
            .bind(quantity)
            .execute(&self.db)
            .await?
            .last_insert_rowid();
        Ok(id)
    }

    pub async fn remove_item(&self, trip_id: i64, item_id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM items WHERE id = ?1 AND trip_id = ?2")
            .bind(item_id)
            .bind(trip_id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    /// Claiming marks the current user as an owner of the item, accepted
    /// immediately since it was their own action.
    pub async fn claim_item(&self, trip_id: i64, item_id: i64, user_id: i64) -> Result<(), AppError> {
        let belongs: Option<i64> =
            sqlx::query_scalar("SELECT id FROM items WHERE id = ?1 AND trip_id = ?2")
                .bind(item_id)
                .bind(trip_id)
                .fetch_optional(&self.db)
                .await?;
        if belongs.is_none() {
            return Err(AppError::NotFound);
        }
        let already: Option<i64> =
            sqlx::query_scalar("SELECT id FROM item_owners WHERE item_id = ?1 AND user_id = ?2")
                .bind(item_id)
                .bind(user_id)
                .fetch_optional(&self.db)
                .await?;
        if already.is_some() {
            return Ok(());
        }
        sqlx::query("INSERT INTO item_owners (item_id, user_id, accept_reqd) VALUES (?1, ?2, 0)")
            .bind(item_id)
            .bind(user_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

fn map_trip(row: &SqliteRow) -> Result<Trip, AppError> {
    Ok(Trip {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        start_date: row.try_get("start_date")?,
        number_nights: row.try_get("number_nights")?,
        created_at: row.try_get("created_at")?,
    })
}

fn map_location(row: &SqliteRow) -> Result<TripLocation, AppError> {
    let code: String = row.try_get("location_type")?;
    let kind: LocationKind = code.parse()?;
    let raw_label: String = row.try_get("date")?;
    Ok(TripLocation {
        id: row.try_get("id")?,
        trip_id: row.try_get("trip_id")?,
        kind,
        title: row.try_get("title")?,
        date: raw_label.parse()?,
        latitude: row.try_get("latitude")?,
        longitude: row.try_get("longitude")?,
    })
}
