use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::db::DbPool;
use crate::error::AppError;
use crate::models::contact::{ContactDraft, EmergencyContact};
use crate::models::vehicle::{Vehicle, VehicleDraft};

/// Per-user emergency contacts and vehicles. Everything is scoped by the
/// owning user id, so one user can never address another user's records.
#[derive(Clone)]
pub struct AccountStore {
    db: DbPool,
}

impl AccountStore {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    // ---- emergency contacts ----

    pub async fn contacts_for(&self, user_id: i64) -> Result<Vec<EmergencyContact>, AppError> {
        let rows = sqlx::query(
            r#"SELECT id, user_id, full_name, preferred_name, relationship, email,
                      primary_phone, secondary_phone, street_address_line1,
                      street_address_line2, city, state, zip_code
               FROM emergency_contacts WHERE user_id = ?1 ORDER BY id"#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        rows.iter().map(map_contact).collect()
    }

    pub async fn contact(&self, user_id: i64, contact_id: i64) -> Result<EmergencyContact, AppError> {
        let row = sqlx::query(
            r#"SELECT id, user_id, full_name, preferred_name, relationship, email,
                      primary_phone, secondary_phone, street_address_line1,
                      street_address_line2, city, state, zip_code
               FROM emergency_contacts WHERE user_id = ?1 AND id = ?2"#,
        )
        .bind(user_id)
        .bind(contact_id)
        .fetch_optional(&self.db)
        .await?;
        row.as_ref().map(map_contact).ok_or(AppError::NotFound)?
    }

    pub async fn insert_contact(&self, user_id: i64, draft: &ContactDraft) -> Result<i64, AppError> {
        let id = sqlx::query(
            r#"INSERT INTO emergency_contacts
               (user_id, full_name, preferred_name, relationship, email, primary_phone,
                secondary_phone, street_address_line1, street_address_line2, city, state, zip_code)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"#,
        )
        .bind(user_id)
        .bind(&draft.full_name)
        .bind(&draft.preferred_name)
        .bind(&draft.relationship)
        .bind(&draft.email)
        .bind(&draft.primary_phone)
        .bind(&draft.secondary_phone)
        .bind(&draft.street_address_line1)
        .bind(&draft.street_address_line2)
        .bind(&draft.city)
        .bind(&draft.state)
        .bind(&draft.zip_code)
        .execute(&self.db)
        .await?
        .last_insert_rowid();
        Ok(id)
    }

    pub async fn update_contact(
        &self,
        user_id: i64,
        contact_id: i64,
        draft: &ContactDraft,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"UPDATE emergency_contacts
               SET full_name = ?1, preferred_name = ?2, relationship = ?3, email = ?4,
                   primary_phone = ?5, secondary_phone = ?6, street_address_line1 = ?7,
                   street_address_line2 = ?8, city = ?9, state = ?10, zip_code = ?11
               WHERE user_id = ?12 AND id = ?13"#,
        )
        .bind(&draft.full_name)
        .bind(&draft.preferred_name)
        .bind(&draft.relationship)
        .bind(&draft.email)
        .bind(&draft.primary_phone)
        .bind(&draft.secondary_phone)
        .bind(&draft.street_address_line1)
        .bind(&draft.street_address_line2)
        .bind(&draft.city)
        .bind(&draft.state)
        .bind(&draft.zip_code)
        .bind(user_id)
        .bind(contact_id)
        .execute(&self.db)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    pub async fn delete_contact(&self, user_id: i64, contact_id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM emergency_contacts WHERE user_id = ?1 AND id = ?2")
            .bind(user_id)
            .bind(contact_id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    // ---- vehicles ----

    pub async fn vehicles_for(&self, user_id: i64) -> Result<Vec<Vehicle>, AppError> {
        let rows = sqlx::query(
            r#"SELECT id, user_id, make, model, year, color, lic_plate_num, lic_plate_st
               FROM vehicles WHERE user_id = ?1 ORDER BY id"#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        rows.iter().map(map_vehicle).collect()
    }

    pub async fn vehicle(&self, user_id: i64, vehicle_id: i64) -> Result<Vehicle, AppError> {
        let row = sqlx::query(
            r#"SELECT id, user_id, make, model, year, color, lic_plate_num, lic_plate_st
               FROM vehicles WHERE user_id = ?1 AND id = ?2"#,
        )
        .bind(user_id)
        .bind(vehicle_id)
        .fetch_optional(&self.db)
        .await?;
        row.as_ref().map(map_vehicle).ok_or(AppError::NotFound)?
    }

    pub async fn insert_vehicle(&self, user_id: i64, draft: &VehicleDraft) -> Result<i64, AppError> {
        let id = sqlx::query(
            r#"INSERT INTO vehicles
               (user_id, make, model, year, color, lic_plate_num, lic_plate_st)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#,
        )
        .bind(user_id)
        .bind(&draft.make)
        .bind(&draft.model)
        .bind(&draft.year)
        .bind(&draft.color)
        .bind(&draft.lic_plate_num)
        .bind(&draft.lic_plate_st)
        .execute(&self.db)
        .await?
        .last_insert_rowid();
        Ok(id)
    }

    pub async fn update_vehicle(
        &self,
        user_id: i64,
        vehicle_id: i64,
        draft: &VehicleDraft,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"UPDATE vehicles
               SET make = ?1, model = ?2, year = ?3, color = ?4,
                   lic_plate_num = ?5, lic_plate_st = ?6
               WHERE user_id = ?7 AND id = ?8"#,
        )
        .bind(&draft.make)
        .bind(&draft.model)
        .bind(&draft.year)
        .bind(&draft.color)
        .bind(&draft.lic_plate_num)
        .bind(&draft.lic_plate_st)
        .bind(user_id)
        .bind(vehicle_id)
        .execute(&self.db)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    pub async fn delete_vehicle(&self, user_id: i64, vehicle_id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM vehicles WHERE user_id = ?1 AND id = ?2")
            .bind(user_id)
            .bind(vehicle_id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}

fn map_contact(row: &SqliteRow) -> Result<EmergencyContact, AppError> {
    Ok(EmergencyContact {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        full_name: row.try_get("full_name")?,
        preferred_name: row.try_get("preferred_name")?,
        relationship: row.try_get("relationship")?,
        email: row.try_get("email")?,
        primary_phone: row.try_get("primary_phone")?,
        secondary_phone: row.try_get("secondary_phone")?,
        street_address_line1: row.try_get("street_address_line1")?,
        street_address_line2: row.try_get("street_address_line2")?,
        city: row.try_get("city")?,
        state: row.try_get("state")?,
        zip_code: row.try_get("zip_code")?,
    })
}

fn map_vehicle(row: &SqliteRow) -> Result<Vehicle, AppError> {
    Ok(Vehicle {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        make: row.try_get("make")?,
        model: row.try_get("model")?,
        year: row.try_get("year")?,
        color: row.try_get("color")?,
        lic_plate_num: row.try_get("lic_plate_num")?,
        lic_plate_st: row.try_get("lic_plate_st")?,
    })
}
