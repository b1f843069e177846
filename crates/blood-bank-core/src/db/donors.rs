//! Donor database operations.

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};

use super::{decode_date, decode_time, encode_date, encode_time, Database, DbError, DbResult};
use crate::models::{fold_case, BloodType, Coordinates, Donor, DonorFilter, Page, PageRequest};

const DONOR_COLUMNS: &str = r#"
    id, user_id, blood_type, city, latitude, longitude, is_available, receive_alerts,
    max_distance_km, last_donation, can_donate_after, created_at, updated_at
"#;

impl Database {
    /// Insert a new donor. Fails with `Constraint` if the user already has one.
    pub fn insert_donor(&self, donor: &Donor) -> DbResult<()> {
        let result = self.conn.execute(
            r#"
            INSERT INTO donors (
                id, user_id, blood_type, city, latitude, longitude, is_available,
                receive_alerts, max_distance_km, last_donation, can_donate_after,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                donor.id,
                donor.user_id,
                donor.blood_type.as_str(),
                donor.city,
                donor.coordinates.map(|c| c.latitude),
                donor.coordinates.map(|c| c.longitude),
                donor.is_available,
                donor.receive_alerts,
                donor.max_distance_km,
                donor.last_donation.map(encode_date),
                donor.can_donate_after.map(encode_date),
                encode_time(donor.created_at),
                encode_time(donor.updated_at),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Err(DbError::Constraint(format!(
                    "donor already registered for user {}",
                    donor.user_id
                )))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Update every mutable donor field.
    pub fn update_donor(&self, donor: &Donor) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE donors SET
                blood_type = ?2,
                city = ?3,
                latitude = ?4,
                longitude = ?5,
                is_available = ?6,
                receive_alerts = ?7,
                max_distance_km = ?8,
                last_donation = ?9,
                can_donate_after = ?10,
                updated_at = ?11
            WHERE id = ?1
            "#,
            params![
                donor.id,
                donor.blood_type.as_str(),
                donor.city,
                donor.coordinates.map(|c| c.latitude),
                donor.coordinates.map(|c| c.longitude),
                donor.is_available,
                donor.receive_alerts,
                donor.max_distance_km,
                donor.last_donation.map(encode_date),
                donor.can_donate_after.map(encode_date),
                encode_time(donor.updated_at),
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a donor by ID.
    pub fn get_donor(&self, id: &str) -> DbResult<Option<Donor>> {
        let sql = format!("SELECT {} FROM donors WHERE id = ?", DONOR_COLUMNS);
        self.conn
            .query_row(&sql, [id], read_donor_row)
            .optional()?
            .map(Donor::try_from)
            .transpose()
    }

    /// Get the donor linked to an external user identity.
    pub fn get_donor_by_user(&self, user_id: &str) -> DbResult<Option<Donor>> {
        let sql = format!("SELECT {} FROM donors WHERE user_id = ?", DONOR_COLUMNS);
        self.conn
            .query_row(&sql, [user_id], read_donor_row)
            .optional()?
            .map(Donor::try_from)
            .transpose()
    }

    /// Donors whose type is one of `blood_types`, optionally only those
    /// flagged available. Eligibility and proximity are left to the caller.
    pub fn list_donors_by_blood_types(
        &self,
        blood_types: &[BloodType],
        available_only: bool,
    ) -> DbResult<Vec<Donor>> {
        if blood_types.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; blood_types.len()].join(", ");
        let mut sql = format!(
            "SELECT {} FROM donors WHERE blood_type IN ({})",
            DONOR_COLUMNS, placeholders
        );
        if available_only {
            sql.push_str(" AND is_available = 1");
        }
        sql.push_str(" ORDER BY created_at, id");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params_from_iter(blood_types.iter().map(|t| t.as_str())),
            read_donor_row,
        )?;

        let mut donors = Vec::new();
        for row in rows {
            donors.push(row?.try_into()?);
        }
        Ok(donors)
    }

    /// Browse donors, one page at a time.
    pub fn list_donors(&self, filter: &DonorFilter, page: PageRequest) -> DbResult<Page<Donor>> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(blood_type) = filter.blood_type {
            clauses.push("blood_type = ?");
            values.push(Value::Text(blood_type.as_str().into()));
        }
        if let Some(city) = filter.city.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            clauses.push("fold_case(city) = ?");
            values.push(Value::Text(fold_case(city)));
        }
        if filter.available_only {
            clauses.push("is_available = 1");
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM donors {}", where_sql),
            params_from_iter(values.iter()),
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT {} FROM donors {} ORDER BY created_at DESC, id LIMIT ? OFFSET ?",
            DONOR_COLUMNS, where_sql
        );
        values.push(Value::Integer(i64::from(page.limit)));
        values.push(Value::Integer(i64::try_from(page.offset()).unwrap_or(i64::MAX)));

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), read_donor_row)?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?.try_into()?);
        }

        Ok(Page {
            items,
            total: u64::try_from(total).unwrap_or(0),
            page: page.page,
            limit: page.limit,
        })
    }
}

/// Intermediate row struct for database mapping.
struct DonorRow {
    id: String,
    user_id: String,
    blood_type: String,
    city: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    is_available: bool,
    receive_alerts: bool,
    max_distance_km: u32,
    last_donation: Option<String>,
    can_donate_after: Option<String>,
    created_at: String,
    updated_at: String,
}

fn read_donor_row(row: &Row<'_>) -> rusqlite::Result<DonorRow> {
    Ok(DonorRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        blood_type: row.get(2)?,
        city: row.get(3)?,
        latitude: row.get(4)?,
        longitude: row.get(5)?,
        is_available: row.get(6)?,
        receive_alerts: row.get(7)?,
        max_distance_km: row.get(8)?,
        last_donation: row.get(9)?,
        can_donate_after: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

impl TryFrom<DonorRow> for Donor {
    type Error = DbError;

    fn try_from(row: DonorRow) -> Result<Self, Self::Error> {
        let blood_type = row
            .blood_type
            .parse()
            .map_err(|e| DbError::InvalidData(format!("{}", e)))?;
        let coordinates = match (row.latitude, row.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates {
                latitude,
                longitude,
            }),
            _ => None,
        };

        Ok(Donor {
            id: row.id,
            user_id: row.user_id,
            blood_type,
            city: row.city,
            coordinates,
            is_available: row.is_available,
            receive_alerts: row.receive_alerts,
            max_distance_km: row.max_distance_km,
            last_donation: row.last_donation.as_deref().map(decode_date).transpose()?,
            can_donate_after: row.can_donate_after.as_deref().map(decode_date).transpose()?,
            created_at: decode_time(&row.created_at)?,
            updated_at: decode_time(&row.updated_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewDonor;
    use chrono::{Duration, Utc};

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn make_donor(user_id: &str, blood_type: BloodType, city: &str) -> Donor {
        NewDonor::new(user_id, blood_type, city)
            .validate(Utc::now())
            .unwrap()
    }

    #[test]
    fn test_insert_and_get() {
        let db = setup_db();
        let now = Utc::now();

        let mut input = NewDonor::new("user-1", BloodType::ONegative, "Taiz");
        input.coordinates = Some(Coordinates::new(13.58, 44.02).unwrap());
        input.max_distance_km = Some(120);
        input.last_donation = Some(now.date_naive() - Duration::days(30));
        let donor = input.validate(now).unwrap();

        db.insert_donor(&donor).unwrap();

        let retrieved = db.get_donor(&donor.id).unwrap().unwrap();
        assert_eq!(retrieved, donor);

        let by_user = db.get_donor_by_user("user-1").unwrap().unwrap();
        assert_eq!(by_user.id, donor.id);
    }

    #[test]
    fn test_duplicate_user_is_constraint_error() {
        let db = setup_db();
        db.insert_donor(&make_donor("user-1", BloodType::APositive, "Aden"))
            .unwrap();

        let err = db
            .insert_donor(&make_donor("user-1", BloodType::BPositive, "Aden"))
            .unwrap_err();
        assert!(matches!(err, DbError::Constraint(_)));
    }

    #[test]
    fn test_update_donor() {
        let db = setup_db();
        let mut donor = make_donor("user-1", BloodType::APositive, "Aden");
        db.insert_donor(&donor).unwrap();

        donor.is_available = false;
        donor.set_last_donation(Some(Utc::now().date_naive()));
        assert!(db.update_donor(&donor).unwrap());

        let retrieved = db.get_donor(&donor.id).unwrap().unwrap();
        assert!(!retrieved.is_available);
        assert_eq!(retrieved.can_donate_after, donor.can_donate_after);
    }

    #[test]
    fn test_list_by_blood_types() {
        let db = setup_db();
        db.insert_donor(&make_donor("u1", BloodType::ONegative, "Taiz")).unwrap();
        db.insert_donor(&make_donor("u2", BloodType::APositive, "Taiz")).unwrap();
        let mut unavailable = make_donor("u3", BloodType::ANegative, "Taiz");
        unavailable.is_available = false;
        db.insert_donor(&unavailable).unwrap();

        let types = [BloodType::ANegative, BloodType::ONegative];
        assert_eq!(db.list_donors_by_blood_types(&types, false).unwrap().len(), 2);

        let available = db.list_donors_by_blood_types(&types, true).unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].blood_type, BloodType::ONegative);

        assert!(db.list_donors_by_blood_types(&[], false).unwrap().is_empty());
    }

    #[test]
    fn test_list_donors_page() {
        let db = setup_db();
        for i in 0..5 {
            db.insert_donor(&make_donor(&format!("u{}", i), BloodType::BPositive, "Ibb"))
                .unwrap();
        }
        db.insert_donor(&make_donor("other", BloodType::BPositive, "Aden")).unwrap();

        let filter = DonorFilter {
            city: Some("ibb".into()),
            ..Default::default()
        };
        let page = db.list_donors(&filter, PageRequest::new(2, 2)).unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.items.len(), 2);
        assert!(page.has_next());
    }

    #[test]
    fn test_city_filter_agrees_with_matcher() {
        let db = setup_db();
        db.insert_donor(&make_donor("u1", BloodType::APositive, "Échirolles")).unwrap();

        let filter = DonorFilter {
            city: Some("ÉCHIROLLES".into()),
            ..Default::default()
        };
        assert_eq!(db.list_donors(&filter, PageRequest::new(1, 10)).unwrap().total, 1);
        assert!(crate::matching::same_city("Échirolles", "ÉCHIROLLES"));
    }
}
