//! Blood request database operations.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use super::{decode_time, encode_time, like_pattern, Database, DbError, DbResult};
use crate::models::{
    fold_case, BloodRequest, Coordinates, Page, PageRequest, RequestFilter, RequestStatus, SortBy,
    SortOrder, Urgency,
};

const REQUEST_COLUMNS: &str = r#"
    id, blood_type, units, urgency, city, hospital, contact_phone, notes,
    status, requester_id, latitude, longitude, created_at, expires_at, updated_at
"#;

/// Counts of requests per status, plus open requests per urgency.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RequestStats {
    pub by_status: BTreeMap<String, u64>,
    pub open_by_urgency: BTreeMap<String, u64>,
}

impl RequestStats {
    pub fn count(&self, status: RequestStatus) -> u64 {
        self.by_status.get(status.as_str()).copied().unwrap_or(0)
    }

    pub fn open_with_urgency(&self, urgency: Urgency) -> u64 {
        self.open_by_urgency.get(urgency.as_str()).copied().unwrap_or(0)
    }
}

impl Database {
    /// Insert a new blood request.
    pub fn insert_request(&self, request: &BloodRequest) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO blood_requests (
                id, blood_type, units, urgency, city, hospital, contact_phone, notes,
                status, requester_id, latitude, longitude, created_at, expires_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
            params![
                request.id,
                request.blood_type.as_str(),
                request.units,
                request.urgency.as_str(),
                request.city,
                request.hospital,
                request.contact_phone,
                request.notes,
                request.status.as_str(),
                request.requester_id,
                request.coordinates.map(|c| c.latitude),
                request.coordinates.map(|c| c.longitude),
                encode_time(request.created_at),
                request.expires_at.map(encode_time),
                encode_time(request.updated_at),
            ],
        )?;
        Ok(())
    }

    /// Get a request by ID.
    pub fn get_request(&self, id: &str) -> DbResult<Option<BloodRequest>> {
        let sql = format!("SELECT {} FROM blood_requests WHERE id = ?", REQUEST_COLUMNS);
        self.conn
            .query_row(&sql, [id], read_request_row)
            .optional()?
            .map(BloodRequest::try_from)
            .transpose()
    }

    /// Move a request from `expected` to `to`, but only if it is still in
    /// `expected`. Returns `false` when the row was missing or had already
    /// changed, i.e. the caller lost a race.
    pub fn update_request_status(
        &self,
        id: &str,
        expected: RequestStatus,
        to: RequestStatus,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE blood_requests SET
                status = ?3,
                updated_at = ?4
            WHERE id = ?1 AND status = ?2
            "#,
            params![id, expected.as_str(), to.as_str(), encode_time(now)],
        )?;
        Ok(rows_affected > 0)
    }

    /// IDs of open requests whose expiry is strictly before `as_of`.
    pub fn list_expired_open_request_ids(&self, as_of: DateTime<Utc>) -> DbResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id FROM blood_requests
            WHERE status = 'open'
              AND expires_at IS NOT NULL
              AND expires_at < ?
            ORDER BY expires_at
            "#,
        )?;

        let rows = stmt.query_map([encode_time(as_of)], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// List requests matching `filter`, one page at a time.
    pub fn list_requests(
        &self,
        filter: &RequestFilter,
        page: PageRequest,
    ) -> DbResult<Page<BloodRequest>> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(status) = filter.status {
            clauses.push("status = ?");
            values.push(Value::Text(status.as_str().into()));
        }
        if let Some(blood_type) = filter.blood_type {
            clauses.push("blood_type = ?");
            values.push(Value::Text(blood_type.as_str().into()));
        }
        if let Some(urgency) = filter.urgency {
            clauses.push("urgency = ?");
            values.push(Value::Text(urgency.as_str().into()));
        }
        if let Some(city) = filter.city.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            clauses.push("fold_case(city) = ?");
            values.push(Value::Text(fold_case(city)));
        }
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            clauses.push(
                "(fold_case(hospital) LIKE ? ESCAPE '\\' \
                 OR fold_case(city) LIKE ? ESCAPE '\\' \
                 OR fold_case(notes) LIKE ? ESCAPE '\\')",
            );
            let pattern = like_pattern(&fold_case(search));
            values.push(Value::Text(pattern.clone()));
            values.push(Value::Text(pattern.clone()));
            values.push(Value::Text(pattern));
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM blood_requests {}", where_sql),
            params_from_iter(values.iter()),
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT {} FROM blood_requests {} ORDER BY {} {}, created_at DESC, id LIMIT ? OFFSET ?",
            REQUEST_COLUMNS,
            where_sql,
            sort_expression(filter.sort_by),
            sort_direction(filter.sort_order),
        );
        values.push(Value::Integer(i64::from(page.limit)));
        values.push(Value::Integer(i64::try_from(page.offset()).unwrap_or(i64::MAX)));

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), read_request_row)?;

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

    /// Hard-delete a request. Bypasses the lifecycle entirely.
    pub fn delete_request(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM blood_requests WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    /// Aggregate request counts.
    pub fn request_stats(&self) -> DbResult<RequestStats> {
        let mut stats = RequestStats::default();

        let mut stmt = self
            .conn
            .prepare("SELECT status, COUNT(*) FROM blood_requests GROUP BY status")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
        for row in rows {
            let (status, count) = row?;
            stats.by_status.insert(status, u64::try_from(count).unwrap_or(0));
        }

        let mut stmt = self.conn.prepare(
            "SELECT urgency, COUNT(*) FROM blood_requests WHERE status = 'open' GROUP BY urgency",
        )?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
        for row in rows {
            let (urgency, count) = row?;
            stats.open_by_urgency.insert(urgency, u64::try_from(count).unwrap_or(0));
        }

        Ok(stats)
    }
}

fn sort_expression(sort_by: SortBy) -> &'static str {
    match sort_by {
        SortBy::CreatedAt => "created_at",
        SortBy::Units => "units",
        // Requests without expiry sort after every dated one
        SortBy::ExpiresAt => "COALESCE(expires_at, '9999')",
        SortBy::Urgency => {
            "CASE urgency WHEN 'low' THEN 0 WHEN 'normal' THEN 1 WHEN 'high' THEN 2 ELSE 3 END"
        }
    }
}

fn sort_direction(order: SortOrder) -> &'static str {
    match order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    }
}

/// Intermediate row struct for database mapping.
struct RequestRow {
    id: String,
    blood_type: String,
    units: u32,
    urgency: String,
    city: String,
    hospital: String,
    contact_phone: String,
    notes: Option<String>,
    status: String,
    requester_id: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    created_at: String,
    expires_at: Option<String>,
    updated_at: String,
}

fn read_request_row(row: &Row<'_>) -> rusqlite::Result<RequestRow> {
    Ok(RequestRow {
        id: row.get(0)?,
        blood_type: row.get(1)?,
        units: row.get(2)?,
        urgency: row.get(3)?,
        city: row.get(4)?,
        hospital: row.get(5)?,
        contact_phone: row.get(6)?,
        notes: row.get(7)?,
        status: row.get(8)?,
        requester_id: row.get(9)?,
        latitude: row.get(10)?,
        longitude: row.get(11)?,
        created_at: row.get(12)?,
        expires_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}

impl TryFrom<RequestRow> for BloodRequest {
    type Error = DbError;

    fn try_from(row: RequestRow) -> Result<Self, Self::Error> {
        let blood_type = row
            .blood_type
            .parse()
            .map_err(|e| DbError::InvalidData(format!("{}", e)))?;
        let urgency = row
            .urgency
            .parse()
            .map_err(|e| DbError::InvalidData(format!("{}", e)))?;
        let status = row
            .status
            .parse()
            .map_err(|e| DbError::InvalidData(format!("{}", e)))?;
        let coordinates = match (row.latitude, row.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates {
                latitude,
                longitude,
            }),
            _ => None,
        };

        Ok(BloodRequest {
            id: row.id,
            blood_type,
            units: row.units,
            urgency,
            city: row.city,
            hospital: row.hospital,
            contact_phone: row.contact_phone,
            notes: row.notes,
            status,
            requester_id: row.requester_id,
            coordinates,
            created_at: decode_time(&row.created_at)?,
            expires_at: row.expires_at.as_deref().map(decode_time).transpose()?,
            updated_at: decode_time(&row.updated_at)?,
        })
    }
}
