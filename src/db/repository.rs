use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::query::QueryAs;
use sqlx::sqlite::SqliteArguments;
use sqlx::{FromRow, Sqlite, SqliteConnection, SqlitePool};
use tracing::warn;

use crate::error::StoreError;
use crate::models::{
    AssociatedClass, Course, CourseKey, CourseSnapshot, Meeting, Reserve, Section, SectionEntry,
};
use crate::schedule::{decode_weekdays, encode_weekdays};

/// Normalized schedule rows for one term.
///
/// Every course is written as a whole by [`ScheduleStore::replace_course_sections`];
/// reads on missing keys return empty results.
#[derive(Clone)]
pub struct ScheduleStore {
    db: SqlitePool,
    term: u32,
}

#[derive(Debug, FromRow)]
struct CourseRow {
    subject: String,
    catalog_number: String,
    title: String,
    topic: Option<String>,
    note: Option<String>,
    academic_level: String,
    units: f64,
    last_updated: Option<String>,
    last_synced_at: String,
    snapshot_id: String,
}

#[derive(Debug, FromRow)]
struct SectionRow {
    label: String,
    class_number: i64,
    associated_class: Option<i64>,
    related_component_1: Option<String>,
    related_component_2: Option<String>,
    campus: String,
    enrollment_total: i64,
    enrollment_capacity: i64,
    waiting_total: i64,
    waiting_capacity: i64,
    held_with: String,
}

#[derive(Debug, FromRow)]
struct ReserveRow {
    label: String,
    group_name: Option<String>,
    reserved_total: i64,
    reserved_capacity: i64,
}

#[derive(Debug, FromRow)]
struct MeetingRow {
    label: String,
    is_tba: bool,
    is_cancelled: bool,
    is_closed: bool,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    start_time: Option<NaiveTime>,
    end_time: Option<NaiveTime>,
    weekdays: Option<String>,
    instructors: String,
    building: Option<String>,
    room: Option<String>,
}

const COURSE_COLUMNS: &str = "subject, catalog_number, title, topic, note, academic_level, \
     units, last_updated, last_synced_at, snapshot_id";

const SECTION_COLUMNS: &str = "label, class_number, associated_class, related_component_1, \
     related_component_2, campus, enrollment_total, enrollment_capacity, waiting_total, \
     waiting_capacity, held_with";

const RESERVE_COLUMNS: &str = "label, group_name, reserved_total, reserved_capacity";

const MEETING_COLUMNS: &str = "label, is_tba, is_cancelled, is_closed, start_date, end_date, \
     start_time, end_time, weekdays, instructors, building, room";

impl ScheduleStore {
    pub fn new(db: SqlitePool, term: u32) -> Self {
        Self { db, term }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db
    }

    pub fn key(&self, subject: &str, catalog_number: &str) -> CourseKey {
        CourseKey::new(self.term, subject, catalog_number)
    }

    pub async fn last_synced_at(&self, key: &CourseKey) -> Result<Option<DateTime<Utc>>, StoreError> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT last_synced_at FROM courses WHERE term = ? AND subject = ? AND catalog_number = ?",
        )
        .bind(i64::from(key.term))
        .bind(&key.subject)
        .bind(&key.catalog_number)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.and_then(|(ts,)| parse_timestamp(&ts)))
    }

    pub async fn find_course(&self, key: &CourseKey) -> Result<Option<Course>, StoreError> {
        let row = select_course(&self.db, key).await?;
        Ok(row.map(|row| course_from_row(key.term, row)))
    }

    /// One section with its reserves and meetings, read in one transaction.
    pub async fn find_section(
        &self,
        key: &CourseKey,
        label: &str,
    ) -> Result<Option<SectionEntry>, StoreError> {
        let mut tx = self.db.begin().await?;
        let entries = select_entries(&mut *tx, key, LabelFilter::Exact(label)).await?;
        tx.commit().await?;
        Ok(entries.into_iter().next())
    }

    /// Sections whose label starts with `prefix` (e.g. "TUT") with their
    /// rows, ordered by label and read in one transaction.
    pub async fn sections_with_prefix(
        &self,
        key: &CourseKey,
        prefix: &str,
    ) -> Result<Vec<SectionEntry>, StoreError> {
        let mut tx = self.db.begin().await?;
        let entries = select_entries(&mut *tx, key, LabelFilter::Prefix(prefix)).await?;
        tx.commit().await?;
        Ok(entries)
    }

    /// Sections in association group `group`, ordered by label.
    pub async fn sections_with_associated_class(
        &self,
        key: &CourseKey,
        group: i64,
    ) -> Result<Vec<Section>, StoreError> {
        let sql = format!(
            "SELECT {SECTION_COLUMNS} FROM sections \
             WHERE term = ? AND subject = ? AND catalog_number = ? AND associated_class = ? \
             ORDER BY label"
        );
        let rows: Vec<SectionRow> = sqlx::query_as(&sql)
            .bind(i64::from(key.term))
            .bind(&key.subject)
            .bind(&key.catalog_number)
            .bind(group)
            .fetch_all(&self.db)
            .await?;

        Ok(rows.into_iter().map(section_from_row).collect())
    }

    pub async fn fetch_meetings(
        &self,
        key: &CourseKey,
        label: &str,
    ) -> Result<Vec<Meeting>, StoreError> {
        let sql = format!(
            "SELECT {MEETING_COLUMNS} FROM meetings \
             WHERE term = ? AND subject = ? AND catalog_number = ? AND label = ? \
             ORDER BY position"
        );
        let rows: Vec<MeetingRow> = sqlx::query_as(&sql)
            .bind(i64::from(key.term))
            .bind(&key.subject)
            .bind(&key.catalog_number)
            .bind(label)
            .fetch_all(&self.db)
            .await?;

        Ok(rows.into_iter().map(meeting_from_row).collect())
    }

    pub async fn fetch_reserves(
        &self,
        key: &CourseKey,
        label: &str,
    ) -> Result<Vec<Reserve>, StoreError> {
        let sql = format!(
            "SELECT {RESERVE_COLUMNS} FROM reserves \
             WHERE term = ? AND subject = ? AND catalog_number = ? AND label = ? \
             ORDER BY position"
        );
        let rows: Vec<ReserveRow> = sqlx::query_as(&sql)
            .bind(i64::from(key.term))
            .bind(&key.subject)
            .bind(&key.catalog_number)
            .bind(label)
            .fetch_all(&self.db)
            .await?;

        Ok(rows.into_iter().map(reserve_from_row).collect())
    }

    /// Reads one course and everything under it inside a single read
    /// transaction, so the result never mixes two snapshots.
    pub async fn load_course_snapshot(
        &self,
        key: &CourseKey,
    ) -> Result<Option<CourseSnapshot>, StoreError> {
        let mut tx = self.db.begin().await?;

        let Some(course_row) = select_course(&mut *tx, key).await? else {
            tx.rollback().await?;
            return Ok(None);
        };
        let sections = select_entries(&mut *tx, key, LabelFilter::All).await?;
        tx.commit().await?;

        Ok(Some(CourseSnapshot {
            course: course_from_row(key.term, course_row),
            sections,
        }))
    }

    /// Replaces everything stored for the snapshot's course in one
    /// transaction. On error nothing is committed and the previous snapshot
    /// stays readable.
    pub async fn replace_course_sections(&self, snapshot: &CourseSnapshot) -> Result<(), StoreError> {
        let key = snapshot.key();
        let term = i64::from(key.term);
        let mut tx = self.db.begin().await?;

        // Write first so the transaction takes the write lock up front.
        for sql in [
            "DELETE FROM meetings WHERE term = ? AND subject = ? AND catalog_number = ?",
            "DELETE FROM reserves WHERE term = ? AND subject = ? AND catalog_number = ?",
            "DELETE FROM sections WHERE term = ? AND subject = ? AND catalog_number = ?",
        ] {
            sqlx::query(sql)
                .bind(term)
                .bind(&key.subject)
                .bind(&key.catalog_number)
                .execute(&mut *tx)
                .await?;
        }

        let course = &snapshot.course;
        sqlx::query(
            r#"
            INSERT INTO courses
                (term, subject, catalog_number, title, topic, note, academic_level,
                units, last_updated, last_synced_at, snapshot_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (term, subject, catalog_number) DO UPDATE SET
                title = excluded.title,
                topic = excluded.topic,
                note = excluded.note,
                academic_level = excluded.academic_level,
                units = excluded.units,
                last_updated = excluded.last_updated,
                last_synced_at = excluded.last_synced_at,
                snapshot_id = excluded.snapshot_id
            "#,
        )
        .bind(term)
        .bind(&key.subject)
        .bind(&key.catalog_number)
        .bind(&course.title)
        .bind(&course.topic)
        .bind(&course.note)
        .bind(&course.academic_level)
        .bind(course.units)
        .bind(&course.last_updated)
        .bind(course.last_synced_at.to_rfc3339())
        .bind(&course.snapshot_id)
        .execute(&mut *tx)
        .await?;

        for entry in &snapshot.sections {
            let section = &entry.section;
            let held_with = serde_json::to_string(&section.held_with).unwrap_or_else(|_| "[]".to_string());

            sqlx::query(
                r#"
                INSERT INTO sections
                    (term, subject, catalog_number, label, class_number, associated_class,
                    related_component_1, related_component_2, campus, enrollment_total,
                    enrollment_capacity, waiting_total, waiting_capacity, held_with)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(term)
            .bind(&key.subject)
            .bind(&key.catalog_number)
            .bind(&section.label)
            .bind(section.class_number)
            .bind(section.associated_class.group())
            .bind(section.related_component_1.ordinal())
            .bind(section.related_component_2.ordinal())
            .bind(&section.campus)
            .bind(section.enrollment_total)
            .bind(section.enrollment_capacity)
            .bind(section.waiting_total)
            .bind(section.waiting_capacity)
            .bind(held_with)
            .execute(&mut *tx)
            .await?;

            for (position, reserve) in entry.reserves.iter().enumerate() {
                sqlx::query(
                    r#"
                    INSERT INTO reserves
                        (term, subject, catalog_number, label, position, group_name,
                        reserved_total, reserved_capacity)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(term)
                .bind(&key.subject)
                .bind(&key.catalog_number)
                .bind(&section.label)
                .bind(position as i64)
                .bind(&reserve.group)
                .bind(reserve.reserved_total)
                .bind(reserve.reserved_capacity)
                .execute(&mut *tx)
                .await?;
            }

            for (position, meeting) in entry.meetings.iter().enumerate() {
                let instructors =
                    serde_json::to_string(&meeting.instructors).unwrap_or_else(|_| "[]".to_string());
                let weekdays = Some(encode_weekdays(&meeting.weekdays)).filter(|w| !w.is_empty());

                sqlx::query(
                    r#"
                    INSERT INTO meetings
                        (term, subject, catalog_number, label, position, is_tba, is_cancelled,
                        is_closed, start_date, end_date, start_time, end_time, weekdays,
                        instructors, building, room)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(term)
                .bind(&key.subject)
                .bind(&key.catalog_number)
                .bind(&section.label)
                .bind(position as i64)
                .bind(meeting.is_tba)
                .bind(meeting.is_cancelled)
                .bind(meeting.is_closed)
                .bind(meeting.start_date)
                .bind(meeting.end_date)
                .bind(meeting.start_time)
                .bind(meeting.end_time)
                .bind(weekdays)
                .bind(instructors)
                .bind(&meeting.building)
                .bind(&meeting.room)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }
}

async fn select_course<'e, E>(executor: E, key: &CourseKey) -> Result<Option<CourseRow>, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "SELECT {COURSE_COLUMNS} FROM courses WHERE term = ? AND subject = ? AND catalog_number = ?"
    );
    sqlx::query_as(&sql)
        .bind(i64::from(key.term))
        .bind(&key.subject)
        .bind(&key.catalog_number)
        .fetch_optional(executor)
        .await
}

/// Which sections of a course a read covers.
#[derive(Debug, Clone, Copy)]
enum LabelFilter<'a> {
    All,
    Exact(&'a str),
    Prefix(&'a str),
}

impl LabelFilter<'_> {
    fn clause(self) -> &'static str {
        match self {
            LabelFilter::All => "",
            LabelFilter::Exact(_) => " AND label = ?",
            LabelFilter::Prefix(_) => " AND substr(label, 1, ?) = ?",
        }
    }

    fn bind<'q, O>(
        self,
        query: QueryAs<'q, Sqlite, O, SqliteArguments<'q>>,
    ) -> QueryAs<'q, Sqlite, O, SqliteArguments<'q>> {
        match self {
            LabelFilter::All => query,
            LabelFilter::Exact(label) => query.bind(label.to_string()),
            LabelFilter::Prefix(prefix) => query
                .bind(prefix.chars().count() as i64)
                .bind(prefix.to_string()),
        }
    }
}

/// Sections matching `filter` with their reserves and meetings attached,
/// ordered by label. Run inside a transaction so the three reads agree.
async fn select_entries(
    conn: &mut SqliteConnection,
    key: &CourseKey,
    filter: LabelFilter<'_>,
) -> Result<Vec<SectionEntry>, sqlx::Error> {
    let scope = format!(
        "WHERE term = ? AND subject = ? AND catalog_number = ?{}",
        filter.clause()
    );

    let sql = format!("SELECT {SECTION_COLUMNS} FROM sections {scope} ORDER BY label");
    let query = sqlx::query_as::<_, SectionRow>(&sql)
        .bind(i64::from(key.term))
        .bind(&key.subject)
        .bind(&key.catalog_number);
    let section_rows = filter.bind(query).fetch_all(&mut *conn).await?;

    let sql = format!("SELECT {RESERVE_COLUMNS} FROM reserves {scope} ORDER BY label, position");
    let query = sqlx::query_as::<_, ReserveRow>(&sql)
        .bind(i64::from(key.term))
        .bind(&key.subject)
        .bind(&key.catalog_number);
    let reserve_rows = filter.bind(query).fetch_all(&mut *conn).await?;

    let sql = format!("SELECT {MEETING_COLUMNS} FROM meetings {scope} ORDER BY label, position");
    let query = sqlx::query_as::<_, MeetingRow>(&sql)
        .bind(i64::from(key.term))
        .bind(&key.subject)
        .bind(&key.catalog_number);
    let meeting_rows = filter.bind(query).fetch_all(&mut *conn).await?;

    let mut reserves: HashMap<String, Vec<Reserve>> = HashMap::new();
    for row in reserve_rows {
        reserves.entry(row.label.clone()).or_default().push(reserve_from_row(row));
    }
    let mut meetings: HashMap<String, Vec<Meeting>> = HashMap::new();
    for row in meeting_rows {
        meetings.entry(row.label.clone()).or_default().push(meeting_from_row(row));
    }

    Ok(section_rows
        .into_iter()
        .map(|row| {
            let section = section_from_row(row);
            SectionEntry {
                reserves: reserves.remove(&section.label).unwrap_or_default(),
                meetings: meetings.remove(&section.label).unwrap_or_default(),
                section,
            }
        })
        .collect())
}

fn course_from_row(term: u32, row: CourseRow) -> Course {
    let last_synced_at = parse_timestamp(&row.last_synced_at).unwrap_or_else(|| {
        warn!("unreadable last_synced_at {:?}, treating as stale", row.last_synced_at);
        DateTime::<Utc>::MIN_UTC
    });

    Course {
        term,
        subject: row.subject,
        catalog_number: row.catalog_number,
        title: row.title,
        topic: row.topic,
        note: row.note,
        academic_level: row.academic_level,
        units: row.units,
        last_updated: row.last_updated,
        last_synced_at,
        snapshot_id: row.snapshot_id,
    }
}

fn section_from_row(row: SectionRow) -> Section {
    Section {
        class_number: row.class_number,
        associated_class: AssociatedClass::from(row.associated_class),
        related_component_1: row.related_component_1.into(),
        related_component_2: row.related_component_2.into(),
        campus: row.campus,
        enrollment_total: row.enrollment_total,
        enrollment_capacity: row.enrollment_capacity,
        waiting_total: row.waiting_total,
        waiting_capacity: row.waiting_capacity,
        held_with: serde_json::from_str(&row.held_with).unwrap_or_default(),
        label: row.label,
    }
}

fn reserve_from_row(row: ReserveRow) -> Reserve {
    Reserve {
        group: row.group_name,
        reserved_total: row.reserved_total,
        reserved_capacity: row.reserved_capacity,
    }
}

fn meeting_from_row(row: MeetingRow) -> Meeting {
    Meeting {
        is_tba: row.is_tba,
        is_cancelled: row.is_cancelled,
        is_closed: row.is_closed,
        start_date: row.start_date,
        end_date: row.end_date,
        start_time: row.start_time,
        end_time: row.end_time,
        weekdays: row.weekdays.as_deref().map(decode_weekdays).unwrap_or_default(),
        instructors: serde_json::from_str(&row.instructors).unwrap_or_default(),
        building: row.building,
        room: row.room,
    }
}

/// Parse RFC3339 timestamp to comparable format
fn parse_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(ts)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
