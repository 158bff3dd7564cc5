//! Time-windowed activity reporting.
//!
//! Windows are calendar days or months in the operation's reference zone,
//! converted to UTC instants before anything is compared; stored
//! timestamps are never truncated to local dates. Each status is counted
//! on its own milestone timestamp, so a service created yesterday and
//! cancelled today shows up in yesterday's registered count and today's
//! cancelled count.

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use sea_orm::{ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use models::service::{self, ServiceKind};
use models::user;

use crate::errors::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportWindow {
    /// One calendar day in the reference zone.
    Day(NaiveDate),
    /// One calendar month in the reference zone.
    Month { year: i32, month: u32 },
}

impl ReportWindow {
    /// Today in the reference zone.
    pub fn today(tz: Tz) -> Self {
        Self::Day(Utc::now().with_timezone(&tz).date_naive())
    }

    /// The month containing today in the reference zone.
    pub fn current_month(tz: Tz) -> Self {
        let now = Utc::now().with_timezone(&tz);
        Self::Month { year: now.year(), month: now.month() }
    }

    /// Half-open `[start, end)` UTC bounds of the window.
    pub fn bounds(&self, tz: Tz) -> Result<(DateTime<Utc>, DateTime<Utc>), ServiceError> {
        let (first, past_end) = match *self {
            ReportWindow::Day(day) => {
                let next = day
                    .succ_opt()
                    .ok_or_else(|| ServiceError::Validation("date out of range".into()))?;
                (day, next)
            }
            ReportWindow::Month { year, month } => {
                let first = NaiveDate::from_ymd_opt(year, month, 1)
                    .ok_or_else(|| ServiceError::Validation("invalid month".into()))?;
                let (ny, nm) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
                let next = NaiveDate::from_ymd_opt(ny, nm, 1)
                    .ok_or_else(|| ServiceError::Validation("invalid month".into()))?;
                (first, next)
            }
        };
        Ok((local_midnight_utc(first, tz)?, local_midnight_utc(past_end, tz)?))
    }
}

/// Resolve local midnight of `date` to a UTC instant.
///
/// DST transitions in the reference zone historically happened at
/// midnight, so the wall-clock time may be skipped or doubled: a doubled
/// midnight takes the earlier instant, a skipped one rolls forward to the
/// first valid hour.
fn local_midnight_utc(date: NaiveDate, tz: Tz) -> Result<DateTime<Utc>, ServiceError> {
    let midnight = date.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earlier, _) => Ok(earlier.with_timezone(&Utc)),
        LocalResult::None => tz
            .from_local_datetime(&(midnight + Duration::hours(1)))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| ServiceError::Validation("unresolvable local time".into())),
    }
}

/// The timestamps a single service contributes to a report.
#[derive(Debug, Clone)]
pub struct ServiceFacts {
    pub neighborhood: String,
    pub username: String,
    pub kind: ServiceKind,
    pub created_at: DateTime<Utc>,
    pub en_route_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTally {
    pub registered: u64,
    pub en_route: u64,
    pub finished: u64,
    pub cancelled: u64,
}

impl StatusTally {
    pub fn total(&self) -> u64 {
        self.registered + self.en_route + self.finished + self.cancelled
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupTally {
    pub name: String,
    pub counts: StatusTally,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindTally {
    pub kind: ServiceKind,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityReport {
    pub totals: StatusTally,
    pub by_kind: Vec<KindTally>,
    pub by_neighborhood: Vec<GroupTally>,
    pub by_user: Vec<GroupTally>,
}

/// Aggregate already-fetched rows over `[start, end)`.
///
/// Groups keep first-seen order under the descending-total sort, which
/// makes ties stable.
pub fn summarize(rows: &[ServiceFacts], start: DateTime<Utc>, end: DateTime<Utc>) -> ActivityReport {
    let in_window = |t: DateTime<Utc>| t >= start && t < end;
    let mut report = ActivityReport::default();
    let mut hoods: Vec<GroupTally> = Vec::new();
    let mut users: Vec<GroupTally> = Vec::new();
    let mut kinds: Vec<KindTally> = Vec::new();

    for row in rows {
        let tally = StatusTally {
            registered: in_window(row.created_at) as u64,
            en_route: row.en_route_at.map_or(false, in_window) as u64,
            finished: row.finished_at.map_or(false, in_window) as u64,
            cancelled: row.cancelled_at.map_or(false, in_window) as u64,
        };
        if tally.total() == 0 {
            continue;
        }

        report.totals.registered += tally.registered;
        report.totals.en_route += tally.en_route;
        report.totals.finished += tally.finished;
        report.totals.cancelled += tally.cancelled;

        add_to_group(&mut hoods, &row.neighborhood, tally);
        add_to_group(&mut users, &row.username, tally);

        // A service belongs to its kind once, at registration.
        if in_window(row.created_at) {
            match kinds.iter_mut().find(|k| k.kind == row.kind) {
                Some(k) => k.count += 1,
                None => kinds.push(KindTally { kind: row.kind, count: 1 }),
            }
        }
    }

    for group in hoods.iter_mut().chain(users.iter_mut()) {
        group.total = group.counts.total();
    }
    hoods.sort_by(|a, b| b.total.cmp(&a.total));
    users.sort_by(|a, b| b.total.cmp(&a.total));
    kinds.sort_by(|a, b| b.count.cmp(&a.count));

    report.by_neighborhood = hoods;
    report.by_user = users;
    report.by_kind = kinds;
    report
}

fn add_to_group(groups: &mut Vec<GroupTally>, name: &str, tally: StatusTally) {
    match groups.iter_mut().find(|g| g.name == name) {
        Some(group) => {
            group.counts.registered += tally.registered;
            group.counts.en_route += tally.en_route;
            group.counts.finished += tally.finished;
            group.counts.cancelled += tally.cancelled;
        }
        None => groups.push(GroupTally { name: name.to_string(), counts: tally, total: 0 }),
    }
}

/// Build the report for a window, optionally restricted to one user.
pub async fn activity_report(
    db: &DatabaseConnection,
    window: &ReportWindow,
    tz: Tz,
    only_username: Option<&str>,
) -> Result<ActivityReport, ServiceError> {
    let (start, end) = window.bounds(tz)?;

    let mut condition = Condition::all().add(milestone_filter(start, end));
    if let Some(username) = only_username {
        match user::find_by_username(db, username).await? {
            Some(u) => condition = condition.add(service::Column::UserId.eq(u.id)),
            // Unknown user: nothing to count.
            None => return Ok(ActivityReport::default()),
        }
    }

    let rows = service::Entity::find()
        .filter(condition)
        .all(db)
        .await
        .map_err(ServiceError::db)?;

    let usernames = usernames_for(db, rows.iter().map(|m| m.user_id)).await?;
    let facts: Vec<ServiceFacts> = rows
        .into_iter()
        .map(|m| ServiceFacts {
            neighborhood: m.neighborhood,
            username: usernames
                .get(&m.user_id)
                .cloned()
                .unwrap_or_else(|| m.user_id.to_string()),
            kind: m.kind,
            created_at: m.created_at.with_timezone(&Utc),
            en_route_at: m.en_route_at.map(|t| t.with_timezone(&Utc)),
            finished_at: m.finished_at.map(|t| t.with_timezone(&Utc)),
            cancelled_at: m.cancelled_at.map(|t| t.with_timezone(&Utc)),
        })
        .collect();

    Ok(summarize(&facts, start, end))
}

/// Any milestone timestamp inside `[start, end)`.
fn milestone_filter(start: DateTime<Utc>, end: DateTime<Utc>) -> Condition {
    let window = |col: service::Column| {
        Condition::all().add(col.gte(start.fixed_offset())).add(col.lt(end.fixed_offset()))
    };
    Condition::any()
        .add(window(service::Column::CreatedAt))
        .add(window(service::Column::EnRouteAt))
        .add(window(service::Column::FinishedAt))
        .add(window(service::Column::CancelledAt))
}

async fn usernames_for(
    db: &DatabaseConnection,
    ids: impl Iterator<Item = Uuid>,
) -> Result<HashMap<Uuid, String>, ServiceError> {
    let unique: Vec<Uuid> = {
        let mut seen = Vec::new();
        for id in ids {
            if !seen.contains(&id) {
                seen.push(id);
            }
        }
        seen
    };
    if unique.is_empty() {
        return Ok(HashMap::new());
    }
    let users = user::Entity::find()
        .filter(user::Column::Id.is_in(unique))
        .all(db)
        .await
        .map_err(ServiceError::db)?;
    Ok(users.into_iter().map(|u| (u.id, u.username)).collect())
}
