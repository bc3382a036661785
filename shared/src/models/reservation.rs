//! Reservation Model
//!
//! A reservation books one dining table for a half-open time slot
//! `[start, end)` on a given date. Only confirmed reservations block a
//! table; pending requests may overlap each other until staff confirm one.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, ErrorCode};

/// Reservation lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
    NoShow,
}

impl ReservationStatus {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "confirmed" => Some(Self::Confirmed),
            "cancelled" => Some(Self::Cancelled),
            "completed" => Some(Self::Completed),
            "no_show" => Some(Self::NoShow),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
            Self::NoShow => "no_show",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed | Self::NoShow)
    }

    /// Allowed status moves
    pub fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Confirmed)
                | (Self::Pending, Self::Cancelled)
                | (Self::Confirmed, Self::Completed)
                | (Self::Confirmed, Self::Cancelled)
                | (Self::Confirmed, Self::NoShow)
        )
    }

    /// Whether a reservation in this status occupies its table
    pub fn blocks_table(&self) -> bool {
        matches!(self, Self::Confirmed)
    }
}

/// Half-open time interval `[start, end)` within one day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlot {
    start: NaiveTime,
    end: NaiveTime,
}

impl TimeSlot {
    /// Fails with `InvalidTimeSlot` unless `end > start`
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, AppError> {
        if end <= start {
            return Err(AppError::new(ErrorCode::InvalidTimeSlot)
                .with_detail("start_time", start.to_string())
                .with_detail("end_time", end.to_string()));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    /// Touching slots (`a.end == b.start`) do not overlap.
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Existing booking considered by the conflict check
#[derive(Debug, Clone, Copy)]
pub struct BookedSlot {
    pub reservation_id: i64,
    pub status: ReservationStatus,
    pub slot: TimeSlot,
}

/// First booking that blocks `candidate`, skipping `exclude_id` (the
/// reservation being edited) and anything not confirmed.
///
/// Callers pass bookings for the same table and date only.
pub fn find_conflict<'a>(
    candidate: &TimeSlot,
    existing: &'a [BookedSlot],
    exclude_id: Option<i64>,
) -> Option<&'a BookedSlot> {
    existing.iter().find(|b| {
        Some(b.reservation_id) != exclude_id
            && b.status.blocks_table()
            && b.slot.overlaps(candidate)
    })
}

/// Reservation entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Reservation {
    pub id: i64,
    pub company_id: String,
    pub table_id: i64,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub party_size: i32,
    pub reservation_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create reservation payload (dashboard and public storefront)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReservationCreate {
    pub table_id: i64,
    #[validate(length(min = 1, max = 120))]
    pub customer_name: String,
    #[validate(email)]
    pub customer_email: Option<String>,
    #[validate(length(max = 40))]
    pub customer_phone: Option<String>,
    #[validate(range(min = 1, max = 100))]
    pub party_size: i32,
    pub reservation_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

/// Update reservation payload
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ReservationUpdate {
    pub table_id: Option<i64>,
    #[validate(length(min = 1, max = 120))]
    pub customer_name: Option<String>,
    #[validate(email)]
    pub customer_email: Option<String>,
    #[validate(length(max = 40))]
    pub customer_phone: Option<String>,
    #[validate(range(min = 1, max = 100))]
    pub party_size: Option<i32>,
    pub reservation_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

/// Status change payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationStatusUpdate {
    pub status: ReservationStatus,
}

/// List filter (`GET /api/reservations?date=...&status=...&table_id=...`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReservationFilter {
    pub date: Option<NaiveDate>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub status: Option<ReservationStatus>,
    pub table_id: Option<i64>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn slot(a: (u32, u32), b: (u32, u32)) -> TimeSlot {
        TimeSlot::new(t(a.0, a.1), t(b.0, b.1)).unwrap()
    }

    fn booked(id: i64, status: ReservationStatus, s: TimeSlot) -> BookedSlot {
        BookedSlot {
            reservation_id: id,
            status,
            slot: s,
        }
    }

    #[test]
    fn test_slot_rejects_empty_and_inverted() {
        let err = TimeSlot::new(t(19, 0), t(19, 0)).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTimeSlot);
        assert!(TimeSlot::new(t(20, 0), t(19, 0)).is_err());
    }

    #[test]
    fn test_overlap_semantics() {
        let dinner = slot((19, 0), (21, 0));
        // partial overlap on either side
        assert!(dinner.overlaps(&slot((18, 0), (19, 30))));
        assert!(dinner.overlaps(&slot((20, 30), (22, 0))));
        // containment both ways
        assert!(dinner.overlaps(&slot((19, 30), (20, 0))));
        assert!(slot((19, 30), (20, 0)).overlaps(&dinner));
        // identical
        assert!(dinner.overlaps(&dinner));
        // touching edges are free
        assert!(!dinner.overlaps(&slot((21, 0), (22, 0))));
        assert!(!dinner.overlaps(&slot((17, 0), (19, 0))));
        // disjoint
        assert!(!dinner.overlaps(&slot((12, 0), (14, 0))));
    }

    #[test]
    fn test_conflict_only_with_confirmed() {
        let existing = [
            booked(1, ReservationStatus::Pending, slot((19, 0), (21, 0))),
            booked(2, ReservationStatus::Cancelled, slot((19, 0), (21, 0))),
            booked(3, ReservationStatus::Completed, slot((19, 0), (21, 0))),
            booked(4, ReservationStatus::NoShow, slot((19, 0), (21, 0))),
        ];
        assert!(find_conflict(&slot((19, 30), (20, 30)), &existing, None).is_none());

        let existing = [booked(5, ReservationStatus::Confirmed, slot((19, 0), (21, 0)))];
        let hit = find_conflict(&slot((20, 0), (22, 0)), &existing, None).unwrap();
        assert_eq!(hit.reservation_id, 5);
    }

    #[test]
    fn test_conflict_excludes_self() {
        let existing = [booked(9, ReservationStatus::Confirmed, slot((19, 0), (21, 0)))];
        assert!(find_conflict(&slot((19, 30), (21, 30)), &existing, Some(9)).is_none());
        assert!(find_conflict(&slot((19, 30), (21, 30)), &existing, Some(10)).is_some());
    }

    #[test]
    fn test_back_to_back_bookings_allowed() {
        let existing = [
            booked(1, ReservationStatus::Confirmed, slot((18, 0), (19, 0))),
            booked(2, ReservationStatus::Confirmed, slot((21, 0), (22, 0))),
        ];
        assert!(find_conflict(&slot((19, 0), (21, 0)), &existing, None).is_none());
    }

    #[test]
    fn test_status_transitions() {
        use ReservationStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Completed));
        assert!(Confirmed.can_transition_to(NoShow));
        assert!(!Cancelled.can_transition_to(Confirmed));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(Cancelled.is_terminal());
        assert!(!Confirmed.is_terminal());
    }

    #[test]
    fn test_status_db_round_trip() {
        use ReservationStatus::*;
        for s in [Pending, Confirmed, Cancelled, Completed, NoShow] {
            assert_eq!(ReservationStatus::from_db(s.as_db()), Some(s));
        }
        assert_eq!(
            serde_json::to_string(&NoShow).unwrap(),
            "\"no_show\""
        );
    }

    #[test]
    fn test_create_validation() {
        let payload = ReservationCreate {
            table_id: 1,
            customer_name: String::new(),
            customer_email: Some("not-an-email".into()),
            customer_phone: None,
            party_size: 0,
            reservation_date: NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
            start_time: t(19, 0),
            end_time: t(21, 0),
            notes: None,
        };
        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("customer_name"));
        assert!(fields.contains_key("customer_email"));
        assert!(fields.contains_key("party_size"));
    }
}
