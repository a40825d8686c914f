use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use super::booking::BookingStatus;
use super::calendar::{nights_between, overlaps_inclusive_block, ranges_overlap};
use super::{Conflict, DomainError, StayBound};

/// The property attributes the checker needs; read-only snapshot of the
/// catalog row.
#[derive(Debug, Clone, Copy)]
pub struct PropertyRules {
    pub min_nights: i32,
    pub max_nights: i32,
    pub max_guests: i32,
}

#[derive(Debug, Clone, Copy)]
pub struct StayRequest {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub num_guests: i32,
}

/// An already-persisted booking, as far as the overlap check cares.
#[derive(Debug, Clone)]
pub struct ExistingStay {
    pub id: Uuid,
    pub reference: String,
    pub status: BookingStatus,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

/// An administrator-declared unavailable range; end date inclusive.
#[derive(Debug, Clone)]
pub struct OwnerBlock {
    pub id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Decide admissibility of a candidate stay against policy, capacity,
/// live bookings and owner blocks. Cancelled, completed and no-show
/// bookings impose no constraint. Ok(()) means bookable; the error
/// names every conflicting entity so the caller can tell the guest
/// exactly what collided.
pub fn check_availability(
    rules: &PropertyRules,
    request: &StayRequest,
    existing: &[ExistingStay],
    blocks: &[OwnerBlock],
) -> Result<(), DomainError> {
    let nights = nights_between(request.check_in, request.check_out)?;

    if nights < i64::from(rules.min_nights) {
        return Err(DomainError::PolicyViolation {
            bound: StayBound::MinNights,
            nights,
            limit: rules.min_nights,
        });
    }
    if nights > i64::from(rules.max_nights) {
        return Err(DomainError::PolicyViolation {
            bound: StayBound::MaxNights,
            nights,
            limit: rules.max_nights,
        });
    }
    if request.num_guests > rules.max_guests {
        return Err(DomainError::Capacity {
            requested: request.num_guests,
            max_guests: rules.max_guests,
        });
    }

    let mut conflicts = Vec::new();
    for stay in existing {
        if !stay.status.blocks_availability() {
            continue;
        }
        if ranges_overlap(
            request.check_in,
            request.check_out,
            stay.check_in,
            stay.check_out,
        ) {
            conflicts.push(Conflict::Booking {
                id: stay.id,
                reference: stay.reference.clone(),
                check_in: stay.check_in,
                check_out: stay.check_out,
            });
        }
    }
    for block in blocks {
        if overlaps_inclusive_block(
            request.check_in,
            request.check_out,
            block.start_date,
            block.end_date,
        ) {
            conflicts.push(Conflict::Block {
                id: block.id,
                start_date: block.start_date,
                end_date: block.end_date,
            });
        }
    }

    if !conflicts.is_empty() {
        return Err(DomainError::AvailabilityConflict { conflicts });
    }
    Ok(())
}

/// What a calendar probe renders: taken dates are an answer, not a
/// failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailabilityReport {
    pub available: bool,
    pub conflicts: Vec<Conflict>,
}

/// Report form of [`check_availability`]. Overlaps become an
/// `available: false` report with the colliding entries; malformed
/// ranges, policy violations and over-capacity requests stay errors.
pub fn availability_report(
    rules: &PropertyRules,
    request: &StayRequest,
    existing: &[ExistingStay],
    blocks: &[OwnerBlock],
) -> Result<AvailabilityReport, DomainError> {
    match check_availability(rules, request, existing, blocks) {
        Ok(()) => Ok(AvailabilityReport {
            available: true,
            conflicts: Vec::new(),
        }),
        Err(DomainError::AvailabilityConflict { conflicts }) => Ok(AvailabilityReport {
            available: false,
            conflicts,
        }),
        Err(other) => Err(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn rules() -> PropertyRules {
        PropertyRules {
            min_nights: 2,
            max_nights: 14,
            max_guests: 4,
        }
    }

    fn request(check_in: NaiveDate, check_out: NaiveDate) -> StayRequest {
        StayRequest {
            check_in,
            check_out,
            num_guests: 2,
        }
    }

    fn stay(status: BookingStatus, check_in: NaiveDate, check_out: NaiveDate) -> ExistingStay {
        ExistingStay {
            id: Uuid::new_v4(),
            reference: "VR-TEST0001".to_string(),
            status,
            check_in,
            check_out,
        }
    }

    #[test]
    fn overlapping_live_booking_is_reported_as_conflict() {
        // booking A holds [Jul 1, Jul 5); request [Jul 4, Jul 8)
        let existing = vec![stay(
            BookingStatus::Confirmed,
            d(2026, 7, 1),
            d(2026, 7, 5),
        )];
        let err = check_availability(
            &rules(),
            &request(d(2026, 7, 4), d(2026, 7, 8)),
            &existing,
            &[],
        )
        .unwrap_err();
        match err {
            DomainError::AvailabilityConflict { conflicts } => {
                assert_eq!(conflicts.len(), 1);
                assert!(matches!(
                    &conflicts[0],
                    Conflict::Booking { id, .. } if *id == existing[0].id
                ));
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn finished_and_abandoned_bookings_do_not_block() {
        for status in [
            BookingStatus::Cancelled,
            BookingStatus::Completed,
            BookingStatus::NoShow,
        ] {
            let existing = vec![stay(status, d(2026, 7, 1), d(2026, 7, 5))];
            assert!(
                check_availability(
                    &rules(),
                    &request(d(2026, 7, 4), d(2026, 7, 8)),
                    &existing,
                    &[],
                )
                .is_ok(),
                "{status} should not block"
            );
        }
    }

    #[test]
    fn pending_bookings_block_like_confirmed() {
        let existing = vec![stay(BookingStatus::Pending, d(2026, 7, 1), d(2026, 7, 5))];
        assert!(check_availability(
            &rules(),
            &request(d(2026, 7, 4), d(2026, 7, 8)),
            &existing,
            &[],
        )
        .is_err());
    }

    #[test]
    fn stay_policy_bounds_are_enforced() {
        let err = check_availability(&rules(), &request(d(2026, 7, 1), d(2026, 7, 2)), &[], &[])
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::PolicyViolation {
                bound: StayBound::MinNights,
                nights: 1,
                limit: 2,
            }
        );

        let err = check_availability(&rules(), &request(d(2026, 7, 1), d(2026, 7, 20)), &[], &[])
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::PolicyViolation {
                bound: StayBound::MaxNights,
                nights: 19,
                limit: 14,
            }
        );
    }

    #[test]
    fn guest_count_above_capacity_is_rejected() {
        let mut req = request(d(2026, 7, 1), d(2026, 7, 5));
        req.num_guests = 5;
        assert_eq!(
            check_availability(&rules(), &req, &[], &[]).unwrap_err(),
            DomainError::Capacity {
                requested: 5,
                max_guests: 4,
            }
        );
    }

    #[test]
    fn inverted_range_fails_before_policy_checks() {
        assert!(matches!(
            check_availability(&rules(), &request(d(2026, 7, 5), d(2026, 7, 1)), &[], &[]),
            Err(DomainError::InvalidRange { .. })
        ));
    }

    #[test]
    fn adding_and_removing_a_block_flips_availability() {
        let req = request(d(2026, 7, 10), d(2026, 7, 14));
        assert!(check_availability(&rules(), &req, &[], &[]).is_ok());

        let block = OwnerBlock {
            id: Uuid::new_v4(),
            start_date: d(2026, 7, 12),
            end_date: d(2026, 7, 12),
        };
        let err = check_availability(&rules(), &req, &[], std::slice::from_ref(&block))
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::AvailabilityConflict { ref conflicts }
                if conflicts == &[Conflict::Block {
                    id: block.id,
                    start_date: block.start_date,
                    end_date: block.end_date,
                }]
        ));

        // removing the block restores availability
        assert!(check_availability(&rules(), &req, &[], &[]).is_ok());
    }

    #[test]
    fn report_downgrades_overlaps_but_not_policy_errors() {
        let existing = vec![stay(
            BookingStatus::Confirmed,
            d(2026, 7, 1),
            d(2026, 7, 5),
        )];

        let report = availability_report(
            &rules(),
            &request(d(2026, 7, 4), d(2026, 7, 8)),
            &existing,
            &[],
        )
        .unwrap();
        assert!(!report.available);
        assert_eq!(report.conflicts.len(), 1);

        let report =
            availability_report(&rules(), &request(d(2026, 7, 10), d(2026, 7, 14)), &[], &[])
                .unwrap();
        assert!(report.available);
        assert!(report.conflicts.is_empty());

        // one-night stay under the two-night minimum is still an error
        assert!(matches!(
            availability_report(&rules(), &request(d(2026, 7, 1), d(2026, 7, 2)), &[], &[]),
            Err(DomainError::PolicyViolation { .. })
        ));
    }

    #[test]
    fn multiple_conflicts_are_all_reported() {
        let existing = vec![
            stay(BookingStatus::Pending, d(2026, 7, 1), d(2026, 7, 5)),
            stay(BookingStatus::Confirmed, d(2026, 7, 6), d(2026, 7, 9)),
        ];
        let blocks = vec![OwnerBlock {
            id: Uuid::new_v4(),
            start_date: d(2026, 7, 5),
            end_date: d(2026, 7, 5),
        }];
        let err = check_availability(
            &rules(),
            &request(d(2026, 7, 3), d(2026, 7, 8)),
            &existing,
            &blocks,
        )
        .unwrap_err();
        match err {
            DomainError::AvailabilityConflict { conflicts } => {
                assert_eq!(conflicts.len(), 3)
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }
}
