use log::{debug, info};
use rand::Rng;

use crate::config::*;
use crate::tiebreak::Tiebreaker;

/// Hare quota, rounded up. Zero when there are no ballots.
pub fn quota(ballot_count: u64, seat_count: u32) -> u64 {
    if seat_count == 0 {
        return 0;
    }
    let seats = seat_count as u64;
    ballot_count / seats + u64::from(ballot_count % seats != 0)
}

/// Runs the largest remainder method.
///
/// Arguments:
/// * `seat_count` the number of seats to fill
/// * `ballot_count` the number of ballots cast, used for the quota
/// * `votes` the votes of every party
/// * `candidate_counts` the number of candidates of every party, in the same
///   order as `votes`. A party never receives more seats than it has
///   candidates.
/// * `tiebreaker` the lottery used when parties tie on the last seats
pub fn allocate<R: Rng>(
    seat_count: u32,
    ballot_count: u64,
    votes: &[u64],
    candidate_counts: &[usize],
    tiebreaker: &mut Tiebreaker<R>,
) -> Result<AllocationTable, ElectionError> {
    if votes.len() != candidate_counts.len() {
        return Err(ElectionError::InvalidArgument {
            message: format!(
                "{} vote counts for {} parties",
                votes.len(),
                candidate_counts.len()
            ),
        });
    }
    if seat_count == 0 {
        return Err(ElectionError::InvalidArgument {
            message: "the election has no seat to fill".to_string(),
        });
    }
    let available: u64 = candidate_counts.iter().map(|c| *c as u64).sum();
    if available < seat_count as u64 {
        return Err(ElectionError::InvariantViolation {
            message: format!(
                "{} seats but only {} candidates in total",
                seat_count, available
            ),
        });
    }

    let quota = quota(ballot_count, seat_count);
    info!(
        "allocate: quota: ceil({} / {}) = {}",
        ballot_count, seat_count, quota
    );

    let mut rows: Vec<PartyAllocation> = votes
        .iter()
        .map(|v| PartyAllocation {
            votes: *v,
            remainder: *v,
            ..Default::default()
        })
        .collect();
    // Parties that can still receive a seat.
    let mut open: Vec<bool> = candidate_counts.iter().map(|c| *c > 0).collect();

    if quota > 0 {
        for (idx, row) in rows.iter_mut().enumerate() {
            let cap = candidate_counts[idx] as u64;
            let floor = row.votes / quota;
            if floor >= cap {
                open[idx] = false;
            }
            row.first_allocation = floor.min(cap) as u32;
            row.remainder = row.votes - row.first_allocation as u64 * quota;
        }
    }

    let first_total: u64 = rows.iter().map(|r| r.first_allocation as u64).sum();
    if first_total > seat_count as u64 {
        return Err(ElectionError::InvariantViolation {
            message: format!(
                "first allocation hands out {} seats out of {}: votes exceed ballots",
                first_total, seat_count
            ),
        });
    }
    let mut remaining = seat_count - first_total as u32;
    debug!(
        "allocate: first allocation: {:?}, remaining seats: {}",
        rows.iter().map(|r| r.first_allocation).collect::<Vec<_>>(),
        remaining
    );

    // Hand out whole rounds while every open party can get one more seat.
    loop {
        let open_count = open.iter().filter(|o| **o).count() as u32;
        if open_count == 0 || remaining < open_count {
            break;
        }
        for (idx, row) in rows.iter_mut().enumerate() {
            if !open[idx] {
                continue;
            }
            row.second_allocation += 1;
            remaining -= 1;
            if (row.first_allocation + row.second_allocation) as usize >= candidate_counts[idx] {
                open[idx] = false;
            }
        }
        debug!(
            "allocate: full round granted to {} parties, remaining seats: {}",
            open_count, remaining
        );
    }

    if remaining > 0 {
        // Stable sort: equal remainders keep their declaration order.
        let mut ranking: Vec<usize> = (0..rows.len()).filter(|idx| open[*idx]).collect();
        if ranking.is_empty() {
            return Err(ElectionError::InvariantViolation {
                message: format!("{} seats left but no party has candidates left", remaining),
            });
        }
        ranking.sort_by(|a, b| rows[*b].remainder.cmp(&rows[*a].remainder));
        let keys: Vec<u64> = ranking.iter().map(|idx| rows[*idx].remainder).collect();
        debug!("allocate: remainder ranking: {:?} {:?}", ranking, keys);

        let winners = tiebreaker.fill_cutoff(&keys, remaining as usize)?;
        for pos in winners {
            rows[ranking[pos]].second_allocation += 1;
        }
    }

    for row in rows.iter_mut() {
        row.total_seats = row.first_allocation + row.second_allocation;
    }
    let table = AllocationTable { quota, rows };
    debug_assert_eq!(table.seats_allocated(), seat_count);
    Ok(table)
}
