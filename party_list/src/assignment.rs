use log::debug;
use rand::Rng;

use crate::config::*;
use crate::tiebreak::Tiebreaker;

/// Closed list: every party fills its seats in the order of its list.
pub fn assign_closed(
    table: &AllocationTable,
    candidates: &mut [Vec<Candidate>],
) -> Result<(), ElectionError> {
    for (party_idx, party_candidates) in candidates.iter_mut().enumerate() {
        let seats = seats_for(table, party_idx, party_candidates.len())?;
        for candidate in party_candidates.iter_mut().take(seats) {
            candidate.seated = true;
        }
    }
    Ok(())
}

/// Open list: every party seats its candidates with the most votes. Ties on
/// the last seats of a party go to the lottery.
pub fn assign_open<R: Rng>(
    table: &AllocationTable,
    candidates: &mut [Vec<Candidate>],
    tiebreaker: &mut Tiebreaker<R>,
) -> Result<(), ElectionError> {
    for (party_idx, party_candidates) in candidates.iter_mut().enumerate() {
        let seats = seats_for(table, party_idx, party_candidates.len())?;
        if seats == 0 {
            continue;
        }
        let mut ranking: Vec<usize> = (0..party_candidates.len()).collect();
        ranking.sort_by(|a, b| party_candidates[*b].votes.cmp(&party_candidates[*a].votes));
        let keys: Vec<u64> = ranking.iter().map(|idx| party_candidates[*idx].votes).collect();
        debug!(
            "assign_open: party {}: {} seats, ranking {:?} {:?}",
            party_idx, seats, ranking, keys
        );
        for pos in tiebreaker.fill_cutoff(&keys, seats)? {
            party_candidates[ranking[pos]].seated = true;
        }
    }
    Ok(())
}

fn seats_for(
    table: &AllocationTable,
    party_idx: usize,
    num_candidates: usize,
) -> Result<usize, ElectionError> {
    let row = table
        .rows
        .get(party_idx)
        .ok_or_else(|| ElectionError::InvalidArgument {
            message: format!("no allocation for party #{}", party_idx),
        })?;
    let seats = row.total_seats as usize;
    if seats > num_candidates {
        return Err(ElectionError::InvariantViolation {
            message: format!(
                "party #{} won {} seats with {} candidates",
                party_idx, seats, num_candidates
            ),
        });
    }
    Ok(seats)
}
