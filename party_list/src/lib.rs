/*!
Seat allocation for party-list elections.

Two voting models are supported:
- closed party list (CPL): ballots select a party and the seats won by a
  party go to its candidates in list order.
- open party list (OPL): ballots select a candidate, the party receives the
  votes of its candidates and its seats go to its most voted candidates.

Seats are distributed between parties with the Hare quota and the largest
remainder method. Ties on the last seats are settled by a uniform lottery
(see [`Tiebreaker`]), which can be seeded to reproduce a result.

```
use party_list::builder::Builder;
use party_list::{run_election, Tiebreaker};
# use party_list::ElectionError;

let batch = "OPL\n2\n5\n3\nGreen, Ann\nGreen, Bob\nBlue, Cid\n1,,\n1,,\n,1,\n,,1\n,,1\n";
let mut builder = Builder::new();
builder.ingest(batch.as_bytes())?;
let outcome = run_election(builder.build()?, &mut Tiebreaker::from_seed(1))?;

let winners: Vec<String> = outcome.winners().iter().map(|w| w.name.clone()).collect();
assert_eq!(winners, vec!["Ann".to_string(), "Cid".to_string()]);
# Ok::<(), ElectionError>(())
```
*/

mod allocation;
mod assignment;
pub mod builder;
mod config;
pub mod manual;
mod tiebreak;

use log::{debug, info};
use rand::Rng;

pub use crate::allocation::{allocate, quota};
pub use crate::config::*;
pub use crate::tiebreak::Tiebreaker;

/// An election after ingestion: the structure and the vote counts, before
/// any seat is allocated.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Election {
    pub(crate) kind: ElectionKind,
    pub(crate) seat_count: u32,
    pub(crate) ballot_count: u64,
    pub(crate) parties: Vec<Party>,
    // candidates[i] are the candidates of parties[i], in declaration order.
    pub(crate) candidates: Vec<Vec<Candidate>>,
}

impl Election {
    pub fn kind(&self) -> ElectionKind {
        self.kind
    }

    pub fn seat_count(&self) -> u32 {
        self.seat_count
    }

    pub fn ballot_count(&self) -> u64 {
        self.ballot_count
    }

    pub fn party_count(&self) -> usize {
        self.parties.len()
    }

    pub fn candidate_count(&self) -> usize {
        self.candidates.iter().map(|c| c.len()).sum()
    }

    pub fn parties(&self) -> &[Party] {
        &self.parties
    }

    pub fn candidates(&self) -> &[Vec<Candidate>] {
        &self.candidates
    }

    pub fn candidate_counts(&self) -> Vec<usize> {
        self.candidates.iter().map(|c| c.len()).collect()
    }

    pub fn votes(&self) -> Vec<u64> {
        self.parties.iter().map(|p| p.votes).collect()
    }
}

/// A seated candidate and the party they represent.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Winner {
    pub name: String,
    pub party: String,
}

/// The final, read-only state of an election.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ElectionOutcome {
    election: Election,
    table: AllocationTable,
}

impl ElectionOutcome {
    /// The election, with the seated flags of the candidates set.
    pub fn election(&self) -> &Election {
        &self.election
    }

    pub fn table(&self) -> &AllocationTable {
        &self.table
    }

    /// Seated candidates, by party then by list position.
    pub fn winners(&self) -> Vec<Winner> {
        let mut res: Vec<Winner> = Vec::new();
        for (party, cands) in self
            .election
            .parties
            .iter()
            .zip(self.election.candidates.iter())
        {
            for c in cands.iter().filter(|c| c.seated) {
                res.push(Winner {
                    name: c.name.clone(),
                    party: party.name.clone(),
                });
            }
        }
        res
    }
}

/// Allocates the seats of an election and seats the candidates.
///
/// Arguments:
/// * `election` the ingested election, see [`builder::Builder`]
/// * `tiebreaker` the lottery for all the ties of this run. Seed it to
///   reproduce a result.
pub fn run_election<R: Rng>(
    election: Election,
    tiebreaker: &mut Tiebreaker<R>,
) -> Result<ElectionOutcome, ElectionError> {
    info!(
        "run_election: {} election: {} seats, {} ballots, {} parties, {} candidates",
        election.kind,
        election.seat_count,
        election.ballot_count,
        election.party_count(),
        election.candidate_count()
    );
    let mut election = election;

    let table = allocate(
        election.seat_count,
        election.ballot_count,
        &election.votes(),
        &election.candidate_counts(),
        tiebreaker,
    )?;
    for (party, row) in election.parties.iter().zip(table.rows.iter()) {
        info!(
            "{:>8} {}: first {}, remainder {}, second {} -> {} seats",
            row.votes,
            party.name,
            row.first_allocation,
            row.remainder,
            row.second_allocation,
            row.total_seats
        );
    }

    match election.kind {
        ElectionKind::Closed => assignment::assign_closed(&table, &mut election.candidates)?,
        ElectionKind::Open => {
            assignment::assign_open(&table, &mut election.candidates, tiebreaker)?
        }
    }
    debug!("run_election: lotteries drawn: {}", tiebreaker.draws());

    let outcome = ElectionOutcome { election, table };
    for w in outcome.winners() {
        info!("elected: {} ({})", w.name, w.party);
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::builder::Builder;
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn build(data: &str) -> Election {
        let mut b = Builder::new();
        b.ingest(data.as_bytes()).unwrap();
        b.build().unwrap()
    }

    const CPL_VOTES_IGNORED: &str = "CPL
3
6
2
Red, Ann, Bob, Cat
Blue, Dan, Eve
1,
1,
1,
1,
,1
,1
";

    #[test]
    fn closed_list_end_to_end() {
        init();
        let e = build(CPL_VOTES_IGNORED);
        let outcome = run_election(e, &mut Tiebreaker::from_seed(3)).unwrap();
        assert_eq!(outcome.table().quota, 2);
        assert_eq!(outcome.table().total_seats(), vec![2, 1]);
        let winners: Vec<(String, String)> = outcome
            .winners()
            .into_iter()
            .map(|w| (w.name, w.party))
            .collect();
        assert_eq!(
            winners,
            vec![
                ("Ann".to_string(), "Red".to_string()),
                ("Bob".to_string(), "Red".to_string()),
                ("Dan".to_string(), "Blue".to_string()),
            ]
        );
    }

    #[test]
    fn reference_closed_election() {
        let data = "CPL
3
9
6
Democratic, Joe, Sally, Ahmed
Republican, Allen, Nikki, Taihui
New Wave, Sarah
Reform, Xinyue, Nikita
Green, Bethany
Independent, Mike
1,,,,,
1,,,,,
,1,,,,
,,,,1,
,,,,,1
,,,1,,
,,,1,,
1,,,,,
,1,,,,
";
        for seed in 0..20 {
            let outcome = run_election(build(data), &mut Tiebreaker::from_seed(seed)).unwrap();
            assert_eq!(outcome.table().total_seats(), vec![1, 1, 0, 1, 0, 0]);
            let names: Vec<String> = outcome.winners().into_iter().map(|w| w.name).collect();
            assert_eq!(names, vec!["Joe", "Allen", "Xinyue"]);
        }
    }

    #[test]
    fn open_list_seats_top_candidates() {
        // Party votes: Democrat 3, Republican 4, Independent1 2. Quota 5.
        let data = "OPL
2
9
6
Democrat, Pike
Democrat, Lucy
Democrat, Beiye
Republican, Etta
Republican, Alawa
Independent1, Sasha
1,,,,,
1,,,,,
,1,,,,
,,,,1,
,,,,1,
,,,1,,
,,,1,,
,,,,,1
,,,,,1
";
        for seed in 0..50 {
            let outcome = run_election(build(data), &mut Tiebreaker::from_seed(seed)).unwrap();
            let t = outcome.table();
            assert_eq!(t.quota, 5);
            assert_eq!(t.total_seats(), vec![1, 1, 0]);
            let e = outcome.election();
            assert!(e.candidates()[0][0].seated);
            assert!(!e.candidates()[0][1].seated);
            // Etta and Alawa tie, exactly one of them is seated.
            let republicans = e.candidates()[1].iter().filter(|c| c.seated).count();
            assert_eq!(republicans, 1);
            assert!(!e.candidates()[2][0].seated);
        }
    }

    #[test]
    fn same_seed_same_outcome() {
        let data = "OPL\n1\n4\n4\nA, w\nA, x\nB, y\nB, z\n1,,,\n,1,,\n,,1,\n,,,1\n";
        let first = run_election(build(data), &mut Tiebreaker::from_seed(77)).unwrap();
        for _ in 0..5 {
            let again = run_election(build(data), &mut Tiebreaker::from_seed(77)).unwrap();
            assert_eq!(first, again);
        }
        assert_eq!(first.winners().len(), 1);
    }

    #[test]
    fn too_few_candidates_fails() {
        let data = "CPL\n3\n2\n2\nRed, Ann\nBlue, Bob\n1,\n,1\n";
        let res = run_election(build(data), &mut Tiebreaker::from_seed(0));
        assert!(matches!(
            res,
            Err(ElectionError::InvariantViolation { .. })
        ));
    }
}
