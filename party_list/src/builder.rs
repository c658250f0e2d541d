use log::{debug, info};

use std::collections::HashMap;
use std::io::BufRead;
use std::str::FromStr;

pub use crate::config::*;
use crate::Election;

/// Reads ballot files into an election.
///
/// Every batch starts with the same header: the election kind, the number of
/// seats, the number of ballots in the batch and the number of structure
/// lines. The structure (parties and candidates) is taken from the first
/// batch. Later batches must declare the same structure, which is skipped,
/// and only add their ballots.
///
/// ```
/// use party_list::builder::Builder;
/// # use party_list::ElectionError;
///
/// let batch = "CPL\n1\n3\n2\nRed, Ann, Bob\nBlue, Cid\n1,\n,1\n1,\n";
/// let mut builder = Builder::new();
/// builder.ingest(batch.as_bytes())?;
/// let election = builder.build()?;
/// assert_eq!(election.ballot_count(), 3);
/// assert_eq!(election.parties()[0].votes, 2);
///
/// # Ok::<(), ElectionError>(())
/// ```
#[derive(Debug, Default)]
pub struct Builder {
    kind: Option<ElectionKind>,
    seat_count: u32,
    ballot_count: u64,
    entity_count: usize,
    batches: usize,
    parties: Vec<Party>,
    candidates: Vec<Vec<Candidate>>,
    // Open lists only: ballot position -> (party, candidate in party).
    slots: Vec<(usize, usize)>,
    // Accumulated marks per ballot position.
    tally: Vec<u64>,
    failed: bool,
}

// Parties and candidates declared by the first batch.
struct Structure {
    parties: Vec<Party>,
    candidates: Vec<Vec<Candidate>>,
    slots: Vec<(usize, usize)>,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    /// The number of batches read so far.
    pub fn batches(&self) -> usize {
        self.batches
    }

    /// Reads one batch. The source must be positioned at the kind marker.
    ///
    /// Returns the number of ballots in this batch. A batch is taken whole or
    /// not at all: after a failed batch, the builder refuses further batches
    /// and `build` fails.
    pub fn ingest<B: BufRead>(&mut self, source: B) -> Result<u64, ElectionError> {
        if self.failed {
            return Err(ElectionError::InvalidArgument {
                message: "a previous batch failed, ingestion cannot resume".to_string(),
            });
        }
        let res = self.ingest_batch(source);
        if res.is_err() {
            self.failed = true;
        }
        res
    }

    fn ingest_batch<B: BufRead>(&mut self, source: B) -> Result<u64, ElectionError> {
        let mut lines = LineReader::new(source);
        let kind = ElectionKind::from_marker(&lines.next_line("the election type")?);
        let seat_count: u32 = lines.next_number("the number of seats")?;
        let batch_ballots: u64 = lines.next_number("the number of ballots")?;
        let entity_count: usize = lines.next_number(match kind {
            ElectionKind::Closed => "the number of parties",
            ElectionKind::Open => "the number of candidates",
        })?;
        info!(
            "ingest: batch #{}: {} election, {} seats, {} ballots, {} entries",
            self.batches + 1,
            kind,
            seat_count,
            batch_ballots,
            entity_count
        );

        let structure: Option<Structure> = match self.kind {
            None => {
                if seat_count == 0 {
                    return Err(ElectionError::parse(2, "the number of seats must be positive"));
                }
                Some(match kind {
                    ElectionKind::Closed => read_closed_structure(&mut lines, entity_count)?,
                    ElectionKind::Open => read_open_structure(&mut lines, entity_count)?,
                })
            }
            Some(known) => {
                if known != kind || self.seat_count != seat_count || self.entity_count != entity_count
                {
                    return Err(ElectionError::parse(
                        4,
                        format!(
                            "batch declares a {} election with {} seats and {} entries, expected {} with {} seats and {} entries",
                            kind, seat_count, entity_count, known, self.seat_count, self.entity_count
                        ),
                    ));
                }
                for _ in 0..entity_count {
                    lines.next_line("a structure line")?;
                }
                debug!("ingest: skipped {} structure lines", entity_count);
                None
            }
        };

        let mut batch_tally: Vec<u64> = vec![0; entity_count];
        tally_votes(&mut lines, &mut batch_tally, batch_ballots)?;

        // Nothing is committed before the whole batch has been read.
        match structure {
            Some(s) => {
                self.kind = Some(kind);
                self.seat_count = seat_count;
                self.entity_count = entity_count;
                self.parties = s.parties;
                self.candidates = s.candidates;
                self.slots = s.slots;
                self.tally = batch_tally;
            }
            None => {
                for (total, votes) in self.tally.iter_mut().zip(batch_tally.iter()) {
                    *total += *votes;
                }
            }
        }
        self.ballot_count += batch_ballots;
        self.batches += 1;
        debug!("ingest: tally after batch: {:?}", self.tally);
        Ok(batch_ballots)
    }

    /// Closes the ingestion and distributes the tallies.
    pub fn build(self) -> Result<Election, ElectionError> {
        if self.failed {
            return Err(ElectionError::InvalidArgument {
                message: "a batch failed, the election is incomplete".to_string(),
            });
        }
        let kind = self.kind.ok_or_else(|| ElectionError::parse(0, "no ballot data"))?;
        let mut parties = self.parties;
        let mut candidates = self.candidates;
        match kind {
            ElectionKind::Closed => {
                for (party, votes) in parties.iter_mut().zip(self.tally.iter()) {
                    party.votes = *votes;
                }
            }
            ElectionKind::Open => {
                for ((party_idx, cand_idx), votes) in self.slots.iter().zip(self.tally.iter()) {
                    candidates[*party_idx][*cand_idx].votes = *votes;
                }
                for (party, party_candidates) in parties.iter_mut().zip(candidates.iter()) {
                    party.votes = party_candidates.iter().map(|c| c.votes).sum();
                }
            }
        }
        Ok(Election {
            kind,
            seat_count: self.seat_count,
            ballot_count: self.ballot_count,
            parties,
            candidates,
        })
    }
}

// `Party, Candidate 1, Candidate 2, ...`
fn read_closed_structure<B: BufRead>(
    lines: &mut LineReader<B>,
    entity_count: usize,
) -> Result<Structure, ElectionError> {
    let mut parties: Vec<Party> = Vec::new();
    let mut candidates: Vec<Vec<Candidate>> = Vec::new();
    for _ in 0..entity_count {
        let line = lines.next_line("a party line")?;
        let mut fields = split_fields(&line);
        let party_name = fields
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ElectionError::parse(lines.lineno, "missing party name"))?;
        parties.push(Party::new(party_name));
        candidates.push(
            fields
                .filter(|s| !s.is_empty())
                .map(Candidate::new)
                .collect(),
        );
    }
    Ok(Structure {
        parties,
        candidates,
        slots: Vec::new(),
    })
}

// `Party, Candidate`, parties discovered in order of first appearance.
fn read_open_structure<B: BufRead>(
    lines: &mut LineReader<B>,
    entity_count: usize,
) -> Result<Structure, ElectionError> {
    let mut parties: Vec<Party> = Vec::new();
    let mut candidates: Vec<Vec<Candidate>> = Vec::new();
    let mut slots: Vec<(usize, usize)> = Vec::new();
    let mut party_index: HashMap<String, usize> = HashMap::new();
    for _ in 0..entity_count {
        let line = lines.next_line("a candidate line")?;
        let fields: Vec<&str> = split_fields(&line).collect();
        let (party_name, candidate_name) = match fields.as_slice() {
            [p, c] if !p.is_empty() && !c.is_empty() => (*p, *c),
            _ => {
                return Err(ElectionError::parse(
                    lines.lineno,
                    format!("expected `party, candidate`, got {:?}", line),
                ))
            }
        };
        let party_idx = *party_index
            .entry(party_name.to_string())
            .or_insert_with(|| {
                parties.push(Party::new(party_name));
                candidates.push(Vec::new());
                parties.len() - 1
            });
        candidates[party_idx].push(Candidate::new(candidate_name));
        slots.push((party_idx, candidates[party_idx].len() - 1));
    }
    Ok(Structure {
        parties,
        candidates,
        slots,
    })
}

fn split_fields(line: &str) -> impl Iterator<Item = &str> {
    line.split(',').map(|s| s.trim())
}

/// Reads `ballot_count` ballots, adding one vote per ballot to `tally`.
fn tally_votes<B: BufRead>(
    lines: &mut LineReader<B>,
    tally: &mut [u64],
    ballot_count: u64,
) -> Result<(), ElectionError> {
    for _ in 0..ballot_count {
        let line = lines.next_line("a ballot")?;
        let idx = read_ballot(&line, tally.len(), lines.lineno)?;
        tally[idx] += 1;
    }
    Ok(())
}

/// Finds the position of the single mark on a ballot line.
///
/// A ballot is a comma-separated list of flags. A flag is either empty or
/// `0` (not chosen) or `1` (chosen). The position of the mark is the number
/// of commas before it.
pub fn read_ballot(line: &str, votable_count: usize, lineno: usize) -> Result<usize, ElectionError> {
    let mut marked: Option<usize> = None;
    let mut marks = 0;
    for (idx, flag) in split_fields(line).enumerate() {
        match flag {
            "" | "0" => {}
            "1" => {
                marks += 1;
                marked = Some(idx);
            }
            _ => {
                return Err(ElectionError::parse(
                    lineno,
                    format!("unexpected flag {:?} in ballot", flag),
                ))
            }
        }
    }
    match marked {
        Some(idx) if marks == 1 && idx < votable_count => Ok(idx),
        Some(idx) if marks == 1 => Err(ElectionError::parse(
            lineno,
            format!(
                "ballot marks choice #{} but there are only {} choices",
                idx + 1,
                votable_count
            ),
        )),
        _ => Err(ElectionError::SpoiledBallot {
            lineno,
            marks,
            line: line.to_string(),
        }),
    }
}

struct LineReader<B> {
    inner: std::io::Lines<B>,
    lineno: usize,
}

impl<B: BufRead> LineReader<B> {
    fn new(source: B) -> Self {
        LineReader {
            inner: source.lines(),
            lineno: 0,
        }
    }

    fn next_line(&mut self, expected: &str) -> Result<String, ElectionError> {
        self.lineno += 1;
        match self.inner.next() {
            Some(Ok(line)) => Ok(line),
            Some(Err(source)) => Err(ElectionError::Io {
                lineno: self.lineno,
                source,
            }),
            None => Err(ElectionError::parse(
                self.lineno,
                format!("unexpected end of input, expected {}", expected),
            )),
        }
    }

    fn next_number<T: FromStr>(&mut self, expected: &str) -> Result<T, ElectionError> {
        let line = self.next_line(expected)?;
        line.trim().parse::<T>().map_err(|_| {
            ElectionError::parse(
                self.lineno,
                format!("expected {}, got {:?}", expected, line),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CPL_EXAMPLE: &str = "CPL
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

    const OPL_EXAMPLE: &str = "OPL
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

    fn names(c: &[Candidate]) -> Vec<&str> {
        c.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn closed_list_batch() {
        let mut b = Builder::new();
        assert_eq!(b.ingest(CPL_EXAMPLE.as_bytes()).unwrap(), 9);
        let e = b.build().unwrap();
        assert_eq!(e.kind(), ElectionKind::Closed);
        assert_eq!(e.seat_count(), 3);
        assert_eq!(e.ballot_count(), 9);
        assert_eq!(e.party_count(), 6);
        assert_eq!(e.candidate_count(), 11);
        let votes: Vec<u64> = e.parties().iter().map(|p| p.votes).collect();
        assert_eq!(votes, vec![3, 2, 0, 2, 1, 1]);
        assert_eq!(e.parties()[2].name, "New Wave");
        assert!(e.parties()[5].independent);
        assert!(!e.parties()[0].independent);
        assert_eq!(names(&e.candidates()[0]), vec!["Joe", "Sally", "Ahmed"]);
        assert_eq!(names(&e.candidates()[3]), vec!["Xinyue", "Nikita"]);
        assert_eq!(e.candidate_counts(), vec![3, 3, 1, 2, 1, 1]);
    }

    #[test]
    fn open_list_batch() {
        let mut b = Builder::new();
        b.ingest(OPL_EXAMPLE.as_bytes()).unwrap();
        let e = b.build().unwrap();
        assert_eq!(e.kind(), ElectionKind::Open);
        assert_eq!(e.party_count(), 3);
        assert_eq!(e.candidate_count(), 6);
        let cand_votes: Vec<Vec<u64>> = e
            .candidates()
            .iter()
            .map(|cs| cs.iter().map(|c| c.votes).collect())
            .collect();
        assert_eq!(cand_votes, vec![vec![2, 1, 0], vec![2, 2], vec![2]]);
        let votes: Vec<u64> = e.parties().iter().map(|p| p.votes).collect();
        assert_eq!(votes, vec![3, 4, 2]);
        assert_eq!(names(&e.candidates()[1]), vec!["Etta", "Alawa"]);
        assert!(e.parties()[2].independent);
    }

    #[test]
    fn open_list_interleaved_parties() {
        let data = "OPL\n1\n3\n3\nA, x\nB, y\nA, z\n,,1\n1,,\n,,1\n";
        let mut b = Builder::new();
        b.ingest(data.as_bytes()).unwrap();
        let e = b.build().unwrap();
        let party_names: Vec<&str> = e.parties().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(party_names, vec!["A", "B"]);
        assert_eq!(names(&e.candidates()[0]), vec!["x", "z"]);
        assert_eq!(e.candidates()[0][1].votes, 2);
        for (party, cands) in e.parties().iter().zip(e.candidates().iter()) {
            assert_eq!(party.votes, cands.iter().map(|c| c.votes).sum::<u64>());
        }
    }

    #[test]
    fn two_batches_accumulate() {
        let mut b = Builder::new();
        b.ingest(CPL_EXAMPLE.as_bytes()).unwrap();
        let second = "CPL\n3\n2\n6\nignored\nignored\nignored\nignored\nignored\nignored\n,,1,,,\n,,1,,,\n";
        assert_eq!(b.ingest(second.as_bytes()).unwrap(), 2);
        assert_eq!(b.batches(), 2);
        let e = b.build().unwrap();
        assert_eq!(e.ballot_count(), 11);
        assert_eq!(e.party_count(), 6);
        assert_eq!(e.parties()[0].name, "Democratic");
        let votes: Vec<u64> = e.parties().iter().map(|p| p.votes).collect();
        assert_eq!(votes, vec![3, 2, 2, 2, 1, 1]);
    }

    #[test]
    fn inconsistent_batch() {
        let mut b = Builder::new();
        b.ingest(CPL_EXAMPLE.as_bytes()).unwrap();
        let other = OPL_EXAMPLE.as_bytes();
        assert!(matches!(
            b.ingest(other),
            Err(ElectionError::Parse { lineno: 4, .. })
        ));
    }

    #[test]
    fn bad_header() {
        let mut b = Builder::new();
        let res = b.ingest("CPL\nthree\n9\n6\n".as_bytes());
        assert!(matches!(res, Err(ElectionError::Parse { lineno: 2, .. })));
        let res = Builder::new().ingest("CPL\n0\n0\n0\n".as_bytes());
        assert!(matches!(res, Err(ElectionError::Parse { lineno: 2, .. })));
    }

    #[test]
    fn truncated_input() {
        let mut b = Builder::new();
        let res = b.ingest("CPL\n1\n3\n1\nA, x\n1\n".as_bytes());
        assert!(matches!(res, Err(ElectionError::Parse { lineno: 7, .. })));
        assert!(Builder::new().build().is_err());
    }

    #[test]
    fn ballot_marks() {
        assert_eq!(read_ballot("1,,,", 4, 1).unwrap(), 0);
        assert_eq!(read_ballot(",,1,", 4, 1).unwrap(), 2);
        assert_eq!(read_ballot("0, 0, 0, 1", 4, 1).unwrap(), 3);
        assert_eq!(read_ballot(",1", 6, 1).unwrap(), 1);
        assert!(matches!(
            read_ballot(",,,", 4, 3),
            Err(ElectionError::SpoiledBallot { lineno: 3, marks: 0, .. })
        ));
        assert!(matches!(
            read_ballot("1,1,,", 4, 3),
            Err(ElectionError::SpoiledBallot { marks: 2, .. })
        ));
        assert!(matches!(
            read_ballot(",,x,", 4, 3),
            Err(ElectionError::Parse { .. })
        ));
        assert!(matches!(
            read_ballot(",,,,1", 4, 3),
            Err(ElectionError::Parse { .. })
        ));
    }

    #[test]
    fn open_list_two_batches() {
        let mut b = Builder::new();
        b.ingest(OPL_EXAMPLE.as_bytes()).unwrap();
        let second = "OPL
2
3
6
Democrat, Pike
Democrat, Lucy
Democrat, Beiye
Republican, Etta
Republican, Alawa
Independent1, Sasha
,,1,,,
,,,,1,
,,,,,1
";
        assert_eq!(b.ingest(second.as_bytes()).unwrap(), 3);
        let e = b.build().unwrap();
        assert_eq!(e.ballot_count(), 12);
        let cand_votes: Vec<Vec<u64>> = e
            .candidates()
            .iter()
            .map(|cs| cs.iter().map(|c| c.votes).collect())
            .collect();
        assert_eq!(cand_votes, vec![vec![2, 1, 1], vec![2, 3], vec![3]]);
        let votes: Vec<u64> = e.parties().iter().map(|p| p.votes).collect();
        assert_eq!(votes, vec![4, 5, 3]);
        for (party, cands) in e.parties().iter().zip(e.candidates().iter()) {
            assert_eq!(party.votes, cands.iter().map(|c| c.votes).sum::<u64>());
        }
    }

    #[test]
    fn spoiled_ballot_discards_the_whole_batch() {
        let first = "CPL\n1\n2\n2\nA, a\nB, b\n1,\n,1\n";
        let second = "CPL\n1\n4\n2\nA, a\nB, b\n,1\n,1\n,1\n1,1\n";
        let mut b = Builder::new();
        b.ingest(first.as_bytes()).unwrap();
        assert!(matches!(
            b.ingest(second.as_bytes()),
            Err(ElectionError::SpoiledBallot { lineno: 10, marks: 2, .. })
        ));
        assert_eq!(b.tally, vec![1, 1]);
        assert_eq!(b.ballot_count, 2);
        assert_eq!(b.batches(), 1);
        // No resumption after a failed batch.
        assert!(matches!(
            b.ingest(first.as_bytes()),
            Err(ElectionError::InvalidArgument { .. })
        ));
        assert!(matches!(
            b.build(),
            Err(ElectionError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn broken_structure_commits_nothing() {
        let mut b = Builder::new();
        let res = b.ingest("OPL\n1\n1\n2\nA, x\nbroken\n1,\n".as_bytes());
        assert!(matches!(res, Err(ElectionError::Parse { lineno: 6, .. })));
        assert_eq!(b.kind, None);
        assert!(b.parties.is_empty());
        assert!(b.candidates.is_empty());
        assert!(b.slots.is_empty());
        assert!(b.tally.is_empty());
        let retry = "OPL\n1\n1\n2\nA, x\nB, y\n1,\n";
        assert!(matches!(
            b.ingest(retry.as_bytes()),
            Err(ElectionError::InvalidArgument { .. })
        ));
        assert!(b.build().is_err());
    }

    #[test]
    fn independent_parties() {
        let data = "OPL\n1\n1\n3\nIndependent, x\nIndependent1, y\nNon-Independent Alliance, z\n1,,\n";
        let mut b = Builder::new();
        b.ingest(data.as_bytes()).unwrap();
        let e = b.build().unwrap();
        let flags: Vec<bool> = e.parties().iter().map(|p| p.independent).collect();
        assert_eq!(flags, vec![true, true, true]);
        let mut b = Builder::new();
        b.ingest("CPL\n1\n1\n2\nGreen, a\nIndependent, b\n,1\n".as_bytes())
            .unwrap();
        let e = b.build().unwrap();
        assert!(!e.parties()[0].independent);
        assert!(e.parties()[1].independent);
    }
}
