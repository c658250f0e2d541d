// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// The two supported voting models.
///
/// The kind is read from the first line of every ballot file: `OPL` selects
/// an open list, anything else is treated as a closed list.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum ElectionKind {
    /// Closed Party List: ballots select a party, candidates are seated in list order.
    Closed,
    /// Open Party List: ballots select a candidate, candidates are seated by votes.
    Open,
}

impl ElectionKind {
    pub const OPEN_MARKER: &'static str = "OPL";

    pub fn from_marker(marker: &str) -> ElectionKind {
        if marker.trim() == ElectionKind::OPEN_MARKER {
            ElectionKind::Open
        } else {
            ElectionKind::Closed
        }
    }

    /// The short label used in summaries and logs.
    pub fn label(&self) -> &'static str {
        match self {
            ElectionKind::Closed => "CPL",
            ElectionKind::Open => "OPL",
        }
    }
}

impl Display for ElectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Party {
    pub name: String,
    pub independent: bool,
    pub votes: u64,
}

impl Party {
    /// Parties whose name contains this marker (`Independent`,
    /// `Independent1`, ...) stand for unaffiliated candidates.
    pub const INDEPENDENT_MARKER: &'static str = "Independent";

    pub fn new(name: &str) -> Party {
        Party {
            name: name.to_string(),
            independent: name.contains(Party::INDEPENDENT_MARKER),
            votes: 0,
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Candidate {
    pub name: String,
    pub votes: u64,
    /// Only ever flipped from false to true, by the seat assignment.
    pub seated: bool,
}

impl Candidate {
    pub fn new(name: &str) -> Candidate {
        Candidate {
            name: name.to_string(),
            votes: 0,
            seated: false,
        }
    }
}

// ******** Output data structures *********

/// One row of the allocation table.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct PartyAllocation {
    pub votes: u64,
    pub first_allocation: u32,
    /// Votes left after the first allocation: `votes - first_allocation * quota`.
    pub remainder: u64,
    pub second_allocation: u32,
    pub total_seats: u32,
}

/// The result of the largest remainder computation, one row per party in
/// declaration order.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct AllocationTable {
    pub quota: u64,
    pub rows: Vec<PartyAllocation>,
}

impl AllocationTable {
    pub fn total_seats(&self) -> Vec<u32> {
        self.rows.iter().map(|r| r.total_seats).collect()
    }

    pub fn seats_allocated(&self) -> u32 {
        self.rows.iter().map(|r| r.total_seats).sum()
    }
}

/// Errors that prevent the election from completing successfully.
#[derive(Debug)]
pub enum ElectionError {
    /// A header, structure or ballot line could not be understood.
    Parse { lineno: usize, message: String },
    /// The ballot source could not be read.
    Io {
        lineno: usize,
        source: std::io::Error,
    },
    /// A ballot does not carry exactly one valid mark.
    SpoiledBallot {
        lineno: usize,
        marks: usize,
        line: String,
    },
    InvalidArgument { message: String },
    /// The seats cannot all be filled.
    InvariantViolation { message: String },
}

impl ElectionError {
    pub(crate) fn parse(lineno: usize, message: impl Into<String>) -> ElectionError {
        ElectionError::Parse {
            lineno,
            message: message.into(),
        }
    }
}

impl Error for ElectionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ElectionError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl Display for ElectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElectionError::Parse { lineno, message } => {
                write!(f, "parse error at line {}: {}", lineno, message)
            }
            ElectionError::Io { lineno, source } => {
                write!(f, "could not read line {}: {}", lineno, source)
            }
            ElectionError::SpoiledBallot {
                lineno,
                marks,
                line,
            } => write!(
                f,
                "spoiled ballot at line {}: expected exactly one mark, found {} in {:?}",
                lineno, marks, line
            ),
            ElectionError::InvalidArgument { message } => {
                write!(f, "invalid argument: {}", message)
            }
            ElectionError::InvariantViolation { message } => {
                write!(f, "cannot allocate seats: {}", message)
            }
        }
    }
}

// ********* Configuration **********

/// How ties at a seat cutoff are broken.
///
/// Both modes draw a uniform lottery. The seeded mode makes the draw
/// reproducible, which is what tests and audits rely on.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum TieBreakMode {
    Random,
    Seeded(u64),
}

impl TieBreakMode {
    pub const DEFAULT: TieBreakMode = TieBreakMode::Random;
}
