//! Text command driver.
//!
//! One command per line, tokens separated by whitespace:
//!
//! ```text
//! create_parking_lot <capacity_constraint> <unit_limit>
//! delete_parking_lot <capacity_constraint>
//! add_truck <unit_id> <capacity>
//! ready <capacity_constraint>
//! load <capacity_constraint> <amount>
//! count <capacity_constraint>
//! ```
//!
//! Commands that produce a result print one line; absent results print
//! `-1`. Creation and deletion print nothing.

use std::fmt;
use std::io::{self, BufRead, Write};
use std::num::ParseIntError;
use std::str::{FromStr, SplitWhitespace};

use tracing::warn;

use crate::error::ParseError;
use crate::registry::{Placement, PoolRegistry, Promotion};
use crate::unit::{Unit, UnitId};

/// One parsed driver command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    CreatePool {
        capacity_constraint: i64,
        unit_limit: usize,
    },
    DeletePool {
        capacity_constraint: i64,
    },
    AddUnit {
        unit_id: UnitId,
        capacity: i64,
    },
    Ready {
        capacity_constraint: i64,
    },
    Load {
        capacity_constraint: i64,
        amount: i64,
    },
    Count {
        capacity_constraint: i64,
    },
}

impl Command {
    pub const CREATE_POOL: &'static str = "create_parking_lot";
    pub const DELETE_POOL: &'static str = "delete_parking_lot";
    pub const ADD_UNIT: &'static str = "add_truck";
    pub const READY: &'static str = "ready";
    pub const LOAD: &'static str = "load";
    pub const COUNT: &'static str = "count";

    /// Runs the command against `registry`.
    pub fn apply(self, registry: &mut PoolRegistry) -> Outcome {
        match self {
            Self::CreatePool {
                capacity_constraint,
                unit_limit,
            } => {
                registry.create(capacity_constraint, unit_limit);
                Outcome::Silent
            }
            Self::DeletePool {
                capacity_constraint,
            } => {
                registry.delete(capacity_constraint);
                Outcome::Silent
            }
            Self::AddUnit { unit_id, capacity } => {
                Outcome::Admitted(registry.admit(Unit::new(unit_id, capacity)))
            }
            Self::Ready {
                capacity_constraint,
            } => Outcome::Promoted(registry.mark_ready(capacity_constraint)),
            Self::Load {
                capacity_constraint,
                amount,
            } => Outcome::Loaded(registry.redistribute(capacity_constraint, amount)),
            Self::Count {
                capacity_constraint,
            } => Outcome::Counted(registry.count(capacity_constraint)),
        }
    }
}

/// Pulls typed arguments off a command line.
struct Args<'a> {
    command: &'static str,
    tokens: SplitWhitespace<'a>,
}

impl Args<'_> {
    fn int<T>(&mut self, argument: &'static str) -> Result<T, ParseError>
    where
        T: FromStr<Err = ParseIntError>,
    {
        let command = self.command;
        let token = self
            .tokens
            .next()
            .ok_or(ParseError::MissingArgument { command, argument })?;
        token.parse().map_err(|source| ParseError::InvalidInteger {
            command,
            argument,
            value: token.to_owned(),
            source,
        })
    }

    fn finish(mut self) -> Result<(), ParseError> {
        match self.tokens.next() {
            None => Ok(()),
            Some(extra) => Err(ParseError::UnexpectedArgument {
                command: self.command,
                value: extra.to_owned(),
            }),
        }
    }
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut tokens = line.split_whitespace();
        let name = tokens.next().unwrap_or_default();

        let command = match name {
            Self::CREATE_POOL => Self::CREATE_POOL,
            Self::DELETE_POOL => Self::DELETE_POOL,
            Self::ADD_UNIT => Self::ADD_UNIT,
            Self::READY => Self::READY,
            Self::LOAD => Self::LOAD,
            Self::COUNT => Self::COUNT,
            other => return Err(ParseError::UnknownCommand(other.to_owned())),
        };
        let mut args = Args { command, tokens };

        let parsed = match command {
            Self::CREATE_POOL => {
                let capacity_constraint: i64 = args.int("capacity_constraint")?;
                let unit_limit: usize = args.int("unit_limit")?;
                if unit_limit == 0 {
                    return Err(ParseError::ZeroUnitLimit { command });
                }
                Self::CreatePool {
                    capacity_constraint,
                    unit_limit,
                }
            }
            Self::DELETE_POOL => Self::DeletePool {
                capacity_constraint: args.int("capacity_constraint")?,
            },
            Self::ADD_UNIT => {
                let unit_id: UnitId = args.int("unit_id")?;
                let capacity: i64 = args.int("capacity")?;
                if capacity <= 0 {
                    return Err(ParseError::NonPositiveCapacity { command, capacity });
                }
                Self::AddUnit { unit_id, capacity }
            }
            Self::READY => Self::Ready {
                capacity_constraint: args.int("capacity_constraint")?,
            },
            Self::LOAD => Self::Load {
                capacity_constraint: args.int("capacity_constraint")?,
                amount: args.int("amount")?,
            },
            _ => Self::Count {
                capacity_constraint: args.int("capacity_constraint")?,
            },
        };

        args.finish()?;
        Ok(parsed)
    }
}

/// The result of applying one [`Command`].
///
/// `Display` renders the driver's output line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Creation and deletion produce no output.
    Silent,
    Admitted(Option<i64>),
    Promoted(Option<Promotion>),
    Loaded(Vec<Placement>),
    Counted(usize),
}

impl Outcome {
    /// Returns `true` if the outcome prints no line.
    #[inline]
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::Silent)
    }
}

const ABSENT: i64 = -1;

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Silent => Ok(()),
            Self::Admitted(pool) => write!(f, "{}", pool.unwrap_or(ABSENT)),
            Self::Promoted(Some(Promotion { unit_id, pool })) => write!(f, "{unit_id} {pool}"),
            Self::Promoted(None) => write!(f, "{ABSENT}"),
            Self::Loaded(placements) if placements.is_empty() => write!(f, "{ABSENT}"),
            Self::Loaded(placements) => {
                for (i, Placement { unit_id, pool }) in placements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" - ")?;
                    }
                    write!(f, "{unit_id} {}", pool.unwrap_or(ABSENT))?;
                }
                Ok(())
            }
            Self::Counted(total) => write!(f, "{total}"),
        }
    }
}

/// Line tallies from one [`run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Lines read, blank lines included.
    pub lines: usize,
    pub executed: usize,
    /// Lines that failed to parse.
    pub skipped: usize,
}

/// Executes every command in `input`, writing result lines to `output`.
///
/// Malformed lines are logged and skipped; only I/O errors stop the run.
pub fn run<R, W>(registry: &mut PoolRegistry, input: R, mut output: W) -> io::Result<RunSummary>
where
    R: BufRead,
    W: Write,
{
    let mut summary = RunSummary::default();

    for (index, line) in input.lines().enumerate() {
        let line = line?;
        summary.lines += 1;
        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<Command>() {
            Ok(command) => {
                let outcome = command.apply(registry);
                if !outcome.is_silent() {
                    writeln!(output, "{outcome}")?;
                }
                summary.executed += 1;
            }
            Err(error) => {
                warn!(line = index + 1, %error, "skipping command");
                summary.skipped += 1;
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<Command, ParseError> {
        line.parse()
    }

    fn run_script(script: &str) -> (String, RunSummary) {
        let mut registry = PoolRegistry::new();
        let mut output = Vec::new();
        let summary = run(&mut registry, script.as_bytes(), &mut output).unwrap();
        (String::from_utf8(output).unwrap(), summary)
    }

    // ========================================================================
    // Parsing
    // ========================================================================

    #[test]
    fn parses_every_command() {
        assert_eq!(
            parse("create_parking_lot 10 2"),
            Ok(Command::CreatePool {
                capacity_constraint: 10,
                unit_limit: 2
            })
        );
        assert_eq!(
            parse("delete_parking_lot -4"),
            Ok(Command::DeletePool {
                capacity_constraint: -4
            })
        );
        assert_eq!(
            parse("add_truck 100 5"),
            Ok(Command::AddUnit {
                unit_id: 100,
                capacity: 5
            })
        );
        assert_eq!(
            parse("ready 5"),
            Ok(Command::Ready {
                capacity_constraint: 5
            })
        );
        assert_eq!(
            parse("load 5 30"),
            Ok(Command::Load {
                capacity_constraint: 5,
                amount: 30
            })
        );
        assert_eq!(
            parse("  count   0 "),
            Ok(Command::Count {
                capacity_constraint: 0
            })
        );
    }

    #[test]
    fn rejects_unknown_command() {
        assert_eq!(
            parse("unload 5"),
            Err(ParseError::UnknownCommand("unload".to_owned()))
        );
        assert_eq!(
            parse("unload 5").unwrap_err().to_string(),
            "Unknown command: unload"
        );
    }

    #[test]
    fn rejects_missing_argument() {
        assert_eq!(
            parse("load 5"),
            Err(ParseError::MissingArgument {
                command: "load",
                argument: "amount"
            })
        );
    }

    #[test]
    fn rejects_invalid_integer() {
        let err = parse("ready five").unwrap_err();
        assert!(matches!(
            err,
            ParseError::InvalidInteger {
                command: "ready",
                argument: "capacity_constraint",
                ..
            }
        ));
        // A negative unit limit does not fit the unsigned limit
        assert!(matches!(
            parse("create_parking_lot 5 -1"),
            Err(ParseError::InvalidInteger {
                argument: "unit_limit",
                ..
            })
        ));
    }

    #[test]
    fn rejects_trailing_argument() {
        assert_eq!(
            parse("count 1 2"),
            Err(ParseError::UnexpectedArgument {
                command: "count",
                value: "2".to_owned()
            })
        );
    }

    #[test]
    fn rejects_zero_unit_limit_and_capacity() {
        assert_eq!(
            parse("create_parking_lot 5 0"),
            Err(ParseError::ZeroUnitLimit {
                command: "create_parking_lot"
            })
        );
        assert_eq!(
            parse("add_truck 1 0"),
            Err(ParseError::NonPositiveCapacity {
                command: "add_truck",
                capacity: 0
            })
        );
    }

    // ========================================================================
    // Output formatting
    // ========================================================================

    #[test]
    fn formats_outcomes() {
        assert_eq!(Outcome::Silent.to_string(), "");
        assert_eq!(Outcome::Admitted(Some(5)).to_string(), "5");
        assert_eq!(Outcome::Admitted(None).to_string(), "-1");
        assert_eq!(
            Outcome::Promoted(Some(Promotion {
                unit_id: 100,
                pool: 5
            }))
            .to_string(),
            "100 5"
        );
        assert_eq!(Outcome::Promoted(None).to_string(), "-1");
        assert_eq!(Outcome::Loaded(Vec::new()).to_string(), "-1");
        assert_eq!(
            Outcome::Loaded(vec![
                Placement {
                    unit_id: 1,
                    pool: Some(10)
                },
                Placement {
                    unit_id: 2,
                    pool: None
                },
            ])
            .to_string(),
            "1 10 - 2 -1"
        );
        assert_eq!(Outcome::Counted(3).to_string(), "3");
    }

    // ========================================================================
    // Driver
    // ========================================================================

    #[test]
    fn runs_script() {
        let script = "\
create_parking_lot 10 2
create_parking_lot 5 3
add_truck 1 7
add_truck 2 3
add_truck 3 10
ready 5
ready 5
ready 5
load 5 4
count 0
load 0 100
bogus 1

delete_parking_lot 10
count 0
load 0 5
";
        let (output, summary) = run_script(script);
        assert_eq!(
            output,
            "5\n-1\n10\n1 5\n3 10\n-1\n1 -1\n1\n3 10\n0\n-1\n"
        );
        assert_eq!(
            summary,
            RunSummary {
                lines: 16,
                executed: 14,
                skipped: 1
            }
        );
    }

    #[test]
    fn load_output_joins_placements() {
        let script = "\
create_parking_lot 10 2
add_truck 1 10
add_truck 2 10
ready 10
ready 10
load 10 15
";
        let (output, _) = run_script(script);
        assert_eq!(output, "10\n10\n1 10\n2 10\n1 10 - 2 -1\n");
    }

    #[test]
    fn empty_input_produces_nothing() {
        let (output, summary) = run_script("");
        assert!(output.is_empty());
        assert_eq!(summary, RunSummary::default());
    }
}
