use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;

use crate::error::SubmitError;

/// SLURM partitions a job can be sent to, each with a fixed walltime limit
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum Queue {
    Ultrashort,
    Short,
    Medium,
    Long,
}

impl Queue {
    /// Walltime handed to `#SBATCH --time`
    pub fn walltime(&self) -> &'static str {
        match self {
            Queue::Ultrashort => "2-06:00:00",
            Queue::Short => "00:30:00",
            Queue::Medium => "72:00:00",
            Queue::Long => "240:00:00",
        }
    }
}

impl fmt::Display for Queue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Queue::Ultrashort => write!(f, "ultrashort"),
            Queue::Short => write!(f, "short"),
            Queue::Medium => write!(f, "medium"),
            Queue::Long => write!(f, "long"),
        }
    }
}

impl FromStr for Queue {
    type Err = SubmitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ultrashort" => Ok(Queue::Ultrashort),
            "short" => Ok(Queue::Short),
            "medium" => Ok(Queue::Medium),
            "long" => Ok(Queue::Long),
            _ => Err(SubmitError::UnknownQueue(s.to_string())),
        }
    }
}
