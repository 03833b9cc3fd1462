//! Format specs: the `type:arg:arg` segment after a pipe in an expression.

use itertools::Itertools;
use std::fmt;
use std::str::FromStr;

/// The kind of formatting to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatKind {
    Date,
    Time,
    DateTime,
    Number,
    Currency,
    Percentage,
}

impl FormatKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormatKind::Date => "date",
            FormatKind::Time => "time",
            FormatKind::DateTime => "datetime",
            FormatKind::Number => "number",
            FormatKind::Currency => "currency",
            FormatKind::Percentage => "percentage",
        }
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, FormatKind::Date | FormatKind::Time | FormatKind::DateTime)
    }
}

impl FromStr for FormatKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "date" => Ok(FormatKind::Date),
            "time" => Ok(FormatKind::Time),
            "datetime" => Ok(FormatKind::DateTime),
            "number" => Ok(FormatKind::Number),
            "currency" => Ok(FormatKind::Currency),
            "percentage" | "percent" => Ok(FormatKind::Percentage),
            other => Err(format!("unknown format type '{}'", other)),
        }
    }
}

/// A parsed format spec such as `currency:USD` or `date:DD/MM/YYYY`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FormatSpec {
    pub kind: FormatKind,
    pub args: Vec<String>,
}

impl FormatSpec {
    pub fn new(kind: FormatKind) -> Self {
        Self { kind, args: vec![] }
    }

    pub fn with_args<I, S>(kind: FormatKind, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind,
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Parses `type[:arg[:arg...]]`. Returns `None` for an unknown type.
    pub fn parse(source: &str) -> Option<Self> {
        let mut parts = source.split(':');
        let kind = match parts.next()?.parse::<FormatKind>() {
            Ok(kind) => kind,
            Err(message) => {
                log::debug!("Ignoring format spec '{}': {}", source, message);
                return None;
            }
        };
        let args = parts.map(|a| a.trim().to_string()).collect();
        Some(Self { kind, args })
    }

    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args
            .get(index)
            .map(String::as_str)
            .filter(|a| !a.is_empty())
    }

    /// For temporal kinds the whole argument list is one pattern, because
    /// the pattern itself may contain colons (`time:HH:mm`).
    pub fn pattern(&self) -> Option<String> {
        if self.args.iter().all(|a| a.is_empty()) {
            return None;
        }
        Some(self.args.iter().join(":"))
    }
}

impl fmt::Display for FormatSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind.as_str())?;
        for arg in &self.args {
            write!(f, ":{}", arg)?;
        }
        Ok(())
    }
}
