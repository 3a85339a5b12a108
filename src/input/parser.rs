use crate::core::edge::RawEdge;
use crate::core::party::{PartyId, PartyRef};
use regex::Regex;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised while reading line input.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("invalid input on line {line}: {content}")]
    InvalidLine { line: usize, content: String },

    #[error("invalid amount '{amount}' on line {line}: {source}")]
    InvalidAmount {
        line: usize,
        amount: String,
        #[source]
        source: rust_decimal::Error,
    },

    #[error("bad line pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Classification of one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// `A -> B: 12.5`, either endpoint may be `*`.
    Edge(RawEdge),
    /// A bare participant name, declaring a participant without debts.
    Party(PartyId),
    /// Blank line or `#` comment.
    Ignored,
}

/// Edges and declarations read from a whole input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedInput {
    pub edges: Vec<RawEdge>,
    pub declared: Vec<PartyId>,
}

/// Parser for the line format:
///
/// ```text
/// # dinner on friday
/// alice -> bob: 12.50
/// * -> carol: 30
/// dave
/// ```
///
/// # Examples
///
/// ```
/// use debt_simplifier::input::parser::LineParser;
///
/// let parser = LineParser::new().unwrap();
/// let input = parser.parse_str("# trip\nA -> B: 10\n* -> A: 6\nC\n").unwrap();
/// assert_eq!(input.edges.len(), 2);
/// assert_eq!(input.declared.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct LineParser {
    edge_regex: Regex,
    party_regex: Regex,
    ignored_regex: Regex,
}

impl LineParser {
    pub fn new() -> Result<Self, InputError> {
        Ok(Self {
            edge_regex: Regex::new(
                r"^\s*(\w+|\*)\s*->\s*(\w+|\*)\s*:\s*(-?[0-9]+(?:\.[0-9]+)?)\s*$",
            )?,
            party_regex: Regex::new(r"^\s*(\w+)\s*$")?,
            ignored_regex: Regex::new(r"^\s*(#.*)?$")?,
        })
    }

    /// Classify a single line; `line_no` is 1-based and used in errors.
    pub fn parse_line(&self, line_no: usize, line: &str) -> Result<Line, InputError> {
        if let Some(caps) = self.edge_regex.captures(line) {
            let amount_text = &caps[3];
            let amount: Decimal =
                amount_text
                    .parse()
                    .map_err(|source| InputError::InvalidAmount {
                        line: line_no,
                        amount: amount_text.to_string(),
                        source,
                    })?;
            return Ok(Line::Edge(RawEdge::new(
                PartyRef::parse(&caps[1]),
                PartyRef::parse(&caps[2]),
                amount,
            )));
        }
        if let Some(caps) = self.party_regex.captures(line) {
            return Ok(Line::Party(PartyId::new(&caps[1])));
        }
        if self.ignored_regex.is_match(line) {
            return Ok(Line::Ignored);
        }
        Err(InputError::InvalidLine {
            line: line_no,
            content: line.trim().to_string(),
        })
    }

    /// Parse a whole input, stopping at the first malformed line.
    pub fn parse_str(&self, input: &str) -> Result<ParsedInput, InputError> {
        let mut parsed = ParsedInput::default();
        for (i, line) in input.lines().enumerate() {
            match self.parse_line(i + 1, line)? {
                Line::Edge(edge) => parsed.edges.push(edge),
                Line::Party(party) => parsed.declared.push(party),
                Line::Ignored => {}
            }
        }
        Ok(parsed)
    }
}
