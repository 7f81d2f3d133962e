//! Purpose: Forward-only scanner for tag + digit-run fields in compact log encodings.
//! Exports: `FieldCursor`, `TaggedField`, `read_tagged_field`, `Encoding`, `MalformedReason`,
//! `MalformedRecordError`.
//! Role: Shared state machine under the benefit/cost, action and search-hit decoders.
//! Invariants: A field is one non-digit tag byte followed by at least one ASCII digit.
//! Invariants: A digit run ends at the first non-digit byte or end of input; values fit `u64`.
//! Invariants: The cursor never moves backwards and never allocates.
use std::error::Error as StdError;
use std::fmt;

const MAX_SNIPPET_BYTES: usize = 64;

/// Which compact column a scan belongs to; used only for error context.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Encoding {
    BenefitCost,
    Actions,
    SearchHits,
}

impl Encoding {
    pub fn name(self) -> &'static str {
        match self {
            Encoding::BenefitCost => "benefit_cost",
            Encoding::Actions => "actions",
            Encoding::SearchHits => "results",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MalformedReason {
    /// A tag was followed by a non-digit or by end of input.
    MissingValue,
    /// A digit appeared where a tag byte was expected.
    MissingTag,
    /// A record started with a tag the encoding does not define.
    UnknownTag(char),
    /// The input ended in the middle of a fixed-width group.
    TruncatedGroup,
    ValueOutOfRange,
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedReason::MissingValue => write!(f, "tag is not followed by digits"),
            MalformedReason::MissingTag => write!(f, "expected a tag, found a digit"),
            MalformedReason::UnknownTag(tag) => write!(f, "unknown record tag {tag:?}"),
            MalformedReason::TruncatedGroup => write!(f, "input ends inside a record group"),
            MalformedReason::ValueOutOfRange => write!(f, "field value does not fit in u64"),
        }
    }
}

/// The single decode failure: the scanner could not extract a required field.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MalformedRecordError {
    encoding: Encoding,
    input: String,
    offset: usize,
    reason: MalformedReason,
}

impl MalformedRecordError {
    pub fn new(
        encoding: Encoding,
        input: impl Into<String>,
        offset: usize,
        reason: MalformedReason,
    ) -> Self {
        Self {
            encoding,
            input: input.into(),
            offset,
            reason,
        }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// The complete string that failed to decode.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Byte offset of the tag or digit run that could not be read.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn reason(&self) -> MalformedReason {
        self.reason
    }
}

impl fmt::Display for MalformedRecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at byte {} of {} input {:?}",
            self.reason,
            self.offset,
            self.encoding.name(),
            truncate_snippet(&self.input, MAX_SNIPPET_BYTES)
        )
    }
}

impl StdError for MalformedRecordError {}

fn truncate_snippet(input: &str, max: usize) -> String {
    if input.len() <= max {
        return input.to_string();
    }
    let suffix = "...";
    let mut take = max.saturating_sub(suffix.len());
    while take > 0 && !input.is_char_boundary(take) {
        take -= 1;
    }
    let mut snippet = String::with_capacity(take + suffix.len());
    snippet.push_str(&input[..take]);
    snippet.push_str(suffix);
    snippet
}

/// One decoded field: the tag byte, its value and the offset just past the digit run.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TaggedField {
    pub tag: u8,
    pub value: u64,
    pub end: usize,
}

/// Read the field whose tag sits at `start` and return it with the new cursor position.
///
/// Errors are `(offset, reason)` pairs; [`FieldCursor`] attaches the input and encoding.
pub fn read_tagged_field(
    input: &[u8],
    start: usize,
) -> Result<TaggedField, (usize, MalformedReason)> {
    let Some(&tag) = input.get(start) else {
        return Err((start, MalformedReason::TruncatedGroup));
    };
    if tag.is_ascii_digit() {
        return Err((start, MalformedReason::MissingTag));
    }
    let (value, end) = read_digit_run(input, start + 1)?;
    Ok(TaggedField { tag, value, end })
}

fn read_digit_run(input: &[u8], start: usize) -> Result<(u64, usize), (usize, MalformedReason)> {
    let mut end = start;
    let mut value: u64 = 0;
    while let Some(byte) = input.get(end).filter(|byte| byte.is_ascii_digit()) {
        value = value
            .checked_mul(10)
            .and_then(|value| value.checked_add(u64::from(byte - b'0')))
            .ok_or((start, MalformedReason::ValueOutOfRange))?;
        end += 1;
    }
    if end == start {
        return Err((start, MalformedReason::MissingValue));
    }
    Ok((value, end))
}

/// Cursor over one encoded string. States alternate between "expect tag" and
/// "consume digits"; each `read_field` call runs one full cycle.
#[derive(Debug)]
pub struct FieldCursor<'a> {
    input: &'a str,
    pos: usize,
    encoding: Encoding,
}

impl<'a> FieldCursor<'a> {
    pub fn new(input: &'a str, encoding: Encoding) -> Self {
        Self {
            input,
            pos: 0,
            encoding,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// The byte under the cursor, without consuming it.
    pub fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    /// The full character under the cursor, for naming an unexpected tag.
    pub fn peek_char(&self) -> Option<char> {
        self.input.get(self.pos..)?.chars().next()
    }

    pub fn read_field(&mut self) -> Result<TaggedField, MalformedRecordError> {
        let field = read_tagged_field(self.input.as_bytes(), self.pos)
            .map_err(|(offset, reason)| self.error_at(offset, reason))?;
        self.pos = field.end;
        Ok(field)
    }

    /// Like `read_field`, but an exhausted cursor means the enclosing group was cut short.
    pub fn read_group_field(&mut self) -> Result<u64, MalformedRecordError> {
        if self.is_exhausted() {
            return Err(self.error_at(self.pos, MalformedReason::TruncatedGroup));
        }
        Ok(self.read_field()?.value)
    }

    pub fn error_at(&self, offset: usize, reason: MalformedReason) -> MalformedRecordError {
        MalformedRecordError::new(self.encoding, self.input, offset, reason)
    }
}
