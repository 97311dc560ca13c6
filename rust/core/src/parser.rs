// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! STEP/IFC Parser using nom
//!
//! Zero-copy tokenization of entity records and a record scanner for the
//! DATA section.

use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, digit1, one_of},
    combinator::{map, map_res, opt, recognize},
    multi::separated_list0,
    sequence::{delimited, pair, preceded, tuple},
    IResult,
};

use crate::error::{Error, Result};

/// STEP/IFC Token
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'a> {
    /// Entity reference: #123
    EntityRef(u32),
    /// String literal with STEP escapes still encoded: 'text'
    String(&'a str),
    /// Binary literal: "0FF"
    Binary(&'a str),
    /// Integer: 42
    Integer(i64),
    /// Float: 3.14
    Float(f64),
    /// Enum: .TRUE., .FALSE., .UNKNOWN.
    Enum(&'a str),
    /// List: (1, 2, 3)
    List(Vec<Token<'a>>),
    /// Typed value: IFCLABEL('x'), IFCBOOLEAN(.T.)
    TypedValue(&'a str, Vec<Token<'a>>),
    /// Null value: $
    Null,
    /// Asterisk (derived value): *
    Derived,
}

/// Parse entity reference: #123
fn entity_ref(input: &str) -> IResult<&str, Token> {
    map(
        preceded(char('#'), map_res(digit1, |s: &str| s.parse::<u32>())),
        Token::EntityRef,
    )(input)
}

/// Body of a single-quoted string. A doubled quote is an escaped quote.
fn quoted_content(input: &str) -> IResult<&str, &str> {
    let bytes = input.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'\'' {
            if bytes.get(i + 1) == Some(&b'\'') {
                i += 2;
                continue;
            }
            return Ok((&input[i..], &input[..i]));
        }
        i += 1;
    }

    Err(nom::Err::Error(nom::error::Error::new(
        input,
        nom::error::ErrorKind::Char,
    )))
}

/// Parse string literal: 'text'
fn string_literal(input: &str) -> IResult<&str, Token> {
    map(
        delimited(char('\''), quoted_content, char('\'')),
        Token::String,
    )(input)
}

/// Parse binary literal: "0ABC"
fn binary_literal(input: &str) -> IResult<&str, Token> {
    map(
        delimited(
            char('"'),
            take_while(|c: char| c.is_ascii_hexdigit()),
            char('"'),
        ),
        Token::Binary,
    )(input)
}

/// Parse integer: 42, -42, +7
fn integer(input: &str) -> IResult<&str, Token> {
    map_res(recognize(pair(opt(one_of("+-")), digit1)), |s: &str| {
        s.parse::<i64>().map(Token::Integer)
    })(input)
}

/// Parse float: 3.14, -3.14, 1.5E-10, 0.
/// STEP allows reals without fraction digits ("0.")
fn float(input: &str) -> IResult<&str, Token> {
    map_res(
        recognize(tuple((
            opt(one_of("+-")),
            digit1,
            char('.'),
            opt(digit1),
            opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
        ))),
        |s: &str| fast_float::parse::<f64, _>(s).map(Token::Float),
    )(input)
}

/// Parse enum: .TRUE., .F., .ELEMENT.
fn enum_value(input: &str) -> IResult<&str, Token> {
    map(
        delimited(
            char('.'),
            take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_'),
            char('.'),
        ),
        Token::Enum,
    )(input)
}

fn null(input: &str) -> IResult<&str, Token> {
    map(char('$'), |_| Token::Null)(input)
}

fn derived(input: &str) -> IResult<&str, Token> {
    map(char('*'), |_| Token::Derived)(input)
}

/// Comma separated arguments enclosed in parentheses
fn arguments(input: &str) -> IResult<&str, Vec<Token>> {
    delimited(
        char('('),
        separated_list0(delimited(ws, char(','), ws), token),
        preceded(ws, char(')')),
    )(input)
}

/// Parse typed value: IFCLENGTHMEASURE(2.5), IFCBOOLEAN(.T.)
fn typed_value(input: &str) -> IResult<&str, Token> {
    map(
        pair(
            take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_'),
            preceded(ws, arguments),
        ),
        |(type_name, args)| Token::TypedValue(type_name, args),
    )(input)
}

fn list(input: &str) -> IResult<&str, Token> {
    map(arguments, Token::List)(input)
}

/// Skip whitespace
fn ws(input: &str) -> IResult<&str, ()> {
    map(take_while(|c: char| c.is_whitespace()), |_| ())(input)
}

/// Parse a token with optional surrounding whitespace
fn token(input: &str) -> IResult<&str, Token> {
    delimited(
        ws,
        alt((
            float, // before integer, a float starts with an integer
            integer,
            entity_ref,
            string_literal,
            binary_literal,
            enum_value,
            list,
            typed_value,
            null,
            derived,
        )),
        ws,
    )(input)
}

/// Parse a complete entity record
/// Example: #123=IFCWALL('guid','owner',$,$,'name',$,$,$);
///
/// Returns the express id, the STEP type name as written in the file and the
/// top-level arguments.
pub fn parse_entity(input: &str) -> Result<(u32, &str, Vec<Token>)> {
    let result: IResult<&str, (u32, &str, Vec<Token>)> = tuple((
        delimited(
            ws,
            preceded(char('#'), map_res(digit1, |s: &str| s.parse::<u32>())),
            ws,
        ),
        preceded(
            char('='),
            delimited(
                ws,
                take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_'),
                ws,
            ),
        ),
        delimited(
            ws,
            |i| arguments(i),
            tuple((ws, char(';'))),
        ),
    ))(input);

    match result {
        Ok((_, parsed)) => Ok(parsed),
        Err(e) => Err(Error::parse(0, format!("Failed to parse entity: {}", e))),
    }
}

/// Parse a HEADER section record such as `FILE_SCHEMA(('IFC4'));`
pub fn parse_header_record(input: &str) -> Result<(&str, Vec<Token>)> {
    let result: IResult<&str, (&str, Vec<Token>)> = pair(
        delimited(
            ws,
            take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_'),
            ws,
        ),
        delimited(ws, arguments, tuple((ws, char(';')))),
    )(input);

    match result {
        Ok((_, parsed)) => Ok(parsed),
        Err(e) => Err(Error::parse(0, format!("Failed to parse header record: {}", e))),
    }
}

/// Scanner over the entity records of the DATA section
///
/// Records can span several lines; `;` and `#` inside quoted strings are
/// not record boundaries. The HEADER section is skipped.
pub struct EntityScanner<'a> {
    content: &'a str,
    position: usize,
}

impl<'a> EntityScanner<'a> {
    /// Create a new scanner positioned at the start of the DATA section
    pub fn new(content: &'a str) -> Self {
        Self {
            content,
            position: data_section_start(content),
        }
    }

    /// Scan for the next entity
    /// Returns (express_id, type_name, record_start, record_end)
    pub fn next_entity(&mut self) -> Option<(u32, &'a str, usize, usize)> {
        let bytes = self.content.as_bytes();

        loop {
            self.position = skip_trivia(bytes, self.position);
            if self.position >= bytes.len() {
                return None;
            }

            let record_start = self.position;
            let record_end = find_record_end(bytes, record_start)?;
            self.position = record_end;

            if bytes[record_start] != b'#' {
                // ENDSEC; closes the DATA section
                if self.content[record_start..record_end].starts_with("ENDSEC") {
                    self.position = bytes.len();
                    return None;
                }
                continue;
            }

            if let Some((id, type_name)) = self.record_head(record_start, record_end) {
                return Some((id, type_name, record_start, record_end));
            }
        }
    }

    /// Read `#id = TYPE(` at the start of a record
    fn record_head(&self, start: usize, end: usize) -> Option<(u32, &'a str)> {
        let bytes = self.content.as_bytes();

        let id_start = start + 1;
        let mut pos = id_start;
        while pos < end && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        if pos == id_start {
            return None;
        }
        let id = self.content[id_start..pos].parse::<u32>().ok()?;

        while pos < end && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if pos >= end || bytes[pos] != b'=' {
            return None;
        }
        pos += 1;
        while pos < end && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }

        let type_start = pos;
        while pos < end && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'_') {
            pos += 1;
        }
        // Complex instances (#1=(A()B());) have no single type name
        if pos == type_start {
            return None;
        }

        Some((id, &self.content[type_start..pos]))
    }
}

/// Byte offset just after `DATA;`, or 0 for headerless fragments
fn data_section_start(content: &str) -> usize {
    let bytes = content.as_bytes();
    let mut from = 0;

    while let Some(offset) = memchr::memmem::find(&bytes[from..], b"DATA") {
        let at = from + offset;
        let mut pos = at + 4;
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        let at_line_start = at == 0 || bytes[at - 1].is_ascii_whitespace();
        if at_line_start && bytes.get(pos) == Some(&b';') {
            return pos + 1;
        }
        from = at + 4;
    }

    0
}

/// Skip whitespace and `/* ... */` comments
fn skip_trivia(bytes: &[u8], mut pos: usize) -> usize {
    loop {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if bytes.get(pos) == Some(&b'/') && bytes.get(pos + 1) == Some(&b'*') {
            match memchr::memmem::find(&bytes[pos + 2..], b"*/") {
                Some(offset) => pos += offset + 4,
                None => return bytes.len(),
            }
            continue;
        }
        return pos;
    }
}

/// Position just past the `;` that ends the record starting at `start`
fn find_record_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut pos = start;
    let mut in_string = false;

    while pos < bytes.len() {
        if in_string {
            let offset = memchr::memchr(b'\'', &bytes[pos..])?;
            pos += offset + 1;
            // '' keeps the string open
            if bytes.get(pos) == Some(&b'\'') {
                pos += 1;
            } else {
                in_string = false;
            }
        } else {
            let offset = memchr::memchr2(b'\'', b';', &bytes[pos..])?;
            pos += offset;
            if bytes[pos] == b';' {
                return Some(pos + 1);
            }
            in_string = true;
            pos += 1;
        }
    }

    None
}
