//! Well-known text encoding and decoding for 2D geometries.
//!
//! Coordinates are written with Rust's shortest round-trip float formatting,
//! so `decode(encode(g))` reproduces every coordinate bit for bit.

use std::fmt::Write as _;

use foundation::Coord;
use scene::Geometry;

#[derive(Debug, Clone, PartialEq)]
pub enum WktError {
    TooFewVertices {
        kind: &'static str,
        min: usize,
        got: usize,
    },
    NonFiniteCoordinate(Coord),
    UnexpectedEnd,
    Unexpected {
        pos: usize,
        found: char,
        expected: &'static str,
    },
    InvalidNumber { pos: usize, text: String },
    UnknownGeometry(String),
    UnsupportedDimension(String),
    EmptyPoint,
    TrailingInput(usize),
}

impl std::fmt::Display for WktError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WktError::TooFewVertices { kind, min, got } => {
                write!(f, "{kind} needs at least {min} vertices, got {got}")
            }
            WktError::NonFiniteCoordinate(c) => {
                write!(f, "coordinate ({}, {}) is not finite", c[0], c[1])
            }
            WktError::UnexpectedEnd => write!(f, "unexpected end of WKT"),
            WktError::Unexpected {
                pos,
                found,
                expected,
            } => write!(f, "expected {expected} at {pos}, found {found:?}"),
            WktError::InvalidNumber { pos, text } => {
                write!(f, "invalid number {text:?} at {pos}")
            }
            WktError::UnknownGeometry(kw) => write!(f, "unsupported geometry type {kw}"),
            WktError::UnsupportedDimension(kw) => {
                write!(f, "only 2D coordinates are supported ({kw})")
            }
            WktError::EmptyPoint => write!(f, "POINT EMPTY has no coordinate"),
            WktError::TrailingInput(pos) => write!(f, "trailing input at {pos}"),
        }
    }
}

impl std::error::Error for WktError {}

pub fn encode_point(c: Coord) -> Result<String, WktError> {
    let mut out = String::from("POINT (");
    push_coord(&mut out, c)?;
    out.push(')');
    Ok(out)
}

pub fn encode_line(coords: &[Coord]) -> Result<String, WktError> {
    check_line(coords)?;
    let mut out = String::from("LINESTRING ");
    push_coord_list(&mut out, coords)?;
    Ok(out)
}

/// Encodes a single exterior ring, closing it if the caller left it open.
pub fn encode_polygon(ring: &[Coord]) -> Result<String, WktError> {
    let closed = close_ring(ring)?;
    let mut out = String::from("POLYGON (");
    push_coord_list(&mut out, &closed)?;
    out.push(')');
    Ok(out)
}

pub fn encode(geometry: &Geometry) -> Result<String, WktError> {
    let mut out = String::new();
    match geometry {
        Geometry::Point(c) => return encode_point(*c),
        Geometry::LineString(cs) if cs.is_empty() => out.push_str("LINESTRING EMPTY"),
        Geometry::LineString(cs) => return encode_line(cs),
        Geometry::Polygon(rings) => {
            out.push_str("POLYGON ");
            push_polygon_body(&mut out, rings)?;
        }
        Geometry::MultiPoint(cs) => {
            out.push_str("MULTIPOINT ");
            if cs.is_empty() {
                out.push_str("EMPTY");
            } else {
                out.push('(');
                for (i, c) in cs.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push('(');
                    push_coord(&mut out, *c)?;
                    out.push(')');
                }
                out.push(')');
            }
        }
        Geometry::MultiLineString(lines) => {
            out.push_str("MULTILINESTRING ");
            if lines.is_empty() {
                out.push_str("EMPTY");
            } else {
                out.push('(');
                for (i, line) in lines.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    check_line(line)?;
                    push_coord_list(&mut out, line)?;
                }
                out.push(')');
            }
        }
        Geometry::MultiPolygon(polys) => {
            out.push_str("MULTIPOLYGON ");
            if polys.is_empty() {
                out.push_str("EMPTY");
            } else {
                out.push('(');
                for (i, rings) in polys.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    push_polygon_body(&mut out, rings)?;
                }
                out.push(')');
            }
        }
    }
    Ok(out)
}

/// Returns the ring with its first vertex appended, unless it is already closed.
pub fn close_ring(ring: &[Coord]) -> Result<Vec<Coord>, WktError> {
    check_ring(ring)?;
    let mut out = ring.to_vec();
    if !is_closed(ring) {
        out.push(ring[0]);
    }
    Ok(out)
}

/// Drops the closing vertex of a closed ring.
pub fn open_ring(ring: &[Coord]) -> &[Coord] {
    if is_closed(ring) {
        &ring[..ring.len() - 1]
    } else {
        ring
    }
}

fn is_closed(ring: &[Coord]) -> bool {
    ring.len() >= 2 && ring.first() == ring.last()
}

fn check_ring(ring: &[Coord]) -> Result<(), WktError> {
    let distinct = open_ring(ring).len();
    if distinct < 3 {
        return Err(WktError::TooFewVertices {
            kind: "polygon ring",
            min: 3,
            got: distinct,
        });
    }
    Ok(())
}

fn check_polygon(rings: &[Vec<Coord>]) -> Result<(), WktError> {
    rings.iter().try_for_each(|ring| check_ring(ring))
}

fn check_line(coords: &[Coord]) -> Result<(), WktError> {
    if coords.len() < 2 {
        return Err(WktError::TooFewVertices {
            kind: "linestring",
            min: 2,
            got: coords.len(),
        });
    }
    Ok(())
}

fn push_polygon_body(out: &mut String, rings: &[Vec<Coord>]) -> Result<(), WktError> {
    if rings.is_empty() {
        out.push_str("EMPTY");
        return Ok(());
    }
    out.push('(');
    for (i, ring) in rings.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        push_coord_list(out, &close_ring(ring)?)?;
    }
    out.push(')');
    Ok(())
}

fn push_coord_list(out: &mut String, coords: &[Coord]) -> Result<(), WktError> {
    out.push('(');
    for (i, c) in coords.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        push_coord(out, *c)?;
    }
    out.push(')');
    Ok(())
}

fn push_coord(out: &mut String, c: Coord) -> Result<(), WktError> {
    if !(c[0].is_finite() && c[1].is_finite()) {
        return Err(WktError::NonFiniteCoordinate(c));
    }
    // Writing into a String cannot fail.
    let _ = write!(out, "{} {}", c[0], c[1]);
    Ok(())
}

/// Parses WKT back into a geometry. Keywords are case-insensitive.
///
/// Anything `encode` would refuse is refused here too: short lines, rings
/// with fewer than three distinct vertices and non-finite coordinates.
pub fn decode(text: &str) -> Result<Geometry, WktError> {
    let mut p = Parser::new(text);
    let keyword = p.word()?;

    let next = p.peek_word();
    if matches!(next.as_deref(), Some("Z" | "M" | "ZM")) {
        return Err(WktError::UnsupportedDimension(format!(
            "{keyword} {}",
            next.unwrap_or_default()
        )));
    }
    let empty = next.as_deref() == Some("EMPTY");
    if empty {
        p.word()?;
    }

    let geometry = match keyword.as_str() {
        "POINT" if empty => return Err(WktError::EmptyPoint),
        "POINT" => {
            p.expect('(')?;
            let c = p.coord()?;
            p.expect(')')?;
            Geometry::Point(c)
        }
        "LINESTRING" if empty => Geometry::LineString(Vec::new()),
        "LINESTRING" => {
            let line = p.coord_list()?;
            check_line(&line)?;
            Geometry::LineString(line)
        }
        "POLYGON" if empty => Geometry::Polygon(Vec::new()),
        "POLYGON" => {
            let rings = p.ring_list()?;
            check_polygon(&rings)?;
            Geometry::Polygon(rings)
        }
        "MULTIPOINT" if empty => Geometry::MultiPoint(Vec::new()),
        "MULTIPOINT" => Geometry::MultiPoint(p.multi_point_body()?),
        "MULTILINESTRING" if empty => Geometry::MultiLineString(Vec::new()),
        "MULTILINESTRING" => {
            let lines = p.ring_list()?;
            lines.iter().try_for_each(|line| check_line(line))?;
            Geometry::MultiLineString(lines)
        }
        "MULTIPOLYGON" if empty => Geometry::MultiPolygon(Vec::new()),
        "MULTIPOLYGON" => {
            let mut polys = Vec::new();
            p.expect('(')?;
            loop {
                let rings = p.ring_list()?;
                check_polygon(&rings)?;
                polys.push(rings);
                if !p.comma_or_close()? {
                    break;
                }
            }
            Geometry::MultiPolygon(polys)
        }
        _ => return Err(WktError::UnknownGeometry(keyword)),
    };

    p.skip_ws();
    if p.pos < p.src.len() {
        return Err(WktError::TrailingInput(p.pos));
    }
    Ok(geometry)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn skip_ws(&mut self) {
        let rest = &self.src[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_ws();
        self.src[self.pos..].chars().next()
    }

    fn word(&mut self) -> Result<String, WktError> {
        self.skip_ws();
        let rest = &self.src[self.pos..];
        let len = rest
            .find(|ch: char| !ch.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        if len == 0 {
            return match rest.chars().next() {
                Some(found) => Err(WktError::Unexpected {
                    pos: self.pos,
                    found,
                    expected: "geometry keyword",
                }),
                None => Err(WktError::UnexpectedEnd),
            };
        }
        self.pos += len;
        Ok(rest[..len].to_ascii_uppercase())
    }

    fn peek_word(&mut self) -> Option<String> {
        let start = self.pos;
        let w = match self.peek() {
            Some(ch) if ch.is_ascii_alphabetic() => self.word().ok(),
            _ => None,
        };
        self.pos = start;
        w
    }

    fn expect(&mut self, want: char) -> Result<(), WktError> {
        match self.peek() {
            Some(ch) if ch == want => {
                self.pos += ch.len_utf8();
                Ok(())
            }
            Some(found) => Err(WktError::Unexpected {
                pos: self.pos,
                found,
                expected: if want == '(' { "'('" } else { "')'" },
            }),
            None => Err(WktError::UnexpectedEnd),
        }
    }

    /// Consumes `,` (returns true) or `)` (returns false).
    fn comma_or_close(&mut self) -> Result<bool, WktError> {
        match self.peek() {
            Some(',') => {
                self.pos += 1;
                Ok(true)
            }
            Some(')') => {
                self.pos += 1;
                Ok(false)
            }
            Some(found) => Err(WktError::Unexpected {
                pos: self.pos,
                found,
                expected: "',' or ')'",
            }),
            None => Err(WktError::UnexpectedEnd),
        }
    }

    fn number(&mut self) -> Result<f64, WktError> {
        self.skip_ws();
        let rest = &self.src[self.pos..];
        let len = rest
            .find(|ch: char| !(ch.is_ascii_digit() || matches!(ch, '+' | '-' | '.' | 'e' | 'E')))
            .unwrap_or(rest.len());
        if len == 0 {
            return match rest.chars().next() {
                Some(found) => Err(WktError::Unexpected {
                    pos: self.pos,
                    found,
                    expected: "number",
                }),
                None => Err(WktError::UnexpectedEnd),
            };
        }
        let text = &rest[..len];
        let v = text.parse::<f64>().map_err(|_| WktError::InvalidNumber {
            pos: self.pos,
            text: text.to_string(),
        })?;
        self.pos += len;
        Ok(v)
    }

    fn coord(&mut self) -> Result<Coord, WktError> {
        let x = self.number()?;
        let y = self.number()?;
        if matches!(self.peek(), Some(ch) if ch.is_ascii_digit() || matches!(ch, '-' | '+' | '.')) {
            return Err(WktError::UnsupportedDimension(
                "more than two ordinates".to_string(),
            ));
        }
        // Overflowing literals such as `1e999` parse to infinity.
        if !(x.is_finite() && y.is_finite()) {
            return Err(WktError::NonFiniteCoordinate([x, y]));
        }
        Ok([x, y])
    }

    fn coord_list(&mut self) -> Result<Vec<Coord>, WktError> {
        self.expect('(')?;
        let mut out = Vec::new();
        loop {
            out.push(self.coord()?);
            if !self.comma_or_close()? {
                break;
            }
        }
        Ok(out)
    }

    fn ring_list(&mut self) -> Result<Vec<Vec<Coord>>, WktError> {
        self.expect('(')?;
        let mut out = Vec::new();
        loop {
            out.push(self.coord_list()?);
            if !self.comma_or_close()? {
                break;
            }
        }
        Ok(out)
    }

    /// Accepts both `(1 2, 3 4)` and `((1 2), (3 4))`.
    fn multi_point_body(&mut self) -> Result<Vec<Coord>, WktError> {
        self.expect('(')?;
        let mut out = Vec::new();
        loop {
            if self.peek() == Some('(') {
                self.expect('(')?;
                out.push(self.coord()?);
                self.expect(')')?;
            } else {
                out.push(self.coord()?);
            }
            if !self.comma_or_close()? {
                break;
            }
        }
        Ok(out)
    }
}
