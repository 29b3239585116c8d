//! Instruction decoder.
//!
//! Turns a deciphered scenario blob into its [`InstructionElement`] sequence.
//!
//! # Framing
//!
//! Every element starts with a one-byte discriminant followed by either a
//! fixed-size body (markers) or an explicit length (raw data, commands). A
//! command's declared body length bounds every read made while decoding its
//! arguments, so argument or payload kinds this decoder does not know are
//! preserved as opaque bytes instead of desynchronizing the stream.
//!
//! Decoding is pure: the same bytes always produce the same elements.

use crate::element::{
    Argument, BinaryOp, Command, Expr, InstructionElement, IntBank, IntVar, Marker, Payload,
    ScenarioId, TextEncoding, UnaryOp,
};
use crate::error::{DecodeError, DecodeFault};
use crate::format::{
    self, MAX_EXPR_DEPTH, SCENARIO_HEADER_LEN, SCENARIO_MAGIC, SCENARIO_VERSION,
};
use crate::reader::ByteReader;
use crate::scenario::Scenario;

/// Header fields of a scenario blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScenarioHeader {
    /// Declared text encoding.
    pub encoding: TextEncoding,
    /// Length of the element stream following the header.
    pub stream_len: usize,
}

/// Parse and validate the fixed scenario header.
pub fn decode_header(blob: &[u8]) -> Result<ScenarioHeader, DecodeError> {
    let mut reader = ByteReader::new(blob, 0);
    let magic = reader.take(4)?;
    if magic != SCENARIO_MAGIC {
        return Err(DecodeError::new(0, DecodeFault::BadMagic));
    }
    let version_offset = reader.offset();
    let version = reader.u16()?;
    if version != SCENARIO_VERSION {
        return Err(DecodeError::new(
            version_offset,
            DecodeFault::UnsupportedVersion(version),
        ));
    }
    let encoding_offset = reader.offset();
    let code = reader.u8()?;
    let encoding = TextEncoding::from_code(code).ok_or(DecodeError::new(
        encoding_offset,
        DecodeFault::UnknownEncoding(code),
    ))?;
    let _flags = reader.u8()?;
    let stream_len = reader.u32()? as usize;
    debug_assert_eq!(reader.offset(), SCENARIO_HEADER_LEN);
    if stream_len > reader.remaining() {
        return Err(reader.error(DecodeFault::Truncated {
            needed: stream_len,
            available: reader.remaining(),
        }));
    }
    Ok(ScenarioHeader {
        encoding,
        stream_len,
    })
}

/// Decode a complete scenario blob (header and element stream).
pub fn decode_scenario(id: ScenarioId, blob: &[u8]) -> Result<Scenario, DecodeError> {
    let header = decode_header(blob)?;
    let stream = &blob[SCENARIO_HEADER_LEN..SCENARIO_HEADER_LEN + header.stream_len];
    let elements = decode_elements(stream, SCENARIO_HEADER_LEN)?;
    Ok(Scenario::new(id, header.encoding, elements))
}

/// Decode a bare element stream.
///
/// `base` is the absolute offset of `stream[0]`, used for diagnostics.
pub fn decode_elements(stream: &[u8], base: usize) -> Result<Vec<InstructionElement>, DecodeError> {
    let mut reader = ByteReader::new(stream, base);
    let mut elements = Vec::new();
    while !reader.is_finished() {
        elements.push(decode_element(&mut reader)?);
    }
    Ok(elements)
}

fn decode_element(reader: &mut ByteReader<'_>) -> Result<InstructionElement, DecodeError> {
    let start = reader.offset();
    let tag = reader.u8()?;
    let element = match tag {
        format::element::LINE => InstructionElement::Marker(Marker::Line(reader.u16()?)),
        format::element::ENTRYPOINT => InstructionElement::Marker(Marker::Entrypoint(reader.u8()?)),
        format::element::LABEL => InstructionElement::Marker(Marker::Label(reader.u32()?)),
        format::element::RAW_DATA => {
            let len = reader.u32()? as usize;
            InstructionElement::RawData(reader.take(len)?.to_vec())
        }
        format::element::COMMAND => InstructionElement::Command(decode_command(reader)?),
        other => return Err(DecodeError::new(start, DecodeFault::UnknownElement(other))),
    };
    Ok(element)
}

fn decode_command(reader: &mut ByteReader<'_>) -> Result<Command, DecodeError> {
    let module_type = reader.u8()?;
    let module_number = reader.u8()?;
    let opcode = reader.u24()?;
    let overload = reader.u8()?;
    let argc = reader.u16()?;
    let body_len = reader.u32()? as usize;
    let mut body = reader.sized(body_len)?;

    let mut arguments = Vec::with_capacity(argc as usize);
    for _ in 0..argc {
        arguments.push(decode_argument(&mut body)?);
    }
    let payload = if body.is_finished() {
        None
    } else {
        Some(decode_payload(&mut body)?)
    };
    body.finish()?;

    Ok(Command {
        module_type,
        module_number,
        opcode,
        overload,
        arguments,
        payload,
    })
}

fn decode_payload(body: &mut ByteReader<'_>) -> Result<Payload, DecodeError> {
    let tag = body.u8()?;
    let payload = match tag {
        format::payload::TEXT => Payload::Text(body.rest().to_vec()),
        format::payload::ARRAY => {
            let count = body.u16()?;
            let mut items = Vec::with_capacity(count as usize);
            for _ in 0..count {
                items.push(decode_argument(body)?);
            }
            Payload::Array(items)
        }
        tag => Payload::Opaque {
            tag,
            bytes: body.rest().to_vec(),
        },
    };
    Ok(payload)
}

fn decode_argument(reader: &mut ByteReader<'_>) -> Result<Argument, DecodeError> {
    let start = reader.offset();
    let tag = reader.u8()?;
    let len = reader.u16()? as usize;
    let mut body = reader.sized(len)?;
    let bad_length = || DecodeError::new(start, DecodeFault::ArgumentLength { tag, len });

    let argument = match tag {
        format::argument::INT => {
            if len != 4 {
                return Err(bad_length());
            }
            Argument::Int(body.i32()?)
        }
        format::argument::INT_VAR => {
            if len != 5 {
                return Err(bad_length());
            }
            let bank = body.u8()?;
            Argument::IntVar(IntVar::new(bank, body.u32()?))
        }
        format::argument::STR => Argument::Str(body.rest().to_vec()),
        format::argument::STR_VAR => {
            if len != 4 {
                return Err(bad_length());
            }
            Argument::StrVar(body.u32()?)
        }
        format::argument::EXPR => {
            let expr = decode_expr(&mut body, 0)?;
            body.finish()?;
            Argument::Expr(expr)
        }
        format::argument::LABEL => {
            if len != 4 {
                return Err(bad_length());
            }
            Argument::Label(body.u32()?)
        }
        tag => Argument::Opaque {
            tag,
            bytes: body.rest().to_vec(),
        },
    };
    Ok(argument)
}

fn decode_expr(reader: &mut ByteReader<'_>, depth: usize) -> Result<Expr, DecodeError> {
    if depth >= MAX_EXPR_DEPTH {
        return Err(reader.error(DecodeFault::ExpressionTooDeep(MAX_EXPR_DEPTH)));
    }
    let start = reader.offset();
    let node = reader.u8()?;
    let expr = match node {
        format::expr::CONST => Expr::Const(reader.i32()?),
        format::expr::VAR => {
            let bank = reader.u8()?;
            Expr::Var(IntVar::new(bank, reader.u32()?))
        }
        format::expr::INDEXED => {
            let bank = IntBank(reader.u8()?);
            let index = decode_expr(reader, depth + 1)?;
            Expr::Indexed {
                bank,
                index: Box::new(index),
            }
        }
        format::expr::UNARY => {
            let op_offset = reader.offset();
            let code = reader.u8()?;
            let op = UnaryOp::from_code(code).ok_or(DecodeError::new(
                op_offset,
                DecodeFault::UnknownExpression {
                    kind: "unary",
                    code,
                },
            ))?;
            Expr::Unary(op, Box::new(decode_expr(reader, depth + 1)?))
        }
        format::expr::BINARY => {
            let op_offset = reader.offset();
            let code = reader.u8()?;
            let op = BinaryOp::from_code(code).ok_or(DecodeError::new(
                op_offset,
                DecodeFault::UnknownExpression {
                    kind: "binary",
                    code,
                },
            ))?;
            let lhs = decode_expr(reader, depth + 1)?;
            let rhs = decode_expr(reader, depth + 1)?;
            Expr::Binary(op, Box::new(lhs), Box::new(rhs))
        }
        code => {
            return Err(DecodeError::new(
                start,
                DecodeFault::UnknownExpression { kind: "node", code },
            ))
        }
    };
    Ok(expr)
}
