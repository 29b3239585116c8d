//! Instruction encoder.
//!
//! Inverse of [`crate::decode`]: every element the decoder produces encodes
//! back to the exact bytes it was decoded from. Used by tooling and by tests
//! that build archives from element lists.

use crate::element::{Argument, Command, Expr, InstructionElement, Marker, Payload, MAX_OPCODE};
use crate::error::EncodeError;
use crate::format::{self, SCENARIO_MAGIC, SCENARIO_VERSION};
use crate::scenario::Scenario;

/// Encode a complete scenario blob (header and element stream).
pub fn encode_scenario(scenario: &Scenario) -> Result<Vec<u8>, EncodeError> {
    let stream = encode_elements(scenario.elements())?;
    let stream_len = length_u32("element stream", stream.len())?;
    let mut out = Vec::with_capacity(format::SCENARIO_HEADER_LEN + stream.len());
    out.extend_from_slice(&SCENARIO_MAGIC);
    out.extend_from_slice(&SCENARIO_VERSION.to_le_bytes());
    out.push(scenario.encoding().code());
    out.push(0);
    out.extend_from_slice(&stream_len.to_le_bytes());
    out.extend_from_slice(&stream);
    Ok(out)
}

/// Encode a bare element stream.
pub fn encode_elements(elements: &[InstructionElement]) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::new();
    for element in elements {
        encode_element(&mut out, element)?;
    }
    Ok(out)
}

fn encode_element(out: &mut Vec<u8>, element: &InstructionElement) -> Result<(), EncodeError> {
    match element {
        InstructionElement::Marker(Marker::Line(line)) => {
            out.push(format::element::LINE);
            out.extend_from_slice(&line.to_le_bytes());
        }
        InstructionElement::Marker(Marker::Entrypoint(entry)) => {
            out.push(format::element::ENTRYPOINT);
            out.push(*entry);
        }
        InstructionElement::Marker(Marker::Label(label)) => {
            out.push(format::element::LABEL);
            out.extend_from_slice(&label.to_le_bytes());
        }
        InstructionElement::RawData(bytes) => {
            out.push(format::element::RAW_DATA);
            out.extend_from_slice(&length_u32("raw data", bytes.len())?.to_le_bytes());
            out.extend_from_slice(bytes);
        }
        InstructionElement::Command(command) => encode_command(out, command)?,
    }
    Ok(())
}

fn encode_command(out: &mut Vec<u8>, command: &Command) -> Result<(), EncodeError> {
    if command.opcode > MAX_OPCODE {
        return Err(EncodeError::OpcodeOutOfRange(command.opcode));
    }
    let argc = u16::try_from(command.arguments.len())
        .map_err(|_| EncodeError::TooManyArguments(command.arguments.len()))?;

    let mut body = Vec::new();
    for argument in &command.arguments {
        encode_argument(&mut body, argument)?;
    }
    match &command.payload {
        None => {}
        Some(Payload::Text(bytes)) => {
            body.push(format::payload::TEXT);
            body.extend_from_slice(bytes);
        }
        Some(Payload::Array(items)) => {
            let count = u16::try_from(items.len())
                .map_err(|_| EncodeError::TooManyArguments(items.len()))?;
            body.push(format::payload::ARRAY);
            body.extend_from_slice(&count.to_le_bytes());
            for item in items {
                encode_argument(&mut body, item)?;
            }
        }
        Some(Payload::Opaque { tag, bytes }) => {
            body.push(*tag);
            body.extend_from_slice(bytes);
        }
    }

    out.push(format::element::COMMAND);
    out.push(command.module_type);
    out.push(command.module_number);
    out.extend_from_slice(&command.opcode.to_le_bytes()[..3]);
    out.push(command.overload);
    out.extend_from_slice(&argc.to_le_bytes());
    out.extend_from_slice(&length_u32("command body", body.len())?.to_le_bytes());
    out.extend_from_slice(&body);
    Ok(())
}

fn encode_argument(out: &mut Vec<u8>, argument: &Argument) -> Result<(), EncodeError> {
    let (tag, body) = match argument {
        Argument::Int(value) => (format::argument::INT, value.to_le_bytes().to_vec()),
        Argument::IntVar(var) => {
            let mut body = vec![var.bank.0];
            body.extend_from_slice(&var.index.to_le_bytes());
            (format::argument::INT_VAR, body)
        }
        Argument::Str(bytes) => (format::argument::STR, bytes.clone()),
        Argument::StrVar(index) => (format::argument::STR_VAR, index.to_le_bytes().to_vec()),
        Argument::Expr(expr) => {
            let mut body = Vec::new();
            encode_expr(&mut body, expr);
            (format::argument::EXPR, body)
        }
        Argument::Label(label) => (format::argument::LABEL, label.to_le_bytes().to_vec()),
        Argument::Opaque { tag, bytes } => (*tag, bytes.clone()),
    };
    let len = u16::try_from(body.len()).map_err(|_| EncodeError::TooLong {
        what: "argument",
        len: body.len(),
    })?;
    out.push(tag);
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(&body);
    Ok(())
}

fn encode_expr(out: &mut Vec<u8>, expr: &Expr) {
    match expr {
        Expr::Const(value) => {
            out.push(format::expr::CONST);
            out.extend_from_slice(&value.to_le_bytes());
        }
        Expr::Var(var) => {
            out.push(format::expr::VAR);
            out.push(var.bank.0);
            out.extend_from_slice(&var.index.to_le_bytes());
        }
        Expr::Indexed { bank, index } => {
            out.push(format::expr::INDEXED);
            out.push(bank.0);
            encode_expr(out, index);
        }
        Expr::Unary(op, operand) => {
            out.push(format::expr::UNARY);
            out.push(op.code());
            encode_expr(out, operand);
        }
        Expr::Binary(op, lhs, rhs) => {
            out.push(format::expr::BINARY);
            out.push(op.code());
            encode_expr(out, lhs);
            encode_expr(out, rhs);
        }
    }
}

fn length_u32(what: &'static str, len: usize) -> Result<u32, EncodeError> {
    u32::try_from(len).map_err(|_| EncodeError::TooLong { what, len })
}
