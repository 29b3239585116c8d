//! Integer expression evaluation.
//!
//! Arithmetic wraps on overflow. Comparisons and logical operators yield `0`
//! or `1`, and `&&`/`||` short-circuit.

use vnscript_bytecode::{BinaryOp, Expr, IntVar, UnaryOp};

use crate::error::{ExecutionError, Result};

/// Evaluate `expr`, reading variables through `read`.
pub fn evaluate(expr: &Expr, read: &dyn Fn(IntVar) -> i32) -> Result<i32> {
    match expr {
        Expr::Const(value) => Ok(*value),
        Expr::Var(var) => Ok(read(*var)),
        Expr::Indexed { bank, index } => {
            let index = evaluate(index, read)?;
            let index = u32::try_from(index).map_err(|_| {
                ExecutionError::invalid_operand(format!("negative index {index} into {bank}"))
            })?;
            Ok(read(IntVar { bank: *bank, index }))
        }
        Expr::Unary(op, operand) => {
            let value = evaluate(operand, read)?;
            Ok(match op {
                UnaryOp::Neg => value.wrapping_neg(),
                UnaryOp::Not => i32::from(value == 0),
                UnaryOp::BitNot => !value,
            })
        }
        Expr::Binary(BinaryOp::And, lhs, rhs) => {
            Ok(i32::from(evaluate(lhs, read)? != 0 && evaluate(rhs, read)? != 0))
        }
        Expr::Binary(BinaryOp::Or, lhs, rhs) => {
            Ok(i32::from(evaluate(lhs, read)? != 0 || evaluate(rhs, read)? != 0))
        }
        Expr::Binary(op, lhs, rhs) => {
            let lhs = evaluate(lhs, read)?;
            let rhs = evaluate(rhs, read)?;
            binary(*op, lhs, rhs)
        }
    }
}

fn binary(op: BinaryOp, lhs: i32, rhs: i32) -> Result<i32> {
    let value = match op {
        BinaryOp::Add => lhs.wrapping_add(rhs),
        BinaryOp::Sub => lhs.wrapping_sub(rhs),
        BinaryOp::Mul => lhs.wrapping_mul(rhs),
        BinaryOp::Div | BinaryOp::Mod if rhs == 0 => return Err(ExecutionError::DivisionByZero),
        BinaryOp::Div => lhs.wrapping_div(rhs),
        BinaryOp::Mod => lhs.wrapping_rem(rhs),
        BinaryOp::BitAnd => lhs & rhs,
        BinaryOp::BitOr => lhs | rhs,
        BinaryOp::BitXor => lhs ^ rhs,
        BinaryOp::Shl => lhs.wrapping_shl(rhs as u32),
        BinaryOp::Shr => lhs.wrapping_shr(rhs as u32),
        BinaryOp::Eq => i32::from(lhs == rhs),
        BinaryOp::Ne => i32::from(lhs != rhs),
        BinaryOp::Lt => i32::from(lhs < rhs),
        BinaryOp::Le => i32::from(lhs <= rhs),
        BinaryOp::Gt => i32::from(lhs > rhs),
        BinaryOp::Ge => i32::from(lhs >= rhs),
        BinaryOp::And => i32::from(lhs != 0 && rhs != 0),
        BinaryOp::Or => i32::from(lhs != 0 || rhs != 0),
    };
    Ok(value)
}
