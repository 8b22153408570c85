//! IR pretty-printer.
//!
//! Emits a human-readable text representation of an `IrModule`.
//! Output is deterministic: globals first, then functions in `FunctionId`
//! order, blocks in `BlockId` order, instructions in program order.

use std::fmt::Write;

use crate::ir::instr::IrInstr;
use crate::ir::module::IrModule;

/// Emits a full text dump of the IR module.
pub fn emit_ir_text(module: &IrModule) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    writeln!(out, "// module: {}", module.name)?;

    for global in module.globals() {
        writeln!(
            out,
            "{} = private constant \"{}\" ; {}",
            global.id,
            global.value.escape_default(),
            global.name
        )?;
    }

    for func in module.functions() {
        let keyword = if func.is_declaration() { "declare" } else { "def" };
        write!(out, "\n{} {}(", keyword, func.name)?;
        for (i, param) in func.params.iter().enumerate() {
            if i > 0 {
                write!(out, ", ")?;
            }
            write!(out, "{}: {}", param.name, param.ty)?;
        }
        write!(out, ") -> {}", func.return_ty)?;
        if func.is_declaration() {
            writeln!(out)?;
            continue;
        }
        writeln!(out, " {{")?;

        for block in func.blocks() {
            let label = block.name.as_deref().unwrap_or("bb");
            write!(out, "  {}{}(", label, block.id.0)?;
            for (i, param) in block.params.iter().enumerate() {
                if i > 0 {
                    write!(out, ", ")?;
                }
                let name = param.name.as_deref().unwrap_or("_");
                write!(out, "{} {}", param.id, name)?;
            }
            writeln!(out, "):")?;

            for inst in &block.instrs {
                write!(out, "    ")?;
                emit_instr(&mut out, &inst.op)?;
                if let Some(loc) = inst.loc {
                    write!(out, ", !dbg {}", loc)?;
                }
                writeln!(out)?;
            }
        }
        writeln!(out, "}}")?;
    }
    Ok(out)
}

fn join<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn emit_instr(out: &mut String, instr: &IrInstr) -> std::fmt::Result {
    match instr {
        IrInstr::BinOp {
            result,
            op,
            lhs,
            rhs,
            ty,
        } => write!(out, "{} = {} {} {}, {}", result, op, ty, lhs, rhs),
        IrInstr::ConstInt { result, value, ty } => {
            write!(out, "{} = const.i {} : {}", result, value, ty)
        }
        IrInstr::GlobalStrPtr { result, global } => write!(out, "{} = addr {}", result, global),
        IrInstr::FuncAddr { result, func, sig } => {
            write!(out, "{} = fnaddr @{} : {}", result, func, sig)
        }
        IrInstr::Cast {
            result,
            operand,
            from_ty,
            to_ty,
        } => write!(out, "{} = cast {} : {} to {}", result, operand, from_ty, to_ty),
        IrInstr::Call {
            result,
            callee,
            args,
            ..
        } => {
            if let Some(r) = result {
                write!(out, "{} = ", r)?;
            }
            write!(out, "call @{}({})", callee, join(args))
        }
        IrInstr::CallIndirect {
            result,
            callee,
            sig,
            args,
        } => {
            if let Some(r) = result {
                write!(out, "{} = ", r)?;
            }
            write!(out, "call {} {}({})", sig, callee, join(args))
        }
        IrInstr::LazydPerf {
            target,
            version,
            trip_count,
            granularity,
            depth,
        } => write!(
            out,
            "lazyd.perf {}, {}, {}, {}, {}",
            target, version, trip_count, granularity, depth
        ),
        IrInstr::Br { target, args } => write!(out, "br {}({})", target, join(args)),
        IrInstr::CondBr {
            cond,
            then_block,
            then_args,
            else_block,
            else_args,
        } => write!(
            out,
            "condbr {}, {}({}), {}({})",
            cond,
            then_block,
            join(then_args),
            else_block,
            join(else_args)
        ),
        IrInstr::Return { values } => write!(out, "return {}", join(values)),
    }
}
