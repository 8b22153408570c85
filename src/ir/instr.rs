use crate::ir::block::BlockId;
use crate::ir::debug::LocId;
use crate::ir::module::GlobalId;
use crate::ir::types::{FnSig, IrType};
use crate::ir::value::ValueId;

/// Stable identifier of an instruction within its function.
///
/// Ids are allocated once and never reused or renumbered, so an `InstId`
/// recorded by an analysis stays valid while other instructions are
/// inserted or erased around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstId(pub u32);

impl std::fmt::Display for InstId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Binary integer operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    CmpEq,
    CmpLt,
}

impl std::fmt::Display for BinOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BinOp::Add => "add",
            BinOp::Sub => "sub",
            BinOp::Mul => "mul",
            BinOp::CmpEq => "cmpeq",
            BinOp::CmpLt => "cmplt",
        };
        f.write_str(s)
    }
}

/// A single operation in SSA form.
///
/// Invariants:
/// - Every operation that produces a value has exactly one result `ValueId`.
/// - Terminators (`Br`, `CondBr`, `Return`) are the last instruction in a block.
#[derive(Debug, Clone, PartialEq)]
pub enum IrInstr {
    // ---- Arithmetic ----
    BinOp {
        result: ValueId,
        op: BinOp,
        lhs: ValueId,
        rhs: ValueId,
        ty: IrType,
    },

    // ---- Constants and addresses ----
    ConstInt {
        result: ValueId,
        value: i64,
        ty: IrType,
    },
    /// Address of the first byte of a module string global.
    GlobalStrPtr { result: ValueId, global: GlobalId },
    /// Address of a function, typed by its signature.
    FuncAddr {
        result: ValueId,
        func: String,
        sig: FnSig,
    },
    /// Reinterpret a pointer value as another pointer type.
    Cast {
        result: ValueId,
        operand: ValueId,
        from_ty: IrType,
        to_ty: IrType,
    },

    // ---- Calls ----
    /// Direct call to a named function.
    Call {
        result: Option<ValueId>,
        callee: String,
        args: Vec<ValueId>,
        result_ty: Option<IrType>,
    },
    /// Call through a function pointer value.
    CallIndirect {
        result: Option<ValueId>,
        callee: ValueId,
        sig: FnSig,
        args: Vec<ValueId>,
    },

    /// Placeholder left by the front end at a lazy task-creation site.
    ///
    /// `target` holds the address of the runtime routine the site should
    /// eventually call; the remaining operands are the values it receives.
    LazydPerf {
        target: ValueId,
        version: ValueId,
        trip_count: ValueId,
        granularity: ValueId,
        depth: ValueId,
    },

    // ---- Control flow (terminators) ----
    Br {
        target: BlockId,
        args: Vec<ValueId>,
    },
    CondBr {
        cond: ValueId,
        then_block: BlockId,
        then_args: Vec<ValueId>,
        else_block: BlockId,
        else_args: Vec<ValueId>,
    },
    Return {
        values: Vec<ValueId>,
    },
}

impl IrInstr {
    /// Returns the `ValueId` produced by this instruction, if any.
    pub fn result(&self) -> Option<ValueId> {
        match self {
            IrInstr::BinOp { result, .. } => Some(*result),
            IrInstr::ConstInt { result, .. } => Some(*result),
            IrInstr::GlobalStrPtr { result, .. } => Some(*result),
            IrInstr::FuncAddr { result, .. } => Some(*result),
            IrInstr::Cast { result, .. } => Some(*result),
            IrInstr::Call { result, .. } => *result,
            IrInstr::CallIndirect { result, .. } => *result,
            IrInstr::LazydPerf { .. } => None,
            IrInstr::Br { .. } | IrInstr::CondBr { .. } | IrInstr::Return { .. } => None,
        }
    }

    /// Returns `true` if this instruction is a block terminator.
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            IrInstr::Br { .. } | IrInstr::CondBr { .. } | IrInstr::Return { .. }
        )
    }

    /// Returns `true` for the lazy task-creation placeholder.
    pub fn is_marker(&self) -> bool {
        matches!(self, IrInstr::LazydPerf { .. })
    }

    /// Returns `true` for operations that transfer control to another function.
    pub fn is_call(&self) -> bool {
        matches!(self, IrInstr::Call { .. } | IrInstr::CallIndirect { .. })
    }

    /// Name of the statically known callee, if this is a direct call.
    pub fn direct_callee(&self) -> Option<&str> {
        match self {
            IrInstr::Call { callee, .. } => Some(callee),
            _ => None,
        }
    }

    /// Returns all `ValueId`s consumed by this instruction (operands).
    pub fn operands(&self) -> Vec<ValueId> {
        match self {
            IrInstr::BinOp { lhs, rhs, .. } => vec![*lhs, *rhs],
            IrInstr::ConstInt { .. } => vec![],
            IrInstr::GlobalStrPtr { .. } => vec![],
            IrInstr::FuncAddr { .. } => vec![],
            IrInstr::Cast { operand, .. } => vec![*operand],
            IrInstr::Call { args, .. } => args.clone(),
            IrInstr::CallIndirect { callee, args, .. } => {
                let mut ops = vec![*callee];
                ops.extend_from_slice(args);
                ops
            }
            IrInstr::LazydPerf {
                target,
                version,
                trip_count,
                granularity,
                depth,
            } => vec![*target, *version, *trip_count, *granularity, *depth],
            IrInstr::Br { args, .. } => args.clone(),
            IrInstr::CondBr {
                cond,
                then_args,
                else_args,
                ..
            } => {
                let mut ops = vec![*cond];
                ops.extend_from_slice(then_args);
                ops.extend_from_slice(else_args);
                ops
            }
            IrInstr::Return { values } => values.clone(),
        }
    }
}

/// An instruction together with its identity and source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Inst {
    pub id: InstId,
    pub op: IrInstr,
    pub loc: Option<LocId>,
}
