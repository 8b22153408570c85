use std::collections::HashMap;

use crate::ir::block::{BlockId, IrBlock};
use crate::ir::debug::{LocId, ScopeId};
use crate::ir::instr::{Inst, InstId, IrInstr};
use crate::ir::types::{FnSig, IrType};
use crate::ir::value::{ValueDef, ValueId};

/// Uniquely identifies a function within an `IrModule`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FunctionId(pub u32);

/// A named, typed parameter of a function.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub ty: IrType,
}

/// A function in SSA form, or a declaration of one defined elsewhere.
///
/// `name` is the linkage name: the identifier call sites refer to and the
/// one reported in profiling events. Declarations have no blocks.
///
/// The entry block is always `blocks[0]`; its block params are the
/// function arguments.
#[derive(Debug, Clone)]
pub struct IrFunction {
    pub id: FunctionId,
    pub name: String,
    pub params: Vec<Param>,
    pub return_ty: IrType,
    /// Debug scope of the function body, when debug info is present.
    pub subprogram: Option<ScopeId>,
    /// Flat list of blocks. `BlockId(n)` indexes `blocks[n]`.
    pub(crate) blocks: Vec<IrBlock>,
    /// Maps `ValueId` to its definition site.
    pub(crate) value_defs: HashMap<ValueId, ValueDef>,
    /// Maps `ValueId` to its type.
    pub(crate) value_types: HashMap<ValueId, IrType>,
    pub(crate) next_value: u32,
    pub(crate) next_inst: u32,
}

impl IrFunction {
    pub(crate) fn new(name: String, params: Vec<Param>, return_ty: IrType) -> Self {
        Self {
            id: FunctionId(0), // reassigned by IrModule::add_function
            name,
            params,
            return_ty,
            subprogram: None,
            blocks: Vec::new(),
            value_defs: HashMap::new(),
            value_types: HashMap::new(),
            next_value: 0,
            next_inst: 0,
        }
    }

    /// Creates a body-less declaration with the given signature.
    pub fn declaration(name: impl Into<String>, sig: &FnSig) -> Self {
        let params = sig
            .params
            .iter()
            .enumerate()
            .map(|(i, ty)| Param {
                name: format!("arg{}", i),
                ty: ty.clone(),
            })
            .collect();
        Self::new(name.into(), params, sig.ret.clone())
    }

    /// A declaration has no body; its definition lives in another unit.
    pub fn is_declaration(&self) -> bool {
        self.blocks.is_empty()
    }

    /// The function's signature as seen by callers.
    pub fn signature(&self) -> FnSig {
        FnSig::new(
            self.params.iter().map(|p| p.ty.clone()).collect(),
            self.return_ty.clone(),
        )
    }

    /// Returns the entry block. Panics on declarations.
    pub fn entry_block(&self) -> &IrBlock {
        &self.blocks[0]
    }

    pub fn block(&self, id: BlockId) -> Option<&IrBlock> {
        self.blocks.get(id.0 as usize)
    }

    pub fn blocks(&self) -> &[IrBlock] {
        &self.blocks
    }

    /// Iterates over every instruction in block order, then program order.
    pub fn instructions(&self) -> impl Iterator<Item = &Inst> + '_ {
        self.blocks.iter().flat_map(|b| b.instrs.iter())
    }

    /// Returns the type of a value, if known.
    pub fn value_type(&self, v: ValueId) -> Option<&IrType> {
        self.value_types.get(&v)
    }

    /// Returns the definition site of a value.
    pub fn value_def(&self, v: ValueId) -> Option<&ValueDef> {
        self.value_defs.get(&v)
    }

    /// Locates an instruction by id: its block and current position there.
    pub fn locate(&self, id: InstId) -> Option<(BlockId, usize)> {
        self.blocks
            .iter()
            .find_map(|b| b.position_of(id).map(|pos| (b.id, pos)))
    }

    pub fn inst(&self, id: InstId) -> Option<&Inst> {
        let (block, pos) = self.locate(id)?;
        self.blocks[block.0 as usize].instrs.get(pos)
    }

    /// Inserts `op` immediately before the instruction `anchor`.
    ///
    /// Returns the new instruction's id, or `None` if `anchor` is not in
    /// this function. Existing instruction ids are unaffected.
    pub fn insert_before(
        &mut self,
        anchor: InstId,
        op: IrInstr,
        result_ty: Option<IrType>,
        loc: Option<LocId>,
    ) -> Option<InstId> {
        let (block, pos) = self.locate(anchor)?;
        let id = self.fresh_inst();
        if let (Some(result), Some(ty)) = (op.result(), result_ty) {
            self.value_defs
                .insert(result, ValueDef::InstrResult { block, inst: id });
            self.value_types.insert(result, ty);
        }
        self.blocks[block.0 as usize]
            .instrs
            .insert(pos, Inst { id, op, loc });
        Some(id)
    }

    /// Removes the instruction `id` and returns it.
    ///
    /// The caller is responsible for the instruction having no remaining
    /// uses; the result value, if any, is forgotten.
    pub fn erase(&mut self, id: InstId) -> Option<Inst> {
        let (block, pos) = self.locate(id)?;
        let inst = self.blocks[block.0 as usize].instrs.remove(pos);
        if let Some(result) = inst.op.result() {
            self.value_defs.remove(&result);
            self.value_types.remove(&result);
        }
        Some(inst)
    }

    /// Allocates a fresh `ValueId`.
    pub fn fresh_value(&mut self) -> ValueId {
        let id = ValueId(self.next_value);
        self.next_value += 1;
        id
    }

    pub(crate) fn fresh_inst(&mut self) -> InstId {
        let id = InstId(self.next_inst);
        self.next_inst += 1;
        id
    }
}
