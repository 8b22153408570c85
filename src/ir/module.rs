use std::collections::HashMap;

use crate::ir::block::{BlockId, IrBlock};
use crate::ir::debug::{DebugInfo, LocId, ScopeId};
use crate::ir::function::{FunctionId, IrFunction, Param};
use crate::ir::instr::{Inst, InstId, IrInstr};
use crate::ir::types::{FnSig, IrType};
use crate::ir::value::{BlockParam, ValueDef, ValueId};

/// Index of a string global in `IrModule::globals`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GlobalId(pub u32);

impl std::fmt::Display for GlobalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "@g{}", self.0)
    }
}

/// A private, constant, NUL-terminated string visible at run time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrGlobal {
    pub id: GlobalId,
    /// Unique symbol name within the module.
    pub name: String,
    pub value: String,
}

/// The top-level IR container: one compilation unit.
///
/// Invariants:
/// - Function names are unique within a module.
/// - `FunctionId(n)` always indexes `functions[n]`.
/// - Global names are unique; `GlobalId(n)` always indexes `globals[n]`.
#[derive(Debug, Default)]
pub struct IrModule {
    pub name: String,
    pub(crate) functions: Vec<IrFunction>,
    pub(crate) function_index: HashMap<String, FunctionId>,
    pub(crate) globals: Vec<IrGlobal>,
    global_names: HashMap<String, u32>,
    pub(crate) debug: DebugInfo,
}

impl IrModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn function(&self, id: FunctionId) -> Option<&IrFunction> {
        self.functions.get(id.0 as usize)
    }

    pub(crate) fn function_mut(&mut self, id: FunctionId) -> Option<&mut IrFunction> {
        self.functions.get_mut(id.0 as usize)
    }

    pub fn function_by_name(&self, name: &str) -> Option<&IrFunction> {
        let id = self.function_index.get(name)?;
        self.functions.get(id.0 as usize)
    }

    pub fn function_id(&self, name: &str) -> Option<FunctionId> {
        self.function_index.get(name).copied()
    }

    pub fn functions(&self) -> &[IrFunction] {
        &self.functions
    }

    /// Iterates over functions that have a body.
    pub fn defined_functions(&self) -> impl Iterator<Item = &IrFunction> + '_ {
        self.functions.iter().filter(|f| !f.is_declaration())
    }

    /// Registers a function built by `IrFunctionBuilder` (or a declaration).
    /// Returns `Err` if the name is already taken.
    pub fn add_function(&mut self, mut func: IrFunction) -> Result<FunctionId, String> {
        if self.function_index.contains_key(&func.name) {
            return Err(format!("function '{}' already defined", func.name));
        }
        let id = FunctionId(self.functions.len() as u32);
        func.id = id;
        self.function_index.insert(func.name.clone(), id);
        self.functions.push(func);
        Ok(id)
    }

    /// Returns the function named `name`, declaring it with `sig` if absent.
    pub fn declare_function(&mut self, name: &str, sig: &FnSig) -> FunctionId {
        if let Some(id) = self.function_id(name) {
            return id;
        }
        let id = FunctionId(self.functions.len() as u32);
        let mut decl = IrFunction::declaration(name, sig);
        decl.id = id;
        self.function_index.insert(name.to_owned(), id);
        self.functions.push(decl);
        id
    }

    /// Adds a string global. `hint` becomes the symbol name, suffixed with
    /// `.N` when already used.
    pub fn add_global_str(&mut self, hint: &str, value: impl Into<String>) -> GlobalId {
        let id = GlobalId(self.globals.len() as u32);
        let counter = self.global_names.entry(hint.to_owned()).or_insert(0);
        let name = if *counter == 0 {
            hint.to_owned()
        } else {
            format!("{}.{}", hint, counter)
        };
        *counter += 1;
        self.globals.push(IrGlobal {
            id,
            name,
            value: value.into(),
        });
        id
    }

    pub fn global(&self, id: GlobalId) -> Option<&IrGlobal> {
        self.globals.get(id.0 as usize)
    }

    pub fn globals(&self) -> &[IrGlobal] {
        &self.globals
    }

    pub fn debug(&self) -> &DebugInfo {
        &self.debug
    }

    pub fn debug_mut(&mut self) -> &mut DebugInfo {
        &mut self.debug
    }
}

/// Builder for constructing an `IrFunction` incrementally.
///
/// Call order:
/// 1. `create_block()`: allocate one or more blocks
/// 2. `add_block_param()`: add typed params to each block
/// 3. `set_current_block()`: point the cursor at a block
/// 4. `set_location()`: optionally attach a debug location to what follows
/// 5. `push_instr()`: emit instructions into the current block
/// 6. `build()`: consume the builder and return the completed `IrFunction`
///
/// `build()` panics in debug builds if any block lacks a terminator.
pub struct IrFunctionBuilder {
    func: IrFunction,
    current_block: Option<BlockId>,
    current_loc: Option<LocId>,
    last_inst: Option<InstId>,
}

impl IrFunctionBuilder {
    pub fn new(name: impl Into<String>, params: Vec<Param>, return_ty: IrType) -> Self {
        Self {
            func: IrFunction::new(name.into(), params, return_ty),
            current_block: None,
            current_loc: None,
            last_inst: None,
        }
    }

    /// Attaches the function's debug scope.
    pub fn set_subprogram(&mut self, scope: ScopeId) {
        self.func.subprogram = Some(scope);
    }

    /// Creates a new block and returns its `BlockId`.
    pub fn create_block(&mut self, name: Option<&str>) -> BlockId {
        let id = BlockId(self.func.blocks.len() as u32);
        self.func
            .blocks
            .push(IrBlock::new(id, name.map(str::to_owned)));
        id
    }

    /// Adds a typed parameter to a block. Returns the `ValueId` of the new param.
    pub fn add_block_param(&mut self, block: BlockId, name: Option<&str>, ty: IrType) -> ValueId {
        let value_id = self.func.fresh_value();
        let param = BlockParam {
            id: value_id,
            ty: ty.clone(),
            name: name.map(str::to_owned),
        };
        self.func.blocks[block.0 as usize].params.push(param);
        self.func
            .value_defs
            .insert(value_id, ValueDef::BlockParam { block });
        self.func.value_types.insert(value_id, ty);
        value_id
    }

    /// Returns the current insertion block.
    pub fn current_block(&self) -> BlockId {
        self.current_block.expect("IrFunctionBuilder: no current block set")
    }

    /// Sets the current insertion block.
    pub fn set_current_block(&mut self, block: BlockId) {
        self.current_block = Some(block);
    }

    /// Debug location attached to every instruction pushed from now on.
    pub fn set_location(&mut self, loc: Option<LocId>) {
        self.current_loc = loc;
    }

    /// Id of the most recently pushed instruction.
    pub fn last_inst(&self) -> Option<InstId> {
        self.last_inst
    }

    /// Appends an instruction to the current block.
    ///
    /// `result_ty` is the type of the instruction's result value, if any.
    /// It must be `Some` iff the instruction produces a result.
    pub fn push_instr(&mut self, instr: IrInstr, result_ty: Option<IrType>) -> Option<ValueId> {
        self.append(instr, result_ty).1
    }

    fn append(&mut self, instr: IrInstr, result_ty: Option<IrType>) -> (InstId, Option<ValueId>) {
        let block_id = self
            .current_block
            .expect("IrFunctionBuilder: no current block set before push_instr");

        debug_assert!(
            !self.func.blocks[block_id.0 as usize].is_sealed(),
            "push_instr called on already-sealed block {:?}",
            block_id
        );

        let id = self.func.fresh_inst();
        let result = instr.result();
        if let (Some(result_id), Some(ty)) = (result, result_ty) {
            self.func.value_defs.insert(
                result_id,
                ValueDef::InstrResult {
                    block: block_id,
                    inst: id,
                },
            );
            self.func.value_types.insert(result_id, ty);
        }

        self.func.blocks[block_id.0 as usize].instrs.push(Inst {
            id,
            op: instr,
            loc: self.current_loc,
        });
        self.last_inst = Some(id);
        (id, result)
    }

    /// Allocates a fresh `ValueId` without attaching it to any instruction.
    pub fn fresh_value(&mut self) -> ValueId {
        self.func.fresh_value()
    }

    /// Emits a `ConstInt` instruction and returns the result `ValueId`.
    pub fn emit_const_int(&mut self, value: i64, ty: IrType) -> ValueId {
        let result = self.func.fresh_value();
        self.push_instr(
            IrInstr::ConstInt {
                result,
                value,
                ty: ty.clone(),
            },
            Some(ty),
        );
        result
    }

    /// Emits the address of function `func` with signature `sig`.
    pub fn emit_func_addr(&mut self, func: &str, sig: FnSig) -> ValueId {
        let result = self.func.fresh_value();
        let ty = IrType::FnPtr(Box::new(sig.clone()));
        self.push_instr(
            IrInstr::FuncAddr {
                result,
                func: func.to_owned(),
                sig,
            },
            Some(ty),
        );
        result
    }

    /// Emits a direct call and returns its id. The result, if any, is
    /// available through the returned instruction.
    pub fn emit_call(
        &mut self,
        callee: &str,
        args: Vec<ValueId>,
        result_ty: Option<IrType>,
    ) -> (InstId, Option<ValueId>) {
        let result = result_ty.as_ref().map(|_| self.func.fresh_value());
        self.append(
            IrInstr::Call {
                result,
                callee: callee.to_owned(),
                args,
                result_ty: result_ty.clone(),
            },
            result_ty,
        )
    }

    /// Consumes the builder and returns the completed `IrFunction`.
    ///
    /// Panics in debug builds if any block is not sealed (lacks a terminator).
    pub fn build(self) -> IrFunction {
        #[cfg(debug_assertions)]
        for block in &self.func.blocks {
            assert!(
                block.is_sealed(),
                "build() called with unsealed block {:?} ('{:?}')",
                block.id,
                block.name
            );
        }
        self.func
    }
}
