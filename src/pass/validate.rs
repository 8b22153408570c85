//! SSA validation pass.
//!
//! Checks structural correctness of an `IrModule`. Run it after
//! instrumentation to make sure every rewrite left the IR well-formed.
//! This pass never modifies the module.

use std::collections::HashSet;

use crate::error::PassError;
use crate::ir::block::IrBlock;
use crate::ir::function::IrFunction;
use crate::ir::instr::{Inst, IrInstr};
use crate::ir::module::IrModule;
use crate::ir::value::ValueId;
use crate::pass::Pass;

/// Validates SSA invariants across the entire module.
///
/// Checks, per defined function:
/// 1. Every operand is defined earlier in block order.
/// 2. Every value is defined exactly once.
/// 3. Every block ends with its only terminator.
/// 4. Direct calls name a function of the module, indirect calls pass as
///    many arguments as their signature takes, and string addresses name
///    an existing global.
pub struct ValidatePass;

impl Pass for ValidatePass {
    fn name(&self) -> &'static str {
        "validate"
    }

    fn run(&mut self, module: &mut IrModule) -> Result<bool, PassError> {
        for func in module.defined_functions() {
            FunctionChecker::new(module, func).check()?;
        }
        Ok(false)
    }
}

struct FunctionChecker<'a> {
    module: &'a IrModule,
    func: &'a IrFunction,
    defined: HashSet<ValueId>,
}

impl<'a> FunctionChecker<'a> {
    fn new(module: &'a IrModule, func: &'a IrFunction) -> Self {
        Self {
            module,
            func,
            defined: HashSet::new(),
        }
    }

    fn check(mut self) -> Result<(), PassError> {
        let func = self.func;
        for block in func.blocks() {
            self.check_block(block)?;
        }
        Ok(())
    }

    fn define(&mut self, value: ValueId) -> Result<(), PassError> {
        if self.defined.insert(value) {
            Ok(())
        } else {
            Err(PassError::MultipleDefinition {
                func: self.func.name.clone(),
                value: value.to_string(),
            })
        }
    }

    fn check_block(&mut self, block: &IrBlock) -> Result<(), PassError> {
        let missing_terminator = || PassError::MissingTerminator {
            func: self.func.name.clone(),
            block: block
                .name
                .clone()
                .unwrap_or_else(|| block.id.to_string()),
        };

        if !block.is_sealed() {
            return Err(missing_terminator());
        }
        let last = block.instrs.len() - 1;
        if block.instrs[..last].iter().any(|i| i.op.is_terminator()) {
            return Err(missing_terminator());
        }

        for param in &block.params {
            self.define(param.id)?;
        }
        for inst in &block.instrs {
            self.check_inst(inst)?;
        }
        Ok(())
    }

    fn check_inst(&mut self, inst: &Inst) -> Result<(), PassError> {
        let func = &self.func.name;
        if let Some(operand) = inst.op.operands().into_iter().find(|v| !self.defined.contains(v)) {
            return Err(PassError::UseBeforeDef {
                func: func.clone(),
                value: operand.to_string(),
            });
        }

        match &inst.op {
            IrInstr::Call { callee, .. } if self.module.function_by_name(callee).is_none() => {
                return Err(PassError::UnknownCallee {
                    func: func.clone(),
                    callee: callee.clone(),
                });
            }
            IrInstr::CallIndirect { callee, sig, args, .. } if sig.params.len() != args.len() => {
                return Err(PassError::ArityMismatch {
                    func: func.clone(),
                    callee: callee.to_string(),
                    expected: sig.params.len(),
                    found: args.len(),
                });
            }
            IrInstr::GlobalStrPtr { global, .. } if self.module.global(*global).is_none() => {
                return Err(PassError::UnknownGlobal {
                    func: func.clone(),
                    global: global.to_string(),
                });
            }
            _ => {}
        }

        if let Some(result) = inst.op.result() {
            self.define(result)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::module::{GlobalId, IrFunctionBuilder};
    use crate::ir::types::{FnSig, IrType};

    fn module_with(build: impl FnOnce(&mut IrFunctionBuilder)) -> IrModule {
        let mut module = IrModule::new("m");
        let mut b = IrFunctionBuilder::new("f", vec![], IrType::Void);
        let entry = b.create_block(Some("entry"));
        b.set_current_block(entry);
        build(&mut b);
        b.push_instr(IrInstr::Return { values: vec![] }, None);
        module.add_function(b.build()).unwrap();
        module
    }

    #[test]
    fn rejects_indirect_call_with_wrong_arity() {
        let mut module = module_with(|b| {
            let sig = FnSig::new(vec![IrType::Ptr], IrType::Void);
            let callee = b.emit_func_addr("g", sig.clone());
            b.push_instr(
                IrInstr::CallIndirect {
                    result: None,
                    callee,
                    sig,
                    args: vec![],
                },
                None,
            );
        });
        let err = ValidatePass.run(&mut module).unwrap_err();
        assert!(matches!(err, PassError::ArityMismatch { expected: 1, found: 0, .. }));
    }

    #[test]
    fn rejects_dangling_string_global() {
        let mut module = module_with(|b| {
            let result = b.fresh_value();
            b.push_instr(
                IrInstr::GlobalStrPtr {
                    result,
                    global: GlobalId(3),
                },
                Some(IrType::Ptr),
            );
        });
        let err = ValidatePass.run(&mut module).unwrap_err();
        assert!(matches!(err, PassError::UnknownGlobal { .. }));
    }

    #[test]
    fn accepts_well_formed_function() {
        let mut module = module_with(|b| {
            b.emit_const_int(1, IrType::i32());
        });
        assert!(!ValidatePass.run(&mut module).unwrap());
    }
}
