pub mod block;
pub mod debug;
pub mod function;
pub mod instr;
pub mod module;
pub mod types;
pub mod value;

pub use block::{BlockId, IrBlock};
pub use debug::{DebugInfo, DiLocation, DiScope, LocId, ScopeId};
pub use function::{FunctionId, IrFunction, Param};
pub use instr::{BinOp, Inst, InstId, IrInstr};
pub use module::{GlobalId, IrFunctionBuilder, IrGlobal, IrModule};
pub use types::{DType, FnSig, IrType};
pub use value::{BlockParam, ValueDef, ValueId};
