use std::collections::BTreeSet;

use crate::error::PassError;
use crate::ir::debug::LocId;
use crate::ir::function::FunctionId;
use crate::ir::instr::{InstId, IrInstr};
use crate::ir::module::IrModule;
use crate::ir::types::IrType;
use crate::pass::profile::location::resolve_physical_location;
use crate::pass::profile::{call_entry_sig, CALL_ENTRY};

/// Strings reported for one delegation site.
struct CallSiteInfo {
    site: InstId,
    callee: String,
    callsite_loc: String,
    loc: LocId,
}

/// Inserts a delegation event right before every recorded call site of
/// `func`. Returns whether anything was inserted.
pub(crate) fn instrument_call_sites(
    module: &mut IrModule,
    func: FunctionId,
    sites: &BTreeSet<InstId>,
) -> Result<bool, PassError> {
    if sites.is_empty() {
        return Ok(false);
    }

    let (caller, infos) = {
        let f = module
            .function(func)
            .ok_or_else(|| PassError::StaleCallGraphEdge {
                func: format!("<function {}>", func.0),
                inst: "-".into(),
            })?;
        let mut infos = Vec::with_capacity(sites.len());
        for &site in sites {
            let inst = f.inst(site).ok_or_else(|| PassError::StaleCallGraphEdge {
                func: f.name.clone(),
                inst: site.to_string(),
            })?;
            let callee = inst
                .op
                .direct_callee()
                .ok_or_else(|| PassError::UnresolvedCallee {
                    func: f.name.clone(),
                    inst: site.to_string(),
                })?
                .to_owned();
            let loc = inst.loc.ok_or_else(|| PassError::CallSiteWithoutDebugLoc {
                func: f.name.clone(),
                inst: site.to_string(),
            })?;
            let callsite_loc = resolve_physical_location(module.debug(), loc, &f.name)?;
            infos.push(CallSiteInfo {
                site,
                callee,
                callsite_loc,
                loc,
            });
        }
        (f.name.clone(), infos)
    };

    let sig = call_entry_sig();
    module.declare_function(CALL_ENTRY, &sig);

    for info in infos {
        let callee_g = module.add_global_str("callee_linkname", info.callee.as_str());
        let loc_g = module.add_global_str("callsite_loc", info.callsite_loc.as_str());
        let caller_g = module.add_global_str("caller_linkname", caller.as_str());

        let f = module
            .function_mut(func)
            .ok_or_else(|| PassError::StaleCallGraphEdge {
                func: caller.clone(),
                inst: info.site.to_string(),
            })?;

        let mut args = Vec::with_capacity(3);
        for global in [callee_g, loc_g, caller_g] {
            let result = f.fresh_value();
            f.insert_before(
                info.site,
                IrInstr::GlobalStrPtr { result, global },
                Some(IrType::Ptr),
                Some(info.loc),
            );
            args.push(result);
        }
        f.insert_before(
            info.site,
            IrInstr::Call {
                result: None,
                callee: CALL_ENTRY.to_owned(),
                args,
                result_ty: None,
            },
            None,
            Some(info.loc),
        );

        tracing::debug!(
            caller = %caller,
            callee = %info.callee,
            location = %info.callsite_loc,
            "instrumented delegation call site"
        );
    }

    Ok(true)
}
