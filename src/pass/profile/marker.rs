use crate::error::PassError;
use crate::ir::debug::LocId;
use crate::ir::function::FunctionId;
use crate::ir::instr::{InstId, IrInstr};
use crate::ir::module::IrModule;
use crate::ir::types::IrType;
use crate::ir::value::ValueId;
use crate::pass::profile::location::{resolve_marker_location, ResolvedLocation};
use crate::pass::profile::perf_entry_sig;

/// Operands and resolved positions of one marker, gathered before mutation.
struct MarkerInfo {
    marker: InstId,
    loc: LocId,
    target: ValueId,
    target_ty: IrType,
    numeric: [ValueId; 4],
    resolved: ResolvedLocation,
}

/// Replaces every marker of `func` with a call to the runtime routine it
/// names, then erases the markers. Returns whether anything changed.
///
/// The call goes through the marker's own target operand, cast to the
/// runtime signature, and receives version, trip count, granularity,
/// depth, caller linkage name, source location and inline location.
pub(crate) fn rewrite_markers(
    module: &mut IrModule,
    func: FunctionId,
    markers: &[InstId],
) -> Result<bool, PassError> {
    if markers.is_empty() {
        return Ok(false);
    }

    let (owner, infos) = {
        let f = module.function(func).ok_or_else(|| PassError::StaleCallGraphEdge {
            func: format!("<function {}>", func.0),
            inst: "-".into(),
        })?;
        let mut infos = Vec::with_capacity(markers.len());
        for &marker in markers {
            let inst = f.inst(marker).ok_or_else(|| PassError::StaleCallGraphEdge {
                func: f.name.clone(),
                inst: marker.to_string(),
            })?;
            let IrInstr::LazydPerf {
                target,
                version,
                trip_count,
                granularity,
                depth,
            } = inst.op
            else {
                continue;
            };
            let loc = inst.loc.ok_or_else(|| PassError::MarkerWithoutDebugLoc {
                func: f.name.clone(),
                inst: marker.to_string(),
            })?;
            let target_ty = match f.value_type(target) {
                Some(ty) if ty.is_pointer() => ty.clone(),
                other => {
                    return Err(PassError::BadMarkerTarget {
                        func: f.name.clone(),
                        value: target.to_string(),
                        found: other.map(|t| t.to_string()).unwrap_or_else(|| "?".into()),
                    })
                }
            };
            let resolved = resolve_marker_location(module.debug(), loc, &f.name)?;
            infos.push(MarkerInfo {
                marker,
                loc,
                target,
                target_ty,
                numeric: [version, trip_count, granularity, depth],
                resolved,
            });
        }
        (f.name.clone(), infos)
    };

    let sig = perf_entry_sig();
    let fn_ptr_ty = IrType::FnPtr(Box::new(sig.clone()));

    for info in &infos {
        let caller_g =
            module.add_global_str("caller_linkname", info.resolved.caller_link.as_str());
        let loc_g = module.add_global_str("loc", info.resolved.source_loc.as_str());
        let iloc_g = module.add_global_str("iloc", info.resolved.inline_loc.as_str());

        let f = module
            .function_mut(func)
            .ok_or_else(|| PassError::StaleCallGraphEdge {
                func: owner.clone(),
                inst: info.marker.to_string(),
            })?;
        let loc = Some(info.loc);

        let callee = f.fresh_value();
        f.insert_before(
            info.marker,
            IrInstr::Cast {
                result: callee,
                operand: info.target,
                from_ty: info.target_ty.clone(),
                to_ty: fn_ptr_ty.clone(),
            },
            Some(fn_ptr_ty.clone()),
            loc,
        );

        let mut args: Vec<ValueId> = info.numeric.to_vec();
        for global in [caller_g, loc_g, iloc_g] {
            let result = f.fresh_value();
            f.insert_before(
                info.marker,
                IrInstr::GlobalStrPtr { result, global },
                Some(IrType::Ptr),
                loc,
            );
            args.push(result);
        }

        f.insert_before(
            info.marker,
            IrInstr::CallIndirect {
                result: None,
                callee,
                sig: sig.clone(),
                args,
            },
            None,
            loc,
        );

        tracing::debug!(
            func = %owner,
            caller = %info.resolved.caller_link,
            source = %info.resolved.source_loc,
            inlined_at = %info.resolved.inline_loc,
            inline_caller = %info.resolved.inline_subprogram,
            "rewrote lazy task marker"
        );
    }

    // Erase only once every replacement is in place.
    let f = module
        .function_mut(func)
        .ok_or_else(|| PassError::StaleCallGraphEdge {
            func: owner.clone(),
            inst: "-".into(),
        })?;
    for &marker in markers {
        f.erase(marker);
    }

    Ok(true)
}
