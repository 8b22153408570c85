//! Integration tests for the pass pipeline.
//! Builds modules via the IR builder API and runs passes directly.

use lazyprof::error::PassError;
use lazyprof::ir::instr::IrInstr;
use lazyprof::ir::module::{IrFunctionBuilder, IrModule};
use lazyprof::ir::types::IrType;
use lazyprof::pass::profile::{perf_entry_sig, ProfilePerfPass, PASS_NAME, PERF_ENTRY};
use lazyprof::pass::registry::{ExtensionPoint, PassRegistry};
use lazyprof::pass::validate::ValidatePass;
use lazyprof::pass::PassManager;

fn build_profiled_module() -> IrModule {
    let mut module = IrModule::new("profiled");
    module.declare_function(PERF_ENTRY, &perf_entry_sig());
    let sp = module.debug_mut().add_subprogram("work", "_Z4workv", "w.c");
    let main_sp = module.debug_mut().add_subprogram("main", "main", "main.c");
    let marker_loc = module.debug_mut().add_location(4, 9, sp, None);
    let call_loc = module.debug_mut().add_location(11, 5, main_sp, None);

    let mut builder = IrFunctionBuilder::new("_Z4workv", vec![], IrType::Void);
    builder.set_subprogram(sp);
    let entry = builder.create_block(Some("entry"));
    builder.set_current_block(entry);
    builder.set_location(Some(marker_loc));
    let target = builder.emit_func_addr(PERF_ENTRY, perf_entry_sig());
    let version = builder.emit_const_int(0, IrType::i32());
    let trip_count = builder.emit_const_int(1024, IrType::i64());
    let granularity = builder.emit_const_int(16, IrType::i64());
    let depth = builder.emit_const_int(0, IrType::i32());
    builder.push_instr(
        IrInstr::LazydPerf {
            target,
            version,
            trip_count,
            granularity,
            depth,
        },
        None,
    );
    builder.push_instr(IrInstr::Return { values: vec![] }, None);
    module.add_function(builder.build()).unwrap();

    let mut builder = IrFunctionBuilder::new("main", vec![], IrType::Void);
    builder.set_subprogram(main_sp);
    let entry = builder.create_block(Some("entry"));
    let exit = builder.create_block(Some("exit"));
    builder.set_current_block(entry);
    builder.set_location(Some(call_loc));
    builder.emit_call("_Z4workv", vec![], None);
    builder.push_instr(
        IrInstr::Br {
            target: exit,
            args: vec![],
        },
        None,
    );
    builder.set_current_block(exit);
    builder.emit_call("_Z4workv", vec![], None);
    builder.push_instr(IrInstr::Return { values: vec![] }, None);
    module.add_function(builder.build()).unwrap();

    module
}

#[test]
fn test_validate_then_profile_then_validate() {
    let mut module = build_profiled_module();
    let mut pm = PassManager::new();
    pm.add_pass(ValidatePass);
    pm.add_pass(ProfilePerfPass);
    pm.add_pass(ValidatePass);
    assert_eq!(pm.pass_names(), vec!["validate", PASS_NAME, "validate"]);
    assert!(pm.run(&mut module).unwrap());

    // Calls in both blocks of main were instrumented.
    let main = module.function_by_name("main").unwrap();
    for block in main.blocks() {
        let callees: Vec<&str> = block
            .instrs
            .iter()
            .filter_map(|inst| inst.op.direct_callee())
            .collect();
        assert_eq!(callees, vec!["lazydProfilingCall", "_Z4workv"]);
    }
}

#[test]
fn test_pipeline_from_names() {
    let registry = PassRegistry::with_defaults();
    let mut pm = registry
        .parse_pipeline("profile-performance, validate")
        .unwrap();
    let mut module = build_profiled_module();
    assert!(pm.run(&mut module).unwrap());

    let mut again = registry.parse_pipeline(PASS_NAME).unwrap();
    assert!(!again.run(&mut module).unwrap());
}

#[test]
fn test_tapir_late_extension_point_runs_profiling() {
    let registry = PassRegistry::with_defaults();
    let mut pm = PassManager::new();
    assert_eq!(
        registry.populate_extension_point(ExtensionPoint::TapirLate, &mut pm),
        1
    );
    assert_eq!(
        registry.populate_extension_point(ExtensionPoint::OptimizerLast, &mut pm),
        0
    );
    let mut module = build_profiled_module();
    assert!(pm.run(&mut module).unwrap());
}

#[test]
fn test_pipeline_reports_failing_pass() {
    let mut module = IrModule::new("broken");
    let mut builder = IrFunctionBuilder::new("main", vec![], IrType::Void);
    let entry = builder.create_block(Some("entry"));
    builder.set_current_block(entry);
    builder.emit_call("missing", vec![], None);
    builder.push_instr(IrInstr::Return { values: vec![] }, None);
    module.add_function(builder.build()).unwrap();

    let mut pm = PassManager::new();
    pm.add_pass(ValidatePass);
    let (name, err) = pm.run(&mut module).unwrap_err();
    assert_eq!(name, "validate");
    assert!(matches!(err, PassError::UnknownCallee { .. }));
}

#[test]
fn test_dump_after_does_not_change_result() {
    let mut module = build_profiled_module();
    let mut pm = PassManager::new();
    pm.add_pass(ProfilePerfPass);
    pm.set_dump_after(PASS_NAME);
    assert!(pm.run(&mut module).unwrap());
}
