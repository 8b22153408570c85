//! Integration tests for the run-time event logger.

use std::sync::Arc;

use proptest::prelude::*;

use lazyprof::ir::instr::IrInstr;
use lazyprof::ir::module::{IrFunctionBuilder, IrModule};
use lazyprof::ir::types::IrType;
use lazyprof::pass::call_graph::CallGraph;
use lazyprof::pass::profile::{instrument, perf_entry_sig, CALL_ENTRY, PERF_ENTRY};
use lazyprof::report::Report;
use lazyprof::runtime::{CallContext, LogEntry, Logger, LoggerConfig};

fn intrinsic(n: u64) -> LogEntry {
    LogEntry::Intrinsic {
        version: 1,
        trip_count: n,
        granularity: 4,
        depth: 0,
        caller_link: "kernel".into(),
        source_loc: "k.c:1:1".into(),
        inline_loc: "k.c:1:1".into(),
    }
}

#[test]
fn test_thousand_events_flush_exactly_once() {
    let logger = Logger::with_sink(Vec::new(), 1000);
    for n in 0..1000 {
        logger.emit(intrinsic(n)).unwrap();
    }
    assert_eq!(logger.flushes(), 1);
    assert_eq!(logger.buffered(), 0);
    assert_eq!(logger.written(), 1000);
}

#[test]
fn test_partial_buffer_waits_for_finalize() {
    let logger = Logger::with_sink(Vec::new(), 1000);
    for n in 0..1500 {
        logger.emit(intrinsic(n)).unwrap();
    }
    assert_eq!(logger.flushes(), 1);
    assert_eq!(logger.buffered(), 500);

    let out = String::from_utf8(logger.finalize().unwrap()).unwrap();
    assert_eq!(out.lines().count(), 1500);
    assert!(out.lines().all(|l| l.starts_with("builtin,1,")));
}

#[test]
fn test_finalize_on_empty_logger_writes_nothing() {
    let logger = Logger::with_sink(Vec::new(), 1000);
    assert!(logger.finalize().unwrap().is_empty());
}

#[test]
fn test_concurrent_emitters_never_interleave_lines() {
    let logger = Arc::new(Logger::with_sink(Vec::new(), 64));
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let logger = Arc::clone(&logger);
            std::thread::spawn(move || {
                let ctx = CallContext::at_depth(t);
                for n in 0..250 {
                    logger
                        .record_call(&ctx, &format!("f{}_{}", t, n), "main.c:1:1", "main")
                        .unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let logger = Arc::try_unwrap(logger).ok().unwrap();
    let out = String::from_utf8(logger.finalize().unwrap()).unwrap();
    assert_eq!(out.lines().count(), 8 * 250);
    for line in out.lines() {
        let entry: LogEntry = line.parse().unwrap();
        assert!(matches!(entry, LogEntry::Call { .. }));
    }
}

#[test]
fn test_file_logger_writes_testname_perf_log() {
    let dir = tempfile::tempdir().unwrap();
    let config = LoggerConfig::new("wc").with_output_dir(dir.path());
    let logger = Logger::create(&config).unwrap();
    logger.emit(intrinsic(7)).unwrap();
    logger
        .record_call(&CallContext::root(), "kernel", "main.c:7:1", "main")
        .unwrap();
    drop(logger.finalize().unwrap());

    let text = std::fs::read_to_string(dir.path().join("wc.perf.log")).unwrap();
    assert_eq!(
        text,
        "builtin,1,7,4,0,kernel,k.c:1:1,k.c:1:1\ncalledat,kernel,main.c:7:1,main,0\n"
    );
}

#[test]
fn test_file_logger_dropped_without_finalize_keeps_entries() {
    let dir = tempfile::tempdir().unwrap();
    let config = LoggerConfig::new("dropped").with_output_dir(dir.path());
    let logger = Arc::new(Logger::create(&config).unwrap());
    let worker = Arc::clone(&logger);
    logger.emit(intrinsic(1)).unwrap();
    logger.flush().unwrap();
    drop(logger);
    worker.emit(intrinsic(2)).unwrap();
    drop(worker);

    let text = std::fs::read_to_string(dir.path().join("dropped.perf.log")).unwrap();
    assert_eq!(
        text,
        "builtin,1,1,4,0,kernel,k.c:1:1,k.c:1:1\nbuiltin,1,2,4,0,kernel,k.c:1:1,k.c:1:1\n"
    );
}

#[test]
fn test_unwritable_output_dir_is_an_open_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = LoggerConfig::new("x").with_output_dir(dir.path().join("missing"));
    assert!(matches!(
        Logger::create(&config),
        Err(lazyprof::error::LogError::Open { .. })
    ));
}

/// Reads the string global behind a `GlobalStrPtr` argument.
fn string_arg(module: &IrModule, func: &str, value: lazyprof::ir::value::ValueId) -> String {
    let f = module.function_by_name(func).unwrap();
    let global = f
        .instructions()
        .find_map(|inst| match inst.op {
            IrInstr::GlobalStrPtr { result, global } if result == value => Some(global),
            _ => None,
        })
        .unwrap();
    module.global(global).unwrap().value.clone()
}

fn const_arg(module: &IrModule, func: &str, value: lazyprof::ir::value::ValueId) -> i64 {
    let f = module.function_by_name(func).unwrap();
    f.instructions()
        .find_map(|inst| match inst.op {
            IrInstr::ConstInt { result, value: v, .. } if result == value => Some(v),
            _ => None,
        })
        .unwrap()
}

/// Instruments a module, then plays the runtime calls it contains into a
/// logger the way the C entry points would.
#[test]
fn test_instrumented_module_produces_one_record_of_each_kind() {
    let mut module = IrModule::new("e2e");
    module.declare_function(PERF_ENTRY, &perf_entry_sig());
    let kernel_sp = module.debug_mut().add_subprogram("kernel", "kernel", "k.c");
    let main_sp = module.debug_mut().add_subprogram("main", "main", "main.c");
    let marker_loc = module.debug_mut().add_location(12, 3, kernel_sp, None);
    let call_loc = module.debug_mut().add_location(7, 1, main_sp, None);

    let mut b = IrFunctionBuilder::new("kernel", vec![], IrType::Void);
    let entry = b.create_block(Some("entry"));
    b.set_current_block(entry);
    b.set_location(Some(marker_loc));
    let target = b.emit_func_addr(PERF_ENTRY, perf_entry_sig());
    let version = b.emit_const_int(1, IrType::i32());
    let trip_count = b.emit_const_int(100, IrType::i64());
    let granularity = b.emit_const_int(4, IrType::i64());
    let depth = b.emit_const_int(0, IrType::i32());
    b.push_instr(
        IrInstr::LazydPerf {
            target,
            version,
            trip_count,
            granularity,
            depth,
        },
        None,
    );
    b.push_instr(IrInstr::Return { values: vec![] }, None);
    module.add_function(b.build()).unwrap();

    let mut b = IrFunctionBuilder::new("main", vec![], IrType::Void);
    let entry = b.create_block(Some("entry"));
    b.set_current_block(entry);
    b.set_location(Some(call_loc));
    b.emit_call("kernel", vec![], None);
    b.push_instr(IrInstr::Return { values: vec![] }, None);
    module.add_function(b.build()).unwrap();

    let graph = CallGraph::build(&module);
    assert!(instrument(&mut module, &graph).unwrap());

    let logger = Logger::with_sink(Vec::new(), 1000);
    let ctx = CallContext::root();

    // main runs first and reaches the delegation event before calling kernel.
    let main = module.function_by_name("main").unwrap();
    for inst in main.instructions() {
        if let IrInstr::Call { callee, args, .. } = &inst.op {
            if callee == CALL_ENTRY {
                logger
                    .record_call(
                        &ctx,
                        &string_arg(&module, "main", args[0]),
                        &string_arg(&module, "main", args[1]),
                        &string_arg(&module, "main", args[2]),
                    )
                    .unwrap();
            }
        }
    }
    let kernel = module.function_by_name("kernel").unwrap();
    for inst in kernel.instructions() {
        if let IrInstr::CallIndirect { args, .. } = &inst.op {
            logger
                .record_intrinsic(
                    const_arg(&module, "kernel", args[0]) as i32,
                    const_arg(&module, "kernel", args[1]) as u64,
                    const_arg(&module, "kernel", args[2]) as u64,
                    const_arg(&module, "kernel", args[3]) as i32,
                    &string_arg(&module, "kernel", args[4]),
                    &string_arg(&module, "kernel", args[5]),
                    &string_arg(&module, "kernel", args[6]),
                )
                .unwrap();
        }
    }

    let out = String::from_utf8(logger.finalize().unwrap()).unwrap();
    assert_eq!(
        out,
        "calledat,kernel,main.c:7:1,main,0\nbuiltin,1,100,4,0,kernel,k.c:12:3,k.c:12:3\n"
    );

    let report = Report::from_reader(out.as_bytes()).unwrap();
    assert_eq!(report.caller(1, "kernel").unwrap().ef_entries, 1);
    assert_eq!(report.callee("kernel").unwrap().calls, 1);
}

proptest! {
    #[test]
    fn test_flush_count_tracks_capacity(capacity in 1usize..64, events in 0usize..512) {
        let logger = Logger::with_sink(Vec::new(), capacity);
        for n in 0..events {
            logger.emit(intrinsic(n as u64)).unwrap();
        }
        prop_assert_eq!(logger.flushes() as usize, events / capacity);
        prop_assert_eq!(logger.buffered(), events % capacity);
        let out = logger.finalize().unwrap();
        prop_assert_eq!(out.iter().filter(|&&b| b == b'\n').count(), events);
    }
}
