//! Teardown Order Integration Tests
//!
//! Kill walks a task's resources in reverse dependency order. The kernel
//! audit log records every collaborator call, so these tests read the order
//! straight off it:
//! - Threads newest first, then ports newest first
//! - Memory released only after threads and ports are gone
//! - Open files closed newest first after memory, vacated slots skipped
//! - Swap path deleted last

use core_types::FileHandle;
use kernel_api::FileSystem;
use services_logger::LogLevel;
use sim_kernel::kernel_audit::KernelEvent;
use tests_resilience::{attach_ports, attach_threads, test_bootstrap};

// ============================================================================
// Test A: Threads and Ports
// ============================================================================

#[test]
fn test_threads_killed_newest_first() {
    let (mut kernel, mut manager) = test_bootstrap();
    let id = manager.create(&mut kernel).unwrap();
    let initial = manager.task(id).unwrap().threads()[0];
    let extra = attach_threads(&mut kernel, &mut manager, id, 2).unwrap();

    manager.kill(id, &mut kernel).unwrap();

    assert_eq!(kernel.threads().kill_order(), &[extra[1], extra[0], initial]);
}

#[test]
fn test_ports_destroyed_newest_first() {
    let (mut kernel, mut manager) = test_bootstrap();
    let id = manager.create(&mut kernel).unwrap();
    let ports = attach_ports(&mut kernel, &mut manager, id, 3).unwrap();

    manager.kill(id, &mut kernel).unwrap();

    assert_eq!(kernel.ports().destroy_order(), &[ports[2], ports[1], ports[0]]);
}

#[test]
fn test_detached_members_are_not_torn_down() {
    let (mut kernel, mut manager) = test_bootstrap();
    let id = manager.create(&mut kernel).unwrap();
    let threads = attach_threads(&mut kernel, &mut manager, id, 2).unwrap();
    let ports = attach_ports(&mut kernel, &mut manager, id, 2).unwrap();
    manager.detach_thread(id, threads[0]).unwrap();
    manager.detach_port(id, ports[1]).unwrap();

    manager.kill(id, &mut kernel).unwrap();

    assert!(!kernel.threads().kill_order().contains(&threads[0]));
    assert_eq!(kernel.ports().destroy_order(), &[ports[0]]);
}

// ============================================================================
// Test B: Phase Ordering
// ============================================================================

#[test]
fn test_memory_released_after_threads_and_ports() {
    let (mut kernel, mut manager) = test_bootstrap();
    let id = manager.create(&mut kernel).unwrap();
    attach_ports(&mut kernel, &mut manager, id, 1).unwrap();
    kernel.clear_audit_log();

    manager.kill(id, &mut kernel).unwrap();

    let log = kernel.audit_log();
    let last_thread = log
        .last_position(|e| matches!(e, KernelEvent::ThreadKilled { .. }))
        .unwrap();
    let last_port = log
        .last_position(|e| matches!(e, KernelEvent::PortDestroyed { .. }))
        .unwrap();
    let dealloc = log
        .position(|e| matches!(e, KernelEvent::MemoryDeallocated { .. }))
        .unwrap();
    let destroy_table = log
        .position(|e| matches!(e, KernelEvent::PageTableDestroyed { .. }))
        .unwrap();

    assert!(last_thread < last_port);
    assert!(last_port < dealloc);
    assert!(dealloc < destroy_table);
}

#[test]
fn test_files_closed_newest_first_after_memory() {
    let (mut kernel, mut manager) = test_bootstrap();
    let id = manager.create(&mut kernel).unwrap();
    let older = kernel.create_and_open("/data/older", 1, id).unwrap();
    let newer = kernel.create_and_open("/data/newer", 1, id).unwrap();
    manager.attach_file(id, older).unwrap();
    manager.attach_file(id, newer).unwrap();
    kernel.clear_audit_log();

    manager.kill(id, &mut kernel).unwrap();

    let log = kernel.audit_log();
    let closed = |handle: FileHandle| {
        log.position(|e| matches!(e, KernelEvent::FileClosed { handle: h } if *h == handle))
            .unwrap()
    };
    let dealloc = log
        .position(|e| matches!(e, KernelEvent::MemoryDeallocated { .. }))
        .unwrap();

    assert!(dealloc < closed(newer));
    assert!(closed(newer) < closed(older));
}

#[test]
fn test_swap_path_deleted_last() {
    let (mut kernel, mut manager) = test_bootstrap();
    let id = manager.create(&mut kernel).unwrap();
    let file = kernel.create_and_open("/data/f", 1, id).unwrap();
    manager.attach_file(id, file).unwrap();
    let swap_path = manager.policy().swap_path_for(id);
    kernel.clear_audit_log();

    manager.kill(id, &mut kernel).unwrap();

    let log = kernel.audit_log();
    let last = log.events().last().unwrap();
    assert_eq!(
        last,
        &KernelEvent::FileDeleteMissing {
            path: swap_path.clone()
        }
    );
    assert_eq!(
        log.count_events(|e| matches!(e, KernelEvent::FileDeleted { path } if *path == swap_path)),
        1
    );
    assert_eq!(manager.diagnostics().count(LogLevel::Warn), 0);
}

// ============================================================================
// Test C: Vacated and Stale File Slots
// ============================================================================

#[test]
fn test_vacated_slot_skipped_at_kill() {
    let (mut kernel, mut manager) = test_bootstrap();
    let id = manager.create(&mut kernel).unwrap();
    let file = kernel.create_and_open("/data/shared", 1, id).unwrap();
    manager.attach_file(id, file).unwrap();
    kernel.close(file).unwrap();
    manager.vacate_file(id, file).unwrap();
    kernel.clear_audit_log();

    manager.kill(id, &mut kernel).unwrap();

    assert!(!kernel
        .audit_log()
        .has_event(|e| matches!(e, KernelEvent::FileCloseStale { .. })));
    assert_eq!(manager.diagnostics().count(LogLevel::Warn), 0);
}

#[test]
fn test_stale_handle_warns_and_teardown_completes() {
    let (mut kernel, mut manager) = test_bootstrap();
    let id = manager.create(&mut kernel).unwrap();
    let stale = kernel.create_and_open("/data/stale", 1, id).unwrap();
    let fine = kernel.create_and_open("/data/fine", 1, id).unwrap();
    manager.attach_file(id, stale).unwrap();
    manager.attach_file(id, fine).unwrap();
    kernel.close(stale).unwrap();

    manager.kill(id, &mut kernel).unwrap();

    assert_eq!(manager.diagnostics().count(LogLevel::Warn), 1);
    assert!(!kernel.file_system().is_open(fine));
    assert!(!kernel.exists(&manager.policy().swap_path_for(id)));
    assert!(!manager.task(id).unwrap().is_live());
}
