use forcekill_core::host::mock::MockHost;
use forcekill_core::memory::MemoryImage;
use forcekill_core::{
    Config, Error, ForceTerminator, OsVersionKey, PointerWidth, RoutineResolver, SignatureTable,
    SweepConfig,
};

const BASE: u64 = 0xFFFF_F800_0312_4560;
const TARGET: u32 = 2848;

/// 255 bytes of padding with a single call opcode at `opcode_at`
fn anchor_window(opcode_at: usize, displacement: i32) -> MemoryImage {
    let mut bytes = vec![0xCCu8; 0xFF];
    bytes[opcode_at] = 0xE8;
    bytes[opcode_at + 1..opcode_at + 5].copy_from_slice(&displacement.to_le_bytes());
    MemoryImage::new(BASE, bytes).unwrap()
}

#[test]
fn test_win7_x64_resolves_from_anchor_window() {
    let host = MockHost::new(6, 1, PointerWidth::Bits64).export("PsTerminateSystemThread", BASE);
    let table = SignatureTable::builtin();

    let key = OsVersionKey::new(6, 1, PointerWidth::Bits64);
    assert_eq!(table.lookup(&key).unwrap().as_bytes(), &[0xE8]);

    // Opcode at 43, so the operand is decoded at offset 44
    let displacement = -0x2_1F40;
    let memory = anchor_window(43, displacement);

    let resolution = RoutineResolver::new(&host, &memory, &table)
        .resolve_detailed()
        .unwrap();

    assert_eq!(resolution.key, key);
    assert_eq!(resolution.anchor, BASE);
    assert_eq!(resolution.operand, BASE + 44);
    assert_eq!(resolution.displacement, displacement);
    assert_eq!(
        resolution.routine.address(),
        (BASE + 44 + 4).wrapping_add_signed(displacement as i64)
    );
}

#[test]
fn test_force_kill_end_to_end() {
    let host = MockHost::win7_x64()
        .export("PsTerminateSystemThread", BASE)
        .process(TARGET)
        .process(4)
        .thread(0x10, 4)
        .thread(0xA24, TARGET)
        .thread(0xB30, TARGET)
        .thread(0xB34, 4)
        .thread(0xC00, TARGET);
    let memory = anchor_window(43, 0x7_0000);
    let table = SignatureTable::builtin();
    let config = Config {
        sweep: SweepConfig {
            first_id: 4,
            end_id: 0x1000,
            step: 4,
        },
        ..Default::default()
    };

    let report = unsafe {
        ForceTerminator::new(&host, &memory, &host, &table)
            .with_config(config)
            .force_kill(TARGET)
    }
    .unwrap();

    assert_eq!(report.routine, BASE + 44 + 4 + 0x7_0000);
    assert_eq!(report.terminated, 3);
    assert_eq!(report.sweep.resolved, 5);

    let killed: Vec<_> = host.invocations().iter().map(|i| i.thread).collect();
    assert_eq!(
        killed,
        vec![
            MockHost::thread_object(0xA24),
            MockHost::thread_object(0xB30),
            MockHost::thread_object(0xC00),
        ]
    );

    // Process + 5 threads, each released once
    assert_eq!(host.release_count(), 6);
    assert_eq!(host.outstanding_references(), 0);
}

#[test]
fn test_unresolvable_routine_leaves_target_alone() {
    let host = MockHost::new(11, 0, PointerWidth::Bits64)
        .export("PsTerminateSystemThread", BASE)
        .process(TARGET)
        .thread(8, TARGET);
    let memory = anchor_window(43, 0x10);
    let table = SignatureTable::builtin();

    let err = unsafe { ForceTerminator::new(&host, &memory, &host, &table).force_kill(TARGET) }
        .unwrap_err();

    match err {
        Error::RoutineNotResolved(cause) => {
            assert!(matches!(
                *cause,
                Error::UnsupportedVersion {
                    known_gap: false,
                    ..
                }
            ));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(host.invocations().is_empty());
    assert_eq!(host.thread_lookup_attempts(), 0);
    assert_eq!(host.outstanding_references(), 0);
}
