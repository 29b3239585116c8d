//! End-to-end tests: host config → ciphered archive → engine → host callbacks.

use vnscript_bytecode::{
    Argument, ArchiveError, BinaryOp, CipherKey, DecodeFault, Expr, IntVar, ScenarioId,
};
use vnscript_config::HostConfig;
use vnscript_machine::{
    Engine, ExecutionError, InstructionPointer, MachineState, ModuleRegistry, Status, Value,
    WaitReason,
};
use vnscript_tests::program::*;
use vnscript_tests::{init_test_logging, ArchiveFixture, HostEvent, TestHarness};

const TITLE: &str = "KEY\\Example";

fn title_key() -> CipherKey {
    CipherKey::windowed(vec![0xA8, 0x28, 0xFD, 0x66], 4, 64)
}

fn config() -> HostConfig {
    HostConfig::new()
        .with_title(TITLE)
        .with_key(TITLE, &title_key())
}

/// Two scenarios: the entry calls into scenario 2 through an entrypoint and returns.
fn two_scenario_program() -> Vec<vnscript_bytecode::Scenario> {
    vec![
        scenario(
            1,
            vec![
                entrypoint(0),
                line(1),
                text("hello"),
                set(0, 0, 1),
                farcall(2, 1),
                line(2),
                add(0, 0, 10),
                end(),
            ],
        ),
        scenario(
            2,
            vec![
                entrypoint(0),
                end(),
                entrypoint(1),
                text("in two"),
                add(0, 0, 5),
                ret(),
            ],
        ),
    ]
}

#[test]
fn test_keyed_archive_runs_to_completion() {
    let fixture = ArchiveFixture::build(&title_key(), &two_scenario_program());
    let config_path = fixture.dir().join("host.yaml");
    std::fs::write(&config_path, config().to_yaml().unwrap()).unwrap();

    let config = HostConfig::load(&config_path).unwrap();
    let mut harness = TestHarness::open(&config, fixture.path());
    assert_eq!(harness.run_to_end(100), 0);

    assert_eq!(harness.int(0, 0), 16);
    assert!(harness.state().call_stack.is_empty());
    assert_eq!(harness.state().line, Some(2));
    assert_eq!(harness.host.text(), vec!["hello", "in two"]);
    assert_eq!(
        harness.host.events.first(),
        Some(&HostEvent::Line(1)),
        "line marker precedes text"
    );
}

#[test]
fn test_wrong_title_key_fails_to_decode() {
    init_test_logging();
    let fixture = ArchiveFixture::build(&title_key(), &two_scenario_program());
    let config = HostConfig::new()
        .with_title(TITLE)
        .with_key(TITLE, &CipherKey::windowed(vec![0x11], 4, 64));

    let archive = config.open_archive(fixture.path()).unwrap();
    let err = Engine::new(
        ModuleRegistry::standard().unwrap(),
        archive,
        config.engine_config(),
    )
    .unwrap_err();
    match err {
        ExecutionError::Archive(ArchiveError::Decode { id, source }) => {
            assert_eq!(id, ScenarioId::new(1));
            assert!(matches!(source.fault, DecodeFault::UnsupportedVersion(_)));
        }
        other => panic!("expected decode error, got {other}"),
    }
}

#[test]
fn test_expression_loop() {
    let program = vec![scenario(
        1,
        vec![
            entrypoint(0),
            set(0, 0, 0),
            label(1),
            add(0, 0, 1),
            add(1, 0, 3),
            goto_if(
                Argument::Expr(Expr::Binary(
                    BinaryOp::Lt,
                    Box::new(Expr::Var(IntVar::new(0, 0))),
                    Box::new(Expr::Const(5)),
                )),
                1,
            ),
            end(),
        ],
    )];
    let fixture = ArchiveFixture::build(&title_key(), &program);
    let mut harness = TestHarness::open(&config(), fixture.path());
    harness.run_to_end(100);

    assert_eq!(harness.int(0, 0), 5);
    assert_eq!(harness.int(1, 0), 15);
}

#[test]
fn test_snapshot_round_trip_through_json() {
    let program = vec![scenario(
        1,
        vec![
            entrypoint(0),
            set(0, 0, 1),
            gosub(10),
            add(0, 0, 100),
            end(),
            label(10),
            add(0, 0, 10),
            pause(),
            ret(),
        ],
    )];
    let fixture = ArchiveFixture::build(&title_key(), &program);

    let mut original = TestHarness::open(&config(), fixture.path());
    assert_eq!(original.run(100).unwrap(), Status::Waiting(WaitReason::Input));
    assert_eq!(original.int(0, 0), 11);
    assert_eq!(
        original.state().call_stack,
        vec![InstructionPointer::new(ScenarioId::new(1), 3)]
    );
    let snapshot = serde_json::to_string(original.state()).unwrap();

    original.engine.resume();
    original.run_to_end(100);
    assert_eq!(original.int(0, 0), 111);

    let mut restored = TestHarness::open(&config(), fixture.path());
    let state: MachineState = serde_json::from_str(&snapshot).unwrap();
    restored.engine.restore(state);
    restored.run_to_end(100);
    assert_eq!(restored.state(), original.state());
}

#[test]
fn test_undefined_opcode_leaves_state_and_can_be_skipped() {
    let program = vec![scenario(
        1,
        vec![
            entrypoint(0),
            set(0, 0, 3),
            command((9, 9), 42, vec![]),
            add(0, 0, 1),
            end(),
        ],
    )];
    let fixture = ArchiveFixture::build(&title_key(), &program);
    let mut harness = TestHarness::open(&config(), fixture.path());

    let err = harness.run(100).unwrap_err();
    assert!(matches!(
        err,
        ExecutionError::UndefinedOpcode {
            module_type: 9,
            module_number: 9,
            opcode: 42,
            overload: 0
        }
    ));
    let before = harness.state().clone();
    assert_eq!(before.int(IntVar::new(0, 0)), 3);
    assert_eq!(before.ip, InstructionPointer::new(ScenarioId::new(1), 2));

    harness.engine.skip_instruction();
    harness.run_to_end(100);
    assert_eq!(harness.int(0, 0), 4);
}

#[test]
fn test_jump_to_missing_scenario_rolls_back() {
    let program = vec![scenario(
        1,
        vec![entrypoint(0), set(0, 0, 1), jump(77, 0), end()],
    )];
    let fixture = ArchiveFixture::build(&title_key(), &program);
    let mut harness = TestHarness::open(&config(), fixture.path());

    let err = harness.run(100).unwrap_err();
    assert!(matches!(
        err,
        ExecutionError::Archive(ArchiveError::UnknownScenario { id }) if id == ScenarioId::new(77)
    ));
    assert_eq!(harness.int(0, 0), 1);
    assert_eq!(
        harness.state().ip,
        InstructionPointer::new(ScenarioId::new(1), 2)
    );
}

#[test]
fn test_host_side_effects_observe_operation_order() {
    let mut registry = ModuleRegistry::standard().unwrap();
    registry
        .register(1, 30, 0, 0, "bgm_play", |machine, command| {
            let track = vnscript_machine::operand::operand_int(machine, command, 0)?;
            if let Some(Value::Int(handle)) = machine.invoke_side_effect("bgm", &[Value::Int(track)])? {
                machine.write_integer_variable(vnscript_bytecode::IntBank(2), 0, handle);
            }
            Ok(())
        })
        .unwrap();

    let program = vec![scenario(
        1,
        vec![
            entrypoint(0),
            text("before"),
            command((1, 30), 0, vec![Argument::Int(4)]),
            end(),
        ],
    )];
    let fixture = ArchiveFixture::build(&title_key(), &program);
    let archive = config().open_archive(fixture.path()).unwrap();
    let mut engine = Engine::new(registry, archive, config().engine_config()).unwrap();
    let mut host = vnscript_tests::RecordingHost {
        reply: Some(Value::Int(99)),
        ..Default::default()
    };

    assert_eq!(engine.run(&mut host, 100).unwrap(), Status::Terminated);
    assert_eq!(
        host.events,
        vec![
            HostEvent::Text(b"before".to_vec()),
            HostEvent::SideEffect("bgm".to_string(), vec![Value::Int(4)]),
        ]
    );
    assert_eq!(engine.state().int(IntVar::new(2, 0)), 99);
}
