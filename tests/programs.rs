use mmc::machine::assembler::assemble_source;
use mmc::machine::errors::{ErrorKind, MachineError};
use mmc::machine::isa::Register;
use mmc::machine::program::Program;
use mmc::machine::vm::{NoInput, OutputBuffer, QueuedInput, VM};

const MULTIPLY: &str = "
// Multiplies two inputs by repeated addition.
        INP
        STA $x
        INP
        STA $count
        LDA $zero
        STA $acc
loop    LDA $count
        BRZ $done
        SUB $one
        STA $count
        LDA $acc
        ADD $x
        STA $acc
        JMP $loop
done    LDA $acc
        OUT
        HLT

x       DAT
count   DAT
acc     DAT
zero    DAT 0
one     DAT 1
";

const HELLO: &str = "
        JMP $start
h       DAT 72
e       DAT 69
l       DAT 76
o       DAT 79
start   LDA $h
        OTC
        LDA $e
        OTC
        LDA $l
        OTC
        OTC
        LDA $o
        OTC
        HLT
";

fn run(source: &str, inputs: &[i64]) -> VM {
    let program = assemble_source(source).expect("assembly failed");
    let mut vm = VM::new();
    vm.load(program.words()).expect("load failed");
    vm.run_with_limit(&mut QueuedInput::new(inputs.iter().copied()), 1_000_000)
        .expect("run failed");
    vm
}

#[test]
fn multiply_by_repeated_addition() {
    let vm = run(MULTIPLY, &[6, 7]);
    assert_eq!(vm.output().text(), "42");
    assert_eq!(vm.register(Register::A), 42);
}

#[test]
fn multiply_wraps() {
    let vm = run(MULTIPLY, &[300, 300]);
    assert_eq!(vm.register(Register::A), (90_000 % 65_536) as u16);
}

#[test]
fn hello_in_chunks() {
    let vm = run(HELLO, &[]);
    assert_eq!(vm.output().lines(), ["HELL", "O"]);
}

#[test]
fn image_round_trip_runs_identically() {
    let program = assemble_source(MULTIPLY).unwrap();
    let restored = Program::from_bytes(&program.to_bytes()).unwrap();
    assert_eq!(restored, program);

    let mut vm = VM::with_output(OutputBuffer::with_width(1));
    vm.load(restored.words()).unwrap();
    vm.run(&mut QueuedInput::new([12, 12])).unwrap();
    assert_eq!(vm.output().lines(), ["1", "4", "4"]);
}

#[test]
fn listing_disassembles_code_and_data() {
    let program = assemble_source(HELLO).unwrap();
    let listing = program.listing();
    assert!(listing.starts_with("0000  0xf005  JMP 5\n"));
    assert!(listing.contains("0001  0x0048  DAT 72\n"));
    assert!(listing.contains("0006  0xc002  OTC\n"));
}

#[test]
fn errors_are_classified() {
    let cases: [(&str, ErrorKind); 5] = [
        ("LDA $nowhere", ErrorKind::Name),
        ("x HLT\nx HLT", ErrorKind::Name),
        ("LDA 1 2", ErrorKind::Syntax),
        ("start FOO", ErrorKind::Syntax),
        ("LDA 4096", ErrorKind::Range),
    ];
    for (source, kind) in cases {
        let err = assemble_source(source).expect_err(source);
        assert_eq!(err.kind(), kind, "{source}");
        assert!(matches!(err, MachineError::AssemblyError { line: _, .. }));
    }
}

#[test]
fn input_required_but_missing() {
    let program = assemble_source(MULTIPLY).unwrap();
    let mut vm = VM::new();
    vm.load(program.words()).unwrap();
    let err = vm.run(&mut NoInput).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Input);
    assert_eq!(vm.current_ip(), 0);
}
