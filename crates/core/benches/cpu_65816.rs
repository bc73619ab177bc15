use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use emu_65816::{AddrMode, ArrayMemory, Cpu, Memory};

/// A short decoded program: each entry is one pre-resolved instruction
/// dispatch, standing in for what a driver's decoder would produce.
fn run_mix(cpu: &mut Cpu, mem: &mut ArrayMemory) {
    cpu.lda(mem, 2, 2, AddrMode::Immediate, 0x8001).unwrap();
    cpu.sta(mem, 3, 4, AddrMode::Absolute, 0x2000).unwrap();
    cpu.ldx(mem, 2, 2, AddrMode::Immediate, 0x8004);
    cpu.inx();
    cpu.dex();
    cpu.adc(mem, 2, 2, AddrMode::Immediate, 0x8007);
    cpu.and(mem, 2, 2, AddrMode::Immediate, 0x8009);
    cpu.asl(mem, 1, 2, AddrMode::Implied, 0).unwrap();
}

fn bench_instruction_mix(c: &mut Criterion) {
    let mut group = c.benchmark_group("cpu_65816_instruction_mix");

    for step_count in [10, 100, 1000].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(step_count),
            step_count,
            |b, &count| {
                let mut mem = ArrayMemory::new();
                mem.write(0x8001, 0x42, true);
                mem.write(0x8004, 0x10, true);
                mem.write(0x8007, 0x01, true);
                mem.write(0x8009, 0x0F, true);

                b.iter(|| {
                    let mut cpu = Cpu::new();
                    cpu.pc = 0x8000;
                    for _ in 0..count {
                        cpu.pc = 0x8000;
                        run_mix(&mut cpu, &mut mem);
                    }
                    black_box(cpu.cycles);
                });
            },
        );
    }

    group.finish();
}

fn bench_decimal_adc(c: &mut Criterion) {
    let mut group = c.benchmark_group("cpu_65816_decimal_adc");

    group.bench_function("bcd_8bit", |b| {
        let mut mem = ArrayMemory::new();
        mem.write(0x8001, 0x19, true);

        b.iter(|| {
            let mut cpu = Cpu::new();
            cpu.p.d = true;
            cpu.c = 0x05;
            for _ in 0..1000 {
                cpu.pc = 0x8000;
                cpu.adc(&mut mem, 2, 2, AddrMode::Immediate, 0x8001);
            }
            black_box(cpu.c);
        });
    });

    group.finish();
}

fn bench_block_move(c: &mut Criterion) {
    let mut group = c.benchmark_group("cpu_65816_block_move");

    group.bench_function("mvn_256_bytes", |b| {
        let mut mem = ArrayMemory::new();
        // MVN operand bytes: destination bank 2, source bank 1.
        mem.write(0x8001, 0x02, true);
        mem.write(0x8002, 0x01, true);
        for i in 0..256u32 {
            mem.write(0x01_1000 + i, i as u8, true);
        }

        b.iter(|| {
            let mut cpu = Cpu::new();
            cpu.p.e = false;
            cpu.pc = 0x8000;
            cpu.c = 255;
            cpu.x = 0x1000;
            cpu.y = 0x2000;
            while cpu.c != 0xFFFF {
                cpu.mvn(&mut mem);
            }
            black_box(cpu.cycles);
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_instruction_mix,
    bench_decimal_adc,
    bench_block_move
);
criterion_main!(benches);
