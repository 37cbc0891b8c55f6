//! Benchmarks for program execution, effective analysis and evolution.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::hint::black_box;
use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};
use lgp::program::{
    InstructionGenerator, ProgramGenerator, RandomInstructionGenerator, RandomProgramGenerator,
};
use lgp::{
    Configuration, Context, Dataset, Environment, EvolutionModel, FitnessFunction, Program,
    RunContext, Sample, SteadyState, Target,
};
use rand::SeedableRng;
use rand::rngs::SmallRng;

fn configuration() -> Configuration {
    Configuration {
        num_features: 2,
        num_calculation_registers: 8,
        initial_minimum_program_length: 150,
        initial_maximum_program_length: 200,
        minimum_program_length: 1,
        maximum_program_length: 200,
        population_size: 50,
        generations: 20,
        ..Default::default()
    }
}

fn dataset() -> Dataset {
    let points: Vec<(f64, f64)> = (0..100)
        .map(|i| (f64::from(i) * 0.1, f64::from(i % 7)))
        .collect();
    let samples = points.iter().map(|&(x, y)| Sample::from_values(&[x, y])).collect();
    let targets = points.iter().map(|&(x, y)| Target::Single(x * y + x)).collect();
    Dataset::new(samples, targets).unwrap()
}

fn long_program(context: &Arc<Context>) -> Program {
    let instructions: Arc<dyn InstructionGenerator> =
        Arc::new(RandomInstructionGenerator::new(Arc::clone(context)));
    let generator = RandomProgramGenerator::new(Arc::clone(context), instructions);
    generator.generate(&mut SmallRng::seed_from_u64(1))
}

fn bench_execute(c: &mut Criterion) {
    let context = Arc::new(Context::new(configuration(), FitnessFunction::mse()).unwrap());
    let program = long_program(&context);
    let data = dataset();
    let layout = context.layout();

    c.bench_function("execute_100_samples", |b| {
        b.iter(|| {
            for sample in data.samples() {
                black_box(program.run(layout, black_box(sample)));
            }
        });
    });
}

fn bench_effective(c: &mut Criterion) {
    let context = Arc::new(Context::new(configuration(), FitnessFunction::mse()).unwrap());
    let program = long_program(&context);

    c.bench_function("effective_analysis", |b| {
        b.iter(|| black_box(black_box(&program).effective()));
    });
}

fn bench_run(c: &mut Criterion) {
    let mut config = configuration();
    config.initial_minimum_program_length = 5;
    config.initial_maximum_program_length = 20;
    let environment = Environment::standard(config, FitnessFunction::mse()).unwrap();
    let data = dataset();

    c.bench_function("steady_state_run", |b| {
        b.iter(|| {
            SteadyState
                .run(&environment, &data, RunContext::new(0, black_box(7)))
                .unwrap()
        });
    });
}

criterion_group!(benches, bench_execute, bench_effective, bench_run);
criterion_main!(benches);
