//! Steady-state evolution.
//!
//! Each generation replaces only the tournament losers with offspring of the
//! winners, so the population size never changes. The run is driven as an
//! explicit state machine; every state transition is the only place where
//! the run's population or history is written.

use crate::config::BestPolicy;
use crate::dataset::Dataset;
use crate::environment::Environment;
use crate::error::{EvaluationError, RunError};
use crate::evolution::{
    EvolutionModel, GenerationStatistics, Individual, Population, RunContext, RunResult,
};
use crate::fitness::FitnessContext;
use crate::operators::Selection;
use crate::program::Program;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use rayon::ThreadPool;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// States of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    /// Seeding the initial population.
    Initializing,
    /// Computing missing fitness values.
    Evaluating,
    /// Running tournaments.
    Selecting,
    /// Producing offspring from the winners.
    Breeding,
    /// Writing offspring over the losers.
    Replacing,
    /// Appending the generation snapshot.
    Recording,
    /// Done.
    Terminated,
}

/// How the Evaluating state spreads its work.
#[derive(Debug, Clone, Default)]
pub(super) enum Evaluator {
    /// On the run's own thread.
    #[default]
    Sequential,
    /// Across a dedicated worker pool.
    Pool(Arc<ThreadPool>),
}

impl Evaluator {
    /// Fill in every missing fitness value.
    ///
    /// All pending evaluations complete before the first error, in
    /// population order, is returned.
    fn evaluate(
        &self,
        population: &mut Population,
        fitness: &dyn FitnessContext,
        dataset: &Dataset,
    ) -> Result<(), EvaluationError> {
        let pending = population.pending();
        let individuals = population.individuals();
        let evaluate_one = |&index: &usize| fitness.fitness(&individuals[index].program, dataset);

        let results: Vec<Result<f64, EvaluationError>> = match self {
            Self::Sequential => pending.iter().map(evaluate_one).collect(),
            Self::Pool(pool) => pool.install(|| pending.par_iter().map(evaluate_one).collect()),
        };

        for (index, result) in pending.into_iter().zip(results) {
            population.set_fitness(index, result?);
        }
        Ok(())
    }
}

/// Mutable state of one run.
struct Run<'a> {
    environment: &'a Environment,
    dataset: &'a Dataset,
    evaluator: &'a Evaluator,
    context: RunContext,
    rng: SmallRng,
    population: Population,
    selection: Selection,
    children: Vec<Program>,
    snapshot: Option<GenerationStatistics>,
    statistics: Vec<GenerationStatistics>,
    best_ever: Option<Individual>,
    generation_best: Option<Individual>,
    generation: usize,
    aborted: bool,
}

impl<'a> Run<'a> {
    fn new(
        environment: &'a Environment,
        dataset: &'a Dataset,
        evaluator: &'a Evaluator,
        context: RunContext,
    ) -> Self {
        Self {
            environment,
            dataset,
            evaluator,
            rng: SmallRng::seed_from_u64(context.seed),
            context,
            population: Population::default(),
            selection: Selection::default(),
            children: Vec::new(),
            snapshot: None,
            statistics: Vec::with_capacity(environment.configuration().generations),
            best_ever: None,
            generation_best: None,
            generation: 0,
            aborted: false,
        }
    }

    fn initialize(&mut self) {
        let environment = self.environment;
        let generator = &environment.modules().program_generator;
        let programs = (0..environment.configuration().population_size)
            .map(|_| generator.generate(&mut self.rng))
            .collect();
        self.population = Population::new(programs);
    }

    fn evaluate(&mut self) -> Result<(), RunError> {
        let fitness = self.environment.modules().fitness_context.as_ref();
        self.evaluator
            .evaluate(&mut self.population, fitness, self.dataset)
            .map_err(|source| RunError {
                run: self.context.run,
                seed: self.context.seed,
                generation: self.generation,
                source,
            })?;

        let best_so_far = self.statistics.last().map_or(f64::INFINITY, |s| s.best_so_far);
        self.snapshot = Some(GenerationStatistics::from_population(
            self.generation,
            &self.population,
            best_so_far,
        ));

        self.generation_best = self.population.best().cloned();
        if let Some(best) = &self.generation_best {
            let improved = self
                .best_ever
                .as_ref()
                .is_none_or(|ever| best.fitness_or_undefined() < ever.fitness_or_undefined());
            if improved {
                self.best_ever = Some(best.clone());
            }
        }
        Ok(())
    }

    fn select(&mut self) {
        let fitness = self.population.fitness();
        self.selection = self.environment.modules().selection.select(&fitness, &mut self.rng);
    }

    fn breed(&mut self) {
        let environment = self.environment;
        let config = environment.configuration();
        let modules = environment.modules();
        let individuals = self.population.individuals();

        let mut children = Vec::with_capacity(self.selection.winners.len());
        for pair in self.selection.winners.chunks(2) {
            let mother = &individuals[pair[0]].program;
            let Some(&father_index) = pair.get(1) else {
                children.push(mother.clone());
                continue;
            };
            let father = &individuals[father_index].program;

            if !self.rng.gen_bool(config.crossover_rate) {
                children.extend([mother.clone(), father.clone()]);
                continue;
            }
            match modules.recombination.recombine(mother, father, &mut self.rng) {
                Ok((first, second)) => children.extend([first, second]),
                Err(error) => {
                    warn!(
                        run = self.context.run,
                        generation = self.generation,
                        %error,
                        "recombination skipped, parents passed through"
                    );
                    children.extend([mother.clone(), father.clone()]);
                }
            }
        }

        for child in &mut children {
            if self.rng.gen_bool(config.macro_mutation_rate) {
                *child = modules.macro_mutation.mutate(child, &mut self.rng);
            }
            if self.rng.gen_bool(config.micro_mutation_rate) {
                *child = modules.micro_mutation.mutate(child, &mut self.rng);
            }
        }
        self.children = children;
    }

    fn replace(&mut self) {
        let losers = std::mem::take(&mut self.selection.losers);
        let children = std::mem::take(&mut self.children);
        if children.len() > losers.len() {
            debug!(
                run = self.context.run,
                generation = self.generation,
                dropped = children.len() - losers.len(),
                "not enough replacement slots"
            );
        }
        for (slot, child) in losers.into_iter().zip(children) {
            self.population.replace(slot, child);
        }
    }

    fn record(&mut self) -> State {
        let config = self.environment.configuration();
        let Some(stats) = self.snapshot.take() else {
            return State::Terminated;
        };
        debug!(
            run = self.context.run,
            generation = stats.generation,
            best = stats.best,
            mean = stats.mean,
            worst = stats.worst,
            best_so_far = stats.best_so_far,
            "generation recorded"
        );
        self.statistics.push(stats);
        self.generation += 1;

        if self.generation >= config.generations {
            return State::Terminated;
        }
        if let Some(threshold) = config.stopping_criterion {
            if stats.best_so_far <= threshold {
                info!(
                    run = self.context.run,
                    generation = stats.generation,
                    threshold,
                    "stopping criterion reached"
                );
                return State::Terminated;
            }
        }
        if self.context.is_aborted() {
            warn!(run = self.context.run, generation = self.generation, "run aborted");
            self.aborted = true;
            return State::Terminated;
        }
        State::Evaluating
    }

    fn finish(self) -> RunResult {
        let best = match self.environment.configuration().best_policy {
            BestPolicy::BestEver => self.best_ever,
            BestPolicy::FinalGeneration => self.generation_best,
        }
        .unwrap_or_else(|| {
            Individual::new(Program::new(
                Vec::new(),
                self.environment.context().output_registers().to_vec(),
            ))
        });

        RunResult {
            run: self.context.run,
            seed: self.context.seed,
            best,
            statistics: self.statistics,
            aborted: self.aborted,
        }
    }
}

/// Drive one run through the state machine.
pub(super) fn evolve(
    environment: &Environment,
    dataset: &Dataset,
    context: RunContext,
    evaluator: &Evaluator,
    model: &'static str,
) -> Result<RunResult, RunError> {
    info!(run = context.run, seed = context.seed, model, "run started");

    let mut run = Run::new(environment, dataset, evaluator, context);
    let mut state = State::Initializing;
    loop {
        state = match state {
            State::Initializing => {
                run.initialize();
                State::Evaluating
            }
            State::Evaluating => {
                run.evaluate()?;
                State::Selecting
            }
            State::Selecting => {
                run.select();
                State::Breeding
            }
            State::Breeding => {
                run.breed();
                State::Replacing
            }
            State::Replacing => {
                run.replace();
                State::Recording
            }
            State::Recording => run.record(),
            State::Terminated => {
                let result = run.finish();
                info!(
                    run = result.run,
                    seed = result.seed,
                    best_fitness = result.best_fitness(),
                    generations = result.generations(),
                    aborted = result.aborted,
                    "run finished"
                );
                return Ok(result);
            }
        };
    }
}

/// Steady-state model with sequential evaluation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SteadyState;

impl SteadyState {
    /// Create the model.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl EvolutionModel for SteadyState {
    fn name(&self) -> &'static str {
        "steady_state"
    }

    fn run(
        &self,
        environment: &Environment,
        dataset: &Dataset,
        context: RunContext,
    ) -> Result<RunResult, RunError> {
        evolve(environment, dataset, context, &Evaluator::Sequential, self.name())
    }
}
