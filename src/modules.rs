//! Typed registry of interchangeable engine modules.
//!
//! Every role the evolution loop needs (generators, genetic operators,
//! fitness context) is registered as a factory. Factories run only once the
//! [`Context`] is complete, and the container refuses to resolve while any
//! role is missing.

use crate::environment::Context;
use crate::error::ConfigurationError;
use crate::fitness::{FitnessContext, MultipleOutputFitnessContext, SingleOutputFitnessContext};
use crate::operators::{
    gaussian_noise, EffectiveMacroMutation, EffectiveMicroMutation, LinearCrossover,
    MacroMutationOperator, MicroMutationOperator, RecombinationOperator, SelectionOperator,
    TournamentSelection,
};
use crate::program::{
    EffectiveProgramGenerator, InstructionGenerator, ProgramGenerator, RandomInstructionGenerator,
};
use std::fmt;
use std::sync::Arc;

/// Roles a module can fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoreModuleType {
    /// Random instruction source.
    InstructionGenerator,
    /// Initial program source.
    ProgramGenerator,
    /// Parent selection.
    SelectionOperator,
    /// Crossover.
    RecombinationOperator,
    /// Instruction insertion and deletion.
    MacroMutationOperator,
    /// Register, operation and constant changes.
    MicroMutationOperator,
    /// Program fitness evaluation.
    FitnessContext,
}

impl CoreModuleType {
    /// Every role, in resolution order.
    pub const ALL: [CoreModuleType; 7] = [
        Self::InstructionGenerator,
        Self::ProgramGenerator,
        Self::SelectionOperator,
        Self::RecombinationOperator,
        Self::MacroMutationOperator,
        Self::MicroMutationOperator,
        Self::FitnessContext,
    ];
}

impl fmt::Display for CoreModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InstructionGenerator => "instruction generator",
            Self::ProgramGenerator => "program generator",
            Self::SelectionOperator => "selection operator",
            Self::RecombinationOperator => "recombination operator",
            Self::MacroMutationOperator => "macro mutation operator",
            Self::MicroMutationOperator => "micro mutation operator",
            Self::FitnessContext => "fitness context",
        };
        f.write_str(name)
    }
}

/// What a factory sees while it builds its module.
#[derive(Clone)]
pub struct ModuleResolver<'a> {
    context: &'a Arc<Context>,
    instruction_generator: Option<Arc<dyn InstructionGenerator>>,
}

impl ModuleResolver<'_> {
    /// The finished context.
    #[must_use]
    pub fn context(&self) -> &Arc<Context> {
        self.context
    }

    /// The resolved instruction generator.
    ///
    /// # Errors
    ///
    /// Fails when called from the instruction generator's own factory.
    pub fn instruction_generator(
        &self,
    ) -> Result<Arc<dyn InstructionGenerator>, ConfigurationError> {
        self.instruction_generator
            .clone()
            .ok_or(ConfigurationError::MissingModule(CoreModuleType::InstructionGenerator))
    }
}

impl fmt::Debug for ModuleResolver<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleResolver")
            .field("context", &self.context)
            .field("instruction_generator", &self.instruction_generator.is_some())
            .finish()
    }
}

type Factory<T> =
    Box<dyn Fn(&ModuleResolver<'_>) -> Result<Arc<T>, ConfigurationError> + Send + Sync>;

/// Registered module factories, one slot per role.
#[derive(Default)]
pub struct ModuleContainer {
    instruction_generator: Option<Factory<dyn InstructionGenerator>>,
    program_generator: Option<Factory<dyn ProgramGenerator>>,
    selection: Option<Factory<dyn SelectionOperator>>,
    recombination: Option<Factory<dyn RecombinationOperator>>,
    macro_mutation: Option<Factory<dyn MacroMutationOperator>>,
    micro_mutation: Option<Factory<dyn MicroMutationOperator>>,
    fitness_context: Option<Factory<dyn FitnessContext>>,
}

impl fmt::Debug for ModuleContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleContainer")
            .field("missing", &self.missing())
            .finish_non_exhaustive()
    }
}

impl ModuleContainer {
    /// An empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A container with every built-in module registered.
    ///
    /// Operators read their parameters from the context's configuration; the
    /// fitness context follows the shape of the fitness function.
    #[must_use]
    pub fn standard() -> Self {
        Self::new()
            .with_instruction_generator(|r| {
                Ok(Arc::new(RandomInstructionGenerator::new(r.context().clone())))
            })
            .with_program_generator(|r| {
                Ok(Arc::new(EffectiveProgramGenerator::new(
                    r.context().clone(),
                    r.instruction_generator()?,
                )))
            })
            .with_selection(|r| {
                Ok(Arc::new(TournamentSelection::new(r.context().configuration().selection)))
            })
            .with_recombination(|r| Ok(Arc::new(LinearCrossover::new(r.context().clone()))))
            .with_macro_mutation(|r| {
                Ok(Arc::new(EffectiveMacroMutation::new(
                    r.context().clone(),
                    r.instruction_generator()?,
                )))
            })
            .with_micro_mutation(|r| {
                let deviation = r.context().configuration().mutation.constant_mutation_std_dev;
                Ok(Arc::new(EffectiveMicroMutation::new(
                    r.context().clone(),
                    gaussian_noise(deviation)?,
                )))
            })
            .with_fitness_context(|r| {
                let context = r.context().clone();
                if context.fitness_function().is_single() {
                    Ok(Arc::new(SingleOutputFitnessContext::new(context)?))
                } else {
                    Ok(Arc::new(MultipleOutputFitnessContext::new(context)?))
                }
            })
    }

    /// Register the instruction generator factory.
    #[must_use]
    pub fn with_instruction_generator<F>(mut self, factory: F) -> Self
    where
        F: Fn(&ModuleResolver<'_>) -> Result<Arc<dyn InstructionGenerator>, ConfigurationError>
            + Send
            + Sync
            + 'static,
    {
        self.instruction_generator = Some(Box::new(factory));
        self
    }

    /// Register the program generator factory.
    #[must_use]
    pub fn with_program_generator<F>(mut self, factory: F) -> Self
    where
        F: Fn(&ModuleResolver<'_>) -> Result<Arc<dyn ProgramGenerator>, ConfigurationError>
            + Send
            + Sync
            + 'static,
    {
        self.program_generator = Some(Box::new(factory));
        self
    }

    /// Register the selection operator factory.
    #[must_use]
    pub fn with_selection<F>(mut self, factory: F) -> Self
    where
        F: Fn(&ModuleResolver<'_>) -> Result<Arc<dyn SelectionOperator>, ConfigurationError>
            + Send
            + Sync
            + 'static,
    {
        self.selection = Some(Box::new(factory));
        self
    }

    /// Register the recombination operator factory.
    #[must_use]
    pub fn with_recombination<F>(mut self, factory: F) -> Self
    where
        F: Fn(&ModuleResolver<'_>) -> Result<Arc<dyn RecombinationOperator>, ConfigurationError>
            + Send
            + Sync
            + 'static,
    {
        self.recombination = Some(Box::new(factory));
        self
    }

    /// Register the macro mutation operator factory.
    #[must_use]
    pub fn with_macro_mutation<F>(mut self, factory: F) -> Self
    where
        F: Fn(&ModuleResolver<'_>) -> Result<Arc<dyn MacroMutationOperator>, ConfigurationError>
            + Send
            + Sync
            + 'static,
    {
        self.macro_mutation = Some(Box::new(factory));
        self
    }

    /// Register the micro mutation operator factory.
    #[must_use]
    pub fn with_micro_mutation<F>(mut self, factory: F) -> Self
    where
        F: Fn(&ModuleResolver<'_>) -> Result<Arc<dyn MicroMutationOperator>, ConfigurationError>
            + Send
            + Sync
            + 'static,
    {
        self.micro_mutation = Some(Box::new(factory));
        self
    }

    /// Register the fitness context factory.
    #[must_use]
    pub fn with_fitness_context<F>(mut self, factory: F) -> Self
    where
        F: Fn(&ModuleResolver<'_>) -> Result<Arc<dyn FitnessContext>, ConfigurationError>
            + Send
            + Sync
            + 'static,
    {
        self.fitness_context = Some(Box::new(factory));
        self
    }

    /// Roles without a registered factory.
    #[must_use]
    pub fn missing(&self) -> Vec<CoreModuleType> {
        let present = [
            self.instruction_generator.is_some(),
            self.program_generator.is_some(),
            self.selection.is_some(),
            self.recombination.is_some(),
            self.macro_mutation.is_some(),
            self.micro_mutation.is_some(),
            self.fitness_context.is_some(),
        ];
        CoreModuleType::ALL
            .into_iter()
            .zip(present)
            .filter_map(|(role, present)| (!present).then_some(role))
            .collect()
    }

    /// Build every module against `context`.
    ///
    /// Completeness is checked before any factory runs.
    ///
    /// # Errors
    ///
    /// Returns the first missing role, or the first factory failure.
    pub fn resolve(&self, context: &Arc<Context>) -> Result<Modules, ConfigurationError> {
        if let Some(&role) = self.missing().first() {
            return Err(ConfigurationError::MissingModule(role));
        }

        let mut resolver = ModuleResolver {
            context,
            instruction_generator: None,
        };
        let instruction_generator = build(
            self.instruction_generator.as_ref(),
            CoreModuleType::InstructionGenerator,
            &resolver,
        )?;
        resolver.instruction_generator = Some(Arc::clone(&instruction_generator));

        Ok(Modules {
            instruction_generator,
            program_generator: build(
                self.program_generator.as_ref(),
                CoreModuleType::ProgramGenerator,
                &resolver,
            )?,
            selection: build(
                self.selection.as_ref(),
                CoreModuleType::SelectionOperator,
                &resolver,
            )?,
            recombination: build(
                self.recombination.as_ref(),
                CoreModuleType::RecombinationOperator,
                &resolver,
            )?,
            macro_mutation: build(
                self.macro_mutation.as_ref(),
                CoreModuleType::MacroMutationOperator,
                &resolver,
            )?,
            micro_mutation: build(
                self.micro_mutation.as_ref(),
                CoreModuleType::MicroMutationOperator,
                &resolver,
            )?,
            fitness_context: build(
                self.fitness_context.as_ref(),
                CoreModuleType::FitnessContext,
                &resolver,
            )?,
        })
    }
}

fn build<T: ?Sized>(
    factory: Option<&Factory<T>>,
    role: CoreModuleType,
    resolver: &ModuleResolver<'_>,
) -> Result<Arc<T>, ConfigurationError> {
    let factory = factory.ok_or(ConfigurationError::MissingModule(role))?;
    factory(resolver)
}

/// Resolved modules, shared by every run.
#[derive(Clone)]
pub struct Modules {
    /// Random instruction source.
    pub instruction_generator: Arc<dyn InstructionGenerator>,
    /// Initial program source.
    pub program_generator: Arc<dyn ProgramGenerator>,
    /// Parent selection.
    pub selection: Arc<dyn SelectionOperator>,
    /// Crossover.
    pub recombination: Arc<dyn RecombinationOperator>,
    /// Instruction insertion and deletion.
    pub macro_mutation: Arc<dyn MacroMutationOperator>,
    /// Register, operation and constant changes.
    pub micro_mutation: Arc<dyn MicroMutationOperator>,
    /// Program fitness evaluation.
    pub fitness_context: Arc<dyn FitnessContext>,
}

impl fmt::Debug for Modules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Modules").finish_non_exhaustive()
    }
}
