//! Tournament selection.
//!
//! Fitness is minimised. Each tournament draws distinct competitors; the
//! lowest fitness wins. Competitors that never win become replacement slots.

use crate::config::SelectionConfig;
use rand::seq::index;
use rand::RngCore;

/// Outcome of one selection step, as population indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Tournament winners in draw order. An index may repeat.
    pub winners: Vec<usize>,
    /// Distinct replacement slots, worst fitness first.
    ///
    /// Never shorter than `winners` unless the population has too few
    /// non-winners.
    pub losers: Vec<usize>,
}

/// Chooses parents and replacement slots.
pub trait SelectionOperator: Send + Sync {
    /// Select from a population described by its fitness values.
    fn select(&self, fitness: &[f64], rng: &mut dyn RngCore) -> Selection;
}

/// Repeated tournaments over distinct competitors.
#[derive(Debug, Clone, Copy)]
pub struct TournamentSelection {
    config: SelectionConfig,
}

impl TournamentSelection {
    /// Create a tournament selector.
    #[must_use]
    pub fn new(config: SelectionConfig) -> Self {
        Self { config }
    }

    /// Run one tournament and return its competitors and winner.
    fn tournament(&self, fitness: &[f64], rng: &mut dyn RngCore) -> (Vec<usize>, usize) {
        let size = self.config.tournament_size.clamp(1, fitness.len());
        let competitors = index::sample(rng, fitness.len(), size).into_vec();
        let winner = competitors
            .iter()
            .copied()
            .min_by(|&a, &b| fitness[a].total_cmp(&fitness[b]))
            .unwrap_or(competitors[0]);
        (competitors, winner)
    }
}

impl SelectionOperator for TournamentSelection {
    fn select(&self, fitness: &[f64], rng: &mut dyn RngCore) -> Selection {
        if fitness.is_empty() {
            return Selection::default();
        }

        let mut winners = Vec::with_capacity(self.config.number_of_offspring);
        let mut competed = vec![false; fitness.len()];
        for _ in 0..self.config.number_of_offspring {
            let (competitors, winner) = self.tournament(fitness, rng);
            for c in competitors {
                competed[c] = true;
            }
            winners.push(winner);
        }

        let mut is_winner = vec![false; fitness.len()];
        for &w in &winners {
            is_winner[w] = true;
        }

        let worst_first = |a: &usize, b: &usize| fitness[*b].total_cmp(&fitness[*a]).then(a.cmp(b));

        let mut losers: Vec<usize> = (0..fitness.len())
            .filter(|&i| competed[i] && !is_winner[i])
            .collect();
        losers.sort_by(worst_first);

        // Top up from individuals that never competed.
        if losers.len() < winners.len() {
            let mut rest: Vec<usize> = (0..fitness.len())
                .filter(|&i| !competed[i] && !is_winner[i])
                .collect();
            rest.sort_by(worst_first);
            let needed = winners.len() - losers.len();
            losers.extend(rest.into_iter().take(needed));
        }

        Selection { winners, losers }
    }
}
