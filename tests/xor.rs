//! End-to-end scenarios: XOR evolution, determinism and state
//! round-tripping.

use neatkit::genomics::GeneticConfig;
use neatkit::networks::Network;
use neatkit::populations::{Neat, PopulationConfig};

use std::num::NonZeroUsize;

fn xor_fitness(network: &mut Network) -> f64 {
    let rows = [
        ([0.0, 0.0], 0.0),
        ([0.0, 1.0], 1.0),
        ([1.0, 0.0], 1.0),
        ([1.0, 1.0], 0.0),
    ];

    let mut fitness = 4.0;
    for (inputs, target) in rows {
        let output = network.evaluate(&inputs)[0];
        fitness -= (target - output) * (target - output);
    }
    fitness
}

fn xor_configs() -> (GeneticConfig, PopulationConfig) {
    (
        GeneticConfig {
            input_count: NonZeroUsize::new(2).unwrap(),
            output_count: NonZeroUsize::new(1).unwrap(),
            ..GeneticConfig::default()
        },
        PopulationConfig {
            initial_population_size: NonZeroUsize::new(150).unwrap(),
            target_population_size: NonZeroUsize::new(150).unwrap(),
            ..PopulationConfig::default()
        },
    )
}

#[test]
fn xor_is_approximated_within_100_epochs() {
    let (genetic_config, population_config) = xor_configs();
    let mut neat = Neat::with_seed(genetic_config, population_config, 42);

    for _ in 0..100 {
        neat.evaluate_fitness(xor_fitness);
        neat.epoch().unwrap();
        if neat.best_ever().unwrap().fitness() >= 3.9 {
            break;
        }
    }

    let best = neat.best_ever().unwrap();
    assert!(
        best.fitness() >= 3.9,
        "best XOR fitness after 100 epochs: {}",
        best.fitness()
    );

    // The stored champion really encodes that behavior.
    let mut network = best.generate_network();
    assert!(network.evaluate(&[0.0, 1.0])[0] > network.evaluate(&[0.0, 0.0])[0]);
}

#[test]
fn fixed_seed_runs_are_reproducible() {
    let (genetic_config, population_config) = xor_configs();

    let mut trajectories = Vec::new();
    for _ in 0..2 {
        let mut neat = Neat::with_seed(
            genetic_config.clone(),
            population_config.clone(),
            1234,
        );
        let mut best_per_epoch = Vec::new();
        for _ in 0..15 {
            neat.evaluate_fitness(xor_fitness);
            neat.epoch().unwrap();
            best_per_epoch.push(neat.best_ever().unwrap().fitness());
        }
        trajectories.push(best_per_epoch);
    }

    assert_eq!(trajectories[0], trajectories[1]);
}

#[test]
fn saved_run_restores_and_continues() {
    let (genetic_config, population_config) = xor_configs();
    let mut neat = Neat::with_seed(genetic_config.clone(), population_config.clone(), 7);

    for _ in 0..20 {
        neat.evaluate_fitness(xor_fitness);
        neat.epoch().unwrap();
    }
    let saved_best = neat.best_ever().unwrap().fitness();

    let mut buffer = Vec::new();
    neat.save_state(&mut buffer).unwrap();

    let mut restored =
        Neat::restore_state(genetic_config, population_config, buffer.as_slice()).unwrap();

    assert_eq!(restored.best_ever().unwrap().fitness(), saved_best);
    assert_eq!(restored.species().count(), neat.species().count());
    assert_eq!(restored.population().len(), neat.population().len());
    for (restored_genome, original) in restored
        .population()
        .genomes()
        .zip(neat.population().genomes())
    {
        assert!(restored_genome.genes().eq(original.genes()));
        assert_eq!(restored_genome.fitness(), original.fitness());
    }
    assert_eq!(
        restored.innovation_pool().genes().count(),
        neat.innovation_pool().genes().count()
    );

    // Continuing the run never loses the recorded best.
    restored.evaluate_fitness(xor_fitness);
    restored.epoch().unwrap();
    assert!(restored.best_ever().unwrap().fitness() >= saved_best);
}
